//! The variable length integer codes used by compact glyph data.

use crate::TableWriter;

const ONE_MORE_BYTE_CODE1: u8 = 255;
const ONE_MORE_BYTE_CODE2: u8 = 254;
const WORD_CODE: u8 = 253;
const LOWEST_U_CODE: u16 = 253;

/// Marks a negative value in [`write_255_short`].
const FLIP_SIGN: u8 = 250;
const LOWEST_CODE: u16 = 250;

/// Write a value with the 255UShort encoding.
///
/// Values below 253 take one byte, values up to 761 take two, and anything
/// else takes the word code and a big-endian `u16`.
pub fn write_255_ushort(writer: &mut TableWriter, value: u16) {
    if value < LOWEST_U_CODE {
        writer.write(&(value as u8));
    } else if value < LOWEST_U_CODE * 2 {
        writer.write_slice(&[ONE_MORE_BYTE_CODE1, (value - LOWEST_U_CODE) as u8]);
    } else if value < LOWEST_U_CODE * 3 + 3 {
        writer.write_slice(&[ONE_MORE_BYTE_CODE2, (value - LOWEST_U_CODE * 2) as u8]);
    } else {
        writer.write(&WORD_CODE);
        writer.write(&value);
    }
}

/// Write a value with the signed 255Short encoding.
///
/// Negative values are the encoding of their magnitude behind a sign
/// prefix. Magnitudes below 250 take one byte, up to 755 take two, and
/// anything else takes the word code and a big-endian 16-bit value.
pub fn write_255_short(writer: &mut TableWriter, value: i16) {
    if value < 0 {
        writer.write(&FLIP_SIGN);
    }
    let abs = value.unsigned_abs();
    if abs < LOWEST_CODE {
        writer.write(&(abs as u8));
    } else if abs < LOWEST_CODE * 2 {
        writer.write_slice(&[ONE_MORE_BYTE_CODE1, (abs - LOWEST_CODE) as u8]);
    } else if abs < LOWEST_CODE * 3 + 6 {
        writer.write_slice(&[ONE_MORE_BYTE_CODE2, (abs - LOWEST_CODE * 2) as u8]);
    } else {
        writer.write(&WORD_CODE);
        writer.write(&abs);
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, &[0])]
    #[case(252, &[252])]
    #[case(253, &[255, 0])]
    #[case(505, &[255, 252])]
    #[case(506, &[254, 0])]
    #[case(761, &[254, 255])]
    #[case(762, &[253, 0x02, 0xfa])]
    #[case(u16::MAX, &[253, 0xff, 0xff])]
    fn ushort(#[case] value: u16, #[case] expected: &[u8]) {
        let mut writer = TableWriter::new();
        write_255_ushort(&mut writer, value);
        assert_eq!(writer.as_slice(), expected);
    }

    #[rstest]
    #[case(0, &[0])]
    #[case(249, &[249])]
    #[case(250, &[255, 0])]
    #[case(499, &[255, 249])]
    #[case(500, &[254, 0])]
    #[case(755, &[254, 255])]
    #[case(756, &[253, 0x02, 0xf4])]
    #[case(-1, &[250, 1])]
    #[case(-300, &[250, 255, 50])]
    #[case(-1000, &[250, 253, 0x03, 0xe8])]
    #[case(i16::MIN, &[250, 253, 0x80, 0x00])]
    fn short(#[case] value: i16, #[case] expected: &[u8]) {
        let mut writer = TableWriter::new();
        write_255_short(&mut writer, value);
        assert_eq!(writer.as_slice(), expected);
    }
}
