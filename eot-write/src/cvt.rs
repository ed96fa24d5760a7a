//! The compact `cvt ` encoding.

use read_fonts::{types::BigEndian, FontData, ReadError};

use crate::TableWriter;

const CVT_POS8: u8 = 255;
const CVT_POS1: u8 = 248;
const CVT_NEG8: u8 = 247;
const CVT_NEG0: u8 = 239;
const CVT_WORD_CODE: u8 = 238;
const CVT_LOWEST_CODE: u32 = 238;

/// Encodes control values as deltas from the previous value.
///
/// The output is the number of values as a big-endian `u16`, then one code
/// per value. Small deltas take one byte, deltas of up to eight multiples of
/// 238 take two, and anything else takes the word code and a big-endian
/// `i16`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CvtEncoder;

impl CvtEncoder {
    /// Read the values of a raw `cvt ` table.
    ///
    /// A trailing odd byte is ignored.
    pub fn values(data: FontData) -> Result<Vec<i16>, ReadError> {
        let len = data.len() / 2 * 2;
        let values = data.read_array::<BigEndian<i16>>(0..len)?;
        Ok(values.iter().map(|v| v.get()).collect())
    }

    /// Encode `values`.
    ///
    /// Only the first `u16::MAX` values are written.
    pub fn encode(values: &[i16]) -> Vec<u8> {
        let values = if values.len() > u16::MAX as usize {
            log::warn!("cvt has {} values, truncating", values.len());
            &values[..u16::MAX as usize]
        } else {
            values
        };
        let mut writer = TableWriter::new();
        writer.write(&(values.len() as u16));
        let mut last = 0i32;
        for &value in values {
            let delta = value as i32 - last;
            write_delta(&mut writer, delta);
            last = value as i32;
        }
        writer.into_data()
    }
}

fn write_delta(writer: &mut TableWriter, delta: i32) {
    let abs = delta.unsigned_abs();
    let index = abs / CVT_LOWEST_CODE;
    let rest = (abs - index * CVT_LOWEST_CODE) as u8;
    if delta < 0 && index <= (CVT_NEG8 - CVT_NEG0) as u32 {
        writer.write_slice(&[CVT_NEG0 + index as u8, rest]);
    } else if delta >= 0 && index == 0 {
        writer.write(&rest);
    } else if delta > 0 && index <= (CVT_POS8 - CVT_POS1 + 1) as u32 {
        writer.write_slice(&[CVT_POS1 - 1 + index as u8, rest]);
    } else {
        writer.write(&CVT_WORD_CODE);
        // a 16-bit decoder accumulates modulo 2^16, so wrapping is exact
        writer.write(&(delta as i16));
    }
}
