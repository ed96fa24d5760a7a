//! Serializing values into byte buffers.
//!
//! Font tables are big-endian, and every scalar implements [`FontWrite`] in
//! that byte order. The EOT header is little-endian; wrap values in
//! [`LittleEndian`] to write them that way.

use read_fonts::types::{Tag, Uint24};

/// A type that that can be written out as part of a font file.
pub trait FontWrite {
    /// Write our data into this [TableWriter].
    fn write_into(&self, writer: &mut TableWriter);
}

/// A growable buffer that values are serialized into.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableWriter {
    bytes: Vec<u8>,
}

impl TableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write raw bytes into this table.
    ///
    /// The caller is responsible for ensuring bytes are in the right order.
    #[inline]
    pub fn write_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes)
    }

    /// Write any [`FontWrite`] value.
    #[inline]
    pub fn write<T: FontWrite + ?Sized>(&mut self, value: &T) {
        value.write_into(self)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_data(self) -> Vec<u8> {
        self.bytes
    }
}

/// A value that is written in little-endian byte order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LittleEndian<T>(pub T);

macro_rules! write_be_bytes {
    ($ty:ty) => {
        impl FontWrite for $ty {
            #[inline]
            fn write_into(&self, writer: &mut TableWriter) {
                writer.write_slice(&self.to_be_bytes())
            }
        }
    };
}

macro_rules! write_le_bytes {
    ($ty:ty) => {
        impl FontWrite for LittleEndian<$ty> {
            #[inline]
            fn write_into(&self, writer: &mut TableWriter) {
                writer.write_slice(&self.0.to_le_bytes())
            }
        }
    };
}

write_be_bytes!(u8);
write_be_bytes!(i8);
write_be_bytes!(u16);
write_be_bytes!(i16);
write_be_bytes!(u32);
write_be_bytes!(i32);
write_be_bytes!(Uint24);
write_be_bytes!(Tag);

write_le_bytes!(u16);
write_le_bytes!(u32);

impl<T: FontWrite> FontWrite for [T] {
    fn write_into(&self, writer: &mut TableWriter) {
        self.iter().for_each(|item| item.write_into(writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_orders() {
        let mut writer = TableWriter::new();
        0x1234u16.write_into(&mut writer);
        LittleEndian(0x1234u16).write_into(&mut writer);
        writer.write(&LittleEndian(0x504c_0001u32));
        writer.write(&Uint24::new(0x0a0b0c));
        assert_eq!(
            writer.into_data(),
            [0x12, 0x34, 0x34, 0x12, 0x01, 0x00, 0x4c, 0x50, 0x0a, 0x0b, 0x0c]
        );
    }

    #[test]
    fn slices() {
        let mut writer = TableWriter::new();
        writer.write([-1i16, 2].as_slice());
        writer.write(&Tag::new(b"glyf"));
        assert_eq!(writer.len(), 8);
        assert_eq!(writer.as_slice(), b"\xff\xff\x00\x02glyf");
    }
}
