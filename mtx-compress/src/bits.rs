//! Writers that pack individual bits into bytes.
//!
//! The two writers here use opposite bit orders within a byte, and output
//! from one cannot be read with the conventions of the other.

/// Packs bits into bytes, most significant bit first.
///
/// The first bit written lands in bit 7 of the first byte.
#[derive(Clone, Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    current: u8,
    bit_count: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.current |= 0x80 >> self.bit_count;
        }
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.bit_count = 0;
        }
    }

    /// Write the low `n_bits` bits of `value`, most significant first.
    pub fn write_value(&mut self, value: u32, n_bits: u32) {
        debug_assert!(n_bits <= 32);
        for shift in (0..n_bits).rev() {
            self.write_bit((value >> shift) & 1 != 0);
        }
    }

    /// The number of bits written so far, including any pending partial byte.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Emit any partial byte, padding its low bits with zeros.
    pub fn flush(&mut self) {
        if self.bit_count > 0 {
            self.bytes.push(self.current);
            self.current = 0;
            self.bit_count = 0;
        }
    }

    /// Flush and return the written bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush();
        self.bytes
    }
}

/// Writes small signed integers in a unary magnitude code.
///
/// Bits are packed least significant first: the first bit written lands in
/// bit 0 of the first byte.
///
/// A value `v` is written as `|v|` one bits followed by a zero bit; if `v` is
/// not zero a sign bit follows, set for negative values. Zero is a single
/// zero bit.
#[derive(Clone, Debug, Default)]
pub struct MagnitudeDependentWriter {
    bytes: Vec<u8>,
    current: u8,
    bit_count: u8,
}

impl MagnitudeDependentWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn write_bit(&mut self, bit: bool) {
        if bit {
            self.current |= 1 << self.bit_count;
        }
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.bit_count = 0;
        }
    }

    pub fn write_value(&mut self, value: i32) {
        for _ in 0..value.unsigned_abs() {
            self.write_bit(true);
        }
        self.write_bit(false);
        if value != 0 {
            self.write_bit(value < 0);
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Emit any partial byte, leaving its unused high bits zero.
    pub fn flush(&mut self) {
        if self.bit_count > 0 {
            self.bytes.push(self.current);
            self.current = 0;
            self.bit_count = 0;
        }
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush();
        self.bytes
    }
}
