//! A decoder for the compressed stream, used to check the encoder.

use crate::{
    lzcomp::{
        dist_ranges_for, preloaded_models, DIST_MIN, DIST_WIDTH, DUP2, DUP4, DUP6, LEN_ALPHABET,
        LEN_CLASS_BASE, LEN_MIN,
    },
    preload,
};

/// Reads bits most significant first; reads past the end yield zeros.
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        BitReader { data, pos: 0 }
    }

    pub(crate) fn read_bit(&mut self) -> bool {
        let byte = self.data.get(self.pos / 8).copied().unwrap_or(0);
        let bit = byte & (0x80 >> (self.pos % 8)) != 0;
        self.pos += 1;
        bit
    }

    pub(crate) fn read_value(&mut self, n_bits: u32) -> u32 {
        (0..n_bits).fold(0, |acc, _| (acc << 1) | self.read_bit() as u32)
    }
}

pub(crate) fn decompress(data: &[u8]) -> Vec<u8> {
    let mut bits = BitReader::new(data);
    assert!(!bits.read_bit(), "run-length mode is never produced");
    let len = bits.read_value(24) as usize;
    let (mut symbols, mut lengths, mut distances) = preloaded_models(dist_ranges_for(len));

    let mut buf = preload();
    let start = buf.len();
    while buf.len() - start < len {
        let symbol = symbols.read_symbol(&mut bits);
        let byte = match symbol {
            0..=255 => symbol as u8,
            DUP2 => buf[buf.len() - 2],
            DUP4 => buf[buf.len() - 4],
            DUP6 => buf[buf.len() - 6],
            _ => {
                let class = symbol - LEN_CLASS_BASE;
                let digits = class / LEN_ALPHABET + 1;
                let first = class % LEN_ALPHABET;
                let mut value = first & 3;
                let mut more = first & 4 != 0;
                while more {
                    let group = lengths.read_symbol(&mut bits);
                    value = (value << 2) | (group & 3);
                    more = group & 4 != 0;
                }
                let mut dist = 0;
                for _ in 0..digits {
                    dist = (dist << DIST_WIDTH) | distances.read_symbol(&mut bits);
                }
                let dist = dist + DIST_MIN;
                for _ in 0..value + LEN_MIN {
                    let byte = buf[buf.len() - dist];
                    buf.push(byte);
                }
                continue;
            }
        };
        buf.push(byte);
    }
    assert_eq!(buf.len() - start, len, "copy overran the declared length");
    buf.split_off(start)
}
