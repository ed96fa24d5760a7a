//! LZ77 compression with adaptive Huffman coded output.
//!
//! The input is treated as if it followed the [`preload`] dictionary. Each
//! position is coded as one of:
//!
//! - a literal byte (symbols `0..256`),
//! - a repeat of the byte 2, 4 or 6 positions back (three single symbols),
//! - a copy of earlier data, given as a length and a distance.
//!
//! A copy is announced by a length-class symbol in the main alphabet that
//! carries the number of distance digits and the first group of the length.
//! Further length groups come from a small length alphabet and the distance
//! digits from a small distance alphabet. All three alphabets are adaptive
//! Huffman models, and every choice the compressor makes is priced in bits
//! against the current state of those models.
//!
//! Before any input is coded the preload itself is run through the
//! compressor with its output thrown away. This fills the hash chains and
//! leaves all three models weighted towards the symbols the preload uses, so
//! a decoder that does the same starts from identical state.

use crate::{preload, AdaptiveHuffman, BitWriter};

/// The largest input [`compress`] accepts, limited by the 24-bit length field.
pub const MAX_INPUT_LEN: usize = (1 << 24) - 1;

pub(crate) const DUP2: usize = 256;
pub(crate) const DUP4: usize = 257;
pub(crate) const DUP6: usize = 258;
pub(crate) const LEN_CLASS_BASE: usize = 259;

pub(crate) const LEN_MIN: usize = 2;
pub(crate) const LEN_ALPHABET: usize = 8;
const LEN_GROUP_BITS: usize = 2;
const LEN_GROUP_MASK: usize = (1 << LEN_GROUP_BITS) - 1;
const MORE_GROUPS: usize = 1 << LEN_GROUP_BITS;

pub(crate) const DIST_MIN: usize = 1;
pub(crate) const DIST_WIDTH: u32 = 3;
pub(crate) const DIST_ALPHABET: usize = 1 << DIST_WIDTH;
const DIST_MASK: usize = DIST_ALPHABET - 1;

/// Two byte copies further back than this never pay for themselves.
const MAX_2BYTE_DIST: usize = 512;

const HASH_SIZE: usize = 1 << 16;
const MAX_CHAIN: usize = 256;
/// Stop searching once a match this long is found.
const NICE_LEN: usize = 256;
/// A farther match must beat the current best by `1 / 2^NEAR_TIE_SHIFT`.
const NEAR_TIE_SHIFT: u32 = 4;
const NIL: u32 = u32::MAX;

/// Compress `input` into an MTX compressed stream.
///
/// The stream starts with a zero bit (run-length mode is never used) and the
/// input length as a 24-bit value, followed by the Huffman coded symbols.
///
/// # Panics
///
/// Panics if `input` is longer than [`MAX_INPUT_LEN`].
pub fn compress(input: &[u8]) -> Vec<u8> {
    assert!(
        input.len() <= MAX_INPUT_LEN,
        "input of {} bytes does not fit the 24-bit length field",
        input.len()
    );
    let out = Lzcomp::new(input).encode();
    log::debug!("compressed {} bytes to {}", input.len(), out.len());
    out
}

/// The number of distance digits needed to reach anywhere in `len` bytes.
pub(crate) fn dist_ranges_for(len: usize) -> usize {
    let mut ranges = 1;
    while DIST_MIN + (1 << (DIST_WIDTH as usize * ranges)) - 1 < len {
        ranges += 1;
    }
    ranges
}

/// The size of the main alphabet for the given number of distance ranges.
pub(crate) fn symbol_count(dist_ranges: usize) -> usize {
    LEN_CLASS_BASE + dist_ranges * LEN_ALPHABET
}

fn dist_digits(dist: usize) -> usize {
    let value = dist - DIST_MIN;
    let mut digits = 1;
    while value >> (DIST_WIDTH as usize * digits) != 0 {
        digits += 1;
    }
    digits
}

fn dist_digit(dist: usize, digit: usize) -> usize {
    ((dist - DIST_MIN) >> (DIST_WIDTH as usize * digit)) & DIST_MASK
}

fn length_groups(value: usize) -> usize {
    let mut groups = 1;
    while value >> (LEN_GROUP_BITS * groups) != 0 {
        groups += 1;
    }
    groups
}

/// The symbol for group `group` of `value`; every group but the last
/// carries the 'more follows' flag.
fn length_group(value: usize, group: usize) -> usize {
    let bits = (value >> (LEN_GROUP_BITS * group)) & LEN_GROUP_MASK;
    if group > 0 {
        bits | MORE_GROUPS
    } else {
        bits
    }
}

fn match_len(buf: &[u8], earlier: usize, pos: usize, max_len: usize) -> usize {
    (0..max_len)
        .take_while(|&i| buf[earlier + i] == buf[pos + i])
        .count()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Match {
    len: usize,
    dist: usize,
    /// Bits saved relative to coding the same bytes as literals.
    gain: i64,
}

/// Chains of earlier positions, keyed on the two bytes found there.
struct HashChain {
    head: Vec<u32>,
    prev: Vec<u32>,
}

impl HashChain {
    fn new(len: usize) -> Self {
        HashChain {
            head: vec![NIL; HASH_SIZE],
            prev: vec![NIL; len],
        }
    }

    fn key(buf: &[u8], pos: usize) -> Option<usize> {
        let pair = buf.get(pos..pos + 2)?;
        Some(((pair[0] as usize) << 8) | pair[1] as usize)
    }

    fn insert(&mut self, buf: &[u8], pos: usize) {
        if let Some(key) = Self::key(buf, pos) {
            self.prev[pos] = self.head[key];
            self.head[key] = pos as u32;
        }
    }

    /// Earlier positions sharing the two bytes at `pos`, nearest first.
    fn candidates<'a>(&'a self, buf: &[u8], pos: usize) -> impl Iterator<Item = usize> + 'a {
        let first = Self::key(buf, pos)
            .map(|key| self.head[key])
            .filter(|&p| p != NIL);
        std::iter::successors(first, move |&p| Some(self.prev[p as usize]).filter(|&p| p != NIL))
            .take(MAX_CHAIN)
            .map(|p| p as usize)
    }
}

#[derive(Debug, Default)]
struct Stats {
    literals: usize,
    repeats: usize,
    copies: usize,
    copied_bytes: usize,
}

struct Lzcomp {
    /// The preload followed by the input.
    buf: Vec<u8>,
    start: usize,
    /// Matches may not extend to or past this position.
    limit: usize,
    dist_max: usize,
    chain: HashChain,
    /// Every position before this one is in `chain`.
    next_insert: usize,
    bits: BitWriter,
    symbols: AdaptiveHuffman,
    lengths: AdaptiveHuffman,
    distances: AdaptiveHuffman,
    stats: Stats,
}

impl Lzcomp {
    fn new(input: &[u8]) -> Self {
        Self::with_dist_ranges(input, dist_ranges_for(input.len()))
    }

    fn with_dist_ranges(input: &[u8], dist_ranges: usize) -> Self {
        let mut buf = preload();
        let start = buf.len();
        buf.extend_from_slice(input);
        Lzcomp {
            chain: HashChain::new(buf.len()),
            limit: buf.len(),
            buf,
            start,
            dist_max: DIST_MIN + (1 << (DIST_WIDTH as usize * dist_ranges)) - 1,
            next_insert: 0,
            bits: BitWriter::new(),
            symbols: AdaptiveHuffman::new(symbol_count(dist_ranges)),
            lengths: AdaptiveHuffman::new(LEN_ALPHABET),
            distances: AdaptiveHuffman::new(DIST_ALPHABET),
            stats: Stats::default(),
        }
    }

    fn encode(mut self) -> Vec<u8> {
        let len = self.buf.len() - self.start;
        self.bits.write_bit(false);
        self.bits.write_value(len as u32, 24);
        self.warm_up();

        let mut pos = self.start;
        while pos < self.buf.len() {
            pos = self.encode_at(pos);
        }
        let stats = &self.stats;
        log::trace!(
            "{len} bytes: {} literals, {} repeats, {} copies covering {} bytes",
            stats.literals,
            stats.repeats,
            stats.copies,
            stats.copied_bytes
        );
        self.bits.into_bytes()
    }

    /// Code the preload into a scratch writer, leaving the chains and the
    /// models as they would be after it.
    ///
    /// Nothing past the preload is looked at, so the result depends only on
    /// the number of distance ranges.
    fn warm_up(&mut self) {
        let bits = std::mem::take(&mut self.bits);
        self.limit = self.start;
        let mut pos = 0;
        while pos < self.start {
            pos = self.encode_at(pos);
        }
        self.insert_until(self.start);
        self.limit = self.buf.len();
        self.bits = bits;
        self.stats = Stats::default();
    }

    /// Code the data at `pos`, returning the next position to code.
    fn encode_at(&mut self, pos: usize) -> usize {
        let Some(mut best) = self.find_match(pos) else {
            self.write_single(pos);
            return pos + 1;
        };
        // would we do better by starting the match one byte later?
        self.insert_until(pos + 1);
        if let Some(next) = self.find_match(pos + 1) {
            if next.gain > best.gain {
                self.write_single(pos);
                return pos + 1;
            }
        }
        self.insert_until(pos + best.len);
        if let Some(shorter) = self.shorten(pos, best) {
            best = shorter;
        }
        if best.len == LEN_MIN && self.prefer_singles(pos, best) {
            self.write_single(pos);
            self.write_single(pos + 1);
            return pos + LEN_MIN;
        }
        self.write_copy(best);
        pos + best.len
    }

    fn insert_until(&mut self, target: usize) {
        while self.next_insert < target {
            self.chain.insert(&self.buf, self.next_insert);
            self.next_insert += 1;
        }
    }

    fn find_match(&self, pos: usize) -> Option<Match> {
        let end = self.limit;
        if pos + LEN_MIN > end {
            return None;
        }
        let max_len = end - pos;
        let literal_cost = self.symbols.symbol_cost(self.single_symbol(pos)) as i64;
        let mut best: Option<Match> = None;
        // positions at or after `pos` may already be chained during lookahead
        for earlier in self
            .chain
            .candidates(&self.buf, pos)
            .skip_while(|&earlier| earlier >= pos)
        {
            let dist = pos - earlier;
            if dist > self.dist_max {
                break;
            }
            let best_len = best.map_or(LEN_MIN - 1, |m| m.len);
            if best_len >= max_len || best_len >= NICE_LEN {
                break;
            }
            // farther matches are only interesting if they are longer
            if self.buf[earlier + best_len] != self.buf[pos + best_len] {
                continue;
            }
            let len = match_len(&self.buf, earlier, pos, max_len);
            if len <= best_len || (len == LEN_MIN && dist >= MAX_2BYTE_DIST) {
                continue;
            }
            let gain = literal_cost * len as i64 - self.copy_cost(len, dist) as i64;
            let better = best.map_or(true, |b| gain > b.gain + (b.gain.abs() >> NEAR_TIE_SHIFT));
            if better {
                best = Some(Match { len, dist, gain });
            }
        }
        best.filter(|m| m.gain > 0)
    }

    /// See whether dropping the last byte of `best` lets the following match
    /// do better than it otherwise would.
    fn shorten(&self, pos: usize, best: Match) -> Option<Match> {
        let len = best.len - 1;
        if len < LEN_MIN || (len == LEN_MIN && best.dist >= MAX_2BYTE_DIST) {
            return None;
        }
        let end = pos + best.len;
        let after_full = self.find_match(end).map_or(0, |m| m.gain);
        let after_short = self.find_match(end - 1).map_or(0, |m| m.gain);
        let gain = self.symbols.symbol_cost(self.single_symbol(pos)) as i64 * len as i64
            - self.copy_cost(len, best.dist) as i64;
        (gain + after_short > best.gain + after_full).then_some(Match { len, gain, ..best })
    }

    /// A two byte copy is replaced by single symbols when one of them is a
    /// repeat and together they are no more expensive.
    fn prefer_singles(&self, pos: usize, copy: Match) -> bool {
        let first = self.single_symbol(pos);
        let second = self.single_symbol(pos + 1);
        if first < DUP2 && second < DUP2 {
            return false;
        }
        let singles = self.symbols.symbol_cost(first) + self.symbols.symbol_cost(second);
        singles <= self.copy_cost(copy.len, copy.dist)
    }

    /// The symbol that codes the byte at `pos` on its own.
    fn single_symbol(&self, pos: usize) -> usize {
        let byte = self.buf[pos];
        let back = |n: usize| pos.checked_sub(n).map(|p| self.buf[p]);
        if back(2) == Some(byte) {
            DUP2
        } else if back(4) == Some(byte) {
            DUP4
        } else if back(6) == Some(byte) {
            DUP6
        } else {
            byte as usize
        }
    }

    fn copy_symbol(value: usize, groups: usize, digits: usize) -> usize {
        LEN_CLASS_BASE + (digits - 1) * LEN_ALPHABET + length_group(value, groups - 1)
    }

    fn copy_cost(&self, len: usize, dist: usize) -> u32 {
        let value = len - LEN_MIN;
        let groups = length_groups(value);
        let digits = dist_digits(dist);
        let mut cost = self
            .symbols
            .symbol_cost(Self::copy_symbol(value, groups, digits));
        for group in (0..groups - 1).rev() {
            cost += self.lengths.symbol_cost(length_group(value, group));
        }
        for digit in (0..digits).rev() {
            cost += self.distances.symbol_cost(dist_digit(dist, digit));
        }
        cost
    }

    fn write_single(&mut self, pos: usize) {
        let symbol = self.single_symbol(pos);
        self.symbols.write_symbol(&mut self.bits, symbol);
        self.insert_until(pos + 1);
        if symbol < DUP2 {
            self.stats.literals += 1;
        } else {
            self.stats.repeats += 1;
        }
    }

    fn write_copy(&mut self, copy: Match) {
        debug_assert!(copy.dist <= self.dist_max);
        let value = copy.len - LEN_MIN;
        let groups = length_groups(value);
        let digits = dist_digits(copy.dist);
        self.symbols
            .write_symbol(&mut self.bits, Self::copy_symbol(value, groups, digits));
        for group in (0..groups - 1).rev() {
            self.lengths
                .write_symbol(&mut self.bits, length_group(value, group));
        }
        for digit in (0..digits).rev() {
            self.distances
                .write_symbol(&mut self.bits, dist_digit(copy.dist, digit));
        }
        self.stats.copies += 1;
        self.stats.copied_bytes += copy.len;
    }
}

/// The three models as they stand once the preload has been coded.
#[cfg(test)]
pub(crate) fn preloaded_models(
    dist_ranges: usize,
) -> (AdaptiveHuffman, AdaptiveHuffman, AdaptiveHuffman) {
    let mut lz = Lzcomp::with_dist_ranges(&[], dist_ranges);
    lz.warm_up();
    (lz.symbols, lz.lengths, lz.distances)
}
