//! An adaptive Huffman model.
//!
//! The tree is stored in a flat array with the root at index 1 and every
//! symbol starting out as a leaf with weight one. After each coded symbol the
//! leaf's weight and the weights of its ancestors are incremented, swapping
//! nodes as needed so that weights never increase with index and siblings
//! stay adjacent. A tree with those two properties is a Huffman tree for its
//! current weights.

use crate::BitWriter;

const ROOT: usize = 1;

/// The number of extra occurrences given to favoured symbols at startup.
const WARM_UP_COUNT: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Node {
    up: usize,
    left: usize,
    right: usize,
    /// The symbol for a leaf, `None` for internal nodes.
    code: Option<u16>,
    weight: u32,
}

/// An adaptive Huffman coder over the symbols `0..range`.
#[derive(Clone, Debug)]
pub struct AdaptiveHuffman {
    nodes: Vec<Node>,
    /// The node index of each symbol's leaf.
    symbol_index: Vec<usize>,
    range: usize,
    // scratch space for the leaf to root path
    path: Vec<bool>,
}

/// A broken invariant found by [`AdaptiveHuffman::check_tree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    BadLink { node: usize },
    BadWeight { node: usize, expected: u32, found: u32 },
    SiblingsNotAdjacent { node: usize },
    OutOfOrder { node: usize },
    BadSymbolIndex { symbol: usize },
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeError::BadLink { node } => write!(f, "inconsistent links at node {node}"),
            TreeError::BadWeight {
                node,
                expected,
                found,
            } => write!(
                f,
                "node {node} has weight {found}, but its children sum to {expected}"
            ),
            TreeError::SiblingsNotAdjacent { node } => {
                write!(f, "children of node {node} are not adjacent")
            }
            TreeError::OutOfOrder { node } => {
                write!(f, "node {node} is heavier than the node before it")
            }
            TreeError::BadSymbolIndex { symbol } => {
                write!(f, "symbol {symbol} does not point at its leaf")
            }
        }
    }
}

impl std::error::Error for TreeError {}

impl AdaptiveHuffman {
    /// Create a model for `range` symbols.
    ///
    /// For ranges from 260 up to 511 (the sizes used for the main symbol
    /// alphabet of the compressor) the two short repeat symbols (256 and 257)
    /// and the two widest length-class symbols (the last two) start out with
    /// a few extra occurrences. Ranges of 257 to 259 are left alone, since
    /// there the last two symbols would be among 256 and 257 or missing.
    ///
    /// # Panics
    ///
    /// Panics if `range` is less than 2 or does not fit in a `u16`.
    pub fn new(range: usize) -> Self {
        assert!(range >= 2, "a Huffman tree needs at least two symbols");
        assert!(range <= u16::MAX as usize, "too many symbols: {range}");
        let mut nodes = vec![Node::default(); 2 * range];
        for (i, node) in nodes.iter_mut().enumerate().skip(ROOT) {
            node.up = i / 2;
            if i < range {
                node.left = 2 * i;
                node.right = 2 * i + 1;
            } else {
                node.code = Some((i - range) as u16);
                node.weight = 1;
            }
        }
        for i in (ROOT..range).rev() {
            nodes[i].weight = nodes[2 * i].weight + nodes[2 * i + 1].weight;
        }
        let mut model = AdaptiveHuffman {
            nodes,
            symbol_index: (range..2 * range).collect(),
            range,
            path: Vec::new(),
        };
        model.warm_up();
        model
    }

    fn warm_up(&mut self) {
        if !(260..512).contains(&self.range) {
            return;
        }
        let favoured = [256, 257, self.range - 1, self.range - 2];
        for _ in 0..WARM_UP_COUNT {
            for symbol in favoured {
                self.update(symbol);
            }
        }
    }

    /// The number of symbols in this model.
    pub fn range(&self) -> usize {
        self.range
    }

    /// The number of bits the next occurrence of `symbol` would cost.
    ///
    /// This does not modify the model.
    pub fn symbol_cost(&self, symbol: usize) -> u32 {
        let mut a = self.symbol_index[symbol];
        let mut depth = 0;
        while a != ROOT {
            a = self.nodes[a].up;
            depth += 1;
        }
        depth
    }

    /// Write the code for `symbol` and then update the model.
    pub fn write_symbol(&mut self, bits: &mut BitWriter, symbol: usize) {
        let mut a = self.symbol_index[symbol];
        self.path.clear();
        while a != ROOT {
            let up = self.nodes[a].up;
            self.path.push(self.nodes[up].right == a);
            a = up;
        }
        for &bit in self.path.iter().rev() {
            bits.write_bit(bit);
        }
        self.update(symbol);
    }

    fn update(&mut self, symbol: usize) {
        let mut a = self.symbol_index[symbol];
        while a != ROOT {
            let weight = self.nodes[a].weight;
            // the root is always strictly heavier, so this stops before it
            let mut b = a - 1;
            while self.nodes[b].weight == weight {
                b -= 1;
            }
            b += 1;
            if b != a {
                self.swap_nodes(a, b);
                a = b;
            }
            self.nodes[a].weight += 1;
            a = self.nodes[a].up;
        }
        self.nodes[ROOT].weight += 1;
    }

    /// Exchange the subtrees at `a` and `b`.
    ///
    /// Parent links are positional and stay put; everything that points into
    /// the moved nodes is repaired.
    fn swap_nodes(&mut self, a: usize, b: usize) {
        let up_a = self.nodes[a].up;
        let up_b = self.nodes[b].up;
        self.nodes.swap(a, b);
        self.nodes[a].up = up_a;
        self.nodes[b].up = up_b;
        self.relink(a);
        self.relink(b);
    }

    fn relink(&mut self, idx: usize) {
        let node = self.nodes[idx];
        match node.code {
            Some(symbol) => self.symbol_index[symbol as usize] = idx,
            None => {
                self.nodes[node.left].up = idx;
                self.nodes[node.right].up = idx;
            }
        }
    }

    /// Verify the structural invariants of the tree.
    pub fn check_tree(&self) -> Result<(), TreeError> {
        let len = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate().skip(ROOT) {
            if i != ROOT {
                let parent = self.nodes.get(node.up).ok_or(TreeError::BadLink { node: i })?;
                if parent.code.is_some() || (parent.left != i && parent.right != i) {
                    return Err(TreeError::BadLink { node: i });
                }
                if node.weight > self.nodes[i - 1].weight {
                    return Err(TreeError::OutOfOrder { node: i });
                }
            }
            match node.code {
                Some(symbol) => {
                    if self.symbol_index.get(symbol as usize) != Some(&i) {
                        return Err(TreeError::BadSymbolIndex {
                            symbol: symbol as usize,
                        });
                    }
                }
                None => {
                    if node.left <= ROOT || node.right >= len {
                        return Err(TreeError::BadLink { node: i });
                    }
                    if node.left + 1 != node.right {
                        return Err(TreeError::SiblingsNotAdjacent { node: i });
                    }
                    let left = &self.nodes[node.left];
                    let right = &self.nodes[node.right];
                    if left.up != i || right.up != i {
                        return Err(TreeError::BadLink { node: i });
                    }
                    let expected = left.weight + right.weight;
                    if node.weight != expected {
                        return Err(TreeError::BadWeight {
                            node: i,
                            expected,
                            found: node.weight,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
impl AdaptiveHuffman {
    /// Decode one symbol and update the model, mirroring `write_symbol`.
    pub(crate) fn read_symbol(&mut self, bits: &mut crate::decode::BitReader) -> usize {
        let mut a = ROOT;
        let symbol = loop {
            let node = &self.nodes[a];
            match node.code {
                Some(symbol) => break symbol as usize,
                None if bits.read_bit() => a = node.right,
                None => a = node.left,
            }
        };
        self.update(symbol);
        symbol
    }

    fn weight(&self, symbol: usize) -> u32 {
        self.nodes[self.symbol_index[symbol]].weight
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rstest::rstest;

    use super::*;
    use crate::decode::BitReader;

    #[test]
    fn fresh_tree_is_balanced() {
        let model = AdaptiveHuffman::new(8);
        model.check_tree().unwrap();
        for symbol in 0..8 {
            assert_eq!(model.symbol_cost(symbol), 3);
        }
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(8)]
    #[case(255)]
    #[case(267)]
    #[case(323)]
    fn fresh_trees_are_valid(#[case] range: usize) {
        let model = AdaptiveHuffman::new(range);
        model.check_tree().unwrap();
        assert_eq!(model.range(), range);
    }

    #[test]
    fn warm_up_favours_repeats() {
        let model = AdaptiveHuffman::new(267);
        assert_eq!(model.weight(256), 1 + WARM_UP_COUNT as u32);
        assert_eq!(model.weight(266), 1 + WARM_UP_COUNT as u32);
        assert_eq!(model.weight(258), 1);
        assert!(model.symbol_cost(256) < model.symbol_cost(b'a' as usize));
        // only the main alphabet is warmed up
        let model = AdaptiveHuffman::new(8);
        assert_eq!(model.weight(7), 1);
    }

    #[test]
    fn two_symbols() {
        let mut model = AdaptiveHuffman::new(2);
        let mut bits = BitWriter::new();
        // symbol 1 is the right child of the root
        model.write_symbol(&mut bits, 1);
        assert_eq!(bits.bit_len(), 1);
        assert_eq!(bits.into_bytes(), [0x80]);
        model.check_tree().unwrap();
    }

    #[test]
    fn invariants_hold_while_adapting() {
        let mut rng = StdRng::seed_from_u64(0x4d5458);
        let mut model = AdaptiveHuffman::new(267);
        let mut bits = BitWriter::new();
        for _ in 0..5000 {
            // skewed towards low symbols
            let symbol = rng.gen_range(0..267usize).min(rng.gen_range(0..267usize));
            model.write_symbol(&mut bits, symbol);
            model.check_tree().unwrap();
        }
    }

    #[test]
    fn heavier_symbols_are_never_more_expensive() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut model = AdaptiveHuffman::new(64);
        let mut bits = BitWriter::new();
        for _ in 0..3000 {
            let symbol = rng.gen_range(0..64usize);
            model.write_symbol(&mut bits, symbol);
        }
        for a in 0..64 {
            for b in 0..64 {
                if model.weight(a) > model.weight(b) {
                    assert!(
                        model.symbol_cost(a) <= model.symbol_cost(b),
                        "symbol {a} (weight {}) costs more than {b} (weight {})",
                        model.weight(a),
                        model.weight(b)
                    );
                }
            }
        }
    }

    #[test]
    fn cost_matches_bits_written() {
        let mut model = AdaptiveHuffman::new(300);
        let mut bits = BitWriter::new();
        for symbol in [5, 5, 5, 299, 256, 5, 17] {
            let before = bits.bit_len();
            let cost = model.symbol_cost(symbol);
            model.write_symbol(&mut bits, symbol);
            assert_eq!((bits.bit_len() - before) as u32, cost);
        }
    }

    #[test]
    fn repeated_symbol_gets_cheaper() {
        let mut model = AdaptiveHuffman::new(8);
        let mut bits = BitWriter::new();
        for _ in 0..20 {
            model.write_symbol(&mut bits, 3);
        }
        assert_eq!(model.symbol_cost(3), 1);
    }

    #[test]
    fn decode_mirrors_encode() {
        let mut rng = StdRng::seed_from_u64(42);
        let symbols: Vec<usize> = (0..2000).map(|_| rng.gen_range(0..267)).collect();
        let mut encoder = AdaptiveHuffman::new(267);
        let mut bits = BitWriter::new();
        for &symbol in &symbols {
            encoder.write_symbol(&mut bits, symbol);
        }
        let bytes = bits.into_bytes();

        let mut decoder = AdaptiveHuffman::new(267);
        let mut reader = BitReader::new(&bytes);
        let decoded: Vec<_> = (0..symbols.len())
            .map(|_| decoder.read_symbol(&mut reader))
            .collect();
        assert_eq!(decoded, symbols);
    }
}
