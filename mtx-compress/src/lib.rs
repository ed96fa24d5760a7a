//! The compression layer of MicroType Express (MTX).
//!
//! MTX packs a font into three blocks and runs each of them through an LZ77
//! style compressor whose output symbols are coded with adaptive Huffman
//! trees. This crate provides that compressor, [`compress`], along with the
//! two bit writers the format uses:
//!
//! - [`BitWriter`] packs bits most-significant first and carries the
//!   compressed stream.
//! - [`MagnitudeDependentWriter`] packs bits least-significant first and is
//!   used for small signed values such as `hdmx` width deltas.
//!
//! The compressor is deterministic: the same input always yields the same
//! bytes.
//!
//! ```
//! let text = b"the quick brown fox jumps over the lazy dog; the quick brown fox";
//! let compressed = mtx_compress::compress(text);
//! assert!(!compressed.is_empty());
//! ```

#![forbid(unsafe_code)]

mod bits;
mod huffman;
mod lzcomp;
mod preload;

#[cfg(test)]
mod decode;

pub use bits::{BitWriter, MagnitudeDependentWriter};
pub use huffman::{AdaptiveHuffman, TreeError};
pub use lzcomp::{compress, MAX_INPUT_LEN};
pub use preload::{preload, PRELOAD_SIZE};
