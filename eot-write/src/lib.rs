//! Writing Embedded OpenType (EOT) files.
//!
//! This crate converts a TrueType font into an EOT file, optionally
//! compressing the font data with MicroType Express (MTX).
//!
//! MTX compression works in two stages. First the font is rewritten into
//! three blocks ([`MtxBlocks`]):
//!
//! - a rebuilt sfnt where `glyf`, `cvt ` and `hdmx` hold compact encodings,
//!   `loca` is empty and `VDMX` is dropped,
//! - the values of the leading push instructions of every glyph program,
//! - the rest of every glyph program.
//!
//! Each block is then compressed with [`mtx_compress::compress`] and the
//! three results are packed behind a ten byte header.
//!
//! # Example
//!
//! ```no_run
//! use eot_write::{EotVersion, EotWriter};
//! use read_fonts::FontRef;
//!
//! let bytes = std::fs::read("MyFont.ttf").unwrap();
//! let font = FontRef::new(&bytes).unwrap();
//! let eot = EotWriter::new(true)
//!     .with_version(EotVersion::V2_2)
//!     .convert(&font)
//!     .unwrap();
//! std::fs::write("MyFont.eot", eot).unwrap();
//! ```

#![forbid(unsafe_code)]

mod cvt;
mod eot;
mod error;
mod font_builder;
mod glyf;
mod hdmx;
mod mtx;
mod variable_length;
mod write;

#[cfg(test)]
mod testing;

pub use cvt::CvtEncoder;
pub use eot::{EotVersion, EotWriter};
pub use error::Error;
pub use font_builder::{log2, search_range, FontBuilder, HeadBuilder, SearchRange};
pub use glyf::{GlyfEncoder, GlyfStreams};
pub use hdmx::HdmxEncoder;
pub use mtx::{MtxBlocks, MtxWriter};
pub use variable_length::{write_255_short, write_255_ushort};
pub use write::{FontWrite, LittleEndian, TableWriter};

pub extern crate mtx_compress;
pub extern crate read_fonts;

/// The raw bytes of a table, borrowed from the font.
pub(crate) fn table_bytes<'a>(
    font: &read_fonts::FontRef<'a>,
    tag: read_fonts::types::Tag,
) -> Option<&'a [u8]> {
    let data = font.table_data(tag)?;
    data.read_array(0..data.len()).ok()
}
