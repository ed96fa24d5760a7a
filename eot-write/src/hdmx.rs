//! The compact `hdmx` encoding.
//!
//! Device widths are mostly predictable from the advance widths in `hmtx`,
//! so only the difference from the prediction (the "surprise") is stored,
//! in the unary code of [`MagnitudeDependentWriter`].

use mtx_compress::MagnitudeDependentWriter;
use read_fonts::{types::Tag, FontData, FontRef, ReadError, TableProvider};

use crate::{Error, TableWriter};

const HDMX: Tag = Tag::new(b"hdmx");
const HHEA: Tag = Tag::new(b"hhea");
const HMTX: Tag = Tag::new(b"hmtx");

/// version, number of records and record size
const HEADER_LEN: usize = 8;
const NUMBER_OF_H_METRICS_OFFSET: usize = 34;
const LONG_METRIC_LEN: usize = 4;

/// Encodes the `hdmx` table.
///
/// The header is copied as is, followed by the pixel size and maximum width
/// of every record and then the width surprises of every record in order.
#[derive(Clone, Copy, Debug, Default)]
pub struct HdmxEncoder;

impl HdmxEncoder {
    pub fn encode(font: &FontRef) -> Result<Vec<u8>, Error> {
        let hdmx = font.table_data(HDMX).ok_or(Error::MissingTable(HDMX))?;
        let units_per_em = font.head()?.units_per_em();
        let num_glyphs = font.maxp()?.num_glyphs() as usize;
        let advances = advance_widths(font, num_glyphs)?;
        Ok(Self::encode_table(hdmx, units_per_em, &advances)?)
    }

    /// Encode a raw `hdmx` table given the advance width of every glyph.
    pub fn encode_table(
        hdmx: FontData,
        units_per_em: u16,
        advances: &[u16],
    ) -> Result<Vec<u8>, ReadError> {
        let num_records = hdmx.read_at::<u16>(2)? as usize;
        let record_size = hdmx.read_at::<u32>(4)? as usize;
        let header = hdmx.slice(..HEADER_LEN).ok_or(ReadError::OutOfBounds)?;
        let record = |i: usize| HEADER_LEN + i * record_size;

        let mut writer = TableWriter::new();
        writer.write_slice(header.as_ref());
        for i in 0..num_records {
            let pixel_size = hdmx.read_at::<u8>(record(i))?;
            let max_width = hdmx.read_at::<u8>(record(i) + 1)?;
            writer.write_slice(&[pixel_size, max_width]);
        }

        let mut bits = MagnitudeDependentWriter::new();
        for i in 0..num_records {
            let ppem = hdmx.read_at::<u8>(record(i))?;
            let widths = hdmx
                .slice(record(i) + 2..record(i) + 2 + advances.len())
                .ok_or(ReadError::OutOfBounds)?;
            for (&width, &advance) in widths.as_ref().iter().zip(advances) {
                let expected = rounded_width(ppem, advance, units_per_em);
                bits.write_value(width as i32 - expected as i32);
            }
        }
        writer.write_slice(&bits.into_bytes());
        Ok(writer.into_data())
    }
}

/// The device width of an advance at `ppem`, rounded to whole pixels.
fn rounded_width(ppem: u8, advance: u16, units_per_em: u16) -> u32 {
    let upem = units_per_em.max(1) as u32;
    ((64 * ppem as u32 * advance as u32 + upem / 2) / upem + 32) / 64
}

/// The advance width of every glyph, read from `hhea` and `hmtx`.
///
/// Glyphs past the last long metric share its advance.
fn advance_widths(font: &FontRef, num_glyphs: usize) -> Result<Vec<u16>, Error> {
    let hhea = font.table_data(HHEA).ok_or(Error::MissingTable(HHEA))?;
    let hmtx = font.table_data(HMTX).ok_or(Error::MissingTable(HMTX))?;
    let n_metrics = hhea.read_at::<u16>(NUMBER_OF_H_METRICS_OFFSET)? as usize;
    if n_metrics == 0 {
        return Err(ReadError::MalformedData("hhea has no horizontal metrics").into());
    }
    (0..num_glyphs)
        .map(|gid| {
            let metric = gid.min(n_metrics - 1);
            hmtx.read_at::<u16>(metric * LONG_METRIC_LEN)
                .map_err(Error::from)
        })
        .collect()
}
