//!  A builder for the sfnt container inside an MTX stream

use std::borrow::Cow;
use std::collections::BTreeMap;

use read_fonts::types::Tag;

use crate::{FontWrite, TableWriter};

const TT_SFNT_VERSION: u32 = 0x0001_0000;
const TABLE_RECORD_LEN: usize = 16;
const INDEX_TO_LOC_FORMAT_OFFSET: usize = 50;

/// Build a font from some set of raw tables.
///
/// Tables are written in tag order. Every table record carries a zero
/// checksum: the decoder recomputes checksums when it rebuilds the font.
#[derive(Debug, Clone, Default)]
pub struct FontBuilder<'a> {
    tables: BTreeMap<Tag, Cow<'a, [u8]>>,
}

/// The binary search fields of a table directory header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchRange {
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

/// The largest power of two that is not greater than `x`, or zero.
pub fn search_range(x: u32) -> u32 {
    if x == 0 {
        0
    } else {
        1 << log2(x)
    }
}

/// The floor of the base two logarithm of `x`, or zero for zero.
pub fn log2(x: u32) -> u32 {
    x.checked_ilog2().unwrap_or(0)
}

impl SearchRange {
    /// Compute the search fields for `n_items` entries of `item_size` bytes.
    pub fn compute(n_items: usize, item_size: usize) -> Self {
        let n = n_items as u32;
        let search_range = search_range(n) as usize * item_size;
        SearchRange {
            search_range: search_range as u16,
            entry_selector: log2(n) as u16,
            range_shift: (n_items * item_size - search_range) as u16,
        }
    }
}

impl<'a> FontBuilder<'a> {
    /// Create a new builder to compile a binary font
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder method to add raw data for the provided tag
    pub fn add_raw(&mut self, tag: Tag, data: impl Into<Cow<'a, [u8]>>) -> &mut Self {
        self.tables.insert(tag, data.into());
        self
    }

    /// Returns `true` if the builder contains a table with this tag.
    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// Remove a table, returning its data if it was present.
    pub fn remove(&mut self, tag: Tag) -> Option<Cow<'a, [u8]>> {
        self.tables.remove(&tag)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Assemble all the tables into a binary font file with a [Table Directory].
    ///
    /// [Table Directory]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory
    pub fn build(&self) -> Vec<u8> {
        assert!(self.tables.len() <= u16::MAX as usize);
        let header_len = std::mem::size_of::<u32>() // sfnt
            + std::mem::size_of::<u16>() * 4 // num_tables to range_shift
            + self.tables.len() * TABLE_RECORD_LEN;
        let computed = SearchRange::compute(self.tables.len(), TABLE_RECORD_LEN);

        let mut writer = TableWriter::new();
        TT_SFNT_VERSION.write_into(&mut writer);
        (self.tables.len() as u16).write_into(&mut writer);
        computed.search_range.write_into(&mut writer);
        computed.entry_selector.write_into(&mut writer);
        computed.range_shift.write_into(&mut writer);

        let mut position = header_len as u32;
        for (tag, data) in &self.tables {
            tag.write_into(&mut writer);
            0u32.write_into(&mut writer); // checksum
            position.write_into(&mut writer);
            (data.len() as u32).write_into(&mut writer);
            position += round4(data.len()) as u32;
        }

        for table in self.tables.values() {
            writer.write_slice(table);
            let rem = round4(table.len()) - table.len();
            let padding = [0u8; 4];
            writer.write_slice(&padding[..rem]);
        }
        writer.into_data()
    }
}

/// <https://github.com/google/woff2/blob/a0d0ed7da27b708c0a4e96ad7a998bddc933c06e/src/round.h#L19>
fn round4(sz: usize) -> usize {
    (sz + 3) & !3
}

/// Rebuilds a `head` table, optionally with a new `indexToLocFormat`.
///
/// Every other field is copied from the source table.
#[derive(Clone, Debug)]
pub struct HeadBuilder<'a> {
    source: &'a [u8],
    index_to_loc_format: Option<i16>,
}

impl<'a> HeadBuilder<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        HeadBuilder {
            source,
            index_to_loc_format: None,
        }
    }

    pub fn set_index_to_loc_format(&mut self, format: i16) -> &mut Self {
        self.index_to_loc_format = Some(format);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = self.source.to_vec();
        if let Some(format) = self.index_to_loc_format {
            match data.get_mut(INDEX_TO_LOC_FORMAT_OFFSET..INDEX_TO_LOC_FORMAT_OFFSET + 2) {
                Some(field) => field.copy_from_slice(&format.to_be_bytes()),
                None => log::warn!("head is only {} bytes, not setting loca format", data.len()),
            }
        }
        data
    }
}
