//! Rewriting a font into the three MTX blocks.

use mtx_compress::{compress, MAX_INPUT_LEN, PRELOAD_SIZE};
use read_fonts::{
    types::{Tag, Uint24},
    FontRef,
};

use crate::{
    font_builder::{FontBuilder, HeadBuilder},
    CvtEncoder, Error, FontWrite, GlyfEncoder, HdmxEncoder, TableWriter,
};

const HEAD: Tag = Tag::new(b"head");
const GLYF: Tag = Tag::new(b"glyf");
const LOCA: Tag = Tag::new(b"loca");
const CVT: Tag = Tag::new(b"cvt ");
const HDMX: Tag = Tag::new(b"hdmx");
const VDMX: Tag = Tag::new(b"VDMX");

/// Tables that are dropped or replaced by their compact encodings.
const REWRITTEN_TABLES: [Tag; 6] = [VDMX, GLYF, CVT, LOCA, HDMX, HEAD];

const MTX_FORMAT: u8 = 3;
/// format byte and three 24-bit fields
const MTX_HEADER_LEN: usize = 10;

/// The three uncompressed MTX blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MtxBlocks {
    /// The rebuilt font, with the compact tables.
    pub directory: Vec<u8>,
    /// Values split off the leading push instructions of glyph programs.
    pub push: Vec<u8>,
    /// The remaining glyph program bytes.
    pub code: Vec<u8>,
}

/// Converts a font to MicroType Express.
#[derive(Clone, Debug)]
pub struct MtxWriter {
    split_push: bool,
}

impl Default for MtxWriter {
    fn default() -> Self {
        MtxWriter { split_push: true }
    }
}

impl MtxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to move the leading pushes of glyph programs into their own
    /// block. This is on by default.
    pub fn with_push_splitting(mut self, split_push: bool) -> Self {
        self.split_push = split_push;
        self
    }

    /// Rewrite `font` into the three uncompressed blocks.
    pub fn encode_blocks(&self, font: &FontRef) -> Result<MtxBlocks, Error> {
        let mut builder = FontBuilder::new();
        for record in font.table_directory.table_records() {
            let tag = record.tag();
            if REWRITTEN_TABLES.contains(&tag) {
                continue;
            }
            match crate::table_bytes(font, tag) {
                Some(data) => {
                    builder.add_raw(tag, data);
                }
                None => log::warn!("data for '{tag}' is malformed"),
            }
        }

        let head = crate::table_bytes(font, HEAD).ok_or(Error::MissingTable(HEAD))?;
        builder.add_raw(HEAD, HeadBuilder::new(head).build());

        let mut glyf = GlyfEncoder::new(self.split_push);
        glyf.encode(font)?;
        let streams = glyf.into_streams();
        builder.add_raw(GLYF, streams.glyf);
        builder.add_raw(LOCA, Vec::new());

        if let Some(cvt) = font.table_data(CVT) {
            builder.add_raw(CVT, CvtEncoder::encode(&CvtEncoder::values(cvt)?));
        }
        if font.table_data(HDMX).is_some() {
            builder.add_raw(HDMX, HdmxEncoder::encode(font)?);
        }
        if font.table_data(VDMX).is_some() {
            log::debug!("dropping VDMX");
        }

        let directory = builder.build();
        log::debug!(
            "blocks: {} byte font, {} bytes of push data, {} bytes of code",
            directory.len(),
            streams.push.len(),
            streams.code.len()
        );
        Ok(MtxBlocks {
            directory,
            push: streams.push,
            code: streams.code,
        })
    }

    /// Rewrite and compress `font`.
    pub fn compress(&self, font: &FontRef) -> Result<Vec<u8>, Error> {
        self.encode_blocks(font)?.pack()
    }
}

impl MtxBlocks {
    /// Compress the blocks and pack them behind the MTX header.
    ///
    /// The header is the format byte, then as 24-bit big-endian values the
    /// copy limit (the longest block plus the preload), and the offsets of
    /// the second and third compressed blocks.
    pub fn pack(&self) -> Result<Vec<u8>, Error> {
        let blocks = [
            ("directory", &self.directory),
            ("push", &self.push),
            ("code", &self.code),
        ];
        for (block, data) in blocks {
            if data.len() > MAX_INPUT_LEN {
                return Err(Error::BlockTooLarge {
                    block,
                    len: data.len(),
                });
            }
        }
        let longest = blocks.iter().map(|(_, data)| data.len()).max().unwrap_or(0);
        let copy_dist = uint24(longest + PRELOAD_SIZE, "directory")?;

        let [first, second, third] = blocks.map(|(_, data)| compress(data));
        let offset2 = MTX_HEADER_LEN + first.len();
        let offset3 = offset2 + second.len();

        let mut writer = TableWriter::new();
        MTX_FORMAT.write_into(&mut writer);
        copy_dist.write_into(&mut writer);
        uint24(offset2, "push")?.write_into(&mut writer);
        uint24(offset3, "code")?.write_into(&mut writer);
        writer.write_slice(&first);
        writer.write_slice(&second);
        writer.write_slice(&third);
        Ok(writer.into_data())
    }
}

fn uint24(value: usize, block: &'static str) -> Result<Uint24, Error> {
    u32::try_from(value)
        .ok()
        .and_then(Uint24::checked_new)
        .ok_or(Error::BlockTooLarge { block, len: value })
}
