//! Small synthetic fonts for tests.

use read_fonts::types::Tag;

use crate::{FontBuilder, TableWriter};

pub(crate) const UNITS_PER_EM: u16 = 1000;
pub(crate) const CHECKSUM_ADJUSTMENT: u32 = 0x1234_5678;
pub(crate) const PANOSE: [u8; 10] = [2, 11, 6, 4, 2, 2, 2, 2, 2, 4];
pub(crate) const UNICODE_RANGES: [u32; 4] = [0xe000_02ff, 0x4000_201f, 0x0000_0008, 0x0000_0001];
pub(crate) const CODE_PAGES: [u32; 2] = [0x2000_019f, 0xdfd7_0000];
pub(crate) const SIMPLE_GLYPH_INSTRUCTIONS: &[u8] = &[0xb0, 0x05, 0x2a];
pub(crate) const CVT_VALUES: [i16; 5] = [0, 100, 400, -300, 5000];

pub(crate) const FAMILY: &str = "Test Sans";
pub(crate) const STYLE: &str = "Bold Italic";
pub(crate) const VERSION: &str = "Version 1.000";
pub(crate) const FULL_NAME: &str = "Test Sans Bold Italic";

/// A 54 byte `head` table.
pub(crate) fn head(index_to_loc_format: i16) -> Vec<u8> {
    let mut writer = TableWriter::new();
    writer.write(&0x0001_0000u32); // version
    writer.write(&0x0001_8000u32); // font revision
    writer.write(&CHECKSUM_ADJUSTMENT);
    writer.write(&0x5f0f_3cf5u32); // magic
    writer.write(&0u16); // flags
    writer.write(&UNITS_PER_EM);
    writer.write([0u32; 4].as_slice()); // created, modified
    writer.write([-5i16, -200, 600, 800].as_slice());
    writer.write(&0u16); // mac style
    writer.write(&8u16); // lowest rec ppem
    writer.write(&2i16); // font direction hint
    writer.write(&index_to_loc_format);
    writer.write(&0i16); // glyph data format
    writer.into_data()
}

/// A version 0.5 `maxp` table.
pub(crate) fn maxp(num_glyphs: u16) -> Vec<u8> {
    let mut writer = TableWriter::new();
    writer.write(&0x0000_5000u32);
    writer.write(&num_glyphs);
    writer.into_data()
}

pub(crate) fn hhea(number_of_h_metrics: u16) -> Vec<u8> {
    let mut writer = TableWriter::new();
    writer.write(&0x0001_0000u32);
    writer.write([800i16, -200, 0].as_slice()); // ascender, descender, line gap
    writer.write(&600u16); // advance width max
    writer.write([0i16; 11].as_slice());
    writer.write(&number_of_h_metrics);
    writer.into_data()
}

pub(crate) fn hmtx(advances: &[u16]) -> Vec<u8> {
    let mut writer = TableWriter::new();
    for &advance in advances {
        writer.write(&advance);
        writer.write(&0i16);
    }
    writer.into_data()
}

/// An `OS/2` table; version 0 stops before the code page ranges.
pub(crate) fn os2(version: u16) -> Vec<u8> {
    let mut writer = TableWriter::new();
    writer.write(&version);
    writer.write(&500i16); // average char width
    writer.write(&700u16); // weight class
    writer.write(&5u16); // width class
    writer.write(&0x0008u16); // fs type
    writer.write([0i16; 11].as_slice()); // sub/superscript, strikeout, family class
    writer.write(PANOSE.as_slice());
    writer.write(UNICODE_RANGES.as_slice());
    writer.write(&Tag::new(b"TEST"));
    writer.write(&0x0021u16); // fs selection: italic, bold
    writer.write([0x20u16, 0x7e].as_slice()); // first and last char
    writer.write([800i16, -200, 0].as_slice()); // typo metrics
    writer.write([800u16, 200].as_slice()); // win metrics
    if version >= 1 {
        writer.write(CODE_PAGES.as_slice());
    }
    writer.into_data()
}

/// A format 0 `name` table with one Macintosh record followed by Windows
/// English records for each entry.
pub(crate) fn name(entries: &[(u16, &str)]) -> Vec<u8> {
    let encoded: Vec<(u16, Vec<u8>)> = entries
        .iter()
        .map(|&(name_id, text)| {
            let bytes = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
            (name_id, bytes)
        })
        .collect();
    let raw: Vec<(u16, &[u8])> = encoded
        .iter()
        .map(|(name_id, bytes)| (*name_id, bytes.as_slice()))
        .collect();
    name_raw(&raw)
}

/// A `name` table whose Windows strings are the given UTF-16BE bytes.
pub(crate) fn name_raw(entries: &[(u16, &[u8])]) -> Vec<u8> {
    let mut records = TableWriter::new();
    let mut strings = TableWriter::new();
    let mac_family = b"Wrong Platform";
    records.write([1u16, 0, 0, 1, mac_family.len() as u16, 0].as_slice());
    strings.write_slice(mac_family);
    for &(name_id, text) in entries {
        let offset = strings.len() as u16;
        strings.write_slice(text);
        let len = strings.len() as u16 - offset;
        records.write([3u16, 1, 0x409, name_id, len, offset].as_slice());
    }
    let count = entries.len() as u16 + 1;
    let mut writer = TableWriter::new();
    writer.write(&0u16);
    writer.write(&count);
    writer.write(&(6 + 12 * count));
    writer.write_slice(records.as_slice());
    writer.write_slice(strings.as_slice());
    writer.into_data()
}

/// A simple glyph with unpacked flags and 16-bit coordinates.
pub(crate) fn simple_glyph(contours: &[&[(i16, i16, bool)]], instructions: &[u8]) -> Vec<u8> {
    let points: Vec<_> = contours.iter().flat_map(|c| c.iter().copied()).collect();
    let bbox = |f: fn(&(i16, i16, bool)) -> i16| {
        let values = points.iter().map(f);
        (values.clone().min().unwrap_or(0), values.max().unwrap_or(0))
    };
    let (x_min, x_max) = bbox(|p| p.0);
    let (y_min, y_max) = bbox(|p| p.1);

    let mut writer = TableWriter::new();
    writer.write(&(contours.len() as i16));
    writer.write([x_min, y_min, x_max, y_max].as_slice());
    let mut end = -1i32;
    for contour in contours {
        end += contour.len() as i32;
        writer.write(&(end as u16));
    }
    writer.write(&(instructions.len() as u16));
    writer.write_slice(instructions);
    for &(_, _, on_curve) in &points {
        writer.write(&u8::from(on_curve));
    }
    let mut last = 0i16;
    for &(x, _, _) in &points {
        writer.write(&(x - last));
        last = x;
    }
    let mut last = 0i16;
    for &(_, y, _) in &points {
        writer.write(&(y - last));
        last = y;
    }
    writer.into_data()
}

/// Two components, the first with word arguments and the second with a
/// scale.
pub(crate) fn composite_glyph() -> Vec<u8> {
    let mut writer = TableWriter::new();
    writer.write([-1i16, -5, 0, 600, 700].as_slice());
    // ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES | MORE_COMPONENTS
    writer.write([0x0023u16, 1].as_slice());
    writer.write([300i16, -10].as_slice());
    // ARGS_ARE_XY_VALUES | WE_HAVE_A_SCALE
    writer.write([0x000au16, 1].as_slice());
    writer.write([5u8, 6].as_slice());
    writer.write(&0x2000u16);
    writer.into_data()
}

/// Concatenated glyphs and a long `loca` for them.
pub(crate) fn glyf_and_loca(glyphs: &[&[u8]]) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = TableWriter::new();
    let mut loca = TableWriter::new();
    for glyph in glyphs {
        loca.write(&(glyf.len() as u32));
        glyf.write_slice(glyph);
    }
    loca.write(&(glyf.len() as u32));
    (glyf.into_data(), loca.into_data())
}

pub(crate) fn build_font(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut builder = FontBuilder::new();
    for (tag, data) in tables {
        builder.add_raw(Tag::new(tag), data.as_slice());
    }
    builder.build()
}

/// A three glyph font with every table the converters look at.
///
/// Glyph 0 is empty, glyph 1 is a simple glyph with one three point contour
/// and glyph 2 is a composite of two copies of glyph 1.
pub(crate) fn sample_font() -> Vec<u8> {
    let simple = simple_glyph(
        &[&[(0, 0, true), (0, 300, false), (-20, 310, true)]],
        SIMPLE_GLYPH_INSTRUCTIONS,
    );
    let composite = composite_glyph();
    let (glyf, loca) = glyf_and_loca(&[&[], simple.as_slice(), composite.as_slice()]);

    let mut cvt = TableWriter::new();
    cvt.write(CVT_VALUES.as_slice());

    let mut post = 0x0003_0000u32.to_be_bytes().to_vec();
    post.resize(32, 0);

    #[rustfmt::skip]
    let hdmx = vec![
        0, 0, 0, 1, 0, 0, 0, 8,
        12, 8, 6, 8, 7, 0, 0, 0,
    ];

    build_font(&[
        (b"head", head(1)),
        (b"maxp", maxp(3)),
        (b"hhea", hhea(2)),
        (b"hmtx", hmtx(&[500, 600])),
        (b"OS/2", os2(4)),
        (b"name", name(&[(1, FAMILY), (2, STYLE), (4, FULL_NAME), (5, VERSION)])),
        (b"loca", loca),
        (b"glyf", glyf),
        (b"cvt ", cvt.into_data()),
        (b"hdmx", hdmx),
        (b"VDMX", vec![0, 1, 0, 0, 0, 0]),
        (b"post", post),
    ])
}
