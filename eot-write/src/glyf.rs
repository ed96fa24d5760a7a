//! The compact glyph encoding used by MTX.
//!
//! Glyphs are written back to back into the glyph stream with no `loca`
//! to index them. Simple glyphs drop their bounding box and code each point
//! as a flag byte plus zero to four bytes of coordinate data. Composite
//! glyphs are kept as they are.
//!
//! Glyph programs are split in two: the values pushed by the leading run of
//! push instructions go to the push stream, the remaining bytes to the code
//! stream. The glyph stream records how many of each there are.

use read_fonts::{
    tables::glyf::{CompositeGlyphFlags, SimpleGlyph},
    types::Tag,
    FontData, FontRead, FontRef, ReadError, TableProvider,
};

use crate::{
    variable_length::{write_255_short, write_255_ushort},
    Error, TableWriter,
};

const GLYF: Tag = Tag::new(b"glyf");

/// number of contours and bounding box
const COMPOSITE_HEADER_LEN: usize = 10;

const NPUSHB: u8 = 0x40;
const NPUSHW: u8 = 0x41;
const PUSHB000: u8 = 0xB0;
const PUSHW000: u8 = 0xB8;
const PUSHW111: u8 = 0xBF;

const HOP3_CODE: u8 = 251;
const HOP4_CODE: u8 = 252;

/// The three streams produced by a [`GlyfEncoder`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyfStreams {
    pub glyf: Vec<u8>,
    pub push: Vec<u8>,
    pub code: Vec<u8>,
}

/// Encodes glyph outlines and programs into the MTX glyph streams.
#[derive(Clone, Debug, Default)]
pub struct GlyfEncoder {
    split_push: bool,
    glyf: TableWriter,
    push: TableWriter,
    code: TableWriter,
}

impl GlyfEncoder {
    /// Create a new encoder.
    ///
    /// If `split_push` is `false` every glyph program goes to the code
    /// stream unchanged and the push stream stays empty.
    pub fn new(split_push: bool) -> Self {
        GlyfEncoder {
            split_push,
            ..Default::default()
        }
    }

    /// Encode every glyph of `font`, in glyph id order.
    pub fn encode(&mut self, font: &FontRef) -> Result<(), Error> {
        let loca = font.loca(None)?;
        let glyf = crate::table_bytes(font, GLYF).ok_or(Error::MissingTable(GLYF))?;
        log::debug!("encoding {} glyphs", loca.len());
        for gid in 0..loca.len() {
            let glyph = loca
                .get_raw(gid)
                .zip(loca.get_raw(gid + 1))
                .and_then(|(start, end)| glyf.get(start as usize..end as usize));
            match glyph {
                Some(data) => self.encode_glyph(data),
                None => {
                    log::warn!("glyph {gid} has bad loca offsets, writing it as empty");
                    self.encode_glyph(&[]);
                }
            }
        }
        Ok(())
    }

    /// Encode a single glyph from its raw `glyf` data.
    ///
    /// Empty data is written as an empty glyph, as is a glyph that fails to
    /// parse.
    pub fn encode_glyph(&mut self, data: &[u8]) {
        let font_data = FontData::new(data);
        let result = match font_data.read_at::<i16>(0) {
            Err(_) => {
                self.glyf.write(&0i16);
                Ok(())
            }
            Ok(n) if n >= 0 => {
                SimpleGlyph::read(font_data).and_then(|glyph| self.write_simple_glyph(&glyph))
            }
            Ok(_) => self.write_composite_glyph(data),
        };
        if let Err(e) = result {
            log::warn!("malformed glyph ({e}), writing it as empty");
            self.glyf.write(&0i16);
        }
    }

    pub fn glyf_bytes(&self) -> &[u8] {
        self.glyf.as_slice()
    }

    pub fn push_bytes(&self) -> &[u8] {
        self.push.as_slice()
    }

    pub fn code_bytes(&self) -> &[u8] {
        self.code.as_slice()
    }

    pub fn into_streams(self) -> GlyfStreams {
        GlyfStreams {
            glyf: self.glyf.into_data(),
            push: self.push.into_data(),
            code: self.code.into_data(),
        }
    }

    fn write_simple_glyph(&mut self, glyph: &SimpleGlyph) -> Result<(), ReadError> {
        let end_points = glyph.end_pts_of_contours();
        let n_points = end_points.last().map_or(0, |end| end.get() as usize + 1);
        let points: Vec<_> = glyph.points().collect();
        if points.len() != n_points {
            return Err(ReadError::MalformedData("glyph point data is truncated"));
        }

        self.glyf.write(&glyph.number_of_contours());
        // the first contour is written as its point count minus one
        let mut last_end = None;
        for end in end_points {
            let end = end.get();
            let count = last_end.map_or(end, |last: u16| end.wrapping_sub(last));
            write_255_ushort(&mut self.glyf, count);
            last_end = Some(end);
        }

        let mut coords = TableWriter::new();
        let (mut x, mut y) = (0i32, 0i32);
        for point in points {
            let (px, py) = (point.x as i32, point.y as i32);
            write_triplet(&mut self.glyf, &mut coords, point.on_curve, px - x, py - y);
            (x, y) = (px, py);
        }
        self.glyf.write_slice(coords.as_slice());

        if glyph.number_of_contours() > 0 {
            self.write_instructions(glyph.instructions());
        }
        Ok(())
    }

    fn write_composite_glyph(&mut self, data: &[u8]) -> Result<(), ReadError> {
        let font_data = FontData::new(data);
        let mut pos = COMPOSITE_HEADER_LEN;
        let mut flags;
        loop {
            flags = CompositeGlyphFlags::from_bits_truncate(font_data.read_at::<u16>(pos)?);
            // flags and glyph index
            pos += 4;
            pos += if flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS) {
                4
            } else {
                2
            };
            if flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
                pos += 2;
            } else if flags.contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
                pos += 4;
            } else if flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
                pos += 8;
            }
            if !flags.contains(CompositeGlyphFlags::MORE_COMPONENTS) {
                break;
            }
        }
        let bbox = data.get(2..COMPOSITE_HEADER_LEN).ok_or(ReadError::OutOfBounds)?;
        let components = data
            .get(COMPOSITE_HEADER_LEN..pos)
            .ok_or(ReadError::OutOfBounds)?;
        let instructions = if flags.contains(CompositeGlyphFlags::WE_HAVE_INSTRUCTIONS) {
            let len = font_data.read_at::<u16>(pos)? as usize;
            let start = pos + 2;
            Some(data.get(start..start + len).ok_or(ReadError::OutOfBounds)?)
        } else {
            None
        };

        self.glyf.write(&-1i16);
        self.glyf.write_slice(bbox);
        self.glyf.write_slice(components);
        if let Some(instructions) = instructions {
            self.write_instructions(instructions);
        }
        Ok(())
    }

    fn write_instructions(&mut self, instructions: &[u8]) {
        let (values, code) = if self.split_push {
            split_push(instructions)
        } else {
            (Vec::new(), instructions)
        };
        // both are bounded by the u16 instruction length
        write_255_ushort(&mut self.glyf, values.len() as u16);
        write_255_ushort(&mut self.glyf, code.len() as u16);
        encode_push_sequence(&mut self.push, &values);
        self.code.write_slice(code);
    }
}

/// Write one point as a flag byte into `flags` and its coordinate bytes into
/// `coords`.
///
/// `dx` and `dy` are relative to the previous point.
fn write_triplet(
    flags: &mut TableWriter,
    coords: &mut TableWriter,
    on_curve: bool,
    dx: i32,
    dy: i32,
) {
    let abs_x = dx.unsigned_abs();
    let abs_y = dy.unsigned_abs();
    let on_curve_bit = if on_curve { 0 } else { 0x80 };
    let x_sign = u32::from(dx >= 0);
    let y_sign = u32::from(dy >= 0);
    let xy_signs = x_sign + 2 * y_sign;

    let flag = if dx == 0 && abs_y < 1280 {
        coords.write(&((abs_y & 0xff) as u8));
        ((abs_y & 0xf00) >> 7) + y_sign
    } else if dy == 0 && abs_x < 1280 {
        coords.write(&((abs_x & 0xff) as u8));
        10 + ((abs_x & 0xf00) >> 7) + x_sign
    } else if abs_x < 65 && abs_y < 65 {
        // neither can be zero here: that case was handled above
        let (x, y) = (abs_x - 1, abs_y - 1);
        coords.write(&((((x & 0xf) << 4) | (y & 0xf)) as u8));
        20 + (x & 0x30) + ((y & 0x30) >> 2) + xy_signs
    } else if abs_x < 769 && abs_y < 769 {
        let (x, y) = (abs_x - 1, abs_y - 1);
        coords.write_slice(&[(x & 0xff) as u8, (y & 0xff) as u8]);
        84 + 12 * ((x & 0x300) >> 8) + ((y & 0x300) >> 6) + xy_signs
    } else if abs_x < 4096 && abs_y < 4096 {
        coords.write_slice(&[
            (abs_x >> 4) as u8,
            (((abs_x & 0xf) << 4) | (abs_y >> 8)) as u8,
            (abs_y & 0xff) as u8,
        ]);
        120 + xy_signs
    } else {
        coords.write(&(abs_x as u16));
        coords.write(&(abs_y as u16));
        124 + xy_signs
    };
    flags.write(&((flag + on_curve_bit) as u8));
}

/// Split the leading push instructions off a glyph program.
///
/// Returns the pushed values and the remaining code. The run stops at the
/// first instruction that is not a push, or at a push whose operands run
/// past the end of the program.
fn split_push(instructions: &[u8]) -> (Vec<i16>, &[u8]) {
    let mut values = Vec::new();
    let mut i = 0;
    while let Some(&op) = instructions.get(i) {
        let mut ix = i + 1;
        let (count, word_size) = match op {
            NPUSHB | NPUSHW => {
                let Some(&count) = instructions.get(ix) else {
                    break;
                };
                ix += 1;
                (count as usize, if op == NPUSHW { 2 } else { 1 })
            }
            PUSHB000..=PUSHW111 => (1 + (op & 7) as usize, if op >= PUSHW000 { 2 } else { 1 }),
            _ => break,
        };
        let end = ix + count * word_size;
        let Some(operands) = instructions.get(ix..end) else {
            log::warn!("push at {i} overruns the glyph program, keeping it as code");
            break;
        };
        if word_size == 2 {
            values.extend(
                operands
                    .chunks_exact(2)
                    .map(|word| i16::from_be_bytes([word[0], word[1]])),
            );
        } else {
            values.extend(operands.iter().map(|&byte| byte as i16));
        }
        i = end;
    }
    (values, &instructions[i..])
}

/// Write pushed values, replacing a value that equals the ones two before
/// and two after it with a hop code.
///
/// `HOP3` stands for `A x A` following an `A` already written and `HOP4` for
/// `A x A y A`; the values marked `A` are implied.
fn encode_push_sequence(writer: &mut TableWriter, values: &[i16]) {
    let n = values.len();
    let mut hop_skip = 0u32;
    for (i, &value) in values.iter().enumerate() {
        if hop_skip & 1 == 0 {
            if hop_skip == 0
                && i >= 2
                && i + 2 < n
                && value == values[i - 2]
                && value == values[i + 2]
            {
                if i + 4 < n && value == values[i + 4] {
                    writer.write(&HOP4_CODE);
                    hop_skip = 0x14;
                } else {
                    writer.write(&HOP3_CODE);
                    hop_skip = 4;
                }
            } else {
                write_255_short(writer, value);
            }
        }
        hop_skip >>= 1;
    }
}
