//! The [Embedded OpenType] container.
//!
//! Every numeric header field is little-endian.
//!
//! [Embedded OpenType]: https://www.w3.org/submissions/EOT/

use read_fonts::{
    tables::name::{Name, NameId},
    types::Tag,
    FontData, FontRef, Offset, TableProvider,
};

use crate::{Error, FontWrite, LittleEndian, MtxWriter, TableWriter};

const OS2: Tag = Tag::new(b"OS/2");

const MAGIC_NUMBER: u16 = 0x504c;
const DEFAULT_CHARSET: u8 = 1;
const TT_COMPRESSED: u32 = 0x4;
const XOR_KEY: u32 = 0x5047_5342;

// OS/2 field offsets
const WEIGHT_CLASS: usize = 4;
const FS_TYPE: usize = 8;
const PANOSE: usize = 32;
const PANOSE_LEN: usize = 10;
const UNICODE_RANGE: usize = 42;
const FS_SELECTION: usize = 62;
const CODE_PAGE_RANGE: usize = 78;

/// The names stored in the header, in header order.
const HEADER_NAMES: [NameId; 4] = [
    NameId::FAMILY_NAME,
    NameId::SUBFAMILY_NAME,
    NameId::VERSION_STRING,
    NameId::FULL_NAME,
];

const WINDOWS_PLATFORM: u16 = 3;
const UNICODE_BMP_ENCODING: u16 = 1;
const ENGLISH_US: u16 = 0x409;

/// The header version to write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EotVersion {
    /// 0x00020001
    #[default]
    V2_1,
    /// 0x00020002, which adds the EUDC and signature fields.
    V2_2,
}

impl EotVersion {
    pub fn to_u32(self) -> u32 {
        match self {
            EotVersion::V2_1 => 0x0002_0001,
            EotVersion::V2_2 => 0x0002_0002,
        }
    }
}

/// Wraps a font in an EOT header, optionally compressing it first.
#[derive(Clone, Debug, Default)]
pub struct EotWriter {
    compress: bool,
    version: EotVersion,
    mtx: MtxWriter,
}

impl EotWriter {
    pub fn new(compress: bool) -> Self {
        EotWriter {
            compress,
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: EotVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the options used when compressing.
    pub fn with_mtx_writer(mut self, mtx: MtxWriter) -> Self {
        self.mtx = mtx;
        self
    }

    /// Write the EOT file for `font`.
    pub fn convert(&self, font: &FontRef) -> Result<Vec<u8>, Error> {
        let source = font.data();
        let compressed;
        let font_data = if self.compress {
            compressed = self.mtx.compress(font)?;
            compressed.as_slice()
        } else {
            source.as_ref()
        };
        let os2 = Os2::new(font.table_data(OS2).ok_or(Error::MissingTable(OS2))?);
        let name = font.name()?;
        let checksum_adjustment = font.head()?.checksum_adjustment();

        let mut body = TableWriter::new();
        body.write(&LittleEndian(font_data.len() as u32));
        body.write(&LittleEndian(self.version.to_u32()));
        let flags = if self.compress { TT_COMPRESSED } else { 0 };
        body.write(&LittleEndian(flags));
        body.write_slice(&os2.panose());
        DEFAULT_CHARSET.write_into(&mut body);
        u8::from(os2.u16_at(FS_SELECTION) & 1 == 1).write_into(&mut body);
        body.write(&LittleEndian(os2.u16_at(WEIGHT_CLASS) as u32));
        body.write(&LittleEndian(os2.u16_at(FS_TYPE)));
        body.write(&LittleEndian(MAGIC_NUMBER));
        for i in 0..4 {
            body.write(&LittleEndian(os2.u32_at(UNICODE_RANGE + 4 * i)));
        }
        for range in os2.code_page_ranges() {
            body.write(&LittleEndian(range));
        }
        body.write(&LittleEndian(checksum_adjustment));
        for _ in 0..4 {
            body.write(&LittleEndian(0u32)); // reserved
        }
        body.write(&LittleEndian(0u16)); // padding

        for name_id in HEADER_NAMES {
            let string = windows_name(&name, name_id);
            body.write(&LittleEndian(string.len() as u16));
            body.write_slice(&string);
            body.write(&LittleEndian(0u16)); // padding
        }
        body.write(&LittleEndian(0u16)); // root string size

        if self.version == EotVersion::V2_2 {
            body.write(&LittleEndian(XOR_KEY));
            body.write(&LittleEndian(0u32)); // EUDC code page
            body.write(&LittleEndian(0u16)); // padding
            body.write(&LittleEndian(0u16)); // signature size
            body.write(&LittleEndian(0u32)); // EUDC flags
            body.write(&LittleEndian(0u32)); // EUDC font size
        }
        body.write_slice(font_data);

        let eot_size = body.len() + std::mem::size_of::<u32>();
        log::debug!(
            "{} byte EOT, {} byte payload{}",
            eot_size,
            font_data.len(),
            if self.compress { " (compressed)" } else { "" }
        );
        let mut writer = TableWriter::new();
        writer.write(&LittleEndian(eot_size as u32));
        writer.write_slice(body.as_slice());
        Ok(writer.into_data())
    }
}

/// Field access for `OS/2` that falls back to zero past the end of a short
/// table.
struct Os2<'a> {
    data: FontData<'a>,
}

impl<'a> Os2<'a> {
    fn new(data: FontData<'a>) -> Self {
        Os2 { data }
    }

    fn u16_at(&self, offset: usize) -> u16 {
        self.data.read_at::<u16>(offset).unwrap_or_else(|_| {
            log::warn!("OS/2 is too short for the field at {offset}");
            0
        })
    }

    fn u32_at(&self, offset: usize) -> u32 {
        self.data.read_at::<u32>(offset).unwrap_or_else(|_| {
            log::warn!("OS/2 is too short for the field at {offset}");
            0
        })
    }

    fn panose(&self) -> [u8; PANOSE_LEN] {
        let mut panose = [0; PANOSE_LEN];
        match self.data.read_array::<u8>(PANOSE..PANOSE + PANOSE_LEN) {
            Ok(bytes) => panose.copy_from_slice(bytes),
            Err(_) => log::warn!("OS/2 is too short for PANOSE"),
        }
        panose
    }

    /// Version 0 tables have no code page ranges; Latin 1 is assumed.
    fn code_page_ranges(&self) -> [u32; 2] {
        if self.u16_at(0) == 0 {
            return [1, 0];
        }
        [self.u32_at(CODE_PAGE_RANGE), self.u32_at(CODE_PAGE_RANGE + 4)]
    }
}

/// The Windows US English string for `name_id`, as UTF-16LE.
///
/// The stored UTF-16BE bytes are swapped pairwise and otherwise kept as they
/// are, so unpaired surrogates survive.
fn windows_name(name: &Name, name_id: NameId) -> Vec<u8> {
    let record = name.name_record().iter().find(|record| {
        record.platform_id() == WINDOWS_PLATFORM
            && record.encoding_id() == UNICODE_BMP_ENCODING
            && record.language_id() == ENGLISH_US
            && record.name_id() == name_id
    });
    let Some(record) = record else {
        log::warn!("no Windows English name {name_id}");
        return Vec::new();
    };
    let start = record.string_offset().to_usize();
    let end = start + record.length() as usize;
    match name.string_data().read_array::<u8>(start..end) {
        Ok(bytes) => bytes
            .chunks_exact(2)
            .flat_map(|unit| [unit[1], unit[0]])
            .collect(),
        Err(e) => {
            log::warn!("name {name_id} is unreadable: {e}");
            Vec::new()
        }
    }
}
