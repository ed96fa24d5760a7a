//! Convert a TrueType font to Embedded OpenType.
//!
//! The font data can optionally be compressed with MicroType Express, and the
//! packed MTX stream can be written out on its own for inspection.

use eot_write::{EotVersion, EotWriter, MtxWriter};
use read_fonts::FontRef;

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = flags::Args::from_env().map_err(Error::new)?;
    let version = match args.eot_version.as_deref() {
        None | Some("2.1") => EotVersion::V2_1,
        Some("2.2") => EotVersion::V2_2,
        Some(other) => {
            return Err(Error(format!(
                "unknown EOT version '{other}', expected 2.1 or 2.2"
            )))
        }
    };

    let bytes = std::fs::read(&args.input)
        .map_err(|e| Error(format!("failed to read {}: {e}", args.input.display())))?;
    let font = FontRef::new(&bytes).map_err(Error::new)?;
    log::info!(
        "read {} tables from {}",
        font.table_directory.num_tables(),
        args.input.display()
    );
    let mtx = MtxWriter::new().with_push_splitting(!args.no_push_split);

    if let Some(path) = &args.mtx {
        let blocks = mtx.encode_blocks(&font).map_err(Error::new)?;
        log::info!(
            "MTX blocks: {} byte font, {} bytes of push data, {} bytes of code",
            blocks.directory.len(),
            blocks.push.len(),
            blocks.code.len()
        );
        let packed = blocks.pack().map_err(Error::new)?;
        write_file(path, &packed)?;
        println!("{}: {} bytes of MTX", path.display(), packed.len());
    }

    let eot = EotWriter::new(args.compress)
        .with_version(version)
        .with_mtx_writer(mtx)
        .convert(&font)
        .map_err(Error::new)?;
    log::info!("{:?} header, compressed: {}", version, args.compress);
    write_file(&args.output, &eot)?;
    println!(
        "{} -> {}: {} bytes -> {} bytes ({:.1}%)",
        args.input.display(),
        args.output.display(),
        bytes.len(),
        eot.len(),
        100.0 * eot.len() as f64 / bytes.len().max(1) as f64
    );
    Ok(())
}

fn write_file(path: &std::path::Path, data: &[u8]) -> Result<(), Error> {
    std::fs::write(path, data)
        .map_err(|e| Error(format!("failed to write {}: {e}", path.display())))
}

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Convert a TrueType font to Embedded OpenType
        cmd args {
            /// The TrueType font to convert
            required input: PathBuf
            required -o, --output output: PathBuf
            /// Compress the font data with MicroType Express
            optional -c, --compress
            /// The header version to write, 2.1 (the default) or 2.2
            optional --eot-version eot_version: String
            /// Also write the packed MTX stream to this file
            optional --mtx mtx: PathBuf
            /// Keep push instructions in the glyph programs
            optional --no-push-split
        }
    }
}

#[derive(Clone, Debug)]
struct Error(String);

impl Error {
    fn new(t: impl std::fmt::Display) -> Self {
        Self(t.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for Error {}
