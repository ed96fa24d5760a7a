//! Errors that occur while converting a font

use read_fonts::{types::Tag, ReadError};

/// An error that prevented a font from being converted.
#[derive(Debug, Clone)]
pub enum Error {
    /// A table required for the conversion could not be parsed.
    Read(ReadError),
    /// A table required for the conversion is absent.
    MissingTable(Tag),
    /// A block is too large for the 24-bit lengths of the MTX container.
    BlockTooLarge { block: &'static str, len: usize },
}

impl From<ReadError> for Error {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::TableIsMissing(tag) => Error::MissingTable(tag),
            err => Error::Read(err),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Read(err) => write!(f, "failed to read font: {err}"),
            Error::MissingTable(tag) => write!(f, "font has no '{tag}' table"),
            Error::BlockTooLarge { block, len } => {
                write!(f, "{block} block is too large ({len} bytes)")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_is_not_a_read_error() {
        let tag = Tag::new(b"glyf");
        assert!(matches!(
            Error::from(ReadError::TableIsMissing(tag)),
            Error::MissingTable(t) if t == tag
        ));
        assert!(matches!(
            Error::from(ReadError::OutOfBounds),
            Error::Read(ReadError::OutOfBounds)
        ));
    }

    #[test]
    fn messages() {
        assert_eq!(
            Error::MissingTable(Tag::new(b"OS/2")).to_string(),
            "font has no 'OS/2' table"
        );
        assert_eq!(
            Error::BlockTooLarge {
                block: "code",
                len: 1 << 24
            }
            .to_string(),
            "code block is too large (16777216 bytes)"
        );
    }
}
