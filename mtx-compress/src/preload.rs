//! The dictionary both sides of the compressor start from.

/// The length of the [`preload`] dictionary in bytes.
pub const PRELOAD_SIZE: usize = 2 * 32 * 96 + 2 * 2 * 256;

/// Byte pairs that are common in font tables.
///
/// Every control byte followed by every printable ASCII byte, then every
/// byte preceded by `0x00`, then every byte preceded by `0xFF`. Matches may
/// reach back into this data as though it preceded the input.
pub fn preload() -> Vec<u8> {
    let mut out = Vec::with_capacity(PRELOAD_SIZE);
    for control in 0u8..32 {
        for printable in 32u8..128 {
            out.extend([control, printable]);
        }
    }
    for high in [0x00u8, 0xFF] {
        for low in 0..=u8::MAX {
            out.extend([high, low]);
        }
    }
    out
}
