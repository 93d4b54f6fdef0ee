//! Binary Codec - Tile Flags Wire Format
//!
//! Layout (little-endian):
//!
//! | Offset | Field            | Type                |
//! |--------|------------------|---------------------|
//! | 0      | `tile_count`     | `u32`               |
//! | 4      | `format_version` | `u32`               |
//! | 8      | frame important  | `tile_count` x `u8` |
//! | 8 + N  | solid            | `tile_count` x `u8` |
//!
//! Flag bytes are exactly `0` or `1`. Total length is `8 + 2 * N`.

use thiserror::Error;

use crate::snapshot::TileFlagsSnapshot;

pub const FORMAT_VERSION: u32 = 1;
pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated input: header declares {expected} bytes, found {found}")]
    TruncatedInput { expected: usize, found: usize },

    #[error("trailing data: header declares {expected} bytes, found {found}")]
    TrailingData { expected: usize, found: usize },

    #[error("unsupported format version {0} (expected {FORMAT_VERSION})")]
    UnsupportedVersion(u32),

    #[error("invalid boolean byte 0x{value:02x} at offset {offset}")]
    InvalidBoolean { offset: usize, value: u8 },
}

/// Exact encoded size for `tile_count` tiles, `None` if it overflows `usize`.
pub fn encoded_len(tile_count: u32) -> Option<usize> {
    usize::try_from(tile_count)
        .ok()?
        .checked_mul(2)?
        .checked_add(HEADER_LEN)
}

pub fn encode(snapshot: &TileFlagsSnapshot) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(snapshot.tile_count()).unwrap_or(0));
    write_u32_le(&mut out, snapshot.tile_count());
    write_u32_le(&mut out, FORMAT_VERSION);
    out.extend(snapshot.frame_important().iter().map(|&f| u8::from(f)));
    out.extend(snapshot.solid().iter().map(|&s| u8::from(s)));
    out
}

pub fn decode(bytes: &[u8]) -> Result<TileFlagsSnapshot, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::TruncatedInput { expected: HEADER_LEN, found: bytes.len() });
    }

    let tile_count = read_u32_le(&bytes[0..4]);
    let version = read_u32_le(&bytes[4..8]);
    if version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    // A declared size beyond the address space can never be satisfied
    let expected = encoded_len(tile_count).unwrap_or(usize::MAX);
    if bytes.len() < expected {
        return Err(DecodeError::TruncatedInput { expected, found: bytes.len() });
    }
    if bytes.len() > expected {
        return Err(DecodeError::TrailingData { expected, found: bytes.len() });
    }

    let n = tile_count as usize;
    let frame_important = read_flags(bytes, HEADER_LEN, n)?;
    let solid = read_flags(bytes, HEADER_LEN + n, n)?;

    log::debug!("decoded tile flags: {} tiles", tile_count);

    // Both regions are `n` long, so construction cannot fail.
    TileFlagsSnapshot::new(frame_important, solid).map_err(|_| DecodeError::TruncatedInput {
        expected,
        found: bytes.len(),
    })
}

fn read_flags(bytes: &[u8], start: usize, len: usize) -> Result<Vec<bool>, DecodeError> {
    bytes[start..start + len]
        .iter()
        .enumerate()
        .map(|(i, &value)| match value {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(DecodeError::InvalidBoolean { offset: start + i, value }),
        })
        .collect()
}

fn write_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}
