//! Fixed-width little-endian integers

use crate::error::{Error, Result};

/// Read a little-endian `u32` from the start of `buf`.
pub fn decode_fixed32(buf: &[u8]) -> Result<u32> {
    match buf.first_chunk::<4>() {
        Some(bytes) => Ok(u32::from_le_bytes(*bytes)),
        None => Err(Error::end_of_buffer(4, buf.len())),
    }
}

/// Read a little-endian `u64` from the start of `buf`.
pub fn decode_fixed64(buf: &[u8]) -> Result<u64> {
    match buf.first_chunk::<8>() {
        Some(bytes) => Ok(u64::from_le_bytes(*bytes)),
        None => Err(Error::end_of_buffer(8, buf.len())),
    }
}

/// Write `value` little-endian at the start of `out`.
pub fn encode_fixed32(value: u32, out: &mut [u8]) -> Result<usize> {
    let available = out.len();
    let dst = out
        .first_chunk_mut::<4>()
        .ok_or(Error::end_of_buffer(4, available))?;
    *dst = value.to_le_bytes();
    Ok(4)
}

/// Write `value` little-endian at the start of `out`.
pub fn encode_fixed64(value: u64, out: &mut [u8]) -> Result<usize> {
    let available = out.len();
    let dst = out
        .first_chunk_mut::<8>()
        .ok_or(Error::end_of_buffer(8, available))?;
    *dst = value.to_le_bytes();
    Ok(8)
}
