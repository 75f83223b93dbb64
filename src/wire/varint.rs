//! Base-128 varints and zig-zag mapping

use crate::error::{Error, Result};

/// Longest encoding of a 64-bit varint
pub const MAX_VARINT_LEN: usize = 10;

/// Decode a varint from the start of `buf`.
///
/// Returns the value and the number of bytes consumed. A continuation bit on
/// the last available byte is [`Error::EndOfBuffer`]; a tenth byte carrying
/// anything beyond bit 63 is [`Error::MalformedVarint`].
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;

    for (i, &byte) in buf.iter().enumerate().take(MAX_VARINT_LEN) {
        let bits = u64::from(byte & 0x7f);
        if i == MAX_VARINT_LEN - 1 && (byte & 0x80 != 0 || bits > 1) {
            return Err(Error::MalformedVarint);
        }
        value |= bits << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(Error::end_of_buffer(buf.len() + 1, buf.len()))
}

/// Number of bytes the canonical encoding of `value` occupies
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Encode `value` at the start of `out` in its minimal form.
///
/// Nothing is written when `out` is too short.
pub fn encode_varint(value: u64, out: &mut [u8]) -> Result<usize> {
    let len = varint_len(value);
    let Some(dst) = out.get_mut(..len) else {
        return Err(Error::end_of_buffer(len, out.len()));
    };

    let mut rest = value;
    for byte in dst.iter_mut() {
        // Truncation keeps the low seven bits
        #[allow(clippy::cast_possible_truncation)]
        let low = (rest & 0x7f) as u8;
        rest >>= 7;
        *byte = if rest == 0 { low } else { low | 0x80 };
    }

    Ok(len)
}

/// Zig-zag map a 32-bit signed integer
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse of [`zigzag_encode32`]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn zigzag_decode32(u: u32) -> i32 {
    ((u >> 1) as i32) ^ -((u & 1) as i32)
}

/// Zig-zag map a 64-bit signed integer
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag_encode64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag_encode64`]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn zigzag_decode64(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}
