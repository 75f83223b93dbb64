//! Forward-only view over a region of a backing buffer

use std::ops::Range;

use super::{
    decode_fixed32, decode_fixed64, decode_varint, encode_fixed32, encode_fixed64, encode_varint,
};
use crate::error::{Error, Result};

/// A `(base, cursor, end)` window into a backing buffer.
///
/// Offsets index the buffer the frame was created for; the frame never
/// touches bytes outside `base..end`. Decode and encode stacks use the same
/// type, passing the backing buffer to each read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFrame {
    base: usize,
    pos: usize,
    end: usize,
}

impl WireFrame {
    /// Frame over `range` with the cursor at its start
    #[must_use]
    pub const fn new(range: Range<usize>) -> Self {
        Self {
            base: range.start,
            pos: range.start,
            end: range.end,
        }
    }

    /// Offset of the first byte of the frame
    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Offset of the cursor
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Offset one past the last byte of the frame
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Bytes between base and cursor
    #[must_use]
    pub const fn used(&self) -> usize {
        self.pos - self.base
    }

    /// Bytes between cursor and end
    #[must_use]
    pub const fn left(&self) -> usize {
        self.end - self.pos
    }

    /// Range of bytes consumed or written so far
    #[must_use]
    pub const fn used_range(&self) -> Range<usize> {
        self.base..self.pos
    }

    /// Move the cursor forward by `n` bytes.
    pub fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.left() {
            return Err(Error::end_of_buffer(n, self.left()));
        }
        self.pos += n;
        Ok(())
    }

    /// Sub-frame starting `offset` bytes past the cursor and running to the
    /// end of this frame. The cursor does not move.
    pub fn split_after(&self, offset: usize) -> Result<Self> {
        if offset > self.left() {
            return Err(Error::end_of_buffer(offset, self.left()));
        }
        Ok(Self::new(self.pos + offset..self.end))
    }

    /// Bytes of `buf` between cursor and end. A buffer shorter than the
    /// frame is `EndOfBuffer`.
    fn remaining<'a>(&self, buf: &'a [u8]) -> Result<&'a [u8]> {
        let available = buf.len().saturating_sub(self.pos);
        buf.get(self.pos..self.end)
            .ok_or(Error::end_of_buffer(self.left(), available))
    }

    fn remaining_mut<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8]> {
        let available = buf.len().saturating_sub(self.pos);
        let left = self.left();
        buf.get_mut(self.pos..self.end)
            .ok_or(Error::end_of_buffer(left, available))
    }

    /// Read a varint at the cursor.
    pub fn read_varint(&mut self, buf: &[u8]) -> Result<u64> {
        let (value, len) = decode_varint(self.remaining(buf)?)?;
        self.pos += len;
        Ok(value)
    }

    /// Read a little-endian `u32` at the cursor.
    pub fn read_fixed32(&mut self, buf: &[u8]) -> Result<u32> {
        let value = decode_fixed32(self.remaining(buf)?)?;
        self.pos += 4;
        Ok(value)
    }

    /// Read a little-endian `u64` at the cursor.
    pub fn read_fixed64(&mut self, buf: &[u8]) -> Result<u64> {
        let value = decode_fixed64(self.remaining(buf)?)?;
        self.pos += 8;
        Ok(value)
    }

    /// Read a varint length followed by that many bytes, returning their range.
    pub fn read_length_delimited(&mut self, buf: &[u8]) -> Result<Range<usize>> {
        let len = usize::try_from(self.read_varint(buf)?).unwrap_or(usize::MAX);
        if len > self.left() {
            return Err(Error::end_of_buffer(len, self.left()));
        }
        let start = self.pos;
        self.pos += len;
        Ok(start..self.pos)
    }

    /// Write a varint at the cursor.
    pub fn write_varint(&mut self, buf: &mut [u8], value: u64) -> Result<()> {
        self.pos += encode_varint(value, self.remaining_mut(buf)?)?;
        Ok(())
    }

    /// Write a little-endian `u32` at the cursor.
    pub fn write_fixed32(&mut self, buf: &mut [u8], value: u32) -> Result<()> {
        self.pos += encode_fixed32(value, self.remaining_mut(buf)?)?;
        Ok(())
    }

    /// Write a little-endian `u64` at the cursor.
    pub fn write_fixed64(&mut self, buf: &mut [u8], value: u64) -> Result<()> {
        self.pos += encode_fixed64(value, self.remaining_mut(buf)?)?;
        Ok(())
    }

    /// Copy `bytes` from outside the buffer to the cursor.
    pub fn write_slice(&mut self, buf: &mut [u8], bytes: &[u8]) -> Result<()> {
        let dst = self
            .remaining_mut(buf)?
            .get_mut(..bytes.len())
            .ok_or(Error::end_of_buffer(bytes.len(), self.left()))?;
        dst.copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Move bytes already in `buf` to the cursor. `src` may overlap the
    /// destination.
    pub fn write_within(&mut self, buf: &mut [u8], src: Range<usize>) -> Result<()> {
        let len = src.len();
        if len > self.left() {
            return Err(Error::end_of_buffer(len, self.left()));
        }
        if src.start > src.end || src.end > buf.len() || self.pos + len > buf.len() {
            return Err(Error::end_of_buffer(
                len,
                buf.len().saturating_sub(self.pos.max(src.start)),
            ));
        }
        buf.copy_within(src, self.pos);
        self.pos += len;
        Ok(())
    }
}
