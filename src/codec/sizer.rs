//! Measure-or-write field encoding and the two-pass writer
//!
//! [`encode_field`] runs the same conversion as the single-pass encoder and
//! either only counts bytes (`dest = None`) or also writes them. The
//! [`TwoPassWriter`] builds on it: every nested message is produced by a
//! closure that runs once to measure and once to write into an exactly
//! sized slice, so no gap is ever reserved or moved.

use std::ptr;

use bytes::{Bytes, BytesMut};
use tracing::{instrument, trace};

use super::config::CodecConfig;
use super::convert::{WireValue, field_key, field_len, write_field};
use crate::error::{Error, Result};
use crate::schema::{FieldDescriptor, MessageDescriptor, Value};
use crate::wire::{WireFrame, WireType, varint_len};

/// Encode one field, or only compute its size when `dest` is `None`.
///
/// Returns the number of bytes the field occupies. A destination that is
/// too short is rejected before anything is written.
pub fn encode_field(
    field: &FieldDescriptor,
    value: Value<'_>,
    in_packed_run: bool,
    dest: Option<&mut [u8]>,
) -> Result<usize> {
    let wire = WireValue::from_value(field, value, in_packed_run)?;
    let key = field_key(field, &wire, in_packed_run);
    let len = field_len(key, &wire);

    if let Some(dest) = dest {
        if dest.len() < len {
            return Err(Error::end_of_buffer(len, dest.len()));
        }
        let mut frame = WireFrame::new(0..len);
        write_field(&mut frame, dest, key, &wire)?;
    }
    Ok(len)
}

/// Encode the key and length that precede a `len`-byte nested message or
/// packed run, or only compute their size.
pub fn encode_delimited_header(
    field: &FieldDescriptor,
    len: usize,
    dest: Option<&mut [u8]>,
) -> Result<usize> {
    let key = field.key(WireType::LengthDelimited);
    let header = varint_len(key) + varint_len(len as u64);

    if let Some(dest) = dest {
        if dest.len() < header {
            return Err(Error::end_of_buffer(header, dest.len()));
        }
        let mut frame = WireFrame::new(0..header);
        frame.write_varint(dest, key)?;
        frame.write_varint(dest, len as u64)?;
    }
    Ok(header)
}

/// Dual-mode field encoder that tracks an open packed run.
///
/// Carries no buffer state; each call is handed its destination, if any.
#[derive(Debug, Default, Clone, Copy)]
pub struct SizeOrWriteEncoder {
    run: Option<&'static FieldDescriptor>,
}

impl SizeOrWriteEncoder {
    /// Encoder with no packed run open
    #[must_use]
    pub const fn new() -> Self {
        Self { run: None }
    }

    /// Field whose packed run is open, if any
    #[must_use]
    pub const fn packed_run(&self) -> Option<&'static FieldDescriptor> {
        self.run
    }

    /// Start emitting unkeyed elements of a packed repeated `field`.
    pub fn packed_start(&mut self, field: &'static FieldDescriptor) -> Result<()> {
        if self.run.is_some() {
            return Err(Error::InvalidState("packed runs cannot nest"));
        }
        if !field.is_packed_repeated() {
            return Err(Error::InvalidState("field is not packed repeated"));
        }
        self.run = Some(field);
        Ok(())
    }

    /// Close the open packed run.
    pub fn packed_end(&mut self) -> Result<()> {
        self.run
            .take()
            .map(|_| ())
            .ok_or(Error::InvalidState("no packed run open"))
    }

    /// Measure or write one field; inside a packed run only the run's field
    /// is accepted and no key is emitted.
    pub fn add_field(
        &self,
        field: &FieldDescriptor,
        value: Value<'_>,
        dest: Option<&mut [u8]>,
    ) -> Result<usize> {
        match self.run {
            Some(run) if !ptr::eq(run, field) => Err(Error::InvalidField {
                expected: run.number(),
                found: field.number(),
            }),
            Some(_) => encode_field(field, value, true, dest),
            None => encode_field(field, value, false, dest),
        }
    }
}

/// Builds one message either as a measurement or into a buffer of exactly
/// the measured size.
///
/// The same body closure drives both passes, so it must emit the same
/// fields each time it runs.
#[derive(Debug)]
pub struct TwoPassWriter<'b> {
    dest: Option<&'b mut [u8]>,
    written: usize,
    encoder: SizeOrWriteEncoder,
    message: &'static MessageDescriptor,
    depth: usize,
    max_depth: usize,
}

impl<'b> TwoPassWriter<'b> {
    fn with_dest(
        message: &'static MessageDescriptor,
        dest: Option<&'b mut [u8]>,
        depth: usize,
        max_depth: usize,
    ) -> Self {
        Self {
            dest,
            written: 0,
            encoder: SizeOrWriteEncoder::new(),
            message,
            depth,
            max_depth,
        }
    }

    fn open(
        message: &'static MessageDescriptor,
        run: Option<&'static FieldDescriptor>,
        dest: Option<&'b mut [u8]>,
        depth: usize,
        max_depth: usize,
    ) -> Result<Self> {
        let mut writer = Self::with_dest(message, dest, depth, max_depth);
        if let Some(run) = run {
            writer.encoder.packed_start(run)?;
        }
        Ok(writer)
    }

    /// Writer that only counts bytes.
    #[must_use]
    pub fn measure(message: &'static MessageDescriptor, config: CodecConfig) -> Self {
        Self::with_dest(message, None, 1, config.max_depth)
    }

    /// Writer that writes into `dest`.
    #[must_use]
    pub fn write(
        message: &'static MessageDescriptor,
        config: CodecConfig,
        dest: &'b mut [u8],
    ) -> Self {
        Self::with_dest(message, Some(dest), 1, config.max_depth)
    }

    /// Bytes measured or written so far
    #[must_use]
    pub const fn len(&self) -> usize {
        self.written
    }

    /// Whether nothing has been emitted yet
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Whether this writer only measures
    #[must_use]
    pub const fn is_measuring(&self) -> bool {
        self.dest.is_none()
    }

    fn out(&mut self) -> Option<&mut [u8]> {
        let at = self.written;
        self.dest
            .as_deref_mut()
            .map(|dest| dest.get_mut(at..).unwrap_or_default())
    }

    fn admit(&self, field: &FieldDescriptor) -> Result<()> {
        if self.message.contains(field) {
            Ok(())
        } else {
            Err(Error::UnknownField {
                message: self.message.name(),
                number: field.number(),
            })
        }
    }

    /// Emit one field of the current message or packed run.
    pub fn add_field(&mut self, field: &FieldDescriptor, value: Value<'_>) -> Result<()> {
        if self.encoder.packed_run().is_none() {
            self.admit(field)?;
        }
        let encoder = self.encoder;
        let n = encoder.add_field(field, value, self.out())?;
        self.written += n;
        Ok(())
    }

    /// Emit a nested message whose fields are produced by `body`.
    pub fn nested<F>(&mut self, field: &'static FieldDescriptor, body: F) -> Result<()>
    where
        F: FnMut(&mut TwoPassWriter<'_>) -> Result<()>,
    {
        if self.encoder.packed_run().is_some() {
            return Err(Error::InvalidState("nested message inside packed run"));
        }
        let Some(message) = field.message_type() else {
            return Err(Error::InvalidState("field is not a message"));
        };
        self.admit(field)?;
        self.delimited(field, message, None, body)
    }

    /// Emit a packed run whose elements are produced by `body`.
    pub fn packed<F>(&mut self, field: &'static FieldDescriptor, body: F) -> Result<()>
    where
        F: FnMut(&mut TwoPassWriter<'_>) -> Result<()>,
    {
        if self.encoder.packed_run().is_some() {
            return Err(Error::InvalidState("packed runs cannot nest"));
        }
        if !field.is_packed_repeated() {
            return Err(Error::InvalidState("field is not packed repeated"));
        }
        self.admit(field)?;
        self.delimited(field, self.message, Some(field), body)
    }

    fn delimited<F>(
        &mut self,
        field: &'static FieldDescriptor,
        message: &'static MessageDescriptor,
        run: Option<&'static FieldDescriptor>,
        mut body: F,
    ) -> Result<()>
    where
        F: FnMut(&mut TwoPassWriter<'_>) -> Result<()>,
    {
        if self.depth >= self.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
            });
        }
        let depth = self.depth + 1;
        let max_depth = self.max_depth;

        let mut sizer = TwoPassWriter::open(message, run, None, depth, max_depth)?;
        body(&mut sizer)?;
        let len = sizer.written;

        let header = encode_delimited_header(field, len, self.out())?;
        self.written += header;
        trace!(field = field.number(), len, depth, "two-pass delimited");

        if let Some(dest) = self.dest.as_deref_mut() {
            let available = dest.len().saturating_sub(self.written);
            let slot = dest
                .get_mut(self.written..self.written + len)
                .ok_or(Error::end_of_buffer(len, available))?;
            let mut writer = TwoPassWriter::open(message, run, Some(slot), depth, max_depth)?;
            body(&mut writer)?;
            if writer.written != len {
                return Err(Error::InvalidState("body emitted different fields on write pass"));
            }
        }
        self.written += len;
        Ok(())
    }
}

/// Encode a message into a freshly allocated, exactly sized buffer.
///
/// `body` runs once to measure and once to write.
#[instrument(level = "trace", skip_all, fields(message = message.name()))]
pub fn encode_to_bytes<F>(
    message: &'static MessageDescriptor,
    config: CodecConfig,
    mut body: F,
) -> Result<Bytes>
where
    F: FnMut(&mut TwoPassWriter<'_>) -> Result<()>,
{
    let mut sizer = TwoPassWriter::measure(message, config);
    body(&mut sizer)?;
    let len = sizer.len();

    let mut buf = BytesMut::zeroed(len);
    let mut writer = TwoPassWriter::write(message, config, &mut buf[..]);
    body(&mut writer)?;
    if writer.len() != len {
        return Err(Error::InvalidState("body emitted different fields on write pass"));
    }
    trace!(len, "encoded");
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encoder;
    use crate::schema::{FieldLabel, FieldType};

    static INNER_FIELDS: [FieldDescriptor; 1] = [FieldDescriptor::new(
        "value",
        1,
        FieldLabel::Optional,
        FieldType::SInt64,
    )];
    static INNER: MessageDescriptor = MessageDescriptor::new("Inner", &INNER_FIELDS);

    static OUTER_FIELDS: [FieldDescriptor; 3] = [
        FieldDescriptor::new("name", 1, FieldLabel::Optional, FieldType::String),
        FieldDescriptor::message("items", 2, FieldLabel::Repeated, &INNER),
        FieldDescriptor::new("codes", 3, FieldLabel::Repeated, FieldType::Enum).packed(),
    ];
    static OUTER: MessageDescriptor = MessageDescriptor::new("Outer", &OUTER_FIELDS);

    #[test]
    fn test_measure_equals_write() {
        let field = &OUTER_FIELDS[0];
        let measured = encode_field(field, Value::String("hello"), false, None).unwrap();
        let mut buf = [0u8; 16];
        let written = encode_field(field, Value::String("hello"), false, Some(&mut buf)).unwrap();
        assert_eq!(measured, 7);
        assert_eq!(measured, written);
        assert_eq!(&buf[..written], &[0x0a, 5, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn test_short_dest_untouched() {
        let mut buf = [0xaau8; 4];
        let result = encode_field(&OUTER_FIELDS[0], Value::String("hello"), false, Some(&mut buf));
        assert!(matches!(
            result,
            Err(Error::EndOfBuffer {
                needed: 7,
                available: 4
            })
        ));
        assert_eq!(buf, [0xaa; 4]);
    }

    #[test]
    fn test_delimited_header() {
        let mut buf = [0u8; 4];
        let n = encode_delimited_header(&OUTER_FIELDS[1], 300, Some(&mut buf)).unwrap();
        assert_eq!(&buf[..n], &[0x12, 0xac, 0x02]);
        assert_eq!(encode_delimited_header(&OUTER_FIELDS[1], 300, None).unwrap(), 3);
    }

    #[test]
    fn test_packed_run_state() {
        let mut encoder = SizeOrWriteEncoder::new();
        assert!(encoder.packed_start(&OUTER_FIELDS[0]).is_err());
        encoder.packed_start(&OUTER_FIELDS[2]).unwrap();
        assert_eq!(
            encoder.add_field(&OUTER_FIELDS[2], Value::Enum(-1), None).unwrap(),
            10
        );
        assert!(matches!(
            encoder.add_field(&OUTER_FIELDS[0], Value::String("x"), None),
            Err(Error::InvalidField {
                expected: 3,
                found: 1
            })
        ));
        encoder.packed_end().unwrap();
        assert!(encoder.packed_end().is_err());
        assert_eq!(
            encoder.add_field(&OUTER_FIELDS[2], Value::Enum(1), None).unwrap(),
            2
        );
    }

    fn build(w: &mut TwoPassWriter<'_>) -> Result<()> {
        w.add_field(&OUTER_FIELDS[0], Value::String("abc"))?;
        for v in [-1i64, 64, i64::MIN] {
            w.nested(&OUTER_FIELDS[1], |inner| {
                inner.add_field(&INNER_FIELDS[0], Value::Int64(v))
            })?;
        }
        w.packed(&OUTER_FIELDS[2], |run| {
            run.add_field(&OUTER_FIELDS[2], Value::Enum(2))?;
            run.add_field(&OUTER_FIELDS[2], Value::Enum(300))
        })
    }

    #[test]
    fn test_two_pass_matches_single_pass() {
        let two_pass = encode_to_bytes(&OUTER, CodecConfig::default(), build).unwrap();

        let mut buf = [0u8; 128];
        let mut encoder = Encoder::default();
        let mut session = encoder.start(&OUTER, &mut buf).unwrap();
        session.add_string(&OUTER_FIELDS[0], "abc").unwrap();
        for v in [-1i64, 64, i64::MIN] {
            session.nested_start(&OUTER_FIELDS[1]).unwrap();
            session.add_sint64(&INNER_FIELDS[0], v).unwrap();
            session.nested_end().unwrap();
        }
        session.packed_start(&OUTER_FIELDS[2]).unwrap();
        session.add_enum(&OUTER_FIELDS[2], 2).unwrap();
        session.add_enum(&OUTER_FIELDS[2], 300).unwrap();
        session.packed_end().unwrap();
        let len = session.finish().unwrap();

        assert_eq!(&two_pass[..], &buf[..len]);
    }

    #[test]
    fn test_writer_rejects_misuse() {
        let mut writer = TwoPassWriter::measure(&OUTER, CodecConfig::default());
        assert!(matches!(
            writer.add_field(&INNER_FIELDS[0], Value::Int64(1)),
            Err(Error::UnknownField { .. })
        ));
        assert!(matches!(
            writer.nested(&OUTER_FIELDS[0], |_| Ok(())),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            writer.packed(&OUTER_FIELDS[2], |run| run.nested(&OUTER_FIELDS[1], |_| Ok(()))),
            Err(Error::InvalidState(_))
        ));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_writer_depth_limit() {
        let mut writer = TwoPassWriter::measure(&OUTER, CodecConfig::with_max_depth(1));
        let err = writer
            .nested(&OUTER_FIELDS[1], |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { limit: 1 }));
    }

    #[test]
    fn test_inconsistent_body_detected() {
        let mut calls = 0;
        let result = encode_to_bytes(&OUTER, CodecConfig::default(), |w| {
            calls += 1;
            if calls == 1 {
                w.add_field(&OUTER_FIELDS[0], Value::String("a"))
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }
}
