//! Single-pass streaming encoder
//!
//! Fields are written straight into the caller's buffer in the order they
//! are added. A nested message or packed run does not know its length until
//! it is closed, so opening one reserves [`NESTED_RESERVE_BYTES`] in the
//! parent and writes the body after that gap. Closing it writes the key and
//! length into the gap and shifts the body left to sit right after them.

use std::ops::Range;
use std::ptr;

use tracing::trace;

use super::config::{CodecConfig, NESTED_RESERVE_BYTES};
use super::convert::{WireValue, field_key, write_field};
use super::stack::RecursionStack;
use crate::error::{Error, Result};
use crate::schema::{FieldDescriptor, MessageDescriptor, Value};
use crate::wire::{WireFrame, WireType};

/// What an encode frame is collecting
#[derive(Debug, Clone, Copy)]
enum Scope {
    Root(&'static MessageDescriptor),
    Nested {
        field: &'static FieldDescriptor,
        message: &'static MessageDescriptor,
    },
    Packed(&'static FieldDescriptor),
}

#[derive(Debug, Clone, Copy)]
struct EncodeFrame {
    wire: WireFrame,
    scope: Scope,
}

/// Reusable single-pass encoder
///
/// Holds the frame stack between sessions; each [`Encoder::start`] begins
/// a new [`EncodeSession`] over a caller-supplied buffer.
#[derive(Debug)]
pub struct Encoder {
    stack: RecursionStack<EncodeFrame>,
}

impl Encoder {
    /// Create an encoder with the given limits.
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self {
            stack: RecursionStack::new(config.max_depth),
        }
    }

    /// Begin encoding a `message` into `buf`.
    pub fn start<'e, 'b>(
        &'e mut self,
        message: &'static MessageDescriptor,
        buf: &'b mut [u8],
    ) -> Result<EncodeSession<'e, 'b>> {
        self.stack.clear();
        self.stack.push(EncodeFrame {
            wire: WireFrame::new(0..buf.len()),
            scope: Scope::Root(message),
        })?;
        trace!(message = message.name(), capacity = buf.len(), "encode start");
        Ok(EncodeSession {
            stack: &mut self.stack,
            buf,
        })
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

/// An encode in progress.
///
/// Any error leaves the buffer partially written; the session should be
/// dropped and the buffer discarded.
#[derive(Debug)]
pub struct EncodeSession<'e, 'b> {
    stack: &'e mut RecursionStack<EncodeFrame>,
    buf: &'b mut [u8],
}

impl EncodeSession<'_, '_> {
    /// Number of open frames, root included
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    fn top(&self) -> Result<EncodeFrame> {
        self.stack
            .top()
            .copied()
            .ok_or(Error::InvalidState("no message open"))
    }

    fn store_top(&mut self, frame: EncodeFrame) {
        if let Some(slot) = self.stack.top_mut() {
            *slot = frame;
        }
    }

    /// Check `field` may be written into `frame`.
    fn admit(frame: &EncodeFrame, field: &FieldDescriptor) -> Result<()> {
        match frame.scope {
            Scope::Packed(run) if !ptr::eq(run, field) => Err(Error::InvalidField {
                expected: run.number(),
                found: field.number(),
            }),
            Scope::Packed(_) => Ok(()),
            Scope::Root(message) | Scope::Nested { message, .. } => {
                if message.contains(field) {
                    Ok(())
                } else {
                    Err(Error::UnknownField {
                        message: message.name(),
                        number: field.number(),
                    })
                }
            }
        }
    }

    /// Encode one field into the innermost open message or packed run.
    pub fn add_field(&mut self, field: &FieldDescriptor, value: Value<'_>) -> Result<()> {
        let mut frame = self.top()?;
        Self::admit(&frame, field)?;

        let in_run = matches!(frame.scope, Scope::Packed(_));
        let wire = WireValue::from_value(field, value, in_run)?;
        let key = field_key(field, &wire, in_run);
        write_field(&mut frame.wire, self.buf, key, &wire)?;
        self.store_top(frame);
        Ok(())
    }

    /// Open a nested message for a message-typed `field`.
    pub fn nested_start(&mut self, field: &'static FieldDescriptor) -> Result<()> {
        let frame = self.top()?;
        if matches!(frame.scope, Scope::Packed(_)) {
            return Err(Error::InvalidState("nested message inside packed run"));
        }
        let Some(message) = field.message_type() else {
            return Err(Error::InvalidState("field is not a message"));
        };
        Self::admit(&frame, field)?;

        let child = frame.wire.split_after(NESTED_RESERVE_BYTES)?;
        self.stack.push(EncodeFrame {
            wire: child,
            scope: Scope::Nested { field, message },
        })?;
        trace!(
            depth = self.stack.depth(),
            field = field.number(),
            message = message.name(),
            "nested start"
        );
        Ok(())
    }

    /// Close the innermost nested message.
    pub fn nested_end(&mut self) -> Result<()> {
        let frame = self.top()?;
        let Scope::Nested { field, .. } = frame.scope else {
            return Err(Error::InvalidState("no nested message open"));
        };
        self.stack.pop();
        trace!(
            depth = self.stack.depth(),
            field = field.number(),
            len = frame.wire.used(),
            "nested end"
        );
        self.close_into_parent(field, frame.wire.used_range())
    }

    /// Open a packed run for a packed repeated `field`.
    pub fn packed_start(&mut self, field: &'static FieldDescriptor) -> Result<()> {
        let frame = self.top()?;
        if matches!(frame.scope, Scope::Packed(_)) {
            return Err(Error::InvalidState("packed runs cannot nest"));
        }
        if !field.is_packed_repeated() {
            return Err(Error::InvalidState("field is not packed repeated"));
        }
        Self::admit(&frame, field)?;

        let child = frame.wire.split_after(NESTED_RESERVE_BYTES)?;
        self.stack.push(EncodeFrame {
            wire: child,
            scope: Scope::Packed(field),
        })?;
        trace!(field = field.number(), "packed run start");
        Ok(())
    }

    /// Close the open packed run.
    pub fn packed_end(&mut self) -> Result<()> {
        let frame = self.top()?;
        let Scope::Packed(field) = frame.scope else {
            return Err(Error::InvalidState("no packed run open"));
        };
        self.stack.pop();
        trace!(
            field = field.number(),
            len = frame.wire.used(),
            "packed run end"
        );
        self.close_into_parent(field, frame.wire.used_range())
    }

    /// Write key and length at the parent's reserved position, then move
    /// the child's body down behind them.
    fn close_into_parent(&mut self, field: &FieldDescriptor, body: Range<usize>) -> Result<()> {
        let mut parent = self.top()?;
        parent.wire.write_varint(self.buf, field.key(WireType::LengthDelimited))?;
        parent.wire.write_varint(self.buf, body.len() as u64)?;
        parent.wire.write_within(self.buf, body)?;
        self.store_top(parent);
        Ok(())
    }

    /// Finish the root message and return the number of bytes written.
    pub fn finish(self) -> Result<usize> {
        match self.stack.top() {
            Some(frame) if self.stack.depth() == 1 => {
                trace!(len = frame.wire.used(), "encode finish");
                Ok(frame.wire.used())
            }
            _ => Err(Error::InvalidState("unclosed nested message or packed run")),
        }
    }

    /// Encode a `double` field.
    pub fn add_double(&mut self, field: &FieldDescriptor, value: f64) -> Result<()> {
        self.add_field(field, Value::Double(value))
    }

    /// Encode a `float` field.
    pub fn add_float(&mut self, field: &FieldDescriptor, value: f32) -> Result<()> {
        self.add_field(field, Value::Float(value))
    }

    /// Encode an `int32` field.
    pub fn add_int32(&mut self, field: &FieldDescriptor, value: i32) -> Result<()> {
        self.add_field(field, Value::Int32(value))
    }

    /// Encode an `int64` field.
    pub fn add_int64(&mut self, field: &FieldDescriptor, value: i64) -> Result<()> {
        self.add_field(field, Value::Int64(value))
    }

    /// Encode a `uint32` field.
    pub fn add_uint32(&mut self, field: &FieldDescriptor, value: u32) -> Result<()> {
        self.add_field(field, Value::UInt32(value))
    }

    /// Encode a `uint64` field.
    pub fn add_uint64(&mut self, field: &FieldDescriptor, value: u64) -> Result<()> {
        self.add_field(field, Value::UInt64(value))
    }

    /// Encode an `sint32` field.
    pub fn add_sint32(&mut self, field: &FieldDescriptor, value: i32) -> Result<()> {
        self.add_field(field, Value::Int32(value))
    }

    /// Encode an `sint64` field.
    pub fn add_sint64(&mut self, field: &FieldDescriptor, value: i64) -> Result<()> {
        self.add_field(field, Value::Int64(value))
    }

    /// Encode a `fixed32` field.
    pub fn add_fixed32(&mut self, field: &FieldDescriptor, value: u32) -> Result<()> {
        self.add_field(field, Value::UInt32(value))
    }

    /// Encode a `fixed64` field.
    pub fn add_fixed64(&mut self, field: &FieldDescriptor, value: u64) -> Result<()> {
        self.add_field(field, Value::UInt64(value))
    }

    /// Encode an `sfixed32` field.
    pub fn add_sfixed32(&mut self, field: &FieldDescriptor, value: i32) -> Result<()> {
        self.add_field(field, Value::Int32(value))
    }

    /// Encode an `sfixed64` field.
    pub fn add_sfixed64(&mut self, field: &FieldDescriptor, value: i64) -> Result<()> {
        self.add_field(field, Value::Int64(value))
    }

    /// Encode a `bool` field.
    pub fn add_bool(&mut self, field: &FieldDescriptor, value: bool) -> Result<()> {
        self.add_field(field, Value::Bool(value))
    }

    /// Encode an `enum` field.
    pub fn add_enum(&mut self, field: &FieldDescriptor, value: i32) -> Result<()> {
        self.add_field(field, Value::Enum(value))
    }

    /// Encode a `string` field.
    pub fn add_string(&mut self, field: &FieldDescriptor, value: &str) -> Result<()> {
        self.add_field(field, Value::String(value))
    }

    /// Encode a `bytes` field.
    pub fn add_bytes(&mut self, field: &FieldDescriptor, value: &[u8]) -> Result<()> {
        self.add_field(field, Value::Bytes(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldLabel, FieldType};

    static INNER_FIELDS: [FieldDescriptor; 2] = [
        FieldDescriptor::new("text", 1, FieldLabel::Optional, FieldType::String),
        FieldDescriptor::new("flag", 2, FieldLabel::Optional, FieldType::Bool),
    ];
    static INNER: MessageDescriptor = MessageDescriptor::new("Inner", &INNER_FIELDS);

    static OUTER_FIELDS: [FieldDescriptor; 4] = [
        FieldDescriptor::new("id", 1, FieldLabel::Optional, FieldType::UInt32),
        FieldDescriptor::message("inner", 2, FieldLabel::Optional, &INNER),
        FieldDescriptor::new("runs", 4, FieldLabel::Repeated, FieldType::UInt32).packed(),
        FieldDescriptor::new("ratio", 5, FieldLabel::Optional, FieldType::Float),
    ];
    static OUTER: MessageDescriptor = MessageDescriptor::new("Outer", &OUTER_FIELDS);

    fn encode_with<F>(capacity: usize, body: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&mut EncodeSession<'_, '_>) -> Result<()>,
    {
        let mut buf = vec![0u8; capacity];
        let mut encoder = Encoder::default();
        let mut session = encoder.start(&OUTER, &mut buf)?;
        body(&mut session)?;
        let len = session.finish()?;
        buf.truncate(len);
        Ok(buf)
    }

    #[test]
    fn test_scalar_fields() {
        let bytes = encode_with(32, |s| {
            s.add_uint32(&OUTER_FIELDS[0], 150)?;
            s.add_float(&OUTER_FIELDS[3], 1.0)
        })
        .unwrap();
        assert_eq!(bytes, [0x08, 0x96, 0x01, 0x2d, 0x00, 0x00, 0x80, 0x3f]);
    }

    #[test]
    fn test_nested_backpatch() {
        let bytes = encode_with(64, |s| {
            s.add_uint32(&OUTER_FIELDS[0], 1)?;
            s.nested_start(&OUTER_FIELDS[1])?;
            s.add_string(&INNER_FIELDS[0], "hi")?;
            s.add_bool(&INNER_FIELDS[1], true)?;
            s.nested_end()?;
            s.add_uint32(&OUTER_FIELDS[0], 2)
        })
        .unwrap();
        assert_eq!(
            bytes,
            [
                0x08, 0x01, // id
                0x12, 0x06, 0x0a, 0x02, b'h', b'i', 0x10, 0x01, // inner
                0x08, 0x02, // id
            ]
        );
    }

    #[test]
    fn test_packed_run() {
        let bytes = encode_with(32, |s| {
            s.packed_start(&OUTER_FIELDS[2])?;
            for v in [3, 270, 86_942] {
                s.add_uint32(&OUTER_FIELDS[2], v)?;
            }
            s.packed_end()
        })
        .unwrap();
        assert_eq!(bytes, [0x22, 0x06, 0x03, 0x8e, 0x02, 0x9e, 0xa7, 0x05]);
    }

    #[test]
    fn test_pre_encoded_packed_run() {
        let run = [0x03, 0x8e, 0x02];
        let bytes = encode_with(16, |s| s.add_field(&OUTER_FIELDS[2], Value::Message(&run)))
            .unwrap();
        assert_eq!(bytes, [0x22, 0x03, 0x03, 0x8e, 0x02]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = encode_with(16, |s| s.add_string(&INNER_FIELDS[0], "x"));
        assert!(matches!(
            result,
            Err(Error::UnknownField {
                message: "Outer",
                number: 1
            })
        ));
    }

    #[test]
    fn test_interleaved_packed_run_rejected() {
        let result = encode_with(32, |s| {
            s.packed_start(&OUTER_FIELDS[2])?;
            s.add_uint32(&OUTER_FIELDS[0], 1)
        });
        assert!(matches!(
            result,
            Err(Error::InvalidField {
                expected: 4,
                found: 1
            })
        ));
    }

    #[test]
    fn test_state_errors() {
        assert!(matches!(
            encode_with(32, |s| s.nested_end()),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            encode_with(32, |s| s.nested_start(&OUTER_FIELDS[1])),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            encode_with(32, |s| {
                s.packed_start(&OUTER_FIELDS[2])?;
                s.packed_start(&OUTER_FIELDS[2])
            }),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            encode_with(32, |s| s.packed_start(&OUTER_FIELDS[0])),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_out_of_space() {
        assert!(matches!(
            encode_with(2, |s| s.add_uint32(&OUTER_FIELDS[0], 150)),
            Err(Error::EndOfBuffer { .. })
        ));
        // Not enough room for the reserved header gap
        assert!(matches!(
            encode_with(9, |s| s.nested_start(&OUTER_FIELDS[1])),
            Err(Error::EndOfBuffer { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut buf = [0u8; 64];
        let mut encoder = Encoder::new(CodecConfig::with_max_depth(1));
        let mut session = encoder.start(&OUTER, &mut buf).unwrap();
        let err = session.nested_start(&OUTER_FIELDS[1]).unwrap_err();
        assert!(err.is_fatal());
    }
}
