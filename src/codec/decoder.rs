//! Streaming, event-driven decoder
//!
//! The decoder walks a buffer once and reports what it finds through a
//! [`DecodeHandler`]; no object tree is built. Nested messages and packed
//! runs are handled by pushing frames onto a bounded stack rather than by
//! recursive calls.

use std::ops::Range;

use tracing::{instrument, trace};

use super::config::CodecConfig;
use super::convert::WireValue;
use super::stack::RecursionStack;
use crate::error::{Error, Result};
use crate::schema::{FieldDescriptor, FieldType, MessageDescriptor, Value};
use crate::wire::{WireFrame, WireType, split_key};

/// Receiver of decode events.
///
/// Returning an error from any method stops decoding and the error is
/// handed back to the caller unchanged; [`Error::Cancelled`] is the
/// conventional choice.
pub trait DecodeHandler<'a> {
    /// A message begins. `field` is the enclosing message-typed field, or
    /// `None` for the root.
    fn on_message_start(
        &mut self,
        message: &'static MessageDescriptor,
        field: Option<&'static FieldDescriptor>,
    ) -> Result<()> {
        let _ = (message, field);
        Ok(())
    }

    /// A message ends.
    fn on_message_end(&mut self, message: &'static MessageDescriptor) -> Result<()> {
        let _ = message;
        Ok(())
    }

    /// A known, non-message field was decoded.
    fn on_field(
        &mut self,
        message: &'static MessageDescriptor,
        field: &'static FieldDescriptor,
        value: Value<'a>,
    ) -> Result<()>;
}

/// Handler that ignores every event
impl<'a> DecodeHandler<'a> for () {
    fn on_field(
        &mut self,
        _message: &'static MessageDescriptor,
        _field: &'static FieldDescriptor,
        _value: Value<'a>,
    ) -> Result<()> {
        Ok(())
    }
}

impl<'a, H: DecodeHandler<'a> + ?Sized> DecodeHandler<'a> for &mut H {
    fn on_message_start(
        &mut self,
        message: &'static MessageDescriptor,
        field: Option<&'static FieldDescriptor>,
    ) -> Result<()> {
        (**self).on_message_start(message, field)
    }

    fn on_message_end(&mut self, message: &'static MessageDescriptor) -> Result<()> {
        (**self).on_message_end(message)
    }

    fn on_field(
        &mut self,
        message: &'static MessageDescriptor,
        field: &'static FieldDescriptor,
        value: Value<'a>,
    ) -> Result<()> {
        (**self).on_field(message, field, value)
    }
}

/// One level of the decode stack
#[derive(Debug, Clone, Copy)]
struct DecodeFrame {
    wire: WireFrame,
    /// Message whose fields this frame holds; for a packed run, the message
    /// containing the run.
    message: &'static MessageDescriptor,
    /// Set while the frame is a packed run of bare values.
    packed: Option<&'static FieldDescriptor>,
}

/// Frame to open after the current field
enum Descend {
    Message {
        field: &'static FieldDescriptor,
        message: &'static MessageDescriptor,
        payload: Range<usize>,
    },
    Packed {
        field: &'static FieldDescriptor,
        payload: Range<usize>,
    },
}

/// Bounded-depth streaming decoder
///
/// The frame stack is allocated once and reused across calls.
#[derive(Debug)]
pub struct Decoder {
    stack: RecursionStack<DecodeFrame>,
}

impl Decoder {
    /// Create a decoder with the given limits.
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self {
            stack: RecursionStack::new(config.max_depth),
        }
    }

    /// Decode `buf` as a `root` message, reporting events to `handler`.
    ///
    /// Returns the number of bytes consumed. On error, events already
    /// delivered stay valid; nothing after the failing field is reported.
    #[instrument(level = "trace", skip_all, fields(message = root.name(), len = buf.len()))]
    pub fn decode<'a, H>(
        &mut self,
        root: &'static MessageDescriptor,
        buf: &'a [u8],
        handler: &mut H,
    ) -> Result<usize>
    where
        H: DecodeHandler<'a> + ?Sized,
    {
        self.stack.clear();
        self.stack.push(DecodeFrame {
            wire: WireFrame::new(0..buf.len()),
            message: root,
            packed: None,
        })?;
        handler.on_message_start(root, None)?;

        let mut consumed = 0;
        while let Some(&top) = self.stack.top() {
            let mut frame = top;
            let mut descend = None;

            while frame.wire.left() > 0 {
                descend = Self::step(&mut frame, buf, handler)?;
                if descend.is_some() {
                    break;
                }
            }

            if let Some(slot) = self.stack.top_mut() {
                *slot = frame;
            }

            match descend {
                Some(Descend::Message {
                    field,
                    message,
                    payload,
                }) => {
                    trace!(
                        depth = self.stack.depth(),
                        field = field.number(),
                        message = message.name(),
                        len = payload.len(),
                        "enter nested message"
                    );
                    self.stack.push(DecodeFrame {
                        wire: WireFrame::new(payload),
                        message,
                        packed: None,
                    })?;
                    handler.on_message_start(message, Some(field))?;
                }
                Some(Descend::Packed { field, payload }) => {
                    debug_assert!(frame.packed.is_none(), "packed runs never nest");
                    trace!(
                        depth = self.stack.depth(),
                        field = field.number(),
                        len = payload.len(),
                        "enter packed run"
                    );
                    self.stack.push(DecodeFrame {
                        wire: WireFrame::new(payload),
                        message: frame.message,
                        packed: Some(field),
                    })?;
                }
                None => {
                    self.stack.pop();
                    if frame.packed.is_none() {
                        handler.on_message_end(frame.message)?;
                    }
                    if self.stack.is_empty() {
                        consumed = frame.wire.used();
                    }
                }
            }
        }

        Ok(consumed)
    }

    /// Decode one field (or one bare value of a packed run) from `frame`.
    fn step<'a, H>(
        frame: &mut DecodeFrame,
        buf: &'a [u8],
        handler: &mut H,
    ) -> Result<Option<Descend>>
    where
        H: DecodeHandler<'a> + ?Sized,
    {
        let (field, wire_type) = match frame.packed {
            Some(field) => (Some(field), field.wire_type()),
            None => {
                let (number, bits) = split_key(frame.wire.read_varint(buf)?);
                let number = u32::try_from(number).unwrap_or(u32::MAX);
                let wire_type = WireType::from_u8(bits).ok_or(Error::InvalidWireType {
                    number,
                    wire_type: bits,
                })?;
                (frame.message.field_by_number(number), wire_type)
            }
        };

        let raw = match wire_type {
            WireType::Varint => RawValue::Wire(WireValue::Varint(frame.wire.read_varint(buf)?)),
            WireType::Fixed64 => {
                RawValue::Wire(WireValue::Fixed64(frame.wire.read_fixed64(buf)?))
            }
            WireType::Fixed32 => {
                RawValue::Wire(WireValue::Fixed32(frame.wire.read_fixed32(buf)?))
            }
            WireType::LengthDelimited => {
                RawValue::Delimited(frame.wire.read_length_delimited(buf)?)
            }
        };

        let Some(field) = field else {
            trace!(
                message = frame.message.name(),
                wire_type = %wire_type,
                "skipping unknown field"
            );
            return Ok(None);
        };

        let wire = match raw {
            RawValue::Delimited(payload) if field.accepts_packed() => {
                return Ok(Some(Descend::Packed { field, payload }));
            }
            RawValue::Delimited(payload) if field.field_type() == FieldType::Message => {
                let Some(message) = field.message_type() else {
                    return Ok(None);
                };
                return Ok(Some(Descend::Message {
                    field,
                    message,
                    payload,
                }));
            }
            RawValue::Delimited(payload) => WireValue::LengthDelimited(&buf[payload]),
            RawValue::Wire(wire) => wire,
        };

        let value = wire.into_value(field)?;
        handler.on_field(frame.message, field, value)?;
        Ok(None)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

/// Wire value before it is tied to the buffer lifetime
enum RawValue {
    Wire(WireValue<'static>),
    Delimited(Range<usize>),
}

/// Decode `buf` with a default-configured [`Decoder`].
pub fn decode<'a, H>(
    root: &'static MessageDescriptor,
    buf: &'a [u8],
    handler: &mut H,
) -> Result<usize>
where
    H: DecodeHandler<'a> + ?Sized,
{
    Decoder::default().decode(root, buf, handler)
}
