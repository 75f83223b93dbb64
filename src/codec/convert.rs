//! Conversion between typed values and raw wire values
//!
//! Shared by every engine so that single-pass and two-pass encoding agree
//! byte for byte, and so decoding is their exact inverse.

use crate::error::{Error, Result};
use crate::schema::{FieldDescriptor, FieldType, Value};
use crate::wire::{
    WireFrame, WireType, varint_len, zigzag_decode32, zigzag_decode64, zigzag_encode32,
    zigzag_encode64,
};

/// Untyped value as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum WireValue<'v> {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    LengthDelimited(&'v [u8]),
}

impl<'v> WireValue<'v> {
    pub(crate) const fn wire_type(&self) -> WireType {
        match self {
            Self::Varint(_) => WireType::Varint,
            Self::Fixed32(_) => WireType::Fixed32,
            Self::Fixed64(_) => WireType::Fixed64,
            Self::LengthDelimited(_) => WireType::LengthDelimited,
        }
    }

    /// Bytes occupied by the value alone, without a key
    pub(crate) const fn encoded_len(&self) -> usize {
        match self {
            Self::Varint(v) => varint_len(*v),
            Self::Fixed32(_) => 4,
            Self::Fixed64(_) => 8,
            Self::LengthDelimited(bytes) => varint_len(bytes.len() as u64) + bytes.len(),
        }
    }

    /// Typed encode path: field type to wire value.
    ///
    /// Outside a packed run, a packed field also accepts [`Value::Message`]
    /// holding an already encoded run.
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn from_value(
        field: &FieldDescriptor,
        value: Value<'v>,
        in_packed_run: bool,
    ) -> Result<Self> {
        let ty = field.field_type();
        let wire = match (ty, value) {
            (_, Value::Message(run)) if field.is_packed_repeated() && !in_packed_run => {
                Self::LengthDelimited(run)
            }
            (FieldType::Double, Value::Double(v)) => Self::Fixed64(v.to_bits()),
            (FieldType::Float, Value::Float(v)) => Self::Fixed32(v.to_bits()),
            // Negative int32 values are sign-extended to ten bytes
            (FieldType::Int32, Value::Int32(v)) => Self::Varint(i64::from(v) as u64),
            (FieldType::SInt32, Value::Int32(v)) => Self::Varint(u64::from(zigzag_encode32(v))),
            (FieldType::SFixed32, Value::Int32(v)) => Self::Fixed32(v as u32),
            (FieldType::Int64, Value::Int64(v)) => Self::Varint(v as u64),
            (FieldType::SInt64, Value::Int64(v)) => Self::Varint(zigzag_encode64(v)),
            (FieldType::SFixed64, Value::Int64(v)) => Self::Fixed64(v as u64),
            (FieldType::UInt32, Value::UInt32(v)) => Self::Varint(u64::from(v)),
            (FieldType::Fixed32, Value::UInt32(v)) => Self::Fixed32(v),
            (FieldType::UInt64, Value::UInt64(v)) => Self::Varint(v),
            (FieldType::Fixed64, Value::UInt64(v)) => Self::Fixed64(v),
            (FieldType::Bool, Value::Bool(v)) => Self::Varint(u64::from(v)),
            (FieldType::Enum, Value::Enum(v)) => Self::Varint(i64::from(v) as u64),
            (FieldType::String, Value::String(v)) => Self::LengthDelimited(v.as_bytes()),
            (FieldType::Bytes, Value::Bytes(v)) | (FieldType::Message, Value::Message(v)) => {
                Self::LengthDelimited(v)
            }
            _ => {
                return Err(Error::ValueMismatch {
                    number: field.number(),
                    expected: ty,
                });
            }
        };

        if in_packed_run && wire.wire_type() == WireType::LengthDelimited {
            return Err(Error::ValueMismatch {
                number: field.number(),
                expected: ty,
            });
        }
        Ok(wire)
    }

    /// Typed decode path: wire value to field type.
    ///
    /// Message payloads pass through as [`Value::Message`]; the decoder
    /// descends into them instead of calling this.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub(crate) fn into_value(self, field: &FieldDescriptor) -> Result<Value<'v>> {
        let value = match (field.field_type(), self) {
            (FieldType::Double, Self::Fixed64(v)) => Value::Double(f64::from_bits(v)),
            (FieldType::Float, Self::Fixed32(v)) => Value::Float(f32::from_bits(v)),
            (FieldType::Int32, Self::Varint(v)) => Value::Int32(v as i32),
            (FieldType::Int64, Self::Varint(v)) => Value::Int64(v as i64),
            (FieldType::UInt32, Self::Varint(v)) => Value::UInt32(v as u32),
            (FieldType::UInt64, Self::Varint(v)) => Value::UInt64(v),
            (FieldType::SInt32, Self::Varint(v)) => Value::Int32(zigzag_decode32(v as u32)),
            (FieldType::SInt64, Self::Varint(v)) => Value::Int64(zigzag_decode64(v)),
            (FieldType::Fixed32, Self::Fixed32(v)) => Value::UInt32(v),
            (FieldType::Fixed64, Self::Fixed64(v)) => Value::UInt64(v),
            (FieldType::SFixed32, Self::Fixed32(v)) => Value::Int32(v as i32),
            (FieldType::SFixed64, Self::Fixed64(v)) => Value::Int64(v as i64),
            (FieldType::Bool, Self::Varint(v)) => Value::Bool(v != 0),
            (FieldType::Enum, Self::Varint(v)) => Value::Enum(v as i32),
            (FieldType::String, Self::LengthDelimited(bytes)) => {
                let text = core::str::from_utf8(bytes).map_err(|source| Error::InvalidUtf8 {
                    number: field.number(),
                    source,
                })?;
                Value::String(text)
            }
            (FieldType::Bytes, Self::LengthDelimited(bytes)) => Value::Bytes(bytes),
            (FieldType::Message, Self::LengthDelimited(bytes)) => Value::Message(bytes),
            (_, wire) => {
                return Err(Error::InvalidWireType {
                    number: field.number(),
                    wire_type: wire.wire_type().as_u8(),
                });
            }
        };
        Ok(value)
    }
}

/// Key to emit before `wire`, or `None` inside a packed run.
pub(crate) const fn field_key(
    field: &FieldDescriptor,
    wire: &WireValue<'_>,
    in_packed_run: bool,
) -> Option<u64> {
    if in_packed_run {
        None
    } else {
        Some(field.key(wire.wire_type()))
    }
}

/// Total bytes for an optional key plus the value
pub(crate) const fn field_len(key: Option<u64>, wire: &WireValue<'_>) -> usize {
    let key_len = match key {
        Some(key) => varint_len(key),
        None => 0,
    };
    key_len + wire.encoded_len()
}

/// Write an optional key and the value at the frame's cursor.
pub(crate) fn write_field(
    frame: &mut WireFrame,
    buf: &mut [u8],
    key: Option<u64>,
    wire: &WireValue<'_>,
) -> Result<()> {
    if let Some(key) = key {
        frame.write_varint(buf, key)?;
    }
    match *wire {
        WireValue::Varint(v) => frame.write_varint(buf, v),
        WireValue::Fixed32(v) => frame.write_fixed32(buf, v),
        WireValue::Fixed64(v) => frame.write_fixed64(buf, v),
        WireValue::LengthDelimited(bytes) => {
            frame.write_varint(buf, bytes.len() as u64)?;
            frame.write_slice(buf, bytes)
        }
    }
}
