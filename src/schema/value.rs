//! Borrowed field values

use std::fmt;

use super::FieldType;

/// A single field value.
///
/// Values never own memory: strings, bytes, and message payloads borrow from
/// the caller's data or from the buffer being decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// `double`
    Double(f64),
    /// `float`
    Float(f32),
    /// `int32`, `sint32`, `sfixed32`
    Int32(i32),
    /// `int64`, `sint64`, `sfixed64`
    Int64(i64),
    /// `uint32`, `fixed32`
    UInt32(u32),
    /// `uint64`, `fixed64`
    UInt64(u64),
    /// `bool`
    Bool(bool),
    /// `enum`
    Enum(i32),
    /// `string`
    String(&'a str),
    /// `bytes`
    Bytes(&'a [u8]),
    /// Encoded message body, or an encoded packed run
    Message(&'a [u8]),
}

impl Value<'_> {
    /// Whether this variant carries values of the given field type
    #[must_use]
    pub const fn fits(&self, ty: FieldType) -> bool {
        matches!(
            (self, ty),
            (Self::Double(_), FieldType::Double)
                | (Self::Float(_), FieldType::Float)
                | (
                    Self::Int32(_),
                    FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32
                )
                | (
                    Self::Int64(_),
                    FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64
                )
                | (Self::UInt32(_), FieldType::UInt32 | FieldType::Fixed32)
                | (Self::UInt64(_), FieldType::UInt64 | FieldType::Fixed64)
                | (Self::Bool(_), FieldType::Bool)
                | (Self::Enum(_), FieldType::Enum)
                | (Self::String(_), FieldType::String)
                | (Self::Bytes(_), FieldType::Bytes)
                | (Self::Message(_), FieldType::Message)
        )
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Double(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Int32(v) | Self::Enum(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Bytes(v) | Self::Message(v) => {
                for (i, byte) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}
