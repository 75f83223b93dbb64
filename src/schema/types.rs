//! Field types and labels

use std::fmt;

use crate::wire::WireType;

/// Declared type of a field
///
/// Discriminants follow the numbering used by schema compilers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FieldType {
    /// 64-bit IEEE float
    Double = 1,
    /// 32-bit IEEE float
    Float = 2,
    /// Signed 64-bit varint
    Int64 = 3,
    /// Unsigned 64-bit varint
    UInt64 = 4,
    /// Signed 32-bit varint
    Int32 = 5,
    /// Unsigned fixed 64-bit
    Fixed64 = 6,
    /// Unsigned fixed 32-bit
    Fixed32 = 7,
    /// Boolean varint
    Bool = 8,
    /// UTF-8 string
    String = 9,
    /// Embedded message
    Message = 11,
    /// Raw bytes
    Bytes = 12,
    /// Unsigned 32-bit varint
    UInt32 = 13,
    /// Enumeration value
    Enum = 14,
    /// Signed fixed 32-bit
    SFixed32 = 15,
    /// Signed fixed 64-bit
    SFixed64 = 16,
    /// Zig-zag 32-bit varint
    SInt32 = 17,
    /// Zig-zag 64-bit varint
    SInt64 = 18,
}

impl FieldType {
    /// Convert from byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Double),
            2 => Some(Self::Float),
            3 => Some(Self::Int64),
            4 => Some(Self::UInt64),
            5 => Some(Self::Int32),
            6 => Some(Self::Fixed64),
            7 => Some(Self::Fixed32),
            8 => Some(Self::Bool),
            9 => Some(Self::String),
            11 => Some(Self::Message),
            12 => Some(Self::Bytes),
            13 => Some(Self::UInt32),
            14 => Some(Self::Enum),
            15 => Some(Self::SFixed32),
            16 => Some(Self::SFixed64),
            17 => Some(Self::SInt32),
            18 => Some(Self::SInt64),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Wire type used for a single value of this type
    #[must_use]
    pub const fn wire_type(self) -> WireType {
        match self {
            Self::Int32
            | Self::Int64
            | Self::UInt32
            | Self::UInt64
            | Self::SInt32
            | Self::SInt64
            | Self::Bool
            | Self::Enum => WireType::Varint,
            Self::Fixed64 | Self::SFixed64 | Self::Double => WireType::Fixed64,
            Self::Fixed32 | Self::SFixed32 | Self::Float => WireType::Fixed32,
            Self::String | Self::Bytes | Self::Message => WireType::LengthDelimited,
        }
    }

    /// Whether repeated values of this type may be packed
    #[must_use]
    pub const fn is_packable(self) -> bool {
        !matches!(self, Self::String | Self::Bytes | Self::Message)
    }

    /// In-memory size of one decoded value, for scalar types
    ///
    /// Booleans occupy one byte holding 0 or 1; enums are `i32`.
    #[must_use]
    pub const fn native_size(self) -> Option<usize> {
        match self {
            Self::Double | Self::Int64 | Self::UInt64 | Self::SInt64 => Some(8),
            Self::Fixed64 | Self::SFixed64 => Some(8),
            Self::Float | Self::Int32 | Self::UInt32 | Self::SInt32 | Self::Enum => Some(4),
            Self::Fixed32 | Self::SFixed32 => Some(4),
            Self::Bool => Some(1),
            Self::String | Self::Bytes | Self::Message => None,
        }
    }

    /// Schema-language name of the type
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Int32 => "int32",
            Self::Fixed64 => "fixed64",
            Self::Fixed32 => "fixed32",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Message => "message",
            Self::Bytes => "bytes",
            Self::UInt32 => "uint32",
            Self::Enum => "enum",
            Self::SFixed32 => "sfixed32",
            Self::SFixed64 => "sfixed64",
            Self::SInt32 => "sint32",
            Self::SInt64 => "sint64",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FieldLabel {
    /// Zero or one occurrence
    Optional = 1,
    /// Exactly one occurrence (not enforced by the codec)
    Required = 2,
    /// Any number of occurrences
    Repeated = 3,
}

impl fmt::Display for FieldLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Optional => "optional",
            Self::Required => "required",
            Self::Repeated => "repeated",
        };
        write!(f, "{name}")
    }
}
