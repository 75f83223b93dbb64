//! Wire-level primitives
//!
//! Varints, fixed-width integers, zig-zag mapping, and the [`WireFrame`]
//! cursor shared by the decode and encode stacks.

mod fixed;
mod frame;
mod varint;

use std::fmt;

pub use fixed::{decode_fixed32, decode_fixed64, encode_fixed32, encode_fixed64};
pub use frame::WireFrame;
pub use varint::{
    MAX_VARINT_LEN, decode_varint, encode_varint, varint_len, zigzag_decode32, zigzag_decode64,
    zigzag_encode32, zigzag_encode64,
};

use crate::schema::FieldType;

/// Three-bit tag describing how a field's bytes are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum WireType {
    /// Base-128 varint
    Varint = 0,
    /// Little-endian 8 bytes
    Fixed64 = 1,
    /// Varint length followed by raw bytes
    LengthDelimited = 2,
    /// Little-endian 4 bytes
    Fixed32 = 5,
}

impl WireType {
    /// Convert from the low three bits of a key. Group markers (3, 4) and
    /// the unassigned values (6, 7) are rejected.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Varint => "VARINT",
            Self::Fixed64 => "FIXED64",
            Self::LengthDelimited => "LENGTH_DELIMITED",
            Self::Fixed32 => "FIXED32",
        };
        write!(f, "{name}")
    }
}

/// Wire type used for a single value of `ty`
#[must_use]
pub const fn wire_type_of(ty: FieldType) -> WireType {
    ty.wire_type()
}

/// Split a decoded key into field number and raw wire-type bits.
#[must_use]
pub const fn split_key(key: u64) -> (u64, u8) {
    #[allow(clippy::cast_possible_truncation)]
    let wire_type = (key & 0x07) as u8;
    (key >> 3, wire_type)
}
