//! Table-driven decoding into fixed-layout records
//!
//! A [`StructMap`] ties a message's fields to byte offsets in a record type;
//! [`StructDecoder`] fills such records straight from the wire.

mod decoder;
mod struct_map;

pub use decoder::{StructDecoder, decode_struct};
pub use struct_map::{MapKind, StructMap, StructMapField};
