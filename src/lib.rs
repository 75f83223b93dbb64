//! pbstream - Streaming protocol buffers codec for constrained environments
//!
//! Encodes and decodes the protobuf wire format against static message
//! descriptors without building a message object tree. All buffers are
//! supplied by the caller and sized up front.
//!
//! # Quick Start
//!
//! ```rust
//! use pbstream::{Encoder, FieldDescriptor, FieldLabel, FieldType, MessageDescriptor, TracingDump};
//!
//! static PHONE_FIELDS: [FieldDescriptor; 1] =
//!     [FieldDescriptor::new("number", 1, FieldLabel::Required, FieldType::String)];
//! static PHONE: MessageDescriptor = MessageDescriptor::new("PhoneNumber", &PHONE_FIELDS);
//!
//! static PERSON_FIELDS: [FieldDescriptor; 2] = [
//!     FieldDescriptor::new("id", 1, FieldLabel::Required, FieldType::Int32),
//!     FieldDescriptor::message("phone", 2, FieldLabel::Repeated, &PHONE),
//! ];
//! static PERSON: MessageDescriptor = MessageDescriptor::new("Person", &PERSON_FIELDS);
//!
//! // Encode in a single pass; nested lengths are patched in on close
//! let mut buf = [0u8; 64];
//! let mut encoder = Encoder::default();
//! let mut session = encoder.start(&PERSON, &mut buf)?;
//! session.add_int32(&PERSON_FIELDS[0], 1237)?;
//! session.nested_start(&PERSON_FIELDS[1])?;
//! session.add_string(&PHONE_FIELDS[0], "123")?;
//! session.nested_end()?;
//! let len = session.finish()?;
//!
//! // Decode as a stream of events
//! let mut dump = TracingDump::new();
//! pbstream::decode(&PERSON, &buf[..len], &mut dump)?;
//! assert!(dump.as_str().contains("number: string = \"123\""));
//! # Ok::<(), pbstream::Error>(())
//! ```
//!
//! # Features
//!
//! - **Event decoding** - [`Decoder`] reports message and field events to a
//!   [`DecodeHandler`]; unknown fields are skipped
//! - **Single-pass encoding** - [`Encoder`] reserves space for nested headers
//!   and back-patches them
//! - **Two-pass encoding** - [`TwoPassWriter`] measures then writes into
//!   exactly sized space
//! - **Struct mapping** - [`StructDecoder`] fills fixed-layout records from a
//!   [`StructMap`] table
//! - **Bounded nesting** - every engine enforces [`CodecConfig::max_depth`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod codec;
pub mod debug;
mod error;
pub mod mapping;
pub mod schema;
pub mod wire;

pub use codec::{
    CodecConfig, DecodeHandler, Decoder, EncodeSession, Encoder, SizeOrWriteEncoder,
    TwoPassWriter, decode, encode_to_bytes,
};
pub use debug::TracingDump;
pub use error::{Error, Result};
pub use mapping::{StructDecoder, StructMap, StructMapField};
pub use schema::{FieldDescriptor, FieldLabel, FieldType, MessageDescriptor, Value};
pub use wire::WireType;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
