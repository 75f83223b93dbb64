//! Streaming engines
//!
//! - [`Decoder`] walks a buffer and reports message and field events to a
//!   [`DecodeHandler`].
//! - [`Encoder`] writes fields in one pass, back-patching nested lengths.
//! - [`SizeOrWriteEncoder`] and [`TwoPassWriter`] measure first and then
//!   write into exactly sized space.
//!
//! All three share the value conversion rules, so the encoders produce
//! identical bytes and the decoder reads them back unchanged.

mod config;
mod convert;
mod decoder;
mod encoder;
mod sizer;
mod stack;

pub use config::{CodecConfig, DEFAULT_MAX_DEPTH, NESTED_RESERVE_BYTES};
pub use decoder::{DecodeHandler, Decoder, decode};
pub use encoder::{EncodeSession, Encoder};
pub use sizer::{
    SizeOrWriteEncoder, TwoPassWriter, encode_delimited_header, encode_field, encode_to_bytes,
};
pub use stack::RecursionStack;
