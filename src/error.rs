//! Codec error types

use thiserror::Error;

use crate::schema::FieldType;

/// Errors produced by the wire primitives, the engines, and struct mapping.
#[derive(Error, Debug)]
pub enum Error {
    /// Not enough bytes to decode a value, or not enough space to encode one
    #[error("end of buffer: need {needed} bytes, {available} available")]
    EndOfBuffer {
        /// Bytes required by the operation
        needed: usize,
        /// Bytes left in the frame
        available: usize,
    },

    /// Field is not a member of the message being encoded
    #[error("unknown field {number} for message {message}")]
    UnknownField {
        /// Name of the message in scope
        message: &'static str,
        /// Offending field number
        number: u32,
    },

    /// A different field was added while a packed run was open
    #[error("invalid field {found} inside packed run of field {expected}")]
    InvalidField {
        /// Field the packed run was opened for
        expected: u32,
        /// Field that was added instead
        found: u32,
    },

    /// Allocation failed
    #[error("memory allocation of {size} bytes failed")]
    MemoryAllocation {
        /// Requested size
        size: usize,
    },

    /// A handler stopped the operation early
    #[error("cancelled by handler")]
    Cancelled,

    /// Varint longer than ten bytes or wider than 64 bits
    #[error("malformed varint")]
    MalformedVarint,

    /// Wire type is reserved or disagrees with the field's declared type
    #[error("invalid wire type {wire_type} for field {number}")]
    InvalidWireType {
        /// Field number from the key
        number: u32,
        /// Raw wire type bits
        wire_type: u8,
    },

    /// String field carried bytes that are not UTF-8
    #[error("invalid UTF-8 in field {number}: {source}")]
    InvalidUtf8 {
        /// Field number
        number: u32,
        /// Underlying UTF-8 error
        #[source]
        source: core::str::Utf8Error,
    },

    /// Value variant does not fit the field's declared type
    #[error("value for field {number} does not match declared type {expected}")]
    ValueMismatch {
        /// Field number
        number: u32,
        /// Declared field type
        expected: FieldType,
    },

    /// Engine operation called in the wrong state
    #[error("invalid encoder state: {0}")]
    InvalidState(&'static str),

    /// Nesting deeper than the configured recursion limit
    #[error("nesting exceeds maximum depth of {limit}")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// Struct map element size disagrees with the native size of the field type
    #[error("struct map size mismatch for field {number}: expected {expected} bytes, got {found}")]
    ElementSizeMismatch {
        /// Field number
        number: u32,
        /// Native size of the field type
        expected: usize,
        /// Size declared in the map
        found: usize,
    },

    /// Struct map describes a different message than the one being decoded
    #[error("struct map for {found} used for message {expected}")]
    MapMismatch {
        /// Message being decoded
        expected: &'static str,
        /// Message the map was built for
        found: &'static str,
    },

    /// Struct map points outside the record
    #[error("record too small: need {needed} bytes, got {got}")]
    RecordOverflow {
        /// Bytes the map addresses
        needed: usize,
        /// Record length
        got: usize,
    },
}

impl Error {
    /// Whether the error signals a schema/mapping defect or a resource limit
    /// rather than a recoverable buffer condition.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DepthExceeded { .. }
                | Self::ElementSizeMismatch { .. }
                | Self::MapMismatch { .. }
                | Self::RecordOverflow { .. }
        )
    }

    pub(crate) const fn end_of_buffer(needed: usize, available: usize) -> Self {
        Self::EndOfBuffer { needed, available }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
