//! Field-to-memory layout tables

use std::ptr;

use crate::error::{Error, Result};
use crate::schema::{FieldDescriptor, FieldType, MessageDescriptor};

/// How one mapped field is stored in the record
#[derive(Debug, Clone, Copy)]
pub enum MapKind {
    /// Scalar, string, or bytes element of the given byte size
    Scalar {
        /// Bytes per element
        element_size: usize,
    },
    /// Embedded record laid out by another map
    Nested(&'static StructMap),
}

/// One field of a record layout
#[derive(Debug, Clone, Copy)]
pub struct StructMapField {
    field: &'static FieldDescriptor,
    offset: usize,
    kind: MapKind,
    count: usize,
}

impl StructMapField {
    /// Map a non-message field to `count` elements of `element_size` bytes
    /// starting at `offset`.
    #[must_use]
    pub const fn scalar(
        field: &'static FieldDescriptor,
        offset: usize,
        element_size: usize,
        count: usize,
    ) -> Self {
        assert!(
            !matches!(field.field_type(), FieldType::Message),
            "message fields need a nested map"
        );
        Self {
            field,
            offset,
            kind: MapKind::Scalar { element_size },
            count,
        }
    }

    /// Map a numeric, bool, or enum field using the type's native size.
    #[must_use]
    pub const fn typed(field: &'static FieldDescriptor, offset: usize, count: usize) -> Self {
        let Some(element_size) = field.field_type().native_size() else {
            panic!("field type has no native size");
        };
        Self::scalar(field, offset, element_size, count)
    }

    /// Map a string field to NUL-terminated buffers of `capacity` bytes.
    #[must_use]
    pub const fn string(
        field: &'static FieldDescriptor,
        offset: usize,
        capacity: usize,
        count: usize,
    ) -> Self {
        assert!(matches!(field.field_type(), FieldType::String));
        Self::scalar(field, offset, capacity, count)
    }

    /// Map a bytes field to buffers of `capacity` bytes.
    #[must_use]
    pub const fn bytes(
        field: &'static FieldDescriptor,
        offset: usize,
        capacity: usize,
        count: usize,
    ) -> Self {
        assert!(matches!(field.field_type(), FieldType::Bytes));
        Self::scalar(field, offset, capacity, count)
    }

    /// Map a message field to `count` embedded records laid out by `map`.
    #[must_use]
    pub const fn nested(
        field: &'static FieldDescriptor,
        offset: usize,
        map: &'static StructMap,
        count: usize,
    ) -> Self {
        assert!(
            matches!(field.field_type(), FieldType::Message),
            "nested maps need a message field"
        );
        Self {
            field,
            offset,
            kind: MapKind::Nested(map),
            count,
        }
    }

    /// Mapped field
    #[must_use]
    pub const fn field(&self) -> &'static FieldDescriptor {
        self.field
    }

    /// Byte offset of element 0
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Storage kind
    #[must_use]
    pub const fn kind(&self) -> MapKind {
        self.kind
    }

    /// Array capacity; 1 for singular fields
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Bytes per element; nested records use the child map's record size
    #[must_use]
    pub const fn element_size(&self) -> usize {
        match self.kind {
            MapKind::Scalar { element_size } => element_size,
            MapKind::Nested(map) => map.record_size,
        }
    }

    /// Byte range of element `index` relative to the record base
    #[must_use]
    pub const fn element_range(&self, index: usize) -> std::ops::Range<usize> {
        let start = self.offset + self.element_size() * index;
        start..start + self.element_size()
    }

    fn validate(&self, record_size: usize) -> Result<()> {
        let field = self.field;
        if let MapKind::Scalar { element_size } = self.kind {
            if let Some(native) = field.field_type().native_size() {
                if element_size != native {
                    return Err(Error::ElementSizeMismatch {
                        number: field.number(),
                        expected: native,
                        found: element_size,
                    });
                }
            }
        }
        if let MapKind::Nested(map) = self.kind {
            let expected = field.message_type().map_or("", MessageDescriptor::name);
            if !field.message_type().is_some_and(|message| ptr::eq(message, map.message)) {
                return Err(Error::MapMismatch {
                    expected,
                    found: map.message.name(),
                });
            }
        }
        let needed = self.offset + self.element_size() * self.count;
        if needed > record_size {
            return Err(Error::RecordOverflow {
                needed,
                got: record_size,
            });
        }
        Ok(())
    }
}

/// Layout of one record type: which message it holds and where each field
/// lives.
#[derive(Debug)]
pub struct StructMap {
    message: &'static MessageDescriptor,
    record_size: usize,
    fields: &'static [StructMapField],
}

impl StructMap {
    /// Describe a `record_size`-byte record holding `message`.
    #[must_use]
    pub const fn new(
        message: &'static MessageDescriptor,
        record_size: usize,
        fields: &'static [StructMapField],
    ) -> Self {
        Self {
            message,
            record_size,
            fields,
        }
    }

    /// Message this record holds
    #[must_use]
    pub const fn message(&self) -> &'static MessageDescriptor {
        self.message
    }

    /// Record size in bytes
    #[must_use]
    pub const fn record_size(&self) -> usize {
        self.record_size
    }

    /// Mapped fields
    #[must_use]
    pub const fn fields(&self) -> &'static [StructMapField] {
        self.fields
    }

    /// Index of the entry mapping `field`, by descriptor identity
    #[must_use]
    pub fn field_index_for(&self, field: &FieldDescriptor) -> Option<usize> {
        self.fields
            .iter()
            .position(|entry| ptr::eq(entry.field, field))
    }

    /// Entry mapping `field`, by descriptor identity
    #[must_use]
    pub fn field_for(&self, field: &FieldDescriptor) -> Option<&'static StructMapField> {
        self.fields.iter().find(|entry| ptr::eq(entry.field, field))
    }

    /// Check the layout and every nested layout below it: scalar sizes match
    /// their types, nested maps hold the field's message type, and every
    /// array fits inside its record. Nesting deeper than `max_depth` maps is
    /// rejected.
    pub fn validate(&self, max_depth: usize) -> Result<()> {
        if max_depth == 0 {
            return Err(Error::DepthExceeded { limit: max_depth });
        }
        self.validate_below(1, max_depth)
    }

    fn validate_below(&self, depth: usize, limit: usize) -> Result<()> {
        for entry in self.fields {
            entry.validate(self.record_size)?;
            if let MapKind::Nested(child) = entry.kind {
                if depth >= limit {
                    return Err(Error::DepthExceeded { limit });
                }
                child.validate_below(depth + 1, limit)?;
            }
        }
        Ok(())
    }
}
