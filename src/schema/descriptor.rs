//! Message and field descriptors
//!
//! Descriptor tables are produced ahead of time by a schema compiler and live
//! for the whole process, so every reference between them is `'static`.
//! The codec only reads them.

use std::fmt;
use std::ptr;

use super::{FieldLabel, FieldType, Value};
use crate::wire::WireType;

/// Description of a single field within a message
pub struct FieldDescriptor {
    name: &'static str,
    number: u32,
    label: FieldLabel,
    ty: FieldType,
    packed: bool,
    default: Option<Value<'static>>,
    message: Option<&'static MessageDescriptor>,
}

impl FieldDescriptor {
    /// Describe a scalar, string, or bytes field.
    ///
    /// Message-typed fields must use [`FieldDescriptor::message`].
    #[must_use]
    pub const fn new(name: &'static str, number: u32, label: FieldLabel, ty: FieldType) -> Self {
        assert!(
            !matches!(ty, FieldType::Message),
            "message fields need a nested descriptor"
        );
        Self {
            name,
            number,
            label,
            ty,
            packed: false,
            default: None,
            message: None,
        }
    }

    /// Describe a field holding an embedded message.
    #[must_use]
    pub const fn message(
        name: &'static str,
        number: u32,
        label: FieldLabel,
        message: &'static MessageDescriptor,
    ) -> Self {
        Self {
            name,
            number,
            label,
            ty: FieldType::Message,
            packed: false,
            default: None,
            message: Some(message),
        }
    }

    /// Mark a repeated scalar field as packed.
    #[must_use]
    pub const fn packed(mut self) -> Self {
        assert!(
            matches!(self.label, FieldLabel::Repeated) && self.ty.is_packable(),
            "only repeated scalar fields can be packed"
        );
        self.packed = true;
        self
    }

    /// Attach the schema default value.
    #[must_use]
    pub const fn with_default(mut self, value: Value<'static>) -> Self {
        self.default = Some(value);
        self
    }

    /// Field name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Field number
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Field label
    #[must_use]
    pub const fn label(&self) -> FieldLabel {
        self.label
    }

    /// Declared type
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.ty
    }

    /// Wire type of a single (unpacked) value
    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        self.ty.wire_type()
    }

    /// Whether the field is repeated and packed
    #[must_use]
    pub const fn is_packed_repeated(&self) -> bool {
        self.packed && matches!(self.label, FieldLabel::Repeated)
    }

    /// Whether the field is repeated
    #[must_use]
    pub const fn is_repeated(&self) -> bool {
        matches!(self.label, FieldLabel::Repeated)
    }

    /// Whether a length-delimited occurrence of this field is a packed run.
    ///
    /// Repeated scalar fields accept both encodings whatever their `packed`
    /// flag says.
    #[must_use]
    pub const fn accepts_packed(&self) -> bool {
        self.is_repeated() && self.ty.is_packable()
    }

    /// Schema default, if one was declared. Never applied by the encoder.
    #[must_use]
    pub const fn default_value(&self) -> Option<Value<'static>> {
        self.default
    }

    /// Nested message descriptor for message-typed fields
    #[must_use]
    pub const fn message_type(&self) -> Option<&'static MessageDescriptor> {
        self.message
    }

    /// Wire key for this field with the given wire type
    #[must_use]
    pub const fn key(&self, wire_type: WireType) -> u64 {
        ((self.number as u64) << 3) | wire_type.as_u8() as u64
    }
}

impl fmt::Debug for FieldDescriptor {
    // Nested descriptors may be recursive, so only the message name is shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("number", &self.number)
            .field("label", &self.label)
            .field("type", &self.ty)
            .field("packed", &self.packed)
            .field("default", &self.default)
            .field("message", &self.message.map(MessageDescriptor::name))
            .finish()
    }
}

/// Description of a message: its fields in declaration order
pub struct MessageDescriptor {
    name: &'static str,
    fields: &'static [FieldDescriptor],
}

impl MessageDescriptor {
    /// Create a descriptor over a static field table.
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self { name, fields }
    }

    /// Message name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Fields in declaration order
    #[must_use]
    pub const fn fields(&self) -> &'static [FieldDescriptor] {
        self.fields
    }

    /// Find a field by number. Linear scan; the first match wins.
    #[must_use]
    pub fn field_by_number(&self, number: u32) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.number == number)
    }

    /// Find a field by name.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Whether `field` is one of this message's descriptors (by identity).
    #[must_use]
    pub fn contains(&self, field: &FieldDescriptor) -> bool {
        self.fields.iter().any(|candidate| ptr::eq(candidate, field))
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static NODE_FIELDS: [FieldDescriptor; 3] = [
        FieldDescriptor::new("id", 7, FieldLabel::Required, FieldType::UInt32)
            .with_default(Value::UInt32(5)),
        FieldDescriptor::message("child", 2, FieldLabel::Optional, &NODE),
        FieldDescriptor::new("weights", 3, FieldLabel::Repeated, FieldType::Float).packed(),
    ];
    static NODE: MessageDescriptor = MessageDescriptor::new("Node", &NODE_FIELDS);

    #[test]
    fn test_lookup_by_number_and_name() {
        let child = NODE.field_by_number(2).unwrap();
        assert_eq!(child.name(), "child");
        assert!(ptr::eq(child.message_type().unwrap(), &NODE));
        assert!(NODE.field_by_number(1).is_none());
        assert_eq!(NODE.field_by_name("weights").unwrap().number(), 3);
    }

    #[test]
    fn test_membership_is_by_identity() {
        let lookalike = FieldDescriptor::new("id", 7, FieldLabel::Required, FieldType::UInt32);
        assert!(NODE.contains(&NODE_FIELDS[0]));
        assert!(!NODE.contains(&lookalike));
    }

    #[test]
    fn test_packed_and_key() {
        assert!(NODE_FIELDS[2].is_packed_repeated());
        assert!(!NODE_FIELDS[0].is_packed_repeated());
        assert!(NODE_FIELDS[2].accepts_packed());
        assert!(!NODE_FIELDS[0].accepts_packed());
        assert_eq!(NODE_FIELDS[0].key(WireType::Varint), 7 << 3);
        assert_eq!(NODE_FIELDS[1].key(WireType::LengthDelimited), (2 << 3) | 2);
        assert_eq!(NODE_FIELDS[0].default_value(), Some(Value::UInt32(5)));
    }

    #[test]
    fn test_debug_does_not_recurse() {
        let rendered = format!("{NODE:?}");
        assert!(rendered.contains("Some(\"Node\")"));
    }
}
