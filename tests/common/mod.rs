#![allow(dead_code)]

use pbstream::{
    DecodeHandler, FieldDescriptor, FieldLabel, FieldType, MessageDescriptor, Result, Value,
};

pub static PHONE_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new("number", 1, FieldLabel::Required, FieldType::String),
    FieldDescriptor::new("type", 2, FieldLabel::Optional, FieldType::Enum)
        .with_default(Value::Enum(1)),
];
pub static PHONE: MessageDescriptor = MessageDescriptor::new("PhoneNumber", &PHONE_FIELDS);

pub static PERSON_FIELDS: [FieldDescriptor; 4] = [
    FieldDescriptor::new("id", 1, FieldLabel::Required, FieldType::Int32),
    FieldDescriptor::new("name", 2, FieldLabel::Required, FieldType::String),
    FieldDescriptor::new("email", 3, FieldLabel::Optional, FieldType::String),
    FieldDescriptor::message("phone", 4, FieldLabel::Repeated, &PHONE),
];
pub static PERSON: MessageDescriptor = MessageDescriptor::new("Person", &PERSON_FIELDS);

pub static ID: &FieldDescriptor = &PERSON_FIELDS[0];
pub static NAME: &FieldDescriptor = &PERSON_FIELDS[1];
pub static PHONE_FIELD: &FieldDescriptor = &PERSON_FIELDS[3];
pub static NUMBER: &FieldDescriptor = &PHONE_FIELDS[0];
pub static PHONE_TYPE: &FieldDescriptor = &PHONE_FIELDS[1];

// Three levels: Document > Section > Line
pub static LINE_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new("text", 1, FieldLabel::Optional, FieldType::String),
    FieldDescriptor::new("width", 2, FieldLabel::Optional, FieldType::UInt32),
];
pub static LINE: MessageDescriptor = MessageDescriptor::new("Line", &LINE_FIELDS);

pub static SECTION_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new("title", 1, FieldLabel::Optional, FieldType::String),
    FieldDescriptor::message("lines", 2, FieldLabel::Repeated, &LINE),
];
pub static SECTION: MessageDescriptor = MessageDescriptor::new("Section", &SECTION_FIELDS);

pub static DOCUMENT_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new("version", 1, FieldLabel::Optional, FieldType::UInt64),
    FieldDescriptor::message("sections", 2, FieldLabel::Repeated, &SECTION),
];
pub static DOCUMENT: MessageDescriptor = MessageDescriptor::new("Document", &DOCUMENT_FIELDS);

/// Decode events flattened into comparable strings
#[derive(Debug, Default)]
pub struct EventLog(pub Vec<String>);

impl<'a> DecodeHandler<'a> for EventLog {
    fn on_message_start(
        &mut self,
        message: &'static MessageDescriptor,
        _field: Option<&'static FieldDescriptor>,
    ) -> Result<()> {
        self.0.push(format!("start {}", message.name()));
        Ok(())
    }

    fn on_message_end(&mut self, message: &'static MessageDescriptor) -> Result<()> {
        self.0.push(format!("end {}", message.name()));
        Ok(())
    }

    fn on_field(
        &mut self,
        _message: &'static MessageDescriptor,
        field: &'static FieldDescriptor,
        value: Value<'a>,
    ) -> Result<()> {
        self.0.push(format!("{}={value}", field.name()));
        Ok(())
    }
}

/// Field values only, in order
#[derive(Debug, Default)]
pub struct Values(pub Vec<(u32, String)>);

impl<'a> DecodeHandler<'a> for Values {
    fn on_field(
        &mut self,
        _message: &'static MessageDescriptor,
        field: &'static FieldDescriptor,
        value: Value<'a>,
    ) -> Result<()> {
        self.0.push((field.number(), value.to_string()));
        Ok(())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
