//! Human-readable dump of decode events
//!
//! [`TracingDump`] is a [`DecodeHandler`] that renders each event as an
//! indented line, emits it as a `tracing` debug event, and keeps the full
//! text for callers that want it.
//!
//! ```
//! use pbstream::{FieldDescriptor, FieldLabel, FieldType, MessageDescriptor, TracingDump, decode};
//!
//! static FIELDS: [FieldDescriptor; 1] =
//!     [FieldDescriptor::new("id", 1, FieldLabel::Optional, FieldType::Int32)];
//! static PING: MessageDescriptor = MessageDescriptor::new("Ping", &FIELDS);
//!
//! let mut dump = TracingDump::new();
//! decode(&PING, &[0x08, 0x2a], &mut dump)?;
//! assert_eq!(dump.into_string(), "Ping {\n  id: int32 = 42\n}\n");
//! # Ok::<(), pbstream::Error>(())
//! ```

use std::fmt::Write;

use tracing::debug;

use crate::codec::DecodeHandler;
use crate::error::Result;
use crate::schema::{FieldDescriptor, MessageDescriptor, Value};

const INDENT: &str = "  ";

/// Decode handler that logs and collects an indented rendering
#[derive(Debug, Default)]
pub struct TracingDump {
    depth: usize,
    text: String,
}

impl TracingDump {
    /// Empty dump
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text collected so far
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Take the collected text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        let start = self.text.len();
        for _ in 0..self.depth {
            self.text.push_str(INDENT);
        }
        // Writing to a String cannot fail
        let _ = self.text.write_fmt(args);
        debug!(target: "pbstream::dump", "{}", &self.text[start..]);
        self.text.push('\n');
    }
}

impl<'a> DecodeHandler<'a> for TracingDump {
    fn on_message_start(
        &mut self,
        message: &'static MessageDescriptor,
        field: Option<&'static FieldDescriptor>,
    ) -> Result<()> {
        match field {
            Some(field) => self.line(format_args!("{}: {} {{", field.name(), message.name())),
            None => self.line(format_args!("{} {{", message.name())),
        }
        self.depth += 1;
        Ok(())
    }

    fn on_message_end(&mut self, _message: &'static MessageDescriptor) -> Result<()> {
        self.depth = self.depth.saturating_sub(1);
        self.line(format_args!("}}"));
        Ok(())
    }

    fn on_field(
        &mut self,
        _message: &'static MessageDescriptor,
        field: &'static FieldDescriptor,
        value: Value<'a>,
    ) -> Result<()> {
        self.line(format_args!(
            "{}: {} = {value}",
            field.name(),
            field.field_type()
        ));
        Ok(())
    }
}
