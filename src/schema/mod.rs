//! Schema model consumed by the codec
//!
//! Descriptors are read-only tables supplied by a schema compiler; values are
//! borrowed views passed between the engines and their callers.

mod descriptor;
mod types;
mod value;

pub use descriptor::{FieldDescriptor, MessageDescriptor};
pub use types::{FieldLabel, FieldType};
pub use value::Value;
