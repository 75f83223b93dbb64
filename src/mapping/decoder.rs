//! Decoding straight into fixed-layout records
//!
//! [`StructDecoder`] listens to [`Decoder`] events and writes each mapped
//! value into the caller's record at the offset its [`StructMap`] gives.
//! Repeated fields fill consecutive array elements; repeated messages fill
//! consecutive embedded records.

use bytemuck::Pod;
use tracing::{debug, instrument, trace};

use super::struct_map::{MapKind, StructMap, StructMapField};
use crate::codec::{CodecConfig, DecodeHandler, Decoder, RecursionStack};
use crate::error::{Error, Result};
use crate::schema::{FieldDescriptor, MessageDescriptor, Value};

/// Fill state for one open message
#[derive(Debug, Clone, Copy)]
struct Level {
    /// `None` for a message with no place in the record
    target: Option<(&'static StructMap, usize)>,
    last: Option<usize>,
    index: usize,
}

impl Level {
    const DISCARD: Self = Self {
        target: None,
        last: None,
        index: 0,
    };

    const fn new(map: &'static StructMap, base: usize) -> Self {
        Self {
            target: Some((map, base)),
            last: None,
            index: 0,
        }
    }

    /// Element slot for the next value of mapped entry `entry`, or `None`
    /// once the array is full. Singular fields always use slot 0.
    fn next_slot(&mut self, entry: usize, mapped: &StructMapField) -> Option<usize> {
        if self.last != Some(entry) {
            self.last = Some(entry);
            self.index = 0;
        }
        if !mapped.field().is_repeated() {
            return (mapped.count() > 0).then_some(0);
        }
        let slot = self.index;
        self.index += 1;
        (slot < mapped.count()).then_some(slot)
    }
}

/// Decodes messages into records described by a [`StructMap`].
#[derive(Debug)]
pub struct StructDecoder {
    decoder: Decoder,
    levels: RecursionStack<Level>,
    max_depth: usize,
}

impl StructDecoder {
    /// Create a struct decoder with the given limits.
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self {
            decoder: Decoder::new(config),
            levels: RecursionStack::new(config.max_depth),
            max_depth: config.max_depth,
        }
    }

    /// Decode `buf` into `record`, returning the bytes consumed.
    pub fn decode(
        &mut self,
        map: &'static StructMap,
        record: &mut [u8],
        buf: &[u8],
    ) -> Result<usize> {
        self.decode_with(map, record, buf, &mut ())
    }

    /// Decode into a plain-old-data record.
    pub fn decode_into<T: Pod>(
        &mut self,
        map: &'static StructMap,
        record: &mut T,
        buf: &[u8],
    ) -> Result<usize> {
        self.decode(map, bytemuck::bytes_of_mut(record), buf)
    }

    /// Decode into `record` and forward every event to `passthrough`.
    ///
    /// The layout is validated before any byte is read. On error the record
    /// holds whatever was written before the failure.
    #[instrument(
        level = "trace",
        skip_all,
        fields(message = map.message().name(), record = record.len(), len = buf.len())
    )]
    pub fn decode_with<'a, H>(
        &mut self,
        map: &'static StructMap,
        record: &mut [u8],
        buf: &'a [u8],
        passthrough: &mut H,
    ) -> Result<usize>
    where
        H: DecodeHandler<'a> + ?Sized,
    {
        map.validate(self.max_depth)?;
        if map.record_size() > record.len() {
            return Err(Error::RecordOverflow {
                needed: map.record_size(),
                got: record.len(),
            });
        }

        self.levels.clear();
        let mut filler = Filler {
            root: map,
            record,
            levels: &mut self.levels,
            passthrough,
        };
        self.decoder.decode(map.message(), buf, &mut filler)
    }
}

impl Default for StructDecoder {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

/// Decode `buf` into `record` with default limits.
pub fn decode_struct(map: &'static StructMap, record: &mut [u8], buf: &[u8]) -> Result<usize> {
    StructDecoder::default().decode(map, record, buf)
}

struct Filler<'r, 'h, H: ?Sized> {
    root: &'static StructMap,
    record: &'r mut [u8],
    levels: &'h mut RecursionStack<Level>,
    passthrough: &'h mut H,
}

impl<H: ?Sized> Filler<'_, '_, H> {
    fn child_level(&mut self, field: Option<&'static FieldDescriptor>) -> Level {
        let Some(parent) = self.levels.top_mut() else {
            return Level::new(self.root, 0);
        };
        let (Some((map, base)), Some(field)) = (parent.target, field) else {
            return Level::DISCARD;
        };
        let Some(entry) = map.field_index_for(field) else {
            return Level::DISCARD;
        };
        let mapped = &map.fields()[entry];
        let MapKind::Nested(child) = mapped.kind() else {
            return Level::DISCARD;
        };
        match parent.next_slot(entry, mapped) {
            Some(slot) => Level::new(child, base + mapped.element_range(slot).start),
            None => {
                debug!(
                    field = field.number(),
                    capacity = mapped.count(),
                    "record array full, discarding message"
                );
                Level::DISCARD
            }
        }
    }

    fn store(&mut self, field: &FieldDescriptor, value: Value<'_>) -> Result<()> {
        let Some(level) = self.levels.top_mut() else {
            return Ok(());
        };
        let Some((map, base)) = level.target else {
            return Ok(());
        };
        let Some(entry) = map.field_index_for(field) else {
            trace!(field = field.number(), "unmapped field");
            return Ok(());
        };
        let mapped = &map.fields()[entry];
        if let MapKind::Nested(_) = mapped.kind() {
            return Ok(());
        }
        let Some(slot) = level.next_slot(entry, mapped) else {
            debug!(
                field = field.number(),
                capacity = mapped.count(),
                "record array full, discarding value"
            );
            return Ok(());
        };

        let range = mapped.element_range(slot);
        let needed = base + range.end;
        let got = self.record.len();
        let dst = self
            .record
            .get_mut(base + range.start..needed)
            .ok_or(Error::RecordOverflow { needed, got })?;
        write_value(dst, field, value)
    }
}

/// Write one decoded value into its element slot.
fn write_value(dst: &mut [u8], field: &FieldDescriptor, value: Value<'_>) -> Result<()> {
    let flag;
    let src: &[u8] = match &value {
        Value::Double(v) => bytemuck::bytes_of(v),
        Value::Float(v) => bytemuck::bytes_of(v),
        Value::Int32(v) | Value::Enum(v) => bytemuck::bytes_of(v),
        Value::Int64(v) => bytemuck::bytes_of(v),
        Value::UInt32(v) => bytemuck::bytes_of(v),
        Value::UInt64(v) => bytemuck::bytes_of(v),
        Value::Bool(v) => {
            flag = u8::from(*v);
            bytemuck::bytes_of(&flag)
        }
        Value::String(text) => {
            // Truncate to leave room for the terminator
            let Some(room) = dst.len().checked_sub(1) else {
                return Ok(());
            };
            let n = text.len().min(room);
            dst[..n].copy_from_slice(&text.as_bytes()[..n]);
            dst[n] = 0;
            return Ok(());
        }
        Value::Bytes(bytes) => {
            let n = bytes.len().min(dst.len());
            dst[..n].copy_from_slice(&bytes[..n]);
            return Ok(());
        }
        Value::Message(_) => return Ok(()),
    };

    if src.len() != dst.len() {
        return Err(Error::ElementSizeMismatch {
            number: field.number(),
            expected: src.len(),
            found: dst.len(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}

impl<'a, H> DecodeHandler<'a> for Filler<'_, '_, H>
where
    H: DecodeHandler<'a> + ?Sized,
{
    fn on_message_start(
        &mut self,
        message: &'static MessageDescriptor,
        field: Option<&'static FieldDescriptor>,
    ) -> Result<()> {
        let level = self.child_level(field);
        if let Some((map, base)) = level.target {
            trace!(message = message.name(), map = map.message().name(), base, "record level");
        }
        self.levels.push(level)?;
        self.passthrough.on_message_start(message, field)
    }

    fn on_message_end(&mut self, message: &'static MessageDescriptor) -> Result<()> {
        self.levels.pop();
        self.passthrough.on_message_end(message)
    }

    fn on_field(
        &mut self,
        message: &'static MessageDescriptor,
        field: &'static FieldDescriptor,
        value: Value<'a>,
    ) -> Result<()> {
        self.store(field, value)?;
        self.passthrough.on_field(message, field, value)
    }
}
