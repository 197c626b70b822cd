use uuid::Uuid;

use crate::Date;

/// Marks a reserved length prefix in a [`Writer`], to be backfilled once the
/// body it frames has been written.
#[derive(Debug, Clone, Copy)]
#[must_use = "a reserved length prefix must be filled"]
pub struct LengthPrefix {
    at: usize,
}

/// Encodes values into a growable byte buffer.
///
/// Writing cannot fail; the only resource involved is memory.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buffer: Vec<u8>,
}

macro_rules! write_primitive_le {
    ($name:ident, $T:ty) => {
        pub fn $name(&mut self, value: $T) {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    };
}

impl Writer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    write_primitive_le!(write_byte, u8);
    write_primitive_le!(write_uint16, u16);
    write_primitive_le!(write_int16, i16);
    write_primitive_le!(write_uint32, u32);
    write_primitive_le!(write_int32, i32);
    write_primitive_le!(write_uint64, u64);
    write_primitive_le!(write_int64, i64);
    write_primitive_le!(write_float32, f32);
    write_primitive_le!(write_float64, f64);

    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(value as u8);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_length(value.len());
        self.buffer.extend_from_slice(value.as_bytes());
    }

    /// `byte[]` skips per-element encoding and goes out as one raw run.
    pub fn write_byte_array(&mut self, value: &[u8]) {
        self.write_length(value.len());
        self.buffer.extend_from_slice(value);
    }

    /// The element count an array or map begins with. Elements follow,
    /// encoded back to back (key then value, for maps, in insertion order).
    pub fn write_length(&mut self, count: usize) {
        self.write_uint32(count.try_into().expect("length exceeds u32::MAX"));
    }

    /// The presence tag of an optional value. When `true`, the value's own
    /// encoding follows.
    pub fn write_presence(&mut self, present: bool) {
        self.write_byte(present as u8);
    }

    pub fn write_guid(&mut self, value: Uuid) {
        self.buffer.extend_from_slice(&value.to_bytes_le());
    }

    pub fn write_date(&mut self, value: Date) {
        self.write_int64(value.ticks());
    }

    /// Reserves four bytes for the length prefix of a message or union body.
    /// Fill it with [`Writer::fill_length_prefix`] once the body is done.
    pub fn reserve_length_prefix(&mut self) -> LengthPrefix {
        let at = self.buffer.len();
        self.write_uint32(0);
        LengthPrefix { at }
    }

    /// Backfills a reserved prefix with the number of bytes written since
    /// the reservation, not counting the prefix itself.
    pub fn fill_length_prefix(&mut self, prefix: LengthPrefix) {
        let length = self.buffer.len() - prefix.at - 4;
        let length: u32 = length.try_into().expect("body length exceeds u32::MAX");
        self.buffer[prefix.at..prefix.at + 4].copy_from_slice(&length.to_le_bytes());
    }
}
