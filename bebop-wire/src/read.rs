use uuid::Uuid;

use crate::{Date, DecodeError};

/// Marks where a length-prefixed message or union body ends, so readers can
/// skip content written by a schema version they do not know.
#[derive(Debug, Clone, Copy)]
pub struct BodyEnd {
    end: usize,
}

/// Decodes values from a byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buffer: &'a [u8],
    position: usize,
}

macro_rules! read_primitive_le {
    ($name:ident, $T:ty) => {
        pub fn $name(&mut self) -> Result<$T, DecodeError> {
            let bytes = self.take(std::mem::size_of::<$T>())?;
            Ok(<$T>::from_le_bytes(bytes.try_into().expect("take returned the wrong length")))
        }
    };
}

impl<'a> Reader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position == self.buffer.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < count {
            return Err(DecodeError::UnexpectedEnd {
                offset: self.position,
            });
        }
        let bytes = &self.buffer[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    read_primitive_le!(read_byte, u8);
    read_primitive_le!(read_uint16, u16);
    read_primitive_le!(read_int16, i16);
    read_primitive_le!(read_uint32, u32);
    read_primitive_le!(read_int32, i32);
    read_primitive_le!(read_uint64, u64);
    read_primitive_le!(read_int64, i64);
    read_primitive_le!(read_float32, f32);
    read_primitive_le!(read_float64, f64);

    /// Zero is `false`; writers only ever produce zero or one, but any
    /// nonzero byte decodes as `true`.
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_byte()? != 0)
    }

    /// The element count an array or map begins with.
    pub fn read_length(&mut self) -> Result<usize, DecodeError> {
        Ok(self.read_uint32()? as usize)
    }

    /// The presence tag of an optional value.
    pub fn read_presence(&mut self) -> Result<bool, DecodeError> {
        self.read_bool()
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let length = self.read_length()?;
        let offset = self.position;
        let bytes = self.take(length)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    /// The raw run a `byte[]` is encoded as. Borrowed from the buffer;
    /// callers copy only if they keep it.
    pub fn read_byte_array(&mut self) -> Result<&'a [u8], DecodeError> {
        let length = self.read_length()?;
        self.take(length)
    }

    pub fn read_guid(&mut self) -> Result<Uuid, DecodeError> {
        let bytes = self.take(16)?;
        Ok(Uuid::from_bytes_le(
            bytes.try_into().expect("take returned the wrong length"),
        ))
    }

    pub fn read_date(&mut self) -> Result<Date, DecodeError> {
        Ok(Date::from_ticks(self.read_int64()?))
    }

    /// Reads the length prefix of a message or union and remembers where the
    /// body ends. The prefix must not promise more bytes than the buffer
    /// holds.
    pub fn read_length_prefix(&mut self) -> Result<BodyEnd, DecodeError> {
        let offset = self.position;
        let length = self.read_length()?;
        let end = self.position + length;
        if end > self.buffer.len() {
            return Err(DecodeError::UnexpectedEnd { offset });
        }
        Ok(BodyEnd { end })
    }

    /// Skips whatever is left of a length-prefixed body: unknown message
    /// fields, or the branch of an unknown union discriminator.
    pub fn skip_to(&mut self, body: BodyEnd) {
        debug_assert!(body.end >= self.position, "cannot skip backwards");
        self.position = body.end;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Writer;

    #[test]
    fn primitive_struct_layout() {
        // struct Point { int32 x; int32 y; } with x = 1, y = -2.
        let mut writer = Writer::new();
        writer.write_int32(1);
        writer.write_int32(-2);
        assert_eq!(
            writer.as_bytes(),
            [0x01, 0x00, 0x00, 0x00, 0xfe, 0xff, 0xff, 0xff]
        );

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_int32(), Ok(1));
        assert_eq!(reader.read_int32(), Ok(-2));
        assert!(reader.is_at_end());
    }

    #[test]
    fn empty_struct_is_zero_bytes() {
        let writer = Writer::new();
        assert!(writer.is_empty());
        let reader = Reader::new(writer.as_bytes());
        assert!(reader.is_at_end());
    }

    #[test]
    fn message_with_present_and_absent_fields() {
        // message M { 1 -> int32 a; 2 -> string b; } with a = 5, b absent.
        let mut writer = Writer::new();
        let prefix = writer.reserve_length_prefix();
        writer.write_byte(1);
        writer.write_int32(5);
        writer.write_byte(0);
        writer.fill_length_prefix(prefix);
        assert_eq!(
            writer.as_bytes(),
            [0x06, 0x00, 0x00, 0x00, 0x01, 0x05, 0x00, 0x00, 0x00, 0x00]
        );

        let mut reader = Reader::new(writer.as_bytes());
        let body = reader.read_length_prefix().unwrap();
        let mut a = None;
        let mut b = None;
        loop {
            match reader.read_byte().unwrap() {
                0 => break,
                1 => a = Some(reader.read_int32().unwrap()),
                2 => b = Some(reader.read_string().unwrap()),
                _ => {
                    reader.skip_to(body);
                    break;
                }
            }
        }
        assert_eq!(a, Some(5));
        assert_eq!(b, None);
        assert!(reader.is_at_end());
    }

    #[test]
    fn empty_message_is_length_and_terminator() {
        let mut writer = Writer::new();
        let prefix = writer.reserve_length_prefix();
        writer.write_byte(0);
        writer.fill_length_prefix(prefix);
        assert_eq!(writer.as_bytes(), [0x01, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn unknown_message_field_skips_to_body_end() {
        // Writer knows fields {1, 2, 3}; reader only knows {1, 3}. Index 2 is
        // unknown, so the reader bails to the end of the body and keeps what
        // it has.
        let mut writer = Writer::new();
        let prefix = writer.reserve_length_prefix();
        writer.write_byte(1);
        writer.write_int32(10);
        writer.write_byte(2);
        writer.write_string("mystery");
        writer.write_byte(3);
        writer.write_int32(30);
        writer.write_byte(0);
        writer.fill_length_prefix(prefix);

        let buffer = writer.into_buffer();
        let mut reader = Reader::new(&buffer);
        let body = reader.read_length_prefix().unwrap();
        let mut a = None;
        let mut c = None;
        loop {
            match reader.read_byte().unwrap() {
                0 => break,
                1 => a = Some(reader.read_int32().unwrap()),
                3 => c = Some(reader.read_int32().unwrap()),
                _ => {
                    reader.skip_to(body);
                    break;
                }
            }
        }
        assert_eq!(a, Some(10));
        assert_eq!(c, None);
        assert!(reader.is_at_end());
    }

    #[test]
    fn union_layout_and_unknown_discriminator() {
        // union U { 1 -> struct A { byte x; }; 2 -> struct B { byte y; }; }
        // with branch 2, y = 9.
        let mut writer = Writer::new();
        let prefix = writer.reserve_length_prefix();
        writer.write_byte(2);
        writer.write_byte(9);
        writer.fill_length_prefix(prefix);
        assert_eq!(writer.as_bytes(), [0x02, 0x00, 0x00, 0x00, 0x02, 0x09]);

        let mut reader = Reader::new(writer.as_bytes());
        let _body = reader.read_length_prefix().unwrap();
        match reader.read_byte().unwrap() {
            2 => assert_eq!(reader.read_byte(), Ok(9)),
            other => panic!("wrong discriminator {other}"),
        }

        // A decoder that only knows discriminator 1 skips the body and
        // reports the unknown tag.
        let mut reader = Reader::new(writer.as_bytes());
        let body = reader.read_length_prefix().unwrap();
        let result: Result<(), DecodeError> = match reader.read_byte().unwrap() {
            1 => Ok(()),
            unknown => {
                reader.skip_to(body);
                Err(DecodeError::UnknownDiscriminator {
                    discriminator: unknown,
                })
            }
        };
        assert_eq!(
            result,
            Err(DecodeError::UnknownDiscriminator { discriminator: 2 })
        );
        assert!(reader.is_at_end());
    }

    #[test]
    fn strings_are_length_prefixed_utf8() {
        let mut writer = Writer::new();
        writer.write_string("héllo");
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_string().unwrap(), "héllo");
        assert!(reader.is_at_end());

        let buffer = [0x02, 0x00, 0x00, 0x00, 0xff, 0xfe];
        let mut reader = Reader::new(&buffer);
        assert_eq!(
            reader.read_string(),
            Err(DecodeError::InvalidUtf8 { offset: 4 })
        );
    }

    #[test]
    fn byte_arrays_are_raw_runs() {
        let mut writer = Writer::new();
        writer.write_byte_array(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            writer.as_bytes(),
            [0x04, 0x00, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef]
        );
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_byte_array().unwrap(), [0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn maps_keep_insertion_order_on_the_wire() {
        // struct KV { map[string, int32] m; } with m = {"a": 1, "b": 2}.
        let mut writer = Writer::new();
        let entries = [("a", 1i32), ("b", 2i32)];
        writer.write_length(entries.len());
        for (key, value) in entries {
            writer.write_string(key);
            writer.write_int32(value);
        }

        let mut reader = Reader::new(writer.as_bytes());
        let count = reader.read_length().unwrap();
        let mut decoded = vec![];
        for _ in 0..count {
            let key = reader.read_string().unwrap();
            let value = reader.read_int32().unwrap();
            decoded.push((key, value));
        }
        assert_eq!(decoded, vec![("a".to_owned(), 1), ("b".to_owned(), 2)]);
        assert!(reader.is_at_end());
    }

    #[test]
    fn nested_optionals_stack_presence_tags() {
        // int32?? holding Some(Some(7)): two presence bytes, then the value.
        let mut writer = Writer::new();
        writer.write_presence(true);
        writer.write_presence(true);
        writer.write_int32(7);
        assert_eq!(writer.as_bytes(), [0x01, 0x01, 0x07, 0x00, 0x00, 0x00]);

        // Some(None): present outer, absent inner, no payload.
        let mut writer = Writer::new();
        writer.write_presence(true);
        writer.write_presence(false);
        assert_eq!(writer.as_bytes(), [0x01, 0x00]);
    }

    #[test]
    fn guid_uses_the_mixed_endian_layout() {
        let guid = Uuid::parse_str("81c6987b-48b7-495f-ad01-ec20cc5f5be1").unwrap();
        let mut writer = Writer::new();
        writer.write_guid(guid);
        assert_eq!(
            writer.as_bytes(),
            [
                0x7b, 0x98, 0xc6, 0x81, // first group, little-endian
                0xb7, 0x48, // second group, little-endian
                0x5f, 0x49, // third group, little-endian
                0xad, 0x01, 0xec, 0x20, 0xcc, 0x5f, 0x5b, 0xe1, // as written
            ]
        );
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_guid(), Ok(guid));
    }

    #[test]
    fn dates_are_tick_counts() {
        let date = Date::from_ticks(-621355968000000000);
        let mut writer = Writer::new();
        writer.write_date(date);
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_date(), Ok(date));
    }

    #[test]
    fn bool_decodes_any_nonzero_as_true() {
        let mut reader = Reader::new(&[0x00, 0x01, 0x2a]);
        assert_eq!(reader.read_bool(), Ok(false));
        assert_eq!(reader.read_bool(), Ok(true));
        assert_eq!(reader.read_bool(), Ok(true));
    }

    #[test]
    fn truncated_buffers_are_rejected() {
        let mut reader = Reader::new(&[0x01, 0x02]);
        assert_eq!(
            reader.read_int32(),
            Err(DecodeError::UnexpectedEnd { offset: 0 })
        );

        // A length prefix that promises more than the buffer holds.
        let mut reader = Reader::new(&[0x10, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(
            reader.read_length_prefix().map(|_| ()),
            Err(DecodeError::UnexpectedEnd { offset: 0 })
        );
    }

    #[test]
    fn every_scalar_round_trips() {
        let mut writer = Writer::new();
        writer.write_bool(true);
        writer.write_byte(0xab);
        writer.write_int16(-12345);
        writer.write_uint16(54321);
        writer.write_int32(-1234567890);
        writer.write_uint32(3456789012);
        writer.write_int64(-1234567890123456789);
        writer.write_uint64(12345678901234567890);
        writer.write_float32(1.5);
        writer.write_float64(-2.25);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_bool(), Ok(true));
        assert_eq!(reader.read_byte(), Ok(0xab));
        assert_eq!(reader.read_int16(), Ok(-12345));
        assert_eq!(reader.read_uint16(), Ok(54321));
        assert_eq!(reader.read_int32(), Ok(-1234567890));
        assert_eq!(reader.read_uint32(), Ok(3456789012));
        assert_eq!(reader.read_int64(), Ok(-1234567890123456789));
        assert_eq!(reader.read_uint64(), Ok(12345678901234567890));
        assert_eq!(reader.read_float32(), Ok(1.5));
        assert_eq!(reader.read_float64(), Ok(-2.25));
        assert!(reader.is_at_end());
    }
}
