//! bencode codec: the simple generation of the toolkit, no reference
//! tables. Byte strings decode as [`Value::Bytes`] because payloads (for
//! example torrent piece hashes) are frequently binary; text targets
//! validate UTF-8 on assignment.

use std::io::Read;
use std::rc::Rc;
use std::sync::LazyLock;

use bytes::{BufMut, Bytes, BytesMut};
use wirevalue::{ByteReader, CodecError, Translate, Translator};

mod torrent;

pub use torrent::{File, FileInfo, MetaData, Torrent};
pub use wirevalue::Value;

static TRANSLATOR: LazyLock<Translator> = LazyLock::new(|| Translator::new("bencode"));

/// The translator reading `bencode = "..."` record tags.
pub fn translator() -> &'static Translator {
    &TRANSLATOR
}

/// Encode one native value.
pub fn encode<T: Translate>(x: &T) -> Result<Bytes, CodecError> {
    Encoder::new().encode(x)
}

/// Decode one native value from an in-memory buffer.
pub fn decode_bytes<T: Translate + Default>(bytes: &[u8]) -> Result<T, CodecError> {
    Decoder::new(bytes).decode()
}

pub struct Encoder {
    buf: BytesMut,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    pub fn encode<T: Translate>(&mut self, x: &T) -> Result<Bytes, CodecError> {
        let value = x.to_value(translator())?;
        self.encode_value(&value)
    }

    pub fn encode_value(&mut self, value: &Value) -> Result<Bytes, CodecError> {
        self.buf.clear();
        self.put_value(value)?;
        Ok(self.buf.split().freeze())
    }

    fn put_value(&mut self, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Integer(i) => {
                self.buf.put_u8(b'i');
                self.buf.put_slice(i.to_string().as_bytes());
                self.buf.put_u8(b'e');
            }
            Value::String(s) => self.put_byte_string(s.as_bytes()),
            Value::Bytes(raw) => self.put_byte_string(raw),
            Value::Array(items) => {
                self.buf.put_u8(b'l');
                for item in items.iter() {
                    self.put_value(item)?;
                }
                self.buf.put_u8(b'e');
            }
            Value::Object(pairs) => {
                self.buf.put_u8(b'd');
                for (key, item) in pairs.iter() {
                    self.put_byte_string(key.as_bytes());
                    self.put_value(item)?;
                }
                self.buf.put_u8(b'e');
            }
            Value::Dictionary(entries) => {
                self.buf.put_u8(b'd');
                for (key, item) in entries.iter() {
                    match key {
                        Value::String(key) => self.put_byte_string(key.as_bytes()),
                        Value::Bytes(key) => self.put_byte_string(key),
                        _ => {
                            return Err(CodecError::Unsupported(
                                "non-string dictionary key",
                            ));
                        }
                    }
                    self.put_value(item)?;
                }
                self.buf.put_u8(b'e');
            }
            _ => return Err(CodecError::Unsupported("value has no bencode form")),
        }
        Ok(())
    }

    fn put_byte_string(&mut self, raw: &[u8]) {
        self.buf.put_slice(raw.len().to_string().as_bytes());
        self.buf.put_u8(b':');
        self.buf.put_slice(raw);
    }
}

pub struct Decoder<R> {
    reader: ByteReader<R>,
}

impl<R: Read> Decoder<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: ByteReader::new(source),
        }
    }

    /// Decode one value and translate it into a fresh `T`.
    pub fn decode<T: Translate + Default>(&mut self) -> Result<T, CodecError> {
        let mut target = T::default();
        self.decode_into(&mut target)?;
        Ok(target)
    }

    /// Decode one value into an existing target.
    pub fn decode_into<T: Translate>(&mut self, target: &mut T) -> Result<(), CodecError> {
        let value = self.decode_value()?;
        target.from_value(&value, translator())
    }

    /// Decode one value into the intermediate representation.
    pub fn decode_value(&mut self) -> Result<Value, CodecError> {
        match self.reader.read_byte()? {
            b'i' => {
                let n = self.read_number()?;
                if self.reader.read_byte()? != b'e' {
                    return Err(CodecError::Syntax("unterminated integer"));
                }
                Ok(Value::Integer(n))
            }
            b'l' => {
                let mut items = vec![];
                loop {
                    if self.reader.read_byte()? == b'e' {
                        return Ok(Value::Array(Rc::new(items)));
                    }
                    self.reader.unread_byte();
                    items.push(self.decode_value()?);
                }
            }
            b'd' => {
                let mut pairs = vec![];
                loop {
                    let byte = self.reader.read_byte()?;
                    if byte == b'e' {
                        return Ok(Value::Object(Rc::new(pairs)));
                    }
                    if !byte.is_ascii_digit() {
                        return Err(CodecError::Syntax("dictionary key must be a byte string"));
                    }
                    self.reader.unread_byte();
                    let raw_key = self.read_byte_string()?;
                    let key = String::from_utf8(raw_key.to_vec())
                        .map_err(|_| CodecError::InvalidUtf8)?;
                    let value = self.decode_value()?;
                    pairs.push((key, value));
                }
            }
            byte if byte.is_ascii_digit() => {
                self.reader.unread_byte();
                Ok(Value::Bytes(self.read_byte_string()?))
            }
            _ => Err(CodecError::Syntax("unknown delimiter")),
        }
    }

    fn read_byte_string(&mut self) -> Result<Bytes, CodecError> {
        let len = self.read_number()?;
        let len = usize::try_from(len).map_err(|_| CodecError::Syntax("negative length"))?;
        if self.reader.read_byte()? != b':' {
            return Err(CodecError::Syntax("missing length separator"));
        }
        self.reader.read_exact(len)
    }

    /// Digit run delimited by push-back; the caller checks the byte that
    /// ends it.
    fn read_number(&mut self) -> Result<i64, CodecError> {
        let mut negative = false;
        let mut byte = self.reader.read_byte()?;
        if byte == b'-' {
            negative = true;
            byte = self.reader.read_byte()?;
        }
        let mut n: i64 = 0;
        while byte.is_ascii_digit() {
            n = n.wrapping_mul(10).wrapping_add(i64::from(byte - b'0'));
            byte = self.reader.read_byte()?;
        }
        self.reader.unread_byte();
        Ok(if negative { -n } else { n })
    }
}

#[cfg(test)]
mod bencode_tests {
    use super::*;
    use wirevalue::ErrorKind;

    #[test]
    fn integers_round_trip() {
        assert_eq!(&encode(&5i64).unwrap()[..], b"i5e");
        assert_eq!(&encode(&-42i64).unwrap()[..], b"i-42e");
        assert_eq!(decode_bytes::<i64>(b"i5e").unwrap(), 5);
        assert_eq!(decode_bytes::<i64>(b"i-42e").unwrap(), -42);
        assert_eq!(decode_bytes::<i64>(b"i0e").unwrap(), 0);
    }

    #[test]
    fn byte_strings_round_trip() {
        assert_eq!(&encode(&"spam".to_string()).unwrap()[..], b"4:spam");
        assert_eq!(decode_bytes::<String>(b"4:spam").unwrap(), "spam");

        let binary = Bytes::from_static(&[0xFF, 0x00, 0x80]);
        assert_eq!(&encode(&binary).unwrap()[..], b"3:\xFF\x00\x80");
        assert_eq!(decode_bytes::<Bytes>(b"3:\xFF\x00\x80").unwrap(), binary);
    }

    #[test]
    fn binary_payload_into_text_target_fails_utf8_validation() {
        let err = decode_bytes::<String>(b"2:\xFF\xFE").unwrap_err();
        assert!(matches!(err, CodecError::InvalidUtf8));
    }

    #[test]
    fn lists_round_trip() {
        let list = vec!["a".to_string(), "bc".to_string()];
        assert_eq!(&encode(&list).unwrap()[..], b"l1:a2:bce");
        assert_eq!(decode_bytes::<Vec<String>>(b"l1:a2:bce").unwrap(), list);
    }

    #[test]
    fn dictionaries_decode_as_attribute_lists() {
        let value = Decoder::new(&b"d1:ai1e1:b2:xye"[..]).decode_value().unwrap();
        assert_eq!(
            value,
            Value::object(vec![
                ("a".to_string(), Value::Integer(1)),
                (
                    "b".to_string(),
                    Value::Bytes(Bytes::from_static(b"xy"))
                ),
            ])
        );
    }

    #[test]
    fn unsupported_values_have_no_bencode_form() {
        for value in [Value::Double(1.0), Value::Boolean(true), Value::Null] {
            let err = Encoder::new().encode_value(&value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unsupported);
        }
    }

    #[test]
    fn syntax_failures() {
        assert!(matches!(
            decode_bytes::<i64>(b"i5x"),
            Err(CodecError::Syntax("unterminated integer"))
        ));
        assert!(matches!(
            decode_bytes::<Value>(b"dxe"),
            Err(CodecError::Syntax("dictionary key must be a byte string"))
        ));
        assert!(matches!(
            decode_bytes::<Value>(b"x"),
            Err(CodecError::Syntax("unknown delimiter"))
        ));
        assert!(matches!(
            decode_bytes::<String>(b"5:ab"),
            Err(CodecError::InsufficientData)
        ));
        assert!(matches!(
            decode_bytes::<Value>(b"d1:a"),
            Err(CodecError::InsufficientData)
        ));
    }
}
