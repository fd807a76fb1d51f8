use std::collections::HashMap;
use std::rc::Rc;

use bytes::{BufMut, Bytes, BytesMut};
use wirevalue::{CLASS_KEY, CodecError, DYNAMIC_PREFIX, Translate, Value};

use crate::Format;
use crate::markers::{amf0, amf3};

const U28_MAX: usize = (1 << 28) - 1;
const MAX_SEALED_COUNT: usize = (1 << 25) - 1;

#[derive(PartialEq)]
struct TraitKey {
    class_name: String,
    member_names: Vec<String>,
    dynamic: bool,
}

/// Encoder with per-call reference tables.
///
/// The string table is keyed by content, the object table by `Rc`
/// identity (structurally equal but distinct composites encode as
/// separate literals), and the trait table by the full trait definition.
/// All tables and the output buffer are reset at the start of each
/// top-level call; an instance is not safe for concurrent use.
pub struct Encoder {
    buf: BytesMut,
    strings: HashMap<Vec<u8>, usize>,
    objects: HashMap<usize, usize>,
    object_count: usize,
    traits: Vec<TraitKey>,
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
            strings: HashMap::new(),
            objects: HashMap::new(),
            object_count: 0,
            traits: Vec::new(),
        }
    }

    /// Translate `x` and encode it in the selected generation.
    pub fn encode<T: Translate>(&mut self, x: &T, format: Format) -> Result<Bytes, CodecError> {
        let value = x.to_value(crate::translator())?;
        self.encode_value(&value, format)
    }

    /// Encode one intermediate value. AMF3 output is preceded by the AMF0
    /// switch marker so the two generations stay distinguishable on the
    /// wire; AMF0 output has no prefix.
    pub fn encode_value(&mut self, value: &Value, format: Format) -> Result<Bytes, CodecError> {
        self.buf.clear();
        self.strings.clear();
        self.objects.clear();
        self.object_count = 0;
        self.traits.clear();
        match format {
            Format::Amf0 => self.put_amf0_value(value)?,
            Format::Amf3 => {
                self.buf.put_u8(amf0::AVM_PLUS);
                self.put_amf3_value(value)?;
            }
        }
        Ok(self.buf.split().freeze())
    }

    fn put_amf0_value(&mut self, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Null => self.buf.put_u8(amf0::NULL),
            Value::Undefined => self.buf.put_u8(amf0::UNDEFINED),
            Value::Boolean(b) => {
                self.buf.put_u8(amf0::BOOLEAN);
                self.buf.put_u8(*b as u8);
            }
            Value::Double(d) => {
                self.buf.put_u8(amf0::NUMBER);
                self.buf.put_f64(*d);
            }
            Value::Integer(_) => {
                return Err(CodecError::Unsupported("integer has no amf0 form"));
            }
            Value::String(s) => self.put_amf0_string(s),
            Value::Bytes(_) => {
                return Err(CodecError::Unsupported("byte string has no amf0 form"));
            }
            Value::XmlDoc(content) => {
                self.buf.put_u8(amf0::XML_DOC);
                self.buf.put_u32(content.len() as u32);
                self.buf.put_slice(content.as_bytes());
            }
            Value::Xml(_) => {
                return Err(CodecError::Unsupported("e4x xml has no amf0 form"));
            }
            Value::Date(millis) => {
                self.buf.put_u8(amf0::DATE);
                self.buf.put_f64(*millis);
                // The offset is always written as zero; decode applies
                // whatever the wire carries.
                self.buf.put_u16(0);
            }
            Value::Array(items) => {
                self.buf.put_u8(amf0::STRICT_ARRAY);
                self.buf.put_u32(items.len() as u32);
                for item in items.iter() {
                    self.put_amf0_value(item)?;
                }
            }
            Value::Object(pairs) => self.put_amf0_object(pairs)?,
            Value::Dictionary(entries) => self.put_amf0_ecma_array(entries)?,
        }
        Ok(())
    }

    fn put_amf0_string(&mut self, s: &str) {
        if s.len() < 65_535 {
            self.buf.put_u8(amf0::STRING);
            self.buf.put_u16(s.len() as u16);
        } else {
            self.buf.put_u8(amf0::LONG_STRING);
            self.buf.put_u32(s.len() as u32);
        }
        self.buf.put_slice(s.as_bytes());
    }

    fn put_amf0_key(&mut self, key: &str) -> Result<(), CodecError> {
        if key.len() > u16::MAX as usize {
            return Err(CodecError::Unsupported("object key too long"));
        }
        self.buf.put_u16(key.len() as u16);
        self.buf.put_slice(key.as_bytes());
        Ok(())
    }

    fn put_amf0_object(&mut self, pairs: &[(String, Value)]) -> Result<(), CodecError> {
        // A leading class-name pair selects the typed form; a non-string
        // value there stays an ordinary member.
        let (class_name, members) = match pairs.first() {
            Some((key, Value::String(name))) if key == CLASS_KEY => (name.as_str(), &pairs[1..]),
            _ => ("", pairs),
        };
        if class_name.is_empty() {
            self.buf.put_u8(amf0::OBJECT);
        } else {
            self.buf.put_u8(amf0::TYPED_OBJECT);
            self.put_amf0_key(class_name)?;
        }
        self.put_amf0_pairs(members)
    }

    fn put_amf0_ecma_array(&mut self, entries: &[(Value, Value)]) -> Result<(), CodecError> {
        self.buf.put_u8(amf0::ECMA_ARRAY);
        self.buf.put_u32(entries.len() as u32);
        for (key, value) in entries {
            let Value::String(key) = key else {
                return Err(CodecError::Unsupported(
                    "non-string key in associative array",
                ));
            };
            self.put_amf0_key(key)?;
            self.put_amf0_value(value)?;
        }
        self.put_amf0_object_end();
        Ok(())
    }

    fn put_amf0_pairs(&mut self, pairs: &[(String, Value)]) -> Result<(), CodecError> {
        for (key, value) in pairs {
            self.put_amf0_key(key)?;
            self.put_amf0_value(value)?;
        }
        self.put_amf0_object_end();
        Ok(())
    }

    fn put_amf0_object_end(&mut self) {
        self.buf.put_u16(0);
        self.buf.put_u8(amf0::OBJECT_END);
    }

    fn put_amf3_value(&mut self, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Undefined => self.buf.put_u8(amf3::UNDEFINED),
            Value::Null => self.buf.put_u8(amf3::NULL),
            Value::Boolean(false) => self.buf.put_u8(amf3::FALSE),
            Value::Boolean(true) => self.buf.put_u8(amf3::TRUE),
            Value::Integer(i) => {
                self.buf.put_u8(amf3::INTEGER);
                // Only the low 29 bits are representable.
                self.put_u29(*i as u32 & 0x1FFF_FFFF);
            }
            Value::Double(d) => {
                self.buf.put_u8(amf3::DOUBLE);
                self.buf.put_f64(*d);
            }
            Value::String(s) => {
                self.buf.put_u8(amf3::STRING);
                self.put_amf3_utf8(s.as_bytes())?;
            }
            Value::XmlDoc(content) => {
                self.buf.put_u8(amf3::XML_DOC);
                self.put_amf3_utf8(content.as_bytes())?;
            }
            Value::Xml(content) => {
                self.buf.put_u8(amf3::XML);
                self.put_amf3_utf8(content.as_bytes())?;
            }
            Value::Bytes(raw) => {
                self.buf.put_u8(amf3::BYTE_ARRAY);
                self.put_amf3_utf8(raw)?;
            }
            Value::Date(millis) => {
                self.buf.put_u8(amf3::DATE);
                self.put_u29(1);
                self.buf.put_f64(*millis);
                self.buf.put_u16(0);
            }
            Value::Array(items) => self.put_amf3_array(items)?,
            Value::Object(pairs) => self.put_amf3_object(pairs)?,
            Value::Dictionary(entries) => self.put_amf3_dictionary(entries)?,
        }
        Ok(())
    }

    fn put_amf3_array(&mut self, items: &Rc<Vec<Value>>) -> Result<(), CodecError> {
        self.buf.put_u8(amf3::ARRAY);
        let addr = Rc::as_ptr(items) as usize;
        if let Some(&index) = self.objects.get(&addr) {
            self.put_u29((index as u32) << 1);
            return Ok(());
        }
        if items.len() > U28_MAX {
            return Err(CodecError::Unsupported("array too long"));
        }
        self.put_u29(((items.len() as u32) << 1) | 1);
        // Empty associative prefix selects the pure dense layout.
        self.put_amf3_utf8(b"")?;
        for item in items.iter() {
            self.put_amf3_value(item)?;
        }
        self.register_object(addr);
        Ok(())
    }

    fn put_amf3_dictionary(&mut self, entries: &Rc<Vec<(Value, Value)>>) -> Result<(), CodecError> {
        self.buf.put_u8(amf3::ARRAY);
        let addr = Rc::as_ptr(entries) as usize;
        if let Some(&index) = self.objects.get(&addr) {
            self.put_u29((index as u32) << 1);
            return Ok(());
        }
        // Count zero marks the associative layout.
        self.put_u29(1);
        for (key, value) in entries.iter() {
            let Value::String(key) = key else {
                return Err(CodecError::Unsupported(
                    "non-string key in associative array",
                ));
            };
            self.put_amf3_utf8(key.as_bytes())?;
            self.put_amf3_value(value)?;
        }
        self.put_amf3_utf8(b"")?;
        self.register_object(addr);
        Ok(())
    }

    fn put_amf3_object(&mut self, pairs: &Rc<Vec<(String, Value)>>) -> Result<(), CodecError> {
        self.buf.put_u8(amf3::OBJECT);
        let addr = Rc::as_ptr(pairs) as usize;
        if let Some(&index) = self.objects.get(&addr) {
            self.put_u29((index as u32) << 1);
            return Ok(());
        }
        let (class_name, members) = match pairs.first() {
            Some((key, Value::String(name))) if key == CLASS_KEY => (name.as_str(), &pairs[1..]),
            _ => ("", &pairs[..]),
        };
        let (sealed, dynamic): (Vec<_>, Vec<_>) = members
            .iter()
            .partition(|(key, _)| !key.starts_with(DYNAMIC_PREFIX));
        if sealed.len() > MAX_SEALED_COUNT {
            return Err(CodecError::Unsupported("too many sealed members"));
        }

        let key = TraitKey {
            class_name: class_name.to_string(),
            member_names: sealed.iter().map(|(name, _)| name.clone()).collect(),
            dynamic: !dynamic.is_empty(),
        };
        match self.traits.iter().position(|known| *known == key) {
            Some(index) => self.put_u29(((index as u32) << 2) | 0b01),
            None => {
                let mut descriptor = ((key.member_names.len() as u32) << 4) | 0b0011;
                if key.dynamic {
                    descriptor |= 0b1000;
                }
                self.put_u29(descriptor);
                self.put_amf3_utf8(key.class_name.as_bytes())?;
                for name in &key.member_names {
                    self.put_amf3_utf8(name.as_bytes())?;
                }
                self.traits.push(key);
            }
        }
        for (_, value) in &sealed {
            self.put_amf3_value(value)?;
        }
        if !dynamic.is_empty() {
            for (key, value) in &dynamic {
                // The prefix is a model-level marker; the wire carries the
                // bare name.
                let name = key.strip_prefix(DYNAMIC_PREFIX).unwrap_or(key.as_str());
                self.put_amf3_utf8(name.as_bytes())?;
                self.put_amf3_value(value)?;
            }
            self.put_amf3_utf8(b"")?;
        }
        self.register_object(addr);
        Ok(())
    }

    /// Reference-or-literal write against the string table; the empty
    /// string is always written literally and never deduplicated.
    fn put_amf3_utf8(&mut self, raw: &[u8]) -> Result<(), CodecError> {
        if raw.is_empty() {
            self.put_u29(1);
            return Ok(());
        }
        if let Some(&index) = self.strings.get(raw) {
            self.put_u29((index as u32) << 1);
            return Ok(());
        }
        if raw.len() > U28_MAX {
            return Err(CodecError::Unsupported("string too long"));
        }
        let index = self.strings.len();
        self.strings.insert(raw.to_vec(), index);
        self.put_u29(((raw.len() as u32) << 1) | 1);
        self.buf.put_slice(raw);
        Ok(())
    }

    /// Composites join the object table after their payload, mirroring
    /// the order the decoder assigns indices in.
    fn register_object(&mut self, addr: usize) {
        self.objects.insert(addr, self.object_count);
        self.object_count += 1;
    }

    fn put_u29(&mut self, n: u32) {
        if n >> 21 != 0 {
            self.buf.put_u8((n >> 22) as u8 | 0x80);
            self.buf.put_u8((n >> 15) as u8 | 0x80);
            self.buf.put_u8((n >> 8) as u8 | 0x80);
            self.buf.put_u8(n as u8);
        } else if n >> 14 != 0 {
            self.buf.put_u8((n >> 14) as u8 | 0x80);
            self.buf.put_u8((n >> 7) as u8 | 0x80);
            self.buf.put_u8(n as u8 & 0x7F);
        } else if n >> 7 != 0 {
            self.buf.put_u8((n >> 7) as u8 | 0x80);
            self.buf.put_u8(n as u8 & 0x7F);
        } else {
            self.buf.put_u8(n as u8);
        }
    }
}
