use std::io::Read;
use std::rc::Rc;

use bytes::Bytes;
use tracing::warn;
use wirevalue::{ByteReader, CLASS_KEY, CodecError, DYNAMIC_PREFIX, Translate, Value};

use crate::markers::{amf0, amf3};

#[derive(Clone)]
struct ObjectTrait {
    class_name: String,
    member_names: Vec<String>,
}

/// Streaming decoder for both format generations.
///
/// Framing starts as AMF0; the 0x11 switch marker hands the rest of the
/// stream to AMF3 on the same instance, so the object table is shared
/// across the switch. All reference tables are reset at the start of each
/// top-level call, and an instance is not safe for concurrent use.
pub struct Decoder<R> {
    reader: ByteReader<R>,
    complexes: Vec<Value>,
    strings: Vec<Bytes>,
    traits: Vec<ObjectTrait>,
}

impl<R: Read> Decoder<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: ByteReader::new(source),
            complexes: vec![],
            strings: vec![],
            traits: vec![],
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
        target.from_value(&value, crate::translator())
    }

    /// Decode one value into the intermediate representation.
    pub fn decode_value(&mut self) -> Result<Value, CodecError> {
        self.complexes.clear();
        self.strings.clear();
        self.traits.clear();
        self.decode_amf0_value()
    }

    fn decode_amf0_value(&mut self) -> Result<Value, CodecError> {
        match self.reader.read_byte()? {
            amf0::NUMBER => Ok(Value::Double(self.read_f64()?)),
            amf0::BOOLEAN => Ok(Value::Boolean(self.reader.read_byte()? != 0)),
            amf0::STRING => Ok(Value::String(self.read_short_string()?)),
            amf0::OBJECT => self.decode_amf0_object(String::new()),
            amf0::NULL => Ok(Value::Null),
            amf0::UNDEFINED => Ok(Value::Undefined),
            amf0::REFERENCE => self.decode_amf0_reference(),
            amf0::ECMA_ARRAY => self.decode_amf0_ecma_array(),
            amf0::STRICT_ARRAY => self.decode_amf0_strict_array(),
            amf0::DATE => Ok(Value::Date(self.read_date()?)),
            amf0::LONG_STRING => Ok(Value::String(self.read_long_string()?)),
            amf0::XML_DOC => Ok(Value::XmlDoc(self.read_long_string()?)),
            amf0::TYPED_OBJECT => {
                let class_name = self.read_short_string()?;
                self.decode_amf0_object(class_name)
            }
            amf0::AVM_PLUS => self.decode_amf3_value(),
            marker => Err(CodecError::UnknownMarker(marker)),
        }
    }

    fn read_f64(&mut self) -> Result<f64, CodecError> {
        let raw = self.reader.read_exact(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&raw);
        Ok(f64::from_be_bytes(bytes))
    }

    fn read_u16(&mut self) -> Result<u16, CodecError> {
        let hi = self.reader.read_byte()?;
        let lo = self.reader.read_byte()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    fn read_u32(&mut self) -> Result<u32, CodecError> {
        let raw = self.reader.read_exact(4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&raw);
        Ok(u32::from_be_bytes(bytes))
    }

    fn read_short_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_u16()? as usize;
        let raw = self.reader.read_exact(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    fn read_long_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_u32()? as usize;
        let raw = self.reader.read_exact(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    /// Both generations carry dates as a double plus a 16-bit minute
    /// offset. The offset is folded into the produced timestamp here;
    /// encoders always write zero.
    fn read_date(&mut self) -> Result<f64, CodecError> {
        let millis = self.read_f64()?;
        let offset = self.read_u16()? as i16;
        if offset != 0 {
            warn!("Nonzero timezone offset on date: {offset} min");
        }
        Ok(millis + f64::from(offset) * 60_000.0)
    }

    fn decode_amf0_reference(&mut self) -> Result<Value, CodecError> {
        let index = self.read_u16()? as usize;
        self.complexes
            .get(index)
            .cloned()
            .ok_or(CodecError::OutOfBoundsReference)
    }

    fn decode_amf0_strict_array(&mut self) -> Result<Value, CodecError> {
        let count = self.read_u32()? as usize;
        // The array claims its table slot before its elements are read.
        let slot = self.complexes.len();
        self.complexes.push(Value::Array(Rc::new(vec![])));
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.decode_amf0_value()?);
        }
        let array = Value::Array(Rc::new(items));
        self.complexes[slot] = array.clone();
        Ok(array)
    }

    fn decode_amf0_ecma_array(&mut self) -> Result<Value, CodecError> {
        // The count is a hint only; pairs run to the terminator.
        let _count = self.read_u32()?;
        let pairs = self.decode_amf0_pairs()?;
        let object = Value::Object(Rc::new(pairs));
        self.complexes.push(object.clone());
        Ok(object)
    }

    fn decode_amf0_object(&mut self, class_name: String) -> Result<Value, CodecError> {
        let mut pairs = vec![(CLASS_KEY.to_string(), Value::String(class_name))];
        pairs.extend(self.decode_amf0_pairs()?);
        let object = Value::Object(Rc::new(pairs));
        self.complexes.push(object.clone());
        Ok(object)
    }

    fn decode_amf0_pairs(&mut self) -> Result<Vec<(String, Value)>, CodecError> {
        let mut pairs = vec![];
        loop {
            let key = self.read_short_string()?;
            if key.is_empty() {
                if self.reader.read_byte()? != amf0::OBJECT_END {
                    return Err(CodecError::MissingObjectEnd);
                }
                return Ok(pairs);
            }
            let value = self.decode_amf0_value()?;
            pairs.push((key, value));
        }
    }

    fn decode_amf3_value(&mut self) -> Result<Value, CodecError> {
        match self.reader.read_byte()? {
            amf3::UNDEFINED => Ok(Value::Undefined),
            amf3::NULL => Ok(Value::Null),
            amf3::FALSE => Ok(Value::Boolean(false)),
            amf3::TRUE => Ok(Value::Boolean(true)),
            amf3::INTEGER => Ok(Value::Integer(self.read_i29()?)),
            amf3::DOUBLE => Ok(Value::Double(self.read_f64()?)),
            amf3::STRING => Ok(Value::String(self.read_utf8_string()?)),
            amf3::XML_DOC => Ok(Value::XmlDoc(self.read_utf8_string()?)),
            amf3::DATE => self.decode_amf3_date(),
            amf3::ARRAY => self.decode_amf3_array(),
            amf3::OBJECT => self.decode_amf3_object(),
            amf3::XML => Ok(Value::Xml(self.read_utf8_string()?)),
            amf3::BYTE_ARRAY => Ok(Value::Bytes(self.read_utf8()?)),
            marker => Err(CodecError::UnknownMarker(marker)),
        }
    }

    fn read_u29(&mut self) -> Result<u32, CodecError> {
        let mut value: u32 = 0;
        for _ in 0..3 {
            let byte = self.reader.read_byte()?;
            if byte & 0x80 == 0 {
                return Ok((value << 7) | u32::from(byte));
            }
            value = (value << 7) | u32::from(byte & 0x7F);
        }
        Ok((value << 8) | u32::from(self.reader.read_byte()?))
    }

    fn read_i29(&mut self) -> Result<i64, CodecError> {
        let value = self.read_u29()?;
        // The sign bit sits at bit 28.
        Ok(i64::from(((value << 3) as i32) >> 3))
    }

    /// Shared reference-or-literal routine over the string table, used for
    /// strings, XML payloads and byte arrays alike. Non-empty literals
    /// join the table; the empty string never does.
    fn read_utf8(&mut self) -> Result<Bytes, CodecError> {
        let prefix = self.read_u29()?;
        if prefix & 1 == 0 {
            let index = (prefix >> 1) as usize;
            return self
                .strings
                .get(index)
                .cloned()
                .ok_or(CodecError::OutOfBoundsReference);
        }
        let len = (prefix >> 1) as usize;
        if len == 0 {
            return Ok(Bytes::new());
        }
        let raw = self.reader.read_exact(len)?;
        self.strings.push(raw.clone());
        Ok(raw)
    }

    fn read_utf8_string(&mut self) -> Result<String, CodecError> {
        let raw = self.read_utf8()?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    fn decode_amf3_date(&mut self) -> Result<Value, CodecError> {
        let prefix = self.read_u29()?;
        if prefix & 1 == 0 {
            let index = (prefix >> 1) as usize;
            return self
                .complexes
                .get(index)
                .cloned()
                .ok_or(CodecError::OutOfBoundsReference);
        }
        Ok(Value::Date(self.read_date()?))
    }

    fn decode_amf3_array(&mut self) -> Result<Value, CodecError> {
        let prefix = self.read_u29()?;
        if prefix & 1 == 0 {
            let index = (prefix >> 1) as usize;
            return self
                .complexes
                .get(index)
                .cloned()
                .ok_or(CodecError::OutOfBoundsReference);
        }
        let count = (prefix >> 1) as usize;
        if count == 0 {
            // Associative layout: string-keyed pairs up to an empty key.
            let pairs = self.decode_amf3_pairs()?;
            let object = Value::Object(Rc::new(pairs));
            self.complexes.push(object.clone());
            return Ok(object);
        }
        let sentinel = self.read_utf8()?;
        if !sentinel.is_empty() {
            return Err(CodecError::Unsupported(
                "mixed associative and dense array",
            ));
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.decode_amf3_value()?);
        }
        let array = Value::Array(Rc::new(items));
        self.complexes.push(array.clone());
        Ok(array)
    }

    fn decode_amf3_pairs(&mut self) -> Result<Vec<(String, Value)>, CodecError> {
        let mut pairs = vec![];
        loop {
            let key = self.read_utf8_string()?;
            if key.is_empty() {
                return Ok(pairs);
            }
            let value = self.decode_amf3_value()?;
            pairs.push((key, value));
        }
    }

    #[allow(clippy::bad_bit_mask)]
    fn decode_amf3_object(&mut self) -> Result<Value, CodecError> {
        let descriptor = self.read_u29()? as usize;
        if descriptor & 1 == 0 {
            return self
                .complexes
                .get(descriptor >> 1)
                .cloned()
                .ok_or(CodecError::OutOfBoundsReference);
        }
        if descriptor & 2 == 0 {
            // Member list comes from a previously registered trait; no
            // dynamic members are read on this path.
            let found = self
                .traits
                .get(descriptor >> 2)
                .cloned()
                .ok_or(CodecError::OutOfBoundsReference)?;
            let mut pairs = vec![(
                CLASS_KEY.to_string(),
                Value::String(found.class_name.clone()),
            )];
            for name in &found.member_names {
                let value = self.decode_amf3_value()?;
                pairs.push((name.clone(), value));
            }
            let object = Value::Object(Rc::new(pairs));
            self.complexes.push(object.clone());
            return Ok(object);
        }
        if descriptor & 4 != 0 {
            return Err(CodecError::Unsupported("externalizable object"));
        }
        let member_count = descriptor >> 4;
        let class_name = self.read_utf8_string()?;
        let member_names = (0..member_count)
            .map(|_| self.read_utf8_string())
            .collect::<Result<Vec<_>, _>>()?;
        // The trait is registered before its member values are read.
        self.traits.push(ObjectTrait {
            class_name: class_name.clone(),
            member_names: member_names.clone(),
        });
        let mut pairs = vec![(CLASS_KEY.to_string(), Value::String(class_name))];
        for name in member_names {
            let value = self.decode_amf3_value()?;
            pairs.push((name, value));
        }
        // NOTE: `descriptor & 8` is compared against 1, so this branch
        // never runs and dynamic members are left unread.
        if descriptor & 8 == 1 {
            for (key, value) in self.decode_amf3_pairs()? {
                pairs.push((format!("{DYNAMIC_PREFIX}{key}"), value));
            }
        }
        let object = Value::Object(Rc::new(pairs));
        self.complexes.push(object.clone());
        Ok(object)
    }
}
