use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use bytes::Bytes;

use crate::error::CodecError;
use crate::schema::Translator;
use crate::value::Value;

/// Bidirectional mapping between a native value and [`Value`].
///
/// `to_value` picks the wire shape, `from_value` checks the source shape
/// and fills `self` in place, `clear` resets to the structural zero value
/// and `is_zero` reports it. A composite is zero iff every constituent is
/// zero.
pub trait Translate {
    fn to_value(&self, translator: &Translator) -> Result<Value, CodecError>;
    fn from_value(&mut self, value: &Value, translator: &Translator) -> Result<(), CodecError>;
    fn is_zero(&self) -> bool;
    fn clear(&mut self);
}

impl Translate for bool {
    fn to_value(&self, _: &Translator) -> Result<Value, CodecError> {
        Ok(Value::Boolean(*self))
    }

    fn from_value(&mut self, value: &Value, _: &Translator) -> Result<(), CodecError> {
        match value {
            Value::Boolean(b) => {
                *self = *b;
                Ok(())
            }
            _ => Err(CodecError::Unmatched("boolean")),
        }
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn clear(&mut self) {
        *self = false;
    }
}

macro_rules! translate_integer {
    ($($ty:ty),*) => {$(
        impl Translate for $ty {
            fn to_value(&self, _: &Translator) -> Result<Value, CodecError> {
                Ok(Value::Integer(*self as i64))
            }

            fn from_value(&mut self, value: &Value, _: &Translator) -> Result<(), CodecError> {
                match value {
                    Value::Integer(i) => {
                        *self = *i as $ty;
                        Ok(())
                    }
                    _ => Err(CodecError::Unmatched("integer")),
                }
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn clear(&mut self) {
                *self = 0;
            }
        }
    )*};
}

translate_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! translate_float {
    ($($ty:ty),*) => {$(
        impl Translate for $ty {
            fn to_value(&self, _: &Translator) -> Result<Value, CodecError> {
                Ok(Value::Double(f64::from(*self)))
            }

            fn from_value(&mut self, value: &Value, _: &Translator) -> Result<(), CodecError> {
                match value {
                    Value::Double(d) => {
                        *self = *d as $ty;
                        Ok(())
                    }
                    _ => Err(CodecError::Unmatched("double")),
                }
            }

            fn is_zero(&self) -> bool {
                *self == 0.0
            }

            fn clear(&mut self) {
                *self = 0.0;
            }
        }
    )*};
}

translate_float!(f32, f64);

impl Translate for String {
    fn to_value(&self, _: &Translator) -> Result<Value, CodecError> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(&mut self, value: &Value, _: &Translator) -> Result<(), CodecError> {
        match value {
            Value::String(s) => {
                *self = s.clone();
                Ok(())
            }
            Value::Bytes(raw) => {
                *self = String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(())
            }
            _ => Err(CodecError::Unmatched("string")),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn clear(&mut self) {
        self.clear();
    }
}

/// The byte-oriented contiguous sequence: encodes as an opaque byte
/// string, decodes from a byte string, a text string or a dense array of
/// integers in byte range.
impl Translate for Bytes {
    fn to_value(&self, _: &Translator) -> Result<Value, CodecError> {
        Ok(Value::Bytes(self.clone()))
    }

    fn from_value(&mut self, value: &Value, _: &Translator) -> Result<(), CodecError> {
        match value {
            Value::Bytes(raw) => {
                *self = raw.clone();
                Ok(())
            }
            Value::String(s) => {
                *self = Bytes::copy_from_slice(s.as_bytes());
                Ok(())
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    match item {
                        Value::Integer(i) if (0..=255).contains(i) => out.push(*i as u8),
                        _ => return Err(CodecError::Unmatched("byte")),
                    }
                }
                *self = Bytes::from(out);
                Ok(())
            }
            _ => Err(CodecError::Unmatched("byte string")),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn clear(&mut self) {
        *self = Bytes::new();
    }
}

impl<T: Translate + Default> Translate for Option<T> {
    fn to_value(&self, translator: &Translator) -> Result<Value, CodecError> {
        match self {
            None => Ok(Value::Null),
            Some(inner) => inner.to_value(translator),
        }
    }

    fn from_value(&mut self, value: &Value, translator: &Translator) -> Result<(), CodecError> {
        match value {
            Value::Null => {
                *self = None;
                Ok(())
            }
            // Storage is allocated on the first non-null assignment.
            other => self
                .get_or_insert_with(T::default)
                .from_value(other, translator),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn clear(&mut self) {
        *self = None;
    }
}

impl<T: Translate> Translate for Box<T> {
    fn to_value(&self, translator: &Translator) -> Result<Value, CodecError> {
        (**self).to_value(translator)
    }

    fn from_value(&mut self, value: &Value, translator: &Translator) -> Result<(), CodecError> {
        (**self).from_value(value, translator)
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }

    fn clear(&mut self) {
        (**self).clear();
    }
}

impl<T: Translate + Default> Translate for Vec<T> {
    fn to_value(&self, translator: &Translator) -> Result<Value, CodecError> {
        let mut items = Vec::with_capacity(self.len());
        for item in self {
            items.push(item.to_value(translator)?);
        }
        Ok(Value::Array(Rc::new(items)))
    }

    fn from_value(&mut self, value: &Value, translator: &Translator) -> Result<(), CodecError> {
        match value {
            Value::Null => {
                self.clear();
                Ok(())
            }
            Value::Array(items) => {
                for item in items.iter() {
                    let mut element = T::default();
                    element.from_value(item, translator)?;
                    self.push(element);
                }
                Ok(())
            }
            // Empty dense and empty associative arrays share one wire
            // form; the associative reading is accepted as the empty
            // sequence.
            Value::Object(pairs) if pairs.is_empty() => Ok(()),
            _ => Err(CodecError::Unmatched("dense array")),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn clear(&mut self) {
        self.clear();
    }
}

impl<T: Translate, const N: usize> Translate for [T; N] {
    fn to_value(&self, translator: &Translator) -> Result<Value, CodecError> {
        let mut items = Vec::with_capacity(N);
        for item in self {
            items.push(item.to_value(translator)?);
        }
        Ok(Value::Array(Rc::new(items)))
    }

    fn from_value(&mut self, value: &Value, translator: &Translator) -> Result<(), CodecError> {
        match value {
            Value::Array(items) => {
                for (slot, item) in self.iter_mut().zip(items.iter()) {
                    slot.from_value(item, translator)?;
                }
                Ok(())
            }
            _ => Err(CodecError::Unmatched("dense array")),
        }
    }

    fn is_zero(&self) -> bool {
        self.iter().all(Translate::is_zero)
    }

    fn clear(&mut self) {
        for slot in self {
            slot.clear();
        }
    }
}

impl<K, V> Translate for HashMap<K, V>
where
    K: Translate + Default + Eq + Hash,
    V: Translate + Default,
{
    fn to_value(&self, translator: &Translator) -> Result<Value, CodecError> {
        let mut entries = Vec::with_capacity(self.len());
        for (key, value) in self {
            entries.push((key.to_value(translator)?, value.to_value(translator)?));
        }
        Ok(Value::Dictionary(Rc::new(entries)))
    }

    fn from_value(&mut self, value: &Value, translator: &Translator) -> Result<(), CodecError> {
        match value {
            Value::Null => {
                self.clear();
                Ok(())
            }
            Value::Dictionary(entries) => {
                for (key, item) in entries.iter() {
                    let mut k = K::default();
                    k.from_value(key, translator)?;
                    let mut v = V::default();
                    v.from_value(item, translator)?;
                    self.insert(k, v);
                }
                Ok(())
            }
            Value::Object(pairs) => {
                for (key, item) in pairs.iter() {
                    let mut k = K::default();
                    k.from_value(&Value::String(key.clone()), translator)?;
                    let mut v = V::default();
                    v.from_value(item, translator)?;
                    self.insert(k, v);
                }
                Ok(())
            }
            _ => Err(CodecError::Unmatched("pair list")),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn clear(&mut self) {
        self.clear();
    }
}

/// Identity mapping; lets a record keep a field in the intermediate
/// representation without committing to a native shape.
impl Translate for Value {
    fn to_value(&self, _: &Translator) -> Result<Value, CodecError> {
        Ok(self.clone())
    }

    fn from_value(&mut self, value: &Value, _: &Translator) -> Result<(), CodecError> {
        *self = value.clone();
        Ok(())
    }

    fn is_zero(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn clear(&mut self) {
        *self = Value::Null;
    }
}
