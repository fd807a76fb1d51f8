use std::any::TypeId;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, RwLock};

use crate::error::CodecError;
use crate::translate::Translate;
use crate::value::Value;

/// Cached per-field schema entry: field ordinal, wire name and modifier
/// flags. Computed once per record type per translator, immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub index: usize,
    pub name: &'static str,
    pub omit_zero: bool,
}

/// Compile-time field descriptor generated by [`record!`](crate::record).
///
/// `tags` holds `(namespace, tag)` pairs so one record can carry wire
/// names for several codecs at once.
pub struct Field<T> {
    pub name: &'static str,
    pub tags: &'static [(&'static str, &'static str)],
    pub get: fn(&T) -> &dyn Translate,
    pub get_mut: fn(&mut T) -> &mut dyn Translate,
}

/// Record types expose a field descriptor table for the translator to
/// walk. Implemented by [`record!`](crate::record), not by hand.
pub trait Record: Sized + 'static {
    const FIELDS: &'static [Field<Self>];
}

/// Bidirectional mapping between native typed values and [`Value`],
/// carrying a process-wide schema cache for one tag namespace.
///
/// The cache is read-mostly: concurrent lookups share the read lock, and
/// a first-use computation races at most one writer with idempotent
/// insertion.
pub struct Translator {
    name: &'static str,
    labels: RwLock<HashMap<TypeId, Arc<[Label]>>>,
}

impl Translator {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            labels: RwLock::new(HashMap::new()),
        }
    }

    /// Tag namespace this translator reads, e.g. `"amf"` or `"bencode"`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Labels for `T`, computed on first use and cached for the process
    /// lifetime.
    pub fn labels<T: Record>(&self) -> Arc<[Label]> {
        let key = TypeId::of::<T>();
        if let Some(found) = self.labels.read().expect("schema cache poisoned").get(&key) {
            return found.clone();
        }
        let computed: Arc<[Label]> = self.compute_labels::<T>().into();
        self.labels
            .write()
            .expect("schema cache poisoned")
            .entry(key)
            .or_insert(computed)
            .clone()
    }

    /// Walk the declared fields in order, reading this namespace's tag
    /// string: `name,flag1,flag2,...`. An empty name segment falls back to
    /// the field identifier, `omitempty` is the only recognized flag, and
    /// a tag of exactly `-` excludes the field.
    fn compute_labels<T: Record>(&self) -> Vec<Label> {
        let mut labels = Vec::with_capacity(T::FIELDS.len());
        for (index, field) in T::FIELDS.iter().enumerate() {
            let tag = field
                .tags
                .iter()
                .find(|(namespace, _)| *namespace == self.name)
                .map(|(_, tag)| *tag)
                .unwrap_or("");
            if tag == "-" {
                continue;
            }
            let mut parts = tag.split(',').map(str::trim);
            let name = match parts.next() {
                Some("") | None => field.name,
                Some(name) => name,
            };
            let omit_zero = parts.any(|flag| flag == "omitempty");
            labels.push(Label {
                index,
                name,
                omit_zero,
            });
        }
        labels
    }

    /// Encode a record into a string-keyed attribute list: declared field
    /// order, omit-flagged fields elided when structurally zero.
    pub fn record_to_value<T: Record>(&self, record: &T) -> Result<Value, CodecError> {
        let labels = self.labels::<T>();
        let mut pairs = Vec::with_capacity(labels.len());
        for label in labels.iter() {
            let field = &T::FIELDS[label.index];
            let value = (field.get)(record);
            if label.omit_zero && value.is_zero() {
                continue;
            }
            pairs.push((label.name.to_string(), value.to_value(self)?));
        }
        Ok(Value::Object(Rc::new(pairs)))
    }

    /// Fill a record from a string-keyed attribute list. Fields absent
    /// from the source are reset to zero when omit-flagged; source keys
    /// with no matching label are ignored.
    pub fn record_from_value<T: Record>(
        &self,
        record: &mut T,
        value: &Value,
    ) -> Result<(), CodecError> {
        let Value::Object(pairs) = value else {
            return Err(CodecError::Unmatched("string-keyed attribute list"));
        };
        let labels = self.labels::<T>();
        for label in labels.iter() {
            let field = &T::FIELDS[label.index];
            match pairs.iter().find(|(key, _)| key == label.name) {
                Some((_, found)) => (field.get_mut)(record).from_value(found, self)?,
                None if label.omit_zero => (field.get_mut)(record).clear(),
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod schema_tests {
    use super::*;
    use crate::record;

    record! {
        #[derive(Debug, Default, PartialEq)]
        struct Tagged {
            plain: i64,
            renamed: String => test = "wire-name",
            flagged: f64 => test = ",omitempty",
            spaced: bool => test = " padded , omitempty ",
            hidden: i64 => test = "-",
        }
    }

    #[test]
    fn tag_parsing() {
        let translator = Translator::new("test");
        let labels = translator.labels::<Tagged>();
        let summary: Vec<(&str, bool)> = labels
            .iter()
            .map(|label| (label.name, label.omit_zero))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("plain", false),
                ("wire-name", false),
                ("flagged", true),
                ("padded", true),
            ]
        );
    }

    #[test]
    fn unknown_namespace_uses_field_names() {
        let translator = Translator::new("other");
        let labels = translator.labels::<Tagged>();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels[4].name, "hidden");
    }

    #[test]
    fn concurrent_first_use_is_safe() {
        let translator = Translator::new("test");
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| translator.labels::<Tagged>()))
                .collect();
            let first = translator.labels::<Tagged>();
            for handle in handles {
                assert_eq!(*handle.join().unwrap(), *first);
            }
        });
    }
}
