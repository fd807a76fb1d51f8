use wirevalue::{CodecError, Translate, Translator, Value};

/// Raw-passthrough XML document content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlDoc(pub String);

/// Raw-passthrough E4X XML content. AMF3 only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Xml(pub String);

/// Timestamp in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Date(pub f64);

impl Translate for XmlDoc {
    fn to_value(&self, _: &Translator) -> Result<Value, CodecError> {
        Ok(Value::XmlDoc(self.0.clone()))
    }

    fn from_value(&mut self, value: &Value, _: &Translator) -> Result<(), CodecError> {
        match value {
            Value::XmlDoc(content) => {
                self.0 = content.clone();
                Ok(())
            }
            _ => Err(CodecError::Unmatched("xml document")),
        }
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

impl Translate for Xml {
    fn to_value(&self, _: &Translator) -> Result<Value, CodecError> {
        Ok(Value::Xml(self.0.clone()))
    }

    fn from_value(&mut self, value: &Value, _: &Translator) -> Result<(), CodecError> {
        match value {
            Value::Xml(content) => {
                self.0 = content.clone();
                Ok(())
            }
            _ => Err(CodecError::Unmatched("e4x xml")),
        }
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

impl Translate for Date {
    fn to_value(&self, _: &Translator) -> Result<Value, CodecError> {
        Ok(Value::Date(self.0))
    }

    fn from_value(&mut self, value: &Value, _: &Translator) -> Result<(), CodecError> {
        match value {
            Value::Date(millis) => {
                self.0 = *millis;
                Ok(())
            }
            _ => Err(CodecError::Unmatched("date")),
        }
    }

    fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    fn clear(&mut self) {
        self.0 = 0.0;
    }
}
