use std::fmt;
use std::rc::Rc;

use bytes::Bytes;

/// Reserved attribute key carrying an object's class name. When present it
/// is the first pair of a [`Value::Object`] list.
pub const CLASS_KEY: &str = "$";

/// Prefix marking dynamic object members, kept distinct from sealed
/// members because the two round-trip through different wire rules.
pub const DYNAMIC_PREFIX: &str = "@";

/// Format-agnostic intermediate value all codecs decode into and encode
/// from.
///
/// Composite variants are `Rc`-wrapped: cloning a `Value` shares the
/// referent, and encoders key their object reference tables on that
/// identity. Two structurally equal but separately built composites are
/// distinct for reference purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Undefined,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    /// Opaque byte string.
    Bytes(Bytes),
    /// Raw-passthrough XML document content.
    XmlDoc(String),
    /// Raw-passthrough E4X XML content.
    Xml(String),
    /// Milliseconds since the Unix epoch. Decoders fold the wire's
    /// timezone-minute offset into this; encoders always emit a zero
    /// offset.
    Date(f64),
    /// Ordered dense sequence.
    Array(Rc<Vec<Value>>),
    /// Ordered string-keyed attribute list, used for objects and
    /// string-keyed maps. May start with the reserved [`CLASS_KEY`] pair;
    /// keys prefixed with [`DYNAMIC_PREFIX`] are dynamic members.
    Object(Rc<Vec<(String, Value)>>),
    /// Pair list for maps whose keys are not strings.
    Dictionary(Rc<Vec<(Value, Value)>>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(items))
    }

    pub fn object(pairs: Vec<(String, Value)>) -> Value {
        Value::Object(Rc::new(pairs))
    }

    pub fn dictionary(entries: Vec<(Value, Value)>) -> Value {
        Value::Dictionary(Rc::new(entries))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_value(self, f, 0)
    }
}

fn fmt_value(value: &Value, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    let pad = "    ".repeat(depth + 1);
    let close = "    ".repeat(depth);
    match value {
        Value::Null => write!(f, "null"),
        Value::Undefined => write!(f, "undefined"),
        Value::Boolean(b) => write!(f, "{b}"),
        Value::Integer(i) => write!(f, "{i}"),
        Value::Double(d) => write!(f, "{d}"),
        Value::String(s) => write!(f, "{s:?}"),
        Value::Bytes(b) => write!(f, "bytes[{}]", b.len()),
        Value::XmlDoc(x) => write!(f, "xml-doc({x:?})"),
        Value::Xml(x) => write!(f, "xml({x:?})"),
        Value::Date(ms) => write!(f, "date({ms}ms)"),
        Value::Array(items) => {
            write!(f, "[")?;
            if !items.is_empty() {
                writeln!(f)?;
                for item in items.iter() {
                    write!(f, "{pad}")?;
                    fmt_value(item, f, depth + 1)?;
                    writeln!(f, ",")?;
                }
                write!(f, "{close}")?;
            }
            write!(f, "]")
        }
        Value::Object(pairs) => {
            write!(f, "{{")?;
            if !pairs.is_empty() {
                writeln!(f)?;
                for (key, item) in pairs.iter() {
                    write!(f, "{pad}{key:?}: ")?;
                    fmt_value(item, f, depth + 1)?;
                    writeln!(f, ",")?;
                }
                write!(f, "{close}")?;
            }
            write!(f, "}}")
        }
        Value::Dictionary(entries) => {
            write!(f, "{{")?;
            if !entries.is_empty() {
                writeln!(f)?;
                for (key, item) in entries.iter() {
                    write!(f, "{pad}")?;
                    fmt_value(key, f, depth + 1)?;
                    write!(f, ": ")?;
                    fmt_value(item, f, depth + 1)?;
                    writeln!(f, ",")?;
                }
                write!(f, "{close}")?;
            }
            write!(f, "}}")
        }
    }
}
