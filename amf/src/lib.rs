//! AMF0/AMF3 binary codec.
//!
//! Values translate through the shared [`Value`] model: native types on
//! one side via [`wirevalue::Translate`], marker-dispatched wire bytes on
//! the other. AMF3 carries per-message reference tables for strings,
//! objects and traits; AMF0 keeps a flat object-reference list on decode.

use std::str::FromStr;
use std::sync::LazyLock;

use bytes::Bytes;
use thiserror::Error;
use wirevalue::{CodecError, Translate, Translator};

mod decoding;
mod encoding;
mod markers;
mod types;

#[cfg(test)]
mod codec_tests;

pub use decoding::Decoder;
pub use encoding::Encoder;
pub use types::{Date, Xml, XmlDoc};
pub use wirevalue::Value;

static TRANSLATOR: LazyLock<Translator> = LazyLock::new(|| Translator::new("amf"));

/// The translator reading `amf = "..."` record tags.
pub fn translator() -> &'static Translator {
    &TRANSLATOR
}

/// Wire generation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Amf0,
    Amf3,
}

/// Rejected format token.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Format must be AMF0 or AMF3: {0:?}")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token == "0" || token.eq_ignore_ascii_case("amf0") {
            Ok(Format::Amf0)
        } else if token == "3" || token.eq_ignore_ascii_case("amf3") {
            Ok(Format::Amf3)
        } else {
            Err(UnknownFormat(token.to_string()))
        }
    }
}

/// Encode one native value in the selected generation.
pub fn encode<T: Translate>(x: &T, format: Format) -> Result<Bytes, CodecError> {
    Encoder::new().encode(x, format)
}

/// Decode one native value from an in-memory buffer.
pub fn decode_bytes<T: Translate + Default>(bytes: &[u8]) -> Result<T, CodecError> {
    Decoder::new(bytes).decode()
}
