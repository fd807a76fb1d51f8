use thiserror::Error;

/// Broad classification of a [`CodecError`].
///
/// Callers that only care which contract was violated can match on this
/// instead of the exact wire-level variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A native value with no representation in the target format, or a
    /// marker this implementation does not handle.
    Unsupported,
    /// The decode target's shape is incompatible with the wire value it
    /// received.
    Unmatched,
    /// Structurally malformed input, including truncation and byte-source
    /// failures mid-structure.
    Syntax,
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Unknown marker: {0:#04x}")]
    UnknownMarker(u8),

    #[error("Unsupported value: {0}")]
    Unsupported(&'static str),

    #[error("Unmatched type: expected {0}")]
    Unmatched(&'static str),

    #[error("Insufficient data")]
    InsufficientData,

    #[error("Invalid UTF-8 string")]
    InvalidUtf8,

    #[error("Reference index out of bounds")]
    OutOfBoundsReference,

    #[error("Missing object end marker")]
    MissingObjectEnd,

    #[error("Syntax error: {0}")]
    Syntax(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::UnknownMarker(_) | CodecError::Unsupported(_) => ErrorKind::Unsupported,
            CodecError::Unmatched(_) => ErrorKind::Unmatched,
            CodecError::InsufficientData
            | CodecError::InvalidUtf8
            | CodecError::OutOfBoundsReference
            | CodecError::MissingObjectEnd
            | CodecError::Syntax(_)
            | CodecError::Io(_) => ErrorKind::Syntax,
        }
    }
}
