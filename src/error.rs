//! # Error Types
//!
//! Every failure the codec can report, from truncated length prefixes to
//! unregistered tags.
//!
//! ## Error Categories
//! - **Malformed input**: truncated VLQ, frames longer than the buffer, bad payloads
//! - **Unknown variant**: a value whose kind the active registry does not serialize
//! - **Unknown tag**: a decoded tag name with no registered deserializer
//! - **Text decode**: tag or `str` payload bytes that are not UTF-8
//! - **Limits**: nesting depth or input size over the configured bound
//!
//! Decoding errors carry the absolute byte offset into the buffer that was
//! handed to [`crate::Codec::des`].
//!
//! ## Example Usage
//! ```rust
//! use blobwire::error::{CodecError, ErrorKind};
//!
//! let err = blobwire::des(&[0x85, 0x80]).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::MalformedInput);
//! assert!(matches!(err, CodecError::MalformedInput { offset: 0, .. }));
//! ```

use crate::core::value::ValueKind;
use std::io;
use std::str::Utf8Error;
use thiserror::Error;

/// Error message constants shared by the framing and variant layers.
pub mod constants {
    pub const ERR_EMPTY_VLQ: &str = "length prefix is empty";
    pub const ERR_TRUNCATED_VLQ: &str = "length prefix has no terminating byte";
    pub const ERR_VLQ_OVERFLOW: &str = "length prefix overflows 64 bits";
    pub const ERR_FRAME_OVERRUN: &str = "frame length exceeds remaining bytes";
    pub const ERR_TRAILING_BYTES: &str = "unexpected bytes after integer";
    pub const ERR_BOOL_WIDTH: &str = "bool payload must be exactly one byte";
    pub const ERR_BOOL_VALUE: &str = "bool payload must be 0x00 or 0xFF";
    pub const ERR_INT_RANGE: &str = "signed integer magnitude out of range";
    pub const ERR_COMPLEX_SEPARATOR: &str = "complex payload has no separator";
    pub const ERR_MAPPING_ENTRY: &str = "mapping entry is not a key/value pair";
}

/// High-level classification of a [`CodecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedInput,
    UnknownVariant,
    UnknownTag,
    TextDecodeError,
    Limit,
    Config,
    Io,
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed input at byte {offset}: {reason}")]
    MalformedInput { offset: usize, reason: &'static str },

    #[error("No serializer registered for value kind '{0}'")]
    UnknownVariant(ValueKind),

    #[error("No deserializer registered for tag '{tag}' (byte {offset})")]
    UnknownTag { tag: String, offset: usize },

    #[error("Invalid UTF-8 at byte {offset}: {source}")]
    TextDecode {
        offset: usize,
        #[source]
        source: Utf8Error,
    },

    #[error("Invalid hexadecimal float literal '{literal}' at byte {offset}")]
    InvalidFloat { offset: usize, literal: String },

    #[error("Nesting depth exceeds limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    #[error("Input of {size} bytes exceeds limit of {limit}")]
    InputTooLarge { size: usize, limit: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    pub(crate) fn malformed(offset: usize, reason: &'static str) -> Self {
        CodecError::MalformedInput { offset, reason }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::MalformedInput { .. } | CodecError::InvalidFloat { .. } => {
                ErrorKind::MalformedInput
            }
            CodecError::UnknownVariant(_) => ErrorKind::UnknownVariant,
            CodecError::UnknownTag { .. } => ErrorKind::UnknownTag,
            CodecError::TextDecode { .. } => ErrorKind::TextDecodeError,
            CodecError::DepthLimitExceeded { .. } | CodecError::InputTooLarge { .. } => {
                ErrorKind::Limit
            }
            CodecError::ConfigError(_) => ErrorKind::Config,
            CodecError::Io(_) => ErrorKind::Io,
        }
    }

    /// Byte offset of the failure, when the error came from decoding.
    pub fn offset(&self) -> Option<usize> {
        match self {
            CodecError::MalformedInput { offset, .. }
            | CodecError::UnknownTag { offset, .. }
            | CodecError::TextDecode { offset, .. }
            | CodecError::InvalidFloat { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Shift the offset of a decoding error by `base` bytes.
    pub(crate) fn at(self, base: usize) -> Self {
        match self {
            CodecError::MalformedInput { offset, reason } => CodecError::MalformedInput {
                offset: offset + base,
                reason,
            },
            CodecError::UnknownTag { tag, offset } => CodecError::UnknownTag {
                tag,
                offset: offset + base,
            },
            CodecError::TextDecode { offset, source } => CodecError::TextDecode {
                offset: offset + base,
                source,
            },
            CodecError::InvalidFloat { offset, literal } => CodecError::InvalidFloat {
                offset: offset + base,
                literal,
            },
            other => other,
        }
    }
}

/// Type alias for Results using CodecError
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            CodecError::malformed(3, constants::ERR_FRAME_OVERRUN).kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(
            CodecError::UnknownVariant(ValueKind::Float).kind(),
            ErrorKind::UnknownVariant
        );
        assert_eq!(
            CodecError::DepthLimitExceeded { limit: 4 }.kind(),
            ErrorKind::Limit
        );
    }

    #[test]
    fn test_offset_shift() {
        let err = CodecError::UnknownTag {
            tag: "bogus".into(),
            offset: 2,
        }
        .at(10);
        assert_eq!(err.offset(), Some(12));

        let untouched = CodecError::DepthLimitExceeded { limit: 1 }.at(10);
        assert_eq!(untouched.offset(), None);
    }

    #[test]
    fn test_display_mentions_context() {
        let err = CodecError::UnknownTag {
            tag: "bogus".into(),
            offset: 0,
        };
        assert!(err.to_string().contains("bogus"));
        assert!(CodecError::UnknownVariant(ValueKind::Complex)
            .to_string()
            .contains("complex"));
    }
}
