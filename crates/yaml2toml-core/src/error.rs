//! Error types for document conversion and batch directory processing.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::format::Format;

/// 1-based position of a decode error in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A value shape the target format has no representation for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    NullValue,
    NonStringKey,
    NonMappingRoot,
    IntegerOutOfRange,
    NonFiniteFloat,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Construct::NullValue => "null value",
            Construct::NonStringKey => "non-string key",
            Construct::NonMappingRoot => "non-mapping root",
            Construct::IntegerOutOfRange => "integer out of range",
            Construct::NonFiniteFloat => "non-finite float",
        })
    }
}

/// Errors produced by [`convert`](crate::convert()) and its decode/encode halves.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The source text is not a well-formed document of the declared format.
    /// `message` carries the parser's own description, which usually embeds
    /// the position as well.
    #[error("failed to decode {format}: {message}")]
    Decode {
        format: Format,
        message: String,
        location: Option<Location>,
    },

    /// The document is well formed but the target format cannot express it.
    #[error("{format} cannot represent {construct} at {path}")]
    Incompatible {
        format: Format,
        path: String,
        construct: Construct,
    },

    /// A format tag that no decoder/encoder is registered for.
    #[error("unsupported format: {0:?}")]
    UnsupportedFormat(String),

    /// The serializer refused a value that passed validation.
    #[error("failed to encode {format}: {message}")]
    Encode { format: Format, message: String },
}

impl ConvertError {
    pub(crate) fn decode(format: Format, message: impl Into<String>) -> Self {
        ConvertError::Decode {
            format,
            message: message.into(),
            location: None,
        }
    }

    /// Decode failure at a known position; the position is also appended to
    /// the message.
    pub(crate) fn decode_at(format: Format, message: impl fmt::Display, location: Location) -> Self {
        ConvertError::Decode {
            format,
            message: format!("{message} at {location}"),
            location: Some(location),
        }
    }

    pub(crate) fn encode(format: Format, message: impl fmt::Display) -> Self {
        ConvertError::Encode {
            format,
            message: message.to_string(),
        }
    }
}

/// Per-file failures of the batch driver.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Convert {
        path: PathBuf,
        #[source]
        source: ConvertError,
    },
}

impl BatchError {
    /// The file the failure is attributed to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            BatchError::Io { path, .. } | BatchError::Convert { path, .. } => path,
        }
    }
}

/// Convenience alias used throughout yaml2toml-core.
pub type Result<T> = std::result::Result<T, ConvertError>;
