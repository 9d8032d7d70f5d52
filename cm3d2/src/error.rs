use crate::{FormatKind, VariantFamily};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected end of input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: u64,
        needed: usize,
        available: usize,
    },

    #[error("invalid {what} {length} at offset {offset}")]
    InvalidLength {
        what: &'static str,
        length: i64,
        offset: u64,
    },

    #[error("unsupported {family} variant '{tag}' at offset {offset}")]
    UnsupportedVariant {
        family: VariantFamily,
        tag: String,
        offset: u64,
    },

    #[error("unknown signature '{found}', expected '{expected}'")]
    UnknownSignature { expected: String, found: String },

    #[error(
        "string of {length} bytes at offset {offset} does not fit in the {limit}-byte lookahead window"
    )]
    PeekOverflow {
        offset: u64,
        length: usize,
        limit: usize,
    },

    #[error("invalid utf-8 in string at offset {offset}: {source}")]
    InvalidUtf8 {
        offset: u64,
        source: std::string::FromUtf8Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "json")]
    #[error("failed to parse document JSON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("failed to write document JSON: {message}")]
    JsonWrite { message: String },

    #[error("{format} {field}: {source}")]
    Context {
        format: FormatKind,
        field: String,
        source: Box<Error>,
    },
}

impl Error {
    /// Innermost error, skipping any field-path context.
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Error::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Dotted field path of the failure, if any context was attached.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Error::Context { field, .. } => Some(field),
            _ => None,
        }
    }

    pub(crate) fn in_field(self, format: FormatKind, field: String) -> Self {
        match self {
            Error::Context {
                field: inner,
                source,
                ..
            } => Error::Context {
                format,
                field: format!("{field}.{inner}"),
                source,
            },
            other => Error::Context {
                format,
                field,
                source: Box::new(other),
            },
        }
    }
}

pub(crate) trait ResultExt<T> {
    fn at(self, format: FormatKind, field: &'static str) -> Result<T>;
    fn at_with(self, format: FormatKind, field: impl FnOnce() -> String) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn at(self, format: FormatKind, field: &'static str) -> Result<T> {
        self.map_err(|e| e.in_field(format, field.to_string()))
    }

    fn at_with(self, format: FormatKind, field: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|e| e.in_field(format, field()))
    }
}
