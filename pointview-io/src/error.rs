//! Error types for decoding point-cloud files

use thiserror::Error;

/// Reasons a point-cloud file could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("file is not valid UTF-8 text (line {line})")]
    InvalidUtf8 { line: usize },

    #[error("unexpected end of file in PCD header")]
    UnterminatedHeader,

    #[error("missing {keyword} in PCD header")]
    MissingHeaderField { keyword: &'static str },

    #[error("invalid {keyword} value in PCD header: {value}")]
    InvalidHeaderValue { keyword: &'static str, value: String },

    #[error("FIELDS, SIZE, TYPE and COUNT declare different numbers of fields")]
    FieldDeclarationMismatch,

    #[error("unsupported PCD field type/size combination: {type_char}/{size}")]
    UnsupportedFieldType { type_char: String, size: usize },

    #[error("unknown PCD DATA format: {0}")]
    UnknownDataFormat(String),

    #[error("POINTS ({points}) doesn't match WIDTH * HEIGHT ({expected})")]
    PointCountMismatch { points: usize, expected: usize },

    #[error("PCD file has no '{0}' field")]
    MissingCoordinate(&'static str),

    #[error("row {row} has {found} values, expected at least {expected}")]
    ShortRow { row: usize, found: usize, expected: usize },

    #[error("truncated point data: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("corrupt LZF block: {0}")]
    Lzf(&'static str),
}

impl From<DecodeError> for pointview_core::Error {
    fn from(error: DecodeError) -> Self {
        pointview_core::Error::Decode(error.to_string())
    }
}
