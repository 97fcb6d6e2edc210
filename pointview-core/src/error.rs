//! Error types for pointview

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for pointview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decode failure: {0}")]
    Decode(String),

    /// An internal invariant was broken, e.g. a colour buffer that does not
    /// line up with its point buffer. Never retried.
    #[error("Contract violation: {0}")]
    ContractViolation(String),
}

impl Error {
    /// The user-facing kind this error is reported as
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Error::Io(_) | Error::InvalidData(_) | Error::Decode(_) => ErrorKind::DecodeFailure,
            Error::ContractViolation(_) => ErrorKind::ContractViolation,
        }
    }

    /// Whether this error is a programming fault rather than bad input
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Error::ContractViolation(_))
    }
}

/// Closed set of conditions a load can end in, other than success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFormat,
    DecodeFailure,
    /// Not fatal: the load completes with zero points.
    EmptyPointSet,
    ContractViolation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedFormat => "unsupported format",
            ErrorKind::DecodeFailure => "decode failure",
            ErrorKind::EmptyPointSet => "empty point set",
            ErrorKind::ContractViolation => "contract violation",
        };
        f.write_str(name)
    }
}

/// Error record delivered in place of a render bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSignal {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorSignal {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&Error> for ErrorSignal {
    fn from(error: &Error) -> Self {
        Self::new(error.kind(), error.to_string())
    }
}

impl From<Error> for ErrorSignal {
    fn from(error: Error) -> Self {
        Self::from(&error)
    }
}

impl fmt::Display for ErrorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
