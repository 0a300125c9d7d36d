//! Error type shared by every fallible manager operation.

use std::fmt;

/// The kind of a [`BddError`], without its diagnostic message.
///
/// Adapter layers (bindings, CLIs) map kinds to their own error vocabulary.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    ResourceExhausted,
    OrderViolation,
    InvalidReference,
    InvalidArgument,
    IoFailure,
    InternalInvariant,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ResourceExhausted => "resource exhausted",
            ErrorKind::OrderViolation => "order violation",
            ErrorKind::InvalidReference => "invalid reference",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::InternalInvariant => "internal invariant violated",
        };
        f.write_str(name)
    }
}

/// Error raised by the BDD manager.
#[derive(Debug)]
pub enum BddError {
    /// Node table or cache could not grow any further.
    ResourceExhausted(String),
    /// Variables are not in the order an operation requires.
    OrderViolation(String),
    /// A handle was released twice or points at a reclaimed node.
    InvalidReference(String),
    /// Bad sizes, unknown variables, malformed variable sets.
    InvalidArgument(String),
    /// Reading or writing external data failed.
    IoFailure(std::io::Error),
    /// Something that should be impossible happened.
    InternalInvariant(String),
}

impl BddError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BddError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            BddError::OrderViolation(_) => ErrorKind::OrderViolation,
            BddError::InvalidReference(_) => ErrorKind::InvalidReference,
            BddError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            BddError::IoFailure(_) => ErrorKind::IoFailure,
            BddError::InternalInvariant(_) => ErrorKind::InternalInvariant,
        }
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        BddError::InvalidArgument(msg.into())
    }

    pub(crate) fn order_violation(msg: impl Into<String>) -> Self {
        BddError::OrderViolation(msg.into())
    }

    pub(crate) fn invalid_reference(msg: impl Into<String>) -> Self {
        BddError::InvalidReference(msg.into())
    }

    pub(crate) fn exhausted(msg: impl Into<String>) -> Self {
        BddError::ResourceExhausted(msg.into())
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        BddError::InternalInvariant(msg.into())
    }
}

impl From<std::io::Error> for BddError {
    fn from(e: std::io::Error) -> Self {
        BddError::IoFailure(e)
    }
}

impl fmt::Display for BddError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BddError::IoFailure(e) => write!(f, "{}: {}", self.kind(), e),
            BddError::ResourceExhausted(msg)
            | BddError::OrderViolation(msg)
            | BddError::InvalidReference(msg)
            | BddError::InvalidArgument(msg)
            | BddError::InternalInvariant(msg) => write!(f, "{}: {}", self.kind(), msg),
        }
    }
}

impl std::error::Error for BddError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BddError::IoFailure(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T, E = BddError> = std::result::Result<T, E>;
