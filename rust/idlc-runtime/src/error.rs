//! Failure conditions raised by generated code.

use std::fmt;

use crate::ttype;

/// A generated builder refused to produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("required field '{field}' is missing")]
    MissingRequiredField { field: &'static str },

    #[error("invalid union; {set_fields} field(s) were set")]
    InvalidUnionState { set_fields: usize },
}

/// Framing or decoding failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unknown wire type {0}")]
    UnknownType(u8),

    #[error(
        "field {field_id}: expected wire type {}, found {}",
        ttype::name(*expected),
        ttype::name(*actual)
    )]
    TypeMismatch {
        field_id: i16,
        expected: u8,
        actual: u8,
    },

    #[error("unexpected value {value} for enum {enum_name}")]
    UnknownEnumValue { enum_name: &'static str, value: i32 },

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("negative size {0}")]
    NegativeSize(i32),

    #[error("collection of {0} elements does not fit the wire format")]
    SizeLimit(usize),

    #[error("bad protocol version {0:#010x}")]
    BadVersion(u32),

    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    #[error("sequence id mismatch: sent {expected}, received {received}")]
    BadSequenceId { expected: i32, received: i32 },

    #[error("value nested deeper than {0} levels")]
    DepthLimit(usize),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl ProtocolError {
    pub fn type_mismatch(field_id: i16, expected: u8, actual: u8) -> Self {
        ProtocolError::TypeMismatch {
            field_id,
            expected,
            actual,
        }
    }
}

/// An uninhabited error type for operations that declare no exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Never {}

impl fmt::Display for Never {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl std::error::Error for Never {}

/// Kinds carried by an EXCEPTION reply frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationExceptionKind {
    Unknown,
    UnknownMethod,
    InvalidMessageType,
    WrongMethodName,
    BadSequenceId,
    MissingResult,
    InternalError,
    ProtocolError,
    InvalidTransform,
    InvalidProtocol,
    UnsupportedClientType,
}

impl ApplicationExceptionKind {
    pub fn value(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::UnknownMethod => 1,
            Self::InvalidMessageType => 2,
            Self::WrongMethodName => 3,
            Self::BadSequenceId => 4,
            Self::MissingResult => 5,
            Self::InternalError => 6,
            Self::ProtocolError => 7,
            Self::InvalidTransform => 8,
            Self::InvalidProtocol => 9,
            Self::UnsupportedClientType => 10,
        }
    }

    /// Unrecognised codes collapse to `Unknown` rather than failing the call.
    pub fn from_value(value: i32) -> Self {
        match value {
            1 => Self::UnknownMethod,
            2 => Self::InvalidMessageType,
            3 => Self::WrongMethodName,
            4 => Self::BadSequenceId,
            5 => Self::MissingResult,
            6 => Self::InternalError,
            7 => Self::ProtocolError,
            8 => Self::InvalidTransform,
            9 => Self::InvalidProtocol,
            10 => Self::UnsupportedClientType,
            _ => Self::Unknown,
        }
    }
}

/// A server-side failure reported in place of a reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("application exception ({kind:?}): {message}")]
pub struct ApplicationException {
    pub kind: ApplicationExceptionKind,
    pub message: String,
}

impl ApplicationException {
    pub fn new(kind: ApplicationExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of a failed two-way call.
///
/// `E` is the per-operation exception enum generated from the throws list,
/// or [`Never`] when the operation declares none. Declared exceptions are
/// carried unchanged in [`CallError::Exception`].
#[derive(Debug, thiserror::Error)]
pub enum CallError<E> {
    #[error("{0}")]
    Exception(E),

    /// The reply held neither a result nor a declared exception.
    #[error("missing result")]
    MissingResult,

    #[error(transparent)]
    Application(ApplicationException),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl<E> CallError<E> {
    /// The declared exception, if that is what the server sent.
    pub fn exception(&self) -> Option<&E> {
        match self {
            CallError::Exception(e) => Some(e),
            _ => None,
        }
    }
}
