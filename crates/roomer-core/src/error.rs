//! Shared error type and failure classification.

use std::io;

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type used by the core and the relay runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("connection is shut down")]
    Shutdown,
    #[error("end of stream")]
    Eof,
    #[error("unexpected end of stream")]
    UnexpectedEof,
    #[error("io: {0}")]
    Io(String),
    #[error("remote error: {0}")]
    Remote(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("bad message: {0}")]
    BadMessage(String),
    #[error("dispatch not acknowledged")]
    NotAcknowledged,
    #[error("invalid config: {0}")]
    Config(String),
    #[error("store: {0}")]
    Store(String),
    #[error("cancelled")]
    Cancelled,
    #[error("internal: {0}")]
    Internal(String),
}

impl RelayError {
    /// Stable machine-readable code, used as a report/metric label.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Shutdown => "SHUTDOWN",
            RelayError::Eof => "EOF",
            RelayError::UnexpectedEof => "UNEXPECTED_EOF",
            RelayError::Io(_) => "IO",
            RelayError::Remote(_) => "REMOTE",
            RelayError::Protocol(_) => "PROTOCOL",
            RelayError::BadMessage(_) => "BAD_MESSAGE",
            RelayError::NotAcknowledged => "NOT_ACKNOWLEDGED",
            RelayError::Config(_) => "CONFIG",
            RelayError::Store(_) => "STORE",
            RelayError::Cancelled => "CANCELLED",
            RelayError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<io::Error> for RelayError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => RelayError::UnexpectedEof,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected => RelayError::Shutdown,
            _ => RelayError::Io(e.to_string()),
        }
    }
}

/// Outcome of classifying a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The link went away (shutdown or end of stream).
    Network,
    /// Anything else, including explicit application-level failures.
    Other,
}

impl FailureClass {
    /// Severity attached to reports of this class.
    pub fn severity(self) -> Severity {
        match self {
            FailureClass::Network => Severity::Warning,
            FailureClass::Other => Severity::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureClass::Network => "network",
            FailureClass::Other => "other",
        }
    }
}

/// Decide whether an error is a transient connectivity failure.
///
/// Pure: the caller decides what to do with the answer.
pub fn classify(err: &RelayError) -> FailureClass {
    match err {
        RelayError::Shutdown | RelayError::Eof | RelayError::UnexpectedEof => {
            FailureClass::Network
        }
        _ => FailureClass::Other,
    }
}

/// Report severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}
