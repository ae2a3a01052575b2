//! Error types for respio
//!
//! Provides a unified error type for framing, transport and configuration
//! failures.

use std::io;
use thiserror::Error;

/// Result type alias using RespError
pub type Result<T> = std::result::Result<T, RespError>;

/// Unified error type for respio operations
#[derive(Debug, Error)]
pub enum RespError {
    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    /// The buffer ended before a complete value was available.
    /// More bytes may turn this into a valid message.
    #[error("Protocol error: incomplete message")]
    Incomplete,

    /// The stream reached EOF in the middle of a value
    #[error("Protocol error: unexpected end of stream")]
    UnexpectedEof,

    #[error("Protocol error: expected CRLF terminator")]
    MissingTerminator,

    #[error("Protocol error: expected array, got '{}'", marker(.0))]
    NotAnArray(u8),

    #[error("Protocol error: unknown type marker '{}'", marker(.0))]
    UnknownType(u8),

    #[error("Protocol error: invalid integer '{0}'")]
    InvalidInteger(String),

    #[error("Protocol error: invalid length '{0}'")]
    InvalidLength(String),

    #[error("Protocol error: bulk string length does not match payload")]
    LengthMismatch,

    #[error("Protocol error: bulk string too large ({0} bytes)")]
    BulkTooLarge(usize),

    #[error("Protocol error: empty command")]
    EmptyCommand,

    #[error("Protocol error: null command")]
    NullCommand,

    #[error("Protocol error: nesting too deep (max {0})")]
    NestingTooDeep(usize),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("error reading request: {0}")]
    ReadRequest(#[source] io::Error),

    #[error("error writing response: {0}")]
    WriteResponse(#[source] io::Error),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

fn marker(byte: &u8) -> char {
    char::from(*byte)
}

impl RespError {
    /// True if the input was cut short rather than malformed
    pub fn is_incomplete(&self) -> bool {
        matches!(self, RespError::Incomplete)
    }

    /// True for errors raised while framing bytes into values
    pub fn is_framing(&self) -> bool {
        !matches!(
            self,
            RespError::ReadRequest(_)
                | RespError::WriteResponse(_)
                | RespError::ConnectionClosed
                | RespError::Io(_)
                | RespError::Config(_)
        )
    }

    /// The underlying I/O error for transport failures
    pub fn io_cause(&self) -> Option<&io::Error> {
        match self {
            RespError::ReadRequest(e) | RespError::WriteResponse(e) | RespError::Io(e) => Some(e),
            _ => None,
        }
    }
}
