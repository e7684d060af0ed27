//! Error types
//!
//! Every error here is local to one connection. Nothing is surfaced to peers
//! beyond the connection being closed.

use std::fmt;
use std::io;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Transport failure (read, write, accept, bind)
    Io(io::Error),
    /// Malformed or truncated request head
    Handshake(HandshakeError),
}

/// Errors raised while reading a request head or negotiating an upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Peer closed the connection before sending CRLFCRLF
    UnexpectedEof,
    /// Head grew past the allowed size without a terminator
    HeadTooLarge(usize),
    /// No `Sec-WebSocket-Key` header in the upgrade request
    MissingKey,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Handshake(e) => write!(f, "Handshake error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Handshake(e) => Some(e),
        }
    }
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::UnexpectedEof => {
                write!(f, "connection closed before end of headers")
            }
            HandshakeError::HeadTooLarge(size) => {
                write!(f, "request head exceeds {} bytes", size)
            }
            HandshakeError::MissingKey => write!(f, "missing Sec-WebSocket-Key header"),
        }
    }
}

impl std::error::Error for HandshakeError {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<HandshakeError> for Error {
    fn from(e: HandshakeError) -> Self {
        Error::Handshake(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_error_converts() {
        let err: Error = HandshakeError::MissingKey.into();
        assert!(matches!(err, Error::Handshake(HandshakeError::MissingKey)));
        assert_eq!(
            err.to_string(),
            "Handshake error: missing Sec-WebSocket-Key header"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
