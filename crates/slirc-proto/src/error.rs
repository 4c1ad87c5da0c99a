//! Error types for line parsing.

use thiserror::Error;

/// Errors produced while parsing a raw IRC line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MessageParseError {
    /// The line was empty or whitespace only.
    #[error("empty message")]
    EmptyMessage,

    /// The line exceeded the protocol length limit.
    #[error("line too long ({0} bytes)")]
    LineTooLong(usize),

    /// The command token was missing or not `1*letter / 3digit`.
    #[error("invalid command at position {position}")]
    InvalidCommand {
        /// Byte offset where parsing failed.
        position: usize,
    },

    /// The line contained a NUL, CR or LF inside the message body.
    #[error("illegal control character in message")]
    IllegalCharacter,
}
