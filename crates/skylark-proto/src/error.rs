//! Error types for the skylark protocol library.

use thiserror::Error;

/// Failures when parsing a raw line into a [`Message`](crate::Message).
///
/// A parse failure means the line should be skipped, never that the
/// connection should be torn down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The line was empty after stripping line terminators.
    #[error("empty line")]
    EmptyLine,

    /// The line had a prefix but nothing after it.
    #[error("missing command token in {line:?}")]
    MissingCommand {
        /// The offending raw line.
        line: String,
    },

    /// The command token was neither a word nor a 3-digit numeric code.
    #[error("invalid command token {token:?}")]
    InvalidCommand {
        /// The offending token.
        token: String,
    },
}
