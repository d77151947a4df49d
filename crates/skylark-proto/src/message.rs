//! IRC message type, parsing and serialization.
//!
//! Wire grammar (consumed and produced line by line):
//!
//! ```text
//! [:prefix ]COMMAND [arg1] [arg2] ... [:trailing arg with spaces]
//! ```
//!
//! COMMAND is one or more ASCII letters or exactly three ASCII digits (a
//! numeric reply code). The last argument may be introduced with `:` to
//! carry embedded spaces; that colon is stripped on parse and restored on
//! serialization when needed.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::prefix::Prefix;

/// A parsed IRC message.
///
/// Immutable once parsed: `command` is always present, `args` may be empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Origin of the message, when the line carried a `:prefix`.
    pub prefix: Option<Prefix>,
    /// Command word or 3-digit numeric reply code, as it appeared.
    pub command: String,
    /// Positional arguments, trailing argument last with its colon stripped.
    pub args: Vec<String>,
}

impl Message {
    /// Build a message with no prefix.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            args,
        }
    }

    /// A `PRIVMSG` to `target`.
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", vec![target.to_string(), text.to_string()])
    }

    /// A `NOTICE` to `target`.
    pub fn notice(target: &str, text: &str) -> Self {
        Self::new("NOTICE", vec![target.to_string(), text.to_string()])
    }

    /// A `JOIN` for `channel`.
    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", vec![channel.to_string()])
    }

    /// A `QUIT` with the given reason.
    pub fn quit(reason: &str) -> Self {
        Self::new("QUIT", vec![reason.to_string()])
    }

    /// The `n`-th argument, if present.
    pub fn arg(&self, n: usize) -> Option<&str> {
        self.args.get(n).map(String::as_str)
    }

    /// The nickname of the sender, when the prefix is a user mask.
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nick)
    }
}

fn is_valid_command(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    if token.chars().all(|c| c.is_ascii_alphabetic()) {
        return true;
    }
    token.len() == 3 && token.chars().all(|c| c.is_ascii_digit())
}

impl FromStr for Message {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim_end_matches(['\r', '\n']);
        if rest.is_empty() {
            return Err(ParseError::EmptyLine);
        }

        let prefix = if let Some(after_colon) = rest.strip_prefix(':') {
            let (raw_prefix, after) =
                after_colon
                    .split_once(' ')
                    .ok_or_else(|| ParseError::MissingCommand {
                        line: s.to_string(),
                    })?;
            rest = after.trim_start_matches(' ');
            Some(Prefix::parse(raw_prefix))
        } else {
            None
        };

        let (command, mut rest) = match rest.split_once(' ') {
            Some((command, after)) => (command, after),
            None => (rest, ""),
        };
        if command.is_empty() {
            return Err(ParseError::MissingCommand {
                line: s.to_string(),
            });
        }
        if !is_valid_command(command) {
            return Err(ParseError::InvalidCommand {
                token: command.to_string(),
            });
        }

        let mut args = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                args.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((arg, after)) => {
                    args.push(arg.to_string());
                    rest = after;
                }
                None => {
                    args.push(rest.to_string());
                    break;
                }
            }
        }

        Ok(Message {
            prefix,
            command: command.to_string(),
            args,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command)?;
        let last = self.args.len().checked_sub(1);
        for (i, arg) in self.args.iter().enumerate() {
            let needs_colon = arg.is_empty() || arg.contains(' ') || arg.starts_with(':');
            if Some(i) == last && needs_colon {
                write!(f, " :{}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
