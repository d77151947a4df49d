//! # skylark-proto
//!
//! A small Rust library for parsing and serializing client-side IRC
//! protocol messages, plus a line codec for framing them over a stream
//! socket.
//!
//! ## Quick Start
//!
//! ```rust
//! use skylark_proto::Message;
//!
//! let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.args, vec!["#channel", "Hello!"]);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod prefix;

pub use self::error::ParseError;
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::Message;
pub use self::prefix::Prefix;
