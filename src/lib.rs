//! skylark - an IRC bot built around a two-context dispatch core.
//!
//! The core owns the connection: it frames the byte stream into lines,
//! parses them into messages, and dispatches each message to registered
//! handlers. Trusted handlers run inline on the read-loop context;
//! untrusted handlers are handed to a dedicated worker task one at a time,
//! with the read loop waiting for each handoff to complete before the next.
//! Handlers that need to wait on an external confirmation park a one-shot
//! continuation instead of blocking their turn.

pub mod config;
pub mod continuation;
pub mod db;
pub mod error;
pub mod handlers;
pub mod network;
pub mod state;
