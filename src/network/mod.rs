//! Networking: the connection scheduler and the worker handoff.

mod connection;
mod worker;

pub use connection::{Connection, WELCOME_CODES};
pub use worker::Worker;
