//! Handler trait and callback registry.
//!
//! Incoming messages are dispatched to handlers registered per command
//! key. Each registration carries a trust tag: trusted handlers run inline
//! on the read-loop context and are reserved for protocol-correctness
//! work; everything extension-shaped is untrusted and isolated onto the
//! worker via the handoff protocol.

mod auth;
mod commands;
mod infobot;

pub use auth::{StatusReplyHandler, wait_for_auth};
pub use commands::{AutojoinHandler, CommandRouter};
pub use infobot::InfobotHandler;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use skylark_proto::Message;

use crate::error::HandlerResult;
use crate::state::Session;

/// Execution policy for a registered handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trust {
    /// Runs inline on the read-loop context, with no handoff.
    Trusted,
    /// Handed off to the worker, one invocation at a time.
    Untrusted,
}

/// Trait implemented by all message handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle one incoming message.
    async fn handle(&self, session: &Arc<Session>, msg: &Message) -> HandlerResult;
}

/// A handler registered for a command key.
pub struct Registration {
    /// The handler itself.
    pub handler: Arc<dyn Handler>,
    /// Execution policy.
    pub trust: Trust,
}

/// Ordered registry of handlers per command key.
///
/// Registrations are append-only per key; registration order is dispatch
/// order. All registration happens during bootstrap, before the read loop
/// starts, so dispatch reads the registry without locking.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<String, Vec<Registration>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `key` (a command word or 3-digit numeric).
    pub fn register(&mut self, key: impl Into<String>, handler: Arc<dyn Handler>, trust: Trust) {
        let key = key.into().to_ascii_uppercase();
        self.handlers
            .entry(key)
            .or_default()
            .push(Registration { handler, trust });
    }

    /// Registrations for `key`, in registration order.
    pub fn get(&self, key: &str) -> &[Registration] {
        self.handlers
            .get(&key.to_ascii_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
