//! Shared connection state and the outbound send path.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info};

use skylark_proto::Message;

use crate::config::Config;
use crate::continuation::ContinuationRegistry;
use crate::error::{HandlerError, HandlerResult};

/// Lifecycle of the connection.
///
/// Owned by the connection's read loop; observable by handlers and tests
/// through the [`Session`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial state, not yet connected.
    #[default]
    Disconnected,
    /// Transport is being opened.
    Connecting,
    /// Transport open, identity registration sent, awaiting welcome.
    Registering,
    /// Welcome numeric received.
    Welcomed,
    /// Steady state; the read loop runs indefinitely.
    Running,
    /// Graceful stop requested or peer closed the connection.
    Terminating,
    /// Read loop exited and resources released.
    Closed,
}

/// Shared handle onto one connection.
///
/// Holds the configuration, the outbound queue, the connection-state cell,
/// the welcome latch, and the continuation registry. Handlers receive an
/// `Arc<Session>` and interact with the connection exclusively through it.
pub struct Session {
    config: Config,
    /// Outbound lines, drained by a single writer task. Lines are queued
    /// whole, so sends from both execution contexts never interleave
    /// mid-line. Taken on close so the writer can drain and exit.
    out_tx: Mutex<Option<mpsc::Sender<String>>>,
    state: Mutex<ConnectionState>,
    welcomed: AtomicBool,
    terminating: AtomicBool,
    shutdown: Notify,
    /// Pending suspended continuations.
    pub continuations: ContinuationRegistry,
}

impl Session {
    /// Create a session around `config` with the given outbound queue.
    pub fn new(config: Config, out_tx: mpsc::Sender<String>) -> Self {
        Self {
            config,
            out_tx: Mutex::new(Some(out_tx)),
            state: Mutex::new(ConnectionState::Disconnected),
            welcomed: AtomicBool::new(false),
            terminating: AtomicBool::new(false),
            shutdown: Notify::new(),
            continuations: ContinuationRegistry::new(),
        }
    }

    /// The configuration this connection was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.lock();
        debug!(from = ?*state, to = ?next, "connection state");
        *state = next;
    }

    /// Whether registration has completed. Latched once set.
    pub fn is_welcomed(&self) -> bool {
        self.welcomed.load(Ordering::SeqCst)
    }

    /// Latch the welcome flag; returns true only on the first call.
    pub(crate) fn latch_welcome(&self) -> bool {
        !self.welcomed.swap(true, Ordering::SeqCst)
    }

    /// Queue a raw line for sending. The line terminator is appended by
    /// the codec; callers pass bare protocol lines.
    pub async fn send_line(&self, line: impl Into<String>) -> HandlerResult {
        let tx = self.out_tx.lock().clone();
        match tx {
            Some(tx) => Ok(tx.send(line.into()).await?),
            None => Err(HandlerError::Internal("connection closed".to_string())),
        }
    }

    /// Queue a message for sending.
    pub async fn send(&self, msg: &Message) -> HandlerResult {
        self.send_line(msg.to_string()).await
    }

    /// Send a PRIVMSG to `target`.
    pub async fn privmsg(&self, target: &str, text: &str) -> HandlerResult {
        self.send(&Message::privmsg(target, text)).await
    }

    /// Send a NOTICE to `target`.
    pub async fn notice(&self, target: &str, text: &str) -> HandlerResult {
        self.send(&Message::notice(target, text)).await
    }

    /// Request graceful termination.
    ///
    /// Sets a flag observed at the top of each read-loop iteration; an
    /// in-flight handler or handoff is never interrupted, and the socket is
    /// not closed out from under an in-flight read.
    pub fn terminate(&self) {
        if !self.terminating.swap(true, Ordering::SeqCst) {
            info!("graceful termination requested");
        }
        self.shutdown.notify_one();
    }

    /// Whether graceful termination has been requested.
    pub fn is_terminating(&self) -> bool {
        self.terminating.load(Ordering::SeqCst)
    }

    pub(crate) async fn stop_requested(&self) {
        self.shutdown.notified().await;
    }

    /// Drop the outbound sender so the writer task drains and exits.
    pub(crate) fn close_outbound(&self) {
        self.out_tx.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config() -> Config {
        toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 6667

            [identity]
            nick = "sky"
            realname = "Skylark"
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn welcome_latch_is_idempotent() {
        let (tx, _rx) = mpsc::channel(8);
        let session = Session::new(test_config(), tx);

        assert!(!session.is_welcomed());
        assert!(session.latch_welcome());
        assert!(!session.latch_welcome());
        assert!(session.is_welcomed());
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let (tx, mut rx) = mpsc::channel(8);
        let session = Session::new(test_config(), tx);

        session.send_line("PING :x").await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("PING :x"));

        session.close_outbound();
        assert!(session.send_line("PING :y").await.is_err());
    }

    #[tokio::test]
    async fn privmsg_serializes_with_trailing_colon() {
        let (tx, mut rx) = mpsc::channel(8);
        let session = Session::new(test_config(), tx);

        session.privmsg("#chan", "two words").await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("PRIVMSG #chan :two words"));
    }
}
