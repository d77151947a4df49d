//! Worker - the untrusted-handler execution context.
//!
//! The worker and the scheduler form a strict two-party turn relay: the
//! scheduler submits one handoff at a time and awaits its completion
//! signal before doing anything else, so at most one of the two contexts
//! is running handler logic at any instant. A handler that sends through
//! the session while holding the turn is safe; the outbound queue is
//! drained by its own writer task.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use skylark_proto::Message;

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::Handler;
use crate::state::Session;

/// One untrusted-handler invocation in flight between scheduler and
/// worker.
struct Handoff {
    handler: Arc<dyn Handler>,
    session: Arc<Session>,
    message: Arc<Message>,
    done: oneshot::Sender<HandlerResult>,
}

/// Handle to the worker task.
///
/// The queue has capacity 1 and every submission waits for completion, so
/// the worker never has more than one handoff to look at. Dropping the
/// handle closes the queue; the worker drains and exits without ever being
/// left holding the turn.
pub struct Worker {
    tx: mpsc::Sender<Handoff>,
}

impl Worker {
    /// Spawn the worker task.
    ///
    /// The returned receiver resolves once the worker is ready to accept
    /// handoffs. The connection awaits it before dialing the transport, so
    /// the read loop can never hand work to a worker that has not finished
    /// initializing.
    pub fn spawn() -> (Self, oneshot::Receiver<()>) {
        let (tx, mut rx) = mpsc::channel::<Handoff>(1);
        let (ready_tx, ready_rx) = oneshot::channel();

        tokio::spawn(async move {
            let _ = ready_tx.send(());
            debug!("worker ready");

            while let Some(handoff) = rx.recv().await {
                let Handoff {
                    handler,
                    session,
                    message,
                    done,
                } = handoff;

                let command = message.command.clone();
                let result = AssertUnwindSafe(handler.handle(&session, message.as_ref()))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        warn!(command = %command, "handler panicked");
                        Err(HandlerError::Internal(format!(
                            "handler panicked on {command}"
                        )))
                    });

                // The scheduler only drops its end mid-shutdown.
                let _ = done.send(result);
            }

            debug!("worker stopped");
        });

        (Self { tx }, ready_rx)
    }

    /// Hand one untrusted handler invocation to the worker and wait for it
    /// to run to completion.
    pub async fn submit(
        &self,
        handler: Arc<dyn Handler>,
        session: Arc<Session>,
        message: Arc<Message>,
    ) -> HandlerResult {
        let (done_tx, done_rx) = oneshot::channel();
        let handoff = Handoff {
            handler,
            session,
            message,
            done: done_tx,
        };

        if self.tx.send(handoff).await.is_err() {
            return Err(HandlerError::Internal("worker unavailable".to_string()));
        }
        done_rx
            .await
            .unwrap_or_else(|_| Err(HandlerError::Internal("worker dropped handoff".to_string())))
    }
}
