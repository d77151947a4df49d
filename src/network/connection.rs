//! Connection - owns the transport and drives dispatch.
//!
//! The connection task is the scheduler: it frames the socket into lines,
//! parses each line into a message, and dispatches it. Trusted handlers
//! run inline; untrusted handlers are handed to the worker one at a time,
//! the loop blocking until each handoff completes before dispatching the
//! next. Outbound lines are drained by a dedicated writer task so that
//! handlers can send while the scheduler is parked on a handoff.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use skylark_proto::{LineCodec, Message};

use crate::config::Config;
use crate::error::ConnectError;
use crate::handlers::{Registry, Trust};
use crate::network::worker::Worker;
use crate::state::{ConnectionState, Session};

/// Numeric replies that complete registration: end-of-MOTD and its
/// no-MOTD fallback.
pub const WELCOME_CODES: [&str; 2] = ["376", "422"];

const OUTBOUND_QUEUE: usize = 64;

/// A connection to one IRC server.
pub struct Connection {
    session: Arc<Session>,
    registry: Registry,
    out_rx: mpsc::Receiver<String>,
}

impl Connection {
    /// Create a connection around `config`.
    ///
    /// All handler registration happens on `registry` before this point;
    /// the registry is never mutated once the read loop starts. The
    /// returned [`Session`] is the handle collaborators keep.
    pub fn new(config: Config, registry: Registry) -> (Self, Arc<Session>) {
        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_QUEUE);
        let session = Arc::new(Session::new(config, out_tx));
        (
            Self {
                session: Arc::clone(&session),
                registry,
                out_rx,
            },
            session,
        )
    }

    /// Connect, register, and drive the read loop until termination.
    pub async fn run(self) -> anyhow::Result<()> {
        let Connection {
            session,
            registry,
            mut out_rx,
        } = self;

        // The worker starts before the transport connects, and the first
        // handoff waits for its readiness signal.
        let (worker, ready) = Worker::spawn();
        ready.await.map_err(|_| ConnectError::WorkerUnavailable)?;

        session.set_state(ConnectionState::Connecting);
        let cfg = session.config();
        let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
        let stream = match TcpStream::connect(&addr).await {
            Ok(stream) => stream,
            Err(source) => {
                session.set_state(ConnectionState::Closed);
                return Err(ConnectError::Connect { addr, source }.into());
            }
        };
        info!(addr = %addr, "connected");

        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, LineCodec::new());
        let mut writer = FramedWrite::new(write_half, LineCodec::new());

        // Dedicated writer task: the scheduler blocks for the whole of each
        // handoff, so the outbound queue must drain independently. A single
        // writer also keeps concurrent sends whole-line atomic.
        let writer_task = tokio::spawn(async move {
            while let Some(line) = out_rx.recv().await {
                debug!(line = %line, "send");
                if let Err(e) = writer.send(line).await {
                    warn!(error = %e, "write error");
                    break;
                }
            }
        });

        // Identity registration, in fixed order, before any dispatch.
        session.set_state(ConnectionState::Registering);
        if let Some(password) = &cfg.server.password {
            session.send_line(format!("PASS {password}")).await?;
        }
        session.send_line(format!("NICK {}", cfg.identity.nick)).await?;
        session
            .send_line(format!(
                "USER {} * * :{}",
                cfg.identity.username(),
                cfg.identity.realname
            ))
            .await?;

        loop {
            if session.is_terminating() {
                break;
            }
            tokio::select! {
                _ = session.stop_requested() => {
                    // Flag is re-checked at the top of the loop.
                }
                next = reader.next() => match next {
                    Some(Ok(line)) => dispatch_line(&session, &registry, &worker, &line).await,
                    Some(Err(e)) => {
                        warn!(error = %e, "read error");
                        break;
                    }
                    None => {
                        info!("server closed connection");
                        break;
                    }
                },
            }
        }

        session.set_state(ConnectionState::Terminating);

        // Release the turn machinery: closing the handoff queue lets the
        // worker drain and exit, and closing the outbound queue lets the
        // writer flush anything still pending (a final QUIT, typically).
        drop(worker);
        session.close_outbound();
        let _ = writer_task.await;

        session.set_state(ConnectionState::Closed);
        info!("connection closed");
        Ok(())
    }
}

async fn dispatch_line(
    session: &Arc<Session>,
    registry: &Registry,
    worker: &Worker,
    line: &str,
) {
    debug!(line = %line, "recv");
    let msg: Message = match line.parse() {
        Ok(msg) => msg,
        Err(e) => {
            // Malformed lines are skipped, never fatal.
            debug!(error = %e, line = %line, "skipping unparseable line");
            return;
        }
    };
    dispatch(session, registry, worker, msg).await;
}

/// Dispatch one parsed message.
///
/// The keep-alive probe is answered inline and is never handed off; it
/// must not wait behind queued work. The welcome numerics latch the
/// welcome flag before normal dispatch. Everything else goes to the
/// registered handlers in registration order, untrusted ones through one
/// handoff each.
async fn dispatch(session: &Arc<Session>, registry: &Registry, worker: &Worker, msg: Message) {
    let command = msg.command.to_ascii_uppercase();

    if command == "PING" {
        let pong = Message::new("PONG", msg.args);
        if session.send(&pong).await.is_err() {
            warn!("failed to answer keep-alive probe");
        }
        return;
    }

    if WELCOME_CODES.contains(&command.as_str()) && session.latch_welcome() {
        info!("registration complete");
        session.set_state(ConnectionState::Welcomed);
        session.set_state(ConnectionState::Running);
    }

    let msg = Arc::new(msg);
    for registration in registry.get(&command) {
        let result = match registration.trust {
            Trust::Trusted => registration.handler.handle(session, msg.as_ref()).await,
            Trust::Untrusted => {
                worker
                    .submit(
                        Arc::clone(&registration.handler),
                        Arc::clone(session),
                        Arc::clone(&msg),
                    )
                    .await
            }
        };
        if let Err(e) = result {
            // A misbehaving handler must not take down the connection or
            // abort dispatch of the remaining handlers.
            warn!(command = %command, code = e.error_code(), error = %e, "handler error");
        }
    }
}
