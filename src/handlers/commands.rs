//! Chat command routing.
//!
//! [`CommandRouter`] is an untrusted PRIVMSG handler that turns prefixed
//! chat lines (`!join #chan`, `!quit reason`, ...) into protocol actions.
//! Privileged commands are gated behind the services auth round trip: the
//! router parks a continuation and the action only runs once the STATUS
//! reply confirms the requester.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tracing::debug;

use skylark_proto::Message;

use crate::error::HandlerResult;
use crate::state::Session;

use super::{Handler, auth::wait_for_auth};

/// Action deferred until the requester's identification is confirmed.
type GatedAction = Box<dyn FnOnce(Arc<Session>) -> BoxFuture<'static, ()> + Send>;

/// Park `action` behind an auth check for `nick`.
async fn gated(session: &Arc<Session>, nick: &str, action: GatedAction) -> HandlerResult {
    let session2 = Arc::clone(session);
    let requester = nick.to_string();
    wait_for_auth(
        session,
        nick,
        Box::new(move |confirmed| {
            Box::pin(async move {
                if confirmed {
                    action(session2).await;
                } else {
                    let _ = session2
                        .notice(&requester, "You are not identified with services.")
                        .await;
                }
            })
        }),
    )
    .await
}

/// Untrusted PRIVMSG handler for prefixed chat commands.
pub struct CommandRouter {
    prefix: String,
}

impl CommandRouter {
    /// Create a router using `prefix` as the command marker.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }
}

#[async_trait]
impl Handler for CommandRouter {
    async fn handle(&self, session: &Arc<Session>, msg: &Message) -> HandlerResult {
        let (Some(target), Some(text)) = (msg.arg(0), msg.arg(1)) else {
            return Ok(());
        };
        let Some(nick) = msg.source_nick() else {
            return Ok(());
        };
        let Some(rest) = text.strip_prefix(&self.prefix) else {
            return Ok(());
        };

        let (word, arg) = rest.split_once(' ').unwrap_or((rest, ""));
        let arg = arg.trim();
        debug!(command = %word, from = %nick, "chat command");

        match word {
            "join" if arg.starts_with('#') => session.send_line(format!("JOIN :{arg}")).await,
            "part" => {
                let channel = if arg.starts_with('#') { arg } else { target };
                if channel.starts_with('#') {
                    session.send_line(format!("PART :{channel}")).await
                } else {
                    Ok(())
                }
            }
            "say" if !arg.is_empty() => {
                // "!say #chan text" overrides the channel; otherwise the
                // reply goes where the command came from.
                let (channel, text) = match arg.split_once(' ') {
                    Some((chan, text)) if chan.starts_with('#') => (chan, text),
                    _ if target.starts_with('#') => (target, arg),
                    _ => return Ok(()),
                };
                let channel = channel.to_string();
                let text = text.to_string();
                gated(
                    session,
                    nick,
                    Box::new(move |s| {
                        Box::pin(async move {
                            let _ = s.privmsg(&channel, &text).await;
                        })
                    }),
                )
                .await
            }
            "raw" if !arg.is_empty() => {
                let line = arg.to_string();
                gated(
                    session,
                    nick,
                    Box::new(move |s| {
                        Box::pin(async move {
                            let _ = s.send_line(line).await;
                        })
                    }),
                )
                .await
            }
            "quit" => {
                let reason = if arg.is_empty() { "bye" } else { arg }.to_string();
                gated(
                    session,
                    nick,
                    Box::new(move |s| {
                        Box::pin(async move {
                            let _ = s.send(&Message::quit(&reason)).await;
                            s.terminate();
                        })
                    }),
                )
                .await
            }
            _ => Ok(()),
        }
    }
}

/// Untrusted handler for the welcome numerics that joins the configured
/// channels once registration completes.
pub struct AutojoinHandler;

#[async_trait]
impl Handler for AutojoinHandler {
    async fn handle(&self, session: &Arc<Session>, _msg: &Message) -> HandlerResult {
        for channel in &session.config().channels.autojoin {
            session.send(&Message::join(channel)).await?;
        }
        Ok(())
    }
}
