//! Services authentication via a continuation round trip.
//!
//! `wait_for_auth` parks a continuation keyed by nick and asks services
//! for that nick's STATUS. The reply arrives later as an ordinary NOTICE
//! dispatched on its own, where [`StatusReplyHandler`] resumes the parked
//! continuation with the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use skylark_proto::{Message, Prefix};

use crate::continuation::Resume;
use crate::error::HandlerResult;
use crate::state::Session;

use super::Handler;

/// Ask services whether `nick` is identified and park `resume` until the
/// STATUS reply arrives.
///
/// The caller returns immediately afterwards, releasing its turn; the
/// resume closure runs in whichever dispatch context handles the reply.
pub async fn wait_for_auth(session: &Arc<Session>, nick: &str, resume: Resume) -> HandlerResult {
    session.continuations.register(nick, resume);
    let service = session.config().auth.service.clone();
    session.privmsg(&service, &format!("STATUS {nick}")).await
}

/// Untrusted NOTICE handler that resumes auth continuations from services
/// STATUS replies (`STATUS <nick> <level>`).
pub struct StatusReplyHandler {
    pattern: Regex,
}

impl StatusReplyHandler {
    /// Create the handler.
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^STATUS (\S+) (\d)$").expect("valid STATUS pattern"),
        }
    }
}

impl Default for StatusReplyHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for StatusReplyHandler {
    async fn handle(&self, session: &Arc<Session>, msg: &Message) -> HandlerResult {
        // Only notices from the configured services nick carry STATUS replies.
        let service = &session.config().auth.service;
        let from_service = msg
            .prefix
            .as_ref()
            .and_then(Prefix::nick)
            .is_some_and(|nick| nick.eq_ignore_ascii_case(service));
        if !from_service {
            return Ok(());
        }

        let Some(text) = msg.args.last() else {
            return Ok(());
        };
        let Some(caps) = self.pattern.captures(text) else {
            return Ok(());
        };

        let nick = &caps[1];
        let level: u8 = caps[2].parse().unwrap_or(0);
        let confirmed = level >= session.config().auth.required_level;
        debug!(nick = %nick, level = level, confirmed = confirmed, "services status reply");

        if let Err(e) = session.continuations.resume(nick, confirmed).await {
            // A STATUS reply nobody asked for is not an error worth more
            // than a debug line.
            debug!(error = %e, "unsolicited status reply");
        }
        Ok(())
    }
}
