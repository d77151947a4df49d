//! Infobot - per-nick info records backed by SQLite.
//!
//! Users record a line about themselves with `!add`, and anyone can look
//! it up with `!info <nick>` (replied as a notice) or `@info <nick>`
//! (replied into the channel). Earlier entries stay around: `!infohist`
//! lists them and `!inforestore <n>` re-sets a previous one. Mutations are
//! auth-gated the same way as the privileged chat commands.
//!
//! The command marker comes from the configured prefix; the `@` channel
//! sigil on lookups is fixed.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use regex::Regex;
use tracing::debug;

use skylark_proto::{Message, Prefix};

use crate::db::{Database, InfoRepository};
use crate::error::HandlerResult;
use crate::state::Session;

use super::{Handler, auth::wait_for_auth};

/// History entries shown per `infohist` request.
const HISTORY_PAGE: usize = 6;

/// Untrusted PRIVMSG handler for the info database.
pub struct InfobotHandler {
    repo: InfoRepository,
    prefix: String,
    add: Regex,
    append: Regex,
    del: Regex,
    lookup: Regex,
    hist: Regex,
    restore: Regex,
}

impl InfobotHandler {
    /// Create the handler over `db`, using `prefix` as the command marker.
    pub fn new(db: &Database, prefix: &str) -> Self {
        let p = regex::escape(prefix);
        Self {
            repo: db.info(),
            prefix: prefix.to_string(),
            add: Regex::new(&format!(r"^{p}add\s+(.+)$")).expect("valid add pattern"),
            append: Regex::new(&format!(r"^{p}append\s+(.+)$")).expect("valid append pattern"),
            del: Regex::new(&format!(r"^{p}del$")).expect("valid del pattern"),
            lookup: Regex::new(&format!(r"^({p}|@)info(?:\s+(\S+))?$"))
                .expect("valid info pattern"),
            hist: Regex::new(&format!(r"^{p}infohist(?:\s+(\d+))?$"))
                .expect("valid infohist pattern"),
            restore: Regex::new(&format!(r"^{p}inforestore(?:\s+(\S+))?$"))
                .expect("valid inforestore pattern"),
        }
    }

    async fn lookup_reply(
        &self,
        session: &Arc<Session>,
        requester: &str,
        channel: &str,
        sigil: &str,
        nick: &str,
    ) -> HandlerResult {
        let text = match self.repo.get(nick).await? {
            Some(info) => format!("{nick}: {info}"),
            None => format!(
                "No info found for {nick}. Use '{}add <info>' to add your info.",
                self.prefix
            ),
        };
        // '@' answers into the channel, the command prefix answers the
        // requester only.
        if sigil == "@" && channel.starts_with('#') {
            session.privmsg(channel, &text).await
        } else {
            session.notice(requester, &text).await
        }
    }

    /// Notice the requester their history page, newest first, numbered so
    /// the indices line up with `inforestore`.
    async fn history_reply(
        &self,
        session: &Arc<Session>,
        nick: &str,
        offset: usize,
    ) -> HandlerResult {
        let entries = self.repo.history(nick, (offset + HISTORY_PAGE) as i64).await?;
        if entries.len() <= offset {
            return session
                .notice(nick, &format!("No info found for {nick}."))
                .await;
        }
        for (n, info) in entries.iter().enumerate().skip(offset) {
            session
                .notice(nick, &format!("#{n}: {nick}: {info}"))
                .await?;
        }
        Ok(())
    }

    async fn gated_write(
        &self,
        session: &Arc<Session>,
        nick: &str,
        action: Box<dyn FnOnce(InfoRepository, Arc<Session>) -> BoxFuture<'static, ()> + Send>,
    ) -> HandlerResult {
        let repo = self.repo.clone();
        let session2 = Arc::clone(session);
        let requester = nick.to_string();
        wait_for_auth(
            session,
            nick,
            Box::new(move |confirmed| {
                Box::pin(async move {
                    if confirmed {
                        action(repo, session2).await;
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
}

#[async_trait]
impl Handler for InfobotHandler {
    async fn handle(&self, session: &Arc<Session>, msg: &Message) -> HandlerResult {
        let (Some(channel), Some(text)) = (msg.arg(0), msg.arg(1)) else {
            return Ok(());
        };
        let Some(Prefix::User { nick, user, host }) = msg.prefix.clone() else {
            return Ok(());
        };

        if let Some(caps) = self.lookup.captures(text) {
            let sigil = caps[1].to_string();
            let target = caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| nick.clone());
            return self
                .lookup_reply(session, &nick, channel, &sigil, &target)
                .await;
        }

        if let Some(caps) = self.hist.captures(text) {
            let offset = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            return self.history_reply(session, &nick, offset).await;
        }

        if let Some(caps) = self.restore.captures(text) {
            let n: usize = match caps.get(1).and_then(|m| m.as_str().parse().ok()) {
                Some(n) if n > 0 => n,
                _ => {
                    // Entry #0 is the current info; restoring it is a no-op.
                    return session
                        .notice(&nick, &format!("Usage: {}inforestore <n>", self.prefix))
                        .await;
                }
            };
            let requester = nick.clone();
            return self
                .gated_write(
                    session,
                    &nick,
                    Box::new(move |repo, session| {
                        Box::pin(async move {
                            let entries = match repo.history(&requester, (n + 1) as i64).await {
                                Ok(entries) => entries,
                                Err(_) => return,
                            };
                            let Some(info) = entries.into_iter().nth(n) else {
                                let _ = session
                                    .notice(&requester, &format!("No history entry #{n}."))
                                    .await;
                                return;
                            };
                            if repo.set(&requester, &user, &host, &info).await.is_ok() {
                                let _ = session
                                    .notice(&requester, &format!("Info set to '{info}'"))
                                    .await;
                            }
                        })
                    }),
                )
                .await;
        }

        if let Some(caps) = self.add.captures(text) {
            let info = caps[1].trim().to_string();
            debug!(nick = %nick, "info add");
            let requester = nick.clone();
            return self
                .gated_write(
                    session,
                    &nick,
                    Box::new(move |repo, session| {
                        Box::pin(async move {
                            if repo.set(&requester, &user, &host, &info).await.is_ok() {
                                let _ = session
                                    .notice(&requester, &format!("Info set to '{info}'"))
                                    .await;
                            }
                        })
                    }),
                )
                .await;
        }

        if let Some(caps) = self.append.captures(text) {
            let extra = caps[1].trim().to_string();
            let requester = nick.clone();
            return self
                .gated_write(
                    session,
                    &nick,
                    Box::new(move |repo, session| {
                        Box::pin(async move {
                            let info = match repo.get(&requester).await {
                                Ok(Some(current)) => format!("{current} | {extra}"),
                                Ok(None) => extra,
                                Err(_) => return,
                            };
                            if repo.set(&requester, &user, &host, &info).await.is_ok() {
                                let _ = session
                                    .notice(&requester, &format!("Info set to '{info}'"))
                                    .await;
                            }
                        })
                    }),
                )
                .await;
        }

        if self.del.is_match(text) {
            let requester = nick.clone();
            return self
                .gated_write(
                    session,
                    &nick,
                    Box::new(move |repo, session| {
                        Box::pin(async move {
                            if let Ok(removed) = repo.delete(&requester).await {
                                let reply = if removed > 0 {
                                    "Info deleted."
                                } else {
                                    "You had no info to delete."
                                };
                                let _ = session.notice(&requester, reply).await;
                            }
                        })
                    }),
                )
                .await;
        }

        Ok(())
    }
}
