//! Integration test common infrastructure.
//!
//! Provides an in-process fake IRC server to accept the bot's connection,
//! plus helpers for building configs and spawning the bot.

#![allow(dead_code)]

pub mod server;

pub use server::{Peer, TestServer};

use std::sync::Arc;

use skylark::config::Config;
use skylark::handlers::Registry;
use skylark::network::Connection;
use skylark::state::Session;

/// Config pointing at the fake server on `port`, with no autojoin channels.
pub fn test_config(port: u16) -> Config {
    toml::from_str(&format!(
        r#"
        [server]
        host = "127.0.0.1"
        port = {port}

        [identity]
        nick = "sky"
        realname = "Skylark"
        "#
    ))
    .expect("valid test config")
}

/// Spawn the bot's connection task against `config`.
pub fn spawn_bot(
    config: Config,
    registry: Registry,
) -> (tokio::task::JoinHandle<anyhow::Result<()>>, Arc<Session>) {
    let (connection, session) = Connection::new(config, registry);
    (tokio::spawn(connection.run()), session)
}
