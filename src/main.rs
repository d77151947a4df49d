//! skylark binary entry point.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skylark::config::Config;
use skylark::db::Database;
use skylark::handlers::{
    AutojoinHandler, CommandRouter, InfobotHandler, Registry, StatusReplyHandler, Trust,
};
use skylark::network::{Connection, WELCOME_CODES};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;
    info!(config = %config_path, server = %config.server.host, "starting skylark");

    let db_path = config
        .database
        .as_ref()
        .map(|db| db.path.clone())
        .unwrap_or_else(|| "skylark.db".to_string());
    let db = Database::new(&db_path)
        .await
        .with_context(|| format!("opening database at {db_path}"))?;

    let mut registry = Registry::new();
    for code in WELCOME_CODES {
        registry.register(code, Arc::new(AutojoinHandler), Trust::Untrusted);
    }
    registry.register("NOTICE", Arc::new(StatusReplyHandler::new()), Trust::Untrusted);
    registry.register(
        "PRIVMSG",
        Arc::new(CommandRouter::new(&config.commands.prefix)),
        Trust::Untrusted,
    );
    registry.register(
        "PRIVMSG",
        Arc::new(InfobotHandler::new(&db, &config.commands.prefix)),
        Trust::Untrusted,
    );

    let (connection, _session) = Connection::new(config, registry);
    connection.run().await
}
