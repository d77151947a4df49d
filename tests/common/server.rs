//! Fake IRC server for integration tests.
//!
//! Binds an ephemeral port, accepts the bot's connection, and speaks the
//! line protocol through the same codec the bot uses.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, FramedWrite};

use skylark_proto::LineCodec;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A listening fake server.
pub struct TestServer {
    listener: TcpListener,
    port: u16,
}

impl TestServer {
    /// Bind to an ephemeral port on localhost.
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    /// The port the server listens on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Accept the bot's connection.
    pub async fn accept(&self) -> anyhow::Result<Peer> {
        let (stream, _) = tokio::time::timeout(RECV_TIMEOUT, self.listener.accept()).await??;
        Ok(Peer::new(stream))
    }
}

/// The server side of one accepted connection.
pub struct Peer {
    reader: FramedRead<OwnedReadHalf, LineCodec>,
    writer: FramedWrite<OwnedWriteHalf, LineCodec>,
}

impl Peer {
    fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: FramedRead::new(read_half, LineCodec::new()),
            writer: FramedWrite::new(write_half, LineCodec::new()),
        }
    }

    /// Send one line to the bot.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.send(line.to_string()).await?;
        Ok(())
    }

    /// Receive one line from the bot, or fail after a timeout.
    pub async fn recv_line(&mut self) -> anyhow::Result<String> {
        match tokio::time::timeout(RECV_TIMEOUT, self.reader.next()).await? {
            Some(line) => Ok(line?),
            None => anyhow::bail!("bot closed the connection"),
        }
    }

    /// Receive lines until one satisfies `predicate`, returning that line.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<String>
    where
        F: FnMut(&str) -> bool,
    {
        loop {
            let line = self.recv_line().await?;
            if predicate(&line) {
                return Ok(line);
            }
        }
    }

    /// True once the bot has closed its side of the connection.
    pub async fn closed(&mut self) -> bool {
        matches!(
            tokio::time::timeout(RECV_TIMEOUT, self.reader.next()).await,
            Ok(None)
        )
    }

    /// Drain the bot's registration lines and complete it with the
    /// end-of-MOTD numeric.
    pub async fn complete_registration(&mut self) -> anyhow::Result<()> {
        self.recv_until(|line| line.starts_with("USER ")).await?;
        self.send_line(":irc.test 376 sky :End of /MOTD command.")
            .await
    }
}
