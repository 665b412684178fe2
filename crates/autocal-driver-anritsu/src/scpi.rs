//! SCPI over TCP transport for the signal generator.
//!
//! Commands are newline terminated; every query reads exactly one response
//! line. Stale input is discarded before each query so a late reply to an
//! earlier timed-out query cannot be mistaken for the current answer.

use crate::config::InstrumentConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use autocal_core::InstrumentLink;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Connect timeout for the TCP socket.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause after each write so the instrument can parse the command.
const COMMAND_DELAY: Duration = Duration::from_millis(10);

/// Async SCPI client over a raw TCP socket.
pub struct ScpiClient {
    stream: Mutex<Option<BufReader<TcpStream>>>,
    timeout: Duration,
    peer: String,
}

impl ScpiClient {
    /// Open a connection to the instrument described by `config`.
    pub async fn connect(config: &InstrumentConfig) -> Result<Self> {
        let peer = format!("{}:{}", config.host, config.port);

        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&peer))
            .await
            .with_context(|| format!("Connection timeout to {}", peer))?
            .with_context(|| format!("Failed to connect to {}", peer))?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        tracing::info!("Connected to signal generator at {}", peer);

        Ok(Self {
            stream: Mutex::new(Some(BufReader::new(stream))),
            timeout: config.timeout,
            peer,
        })
    }

    /// Address of the connected instrument.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    async fn send_line(stream: &mut BufReader<TcpStream>, line: &str) -> Result<()> {
        let framed = format!("{}\n", line);
        stream
            .get_mut()
            .write_all(framed.as_bytes())
            .await
            .with_context(|| format!("Failed to write: {}", line))?;
        stream
            .get_mut()
            .flush()
            .await
            .context("Failed to flush stream")
    }

    /// Drop buffered and pending bytes left over from earlier exchanges.
    fn discard_stale_input(stream: &mut BufReader<TcpStream>) {
        let buffered = stream.buffer().len();
        if buffered > 0 {
            tracing::debug!("Discarding {} buffered bytes", buffered);
            stream.consume(buffered);
        }

        let mut scratch = [0u8; 256];
        loop {
            match stream.get_mut().try_read(&mut scratch) {
                Ok(0) | Err(_) => break,
                Ok(n) => tracing::debug!("Discarded {} stale bytes", n),
            }
        }
    }
}

#[async_trait]
impl InstrumentLink for ScpiClient {
    async fn write(&self, command: &str) -> Result<()> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .with_context(|| format!("Connection to {} is closed", self.peer))?;

        tracing::debug!("SCPI write: {:?}", command);
        Self::send_line(stream, command).await?;

        tokio::time::sleep(COMMAND_DELAY).await;
        Ok(())
    }

    async fn query(&self, command: &str) -> Result<String> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .with_context(|| format!("Connection to {} is closed", self.peer))?;

        Self::discard_stale_input(stream);

        tracing::debug!("SCPI query: {:?}", command);
        Self::send_line(stream, command).await?;

        let mut response = String::new();
        match timeout(self.timeout, stream.read_line(&mut response)).await {
            Ok(Ok(0)) => anyhow::bail!("Connection closed by {}", self.peer),
            Ok(Ok(_)) => {
                let trimmed = response.trim().to_string();
                tracing::debug!("SCPI response: {:?}", trimmed);
                Ok(trimmed)
            }
            Ok(Err(e)) => Err(e).context("Failed to read response"),
            Err(_) => anyhow::bail!("Timeout waiting for response to: {}", command),
        }
    }

    async fn close(&self) -> Result<()> {
        if let Some(mut stream) = self.stream.lock().await.take() {
            stream
                .get_mut()
                .shutdown()
                .await
                .with_context(|| format!("Failed to shut down connection to {}", self.peer))?;
            tracing::info!("Closed connection to {}", self.peer);
        }
        Ok(())
    }
}
