//! Transports for flushed batches.

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use statsdaemon_config::{Config, OutputMode};
use statsdaemon_metrics::Output;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Maximum time to establish a connection to the Graphite server.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Writes batches to a Graphite server using the plaintext protocol.
///
/// A new connection is opened for every batch and closed once the batch has been written.
#[derive(Debug)]
pub struct Graphite {
    addr: String,
}

impl Graphite {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    async fn connect(&self) -> io::Result<TcpStream> {
        match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.addr)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("timed out connecting to {}", self.addr),
            )),
        }
    }
}

impl Output for Graphite {
    async fn write_batch(&mut self, batch: &[u8]) -> io::Result<usize> {
        let mut stream = self.connect().await?;
        stream.write_all(batch).await?;
        stream.shutdown().await?;
        Ok(batch.len())
    }
}

/// Writes batches to standard output.
#[derive(Debug, Default)]
pub struct Stdout;

impl Output for Stdout {
    async fn write_batch(&mut self, batch: &[u8]) -> io::Result<usize> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(batch).await?;
        stdout.flush().await?;
        Ok(batch.len())
    }
}

/// Appends batches to a file.
#[derive(Debug)]
pub struct FileOutput {
    file: File,
}

impl FileOutput {
    /// Opens the file for appending, creating it if it does not exist.
    pub async fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        Ok(Self { file })
    }
}

impl Output for FileOutput {
    async fn write_batch(&mut self, batch: &[u8]) -> io::Result<usize> {
        self.file.write_all(batch).await?;
        self.file.flush().await?;
        Ok(batch.len())
    }
}

/// Drops all batches.
#[derive(Debug, Default)]
pub struct Discard;

impl Output for Discard {
    async fn write_batch(&mut self, batch: &[u8]) -> io::Result<usize> {
        Ok(batch.len())
    }
}

/// The output selected by [`OutputMode`].
#[derive(Debug)]
pub enum AnyOutput {
    Graphite(Graphite),
    Stdout(Stdout),
    File(FileOutput),
    Discard(Discard),
}

impl AnyOutput {
    /// Creates the output configured in `config`.
    ///
    /// File outputs are opened eagerly so that a bad path fails on startup.
    pub async fn from_config(config: &Config) -> Result<Self> {
        Ok(match config.output_mode() {
            OutputMode::Graphite => Self::Graphite(Graphite::new(config.graphite_addr())),
            OutputMode::Stdout => Self::Stdout(Stdout),
            OutputMode::Discard => Self::Discard(Discard),
            OutputMode::File => {
                let path = config
                    .output_path()
                    .context("output path is required for file output")?;
                let output = FileOutput::open(path)
                    .await
                    .with_context(|| format!("failed to open {}", path.display()))?;
                Self::File(output)
            }
        })
    }
}

impl Output for AnyOutput {
    async fn write_batch(&mut self, batch: &[u8]) -> io::Result<usize> {
        match self {
            Self::Graphite(output) => output.write_batch(batch).await,
            Self::Stdout(output) => output.write_batch(batch).await,
            Self::File(output) => output.write_batch(batch).await,
            Self::Discard(output) => output.write_batch(batch).await,
        }
    }
}
