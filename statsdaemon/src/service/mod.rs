//! Runtime wiring of receivers and the flusher.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use statsdaemon_config::Config;
use statsdaemon_metrics::Aggregator;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::output::AnyOutput;

mod flusher;
mod receiver;

pub use self::flusher::Flusher;
pub use self::receiver::Receiver;

/// A running daemon.
///
/// Dropping the service without calling [`Service::shutdown`] skips the final flush.
#[derive(Debug)]
pub struct Service {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    receivers: Vec<JoinHandle<()>>,
    flusher: JoinHandle<AnyOutput>,
}

impl Service {
    /// Binds the UDP socket and spawns receivers and the flusher onto the current runtime.
    pub async fn start(config: &Config) -> Result<Self> {
        let aggregator = Arc::new(Aggregator::new(config.aggregator_config()));
        let output = AnyOutput::from_config(config).await?;

        let socket = UdpSocket::bind(config.listen_addr())
            .await
            .with_context(|| format!("failed to bind UDP socket on {}", config.listen_addr()))?;
        let local_addr = socket.local_addr()?;
        let socket = Arc::new(socket);

        let (shutdown, shutdown_rx) = watch::channel(false);

        let receivers = (0..config.receivers())
            .map(|_| {
                let receiver = Receiver::new(
                    Arc::clone(&socket),
                    Arc::clone(&aggregator),
                    config.max_packet_size(),
                );
                tokio::spawn(receiver.run(shutdown_rx.clone()))
            })
            .collect();

        let flusher = Flusher::new(aggregator, output, config.flush_interval());
        let flusher = tokio::spawn(flusher.run(shutdown_rx));

        Ok(Self {
            local_addr,
            shutdown,
            receivers,
            flusher,
        })
    }

    /// Returns the address the UDP socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops all receivers and waits for the final flush to complete.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.send_replace(true);

        for receiver in self.receivers {
            receiver.await.context("receiver task failed")?;
        }

        self.flusher.await.context("flusher task failed")?;
        statsdaemon_log::info!("shutdown complete");
        Ok(())
    }
}

/// Resolves once the process receives `SIGINT` or `SIGTERM`.
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm =
            signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for SIGINT")?;
                statsdaemon_log::info!("received SIGINT, shutting down");
            }
            _ = sigterm.recv() => {
                statsdaemon_log::info!("received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for ctrl-c")?;
        statsdaemon_log::info!("received ctrl-c, shutting down");
    }

    Ok(())
}

/// Runs the daemon until a shutdown signal arrives.
pub fn run(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("statsdaemon")
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async {
        let service = Service::start(&config).await?;
        statsdaemon_log::info!("listening on udp://{}", service.local_addr());
        wait_for_signal().await?;
        service.shutdown().await
    })
}
