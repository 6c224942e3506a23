use std::sync::Arc;

use statsdaemon_log::LogError;
use statsdaemon_metrics::Aggregator;
use tokio::net::UdpSocket;
use tokio::sync::watch;

/// Reads datagrams from a shared UDP socket into the aggregator.
///
/// Multiple receivers may share one socket, each datagram is delivered to exactly one of them.
#[derive(Debug)]
pub struct Receiver {
    socket: Arc<UdpSocket>,
    aggregator: Arc<Aggregator>,
    max_packet_size: usize,
}

impl Receiver {
    pub fn new(
        socket: Arc<UdpSocket>,
        aggregator: Arc<Aggregator>,
        max_packet_size: usize,
    ) -> Self {
        Self {
            socket,
            aggregator,
            max_packet_size,
        }
    }

    /// Receives datagrams until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut buf = vec![0; self.max_packet_size];

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                result = self.socket.recv_from(&mut buf) => match result {
                    Ok((len, peer)) => {
                        let inserted = self.aggregator.insert_packet(&buf[..len]);
                        statsdaemon_log::trace!(%peer, bytes = len, inserted, "received packet");
                    }
                    Err(error) => {
                        statsdaemon_log::error!(
                            error = &error as &dyn std::error::Error,
                            "failed to receive packet: {}",
                            LogError(&error)
                        );
                    }
                },
            }
        }

        statsdaemon_log::debug!("receiver stopped");
    }
}
