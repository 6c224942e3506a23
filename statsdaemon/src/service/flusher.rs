use std::sync::Arc;
use std::time::Duration;

use statsdaemon_log::LogError;
use statsdaemon_metrics::{Aggregator, Output, UnixTimestamp};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Periodically drains the aggregator into an output.
#[derive(Debug)]
pub struct Flusher<O> {
    aggregator: Arc<Aggregator>,
    output: O,
    interval: Duration,
}

impl<O: Output> Flusher<O> {
    pub fn new(aggregator: Arc<Aggregator>, output: O, interval: Duration) -> Self {
        Self {
            aggregator,
            output,
            interval,
        }
    }

    /// Flushes on every interval until shutdown, then flushes one final time.
    ///
    /// Returns the output so callers can inspect what was written.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> O {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => self.flush().await,
            }
        }

        statsdaemon_log::debug!("performing final flush");
        self.flush().await;
        self.output
    }

    async fn flush(&mut self) {
        let timestamp = UnixTimestamp::now();
        if let Err(error) = self.aggregator.flush_to(timestamp, &mut self.output).await {
            statsdaemon_log::error!(
                error = &error as &dyn std::error::Error,
                "flush failed: {}",
                LogError(&error)
            );
        }
    }
}
