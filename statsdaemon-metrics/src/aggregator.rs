use std::time::Duration;

use statsdaemon_common::UnixTimestamp;

use crate::flush::{Batch, FlushError, FlushSummary, Output};
use crate::percentile::Percentile;
use crate::protocol::{Metric, Modifier, ValueType};
use crate::store::{Counters, Gauges, Sets, Timers};

/// Parameters used by the [`Aggregator`].
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatorConfig {
    /// The time between two flushes.
    ///
    /// Rates and per-second series are computed against this interval.
    pub flush_interval: Duration,

    /// Percentiles computed for every timer bucket.
    pub percentiles: Vec<Percentile>,

    /// Prefix of internally generated buckets, such as the invalid line counter.
    pub prefix_internal: String,
}

impl AggregatorConfig {
    /// Returns the flush interval in fractional seconds.
    pub fn interval_secs(&self) -> ValueType {
        self.flush_interval.as_secs_f64()
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(10),
            percentiles: vec![Percentile::Upper {
                rank: 90,
                label: "90".to_owned(),
            }],
            prefix_internal: "statsdaemon".to_owned(),
        }
    }
}

/// Aggregates metrics in memory until they are flushed.
///
/// The aggregator owns one store per [`Modifier`], each guarded by its own lock. Any number of
/// receivers may call [`insert`](Self::insert) concurrently through a shared reference, while a
/// single flush cycle periodically calls [`flush_to`](Self::flush_to).
///
/// # Example
///
/// ```
/// use statsdaemon_metrics::{Aggregator, AggregatorConfig, UnixTimestamp};
///
/// let aggregator = Aggregator::new(AggregatorConfig::default());
/// aggregator.insert_packet(b"endpoint.hits:1|c\nendpoint.hits:2|c");
///
/// let batch = aggregator.flush(UnixTimestamp::from_secs(4711));
/// assert_eq!(batch.as_str(), "endpoint.hits 3.000000 4711\n");
/// ```
#[derive(Debug, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
    counters: Counters,
    gauges: Gauges,
    timers: Timers,
    sets: Sets,
}

impl Aggregator {
    /// Creates a new aggregator with empty stores.
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Returns the configuration of this aggregator.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Returns the counter store.
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Returns the gauge store.
    pub fn gauges(&self) -> &Gauges {
        &self.gauges
    }

    /// Returns the timer store.
    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Returns the set store.
    pub fn sets(&self) -> &Sets {
        &self.sets
    }

    /// Adds a single metric to the store selected by its modifier.
    pub fn insert(&self, metric: &Metric) {
        match metric.modifier {
            Modifier::Counter => self.counters.add(metric),
            Modifier::Gauge => self.gauges.add(metric),
            Modifier::Timer => self.timers.add(metric),
            Modifier::Set => self.sets.add(metric),
        }
    }

    /// Parses a datagram and inserts all of its metrics.
    ///
    /// Malformed lines increment the invalid line counter. Returns the number of inserted metrics.
    pub fn insert_packet(&self, packet: &[u8]) -> usize {
        let mut count = 0;
        for metric in Metric::parse_all(packet, &self.config.prefix_internal) {
            self.insert(&metric);
            count += 1;
        }
        count
    }

    /// Drains all stores and formats their contents.
    ///
    /// Counters, timers and sets are reset. Gauges are reported with their current value and kept.
    /// Every line in the batch carries the given timestamp.
    pub fn flush(&self, timestamp: UnixTimestamp) -> Batch {
        let interval = self.config.interval_secs();
        let mut batch = Batch::new(timestamp);

        batch.push_counters(self.counters.take(), interval);
        batch.push_gauges(self.gauges.snapshot());
        batch.push_timers(self.timers.take(), &self.config.percentiles, interval);
        batch.push_sets(self.sets.take());

        batch
    }

    /// Drains all stores and writes the batch to the output.
    ///
    /// Nothing is written if the batch is empty. On error, the drained state is lost.
    pub async fn flush_to<O>(
        &self,
        timestamp: UnixTimestamp,
        output: &mut O,
    ) -> Result<FlushSummary, FlushError>
    where
        O: Output,
    {
        let mut batch = self.flush(timestamp);

        if !batch.is_empty() {
            let bytes = output
                .write_batch(batch.as_bytes())
                .await
                .map_err(|source| FlushError::Output {
                    lines: batch.lines(),
                    source,
                })?;
            batch.set_bytes(bytes);
        }

        let summary = batch.summary();
        statsdaemon_log::debug!(
            timestamp = summary.timestamp.as_secs(),
            counters = summary.counters,
            gauges = summary.gauges,
            timers = summary.timers,
            sets = summary.sets,
            bytes = summary.bytes,
            "flushed {} lines",
            summary.lines(),
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_lines(batch: &Batch) -> Vec<&str> {
        let mut lines: Vec<&str> = batch.as_str().lines().collect();
        lines.sort_unstable();
        lines
    }

    #[test]
    fn test_insert_dispatch() {
        let aggregator = Aggregator::default();
        let count = aggregator.insert_packet(b"c:1|c\ng:1|g\nt:1|ms\ns:1|s");

        assert_eq!(count, 4);
        assert_eq!(aggregator.counters().len(), 1);
        assert_eq!(aggregator.gauges().len(), 1);
        assert_eq!(aggregator.timers().len(), 1);
        assert_eq!(aggregator.sets().len(), 1);
    }

    #[test]
    fn test_insert_invalid_line() {
        let aggregator = Aggregator::default();
        aggregator.insert_packet(b"bogus\nbogus\nfoo:1|c");

        let batch = aggregator.flush(UnixTimestamp::from_secs(4711));
        insta::assert_debug_snapshot!(sorted_lines(&batch), @r###"
        [
            "foo 1.000000 4711",
            "statsdaemon.target_type=count.type=invalid_line.unit=Err 2.000000 4711",
            "statsdaemon.target_type=rate.type=invalid_line.unit=Errps 0.200000 4711",
        ]
        "###);
    }

    #[test]
    fn test_flush_counts_lines() {
        let aggregator = Aggregator::default();
        aggregator.insert_packet(b"c:1|c\ng:1|g\nt:1|ms\ns:1|s\ns:2|s");

        let batch = aggregator.flush(UnixTimestamp::from_secs(4711));
        let summary = batch.summary();

        assert_eq!(summary.counters, 1);
        assert_eq!(summary.gauges, 1);
        // Three for `upper_90`, six summary statistics, `count` and `count_ps`.
        assert_eq!(summary.timers, 11);
        assert_eq!(summary.sets, 1);
        assert_eq!(batch.lines(), batch.as_str().lines().count());
    }

    #[test]
    fn test_interval_secs() {
        let config = AggregatorConfig {
            flush_interval: Duration::from_millis(2500),
            ..Default::default()
        };
        assert_eq!(config.interval_secs(), 2.5);
    }
}
