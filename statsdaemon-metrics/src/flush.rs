use std::fmt::{self, Write as _};
use std::future::Future;
use std::io;

use hashbrown::{HashMap, HashSet};
use thiserror::Error;

use crate::naming::MetricName;
use crate::percentile::Percentile;
use crate::protocol::ValueType;
use crate::stats::{PercentileStats, TimerStats};
use crate::store::TimerSamples;
use crate::UnixTimestamp;

/// A destination for flushed batches.
///
/// The aggregator hands the full batch of a flush cycle to [`Output::write_batch`] exactly once.
/// Empty batches are not written.
pub trait Output {
    /// Writes the batch and returns the number of bytes written.
    fn write_batch(&mut self, batch: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

impl Output for Vec<u8> {
    async fn write_batch(&mut self, batch: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(batch);
        Ok(batch.len())
    }
}

/// An error returned by [`Aggregator::flush_to`](crate::Aggregator::flush_to).
///
/// The drained state is lost on error, flushes are not retried.
#[derive(Debug, Error)]
pub enum FlushError {
    /// The output failed to accept the batch.
    #[error("failed to write batch of {lines} lines")]
    Output {
        /// The number of lines in the dropped batch.
        lines: usize,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Statistics of a completed flush.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FlushSummary {
    /// The timestamp of all lines in the batch.
    pub timestamp: UnixTimestamp,
    /// Lines emitted for counters, including derived rates.
    pub counters: usize,
    /// Lines emitted for gauges.
    pub gauges: usize,
    /// Lines emitted for timers, including derived packet series.
    pub timers: usize,
    /// Lines emitted for sets.
    pub sets: usize,
    /// Bytes accepted by the output.
    pub bytes: usize,
}

impl FlushSummary {
    /// Returns the total number of lines.
    pub fn lines(&self) -> usize {
        self.counters + self.gauges + self.timers + self.sets
    }
}

/// Formatted output of one flush cycle in the Graphite plaintext protocol.
///
/// Every line has the form `<bucket> <value> <timestamp>`, with values rendered in fixed-point
/// notation with six fractional digits.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    timestamp: UnixTimestamp,
    data: String,
    summary: FlushSummary,
}

impl Batch {
    /// Creates an empty batch for lines with the given timestamp.
    pub fn new(timestamp: UnixTimestamp) -> Self {
        Self {
            timestamp,
            data: String::new(),
            summary: FlushSummary {
                timestamp,
                ..Default::default()
            },
        }
    }

    /// Returns the timestamp of all lines.
    pub fn timestamp(&self) -> UnixTimestamp {
        self.timestamp
    }

    /// Returns the formatted lines.
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Returns the formatted lines as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Returns the number of lines per store.
    pub fn summary(&self) -> FlushSummary {
        self.summary
    }

    /// Returns the total number of lines.
    pub fn lines(&self) -> usize {
        self.summary.lines()
    }

    /// Returns `true` if the batch has no lines.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn line(&mut self, name: impl fmt::Display, value: ValueType) {
        // Writing into a `String` is infallible.
        writeln!(self.data, "{name} {value:.6} {}", self.timestamp).ok();
    }

    fn stat(&mut self, bucket: &str, tagged: bool, stat: fmt::Arguments<'_>, value: ValueType) {
        if tagged {
            self.line(format_args!("{bucket}.stat={stat}"), value);
        } else {
            self.line(format_args!("{bucket}.{stat}"), value);
        }
    }

    /// Formats all counters and their derived rates. Returns the number of lines.
    pub(crate) fn push_counters(
        &mut self,
        counters: HashMap<String, ValueType>,
        interval: ValueType,
    ) -> usize {
        let mut lines = 0;

        for (bucket, value) in counters {
            self.line(&bucket, value);
            lines += 1;

            if let Some(rate) = MetricName::new(&bucket).counter_rate() {
                self.line(rate, value / interval);
                lines += 1;
            }
        }

        self.summary.counters += lines;
        lines
    }

    /// Formats all gauges. Returns the number of lines.
    pub(crate) fn push_gauges(&mut self, gauges: HashMap<String, ValueType>) -> usize {
        for (bucket, value) in &gauges {
            self.line(bucket, *value);
        }

        self.summary.gauges += gauges.len();
        gauges.len()
    }

    /// Formats the statistics of all timers. Returns the number of lines.
    pub(crate) fn push_timers(
        &mut self,
        timers: HashMap<String, TimerSamples>,
        percentiles: &[Percentile],
        interval: ValueType,
    ) -> usize {
        let start = self.data.len();
        let mut lines = 0;

        for (bucket, mut timer) in timers {
            let Some(stats) = TimerStats::compute(&mut timer.samples, percentiles) else {
                continue;
            };

            lines += self.push_timer(&bucket, &stats, timer.packets, interval);
        }

        debug_assert_eq!(self.data[start..].lines().count(), lines);
        self.summary.timers += lines;
        lines
    }

    fn push_timer(
        &mut self,
        bucket: &str,
        stats: &TimerStats,
        packets: ValueType,
        interval: ValueType,
    ) -> usize {
        let name = MetricName::new(bucket);
        let tagged = name.is_tagged_timer();
        let mut lines = 0;

        for percentile in &stats.percentiles {
            match percentile {
                PercentileStats::Upper {
                    label,
                    upper,
                    mean,
                    sum,
                } => {
                    self.stat(bucket, tagged, format_args!("upper_{label}"), *upper);
                    self.stat(bucket, tagged, format_args!("mean_{label}"), *mean);
                    self.stat(bucket, tagged, format_args!("sum_{label}"), *sum);
                    lines += 3;
                }
                PercentileStats::Lower { label, lower } => {
                    self.stat(bucket, tagged, format_args!("lower_{label}"), *lower);
                    lines += 1;
                }
            }
        }

        self.stat(bucket, tagged, format_args!("mean"), stats.mean);
        self.stat(bucket, tagged, format_args!("median"), stats.median);
        self.stat(bucket, tagged, format_args!("std"), stats.std);
        self.stat(bucket, tagged, format_args!("sum"), stats.sum);
        self.stat(bucket, tagged, format_args!("upper"), stats.max);
        self.stat(bucket, tagged, format_args!("lower"), stats.min);
        lines += 6;

        match (name.packet_count(), name.packet_rate()) {
            (Some(count), Some(rate)) => {
                self.line(count, packets);
                self.line(rate, packets / interval);
            }
            _ => {
                self.stat(bucket, tagged, format_args!("count"), packets);
                self.stat(bucket, tagged, format_args!("count_ps"), packets / interval);
            }
        }

        lines + 2
    }

    /// Formats the unique count of all sets. Returns the number of lines.
    pub(crate) fn push_sets(&mut self, sets: HashMap<String, HashSet<u64>>) -> usize {
        for (bucket, values) in &sets {
            self.line(bucket, values.len() as ValueType);
        }

        self.summary.sets += sets.len();
        sets.len()
    }

    pub(crate) fn set_bytes(&mut self, bytes: usize) {
        self.summary.bytes = bytes;
    }
}
