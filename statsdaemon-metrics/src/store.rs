use std::mem;

use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;

use crate::protocol::{Metric, ValueType};

/// Accumulated counter values by bucket name.
#[derive(Debug, Default)]
pub struct Counters {
    inner: Mutex<HashMap<String, ValueType>>,
}

impl Counters {
    /// Adds the metric value extrapolated by its sampling rate.
    pub fn add(&self, metric: &Metric) {
        let increment = metric.value / ValueType::from(metric.sampling);
        *self
            .inner
            .lock()
            .entry_ref(metric.bucket.as_str())
            .or_insert(0.0) += increment;
    }

    /// Removes and returns all buckets.
    pub fn take(&self) -> HashMap<String, ValueType> {
        mem::take(&mut *self.inner.lock())
    }

    /// Returns the number of buckets.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if there are no buckets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The last value of every gauge.
///
/// Gauges are never removed. After a flush, the last value remains the baseline for relative
/// updates and is reported again on the next flush.
#[derive(Debug, Default)]
pub struct Gauges {
    inner: Mutex<HashMap<String, ValueType>>,
}

impl Gauges {
    /// Replaces the gauge value, or adjusts it for relative updates.
    ///
    /// A relative update to an unknown gauge starts from `0`.
    pub fn add(&self, metric: &Metric) {
        let mut inner = self.inner.lock();
        let gauge = inner.entry_ref(metric.bucket.as_str()).or_insert(0.0);
        if metric.relative {
            *gauge += metric.value;
        } else {
            *gauge = metric.value;
        }
    }

    /// Returns a copy of all gauges.
    pub fn snapshot(&self) -> HashMap<String, ValueType> {
        self.inner.lock().clone()
    }

    /// Returns the number of buckets.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if there are no buckets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Samples collected for a single timer bucket.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimerSamples {
    /// Every submitted value, unordered.
    pub samples: Vec<ValueType>,
    /// The number of packets, extrapolated by their sampling rate.
    pub packets: ValueType,
}

/// Timer samples by bucket name.
#[derive(Debug, Default)]
pub struct Timers {
    inner: Mutex<HashMap<String, TimerSamples>>,
}

impl Timers {
    /// Appends the sample and counts the packet.
    pub fn add(&self, metric: &Metric) {
        let mut inner = self.inner.lock();
        let timer = inner.entry_ref(metric.bucket.as_str()).or_default();
        timer.samples.push(metric.value);
        timer.packets += 1.0 / ValueType::from(metric.sampling);
    }

    /// Removes and returns all buckets.
    pub fn take(&self) -> HashMap<String, TimerSamples> {
        mem::take(&mut *self.inner.lock())
    }

    /// Returns the number of buckets.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if there are no buckets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unique values by bucket name.
///
/// Values are compared by their bit pattern, with `-0.0` folded into `0.0`.
#[derive(Debug, Default)]
pub struct Sets {
    inner: Mutex<HashMap<String, HashSet<u64>>>,
}

impl Sets {
    /// Inserts the value into the bucket's set.
    pub fn add(&self, metric: &Metric) {
        let value = if metric.value == 0.0 { 0.0 } else { metric.value };
        self.inner
            .lock()
            .entry_ref(metric.bucket.as_str())
            .or_default()
            .insert(value.to_bits());
    }

    /// Removes and returns all buckets.
    pub fn take(&self) -> HashMap<String, HashSet<u64>> {
        mem::take(&mut *self.inner.lock())
    }

    /// Returns the number of buckets.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if there are no buckets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
