use crate::percentile::Percentile;
use crate::protocol::ValueType;

/// Statistics computed for one percentile of a timer bucket.
#[derive(Clone, Debug, PartialEq)]
pub enum PercentileStats {
    /// Upper-tail statistics over the samples at or below the threshold.
    Upper {
        /// The percentile label.
        label: String,
        /// The sample at the threshold index.
        upper: ValueType,
        /// The mean of all samples at or below the threshold.
        mean: ValueType,
        /// The sum of all samples at or below the threshold.
        sum: ValueType,
    },
    /// The lower-tail statistic.
    Lower {
        /// The percentile label.
        label: String,
        /// The sample at the threshold index, counted from the low end.
        lower: ValueType,
    },
}

/// Summary statistics of the samples collected for one timer bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct TimerStats {
    /// The number of samples.
    pub count: usize,
    /// The smallest sample.
    pub min: ValueType,
    /// The largest sample.
    pub max: ValueType,
    /// The sum of all samples.
    pub sum: ValueType,
    /// The arithmetic mean.
    pub mean: ValueType,
    /// The median. For an even number of samples, the mean of the two middle samples.
    pub median: ValueType,
    /// The population standard deviation.
    pub std: ValueType,
    /// One entry per configured percentile, in configuration order.
    pub percentiles: Vec<PercentileStats>,
}

/// Index of the upper-tail threshold: `ceil(rank / 100 * n) - 1`.
fn upper_index(rank: u8, n: usize) -> usize {
    let ceil = (usize::from(rank) * n).div_ceil(100);
    ceil.saturating_sub(1).min(n - 1)
}

/// Index of the lower-tail threshold: `n - ceil(rank / 100 * n)`.
fn lower_index(rank: u8, n: usize) -> usize {
    let ceil = (usize::from(rank) * n).div_ceil(100);
    n.saturating_sub(ceil).min(n - 1)
}

impl TimerStats {
    /// Computes statistics over the given samples.
    ///
    /// The samples are sorted in place. Returns `None` if there are no samples.
    ///
    /// # Example
    ///
    /// ```
    /// use statsdaemon_metrics::{Percentile, TimerStats};
    ///
    /// let mut samples = vec![30.0, 0.0, 30.0];
    /// let stats = TimerStats::compute(&mut samples, &[]).unwrap();
    /// assert_eq!(stats.mean, 20.0);
    /// assert_eq!(stats.median, 30.0);
    /// ```
    pub fn compute(samples: &mut [ValueType], percentiles: &[Percentile]) -> Option<Self> {
        let n = samples.len();
        if n == 0 {
            return None;
        }

        samples.sort_unstable_by(ValueType::total_cmp);

        let min = samples[0];
        let max = samples[n - 1];
        let sum: ValueType = samples.iter().sum();
        let mean = sum / n as ValueType;

        let mid = n / 2;
        let median = if n % 2 == 0 {
            (samples[mid - 1] + samples[mid]) / 2.0
        } else {
            samples[mid]
        };

        let variance = samples
            .iter()
            .map(|&sample| (sample - mean).powi(2))
            .sum::<ValueType>()
            / n as ValueType;

        let percentiles = percentiles
            .iter()
            .map(|percentile| match percentile {
                Percentile::Upper { rank, label } => {
                    let index = upper_index(*rank, n);
                    let prefix = &samples[..=index];
                    let sum: ValueType = prefix.iter().sum();

                    PercentileStats::Upper {
                        label: label.clone(),
                        upper: samples[index],
                        mean: sum / prefix.len() as ValueType,
                        sum,
                    }
                }
                Percentile::Lower { rank, label } => PercentileStats::Lower {
                    label: label.clone(),
                    lower: samples[lower_index(*rank, n)],
                },
            })
            .collect();

        Some(Self {
            count: n,
            min,
            max,
            sum,
            mean,
            median,
            std: variance.sqrt(),
            percentiles,
        })
    }
}
