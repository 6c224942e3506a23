use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// An error returned when parsing a [`Percentile`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParsePercentileError {
    /// The threshold is not an integer.
    #[error("invalid percentile {0:?}: expected an integer")]
    InvalidNumber(String),
    /// The threshold is `0` or its magnitude is `100` or larger.
    #[error("invalid percentile {0}: must be between -100 and 100, excluding 0")]
    OutOfRange(i64),
}

/// A percentile threshold computed for every timer bucket.
///
/// In configuration, percentiles are written as signed integers. A positive threshold such as `90`
/// computes upper-tail statistics over the lowest 90% of the samples, a negative threshold such as
/// `-75` computes the lower-tail statistic from the opposite end.
///
/// The label used in output names is always the absolute rank, so both `90` and `-90` are reported
/// with the suffix `_90`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Percentile {
    /// Emits `upper_<label>`, `mean_<label>` and `sum_<label>`.
    Upper {
        /// The rank in `1..=99`.
        rank: u8,
        /// The label used in the output name.
        label: String,
    },
    /// Emits `lower_<label>`.
    Lower {
        /// The rank in `1..=99`.
        rank: u8,
        /// The label used in the output name.
        label: String,
    },
}

impl Percentile {
    /// Creates a percentile from its signed threshold.
    ///
    /// # Example
    ///
    /// ```
    /// use statsdaemon_metrics::Percentile;
    ///
    /// let percentile = Percentile::new(-75).unwrap();
    /// assert_eq!(percentile.rank(), 75);
    /// assert_eq!(percentile.label(), "75");
    /// assert!(Percentile::new(0).is_err());
    /// ```
    pub fn new(threshold: i64) -> Result<Self, ParsePercentileError> {
        if threshold == 0 || threshold.abs() >= 100 {
            return Err(ParsePercentileError::OutOfRange(threshold));
        }

        let rank = threshold.unsigned_abs() as u8;
        let label = rank.to_string();

        Ok(if threshold > 0 {
            Self::Upper { rank, label }
        } else {
            Self::Lower { rank, label }
        })
    }

    /// Returns the absolute percentile rank.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Upper { rank, .. } | Self::Lower { rank, .. } => *rank,
        }
    }

    /// Returns the label appended to statistic names.
    pub fn label(&self) -> &str {
        match self {
            Self::Upper { label, .. } | Self::Lower { label, .. } => label,
        }
    }

    /// Returns the signed threshold as written in configuration.
    pub fn threshold(&self) -> i64 {
        match self {
            Self::Upper { rank, .. } => i64::from(*rank),
            Self::Lower { rank, .. } => -i64::from(*rank),
        }
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.threshold())
    }
}

impl FromStr for Percentile {
    type Err = ParsePercentileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let threshold = s
            .trim()
            .parse()
            .map_err(|_| ParsePercentileError::InvalidNumber(s.to_owned()))?;
        Self::new(threshold)
    }
}

statsdaemon_common::impl_str_serde!(Percentile, "a percentile between -100 and 100");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upper() {
        let percentile: Percentile = "90".parse().unwrap();
        assert_eq!(
            percentile,
            Percentile::Upper {
                rank: 90,
                label: "90".to_owned()
            }
        );
        assert_eq!(percentile.to_string(), "90");
    }

    #[test]
    fn test_parse_lower() {
        let percentile: Percentile = "-75".parse().unwrap();
        assert_eq!(
            percentile,
            Percentile::Lower {
                rank: 75,
                label: "75".to_owned()
            }
        );
        assert_eq!(percentile.to_string(), "-75");
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(
            "0".parse::<Percentile>(),
            Err(ParsePercentileError::OutOfRange(0))
        );
        assert_eq!(
            "100".parse::<Percentile>(),
            Err(ParsePercentileError::OutOfRange(100))
        );
        assert_eq!(
            "-100".parse::<Percentile>(),
            Err(ParsePercentileError::OutOfRange(-100))
        );
        assert!(matches!(
            "99.9".parse::<Percentile>(),
            Err(ParsePercentileError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_serde() {
        let percentiles: Vec<Percentile> = serde_json::from_str(r#"["90", -75, 50]"#).unwrap();
        assert_eq!(
            percentiles.iter().map(Percentile::threshold).collect::<Vec<_>>(),
            [90, -75, 50]
        );

        let json = serde_json::to_string(&percentiles).unwrap();
        assert_eq!(json, r#"["90","-75","50"]"#);
    }
}
