use std::fmt;
use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type used for counter increments, gauge values and timer samples.
pub type ValueType = f64;

/// Type used for the sampling rate of a submission.
pub type SamplingType = f32;

/// Bucket name suffix of the counter that tracks malformed lines.
const INVALID_LINE_BUCKET: &str = "target_type=count.type=invalid_line.unit=Err";

/// The modifier of a [`Metric`], determining how its values are aggregated.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Modifier {
    /// Counts instances of an event.
    ///
    /// Counters can be incremented and decremented. Sampled submissions are extrapolated by the
    /// inverse of their sampling rate.
    Counter,
    /// Stores the last reported value.
    ///
    /// Values with an explicit sign are applied relative to the current value.
    Gauge,
    /// Collects individual samples, usually durations in milliseconds.
    ///
    /// At flush time, summary statistics and percentiles are computed over all samples.
    Timer,
    /// Counts the number of unique reported values.
    Set,
}

impl Modifier {
    /// Returns the shortcode for this modifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Counter => "c",
            Modifier::Gauge => "g",
            Modifier::Timer => "ms",
            Modifier::Set => "s",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Modifier {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "c" => Self::Counter,
            "g" => Self::Gauge,
            "ms" => Self::Timer,
            "s" => Self::Set,
            _ => return Err(ParseMetricErrorKind::InvalidModifier.into()),
        })
    }
}

statsdaemon_common::impl_str_serde!(Modifier, "a metric modifier string");

/// An error returned by [`Metric::parse`].
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("failed to parse metric: {kind}")]
pub struct ParseMetricError {
    kind: ParseMetricErrorKind,
}

impl ParseMetricError {
    /// Returns the reason why the line was rejected.
    pub fn kind(&self) -> ParseMetricErrorKind {
        self.kind
    }
}

impl From<ParseMetricErrorKind> for ParseMetricError {
    fn from(kind: ParseMetricErrorKind) -> Self {
        ParseMetricError { kind }
    }
}

/// The reason a line was rejected by the parser.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum ParseMetricErrorKind {
    /// The line is not valid UTF-8.
    #[error("invalid utf-8")]
    InvalidUtf8,
    /// The line does not contain a `:` separating the bucket from the value.
    #[error("missing value")]
    MissingValue,
    /// The bucket name is empty.
    #[error("empty bucket name")]
    EmptyBucket,
    /// The value is not a finite number.
    #[error("invalid value")]
    InvalidValue,
    /// The modifier is missing or unknown.
    #[error("invalid modifier")]
    InvalidModifier,
    /// The sampling rate is not a number in `(0, 1]`.
    #[error("invalid sampling rate")]
    InvalidSampling,
    /// The line carries components after the sampling rate.
    #[error("unexpected trailing component")]
    TrailingComponent,
}

/// Parses a finite float.
///
/// `f64::from_str` accepts `inf` and `NaN`, which are not meaningful aggregation inputs.
fn parse_finite(string: &str) -> Option<ValueType> {
    string.parse::<ValueType>().ok().filter(|v| v.is_finite())
}

/// Parses the value of a metric given its modifier.
///
/// Returns the value and whether it is a relative gauge update.
fn parse_value(string: &str, modifier: Modifier) -> Option<(ValueType, bool)> {
    if modifier == Modifier::Gauge {
        if let Some(rest) = string.strip_prefix('+') {
            return parse_unsigned(rest).map(|v| (v, true));
        } else if let Some(rest) = string.strip_prefix('-') {
            return parse_unsigned(rest).map(|v| (-v, true));
        }
    }

    parse_finite(string).map(|v| (v, false))
}

fn parse_unsigned(string: &str) -> Option<ValueType> {
    if string.starts_with(['+', '-']) {
        return None;
    }
    parse_finite(string)
}

/// Parses the `@<rate>` component of a metric line.
fn parse_sampling(string: &str) -> Option<SamplingType> {
    let rate = string.strip_prefix('@')?.parse::<SamplingType>().ok()?;
    (rate.is_finite() && rate > 0.0 && rate <= 1.0).then_some(rate)
}

/// A single decoded observation sent by a client.
///
/// # Submission Protocol
///
/// ```text
/// <bucket>:<value>|<modifier>[|@<sampling>]
/// ```
///
/// The bucket is everything up to the first `:` and is treated as opaque. An example submission
/// looks like this:
///
/// ```text
/// endpoint.response_time:57|ms
/// endpoint.hits:1|c|@0.5
/// ```
///
/// To parse a datagram with multiple lines, use [`Metric::parse_all`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Metric {
    /// The name of the series this observation belongs to.
    pub bucket: String,

    /// The magnitude of the observation.
    ///
    /// For relative gauge updates, this carries the sign of the submission.
    pub value: ValueType,

    /// Selects how the value is aggregated.
    pub modifier: Modifier,

    /// The sampling rate in `(0, 1]`.
    ///
    /// A submission with a sampling rate of `0.1` represents ten actual events. Defaults to `1`.
    pub sampling: SamplingType,

    /// Whether a gauge value is applied relative to the current value.
    ///
    /// This is only ever set for gauges whose submitted value had an explicit `+` or `-` sign.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub relative: bool,
}

impl Metric {
    /// Creates the counter increment recorded for every malformed line.
    ///
    /// The bucket is `<prefix>.target_type=count.type=invalid_line.unit=Err`. With an empty prefix,
    /// the leading dot is omitted.
    pub fn invalid_line(prefix_internal: &str) -> Self {
        let bucket = if prefix_internal.is_empty() {
            INVALID_LINE_BUCKET.to_owned()
        } else {
            format!("{prefix_internal}.{INVALID_LINE_BUCKET}")
        };

        Self {
            bucket,
            value: 1.0,
            modifier: Modifier::Counter,
            sampling: 1.0,
            relative: false,
        }
    }

    fn parse_str(string: &str) -> Result<Self, ParseMetricError> {
        let (bucket, rest) = string
            .split_once(':')
            .ok_or(ParseMetricErrorKind::MissingValue)?;

        if bucket.is_empty() {
            return Err(ParseMetricErrorKind::EmptyBucket.into());
        }

        let mut components = rest.split('|');
        let raw_value = components.next().unwrap_or_default();
        let modifier = components
            .next()
            .ok_or(ParseMetricErrorKind::InvalidModifier)?
            .parse()?;

        let (value, relative) =
            parse_value(raw_value, modifier).ok_or(ParseMetricErrorKind::InvalidValue)?;

        let sampling = match components.next() {
            Some(component) => {
                parse_sampling(component).ok_or(ParseMetricErrorKind::InvalidSampling)?
            }
            None => 1.0,
        };

        if components.next().is_some() {
            return Err(ParseMetricErrorKind::TrailingComponent.into());
        }

        Ok(Self {
            bucket: bucket.to_owned(),
            value,
            modifier,
            sampling,
            relative,
        })
    }

    /// Parses a single metric line.
    ///
    /// See the [`Metric`] for more information on the protocol. A trailing `\r` is ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use statsdaemon_metrics::{Metric, Modifier};
    ///
    /// let metric = Metric::parse(b"response_time:57|ms").expect("metric should parse");
    /// assert_eq!(metric.modifier, Modifier::Timer);
    /// ```
    pub fn parse(slice: &[u8]) -> Result<Self, ParseMetricError> {
        let string =
            std::str::from_utf8(slice).map_err(|_| ParseMetricErrorKind::InvalidUtf8)?;
        Self::parse_str(string.strip_suffix('\r').unwrap_or(string))
    }

    /// Parses all metric lines of a datagram.
    ///
    /// Returns a metric for each line in `slice`, ignoring empty lines. Both UNIX newlines (`\n`)
    /// and Windows newlines (`\r\n`) are supported.
    ///
    /// This never fails. Every malformed line is replaced with the counter returned by
    /// [`Metric::invalid_line`] for the given `prefix_internal`.
    ///
    /// # Example
    ///
    /// ```
    /// use statsdaemon_metrics::Metric;
    ///
    /// let data = br#"
    /// endpoint.response_time:57|ms
    /// endpoint.hits:1|c
    /// "#;
    ///
    /// for metric in Metric::parse_all(data, "statsdaemon") {
    ///     println!("{}: {}", metric.bucket, metric.value);
    /// }
    /// ```
    pub fn parse_all<'a>(slice: &'a [u8], prefix_internal: &'a str) -> ParseMetrics<'a> {
        ParseMetrics {
            slice,
            prefix_internal,
        }
    }
}

/// Iterator over parsed metrics returned from [`Metric::parse_all`].
#[derive(Clone, Debug, Default)]
pub struct ParseMetrics<'a> {
    slice: &'a [u8],
    prefix_internal: &'a str,
}

impl Iterator for ParseMetrics<'_> {
    type Item = Metric;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.slice.is_empty() {
                return None;
            }

            let mut split = self.slice.splitn(2, |&b| b == b'\n');
            let current = split.next()?;
            self.slice = split.next().unwrap_or_default();

            if current.is_empty() || current == b"\r" {
                continue;
            }

            return Some(match Metric::parse(current) {
                Ok(metric) => metric,
                Err(error) => {
                    statsdaemon_log::debug!(
                        line = %String::from_utf8_lossy(current),
                        "invalid metric line: {}",
                        error.kind(),
                    );
                    Metric::invalid_line(self.prefix_internal)
                }
            });
        }
    }
}

impl FusedIterator for ParseMetrics<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gauge() {
        let metric = Metric::parse(b"gaugor:333|g").unwrap();
        insta::assert_debug_snapshot!(metric, @r###"
        Metric {
            bucket: "gaugor",
            value: 333.0,
            modifier: Gauge,
            sampling: 1.0,
            relative: false,
        }
        "###);
    }

    #[test]
    fn test_parse_counter_sampled() {
        let metric = Metric::parse(b"gorets:2|c|@0.1").unwrap();
        insta::assert_debug_snapshot!(metric, @r###"
        Metric {
            bucket: "gorets",
            value: 2.0,
            modifier: Counter,
            sampling: 0.1,
            relative: false,
        }
        "###);
    }

    #[test]
    fn test_parse_counter_negative() {
        let metric = Metric::parse(b"gorets:-4|c").unwrap();
        assert_eq!(metric.value, -4.0);
        assert_eq!(metric.modifier, Modifier::Counter);
        assert!(!metric.relative);
    }

    #[test]
    fn test_parse_timer() {
        let metric = Metric::parse(b"glork:320|ms").unwrap();
        assert_eq!(metric.bucket, "glork");
        assert_eq!(metric.value, 320.0);
        assert_eq!(metric.modifier, Modifier::Timer);
        assert_eq!(metric.sampling, 1.0);
    }

    #[test]
    fn test_parse_timer_sampled() {
        let metric = Metric::parse(b"glork:320|ms|@0.25").unwrap();
        assert_eq!(metric.sampling, 0.25);
    }

    #[test]
    fn test_parse_set() {
        let metric = Metric::parse(b"uniques:765|s").unwrap();
        assert_eq!(metric.modifier, Modifier::Set);
        assert_eq!(metric.value, 765.0);
    }

    #[test]
    fn test_parse_bucket_with_dash() {
        let metric = Metric::parse(b"a.key.with-0.dash:4|c").unwrap();
        assert_eq!(metric.bucket, "a.key.with-0.dash");
        assert_eq!(metric.value, 4.0);
    }

    #[test]
    fn test_parse_relative_gauge() {
        let metric = Metric::parse(b"gaugor:-5|g").unwrap();
        insta::assert_debug_snapshot!(metric, @r###"
        Metric {
            bucket: "gaugor",
            value: -5.0,
            modifier: Gauge,
            sampling: 1.0,
            relative: true,
        }
        "###);

        let metric = Metric::parse(b"gaugor:+12.5|g").unwrap();
        assert_eq!(metric.value, 12.5);
        assert!(metric.relative);
    }

    #[test]
    fn test_parse_relative_gauge_double_sign() {
        let error = Metric::parse(b"gaugor:+-5|g").unwrap_err();
        assert_eq!(error.kind(), ParseMetricErrorKind::InvalidValue);
    }

    #[test]
    fn test_parse_crlf() {
        let metric = Metric::parse(b"gorets:4|c\r").unwrap();
        assert_eq!(metric.modifier, Modifier::Counter);
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            ("a.key.with-0.dash:4", ParseMetricErrorKind::InvalidModifier),
            ("gauge3|g", ParseMetricErrorKind::MissingValue),
            (":4|c", ParseMetricErrorKind::EmptyBucket),
            ("foo:bar|c", ParseMetricErrorKind::InvalidValue),
            ("foo:|c", ParseMetricErrorKind::InvalidValue),
            ("foo:inf|ms", ParseMetricErrorKind::InvalidValue),
            ("foo:NaN|g", ParseMetricErrorKind::InvalidValue),
            ("foo:1|x", ParseMetricErrorKind::InvalidModifier),
            ("foo:1|", ParseMetricErrorKind::InvalidModifier),
            ("foo:1|c|@0", ParseMetricErrorKind::InvalidSampling),
            ("foo:1|c|@-0.5", ParseMetricErrorKind::InvalidSampling),
            ("foo:1|c|@1.5", ParseMetricErrorKind::InvalidSampling),
            ("foo:1|c|0.5", ParseMetricErrorKind::InvalidSampling),
            ("foo:1|c|@0.5|#tag", ParseMetricErrorKind::TrailingComponent),
        ];

        for (line, kind) in cases {
            let error = Metric::parse(line.as_bytes()).unwrap_err();
            assert_eq!(error.kind(), kind, "{line}");
        }
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let error = Metric::parse(b"foo:1|c\xff").unwrap_err();
        assert_eq!(error.kind(), ParseMetricErrorKind::InvalidUtf8);
    }

    #[test]
    fn test_invalid_line() {
        let metric = Metric::invalid_line("statsdaemon");
        insta::assert_debug_snapshot!(metric, @r###"
        Metric {
            bucket: "statsdaemon.target_type=count.type=invalid_line.unit=Err",
            value: 1.0,
            modifier: Counter,
            sampling: 1.0,
            relative: false,
        }
        "###);
    }

    #[test]
    fn test_invalid_line_empty_prefix() {
        let metric = Metric::invalid_line("");
        assert_eq!(
            metric.bucket,
            "target_type=count.type=invalid_line.unit=Err"
        );
    }

    #[test]
    fn test_parse_all() {
        let metrics: Vec<Metric> =
            Metric::parse_all(b"a.key.with-0.dash:4|c\ngauge:3|g", "statsdaemon").collect();

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].bucket, "a.key.with-0.dash");
        assert_eq!(metrics[0].modifier, Modifier::Counter);
        assert_eq!(metrics[1].bucket, "gauge");
        assert_eq!(metrics[1].value, 3.0);
        assert_eq!(metrics[1].modifier, Modifier::Gauge);
    }

    #[test]
    fn test_parse_all_invalid_lines() {
        statsdaemon_log::init_test!();

        let metrics: Vec<Metric> =
            Metric::parse_all(b"a.key.with-0.dash:4\ngauge3|g", "").collect();

        assert_eq!(metrics.len(), 2);
        for metric in &metrics {
            assert_eq!(metric.bucket, "target_type=count.type=invalid_line.unit=Err");
        }
    }

    #[test]
    fn test_parse_all_invalid_does_not_swallow_next() {
        let metrics: Vec<Metric> = Metric::parse_all(b"bucket:4\nbucket2:3|g", "x").collect();

        assert_eq!(metrics.len(), 2);
        assert_eq!(
            metrics[0].bucket,
            "x.target_type=count.type=invalid_line.unit=Err"
        );
        assert_eq!(metrics[1].bucket, "bucket2");
        assert_eq!(metrics[1].value, 3.0);
    }

    #[test]
    fn test_parse_all_crlf() {
        let metrics: Vec<Metric> = Metric::parse_all(b"foo:42|c\r\nbar:17|c\r\n", "x").collect();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].bucket, "foo");
        assert_eq!(metrics[1].bucket, "bar");
    }

    #[test]
    fn test_parse_all_empty_lines() {
        let count = Metric::parse_all(b"\nfoo:42|c\n\n\nbar:17|c\n", "x").count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_parse_all_empty() {
        assert_eq!(Metric::parse_all(b"", "x").count(), 0);
        assert_eq!(Metric::parse_all(b"\n\r\n", "x").count(), 0);
    }

    #[test]
    fn test_modifier_serde() {
        let json = serde_json::to_string(&Modifier::Timer).unwrap();
        assert_eq!(json, r#""ms""#);

        let modifier: Modifier = serde_json::from_str(r#""g""#).unwrap();
        assert_eq!(modifier, Modifier::Gauge);
    }

    #[test]
    fn test_serde_json() {
        let json = r#"{
  "bucket": "foo",
  "value": -3.0,
  "modifier": "g",
  "sampling": 1.0,
  "relative": true
}"#;

        let metric = serde_json::from_str::<Metric>(json).unwrap();
        assert!(metric.relative);

        let string = serde_json::to_string_pretty(&metric).unwrap();
        assert_eq!(string, json);
    }
}
