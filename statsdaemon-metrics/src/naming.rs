/// Tag key selecting the semantic type of a series.
const TARGET_TYPE: &str = "target_type";

/// Tag key carrying the unit of a series.
const UNIT: &str = "unit";

/// Suffix appended to the packet series derived from timers.
const PACKET_SUFFIX: &str = "pckt_type=sent.direction=in";

/// A bucket name inspected for `key=value` tag segments.
///
/// Segments are separated by `.` and matched exactly. Only `target_type` and `unit` are
/// recognized:
///
///  - A timer bucket tagged `target_type=gauge` and `unit=<U>` reports its statistics as
///    `<bucket>.stat=<name>` and derives a packet count series (`target_type=count`,
///    `unit=Pckt.orig_unit=<U>`) and a packet rate series (`target_type=rate`,
///    `unit=Pcktps.orig_unit=<U>`).
///  - A counter bucket tagged `target_type=count` and `unit=<U>` derives a rate series
///    (`target_type=rate`, `unit=<U>ps`).
///
/// Buckets without both tags are reported unchanged.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MetricName<'a> {
    bucket: &'a str,
}

impl<'a> MetricName<'a> {
    /// Wraps a bucket name.
    pub fn new(bucket: &'a str) -> Self {
        Self { bucket }
    }

    /// Returns the value of the first segment with the given tag key.
    ///
    /// # Example
    ///
    /// ```
    /// use statsdaemon_metrics::MetricName;
    ///
    /// let name = MetricName::new("foo=bar.target_type=count.unit=B");
    /// assert_eq!(name.tag("unit"), Some("B"));
    /// assert_eq!(name.tag("stat"), None);
    /// ```
    pub fn tag(&self, key: &str) -> Option<&'a str> {
        self.bucket.split('.').find_map(|segment| {
            let (k, v) = segment.split_once('=')?;
            (k == key).then_some(v)
        })
    }

    /// Returns the unit if the bucket has the given `target_type` and a non-empty unit.
    fn unit_for(&self, target_type: &str) -> Option<&'a str> {
        if self.tag(TARGET_TYPE) != Some(target_type) {
            return None;
        }
        self.tag(UNIT).filter(|unit| !unit.is_empty())
    }

    /// Returns `true` if this is a timer bucket following the tag convention.
    pub fn is_tagged_timer(&self) -> bool {
        self.unit_for("gauge").is_some()
    }

    /// Rewrites the `target_type` and `unit` segments, optionally appending a suffix.
    fn rewrite(&self, target_type: &str, unit: &str, suffix: Option<&str>) -> String {
        let mut name = String::with_capacity(self.bucket.len() + 48);

        for (index, segment) in self.bucket.split('.').enumerate() {
            if index > 0 {
                name.push('.');
            }

            match segment.split_once('=') {
                Some((TARGET_TYPE, _)) => {
                    name.push_str(TARGET_TYPE);
                    name.push('=');
                    name.push_str(target_type);
                }
                Some((UNIT, _)) => {
                    name.push_str(UNIT);
                    name.push('=');
                    name.push_str(unit);
                }
                _ => name.push_str(segment),
            }
        }

        if let Some(suffix) = suffix {
            name.push('.');
            name.push_str(suffix);
        }

        name
    }

    /// Returns the name of the rate series derived from a tagged counter.
    ///
    /// # Example
    ///
    /// ```
    /// use statsdaemon_metrics::MetricName;
    ///
    /// let name = MetricName::new("foo=bar.target_type=count.unit=B");
    /// assert_eq!(
    ///     name.counter_rate().as_deref(),
    ///     Some("foo=bar.target_type=rate.unit=Bps")
    /// );
    /// ```
    pub fn counter_rate(&self) -> Option<String> {
        let unit = self.unit_for("count")?;
        Some(self.rewrite("rate", &format!("{unit}ps"), None))
    }

    /// Returns the name of the packet count series derived from a tagged timer.
    pub fn packet_count(&self) -> Option<String> {
        let unit = self.unit_for("gauge")?;
        let unit = format!("Pckt.orig_unit={unit}");
        Some(self.rewrite("count", &unit, Some(PACKET_SUFFIX)))
    }

    /// Returns the name of the packet rate series derived from a tagged timer.
    pub fn packet_rate(&self) -> Option<String> {
        let unit = self.unit_for("gauge")?;
        let unit = format!("Pcktps.orig_unit={unit}");
        Some(self.rewrite("rate", &unit, Some(PACKET_SUFFIX)))
    }
}
