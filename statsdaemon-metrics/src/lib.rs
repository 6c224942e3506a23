//! Statsd protocol parsing and in-memory aggregation.
//!
//! Clients submit metrics as small UDP datagrams in the statsd line protocol. Every datagram
//! contains one or more lines separated by `\n`:
//!
//! ```text
//! <bucket>:<value>|<modifier>[|@<sampling>]
//! ```
//!
//! The modifier selects how values of a bucket are aggregated:
//!
//!  - **Counters** (`c`): values are summed up, extrapolated by the sampling rate.
//!  - **Gauges** (`g`): the last value wins. A value with a leading `+` or `-` is added to the
//!    current value instead of replacing it.
//!  - **Timers** (`ms`): every sample is kept until the next flush, at which point summary
//!    statistics and percentiles are computed.
//!  - **Sets** (`s`): the number of unique values is counted.
//!
//! Some example submissions:
//!
//! ```text
//! endpoint.hits:1|c
//! endpoint.hits:1|c|@0.1
//! endpoint.response_time:57|ms
//! queue.depth:42|g
//! queue.depth:-3|g
//! endpoint.users:4711|s
//! ```
//!
//! Lines that cannot be parsed are not dropped. Instead, each of them increments the internal
//! counter `<prefix>.target_type=count.type=invalid_line.unit=Err`.
//!
//! # Aggregation and Flushing
//!
//! The [`Aggregator`] owns one store per modifier. Receivers call [`Aggregator::insert_packet`]
//! for every datagram, while a separate flush cycle periodically calls [`Aggregator::flush_to`].
//! A flush drains all stores and renders the Graphite plaintext protocol:
//!
//! ```text
//! <bucket> <value> <timestamp>
//! ```
//!
//! Counters, timers and sets are reset on every flush. Gauges keep their last value and report it
//! again on every flush until it is overwritten.
//!
//! # Naming Convention
//!
//! Bucket names may carry dot-separated `key=value` tags. Two of them are recognized, see
//! [`MetricName`]: timers tagged `target_type=gauge` and `unit=<U>` report their packet count and
//! packet rate as separate series, and counters tagged `target_type=count` and `unit=<U>` also
//! report a per-second rate.
#![warn(missing_docs)]

mod aggregator;
mod flush;
mod naming;
mod percentile;
mod protocol;
mod stats;
mod store;

pub use aggregator::*;
pub use flush::*;
pub use naming::*;
pub use percentile::*;
pub use protocol::*;
pub use stats::*;
pub use store::*;

#[doc(inline)]
pub use statsdaemon_common::UnixTimestamp;
