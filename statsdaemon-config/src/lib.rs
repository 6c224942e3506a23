//! Configuration for the statsdaemon server.
//!
//! The configuration lives in a folder containing a `config.yml` file. A missing file is not an
//! error, in which case all defaults apply. Individual values can be overridden from command line
//! arguments or environment variables through [`OverridableConfig`].
//!
//! # Example
//!
//! ```yaml
//! daemon:
//!   listen_addr: 0.0.0.0:8125
//!   max_packet_size: 1472
//!   receivers: 2
//! aggregator:
//!   flush_interval: 10
//!   percentiles: [90, -75]
//!   prefix_internal: statsdaemon
//! output:
//!   mode: graphite
//!   graphite_addr: 127.0.0.1:2003
//! logging:
//!   level: info
//!   format: auto
//! ```
#![warn(missing_docs)]

mod config;

pub use crate::config::*;
