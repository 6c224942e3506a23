//! The statsdaemon binary, a statsd compatible metrics aggregation daemon.
//!
//! statsdaemon receives metrics in the statsd line protocol over UDP, aggregates them in memory
//! and periodically flushes the aggregates to a Graphite server, a file or standard output.
//!
//! # Usage
//!
//! ```text
//! statsdaemon --config <DIR> run [--listen-addr ADDR] [--percentile 90] ...
//! statsdaemon --config <DIR> config show [--format yaml|debug]
//! ```
//!
//! The config folder contains an optional `config.yml`. Every option of `run` can also be set
//! through an environment variable, see `statsdaemon run --help`.
//!
//! # Shutdown
//!
//! On `SIGINT` or `SIGTERM`, the receivers stop reading from the socket and a final flush writes
//! out everything aggregated since the last interval.

mod cli;
mod cliapp;
mod output;
mod service;
mod setup;

use std::process;

#[cfg(target_os = "linux")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

pub fn main() {
    let exit_code = match cli::execute() {
        Ok(()) => 0,
        Err(err) => {
            statsdaemon_log::ensure_error(err);
            1
        }
    };

    process::exit(exit_code);
}
