//! This module implements the definition of the command line app.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// A statsd compatible metrics aggregation daemon.
#[derive(Debug, Parser)]
#[command(
    name = "statsdaemon",
    version,
    max_term_width = 79,
    disable_help_subcommand = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// The path to the config folder.
    #[arg(
        short,
        long,
        global = true,
        value_name = "DIR",
        env = "STATSDAEMON_CONFIG_PATH",
        default_value = ".statsdaemon"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run statsdaemon in the foreground until it is shut down.
    ///
    /// This binds the UDP socket configured in the config file and flushes aggregates on every
    /// interval. Command line arguments and environment variables take precedence over the config
    /// file.
    Run(RunArgs),

    /// Inspect the configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// The address to receive statsd datagrams on.
    #[arg(long, value_name = "ADDR", env = "STATSDAEMON_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// The host:port of the Graphite server.
    #[arg(long, value_name = "ADDR", env = "STATSDAEMON_GRAPHITE_ADDR")]
    pub graphite_addr: Option<String>,

    /// The interval between flushes in seconds.
    #[arg(long, value_name = "SECS", env = "STATSDAEMON_FLUSH_INTERVAL")]
    pub flush_interval: Option<String>,

    /// A percentile to compute for timers, e.g. 90 or -75. Can be repeated.
    #[arg(
        long = "percentile",
        value_name = "PCT",
        env = "STATSDAEMON_PERCENTILES",
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    pub percentiles: Vec<String>,

    /// The prefix of internally generated buckets.
    #[arg(long, value_name = "PREFIX", env = "STATSDAEMON_PREFIX_INTERNAL")]
    pub prefix_internal: Option<String>,

    /// Where to write flushed metrics: graphite, stdout, file or discard.
    #[arg(long, value_name = "MODE", env = "STATSDAEMON_OUTPUT")]
    pub output: Option<String>,

    /// The file to append to when the output is file.
    #[arg(long, value_name = "PATH", env = "STATSDAEMON_OUTPUT_PATH")]
    pub output_path: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration.
    Show {
        /// The output format.
        #[arg(long, value_enum, default_value_t = ShowFormat::Yaml)]
        format: ShowFormat,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ShowFormat {
    Yaml,
    Debug,
}
