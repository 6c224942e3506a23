use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use statsdaemon_log::LogConfig;
use statsdaemon_metrics::{AggregatorConfig, Percentile};
use thiserror::Error;

/// Defines the source of a config error
#[derive(Debug, Default)]
enum ConfigErrorSource {
    /// An error occurring independently.
    #[default]
    None,
    /// An error originating from a configuration file.
    File(PathBuf),
    /// An error originating in a field override (an env var, or a CLI parameter).
    FieldOverride(String),
}

/// Indicates config related errors.
#[derive(Debug)]
pub struct ConfigError {
    source: ConfigErrorSource,
    kind: ConfigErrorKind,
    inner: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ConfigError {
    #[inline]
    fn new(kind: ConfigErrorKind) -> Self {
        Self {
            source: ConfigErrorSource::None,
            kind,
            inner: None,
        }
    }

    #[inline]
    fn wrap<E>(inner: E, kind: ConfigErrorKind) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            source: ConfigErrorSource::None,
            kind,
            inner: Some(Box::new(inner)),
        }
    }

    #[inline]
    fn for_field<E>(inner: E, field: &'static str) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::wrap(inner, ConfigErrorKind::InvalidValue).field(field)
    }

    #[inline]
    fn file<P: AsRef<Path>>(mut self, p: P) -> Self {
        self.source = ConfigErrorSource::File(p.as_ref().to_path_buf());
        self
    }

    #[inline]
    fn field(mut self, name: &'static str) -> Self {
        self.source = ConfigErrorSource::FieldOverride(name.to_owned());
        self
    }

    /// Returns the error kind of the error.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ConfigErrorSource::None => write!(f, "{}", self.kind),
            ConfigErrorSource::File(file_name) => {
                write!(f, "{} (file {})", self.kind, file_name.display())
            }
            ConfigErrorSource::FieldOverride(name) => write!(f, "{} (field {})", self.kind, name),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

/// Indicates config related errors.
#[derive(Clone, Copy, Debug, Error, Eq, Hash, PartialEq)]
pub enum ConfigErrorKind {
    /// Failed to open the file.
    #[error("could not open config file")]
    CouldNotOpenFile,
    /// Failed to serialize the configuration.
    #[error("could not write config file")]
    CouldNotWriteFile,
    /// Parsing YAML failed.
    #[error("could not parse yaml config file")]
    BadYaml,
    /// Parsing JSON failed.
    #[error("could not parse json config file")]
    BadJson,
    /// Invalid config value
    #[error("invalid config value")]
    InvalidValue,
    /// The file output was selected without a path.
    #[error("output mode file requires a path")]
    MissingOutputPath,
}

trait ConfigObject: DeserializeOwned + Serialize {
    /// The basename of the config file.
    fn name() -> &'static str;

    /// The full filename of the config file, including the file extension.
    fn path(base: &Path) -> PathBuf {
        base.join(format!("{}.yml", Self::name()))
    }

    /// Loads the config file from a file within the given directory location.
    fn load(base: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(base);

        let f = fs::File::open(&path)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotOpenFile).file(&path))?;

        serde_yaml::from_reader(io::BufReader::new(f))
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml).file(&path))
    }
}

/// An error parsing an [`OutputMode`].
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("invalid output mode: expected graphite, stdout, file or discard")]
pub struct ParseOutputModeError;

/// Selects where flushed batches are written.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Sends every batch over a new TCP connection to a Graphite server.
    #[default]
    Graphite,
    /// Prints batches to standard output.
    Stdout,
    /// Appends batches to a file.
    File,
    /// Drops all batches.
    Discard,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::Graphite => "graphite",
            OutputMode::Stdout => "stdout",
            OutputMode::File => "file",
            OutputMode::Discard => "discard",
        })
    }
}

impl FromStr for OutputMode {
    type Err = ParseOutputModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "graphite" => Ok(OutputMode::Graphite),
            "stdout" => Ok(OutputMode::Stdout),
            "file" => Ok(OutputMode::File),
            "discard" => Ok(OutputMode::Discard),
            _ => Err(ParseOutputModeError),
        }
    }
}

/// Structure used to hold information about configuration overrides via
/// CLI parameters or environment variables
#[derive(Debug, Default)]
pub struct OverridableConfig {
    /// The address to receive statsd datagrams on.
    pub listen_addr: Option<String>,
    /// The address of the Graphite server.
    pub graphite_addr: Option<String>,
    /// The flush interval in seconds.
    pub flush_interval: Option<String>,
    /// Percentile thresholds. Replaces the configured list if not empty.
    pub percentiles: Vec<String>,
    /// Prefix of internally generated buckets.
    pub prefix_internal: Option<String>,
    /// The output mode.
    pub output: Option<String>,
    /// The output file path.
    pub output_path: Option<String>,
}

/// Network settings of the receivers.
#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Daemon {
    /// The address to receive statsd datagrams on.
    pub listen_addr: SocketAddr,
    /// The receive buffer size. Larger datagrams are truncated.
    pub max_packet_size: usize,
    /// The number of tasks reading from the socket.
    pub receivers: usize,
}

impl Default for Daemon {
    fn default() -> Self {
        Daemon {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8125)),
            max_packet_size: 1472,
            receivers: 1,
        }
    }
}

/// Aggregation settings.
#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct AggregationConfig {
    /// The interval in seconds between two flushes.
    pub flush_interval: u64,
    /// Percentiles computed for every timer, e.g. `90` or `-75`.
    pub percentiles: Vec<Percentile>,
    /// Prefix of internally generated buckets. May be empty.
    pub prefix_internal: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        let defaults = AggregatorConfig::default();
        AggregationConfig {
            flush_interval: defaults.flush_interval.as_secs(),
            percentiles: defaults.percentiles,
            prefix_internal: defaults.prefix_internal,
        }
    }
}

/// Output settings.
#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct OutputConfig {
    /// Where to write flushed batches.
    pub mode: OutputMode,
    /// The `host:port` of the Graphite server. Resolved on every flush.
    pub graphite_addr: String,
    /// The file to append to in `file` mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            mode: OutputMode::default(),
            graphite_addr: "127.0.0.1:2003".to_owned(),
            path: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
struct ConfigValues {
    daemon: Daemon,
    aggregator: AggregationConfig,
    output: OutputConfig,
    logging: LogConfig,
}

impl ConfigObject for ConfigValues {
    fn name() -> &'static str {
        "config"
    }
}

/// Config struct.
pub struct Config {
    values: ConfigValues,
    path: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("values", &self.values)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            values: ConfigValues::default(),
            path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Loads a config from a given config folder.
    ///
    /// If the folder does not contain a `config.yml`, all defaults apply.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = std::env::current_dir()
            .map(|x| x.join(path.as_ref()))
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        let values = if Self::config_exists(&path) {
            ConfigValues::load(&path)?
        } else {
            ConfigValues::default()
        };

        let config = Config { values, path };
        config.validate()?;
        Ok(config)
    }

    /// Creates a config from a JSON value.
    ///
    /// This is mostly useful for tests.
    pub fn from_json_value(value: serde_json::Value) -> Result<Config, ConfigError> {
        let config = Config {
            values: serde_json::from_value(value)
                .map_err(|err| ConfigError::wrap(err, ConfigErrorKind::BadJson))?,
            path: PathBuf::new(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Override configuration with values coming from other sources (e.g. env variables or
    /// command line parameters)
    pub fn apply_override(
        &mut self,
        overrides: OverridableConfig,
    ) -> Result<&mut Self, ConfigError> {
        if let Some(listen_addr) = overrides.listen_addr {
            self.values.daemon.listen_addr = listen_addr
                .parse()
                .map_err(|err| ConfigError::for_field(err, "listen_addr"))?;
        }

        let aggregator = &mut self.values.aggregator;
        if let Some(flush_interval) = overrides.flush_interval {
            aggregator.flush_interval = flush_interval
                .parse()
                .map_err(|err| ConfigError::for_field(err, "flush_interval"))?;
        }

        if !overrides.percentiles.is_empty() {
            aggregator.percentiles = overrides
                .percentiles
                .iter()
                .map(|p| p.parse())
                .collect::<Result<_, _>>()
                .map_err(|err| ConfigError::for_field(err, "percentile"))?;
        }

        if let Some(prefix_internal) = overrides.prefix_internal {
            aggregator.prefix_internal = prefix_internal;
        }

        let output = &mut self.values.output;
        if let Some(mode) = overrides.output {
            output.mode = mode
                .parse()
                .map_err(|err| ConfigError::for_field(err, "output"))?;
        }

        if let Some(graphite_addr) = overrides.graphite_addr {
            output.graphite_addr = graphite_addr;
        }

        if let Some(path) = overrides.output_path {
            output.path = Some(PathBuf::from(path));
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks values that cannot be expressed by their types.
    fn validate(&self) -> Result<(), ConfigError> {
        let values = &self.values;

        if values.aggregator.flush_interval == 0 {
            return Err(ConfigError::new(ConfigErrorKind::InvalidValue).field("flush_interval"));
        }

        if values.daemon.receivers == 0 {
            return Err(ConfigError::new(ConfigErrorKind::InvalidValue).field("receivers"));
        }

        if values.daemon.max_packet_size == 0 {
            return Err(ConfigError::new(ConfigErrorKind::InvalidValue).field("max_packet_size"));
        }

        if values.output.mode == OutputMode::File && values.output.path.is_none() {
            return Err(ConfigError::new(ConfigErrorKind::MissingOutputPath).field("output.path"));
        }

        Ok(())
    }

    /// Checks if the config is already initialized.
    pub fn config_exists<P: AsRef<Path>>(path: P) -> bool {
        fs::metadata(ConfigValues::path(path.as_ref())).is_ok()
    }

    /// Returns the path of the config folder.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dumps out a YAML string of the values.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.values)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotWriteFile))
    }

    /// Returns the address to receive statsd datagrams on.
    pub fn listen_addr(&self) -> SocketAddr {
        self.values.daemon.listen_addr
    }

    /// Returns the receive buffer size.
    pub fn max_packet_size(&self) -> usize {
        self.values.daemon.max_packet_size
    }

    /// Returns the number of receiver tasks.
    pub fn receivers(&self) -> usize {
        self.values.daemon.receivers
    }

    /// Returns the interval between two flushes.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.values.aggregator.flush_interval)
    }

    /// Returns the configured percentiles.
    pub fn percentiles(&self) -> &[Percentile] {
        &self.values.aggregator.percentiles
    }

    /// Returns the prefix of internally generated buckets.
    pub fn prefix_internal(&self) -> &str {
        &self.values.aggregator.prefix_internal
    }

    /// Returns the aggregator configuration.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            flush_interval: self.flush_interval(),
            percentiles: self.percentiles().to_vec(),
            prefix_internal: self.prefix_internal().to_owned(),
        }
    }

    /// Returns the output mode.
    pub fn output_mode(&self) -> OutputMode {
        self.values.output.mode
    }

    /// Returns the `host:port` of the Graphite server.
    pub fn graphite_addr(&self) -> &str {
        &self.values.output.graphite_addr
    }

    /// Returns the output file path, if configured.
    pub fn output_path(&self) -> Option<&Path> {
        self.values.output.path.as_deref()
    }

    /// Returns the logging configuration.
    pub fn logging(&self) -> &LogConfig {
        &self.values.logging
    }
}
