use anyhow::{Context, Result, bail};
use statsdaemon_config::{Config, OutputMode};
use statsdaemon_log::info;

/// The largest payload of a single UDP datagram over IPv4.
const MAX_UDP_PAYLOAD: usize = 65_507;

/// Validates that the `config` is valid for running the daemon.
pub fn check_config(config: &Config) -> Result<()> {
    if config.max_packet_size() > MAX_UDP_PAYLOAD {
        bail!(
            "max_packet_size of {} exceeds the maximum UDP payload of {MAX_UDP_PAYLOAD} bytes",
            config.max_packet_size()
        );
    }

    if config.output_mode() == OutputMode::Graphite {
        let (host, port) = config
            .graphite_addr()
            .rsplit_once(':')
            .with_context(|| format!("graphite_addr `{}` has no port", config.graphite_addr()))?;

        if host.is_empty() {
            bail!("graphite_addr `{}` has no host", config.graphite_addr());
        }

        port.parse::<u16>()
            .with_context(|| format!("invalid port in graphite_addr `{}`", config.graphite_addr()))?;
    }

    Ok(())
}

/// Print spawn infos to the log.
pub fn dump_spawn_infos(config: &Config) {
    info!(
        "launching statsdaemon from config folder {}",
        config.path().display()
    );
    info!("  listen addr: {}", config.listen_addr());
    info!("  receivers: {}", config.receivers());
    info!("  flush interval: {}s", config.flush_interval().as_secs());
    info!(
        "  percentiles: {}",
        config
            .percentiles()
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    match config.output_mode() {
        OutputMode::Graphite => info!("  output: graphite ({})", config.graphite_addr()),
        OutputMode::File => info!(
            "  output: file ({})",
            config
                .output_path()
                .map(|path| path.display().to_string())
                .unwrap_or_default()
        ),
        mode => info!("  output: {mode}"),
    }
}
