use anyhow::Result;
use clap::Parser;
use statsdaemon_config::{Config, OverridableConfig};

use crate::cliapp::{Cli, Command, ConfigCommand, RunArgs, ShowFormat};
use crate::{service, setup};

/// Runs the command line application.
pub fn execute() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_path(&cli.config)?;

    match cli.command {
        Command::Run(args) => {
            config.apply_override(extract_config_env_vars(args))?;
            run(config)
        }
        Command::Config {
            command: ConfigCommand::Show { format },
        } => show_config(&config, format),
    }
}

/// Extract config arguments from a parsed command line arguments object.
pub fn extract_config_env_vars(args: RunArgs) -> OverridableConfig {
    OverridableConfig {
        listen_addr: args.listen_addr,
        graphite_addr: args.graphite_addr,
        flush_interval: args.flush_interval,
        percentiles: args.percentiles,
        prefix_internal: args.prefix_internal,
        output: args.output,
        output_path: args.output_path,
    }
}

#[allow(clippy::print_stdout)]
fn show_config(config: &Config, format: ShowFormat) -> Result<()> {
    match format {
        ShowFormat::Yaml => print!("{}", config.to_yaml_string()?),
        ShowFormat::Debug => println!("{config:#?}"),
    }

    Ok(())
}

/// Starts the daemon and blocks until it has shut down.
pub fn run(config: Config) -> Result<()> {
    statsdaemon_log::init(config.logging());
    setup::check_config(&config)?;
    setup::dump_spawn_infos(&config);
    service::run(config)
}
