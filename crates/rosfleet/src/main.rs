mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use rosfleet_api::RestConnector;
use rosfleet_core::{Fleet, RateCalculator};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, LogFormat};
use crate::error::CliError;

/// Fleet type every device-bound command runs against.
pub type CliFleet = Fleet<config::ConfigInventory, RestConnector>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.log_format);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, format: LogFormat) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a device session
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "rosfleet", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let mut cfg = config::load_config()?;
            config::apply_overrides(&mut cfg, &cli.global);
            let policy = cfg.telemetry.eviction_policy();
            let inventory = config::inventory(cfg, &cli.global);

            let fleet: CliFleet = Fleet::new(
                inventory,
                Arc::new(RestConnector::new()),
                Arc::new(RateCalculator::new(policy)),
            );

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &fleet, &cli.global).await
        }
    }
}
