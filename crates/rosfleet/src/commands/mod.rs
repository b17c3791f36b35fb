//! Command dispatch: bridges CLI args -> fleet facades -> output formatting.

pub mod config_cmd;
pub mod firewall;
pub mod interfaces;
pub mod ip;
pub mod routes;
pub mod stats;
pub mod system;
pub mod util;

use crate::CliFleet;
use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, fleet: &CliFleet, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Interfaces(args) => interfaces::handle(fleet, args, global).await,
        Command::Ip(args) => ip::handle(fleet, args, global).await,
        Command::Routes(args) => routes::handle(fleet, args, global).await,
        Command::Firewall(args) => firewall::handle(fleet, args, global).await,
        Command::System(args) => system::handle(fleet, args, global).await,
        Command::Stats(args) => stats::handle(fleet, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions do not take a device".into(),
        )),
    }
}
