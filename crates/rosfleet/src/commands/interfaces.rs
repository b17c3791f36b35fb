//! Interface command handlers.

use rosfleet_core::Interface;
use tabled::Tabled;

use crate::CliFleet;
use crate::cli::{GlobalOpts, InterfacesArgs, InterfacesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Running")]
    running: String,
    #[tabled(rename = "Disabled")]
    disabled: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "MTU")]
    mtu: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

impl From<&Interface> for InterfaceRow {
    fn from(i: &Interface) -> Self {
        Self {
            name: i.name.clone(),
            kind: i.kind.clone(),
            running: output::yes_no(i.running),
            disabled: output::yes_no(i.disabled),
            mac: output::or_dash(i.mac_address.as_deref()),
            mtu: i.mtu.map_or_else(|| "-".into(), |m| m.to_string()),
            comment: output::or_dash(i.comment.as_deref()),
        }
    }
}

fn detail(i: &Interface) -> String {
    [
        format!("Name:     {}", i.name),
        format!("ID:       {}", i.id),
        format!("Type:     {}", i.kind),
        format!("Running:  {}", output::yes_no(i.running)),
        format!("Disabled: {}", output::yes_no(i.disabled)),
        format!("MAC:      {}", output::or_dash(i.mac_address.as_deref())),
        format!(
            "MTU:      {}",
            i.mtu.map_or_else(|| "-".into(), |m| m.to_string())
        ),
        format!("RX:       {} bytes", i.rx_bytes),
        format!("TX:       {} bytes", i.tx_bytes),
        format!("Comment:  {}", output::or_dash(i.comment.as_deref())),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    fleet: &CliFleet,
    args: InterfacesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::target_device(fleet, global)?;
    let interfaces = fleet.interfaces(&device)?;

    match args.command {
        InterfacesCommand::List => {
            let list = interfaces.list().await?;
            let out = output::render_list(
                global.output,
                &list,
                |i| InterfaceRow::from(i),
                |i| i.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
        }

        InterfacesCommand::Get { name } => {
            let iface = interfaces.get(&name).await?;
            let out = output::render_single(global.output, &iface, detail, |i| i.name.clone())?;
            output::print_output(&out, global.quiet);
        }

        InterfacesCommand::Enable { name } => {
            interfaces.set_enabled(&name, true).await?;
            output::success(&format!("Interface {name} enabled on {device}"), global.quiet);
        }

        InterfacesCommand::Disable { name } => {
            if !util::confirm(
                &format!("Disable interface {name} on {device}? This may cut your own access."),
                global.yes,
            )? {
                return Ok(());
            }
            interfaces.set_enabled(&name, false).await?;
            output::success(&format!("Interface {name} disabled on {device}"), global.quiet);
        }

        InterfacesCommand::Rename { name, new_name } => {
            interfaces.rename(&name, &new_name).await?;
            output::success(&format!("Interface {name} renamed to {new_name}"), global.quiet);
        }

        InterfacesCommand::AddBridge { name } => {
            let id = interfaces.add_bridge(&name).await?;
            output::success(&format!("Bridge {name} created ({id})"), global.quiet);
        }
    }
    Ok(())
}
