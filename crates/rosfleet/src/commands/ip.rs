//! IP address, DHCP server and DNS command handlers.

use rosfleet_core::{DhcpServer, IpAddress};
use tabled::Tabled;

use crate::CliFleet;
use crate::cli::{GlobalOpts, IpArgs, IpCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct AddressRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Network")]
    network: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Dynamic")]
    dynamic: String,
    #[tabled(rename = "Disabled")]
    disabled: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

impl From<&IpAddress> for AddressRow {
    fn from(a: &IpAddress) -> Self {
        Self {
            address: a.address.clone(),
            network: output::or_dash(a.network.as_deref()),
            interface: a.interface.clone(),
            dynamic: output::yes_no(a.dynamic),
            disabled: output::yes_no(a.disabled),
            comment: output::or_dash(a.comment.as_deref()),
        }
    }
}

#[derive(Tabled)]
struct DhcpServerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Lease")]
    lease: String,
    #[tabled(rename = "Disabled")]
    disabled: String,
}

impl From<&DhcpServer> for DhcpServerRow {
    fn from(d: &DhcpServer) -> Self {
        Self {
            name: d.name.clone(),
            interface: d.interface.clone(),
            pool: output::or_dash(d.address_pool.as_deref()),
            lease: output::or_dash(d.lease_time.as_deref()),
            disabled: output::yes_no(d.disabled),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(fleet: &CliFleet, args: IpArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let device = util::target_device(fleet, global)?;
    let ip = fleet.ip(&device)?;

    match args.command {
        IpCommand::List => {
            let list = ip.list_addresses().await?;
            let out = output::render_list(
                global.output,
                &list,
                |a| AddressRow::from(a),
                |a| a.address.clone(),
            )?;
            output::print_output(&out, global.quiet);
        }

        IpCommand::Add { address, interface } => {
            let id = ip.add_address(&address, &interface).await?;
            output::success(
                &format!("Address {address} assigned to {interface} ({id})"),
                global.quiet,
            );
        }

        IpCommand::DhcpServers => {
            let list = ip.list_dhcp_servers().await?;
            let out = output::render_list(
                global.output,
                &list,
                |d| DhcpServerRow::from(d),
                |d| d.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
        }

        IpCommand::Dns { servers } => {
            ip.set_dns(&servers).await?;
            output::success(
                &format!("DNS servers set to {}", servers.join(", ")),
                global.quiet,
            );
        }
    }
    Ok(())
}
