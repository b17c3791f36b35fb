//! Firewall command handlers.

use rosfleet_core::{AddressListEntry, Category, FirewallRule};
use tabled::Tabled;

use crate::CliFleet;
use crate::cli::{AddressListCommand, FirewallArgs, FirewallCommand, FirewallTable, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Chain")]
    chain: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Src")]
    src: String,
    #[tabled(rename = "Dst")]
    dst: String,
    #[tabled(rename = "In")]
    in_interface: String,
    #[tabled(rename = "Out")]
    out_interface: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

impl From<&FirewallRule> for RuleRow {
    fn from(r: &FirewallRule) -> Self {
        Self {
            id: r.id.clone(),
            chain: r.chain.clone(),
            action: r.action.clone(),
            src: output::or_dash(r.src_address.as_deref()),
            dst: output::or_dash(r.dst_address.as_deref()),
            in_interface: output::or_dash(r.in_interface.as_deref()),
            out_interface: output::or_dash(r.out_interface.as_deref()),
            comment: output::or_dash(r.comment.as_deref()),
        }
    }
}

#[derive(Tabled)]
struct AddressListRow {
    #[tabled(rename = "List")]
    list: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Disabled")]
    disabled: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

impl From<&AddressListEntry> for AddressListRow {
    fn from(e: &AddressListEntry) -> Self {
        Self {
            list: e.list.clone(),
            address: e.address.clone(),
            disabled: output::yes_no(e.disabled),
            comment: output::or_dash(e.comment.as_deref()),
        }
    }
}

impl From<FirewallTable> for Category {
    fn from(table: FirewallTable) -> Self {
        match table {
            FirewallTable::Nat => Category::NatRule,
            FirewallTable::Filter => Category::FilterRule,
            FirewallTable::Mangle => Category::MangleRule,
            FirewallTable::AddressList => Category::AddressList,
        }
    }
}

fn render_rules(rules: &[FirewallRule], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(global.output, rules, |r| RuleRow::from(r), |r| r.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    fleet: &CliFleet,
    args: FirewallArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::target_device(fleet, global)?;
    let firewall = fleet.firewall(&device)?;

    match args.command {
        FirewallCommand::Nat => render_rules(&firewall.list_nat().await?, global),

        FirewallCommand::Filter => render_rules(&firewall.list_filter().await?, global),

        FirewallCommand::Masquerade { out_interface } => {
            let id = firewall.add_masquerade(&out_interface).await?;
            output::success(
                &format!("Masquerade on {out_interface} added ({id})"),
                global.quiet,
            );
            Ok(())
        }

        FirewallCommand::Block { src_address } => {
            let id = firewall.block_address(&src_address).await?;
            output::success(
                &format!("Forwarded traffic from {src_address} blocked ({id})"),
                global.quiet,
            );
            Ok(())
        }

        FirewallCommand::AddressList(list_args) => match list_args.command {
            AddressListCommand::List => {
                let entries = firewall.list_address_lists().await?;
                let out = output::render_list(
                    global.output,
                    &entries,
                    |e| AddressListRow::from(e),
                    |e| format!("{} {}", e.list, e.address),
                )?;
                output::print_output(&out, global.quiet);
                Ok(())
            }
            AddressListCommand::Add { list, address } => {
                let id = firewall.add_address_list_entry(&list, &address).await?;
                output::success(&format!("{address} added to {list} ({id})"), global.quiet);
                Ok(())
            }
        },

        FirewallCommand::Sync { table, file } => {
            let desired = util::read_desired(&file)?;
            let category = Category::from(table);
            if !util::confirm(
                &format!(
                    "Replace managed {category} entries on {device} with {} from {}?",
                    desired.len(),
                    file.display()
                ),
                global.yes,
            )? {
                return Ok(());
            }
            let summary = firewall.reconcile(category, &desired).await?;
            util::report_summaries(&[summary], global)
        }

        FirewallCommand::Clear => {
            if !util::confirm(
                &format!("Remove every managed firewall entry on {device}?"),
                global.yes,
            )? {
                return Ok(());
            }
            let summaries = firewall.clear_managed().await?;
            util::report_summaries(&summaries, global)
        }
    }
}
