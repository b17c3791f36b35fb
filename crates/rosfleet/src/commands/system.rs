//! System command handlers.

use rosfleet_core::{DEFAULT_NTP_SERVERS, ProvisionReport, SystemInfo, SystemResource};

use crate::CliFleet;
use crate::cli::{GlobalOpts, SystemArgs, SystemCommand};
use crate::error::CliError;
use crate::output;

use super::util;

fn info_detail(i: &SystemInfo) -> String {
    [
        format!("Identity: {}", i.identity),
        format!("Model:    {}", i.model),
        format!("Serial:   {}", output::or_dash(i.serial_number.as_deref())),
        format!("Firmware: {}", output::or_dash(i.firmware.as_deref())),
        format!("Version:  {}", i.version),
        format!("Uptime:   {}", i.uptime),
        format!("CPU:      {}%", i.cpu_load_percent),
        format!("Free mem: {:.1} MB", i.free_memory_mb),
    ]
    .join("\n")
}

fn resource_detail(r: &SystemResource) -> String {
    let mut lines = vec![
        format!("Version:      {}", r.version),
        format!("Uptime:       {}", r.uptime),
        format!("Board:        {}", output::or_dash(r.board_name.as_deref())),
        format!("Architecture: {}", output::or_dash(r.architecture.as_deref())),
        format!("CPU:          {}", output::or_dash(r.cpu.as_deref())),
        format!("CPU load:     {}%", r.cpu_load),
        format!(
            "Memory:       {} free of {}",
            bytesize::ByteSize::b(r.free_memory),
            bytesize::ByteSize::b(r.total_memory)
        ),
    ];
    if let (Some(free), Some(total)) = (r.free_hdd_space, r.total_hdd_space) {
        lines.push(format!(
            "Storage:      {} free of {}",
            bytesize::ByteSize::b(free),
            bytesize::ByteSize::b(total)
        ));
    }
    lines.join("\n")
}

fn provision_detail(r: &ProvisionReport) -> String {
    [
        format!("Device:     {}", r.device_id),
        format!("Identity:   {}", r.identity),
        format!("NTP schema: {}", r.ntp_schema),
        format!(
            "DHCP alert: -{} +{}",
            r.dhcp_alert.removed, r.dhcp_alert.added
        ),
    ]
    .join("\n")
}

pub async fn handle(
    fleet: &CliFleet,
    args: SystemArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::target_device(fleet, global)?;
    let system = fleet.system(&device)?;

    match args.command {
        SystemCommand::Info => {
            let info = system.system_info().await?;
            let out = output::render_single(global.output, &info, info_detail, |i| {
                i.identity.clone()
            })?;
            output::print_output(&out, global.quiet);
        }

        SystemCommand::Resource => {
            let resource = system.resource().await?;
            let out = output::render_single(global.output, &resource, resource_detail, |r| {
                r.version.clone()
            })?;
            output::print_output(&out, global.quiet);
        }

        SystemCommand::Identity { name: None } => {
            let identity = system.identity().await?;
            output::print_output(&identity, global.quiet);
        }

        SystemCommand::Identity { name: Some(name) } => {
            system.set_identity(&name).await?;
            output::success(&format!("Identity set to {name}"), global.quiet);
        }

        SystemCommand::Ntp { servers } => {
            let servers = if servers.is_empty() {
                DEFAULT_NTP_SERVERS.iter().map(|s| (*s).to_owned()).collect()
            } else {
                servers
            };
            let schema = system.set_ntp(&servers).await?;
            output::success(
                &format!("NTP client enabled ({schema}): {}", servers.join(", ")),
                global.quiet,
            );
        }

        SystemCommand::DhcpAlert { interface } => {
            let summary = system.set_dhcp_alert(&interface).await?;
            util::report_summaries(&[summary], global)?;
        }

        SystemCommand::Init {
            identity,
            interface,
        } => {
            let report = fleet.setup_initial(&device, &identity, &interface).await?;
            let out = output::render_single(global.output, &report, provision_detail, |r| {
                r.identity.clone()
            })?;
            output::print_output(&out, global.quiet);
        }

        SystemCommand::Reboot => {
            if !util::confirm(&format!("Reboot {device}?"), global.yes)? {
                return Ok(());
            }
            system.reboot().await?;
            output::success(&format!("Reboot of {device} initiated"), global.quiet);
        }

        SystemCommand::Shutdown => {
            if !util::confirm(
                &format!("Power off {device}? It cannot be powered on remotely."),
                global.yes,
            )? {
                return Ok(());
            }
            system.shutdown().await?;
            output::success(&format!("Shutdown of {device} initiated"), global.quiet);
        }
    }
    Ok(())
}
