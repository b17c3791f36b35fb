//! Static route command handlers.

use rosfleet_core::{Route, RouteSpec};
use tabled::Tabled;

use crate::CliFleet;
use crate::cli::{GlobalOpts, RoutesArgs, RoutesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "Destination")]
    dst: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Check")]
    check: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

impl From<&Route> for RouteRow {
    fn from(r: &Route) -> Self {
        Self {
            dst: r.dst_address.clone(),
            gateway: output::or_dash(r.gateway.as_deref()),
            distance: r.distance.map_or_else(|| "-".into(), |d| d.to_string()),
            check: output::or_dash(r.check_gateway.as_deref()),
            active: output::yes_no(r.active),
            comment: output::or_dash(r.comment.as_deref()),
        }
    }
}

pub async fn handle(
    fleet: &CliFleet,
    args: RoutesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::target_device(fleet, global)?;
    let routing = fleet.routing(&device)?;

    match args.command {
        RoutesCommand::List => {
            let list = routing.list_routes().await?;
            let out = output::render_list(
                global.output,
                &list,
                |r| RouteRow::from(r),
                |r| r.dst_address.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoutesCommand::Add {
            dst_address,
            gateway,
            distance,
        } => {
            let mut spec = RouteSpec::new(&dst_address, &gateway);
            if let Some(distance) = distance {
                spec = spec.distance(distance);
            }
            let id = routing.add_route(&spec).await?;
            output::success(
                &format!("Route {dst_address} via {gateway} added ({id})"),
                global.quiet,
            );
            Ok(())
        }

        RoutesCommand::Clear => {
            if !util::confirm(
                &format!("Remove every managed route on {device}?"),
                global.yes,
            )? {
                return Ok(());
            }
            let summary = routing.clear_managed_routes().await?;
            util::report_summaries(&[summary], global)
        }

        RoutesCommand::Failover { primary, backup } => {
            if !util::confirm(
                &format!("Replace managed routes on {device} with failover via {primary} / {backup}?"),
                global.yes,
            )? {
                return Ok(());
            }
            let summary = routing.setup_recursive_failover(&primary, &backup).await?;
            util::report_summaries(&[summary], global)
        }
    }
}
