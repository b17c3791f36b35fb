//! Telemetry polling: CPU, memory and per-interface throughput.
//!
//! Rates come from the difference between two polls, so the first sample
//! of every interface reads zero. `--watch` keeps the fleet (and its rate
//! calculator) alive across polls.

use chrono::{DateTime, Utc};
use rosfleet_core::{DeviceStats, InterfaceRate};
use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use crate::CliFleet;
use crate::cli::{GlobalOpts, OutputFormat, StatsArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RateRow {
    #[tabled(rename = "Interface")]
    name: String,
    #[tabled(rename = "Running")]
    running: String,
    #[tabled(rename = "RX")]
    rx: String,
    #[tabled(rename = "TX")]
    tx: String,
}

impl From<&InterfaceRate> for RateRow {
    fn from(r: &InterfaceRate) -> Self {
        Self {
            name: r.name.clone(),
            running: output::yes_no(r.is_running),
            rx: output::rate(r.rx_bytes_per_second),
            tx: output::rate(r.tx_bytes_per_second),
        }
    }
}

/// One device's poll as printed.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Sample {
    device: String,
    sampled_at: DateTime<Utc>,
    #[serde(flatten)]
    stats: DeviceStats,
}

fn render_sample(sample: &Sample, global: &GlobalOpts) -> Result<String, CliError> {
    if !matches!(global.output, OutputFormat::Table) {
        return output::render_single(global.output, sample, |_| String::new(), |s| {
            format!("{} {}", s.device, s.stats.cpu_load_percent)
        });
    }
    let header = format!(
        "{} @ {}  cpu {}%  free {:.1} MB  up {}",
        sample.device,
        sample.sampled_at.format("%H:%M:%S"),
        sample.stats.cpu_load_percent,
        sample.stats.free_memory_mb,
        sample.stats.uptime,
    );
    let table = output::render_list(
        OutputFormat::Table,
        &sample.stats.interfaces,
        |r| RateRow::from(r),
        |r| r.name.clone(),
    )?;
    Ok(format!("{header}\n{table}"))
}

/// Poll the selected device, or every device with `--all`. Returns the
/// number of devices that failed.
async fn poll_once(
    fleet: &CliFleet,
    device: Option<&str>,
    global: &GlobalOpts,
) -> Result<usize, CliError> {
    let sampled_at = Utc::now();

    let Some(device) = device else {
        let mut failed = 0;
        for outcome in fleet.poll_all().await {
            match outcome.result {
                Ok(stats) => {
                    let sample = Sample {
                        device: outcome.device_id,
                        sampled_at,
                        stats,
                    };
                    output::print_output(&render_sample(&sample, global)?, global.quiet);
                }
                Err(e) => {
                    failed += 1;
                    output::warning(&format!("{}: {e}", outcome.device_id));
                }
            }
        }
        return Ok(failed);
    };

    let stats = fleet.poll_stats(device).await?;
    let sample = Sample {
        device: device.to_owned(),
        sampled_at,
        stats,
    };
    output::print_output(&render_sample(&sample, global)?, global.quiet);
    Ok(0)
}

pub async fn handle(fleet: &CliFleet, args: StatsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let device = if args.all {
        None
    } else {
        Some(util::target_device(fleet, global)?)
    };

    let limit = match (args.watch, args.count) {
        (_, Some(n)) => Some(n.max(1)),
        (true, None) => None,
        (false, None) => Some(1),
    };

    let mut polls: u64 = 0;
    let failed = loop {
        let failed = poll_once(fleet, device.as_deref(), global).await?;
        polls += 1;
        debug!(polls, tracked = fleet.rates().len(), "stats poll complete");

        if limit.is_some_and(|n| polls >= n) {
            break failed;
        }
        tokio::select! {
            () = tokio::time::sleep(args.interval) => {}
            _ = tokio::signal::ctrl_c() => break failed,
        }
    };

    if failed > 0 {
        return Err(CliError::Incomplete { failed });
    }
    Ok(())
}
