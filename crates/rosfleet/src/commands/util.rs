//! Shared helpers for command handlers.

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::Path;

use rosfleet_core::{Params, ReconcileSummary};
use tabled::Tabled;

use crate::CliFleet;
use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

/// Device id a single-device command runs against.
pub fn target_device(fleet: &CliFleet, global: &GlobalOpts) -> Result<String, CliError> {
    config::active_device(global, fleet.inventory().config())
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.trim_end_matches('?').into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read a YAML or JSON list of attribute maps. Numbers and booleans are
/// converted to RouterOS value syntax.
pub fn read_desired(path: &Path) -> Result<Vec<Params>, CliError> {
    let invalid = |reason: String| CliError::Validation {
        field: "file".into(),
        reason: format!("{}: {reason}", path.display()),
    };
    let contents = std::fs::read_to_string(path)?;
    let rows: Vec<BTreeMap<String, serde_yaml::Value>> = serde_yaml::from_str(&contents)
        .map_err(|e| invalid(format!("expected a list of attribute maps: {e}")))?;

    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(key, value)| match value {
                    serde_yaml::Value::String(s) => Ok((key, s)),
                    serde_yaml::Value::Number(n) => Ok((key, n.to_string())),
                    serde_yaml::Value::Bool(b) => Ok((key, if b { "yes" } else { "no" }.into())),
                    _ => Err(invalid(format!("'{key}' must be a scalar"))),
                })
                .collect::<Result<Params, CliError>>()
        })
        .collect()
}

// ── Reconciliation summaries ────────────────────────────────────────

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Removed")]
    removed: usize,
    #[tabled(rename = "Added")]
    added: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
}

impl From<&ReconcileSummary> for SummaryRow {
    fn from(s: &ReconcileSummary) -> Self {
        Self {
            category: s.category.to_string(),
            removed: s.removed,
            added: s.added,
            failed: s.errors.len(),
        }
    }
}

/// Print reconciliation outcomes; per-object failures become warnings and
/// a non-zero exit.
pub fn report_summaries(
    summaries: &[ReconcileSummary],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = output::render_list(
        global.output,
        summaries,
        |s| SummaryRow::from(s),
        |s| format!("{} -{} +{}", s.category, s.removed, s.added),
    )?;
    output::print_output(&out, global.quiet);

    let mut failed = 0;
    for summary in summaries {
        for err in &summary.errors {
            failed += 1;
            output::warning(&format!(
                "{} {} {}: {}",
                summary.category, err.op, err.target, err.message
            ));
        }
    }
    if failed > 0 {
        return Err(CliError::Incomplete { failed });
    }
    Ok(())
}
