//! Config subcommand handlers.

use std::fmt::Write as _;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with plaintext passwords masked.
fn redacted(mut cfg: Config) -> Config {
    for profile in cfg.devices.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(MASK.into());
        }
    }
    cfg
}

fn detail(cfg: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Default device: {}",
        output::or_dash(cfg.default_device.as_deref())
    );
    let _ = writeln!(
        out,
        "Defaults:       output={} timeout={}s port={} insecure={}",
        cfg.defaults.output, cfg.defaults.timeout, cfg.defaults.port, cfg.defaults.insecure
    );
    let _ = writeln!(
        out,
        "Telemetry:      max_missed_cycles={} max_idle_secs={}",
        cfg.telemetry.max_missed_cycles, cfg.telemetry.max_idle_secs
    );
    if cfg.devices.is_empty() {
        let _ = write!(out, "Devices:        (none)");
        return out;
    }
    let _ = write!(out, "Devices:");
    for (id, p) in &cfg.devices {
        let secret = match (&p.password_env, &p.password) {
            (Some(var), _) => format!("env {var}"),
            (None, Some(_)) => format!("plaintext {MASK}"),
            (None, None) => "keyring".into(),
        };
        let scheme = if p.plain_http { "http" } else { "https" };
        let port = p.port.unwrap_or(cfg.defaults.port);
        let _ = write!(
            out,
            "\n  {id}: {}@{scheme}://{}:{port} (password: {secret})",
            p.user, p.host
        );
    }
    out
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = redacted(config::load_config()?);
            let out = output::render_single(global.output, &cfg, detail, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { device } => {
            let cfg = config::load_config()?;
            let device = match device {
                Some(id) => id,
                None => config::active_device(global, &cfg)?,
            };
            cfg.device(&device)?;

            let password =
                rpassword::prompt_password(format!("Password for {device}: ")).map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            config::store_password(&device, &password)?;
            output::success(
                &format!("Password stored in system keyring for '{device}'"),
                global.quiet,
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use rosfleet_config::DeviceProfile;

    use super::*;

    #[test]
    fn plaintext_passwords_are_masked() {
        let mut cfg = Config::default();
        cfg.devices.insert(
            "core-1".into(),
            DeviceProfile {
                host: "10.0.0.1".into(),
                user: "admin".into(),
                password: Some("hunter2".into()),
                ..DeviceProfile::default()
            },
        );
        cfg.devices.insert(
            "edge".into(),
            DeviceProfile {
                host: "10.0.0.2".into(),
                user: "ops".into(),
                password_env: Some("EDGE_PASS".into()),
                plain_http: true,
                ..DeviceProfile::default()
            },
        );

        let cfg = redacted(cfg);
        let text = detail(&cfg);

        assert!(!text.contains("hunter2"));
        assert!(text.contains("core-1: admin@https://10.0.0.1:443 (password: plaintext ****)"));
        assert!(text.contains("edge: ops@http://10.0.0.2:443 (password: env EDGE_PASS)"));
    }
}
