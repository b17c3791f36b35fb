//! CLI configuration: thin wrapper around `rosfleet_config`.
//!
//! Re-exports the shared types and folds `GlobalOpts` flag overrides
//! (--host, --password, --insecure, --timeout) into the loaded config
//! before it becomes the fleet inventory.

use rosfleet_config::DeviceProfile;
use secrecy::SecretString;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use rosfleet_config::{Config, ConfigInventory, config_path, load_config, store_password};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Apply flag overrides in place.
///
/// `--host` registers a one-off device under the host name and makes it
/// the default. `--user`, `--port` and `--plain-http` apply to the
/// selected device only.
pub fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(timeout) = global.timeout {
        cfg.defaults.timeout = timeout;
    }
    if global.insecure {
        cfg.defaults.insecure = true;
        for profile in cfg.devices.values_mut() {
            profile.insecure = Some(true);
        }
    }

    if let Some(ref host) = global.host {
        cfg.devices.entry(host.clone()).or_insert_with(|| DeviceProfile {
            host: host.clone(),
            user: "admin".into(),
            ..DeviceProfile::default()
        });
        cfg.default_device = Some(host.clone());
    }

    let selected = global
        .device
        .clone()
        .or_else(|| global.host.clone())
        .or_else(|| cfg.default_device.clone());
    let Some(profile) = selected.and_then(|id| cfg.devices.get_mut(&id)) else {
        return;
    };
    if let Some(ref user) = global.user {
        profile.user.clone_from(user);
    }
    if let Some(port) = global.port {
        profile.port = Some(port);
    }
    if global.plain_http {
        profile.plain_http = true;
    }
}

/// Build the fleet inventory. `--password` binds to the selected device.
pub fn inventory(cfg: Config, global: &GlobalOpts) -> ConfigInventory {
    let selected = active_device(global, &cfg).ok();
    let inventory = ConfigInventory::new(cfg);
    match (selected, &global.password) {
        (Some(device), Some(password)) => {
            inventory.with_password(device, SecretString::from(password.clone()))
        }
        _ => inventory,
    }
}

/// Resolve the device a single-device command targets.
///
/// `--device` > `--host` > `default_device` > the only configured device.
pub fn active_device(global: &GlobalOpts, cfg: &Config) -> Result<String, CliError> {
    if let Some(id) = global.device.as_ref().or(global.host.as_ref()) {
        return Ok(id.clone());
    }
    if let Some(ref id) = cfg.default_device {
        return Ok(id.clone());
    }
    let mut ids = cfg.devices.keys();
    match (ids.next(), ids.next()) {
        (Some(only), None) => Ok(only.clone()),
        _ => Err(CliError::NoDevice {
            available: available_devices(cfg),
            path: config_path().display().to_string(),
        }),
    }
}

/// Comma-separated device ids, or `(none)`.
pub fn available_devices(cfg: &Config) -> String {
    if cfg.devices.is_empty() {
        "(none)".into()
    } else {
        cfg.devices.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
