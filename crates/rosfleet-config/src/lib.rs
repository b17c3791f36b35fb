//! Shared configuration for rosfleet.
//!
//! TOML device inventory, credential resolution (env + keyring +
//! plaintext), and translation to `rosfleet_core::DeviceCredentials`.
//! The CLI layers its flag overrides on top of these helpers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use rosfleet_core::{CoreError, DeviceCredentials, DeviceInventory, EvictionPolicy, TlsMode};

/// Keyring service name under which device passwords are stored.
pub const KEYRING_SERVICE: &str = "rosfleet";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "ROSFLEET_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown device '{device}'")]
    UnknownDevice { device: String },

    #[error("no password configured for device '{device}'")]
    NoCredentials { device: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownDevice { device } => CoreError::not_found("device", device),
            ConfigError::NoCredentials { .. } => CoreError::AuthenticationFailed {
                message: err.to_string(),
            },
            other => CoreError::Config {
                message: other.to_string(),
            },
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Device used when `--device` is not given.
    pub default_device: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub telemetry: TelemetrySettings,

    /// Device inventory keyed by device id.
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceProfile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Session acquisition timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Accept self-signed certificates (the RouterOS factory default).
    #[serde(default = "default_insecure")]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            port: default_port(),
            insecure: default_insecure(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    15
}
fn default_port() -> u16 {
    443
}
fn default_insecure() -> bool {
    true
}

/// Rate-history eviction knobs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TelemetrySettings {
    #[serde(default = "default_max_missed_cycles")]
    pub max_missed_cycles: u64,

    #[serde(default = "default_max_idle_secs")]
    pub max_idle_secs: u64,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            max_missed_cycles: default_max_missed_cycles(),
            max_idle_secs: default_max_idle_secs(),
        }
    }
}

impl TelemetrySettings {
    pub fn eviction_policy(&self) -> EvictionPolicy {
        EvictionPolicy {
            max_missed_cycles: self.max_missed_cycles,
            max_idle: Duration::from_secs(self.max_idle_secs),
        }
    }
}

fn default_max_missed_cycles() -> u64 {
    3
}
fn default_max_idle_secs() -> u64 {
    600
}

/// One managed device.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DeviceProfile {
    pub host: String,

    #[serde(default = "default_user")]
    pub user: String,

    /// Environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Plaintext password (prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Override `defaults.insecure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// PEM file of the CA that signed the device certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Use the plain `www` service instead of `www-ssl`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub plain_http: bool,

    /// Override `defaults.timeout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

fn default_user() -> String {
    "admin".into()
}

impl Config {
    pub fn device(&self, device: &str) -> Result<&DeviceProfile, ConfigError> {
        self.devices
            .get(device)
            .ok_or_else(|| ConfigError::UnknownDevice {
                device: device.into(),
            })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$ROSFLEET_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("io", "rosfleet", "rosfleet").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("rosfleet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Nested keys in the environment use a double underscore:
/// `ROSFLEET_DEFAULTS__TIMEOUT=30`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ROSFLEET_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(device: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{device}/password"))
}

/// Resolve a device password: `password_env` → system keyring →
/// plaintext.
pub fn resolve_password(profile: &DeviceProfile, device: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(profile, device, |name| std::env::var(name).ok())
}

/// [`resolve_password`] with an explicit environment lookup.
pub fn resolve_password_with(
    profile: &DeviceProfile,
    device: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Some(val) = env(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(device) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        device: device.into(),
    })
}

/// Store a device password in the system keyring.
pub fn store_password(device: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(device)?.set_password(password)?;
    Ok(())
}

/// TLS mode for a profile under the given defaults.
pub fn tls_mode(profile: &DeviceProfile, defaults: &Defaults) -> TlsMode {
    if profile.plain_http {
        TlsMode::Plain
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else {
        TlsMode::System
    }
}

/// Build `DeviceCredentials` from a profile and an already-resolved
/// password.
pub fn profile_to_credentials(
    profile: &DeviceProfile,
    defaults: &Defaults,
    password: SecretString,
) -> Result<DeviceCredentials, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(
        DeviceCredentials::new(profile.host.clone(), profile.user.clone(), password)
            .with_port(profile.port.unwrap_or(defaults.port))
            .with_timeout(timeout)
            .with_tls(tls_mode(profile, defaults)),
    )
}

// ── Inventory ───────────────────────────────────────────────────────

/// `DeviceInventory` backed by the `[devices]` table.
///
/// Passwords are resolved on every lookup so keyring changes apply
/// without a restart. A password set with [`with_password`] wins over
/// every configured source.
///
/// [`with_password`]: ConfigInventory::with_password
#[derive(Debug, Clone)]
pub struct ConfigInventory {
    config: Config,
    passwords: BTreeMap<String, SecretString>,
}

impl ConfigInventory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            passwords: BTreeMap::new(),
        }
    }

    /// Use `password` for `device_id` instead of the configured chain.
    pub fn with_password(mut self, device_id: impl Into<String>, password: SecretString) -> Self {
        self.passwords.insert(device_id.into(), password);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Credentials for `device_id`, keeping the config-level error.
    pub fn resolve(&self, device_id: &str) -> Result<DeviceCredentials, ConfigError> {
        let profile = self.config.device(device_id)?;
        let password = match self.passwords.get(device_id) {
            Some(password) => password.clone(),
            None => resolve_password(profile, device_id)?,
        };
        profile_to_credentials(profile, &self.config.defaults, password)
    }
}

impl DeviceInventory for ConfigInventory {
    fn lookup(&self, device_id: &str) -> Result<DeviceCredentials, CoreError> {
        Ok(self.resolve(device_id)?)
    }

    fn device_ids(&self) -> Vec<String> {
        self.config.devices.keys().cloned().collect()
    }
}
