//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use rosfleet_config::ConfigError;
use rosfleet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {host}: {reason}")]
    #[diagnostic(
        code(rosfleet::connection_failed),
        help(
            "Check that the device is reachable and the REST API service (www-ssl) is enabled.\n\
             Try: rosfleet system info --insecure"
        )
    )]
    ConnectionFailed { host: String, reason: String },

    #[error("Connection lost: {reason}")]
    #[diagnostic(code(rosfleet::connection_dropped))]
    ConnectionDropped { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(rosfleet::auth_failed),
        help(
            "Verify the user and password for this device.\n\
             Run: rosfleet config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No password configured for device '{device}'")]
    #[diagnostic(
        code(rosfleet::no_credentials),
        help(
            "Store one with: rosfleet config set-password {device}\n\
             Or set password_env in the device profile."
        )
    )]
    NoCredentials { device: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(rosfleet::not_found),
        help("Run: rosfleet {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Device rejected {path}: {message}")]
    #[diagnostic(code(rosfleet::rejected))]
    Rejected { path: String, message: String },

    #[error("{failed} of the requested changes failed")]
    #[diagnostic(
        code(rosfleet::incomplete),
        help("The summary above lists each failed object. Re-running retries them.")
    )]
    Incomplete { failed: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rosfleet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No device selected")]
    #[diagnostic(
        code(rosfleet::no_device),
        help(
            "Pass --device <id> or --host <address>, or set default_device.\n\
             Configured devices: {available}\n\
             Config file: {path}"
        )
    )]
    NoDevice { available: String, path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(rosfleet::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(rosfleet::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out after {seconds}s opening a session")]
    #[diagnostic(
        code(rosfleet::timeout),
        help("Increase the timeout with --timeout or check the device's load.")
    )]
    Timeout { seconds: u64 },

    // ── Internal / IO / Serialization ────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(rosfleet::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render output: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ConnectionDropped { .. } => {
                exit_code::CONNECTION
            }
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NoDevice { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

fn list_command(entity_type: &str) -> String {
    match entity_type {
        "device" => "config show".into(),
        "interface" => "interfaces list".into(),
        other => format!("{other}s list"),
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { host, reason } => {
                CliError::ConnectionFailed { host, reason }
            }

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::ConnectionDropped { reason } => CliError::ConnectionDropped { reason },

            CoreError::Command { path, message } => CliError::Rejected { path, message },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: list_command(&entity_type),
                resource_type: entity_type,
                identifier,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { device } => CliError::NoCredentials { device },
            ConfigError::UnknownDevice { device } => CliError::NotFound {
                resource_type: "device".into(),
                identifier: device,
                list_command: list_command("device"),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(err) => CliError::Io(err),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_exit_codes() {
        let cases = [
            (
                CoreError::ConnectionFailed {
                    host: "10.0.0.1".into(),
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::AuthenticationFailed {
                    message: "invalid user name or password".into(),
                },
                exit_code::AUTH,
            ),
            (CoreError::Timeout { timeout_secs: 15 }, exit_code::TIMEOUT),
            (CoreError::not_found("interface", "ether9"), exit_code::NOT_FOUND),
            (
                CoreError::Command {
                    path: "/ip/address/add".into(),
                    message: "invalid value for argument address".into(),
                },
                exit_code::REJECTED,
            ),
            (
                CoreError::ValidationFailed {
                    message: "bad cidr".into(),
                },
                exit_code::USAGE,
            ),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn not_found_points_at_list_command() {
        let err = CliError::from(CoreError::not_found("interface", "ether9"));
        let CliError::NotFound { list_command, .. } = err else {
            panic!("expected NotFound");
        };
        assert_eq!(list_command, "interfaces list");
    }
}
