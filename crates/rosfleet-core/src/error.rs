// ── Core error types ──
//
// Three failure families matter to callers: the device could not be
// reached (connection), the device refused one command (command), or a
// referenced device/interface does not exist (not found). The
// `From<rosfleet_api::Error>` impl sorts transport failures into them.

use serde::Serialize;
use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to device at {host}: {reason}")]
    ConnectionFailed { host: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Device connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Device dropped the connection: {reason}")]
    ConnectionDropped { reason: String },

    // ── Command errors ───────────────────────────────────────────────
    /// The device refused a command. `message` is the device's reason.
    #[error("Command {path} rejected: {message}")]
    Command { path: String, message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error family, as reported in structured failure payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Connection,
    Command,
    NotFound,
    InvalidInput,
    Config,
    Internal,
}

/// `{category, message}` payload handed to API consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub category: ErrorCategory,
    pub message: String,
}

impl CoreError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Attach the command path to an API error. Rejections become
    /// `Command`; everything else converts as usual.
    pub fn from_command(path: &str, err: rosfleet_api::Error) -> Self {
        match err {
            rosfleet_api::Error::Rejected { message, .. } => Self::Command {
                path: path.to_owned(),
                message,
            },
            rosfleet_api::Error::Deserialization { message, .. } => Self::Command {
                path: path.to_owned(),
                message: format!("unreadable reply: {message}"),
            },
            other => other.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConnectionFailed { .. }
            | Self::AuthenticationFailed { .. }
            | Self::Timeout { .. }
            | Self::ConnectionDropped { .. } => ErrorCategory::Connection,
            Self::Command { .. } => ErrorCategory::Command,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::ValidationFailed { .. } => ErrorCategory::InvalidInput,
            Self::Config { .. } => ErrorCategory::Config,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// `true` when the whole operation is lost, not just one command.
    pub fn is_connection(&self) -> bool {
        self.category() == ErrorCategory::Connection
    }

    /// `true` for a rejection whose reason names an unrecognised
    /// parameter (older firmware answering a newer schema).
    pub fn is_unknown_parameter(&self) -> bool {
        match self {
            Self::Command { message, .. } => {
                let message = message.to_ascii_lowercase();
                message.contains("unknown parameter")
                    || message.contains("unknown attribute")
                    || message.contains("expected end of command")
            }
            _ => false,
        }
    }

    /// The device-supplied reason for a command rejection.
    pub fn device_message(&self) -> Option<&str> {
        match self {
            Self::Command { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Structured `{category, message}` form for API consumers.
    pub fn to_failure(&self) -> Failure {
        let message = match self {
            Self::Command { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Failure {
            category: self.category(),
            message,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<rosfleet_api::Error> for CoreError {
    fn from(err: rosfleet_api::Error) -> Self {
        match err {
            rosfleet_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            rosfleet_api::Error::Unreachable { host, reason } => {
                CoreError::ConnectionFailed { host, reason }
            }
            rosfleet_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            rosfleet_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                host: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            rosfleet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid device address: {e}"),
            },
            rosfleet_api::Error::ConnectionDropped { reason } => {
                CoreError::ConnectionDropped { reason }
            }
            rosfleet_api::Error::Transport(e) => CoreError::ConnectionFailed {
                host: e
                    .url()
                    .and_then(|u| u.host_str().map(String::from))
                    .unwrap_or_default(),
                reason: e.to_string(),
            },
            rosfleet_api::Error::SessionClosed => {
                CoreError::Internal("command issued on a closed session".into())
            }
            rosfleet_api::Error::Rejected { message, .. } => CoreError::Command {
                path: String::new(),
                message,
            },
            rosfleet_api::Error::Deserialization { message, .. } => {
                CoreError::Internal(format!("unreadable device reply: {message}"))
            }
        }
    }
}
