use thiserror::Error;

/// Top-level error type for the `rosfleet-api` crate.
///
/// Covers every failure mode of the command client: establishing a
/// session, transport failures mid-session, and command rejections.
/// `rosfleet-core` maps these into its connection / command taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session establishment ───────────────────────────────────────
    /// The device refused the supplied credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The device could not be reached (refused, no route, DNS failure).
    #[error("Device {host} unreachable: {reason}")]
    Unreachable { host: String, reason: String },

    /// No response before the configured deadline.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// URL construction failed (bad host or port).
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Mid-session transport ───────────────────────────────────────
    /// The device closed or reset the connection before answering.
    #[error("Connection dropped by device: {reason}")]
    ConnectionDropped { reason: String },

    /// Any other HTTP transport failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The session was already closed by its owner.
    #[error("Session already closed")]
    SessionClosed,

    // ── Commands ────────────────────────────────────────────────────
    /// The device rejected the command (bad parameter, unknown path,
    /// permission denied). `message` is the device-supplied reason.
    #[error("Command rejected: {message}")]
    Rejected { message: String, status: Option<u16> },

    /// The device answered with a body that is not a record list.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for failures that mean the session is unusable
    /// (as opposed to a single command being refused).
    pub fn is_connection(&self) -> bool {
        !matches!(self, Self::Rejected { .. } | Self::Deserialization { .. })
    }

    /// Returns `true` if the device dropped the link mid-command.
    pub fn is_connection_drop(&self) -> bool {
        matches!(self, Self::ConnectionDropped { .. })
    }

    /// The device-supplied rejection reason, if this is a rejection.
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }
}
