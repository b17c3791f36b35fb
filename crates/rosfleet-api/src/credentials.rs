// ── Device connection credentials ──
//
// Supplied by the caller for every operation. Nothing in this workspace
// persists them; the config crate only resolves them from files, env and
// the system keyring.

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;

use crate::transport::{TlsMode, TransportConfig};

/// Default port of the RouterOS `www-ssl` service.
pub const DEFAULT_PORT: u16 = 443;

/// Default deadline for opening a session.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything needed to open one session against one device.
#[derive(Clone)]
pub struct DeviceCredentials {
    pub host: String,
    pub user: String,
    pub password: SecretString,
    pub port: u16,
    pub timeout: Duration,
    pub tls: TlsMode,
}

impl DeviceCredentials {
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password,
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            tls: TlsMode::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    /// `host:port` as used in log lines and error messages.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}

impl fmt::Debug for DeviceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCredentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("tls", &self.tls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_password() {
        let creds = DeviceCredentials::new("10.0.0.1", "api", SecretString::from("hunter2"));
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn endpoint_includes_port() {
        let creds =
            DeviceCredentials::new("10.0.0.1", "api", SecretString::from("x")).with_port(8443);
        assert_eq!(creds.endpoint(), "10.0.0.1:8443");
    }
}
