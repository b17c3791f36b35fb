// RouterOS REST command bridge
//
// RouterOS 7 exposes every console command at `POST /rest/<menu>/<command>`.
// Attributes travel as JSON fields and `print` queries under `.query`, which
// gives the same command/attribute/record model as the binary API without
// byte-level framing. Auth is HTTP basic on every request.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::client::{Connector, DeviceSession};
use crate::credentials::DeviceCredentials;
use crate::error::Error;
use crate::params::Params;
use crate::record::Record;

/// Command issued by `connect` to verify the credentials.
const PROBE_PATH: &str = "/system/identity/print";

const PREVIEW_CHARS: usize = 200;

/// RouterOS reports failures as `{"error":400,"message":"Bad Request","detail":"..."}`.
#[derive(Deserialize)]
struct RestFailure {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Opens [`RestSession`]s. Stateless, so one instance serves a whole fleet.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestConnector;

impl RestConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for RestConnector {
    type Session = RestSession;

    async fn connect(&self, credentials: &DeviceCredentials) -> Result<RestSession, Error> {
        let mut session = RestSession::open(credentials)?;
        debug!(endpoint = %credentials.endpoint(), "verifying credentials");
        session.write(PROBE_PATH, &Params::new()).await?;
        Ok(session)
    }
}

/// One authenticated session over the REST command bridge.
pub struct RestSession {
    http: reqwest::Client,
    base_url: Url,
    host: String,
    user: String,
    password: SecretString,
    timeout_secs: u64,
    closed: bool,
}

impl RestSession {
    /// Build the HTTP client and base URL without touching the network.
    pub fn open(credentials: &DeviceCredentials) -> Result<Self, Error> {
        let transport = credentials.transport();
        let base_url = Url::parse(&format!(
            "{}://{}:{}/rest",
            transport.tls.scheme(),
            credentials.host,
            credentials.port
        ))?;
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            host: credentials.host.clone(),
            user: credentials.user.clone(),
            password: credentials.password.clone(),
            timeout_secs: transport.timeout.as_secs(),
            closed: false,
        })
    }

    /// The `/rest` root this session posts to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn command_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else if err.is_connect() {
            Error::Unreachable {
                host: self.host.clone(),
                reason: err.to_string(),
            }
        } else if err.is_request() || err.is_body() {
            Error::ConnectionDropped {
                reason: err.to_string(),
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Map an HTTP response to records, a rejection, or an auth failure.
    async fn parse_response(&self, resp: reqwest::Response) -> Result<Vec<Record>, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("device {} refused the credentials", self.host),
            });
        }

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<RestFailure>(&body) {
                Ok(failure) => failure
                    .detail
                    .or(failure.message)
                    .unwrap_or_else(|| format!("HTTP {status}")),
                Err(_) => format!("HTTP {status}: {}", preview(&body)),
            };
            return Err(Error::Rejected {
                message,
                status: Some(status.as_u16()),
            });
        }

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| record_from(item, &body))
                .collect(),
            Value::Object(_) => Ok(vec![record_from(value, &body)?]),
            _ => Err(Error::Deserialization {
                message: "expected a record or a list of records".into(),
                body,
            }),
        }
    }
}

impl DeviceSession for RestSession {
    async fn write(&mut self, path: &str, params: &Params) -> Result<Vec<Record>, Error> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        let url = self.command_url(path)?;
        debug!(host = %self.host, path, "POST {url}");
        trace!(params = %params.summary(), "command attributes");

        let resp = self
            .http
            .post(url)
            .basic_auth(&self.user, Some(self.password.expose_secret()))
            .json(&params.to_json())
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        self.parse_response(resp).await
    }

    async fn close(&mut self) {
        if !self.closed {
            trace!(host = %self.host, "session closed");
            self.closed = true;
        }
    }
}

fn record_from(value: Value, body: &str) -> Result<Record, Error> {
    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    })
}

fn preview(body: &str) -> String {
    body.chars().take(PREVIEW_CHARS).collect()
}
