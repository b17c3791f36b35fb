// ── System ──
//
// Identity, resources, NTP, DHCP rogue-server alerts and power control.
//
// NTP client settings changed shape between RouterOS 6 and 7: v7 takes a
// `servers` list, v6 takes `primary-ntp`/`secondary-ntp`. `set_ntp` walks
// `NtpSchema::ATTEMPT_ORDER` and moves on only when the device rejects an
// unknown parameter.

use std::sync::Arc;

use rosfleet_api::{Connector, DeviceCredentials, Params, Record};
use serde::Serialize;
use strum::Display;
use tracing::{debug, info};

use super::Link;
use crate::convert::bytes_to_mb;
use crate::error::CoreError;
use crate::executor::execute;
use crate::model::{SystemInfo, SystemResource};
use crate::reconcile::{self, Category, ReconcileSummary};

/// NTP servers used when the caller names none.
pub const DEFAULT_NTP_SERVERS: &[&str] = &["202.169.224.70", "162.159.200.1"];

const DHCP_ALERT_SCRIPT: &str = ":log error \"ROGUE DHCP SERVER DETECTED\"";

/// Parameter layouts of `/system/ntp/client/set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NtpSchema {
    /// `servers=a,b` (RouterOS 7).
    Servers,
    /// `primary-ntp=a secondary-ntp=b` (RouterOS 6).
    PrimarySecondary,
}

impl NtpSchema {
    /// Newest first. One fallback at most.
    pub const ATTEMPT_ORDER: [NtpSchema; 2] = [NtpSchema::Servers, NtpSchema::PrimarySecondary];

    pub fn params(self, servers: &[String]) -> Params {
        let params = Params::new().attr("enabled", "yes");
        match self {
            Self::Servers => params.attr("servers", servers.join(",")),
            Self::PrimarySecondary => {
                let mut params = params;
                if let Some(primary) = servers.first() {
                    params.set("primary-ntp", primary);
                }
                if let Some(secondary) = servers.get(1) {
                    params.set("secondary-ntp", secondary);
                }
                params
            }
        }
    }
}

/// Device-wide settings and power control.
pub struct SystemFacade<C: Connector> {
    link: Link<C>,
}

impl<C: Connector> SystemFacade<C> {
    pub fn new(credentials: DeviceCredentials, connector: Arc<C>) -> Self {
        Self {
            link: Link::new(credentials, connector),
        }
    }

    pub async fn resource(&self) -> Result<SystemResource, CoreError> {
        let rows = self
            .link
            .command("/system/resource/print", &Params::new())
            .await?;
        first(&rows, "/system/resource").map(SystemResource::from)
    }

    pub async fn identity(&self) -> Result<String, CoreError> {
        let rows = self
            .link
            .command("/system/identity/print", &Params::new())
            .await?;
        Ok(first(&rows, "/system/identity")?.text("name").unwrap_or_default())
    }

    /// Identity, RouterBOARD and resource details in one session.
    pub async fn system_info(&self) -> Result<SystemInfo, CoreError> {
        self.link
            .run(async |session| {
                let identity = execute(session, "/system/identity/print", &Params::new()).await?;
                let board = execute(session, "/system/routerboard/print", &Params::new()).await?;
                let resource = execute(session, "/system/resource/print", &Params::new()).await?;

                let resource = SystemResource::from(first(&resource, "/system/resource")?);
                let board = board.first();
                Ok(SystemInfo {
                    identity: first(&identity, "/system/identity")?
                        .text("name")
                        .unwrap_or_default(),
                    model: board
                        .and_then(|b| b.text("model"))
                        .unwrap_or_else(|| "Generic".into()),
                    serial_number: board.and_then(|b| b.text("serial-number")),
                    firmware: board.and_then(|b| b.text("current-firmware")),
                    version: resource.version,
                    uptime: resource.uptime,
                    cpu_load_percent: resource.cpu_load,
                    free_memory_mb: bytes_to_mb(resource.free_memory),
                })
            })
            .await
    }

    pub async fn set_identity(&self, name: &str) -> Result<(), CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "identity must not be empty".into(),
            });
        }
        self.link
            .command("/system/identity/set", &Params::new().attr("name", name))
            .await?;
        info!(host = %self.link.credentials().host, identity = name, "identity set");
        Ok(())
    }

    /// Enable the NTP client with `servers`, returning the schema the
    /// device accepted.
    pub async fn set_ntp(&self, servers: &[String]) -> Result<NtpSchema, CoreError> {
        if servers.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "at least one NTP server is required".into(),
            });
        }
        let schema = self
            .link
            .run(async |session| {
                let mut schemas = NtpSchema::ATTEMPT_ORDER.into_iter().peekable();
                while let Some(schema) = schemas.next() {
                    match execute(session, "/system/ntp/client/set", &schema.params(servers)).await
                    {
                        Ok(_) => return Ok(schema),
                        Err(err) if err.is_unknown_parameter() && schemas.peek().is_some() => {
                            debug!(%schema, error = %err, "NTP schema not supported, falling back");
                        }
                        Err(err) => return Err(err),
                    }
                }
                Err(CoreError::Internal("no NTP schema to try".into()))
            })
            .await?;
        info!(host = %self.link.credentials().host, %schema, "NTP client configured");
        Ok(schema)
    }

    /// Replace the managed rogue-DHCP alert on `interface`.
    pub async fn set_dhcp_alert(&self, interface: &str) -> Result<ReconcileSummary, CoreError> {
        let alert = Params::new()
            .attr("interface", interface)
            .attr("on-alert", DHCP_ALERT_SCRIPT)
            .attr("disabled", "no");
        let scope = Params::new().query("interface", interface);
        self.link
            .run(async |session| {
                let desired = std::slice::from_ref(&alert);
                reconcile::reconcile_within(session, Category::DhcpAlert, &scope, desired).await
            })
            .await
    }

    /// Reboot. The device dropping the link counts as success.
    pub async fn reboot(&self) -> Result<(), CoreError> {
        self.link.command("/system/reboot", &Params::new()).await?;
        info!(host = %self.link.credentials().host, "reboot issued");
        Ok(())
    }

    /// Power off. The device dropping the link counts as success.
    pub async fn shutdown(&self) -> Result<(), CoreError> {
        self.link.command("/system/shutdown", &Params::new()).await?;
        info!(host = %self.link.credentials().host, "shutdown issued");
        Ok(())
    }
}

/// First row of a single-row menu.
fn first<'a>(rows: &'a [Record], menu: &str) -> Result<&'a Record, CoreError> {
    rows.first()
        .ok_or_else(|| CoreError::Internal(format!("{menu} returned no rows")))
}
