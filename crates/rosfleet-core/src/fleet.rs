// ── Fleet service ──
//
// Ties the inventory, the connector and the shared rate calculator
// together: resolves device ids, hands out facades, and runs the polling
// and provisioning operations that span several facades.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use rosfleet_api::{Connector, DeviceCredentials, Params, Record};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::executor::execute;
use crate::facade::{
    DEFAULT_NTP_SERVERS, FirewallFacade, InterfaceFacade, IpFacade, NtpSchema, RoutingFacade,
    SystemFacade,
};
use crate::inventory::DeviceInventory;
use crate::model::{DeviceStats, Interface, InterfaceRate, SystemResource};
use crate::reconcile::ReconcileSummary;
use crate::session::SessionManager;
use crate::telemetry::RateCalculator;

/// Result of the one-shot initial provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub device_id: String,
    pub identity: String,
    pub ntp_schema: NtpSchema,
    pub dhcp_alert: ReconcileSummary,
}

/// Outcome of polling one device as part of [`Fleet::poll_all`].
#[derive(Debug)]
pub struct PollOutcome {
    pub device_id: String,
    pub result: Result<DeviceStats, CoreError>,
}

struct FleetInner<I, C: Connector> {
    inventory: I,
    connector: Arc<C>,
    sessions: SessionManager<C>,
    rates: Arc<RateCalculator>,
}

/// Entry point for operations addressed by device id. Cheap to clone.
pub struct Fleet<I, C: Connector> {
    inner: Arc<FleetInner<I, C>>,
}

impl<I, C: Connector> Clone for Fleet<I, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I: DeviceInventory, C: Connector> Fleet<I, C> {
    pub fn new(inventory: I, connector: Arc<C>, rates: Arc<RateCalculator>) -> Self {
        Self {
            inner: Arc::new(FleetInner {
                inventory,
                sessions: SessionManager::new(Arc::clone(&connector)),
                connector,
                rates,
            }),
        }
    }

    pub fn inventory(&self) -> &I {
        &self.inner.inventory
    }

    pub fn rates(&self) -> &Arc<RateCalculator> {
        &self.inner.rates
    }

    pub fn credentials(&self, device_id: &str) -> Result<DeviceCredentials, CoreError> {
        self.inner.inventory.lookup(device_id)
    }

    // ── Facades ──────────────────────────────────────────────────────

    pub fn interfaces(&self, device_id: &str) -> Result<InterfaceFacade<C>, CoreError> {
        Ok(InterfaceFacade::new(
            self.credentials(device_id)?,
            Arc::clone(&self.inner.connector),
        ))
    }

    pub fn ip(&self, device_id: &str) -> Result<IpFacade<C>, CoreError> {
        Ok(IpFacade::new(
            self.credentials(device_id)?,
            Arc::clone(&self.inner.connector),
        ))
    }

    pub fn routing(&self, device_id: &str) -> Result<RoutingFacade<C>, CoreError> {
        Ok(RoutingFacade::new(
            self.credentials(device_id)?,
            Arc::clone(&self.inner.connector),
        ))
    }

    pub fn firewall(&self, device_id: &str) -> Result<FirewallFacade<C>, CoreError> {
        Ok(FirewallFacade::new(
            self.credentials(device_id)?,
            Arc::clone(&self.inner.connector),
        ))
    }

    pub fn system(&self, device_id: &str) -> Result<SystemFacade<C>, CoreError> {
        Ok(SystemFacade::new(
            self.credentials(device_id)?,
            Arc::clone(&self.inner.connector),
        ))
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Poll resources and interface counters of one device.
    pub async fn poll_stats(&self, device_id: &str) -> Result<DeviceStats, CoreError> {
        let (resource, interfaces) = self.fetch_counters(device_id).await?;
        self.record_poll(device_id, &resource, &interfaces, Utc::now())
    }

    /// [`poll_stats`](Self::poll_stats) with an explicit sample time.
    pub async fn poll_stats_at(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DeviceStats, CoreError> {
        let (resource, interfaces) = self.fetch_counters(device_id).await?;
        self.record_poll(device_id, &resource, &interfaces, now)
    }

    /// Poll every inventory device concurrently, one session each.
    pub async fn poll_all(&self) -> Vec<PollOutcome> {
        let ids = self.inner.inventory.device_ids();
        join_all(ids.into_iter().map(|device_id| async move {
            let result = self.poll_stats(&device_id).await;
            PollOutcome { device_id, result }
        }))
        .await
    }

    async fn fetch_counters(
        &self,
        device_id: &str,
    ) -> Result<(Vec<Record>, Vec<Record>), CoreError> {
        let creds = self.credentials(device_id)?;
        self.inner
            .sessions
            .scoped(&creds, async |session| {
                let resource = execute(session, "/system/resource/print", &Params::new()).await?;
                let interfaces = execute(session, "/interface/print", &Params::new()).await?;
                Ok((resource, interfaces))
            })
            .await
    }

    fn record_poll(
        &self,
        device_id: &str,
        resource: &[Record],
        interfaces: &[Record],
        now: DateTime<Utc>,
    ) -> Result<DeviceStats, CoreError> {
        let resource = resource
            .first()
            .map(SystemResource::from)
            .ok_or_else(|| CoreError::Internal("/system/resource returned no rows".into()))?;

        let rates = &self.inner.rates;
        rates.begin_cycle(device_id);
        let interfaces = interfaces
            .iter()
            .map(Interface::from)
            .map(|iface| {
                let rate =
                    rates.compute_rate(device_id, &iface.name, iface.rx_bytes, iface.tx_bytes, now);
                InterfaceRate {
                    name: iface.name,
                    is_running: iface.running,
                    rx_bytes_per_second: rate.rx_bytes_per_second,
                    tx_bytes_per_second: rate.tx_bytes_per_second,
                }
            })
            .collect();
        rates.end_cycle(device_id);
        rates.evict_stale_except(now, &self.inner.inventory.device_ids());
        debug!(device = device_id, tracked = rates.len(), "poll recorded");

        Ok(DeviceStats {
            cpu_load_percent: resource.cpu_load,
            free_memory_mb: crate::convert::bytes_to_mb(resource.free_memory),
            uptime: resource.uptime,
            interfaces,
        })
    }

    // ── Provisioning ─────────────────────────────────────────────────

    /// Set identity, NTP and a rogue-DHCP alert on `local_interface`.
    /// Each step runs as its own operation; the first failure stops the
    /// sequence and earlier steps stay applied.
    pub async fn setup_initial(
        &self,
        device_id: &str,
        identity: &str,
        local_interface: &str,
    ) -> Result<ProvisionReport, CoreError> {
        let system = self.system(device_id)?;
        let servers: Vec<String> = DEFAULT_NTP_SERVERS.iter().map(|s| (*s).to_owned()).collect();

        system.set_identity(identity).await?;
        let ntp_schema = system.set_ntp(&servers).await?;
        let dhcp_alert = system.set_dhcp_alert(local_interface).await?;

        info!(
            device = device_id,
            identity,
            interface = local_interface,
            "initial provisioning complete"
        );
        Ok(ProvisionReport {
            device_id: device_id.to_owned(),
            identity: identity.to_owned(),
            ntp_schema,
            dhcp_alert,
        })
    }
}
