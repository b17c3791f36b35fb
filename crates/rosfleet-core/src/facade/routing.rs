// ── Routing ──
//
// Static routes plus the recursive failover preset: each uplink gets a
// host route to a probe address, and a default route via that probe which
// is health-checked by ping. The primary pair goes in before the backup
// pair so distances apply in that order.

use std::net::IpAddr;
use std::sync::Arc;

use rosfleet_api::{Connector, DeviceCredentials, Params};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Link, created_id};
use crate::error::CoreError;
use crate::model::Route;
use crate::reconcile::{self, Category, MANAGED_MARKER, ReconcileSummary};

/// A route to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// `None` leaves the device default (`0.0.0.0/0`).
    pub dst_address: Option<String>,
    pub gateway: String,
    pub distance: Option<u8>,
    pub scope: Option<u8>,
    pub target_scope: Option<u8>,
    pub check_gateway: Option<String>,
}

impl RouteSpec {
    pub fn new(dst_address: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            dst_address: Some(dst_address.into()),
            ..Self::via(gateway)
        }
    }

    /// Default route via `gateway`.
    pub fn via(gateway: impl Into<String>) -> Self {
        Self {
            dst_address: None,
            gateway: gateway.into(),
            distance: None,
            scope: None,
            target_scope: None,
            check_gateway: None,
        }
    }

    pub fn distance(mut self, distance: u8) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn scope(mut self, scope: u8) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn target_scope(mut self, target_scope: u8) -> Self {
        self.target_scope = Some(target_scope);
        self
    }

    pub fn check_gateway(mut self, method: impl Into<String>) -> Self {
        self.check_gateway = Some(method.into());
        self
    }

    pub fn to_params(&self) -> Params {
        let mut params = Params::new().attr("gateway", &self.gateway);
        if let Some(dst) = &self.dst_address {
            params.set("dst-address", dst);
        }
        if let Some(distance) = self.distance {
            params.set("distance", distance.to_string());
        }
        if let Some(scope) = self.scope {
            params.set("scope", scope.to_string());
        }
        if let Some(target_scope) = self.target_scope {
            params.set("target-scope", target_scope.to_string());
        }
        if let Some(check) = &self.check_gateway {
            params.set("check-gateway", check);
        }
        params
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.gateway.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "route gateway must not be empty".into(),
            });
        }
        if !is_gateway(&self.gateway) {
            return Err(CoreError::ValidationFailed {
                message: format!(
                    "route gateway '{}' is not an address, an interface or address%interface",
                    self.gateway
                ),
            });
        }
        Ok(())
    }
}

/// `10.0.0.1`, `ether1` or `fe80::1%ether1`.
fn is_gateway(gateway: &str) -> bool {
    match gateway.split_once('%') {
        Some((addr, iface)) => addr.parse::<IpAddr>().is_ok() && is_interface_name(iface),
        None => gateway.parse::<IpAddr>().is_ok() || is_interface_name(gateway),
    }
}

fn is_interface_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | ',' | '%'))
}

/// Recursive failover between two uplinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverPlan {
    pub primary_gateway: String,
    pub backup_gateway: String,
    pub primary_probe: String,
    pub backup_probe: String,
}

impl FailoverPlan {
    pub const PRIMARY_PROBE: &'static str = "8.8.8.8";
    pub const BACKUP_PROBE: &'static str = "1.1.1.1";

    pub fn new(primary_gateway: impl Into<String>, backup_gateway: impl Into<String>) -> Self {
        Self {
            primary_gateway: primary_gateway.into(),
            backup_gateway: backup_gateway.into(),
            primary_probe: Self::PRIMARY_PROBE.into(),
            backup_probe: Self::BACKUP_PROBE.into(),
        }
    }

    /// The four routes, primary path first.
    pub fn routes(&self) -> Vec<RouteSpec> {
        vec![
            RouteSpec::new(&self.primary_probe, &self.primary_gateway).scope(10),
            RouteSpec::via(&self.primary_probe)
                .check_gateway("ping")
                .distance(1)
                .target_scope(30),
            RouteSpec::new(&self.backup_probe, &self.backup_gateway).scope(10),
            RouteSpec::via(&self.backup_probe)
                .check_gateway("ping")
                .distance(2)
                .target_scope(30),
        ]
    }
}

/// Static routing.
pub struct RoutingFacade<C: Connector> {
    link: Link<C>,
}

impl<C: Connector> RoutingFacade<C> {
    pub fn new(credentials: DeviceCredentials, connector: Arc<C>) -> Self {
        Self {
            link: Link::new(credentials, connector),
        }
    }

    pub async fn list_routes(&self) -> Result<Vec<Route>, CoreError> {
        self.link.list("/ip/route").await
    }

    /// Add one managed route. Returns its `.id`.
    pub async fn add_route(&self, route: &RouteSpec) -> Result<String, CoreError> {
        route.validate()?;
        let rows = self
            .link
            .command(
                "/ip/route/add",
                &route.to_params().attr("comment", MANAGED_MARKER),
            )
            .await?;
        Ok(created_id(&rows).unwrap_or_default())
    }

    /// Remove every managed route.
    pub async fn clear_managed_routes(&self) -> Result<ReconcileSummary, CoreError> {
        self.reconcile_routes(&[]).await
    }

    /// Make the managed routes equal to `desired`, created in order.
    pub async fn reconcile_routes(
        &self,
        desired: &[RouteSpec],
    ) -> Result<ReconcileSummary, CoreError> {
        for route in desired {
            route.validate()?;
        }
        let desired: Vec<Params> = desired.iter().map(RouteSpec::to_params).collect();
        self.link
            .run(async |session| reconcile::reconcile(session, Category::Route, &desired).await)
            .await
    }

    /// Replace the managed routes with a recursive failover setup.
    pub async fn setup_recursive_failover(
        &self,
        primary_gateway: &str,
        backup_gateway: &str,
    ) -> Result<ReconcileSummary, CoreError> {
        let plan = FailoverPlan::new(primary_gateway, backup_gateway);
        let summary = self.reconcile_routes(&plan.routes()).await?;
        info!(
            host = %self.link.credentials().host,
            primary = primary_gateway,
            backup = backup_gateway,
            "recursive failover configured"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use rosfleet_api::Record;

    use super::*;
    use crate::testing::FakeRouter;

    fn facade(router: &FakeRouter) -> RoutingFacade<FakeRouter> {
        RoutingFacade::new(FakeRouter::credentials(), Arc::new(router.clone()))
    }

    #[test]
    fn failover_plan_orders_primary_first() {
        let routes = FailoverPlan::new("10.0.0.1", "10.0.1.1").routes();
        let params: Vec<_> = routes.iter().map(RouteSpec::to_params).collect();

        assert_eq!(params[0].get("dst-address"), Some("8.8.8.8"));
        assert_eq!(params[0].get("gateway"), Some("10.0.0.1"));
        assert_eq!(params[0].get("scope"), Some("10"));
        assert_eq!(params[1].get("gateway"), Some("8.8.8.8"));
        assert_eq!(params[1].get("distance"), Some("1"));
        assert_eq!(params[1].get("check-gateway"), Some("ping"));
        assert_eq!(params[1].get("dst-address"), None);
        assert_eq!(params[2].get("gateway"), Some("10.0.1.1"));
        assert_eq!(params[3].get("distance"), Some("2"));
        assert_eq!(params[3].get("target-scope"), Some("30"));
    }

    #[tokio::test]
    async fn failover_replaces_previous_managed_routes() {
        let router = FakeRouter::new();
        router.seed(
            "/ip/route",
            Record::new()
                .with("gateway", "192.0.2.1")
                .with("comment", MANAGED_MARKER),
        );
        router.seed(
            "/ip/route",
            Record::new()
                .with("dst-address", "172.16.0.0/12")
                .with("gateway", "192.0.2.9"),
        );

        let f = facade(&router);
        let summary = f.setup_recursive_failover("10.0.0.1", "10.0.1.1").await.unwrap();
        assert_eq!((summary.removed, summary.added), (1, 4));

        // Running it again converges instead of stacking routes.
        f.setup_recursive_failover("10.0.0.1", "10.0.1.1").await.unwrap();
        let routes = f.list_routes().await.unwrap();
        assert_eq!(routes.len(), 5);
        assert_eq!(
            routes
                .iter()
                .filter(|r| r.comment.as_deref() == Some(MANAGED_MARKER))
                .count(),
            4
        );
    }

    #[tokio::test]
    async fn add_and_clear_routes() {
        let router = FakeRouter::new();
        let f = facade(&router);
        f.add_route(&RouteSpec::new("10.10.0.0/16", "10.0.0.1").distance(3))
            .await
            .unwrap();
        assert_eq!(f.list_routes().await.unwrap()[0].distance, Some(3));

        let summary = f.clear_managed_routes().await.unwrap();
        assert_eq!(summary.removed, 1);
        assert!(f.list_routes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_gateway_rejected_locally() {
        let router = FakeRouter::new();
        let err = facade(&router)
            .add_route(&RouteSpec::via(""))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
    }

    #[test]
    fn gateway_forms() {
        for ok in ["10.0.0.1", "2001:db8::1", "ether1", "pppoe-out1", "fe80::1%ether2"] {
            assert!(is_gateway(ok), "{ok}");
        }
        for bad in [
            "10.0.0.300",
            "10.0.0.1/24",
            "wan link",
            "10.0.0.1,10.0.1.1",
            "%ether1",
            "10.0.0.1%",
        ] {
            assert!(!is_gateway(bad), "{bad}");
        }
    }

    #[tokio::test]
    async fn malformed_failover_gateway_rejected_before_connecting() {
        let router = FakeRouter::new();
        let err = facade(&router)
            .setup_recursive_failover("10.0.0.1", "192.168.1.256")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
        assert_eq!(router.connects(), 0);
    }
}
