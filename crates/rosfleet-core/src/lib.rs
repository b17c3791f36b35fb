//! Device session and telemetry reconciliation layer for RouterOS fleets.
//!
//! Sits between `rosfleet-api` (the command client) and operator tooling:
//!
//! - **[`SessionManager`]** opens one authenticated session per logical
//!   operation and guarantees it is closed on every exit path
//!   ([`SessionManager::scoped`]).
//!
//! - **[`execute`]** issues a single command and maps device rejections to
//!   [`CoreError::Command`], treating the link drop after a reboot or
//!   shutdown as success.
//!
//! - **[`reconcile`](mod@reconcile)** converges marker-tagged objects
//!   (routes, firewall rules, address lists, addresses, DHCP alerts) to a
//!   desired list by remove-then-add. Operator-created objects are never
//!   touched.
//!
//! - **[`RateCalculator`]** turns polled byte counters into per-second
//!   rates, with eviction of vanished interfaces and idle devices.
//!
//! - **Facades** ([`InterfaceFacade`], [`IpFacade`], [`RoutingFacade`],
//!   [`FirewallFacade`], [`SystemFacade`]) and the [`Fleet`] service that
//!   resolves device ids through a [`DeviceInventory`].

pub mod convert;
pub mod error;
pub mod executor;
pub mod facade;
pub mod fleet;
pub mod inventory;
pub mod model;
pub mod reconcile;
pub mod session;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::{CoreError, ErrorCategory, Failure};
pub use executor::execute;
pub use facade::{
    AddressAssignment, DEFAULT_NTP_SERVERS, FailoverPlan, FirewallFacade, InterfaceFacade,
    IpFacade, NtpSchema, RouteSpec, RoutingFacade, SystemFacade,
};
pub use fleet::{Fleet, PollOutcome, ProvisionReport};
pub use inventory::{DeviceInventory, StaticInventory};
pub use reconcile::{Category, MANAGED_MARKER, ObjectError, ObjectOp, ReconcileSummary};
pub use session::{Session, SessionManager};
pub use telemetry::{EvictionPolicy, InterfaceKey, Rate, RateCalculator};

pub use model::{
    AddressListEntry, DeviceStats, DhcpServer, FirewallRule, Interface, InterfaceRate, IpAddress,
    Route, SystemInfo, SystemResource,
};

// Callers build credentials and parameters without a direct api dependency.
pub use rosfleet_api::{DeviceCredentials, Params, Record, TlsMode};
