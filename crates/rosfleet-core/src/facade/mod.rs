// ── Device facades ──
//
// Stateless operation sets over one device. A facade holds only the
// credentials and the shared connector; every call opens its own session
// and releases it before returning, so facades are cheap to build, reuse
// or drop.

mod firewall;
mod interfaces;
mod ip;
mod routing;
mod system;

use std::sync::Arc;

use rosfleet_api::{Connector, DeviceCredentials, Params, Record};

use crate::error::CoreError;
use crate::executor::execute;
use crate::session::{Session, SessionManager};

pub use firewall::FirewallFacade;
pub use interfaces::InterfaceFacade;
pub use ip::{AddressAssignment, IpFacade};
pub use routing::{FailoverPlan, RouteSpec, RoutingFacade};
pub use system::{DEFAULT_NTP_SERVERS, NtpSchema, SystemFacade};

/// Credentials plus session manager: what every facade is built on.
pub(crate) struct Link<C: Connector> {
    sessions: SessionManager<C>,
    credentials: DeviceCredentials,
}

impl<C: Connector> Clone for Link<C> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            credentials: self.credentials.clone(),
        }
    }
}

impl<C: Connector> Link<C> {
    pub(crate) fn new(credentials: DeviceCredentials, connector: Arc<C>) -> Self {
        Self {
            sessions: SessionManager::new(connector),
            credentials,
        }
    }

    pub(crate) fn credentials(&self) -> &DeviceCredentials {
        &self.credentials
    }

    /// Run `op` on a fresh session, released on every exit path.
    pub(crate) async fn run<T>(
        &self,
        op: impl AsyncFnOnce(&mut Session<C::Session>) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        self.sessions.scoped(&self.credentials, op).await
    }

    /// One command in its own session.
    pub(crate) async fn command(
        &self,
        path: &str,
        params: &Params,
    ) -> Result<Vec<Record>, CoreError> {
        self.run(async |session| execute(session, path, params).await)
            .await
    }

    /// `print` of `menu` in its own session, converted row by row.
    pub(crate) async fn list<T>(&self, menu: &str) -> Result<Vec<T>, CoreError>
    where
        T: for<'a> From<&'a Record>,
    {
        let rows = self
            .command(&format!("{menu}/print"), &Params::new())
            .await?;
        Ok(rows.iter().map(T::from).collect())
    }
}

/// `.id` returned by an `add` command (`{"ret": "*1F"}`).
pub(crate) fn created_id(rows: &[Record]) -> Option<String> {
    rows.first().and_then(|r| r.text("ret"))
}
