use std::sync::Arc;

use rosfleet_api::{Connector, DeviceCredentials, DeviceSession, Params};
use tracing::info;

use super::{Link, created_id};
use crate::error::CoreError;
use crate::executor::execute;
use crate::model::Interface;
use crate::reconcile::MANAGED_MARKER;
use crate::session::Session;

/// Interface listing and administration.
pub struct InterfaceFacade<C: Connector> {
    link: Link<C>,
}

impl<C: Connector> InterfaceFacade<C> {
    pub fn new(credentials: DeviceCredentials, connector: Arc<C>) -> Self {
        Self {
            link: Link::new(credentials, connector),
        }
    }

    pub async fn list(&self) -> Result<Vec<Interface>, CoreError> {
        self.link.list("/interface").await
    }

    /// Look up one interface by name.
    pub async fn get(&self, name: &str) -> Result<Interface, CoreError> {
        self.link
            .run(async |session| find(session, name).await)
            .await
    }

    /// Enable or disable `name`.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), CoreError> {
        self.link
            .run(async |session| {
                let iface = find(session, name).await?;
                let path = if enabled {
                    "/interface/enable"
                } else {
                    "/interface/disable"
                };
                execute(session, path, &Params::new().attr("numbers", iface.id)).await?;
                Ok(())
            })
            .await?;
        info!(host = %self.link.credentials().host, interface = name, enabled, "interface toggled");
        Ok(())
    }

    pub async fn rename(&self, current: &str, new_name: &str) -> Result<(), CoreError> {
        if new_name.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "interface name must not be empty".into(),
            });
        }
        self.link
            .run(async |session| {
                let iface = find(session, current).await?;
                execute(
                    session,
                    "/interface/set",
                    &Params::new().attr(".id", iface.id).attr("name", new_name),
                )
                .await?;
                Ok(())
            })
            .await
    }

    /// Create a bridge. Returns its `.id`.
    pub async fn add_bridge(&self, name: &str) -> Result<String, CoreError> {
        let rows = self
            .link
            .command(
                "/interface/bridge/add",
                &Params::new()
                    .attr("name", name)
                    .attr("comment", MANAGED_MARKER),
            )
            .await?;
        Ok(created_id(&rows).unwrap_or_default())
    }
}

async fn find<S: DeviceSession>(
    session: &mut Session<S>,
    name: &str,
) -> Result<Interface, CoreError> {
    let rows = execute(
        session,
        "/interface/print",
        &Params::new().query("name", name),
    )
    .await?;
    rows.iter()
        .find(|r| r.str("name") == Some(name))
        .map(Interface::from)
        .ok_or_else(|| CoreError::not_found("interface", name))
}
