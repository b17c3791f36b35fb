use std::net::IpAddr;
use std::sync::Arc;

use rosfleet_api::{Connector, DeviceCredentials, Params};
use serde::{Deserialize, Serialize};

use super::{Link, created_id};
use crate::error::CoreError;
use crate::model::{DhcpServer, IpAddress};
use crate::reconcile::{self, Category, MANAGED_MARKER, ReconcileSummary};

/// An address to place on an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressAssignment {
    /// CIDR, e.g. `192.168.88.1/24`.
    pub address: String,
    pub interface: String,
}

impl AddressAssignment {
    pub fn new(address: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            interface: interface.into(),
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        validate_cidr(&self.address)?;
        if self.interface.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: format!("no interface given for {}", self.address),
            });
        }
        Ok(())
    }

    fn to_params(&self) -> Params {
        Params::new()
            .attr("address", &self.address)
            .attr("interface", &self.interface)
    }
}

/// IP addressing, DHCP servers and resolver settings.
pub struct IpFacade<C: Connector> {
    link: Link<C>,
}

impl<C: Connector> IpFacade<C> {
    pub fn new(credentials: DeviceCredentials, connector: Arc<C>) -> Self {
        Self {
            link: Link::new(credentials, connector),
        }
    }

    pub async fn list_addresses(&self) -> Result<Vec<IpAddress>, CoreError> {
        self.link.list("/ip/address").await
    }

    /// Add `address` (CIDR) on `interface`. Returns the new `.id`.
    pub async fn add_address(&self, address: &str, interface: &str) -> Result<String, CoreError> {
        let assignment = AddressAssignment::new(address, interface);
        assignment.validate()?;
        let rows = self
            .link
            .command(
                "/ip/address/add",
                &assignment.to_params().attr("comment", MANAGED_MARKER),
            )
            .await?;
        Ok(created_id(&rows).unwrap_or_default())
    }

    pub async fn list_dhcp_servers(&self) -> Result<Vec<DhcpServer>, CoreError> {
        self.link.list("/ip/dhcp-server").await
    }

    /// Replace the resolver's upstream servers.
    pub async fn set_dns(&self, servers: &[String]) -> Result<(), CoreError> {
        if servers.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "at least one DNS server is required".into(),
            });
        }
        for server in servers {
            server
                .parse::<IpAddr>()
                .map_err(|_| CoreError::ValidationFailed {
                    message: format!("{server} is not an IP address"),
                })?;
        }
        self.link
            .command("/ip/dns/set", &Params::new().attr("servers", servers.join(",")))
            .await?;
        Ok(())
    }

    /// Make the managed addresses equal to `desired`.
    pub async fn reconcile_addresses(
        &self,
        desired: &[AddressAssignment],
    ) -> Result<ReconcileSummary, CoreError> {
        for assignment in desired {
            assignment.validate()?;
        }
        let desired: Vec<Params> = desired.iter().map(AddressAssignment::to_params).collect();
        self.link
            .run(async |session| reconcile::reconcile(session, Category::IpAddress, &desired).await)
            .await
    }
}

fn validate_cidr(address: &str) -> Result<(), CoreError> {
    let invalid = || CoreError::ValidationFailed {
        message: format!("{address} is not an address in CIDR form"),
    };
    let (ip, prefix) = address.split_once('/').ok_or_else(invalid)?;
    let ip: IpAddr = ip.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    let max = if ip.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(invalid());
    }
    Ok(())
}
