use serde::{Deserialize, Serialize};

/// A row of `/ip/address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    pub id: String,
    /// CIDR form, e.g. `192.168.88.1/24`.
    pub address: String,
    pub network: Option<String>,
    pub interface: String,
    pub disabled: bool,
    pub dynamic: bool,
    pub comment: Option<String>,
}

/// A row of `/ip/dhcp-server`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpServer {
    pub id: String,
    pub name: String,
    pub interface: String,
    pub address_pool: Option<String>,
    pub lease_time: Option<String>,
    pub disabled: bool,
}
