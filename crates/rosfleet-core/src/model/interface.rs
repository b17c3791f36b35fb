use serde::{Deserialize, Serialize};

/// A row of `/interface`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: String,
    pub name: String,
    /// `ether`, `bridge`, `vlan`, `wlan`, ...
    pub kind: String,
    pub mac_address: Option<String>,
    pub mtu: Option<u64>,
    pub running: bool,
    pub disabled: bool,
    pub comment: Option<String>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}
