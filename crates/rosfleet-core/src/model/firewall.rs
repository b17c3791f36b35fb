// ── Firewall rows ──

use serde::{Deserialize, Serialize};

/// A row of `/ip/firewall/{nat,filter,mangle}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: String,
    pub chain: String,
    pub action: String,
    pub src_address: Option<String>,
    pub dst_address: Option<String>,
    pub in_interface: Option<String>,
    pub out_interface: Option<String>,
    pub protocol: Option<String>,
    pub disabled: bool,
    pub comment: Option<String>,
}

/// A row of `/ip/firewall/address-list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressListEntry {
    pub id: String,
    pub list: String,
    pub address: String,
    pub disabled: bool,
    pub comment: Option<String>,
}
