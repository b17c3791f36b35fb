use serde::{Deserialize, Serialize};

/// A row of `/ip/route`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub dst_address: String,
    pub gateway: Option<String>,
    pub distance: Option<u64>,
    pub scope: Option<u64>,
    pub target_scope: Option<u64>,
    pub check_gateway: Option<String>,
    pub active: bool,
    pub dynamic: bool,
    pub disabled: bool,
    pub comment: Option<String>,
}
