use serde::{Deserialize, Serialize};

/// `/system/resource` (a single-row menu).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemResource {
    pub uptime: String,
    pub version: String,
    pub board_name: Option<String>,
    pub architecture: Option<String>,
    pub cpu: Option<String>,
    pub cpu_count: Option<u64>,
    /// Percent, 0-100.
    pub cpu_load: u64,
    pub free_memory: u64,
    pub total_memory: u64,
    pub free_hdd_space: Option<u64>,
    pub total_hdd_space: Option<u64>,
}

/// Identity, hardware and resource summary of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub identity: String,
    /// RouterBOARD model, `Generic` on CHR/x86.
    pub model: String,
    pub serial_number: Option<String>,
    pub firmware: Option<String>,
    pub version: String,
    pub uptime: String,
    pub cpu_load_percent: u64,
    #[serde(rename = "freeMemoryMB")]
    pub free_memory_mb: f64,
}
