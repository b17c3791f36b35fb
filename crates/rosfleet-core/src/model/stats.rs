// ── Polling payload ──

use serde::{Deserialize, Serialize};

/// Throughput of one interface, as exposed by the polling endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRate {
    pub name: String,
    pub is_running: bool,
    pub rx_bytes_per_second: f64,
    pub tx_bytes_per_second: f64,
}

/// One poll of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStats {
    pub cpu_load_percent: u64,
    #[serde(rename = "freeMemoryMB")]
    pub free_memory_mb: f64,
    pub uptime: String,
    pub interfaces: Vec<InterfaceRate>,
}
