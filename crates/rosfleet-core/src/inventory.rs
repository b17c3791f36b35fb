// ── Device inventory seam ──
//
// Maps a device id to the credentials needed to reach it. The config
// crate provides the file-backed implementation; `StaticInventory` serves
// tests and embedders that already hold credentials.

use std::collections::BTreeMap;

use rosfleet_api::DeviceCredentials;

use crate::error::CoreError;

pub trait DeviceInventory: Send + Sync {
    /// Credentials for `device_id`, or `NotFound`.
    fn lookup(&self, device_id: &str) -> Result<DeviceCredentials, CoreError>;

    /// Every known device id, in a stable order.
    fn device_ids(&self) -> Vec<String>;
}

/// In-memory inventory.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    devices: BTreeMap<String, DeviceCredentials>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, device_id: impl Into<String>, creds: DeviceCredentials) -> Self {
        self.devices.insert(device_id.into(), creds);
        self
    }

    pub fn insert(&mut self, device_id: impl Into<String>, creds: DeviceCredentials) {
        self.devices.insert(device_id.into(), creds);
    }
}

impl DeviceInventory for StaticInventory {
    fn lookup(&self, device_id: &str) -> Result<DeviceCredentials, CoreError> {
        self.devices
            .get(device_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("device", device_id))
    }

    fn device_ids(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }
}
