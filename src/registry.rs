//! Keyed store of discovered devices.
//!
//! Exactly one `Device` per address; an upsert overwrites the previous entry.
//! Owned by the consumer thread, so no locking.

use std::collections::HashMap;

use crate::device::{Address, Device};

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<Address, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `device.address`.
    pub fn upsert(&mut self, device: Device) {
        self.devices.insert(device.address.clone(), device);
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    pub fn get(&self, address: &Address) -> Option<&Device> {
        self.devices.get(address)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices accepted by `filter`, strongest signal first.
    pub fn snapshot_by<F>(&self, filter: F) -> Vec<Device>
    where
        F: Fn(&Device) -> bool,
    {
        let mut devices: Vec<Device> = self
            .devices
            .values()
            .filter(|device| filter(device))
            .cloned()
            .collect();
        devices.sort_by(|a, b| b.rssi.cmp(&a.rssi));
        devices
    }

    /// Devices matching the search query, strongest signal first.
    pub fn snapshot(&self, query: &str) -> Vec<Device> {
        self.snapshot_by(|device| device.matches(query))
    }
}
