//! In-memory device registry for one connection.
//!
//! Keys are exactly the device indices the server currently announces. Only
//! the session mutates the registry; everyone else gets read access.

use crate::protocol::DeviceDescriptor;

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<u32, DeviceDescriptor>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry at the descriptor's index.
    ///
    /// The newest announcement wins outright; nothing is merged. Returns the
    /// descriptor that was replaced, if any.
    pub(crate) fn upsert(&mut self, device: DeviceDescriptor) -> Option<DeviceDescriptor> {
        self.devices.insert(device.index(), device)
    }

    /// Remove the entry at `index`. Absent indices are a no-op.
    pub(crate) fn remove(&mut self, index: u32) -> Option<DeviceDescriptor> {
        self.devices.remove(&index)
    }

    pub fn get(&self, index: u32) -> Option<&DeviceDescriptor> {
        self.devices.get(&index)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.devices.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceDescriptor> {
        self.devices.values()
    }

    pub fn indices(&self) -> Vec<u32> {
        self.devices.keys().copied().collect()
    }
}
