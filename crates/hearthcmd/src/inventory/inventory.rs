use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::model::CharacteristicKind;
use super::model::CharacteristicValue;
use super::model::Device;

/// Snapshot of every known device, in feed order.
pub type Snapshot = Arc<Vec<Device>>;

/// Device inventory
///
/// Holds the current read model of devices, services and characteristics. The
/// whole device list is swapped atomically, so a reader holding a snapshot
/// sees either the old inventory or the new one, never a mix.
#[derive(Debug, Default)]
pub struct Inventory {
    devices: ArcSwap<Vec<Device>>,
}

/// A service on a device, addressed by its position in the device's service
/// list.
///
/// The name is checked on write, so a reordered or replaced service list
/// fails the write instead of hitting a different service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRef<'a> {
    pub index: usize,
    pub name: &'a str,
}

/// Reasons a characteristic write can't be applied to the inventory.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WriteError {
    #[error("device '{0}' is no longer in the inventory")]
    DeviceGone(String),

    #[error("device '{device}' has no service '{service}' exposing {characteristic}")]
    CharacteristicGone {
        device: String,
        service: String,
        characteristic: CharacteristicKind,
    },
}

impl Inventory {
    pub fn new(devices: Vec<Device>) -> Self {
        warn_on_duplicates(&devices);
        Self {
            devices: ArcSwap::from_pointee(devices),
        }
    }

    /// Get the current inventory.
    ///
    /// Clones the `Arc`, the snapshot itself is never copied.
    pub fn snapshot(&self) -> Snapshot {
        self.devices.load_full()
    }

    /// Replace the whole inventory.
    pub fn update(&self, devices: Vec<Device>) {
        warn_on_duplicates(&devices);
        info!("Inventory updated: {} device(s)", devices.len());
        self.devices.store(Arc::new(devices));
    }

    /// Look up a device by name, ignoring case.
    ///
    /// Names are expected to be unique. If the feed contains duplicates the
    /// first device in snapshot order wins.
    pub fn find_by_name(&self, name: &str) -> Option<Device> {
        self.devices
            .load()
            .iter()
            .find(|d| d.is_named(name))
            .cloned()
    }

    /// Write a new value into a characteristic and return the stored value.
    ///
    /// The write is a read-copy-update of the whole snapshot: a concurrent
    /// `update` is either applied before the write (and the write targets the
    /// new inventory) or after it (and replaces it).
    pub fn set_characteristic(
        &self,
        device: &str,
        service: ServiceRef<'_>,
        characteristic: CharacteristicKind,
        value: CharacteristicValue,
    ) -> Result<CharacteristicValue, WriteError> {
        let mut outcome = Ok(value.clone());

        self.devices.rcu(|current| {
            let mut devices = Vec::clone(current);
            outcome = write_value(&mut devices, device, service, characteristic, &value);
            if outcome.is_ok() {
                Arc::new(devices)
            } else {
                Arc::clone(current)
            }
        });

        if outcome.is_ok() {
            debug!(
                "Characteristic {} on {}/{} set to {}",
                characteristic, device, service.name, value
            );
        }
        outcome
    }
}

fn write_value(
    devices: &mut [Device],
    device: &str,
    service: ServiceRef<'_>,
    characteristic: CharacteristicKind,
    value: &CharacteristicValue,
) -> Result<CharacteristicValue, WriteError> {
    let target = devices
        .iter_mut()
        .find(|d| d.is_named(device))
        .ok_or_else(|| WriteError::DeviceGone(device.to_string()))?;

    let slot = target
        .services
        .get_mut(service.index)
        .filter(|s| s.is_named(service.name))
        .and_then(|s| s.characteristics.iter_mut().find(|c| c.kind == characteristic))
        .ok_or_else(|| WriteError::CharacteristicGone {
            device: device.to_string(),
            service: service.name.to_string(),
            characteristic,
        })?;

    slot.value = value.clone();
    Ok(slot.value.clone())
}

fn warn_on_duplicates(devices: &[Device]) {
    let mut seen = HashSet::new();
    for device in devices {
        if !seen.insert(device.name.trim().to_lowercase()) {
            warn!(
                "Duplicate device name '{}' in inventory, only the first entry is addressable",
                device.name
            );
        }
    }
}
