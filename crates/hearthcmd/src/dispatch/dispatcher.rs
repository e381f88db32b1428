use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::host::AccessoryHost;
use super::rules;
use crate::error::CommandError;
use crate::inventory::Characteristic;
use crate::inventory::CharacteristicKind;
use crate::inventory::CharacteristicValue;
use crate::inventory::Device;
use crate::inventory::Inventory;
use crate::inventory::Service;
use crate::inventory::ServiceRef;
use crate::resolver::Intent;

/// How the dispatcher picks a service on the matched device.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMatch {
    /// Only a service named exactly like the device is considered.
    DeviceName,

    /// Prefer a service named like the device, otherwise use the first
    /// service (in declaration order) exposing the characteristic its kind
    /// is controlled through. Services the action yields a value for are
    /// tried before the rest.
    #[default]
    AnyCapable,
}

/// Result of a successfully applied intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub device: String,
    pub service: String,
    pub characteristic: String,
    pub kind: CharacteristicKind,

    /// Value reported by the accessory host after the write
    pub value: CharacteristicValue,
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} is now {}",
            self.device, self.characteristic, self.value
        )
    }
}

/// Applies intents to devices.
pub struct Dispatcher<H> {
    inventory: Arc<Inventory>,
    host: H,
    service_match: ServiceMatch,
}

impl<H: AccessoryHost> Dispatcher<H> {
    pub fn new(inventory: Arc<Inventory>, host: H, service_match: ServiceMatch) -> Self {
        Self {
            inventory,
            host,
            service_match,
        }
    }

    /// Apply an intent.
    ///
    /// The device is always looked up in the live inventory, never in the
    /// snapshot the intent was resolved against.
    pub async fn dispatch(&self, intent: &Intent) -> Result<DispatchOutcome, CommandError> {
        let device = self
            .inventory
            .find_by_name(&intent.device)
            .ok_or_else(|| CommandError::DeviceNotFound(intent.device.clone()))?;

        let (index, service, characteristic) =
            select_service(&device, &intent.action, self.service_match)?;
        let kind = characteristic.kind;
        debug!(
            "Dispatching '{}' to {}/{} ({})",
            intent.action, device.name, service.name, kind
        );

        let value =
            rules::derive_value(kind, &intent.action).ok_or_else(|| CommandError::ValueUndetermined {
                device: device.name.clone(),
                action: intent.action.clone(),
                characteristic: kind,
            })?;

        let target = ServiceRef {
            index,
            name: &service.name,
        };
        let observed = self
            .host
            .set_characteristic(&device.name, target, kind, value)
            .await
            .map_err(|e| CommandError::ApplyFailed {
                device: device.name.clone(),
                action: intent.action.clone(),
                reason: e.to_string(),
            })?;

        let outcome = DispatchOutcome {
            device: device.name.clone(),
            service: service.name.clone(),
            characteristic: characteristic.name.clone(),
            kind,
            value: observed,
        };
        info!("{}", outcome);
        Ok(outcome)
    }
}

/// Pick the service to control and the characteristic to write.
///
/// Returns the service's position on the device along with it.
fn select_service<'a>(
    device: &'a Device,
    action: &str,
    policy: ServiceMatch,
) -> Result<(usize, &'a Service, &'a Characteristic), CommandError> {
    let services = || device.services.iter().enumerate();
    let named = services().find(|(_, s)| s.is_named(&device.name));

    let capable = |s: &Service| controllable(s).is_some();
    let usable = |s: &Service| {
        controllable(s).is_some_and(|c| rules::derive_value(c.kind, action).is_some())
    };

    let selected = match policy {
        ServiceMatch::DeviceName => named,
        ServiceMatch::AnyCapable => named
            .filter(|(_, s)| usable(*s))
            .or_else(|| services().find(|(_, s)| usable(*s)))
            .or_else(|| named.filter(|(_, s)| capable(*s)))
            .or_else(|| services().find(|(_, s)| capable(*s)))
            .or(named)
            .or_else(|| services().next()),
    };
    let (index, service) = selected.ok_or_else(|| CommandError::ServiceNotFound {
        device: device.name.clone(),
    })?;

    let characteristic = controllable(service).ok_or_else(|| CommandError::CharacteristicNotFound {
        device: device.name.clone(),
        service: service.name.clone(),
        kind: service.kind,
    })?;

    Ok((index, service, characteristic))
}

/// The characteristic a service is controlled through, if the service
/// exposes it.
fn controllable(service: &Service) -> Option<&Characteristic> {
    rules::target_characteristic(service.kind).and_then(|kind| service.characteristic(kind))
}
