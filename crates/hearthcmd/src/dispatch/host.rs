use std::sync::Arc;

use async_trait::async_trait;

use crate::inventory::CharacteristicKind;
use crate::inventory::CharacteristicValue;
use crate::inventory::Inventory;
use crate::inventory::ServiceRef;
use crate::inventory::WriteError;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("accessory host unavailable: {0}")]
    Unavailable(String),
}

/// The accessory host that owns the physical devices
///
/// Writes are fire-and-observe: the host is the source of truth for the value
/// a characteristic ends up with, and returns it.
#[async_trait]
pub trait AccessoryHost: Send + Sync {
    async fn set_characteristic(
        &self,
        device: &str,
        service: ServiceRef<'_>,
        characteristic: CharacteristicKind,
        value: CharacteristicValue,
    ) -> Result<CharacteristicValue, HostError>;
}

/// Host that applies writes directly to the in-process inventory.
pub struct InventoryHost {
    inventory: Arc<Inventory>,
}

impl InventoryHost {
    pub fn new(inventory: Arc<Inventory>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl AccessoryHost for InventoryHost {
    async fn set_characteristic(
        &self,
        device: &str,
        service: ServiceRef<'_>,
        characteristic: CharacteristicKind,
        value: CharacteristicValue,
    ) -> Result<CharacteristicValue, HostError> {
        Ok(self
            .inventory
            .set_characteristic(device, service, characteristic, value)?)
    }
}

#[async_trait]
impl<T: AccessoryHost + ?Sized> AccessoryHost for Arc<T> {
    async fn set_characteristic(
        &self,
        device: &str,
        service: ServiceRef<'_>,
        characteristic: CharacteristicKind,
        value: CharacteristicValue,
    ) -> Result<CharacteristicValue, HostError> {
        (**self)
            .set_characteristic(device, service, characteristic, value)
            .await
    }
}
