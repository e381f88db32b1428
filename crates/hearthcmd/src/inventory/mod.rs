mod inventory;
mod model;

pub use inventory::Inventory;
pub use inventory::ServiceRef;
pub use inventory::Snapshot;
pub use inventory::WriteError;
pub use model::Characteristic;
pub use model::CharacteristicKind;
pub use model::CharacteristicValue;
pub use model::Device;
pub use model::Service;
pub use model::ServiceKind;
pub use model::UNKNOWN_SERVICE;
