//! Action dispatch: from an intent to a characteristic write.

mod dispatcher;
mod host;
pub mod rules;

pub use dispatcher::DispatchOutcome;
pub use dispatcher::Dispatcher;
pub use dispatcher::ServiceMatch;
pub use host::AccessoryHost;
pub use host::HostError;
pub use host::InventoryHost;
