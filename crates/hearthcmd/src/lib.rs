pub mod api;
pub mod completion;
pub mod config;
pub mod dispatch;
mod error;
mod handler;
pub mod inventory;
pub mod resolver;

pub use completion::CompletionService;
pub use config::Config;
pub use config::LogLevel;
pub use dispatch::AccessoryHost;
pub use dispatch::DispatchOutcome;
pub use dispatch::Dispatcher;
pub use error::CommandError;
pub use handler::CommandHandler;
pub use handler::SharedCommandHandler;
pub use inventory::Inventory;
pub use resolver::Intent;
pub use resolver::IntentResolver;
