use std::sync::Arc;

use tracing::info;
use tracing::warn;

use crate::completion::CompletionService;
use crate::config::Config;
use crate::dispatch::AccessoryHost;
use crate::dispatch::DispatchOutcome;
use crate::dispatch::Dispatcher;
use crate::error::CommandError;
use crate::inventory::Inventory;
use crate::resolver::IntentResolver;

/// Command handler with type-erased backends, as used by the HTTP ingress
pub type SharedCommandHandler =
    CommandHandler<Arc<dyn CompletionService>, Arc<dyn AccessoryHost>>;

/// Runs one command through resolution and dispatch
///
/// This is the boundary where every failure becomes a per-command result.
/// Nothing is retried.
pub struct CommandHandler<C, H> {
    inventory: Arc<Inventory>,
    resolver: IntentResolver<C>,
    dispatcher: Dispatcher<H>,
}

impl<C: CompletionService, H: AccessoryHost> CommandHandler<C, H> {
    pub fn new(inventory: Arc<Inventory>, completion: C, host: H, config: &Config) -> Self {
        Self {
            resolver: IntentResolver::new(completion, inventory.clone(), &config.completion),
            dispatcher: Dispatcher::new(inventory.clone(), host, config.dispatch.service_match),
            inventory,
        }
    }

    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.inventory
    }

    /// Interpret and apply a single command
    #[tracing::instrument(skip(self))]
    pub async fn handle(&self, command: &str) -> Result<DispatchOutcome, CommandError> {
        let result = self.run(command).await;
        match &result {
            Ok(outcome) => info!("Command applied: {}", outcome),
            Err(e) => warn!("Command failed: {}", e),
        }
        result
    }

    async fn run(&self, command: &str) -> Result<DispatchOutcome, CommandError> {
        let intent = self.resolver.resolve(command).await?;
        info!(
            "Resolved intent: action={:?}, device={:?}",
            intent.action, intent.device
        );
        self.dispatcher.dispatch(&intent).await
    }
}
