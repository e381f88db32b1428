//! Intent resolution.
//!
//! Turns a free-text command into an `Intent` by asking the completion
//! service to pick an action and a device from the current inventory. The
//! resolver only guarantees a syntactically valid intent; whether the device
//! exists is checked by the dispatcher.

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::completion::CompletionRequest;
use crate::completion::CompletionService;
use crate::config::CompletionConfig;
use crate::error::CommandError;
use crate::inventory::Device;
use crate::inventory::Inventory;

const INSTRUCTIONS: &str = r#"You translate smart home commands into actions.

Respond with ONLY a JSON object (no markdown, no explanation) with exactly two string fields:
{"action": "<what to do>", "device": "<device name>"}

"action" is a short phrase such as "turn on", "turn off" or "set temperature to 72".
"device" is the name of exactly one device from the list, spelled as it appears there."#;

/// What a single command asks for.
///
/// Produced once per command and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: String,
    pub device: String,
}

/// Builds prompts from the inventory and parses completions into intents.
pub struct IntentResolver<C> {
    completion: C,
    inventory: Arc<Inventory>,
    max_tokens: u32,
    temperature: f32,
}

impl<C: CompletionService> IntentResolver<C> {
    pub fn new(completion: C, inventory: Arc<Inventory>, config: &CompletionConfig) -> Self {
        Self {
            completion,
            inventory,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Resolve a command into an intent.
    ///
    /// Empty commands are rejected before any remote call is made.
    pub async fn resolve(&self, command: &str) -> Result<Intent, CommandError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(CommandError::EmptyCommand);
        }

        let snapshot = self.inventory.snapshot();
        let request = CompletionRequest {
            prompt: build_prompt(&snapshot, command),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        debug!("Completion prompt:\n{}", request.prompt);

        let text = self
            .completion
            .complete(&request)
            .await
            .map_err(|e| CommandError::RemoteCallFailed {
                status: e.status(),
                message: e.to_string(),
            })?;
        debug!("Completion text: {:?}", text);

        parse_intent(&text)
    }
}

/// Build the completion prompt for a command.
pub fn build_prompt(devices: &[Device], command: &str) -> String {
    let inventory = serde_json::to_string(devices).unwrap_or_else(|e| {
        warn!("Failed to serialize inventory for prompt: {}", e);
        "[]".to_string()
    });

    format!(
        "{}\n\nDevices:\n{}\n\nCommand: {}\nJSON:",
        INSTRUCTIONS, inventory, command
    )
}

/// Parse completion text into an intent.
///
/// The text must be a single JSON object with string `action` and `device`
/// fields, optionally wrapped in a Markdown code fence. Field values are
/// returned as-is.
pub fn parse_intent(text: &str) -> Result<Intent, CommandError> {
    let malformed = |reason: String| CommandError::MalformedIntent {
        reason,
        raw: text.to_string(),
    };

    let value: serde_json::Value =
        serde_json::from_str(unfence(text)).map_err(|e| malformed(e.to_string()))?;
    // serde accepts a sequence for a struct, an intent must be an object
    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

/// Strip a surrounding ```json ... ``` or ``` ... ``` fence.
fn unfence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
