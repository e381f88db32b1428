//! Per-command failure reporting.
//!
//! Every way a single command can fail maps to one `CommandError` variant.
//! Errors stop at the command-handling boundary: they are reported to the
//! caller and never retried.

use crate::inventory::CharacteristicKind;
use crate::inventory::ServiceKind;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Command is empty")]
    EmptyCommand,

    #[error("Completion service call failed{}: {message}", fmt_status(.status))]
    RemoteCallFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Completion response is not a valid intent: {reason} (response: {raw:?})")]
    MalformedIntent { reason: String, raw: String },

    #[error("Device '{0}' not found")]
    DeviceNotFound(String),

    #[error("Device '{device}' has no controllable service")]
    ServiceNotFound { device: String },

    #[error("Service '{service}' ({kind}) on device '{device}' has no characteristic to control")]
    CharacteristicNotFound {
        device: String,
        service: String,
        kind: ServiceKind,
    },

    #[error("Could not determine a {characteristic} value for device '{device}' from action '{action}'")]
    ValueUndetermined {
        device: String,
        action: String,
        characteristic: CharacteristicKind,
    },

    #[error("Failed to apply '{action}' to device '{device}': {reason}")]
    ApplyFailed {
        device: String,
        action: String,
        reason: String,
    },
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {}", code),
        None => String::new(),
    }
}

impl CommandError {
    /// HTTP status reported by the completion service, if any.
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            CommandError::RemoteCallFailed { status, .. } => *status,
            _ => None,
        }
    }
}
