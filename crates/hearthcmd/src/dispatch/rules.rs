//! Rule tables for turning an intent into a characteristic write.
//!
//! Both tables are closed: a service kind or characteristic kind without an
//! entry here is never guessed at.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;

use crate::inventory::CharacteristicKind;
use crate::inventory::CharacteristicValue;
use crate::inventory::ServiceKind;

/// Accepted thermostat set-points, covering both Celsius and Fahrenheit.
pub const TARGET_TEMPERATURE_RANGE: RangeInclusive<i64> = 0..=100;

const ON_PHRASES: &[&str] = &["turn on", "switch on"];
const OFF_PHRASES: &[&str] = &["turn off", "switch off"];

static TEMPERATURE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)set.*?temperature.*?to\s*(-?\d+)")
        .expect("temperature pattern is valid")
});

/// The characteristic a service kind is controlled through.
pub fn target_characteristic(kind: ServiceKind) -> Option<CharacteristicKind> {
    match kind {
        ServiceKind::Lightbulb | ServiceKind::Switch | ServiceKind::Fan | ServiceKind::Outlet => {
            Some(CharacteristicKind::On)
        }
        ServiceKind::Thermostat => Some(CharacteristicKind::TargetTemperature),
        ServiceKind::TemperatureSensor | ServiceKind::Other => None,
    }
}

/// Derive the value to write from the action phrase.
pub fn derive_value(kind: CharacteristicKind, action: &str) -> Option<CharacteristicValue> {
    match kind {
        CharacteristicKind::On => power_state(action).map(CharacteristicValue::Bool),
        CharacteristicKind::TargetTemperature => {
            target_temperature(action).map(CharacteristicValue::Int)
        }
        CharacteristicKind::CurrentTemperature
        | CharacteristicKind::Brightness
        | CharacteristicKind::Other => None,
    }
}

/// "turn on" / "switch on" anywhere in the phrase, ignoring case.
///
/// On phrases are checked first, so a phrase containing both resolves to on.
fn power_state(action: &str) -> Option<bool> {
    let action = action
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if ON_PHRASES.iter().any(|p| action.contains(p)) {
        Some(true)
    } else if OFF_PHRASES.iter().any(|p| action.contains(p)) {
        Some(false)
    } else {
        None
    }
}

/// "set ... temperature ... to <integer>", ignoring case.
fn target_temperature(action: &str) -> Option<i64> {
    let caps = TEMPERATURE_PATTERN.captures(action)?;
    let value: i64 = caps.get(1)?.as_str().parse().ok()?;
    TARGET_TEMPERATURE_RANGE.contains(&value).then_some(value)
}
