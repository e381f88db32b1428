//! Read model of the accessories hearthcmd can control.
//!
//! A device exposes one or more services, and each service groups the
//! characteristics that can be read or written on it. The same types are used
//! for the TOML config, the HTTP inventory endpoints and the completion prompt.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Name given to a service that arrives without one.
pub const UNKNOWN_SERVICE: &str = "Unknown Service";

fn default_service_name() -> String {
    UNKNOWN_SERVICE.to_string()
}

/// A controllable accessory, addressed by its human-readable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,

    #[serde(default)]
    pub services: Vec<Service>,
}

/// A group of characteristics representing one capability of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default = "default_service_name")]
    pub name: String,

    pub kind: ServiceKind,

    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
}

/// A single readable or writable attribute of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characteristic {
    pub name: String,
    pub kind: CharacteristicKind,
    pub value: CharacteristicValue,
}

/// The capability kind of a service.
///
/// Kinds hearthcmd has no dispatch rule for deserialize to `Other` instead of
/// failing, so an inventory feed from a newer host still loads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ServiceKind {
    Lightbulb,
    Switch,
    Outlet,
    Fan,
    Thermostat,
    TemperatureSensor,
    #[serde(other)]
    Other,
}

/// The kind of a characteristic, which fixes the runtime type of its value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CharacteristicKind {
    /// Power state, holds a boolean.
    On,
    /// Thermostat set-point, holds an integer.
    TargetTemperature,
    CurrentTemperature,
    Brightness,
    #[serde(other)]
    Other,
}

/// Current value of a characteristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacteristicValue::Bool(true) => write!(f, "on"),
            CharacteristicValue::Bool(false) => write!(f, "off"),
            CharacteristicValue::Int(v) => write!(f, "{}", v),
            CharacteristicValue::Float(v) => write!(f, "{}", v),
            CharacteristicValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl Device {
    /// Case-insensitive comparison against a name taken from user text.
    pub fn is_named(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

impl Service {
    pub fn is_named(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }

    /// The first characteristic of the given kind, in declaration order.
    pub fn characteristic(&self, kind: CharacteristicKind) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.kind == kind)
    }
}

/// Names are matched exactly, ignoring case and surrounding whitespace.
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
