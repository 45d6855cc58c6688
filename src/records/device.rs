//! Smart-home devices.
//!
//! Devices share a name, a power switch and an hourly energy draw. What else they carry depends
//! on the [`DeviceKind`]; patches that touch state a kind does not have are rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, FlatRecord, Record, Searchable};
use crate::error::{FieldError, ValidationError};
use crate::storage::snapshot::codec;
use crate::validation;

/// Kind-specific device state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKind {
    /// A dimmable-or-not light. No extra state.
    Light,
    /// A thermostat holding a target temperature.
    Thermostat {
        /// Target temperature in degrees Celsius.
        temperature_c: f64,
    },
    /// A door lock.
    DoorLock {
        /// Whether the bolt is thrown.
        locked: bool,
    },
}

impl DeviceKind {
    /// Lower-case label, as used in serde output and error messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Thermostat { .. } => "thermostat",
            Self::DoorLock { .. } => "door_lock",
        }
    }

    /// Variant name, written to the snapshot `kind` column.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Thermostat { .. } => "Thermostat",
            Self::DoorLock { .. } => "DoorLock",
        }
    }

    /// Hourly draw a new device of this kind starts with, in watts.
    #[must_use]
    pub const fn default_energy_watts(&self) -> f64 {
        match self {
            Self::Light => 10.0,
            Self::Thermostat { .. } => 50.0,
            Self::DoorLock { .. } => 5.0,
        }
    }

    fn value_column(&self) -> String {
        match self {
            Self::Light => String::new(),
            Self::Thermostat { temperature_c } => temperature_c.to_string(),
            Self::DoorLock { locked } => locked.to_string(),
        }
    }

    /// Accepts the variant name or the label, in any case.
    fn from_columns(kind: &str, value: &str) -> Result<Self, FieldError> {
        let is = |name: &str, label: &str| {
            let k = kind.trim();
            k.eq_ignore_ascii_case(name) || k.eq_ignore_ascii_case(label)
        };
        if is("Light", "light") {
            if value.trim().is_empty() {
                Ok(Self::Light)
            } else {
                Err(FieldError::invalid("kind_value", value, "lights carry no value"))
            }
        } else if is("Thermostat", "thermostat") {
            Ok(Self::Thermostat {
                temperature_c: codec::parse_number("kind_value", value)?,
            })
        } else if is("DoorLock", "door_lock") {
            Ok(Self::DoorLock {
                locked: codec::parse_bool("kind_value", value)?,
            })
        } else {
            Err(FieldError::invalid("kind", kind, "unknown device kind"))
        }
    }
}

/// A device on the home network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Store-assigned id.
    pub id: EntityId,
    /// Device name; required and searched.
    pub name: String,
    /// Power switch.
    pub powered: bool,
    /// Hourly energy draw in watts.
    pub energy_watts: f64,
    /// Kind-specific state.
    pub kind: DeviceKind,
}

impl Device {
    /// One-line status as shown in a device listing.
    #[must_use]
    pub fn status_line(&self) -> String {
        let power = if self.powered { "On" } else { "Off" };
        match self.kind {
            DeviceKind::Light => format!(
                "Light {} is {power}. Energy usage: {}W",
                self.name, self.energy_watts
            ),
            DeviceKind::Thermostat { temperature_c } => format!(
                "Thermostat {} is {power}, Temp: {temperature_c}°C, Energy usage: {}W",
                self.name, self.energy_watts
            ),
            DeviceKind::DoorLock { locked } => format!(
                "Door {} is {}. Energy usage: {}W",
                self.name,
                if locked { "Locked" } else { "Unlocked" },
                self.energy_watts
            ),
        }
    }

    /// Energy drawn over `hours` while powered; zero when switched off.
    #[must_use]
    pub fn energy_over(&self, hours: f64) -> f64 {
        if self.powered {
            self.energy_watts * hours
        } else {
            0.0
        }
    }
}

/// Fields for a new [`Device`]. Devices start switched off.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceFields {
    /// Name.
    pub name: String,
    /// Hourly draw in watts.
    pub energy_watts: f64,
    /// Kind and its initial state.
    pub kind: DeviceKind,
}

impl DeviceFields {
    fn with_kind(name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            name: name.into(),
            energy_watts: kind.default_energy_watts(),
            kind,
        }
    }

    /// A light drawing 10 W.
    #[must_use]
    pub fn light(name: impl Into<String>) -> Self {
        Self::with_kind(name, DeviceKind::Light)
    }

    /// A thermostat drawing 50 W, set to `temperature_c`.
    #[must_use]
    pub fn thermostat(name: impl Into<String>, temperature_c: f64) -> Self {
        Self::with_kind(name, DeviceKind::Thermostat { temperature_c })
    }

    /// A door lock drawing 5 W, initially locked.
    #[must_use]
    pub fn door_lock(name: impl Into<String>) -> Self {
        Self::with_kind(name, DeviceKind::DoorLock { locked: true })
    }
}

/// Partial update for a [`Device`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevicePatch {
    /// New name.
    pub name: Option<String>,
    /// Switch on or off.
    pub powered: Option<bool>,
    /// New hourly draw.
    pub energy_watts: Option<f64>,
    /// New target temperature. Thermostats only.
    pub temperature_c: Option<f64>,
    /// Lock or unlock. Door locks only.
    pub locked: Option<bool>,
}

impl DevicePatch {
    /// Switches the device on or off.
    #[must_use]
    pub fn power(on: bool) -> Self {
        Self {
            powered: Some(on),
            ..Self::default()
        }
    }

    /// Sets a thermostat's target temperature.
    #[must_use]
    pub fn temperature(temperature_c: f64) -> Self {
        Self {
            temperature_c: Some(temperature_c),
            ..Self::default()
        }
    }

    /// Locks or unlocks a door.
    #[must_use]
    pub fn lock(locked: bool) -> Self {
        Self {
            locked: Some(locked),
            ..Self::default()
        }
    }
}

fn unsupported(operation: &str, kind: DeviceKind) -> ValidationError {
    ValidationError::UnsupportedOperation {
        operation: operation.to_string(),
        kind: kind.label().to_string(),
    }
}

impl Record for Device {
    type Fields = DeviceFields;
    type Patch = DevicePatch;

    fn create(id: EntityId, fields: DeviceFields) -> Result<Self, ValidationError> {
        let device = Self {
            id,
            name: fields.name,
            powered: false,
            energy_watts: fields.energy_watts,
            kind: fields.kind,
        };
        device.validate()?;
        Ok(device)
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, patch: DevicePatch) -> Result<(), ValidationError> {
        if let Some(temperature) = patch.temperature_c {
            match &mut self.kind {
                DeviceKind::Thermostat { temperature_c } => *temperature_c = temperature,
                other => return Err(unsupported("set temperature", *other)),
            }
        }
        if let Some(lock) = patch.locked {
            match &mut self.kind {
                DeviceKind::DoorLock { locked } => *locked = lock,
                other => return Err(unsupported("lock", *other)),
            }
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(powered) = patch.powered {
            self.powered = powered;
        }
        if let Some(energy_watts) = patch.energy_watts {
            self.energy_watts = energy_watts;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_non_empty("name", &self.name)?;
        validation::validate_non_negative("energy_watts", self.energy_watts)?;
        if let DeviceKind::Thermostat { temperature_c } = self.kind {
            validation::validate_finite("temperature_c", temperature_c)?;
        }
        Ok(())
    }
}

impl FlatRecord for Device {
    const COLUMNS: &'static [&'static str] =
        &["name", "powered", "energy_watts", "kind", "kind_value"];

    fn encode_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.powered.to_string(),
            self.energy_watts.to_string(),
            self.kind.name().to_string(),
            self.kind.value_column(),
        ]
    }

    fn decode_fields(id: EntityId, fields: &[&str]) -> Result<Self, FieldError> {
        Ok(Self {
            id,
            name: fields[0].to_string(),
            powered: codec::parse_bool("powered", fields[1])?,
            energy_watts: codec::parse_number("energy_watts", fields[2])?,
            kind: DeviceKind::from_columns(fields[3], fields[4])?,
        })
    }
}

impl Searchable for Device {
    fn search_text(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_line())
    }
}
