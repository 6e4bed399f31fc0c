//! Source records and the typed entries stored in the diagnostic index.
//!
//! A `RawRecord` is what the ingestion side hands to the index builder: a
//! record kind plus a flat attribute map keyed by the canonical names in
//! [`attr`]. Typed records are what the index keeps per identifier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical attribute keys understood by the index builder.
pub mod attr {
    pub const ID: &str = "id";
    pub const DESCRIPTION: &str = "description";
    pub const UNIT: &str = "unit";
    pub const CORRECTIVE_ACTION: &str = "corrective_action";
    pub const FLASH_CODE: &str = "flash_code";
    pub const SEVERITY: &str = "severity";
    pub const MANUFACTURER: &str = "manufacturer";
    pub const FIRMWARE: &str = "firmware";
    pub const BUS_TYPE: &str = "bus_type";
}

/// Opaque identifier shared by signal, fault and hardware records.
pub type Identifier = String;

/// Kind of a source record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Signal description and unit of measure
    Signal,
    /// Exception metadata: corrective action, flash code, severity
    Fault,
    /// One manufacturer/firmware/bus combination
    Hardware,
    /// Any tag the ingestion side did not recognize
    Unknown(String),
}

impl RecordKind {
    /// Map a document tag to a kind (case-insensitive).
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "signal" | "object" => RecordKind::Signal,
            "fault" | "exception" => RecordKind::Fault,
            "hardware" | "metadata" => RecordKind::Hardware,
            _ => RecordKind::Unknown(tag.to_string()),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Signal => write!(f, "signal"),
            RecordKind::Fault => write!(f, "fault"),
            RecordKind::Hardware => write!(f, "hardware"),
            RecordKind::Unknown(tag) => write!(f, "unknown:{}", tag),
        }
    }
}

/// Parsed source record handed to the index builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub kind: RecordKind,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Attribute value, or "" when missing
    pub fn get(&self, key: &str) -> &str {
        self.attributes.get(key).map(String::as_str).unwrap_or("")
    }

    /// Identifier of this record, if present and non-empty
    pub fn identifier(&self) -> Option<&str> {
        let id = self.get(attr::ID).trim();
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub description: String,
    pub unit: String,
}

impl SignalRecord {
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            description: raw.get(attr::DESCRIPTION).to_string(),
            unit: raw.get(attr::UNIT).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultRecord {
    pub corrective_action: String,
    pub flash_code: String,
    pub severity: String,
}

impl FaultRecord {
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            corrective_action: raw.get(attr::CORRECTIVE_ACTION).to_string(),
            flash_code: raw.get(attr::FLASH_CODE).to_string(),
            severity: raw.get(attr::SEVERITY).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareRecord {
    pub manufacturer: String,
    pub firmware: String,
    pub bus_type: String,
}

impl HardwareRecord {
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            manufacturer: raw.get(attr::MANUFACTURER).to_string(),
            firmware: raw.get(attr::FIRMWARE).to_string(),
            bus_type: raw.get(attr::BUS_TYPE).to_string(),
        }
    }
}

impl fmt::Display for HardwareRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Manufacturer: {} | Firmware: {} | BusType: {}",
            or_dash(&self.manufacturer),
            or_dash(&self.firmware),
            or_dash(&self.bus_type)
        )
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_tag() {
        assert_eq!(RecordKind::from_tag("Signal"), RecordKind::Signal);
        assert_eq!(RecordKind::from_tag("EXCEPTION"), RecordKind::Fault);
        assert_eq!(RecordKind::from_tag(" metadata "), RecordKind::Hardware);
        assert_eq!(
            RecordKind::from_tag("note"),
            RecordKind::Unknown("note".to_string())
        );
    }

    #[test]
    fn test_identifier_requires_non_empty() {
        let raw = RawRecord::new(RecordKind::Signal).with(attr::ID, "  ");
        assert!(raw.identifier().is_none());
        let raw = RawRecord::new(RecordKind::Signal).with(attr::ID, "0042");
        assert_eq!(raw.identifier(), Some("0042"));
    }

    #[test]
    fn test_missing_attributes_are_empty() {
        let raw = RawRecord::new(RecordKind::Hardware).with(attr::ID, "1");
        let hw = HardwareRecord::from_raw(&raw);
        assert_eq!(hw, HardwareRecord::default());
        assert_eq!(
            hw.to_string(),
            "Manufacturer: - | Firmware: - | BusType: -"
        );
    }
}
