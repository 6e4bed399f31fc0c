//! Data-dictionary document ingestion.
//!
//! Turns a JSON or XML export into `RawRecord`s. A document whose first
//! non-blank character is `<` is read as XML (see [`crate::xml`]); anything
//! else as JSON. Accepted JSON shapes:
//!
//! ```json
//! {"records": [{"kind": "signal", "attributes": {"ObjectId": "100", "Description": "..."}}]}
//! [{"kind": "hardware", "attributes": {"ObjectId": "100", "BusType": 38}}]
//! ```
//!
//! Source attribute names are mapped onto the canonical keys in
//! [`crate::record::attr`] through [`AttributeNames`]. Anything structurally
//! wrong with the document is a single `SourceUnreadable` error; per-record
//! problems are left for the index builder to skip.

use crate::error::DictError;
use crate::index::DiagnosticIndex;
use crate::record::{attr, RawRecord, RecordKind};
use crate::xml::parse_xml_records;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Source attribute names for each canonical key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeNames {
    #[serde(default = "default_id")]
    pub id: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_corrective_action")]
    pub corrective_action: String,
    #[serde(default = "default_flash_code")]
    pub flash_code: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,
    #[serde(default = "default_firmware")]
    pub firmware: String,
    #[serde(default = "default_bus_type")]
    pub bus_type: String,
}

fn default_id() -> String {
    "ObjectId".to_string()
}

fn default_description() -> String {
    "Description".to_string()
}

fn default_unit() -> String {
    "Unit".to_string()
}

fn default_corrective_action() -> String {
    "CorrectiveAction".to_string()
}

fn default_flash_code() -> String {
    "FlashCode".to_string()
}

fn default_severity() -> String {
    "Severity".to_string()
}

fn default_manufacturer() -> String {
    "Manufacturer".to_string()
}

fn default_firmware() -> String {
    "Firmware".to_string()
}

fn default_bus_type() -> String {
    "BusType".to_string()
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            id: default_id(),
            description: default_description(),
            unit: default_unit(),
            corrective_action: default_corrective_action(),
            flash_code: default_flash_code(),
            severity: default_severity(),
            manufacturer: default_manufacturer(),
            firmware: default_firmware(),
            bus_type: default_bus_type(),
        }
    }
}

impl AttributeNames {
    /// Source name -> canonical key
    pub(crate) fn mapping(&self) -> BTreeMap<&str, &'static str> {
        [
            (self.id.as_str(), attr::ID),
            (self.description.as_str(), attr::DESCRIPTION),
            (self.unit.as_str(), attr::UNIT),
            (self.corrective_action.as_str(), attr::CORRECTIVE_ACTION),
            (self.flash_code.as_str(), attr::FLASH_CODE),
            (self.severity.as_str(), attr::SEVERITY),
            (self.manufacturer.as_str(), attr::MANUFACTURER),
            (self.firmware.as_str(), attr::FIRMWARE),
            (self.bus_type.as_str(), attr::BUS_TYPE),
        ]
        .into_iter()
        .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Wrapped { records: Vec<DocumentRecord> },
    Bare(Vec<DocumentRecord>),
}

#[derive(Debug, Deserialize)]
struct DocumentRecord {
    kind: String,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

/// Parse a JSON document held in memory
pub fn parse_records(json: &str, names: &AttributeNames) -> Result<Vec<RawRecord>, DictError> {
    let document: Document = serde_json::from_str(json)
        .map_err(|e| DictError::SourceUnreadable(format!("invalid document: {}", e)))?;

    let entries = match document {
        Document::Wrapped { records } => records,
        Document::Bare(records) => records,
    };

    let mapping = names.mapping();
    let records = entries
        .into_iter()
        .map(|entry| {
            let mut raw = RawRecord::new(RecordKind::from_tag(&entry.kind));
            for (name, value) in entry.attributes {
                let Some(text) = value_text(&value) else {
                    continue;
                };
                let key = mapping.get(name.as_str()).copied().unwrap_or(name.as_str());
                raw.attributes.insert(key.to_string(), text);
            }
            raw
        })
        .collect::<Vec<_>>();

    debug!("Parsed {} records from document", records.len());
    Ok(records)
}

/// Scalars become text; null, arrays and objects count as missing
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Read and parse a document from disk
pub fn load_records(path: &Path, names: &AttributeNames) -> Result<Vec<RawRecord>, DictError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DictError::SourceUnreadable(format!("{}: {}", path.display(), e))
    })?;
    parse_document(&text, names)
}

/// Parse a document in either format
pub fn parse_document(text: &str, names: &AttributeNames) -> Result<Vec<RawRecord>, DictError> {
    if text.trim_start().starts_with('<') {
        parse_xml_records(text, names)
    } else {
        parse_records(text, names)
    }
}

/// Load a document and build its index; all-or-nothing
pub fn load_index(path: &Path, names: &AttributeNames) -> Result<DiagnosticIndex, DictError> {
    let records = load_records(path, names)?;
    let index = DiagnosticIndex::build(records);
    info!(
        "Loaded {} ({} records indexed)",
        path.display(),
        index.stats().indexed()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_document() {
        let json = r#"{"records": [
            {"kind": "signal", "attributes": {"ObjectId": "100", "Description": "Oil", "Unit": "kPa"}},
            {"kind": "hardware", "attributes": {"ObjectId": 100, "BusType": 38, "Manufacturer": null}}
        ]}"#;
        let records = parse_records(json, &AttributeNames::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, RecordKind::Signal);
        assert_eq!(records[0].get(attr::DESCRIPTION), "Oil");
        assert_eq!(records[1].get(attr::ID), "100");
        assert_eq!(records[1].get(attr::BUS_TYPE), "38");
        assert!(!records[1].attributes.contains_key(attr::MANUFACTURER));
    }

    #[test]
    fn test_parse_bare_array() {
        let json = r#"[{"kind": "exception", "attributes": {"ObjectId": "5", "FlashCode": "523"}}]"#;
        let records = parse_records(json, &AttributeNames::default()).unwrap();
        assert_eq!(records[0].kind, RecordKind::Fault);
        assert_eq!(records[0].get(attr::FLASH_CODE), "523");
    }

    #[test]
    fn test_custom_attribute_names() {
        let names = AttributeNames {
            id: "SPN".to_string(),
            ..AttributeNames::default()
        };
        let json = r#"[{"kind": "signal", "attributes": {"SPN": "91"}}]"#;
        let records = parse_records(json, &names).unwrap();
        assert_eq!(records[0].identifier(), Some("91"));
    }

    #[test]
    fn test_canonical_keys_pass_through() {
        let json = r#"[{"kind": "signal", "attributes": {"id": "9", "description": "x"}}]"#;
        let records = parse_records(json, &AttributeNames::default()).unwrap();
        assert_eq!(records[0].identifier(), Some("9"));
        assert_eq!(records[0].get(attr::DESCRIPTION), "x");
    }

    #[test]
    fn test_truncated_document_is_unreadable() {
        let json = r#"{"records": [{"kind": "signal", "attributes": {"ObjectId": "1"#;
        let err = parse_records(json, &AttributeNames::default()).unwrap_err();
        assert!(matches!(err, DictError::SourceUnreadable(_)));
    }

    #[test]
    fn test_wrong_shape_is_unreadable() {
        let err = parse_records(r#"{"rows": 3}"#, &AttributeNames::default()).unwrap_err();
        assert!(matches!(err, DictError::SourceUnreadable(_)));
    }

    #[test]
    fn test_document_format_detection() {
        let names = AttributeNames::default();
        let xml = "\n  <DataDictionary><Object ObjectId=\"7\"/></DataDictionary>";
        let records = parse_document(xml, &names).unwrap();
        assert_eq!(records[0].identifier(), Some("7"));

        let json = r#"[{"kind": "object", "attributes": {"ObjectId": "8"}}]"#;
        let records = parse_document(json, &names).unwrap();
        assert_eq!(records[0].identifier(), Some("8"));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = load_index(
            Path::new("/nonexistent/candict/dictionary.json"),
            &AttributeNames::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DictError::SourceUnreadable(_)));
    }
}
