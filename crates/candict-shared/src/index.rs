//! Cross-referenced diagnostic index.
//!
//! Built in a single pass from a fully materialized record set and never
//! mutated afterwards. Uses BTreeMap/BTreeSet so every enumeration is sorted
//! and every tie-break is deterministic.
//!
//! Singletons (signal, fault) are last-write-wins; hardware records are
//! append-only per identifier and keep duplicates in source order.

use crate::record::{
    attr, FaultRecord, HardwareRecord, Identifier, RawRecord, RecordKind, SignalRecord,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Counters collected while building an index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub records_seen: usize,
    pub skipped_missing_id: usize,
    pub skipped_unknown_kind: usize,
}

impl BuildStats {
    pub fn indexed(&self) -> usize {
        self.records_seen - self.skipped_missing_id - self.skipped_unknown_kind
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticIndex {
    signals: BTreeMap<Identifier, SignalRecord>,
    faults: BTreeMap<Identifier, FaultRecord>,
    hardware: BTreeMap<Identifier, Vec<HardwareRecord>>,
    bus_types: BTreeSet<String>,
    manufacturers: BTreeSet<String>,
    severities: BTreeSet<String>,
    flash_code_to_id: BTreeMap<String, Identifier>,
    stats: BuildStats,
}

impl DiagnosticIndex {
    /// Empty index, used before any document is loaded
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the index from a record sequence in one pass.
    ///
    /// Records without an identifier and records of an unknown kind are
    /// skipped and counted in [`BuildStats`]; this never fails.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut index = Self::default();

        for record in records {
            index.stats.records_seen += 1;

            if let RecordKind::Unknown(_) = record.kind {
                index.stats.skipped_unknown_kind += 1;
                continue;
            }

            let id = match record.identifier() {
                Some(id) => id.to_string(),
                None => {
                    index.stats.skipped_missing_id += 1;
                    continue;
                }
            };

            match record.kind {
                RecordKind::Signal => {
                    index.signals.insert(id, SignalRecord::from_raw(&record));
                }
                RecordKind::Fault => index.insert_fault(id, &record),
                RecordKind::Hardware => index.push_hardware(id, &record),
                RecordKind::Unknown(_) => {}
            }
        }

        debug!(
            records = index.stats.records_seen,
            signals = index.signals.len(),
            faults = index.faults.len(),
            hardware_ids = index.hardware.len(),
            skipped_missing_id = index.stats.skipped_missing_id,
            skipped_unknown_kind = index.stats.skipped_unknown_kind,
            "diagnostic index built"
        );

        index
    }

    fn insert_fault(&mut self, id: Identifier, record: &RawRecord) {
        let fault = FaultRecord::from_raw(record);

        if !fault.flash_code.is_empty() {
            self.flash_code_to_id
                .insert(fault.flash_code.clone(), id.clone());
        }
        if !fault.severity.is_empty() {
            self.severities.insert(fault.severity.clone());
        }

        self.faults.insert(id, fault);
    }

    fn push_hardware(&mut self, id: Identifier, record: &RawRecord) {
        let hw = HardwareRecord::from_raw(record);

        if !hw.bus_type.is_empty() {
            self.bus_types.insert(hw.bus_type.clone());
        }
        if !hw.manufacturer.is_empty() {
            self.manufacturers.insert(hw.manufacturer.clone());
        }

        self.hardware.entry(id).or_default().push(hw);
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty() && self.faults.is_empty() && self.hardware.is_empty()
    }

    pub fn signal(&self, id: &str) -> Option<&SignalRecord> {
        self.signals.get(id)
    }

    pub fn fault(&self, id: &str) -> Option<&FaultRecord> {
        self.faults.get(id)
    }

    /// Hardware sequence for an identifier; empty when the key is absent
    pub fn hardware(&self, id: &str) -> &[HardwareRecord] {
        self.hardware.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn signals(&self) -> &BTreeMap<Identifier, SignalRecord> {
        &self.signals
    }

    pub fn faults(&self) -> &BTreeMap<Identifier, FaultRecord> {
        &self.faults
    }

    pub fn bus_types(&self) -> &BTreeSet<String> {
        &self.bus_types
    }

    pub fn manufacturers(&self) -> &BTreeSet<String> {
        &self.manufacturers
    }

    pub fn severities(&self) -> &BTreeSet<String> {
        &self.severities
    }

    pub fn flash_codes(&self) -> &BTreeMap<String, Identifier> {
        &self.flash_code_to_id
    }

    /// Resolve a flash code: exact match first, then case-insensitive
    pub fn id_for_flash_code(&self, code: &str) -> Option<&str> {
        if let Some(id) = self.flash_code_to_id.get(code) {
            return Some(id);
        }
        self.flash_code_to_id
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(code))
            .map(|(_, id)| id.as_str())
    }

    /// Whether the identifier appears in any of the three maps
    pub fn contains(&self, id: &str) -> bool {
        self.signals.contains_key(id)
            || self.faults.contains_key(id)
            || self.hardware.contains_key(id)
    }

    /// Distinct, sorted bus types observed for one identifier
    pub fn bus_types_for(&self, id: &str) -> BTreeSet<&str> {
        self.hardware(id)
            .iter()
            .map(|hw| hw.bus_type.as_str())
            .filter(|b| !b.is_empty())
            .collect()
    }

    /// Identifiers with at least one hardware record on this bus type
    pub fn ids_with_bus_type(&self, bus_type: &str) -> Vec<&str> {
        self.hardware
            .iter()
            .filter(|(_, seq)| seq.iter().any(|hw| hw.bus_type == bus_type))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Identifiers with at least one hardware record from this manufacturer
    pub fn ids_with_manufacturer(&self, manufacturer: &str) -> Vec<&str> {
        self.hardware
            .iter()
            .filter(|(_, seq)| seq.iter().any(|hw| hw.manufacturer == manufacturer))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Signals whose description contains `term` (case-insensitive)
    pub fn search_descriptions(&self, term: &str) -> Vec<(&str, &SignalRecord)> {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.signals
            .iter()
            .filter(|(_, s)| s.description.to_lowercase().contains(&needle))
            .map(|(id, s)| (id.as_str(), s))
            .collect()
    }

    /// Identifiers whose fault corrective action contains `term`
    pub fn search_corrective_actions(&self, term: &str) -> Vec<&str> {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.faults
            .iter()
            .filter(|(_, f)| f.corrective_action.to_lowercase().contains(&needle))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Description of an identifier, or "" when it has no signal record
    pub fn description_of(&self, id: &str) -> &str {
        self.signals
            .get(id)
            .map(|s| s.description.as_str())
            .unwrap_or("")
    }
}

/// Counts per record kind, handy for logs and the stats command
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IndexSummary {
    pub signals: usize,
    pub faults: usize,
    pub hardware_ids: usize,
    pub hardware_records: usize,
    pub bus_types: usize,
    pub manufacturers: usize,
    pub severities: usize,
    pub flash_codes: usize,
    pub build: BuildStats,
}

impl From<&DiagnosticIndex> for IndexSummary {
    fn from(index: &DiagnosticIndex) -> Self {
        Self {
            signals: index.signals.len(),
            faults: index.faults.len(),
            hardware_ids: index.hardware.len(),
            hardware_records: index.hardware.values().map(Vec::len).sum(),
            bus_types: index.bus_types.len(),
            manufacturers: index.manufacturers.len(),
            severities: index.severities.len(),
            flash_codes: index.flash_code_to_id.len(),
            build: index.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hw(id: &str, manufacturer: &str, bus: &str) -> RawRecord {
        RawRecord::new(RecordKind::Hardware)
            .with(attr::ID, id)
            .with(attr::MANUFACTURER, manufacturer)
            .with(attr::FIRMWARE, "1.0")
            .with(attr::BUS_TYPE, bus)
    }

    #[test]
    fn test_empty_index() {
        let index = DiagnosticIndex::empty();
        assert!(index.is_empty());
        assert!(index.hardware("1").is_empty());
        assert!(!index.contains("1"));
    }

    #[test]
    fn test_skips_missing_id_and_unknown_kind() {
        let records = vec![
            RawRecord::new(RecordKind::Signal).with(attr::DESCRIPTION, "orphan"),
            RawRecord::new(RecordKind::Unknown("note".into())).with(attr::ID, "1"),
            RawRecord::new(RecordKind::Signal).with(attr::ID, "1"),
        ];
        let index = DiagnosticIndex::build(records);
        let stats = index.stats();
        assert_eq!(stats.records_seen, 3);
        assert_eq!(stats.skipped_missing_id, 1);
        assert_eq!(stats.skipped_unknown_kind, 1);
        assert_eq!(stats.indexed(), 1);
        assert_eq!(index.signals().len(), 1);
    }

    #[test]
    fn test_bus_types_for_ignores_empty() {
        let index = DiagnosticIndex::build(vec![
            hw("100", "Bosch", "38"),
            hw("100", "Bosch", ""),
            hw("100", "Bosch", "47"),
            hw("100", "Bosch", "38"),
        ]);
        let buses: Vec<&str> = index.bus_types_for("100").into_iter().collect();
        assert_eq!(buses, vec!["38", "47"]);
        assert_eq!(index.hardware("100").len(), 4);
    }

    #[test]
    fn test_flash_code_case_insensitive_fallback() {
        let index = DiagnosticIndex::build(vec![RawRecord::new(RecordKind::Fault)
            .with(attr::ID, "7")
            .with(attr::FLASH_CODE, "A12")]);
        assert_eq!(index.id_for_flash_code("A12"), Some("7"));
        assert_eq!(index.id_for_flash_code("a12"), Some("7"));
        assert_eq!(index.id_for_flash_code("b12"), None);
    }

    #[test]
    fn test_summary_counts() {
        let index = DiagnosticIndex::build(vec![
            hw("1", "Bosch", "38"),
            hw("1", "Denso", "47"),
            hw("2", "Bosch", "38"),
        ]);
        let summary = IndexSummary::from(&index);
        assert_eq!(summary.hardware_ids, 2);
        assert_eq!(summary.hardware_records, 3);
        assert_eq!(summary.manufacturers, 2);
        assert_eq!(summary.bus_types, 2);
    }
}
