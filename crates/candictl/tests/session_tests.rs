//! Session tests: loading documents from disk, reloading, query log.

use candict_shared::{DictError, QueryStatus};
use candictl::config::Config;
use candictl::logging::{LogEntry, QueryLog};
use candictl::Session;
use std::fs;
use std::path::Path;

const FIRST_DOCUMENT: &str = r#"{"records": [
    {"kind": "signal", "attributes": {"ObjectId": "300", "Description": "Engine Oil Pressure Low", "Unit": "kPa"}},
    {"kind": "fault", "attributes": {"ObjectId": "500", "CorrectiveAction": "Replace sensor", "FlashCode": "523", "Severity": "High"}},
    {"kind": "hardware", "attributes": {"ObjectId": "100", "Manufacturer": "Bosch", "Firmware": "2.1", "BusType": 38}},
    {"kind": "hardware", "attributes": {"ObjectId": "100", "Manufacturer": "Bosch", "Firmware": "2.2", "BusType": 47}},
    {"kind": "hardware", "attributes": {"ObjectId": "200", "Manufacturer": "Denso", "Firmware": "1.0", "BusType": 38}},
    {"kind": "hardware", "attributes": {"Manufacturer": "Orphan"}}
]}"#;

const SECOND_DOCUMENT: &str = r#"[
    {"kind": "hardware", "attributes": {"ObjectId": "900", "Manufacturer": "Delphi", "BusType": 11}}
]"#;

fn write_doc(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.history.query_log = false;
    config
}

#[test]
fn test_session_answers_from_loaded_document() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(dir.path(), "dd.json", FIRST_DOCUMENT);

    let mut session = Session::from_config(&quiet_config(), Some(&doc), false).unwrap();
    let summary = session.summary();
    assert_eq!(summary.signals, 1);
    assert_eq!(summary.faults, 1);
    assert_eq!(summary.hardware_records, 3);
    assert_eq!(summary.build.skipped_missing_id, 1);

    let result = session.ask("how many bus types");
    assert_eq!(result.payload, "Found 2 unique BusTypes: 38, 47");

    let result = session.ask("flash code 523");
    assert_eq!(result.status, QueryStatus::Success);
    assert!(result.payload.contains("Replace sensor"));
}

#[test]
fn test_unreadable_document_is_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write_doc(dir.path(), "broken.json", "{\"records\": [");

    let err = Session::from_config(&quiet_config(), Some(&broken), false).unwrap_err();
    assert!(matches!(err, DictError::SourceUnreadable(_)));

    let missing = dir.path().join("missing.json");
    let err = Session::from_config(&quiet_config(), Some(&missing), false).unwrap_err();
    assert!(matches!(err, DictError::SourceUnreadable(_)));
}

#[test]
fn test_reload_swaps_whole_index() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_doc(dir.path(), "first.json", FIRST_DOCUMENT);
    let second = write_doc(dir.path(), "second.json", SECOND_DOCUMENT);

    let mut session = Session::from_config(&quiet_config(), Some(&first), false).unwrap();
    let before = session.index().snapshot();

    let summary = session.reload(&second).unwrap();
    assert_eq!(summary.signals, 0);
    assert_eq!(summary.hardware_ids, 1);
    assert_eq!(session.index().source().as_deref(), Some(second.as_path()));

    // Old snapshot still complete
    assert_eq!(before.bus_types().len(), 2);

    assert_eq!(session.ask("how many bus types").payload, "Found 1 unique BusTypes: 11");
    assert_eq!(session.ask("objectid 300").status, QueryStatus::Error);
}

#[test]
fn test_failed_reload_keeps_old_index() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_doc(dir.path(), "first.json", FIRST_DOCUMENT);
    let broken = write_doc(dir.path(), "broken.json", "not json at all");

    let mut session = Session::from_config(&quiet_config(), Some(&first), false).unwrap();
    assert!(session.reload(&broken).is_err());

    assert_eq!(session.index().source().as_deref(), Some(first.as_path()));
    assert_eq!(session.ask("search for oil").status, QueryStatus::Info);
}

#[test]
fn test_configured_attribute_names() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(
        dir.path(),
        "spn.json",
        r#"[{"kind": "signal", "attributes": {"SPN": "190", "Text": "Engine Speed"}}]"#,
    );

    let mut config = quiet_config();
    config.attributes.id = "SPN".to_string();
    config.attributes.description = "Text".to_string();

    let mut session = Session::from_config(&config, Some(&doc), false).unwrap();
    assert!(session
        .ask("objectid 190")
        .payload
        .contains("Signal: Engine Speed"));
}

#[test]
fn test_query_log_lines() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write_doc(dir.path(), "dd.json", FIRST_DOCUMENT);
    let log_path = dir.path().join("state/queries.jsonl");

    let mut session = Session::from_config(&quiet_config(), Some(&doc), false)
        .unwrap()
        .with_log(QueryLog::at(log_path.clone()));
    session.ask("how many bus types");
    session.ask("objectid 999");

    let content = fs::read_to_string(&log_path).unwrap();
    let entries: Vec<LogEntry> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].intent, "count");
    assert_eq!(entries[0].status, "success");
    assert_eq!(entries[1].intent, "object_lookup");
    assert_eq!(entries[1].status, "error");
    assert_eq!(entries[1].history_len, 2);
    assert_ne!(entries[0].req_id, entries[1].req_id);
    assert!(entries[1].source.as_deref().unwrap().ends_with("dd.json"));
}
