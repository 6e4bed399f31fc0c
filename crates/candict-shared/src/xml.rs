//! XML data-dictionary ingestion.
//!
//! Any element named after a record kind (`Signal`, `Object`, `Fault`,
//! `Exception`, `Hardware`, `Metadata`, case-insensitive) becomes one record.
//! Its attributes and the text of its child elements are both read:
//!
//! ```xml
//! <DataDictionary>
//!   <Object ObjectId="100" Description="Engine Speed" Unit="rpm"/>
//!   <Hardware ObjectId="100" Manufacturer="Bosch" Firmware="2.1" BusType="38"/>
//!   <Exception ObjectId="300"><FlashCode>523</FlashCode></Exception>
//! </DataDictionary>
//! ```
//!
//! Other elements are containers and are walked through.

use crate::document::AttributeNames;
use crate::error::DictError;
use crate::record::{RawRecord, RecordKind};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use tracing::debug;

/// Record under construction plus the child element being read
struct OpenRecord {
    raw: RawRecord,
    depth: usize,
    field: Option<String>,
}

fn unreadable(detail: impl std::fmt::Display) -> DictError {
    DictError::SourceUnreadable(format!("invalid XML document: {}", detail))
}

fn record_kind(tag: &str) -> Option<RecordKind> {
    match RecordKind::from_tag(tag) {
        RecordKind::Unknown(_) => None,
        kind => Some(kind),
    }
}

fn insert_mapped(
    raw: &mut RawRecord,
    mapping: &BTreeMap<&str, &'static str>,
    name: &str,
    value: &str,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    let key = mapping.get(name).copied().unwrap_or(name);
    raw.attributes.insert(key.to_string(), value.to_string());
}

fn start_record(
    kind: RecordKind,
    element: &BytesStart<'_>,
    mapping: &BTreeMap<&str, &'static str>,
) -> Result<RawRecord, DictError> {
    let mut raw = RawRecord::new(kind);
    for attribute in element.attributes() {
        let attribute = attribute.map_err(unreadable)?;
        let name = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(unreadable)?;
        insert_mapped(&mut raw, mapping, &name, &value);
    }
    Ok(raw)
}

/// Parse an XML document held in memory
pub fn parse_xml_records(xml: &str, names: &AttributeNames) -> Result<Vec<RawRecord>, DictError> {
    let mapping = names.mapping();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut open: Option<OpenRecord> = None;
    let mut saw_element = false;
    let mut unclosed = 0usize;

    loop {
        match reader.read_event().map_err(unreadable)? {
            Event::Start(element) => {
                saw_element = true;
                unclosed += 1;
                let tag = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                match open.as_mut() {
                    Some(record) => {
                        record.depth += 1;
                        record.field = Some(tag);
                    }
                    None => {
                        if let Some(kind) = record_kind(&tag) {
                            open = Some(OpenRecord {
                                raw: start_record(kind, &element, &mapping)?,
                                depth: 0,
                                field: None,
                            });
                        }
                    }
                }
            }
            Event::Empty(element) => {
                saw_element = true;
                if open.is_none() {
                    let tag = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                    if let Some(kind) = record_kind(&tag) {
                        records.push(start_record(kind, &element, &mapping)?);
                    }
                }
            }
            Event::Text(text) => {
                if let Some(OpenRecord {
                    raw,
                    field: Some(field),
                    ..
                }) = open.as_mut()
                {
                    let value = text.unescape().map_err(unreadable)?;
                    insert_mapped(raw, &mapping, field, &value);
                }
            }
            Event::End(_) => {
                unclosed = unclosed.saturating_sub(1);
                if let Some(record) = open.as_mut() {
                    if record.depth == 0 {
                        if let Some(done) = open.take() {
                            records.push(done.raw);
                        }
                    } else {
                        record.depth -= 1;
                        record.field = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if open.is_some() || unclosed > 0 {
        return Err(unreadable("unexpected end of document"));
    }
    if !saw_element {
        return Err(unreadable("no elements"));
    }

    debug!("Parsed {} records from XML document", records.len());
    Ok(records)
}
