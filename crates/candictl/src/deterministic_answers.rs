//! Deterministic Answer Engine
//!
//! Every structured intent is answered straight from the diagnostic index.
//! Handlers return `Err(DictError)` for lookups that come up empty; the
//! query handler turns those into error results.
//!
//! Display caps come from `DisplayLimits` and only shorten what is printed;
//! reported counts are always the full result size.

use crate::intent_router::Category;
use candict_shared::render::{join_capped, more_suffix, paginate, truncate_text};
use candict_shared::{DiagnosticIndex, DictError, DisplayLimits, QueryResult};

type AnswerResult = Result<QueryResult, DictError>;

// === Counts ===

pub fn answer_count(
    index: &DiagnosticIndex,
    category: Category,
    object_id: Option<&str>,
    limits: &DisplayLimits,
) -> AnswerResult {
    if let (Category::BusTypes, Some(id)) = (category, object_id) {
        let buses: Vec<&str> = index.bus_types_for(id).into_iter().collect();
        if buses.is_empty() {
            return Err(DictError::not_found("BusTypes for Object ID", id));
        }
        return Ok(QueryResult::success(format!(
            "Object ID {} uses {} unique BusTypes: {}",
            id,
            buses.len(),
            join_capped(&buses, limits.list_cap)
        )));
    }

    Ok(match category {
        Category::BusTypes => {
            let buses: Vec<&String> = index.bus_types().iter().collect();
            if buses.is_empty() {
                return Ok(QueryResult::success("Found 0 unique BusTypes"));
            }
            QueryResult::success(format!(
                "Found {} unique BusTypes: {}",
                buses.len(),
                join_capped(&buses, limits.list_cap)
            ))
        }
        Category::Manufacturers => QueryResult::info(format!(
            "Found {} unique manufacturers",
            index.manufacturers().len()
        )),
        Category::Signals => {
            QueryResult::success(format!("Found {} signal objects", index.signals().len()))
        }
        Category::FlashCodes => {
            QueryResult::success(format!("Found {} flash codes", index.flash_codes().len()))
        }
    })
}

// === Enumerations ===

pub fn answer_enumerate(
    index: &DiagnosticIndex,
    category: Category,
    object_id: Option<&str>,
    limits: &DisplayLimits,
) -> AnswerResult {
    if let (Category::BusTypes, Some(id)) = (category, object_id) {
        let buses: Vec<String> = index
            .bus_types_for(id)
            .into_iter()
            .map(str::to_string)
            .collect();
        if buses.is_empty() {
            return Err(DictError::not_found("BusTypes for Object ID", id));
        }
        return Ok(QueryResult::success(listing(
            &format!("BusTypes for Object ID {}", id),
            &buses,
            limits.list_cap,
        )));
    }

    Ok(match category {
        Category::BusTypes => {
            let buses: Vec<String> = index.bus_types().iter().cloned().collect();
            QueryResult::success(listing("BusTypes", &buses, limits.list_cap))
        }
        Category::Manufacturers => {
            let names: Vec<String> = index.manufacturers().iter().cloned().collect();
            QueryResult::info(listing("manufacturers", &names, limits.list_cap))
        }
        Category::Signals => {
            let lines: Vec<String> = index
                .signals()
                .iter()
                .map(|(id, s)| {
                    format!(
                        "{}: {}",
                        id,
                        describe(&s.description, limits.description_width)
                    )
                })
                .collect();
            QueryResult::success(listing("signal objects", &lines, limits.list_cap))
        }
        Category::FlashCodes => {
            let lines: Vec<String> = index
                .flash_codes()
                .iter()
                .map(|(code, id)| format!("{} -> Object ID {}", code, id))
                .collect();
            QueryResult::success(listing("flash codes", &lines, limits.list_cap))
        }
    })
}

/// "All N <what>:" followed by one item per line, capped
fn listing(what: &str, items: &[String], cap: usize) -> String {
    let mut out = format!("All {} {}:", items.len(), what);
    let (shown, remaining) = paginate(items, cap);
    for item in shown {
        out.push_str(&format!("\n  {}", item));
    }
    if let Some(more) = more_suffix(remaining) {
        out.push_str(&format!("\n  {}", more));
    }
    out
}

// === Object report ===

pub fn answer_object(index: &DiagnosticIndex, id: &str, limits: &DisplayLimits) -> AnswerResult {
    if !index.contains(id) {
        return Err(DictError::not_found("Object ID", id));
    }
    Ok(QueryResult::success(object_report(index, id, limits)))
}

/// Composite signal/fault/hardware report for one identifier
pub fn object_report(index: &DiagnosticIndex, id: &str, limits: &DisplayLimits) -> String {
    let mut out = format!("Object ID {}", id);

    match index.signal(id) {
        Some(s) if s.unit.is_empty() => {
            out.push_str(&format!("\nSignal: {}", or_dash(&s.description)))
        }
        Some(s) => out.push_str(&format!("\nSignal: {} [{}]", or_dash(&s.description), s.unit)),
        None => out.push_str("\nSignal: no signal data"),
    }

    match index.fault(id) {
        Some(f) => out.push_str(&format!(
            "\nException: {} (flash code {}, severity {})",
            or_dash(&f.corrective_action),
            or_dash(&f.flash_code),
            or_dash(&f.severity)
        )),
        None => out.push_str("\nException: no exception data"),
    }

    let hardware = index.hardware(id);
    if hardware.is_empty() {
        out.push_str("\nHardware: no hardware data");
    } else {
        out.push_str(&format!(
            "\nHardware ({} configurations):",
            hardware.len()
        ));
        let (shown, remaining) = paginate(hardware, limits.hardware_cap);
        for (n, hw) in shown.iter().enumerate() {
            out.push_str(&format!("\n  {}. {}", n + 1, hw));
        }
        if let Some(more) = more_suffix(remaining) {
            out.push_str(&format!("\n  {}", more));
        }

        let buses: Vec<&str> = index.bus_types_for(id).into_iter().collect();
        if !buses.is_empty() {
            out.push_str(&format!("\nBusTypes: {}", buses.join(", ")));
        }
    }

    out
}

pub fn answer_flash_code(
    index: &DiagnosticIndex,
    code: &str,
    limits: &DisplayLimits,
) -> AnswerResult {
    let id = index
        .id_for_flash_code(code)
        .ok_or_else(|| DictError::not_found("Flash code", code))?;
    let report = answer_object(index, id, limits)?;
    Ok(QueryResult::success(format!(
        "Flash code {} -> Object ID {}\n\n{}",
        code, id, report.payload
    )))
}

// === Filters ===

pub fn answer_bus_type(
    index: &DiagnosticIndex,
    bus_type: &str,
    limits: &DisplayLimits,
) -> AnswerResult {
    let ids = index.ids_with_bus_type(bus_type);
    if ids.is_empty() {
        return Err(DictError::not_found("BusType", bus_type));
    }
    Ok(QueryResult::info(match_listing(
        index,
        &format!("with BusType {}", bus_type),
        &ids,
        limits,
    )))
}

/// Manufacturer filter: the first (lexicographic) known manufacturer that
/// matches a term in either direction wins
pub fn answer_manufacturer(
    index: &DiagnosticIndex,
    terms: &[String],
    limits: &DisplayLimits,
) -> AnswerResult {
    let manufacturer = match_manufacturer(index, terms).ok_or_else(|| {
        let key = terms.first().map(String::as_str).unwrap_or("(unnamed)");
        DictError::not_found("Manufacturer", key)
    })?;

    let ids = index.ids_with_manufacturer(manufacturer);
    Ok(QueryResult::info(match_listing(
        index,
        &format!("with hardware from {}", manufacturer),
        &ids,
        limits,
    )))
}

pub fn match_manufacturer<'a>(index: &'a DiagnosticIndex, terms: &[String]) -> Option<&'a str> {
    terms
        .iter()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .find_map(|term| {
            index
                .manufacturers()
                .iter()
                .find(|name| {
                    let name_lower = name.to_lowercase();
                    name_lower.contains(&term) || term.contains(&name_lower)
                })
                .map(String::as_str)
        })
}

pub fn answer_severities(index: &DiagnosticIndex) -> AnswerResult {
    let severities: Vec<&str> = index.severities().iter().map(String::as_str).collect();
    if severities.is_empty() {
        return Ok(QueryResult::info("No severity levels recorded"));
    }
    Ok(QueryResult::info(format!(
        "Found {} severity levels: {}",
        severities.len(),
        severities.join(", ")
    )))
}

// === Search ===

pub fn answer_search(index: &DiagnosticIndex, term: &str, limits: &DisplayLimits) -> AnswerResult {
    let hits = index.search_descriptions(term);
    if hits.is_empty() {
        return Err(DictError::not_found("Signal description matching", term));
    }

    let noun = if hits.len() == 1 { "signal" } else { "signals" };
    let mut out = format!("Found {} {} matching '{}':", hits.len(), noun, term);
    let (shown, remaining) = paginate(&hits, limits.match_cap);
    for (id, s) in shown {
        out.push_str(&format!(
            "\n  {}: {}",
            id,
            describe(&s.description, limits.description_width)
        ));
    }
    if let Some(more) = more_suffix(remaining) {
        let next = hits[shown.len()].0;
        out.push_str(&format!(
            "\n  {}. Ask 'objectid {}' for details.",
            more, next
        ));
    }
    Ok(QueryResult::info(out))
}

/// "Found N objects <what>:" with identifier + description, capped
fn match_listing(
    index: &DiagnosticIndex,
    what: &str,
    ids: &[&str],
    limits: &DisplayLimits,
) -> String {
    let noun = if ids.len() == 1 { "object" } else { "objects" };
    let mut out = format!("Found {} {} {}:", ids.len(), noun, what);
    let (shown, remaining) = paginate(ids, limits.match_cap);
    for id in shown {
        out.push_str(&format!(
            "\n  {}: {}",
            id,
            describe(index.description_of(id), limits.description_width)
        ));
    }
    if let Some(more) = more_suffix(remaining) {
        out.push_str(&format!("\n  {}", more));
    }
    out
}

// === Collaborator context ===

/// Object report bounded to `max_bytes`, cut on a char boundary
pub fn object_context(index: &DiagnosticIndex, id: &str, max_bytes: usize) -> String {
    let report = object_report(index, id, &DisplayLimits::default());
    if report.len() <= max_bytes {
        return report;
    }
    let mut end = max_bytes;
    while !report.is_char_boundary(end) {
        end -= 1;
    }
    report[..end].to_string()
}

fn describe(description: &str, width: usize) -> String {
    if description.is_empty() {
        "(no description)".to_string()
    } else {
        truncate_text(description, width)
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
    use candict_shared::{attr, QueryStatus, RawRecord, RecordKind};

    fn hw(id: &str, manufacturer: &str, bus: &str) -> RawRecord {
        RawRecord::new(RecordKind::Hardware)
            .with(attr::ID, id)
            .with(attr::MANUFACTURER, manufacturer)
            .with(attr::FIRMWARE, "1.0")
            .with(attr::BUS_TYPE, bus)
    }

    fn sig(id: &str, description: &str) -> RawRecord {
        RawRecord::new(RecordKind::Signal)
            .with(attr::ID, id)
            .with(attr::DESCRIPTION, description)
    }

    #[test]
    fn test_count_bus_types_for_object() {
        let index = DiagnosticIndex::build(vec![hw("1234", "A", "38"), hw("1234", "A", "47")]);
        let limits = DisplayLimits::default();
        let result =
            answer_count(&index, Category::BusTypes, Some("1234"), &limits).unwrap();
        assert_eq!(result.status, QueryStatus::Success);
        assert_eq!(result.payload, "Object ID 1234 uses 2 unique BusTypes: 38, 47");

        let err = answer_count(&index, Category::BusTypes, Some("9999"), &limits).unwrap_err();
        assert!(matches!(err, DictError::NotFound { .. }));
    }

    #[test]
    fn test_object_report_without_data_markers() {
        let index = DiagnosticIndex::build(vec![sig("7", "Battery Voltage")]);
        let report = object_report(&index, "7", &DisplayLimits::default());
        assert!(report.contains("Signal: Battery Voltage"));
        assert!(report.contains("Exception: no exception data"));
        assert!(report.contains("Hardware: no hardware data"));
    }

    #[test]
    fn test_object_report_caps_hardware() {
        let records: Vec<RawRecord> = (0..13).map(|i| hw("5", "A", &i.to_string())).collect();
        let index = DiagnosticIndex::build(records);
        let report = object_report(&index, "5", &DisplayLimits::default());
        assert!(report.contains("Hardware (13 configurations):"));
        assert!(report.contains("\n  10. "));
        assert!(!report.contains("\n  11. "));
        assert!(report.contains("...and 3 more"));
    }

    #[test]
    fn test_manufacturer_tie_break_is_lexicographic() {
        let index = DiagnosticIndex::build(vec![
            hw("1", "Bosch Rexroth", "1"),
            hw("2", "Bosch", "1"),
        ]);
        assert_eq!(
            match_manufacturer(&index, &["bosch".to_string()]),
            Some("Bosch")
        );
        assert_eq!(
            match_manufacturer(&index, &["rexroth".to_string()]),
            Some("Bosch Rexroth")
        );
        assert_eq!(match_manufacturer(&index, &["".to_string()]), None);
    }

    #[test]
    fn test_search_hint_names_next_object() {
        let records: Vec<RawRecord> = (10..17)
            .map(|i| sig(&i.to_string(), "Oil temperature"))
            .collect();
        let index = DiagnosticIndex::build(records);
        let result = answer_search(&index, "oil", &DisplayLimits::default()).unwrap();
        assert!(result.payload.starts_with("Found 7 signals matching 'oil':"));
        assert!(result
            .payload
            .ends_with("...and 2 more. Ask 'objectid 15' for details."));
    }

    #[test]
    fn test_object_context_is_bounded() {
        let index = DiagnosticIndex::build(vec![sig("1", &"Ö".repeat(100))]);
        let ctx = object_context(&index, "1", 31);
        assert!(ctx.len() <= 31);
        assert!(ctx.starts_with("Object ID 1"));
    }

    #[test]
    fn test_severities_empty() {
        let result = answer_severities(&DiagnosticIndex::empty()).unwrap();
        assert_eq!(result.status, QueryStatus::Info);
    }
}
