//! Output formatting - ASCII status tags, colored per status

use crate::history::QueryHistory;
use candict_shared::{IndexSummary, QueryResult, QueryStatus};
use owo_colors::OwoColorize;

/// Plain status tag
pub fn status_tag(status: QueryStatus) -> &'static str {
    match status {
        QueryStatus::Success => "[OK]",
        QueryStatus::Info => "[INFO]",
        QueryStatus::Warning => "[WARN]",
        QueryStatus::Error => "[ERROR]",
    }
}

/// Render a result for the terminal
pub fn render_result(result: &QueryResult, color: bool) -> String {
    let tag = status_tag(result.status);
    if !color {
        return format!("{} {}", tag, result.payload);
    }
    let tag = match result.status {
        QueryStatus::Success => tag.bright_green().to_string(),
        QueryStatus::Info => tag.cyan().to_string(),
        QueryStatus::Warning => tag.yellow().to_string(),
        QueryStatus::Error => tag.bright_red().to_string(),
    };
    format!("{} {}", tag, result.payload)
}

pub fn display_result(result: &QueryResult, color: bool) {
    println!("{}", render_result(result, color));
}

pub fn render_summary(summary: &IndexSummary) -> String {
    format!(
        "Signals:        {}\n\
         Exceptions:     {}\n\
         Hardware IDs:   {} ({} records)\n\
         BusTypes:       {}\n\
         Manufacturers:  {}\n\
         Severities:     {}\n\
         Flash codes:    {}\n\
         Records read:   {} (skipped: {} without id, {} unknown kind)",
        summary.signals,
        summary.faults,
        summary.hardware_ids,
        summary.hardware_records,
        summary.bus_types,
        summary.manufacturers,
        summary.severities,
        summary.flash_codes,
        summary.build.records_seen,
        summary.build.skipped_missing_id,
        summary.build.skipped_unknown_kind,
    )
}

pub fn render_history(history: &QueryHistory) -> String {
    if history.is_empty() {
        return "No questions yet.".to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(n, e)| {
            format!(
                "{:>3}. {} {} ({})",
                n + 1,
                e.asked_at.format("%H:%M:%S"),
                e.question,
                status_tag(e.status)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use candict_shared::DiagnosticIndex;

    #[test]
    fn test_render_plain() {
        let result = QueryResult::warning("Please enter a question.");
        assert_eq!(
            render_result(&result, false),
            "[WARN] Please enter a question."
        );
    }

    #[test]
    fn test_render_colored_keeps_payload() {
        let result = QueryResult::error("Object ID 999 not found");
        let out = render_result(&result, true);
        assert!(out.contains("[ERROR]"));
        assert!(out.ends_with("Object ID 999 not found"));
    }

    #[test]
    fn test_render_summary_and_history() {
        let summary = IndexSummary::from(&DiagnosticIndex::empty());
        assert!(render_summary(&summary).starts_with("Signals:        0"));
        assert_eq!(render_history(&QueryHistory::default()), "No questions yet.");
    }
}
