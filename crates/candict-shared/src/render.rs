//! Display caps and truncation helpers.
//!
//! Caps here only limit what is rendered; callers always compute and report
//! the full result size.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLimits {
    /// Max items for enumerations ("list all ...")
    #[serde(default = "default_list_cap")]
    pub list_cap: usize,
    /// Max matches for filters and searches
    #[serde(default = "default_match_cap")]
    pub match_cap: usize,
    /// Max hardware configurations in an object report
    #[serde(default = "default_hardware_cap")]
    pub hardware_cap: usize,
    /// Max characters of a description shown next to a match
    #[serde(default = "default_description_width")]
    pub description_width: usize,
}

fn default_list_cap() -> usize {
    50
}

fn default_match_cap() -> usize {
    5
}

fn default_hardware_cap() -> usize {
    10
}

fn default_description_width() -> usize {
    60
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            list_cap: default_list_cap(),
            match_cap: default_match_cap(),
            hardware_cap: default_hardware_cap(),
            description_width: default_description_width(),
        }
    }
}

/// Split `items` into the displayed head and the number left over
pub fn paginate<T>(items: &[T], cap: usize) -> (&[T], usize) {
    let shown = items.len().min(cap);
    (&items[..shown], items.len() - shown)
}

/// "...and N more" line, or None when nothing was cut
pub fn more_suffix(remaining: usize) -> Option<String> {
    if remaining == 0 {
        None
    } else {
        Some(format!("...and {} more", remaining))
    }
}

/// Comma-joined list capped at `cap`, with a trailing "...and N more"
pub fn join_capped<S: AsRef<str>>(items: &[S], cap: usize) -> String {
    let (shown, remaining) = paginate(items, cap);
    let mut out = shown
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    if let Some(more) = more_suffix(remaining) {
        out.push_str(&format!(" {}", more));
    }
    out
}

/// Truncate on a char boundary, appending "..." when shortened
pub fn truncate_text(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let items = [1, 2, 3, 4, 5, 6, 7];
        let (shown, remaining) = paginate(&items, 5);
        assert_eq!(shown, &[1, 2, 3, 4, 5]);
        assert_eq!(remaining, 2);

        let (shown, remaining) = paginate(&items[..2], 5);
        assert_eq!(shown.len(), 2);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_more_suffix() {
        assert_eq!(more_suffix(0), None);
        assert_eq!(more_suffix(3).as_deref(), Some("...and 3 more"));
    }

    #[test]
    fn test_join_capped() {
        let items = vec!["a", "b", "c"];
        assert_eq!(join_capped(&items, 5), "a, b, c");
        assert_eq!(join_capped(&items, 2), "a, b ...and 1 more");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("Engine Oil Pressure Low", 10), "Engine...");
        assert_eq!(truncate_text("Öltemperatur hoch", 8), "Öltem...");
    }
}
