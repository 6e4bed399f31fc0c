//! Bounded query history owned by the calling layer.

use candict_shared::QueryStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub asked_at: DateTime<Utc>,
    pub question: String,
    pub intent: &'static str,
    pub status: QueryStatus,
    pub duration_ms: u64,
}

/// Ring buffer of recent questions; the oldest entry is evicted when full
#[derive(Debug, Clone)]
pub struct QueryHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl QueryHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(question: &str) -> HistoryEntry {
        HistoryEntry {
            asked_at: Utc::now(),
            question: question.to_string(),
            intent: "count",
            status: QueryStatus::Success,
            duration_ms: 1,
        }
    }

    #[test]
    fn test_evicts_oldest() {
        let mut history = QueryHistory::with_capacity(2);
        history.push(entry("a"));
        history.push(entry("b"));
        history.push(entry("c"));
        let questions: Vec<&str> = history.iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, vec!["b", "c"]);
        assert_eq!(history.latest().unwrap().question, "c");
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = QueryHistory::with_capacity(0);
        history.push(entry("a"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.capacity(), 1);
    }
}
