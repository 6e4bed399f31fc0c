//! Query log for candictl
//!
//! One JSON line per answered question, written to an XDG-compliant state
//! file. Logging failures never affect the answer.

use crate::history::QueryHistory;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Log entry for each answered question
#[derive(Debug, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 timestamp
    pub ts: String,

    /// Request ID (UUID)
    pub req_id: String,

    pub question: String,

    /// Name of the intent rule that answered
    pub intent: String,

    pub status: String,

    /// Duration in milliseconds
    pub duration_ms: u64,

    /// Questions held in the session history at log time
    pub history_len: usize,

    /// Data document the answer came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LogEntry {
    /// Build an entry from the most recent history item
    pub fn from_history(history: &QueryHistory, source: Option<&Path>) -> Option<Self> {
        let latest = history.latest()?;
        Some(Self {
            ts: latest.asked_at.to_rfc3339(),
            req_id: Self::generate_req_id(),
            question: latest.question.clone(),
            intent: latest.intent.to_string(),
            status: latest.status.to_string(),
            duration_ms: latest.duration_ms,
            history_len: history.len(),
            source: source.map(|p| p.display().to_string()),
        })
    }

    /// Generate request ID
    pub fn generate_req_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Append-only JSONL sink
#[derive(Debug, Clone)]
pub struct QueryLog {
    path: Option<PathBuf>,
}

impl QueryLog {
    /// Log to the discovered path
    pub fn discover() -> Self {
        Self {
            path: Self::discover_log_path(),
        }
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Discover log file path with fallback chain
    ///
    /// Priority:
    /// 1. $CANDICT_LOG_FILE environment variable (explicit override)
    /// 2. $XDG_STATE_HOME/candict/queries.jsonl (XDG standard)
    /// 3. ~/.local/state/candict/queries.jsonl (XDG fallback)
    fn discover_log_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CANDICT_LOG_FILE") {
            return Some(PathBuf::from(path));
        }

        if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
            return Some(PathBuf::from(xdg_state).join("candict/queries.jsonl"));
        }

        dirs::home_dir().map(|home| home.join(".local/state/candict/queries.jsonl"))
    }

    /// Record the latest history entry; errors are logged and swallowed
    pub fn record(&self, history: &QueryHistory, source: Option<&Path>) {
        let Some(path) = &self.path else {
            return;
        };
        let Some(entry) = LogEntry::from_history(history, source) else {
            return;
        };
        if let Err(e) = Self::append(&entry, path) {
            debug!("Query log write to {} failed: {}", path.display(), e);
        }
    }

    fn append(entry: &LogEntry, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string(entry)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", json)?;
        Ok(())
    }
}
