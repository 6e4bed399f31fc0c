//! Session state for the CLI and REPL.
//!
//! The index is shared read-only behind `Arc`; a reload builds the new index
//! completely before publishing it with a single swap, so readers see either
//! the old index or the new one, never a half-built one. A failed reload
//! keeps the previous index.

use crate::config::Config;
use crate::history::{HistoryEntry, QueryHistory};
use crate::llm_client::{HttpLlmClient, TextGenerator};
use crate::logging::QueryLog;
use crate::query_handler::QueryResolver;
use candict_shared::{
    load_index, AttributeNames, DiagnosticIndex, DictError, DisplayLimits, IndexSummary,
    QueryResult,
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{info, warn};

/// Index together with the document it was built from
#[derive(Debug, Clone, Default)]
pub struct Published {
    pub index: Arc<DiagnosticIndex>,
    pub source: Option<PathBuf>,
}

/// Published index; index and source are swapped together
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: RwLock<Published>,
}

impl IndexHandle {
    pub fn new(index: DiagnosticIndex, source: Option<PathBuf>) -> Self {
        Self {
            current: RwLock::new(Published {
                index: Arc::new(index),
                source,
            }),
        }
    }

    /// Index and source from one read; stays valid across later reloads
    pub fn current(&self) -> Published {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn snapshot(&self) -> Arc<DiagnosticIndex> {
        self.current().index
    }

    pub fn source(&self) -> Option<PathBuf> {
        self.current().source
    }

    /// Publish a fully built index
    pub fn replace(&self, index: DiagnosticIndex, source: Option<PathBuf>) {
        let published = Published {
            index: Arc::new(index),
            source,
        };
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = published;
    }

    /// Load `path` off to the side, then swap it in
    pub fn reload(&self, path: &Path, names: &AttributeNames) -> Result<IndexSummary, DictError> {
        let index = load_index(path, names)?;
        let summary = IndexSummary::from(&index);
        self.replace(index, Some(path.to_path_buf()));
        info!("Index replaced from {}", path.display());
        Ok(summary)
    }
}

pub struct Session {
    index: IndexHandle,
    history: QueryHistory,
    log: QueryLog,
    limits: DisplayLimits,
    attributes: AttributeNames,
    collaborator: Option<Box<dyn TextGenerator>>,
    max_context_bytes: usize,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("index", &self.index)
            .field("history", &self.history)
            .field("log", &self.log)
            .field("limits", &self.limits)
            .field("attributes", &self.attributes)
            .field("collaborator", &self.collaborator.is_some())
            .field("max_context_bytes", &self.max_context_bytes)
            .finish()
    }
}

impl Session {
    /// Session over an already built index, no log, no text generator
    pub fn new(index: DiagnosticIndex) -> Self {
        Self {
            index: IndexHandle::new(index, None),
            history: QueryHistory::default(),
            log: QueryLog::disabled(),
            limits: DisplayLimits::default(),
            attributes: AttributeNames::default(),
            collaborator: None,
            max_context_bytes: crate::llm_client::LlmConfig::default().max_context_bytes,
        }
    }

    /// Session from config; loads `data` (or the configured document) when given.
    /// An unreadable document is an error: there is no partial index.
    pub fn from_config(config: &Config, data: Option<&Path>, use_llm: bool) -> Result<Self, DictError> {
        let mut session = Self::new(DiagnosticIndex::empty());
        session.history = QueryHistory::with_capacity(config.history.capacity);
        session.limits = config.display;
        session.attributes = config.attributes.clone();
        session.max_context_bytes = config.llm.max_context_bytes;

        if config.history.query_log {
            session.log = QueryLog::discover();
        }

        if use_llm && config.llm.enabled {
            match HttpLlmClient::new(config.llm.clone()) {
                Ok(client) => session.collaborator = Some(Box::new(client)),
                Err(e) => warn!("Text generation disabled: {:#}", e),
            }
        }

        if let Some(path) = data.or(config.data.path.as_deref()) {
            session.index.reload(path, &session.attributes)?;
        }

        Ok(session)
    }

    pub fn with_collaborator(mut self, collaborator: Box<dyn TextGenerator>) -> Self {
        self.collaborator = Some(collaborator);
        self
    }

    pub fn with_log(mut self, log: QueryLog) -> Self {
        self.log = log;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = QueryHistory::with_capacity(capacity);
        self
    }

    /// Answer a question against the current index and record it
    pub fn ask(&mut self, question: &str) -> QueryResult {
        let started = Instant::now();
        let Published { index, source } = self.index.current();

        let mut resolver = QueryResolver::new(self.limits);
        if let Some(collaborator) = self.collaborator.as_deref() {
            resolver = resolver.with_collaborator(collaborator, self.max_context_bytes);
        }
        let resolution = resolver.resolve_with_intent(question, &index);

        self.history.push(HistoryEntry {
            asked_at: Utc::now(),
            question: question.trim().to_string(),
            intent: resolution.intent.name(),
            status: resolution.result.status,
            duration_ms: started.elapsed().as_millis() as u64,
        });
        self.log.record(&self.history, source.as_deref());

        resolution.result
    }

    /// Replace the index from a new document
    pub fn reload(&self, path: &Path) -> Result<IndexSummary, DictError> {
        self.index.reload(path, &self.attributes)
    }

    pub fn summary(&self) -> IndexSummary {
        IndexSummary::from(self.index.snapshot().as_ref())
    }

    pub fn index(&self) -> &IndexHandle {
        &self.index
    }

    pub fn history(&self) -> &QueryHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candict_shared::{attr, QueryStatus, RawRecord, RecordKind};

    #[test]
    fn test_snapshot_survives_replace() {
        let handle = IndexHandle::new(DiagnosticIndex::empty(), None);
        let before = handle.snapshot();

        let index = DiagnosticIndex::build(vec![RawRecord::new(RecordKind::Signal)
            .with(attr::ID, "1")
            .with(attr::DESCRIPTION, "x")]);
        handle.replace(index, Some(PathBuf::from("new.json")));

        assert!(before.is_empty());
        assert_eq!(handle.snapshot().signals().len(), 1);
        assert_eq!(handle.source(), Some(PathBuf::from("new.json")));
    }

    #[test]
    fn test_index_and_source_swap_together() {
        let handle = IndexHandle::new(DiagnosticIndex::empty(), Some(PathBuf::from("old.json")));
        let old = handle.current();

        let index = DiagnosticIndex::build(vec![RawRecord::new(RecordKind::Signal)
            .with(attr::ID, "2")
            .with(attr::DESCRIPTION, "y")]);
        handle.replace(index, Some(PathBuf::from("new.json")));
        let new = handle.current();

        assert!(old.index.is_empty());
        assert_eq!(old.source, Some(PathBuf::from("old.json")));
        assert!(new.index.contains("2"));
        assert_eq!(new.source, Some(PathBuf::from("new.json")));
    }

    #[test]
    fn test_failed_reload_keeps_previous_index() {
        let index = DiagnosticIndex::build(vec![RawRecord::new(RecordKind::Signal)
            .with(attr::ID, "1")
            .with(attr::DESCRIPTION, "x")]);
        let session = Session::new(index);
        let err = session
            .reload(Path::new("/nonexistent/candict.json"))
            .unwrap_err();
        assert!(matches!(err, DictError::SourceUnreadable(_)));
        assert_eq!(session.summary().signals, 1);
    }

    #[test]
    fn test_ask_records_history() {
        let mut session = Session::new(DiagnosticIndex::empty()).with_history_capacity(2);
        assert_eq!(session.ask("").status, QueryStatus::Warning);
        session.ask("hello");
        session.ask("how many bus types");
        assert_eq!(session.history().len(), 2);
        let latest = session.history().latest().unwrap();
        assert_eq!(latest.intent, "count");
        assert_eq!(latest.status, QueryStatus::Success);
    }
}
