//! Query results: a status plus a human-readable payload.

use crate::error::DictError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Presentation class of an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    Info,
    Warning,
    Error,
}

impl QueryStatus {
    /// Success and Info are answers; Warning and Error are not
    pub fn is_answer(&self) -> bool {
        matches!(self, QueryStatus::Success | QueryStatus::Info)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryStatus::Success => "success",
            QueryStatus::Info => "info",
            QueryStatus::Warning => "warning",
            QueryStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub status: QueryStatus,
    pub payload: String,
}

impl QueryResult {
    pub fn new(status: QueryStatus, payload: impl Into<String>) -> Self {
        Self {
            status,
            payload: payload.into(),
        }
    }

    pub fn success(payload: impl Into<String>) -> Self {
        Self::new(QueryStatus::Success, payload)
    }

    pub fn info(payload: impl Into<String>) -> Self {
        Self::new(QueryStatus::Info, payload)
    }

    pub fn warning(payload: impl Into<String>) -> Self {
        Self::new(QueryStatus::Warning, payload)
    }

    pub fn error(payload: impl Into<String>) -> Self {
        Self::new(QueryStatus::Error, payload)
    }
}

impl From<DictError> for QueryResult {
    fn from(err: DictError) -> Self {
        QueryResult::error(err.to_string())
    }
}
