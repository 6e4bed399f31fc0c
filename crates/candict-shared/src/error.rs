//! Error types for candict.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DictError {
    #[error("Data dictionary could not be read: {0}")]
    SourceUnreadable(String),

    #[error("{what} {key} not found")]
    NotFound { what: &'static str, key: String },

    #[error("Query not understood")]
    Unresolved,

    #[error("Text generation unavailable: {0}")]
    CollaboratorUnavailable(String),
}

impl DictError {
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        DictError::NotFound {
            what,
            key: key.into(),
        }
    }
}
