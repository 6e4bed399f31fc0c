//! candictl library - exposes modules for the binary and integration tests

pub mod config;
pub mod deterministic_answers;
pub mod errors;
pub mod history;
pub mod intent_router;
pub mod llm_client;
pub mod logging;
pub mod output;
pub mod query_handler;
pub mod repl;
pub mod session;

pub use query_handler::{resolve, QueryResolver, Resolution};
pub use session::{IndexHandle, Session};
