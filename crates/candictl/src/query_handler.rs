//! Query Handler - question + index -> status and payload
//!
//! Routes the question through the intent rules, runs the matching
//! deterministic answer, and for explanatory questions optionally asks the
//! text generator. `resolve` never fails: every error becomes an `Error`
//! result, and a failed or missing text generator falls back to the
//! "not understood" message.

use crate::deterministic_answers as answers;
use crate::intent_router::{self, Intent, RouteContext};
use crate::llm_client::TextGenerator;
use candict_shared::{DiagnosticIndex, DictError, DisplayLimits, QueryResult};
use tracing::{debug, warn};

/// Default cap on collaborator context
const DEFAULT_MAX_CONTEXT_BYTES: usize = 4096;

/// Resolved question: the routed intent plus the result
#[derive(Debug, Clone)]
pub struct Resolution {
    pub intent: Intent,
    pub result: QueryResult,
}

pub struct QueryResolver<'a> {
    limits: DisplayLimits,
    collaborator: Option<&'a dyn TextGenerator>,
    max_context_bytes: usize,
}

impl Default for QueryResolver<'_> {
    fn default() -> Self {
        Self::new(DisplayLimits::default())
    }
}

impl<'a> QueryResolver<'a> {
    pub fn new(limits: DisplayLimits) -> Self {
        Self {
            limits,
            collaborator: None,
            max_context_bytes: DEFAULT_MAX_CONTEXT_BYTES,
        }
    }

    pub fn with_collaborator(
        mut self,
        collaborator: &'a dyn TextGenerator,
        max_context_bytes: usize,
    ) -> Self {
        self.collaborator = Some(collaborator);
        self.max_context_bytes = max_context_bytes;
        self
    }

    pub fn resolve(&self, question: &str, index: &DiagnosticIndex) -> QueryResult {
        self.resolve_with_intent(question, index).result
    }

    pub fn resolve_with_intent(&self, question: &str, index: &DiagnosticIndex) -> Resolution {
        let ctx = RouteContext {
            index,
            collaborator: self.collaborator.is_some(),
        };
        let intent = intent_router::route_intent(question, &ctx);
        debug!(intent = intent.name(), "routed question");

        let result = match self.answer(&intent, question, index) {
            Ok(result) => result,
            Err(DictError::CollaboratorUnavailable(reason)) => {
                warn!("Text generation failed, falling back: {}", reason);
                QueryResult::error(intent_router::unclear_response())
            }
            Err(DictError::Unresolved) => QueryResult::error(intent_router::unclear_response()),
            Err(e) => e.into(),
        };

        Resolution { intent, result }
    }

    fn answer(
        &self,
        intent: &Intent,
        question: &str,
        index: &DiagnosticIndex,
    ) -> Result<QueryResult, DictError> {
        let limits = &self.limits;
        match intent {
            Intent::Empty => Ok(QueryResult::warning("Please enter a question.")),
            Intent::Greeting => Ok(QueryResult::success(intent_router::help_response())),
            Intent::Count {
                category,
                object_id,
            } => answers::answer_count(index, *category, object_id.as_deref(), limits),
            Intent::Enumerate {
                category,
                object_id,
            } => answers::answer_enumerate(index, *category, object_id.as_deref(), limits),
            Intent::ObjectLookup { object_id } => answers::answer_object(index, object_id, limits),
            Intent::FlashCodeLookup { flash_code } => {
                answers::answer_flash_code(index, flash_code, limits)
            }
            Intent::BusTypeFilter { bus_type } => {
                answers::answer_bus_type(index, bus_type, limits)
            }
            Intent::ManufacturerFilter { terms } => {
                answers::answer_manufacturer(index, terms, limits)
            }
            Intent::Severities => answers::answer_severities(index),
            Intent::DescriptionSearch { term } => answers::answer_search(index, term, limits),
            Intent::Explain { object_id, .. } => self.explain(question, object_id, index),
            Intent::Unclear(_) => Err(DictError::Unresolved),
        }
    }

    fn explain(
        &self,
        question: &str,
        object_id: &str,
        index: &DiagnosticIndex,
    ) -> Result<QueryResult, DictError> {
        let collaborator = self.collaborator.ok_or(DictError::Unresolved)?;
        let context = answers::object_context(index, object_id, self.max_context_bytes);

        let text = collaborator
            .generate(&context, question)
            .map_err(|e| DictError::CollaboratorUnavailable(e.to_string()))?;

        Ok(QueryResult::success(format!(
            "{}\n\n(Related object: Object ID {})",
            text, object_id
        )))
    }
}

/// Resolve with default display limits and no text generator
pub fn resolve(question: &str, index: &DiagnosticIndex) -> QueryResult {
    QueryResolver::default().resolve(question, index)
}
