//! Shared types for candict: source records, the diagnostic index and its
//! builder, JSON/XML document ingestion, query results and display helpers.

pub mod answer;
pub mod document;
pub mod error;
pub mod index;
pub mod record;
pub mod render;
pub mod xml;

pub use answer::{QueryResult, QueryStatus};
pub use document::{load_index, load_records, parse_document, parse_records, AttributeNames};
pub use error::DictError;
pub use index::{BuildStats, DiagnosticIndex, IndexSummary};
pub use record::{
    attr, FaultRecord, HardwareRecord, Identifier, RawRecord, RecordKind, SignalRecord,
};
pub use render::DisplayLimits;
pub use xml::parse_xml_records;
