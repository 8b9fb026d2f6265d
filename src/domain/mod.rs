//! Domain module - Core data model and parsing logic
//!
//! Contains the tabular data model, cleaning rules, extraction schemas,
//! the row parser, and the session event/error vocabulary. Nothing in
//! here touches the network or the filesystem.

pub mod clean;
pub mod errors;
pub mod events;
pub mod record;
pub mod row_parser;
pub mod schema;

// Re-export commonly used items
pub use clean::CleanRule;
pub use errors::{ExtractError, ExtractResult, RejectReason, RowRejection};
pub use events::{SessionEvent, SessionEventSink, TerminationCause};
pub use record::{FieldValue, RawRow, Record, RecordSet};
pub use row_parser::RowParser;
pub use schema::{FieldSpec, RowSchema, SelectorCandidates};
