//! FinData Crawler - Resilient Tabular Data Extraction
//!
//! Extracts structured records from dynamically rendered, paginated
//! table pages whose markup drifts over time. Table location tolerates
//! multiple candidate selectors, individual rows may be malformed or
//! incomplete, and the full dataset is accumulated across pages through
//! a pagination state machine with stall detection.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub mod test_utils;

// Re-export the primary entry points
pub use application::{DatasetProfile, ExtractionSession, RunParams, SessionOutcome};
pub use domain::{ExtractError, RecordSet, TerminationCause};
pub use infrastructure::{HttpPageSource, PageSource};
