//! Extraction error taxonomy.
//!
//! Page-level problems terminate pagination but preserve partial
//! results; only a first-page acquisition failure is session-fatal.
//! Row-level problems are expressed as `RowRejection` and never
//! propagate past the row parser.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExtractError {
    #[error("failed to acquire page {url}: {reason}")]
    Acquisition { url: String, reason: String },

    #[error("page {url} not ready: marker '{marker}' absent after {waited_ms}ms")]
    PageNotReady {
        url: String,
        marker: String,
        waited_ms: u64,
    },

    #[error("no table found on page {page_index} after exhausting all candidate selectors")]
    NoTableFound {
        page_index: u32,
        tried_selectors: Vec<String>,
    },

    #[error("no further results page available")]
    NoMoreResults,
}

impl ExtractError {
    pub fn acquisition(url: &str, reason: impl Into<String>) -> Self {
        Self::Acquisition {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn page_not_ready(url: &str, marker: &str, waited_ms: u64) -> Self {
        Self::PageNotReady {
            url: url.to_string(),
            marker: marker.to_string(),
            waited_ms,
        }
    }

    pub fn no_table_found(page_index: u32, tried_selectors: Vec<String>) -> Self {
        Self::NoTableFound {
            page_index,
            tried_selectors,
        }
    }

    /// Exhausted pagination is expected, not a failure.
    pub fn is_normal_termination(&self) -> bool {
        matches!(self, Self::NoMoreResults)
    }

    /// Acquisition-class errors abort the whole session when they hit
    /// the very first page; afterwards they only end pagination early.
    pub fn is_acquisition(&self) -> bool {
        matches!(self, Self::Acquisition { .. } | Self::PageNotReady { .. })
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Why one row was dropped. Observable through the session event sink;
/// never retried, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("row has no cells")]
    EmptyRow,

    #[error("required field '{field}' needs cell {cell} but row has {cells_present}")]
    MissingRequiredCell {
        field: String,
        cell: usize,
        cells_present: usize,
    },

    #[error("required field '{field}' failed validation: '{raw}'")]
    InvalidRequiredField { field: String, raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub row_index: usize,
    pub reason: RejectReason,
}

impl std::fmt::Display for RowRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {} rejected: {}", self.row_index, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_more_results_is_normal_termination() {
        assert!(ExtractError::NoMoreResults.is_normal_termination());
        assert!(!ExtractError::acquisition("http://x", "timeout").is_normal_termination());
    }

    #[test]
    fn acquisition_classification() {
        assert!(ExtractError::acquisition("http://x", "dns").is_acquisition());
        assert!(ExtractError::page_not_ready("http://x", ".tabulator", 20_000).is_acquisition());
        assert!(!ExtractError::no_table_found(3, vec!["table".into()]).is_acquisition());
    }

    #[test]
    fn rejection_reason_renders_field_context() {
        let rejection = RowRejection {
            row_index: 4,
            reason: RejectReason::MissingRequiredCell {
                field: "sell".into(),
                cell: 2,
                cells_present: 1,
            },
        };
        let text = rejection.to_string();
        assert!(text.contains("row 4"));
        assert!(text.contains("'sell'"));
    }
}
