//! End-to-end extraction session.
//!
//! One session owns exactly one page source and one mutable
//! `ExtractionState`, drives the pagination controller, and releases the
//! source on every exit path: success, early termination, or error.
//! Independent datasets run as independent sessions and never share a
//! source.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::pagination::PaginationController;
use crate::domain::errors::ExtractResult;
use crate::domain::events::{SessionEvent, SessionEventSink, TerminationCause, TracingEventSink};
use crate::domain::record::{Record, RecordSet};
use crate::domain::row_parser::RowParser;
use crate::domain::schema::{RowSchema, SelectorCandidates};
use crate::infrastructure::config::defaults;
use crate::infrastructure::page_source::PageSource;
use crate::infrastructure::table_extractor::TableExtractor;

/// Externally supplied run parameters.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub start_url: String,
    pub target_count: usize,
}

impl RunParams {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            target_count: defaults::TARGET_COUNT,
        }
    }

    pub fn with_target_count(mut self, target_count: usize) -> Self {
        self.target_count = target_count;
        self
    }
}

/// Mutable accumulator owned exclusively by the session. Created at
/// session start, finalized (read-only) once the session terminates.
#[derive(Debug)]
pub struct ExtractionState {
    records: RecordSet,
    pub current_page: u32,
    pub target_count: usize,
    pub last_seen_count: usize,
    pub pages_visited: u32,
    pub rows_rejected: u32,
}

impl ExtractionState {
    pub fn new(field_names: Vec<String>, target_count: usize) -> Self {
        Self {
            records: RecordSet::new(field_names),
            current_page: 0,
            target_count,
            last_seen_count: 0,
            pages_visited: 0,
            rows_rejected: 0,
        }
    }

    pub fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn truncate_to_target(&mut self) {
        self.records.truncate(self.target_count);
    }

    fn into_records(self) -> RecordSet {
        self.records
    }
}

/// Finalized result of one session. An empty record set is a valid
/// outcome, distinguishable from a hard failure by the fact that it
/// exists at all (first-page acquisition failure returns `Err` instead).
#[derive(Debug)]
pub struct SessionOutcome {
    pub session_id: String,
    pub records: RecordSet,
    pub termination: TerminationCause,
    pub pages_visited: u32,
    pub rows_rejected: u32,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl SessionOutcome {
    /// "No data collected" signal.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Orchestrates page source, table extractor, row parser and pagination
/// controller for one run.
pub struct ExtractionSession {
    session_id: String,
    source: Box<dyn PageSource>,
    extractor: TableExtractor,
    parser: RowParser,
    events: Arc<dyn SessionEventSink>,
    params: RunParams,
}

impl ExtractionSession {
    pub fn new(
        source: Box<dyn PageSource>,
        candidates: SelectorCandidates,
        schema: RowSchema,
        params: RunParams,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            source,
            extractor: TableExtractor::new(candidates),
            parser: RowParser::new(schema),
            events: Arc::new(TracingEventSink),
            params,
        }
    }

    /// Replace the default tracing sink with a custom collaborator.
    pub fn with_event_sink(mut self, events: Arc<dyn SessionEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run to completion. Fails only when the very first page cannot be
    /// acquired; every other problem yields an outcome with whatever
    /// was accumulated.
    pub async fn run(self) -> ExtractResult<SessionOutcome> {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Run with a token honored at page-load boundaries.
    pub async fn run_with_cancellation(
        mut self,
        cancel: CancellationToken,
    ) -> ExtractResult<SessionOutcome> {
        let started_at = Utc::now();
        let timer = Instant::now();
        info!(
            "🚀 세션 {} 시작: {} (목표 {}개)",
            self.session_id, self.params.start_url, self.params.target_count
        );

        let result = self.run_inner(&cancel, started_at, timer).await;

        // Scoped acquisition: release attempted exactly once regardless
        // of how run_inner exited.
        self.source.release().await;

        match &result {
            Ok(outcome) => {
                info!(
                    "✅ 세션 {} 종료: {}개 수집, {}페이지, 사유: {}",
                    outcome.session_id,
                    outcome.records.len(),
                    outcome.pages_visited,
                    outcome.termination
                );
            }
            Err(e) => {
                error!("❌ 세션 {} 실패: {}", self.session_id, e);
            }
        }
        result
    }

    async fn run_inner(
        &mut self,
        cancel: &CancellationToken,
        started_at: DateTime<Utc>,
        timer: Instant,
    ) -> ExtractResult<SessionOutcome> {
        // First-page acquisition failure is the one total failure: no
        // data at all, surfaced as an explicit error.
        let first_page = self.source.load(&self.params.start_url).await?;
        self.events.record(
            &self.session_id,
            &SessionEvent::PageLoaded {
                page_index: first_page.page_index,
                url: first_page.url.clone(),
            },
        );

        let mut state = ExtractionState::new(
            self.parser.schema().field_names(),
            self.params.target_count,
        );
        let mut controller = PaginationController::new();

        let termination = controller
            .run(
                first_page,
                self.source.as_mut(),
                &self.extractor,
                &self.parser,
                &mut state,
                self.events.as_ref(),
                &self.session_id,
                cancel,
            )
            .await;

        let pages_visited = state.pages_visited;
        let rows_rejected = state.rows_rejected;

        Ok(SessionOutcome {
            session_id: self.session_id.clone(),
            records: state.into_records(),
            termination,
            pages_visited,
            rows_rejected,
            started_at,
            duration_ms: timer.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_params_defaults_to_standard_target() {
        let params = RunParams::new("https://example.com");
        assert_eq!(params.target_count, defaults::TARGET_COUNT);
        assert_eq!(
            RunParams::new("x").with_target_count(30).target_count,
            30
        );
    }

    #[test]
    fn state_truncates_to_target() {
        let mut state = ExtractionState::new(vec!["v".into()], 2);
        for i in 0..5 {
            let mut record = Record::new();
            record.insert("v", crate::domain::record::FieldValue::Integer(i));
            state.append(record);
        }
        state.truncate_to_target();
        assert_eq!(state.len(), 2);
    }
}
