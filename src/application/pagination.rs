//! Pagination state machine.
//!
//! Drives repeated page acquisition and extraction until the target
//! record count is reached, the site runs out of pages, or progress
//! stalls. States: `Loading → Extracting → Deciding → {Loading |
//! Terminated}`. `Terminated` is the only terminal state, reached at
//! most once per session and idempotent to re-enter.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::session::ExtractionState;
use crate::domain::errors::{ExtractError, ExtractResult};
use crate::domain::events::{SessionEvent, SessionEventSink, TerminationCause};
use crate::domain::row_parser::RowParser;
use crate::infrastructure::page_source::{PageHandle, PageSource};
use crate::infrastructure::table_extractor::TableExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationPhase {
    Loading,
    Extracting,
    Deciding,
    Terminated,
}

/// Accepted/rejected counts for one page.
#[derive(Debug, Clone, Copy, Default)]
struct PageStats {
    accepted: usize,
    rejected: usize,
}

pub struct PaginationController {
    phase: PaginationPhase,
    terminated_with: Option<TerminationCause>,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationController {
    pub fn new() -> Self {
        Self {
            phase: PaginationPhase::Loading,
            terminated_with: None,
        }
    }

    pub fn phase(&self) -> PaginationPhase {
        self.phase
    }

    /// Drive the loop starting from an already-loaded first page.
    ///
    /// Never fails: a mid-sequence page problem terminates early and the
    /// records accumulated so far stand as a valid partial result.
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &mut self,
        first_page: PageHandle,
        source: &mut dyn PageSource,
        extractor: &TableExtractor,
        parser: &RowParser,
        state: &mut ExtractionState,
        events: &dyn SessionEventSink,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> TerminationCause {
        let mut page = first_page;

        loop {
            self.phase = PaginationPhase::Extracting;
            state.pages_visited += 1;

            if let Err(e) = self.extract_page(&page, extractor, parser, state, events, session_id) {
                warn!("페이지 {} 처리 실패: {}", page.page_index, e);
                return self.terminate(
                    TerminationCause::PageFailed {
                        reason: e.to_string(),
                    },
                    events,
                    session_id,
                );
            }

            self.phase = PaginationPhase::Deciding;

            if state.len() >= state.target_count {
                state.truncate_to_target();
                info!(
                    "목표 개수 {}개에 도달하여 수집을 중단합니다.",
                    state.target_count
                );
                return self.terminate(TerminationCause::TargetReached, events, session_id);
            }

            // Stall: the page just drained moved the accumulated count
            // nowhere. A page of entirely duplicate rows is
            // indistinguishable from a pager that stopped advancing, so
            // both end the session here.
            if state.len() == state.last_seen_count {
                info!("더 이상 새로운 데이터가 없습니다.");
                return self.terminate(TerminationCause::Stalled, events, session_id);
            }
            state.last_seen_count = state.len();

            // Cancellation granularity is the page-load boundary: a run
            // may stop here but never mid-extraction.
            if cancel.is_cancelled() {
                return self.terminate(TerminationCause::Cancelled, events, session_id);
            }

            self.phase = PaginationPhase::Loading;
            page = match source.advance().await {
                Ok(next) => {
                    state.current_page = next.page_index;
                    events.record(
                        session_id,
                        &SessionEvent::PageLoaded {
                            page_index: next.page_index,
                            url: next.url.clone(),
                        },
                    );
                    next
                }
                Err(ExtractError::NoMoreResults) => {
                    debug!("다음 페이지가 없어 정상 종료합니다.");
                    return self.terminate(TerminationCause::NoMorePages, events, session_id);
                }
                Err(e) => {
                    warn!("페이지 네비게이션 실패: {}", e);
                    return self.terminate(
                        TerminationCause::PageFailed {
                            reason: e.to_string(),
                        },
                        events,
                        session_id,
                    );
                }
            };
        }
    }

    /// Extract one drained page: locate the table, parse every row,
    /// append accepted records. Row problems never escape this method.
    fn extract_page(
        &self,
        page: &PageHandle,
        extractor: &TableExtractor,
        parser: &RowParser,
        state: &mut ExtractionState,
        events: &dyn SessionEventSink,
        session_id: &str,
    ) -> ExtractResult<PageStats> {
        let rows = extractor.extract_rows(&page.html, page.page_index)?;

        let mut stats = PageStats::default();
        for (row_index, row) in rows.iter().enumerate() {
            match parser.parse(row, row_index) {
                Ok(record) => {
                    state.append(record);
                    stats.accepted += 1;
                }
                Err(rejection) => {
                    stats.rejected += 1;
                    state.rows_rejected += 1;
                    events.record(
                        session_id,
                        &SessionEvent::RowRejected {
                            page_index: page.page_index,
                            row_index,
                            reason: rejection.to_string(),
                        },
                    );
                }
            }
        }

        events.record(
            session_id,
            &SessionEvent::PageExtracted {
                page_index: page.page_index,
                accepted: stats.accepted,
                rejected: stats.rejected,
                accumulated: state.len(),
            },
        );
        Ok(stats)
    }

    /// Enter the terminal state. Re-entry keeps the original cause.
    fn terminate(
        &mut self,
        cause: TerminationCause,
        events: &dyn SessionEventSink,
        session_id: &str,
    ) -> TerminationCause {
        if let Some(existing) = &self.terminated_with {
            return existing.clone();
        }

        self.phase = PaginationPhase::Terminated;
        self.terminated_with = Some(cause.clone());
        events.record(
            session_id,
            &SessionEvent::Terminated {
                cause: cause.clone(),
            },
        );
        cause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::CollectingEventSink;

    #[test]
    fn terminate_is_idempotent_and_keeps_first_cause() {
        let mut controller = PaginationController::new();
        let sink = CollectingEventSink::new();

        let first = controller.terminate(TerminationCause::TargetReached, &sink, "s");
        let second = controller.terminate(TerminationCause::Stalled, &sink, "s");

        assert_eq!(first, TerminationCause::TargetReached);
        assert_eq!(second, TerminationCause::TargetReached);
        assert_eq!(controller.phase(), PaginationPhase::Terminated);
        // Only one Terminated event despite two calls.
        let terminated_events = sink
            .events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::Terminated { .. }))
            .count();
        assert_eq!(terminated_events, 1);
    }

    #[test]
    fn controller_starts_in_loading() {
        assert_eq!(
            PaginationController::new().phase(),
            PaginationPhase::Loading
        );
    }
}
