//! Per-session structured event reporting.
//!
//! Rejection reasons and termination causes flow through a
//! `SessionEventSink` collaborator instead of global mutable logger
//! state, so callers can observe a session's behavior (or capture it in
//! tests) without scraping log output.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Why a session stopped accumulating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum TerminationCause {
    /// Accumulated count reached the target; truncated to exactly it.
    TargetReached,
    /// The most recent page added zero new records.
    Stalled,
    /// The next-page control was absent or disabled.
    NoMorePages,
    /// A mid-sequence page failed; accumulated records kept as a
    /// partial result.
    PageFailed { reason: String },
    /// Cancellation requested between pages.
    Cancelled,
}

impl std::fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetReached => write!(f, "목표 개수 도달"),
            Self::Stalled => write!(f, "새로운 데이터 없음"),
            Self::NoMorePages => write!(f, "다음 페이지 없음"),
            Self::PageFailed { reason } => write!(f, "페이지 처리 실패: {reason}"),
            Self::Cancelled => write!(f, "사용자 취소"),
        }
    }
}

/// One observable step of an extraction session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    PageLoaded {
        page_index: u32,
        url: String,
    },
    RowRejected {
        page_index: u32,
        row_index: usize,
        reason: String,
    },
    PageExtracted {
        page_index: u32,
        accepted: usize,
        rejected: usize,
        accumulated: usize,
    },
    Terminated {
        cause: TerminationCause,
    },
}

/// Logging collaborator owned by the session. Implementations must be
/// cheap; they are called from the extraction hot path.
pub trait SessionEventSink: Send + Sync {
    fn record(&self, session_id: &str, event: &SessionEvent);
}

/// Default sink: forwards events to `tracing` at sensible levels.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl SessionEventSink for TracingEventSink {
    fn record(&self, session_id: &str, event: &SessionEvent) {
        match event {
            SessionEvent::PageLoaded { page_index, url } => {
                info!(session_id, page_index, %url, "📄 page loaded");
            }
            SessionEvent::RowRejected {
                page_index,
                row_index,
                reason,
            } => {
                warn!(session_id, page_index, row_index, %reason, "행 데이터 거부");
            }
            SessionEvent::PageExtracted {
                page_index,
                accepted,
                rejected,
                accumulated,
            } => {
                info!(
                    session_id,
                    page_index, accepted, rejected, accumulated, "📊 page extracted"
                );
            }
            SessionEvent::Terminated { cause } => {
                debug!(session_id, %cause, "session terminated");
            }
        }
    }
}

/// Captures events in memory; used by tests and by callers that want a
/// full session trace alongside the outcome.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl SessionEventSink for CollectingEventSink {
    fn record(&self, _session_id: &str, event: &SessionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_keeps_event_order() {
        let sink = CollectingEventSink::new();
        sink.record(
            "s1",
            &SessionEvent::PageLoaded {
                page_index: 0,
                url: "http://example.com".into(),
            },
        );
        sink.record(
            "s1",
            &SessionEvent::Terminated {
                cause: TerminationCause::TargetReached,
            },
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SessionEvent::PageLoaded { .. }));
        assert!(matches!(events[1], SessionEvent::Terminated { .. }));
    }

    #[test]
    fn termination_cause_serializes_with_tag() {
        let json = serde_json::to_string(&TerminationCause::PageFailed {
            reason: "no table".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"cause":"page_failed","reason":"no table"}"#);
    }
}
