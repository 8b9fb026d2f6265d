//! Page acquisition capability.
//!
//! `PageSource` is the seam between the extraction pipeline and whatever
//! renders the target site: a headless browser driver, a rendering
//! service, or (as shipped here) a plain HTTP fetch. The pipeline only
//! relies on the contract: `load` delivers a ready page or an
//! acquisition error within a bounded wait, `advance` moves to the next
//! results page or reports `NoMoreResults`, and `release` is attempted
//! exactly once per session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::errors::{ExtractError, ExtractResult};
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::table_extractor::any_selector_matches;

/// Rendered content of one ready page.
#[derive(Debug, Clone)]
pub struct PageHandle {
    /// 0-based position within this session.
    pub page_index: u32,
    pub url: String,
    pub html: String,
}

/// External capability consumed by the pipeline. One instance is owned
/// by exactly one session; advancing pagination mutates the live page,
/// so the source is single-tenant by contract.
#[async_trait]
pub trait PageSource: Send {
    /// Acquire the first page. Must deliver a ready page (readiness
    /// marker present) or fail within the configured timeout window.
    async fn load(&mut self, url: &str) -> ExtractResult<PageHandle>;

    /// Trigger the next-page control and re-settle. Fails with
    /// `NoMoreResults` when the control is absent or disabled.
    async fn advance(&mut self) -> ExtractResult<PageHandle>;

    /// Release any held session/connection. Called on every exit path.
    async fn release(&mut self);
}

/// Settings for the HTTP-backed page source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSourceConfig {
    /// Selectors whose presence marks the page as ready (테이블 컨테이너).
    pub readiness_markers: Vec<String>,
    /// Bounded wait for the readiness marker.
    pub readiness_timeout_secs: u64,
    /// Delay between readiness polls.
    pub poll_interval_ms: u64,
    /// Settle time after triggering the next-page control.
    pub settle_delay_ms: u64,
    /// Query parameter used by the page-number fallback.
    pub page_param: String,
}

impl Default for PageSourceConfig {
    fn default() -> Self {
        Self {
            readiness_markers: vec![".tabulator".to_string(), "table".to_string()],
            readiness_timeout_secs: 20,
            poll_interval_ms: 500,
            settle_delay_ms: 3000,
            page_param: "page".to_string(),
        }
    }
}

struct CurrentPage {
    url: Url,
    index: u32,
    html: String,
}

/// HTTP fetch + markup check implementation of `PageSource`.
pub struct HttpPageSource {
    http: HttpClient,
    config: PageSourceConfig,
    cancel: CancellationToken,
    current: Option<CurrentPage>,
    released: bool,
}

impl HttpPageSource {
    pub fn new(http: HttpClient, config: PageSourceConfig) -> Self {
        Self {
            http,
            config,
            cancel: CancellationToken::new(),
            current: None,
            released: false,
        }
    }

    /// Attach a token honored at page-load boundaries.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch until the readiness marker appears, bounded by the timeout
    /// window. A transient fetch failure inside the window is retried;
    /// past the window it becomes the acquisition error.
    async fn fetch_ready(&self, url: &Url) -> ExtractResult<String> {
        let started = Instant::now();
        let timeout = Duration::from_secs(self.config.readiness_timeout_secs);
        let mut last_fetch_error: Option<String> = None;

        loop {
            match self
                .http
                .get_text_with_cancellation(url.as_str(), &self.cancel)
                .await
            {
                Ok(html) => {
                    if any_selector_matches(&html, &self.config.readiness_markers) {
                        return Ok(html);
                    }
                    last_fetch_error = None;
                    debug!("Readiness marker not present yet: {}", url);
                }
                Err(e) => {
                    if self.cancel.is_cancelled() {
                        return Err(ExtractError::acquisition(url.as_str(), "cancelled"));
                    }
                    warn!("⚠️ Fetch attempt failed for {}: {}", url, e);
                    last_fetch_error = Some(e.to_string());
                }
            }

            if started.elapsed() >= timeout {
                let waited_ms = started.elapsed().as_millis() as u64;
                return Err(match last_fetch_error {
                    Some(reason) => ExtractError::acquisition(url.as_str(), reason),
                    None => ExtractError::page_not_ready(
                        url.as_str(),
                        &self.config.readiness_markers.join(", "),
                        waited_ms,
                    ),
                });
            }

            let jitter = fastrand::u64(0..=self.config.poll_interval_ms / 2);
            tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms + jitter)).await;
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn load(&mut self, url: &str) -> ExtractResult<PageHandle> {
        let parsed =
            Url::parse(url).map_err(|e| ExtractError::acquisition(url, format!("invalid URL: {e}")))?;

        info!("페이지 로드 중: {}", url);
        let html = self.fetch_ready(&parsed).await?;

        let handle = PageHandle {
            page_index: 0,
            url: parsed.to_string(),
            html: html.clone(),
        };
        self.current = Some(CurrentPage {
            url: parsed,
            index: 0,
            html,
        });
        Ok(handle)
    }

    async fn advance(&mut self) -> ExtractResult<PageHandle> {
        let (next_url, next_index) = {
            let current = self.current.as_ref().ok_or_else(|| {
                ExtractError::acquisition("<no page>", "advance() called before load()")
            })?;

            let next_url = match detect_next_control(&current.html, &current.url) {
                NextControl::Link(target) => target,
                NextControl::ParamFallback => {
                    // 사이트 페이저가 JS로만 동작하는 경우: page 파라미터 증가
                    next_page_url(&current.url, &self.config.page_param, current.index + 2)
                }
                NextControl::Disabled => {
                    debug!("다음 페이지 버튼이 비활성화되어 있습니다.");
                    return Err(ExtractError::NoMoreResults);
                }
                NextControl::Absent => {
                    debug!("다음 페이지 컨트롤이 없습니다.");
                    return Err(ExtractError::NoMoreResults);
                }
            };
            (next_url, current.index + 1)
        };

        // Let the target settle before polling; mirrors the wait a
        // browser-driven backend needs after clicking the pager.
        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        info!("다음 페이지 로드: {}", next_url);
        let html = self.fetch_ready(&next_url).await?;

        let handle = PageHandle {
            page_index: next_index,
            url: next_url.to_string(),
            html: html.clone(),
        };
        self.current = Some(CurrentPage {
            url: next_url,
            index: next_index,
            html,
        });
        Ok(handle)
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.current = None;
        info!("🔌 page source released");
    }
}

enum NextControl {
    Link(Url),
    ParamFallback,
    Disabled,
    Absent,
}

/// Next-page control selectors in priority order.
const NEXT_CONTROL_SELECTORS: [&str; 4] = [
    "a[rel='next']",
    "[data-page='next']",
    "a.next",
    "li.next a",
];

fn detect_next_control(html: &str, base: &Url) -> NextControl {
    let doc = scraper::Html::parse_document(html);

    for raw in NEXT_CONTROL_SELECTORS {
        let Ok(selector) = scraper::Selector::parse(raw) else {
            continue;
        };
        let Some(element) = doc.select(&selector).next() else {
            continue;
        };

        let value = element.value();
        let disabled = value.attr("disabled").is_some()
            || value.attr("aria-disabled") == Some("true")
            || value
                .attr("class")
                .is_some_and(|c| c.split_whitespace().any(|part| part == "disabled"));
        if disabled {
            return NextControl::Disabled;
        }

        match value.attr("href").filter(|href| !href.is_empty() && *href != "#") {
            Some(href) => match base.join(href) {
                Ok(target) => return NextControl::Link(target),
                Err(e) => {
                    warn!("Unresolvable next link '{}': {}", href, e);
                    return NextControl::ParamFallback;
                }
            },
            None => return NextControl::ParamFallback,
        }
    }

    NextControl::Absent
}

fn next_page_url(current: &Url, param: &str, page_number: u32) -> Url {
    let mut next = current.clone();
    let retained: Vec<(String, String)> = current
        .query_pairs()
        .filter(|(name, _)| name != param)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    {
        let mut pairs = next.query_pairs_mut();
        pairs.clear();
        for (name, value) in &retained {
            pairs.append_pair(name, value);
        }
        pairs.append_pair(param, &page_number.to_string());
    }
    next
}
