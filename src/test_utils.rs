//! Test utilities for findata-crawler
//!
//! Scripted page sources and HTML fixtures shared by unit and
//! integration tests, so pipeline behavior can be exercised without any
//! network access.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::errors::{ExtractError, ExtractResult};
use crate::infrastructure::page_source::{PageHandle, PageSource};

/// Page source replaying a canned sequence of pages.
///
/// `load` serves the first entry, each `advance` the next; an exhausted
/// script reports `NoMoreResults`, matching a pager that ran out of
/// pages.
pub struct ScriptedPageSource {
    pages: VecDeque<ExtractResult<String>>,
    next_index: u32,
    release_count: Arc<AtomicUsize>,
}

impl ScriptedPageSource {
    pub fn new(pages: Vec<ExtractResult<String>>) -> Self {
        Self {
            pages: pages.into(),
            next_index: 0,
            release_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter observable after the session consumed the source.
    pub fn release_probe(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.release_count)
    }

    fn next_page(&mut self, on_empty: ExtractError) -> ExtractResult<PageHandle> {
        match self.pages.pop_front() {
            None => Err(on_empty),
            Some(Err(e)) => Err(e),
            Some(Ok(html)) => {
                let handle = PageHandle {
                    page_index: self.next_index,
                    url: format!("scripted://page/{}", self.next_index),
                    html,
                };
                self.next_index += 1;
                Ok(handle)
            }
        }
    }
}

#[async_trait]
impl PageSource for ScriptedPageSource {
    async fn load(&mut self, url: &str) -> ExtractResult<PageHandle> {
        self.next_page(ExtractError::acquisition(url, "script exhausted"))
    }

    async fn advance(&mut self) -> ExtractResult<PageHandle> {
        self.next_page(ExtractError::NoMoreResults)
    }

    async fn release(&mut self) {
        self.release_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Plain `<table>` markup with a header row and one `<tr>` per data row.
pub fn plain_table_page(rows: &[Vec<String>]) -> String {
    let mut body = String::new();
    for row in rows {
        body.push_str("<tr>");
        for cell in row {
            body.push_str(&format!("<td>{cell}</td>"));
        }
        body.push_str("</tr>");
    }
    format!(
        "<html><body><section class=\"mainContent\"><table>\
         <thead><tr><th>h1</th><th>h2</th></tr></thead>\
         <tbody>{body}</tbody></table></section></body></html>"
    )
}

/// Tabulator-style markup matching the gold price page structure.
pub fn tabulator_page(rows: &[Vec<String>]) -> String {
    let mut body = String::new();
    for row in rows {
        body.push_str("<div class=\"tabulator-row\">");
        for cell in row {
            body.push_str(&format!("<div class=\"tabulator-cell\">{cell}</div>"));
        }
        body.push_str("</div>");
    }
    format!("<html><body><div class=\"tabulator\">{body}</div></body></html>")
}

/// Distinct gold-price rows: date, pure buy/sell, 18K/14K sell.
pub fn gold_rows(offset: usize, count: usize) -> Vec<Vec<String>> {
    (0..count)
        .map(|i| {
            let day = offset + i + 1;
            vec![
                format!("2024.01.{day:02}"),
                format!("{},{:03}", 450 + day, day % 1000),
                format!("{},{:03}", 440 + day, day % 1000),
                format!("{},{:03}", 330 + day, day % 1000),
                format!("{},{:03}", 260 + day, day % 1000),
            ]
        })
        .collect()
}
