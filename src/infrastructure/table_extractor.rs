//! Table location and raw row extraction.
//!
//! The locator is the pipeline's robustness mechanism against markup
//! drift: an ordered list of selector candidates is tried against each
//! freshly parsed page, in fixed priority order, and the first candidate
//! that yields a container with at least one row-like child wins. A
//! candidate that fails to parse or match never aborts the remaining
//! candidates; only full exhaustion is an error.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::domain::errors::{ExtractError, ExtractResult};
use crate::domain::record::RawRow;
use crate::domain::schema::SelectorCandidates;

/// Row/cell selectors tried inside a located container, in order.
/// Tabulator widgets first (gold price page), plain tables second.
const ROW_SELECTORS: [&str; 3] = [".tabulator-row", "tbody tr", "tr"];
const CELL_SELECTORS: [&str; 2] = [".tabulator-cell", "td"];

/// A structural match for one page load. Never cached across loads.
pub struct LocatedTable<'a> {
    pub container: ElementRef<'a>,
    /// Which candidate matched, for diagnostics.
    pub candidate_index: usize,
    pub candidate: String,
    row_selector: Selector,
}

/// Locates a table-like container via selector fallback and lifts its
/// rows into `RawRow`s.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    candidates: SelectorCandidates,
}

impl TableExtractor {
    pub fn new(candidates: SelectorCandidates) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &SelectorCandidates {
        &self.candidates
    }

    /// Try each candidate in priority order against the parsed page.
    /// Returns the first container that holds at least one row-like
    /// child; `NoTableFound` only after every candidate failed.
    pub fn locate<'a>(&self, doc: &'a Html, page_index: u32) -> ExtractResult<LocatedTable<'a>> {
        for (index, candidate) in self.candidates.iter().enumerate() {
            let selector = match Selector::parse(candidate) {
                Ok(selector) => selector,
                Err(e) => {
                    warn!("Invalid table selector '{}': {}", candidate, e);
                    continue;
                }
            };

            let Some(container) = doc.select(&selector).next() else {
                continue;
            };

            // A container without row-like children is not a structural
            // match; keep trying the remaining candidates.
            if let Some(row_selector) = first_matching_row_selector(&container) {
                debug!("테이블 발견: {}", candidate);
                return Ok(LocatedTable {
                    container,
                    candidate_index: index,
                    candidate: candidate.clone(),
                    row_selector,
                });
            }
        }

        Err(ExtractError::no_table_found(
            page_index,
            self.candidates.iter().cloned().collect(),
        ))
    }

    /// Parse the page and lift every row of the located table into cell
    /// text. Rows with no extractable data cells (header rows, spacer
    /// rows) are skipped, not errors.
    pub fn extract_rows(&self, html: &str, page_index: u32) -> ExtractResult<Vec<RawRow>> {
        let doc = Html::parse_document(html);
        let located = self.locate(&doc, page_index)?;

        let mut rows = Vec::new();
        for row in located.container.select(&located.row_selector) {
            let cells = extract_cells(&row);
            if cells.is_empty() {
                continue;
            }
            rows.push(RawRow::new(cells));
        }

        debug!(
            "발견된 행 수: {} (selector: {})",
            rows.len(),
            located.candidate
        );
        Ok(rows)
    }
}

fn first_matching_row_selector(container: &ElementRef<'_>) -> Option<Selector> {
    for row_selector in ROW_SELECTORS {
        let selector = Selector::parse(row_selector).ok()?;
        if container.select(&selector).next().is_some() {
            return Some(selector);
        }
    }
    None
}

fn extract_cells(row: &ElementRef<'_>) -> Vec<String> {
    for cell_selector in CELL_SELECTORS {
        let Ok(selector) = Selector::parse(cell_selector) else {
            continue;
        };
        let cells: Vec<String> = row
            .select(&selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();
        if !cells.is_empty() {
            return cells;
        }
    }
    Vec::new()
}

/// Readiness check used by page sources: does any of the given
/// selectors match the document?
pub fn any_selector_matches(html: &str, selectors: &[String]) -> bool {
    let doc = Html::parse_document(html);
    selectors.iter().any(|raw| {
        Selector::parse(raw)
            .map(|selector| doc.select(&selector).next().is_some())
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABULATOR_PAGE: &str = r#"
        <div class="wrap">
          <div class="tabulator">
            <div class="tabulator-row">
              <div class="tabulator-cell">2024.01.01</div>
              <div class="tabulator-cell">1,234</div>
              <div class="tabulator-cell">1,000</div>
            </div>
            <div class="tabulator-row">
              <div class="tabulator-cell">2024.01.02</div>
              <div class="tabulator-cell">1,250</div>
              <div class="tabulator-cell">1,010</div>
            </div>
          </div>
        </div>
    "#;

    const PLAIN_TABLE_PAGE: &str = r#"
        <section class="mainContent">
          <table>
            <thead><tr><th>Symbol</th><th>Name</th></tr></thead>
            <tbody>
              <tr><td>NVDA</td><td>NVIDIA</td></tr>
              <tr><td>AMD</td><td>Advanced Micro Devices</td></tr>
            </tbody>
          </table>
        </section>
    "#;

    fn extractor(candidates: &[&str]) -> TableExtractor {
        TableExtractor::new(SelectorCandidates::new(candidates.to_vec()))
    }

    #[test]
    fn extracts_tabulator_rows() {
        let rows = extractor(&[".tabulator"])
            .extract_rows(TABULATOR_PAGE, 0)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(0), Some("2024.01.01"));
        assert_eq!(rows[1].cell(1), Some("1,250"));
    }

    #[test]
    fn skips_header_only_rows_in_plain_tables() {
        let rows = extractor(&["table"])
            .extract_rows(PLAIN_TABLE_PAGE, 0)
            .unwrap();
        // The thead row has no <td> cells and must not appear.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(0), Some("NVDA"));
    }

    #[test]
    fn fallback_tries_candidates_in_priority_order() {
        // Only the last candidate matches; result must equal resolving
        // with that candidate alone.
        let with_fallback = extractor(&["#missing", ".also-missing", ".tabulator"])
            .extract_rows(TABULATOR_PAGE, 0)
            .unwrap();
        let direct = extractor(&[".tabulator"])
            .extract_rows(TABULATOR_PAGE, 0)
            .unwrap();
        assert_eq!(with_fallback, direct);
    }

    #[test]
    fn invalid_candidate_does_not_abort_remaining() {
        let rows = extractor(&["[[[broken", ".tabulator"])
            .extract_rows(TABULATOR_PAGE, 0)
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn container_without_rows_is_not_a_match() {
        // .empty matches but holds no row-like children; the candidate
        // must fall through to the table that actually has rows.
        let html = r#"<div class="empty"></div><table><tbody><tr><td>x</td></tr></tbody></table>"#;
        let rows = extractor(&[".empty", "table"]).extract_rows(html, 0).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn exhaustion_reports_all_tried_selectors() {
        let err = extractor(&["#a", "#b", "#c"])
            .extract_rows("<html><body></body></html>", 3)
            .unwrap_err();
        match err {
            ExtractError::NoTableFound {
                page_index,
                tried_selectors,
            } => {
                assert_eq!(page_index, 3);
                assert_eq!(tried_selectors, vec!["#a", "#b", "#c"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn locate_reports_matching_candidate() {
        let doc = Html::parse_document(TABULATOR_PAGE);
        let extractor = extractor(&["#missing", ".tabulator"]);
        let located = extractor.locate(&doc, 0).unwrap();
        assert_eq!(located.candidate_index, 1);
        assert_eq!(located.candidate, ".tabulator");
    }

    #[test]
    fn readiness_marker_check() {
        let selectors = vec![".tabulator".to_string(), "table".to_string()];
        assert!(any_selector_matches(TABULATOR_PAGE, &selectors));
        assert!(any_selector_matches(PLAIN_TABLE_PAGE, &selectors));
        assert!(!any_selector_matches("<div>loading…</div>", &selectors));
    }
}
