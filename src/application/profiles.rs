//! Shipped dataset profiles.
//!
//! The pipeline itself carries no dataset knowledge; a profile bundles
//! everything dataset-specific: start URL, table selector candidates,
//! and the field schema. The two profiles below cover the Korea Gold
//! Exchange daily price table and the Yahoo Finance gainers table,
//! which differ only in configuration.

use serde::{Deserialize, Serialize};

use crate::domain::clean::CleanRule;
use crate::domain::schema::{FieldSpec, RowSchema, SelectorCandidates};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub name: String,
    pub start_url: String,
    pub table_candidates: SelectorCandidates,
    pub schema: RowSchema,
}

impl DatasetProfile {
    /// 한국금거래소 금 시세 (daily gold prices, Tabulator widget).
    pub fn gold_price() -> Self {
        Self {
            name: "gold-price".to_string(),
            start_url: "https://www.koreagoldx.co.kr/price/gold".to_string(),
            table_candidates: SelectorCandidates::new([".tabulator", "div.tabulator", "table"]),
            schema: RowSchema::new(vec![
                FieldSpec::required("date", 0, CleanRule::Text),
                FieldSpec::required("buy_pure", 1, CleanRule::Integer),
                FieldSpec::required("sell_pure", 2, CleanRule::Integer),
                FieldSpec::optional("sell_18k", 3, CleanRule::Integer),
                FieldSpec::optional("sell_14k", 4, CleanRule::Integer),
            ]),
        }
    }

    /// Yahoo Finance daily stock gainers.
    pub fn stock_gainers() -> Self {
        Self {
            name: "stock-gainers".to_string(),
            start_url: "https://finance.yahoo.com/markets/stocks/gainers/".to_string(),
            // Yahoo reshuffles its markup regularly; the candidate order
            // goes from most to least specific.
            table_candidates: SelectorCandidates::new([
                "section[class*='mainContent'] table",
                "table[data-testid='gainers-table']",
                "div[data-testid='gainers-table'] table",
                "table",
            ]),
            schema: RowSchema::new(vec![
                FieldSpec::required("symbol", 0, CleanRule::Text),
                FieldSpec::required("name", 1, CleanRule::Text),
                FieldSpec::required("price_change", 2, CleanRule::SignedNumber),
                FieldSpec::required("change_percent", 3, CleanRule::Percent),
                FieldSpec::optional("volume", 4, CleanRule::UnitMagnitude),
                FieldSpec::optional("market_cap", 5, CleanRule::UnitMagnitude),
                FieldSpec::optional("pe_ratio", 6, CleanRule::Decimal),
                FieldSpec::optional("avg_volume", 7, CleanRule::UnitMagnitude),
            ]),
        }
    }

    /// Resolve a profile by CLI-friendly name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "gold" | "gold-price" => Some(Self::gold_price()),
            "gainers" | "stock-gainers" => Some(Self::stock_gainers()),
            _ => None,
        }
    }

    /// Names accepted by `by_name`, for usage messages.
    pub fn known_names() -> &'static [&'static str] {
        &["gold", "gainers"]
    }
}
