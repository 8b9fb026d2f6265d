//! Declarative extraction schemas.
//!
//! A `RowSchema` is the only dataset-specific knowledge the pipeline
//! carries: an ordered list of `FieldSpec`s mapping cell positions to
//! named, cleaned fields. The gold-price and stock-gainers datasets
//! differ only in their schemas and selector candidates, so both run
//! through the identical pipeline.

use serde::{Deserialize, Serialize};

use super::clean::CleanRule;

/// One named extraction rule: cell index, cleaning rule, requiredness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Stable field name exposed to sinks.
    pub name: String,
    /// Zero-based cell index within the row.
    pub cell: usize,
    /// Cleaning rule, doubling as the validity predicate.
    pub rule: CleanRule,
    /// Required fields reject the row on failure; optional fields
    /// default to the rule's sentinel.
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: &str, cell: usize, rule: CleanRule) -> Self {
        Self {
            name: name.to_string(),
            cell,
            rule,
            required: true,
        }
    }

    pub fn optional(name: &str, cell: usize, rule: CleanRule) -> Self {
        Self {
            name: name.to_string(),
            cell,
            rule,
            required: false,
        }
    }
}

/// Ordered field specs for one dataset. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSchema {
    fields: Vec<FieldSpec>,
}

impl RowSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Highest cell index any required field reaches; rows shorter than
    /// this cannot possibly be accepted.
    pub fn min_required_cells(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.cell + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Ordered list of locator strings tried against each freshly loaded
/// page. Resolution happens per page load and is never cached across
/// loads, because the markup may differ from page to page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorCandidates(Vec<String>);

impl SelectorCandidates {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(candidates.into_iter().map(Into::into).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gold_like_schema() -> RowSchema {
        RowSchema::new(vec![
            FieldSpec::required("date", 0, CleanRule::Text),
            FieldSpec::required("buy", 1, CleanRule::Integer),
            FieldSpec::required("sell", 2, CleanRule::Integer),
            FieldSpec::optional("sell_18k", 3, CleanRule::Integer),
        ])
    }

    #[test]
    fn min_required_cells_covers_highest_required_index() {
        assert_eq!(gold_like_schema().min_required_cells(), 3);
    }

    #[test]
    fn field_names_keep_declaration_order() {
        assert_eq!(
            gold_like_schema().field_names(),
            vec!["date", "buy", "sell", "sell_18k"]
        );
    }

    #[test]
    fn schema_round_trips_through_json() {
        let schema = gold_like_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let back: RowSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }
}
