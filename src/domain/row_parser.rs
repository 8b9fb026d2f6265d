//! Per-row field parsing against a declarative schema.
//!
//! 한 행의 셀 텍스트를 스키마 순서대로 정규화한다. Required 필드가 하나라도
//! 검증에 실패하면 행 전체가 거부되고, optional 필드는 센티널 값으로
//! 대체된다.

use super::errors::{RejectReason, RowRejection};
use super::record::{RawRow, Record};
use super::schema::RowSchema;

/// Applies every `FieldSpec` of a schema to one `RawRow`, in declaration
/// order, producing a `Record` or a typed rejection.
#[derive(Debug, Clone)]
pub struct RowParser {
    schema: RowSchema,
}

impl RowParser {
    pub fn new(schema: RowSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    /// Parse one row. A missing cell behaves as "field absent": optional
    /// fields default, required fields reject. Cleaning itself never
    /// fails, so the only rejection causes are structural.
    pub fn parse(&self, row: &RawRow, row_index: usize) -> Result<Record, RowRejection> {
        if row.is_empty() {
            return Err(RowRejection {
                row_index,
                reason: RejectReason::EmptyRow,
            });
        }

        let mut record = Record::with_capacity(self.schema.fields().len());

        for spec in self.schema.fields() {
            match row.cell(spec.cell) {
                Some(raw) => {
                    if spec.required && !spec.rule.is_valid(raw) {
                        return Err(RowRejection {
                            row_index,
                            reason: RejectReason::InvalidRequiredField {
                                field: spec.name.clone(),
                                raw: raw.to_string(),
                            },
                        });
                    }
                    let value = if spec.rule.is_valid(raw) {
                        spec.rule.apply(raw)
                    } else {
                        spec.rule.sentinel()
                    };
                    record.insert(spec.name.clone(), value);
                }
                None => {
                    if spec.required {
                        return Err(RowRejection {
                            row_index,
                            reason: RejectReason::MissingRequiredCell {
                                field: spec.name.clone(),
                                cell: spec.cell,
                                cells_present: row.len(),
                            },
                        });
                    }
                    record.insert(spec.name.clone(), spec.rule.sentinel());
                }
            }
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clean::CleanRule;
    use crate::domain::record::FieldValue;
    use crate::domain::schema::FieldSpec;

    fn gold_schema() -> RowSchema {
        RowSchema::new(vec![
            FieldSpec::required("date", 0, CleanRule::Text),
            FieldSpec::required("buy", 1, CleanRule::Integer),
            FieldSpec::required("sell", 2, CleanRule::Integer),
            FieldSpec::optional("sell_18k", 3, CleanRule::Integer),
            FieldSpec::optional("sell_14k", 4, CleanRule::Integer),
        ])
    }

    #[test]
    fn parses_complete_row() {
        let parser = RowParser::new(gold_schema());
        let row = RawRow::from(vec!["2024.01.01", "1,234", "1,000", "900", "700"]);

        let record = parser.parse(&row, 0).unwrap();
        assert_eq!(
            record.get("date"),
            Some(&FieldValue::Text("2024.01.01".into()))
        );
        assert_eq!(record.get("buy"), Some(&FieldValue::Integer(1234)));
        assert_eq!(record.get("sell"), Some(&FieldValue::Integer(1000)));
        assert_eq!(record.get("sell_18k"), Some(&FieldValue::Integer(900)));
    }

    #[test]
    fn round_trip_three_field_schema() {
        let schema = RowSchema::new(vec![
            FieldSpec::required("date", 0, CleanRule::Text),
            FieldSpec::required("buy", 1, CleanRule::Integer),
            FieldSpec::required("sell", 2, CleanRule::Integer),
        ]);
        let parser = RowParser::new(schema);
        let row = RawRow::from(vec!["2024.01.01", "1,234", "1,000"]);

        let record = parser.parse(&row, 0).unwrap();
        assert_eq!(
            record.get("date"),
            Some(&FieldValue::Text("2024.01.01".into()))
        );
        assert_eq!(record.get("buy"), Some(&FieldValue::Integer(1234)));
        assert_eq!(record.get("sell"), Some(&FieldValue::Integer(1000)));
    }

    #[test]
    fn rejects_row_shorter_than_required_fields() {
        let parser = RowParser::new(gold_schema());
        let row = RawRow::from(vec!["2024.01.01", "1,234"]);

        let rejection = parser.parse(&row, 7).unwrap_err();
        assert_eq!(rejection.row_index, 7);
        assert_eq!(
            rejection.reason,
            RejectReason::MissingRequiredCell {
                field: "sell".into(),
                cell: 2,
                cells_present: 2,
            }
        );
    }

    #[test]
    fn rejects_invalid_required_field() {
        let parser = RowParser::new(gold_schema());
        let row = RawRow::from(vec!["2024.01.01", "추후 고시", "1,000"]);

        let rejection = parser.parse(&row, 0).unwrap_err();
        assert!(matches!(
            rejection.reason,
            RejectReason::InvalidRequiredField { ref field, .. } if field == "buy"
        ));
    }

    #[test]
    fn optional_field_defaults_instead_of_rejecting() {
        let parser = RowParser::new(gold_schema());
        // 18K/14K columns missing entirely and malformed respectively.
        let short = RawRow::from(vec!["2024.01.01", "1,234", "1,000"]);
        let malformed = RawRow::from(vec!["2024.01.01", "1,234", "1,000", "-", "x"]);

        let from_short = parser.parse(&short, 0).unwrap();
        assert_eq!(from_short.get("sell_18k"), Some(&FieldValue::Integer(0)));
        assert_eq!(from_short.get("sell_14k"), Some(&FieldValue::Integer(0)));

        let from_malformed = parser.parse(&malformed, 1).unwrap();
        assert_eq!(from_malformed.get("sell_18k"), Some(&FieldValue::Integer(0)));
    }

    #[test]
    fn rejects_empty_row() {
        let parser = RowParser::new(gold_schema());
        let rejection = parser.parse(&RawRow::default(), 0).unwrap_err();
        assert_eq!(rejection.reason, RejectReason::EmptyRow);
    }

    #[test]
    fn record_field_order_matches_schema_order() {
        let parser = RowParser::new(gold_schema());
        let row = RawRow::from(vec!["2024.01.01", "1,234", "1,000", "900", "700"]);
        let record = parser.parse(&row, 0).unwrap();

        let names: Vec<&str> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["date", "buy", "sell", "sell_18k", "sell_14k"]);
    }
}
