//! Core tabular data model: raw rows, normalized field values, records.
//!
//! A `RawRow` is the transient cell text lifted out of one table row; a
//! `Record` is the schema-conformant result of parsing it. Records keep
//! their fields in schema declaration order and a `RecordSet` keeps its
//! records in page-then-row accumulation order, so downstream sinks can
//! rely on stable column and row ordering.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Unparsed cell text from one table row. Discarded after parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow(pub Vec<String>);

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self(cells)
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<&str>> for RawRow {
    fn from(cells: Vec<&str>) -> Self {
        Self(cells.into_iter().map(str::to_string).collect())
    }
}

/// A normalized cell value produced by a cleaning rule.
///
/// Serialized untagged so sinks see plain JSON scalars. `Integer` is
/// listed before `Float` so untagged deserialization keeps integral
/// numbers integral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One fully parsed, schema-conformant data row.
///
/// Field order matches the schema's declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Serialized as a JSON object; a derived map would not preserve the
// schema's field order.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Ordered collection of records plus the stable field names of the
/// schema that produced them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordSet {
    field_names: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(field_names: Vec<String>) -> Self {
        Self {
            field_names,
            records: Vec::new(),
        }
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop records beyond `count`, keeping accumulation order.
    pub fn truncate(&mut self, count: usize) {
        self.records.truncate(count);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_insertion_order() {
        let mut record = Record::new();
        record.insert("date", FieldValue::Text("2024.01.01".into()));
        record.insert("buy", FieldValue::Integer(1234));
        record.insert("sell", FieldValue::Integer(1000));

        let names: Vec<&str> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["date", "buy", "sell"]);
    }

    #[test]
    fn record_serializes_as_ordered_object() {
        let mut record = Record::new();
        record.insert("symbol", FieldValue::Text("NVDA".into()));
        record.insert("change_percent", FieldValue::Float(2.35));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"symbol":"NVDA","change_percent":2.35}"#);
    }

    #[test]
    fn record_set_truncates_in_order() {
        let mut set = RecordSet::new(vec!["n".to_string()]);
        for i in 0..5 {
            let mut r = Record::new();
            r.insert("n", FieldValue::Integer(i));
            set.push(r);
        }
        set.truncate(3);
        assert_eq!(set.len(), 3);
        assert_eq!(set.records()[2].get("n"), Some(&FieldValue::Integer(2)));
    }

    #[test]
    fn field_value_untagged_round_trip() {
        let values = vec![
            FieldValue::Integer(42),
            FieldValue::Float(1.5),
            FieldValue::Text("AAPL".into()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[42,1.5,"AAPL"]"#);

        let back: Vec<FieldValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
