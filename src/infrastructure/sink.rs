//! Tabular output sinks.
//!
//! The pipeline hands a finalized `RecordSet` to a `RecordSink` and is
//! otherwise agnostic to output format. Field names and insertion order
//! are preserved exactly as accumulated.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

use crate::domain::record::RecordSet;

/// External tabular-writer collaborator.
#[async_trait]
pub trait RecordSink: Send {
    async fn write(&mut self, records: &RecordSet) -> Result<()>;
}

/// One JSON object per line, fields in schema order.
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn write(&mut self, records: &RecordSet) -> Result<()> {
        let mut out = String::new();
        for record in records.iter() {
            let line = serde_json::to_string(record).context("Failed to serialize record")?;
            out.push_str(&line);
            out.push('\n');
        }

        fs::write(&self.path, out)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!(
            "데이터가 {}에 저장되었습니다. (총 {}개 행)",
            self.path.display(),
            records.len()
        );
        Ok(())
    }
}

/// Comma-separated values with a header row from the schema's field
/// names.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    async fn write(&mut self, records: &RecordSet) -> Result<()> {
        let mut out = String::new();

        let header: Vec<String> = records
            .field_names()
            .iter()
            .map(|name| escape_csv_field(name))
            .collect();
        out.push_str(&header.join(","));
        out.push('\n');

        for record in records.iter() {
            let row: Vec<String> = records
                .field_names()
                .iter()
                .map(|name| {
                    record
                        .get(name)
                        .map(|value| escape_csv_field(&value.to_string()))
                        .unwrap_or_default()
                })
                .collect();
            out.push_str(&row.join(","));
            out.push('\n');
        }

        fs::write(&self.path, out)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!(
            "데이터가 {}에 저장되었습니다. (총 {}개 행)",
            self.path.display(),
            records.len()
        );
        Ok(())
    }
}

/// In-memory sink for tests and embedding callers.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub sets: Vec<RecordSet>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&mut self, records: &RecordSet) -> Result<()> {
        self.sets.push(records.clone());
        Ok(())
    }
}

/// Quote a field when it contains a delimiter, quote, or newline;
/// embedded quotes are doubled.
fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
