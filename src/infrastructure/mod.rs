//! Infrastructure module - External-facing implementations
//!
//! HTTP acquisition, HTML table extraction, output sinks, logging and
//! configuration. Everything here implements seams the application
//! layer consumes through traits or plain structs.

pub mod config;
pub mod http_client;
pub mod logging;
pub mod page_source;
pub mod sink;
pub mod table_extractor;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use http_client::{HttpClient, HttpClientConfig};
pub use page_source::{HttpPageSource, PageHandle, PageSource, PageSourceConfig};
pub use sink::{CsvSink, JsonLinesSink, MemorySink, RecordSink};
pub use table_extractor::TableExtractor;
