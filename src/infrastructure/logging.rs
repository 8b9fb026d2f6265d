//! Logging system configuration and initialization
//!
//! Console and optional file output through `tracing`, with
//! configuration-driven level control and KST (Korea Standard Time)
//! timestamps. The non-blocking file writer's guard is parked in a
//! static so the writer stays alive for the process lifetime.

use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Utc};
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

// Re-export LoggingConfig from config module
pub use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking log file writer alive
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Custom time formatter for KST (Korea Standard Time, UTC+9)
struct KstTimeFormatter;

impl FormatTime for KstTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = Utc::now();
        let kst_offset = FixedOffset::east_opt(9 * 3600).expect("KST offset is valid");
        let kst_time = now.with_timezone(&kst_offset);
        write!(w, "{}", kst_time.format("%Y-%m-%d %H:%M:%S%.3f %Z"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LoggingConfig::default())
}

/// Initialize logging with custom configuration.
///
/// `RUST_LOG` overrides the config-derived filter when set:
/// ```bash
/// RUST_LOG="debug,reqwest=debug,hyper=debug" cargo run
/// ```
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&config.level);
        for (module, level) in &config.module_filters {
            if let Ok(directive) = format!("{module}={level}").parse() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    });

    let console_layer = config.console_output.then(|| {
        fmt::layer()
            .with_timer(KstTimeFormatter)
            .with_target(false)
            .with_ansi(true)
    });

    let file_layer = if config.file_output {
        let log_dir = get_log_directory();
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let appender = tracing_appender::rolling::daily(&log_dir, "findata-crawler.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard mutex poisoned"))?
            .push(guard);

        Some(
            fmt::layer()
                .with_timer(KstTimeFormatter)
                .with_writer(writer)
                .with_ansi(false),
        )
    } else {
        None
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("Logging initialized (level: {})", config.level);
    Ok(())
}
