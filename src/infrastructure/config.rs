//! Configuration infrastructure
//!
//! Configuration is organized into two tiers:
//! 1. User-configurable settings (run parameters)
//! 2. Hidden/Advanced settings (config file only)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// Centralized defaults so code and config files agree.
pub mod defaults {
    /// Target record count per session (목표 수집 개수)
    pub const TARGET_COUNT: usize = 100;
    /// Bounded wait for the page readiness marker
    pub const READINESS_TIMEOUT_SECS: u64 = 20;
    /// Delay between readiness polls
    pub const POLL_INTERVAL_MS: u64 = 500;
    /// Settle time after triggering the next-page control
    pub const SETTLE_DELAY_MS: u64 = 3000;
    /// Timeout for a single HTTP request
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    /// Rate limit for outgoing requests
    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;
    /// Query parameter used by the page-number fallback
    pub const PAGE_PARAM: &str = "page";

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-configurable settings
    pub user: UserConfig,

    /// Hidden/Advanced settings (config file only)
    pub advanced: AdvancedConfig,
}

/// User-configurable run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Target number of records to accumulate in one session
    pub target_count: usize,

    /// Enable verbose logging
    pub verbose_logging: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

/// Hidden/Advanced settings that are in the config file but rarely touched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Bounded wait for the page readiness marker, in seconds
    pub readiness_timeout_secs: u64,

    /// Delay between readiness polls in milliseconds
    pub poll_interval_ms: u64,

    /// Settle time after advancing pagination, in milliseconds
    pub settle_delay_ms: u64,

    /// Timeout for a single HTTP request, in seconds
    pub request_timeout_seconds: u64,

    /// Rate limit for outgoing requests
    pub max_requests_per_second: u32,

    /// Query parameter used by the page-number fallback
    pub page_param: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user: UserConfig::default(),
            advanced: AdvancedConfig::default(),
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            target_count: defaults::TARGET_COUNT,
            verbose_logging: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "warn".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters.insert("selectors".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            readiness_timeout_secs: defaults::READINESS_TIMEOUT_SECS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            settle_delay_ms: defaults::SETTLE_DELAY_MS,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            page_param: defaults::PAGE_PARAM.to_string(),
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("findata-crawler");

        Ok(config_dir)
    }

    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        let config_path = config_dir.join("findata_crawler_config.json");

        Ok(Self { config_path })
    }

    /// Use an explicit path instead of the platform config directory.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Load the configuration, writing defaults on first run.
    pub async fn load(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Config file not found, creating defaults at {}",
                self.config_path.display()
            );
            let config = AppConfig::default();
            self.save(&config).await?;
            return Ok(config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read config: {}", self.config_path.display()))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", self.config_path.display()))?;

        Ok(config)
    }

    /// Persist the configuration as pretty JSON.
    pub async fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("Failed to write {}", self.config_path.display()))?;

        Ok(())
    }
}
