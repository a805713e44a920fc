//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml, `--config`)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub github: GitHubConfig,
    pub database: DatabaseConfig,
    pub paging: PagingConfig,
    pub logging: LoggingConfig,
}

/// GitHub REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// API root (e.g., "https://api.github.com/")
    pub base_url: String,
    /// User-Agent header; GitHub rejects requests without one
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Optional personal access token (raises the rate limit)
    pub token: Option<String>,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Repository paging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PagingConfig {
    /// Items per page, sent upstream as `per_page`
    pub page_size: u32,
    /// Owner listed when no owner is given
    pub default_owner: String,
    /// Which page a REFRESH starts from
    #[serde(default)]
    pub refresh_start: RefreshStart,
}

/// Page a REFRESH load fetches
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStart {
    /// Always reload from page 1
    #[default]
    FirstPage,
    /// Reload the last page that was stored (`cursor - 1`)
    LastLoadedPage,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

/// GitHub's upper bound for `per_page`
const MAX_PAGE_SIZE: u32 = 100;

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. `explicit` file (required when given)
    /// 5. Environment variables (EMOJIAPP__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load(explicit: Option<&Path>) -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder()
            .set_default("github.base_url", "https://api.github.com/")?
            .set_default("github.user_agent", "emojiapp/0.1.0")?
            .set_default("github.timeout_seconds", 30)?
            .set_default("database.path", "data/emojiapp.db")?
            .set_default("paging.page_size", 20)?
            .set_default("paging.default_owner", "google")?
            .set_default("paging.refresh_start", "first_page")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("EMOJIAPP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        let base_url = url::Url::parse(&self.github.base_url).map_err(|e| {
            crate::error::AppError::Config(format!("github.base_url is not a valid URL: {e}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(crate::error::AppError::Config(
                "github.base_url must use http or https".to_string(),
            ));
        }

        if self.github.timeout_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "github.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.paging.page_size == 0 || self.paging.page_size > MAX_PAGE_SIZE {
            return Err(crate::error::AppError::Config(format!(
                "paging.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.paging.default_owner.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "paging.default_owner cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
