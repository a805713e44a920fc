//! EmojiApp - a GitHub emoji, user and repository browser with a local cache
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Presentation Layer                         │
//! │  - Emoji / User / Repo presenters (watch-based UI state)    │
//! │  - CLI front-end                                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Cache-or-fetch reads (emojis, users)                     │
//! │  - Remote mediator + pager (repositories)                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────────────────────┐ ┌────────────────────────────┐
//! │         Data Layer            │ │       GitHub Layer          │
//! │  - SQLite (sqlx)              │ │  - REST API (reqwest)       │
//! │  - change notifications       │ │                             │
//! └──────────────────────────────┘ └────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `presentation`: UI state holders
//! - `service`: Business logic layer
//! - `github`: GitHub REST API client
//! - `data`: SQLite cache
//! - `config`: Configuration management
//! - `metrics`: Prometheus instruments
//! - `error`: Error types

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod github;
pub mod metrics;
pub mod presentation;
pub mod service;

use std::sync::Arc;

/// Application state shared by every front-end
///
/// Cheap to clone; all members are shared handles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Local cache
    pub db: Arc<data::Database>,

    /// GitHub API
    pub api: Arc<dyn github::GitHubApi>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Build the GitHub client
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let api = github::GitHubClient::new(&config.github)?;
        tracing::info!(base_url = %api.base_url(), "GitHub client initialized");

        Self::with_api(config, Arc::new(api)).await
    }

    /// Initialize application state around an existing API implementation
    pub async fn with_api(
        config: config::AppConfig,
        api: Arc<dyn github::GitHubApi>,
    ) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            api,
        })
    }

    pub fn emoji_service(&self) -> Arc<service::EmojiService> {
        Arc::new(service::EmojiService::new(self.db.clone(), self.api.clone()))
    }

    pub fn user_service(&self) -> Arc<service::UserService> {
        Arc::new(service::UserService::new(self.db.clone(), self.api.clone()))
    }

    /// Pager over `owner`'s repositories, or the configured default owner
    pub fn repo_pager(&self, owner: Option<&str>) -> service::RepoPager {
        let paging = &self.config.paging;
        let owner = owner
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(&paging.default_owner);

        let mediator = service::RepoRemoteMediator::new(
            self.db.clone(),
            self.api.clone(),
            owner,
            paging.page_size,
            paging.refresh_start,
        );
        service::RepoPager::new(self.db.clone(), mediator)
    }

    pub fn emoji_presenter(&self) -> presentation::EmojiPresenter {
        presentation::EmojiPresenter::new(self.emoji_service())
    }

    /// Must be called inside a tokio runtime
    pub fn user_presenter(&self) -> presentation::UserPresenter {
        presentation::UserPresenter::new(self.user_service())
    }

    pub fn repo_presenter(&self, owner: Option<&str>) -> presentation::RepoPresenter {
        presentation::RepoPresenter::new(self.repo_pager(owner))
    }

    /// Empty every cached table
    pub async fn clear_cache(&self) -> Result<(), error::AppError> {
        self.db.clear_all().await
    }
}
