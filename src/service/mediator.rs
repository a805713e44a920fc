//! Remote mediator for an owner's repository list
//!
//! Keeps the `github_repos` cache in step with
//! `GET /users/{username}/repos`, one page at a time, and stores the page
//! to fetch next in `remote_keys`.

use std::sync::Arc;

use crate::config::RefreshStart;
use crate::data::{Database, GitHubRepo};
use crate::error::AppError;
use crate::github::GitHubApi;
use crate::metrics::MEDIATOR_LOADS_TOTAL;

/// What triggered a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadType {
    /// Initial load or invalidation; replaces the cached pages
    Refresh,
    /// Load before the first page; never needed for this feed
    Prepend,
    /// Load after the last stored page
    Append,
}

impl LoadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadType::Refresh => "refresh",
            LoadType::Prepend => "prepend",
            LoadType::Append => "append",
        }
    }
}

/// Outcome of one mediator load
#[derive(Debug)]
pub enum MediatorResult {
    Success { end_of_pagination_reached: bool },
    Error(AppError),
}

impl MediatorResult {
    /// `Ok(end_of_pagination_reached)` or the load error
    pub fn into_result(self) -> Result<bool, AppError> {
        match self {
            MediatorResult::Success {
                end_of_pagination_reached,
            } => Ok(end_of_pagination_reached),
            MediatorResult::Error(error) => Err(error),
        }
    }
}

/// Fetches repo pages for one owner into the cache
pub struct RepoRemoteMediator {
    db: Arc<Database>,
    api: Arc<dyn GitHubApi>,
    username: String,
    page_size: u32,
    refresh_start: RefreshStart,
}

impl RepoRemoteMediator {
    pub fn new(
        db: Arc<Database>,
        api: Arc<dyn GitHubApi>,
        username: impl AsRef<str>,
        page_size: u32,
        refresh_start: RefreshStart,
    ) -> Self {
        Self {
            db,
            api,
            username: owner_key(username.as_ref()),
            page_size,
            refresh_start,
        }
    }

    /// Owner whose repositories this mediator loads, as stored in the cache
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Run one load.
    ///
    /// Failures are reported as [`MediatorResult::Error`] and never touch the
    /// pages already stored, so the same load can simply be retried.
    pub async fn load(&self, load_type: LoadType) -> MediatorResult {
        let outcome = match load_type {
            LoadType::Prepend => Ok(true),
            LoadType::Refresh => self.refresh().await,
            LoadType::Append => self.append().await,
        };

        match outcome {
            Ok(end_of_pagination_reached) => {
                let label = if end_of_pagination_reached { "end" } else { "success" };
                MEDIATOR_LOADS_TOTAL
                    .with_label_values(&[load_type.as_str(), label])
                    .inc();
                tracing::debug!(
                    owner = %self.username,
                    load_type = load_type.as_str(),
                    end_of_pagination_reached,
                    "Mediator load finished"
                );
                MediatorResult::Success {
                    end_of_pagination_reached,
                }
            }
            Err(error) => {
                MEDIATOR_LOADS_TOTAL
                    .with_label_values(&[load_type.as_str(), "error"])
                    .inc();
                tracing::error!(
                    owner = %self.username,
                    load_type = load_type.as_str(),
                    error = %error,
                    kind = error.kind().as_str(),
                    "Mediator load failed"
                );
                MediatorResult::Error(error)
            }
        }
    }

    async fn refresh(&self) -> Result<bool, AppError> {
        let page = match self.refresh_start {
            RefreshStart::FirstPage => 1,
            RefreshStart::LastLoadedPage => {
                let stored = self.db.get_remote_keys(&self.username).await?;
                match stored.and_then(|keys| keys.next_key) {
                    Some(next_key) => page_from_key(next_key - 1).unwrap_or(1),
                    None => 1,
                }
            }
        };

        tracing::info!(owner = %self.username, page, "Refreshing repositories");
        self.fetch_and_store(page, true).await
    }

    async fn append(&self) -> Result<bool, AppError> {
        let stored = self.db.get_remote_keys(&self.username).await?;
        let Some(next_key) = stored.and_then(|keys| keys.next_key) else {
            // No cursor yet, or the last page has been stored
            return Ok(true);
        };

        let page = page_from_key(next_key).ok_or_else(|| {
            AppError::Decode(format!(
                "invalid page cursor {} for {}",
                next_key, self.username
            ))
        })?;

        tracing::debug!(owner = %self.username, page, "Appending repositories");
        self.fetch_and_store(page, false).await
    }

    /// Fetch one page, then store it with its cursor in one transaction.
    async fn fetch_and_store(&self, page: u32, clear_existing: bool) -> Result<bool, AppError> {
        let response = self
            .api
            .get_repos(&self.username, page, self.page_size)
            .await?;

        let end_of_pagination_reached = response.len() < self.page_size as usize;
        let next_key = if end_of_pagination_reached {
            None
        } else {
            Some(i64::from(page) + 1)
        };

        let repos: Vec<GitHubRepo> = response
            .into_iter()
            .map(|repo| {
                let mut repo = repo.into_repo();
                // Rows are keyed by the requested owner so per-owner reads
                // and the refresh clear always agree
                repo.login = self.username.clone();
                repo
            })
            .collect();

        self.db
            .store_repo_page(&self.username, &repos, next_key, clear_existing)
            .await?;

        Ok(end_of_pagination_reached)
    }
}

/// Cache key for an owner
///
/// GitHub logins are case-insensitive but repo ids are global, so every
/// spelling of one owner must land on the same rows and cursor.
fn owner_key(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Page numbers start at 1
fn page_from_key(key: i64) -> Option<u32> {
    u32::try_from(key).ok().filter(|page| *page >= 1)
}
