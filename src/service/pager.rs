//! Paging source over the cached repository list
//!
//! Reads `page_size` rows at a time from `github_repos` and asks the
//! [`RepoRemoteMediator`] for more whenever the cache runs short.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::mediator::{LoadType, RepoRemoteMediator};
use crate::data::{Database, GitHubRepo};
use crate::error::AppError;

/// Items loaded so far plus whether more can follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPage {
    pub items: Vec<GitHubRepo>,
    pub end_of_pagination_reached: bool,
}

#[derive(Debug, Default)]
struct PagerCursor {
    /// Cached rows already handed out
    offset: i64,
    /// Upstream reported the last page
    remote_exhausted: bool,
}

/// Pager for one owner
///
/// Only one load runs at a time; concurrent callers wait on the cursor lock.
pub struct RepoPager {
    db: Arc<Database>,
    mediator: RepoRemoteMediator,
    cursor: Mutex<PagerCursor>,
}

impl RepoPager {
    pub fn new(db: Arc<Database>, mediator: RepoRemoteMediator) -> Self {
        Self {
            db,
            mediator,
            cursor: Mutex::new(PagerCursor::default()),
        }
    }

    pub fn owner(&self) -> &str {
        self.mediator.username()
    }

    /// Reload from upstream and return the first page of cached rows
    ///
    /// # Errors
    /// The mediator's error; the cursor is left as it was
    pub async fn refresh(&self) -> Result<RepoPage, AppError> {
        let mut cursor = self.cursor.lock().await;

        let remote_exhausted = self.mediator.load(LoadType::Refresh).await.into_result()?;
        let items = self
            .db
            .get_repos_by_owner(self.owner(), self.page_size(), 0)
            .await?;

        cursor.remote_exhausted = remote_exhausted;
        cursor.offset = items.len() as i64;
        self.page(&cursor, items).await
    }

    /// Return the next page of cached rows, appending from upstream first
    /// when the cache cannot fill it
    pub async fn load_more(&self) -> Result<RepoPage, AppError> {
        let mut cursor = self.cursor.lock().await;

        let mut items = self
            .db
            .get_repos_by_owner(self.owner(), self.page_size(), cursor.offset)
            .await?;

        if (items.len() as i64) < self.page_size() && !cursor.remote_exhausted {
            cursor.remote_exhausted = self.mediator.load(LoadType::Append).await.into_result()?;
            items = self
                .db
                .get_repos_by_owner(self.owner(), self.page_size(), cursor.offset)
                .await?;
        }

        cursor.offset += items.len() as i64;
        self.page(&cursor, items).await
    }

    fn page_size(&self) -> i64 {
        i64::from(self.mediator.page_size())
    }

    async fn page(&self, cursor: &PagerCursor, items: Vec<GitHubRepo>) -> Result<RepoPage, AppError> {
        let cached = self.db.count_repos_by_owner(self.owner()).await?;
        Ok(RepoPage {
            items,
            end_of_pagination_reached: cursor.remote_exhausted && cursor.offset >= cached,
        })
    }
}
