//! Paged repository list state

use tokio::sync::watch;

use super::error_message;
use crate::data::GitHubRepo;
use crate::service::{RepoPage, RepoPager};

/// State of one load direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoading { end_of_pagination_reached: bool },
    Loading,
    Error(String),
}

impl LoadState {
    pub fn is_end(&self) -> bool {
        matches!(
            self,
            LoadState::NotLoading {
                end_of_pagination_reached: true
            }
        )
    }
}

impl Default for LoadState {
    fn default() -> Self {
        LoadState::NotLoading {
            end_of_pagination_reached: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoUiState {
    pub owner: String,
    pub repos: Vec<GitHubRepo>,
    pub refresh: LoadState,
    pub append: LoadState,
}

/// State holder for one owner's repository list
pub struct RepoPresenter {
    pager: RepoPager,
    state: watch::Sender<RepoUiState>,
}

impl RepoPresenter {
    pub fn new(pager: RepoPager) -> Self {
        let initial = RepoUiState {
            owner: pager.owner().to_string(),
            ..RepoUiState::default()
        };
        Self {
            pager,
            state: watch::channel(initial).0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RepoUiState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RepoUiState {
        self.state.borrow().clone()
    }

    /// Reload the list from the first page
    ///
    /// On failure the repos already shown stay in place.
    pub async fn refresh(&self) {
        self.state.send_modify(|s| s.refresh = LoadState::Loading);

        let result = self.pager.refresh().await;
        self.state.send_modify(|s| match result {
            Ok(RepoPage {
                items,
                end_of_pagination_reached,
            }) => {
                s.repos = items;
                s.refresh = LoadState::NotLoading {
                    end_of_pagination_reached,
                };
                s.append = LoadState::NotLoading {
                    end_of_pagination_reached,
                };
            }
            Err(error) => {
                tracing::error!(owner = %s.owner, error = %error, "Repository refresh failed");
                s.refresh = LoadState::Error(error_message(&error));
            }
        });
    }

    /// Load the next page; no-op once the end has been reached
    pub async fn load_more(&self) {
        if self.state.borrow().append.is_end() {
            return;
        }

        self.state.send_modify(|s| s.append = LoadState::Loading);

        let result = self.pager.load_more().await;
        self.state.send_modify(|s| match result {
            Ok(RepoPage {
                items,
                end_of_pagination_reached,
            }) => {
                s.repos.extend(items);
                s.append = LoadState::NotLoading {
                    end_of_pagination_reached,
                };
            }
            Err(error) => {
                tracing::error!(owner = %s.owner, error = %error, "Loading more repositories failed");
                s.append = LoadState::Error(error_message(&error));
            }
        });
    }

    /// Re-run whichever load last failed
    pub async fn retry(&self) {
        let (refresh_failed, append_failed) = {
            let state = self.state.borrow();
            (
                matches!(state.refresh, LoadState::Error(_)),
                matches!(state.append, LoadState::Error(_)),
            )
        };

        if refresh_failed {
            self.refresh().await;
        } else if append_failed {
            self.load_more().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    use crate::config::RefreshStart;
    use crate::data::{Database, Owner};
    use crate::error::AppError;
    use crate::github::{MockGitHubApi, RepoResponse};
    use crate::service::RepoRemoteMediator;

    /// Upstream with `total` repos; fails while `failing` is set
    fn upstream(total: i64, failing: Arc<AtomicBool>) -> MockGitHubApi {
        let mut api = MockGitHubApi::new();
        api.expect_get_repos().returning(move |owner, page, per_page| {
            if failing.load(Ordering::SeqCst) {
                return Err(AppError::UpstreamStatus {
                    status: 500,
                    url: format!("https://api.github.com/users/{}/repos", owner),
                });
            }
            let start = i64::from(page - 1) * i64::from(per_page) + 1;
            let end = (start + i64::from(per_page) - 1).min(total);
            Ok((start..=end)
                .map(|id| RepoResponse {
                    id,
                    full_name: format!("{}/repo-{}", owner, id),
                    private: false,
                    owner: Owner {
                        login: owner.to_string(),
                        avatar_url: String::new(),
                    },
                })
                .collect())
        });
        api
    }

    async fn presenter(api: MockGitHubApi) -> (RepoPresenter, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("presenter-repo.db"))
                .await
                .unwrap(),
        );
        let mediator =
            RepoRemoteMediator::new(db.clone(), Arc::new(api), "google", 2, RefreshStart::FirstPage);
        (RepoPresenter::new(RepoPager::new(db, mediator)), temp_dir)
    }

    fn ids(state: &RepoUiState) -> Vec<i64> {
        state.repos.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn refresh_then_load_until_end() {
        let (presenter, _temp_dir) = presenter(upstream(3, Arc::default())).await;
        assert_eq!(presenter.state().owner, "google");

        presenter.refresh().await;
        let state = presenter.state();
        assert_eq!(ids(&state), vec![1, 2]);
        assert_eq!(state.refresh, LoadState::default());

        presenter.load_more().await;
        let state = presenter.state();
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert!(state.append.is_end());

        // Further loads are ignored
        presenter.load_more().await;
        assert_eq!(ids(&presenter.state()), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn list_follows_upstream_order() {
        let pages = vec![vec![100, 5], vec![50, 200]];
        let mut api = MockGitHubApi::new();
        api.expect_get_repos().returning(move |owner, page, _| {
            let ids = pages.get(page as usize - 1).cloned().unwrap_or_default();
            Ok(ids
                .into_iter()
                .map(|id| RepoResponse {
                    id,
                    full_name: format!("{}/repo-{}", owner, id),
                    private: false,
                    owner: Owner {
                        login: owner.to_string(),
                        avatar_url: String::new(),
                    },
                })
                .collect())
        });
        let (presenter, _temp_dir) = presenter(api).await;

        presenter.refresh().await;
        presenter.load_more().await;
        presenter.load_more().await;

        let state = presenter.state();
        assert_eq!(ids(&state), vec![100, 5, 50, 200]);
        assert!(state.append.is_end());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_shown_repos_and_retries() {
        let failing = Arc::new(AtomicBool::new(false));
        let (presenter, _temp_dir) = presenter(upstream(5, failing.clone())).await;

        presenter.refresh().await;
        failing.store(true, Ordering::SeqCst);
        presenter.refresh().await;

        let state = presenter.state();
        assert_eq!(ids(&state), vec![1, 2]);
        assert!(matches!(state.refresh, LoadState::Error(ref message) if message.contains("500")));

        failing.store(false, Ordering::SeqCst);
        presenter.retry().await;
        assert_eq!(presenter.state().refresh, LoadState::default());
    }

    #[tokio::test]
    async fn failed_append_is_retried() {
        let failing = Arc::new(AtomicBool::new(false));
        let (presenter, _temp_dir) = presenter(upstream(5, failing.clone())).await;

        presenter.refresh().await;
        failing.store(true, Ordering::SeqCst);
        presenter.load_more().await;
        assert!(matches!(presenter.state().append, LoadState::Error(_)));
        assert_eq!(ids(&presenter.state()), vec![1, 2]);

        failing.store(false, Ordering::SeqCst);
        presenter.retry().await;
        let state = presenter.state();
        assert_eq!(ids(&state), vec![1, 2, 3, 4]);
        assert_eq!(state.append, LoadState::default());
    }
}
