//! User search and avatar list state

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::error_message;
use crate::data::GitHubUser;
use crate::error::AppError;
use crate::service::UserService;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUiState {
    pub is_searching: bool,
    pub searched_user: Option<GitHubUser>,
    pub search_error: Option<String>,
    pub error: Option<String>,
    pub cached_users: Vec<GitHubUser>,
    /// Last deleted user, kept for undo
    pub recently_deleted: Option<GitHubUser>,
}

/// State holder for the user search and avatar list screens
///
/// Keeps `cached_users` in sync with the cache from a background task,
/// which is stopped when the presenter is dropped. Must be created inside
/// a tokio runtime.
pub struct UserPresenter {
    service: Arc<UserService>,
    state: Arc<watch::Sender<UserUiState>>,
    observer: JoinHandle<()>,
}

impl UserPresenter {
    pub fn new(service: Arc<UserService>) -> Self {
        let state = Arc::new(watch::channel(UserUiState::default()).0);

        let mut updates = service.observe_users();
        let observed = state.clone();
        let observer = tokio::spawn(async move {
            while let Some(result) = updates.next().await {
                match result {
                    Ok(users) => {
                        tracing::debug!(count = users.len(), "Cached users updated");
                        observed.send_modify(|s| s.cached_users = users);
                    }
                    Err(error) => {
                        tracing::error!(error = %error, "Failed to read cached users");
                        observed.send_modify(|s| s.error = Some(error_message(&error)));
                    }
                }
            }
        });

        Self {
            service,
            state,
            observer,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UserUiState> {
        self.state.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> UserUiState {
        self.state.borrow().clone()
    }

    /// Look a user up (cache first) and show it
    pub async fn search(&self, username: &str) {
        if username.trim().is_empty() {
            self.state.send_modify(|s| {
                s.searched_user = None;
                s.error = None;
                s.search_error = Some("Username cannot be empty".to_string());
            });
            return;
        }

        self.state.send_modify(|s| {
            s.is_searching = true;
            s.searched_user = None;
            s.search_error = None;
            s.error = None;
        });

        let result = self.service.get_user(username).await;
        self.state.send_modify(|s| {
            s.is_searching = false;
            match result {
                Ok(user) => {
                    tracing::debug!(login = %user.login, "Searched user");
                    s.searched_user = Some(user);
                }
                Err(error) => {
                    let message = match &error {
                        AppError::NotFound(_) => "User not found".to_string(),
                        AppError::Validation(message) => message.clone(),
                        _ => "Failed to fetch user".to_string(),
                    };
                    tracing::warn!(username, error = %error, "User search failed");
                    s.search_error = Some(message);
                }
            }
        });
    }

    /// Remove a user from the cache, remembering it for [`Self::undo_delete`]
    pub async fn delete_user(&self, user: &GitHubUser) {
        match self.service.delete_user(user).await {
            Ok(_) => {
                tracing::debug!(login = %user.login, "GitHub user deleted");
                self.state
                    .send_modify(|s| s.recently_deleted = Some(user.clone()));
            }
            Err(error) => self.report(&error),
        }
    }

    /// Restore the last deleted user; no-op when nothing was deleted
    pub async fn undo_delete(&self) {
        let Some(user) = self.state.borrow().recently_deleted.clone() else {
            return;
        };

        match self.service.add_user(&user).await {
            Ok(()) => {
                tracing::debug!(login = %user.login, "GitHub user re-added");
                self.state.send_modify(|s| s.recently_deleted = None);
            }
            Err(error) => self.report(&error),
        }
    }

    /// Insert a user into the cache
    pub async fn add_user(&self, user: &GitHubUser) {
        if let Err(error) = self.service.add_user(user).await {
            self.report(&error);
        }
    }

    fn report(&self, error: &AppError) {
        tracing::error!(error = %error, "User cache update failed");
        self.state.send_modify(|s| s.error = Some(error_message(error)));
    }
}

impl Drop for UserPresenter {
    fn drop(&mut self) {
        self.observer.abort();
    }
}
