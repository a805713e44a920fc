//! GitHub user service
//!
//! Cache-or-fetch lookup of single users, plus the delete / undo pair the
//! avatar list uses.

use futures::stream::BoxStream;
use std::sync::Arc;

use crate::data::{Database, GitHubUser};
use crate::error::AppError;
use crate::github::GitHubApi;
use crate::metrics;

/// User service
pub struct UserService {
    db: Arc<Database>,
    api: Arc<dyn GitHubApi>,
}

impl UserService {
    /// Create new user service
    pub fn new(db: Arc<Database>, api: Arc<dyn GitHubApi>) -> Self {
        Self { db, api }
    }

    /// Look up a user, from the cache when present
    ///
    /// # Errors
    /// - `Validation` for a blank username or a `.` / `..` path segment
    /// - `NotFound` when GitHub has no such user
    /// - network / storage errors otherwise; nothing is cached on failure
    pub async fn get_user(&self, username: &str) -> Result<GitHubUser, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("Username cannot be empty".to_string()));
        }
        // Would resolve to another API path once joined onto the base URL
        if username == "." || username == ".." {
            return Err(AppError::Validation(format!("Invalid username: {}", username)));
        }

        if let Some(user) = self.db.get_user_by_login(username).await? {
            metrics::observe_cache_lookup("users", true);
            tracing::debug!(login = %user.login, "User served from cache");
            return Ok(user);
        }

        metrics::observe_cache_lookup("users", false);
        let user = self.api.get_user(username).await.inspect_err(|e| {
            tracing::warn!(username, error = %e, "Failed to fetch user");
        })?;
        self.db.upsert_user(&user).await?;

        tracing::info!(login = %user.login, id = user.id, "User cached");
        Ok(user)
    }

    /// Remove a user from the cache
    ///
    /// # Returns
    /// `true` if the user was cached
    pub async fn delete_user(&self, user: &GitHubUser) -> Result<bool, AppError> {
        let removed = self.db.delete_user(&user.login).await?;
        tracing::debug!(login = %user.login, removed, "User deleted from cache");
        Ok(removed)
    }

    /// Insert (or restore) a user in the cache
    pub async fn add_user(&self, user: &GitHubUser) -> Result<(), AppError> {
        self.db.upsert_user(user).await?;
        tracing::debug!(login = %user.login, "User added to cache");
        Ok(())
    }

    /// Stream of all cached users, re-emitted after every change
    pub fn observe_users(&self) -> BoxStream<'static, Result<Vec<GitHubUser>, AppError>> {
        self.db.observe_users()
    }

    /// Snapshot of all cached users
    pub async fn cached_users(&self) -> Result<Vec<GitHubUser>, AppError> {
        self.db.get_all_users().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::TempDir;

    use crate::github::MockGitHubApi;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-user.db");
        let db = Database::connect(&db_path).await.unwrap();
        (Arc::new(db), temp_dir)
    }

    fn octocat() -> GitHubUser {
        GitHubUser {
            login: "octocat".to_string(),
            id: 583231,
            avatar_url: "https://avatars.githubusercontent.com/u/583231".to_string(),
        }
    }

    #[tokio::test]
    async fn miss_fetches_and_caches() {
        let (db, _temp_dir) = create_test_db().await;
        let mut api = MockGitHubApi::new();
        api.expect_get_user()
            .withf(|name| name == "octocat")
            .times(1)
            .returning(|_| Ok(octocat()));

        let service = UserService::new(db.clone(), Arc::new(api));
        assert_eq!(service.get_user("octocat").await.unwrap(), octocat());
        assert_eq!(db.get_user_by_login("octocat").await.unwrap(), Some(octocat()));
    }

    #[tokio::test]
    async fn hit_skips_remote_regardless_of_case() {
        let (db, _temp_dir) = create_test_db().await;
        db.upsert_user(&octocat()).await.unwrap();

        let mut api = MockGitHubApi::new();
        api.expect_get_user().times(0);

        let service = UserService::new(db, Arc::new(api));
        assert_eq!(service.get_user("octocat").await.unwrap(), octocat());
        assert_eq!(service.get_user("OctoCat").await.unwrap(), octocat());
    }

    #[tokio::test]
    async fn blank_username_is_rejected_without_lookup() {
        let (db, _temp_dir) = create_test_db().await;
        let mut api = MockGitHubApi::new();
        api.expect_get_user().times(0);

        let service = UserService::new(db, Arc::new(api));
        let error = service.get_user("   ").await.unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn dot_segments_are_rejected_without_lookup() {
        let (db, _temp_dir) = create_test_db().await;
        let mut api = MockGitHubApi::new();
        api.expect_get_user().times(0);
        let service = UserService::new(db, Arc::new(api));

        for name in [".", "..", " .. "] {
            let error = service.get_user(name).await.unwrap_err();
            assert!(matches!(error, AppError::Validation(_)), "{name}: {error:?}");
        }
    }

    #[tokio::test]
    async fn not_found_caches_nothing() {
        let (db, _temp_dir) = create_test_db().await;
        let mut api = MockGitHubApi::new();
        api.expect_get_user()
            .returning(|name| Err(AppError::NotFound(format!("users/{}", name))));

        let service = UserService::new(db.clone(), Arc::new(api));
        let error = service.get_user("ghost").await.unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));
        assert!(service.cached_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_then_undo_is_observed() {
        let (db, _temp_dir) = create_test_db().await;
        let service = UserService::new(db, Arc::new(MockGitHubApi::new()));
        service.add_user(&octocat()).await.unwrap();

        let mut users = service.observe_users();
        assert_eq!(users.next().await.unwrap().unwrap(), vec![octocat()]);

        assert!(service.delete_user(&octocat()).await.unwrap());
        assert!(users.next().await.unwrap().unwrap().is_empty());

        service.add_user(&octocat()).await.unwrap();
        assert_eq!(users.next().await.unwrap().unwrap(), vec![octocat()]);
    }

    #[tokio::test]
    async fn deleting_unknown_user_reports_false() {
        let (db, _temp_dir) = create_test_db().await;
        let service = UserService::new(db, Arc::new(MockGitHubApi::new()));
        assert!(!service.delete_user(&octocat()).await.unwrap());
    }
}
