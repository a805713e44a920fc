//! SQLite database operations
//!
//! All cache access goes through this module.
//! Every write bumps a per-table version so observers can re-query.

use futures::StreamExt;
use futures::stream::BoxStream;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::models::*;
use crate::error::AppError;

/// Cached tables, used to scope change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Emojis,
    GitHubUsers,
    GitHubRepos,
    RemoteKeys,
}

/// Per-table version counters
struct ChangeTracker {
    emojis: watch::Sender<u64>,
    users: watch::Sender<u64>,
    repos: watch::Sender<u64>,
    remote_keys: watch::Sender<u64>,
}

impl ChangeTracker {
    fn new() -> Self {
        Self {
            emojis: watch::channel(0).0,
            users: watch::channel(0).0,
            repos: watch::channel(0).0,
            remote_keys: watch::channel(0).0,
        }
    }

    fn sender(&self, table: Table) -> &watch::Sender<u64> {
        match table {
            Table::Emojis => &self.emojis,
            Table::GitHubUsers => &self.users,
            Table::GitHubRepos => &self.repos,
            Table::RemoteKeys => &self.remote_keys,
        }
    }

    fn notify(&self, table: Table) {
        self.sender(table).send_modify(|version| *version += 1);
    }

    fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.sender(table).subscribe()
    }
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
    changes: ChangeTracker,
}

async fn fetch_all_users(pool: &Pool<Sqlite>) -> Result<Vec<GitHubUser>, AppError> {
    let users = sqlx::query_as::<_, GitHubUser>(
        "SELECT login, id, avatar_url FROM github_users ORDER BY login ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

async fn fetch_all_emojis(pool: &Pool<Sqlite>) -> Result<Vec<Emoji>, AppError> {
    let emojis = sqlx::query_as::<_, Emoji>("SELECT name, url FROM emojis ORDER BY name ASC")
        .fetch_all(pool)
        .await?;

    Ok(emojis)
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
            }
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        // Schema is additive only: 0001 emojis .. 0005 repo positions
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self {
            pool,
            changes: ChangeTracker::new(),
        })
    }

    /// Subscribe to change notifications for one table.
    ///
    /// The receiver's value is a version counter that increases on every write.
    pub fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.changes.subscribe(table)
    }

    // =========================================================================
    // Emojis
    // =========================================================================

    /// Get the whole emoji catalog, ordered by name
    pub async fn get_all_emojis(&self) -> Result<Vec<Emoji>, AppError> {
        fetch_all_emojis(&self.pool).await
    }

    /// Number of cached emojis
    pub async fn count_emojis(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM emojis")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Insert emojis, replacing rows with the same name
    pub async fn insert_emojis(&self, emojis: &[Emoji]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for emoji in emojis {
            sqlx::query("INSERT OR REPLACE INTO emojis (name, url) VALUES (?, ?)")
                .bind(&emoji.name)
                .bind(&emoji.url)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.changes.notify(Table::Emojis);
        Ok(())
    }

    /// Replace the whole catalog atomically (delete then insert)
    pub async fn replace_emojis(&self, emojis: &[Emoji]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM emojis").execute(&mut *tx).await?;
        for emoji in emojis {
            sqlx::query("INSERT OR REPLACE INTO emojis (name, url) VALUES (?, ?)")
                .bind(&emoji.name)
                .bind(&emoji.url)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!(count = emojis.len(), "Emoji catalog replaced");
        self.changes.notify(Table::Emojis);
        Ok(())
    }

    /// Delete the whole catalog
    pub async fn delete_all_emojis(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM emojis")
            .execute(&self.pool)
            .await?;

        self.changes.notify(Table::Emojis);
        Ok(())
    }

    /// Observe the emoji catalog; emits now and after every change
    pub fn observe_emojis(&self) -> BoxStream<'static, Result<Vec<Emoji>, AppError>> {
        let pool = self.pool.clone();
        WatchStream::new(self.changes.subscribe(Table::Emojis))
            .then(move |_| {
                let pool = pool.clone();
                async move { fetch_all_emojis(&pool).await }
            })
            .boxed()
    }

    // =========================================================================
    // GitHub Users
    // =========================================================================

    /// Get a cached user by login
    ///
    /// GitHub logins are case-insensitive, so the lookup is too.
    pub async fn get_user_by_login(&self, login: &str) -> Result<Option<GitHubUser>, AppError> {
        let user = sqlx::query_as::<_, GitHubUser>(
            "SELECT login, id, avatar_url FROM github_users WHERE login = ? COLLATE NOCASE LIMIT 1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Insert or replace a user
    pub async fn upsert_user(&self, user: &GitHubUser) -> Result<(), AppError> {
        sqlx::query("INSERT OR REPLACE INTO github_users (login, id, avatar_url) VALUES (?, ?, ?)")
            .bind(&user.login)
            .bind(user.id)
            .bind(&user.avatar_url)
            .execute(&self.pool)
            .await?;

        self.changes.notify(Table::GitHubUsers);
        Ok(())
    }

    /// Delete a user by login
    ///
    /// # Returns
    /// `true` if a row was removed
    pub async fn delete_user(&self, login: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM github_users WHERE login = ?")
            .bind(login)
            .execute(&self.pool)
            .await?;

        self.changes.notify(Table::GitHubUsers);
        Ok(result.rows_affected() > 0)
    }

    /// All cached users, ordered by login
    pub async fn get_all_users(&self) -> Result<Vec<GitHubUser>, AppError> {
        fetch_all_users(&self.pool).await
    }

    /// Observe the cached users; emits now and after every change
    pub fn observe_users(&self) -> BoxStream<'static, Result<Vec<GitHubUser>, AppError>> {
        let pool = self.pool.clone();
        WatchStream::new(self.changes.subscribe(Table::GitHubUsers))
            .then(move |_| {
                let pool = pool.clone();
                async move { fetch_all_users(&pool).await }
            })
            .boxed()
    }

    // =========================================================================
    // GitHub Repositories
    // =========================================================================

    /// Insert repos after the owner's existing rows, replacing rows with the
    /// same id
    pub async fn insert_repos(&self, repos: &[GitHubRepo]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        insert_repos_tx(&mut tx, repos).await?;
        tx.commit().await?;

        self.changes.notify(Table::GitHubRepos);
        Ok(())
    }

    /// Delete every cached repo of one owner
    pub async fn delete_repos_by_owner(&self, login: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM github_repos WHERE login = ?")
            .bind(login)
            .execute(&self.pool)
            .await?;

        self.changes.notify(Table::GitHubRepos);
        Ok(result.rows_affected())
    }

    /// Read one slice of an owner's cached repos in upstream order
    pub async fn get_repos_by_owner(
        &self,
        login: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<GitHubRepo>, AppError> {
        let rows = sqlx::query_as::<_, RepoRow>(
            r#"
            SELECT id, full_name, private, owner, login
            FROM github_repos
            WHERE login = ?
            ORDER BY position ASC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(login)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GitHubRepo::try_from).collect()
    }

    /// Number of cached repos for one owner
    pub async fn count_repos_by_owner(&self, login: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM github_repos WHERE login = ?")
            .bind(login)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Persist one fetched page together with its cursor.
    ///
    /// When `clear_existing` is set the owner's rows and cursor are removed
    /// first. Everything happens in one transaction, so a failure leaves the
    /// previously stored pages untouched.
    pub async fn store_repo_page(
        &self,
        username: &str,
        repos: &[GitHubRepo],
        next_key: Option<i64>,
        clear_existing: bool,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if clear_existing {
            sqlx::query("DELETE FROM remote_keys WHERE username = ?")
                .bind(username)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM github_repos WHERE login = ?")
                .bind(username)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("INSERT OR REPLACE INTO remote_keys (username, next_key) VALUES (?, ?)")
            .bind(username)
            .bind(next_key)
            .execute(&mut *tx)
            .await?;

        insert_repos_tx(&mut tx, repos).await?;
        tx.commit().await?;

        self.changes.notify(Table::RemoteKeys);
        self.changes.notify(Table::GitHubRepos);
        Ok(())
    }

    // =========================================================================
    // Remote Keys
    // =========================================================================

    /// Pagination cursor for a username
    pub async fn get_remote_keys(&self, username: &str) -> Result<Option<RemoteKeys>, AppError> {
        let keys = sqlx::query_as::<_, RemoteKeys>(
            "SELECT username, next_key FROM remote_keys WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(keys)
    }

    /// Insert or replace pagination cursors
    pub async fn upsert_remote_keys(&self, keys: &[RemoteKeys]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for key in keys {
            sqlx::query("INSERT OR REPLACE INTO remote_keys (username, next_key) VALUES (?, ?)")
                .bind(&key.username)
                .bind(key.next_key)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.changes.notify(Table::RemoteKeys);
        Ok(())
    }

    /// Delete every pagination cursor
    pub async fn clear_remote_keys(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM remote_keys")
            .execute(&self.pool)
            .await?;

        self.changes.notify(Table::RemoteKeys);
        Ok(())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Global cache clear: empties all four tables in one transaction
    pub async fn clear_all(&self) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for table in ["emojis", "github_users", "github_repos", "remote_keys"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        for table in [
            Table::Emojis,
            Table::GitHubUsers,
            Table::GitHubRepos,
            Table::RemoteKeys,
        ] {
            self.changes.notify(table);
        }

        tracing::info!("Local cache cleared");
        Ok(())
    }
}

async fn insert_repos_tx(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    repos: &[GitHubRepo],
) -> Result<(), AppError> {
    for repo in repos {
        let owner = serde_json::to_string(&repo.owner)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO github_repos (id, full_name, private, owner, login, position)
            VALUES (?, ?, ?, ?, ?,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM github_repos WHERE login = ?))
            "#,
        )
        .bind(repo.id)
        .bind(&repo.full_name)
        .bind(repo.private)
        .bind(owner)
        .bind(&repo.login)
        .bind(&repo.login)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
