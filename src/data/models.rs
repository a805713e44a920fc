//! Data models
//!
//! Rust structs representing cached entities. The same types are
//! decoded from the GitHub API and stored in SQLite.

use serde::{Deserialize, Serialize};

// =============================================================================
// Emoji
// =============================================================================

/// One entry of the GitHub emoji catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Emoji {
    /// Short name (e.g. "+1"), unique
    pub name: String,
    /// Image URL
    pub url: String,
}

impl Emoji {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

// =============================================================================
// GitHub User
// =============================================================================

/// A looked-up GitHub user (avatar list entry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GitHubUser {
    /// GitHub username, unique
    pub login: String,
    pub id: i64,
    pub avatar_url: String,
}

// =============================================================================
// GitHub Repository
// =============================================================================

/// Repository owner as returned inside a repo record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    pub avatar_url: String,
}

/// A cached repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub id: i64,
    pub full_name: String,
    pub private: bool,
    pub owner: Owner,
    /// Owner login, denormalized for per-owner queries
    pub login: String,
}

/// Raw `github_repos` row; `owner` holds JSON text
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RepoRow {
    pub id: i64,
    pub full_name: String,
    pub private: bool,
    pub owner: String,
    pub login: String,
}

impl TryFrom<RepoRow> for GitHubRepo {
    type Error = crate::error::AppError;

    fn try_from(row: RepoRow) -> Result<Self, Self::Error> {
        let owner: Owner = serde_json::from_str(&row.owner)?;
        Ok(Self {
            id: row.id,
            full_name: row.full_name,
            private: row.private,
            owner,
            login: row.login,
        })
    }
}

// =============================================================================
// Remote Keys (pagination cursor)
// =============================================================================

/// Next page to fetch for one paginated username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RemoteKeys {
    pub username: String,
    /// `None` once the last page has been stored
    pub next_key: Option<i64>,
}
