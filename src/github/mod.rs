//! GitHub REST API access
//!
//! The services talk to GitHub through the [`GitHubApi`] trait so they can
//! be exercised against mocks; [`GitHubClient`] is the reqwest-backed
//! implementation.

mod client;

pub use client::GitHubClient;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::data::{GitHubRepo, GitHubUser, Owner};
use crate::error::AppError;

/// Repository record as returned by `GET /users/{username}/repos`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoResponse {
    pub id: i64,
    pub full_name: String,
    pub private: bool,
    pub owner: Owner,
}

impl RepoResponse {
    /// Convert to the cached form, denormalizing the owner login
    pub fn into_repo(self) -> GitHubRepo {
        GitHubRepo {
            login: self.owner.login.clone(),
            id: self.id,
            full_name: self.full_name,
            private: self.private,
            owner: self.owner,
        }
    }
}

/// Remote data source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// `GET /emojis`: emoji name to image URL
    async fn fetch_emojis(&self) -> Result<BTreeMap<String, String>, AppError>;

    /// `GET /users/{username}`
    async fn get_user(&self, username: &str) -> Result<GitHubUser, AppError>;

    /// `GET /users/{username}/repos?page=&per_page=`
    async fn get_repos(
        &self,
        username: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepoResponse>, AppError>;
}
