//! reqwest-backed GitHub client

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use url::Url;

use super::{GitHubApi, RepoResponse};
use crate::config::GitHubConfig;
use crate::data::GitHubUser;
use crate::error::AppError;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// HTTP client for the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GitHubClient {
    /// Build a client from configuration
    ///
    /// # Errors
    /// Returns error if the base URL or token is malformed, or the TLS
    /// backend cannot be initialized
    pub fn new(config: &GitHubConfig) -> Result<Self, AppError> {
        // Url::join drops the last segment unless the base ends with '/'
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| AppError::Config(format!("invalid github.base_url: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        if let Some(token) = config.token.as_deref().filter(|t| !t.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| AppError::Config(format!("invalid github.token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid endpoint {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, label: &str, url: Url) -> Result<T, AppError> {
        let started = Instant::now();
        tracing::debug!(endpoint = label, url = %url, "GitHub request");

        let response = match self.http.get(url.clone()).send().await {
            Ok(response) => response,
            Err(error) => {
                crate::metrics::observe_remote_request(label, "error", started.elapsed());
                tracing::warn!(endpoint = label, %error, "GitHub request failed");
                return Err(error.into());
            }
        };

        let status = response.status();
        crate::metrics::observe_remote_request(label, status.as_str(), started.elapsed());

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            tracing::warn!(endpoint = label, status = status.as_u16(), "GitHub returned an error status");
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn fetch_emojis(&self) -> Result<BTreeMap<String, String>, AppError> {
        let url = self.endpoint("emojis")?;
        self.get_json("emojis", url).await
    }

    async fn get_user(&self, username: &str) -> Result<GitHubUser, AppError> {
        let url = self.endpoint(&format!("users/{}", urlencoding::encode(username)))?;
        self.get_json("user", url).await
    }

    async fn get_repos(
        &self,
        username: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepoResponse>, AppError> {
        let mut url = self.endpoint(&format!("users/{}/repos", urlencoding::encode(username)))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());
        self.get_json("repos", url).await
    }
}
