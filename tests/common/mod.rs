//! Common test utilities for E2E tests
//!
//! Runs a fake GitHub REST API on an ephemeral port and points a full
//! `AppState` (real reqwest client, real SQLite file) at it.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use emojiapp::{AppState, config};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// In-memory GitHub with request counters
#[derive(Default)]
pub struct FakeGitHub {
    emojis: Mutex<BTreeMap<String, String>>,
    users: Mutex<HashMap<String, Value>>,
    repos: Mutex<HashMap<String, Vec<Value>>>,
    /// When set, every endpoint answers with this status
    fail_with: Mutex<Option<u16>>,
    last_headers: Mutex<Option<HeaderMap>>,
    emoji_hits: AtomicUsize,
    user_hits: AtomicUsize,
    repo_hits: AtomicUsize,
}

impl FakeGitHub {
    pub fn set_emojis(&self, emojis: &[(&str, &str)]) {
        *self.emojis.lock().unwrap() = emojis
            .iter()
            .map(|(name, url)| (name.to_string(), url.to_string()))
            .collect();
    }

    pub fn add_user(&self, login: &str, id: i64) {
        self.users.lock().unwrap().insert(
            login.to_lowercase(),
            json!({
                "login": login,
                "id": id,
                "avatar_url": format!("https://avatars.example.com/u/{}", id),
                "type": "User",
                "site_admin": false,
            }),
        );
    }

    /// Give `owner` repositories with ids `1..=count`
    pub fn set_repos(&self, owner: &str, count: i64) {
        let ids: Vec<i64> = (1..=count).collect();
        self.set_repo_ids(owner, &ids);
    }

    /// Give `owner` repositories served in the given id order
    ///
    /// Names follow list position, matching GitHub's default `full_name`
    /// sort, so the ids need not be ordered.
    pub fn set_repo_ids(&self, owner: &str, ids: &[i64]) {
        let repos = ids
            .iter()
            .enumerate()
            .map(|(position, &id)| {
                json!({
                    "id": id,
                    "name": format!("repo-{:03}", position + 1),
                    "full_name": format!("{}/repo-{:03}", owner, position + 1),
                    "private": id % 5 == 0,
                    "owner": {
                        "login": owner,
                        "avatar_url": format!("https://avatars.example.com/{}", owner),
                    },
                    "stargazers_count": id * 10,
                })
            })
            .collect();
        self.repos
            .lock()
            .unwrap()
            .insert(owner.to_lowercase(), repos);
    }

    pub fn fail_with(&self, status: Option<u16>) {
        *self.fail_with.lock().unwrap() = status;
    }

    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.last_headers.lock().unwrap().clone()
    }

    pub fn emoji_requests(&self) -> usize {
        self.emoji_hits.load(Ordering::SeqCst)
    }

    pub fn user_requests(&self) -> usize {
        self.user_hits.load(Ordering::SeqCst)
    }

    pub fn repo_requests(&self) -> usize {
        self.repo_hits.load(Ordering::SeqCst)
    }

    fn check(&self, headers: HeaderMap) -> Result<(), Response> {
        *self.last_headers.lock().unwrap() = Some(headers);
        match *self.fail_with.lock().unwrap() {
            Some(code) => {
                let status =
                    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Err((status, Json(json!({ "message": "Server Error" }))).into_response())
            }
            None => Ok(()),
        }
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Not Found" })),
    )
        .into_response()
}

async fn emojis(State(github): State<Arc<FakeGitHub>>, headers: HeaderMap) -> Response {
    github.emoji_hits.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = github.check(headers) {
        return response;
    }
    Json(github.emojis.lock().unwrap().clone()).into_response()
}

async fn user(
    State(github): State<Arc<FakeGitHub>>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Response {
    github.user_hits.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = github.check(headers) {
        return response;
    }
    match github.users.lock().unwrap().get(&username.to_lowercase()) {
        Some(user) => Json(user.clone()).into_response(),
        None => not_found(),
    }
}

#[derive(Deserialize)]
struct RepoQuery {
    page: usize,
    per_page: usize,
}

async fn repos(
    State(github): State<Arc<FakeGitHub>>,
    Path(username): Path<String>,
    Query(query): Query<RepoQuery>,
    headers: HeaderMap,
) -> Response {
    github.repo_hits.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = github.check(headers) {
        return response;
    }
    let all = github.repos.lock().unwrap();
    let Some(repos) = all.get(&username.to_lowercase()) else {
        return not_found();
    };

    let page: Vec<Value> = repos
        .iter()
        .skip(query.page.saturating_sub(1) * query.per_page)
        .take(query.per_page)
        .cloned()
        .collect();
    Json(page).into_response()
}

/// Application wired to a fake GitHub
pub struct TestApp {
    pub state: AppState,
    pub github: Arc<FakeGitHub>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Create a new test app with a page size of 2
    pub async fn new() -> Self {
        Self::with_paging(2, config::RefreshStart::FirstPage, None).await
    }

    pub async fn with_paging(
        page_size: u32,
        refresh_start: config::RefreshStart,
        token: Option<&str>,
    ) -> Self {
        let github = Arc::new(FakeGitHub::default());

        let app = Router::new()
            .route("/emojis", get(emojis))
            .route("/users/:username", get(user))
            .route("/users/:username/repos", get(repos))
            .with_state(github.clone());

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let temp_dir = TempDir::new().unwrap();
        let config = config::AppConfig {
            github: config::GitHubConfig {
                base_url: format!("http://{}/", addr),
                user_agent: "emojiapp-e2e".to_string(),
                timeout_seconds: 5,
                token: token.map(str::to_string),
            },
            database: config::DatabaseConfig {
                path: temp_dir.path().join("e2e.db"),
            },
            paging: config::PagingConfig {
                page_size,
                default_owner: "google".to_string(),
                refresh_start,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        let state = AppState::new(config).await.unwrap();

        Self {
            state,
            github,
            _temp_dir: temp_dir,
        }
    }
}
