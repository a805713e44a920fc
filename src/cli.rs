//! Command-line front-end
//!
//! Parses arguments with clap and drives the presenters, printing their
//! state as plain text.

use clap::{Parser, Subcommand};
use std::fmt::Write;
use std::path::PathBuf;

use crate::AppState;
use crate::presentation::LoadState;

#[derive(Parser, Debug)]
#[command(
    name = "emojiapp",
    version,
    about = "Browse GitHub emojis, users and repositories through a local cache"
)]
pub struct Cli {
    /// Extra configuration file, layered over config/default and config/local
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print Prometheus metrics after the command
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List the emoji catalog
    Emojis {
        /// Fetch the catalog again instead of using the cache
        #[arg(long)]
        refresh: bool,

        /// Show at most N emojis
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Show a random emoji
    Random,

    /// Look up a GitHub user and cache it
    User { username: String },

    /// List cached users
    Users,

    /// Remove a user from the cache
    DeleteUser { login: String },

    /// List an owner's repositories
    Repos {
        /// Repository owner (defaults to paging.default_owner)
        owner: Option<String>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Reload from GitHub instead of reading the cache first
        #[arg(long)]
        refresh: bool,
    },

    /// Empty the local cache
    ClearCache,
}

/// Run one command and return the text to print
///
/// # Errors
/// Any error the command's presenter reported, as its display message
pub async fn execute(state: &AppState, command: Commands) -> anyhow::Result<String> {
    let mut out = String::new();

    match command {
        Commands::Emojis { refresh, limit } => {
            let presenter = state.emoji_presenter();
            if refresh {
                presenter.refresh().await;
            } else {
                presenter.fetch_emojis().await;
            }

            let ui = presenter.state();
            if let Some(error) = ui.error {
                anyhow::bail!(error);
            }
            for emoji in ui.emojis.iter().take(limit.unwrap_or(usize::MAX)) {
                writeln!(out, ":{}: {}", emoji.name, emoji.url)?;
            }
        }

        Commands::Random => {
            let presenter = state.emoji_presenter();
            presenter.random_emoji().await;

            let ui = presenter.state();
            match (ui.selected_emoji, ui.error) {
                (_, Some(error)) => anyhow::bail!(error),
                (Some(emoji), None) => writeln!(out, ":{}: {}", emoji.name, emoji.url)?,
                (None, None) => anyhow::bail!(crate::presentation::UNEXPECTED_ERROR),
            }
        }

        Commands::User { username } => {
            let presenter = state.user_presenter();
            presenter.search(&username).await;

            let ui = presenter.state();
            if let Some(error) = ui.search_error {
                anyhow::bail!(error);
            }
            if let Some(user) = ui.searched_user {
                writeln!(out, "{} (id {}) {}", user.login, user.id, user.avatar_url)?;
            }
        }

        Commands::Users => {
            let users = state.user_service().cached_users().await?;
            if users.is_empty() {
                writeln!(out, "No cached users")?;
            }
            for user in users {
                writeln!(out, "{} (id {})", user.login, user.id)?;
            }
        }

        Commands::DeleteUser { login } => {
            let service = state.user_service();
            let user = service
                .cached_users()
                .await?
                .into_iter()
                .find(|u| u.login.eq_ignore_ascii_case(login.trim()))
                .ok_or_else(|| anyhow::anyhow!("User {} is not cached", login))?;

            let presenter = state.user_presenter();
            presenter.delete_user(&user).await;
            if let Some(error) = presenter.state().error {
                anyhow::bail!(error);
            }
            writeln!(out, "Deleted {}", user.login)?;
        }

        Commands::Repos {
            owner,
            pages,
            refresh,
        } => {
            let presenter = state.repo_presenter(owner.as_deref());
            let owner = presenter.state().owner;

            let mut remaining = pages.max(1);
            if refresh || state.db.count_repos_by_owner(&owner).await? == 0 {
                presenter.refresh().await;
                if let LoadState::Error(error) = presenter.state().refresh {
                    anyhow::bail!(error);
                }
                remaining -= 1;
            }

            for _ in 0..remaining {
                if presenter.state().append.is_end() {
                    break;
                }
                presenter.load_more().await;
                if let LoadState::Error(error) = presenter.state().append {
                    anyhow::bail!(error);
                }
            }

            let ui = presenter.state();
            for repo in &ui.repos {
                let visibility = if repo.private { " [private]" } else { "" };
                writeln!(out, "{}{}", repo.full_name, visibility)?;
            }
            if ui.append.is_end() {
                writeln!(out, "({} repositories, end of list)", ui.repos.len())?;
            }
        }

        Commands::ClearCache => {
            state.clear_cache().await?;
            writeln!(out, "Cache cleared")?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::data::GitHubUser;
    use crate::error::AppError;
    use crate::github::MockGitHubApi;

    async fn state(api: MockGitHubApi) -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = crate::config::tests::valid_config();
        config.database.path = temp_dir.path().join("cli.db");
        let state = AppState::with_api(config, Arc::new(api)).await.unwrap();
        (state, temp_dir)
    }

    #[test]
    fn parses_repos_command() {
        let cli = Cli::try_parse_from(["emojiapp", "repos", "rust-lang", "--pages", "3"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Repos {
                owner: Some("rust-lang".to_string()),
                pages: 3,
                refresh: false,
            }
        );
        assert!(!cli.metrics);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["emojiapp", "emojis", "--limit", "5", "--metrics", "--config", "x.toml"])
                .unwrap();
        assert!(cli.metrics);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert_eq!(
            cli.command,
            Commands::Emojis {
                refresh: false,
                limit: Some(5)
            }
        );
    }

    #[test]
    fn user_requires_username() {
        assert!(Cli::try_parse_from(["emojiapp", "user"]).is_err());
    }

    #[tokio::test]
    async fn emojis_respects_limit() {
        let mut api = MockGitHubApi::new();
        api.expect_fetch_emojis().returning(|| {
            Ok(BTreeMap::from([
                ("+1".to_string(), "https://e/plus1.png".to_string()),
                ("tada".to_string(), "https://e/tada.png".to_string()),
            ]))
        });
        let (state, _temp_dir) = state(api).await;

        let out = execute(
            &state,
            Commands::Emojis {
                refresh: false,
                limit: Some(1),
            },
        )
        .await
        .unwrap();
        assert_eq!(out, ":+1: https://e/plus1.png\n");
    }

    #[tokio::test]
    async fn unknown_user_is_an_error() {
        let mut api = MockGitHubApi::new();
        api.expect_get_user()
            .returning(|_| Err(AppError::NotFound("users/ghost".to_string())));
        let (state, _temp_dir) = state(api).await;

        let error = execute(
            &state,
            Commands::User {
                username: "ghost".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(error.to_string(), "User not found");
    }

    #[tokio::test]
    async fn delete_user_matches_login_case_insensitively() {
        let (state, _temp_dir) = state(MockGitHubApi::new()).await;
        state
            .user_service()
            .add_user(&GitHubUser {
                login: "octocat".to_string(),
                id: 1,
                avatar_url: String::new(),
            })
            .await
            .unwrap();

        let out = execute(
            &state,
            Commands::DeleteUser {
                login: "OctoCat".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "Deleted octocat\n");

        let out = execute(&state, Commands::Users).await.unwrap();
        assert_eq!(out, "No cached users\n");
    }
}
