//! Emoji list and random-emoji state

use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::sync::watch;

use super::error_message;
use crate::data::Emoji;
use crate::service::EmojiService;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmojiUiState {
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub emojis: Vec<Emoji>,
    pub selected_emoji: Option<Emoji>,
    pub error: Option<String>,
}

/// State holder for the emoji list screen
pub struct EmojiPresenter {
    service: Arc<EmojiService>,
    state: watch::Sender<EmojiUiState>,
}

impl EmojiPresenter {
    pub fn new(service: Arc<EmojiService>) -> Self {
        Self {
            service,
            state: watch::channel(EmojiUiState::default()).0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<EmojiUiState> {
        self.state.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> EmojiUiState {
        self.state.borrow().clone()
    }

    /// Load the catalog (cache first)
    pub async fn fetch_emojis(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.is_refreshing = true;
            s.error = None;
        });

        let result = self.service.get_emojis().await;
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.is_refreshing = false;
            match result {
                Ok(emojis) => {
                    tracing::debug!(count = emojis.len(), "Emojis loaded");
                    s.emojis = emojis;
                }
                Err(error) => {
                    tracing::error!(error = %error, "Error fetching emojis");
                    s.error = Some(error_message(&error));
                }
            }
        });
    }

    /// Reload the catalog from GitHub (pull to refresh)
    pub async fn refresh(&self) {
        self.state.send_modify(|s| {
            s.is_refreshing = true;
            s.error = None;
        });

        let result = self.service.refresh_emojis().await;
        self.state.send_modify(|s| {
            s.is_refreshing = false;
            match result {
                Ok(emojis) => s.emojis = emojis,
                Err(error) => {
                    tracing::error!(error = %error, "Error refreshing emojis");
                    s.error = Some(error_message(&error));
                }
            }
        });
    }

    /// Select a random emoji
    pub async fn random_emoji(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let result = self.service.get_emojis().await;
        self.state.send_modify(|s| {
            s.is_loading = false;
            match result {
                Ok(emojis) if emojis.is_empty() => {
                    tracing::debug!("No emojis available to select");
                    s.error = Some("No emojis available".to_string());
                }
                Ok(emojis) => {
                    s.selected_emoji = emojis.choose(&mut rand::thread_rng()).cloned();
                    s.emojis = emojis;
                }
                Err(error) => {
                    tracing::error!(error = %error, "Error getting random emoji");
                    s.error = Some(error_message(&error));
                }
            }
        });
    }

    /// Drop one emoji from the displayed list; the cache is untouched
    pub fn remove_emoji(&self, emoji: &Emoji) {
        self.state.send_modify(|s| {
            if let Some(index) = s.emojis.iter().position(|e| e == emoji) {
                s.emojis.remove(index);
            }
        });
        tracing::debug!(name = %emoji.name, "Emoji removed");
    }

    /// Put an emoji back on the displayed list (undo of [`Self::remove_emoji`])
    pub fn add_emoji(&self, emoji: Emoji) {
        tracing::debug!(name = %emoji.name, "Emoji re-added");
        self.state.send_modify(|s| s.emojis.push(emoji));
    }
}
