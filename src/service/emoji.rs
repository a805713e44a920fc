//! Emoji catalog service
//!
//! Read-through cache over `GET /emojis`.

use rand::seq::SliceRandom;
use std::sync::Arc;

use crate::data::{Database, Emoji};
use crate::error::AppError;
use crate::github::GitHubApi;
use crate::metrics;

/// Emoji service
pub struct EmojiService {
    db: Arc<Database>,
    api: Arc<dyn GitHubApi>,
}

impl EmojiService {
    /// Create new emoji service
    pub fn new(db: Arc<Database>, api: Arc<dyn GitHubApi>) -> Self {
        Self { db, api }
    }

    /// Get the emoji catalog
    ///
    /// Served from the cache when it holds anything; otherwise fetched from
    /// GitHub and stored. A failed fetch leaves the cache empty.
    ///
    /// # Errors
    /// Returns error if the cache cannot be read or the fetch fails
    pub async fn get_emojis(&self) -> Result<Vec<Emoji>, AppError> {
        let cached = self.db.get_all_emojis().await?;
        if !cached.is_empty() {
            metrics::observe_cache_lookup("emojis", true);
            tracing::debug!(count = cached.len(), "Emoji catalog served from cache");
            return Ok(cached);
        }

        metrics::observe_cache_lookup("emojis", false);
        tracing::debug!("Emoji cache empty, fetching catalog");

        let emojis = self.fetch().await?;
        self.db.insert_emojis(&emojis).await?;

        tracing::info!(count = emojis.len(), "Emoji catalog cached");
        Ok(emojis)
    }

    /// Fetch the catalog and replace the cached one
    ///
    /// The previous catalog survives a failed fetch.
    pub async fn refresh_emojis(&self) -> Result<Vec<Emoji>, AppError> {
        let emojis = self.fetch().await?;
        self.db.replace_emojis(&emojis).await?;

        tracing::info!(count = emojis.len(), "Emoji catalog refreshed");
        Ok(emojis)
    }

    /// Pick one emoji uniformly at random, `None` for an empty catalog
    pub async fn random_emoji(&self) -> Result<Option<Emoji>, AppError> {
        let emojis = self.get_emojis().await?;
        Ok(emojis.choose(&mut rand::thread_rng()).cloned())
    }

    async fn fetch(&self) -> Result<Vec<Emoji>, AppError> {
        let catalog = self.api.fetch_emojis().await.inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to fetch emoji catalog");
        })?;

        // BTreeMap iteration keeps the same name order the cache uses
        Ok(catalog
            .into_iter()
            .map(|(name, url)| Emoji { name, url })
            .collect())
    }
}
