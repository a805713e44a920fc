//! Presentation state holders
//!
//! Each presenter owns a `watch` channel carrying its UI state. Front-ends
//! subscribe to it and call the presenter's actions; presenters never
//! return errors, they turn them into messages inside the state.

mod emoji;
mod repo;
mod user;

pub use emoji::{EmojiPresenter, EmojiUiState};
pub use repo::{LoadState, RepoPresenter, RepoUiState};
pub use user::{UserPresenter, UserUiState};

use crate::error::AppError;

/// Shown when an error carries no displayable text
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Displayable message for an error
pub(crate) fn error_message(error: &AppError) -> String {
    let message = match error {
        AppError::Validation(message) => message.clone(),
        other => other.to_string(),
    };

    if message.trim().is_empty() {
        UNEXPECTED_ERROR.to_string()
    } else {
        message
    }
}
