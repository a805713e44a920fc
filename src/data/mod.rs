//! Data layer module
//!
//! Handles all local persistence:
//! - SQLite database operations (emojis, users, repos, pagination cursors)
//! - Change notifications for observed queries

mod database;
mod models;

pub use database::{Database, Table};
pub use models::*;
