//! Service layer
//!
//! Business logic between the cache and the GitHub API.
//! Services own no state beyond their handles; the cache is the source of truth.

mod emoji;
mod mediator;
mod pager;
mod user;

pub use emoji::EmojiService;
pub use mediator::{LoadType, MediatorResult, RepoRemoteMediator};
pub use pager::{RepoPage, RepoPager};
pub use user::UserService;
