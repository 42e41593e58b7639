//! Remote engagement API.
//!
//! The session talks to the server only through [`EngagementApi`], so the
//! transport can be swapped without touching the reconciliation protocol.

use async_trait::async_trait;
use plaza_common::{ActivityKind, AppResult, FeedEntry};

/// Which feed a session mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// The viewer's home feed.
    Home {
        /// The signed-in viewer.
        viewer_username: String,
    },
    /// One user's profile feed.
    Profile {
        /// Whose profile.
        username: String,
        /// Kinds to show; `None` shows every kind.
        types: Option<Vec<ActivityKind>>,
    },
}

/// Calls made by a signed-in viewer.
///
/// Toggle methods return the server's soft result: `Ok(false)` means the
/// request was refused without an error.
#[async_trait]
pub trait EngagementApi: Send + Sync {
    /// Follow a user.
    async fn follow(&self, username: &str) -> AppResult<bool>;

    /// Unfollow a user.
    async fn unfollow(&self, username: &str) -> AppResult<bool>;

    /// Like a post.
    async fn like(&self, post_id: i64) -> AppResult<bool>;

    /// Unlike a post.
    async fn unlike(&self, post_id: i64) -> AppResult<bool>;

    /// Publish a post. Returns the new post ID.
    async fn publish_post(&self, text: &str) -> AppResult<i64>;

    /// Delete one of the viewer's posts.
    async fn delete_post(&self, post_id: i64) -> AppResult<()>;

    /// Fetch a feed.
    async fn fetch_feed(&self, source: &FeedSource, limit: Option<u64>)
    -> AppResult<Vec<FeedEntry>>;
}
