//! Optimistic feed session.
//!
//! Every toggle patches the cache first, then calls the server. A confirmed
//! call keeps the speculation. A failed call (an error or a soft `false`)
//! discards it by refetching the feed and replacing the cache wholesale.

use std::future::Future;
use std::sync::Arc;

use plaza_common::AppResult;
use tracing::{debug, warn};

use crate::api::{EngagementApi, FeedSource};
use crate::cache::FeedCache;
use crate::error::{ClientError, ClientResult};
use crate::item::FeedItem;
use crate::patch::Patch;

/// How a toggle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The server confirmed the change; the speculative patch stands.
    Committed,
    /// The server refused the change; the cache was reloaded from the server.
    RolledBack,
}

/// A cached feed kept in step with the server.
#[derive(Clone)]
pub struct FeedSession {
    api: Arc<dyn EngagementApi>,
    cache: FeedCache,
    source: FeedSource,
    limit: Option<u64>,
}

impl FeedSession {
    /// Create a session with an empty cache. Call [`Self::refresh`] to load it.
    #[must_use]
    pub fn new(api: Arc<dyn EngagementApi>, source: FeedSource) -> Self {
        Self {
            api,
            cache: FeedCache::new(),
            source,
            limit: None,
        }
    }

    /// Request at most `limit` entries on every fetch.
    #[must_use]
    pub const fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Copy of the cached items.
    pub async fn items(&self) -> Vec<FeedItem> {
        self.cache.snapshot().await
    }

    /// Refetch the feed and replace the cache. Returns the number of items.
    ///
    /// Entries that cannot be turned into a [`FeedItem`] are dropped, so one
    /// bad entry never keeps the cache from being replaced.
    pub async fn refresh(&self) -> ClientResult<usize> {
        let entries = self.api.fetch_feed(&self.source, self.limit).await?;
        let items: Vec<FeedItem> = entries
            .into_iter()
            .filter_map(|entry| match FeedItem::try_from(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, "Dropping malformed feed entry");
                    None
                }
            })
            .collect();

        let count = items.len();
        self.cache.replace(items).await;
        debug!(count, "Feed refreshed");
        Ok(count)
    }

    /// Follow `username` (user `user_id`).
    pub async fn follow(&self, user_id: i64, username: &str) -> ClientResult<ToggleOutcome> {
        let patch = Patch::Follow {
            user_id,
            following: true,
        };
        self.toggle(patch, self.api.follow(username)).await
    }

    /// Unfollow `username` (user `user_id`).
    pub async fn unfollow(&self, user_id: i64, username: &str) -> ClientResult<ToggleOutcome> {
        let patch = Patch::Follow {
            user_id,
            following: false,
        };
        self.toggle(patch, self.api.unfollow(username)).await
    }

    /// Like a post.
    pub async fn like(&self, post_id: i64) -> ClientResult<ToggleOutcome> {
        let patch = Patch::Like {
            post_id,
            liked: true,
        };
        self.toggle(patch, self.api.like(post_id)).await
    }

    /// Unlike a post.
    pub async fn unlike(&self, post_id: i64) -> ClientResult<ToggleOutcome> {
        let patch = Patch::Like {
            post_id,
            liked: false,
        };
        self.toggle(patch, self.api.unlike(post_id)).await
    }

    /// Publish a post, then refetch the feed whatever the outcome.
    pub async fn publish(&self, text: &str) -> ClientResult<i64> {
        let result = self.api.publish_post(text).await;
        self.settle(result).await
    }

    /// Delete a post, then refetch the feed whatever the outcome.
    ///
    /// Items referencing the post disappear from the cache right away.
    pub async fn delete_post(&self, post_id: i64) -> ClientResult<()> {
        self.cache.apply(&Patch::DeletePost { post_id }).await;
        let result = self.api.delete_post(post_id).await;
        self.settle(result).await
    }

    async fn toggle(
        &self,
        patch: Patch,
        call: impl Future<Output = AppResult<bool>> + Send,
    ) -> ClientResult<ToggleOutcome> {
        self.cache.apply(&patch).await;

        match call.await {
            Ok(true) => Ok(ToggleOutcome::Committed),
            Ok(false) => {
                warn!(?patch, "Server refused change, reloading feed");
                self.refresh().await?;
                Ok(ToggleOutcome::RolledBack)
            }
            Err(e) => {
                warn!(?patch, error = %e, "Server call failed, reloading feed");
                self.refresh().await?;
                Ok(ToggleOutcome::RolledBack)
            }
        }
    }

    /// Refetch after a publish or delete. The remote error wins over a
    /// refetch error.
    async fn settle<T>(&self, result: AppResult<T>) -> ClientResult<T> {
        let refreshed = self.refresh().await;
        let value = result.map_err(ClientError::Remote)?;
        refreshed?;
        Ok(value)
    }
}
