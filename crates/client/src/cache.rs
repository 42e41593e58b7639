//! In-memory feed cache.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::item::FeedItem;
use crate::patch::Patch;

/// Ordered feed items shared between a session and its readers.
///
/// Every method takes the lock for the duration of one synchronous update and
/// releases it before returning, so concurrent patches and refetches simply
/// apply in arrival order.
#[derive(Debug, Clone, Default)]
pub struct FeedCache {
    items: Arc<RwLock<Vec<FeedItem>>>,
}

impl FeedCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the cached items, in feed order.
    pub async fn snapshot(&self) -> Vec<FeedItem> {
        self.items.read().await.clone()
    }

    /// Number of cached items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the cache holds no items.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Replace the whole cache.
    pub async fn replace(&self, items: Vec<FeedItem>) {
        *self.items.write().await = items;
    }

    /// Apply a speculative patch.
    pub async fn apply(&self, patch: &Patch) {
        let mut items = self.items.write().await;
        patch.apply(&mut items);
    }
}
