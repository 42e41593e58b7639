//! In-process transport.
//!
//! Serves [`EngagementApi`] straight from the core services for one signed-in
//! user, for embedding the client next to the server.

use async_trait::async_trait;
use plaza_common::{AppResult, FeedEntry};
use plaza_core::{FeedOptions, PublishPost, Services};

use crate::api::{EngagementApi, FeedSource};

/// [`EngagementApi`] backed by local services.
#[derive(Clone)]
pub struct LocalApi {
    services: Services,
    user_id: i64,
}

impl LocalApi {
    /// Act as `user_id`.
    #[must_use]
    pub const fn new(services: Services, user_id: i64) -> Self {
        Self { services, user_id }
    }
}

#[async_trait]
impl EngagementApi for LocalApi {
    async fn follow(&self, username: &str) -> AppResult<bool> {
        self.services.engagement.follow(self.user_id, username).await
    }

    async fn unfollow(&self, username: &str) -> AppResult<bool> {
        self.services
            .engagement
            .unfollow(self.user_id, username)
            .await
    }

    async fn like(&self, post_id: i64) -> AppResult<bool> {
        self.services.engagement.like(self.user_id, post_id).await
    }

    async fn unlike(&self, post_id: i64) -> AppResult<bool> {
        self.services.engagement.unlike(self.user_id, post_id).await
    }

    async fn publish_post(&self, text: &str) -> AppResult<i64> {
        let input = PublishPost {
            text: text.to_string(),
        };
        Ok(self.services.posts.publish(self.user_id, input).await?.id)
    }

    async fn delete_post(&self, post_id: i64) -> AppResult<()> {
        self.services.posts.delete(self.user_id, post_id).await
    }

    async fn fetch_feed(
        &self,
        source: &FeedSource,
        limit: Option<u64>,
    ) -> AppResult<Vec<FeedEntry>> {
        match source {
            FeedSource::Home { viewer_username } => {
                let options = FeedOptions { types: None, limit };
                self.services.feed.home_feed(viewer_username, options).await
            }
            FeedSource::Profile { username, types } => {
                let options = FeedOptions {
                    types: types.clone(),
                    limit,
                };
                self.services
                    .feed
                    .profile_feed(username, Some(self.user_id), options)
                    .await
            }
        }
    }
}
