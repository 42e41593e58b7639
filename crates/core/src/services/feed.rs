//! Feed composition service.
//!
//! Feeds are read straight from the activity ledger: active entries of the
//! visible actors, newest first, hydrated with the actor, target user and
//! target post as seen by the viewer.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use plaza_common::{
    ActivityKind, AppResult, FeedEntry, PostSummary, UserSummary, config::FeedConfig,
};
use plaza_db::{
    entities::{activity, post, user},
    repositories::{
        ActivityRepository, FeedFilter, FollowingRepository, LikeMarkRepository, PostRepository,
        UserRepository,
    },
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use tracing::{debug, warn};

/// Caller options for a feed read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedOptions {
    /// Allowed kinds. `None` and an empty list both mean every kind.
    #[serde(default)]
    pub types: Option<Vec<ActivityKind>>,
    /// Maximum number of entries. Defaults to `feed.default_limit`; a value
    /// above `feed.max_limit` is silently lowered to it.
    #[serde(default)]
    pub limit: Option<u64>,
}

impl FeedOptions {
    /// Restrict the feed to the given kinds.
    #[must_use]
    pub fn with_types(mut self, types: Vec<ActivityKind>) -> Self {
        self.types = Some(types);
        self
    }

    /// Request at most `limit` entries.
    #[must_use]
    pub const fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Feed service.
#[derive(Clone)]
pub struct FeedService {
    activity_repo: ActivityRepository,
    user_repo: UserRepository,
    post_repo: PostRepository,
    following_repo: FollowingRepository,
    like_mark_repo: LikeMarkRepository,
    config: FeedConfig,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: FeedConfig) -> Self {
        Self {
            activity_repo: ActivityRepository::new(db.clone()),
            user_repo: UserRepository::new(db.clone()),
            post_repo: PostRepository::new(db.clone()),
            following_repo: FollowingRepository::new(db.clone()),
            like_mark_repo: LikeMarkRepository::new(db),
            config,
        }
    }

    /// Entries by the viewer and everyone the viewer follows.
    ///
    /// An unknown viewer gets an empty feed. At most
    /// [`FeedConfig::resolve_limit`] entries are returned.
    pub async fn home_feed(
        &self,
        viewer_username: &str,
        options: FeedOptions,
    ) -> AppResult<Vec<FeedEntry>> {
        let Some(viewer) = self.user_repo.find_by_username(viewer_username).await? else {
            debug!(viewer_username, "Home feed for unknown user");
            return Ok(vec![]);
        };

        let mut actor_ids = vec![viewer.id];
        actor_ids.extend(
            self.following_repo
                .find_following(viewer.id)
                .await?
                .into_iter()
                .map(|edge| edge.followee_id),
        );

        let entries = self
            .activity_repo
            .find_feed(&self.filter(actor_ids, options))
            .await?;

        self.hydrate(entries, Some(viewer.id)).await
    }

    /// Entries by one user, as seen by an optional viewer.
    ///
    /// An unknown subject gets an empty feed. The limit is resolved as for
    /// [`Self::home_feed`].
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer_id: Option<i64>,
        options: FeedOptions,
    ) -> AppResult<Vec<FeedEntry>> {
        let Some(subject) = self.user_repo.find_by_username(username).await? else {
            debug!(username, "Profile feed for unknown user");
            return Ok(vec![]);
        };

        let entries = self
            .activity_repo
            .find_feed(&self.filter(vec![subject.id], options))
            .await?;

        self.hydrate(entries, viewer_id).await
    }

    fn filter(&self, actor_ids: Vec<i64>, options: FeedOptions) -> FeedFilter {
        FeedFilter {
            actor_ids,
            types: options
                .types
                .map(|kinds| kinds.into_iter().map(Into::into).collect()),
            limit: self.config.resolve_limit(options.limit),
        }
    }

    async fn hydrate(
        &self,
        entries: Vec<activity::Model>,
        viewer_id: Option<i64>,
    ) -> AppResult<Vec<FeedEntry>> {
        if entries.is_empty() {
            return Ok(vec![]);
        }

        let post_ids: BTreeSet<i64> = entries.iter().filter_map(|e| e.target_post_id).collect();
        let post_ids: Vec<i64> = post_ids.into_iter().collect();
        let posts: HashMap<i64, post::Model> = self
            .post_repo
            .find_by_ids(&post_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let user_ids: BTreeSet<i64> = entries
            .iter()
            .flat_map(|e| [Some(e.actor_id), e.target_user_id])
            .flatten()
            .chain(posts.values().map(|p| p.user_id))
            .collect();
        let user_ids: Vec<i64> = user_ids.into_iter().collect();
        let users: HashMap<i64, user::Model> = self
            .user_repo
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let (followed, liked): (HashSet<i64>, HashSet<i64>) = match viewer_id {
            Some(viewer_id) => (
                self.following_repo
                    .find_followed_among(viewer_id, &user_ids)
                    .await?
                    .into_iter()
                    .collect(),
                self.like_mark_repo
                    .find_liked_among(viewer_id, &post_ids)
                    .await?
                    .into_iter()
                    .collect(),
            ),
            None => (HashSet::new(), HashSet::new()),
        };

        let summarize = |id: i64| {
            users.get(&id).map(|u| UserSummary {
                id: u.id,
                username: u.username.clone(),
                name: u.name.clone(),
                followed_by_me: followed.contains(&u.id),
            })
        };

        let mut feed = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(actor) = summarize(entry.actor_id) else {
                warn!(entry_id = %entry.id, actor_id = entry.actor_id, "Skipping entry without actor");
                continue;
            };

            let target_post = entry
                .target_post_id
                .and_then(|id| posts.get(&id))
                .and_then(|p| {
                    summarize(p.user_id).map(|owner| PostSummary {
                        id: p.id,
                        text: p.text.clone(),
                        owner,
                        likes_count: p.likes_count,
                        liked_by_me: liked.contains(&p.id),
                        created_at: p.created_at.with_timezone(&Utc),
                    })
                });

            let target_user = entry.target_user_id.and_then(summarize);

            // A post deleted between the ledger scan and the batch reads leaves
            // an entry with nothing to show.
            let hydrated = match entry.activity_type {
                activity::ActivityType::Follow => target_user.is_some(),
                _ => target_post.is_some(),
            };
            if !hydrated {
                warn!(entry_id = %entry.id, "Skipping entry without target");
                continue;
            }

            feed.push(FeedEntry {
                id: entry.id,
                kind: entry.activity_type.into(),
                actor,
                target_user,
                target_post,
                created_at: entry.created_at.with_timezone(&Utc),
            });
        }

        Ok(feed)
    }
}
