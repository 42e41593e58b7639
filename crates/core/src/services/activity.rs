//! Activity ledger service.
//!
//! Records user actions as ledger entries. Follow and Like entries are keyed
//! by actor and target: recording against a key that already has an active
//! entry rewrites that entry's `active` flag instead of inserting a second
//! row. Post and Share entries are always inserted.

use std::sync::Arc;

use plaza_common::{AppError, AppResult, IdGenerator, SharedClock};
use plaza_db::{
    entities::activity::{self, ActivityType},
    repositories::{ActivityKey, ActivityRepository},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use tracing::{debug, info};

/// What a ledger entry points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityTarget {
    pub user_id: Option<i64>,
    pub post_id: Option<i64>,
}

impl ActivityTarget {
    /// Target a user (Follow).
    #[must_use]
    pub const fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            post_id: None,
        }
    }

    /// Target a post (Post, Like).
    #[must_use]
    pub const fn post(post_id: i64) -> Self {
        Self {
            user_id: None,
            post_id: Some(post_id),
        }
    }

    /// Target a post together with its owner (Share).
    #[must_use]
    pub const fn post_of(post_id: i64, owner_id: i64) -> Self {
        Self {
            user_id: Some(owner_id),
            post_id: Some(post_id),
        }
    }

    /// The dedupe key for `activity_type`, if the type is toggleable.
    fn key(self, actor_id: i64, activity_type: ActivityType) -> AppResult<Option<ActivityKey>> {
        match activity_type {
            ActivityType::Follow => {
                let target_user_id = self.user_id.ok_or_else(|| {
                    AppError::BadRequest("Follow activity requires a target user".to_string())
                })?;
                Ok(Some(ActivityKey::Follow {
                    actor_id,
                    target_user_id,
                }))
            }
            ActivityType::Like => {
                let target_post_id = self.post_id.ok_or_else(|| {
                    AppError::BadRequest("Like activity requires a target post".to_string())
                })?;
                Ok(Some(ActivityKey::Like {
                    actor_id,
                    target_post_id,
                }))
            }
            ActivityType::Post | ActivityType::Share => {
                if self.post_id.is_none() {
                    return Err(AppError::BadRequest(format!(
                        "{activity_type:?} activity requires a target post"
                    )));
                }
                Ok(None)
            }
        }
    }
}

/// Activity ledger.
#[derive(Clone)]
pub struct ActivityLedger {
    db: Arc<DatabaseConnection>,
    activity_repo: ActivityRepository,
    clock: SharedClock,
    id_gen: IdGenerator,
}

impl ActivityLedger {
    /// Create a new activity ledger.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, clock: SharedClock) -> Self {
        Self {
            activity_repo: ActivityRepository::new(db.clone()),
            db,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record an action.
    ///
    /// `active` defaults to `true`. When a Follow or Like entry for the same
    /// key is active, its flag is written with the supplied value even when it
    /// does not change.
    pub async fn record(
        &self,
        actor_id: i64,
        activity_type: ActivityType,
        target: ActivityTarget,
        active: Option<bool>,
    ) -> AppResult<activity::Model> {
        self.record_in(self.db.as_ref(), actor_id, activity_type, target, active)
            .await
    }

    /// Record an action on the given connection.
    pub async fn record_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor_id: i64,
        activity_type: ActivityType,
        target: ActivityTarget,
        active: Option<bool>,
    ) -> AppResult<activity::Model> {
        let active = active.unwrap_or(true);

        if let Some(key) = target.key(actor_id, activity_type)? {
            if let Some(entry) = self.activity_repo.find_active_by_key_in(conn, key).await? {
                debug!(entry_id = %entry.id, ?key, active, "Rewriting ledger entry");
                return self.activity_repo.set_active_in(conn, entry, active).await;
            }
        }

        let model = activity::ActiveModel {
            id: Set(self.id_gen.generate()),
            actor_id: Set(actor_id),
            activity_type: Set(activity_type),
            target_user_id: Set(target.user_id),
            target_post_id: Set(target.post_id),
            active: Set(active),
            created_at: Set(self.clock.now().into()),
        };

        let entry = self.activity_repo.create_in(conn, model).await?;
        info!(
            entry_id = %entry.id,
            actor_id,
            activity_type = ?activity_type,
            active,
            "Recorded activity"
        );
        Ok(entry)
    }

    /// Hard-delete every entry targeting a post.
    pub async fn delete_by_post(&self, post_id: i64) -> AppResult<u64> {
        self.delete_by_post_in(self.db.as_ref(), post_id).await
    }

    /// Hard-delete every entry targeting a post on the given connection.
    pub async fn delete_by_post_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: i64,
    ) -> AppResult<u64> {
        let removed = self.activity_repo.delete_by_post_in(conn, post_id).await?;
        debug!(post_id, removed, "Deleted ledger entries for post");
        Ok(removed)
    }
}
