//! Activity ledger repository.

use std::sync::Arc;

use crate::entities::{Activity, activity, activity::ActivityType};
use plaza_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Dedupe key of a toggleable ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKey {
    /// `(actor_id, target_user_id, follow)`
    Follow { actor_id: i64, target_user_id: i64 },
    /// `(actor_id, target_post_id, like)`
    Like { actor_id: i64, target_post_id: i64 },
}

impl ActivityKey {
    fn condition(self) -> Condition {
        match self {
            Self::Follow {
                actor_id,
                target_user_id,
            } => Condition::all()
                .add(activity::Column::ActorId.eq(actor_id))
                .add(activity::Column::ActivityType.eq(ActivityType::Follow))
                .add(activity::Column::TargetUserId.eq(target_user_id)),
            Self::Like {
                actor_id,
                target_post_id,
            } => Condition::all()
                .add(activity::Column::ActorId.eq(actor_id))
                .add(activity::Column::ActivityType.eq(ActivityType::Like))
                .add(activity::Column::TargetPostId.eq(target_post_id)),
        }
    }
}

/// Row selection for a feed scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    /// Actors whose entries are visible.
    pub actor_ids: Vec<i64>,
    /// Allowed types; `None` or empty means every type.
    pub types: Option<Vec<ActivityType>>,
    /// Maximum number of rows.
    pub limit: u64,
}

/// Activity repository for database operations.
#[derive(Clone)]
pub struct ActivityRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityRepository {
    /// Create a new activity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an entry by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<activity::Model>> {
        Activity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the active entry for a dedupe key.
    pub async fn find_active_by_key_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: ActivityKey,
    ) -> AppResult<Option<activity::Model>> {
        Activity::find()
            .filter(key.condition())
            .filter(activity::Column::Active.eq(true))
            .order_by_desc(activity::Column::CreatedAt)
            .order_by_desc(activity::Column::Id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new entry.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: activity::ActiveModel,
    ) -> AppResult<activity::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write `active` on an existing entry.
    ///
    /// The column is always written, also when it already holds `active`.
    pub async fn set_active_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        entry: activity::Model,
        active: bool,
    ) -> AppResult<activity::Model> {
        let mut model = entry.into_active_model();
        model.active = Set(active);
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Hard-delete every entry targeting a post. Returns the number of rows removed.
    pub async fn delete_by_post_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: i64,
    ) -> AppResult<u64> {
        let result = Activity::delete_many()
            .filter(activity::Column::TargetPostId.eq(post_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Active entries matching a feed filter, newest first.
    ///
    /// Ties on `created_at` are broken by descending ID so repeated reads
    /// return the same order.
    pub async fn find_feed(&self, filter: &FeedFilter) -> AppResult<Vec<activity::Model>> {
        if filter.actor_ids.is_empty() || filter.limit == 0 {
            return Ok(vec![]);
        }

        let mut condition = Condition::all()
            .add(activity::Column::Active.eq(true))
            .add(activity::Column::ActorId.is_in(filter.actor_ids.clone()));

        // An empty allow-list means no restriction, not "match nothing".
        if let Some(types) = filter.types.as_ref().filter(|t| !t.is_empty()) {
            condition = condition.add(activity::Column::ActivityType.is_in(types.clone()));
        }

        Activity::find()
            .filter(condition)
            .order_by_desc(activity::Column::CreatedAt)
            .order_by_desc(activity::Column::Id)
            .limit(filter.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
