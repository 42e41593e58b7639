//! Like mark repository.

use std::sync::Arc;

use super::{InsertOutcome, classify_insert};
use crate::entities::{LikeMark, like_mark};
use chrono::{DateTime, Utc};
use plaza_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, OnConflict},
};

/// Like mark repository for database operations.
#[derive(Clone)]
pub struct LikeMarkRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeMarkRepository {
    /// Create a new like mark repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the mark for a user and post.
    pub async fn find_by_pair(
        &self,
        user_id: i64,
        post_id: i64,
    ) -> AppResult<Option<like_mark::Model>> {
        self.find_by_pair_in(self.db.as_ref(), user_id, post_id)
            .await
    }

    /// Find the mark for a user and post on the given connection.
    pub async fn find_by_pair_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i64,
        post_id: i64,
    ) -> AppResult<Option<like_mark::Model>> {
        LikeMark::find()
            .filter(like_mark::Column::UserId.eq(user_id))
            .filter(like_mark::Column::PostId.eq(post_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a mark unless one already exists for `(user_id, post_id)`.
    pub async fn insert_if_absent_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: like_mark::ActiveModel,
    ) -> AppResult<InsertOutcome> {
        let result = LikeMark::insert(model)
            .on_conflict(
                OnConflict::columns([like_mark::Column::UserId, like_mark::Column::PostId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(conn)
            .await;

        classify_insert(result)
    }

    /// Flip a mark to `active`, only if it is currently `!active`.
    ///
    /// Returns the number of rows changed. Zero means a concurrent toggle
    /// already flipped the mark and the caller must not touch the count or
    /// the ledger.
    pub async fn set_active_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        mark_id: &str,
        active: bool,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let updated_at: DateTimeWithTimeZone = now.into();
        let result = LikeMark::update_many()
            .col_expr(like_mark::Column::Active, Expr::value(active))
            .col_expr(like_mark::Column::UpdatedAt, Expr::value(updated_at))
            .filter(like_mark::Column::Id.eq(mark_id))
            .filter(like_mark::Column::Active.eq(!active))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Post IDs among `post_ids` that the user currently likes.
    pub async fn find_liked_among(&self, user_id: i64, post_ids: &[i64]) -> AppResult<Vec<i64>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        let marks = LikeMark::find()
            .filter(like_mark::Column::UserId.eq(user_id))
            .filter(like_mark::Column::PostId.is_in(post_ids.to_vec()))
            .filter(like_mark::Column::Active.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(marks.into_iter().map(|m| m.post_id).collect())
    }
}
