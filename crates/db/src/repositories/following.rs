//! Following repository.

use std::sync::Arc;

use super::{InsertOutcome, classify_insert};
use crate::entities::{Following, following};
use plaza_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, sea_query::OnConflict,
};

/// Following repository for database operations.
#[derive(Clone)]
pub struct FollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a following relationship by follower and followee.
    pub async fn find_by_pair(
        &self,
        follower_id: i64,
        followee_id: i64,
    ) -> AppResult<Option<following::Model>> {
        self.find_by_pair_in(self.db.as_ref(), follower_id, followee_id)
            .await
    }

    /// Find a following relationship on the given connection.
    pub async fn find_by_pair_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        follower_id: i64,
        followee_id: i64,
    ) -> AppResult<Option<following::Model>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: i64, followee_id: i64) -> AppResult<bool> {
        let count = Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Insert an edge unless one already exists for the pair.
    ///
    /// The unique index on `(follower_id, followee_id)` decides which of two
    /// concurrent callers wins; the loser gets [`InsertOutcome::AlreadyExists`].
    pub async fn insert_if_absent_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: following::ActiveModel,
    ) -> AppResult<InsertOutcome> {
        let result = Following::insert(model)
            .on_conflict(
                OnConflict::columns([
                    following::Column::FollowerId,
                    following::Column::FolloweeId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(conn)
            .await;

        classify_insert(result)
    }

    /// Delete a following relationship by pair. Deleting a missing edge is a no-op.
    pub async fn delete_by_pair(&self, follower_id: i64, followee_id: i64) -> AppResult<u64> {
        let result = Following::delete_many()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// All edges going out of a user, newest first.
    pub async fn find_following(&self, follower_id: i64) -> AppResult<Vec<following::Model>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .order_by_desc(following::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs among `candidates` that `follower_id` currently follows.
    pub async fn find_followed_among(
        &self,
        follower_id: i64,
        candidates: &[i64],
    ) -> AppResult<Vec<i64>> {
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let edges = Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.is_in(candidates.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(edges.into_iter().map(|e| e.followee_id).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_following(id: &str, follower_id: i64, followee_id: i64) -> following::Model {
        following::Model {
            id: id.to_string(),
            follower_id,
            followee_id,
            created_at: Utc::now().into(),
        }
    }

    fn new_edge(follower_id: i64, followee_id: i64) -> following::ActiveModel {
        following::ActiveModel {
            id: Set("f1".to_string()),
            follower_id: Set(follower_id),
            followee_id: Set(followee_id),
            created_at: Set(Utc::now().into()),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let following = create_test_following("f1", 1, 2);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[following.clone()]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let result = repo.find_by_pair(1, 2).await.unwrap();

        assert_eq!(result, Some(following));
    }

    #[tokio::test]
    async fn test_is_following() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    [maplit::btreemap! {
                        "num_items" => sea_orm::Value::BigInt(Some(1))
                    }],
                    [maplit::btreemap! {
                        "num_items" => sea_orm::Value::BigInt(Some(0))
                    }],
                ])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        assert!(repo.is_following(1, 2).await.unwrap());
        assert!(!repo.is_following(2, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_if_absent_inserted() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db.clone());
        let outcome = repo
            .insert_if_absent_in(db.as_ref(), new_edge(1, 2))
            .await
            .unwrap();

        assert_eq!(outcome, InsertOutcome::Inserted);

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert!(format!("{log:?}").contains("ON CONFLICT"));
    }

    #[tokio::test]
    async fn test_insert_if_absent_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db.clone());
        let outcome = repo
            .insert_if_absent_in(db.as_ref(), new_edge(1, 2))
            .await
            .unwrap();

        assert_eq!(outcome, InsertOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_delete_by_pair_missing_edge_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let removed = repo.delete_by_pair(1, 2).await.unwrap();

        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_find_followed_among() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_following("f1", 1, 2),
                    create_test_following("f2", 1, 4),
                ]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        let ids = repo.find_followed_among(1, &[2, 3, 4]).await.unwrap();

        assert_eq!(ids, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_find_followed_among_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = FollowingRepository::new(db);
        assert!(repo.find_followed_among(1, &[]).await.unwrap().is_empty());
    }
}
