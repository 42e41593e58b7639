//! Engagement toggle engine.
//!
//! Follow and like toggles are idempotent. Each mutating call runs in one
//! transaction so the relation row, the denormalized like count and the
//! ledger entry change together or not at all. Races on the same pair are
//! arbitrated by the unique indexes on `following` and `like_mark`, and by
//! conditional flips of an existing mark; the loser reports success without
//! writing.

use std::sync::Arc;

use plaza_common::{AppError, AppResult, IdGenerator, SharedClock};
use plaza_db::{
    entities::{activity::ActivityType, following, like_mark},
    repositories::{FollowingRepository, LikeMarkRepository, PostRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use tracing::{debug, info, warn};

use super::activity::{ActivityLedger, ActivityTarget};

fn db_err(e: sea_orm::DbErr) -> AppError {
    AppError::Database(e.to_string())
}

/// Engagement service for follow and like toggles.
#[derive(Clone)]
pub struct EngagementService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    post_repo: PostRepository,
    following_repo: FollowingRepository,
    like_mark_repo: LikeMarkRepository,
    ledger: ActivityLedger,
    clock: SharedClock,
    id_gen: IdGenerator,
}

impl EngagementService {
    /// Create a new engagement service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, clock: SharedClock) -> Self {
        Self {
            user_repo: UserRepository::new(db.clone()),
            post_repo: PostRepository::new(db.clone()),
            following_repo: FollowingRepository::new(db.clone()),
            like_mark_repo: LikeMarkRepository::new(db.clone()),
            ledger: ActivityLedger::new(db.clone(), clock.clone()),
            db,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow a user by username.
    ///
    /// Returns `false` when either user is missing or when following
    /// yourself. Following an already followed user is a successful no-op.
    pub async fn follow(&self, follower_id: i64, target_username: &str) -> AppResult<bool> {
        let Some(follower) = self.user_repo.find_by_id(follower_id).await? else {
            warn!(follower_id, "Follow rejected: follower not found");
            return Ok(false);
        };
        let Some(target) = self.user_repo.find_by_username(target_username).await? else {
            warn!(follower_id, target_username, "Follow rejected: target not found");
            return Ok(false);
        };

        if follower.id == target.id {
            warn!(follower_id, "Follow rejected: cannot follow yourself");
            return Ok(false);
        }

        if self
            .following_repo
            .is_following(follower.id, target.id)
            .await?
        {
            debug!(follower_id, followee_id = target.id, "Already following");
            return Ok(true);
        }

        let txn = self.db.begin().await.map_err(db_err)?;

        let edge = following::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower.id),
            followee_id: Set(target.id),
            created_at: Set(self.clock.now().into()),
        };

        let outcome = self.following_repo.insert_if_absent_in(&txn, edge).await?;
        if !outcome.is_inserted() {
            // A concurrent follow for the same pair committed first.
            warn!(follower_id, followee_id = target.id, "Follow edge already created");
            return Ok(true);
        }

        self.ledger
            .record_in(
                &txn,
                follower.id,
                ActivityType::Follow,
                ActivityTarget::user(target.id),
                Some(true),
            )
            .await?;

        txn.commit().await.map_err(db_err)?;

        info!(follower_id, followee_id = target.id, "User followed");
        Ok(true)
    }

    /// Unfollow a user by username.
    ///
    /// Removes the edge if present. The Follow ledger entry is left as it is.
    pub async fn unfollow(&self, follower_id: i64, target_username: &str) -> AppResult<bool> {
        let Some(follower) = self.user_repo.find_by_id(follower_id).await? else {
            warn!(follower_id, "Unfollow rejected: follower not found");
            return Ok(false);
        };
        let Some(target) = self.user_repo.find_by_username(target_username).await? else {
            warn!(follower_id, target_username, "Unfollow rejected: target not found");
            return Ok(false);
        };

        let removed = self
            .following_repo
            .delete_by_pair(follower.id, target.id)
            .await?;

        if removed == 0 {
            debug!(follower_id, followee_id = target.id, "Not following");
        } else {
            info!(follower_id, followee_id = target.id, "User unfollowed");
        }
        Ok(true)
    }

    /// Like a post.
    pub async fn like(&self, user_id: i64, post_id: i64) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let user = self.user_repo.find_by_id_in(&txn, user_id).await?;
        let post = self.post_repo.find_by_id_in(&txn, post_id).await?;
        let (Some(user), Some(post)) = (user, post) else {
            return Err(AppError::NotFound("User or post not found".to_string()));
        };

        match self
            .like_mark_repo
            .find_by_pair_in(&txn, user.id, post.id)
            .await?
        {
            Some(mark) if mark.active => {
                debug!(user_id, post_id, "Already liked");
                return Ok(true);
            }
            Some(mark) => {
                let flipped = self
                    .like_mark_repo
                    .set_active_in(&txn, &mark.id, true, self.clock.now())
                    .await?;
                if flipped == 0 {
                    // A concurrent like reactivated the mark first.
                    warn!(user_id, post_id, "Like mark already reactivated");
                    return Ok(true);
                }
            }
            None => {
                let mark = like_mark::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user.id),
                    post_id: Set(post.id),
                    active: Set(true),
                    created_at: Set(self.clock.now().into()),
                    updated_at: Set(None),
                };
                let outcome = self.like_mark_repo.insert_if_absent_in(&txn, mark).await?;
                if !outcome.is_inserted() {
                    warn!(user_id, post_id, "Like mark already created");
                    return Ok(true);
                }
            }
        }

        self.post_repo
            .increment_likes_count_in(&txn, post.id)
            .await?;
        self.ledger
            .record_in(
                &txn,
                user.id,
                ActivityType::Like,
                ActivityTarget::post(post.id),
                Some(true),
            )
            .await?;

        txn.commit().await.map_err(db_err)?;

        info!(user_id, post_id, "Post liked");
        Ok(true)
    }

    /// Unlike a post. Unliking a post that is not liked is a successful no-op.
    pub async fn unlike(&self, user_id: i64, post_id: i64) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let user = self.user_repo.find_by_id_in(&txn, user_id).await?;
        let post = self.post_repo.find_by_id_in(&txn, post_id).await?;
        let (Some(user), Some(post)) = (user, post) else {
            return Err(AppError::NotFound("User or post not found".to_string()));
        };

        let mark = match self
            .like_mark_repo
            .find_by_pair_in(&txn, user.id, post.id)
            .await?
        {
            Some(mark) if mark.active => mark,
            _ => {
                debug!(user_id, post_id, "Not liked");
                return Ok(true);
            }
        };

        let flipped = self
            .like_mark_repo
            .set_active_in(&txn, &mark.id, false, self.clock.now())
            .await?;
        if flipped == 0 {
            warn!(user_id, post_id, "Like mark already deactivated");
            return Ok(true);
        }

        self.post_repo
            .decrement_likes_count_in(&txn, post.id)
            .await?;
        self.ledger
            .record_in(
                &txn,
                user.id,
                ActivityType::Like,
                ActivityTarget::post(post.id),
                Some(false),
            )
            .await?;

        txn.commit().await.map_err(db_err)?;

        info!(user_id, post_id, "Post unliked");
        Ok(true)
    }

    /// Whether a follow edge exists.
    pub async fn is_following(&self, follower_id: i64, followee_id: i64) -> AppResult<bool> {
        self.following_repo
            .is_following(follower_id, followee_id)
            .await
    }

    /// Whether the user currently likes the post.
    pub async fn is_liked(&self, user_id: i64, post_id: i64) -> AppResult<bool> {
        Ok(self
            .like_mark_repo
            .find_by_pair(user_id, post_id)
            .await?
            .is_some_and(|mark| mark.active))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use plaza_common::FixedClock;
    use plaza_db::entities::{activity, post, user};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn create_test_user(id: i64, username: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            name: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().into(),
        }
    }

    fn create_test_post(id: i64, user_id: i64, likes_count: i64) -> post::Model {
        post::Model {
            id,
            user_id,
            text: "hello".to_string(),
            likes_count,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().into(),
        }
    }

    fn create_test_mark(user_id: i64, post_id: i64, active: bool) -> like_mark::Model {
        like_mark::Model {
            id: "l1".to_string(),
            user_id,
            post_id,
            active,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().into(),
            updated_at: None,
        }
    }

    fn create_test_entry(
        activity_type: ActivityType,
        target: ActivityTarget,
        active: bool,
    ) -> activity::Model {
        activity::Model {
            id: "a1".to_string(),
            actor_id: 1,
            activity_type,
            target_user_id: target.user_id,
            target_post_id: target.post_id,
            active,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().into(),
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        maplit::btreemap! {
            "num_items" => Value::BigInt(Some(n))
        }
    }

    const fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn create_test_service(db: Arc<DatabaseConnection>) -> EngagementService {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        EngagementService::new(db, FixedClock::shared(now))
    }

    fn log_of(db: Arc<DatabaseConnection>) -> String {
        format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log())
    }

    #[tokio::test]
    async fn test_follow_creates_edge_and_ledger_entry() {
        let target = ActivityTarget::user(2);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_user(2, "bob")]])
                .append_query_results([[count_row(0)]])
                .append_exec_results([exec(1)])
                .append_query_results([Vec::<activity::Model>::new()])
                .append_query_results([[create_test_entry(ActivityType::Follow, target, true)]])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.follow(1, "bob").await.unwrap());

        drop(service);
        let log = log_of(db);
        assert!(log.contains("ON CONFLICT"));
        assert!(log.contains(r#"INSERT INTO \"activity\""#));
    }

    #[tokio::test]
    async fn test_follow_existing_edge_writes_nothing() {
        // Only the reads are queued: any write would exhaust the mock.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_user(2, "bob")]])
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.follow(1, "bob").await.unwrap());

        drop(service);
        assert!(!log_of(db).contains("INSERT"));
    }

    #[tokio::test]
    async fn test_follow_yourself_returns_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_user(1, "alice")]])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(!service.follow(1, "Alice").await.unwrap());

        drop(service);
        assert!(!log_of(db).contains("INSERT"));
    }

    #[tokio::test]
    async fn test_follow_unknown_target_returns_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(db);
        assert!(!service.follow(1, "nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_lost_race_succeeds_without_ledger_write() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_user(2, "bob")]])
                .append_query_results([[count_row(0)]])
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.follow(1, "bob").await.unwrap());

        drop(service);
        assert!(!log_of(db).contains(r#"INSERT INTO \"activity\""#));
    }

    #[tokio::test]
    async fn test_unfollow_deletes_edge_without_ledger_write() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_user(2, "bob")]])
                .append_exec_results([exec(1)])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.unfollow(1, "bob").await.unwrap());

        drop(service);
        let log = log_of(db);
        assert!(log.contains(r#"DELETE FROM \"following\""#));
        assert!(!log.contains(r#"\"activity\""#));
    }

    #[tokio::test]
    async fn test_unfollow_unknown_user_returns_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(db);
        assert!(!service.unfollow(1, "bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_like_inserts_mark_bumps_count_and_records() {
        let target = ActivityTarget::post(10);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_post(10, 2, 0)]])
                .append_query_results([Vec::<like_mark::Model>::new()])
                .append_exec_results([exec(1), exec(1)])
                .append_query_results([Vec::<activity::Model>::new()])
                .append_query_results([[create_test_entry(ActivityType::Like, target, true)]])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.like(1, 10).await.unwrap());

        drop(service);
        let log = log_of(db);
        assert!(log.contains(r#"INSERT INTO \"like_mark\""#));
        assert!(log.contains(r#"UPDATE \"post\""#));
        assert!(log.contains(r#"INSERT INTO \"activity\""#));
    }

    #[tokio::test]
    async fn test_like_already_liked_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_post(10, 2, 1)]])
                .append_query_results([[create_test_mark(1, 10, true)]])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.like(1, 10).await.unwrap());

        drop(service);
        let log = log_of(db);
        assert!(!log.contains("UPDATE"));
        assert!(!log.contains("INSERT"));
    }

    #[tokio::test]
    async fn test_relike_reactivates_mark_and_inserts_new_entry() {
        let target = ActivityTarget::post(10);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_post(10, 2, 0)]])
                .append_query_results([[create_test_mark(1, 10, false)]])
                .append_exec_results([exec(1), exec(1)])
                // The earlier Like entry was deactivated, so the active lookup is empty.
                .append_query_results([Vec::<activity::Model>::new()])
                .append_query_results([[create_test_entry(ActivityType::Like, target, true)]])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.like(1, 10).await.unwrap());

        drop(service);
        let log = log_of(db);
        assert!(log.contains(r#"UPDATE \"like_mark\""#));
        assert!(log.contains(r#"INSERT INTO \"activity\""#));
        assert!(!log.contains(r#"INSERT INTO \"like_mark\""#));
    }

    #[tokio::test]
    async fn test_like_missing_post_is_hard_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.like(1, 99).await;

        assert!(
            matches!(result, Err(AppError::NotFound(msg)) if msg == "User or post not found")
        );
    }

    #[tokio::test]
    async fn test_unlike_missing_user_is_hard_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[create_test_post(10, 2, 0)]])
                .into_connection(),
        );

        let service = create_test_service(db);
        assert!(matches!(
            service.unlike(42, 10).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unlike_never_liked_writes_nothing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_post(10, 2, 0)]])
                .append_query_results([Vec::<like_mark::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.unlike(1, 10).await.unwrap());

        drop(service);
        let log = log_of(db);
        assert!(!log.contains("UPDATE"));
        assert!(!log.contains("INSERT"));
    }

    #[tokio::test]
    async fn test_unlike_deactivates_and_floors_count() {
        let target = ActivityTarget::post(10);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_post(10, 2, 1)]])
                .append_query_results([[create_test_mark(1, 10, true)]])
                .append_exec_results([exec(1), exec(1)])
                .append_query_results([[create_test_entry(ActivityType::Like, target, true)]])
                .append_query_results([[create_test_entry(ActivityType::Like, target, false)]])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.unlike(1, 10).await.unwrap());

        drop(service);
        let log = log_of(db);
        assert!(log.contains("GREATEST"));
        assert!(log.contains(r#"UPDATE \"activity\""#));
        assert!(!log.contains("INSERT"));
    }

    #[tokio::test]
    async fn test_relike_lost_race_writes_nothing_else() {
        // The mark was read inactive, but a concurrent like flipped it first.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_post(10, 2, 1)]])
                .append_query_results([[create_test_mark(1, 10, false)]])
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.like(1, 10).await.unwrap());

        drop(service);
        let log = log_of(db);
        assert!(log.contains(r#"UPDATE \"like_mark\""#));
        assert!(!log.contains(r#"UPDATE \"post\""#));
        assert!(!log.contains(r#"\"activity\""#));
    }

    #[tokio::test]
    async fn test_unlike_lost_race_writes_nothing_else() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(1, "alice")]])
                .append_query_results([[create_test_post(10, 2, 1)]])
                .append_query_results([[create_test_mark(1, 10, true)]])
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        assert!(service.unlike(1, 10).await.unwrap());

        drop(service);
        let log = log_of(db);
        assert!(!log.contains("GREATEST"));
        assert!(!log.contains(r#"\"activity\""#));
    }

    #[tokio::test]
    async fn test_is_liked_reads_mark_state() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_mark(1, 10, false)]])
                .append_query_results([[create_test_mark(1, 11, true)]])
                .append_query_results([Vec::<like_mark::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(db);
        assert!(!service.is_liked(1, 10).await.unwrap());
        assert!(service.is_liked(1, 11).await.unwrap());
        assert!(!service.is_liked(1, 12).await.unwrap());
    }
}
