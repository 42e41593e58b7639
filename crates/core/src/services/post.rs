//! Post service.

use std::sync::Arc;

use plaza_common::{AppError, AppResult, SharedClock};
use plaza_db::{
    entities::{activity, activity::ActivityType, post},
    repositories::{PostRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::activity::{ActivityLedger, ActivityTarget};

/// Input for publishing a post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PublishPost {
    #[validate(length(min = 1, max = 3000))]
    pub text: String,
}

/// Post service for publish, share and delete.
#[derive(Clone)]
pub struct PostService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    post_repo: PostRepository,
    ledger: ActivityLedger,
    clock: SharedClock,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, clock: SharedClock) -> Self {
        Self {
            user_repo: UserRepository::new(db.clone()),
            post_repo: PostRepository::new(db.clone()),
            ledger: ActivityLedger::new(db.clone(), clock.clone()),
            db,
            clock,
        }
    }

    /// Publish a post and record it in the ledger.
    pub async fn publish(&self, user_id: i64, input: PublishPost) -> AppResult<post::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let model = post::ActiveModel {
            user_id: Set(user.id),
            text: Set(input.text),
            likes_count: Set(0),
            created_at: Set(self.clock.now().into()),
            ..Default::default()
        };
        let post = self.post_repo.create_in(&txn, model).await?;

        self.ledger
            .record_in(
                &txn,
                user.id,
                ActivityType::Post,
                ActivityTarget::post(post.id),
                None,
            )
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(post_id = post.id, user_id, "Post published");
        Ok(post)
    }

    /// Share a post. Every share is a fresh ledger entry.
    pub async fn share(&self, user_id: i64, post_id: i64) -> AppResult<activity::Model> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let post = self.post_repo.get_by_id(post_id).await?;

        let entry = self
            .ledger
            .record(
                user.id,
                ActivityType::Share,
                ActivityTarget::post_of(post.id, post.user_id),
                None,
            )
            .await?;

        info!(post_id, user_id, "Post shared");
        Ok(entry)
    }

    /// Delete a post owned by `user_id` together with every ledger entry
    /// targeting it.
    ///
    /// Like marks for the post are kept.
    pub async fn delete(&self, user_id: i64, post_id: i64) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if post.user_id != user_id {
            return Err(AppError::Forbidden(
                "Cannot delete another user's post".to_string(),
            ));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let removed = self.ledger.delete_by_post_in(&txn, post.id).await?;
        self.post_repo.delete_in(&txn, post.id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(post_id, user_id, removed_entries = removed, "Post deleted");
        Ok(())
    }
}
