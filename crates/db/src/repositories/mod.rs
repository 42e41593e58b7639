//! Repositories.
//!
//! Each repository wraps the shared connection for plain reads. Methods
//! suffixed `_in` take an explicit connection so services can run them inside
//! a transaction.

mod activity;
mod following;
mod like_mark;
mod post;
mod user;

pub use activity::{ActivityKey, ActivityRepository, FeedFilter};
pub use following::FollowingRepository;
pub use like_mark::LikeMarkRepository;
pub use post::PostRepository;
pub use user::UserRepository;

use plaza_common::{AppError, AppResult};
use sea_orm::{DbErr, SqlErr};

/// Result of an insert that tolerates a unique-key conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written by this call.
    Inserted,
    /// A row with the same unique key already existed.
    AlreadyExists,
}

impl InsertOutcome {
    /// Whether this call wrote the row.
    #[must_use]
    pub const fn is_inserted(self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// Classify the result of an `ON CONFLICT DO NOTHING` insert.
///
/// Postgres reports a skipped row as zero rows affected, which sea-orm turns
/// into `RecordNotInserted`. Backends without the clause raise a unique
/// violation instead.
pub(crate) fn classify_insert<T>(result: Result<T, DbErr>) -> AppResult<InsertOutcome> {
    match result {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(DbErr::RecordNotInserted) => Ok(InsertOutcome::AlreadyExists),
        Err(e) => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Ok(InsertOutcome::AlreadyExists),
            _ => Err(AppError::Database(e.to_string())),
        },
    }
}
