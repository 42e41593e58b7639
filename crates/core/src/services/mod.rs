//! Business logic services.

#![allow(missing_docs)]

pub mod activity;
pub mod engagement;
pub mod feed;
pub mod post;

pub use activity::{ActivityLedger, ActivityTarget};
pub use engagement::EngagementService;
pub use feed::{FeedOptions, FeedService};
pub use post::{PostService, PublishPost};

use std::sync::Arc;

use plaza_common::{Config, SharedClock};
use sea_orm::DatabaseConnection;

/// Every service, wired over one connection pool and one clock.
#[derive(Clone)]
pub struct Services {
    pub ledger: ActivityLedger,
    pub engagement: EngagementService,
    pub posts: PostService,
    pub feed: FeedService,
}

impl Services {
    /// Build the service set.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config, clock: SharedClock) -> Self {
        Self {
            ledger: ActivityLedger::new(db.clone(), clock.clone()),
            engagement: EngagementService::new(db.clone(), clock.clone()),
            posts: PostService::new(db.clone(), clock),
            feed: FeedService::new(db, config.feed),
        }
    }
}
