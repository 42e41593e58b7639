//! Client-side reconciliation for plaza feeds.
//!
//! A [`FeedSession`] mirrors one server feed in a [`FeedCache`], applies
//! optimistic [`Patch`]es for follow and like toggles, and reloads the feed
//! from the server through an [`EngagementApi`] whenever the server disagrees.
//!
//! With the `local` feature, [`LocalApi`] serves the API from in-process core
//! services.

pub mod api;
pub mod cache;
pub mod error;
pub mod item;
#[cfg(feature = "local")]
pub mod local;
pub mod patch;
pub mod session;

pub use api::{EngagementApi, FeedSource};
pub use cache::FeedCache;
pub use error::{ClientError, ClientResult};
pub use item::{FeedItem, FollowItem, PostItem};
#[cfg(feature = "local")]
pub use local::LocalApi;
pub use patch::Patch;
pub use session::{FeedSession, ToggleOutcome};
