//! Typed feed items.

use chrono::{DateTime, Utc};
use plaza_common::{ActivityKind, FeedEntry, PostSummary, UserSummary};

use crate::error::ClientError;

/// An entry about a post (publish, like or share).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostItem {
    /// Ledger entry ID.
    pub id: String,
    /// Who published, liked or shared.
    pub actor: UserSummary,
    /// The post, with the viewer's like state.
    pub post: PostSummary,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// An entry about a follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowItem {
    /// Ledger entry ID.
    pub id: String,
    /// The follower.
    pub actor: UserSummary,
    /// The followed user.
    pub target: UserSummary,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// A feed entry held by the client cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    /// The actor published a post.
    Post(PostItem),
    /// The actor liked a post.
    Like(PostItem),
    /// The actor shared a post.
    Share(PostItem),
    /// The actor followed a user.
    Follow(FollowItem),
}

impl FeedItem {
    /// Ledger entry ID.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Post(item) | Self::Like(item) | Self::Share(item) => &item.id,
            Self::Follow(item) => &item.id,
        }
    }

    /// Activity kind of the entry.
    #[must_use]
    pub const fn kind(&self) -> ActivityKind {
        match self {
            Self::Post(_) => ActivityKind::Post,
            Self::Like(_) => ActivityKind::Like,
            Self::Share(_) => ActivityKind::Share,
            Self::Follow(_) => ActivityKind::Follow,
        }
    }

    /// The user who acted.
    #[must_use]
    pub const fn actor(&self) -> &UserSummary {
        match self {
            Self::Post(item) | Self::Like(item) | Self::Share(item) => &item.actor,
            Self::Follow(item) => &item.actor,
        }
    }

    /// The target post, if this entry has one.
    #[must_use]
    pub const fn post(&self) -> Option<&PostSummary> {
        match self {
            Self::Post(item) | Self::Like(item) | Self::Share(item) => Some(&item.post),
            Self::Follow(_) => None,
        }
    }

    pub(crate) fn post_mut(&mut self) -> Option<&mut PostSummary> {
        match self {
            Self::Post(item) | Self::Like(item) | Self::Share(item) => Some(&mut item.post),
            Self::Follow(_) => None,
        }
    }

    /// Every user summary embedded in the item: the actor, the post owner and
    /// the follow target.
    pub(crate) fn users_mut(&mut self) -> Vec<&mut UserSummary> {
        match self {
            Self::Post(item) | Self::Like(item) | Self::Share(item) => {
                vec![&mut item.actor, &mut item.post.owner]
            }
            Self::Follow(item) => vec![&mut item.actor, &mut item.target],
        }
    }
}

impl TryFrom<FeedEntry> for FeedItem {
    type Error = ClientError;

    fn try_from(entry: FeedEntry) -> Result<Self, Self::Error> {
        let FeedEntry {
            id,
            kind,
            actor,
            target_user,
            target_post,
            created_at,
        } = entry;

        if kind == ActivityKind::Follow {
            let Some(target) = target_user else {
                return Err(ClientError::InvalidEntry {
                    id,
                    reason: "missing target user",
                });
            };
            return Ok(Self::Follow(FollowItem {
                id,
                actor,
                target,
                created_at,
            }));
        }

        let Some(post) = target_post else {
            return Err(ClientError::InvalidEntry {
                id,
                reason: "missing target post",
            });
        };
        let item = PostItem {
            id,
            actor,
            post,
            created_at,
        };

        Ok(match kind {
            ActivityKind::Like => Self::Like(item),
            ActivityKind::Share => Self::Share(item),
            _ => Self::Post(item),
        })
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_follow_entry_becomes_follow_item() {
        let entry = entry(
            "a1",
            ActivityKind::Follow,
            user(1, "alice"),
            Some(user(2, "bob")),
            None,
        );

        let item = FeedItem::try_from(entry).unwrap();
        assert_eq!(item.kind(), ActivityKind::Follow);
        assert_eq!(item.actor().username, "alice");
        assert!(item.post().is_none());
    }

    #[test]
    fn test_share_entry_keeps_post() {
        let entry = entry(
            "a1",
            ActivityKind::Share,
            user(1, "alice"),
            Some(user(2, "bob")),
            Some(post(10, user(2, "bob"), 0)),
        );

        let item = FeedItem::try_from(entry).unwrap();
        assert_eq!(item.kind(), ActivityKind::Share);
        assert_eq!(item.post().unwrap().owner.username, "bob");
    }

    #[test]
    fn test_like_entry_without_post_is_rejected() {
        let entry = entry("a1", ActivityKind::Like, user(1, "alice"), None, None);

        let err = FeedItem::try_from(entry).unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidEntry { reason: "missing target post", .. }
        ));
    }

    #[test]
    fn test_follow_entry_without_target_is_rejected() {
        let entry = entry("a1", ActivityKind::Follow, user(1, "alice"), None, None);
        assert!(FeedItem::try_from(entry).is_err());
    }
}
