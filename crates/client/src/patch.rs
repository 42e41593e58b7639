//! Optimistic cache patches.

use crate::item::FeedItem;

/// A speculative change applied to cached items before the server confirms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch {
    /// The viewer followed or unfollowed a user.
    Follow { user_id: i64, following: bool },
    /// The viewer liked or unliked a post.
    Like { post_id: i64, liked: bool },
    /// The viewer deleted one of their posts.
    DeletePost { post_id: i64 },
}

impl Patch {
    /// Apply the patch to every affected item.
    pub fn apply(&self, items: &mut Vec<FeedItem>) {
        match *self {
            Self::Follow { user_id, following } => {
                for item in items.iter_mut() {
                    for user in item.users_mut() {
                        if user.id == user_id {
                            user.followed_by_me = following;
                        }
                    }
                }
            }
            Self::Like { post_id, liked } => {
                for post in items.iter_mut().filter_map(FeedItem::post_mut) {
                    // Skip posts already in the requested state so the count
                    // moves once per transition.
                    if post.id != post_id || post.liked_by_me == liked {
                        continue;
                    }
                    post.liked_by_me = liked;
                    post.likes_count = if liked {
                        post.likes_count + 1
                    } else {
                        (post.likes_count - 1).max(0)
                    };
                }
            }
            Self::DeletePost { post_id } => {
                items.retain(|item| item.post().is_none_or(|post| post.id != post_id));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::item::fixtures::{entry, post, user};
    use plaza_common::ActivityKind;

    fn items() -> Vec<FeedItem> {
        let alice = user(1, "alice");
        let bob = user(2, "bob");
        let carol = user(3, "carol");
        vec![
            // carol liked bob's post
            entry(
                "a3",
                ActivityKind::Like,
                carol.clone(),
                None,
                Some(post(10, bob.clone(), 2)),
            ),
            // alice followed bob
            entry("a2", ActivityKind::Follow, alice, Some(bob.clone()), None),
            // bob published post 10
            entry(
                "a1",
                ActivityKind::Post,
                bob.clone(),
                None,
                Some(post(10, bob, 2)),
            ),
        ]
        .into_iter()
        .map(|e| FeedItem::try_from(e).unwrap())
        .collect()
    }

    #[test]
    fn test_follow_patch_touches_actor_target_and_owner() {
        let mut items = items();
        Patch::Follow {
            user_id: 2,
            following: true,
        }
        .apply(&mut items);

        // owner of the liked post
        assert!(items[0].post().unwrap().owner.followed_by_me);
        assert!(!items[0].actor().followed_by_me);
        // follow target
        match &items[1] {
            FeedItem::Follow(follow) => assert!(follow.target.followed_by_me),
            other => panic!("unexpected item {other:?}"),
        }
        // actor
        assert!(items[2].actor().followed_by_me);
    }

    #[test]
    fn test_like_patch_updates_every_copy_once() {
        let mut items = items();
        let like = Patch::Like {
            post_id: 10,
            liked: true,
        };
        like.apply(&mut items);
        like.apply(&mut items);

        for item in [&items[0], &items[2]] {
            let post = item.post().unwrap();
            assert!(post.liked_by_me);
            assert_eq!(post.likes_count, 3);
        }
    }

    #[test]
    fn test_unlike_patch_floors_count() {
        let mut items: Vec<FeedItem> = vec![
            FeedItem::try_from(entry(
                "a1",
                ActivityKind::Post,
                user(2, "bob"),
                None,
                Some(post(10, user(2, "bob"), 0)),
            ))
            .unwrap(),
        ];
        if let FeedItem::Post(item) = &mut items[0] {
            item.post.liked_by_me = true;
        }

        Patch::Like {
            post_id: 10,
            liked: false,
        }
        .apply(&mut items);

        let post = items[0].post().unwrap();
        assert!(!post.liked_by_me);
        assert_eq!(post.likes_count, 0);
    }

    #[test]
    fn test_delete_patch_removes_items_referencing_post() {
        let mut items = items();
        Patch::DeletePost { post_id: 10 }.apply(&mut items);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind(), ActivityKind::Follow);
    }
}
