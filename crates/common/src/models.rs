//! Feed wire models shared by the server and the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A post was published.
    Post,
    /// A post was liked (or unliked, when inactive).
    Like,
    /// A post was shared.
    Share,
    /// A user was followed.
    Follow,
}

/// Actor or target user as seen by a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    /// Whether the viewer currently follows this user.
    pub followed_by_me: bool,
}

/// Target post as seen by a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub text: String,
    pub owner: UserSummary,
    pub likes_count: i64,
    /// Whether the viewer currently likes this post.
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
}

/// One ledger entry joined with its actor and targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: String,
    pub kind: ActivityKind,
    pub actor: UserSummary,
    pub target_user: Option<UserSummary>,
    pub target_post: Option<PostSummary>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_activity_kind_wire_format() {
        assert_eq!(serde_json::to_value(ActivityKind::Follow).unwrap(), json!("follow"));
        let kind: ActivityKind = serde_json::from_value(json!("share")).unwrap();
        assert_eq!(kind, ActivityKind::Share);
    }

    #[test]
    fn test_feed_entry_uses_camel_case() {
        let entry = FeedEntry {
            id: "01jabc".to_string(),
            kind: ActivityKind::Follow,
            actor: UserSummary {
                id: 1,
                username: "bob".to_string(),
                name: None,
                followed_by_me: false,
            },
            target_user: Some(UserSummary {
                id: 2,
                username: "alice".to_string(),
                name: Some("Alice".to_string()),
                followed_by_me: true,
            }),
            target_post: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["targetUser"]["followedByMe"], json!(true));
        assert_eq!(value["targetPost"], json!(null));
        assert_eq!(value["createdAt"], json!("1970-01-01T00:00:00Z"));
    }
}
