//! Activity entity (the activity ledger).

use plaza_common::ActivityKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recorded action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ActivityType {
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "share")]
    Share,
    #[sea_orm(string_value = "follow")]
    Follow,
}

impl From<ActivityKind> for ActivityType {
    fn from(kind: ActivityKind) -> Self {
        match kind {
            ActivityKind::Post => Self::Post,
            ActivityKind::Like => Self::Like,
            ActivityKind::Share => Self::Share,
            ActivityKind::Follow => Self::Follow,
        }
    }
}

impl From<ActivityType> for ActivityKind {
    fn from(ty: ActivityType) -> Self {
        match ty {
            ActivityType::Post => Self::Post,
            ActivityType::Like => Self::Like,
            ActivityType::Share => Self::Share,
            ActivityType::Follow => Self::Follow,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who acted
    #[sea_orm(indexed)]
    pub actor_id: i64,

    pub activity_type: ActivityType,

    /// Followed user (Follow) or owner of the shared post (Share)
    #[sea_orm(nullable)]
    pub target_user_id: Option<i64>,

    /// Published, liked or shared post
    #[sea_orm(nullable)]
    pub target_post_id: Option<i64>,

    /// Current validity of the action
    pub active: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ActorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Actor,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
