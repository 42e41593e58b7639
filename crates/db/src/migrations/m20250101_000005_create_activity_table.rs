//! Create activity ledger table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // target_post_id carries no foreign key; entries are removed
        // explicitly in the post deletion transaction.
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activity::ActorId).big_integer().not_null())
                    .col(ColumnDef::new(Activity::ActivityType).string_len(16).not_null())
                    .col(ColumnDef::new(Activity::TargetUserId).big_integer())
                    .col(ColumnDef::new(Activity::TargetPostId).big_integer())
                    .col(
                        ColumnDef::new(Activity::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Activity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_actor")
                            .from(Activity::Table, Activity::ActorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (actor_id, created_at) - feed scans
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_actor_created_at")
                    .table(Activity::Table)
                    .col(Activity::ActorId)
                    .col(Activity::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (actor_id, activity_type, target_user_id) - follow dedupe key
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_follow_key")
                    .table(Activity::Table)
                    .col(Activity::ActorId)
                    .col(Activity::ActivityType)
                    .col(Activity::TargetUserId)
                    .to_owned(),
            )
            .await?;

        // Index: target_post_id - like dedupe key and post deletion
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_target_post_id")
                    .table(Activity::Table)
                    .col(Activity::TargetPostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
    ActorId,
    ActivityType,
    TargetUserId,
    TargetPostId,
    Active,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
