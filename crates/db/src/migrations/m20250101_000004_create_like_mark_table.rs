//! Create like mark table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key on post_id: marks are kept when a post is deleted.
        manager
            .create_table(
                Table::create()
                    .table(LikeMark::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LikeMark::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LikeMark::UserId).big_integer().not_null())
                    .col(ColumnDef::new(LikeMark::PostId).big_integer().not_null())
                    .col(
                        ColumnDef::new(LikeMark::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LikeMark::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(LikeMark::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_like_mark_user")
                            .from(LikeMark::Table, LikeMark::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, post_id) - one mark per user and post
        manager
            .create_index(
                Index::create()
                    .name("idx_like_mark_user_post")
                    .table(LikeMark::Table)
                    .col(LikeMark::UserId)
                    .col(LikeMark::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: post_id (likes of a post)
        manager
            .create_index(
                Index::create()
                    .name("idx_like_mark_post_id")
                    .table(LikeMark::Table)
                    .col(LikeMark::PostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LikeMark::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum LikeMark {
    Table,
    Id,
    UserId,
    PostId,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
