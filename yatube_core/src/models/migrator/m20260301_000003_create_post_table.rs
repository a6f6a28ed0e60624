use sea_orm_migration::{prelude::*, schema::*};

use super::m20260301_000001_create_user_table::User;
use super::m20260301_000002_create_group_table::Group;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .col(pk_uuid(Post::Id))
                    .col(text(Post::Text))
                    .col(timestamp_with_time_zone(Post::PubDate))
                    .col(uuid(Post::AuthorId))
                    .col(uuid_null(Post::GroupId))
                    .col(string_null(Post::Image))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post-author_id")
                            .from(Post::Table, Post::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post-group_id")
                            .from(Post::Table, Post::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_author_id")
                    .table(Post::Table)
                    .col(Post::AuthorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_group_id")
                    .table(Post::Table)
                    .col(Post::GroupId)
                    .to_owned(),
            )
            .await?;

        // Every feed orders by publication date
        manager
            .create_index(
                Index::create()
                    .name("idx_posts_pub_date")
                    .table(Post::Table)
                    .col(Post::PubDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Post {
    Table,
    Id,
    Text,
    PubDate,
    AuthorId,
    GroupId,
    Image,
}
