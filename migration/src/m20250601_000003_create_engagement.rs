use sea_orm_migration::{prelude::*, schema::*};

use crate::{m20250601_000001_create_users::Users, m20250601_000002_create_catalog::Movie};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MovieLike::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieLike::Id))
                    .col(integer(MovieLike::UserId))
                    .col(integer(MovieLike::MovieId))
                    .col(boolean(MovieLike::Liked).default(true))
                    .col(big_integer(MovieLike::CreatedAt))
                    .col(big_integer(MovieLike::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_like_user")
                            .from(MovieLike::Table, MovieLike::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_like_movie")
                            .from(MovieLike::Table, MovieLike::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_like_unique")
                    .table(MovieLike::Table)
                    .col(MovieLike::UserId)
                    .col(MovieLike::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_like_movie")
                    .table(MovieLike::Table)
                    .col(MovieLike::MovieId)
                    .col(MovieLike::Liked)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(pk_auto(Rating::Id))
                    .col(integer(Rating::UserId))
                    .col(integer(Rating::MovieId))
                    .col(small_integer(Rating::Score))
                    .col(text(Rating::Review).default(""))
                    .col(big_integer(Rating::CreatedAt))
                    .col(big_integer(Rating::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_user")
                            .from(Rating::Table, Rating::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_movie")
                            .from(Rating::Table, Rating::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rating_unique")
                    .table(Rating::Table)
                    .col(Rating::UserId)
                    .col(Rating::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(pk_auto(Comment::Id))
                    .col(integer(Comment::MovieId))
                    .col(integer_null(Comment::AuthorId))
                    .col(text(Comment::Text))
                    .col(big_integer(Comment::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_movie")
                            .from(Comment::Table, Comment::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_author")
                            .from(Comment::Table, Comment::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comment_movie_created_at")
                    .table(Comment::Table)
                    .col(Comment::MovieId)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Comment::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Rating::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieLike::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum MovieLike {
    Table,
    Id,
    UserId,
    MovieId,
    Liked,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Rating {
    Table,
    Id,
    UserId,
    MovieId,
    Score,
    Review,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Comment {
    Table,
    Id,
    MovieId,
    AuthorId,
    Text,
    CreatedAt,
}
