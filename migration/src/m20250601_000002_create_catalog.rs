use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(string_len(Movie::TitleFr, 255))
                    .col(string_len(Movie::TitleOriginal, 255).default(""))
                    .col(string_len(Movie::OriginCountry, 100).default(""))
                    .col(integer_null(Movie::DurationMinutes))
                    .col(string_len(Movie::Director, 255).default(""))
                    .col(text(Movie::Description).default(""))
                    .col(string_null(Movie::ReleaseDate))
                    .col(string_null(Movie::Poster))
                    .col(string_null(Movie::Illustration))
                    .col(double_null(Movie::AvgRating))
                    .col(big_integer(Movie::CreatedAt))
                    .col(big_integer(Movie::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_release_date")
                    .table(Movie::Table)
                    .col(Movie::ReleaseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actor::Table)
                    .if_not_exists()
                    .col(pk_auto(Actor::Id))
                    .col(string_len(Actor::FirstName, 100).default(""))
                    .col(string_len(Actor::LastName, 100))
                    .col(string_len(Actor::FullName, 200).default(""))
                    .col(string_null(Actor::BirthDate))
                    .col(text(Actor::Biography).default(""))
                    .col(string_null(Actor::Photo))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Casting::Table)
                    .if_not_exists()
                    .col(pk_auto(Casting::Id))
                    .col(integer(Casting::MovieId))
                    .col(integer(Casting::ActorId))
                    .col(string_len(Casting::RoleName, 200).default(""))
                    .col(integer(Casting::Order).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_casting_movie")
                            .from(Casting::Table, Casting::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_casting_actor")
                            .from(Casting::Table, Casting::ActorId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_casting_unique")
                    .table(Casting::Table)
                    .col(Casting::MovieId)
                    .col(Casting::ActorId)
                    .col(Casting::RoleName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_casting_actor")
                    .table(Casting::Table)
                    .col(Casting::ActorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Casting::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Actor::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Movie {
    Table,
    Id,
    TitleFr,
    TitleOriginal,
    OriginCountry,
    DurationMinutes,
    Director,
    Description,
    ReleaseDate,
    Poster,
    Illustration,
    AvgRating,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Actor {
    Table,
    Id,
    FirstName,
    LastName,
    FullName,
    BirthDate,
    Biography,
    Photo,
}

#[derive(DeriveIden)]
enum Casting {
    Table,
    Id,
    MovieId,
    ActorId,
    RoleName,
    Order,
}
