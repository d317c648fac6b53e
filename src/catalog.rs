use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
    sea_query::{Expr, Func, OnConflict, SimpleExpr},
};

use crate::{
    entities::{actor, casting, comment, like, movie, rating, user},
    error::{AppError, AppResult},
    models::{
        ActorRead, CastingRead, CommentRead, LikeToggled, MovieChanges, MovieDetail,
        MovieListItem, NewActor, NewCasting, NewRating, Page, Rated, ViewerState,
    },
};

/// Movies, actors, casting and the per-user engagement rows attached to
/// movies. Every operation that depends on who is asking takes the caller's
/// id as an argument.
#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // -------------------------------------------------------------------------
    // Movies
    // -------------------------------------------------------------------------

    pub async fn list_movies(&self, page: u64, page_size: u64) -> AppResult<Page<MovieListItem>> {
        if page == 0 {
            return Err(AppError::InvalidPage("pages start at 1".into()));
        }

        let paginator = ordered_movies(movie::Entity::find()).paginate(&self.db, page_size);
        let count = paginator.num_items().await?;
        let pages = count.div_ceil(page_size).max(1);
        if page > pages {
            return Err(AppError::InvalidPage(format!("page {page} is past the last page")));
        }

        let movies = paginator.fetch_page(page - 1).await?;
        let results = self.with_likes(movies).await?;
        Ok(Page { count, page, page_size, results })
    }

    pub async fn movie_detail(&self, id: i32, viewer: Option<i32>) -> AppResult<MovieDetail> {
        let movie = find_movie(&self.db, id).await?;
        let (likes_count, cast, comments, viewer) = futures::try_join!(
            likes_count(&self.db, id),
            self.cast_of(id),
            self.comments_of(id),
            self.viewer_state(id, viewer),
        )?;
        Ok(MovieDetail::new(movie, likes_count, cast, comments, viewer))
    }

    pub async fn create_movie(&self, changes: MovieChanges) -> AppResult<i32> {
        let now = now_sec();
        let txn = self.db.begin().await?;

        let model = movie::ActiveModel {
            id: Default::default(),
            title_fr: Set(changes.title_fr.unwrap_or_default()),
            title_original: Set(changes.title_original.unwrap_or_default()),
            origin_country: Set(changes.origin_country.unwrap_or_default()),
            duration_minutes: Set(changes.duration_minutes.flatten()),
            director: Set(changes.director.unwrap_or_default()),
            description: Set(changes.description.unwrap_or_default()),
            release_date: Set(changes.release_date.flatten()),
            poster: Set(changes.poster.flatten()),
            illustration: Set(changes.illustration.flatten()),
            avg_rating: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&txn).await?;

        if let Some(cast) = &changes.cast {
            replace_cast(&txn, created.id, cast).await?;
        }

        txn.commit().await?;
        tracing::info!(movie_id = created.id, title = %created.title_fr, "movie created");
        Ok(created.id)
    }

    /// Applies the given fields. A submitted cast list replaces every
    /// existing casting row of the movie.
    pub async fn update_movie(&self, id: i32, changes: MovieChanges) -> AppResult<()> {
        let txn = self.db.begin().await?;
        let mut active: movie::ActiveModel = find_movie(&txn, id).await?.into();

        if let Some(v) = changes.title_fr {
            active.title_fr = Set(v);
        }
        if let Some(v) = changes.title_original {
            active.title_original = Set(v);
        }
        if let Some(v) = changes.origin_country {
            active.origin_country = Set(v);
        }
        if let Some(v) = changes.duration_minutes {
            active.duration_minutes = Set(v);
        }
        if let Some(v) = changes.director {
            active.director = Set(v);
        }
        if let Some(v) = changes.description {
            active.description = Set(v);
        }
        if let Some(v) = changes.release_date {
            active.release_date = Set(v);
        }
        if let Some(v) = changes.poster {
            active.poster = Set(v);
        }
        if let Some(v) = changes.illustration {
            active.illustration = Set(v);
        }
        active.updated_at = Set(now_sec());
        active.update(&txn).await?;

        if let Some(cast) = &changes.cast {
            replace_cast(&txn, id, cast).await?;
        }

        txn.commit().await?;
        tracing::info!(movie_id = id, cast_replaced = changes.cast.is_some(), "movie updated");
        Ok(())
    }

    async fn with_likes(&self, movies: Vec<movie::Model>) -> AppResult<Vec<MovieListItem>> {
        let ids: Vec<i32> = movies.iter().map(|m| m.id).collect();
        let counts = likes_counts(&self.db, &ids).await?;
        Ok(movies
            .into_iter()
            .map(|m| {
                let likes = counts.get(&m.id).copied().unwrap_or(0);
                MovieListItem::new(m, likes)
            })
            .collect())
    }

    async fn viewer_state(&self, movie_id: i32, viewer: Option<i32>) -> AppResult<ViewerState> {
        let Some(user_id) = viewer else {
            return Ok(ViewerState::default());
        };

        let liked = like::Entity::find()
            .filter(like::Column::MovieId.eq(movie_id))
            .filter(like::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .is_some_and(|l| l.liked);

        let rating = rating::Entity::find()
            .filter(rating::Column::MovieId.eq(movie_id))
            .filter(rating::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(|r| r.score);

        Ok(ViewerState { liked, rating })
    }

    // -------------------------------------------------------------------------
    // Casting and actors
    // -------------------------------------------------------------------------

    pub async fn cast(&self, movie_id: i32) -> AppResult<Vec<CastingRead>> {
        find_movie(&self.db, movie_id).await?;
        self.cast_of(movie_id).await
    }

    async fn cast_of(&self, movie_id: i32) -> AppResult<Vec<CastingRead>> {
        let rows = casting::Entity::find()
            .filter(casting::Column::MovieId.eq(movie_id))
            .order_by_asc(casting::Column::Order)
            .order_by_asc(casting::Column::Id)
            .find_also_related(actor::Entity)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|(c, a)| CastingRead::new(c, a)).collect())
    }

    pub async fn add_casting(&self, movie_id: i32, entry: NewCasting) -> AppResult<CastingRead> {
        find_movie(&self.db, movie_id).await?;

        let Some(actor) = actor::Entity::find_by_id(entry.actor_id).one(&self.db).await? else {
            return Err(AppError::field(
                "actor_id",
                format!("Invalid pk \"{}\" - object does not exist.", entry.actor_id),
            ));
        };

        let duplicate = casting::Entity::find()
            .filter(casting::Column::MovieId.eq(movie_id))
            .filter(casting::Column::ActorId.eq(entry.actor_id))
            .filter(casting::Column::RoleName.eq(entry.role_name.as_str()))
            .one(&self.db)
            .await?;
        if duplicate.is_some() {
            return Err(AppError::field(
                "non_field_errors",
                "The fields movie, actor, role_name must make a unique set.",
            ));
        }

        let created = casting_model(movie_id, &entry).insert(&self.db).await?;
        tracing::debug!(movie_id, actor_id = actor.id, casting_id = created.id, "casting added");
        Ok(CastingRead::new(created, Some(actor)))
    }

    pub async fn actors(&self) -> AppResult<Vec<ActorRead>> {
        let actors = actor::Entity::find()
            .order_by_asc(actor::Column::FullName)
            .order_by_asc(actor::Column::Id)
            .all(&self.db)
            .await?;
        Ok(actors.into_iter().map(Into::into).collect())
    }

    pub async fn actor(&self, id: i32) -> AppResult<ActorRead> {
        Ok(find_actor(&self.db, id).await?.into())
    }

    pub async fn create_actor(&self, new: NewActor) -> AppResult<ActorRead> {
        let model = actor::ActiveModel {
            id: Default::default(),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            full_name: Set(new.full_name),
            birth_date: Set(new.birth_date),
            biography: Set(new.biography),
            photo: Set(new.photo),
        };
        let created = model.insert(&self.db).await?;
        tracing::info!(actor_id = created.id, full_name = %created.full_name, "actor created");
        Ok(created.into())
    }

    /// Every movie the actor is cast in, once, in catalog order.
    pub async fn actor_movies(&self, actor_id: i32) -> AppResult<Vec<MovieListItem>> {
        find_actor(&self.db, actor_id).await?;
        let movies = ordered_movies(
            movie::Entity::find()
                .inner_join(casting::Entity)
                .filter(casting::Column::ActorId.eq(actor_id))
                .distinct(),
        )
        .all(&self.db)
        .await?;
        self.with_likes(movies).await
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    pub async fn comments(&self, movie_id: i32) -> AppResult<Vec<CommentRead>> {
        find_movie(&self.db, movie_id).await?;
        self.comments_of(movie_id).await
    }

    async fn comments_of(&self, movie_id: i32) -> AppResult<Vec<CommentRead>> {
        let rows = comment::Entity::find()
            .filter(comment::Column::MovieId.eq(movie_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|(c, u)| CommentRead::new(c, u)).collect())
    }

    /// `text` must already be validated.
    pub async fn add_comment(
        &self,
        movie_id: i32,
        author_id: Option<i32>,
        text: String,
    ) -> AppResult<CommentRead> {
        find_movie(&self.db, movie_id).await?;

        let author = match author_id {
            Some(id) => user::Entity::find_by_id(id).one(&self.db).await?,
            None => None,
        };

        let model = comment::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie_id),
            author_id: Set(author.as_ref().map(|a| a.id)),
            text: Set(text),
            created_at: Set(now_sec()),
        };
        let created = model.insert(&self.db).await?;
        tracing::debug!(
            movie_id,
            comment_id = created.id,
            author_id = ?created.author_id,
            "comment added"
        );
        Ok(CommentRead::new(created, author))
    }

    // -------------------------------------------------------------------------
    // Likes and ratings
    // -------------------------------------------------------------------------

    /// Creates the caller's like row as liked, or flips it if it exists. The
    /// upsert lets the unique (user, movie) index settle concurrent toggles.
    pub async fn toggle_like(&self, movie_id: i32, user_id: i32) -> AppResult<LikeToggled> {
        let txn = self.db.begin().await?;
        find_movie(&txn, movie_id).await?;

        let now = now_sec();
        let model = like::ActiveModel {
            id: Default::default(),
            user_id: Set(user_id),
            movie_id: Set(movie_id),
            liked: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        like::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([like::Column::UserId, like::Column::MovieId])
                    .value(
                        like::Column::Liked,
                        SimpleExpr::from(Expr::col(like::Column::Liked)).not(),
                    )
                    .update_column(like::Column::UpdatedAt)
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        let liked = like::Entity::find()
            .filter(like::Column::MovieId.eq(movie_id))
            .filter(like::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .is_some_and(|l| l.liked);
        let likes_count = likes_count(&txn, movie_id).await?;

        txn.commit().await?;
        tracing::info!(movie_id, user_id, liked, likes_count, "like toggled");
        Ok(LikeToggled { liked, likes_count })
    }

    /// Upserts the caller's rating and recomputes the movie's average from
    /// every rating on file. The flag is true when the rating was new.
    pub async fn rate(
        &self,
        movie_id: i32,
        user_id: i32,
        new: NewRating,
    ) -> AppResult<(Rated, bool)> {
        let txn = self.db.begin().await?;
        find_movie(&txn, movie_id).await?;

        let existing = find_rating(&txn, movie_id, user_id).await?;
        let created = existing.is_none();

        let now = now_sec();
        let mut update_columns = vec![rating::Column::Score, rating::Column::UpdatedAt];
        if new.review.is_some() {
            update_columns.push(rating::Column::Review);
        }
        let model = rating::ActiveModel {
            id: Default::default(),
            user_id: Set(user_id),
            movie_id: Set(movie_id),
            score: Set(new.score),
            review: Set(new.review.unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        rating::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([rating::Column::UserId, rating::Column::MovieId])
                    .update_columns(update_columns)
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        let rating = find_rating(&txn, movie_id, user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("rating for movie {movie_id} vanished after upsert"))?;

        let avg_rating = average_rating(&txn, movie_id).await?;
        movie::Entity::update_many()
            .col_expr(movie::Column::AvgRating, Expr::value(avg_rating))
            .filter(movie::Column::Id.eq(movie_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::info!(movie_id, user_id, score = rating.score, avg_rating, created, "movie rated");
        Ok((Rated { rating: rating.into(), avg_rating }, created))
    }
}

fn ordered_movies(select: Select<movie::Entity>) -> Select<movie::Entity> {
    select
        .order_by_desc(movie::Column::ReleaseDate)
        .order_by_asc(movie::Column::TitleFr)
        .order_by_asc(movie::Column::Id)
}

async fn find_movie<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<movie::Model> {
    movie::Entity::find_by_id(id).one(db).await?.ok_or_else(|| AppError::not_found("movie", id))
}

async fn find_actor<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<actor::Model> {
    actor::Entity::find_by_id(id).one(db).await?.ok_or_else(|| AppError::not_found("actor", id))
}

async fn find_rating<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    user_id: i32,
) -> AppResult<Option<rating::Model>> {
    Ok(rating::Entity::find()
        .filter(rating::Column::MovieId.eq(movie_id))
        .filter(rating::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Likes are never stored as a number on the movie; this count and the
/// batched [`likes_counts`] are the only sources of it.
async fn likes_count<C: ConnectionTrait>(db: &C, movie_id: i32) -> AppResult<u64> {
    Ok(like::Entity::find()
        .filter(like::Column::MovieId.eq(movie_id))
        .filter(like::Column::Liked.eq(true))
        .count(db)
        .await?)
}

async fn likes_counts<C: ConnectionTrait>(db: &C, ids: &[i32]) -> AppResult<HashMap<i32, u64>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i32, i64)> = like::Entity::find()
        .select_only()
        .column(like::Column::MovieId)
        .column_as(like::Column::Id.count(), "likes")
        .filter(like::Column::MovieId.is_in(ids.iter().copied()))
        .filter(like::Column::Liked.eq(true))
        .group_by(like::Column::MovieId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|(id, n)| (id, n.max(0) as u64)).collect())
}

/// Mean of every score on file, 0.0 when there are none.
async fn average_rating<C: ConnectionTrait>(db: &C, movie_id: i32) -> AppResult<f64> {
    let avg: Option<Option<f64>> = rating::Entity::find()
        .select_only()
        .column_as(SimpleExpr::from(Func::avg(Expr::col(rating::Column::Score))), "avg")
        .filter(rating::Column::MovieId.eq(movie_id))
        .into_tuple()
        .one(db)
        .await?;
    Ok(avg.flatten().unwrap_or(0.0))
}

/// Drops every casting row of the movie and inserts `cast` in its place.
/// Callers pass a transaction so the swap is atomic.
async fn replace_cast<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    cast: &[NewCasting],
) -> AppResult<()> {
    let mut wanted: Vec<i32> = cast.iter().map(|c| c.actor_id).collect();
    wanted.sort_unstable();
    wanted.dedup();

    let known: Vec<i32> = actor::Entity::find()
        .select_only()
        .column(actor::Column::Id)
        .filter(actor::Column::Id.is_in(wanted.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    let missing: Vec<String> = cast
        .iter()
        .enumerate()
        .filter(|(_, c)| !known.contains(&c.actor_id))
        .map(|(i, c)| {
            format!("[{i}] actor_id: Invalid pk \"{}\" - object does not exist.", c.actor_id)
        })
        .collect();
    if !missing.is_empty() {
        let mut fields = crate::error::FieldErrors::new();
        fields.insert("cast".to_string(), missing);
        return Err(AppError::Validation(fields));
    }

    let removed = casting::Entity::delete_many()
        .filter(casting::Column::MovieId.eq(movie_id))
        .exec(db)
        .await?
        .rows_affected;

    for entry in cast {
        casting_model(movie_id, entry).insert(db).await?;
    }

    tracing::debug!(movie_id, removed, inserted = cast.len(), "cast replaced");
    Ok(())
}

fn casting_model(movie_id: i32, entry: &NewCasting) -> casting::ActiveModel {
    casting::ActiveModel {
        id: Default::default(),
        movie_id: Set(movie_id),
        actor_id: Set(entry.actor_id),
        role_name: Set(entry.role_name.clone()),
        order: Set(entry.order),
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
