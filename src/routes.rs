use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, State},
    http::StatusCode,
};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};

use crate::{
    AppState,
    auth::{self, AuthUser, MaybeUser, TOKEN_COOKIE},
    error::{AppError, AppResult},
    models::{
        self, ActorCreate, ActorRead, CastingRead, CastingWrite, CommentRead, CommentWrite,
        LikeToggled, MovieDetail, MovieListItem, MovieWrite, Page, PageQuery, Rated, RatingWrite,
        TokenRequest, TokenResponse, UserCreate, UserRead,
    },
};

/// `Json` whose rejections render as [`AppError`] bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `Path` whose rejections (non-numeric or out-of-range ids) render as
/// [`AppError`] bodies.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathId<T>(pub T);

type Shared = State<Arc<AppState>>;

/// A JSON object body, typed field by field with [`models::from_fields`].
type Fields = serde_json::Map<String, serde_json::Value>;

// -----------------------------------------------------------------------------
// Accounts
// -----------------------------------------------------------------------------

pub async fn register(
    State(state): Shared,
    JsonBody(body): JsonBody<Fields>,
) -> AppResult<(StatusCode, Json<UserRead>)> {
    let body: UserCreate = models::from_fields(body)?;
    body.validate(state.config.password_min_length)?;
    let user = state.accounts.register(&body.username, &body.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn obtain_token(
    State(state): Shared,
    jar: CookieJar,
    JsonBody(body): JsonBody<TokenRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let user = state
        .accounts
        .authenticate(&body.username, &body.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid username or password".into()))?;

    let ttl = state.config.token_ttl_minutes;
    let token = auth::issue_token(user.id, &user.username, &state.config.jwt_secret, ttl)
        .map_err(|e| anyhow::anyhow!("token signing failed: {e}"))?;

    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(ttl));

    tracing::debug!(user_id = user.id, "token issued");
    Ok((
        jar.add(cookie),
        Json(TokenResponse { access: token, token_type: "Bearer", expires_in: ttl * 60 }),
    ))
}

pub async fn me(user: AuthUser) -> Json<UserRead> {
    Json(UserRead { id: user.user_id, username: user.username })
}

// -----------------------------------------------------------------------------
// Movies
// -----------------------------------------------------------------------------

pub async fn list_movies(
    State(state): Shared,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<Page<MovieListItem>>> {
    let page = match q.page.as_deref() {
        None | Some("") => 1,
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| AppError::InvalidPage(format!("{raw:?} is not a page number")))?,
    };
    let page_size = q
        .page_size
        .as_deref()
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(state.config.page_size)
        .min(state.config.max_page_size);

    Ok(Json(state.catalog.list_movies(page, page_size).await?))
}

pub async fn movie_detail(
    State(state): Shared,
    PathId(id): PathId<i32>,
    viewer: MaybeUser,
) -> AppResult<Json<MovieDetail>> {
    Ok(Json(state.catalog.movie_detail(id, viewer.id()).await?))
}

pub async fn create_movie(
    State(state): Shared,
    user: AuthUser,
    JsonBody(body): JsonBody<Fields>,
) -> AppResult<(StatusCode, Json<MovieDetail>)> {
    let changes = models::from_fields::<MovieWrite>(body)?.validate(true)?;
    let id = state.catalog.create_movie(changes).await?;
    let detail = state.catalog.movie_detail(id, Some(user.user_id)).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn update_movie(
    State(state): Shared,
    PathId(id): PathId<i32>,
    user: AuthUser,
    JsonBody(body): JsonBody<Fields>,
) -> AppResult<Json<MovieDetail>> {
    let changes = models::from_fields::<MovieWrite>(body)?.validate(false)?;
    state.catalog.update_movie(id, changes).await?;
    Ok(Json(state.catalog.movie_detail(id, Some(user.user_id)).await?))
}

// -----------------------------------------------------------------------------
// Comments
// -----------------------------------------------------------------------------

pub async fn list_comments(
    State(state): Shared,
    PathId(movie_id): PathId<i32>,
) -> AppResult<Json<Vec<CommentRead>>> {
    Ok(Json(state.catalog.comments(movie_id).await?))
}

pub async fn create_comment(
    State(state): Shared,
    PathId(movie_id): PathId<i32>,
    user: AuthUser,
    JsonBody(body): JsonBody<Fields>,
) -> AppResult<(StatusCode, Json<CommentRead>)> {
    let text = models::from_fields::<CommentWrite>(body)?.validate()?;
    let comment = state.catalog.add_comment(movie_id, Some(user.user_id), text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// -----------------------------------------------------------------------------
// Casting and actors
// -----------------------------------------------------------------------------

pub async fn list_casting(
    State(state): Shared,
    PathId(movie_id): PathId<i32>,
) -> AppResult<Json<Vec<CastingRead>>> {
    Ok(Json(state.catalog.cast(movie_id).await?))
}

pub async fn create_casting(
    State(state): Shared,
    PathId(movie_id): PathId<i32>,
    _user: AuthUser,
    JsonBody(body): JsonBody<Fields>,
) -> AppResult<(StatusCode, Json<CastingRead>)> {
    let entry = models::from_fields::<CastingWrite>(body)?.validate()?;
    let casting = state.catalog.add_casting(movie_id, entry).await?;
    Ok((StatusCode::CREATED, Json(casting)))
}

pub async fn list_actors(State(state): Shared) -> AppResult<Json<Vec<ActorRead>>> {
    Ok(Json(state.catalog.actors().await?))
}

pub async fn create_actor(
    State(state): Shared,
    _user: AuthUser,
    JsonBody(body): JsonBody<Fields>,
) -> AppResult<(StatusCode, Json<ActorRead>)> {
    let new = models::from_fields::<ActorCreate>(body)?.validate()?;
    let actor = state.catalog.create_actor(new).await?;
    Ok((StatusCode::CREATED, Json(actor)))
}

pub async fn actor_detail(
    State(state): Shared,
    PathId(id): PathId<i32>,
) -> AppResult<Json<ActorRead>> {
    Ok(Json(state.catalog.actor(id).await?))
}

pub async fn actor_movies(
    State(state): Shared,
    PathId(id): PathId<i32>,
) -> AppResult<Json<Vec<MovieListItem>>> {
    Ok(Json(state.catalog.actor_movies(id).await?))
}

// -----------------------------------------------------------------------------
// Likes and ratings
// -----------------------------------------------------------------------------

pub async fn toggle_like(
    State(state): Shared,
    PathId(movie_id): PathId<i32>,
    user: AuthUser,
) -> AppResult<Json<LikeToggled>> {
    Ok(Json(state.catalog.toggle_like(movie_id, user.user_id).await?))
}

pub async fn rate_movie(
    State(state): Shared,
    PathId(movie_id): PathId<i32>,
    user: AuthUser,
    JsonBody(body): JsonBody<RatingWrite>,
) -> AppResult<(StatusCode, Json<Rated>)> {
    let rating = body.validate()?;
    let (rated, created) = state.catalog.rate(movie_id, user.user_id, rating).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(rated)))
}
