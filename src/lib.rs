pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{accounts::Accounts, catalog::Catalog, config::Config, error::AppResult};

pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Catalog,
    pub accounts: Accounts,
}

impl AppState {
    /// Connects to the configured database and migrates it.
    pub async fn connect(config: Config) -> AppResult<Arc<Self>> {
        let db = db::connect_and_migrate(&config.database_url).await?;
        Ok(Arc::new(Self {
            config: Arc::new(config),
            catalog: Catalog::new(db.clone()),
            accounts: Accounts::new(db),
        }))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users/", post(routes::register))
        .route("/token/", post(routes::obtain_token))
        .route("/user/me/", get(routes::me))
        .route("/movies/", get(routes::list_movies).post(routes::create_movie))
        .route(
            "/movies/{id}/",
            get(routes::movie_detail).put(routes::update_movie).patch(routes::update_movie),
        )
        .route("/movies/{id}/comments/", get(routes::list_comments).post(routes::create_comment))
        .route("/movies/{id}/actors/", get(routes::list_casting).post(routes::create_casting))
        .route("/movies/{id}/like/", post(routes::toggle_like))
        .route("/movies/{id}/rate/", post(routes::rate_movie))
        .route("/actors/", get(routes::list_actors).post(routes::create_actor))
        .route("/actors/{id}/", get(routes::actor_detail))
        .route("/actors/{id}/movies/", get(routes::actor_movies))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}
