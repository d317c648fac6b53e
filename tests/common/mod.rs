#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use moviedb::{
    AppState, accounts::Accounts, catalog::Catalog, config::Config, db::connect_and_migrate,
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

/// The production router over a fresh in-memory database.
pub async fn spawn() -> TestApp {
    let config = Config::for_tests();
    let db = connect_and_migrate(&config.database_url).await.expect("in-memory database");
    let state = Arc::new(AppState {
        config: Arc::new(config),
        catalog: Catalog::new(db.clone()),
        accounts: Accounts::new(db.clone()),
    });
    TestApp { router: moviedb::router(state), db }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Registers `username` and returns an access token for it.
    pub async fn login_as(&self, username: &str) -> String {
        let password = "test_password_123!";
        let (status, _) = self
            .post("/users/", None, json!({ "username": username, "password": password }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "registering {username}");

        let (status, body) = self
            .post("/token/", None, json!({ "username": username, "password": password }))
            .await;
        assert_eq!(status, StatusCode::OK, "logging in {username}");
        body["access"].as_str().expect("access token").to_string()
    }

    pub async fn create_actor(&self, token: &str, first: &str, last: &str) -> i64 {
        let (status, body) = self
            .post("/actors/", Some(token), json!({ "first_name": first, "last_name": last }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_movie(&self, token: &str, body: Value) -> i64 {
        let (status, body) = self.post("/movies/", Some(token), body).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}
