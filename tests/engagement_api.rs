//! Likes, ratings and comments.

mod common;

use axum::http::StatusCode;
use moviedb::entities::rating;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{Value, json};

async fn movie(app: &common::TestApp, token: &str) -> i64 {
    app.create_movie(token, json!({ "title_fr": "Les Quatre Cents Coups" })).await
}

#[tokio::test]
async fn like_toggle_alternates() {
    let app = common::spawn().await;
    let token = app.login_as("fan").await;
    let id = movie(&app, &token).await;
    let uri = format!("/movies/{id}/like/");

    let mut seen = Vec::new();
    for _ in 0..3 {
        let (status, body) = app.post(&uri, Some(token.as_str()), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        seen.push((body["liked"].clone(), body["likes_count"].clone()));
    }

    assert_eq!(
        seen,
        vec![(json!(true), json!(1)), (json!(false), json!(0)), (json!(true), json!(1))]
    );
}

#[tokio::test]
async fn likes_are_counted_across_users() {
    let app = common::spawn().await;
    let first = app.login_as("first").await;
    let second = app.login_as("second").await;
    let id = movie(&app, &first).await;
    let uri = format!("/movies/{id}/like/");

    app.post(&uri, Some(first.as_str()), Value::Null).await;
    let (_, body) = app.post(&uri, Some(second.as_str()), Value::Null).await;
    assert_eq!(body["likes_count"], 2);

    let (_, detail) = app.get(&format!("/movies/{id}/"), Some(second.as_str())).await;
    assert_eq!(detail["likes_count"], 2);
    assert_eq!(detail["user_liked"], true);

    let (_, list) = app.get("/movies/", None).await;
    assert_eq!(list["results"][0]["likes_count"], 2);
}

#[tokio::test]
async fn like_requires_auth_and_existing_movie() {
    let app = common::spawn().await;
    let token = app.login_as("fan").await;
    let id = movie(&app, &token).await;

    let (status, _) = app.post(&format!("/movies/{id}/like/"), None, Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post("/movies/777/like/", Some(token.as_str()), Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rating_upserts_and_averages_current_scores() {
    let app = common::spawn().await;
    let critic = app.login_as("critic").await;
    let other = app.login_as("other").await;
    let id = movie(&app, &critic).await;
    let uri = format!("/movies/{id}/rate/");

    let (status, body) = app.post(&uri, Some(other.as_str()), json!({ "score": 6 })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["avg_rating"], 6.0);

    let (status, body) = app.post(&uri, Some(critic.as_str()), json!({ "score": 8 })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["avg_rating"], 7.0);

    let (status, body) = app.post(&uri, Some(critic.as_str()), json!({ "score": 4 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"]["score"], 4);
    assert_eq!(body["avg_rating"], 5.0);

    let rows = rating::Entity::find()
        .filter(rating::Column::MovieId.eq(id as i32))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(rows, 2);

    let (_, detail) = app.get(&format!("/movies/{id}/"), Some(critic.as_str())).await;
    assert_eq!(detail["avg_rating"], 5.0);
    assert_eq!(detail["user_rating"], 4);
}

#[tokio::test]
async fn rating_keeps_review_unless_replaced() {
    let app = common::spawn().await;
    let token = app.login_as("critic").await;
    let id = movie(&app, &token).await;
    let uri = format!("/movies/{id}/rate/");

    app.post(&uri, Some(token.as_str()), json!({ "score": 9, "review": "Un chef-d'œuvre." })).await;
    let (_, body) = app.post(&uri, Some(token.as_str()), json!({ "score": 10 })).await;

    assert_eq!(body["rating"]["review"], "Un chef-d'œuvre.");
    assert_eq!(body["rating"]["score"], 10);
}

#[tokio::test]
async fn rating_score_is_validated() {
    let app = common::spawn().await;
    let token = app.login_as("critic").await;
    let id = movie(&app, &token).await;
    let uri = format!("/movies/{id}/rate/");

    let invalid = [json!({ "score": 11 }), json!({ "score": -1 }), json!({ "score": "abc" }), json!({})];
    for body in invalid {
        let (status, response) = app.post(&uri, Some(token.as_str()), body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(response["fields"]["score"].is_array(), "{body}");
    }

    let (status, _) = app.post(&uri, None, json!({ "score": 5 })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn comments_are_bound_to_path_and_caller() {
    let app = common::spawn().await;
    let token = app.login_as("talker").await;
    let id = movie(&app, &token).await;
    let other = app.create_movie(&token, json!({ "title_fr": "Jules et Jim" })).await;
    let uri = format!("/movies/{id}/comments/");

    let (status, body) = app
        .post(&uri, Some(token.as_str()), json!({ "text": "  Magnifique  ", "movie": other, "author": 99 }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["text"], "Magnifique");
    assert_eq!(body["movie"], id);
    assert_eq!(body["author_username"], "talker");
}

#[tokio::test]
async fn comments_list_newest_first() {
    let app = common::spawn().await;
    let token = app.login_as("talker").await;
    let id = movie(&app, &token).await;
    let uri = format!("/movies/{id}/comments/");

    for text in ["first", "second", "third"] {
        app.post(&uri, Some(token.as_str()), json!({ "text": text })).await;
    }

    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<_> = body.as_array().unwrap().iter().map(|c| c["text"].clone()).collect();
    assert_eq!(texts, vec![json!("third"), json!("second"), json!("first")]);

    let (_, detail) = app.get(&format!("/movies/{id}/"), None).await;
    assert_eq!(detail["comments"][0]["text"], "third");
}

#[tokio::test]
async fn comment_text_limits() {
    let app = common::spawn().await;
    let token = app.login_as("talker").await;
    let id = movie(&app, &token).await;
    let uri = format!("/movies/{id}/comments/");

    let (status, _) = app.post(&uri, Some(token.as_str()), json!({ "text": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post(&uri, Some(token.as_str()), json!({ "text": "x".repeat(2001) })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post(&uri, Some(token.as_str()), json!({ "text": "x".repeat(2000) })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.post(&uri, None, json!({ "text": "anonymous" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/movies/404/comments/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
