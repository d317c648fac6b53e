//! Casting rows, actors and filmographies.

mod common;

use axum::http::StatusCode;
use moviedb::{
    entities::{actor, casting, like},
    error::AppError,
};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;

#[tokio::test]
async fn duplicate_casting_is_rejected() {
    let app = common::spawn().await;
    let token = app.login_as("curator").await;
    let actor = app.create_actor(&token, "Jean-Paul", "Belmondo").await;
    let id = app.create_movie(&token, json!({ "title_fr": "À bout de souffle" })).await;
    let uri = format!("/movies/{id}/actors/");

    let entry = json!({ "actor_id": actor, "role_name": "Michel Poiccard" });
    let (status, body) = app.post(&uri, Some(token.as_str()), entry.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["actor"]["full_name"], "Jean-Paul Belmondo");

    let (status, body) = app.post(&uri, Some(token.as_str()), entry).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["non_field_errors"].is_array());

    let (status, _) = app
        .post(&uri, Some(token.as_str()), json!({ "actor_id": actor, "role_name": "Laszlo Kovacs" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "same actor in another role is fine");
}

#[tokio::test]
async fn duplicate_cast_in_one_submission_is_rejected() {
    let app = common::spawn().await;
    let token = app.login_as("curator").await;
    let actor = app.create_actor(&token, "Jean-Paul", "Belmondo").await;

    let (status, body) = app
        .post(
            "/movies/",
            Some(token.as_str()),
            json!({
                "title_fr": "Pierrot le Fou",
                "cast": [
                    { "actor_id": actor, "role_name": "Ferdinand" },
                    { "actor_id": actor, "role_name": "Ferdinand" },
                ],
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["cast"].is_array());
}

#[tokio::test]
async fn casting_validates_actor_and_auth() {
    let app = common::spawn().await;
    let token = app.login_as("curator").await;
    let id = app.create_movie(&token, json!({ "title_fr": "Le Mépris" })).await;
    let uri = format!("/movies/{id}/actors/");

    let (status, body) = app.post(&uri, Some(token.as_str()), json!({ "actor_id": 31337 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["actor_id"].is_array());

    let (status, _) = app.post(&uri, None, json!({ "actor_id": 1 })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/movies/5150/actors/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn actor_filmography_lists_each_movie_once() {
    let app = common::spawn().await;
    let token = app.login_as("curator").await;
    let actor = app.create_actor(&token, "Anna", "Karina").await;
    let other = app.create_actor(&token, "Jean-Paul", "Belmondo").await;

    let both = app
        .create_movie(
            &token,
            json!({
                "title_fr": "Une femme est une femme",
                "release_date": "1961-09-06",
                "cast": [
                    { "actor_id": actor, "role_name": "Angela" },
                    { "actor_id": actor, "role_name": "Narrator" },
                ],
            }),
        )
        .await;
    let later = app
        .create_movie(
            &token,
            json!({
                "title_fr": "Pierrot le Fou",
                "release_date": "1965-11-05",
                "cast": [{ "actor_id": actor, "role_name": "Marianne" }],
            }),
        )
        .await;
    app.create_movie(
        &token,
        json!({ "title_fr": "Le Magnifique", "cast": [{ "actor_id": other, "role_name": "Bob" }] }),
    )
    .await;

    let (status, body) = app.get(&format!("/actors/{actor}/movies/"), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> =
        body.as_array().unwrap().iter().map(|m| m["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![later, both]);

    let (status, _) = app.get("/actors/9000/movies/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn actors_are_listed_and_retrievable() {
    let app = common::spawn().await;
    let token = app.login_as("curator").await;
    let arletty = app.create_actor(&token, "", "Arletty").await;
    app.create_actor(&token, "Simone", "Signoret").await;

    let (status, body) = app.get("/actors/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["full_name"], "Arletty");
    assert_eq!(body[1]["full_name"], "Simone Signoret");

    let (status, body) = app.get(&format!("/actors/{arletty}/"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_name"], "Arletty");

    let (status, body) = app.post("/actors/", Some(token.as_str()), json!({ "first_name": "Nobody" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["last_name"].is_array());
}

#[tokio::test]
async fn racing_casting_insert_maps_to_conflict() {
    let app = common::spawn().await;
    let token = app.login_as("curator").await;
    let actor = app.create_actor(&token, "Anna", "Karina").await as i32;
    let movie = app.create_movie(&token, json!({ "title_fr": "Vivre sa vie" })).await as i32;

    let row = || casting::ActiveModel {
        movie_id: Set(movie),
        actor_id: Set(actor),
        role_name: Set("Nana".into()),
        order: Set(0),
        ..Default::default()
    };
    row().insert(&app.db).await.unwrap();

    // Skips the handler's duplicate check, as a concurrent request would.
    let err = row().insert(&app.db).await.unwrap_err();
    let err = AppError::from(err);
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
    assert_eq!(axum::response::IntoResponse::into_response(err).status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn second_like_row_for_same_pair_is_rejected() {
    let app = common::spawn().await;
    let token = app.login_as("fan").await;
    let movie = app.create_movie(&token, json!({ "title_fr": "Bande à part" })).await as i32;
    let (_, me) = app.get("/user/me/", Some(token.as_str())).await;
    let user_id = me["id"].as_i64().unwrap() as i32;

    let (status, _) =
        app.post(&format!("/movies/{movie}/like/"), Some(token.as_str()), json!(null)).await;
    assert_eq!(status, StatusCode::OK);

    let duplicate = like::ActiveModel {
        user_id: Set(user_id),
        movie_id: Set(movie),
        liked: Set(true),
        created_at: Set(0),
        updated_at: Set(0),
        ..Default::default()
    };
    let err = AppError::from(duplicate.insert(&app.db).await.unwrap_err());
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn blank_full_name_is_derived_on_save() {
    let app = common::spawn().await;

    let saved = actor::ActiveModel {
        first_name: Set("Jean".into()),
        last_name: Set("Seberg".into()),
        full_name: Set("  ".into()),
        biography: Set(String::new()),
        ..Default::default()
    }
    .insert(&app.db)
    .await
    .unwrap();
    assert_eq!(saved.full_name, "Jean Seberg");

    let kept = actor::ActiveModel {
        first_name: Set("Jean-Pierre".into()),
        last_name: Set("Léaud".into()),
        full_name: Set("Antoine Doinel".into()),
        biography: Set(String::new()),
        ..Default::default()
    }
    .insert(&app.db)
    .await
    .unwrap();
    assert_eq!(kept.full_name, "Antoine Doinel");
}
