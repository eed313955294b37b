#![allow(dead_code)]

pub mod github;

use std::path::PathBuf;
use std::time::Duration;

use axum::{body::Body, Router};
use http::{header, Request, Response, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crimpd::db::{create_memory_pool, DbPool};
use crimpd::migrations::run_migrations_for_tests;
use crimpd::routes::{build_app, App, AppOptions};

/// Nothing listens here, so any accidental GitHub call fails fast.
pub const UNREACHABLE_API: &str = "http://127.0.0.1:9";

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub fn create_test_app(pool: DbPool) -> App {
    create_test_app_with(pool, UNREACHABLE_API, PathBuf::from("/nonexistent-crimpd-data"))
}

/// The ticker period is an hour, so timed phases only move when a test
/// skips them.
pub fn create_test_app_with(pool: DbPool, github_api_url: &str, data_dir: PathBuf) -> App {
    build_app(
        pool,
        AppOptions {
            github_api_url: github_api_url.to_string(),
            data_dir,
            tick: Duration::from_secs(3600),
        },
    )
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(router: &Router, uri: &str, body: &str) -> Response<Body> {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn post_json(router: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

pub fn assert_redirect(response: &Response<Body>, location: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), location);
}

/// Create a workout through the form and return its id.
pub async fn create_workout(router: &Router, form: &str) -> String {
    let response = post_form(router, "/workouts", form).await;
    assert_redirect(&response, "/workouts");

    let backup = body_json(get(router, "/backup/export").await).await;
    backup["userWorkouts"]
        .as_array()
        .unwrap()
        .iter()
        .rev()
        .find(|w| w.get("isActivity").is_none())
        .and_then(|w| w["id"].as_str())
        .unwrap()
        .to_string()
}
