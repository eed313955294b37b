mod common;

use axum::http::StatusCode;
use chrono::{Datelike, Local};

fn today() -> String {
    Local::now().date_naive().to_string()
}

#[tokio::test]
async fn test_schedule_shows_item_in_week_view() {
    let app = common::create_test_app(common::setup_test_db());
    let id = common::create_workout(
        &app.router,
        "name=Max+hangs&tool=Hangboard&sets=5&type=duration&duration=10&rest=180",
    )
    .await;

    let response = common::post_form(
        &app.router,
        &format!("/plan/{}/items", today()),
        &format!("id={id}"),
    )
    .await;
    common::assert_redirect(&response, "/plan");

    let response = common::get(&app.router, "/plan").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = common::body_string(response).await;
    assert!(html.contains("Max hangs"));
    assert!(html.contains(&format!("value=\"{id}\"")));

    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    assert_eq!(backup["plan"][today()], serde_json::json!([id]));
}

#[tokio::test]
async fn test_schedule_requires_id() {
    let app = common::create_test_app(common::setup_test_db());
    let response =
        common::post_form(&app.router, &format!("/plan/{}/items", today()), "id=+").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_date_is_rejected() {
    let app = common::create_test_app(common::setup_test_db());
    let response = common::post_form(&app.router, "/plan/not-a-date/items", "id=x").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recurring_and_unschedule() {
    let app = common::create_test_app(common::setup_test_db());
    let date = today();
    common::post_form(&app.router, &format!("/plan/{date}/items"), "id=w1").await;

    let response =
        common::post_form(&app.router, &format!("/plan/{date}/items/w1/recurring"), "").await;
    common::assert_redirect(&response, "/plan");

    let weekday = Local::now().date_naive().weekday().num_days_from_sunday().to_string();
    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    assert_eq!(backup["planRecurring"][&weekday], serde_json::json!(["w1"]));

    common::post_form(&app.router, &format!("/plan/{date}/items/w1/delete"), "").await;
    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    assert!(backup["plan"].get(&date).is_none());
    // Still on the weekly schedule.
    assert_eq!(backup["planRecurring"][&weekday], serde_json::json!(["w1"]));
}

#[tokio::test]
async fn test_completing_activity_logs_it() {
    let app = common::create_test_app(common::setup_test_db());
    let date = today();
    common::post_form(&app.router, "/activities", "name=yoga").await;
    common::post_form(&app.router, &format!("/plan/{date}/items"), "id=activity%3Ayoga").await;

    let response = common::post_form(
        &app.router,
        &format!("/plan/{date}/items/activity%3Ayoga/complete"),
        "note=hips+tight",
    )
    .await;
    common::assert_redirect(&response, "/plan");

    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    assert_eq!(backup["planCompleted"][&date], serde_json::json!(["activity:yoga"]));
    let log = backup["log"].as_array().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["workoutName"], "Yoga");
    assert_eq!(log[0]["summary"], "Yoga — hips tight");
    assert!(log[0]["workoutId"].is_null());

    // Un-completing does not log again.
    common::post_form(
        &app.router,
        &format!("/plan/{date}/items/activity%3Ayoga/complete"),
        "",
    )
    .await;
    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    assert_eq!(backup["log"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_note_is_saved_and_logged() {
    let app = common::create_test_app(common::setup_test_db());
    let date = today();

    let response =
        common::post_form(&app.router, &format!("/plan/{date}/note"), "text=Rest+day").await;
    common::assert_redirect(&response, "/plan");

    let html = common::body_string(common::get(&app.router, "/plan").await).await;
    assert!(html.contains("Rest day"));

    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    assert_eq!(backup["planNotes"][&date], "Rest day");
    assert_eq!(backup["log"][0]["summary"], "Rest day");

    common::post_form(&app.router, &format!("/plan/{date}/note/delete"), "").await;
    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    assert!(backup["planNotes"].get(&date).is_none());
}

#[tokio::test]
async fn test_month_view_renders() {
    let app = common::create_test_app(common::setup_test_db());
    let response = common::get(&app.router, "/plan?view=month&month=1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let next = Local::now().date_naive().with_day(1).unwrap() + chrono::Months::new(1);
    let html = common::body_string(response).await;
    assert!(html.contains(&next.format("%B %Y").to_string()));
}

#[tokio::test]
async fn test_out_of_range_offsets_are_bad_requests() {
    let app = common::create_test_app(common::setup_test_db());

    let response = common::get(&app.router, "/plan?week=9223372036854775807").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::body_string(response).await, "Week out of range");

    let response = common::get(&app.router, "/plan?week=-9223372036854775808").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = common::get(&app.router, "/plan?view=month&month=2147483647").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::body_string(response).await, "Month out of range");

    let response = common::get(&app.router, "/plan?view=month&month=-2147483648").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
