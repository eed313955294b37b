mod common;

use axum::http::StatusCode;
use chrono::Local;

const PULL_UPS: &str = "name=Weighted+pull-ups&tool=Pull-up+bar&sets=2&type=reps&reps=5\
&hasWeight=on&weight=10&weightUnit=kg&rest=60";
const HANGS: &str = "name=Max+hangs&tool=Hangboard&sets=1&type=duration&duration=10&rest=0";

async fn phase(router: &axum::Router) -> String {
    let body = common::body_json(common::get(router, "/session/state").await).await;
    body["phase"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_no_session() {
    let app = common::create_test_app(common::setup_test_db());

    let response = common::get(&app.router, "/session/state").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let html = common::body_string(common::get(&app.router, "/session").await).await;
    assert!(html.contains("No active session"));

    let response = common::post_form(&app.router, "/session/skip", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_start_unknown_workout_is_not_found() {
    let app = common::create_test_app(common::setup_test_db());
    let response = common::post_form(&app.router, "/session/start", "workout_id=missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_timed_session_skips_to_finish_and_logs() {
    let app = common::create_test_app(common::setup_test_db());
    let id = common::create_workout(&app.router, HANGS).await;

    let response = common::post_form(
        &app.router,
        "/session/start",
        &format!("workout_id={id}&plan_date="),
    )
    .await;
    common::assert_redirect(&response, "/session");
    assert_eq!(phase(&app.router).await, "setup");

    common::post_form(&app.router, "/session/begin", "").await;
    let state = common::body_json(common::get(&app.router, "/session/state").await).await;
    assert_eq!(state["phase"], "countdown");
    assert_eq!(state["secondsLeft"], 3);
    assert_eq!(state["label"], "GET READY");

    let html = common::body_string(common::get(&app.router, "/session").await).await;
    assert!(html.contains("http-equiv=\"refresh\""));

    common::post_form(&app.router, "/session/skip", "").await;
    assert_eq!(phase(&app.router).await, "work");

    common::post_form(&app.router, "/session/adjust", "delta=5").await;
    let state = common::body_json(common::get(&app.router, "/session/state").await).await;
    assert_eq!(state["secondsLeft"], 15);

    common::post_form(&app.router, "/session/skip", "").await;
    assert_eq!(phase(&app.router).await, "finished");

    let response = common::post_form(&app.router, "/session/finish", "note=").await;
    common::assert_redirect(&response, "/log");

    let response = common::get(&app.router, "/session/state").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    let log = backup["log"].as_array().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["workoutId"], id);
    assert_eq!(log[0]["summary"], "1 sets × 10 s");
    assert_eq!(log[0]["isPR"], false);
}

#[tokio::test]
async fn test_finish_before_done_is_rejected() {
    let app = common::create_test_app(common::setup_test_db());
    let id = common::create_workout(&app.router, HANGS).await;
    common::post_form(&app.router, "/session/start", &format!("workout_id={id}")).await;
    common::post_form(&app.router, "/session/begin", "").await;

    let response = common::post_form(&app.router, "/session/finish", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(phase(&app.router).await, "countdown");
}

#[tokio::test]
async fn test_reps_checklist_records_pr_and_plan_completion() {
    let app = common::create_test_app(common::setup_test_db());
    let id = common::create_workout(&app.router, PULL_UPS).await;
    let date = Local::now().date_naive().to_string();
    common::post_form(&app.router, &format!("/plan/{date}/items"), &format!("id={id}")).await;

    common::post_form(
        &app.router,
        "/session/start",
        &format!("workout_id={id}&plan_date={date}"),
    )
    .await;
    common::post_form(&app.router, "/session/begin", "weight=12.5").await;

    let state = common::body_json(common::get(&app.router, "/session/state").await).await;
    assert_eq!(state["phase"], "reps-ui");
    assert_eq!(state["inputs"], serde_json::json!([5, 5]));

    // Timer controls do not apply to the checklist.
    let response = common::post_form(&app.router, "/session/skip", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    common::post_form(&app.router, "/session/sets/0/toggle", "").await;
    let response = common::post_form(&app.router, "/session/finish", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    common::post_form(&app.router, "/session/sets/1/reps", "delta=-1").await;
    common::post_form(&app.router, "/session/sets/1/toggle", "").await;
    let response = common::post_form(&app.router, "/session/sets/7/toggle", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let state = common::body_json(common::get(&app.router, "/session/state").await).await;
    assert_eq!(state["inputs"], serde_json::json!([5, 4]));
    assert_eq!(state["repsChecked"], serde_json::json!([true, true]));

    let response = common::post_form(&app.router, "/session/finish", "note=felt+strong").await;
    common::assert_redirect(&response, "/log");

    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    let entry = &backup["log"][0];
    assert_eq!(entry["summary"], "2 sets: 5 reps @ 12.5 kg – NEW PR — felt strong");
    assert_eq!(entry["details"][1], "Set 2: 4 reps @ 12.5 kg");
    assert_eq!(entry["isPR"], true);
    assert_eq!(backup["prs"][&id], 12.5);
    assert_eq!(backup["planCompleted"][&date], serde_json::json!([id]));
    // The template remembers the new weight.
    assert_eq!(backup["userWorkouts"][0]["weight"], 12.5);

    let html = common::body_string(common::get(&app.router, "/log").await).await;
    assert!(html.contains("Weighted pull-ups"));
    assert!(html.contains("PR"));
}

#[tokio::test]
async fn test_lower_weight_is_not_a_pr() {
    let app = common::create_test_app(common::setup_test_db());
    let id = common::create_workout(&app.router, PULL_UPS).await;

    for weight in ["20", "15"] {
        common::post_form(&app.router, "/session/start", &format!("workout_id={id}")).await;
        common::post_form(&app.router, "/session/begin", &format!("weight={weight}")).await;
        common::post_form(&app.router, "/session/sets/0/toggle", "").await;
        common::post_form(&app.router, "/session/sets/1/toggle", "").await;
        let response = common::post_form(&app.router, "/session/finish", "").await;
        common::assert_redirect(&response, "/log");
    }

    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    assert_eq!(backup["log"][0]["isPR"], true);
    assert_eq!(backup["log"][1]["isPR"], false);
    assert_eq!(backup["prs"][&id], 20.0);
}

#[tokio::test]
async fn test_cancel_discards_session() {
    let app = common::create_test_app(common::setup_test_db());
    let id = common::create_workout(&app.router, HANGS).await;
    common::post_form(&app.router, "/session/start", &format!("workout_id={id}")).await;

    let html = common::body_string(common::get(&app.router, "/remote").await).await;
    assert!(html.contains("Max hangs"));

    let response = common::post_form(&app.router, "/session/cancel", "").await;
    common::assert_redirect(&response, "/plan");
    let response = common::get(&app.router, "/session/state").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_finish_keeps_session_for_retry() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let id = common::create_workout(&app.router, HANGS).await;

    common::post_form(&app.router, "/session/start", &format!("workout_id={id}")).await;
    common::post_form(&app.router, "/session/begin", "").await;
    common::post_form(&app.router, "/session/skip", "").await;
    common::post_form(&app.router, "/session/skip", "").await;
    assert_eq!(phase(&app.router).await, "finished");

    pool.get()
        .unwrap()
        .execute_batch("ALTER TABLE kv_store RENAME TO kv_store_away")
        .unwrap();
    let response = common::post_form(&app.router, "/session/finish", "").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(phase(&app.router).await, "finished");

    pool.get()
        .unwrap()
        .execute_batch("ALTER TABLE kv_store_away RENAME TO kv_store")
        .unwrap();
    let response = common::post_form(&app.router, "/session/finish", "").await;
    common::assert_redirect(&response, "/log");

    let backup = common::body_json(common::get(&app.router, "/backup/export").await).await;
    assert_eq!(backup["log"].as_array().unwrap().len(), 1);
    assert_eq!(backup["log"][0]["workoutName"], "Max hangs");
}
