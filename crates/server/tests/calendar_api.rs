mod common;

use axum::http::StatusCode;
use common::{body_json, create_project, get, put_json, ALICE, BOB};
use serde_json::json;
use sqlx::SqlitePool;

#[sqlx::test(migrations = "./migrations")]
async fn weeks_around_new_year_follow_iso_numbering(pool: SqlitePool) {
    let project = create_project(&pool, ALICE, "Platform", "PLT").await;

    for (date, is_plan) in [("2020-12-29", false), ("2021-01-02", true), ("2020-12-22", false)] {
        let app = common::build_test_app(pool.clone());
        let response = put_json(
            app,
            &format!("/api/daily-reports/{date}"),
            ALICE,
            json!({ "is_plan": is_plan, "items": [{ "project_id": project, "content": "work" }] }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let app = common::build_test_app(pool.clone());
    put_json(app, "/api/weekly-reports/2020/53", ALICE, json!({ "items": [] })).await;

    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/calendar/weeks?pivot=2021-01-03&count=2", ALICE).await).await;

    assert_eq!(json["convention"]["kind"], "iso");
    let weeks = json["weeks"].as_array().unwrap();
    assert_eq!(weeks.len(), 2);

    assert_eq!(weeks[0]["window"]["year"], 2020);
    assert_eq!(weeks[0]["window"]["week"], 53);
    assert_eq!(weeks[0]["window"]["label"], "2020-W53 (12/28 - 01/03)");
    assert_eq!(weeks[0]["report_dates"], json!(["2020-12-29"]));
    assert_eq!(weeks[0]["plan_dates"], json!(["2021-01-02"]));
    assert_eq!(weeks[0]["has_weekly_report"], true);

    assert_eq!(weeks[1]["window"]["week"], 52);
    assert_eq!(weeks[1]["report_dates"], json!(["2020-12-22"]));
    assert_eq!(weeks[1]["has_weekly_report"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn sunday_convention_and_future_direction(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let json = body_json(
        get(
            app,
            "/api/calendar/weeks?pivot=2025-03-12&count=3&convention=sunday&direction=future",
            BOB,
        )
        .await,
    )
    .await;

    let starts: Vec<_> = json["weeks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["window"]["start"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(starts, vec!["2025-03-09", "2025-03-16", "2025-03-23"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn bad_query_values_are_rejected(pool: SqlitePool) {
    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/calendar/weeks?convention=tuesday", ALICE).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/calendar/weeks?pivot=yesterday", ALICE).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
