mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_project, create_work_item, delete, get, post_json, put_json, ALICE, BOB,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;

async fn tree(pool: &SqlitePool, project_id: &str) -> Vec<Value> {
    let app = common::build_test_app(pool.clone());
    let json = body_json(get(app, &format!("/api/projects/{project_id}/work-items"), ALICE).await).await;
    json["tree"].as_array().unwrap().clone()
}

#[sqlx::test(migrations = "./migrations")]
async fn nested_items_get_levels_and_paths(pool: SqlitePool) {
    let project = create_project(&pool, ALICE, "Platform", "PLT").await;
    let backend = create_work_item(&pool, ALICE, &project, "Backend", None).await;
    let api = create_work_item(&pool, ALICE, &project, "API", Some(&backend)).await;
    create_work_item(&pool, ALICE, &project, "Auth", Some(&api)).await;
    create_work_item(&pool, ALICE, &project, "Frontend", None).await;

    let rows = tree(&pool, &project).await;
    let paths: Vec<_> = rows.iter().map(|r| r["path"].as_str().unwrap()).collect();
    let levels: Vec<_> = rows.iter().map(|r| r["level"].as_i64().unwrap()).collect();

    assert_eq!(
        paths,
        vec!["Backend", "Backend > API", "Backend > API > Auth", "Frontend"]
    );
    assert_eq!(levels, vec![1, 2, 3, 1]);
    assert_eq!(rows[2]["depth"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn parent_from_another_project_is_rejected(pool: SqlitePool) {
    let first = create_project(&pool, ALICE, "First", "F").await;
    let second = create_project(&pool, ALICE, "Second", "S").await;
    let foreign = create_work_item(&pool, ALICE, &first, "Elsewhere", None).await;

    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        &format!("/api/projects/{second}/work-items"),
        ALICE,
        json!({ "name": "Child", "parent_id": foreign }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn cannot_move_under_own_descendant(pool: SqlitePool) {
    let project = create_project(&pool, ALICE, "Platform", "PLT").await;
    let root = create_work_item(&pool, ALICE, &project, "Root", None).await;
    let child = create_work_item(&pool, ALICE, &project, "Child", Some(&root)).await;

    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        &format!("/api/work-items/{root}"),
        ALICE,
        json!({ "parent_id": child }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let response = put_json(
        app,
        &format!("/api/work-items/{root}"),
        ALICE,
        json!({ "parent_id": root }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn moving_a_subtree_recomputes_levels(pool: SqlitePool) {
    let project = create_project(&pool, ALICE, "Platform", "PLT").await;
    let a = create_work_item(&pool, ALICE, &project, "A", None).await;
    let b = create_work_item(&pool, ALICE, &project, "B", Some(&a)).await;
    create_work_item(&pool, ALICE, &project, "C", Some(&b)).await;

    // Null parent moves B to the root
    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        &format!("/api/work-items/{b}"),
        ALICE,
        json!({ "parent_id": null, "name": "B2" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let moved = body_json(response).await;
    assert_eq!(moved["level"], 1);
    assert_eq!(moved["name"], "B2");
    assert!(moved["parent_id"].is_null());

    let rows = tree(&pool, &project).await;
    let by_path: Vec<_> = rows
        .iter()
        .map(|r| (r["path"].as_str().unwrap(), r["level"].as_i64().unwrap()))
        .collect();
    assert_eq!(by_path, vec![("A", 1), ("B2", 1), ("B2 > C", 2)]);
}

#[sqlx::test(migrations = "./migrations")]
async fn rename_without_parent_keeps_position(pool: SqlitePool) {
    let project = create_project(&pool, ALICE, "Platform", "PLT").await;
    let a = create_work_item(&pool, ALICE, &project, "A", None).await;
    let b = create_work_item(&pool, ALICE, &project, "B", Some(&a)).await;

    let app = common::build_test_app(pool);
    let response = put_json(app, &format!("/api/work-items/{b}"), ALICE, json!({ "name": "Renamed" })).await;

    let json = body_json(response).await;
    assert_eq!(json["parent_id"], a.as_str());
    assert_eq!(json["level"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn delete_cascades_to_children(pool: SqlitePool) {
    let project = create_project(&pool, ALICE, "Platform", "PLT").await;
    let a = create_work_item(&pool, ALICE, &project, "A", None).await;
    create_work_item(&pool, ALICE, &project, "B", Some(&a)).await;

    let app = common::build_test_app(pool.clone());
    let response = delete(app, &format!("/api/work-items/{a}"), BOB).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let app = common::build_test_app(pool.clone());
    let response = delete(app, &format!("/api/work-items/{a}"), ALICE).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(tree(&pool, &project).await.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn rejected_move_leaves_item_untouched(pool: SqlitePool) {
    let project = create_project(&pool, ALICE, "Platform", "PLT").await;
    let a = create_work_item(&pool, ALICE, &project, "A", None).await;
    let b = create_work_item(&pool, ALICE, &project, "B", Some(&a)).await;

    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        &format!("/api/work-items/{a}"),
        ALICE,
        json!({ "name": "Renamed", "parent_id": b }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let rows = tree(&pool, &project).await;
    let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert!(rows[0]["parent_id"].is_null());
}
