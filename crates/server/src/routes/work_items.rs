use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;
use worklog_core::{
    hierarchy::{flatten_tree, HierarchyIndex},
    WorkBreakdownItem,
};

use crate::{
    db::models::WorkItemRow,
    error::{AppError, Result},
    middleware::user::CurrentUser,
    routes::projects::find_project,
    AppState,
};

/// Routes under `/projects`.
pub fn project_routes() -> Router<AppState> {
    Router::new().route(
        "/:id/work-items",
        get(list_work_items).post(create_work_item),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:id", put(update_work_item).delete(delete_work_item))
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkItemRequest {
    pub name: String,
    pub parent_id: Option<String>,
}

// Absent leaves the parent alone, `null` moves the item to the root.
fn double_option<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkItemRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct TreeRowResponse {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub level: i64,
    pub depth: usize,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct WorkItemListResponse {
    pub items: Vec<WorkItemRow>,
    pub tree: Vec<TreeRowResponse>,
}

async fn load_project_items(pool: &SqlitePool, user_id: &str, project_id: &str) -> Result<Vec<WorkItemRow>> {
    let items = sqlx::query_as::<_, WorkItemRow>(
        r#"
        SELECT id, project_id, parent_id, name, level, position, created_at, updated_at
        FROM work_breakdown_items
        WHERE project_id = ? AND user_id = ?
        ORDER BY position ASC, created_at ASC
        "#,
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

async fn find_work_item(pool: &SqlitePool, user_id: &str, id: &str) -> Result<WorkItemRow> {
    sqlx::query_as::<_, WorkItemRow>(
        r#"
        SELECT id, project_id, parent_id, name, level, position, created_at, updated_at
        FROM work_breakdown_items
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Work item not found".to_string()))
}

fn to_models(rows: &[WorkItemRow]) -> Vec<WorkBreakdownItem> {
    rows.iter().cloned().map(WorkBreakdownItem::from).collect()
}

fn required_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Work item name is required".to_string()));
    }
    Ok(name.to_string())
}

async fn list_work_items(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
) -> Result<Json<WorkItemListResponse>> {
    find_project(&state.db.pool, &user.id, &project_id).await?;
    let items = load_project_items(&state.db.pool, &user.id, &project_id).await?;

    let models = to_models(&items);
    let tree = flatten_tree(&models)
        .into_iter()
        .map(|row| TreeRowResponse {
            id: row.item.id.clone(),
            name: row.item.name.clone(),
            parent_id: row.item.parent_id.clone(),
            level: row.item.level,
            depth: row.depth,
            path: row.path,
        })
        .collect();

    Ok(Json(WorkItemListResponse { items, tree }))
}

async fn create_work_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<String>,
    Json(body): Json<CreateWorkItemRequest>,
) -> Result<Json<WorkItemRow>> {
    let pool = &state.db.pool;
    let name = required_name(&body.name)?;
    find_project(pool, &user.id, &project_id).await?;

    let existing = load_project_items(pool, &user.id, &project_id).await?;
    let models = to_models(&existing);
    let index = HierarchyIndex::new(&models);

    let level = index
        .expected_level(body.parent_id.as_deref())
        .ok_or_else(|| AppError::Validation("Parent work item not found in this project".to_string()))?;
    let position = existing
        .iter()
        .filter(|item| item.parent_id == body.parent_id)
        .count() as i64;

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO work_breakdown_items (id, user_id, project_id, parent_id, name, level, position, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&user.id)
    .bind(&project_id)
    .bind(&body.parent_id)
    .bind(&name)
    .bind(level)
    .bind(position)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(Json(WorkItemRow {
        id,
        project_id,
        parent_id: body.parent_id,
        name,
        level,
        position,
        created_at: now.clone(),
        updated_at: now,
    }))
}

async fn update_work_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateWorkItemRequest>,
) -> Result<Json<WorkItemRow>> {
    let pool = &state.db.pool;
    let item = find_work_item(pool, &user.id, &id).await?;

    // Validate the whole request before writing any of it
    let name = body.name.as_deref().map(required_name).transpose()?;
    let siblings = load_project_items(pool, &user.id, &item.project_id).await?;
    let models = to_models(&siblings);
    let index = HierarchyIndex::new(&models);

    let moved = match body.parent_id {
        Some(parent_id) => {
            let level = match parent_id.as_deref() {
                Some(parent) if index.is_descendant(parent, &item.id) => {
                    return Err(AppError::Validation(
                        "A work item cannot move under itself or its descendants".to_string(),
                    ))
                }
                parent => index.expected_level(parent).ok_or_else(|| {
                    AppError::Validation("Parent work item not found in this project".to_string())
                })?,
            };
            Some((parent_id, level))
        }
        None => None,
    };

    let now = Utc::now().to_rfc3339();

    if let Some(name) = name {
        sqlx::query("UPDATE work_breakdown_items SET name = ?, updated_at = ? WHERE id = ?")
            .bind(&name)
            .bind(&now)
            .bind(&item.id)
            .execute(pool)
            .await?;
    }

    if let Some((parent_id, level)) = moved {
        sqlx::query("UPDATE work_breakdown_items SET parent_id = ?, updated_at = ? WHERE id = ?")
            .bind(&parent_id)
            .bind(&now)
            .bind(&item.id)
            .execute(pool)
            .await?;

        // Keep level equal to the number of hops from the root
        for (moved_id, moved_level) in index.subtree_levels(&item.id, level) {
            sqlx::query("UPDATE work_breakdown_items SET level = ? WHERE id = ?")
                .bind(moved_level)
                .bind(moved_id)
                .execute(pool)
                .await?;
        }

        tracing::debug!(work_item_id = %item.id, level, "Moved work item");
    }

    Ok(Json(find_work_item(pool, &user.id, &id).await?))
}

async fn delete_work_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<()>> {
    // Children cascade; report items keep their snapshot
    let result = sqlx::query("DELETE FROM work_breakdown_items WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Work item not found".to_string()));
    }

    Ok(Json(()))
}
