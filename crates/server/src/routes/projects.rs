use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;
use worklog_core::{
    calendar::{bucket_by_week, iso_week_bounds, rolling_windows, Direction, WeekWindow},
    grouping::{total_items, ProjectGroup},
};

use crate::{
    db::models::ProjectRow,
    error::{AppError, Result},
    middleware::user::CurrentUser,
    routes::{parse_date, work_items},
    services::reports::{self, Catalog, ReportKind},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/:id/history", get(project_history))
        .merge(work_items::project_routes())
}

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectRow>,
}

pub(crate) async fn find_project(pool: &SqlitePool, user_id: &str, id: &str) -> Result<ProjectRow> {
    sqlx::query_as::<_, ProjectRow>(
        "SELECT id, user_id, name, code, is_active, created_at, updated_at FROM projects WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("Project {field} is required")));
    }
    Ok(value.to_string())
}

async fn list_projects(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<ProjectListResponse>> {
    let projects = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT id, user_id, name, code, is_active, created_at, updated_at
        FROM projects
        WHERE user_id = ? AND (? IS NULL OR is_active = ?)
        ORDER BY name ASC
        "#,
    )
    .bind(&user.id)
    .bind(query.active)
    .bind(query.active)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(ProjectListResponse { projects }))
}

async fn create_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<Json<ProjectRow>> {
    let name = required(&body.name, "name")?;
    let code = required(&body.code, "code")?;

    let project_id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO projects (id, user_id, name, code, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(&project_id)
    .bind(&user.id)
    .bind(&name)
    .bind(&code)
    .bind(&now)
    .bind(&now)
    .execute(&state.db.pool)
    .await?;

    tracing::info!(user_id = %user.id, project_id = %project_id, "Created project");

    Ok(Json(ProjectRow {
        id: project_id,
        user_id: user.id,
        name,
        code,
        is_active: true,
        created_at: now.clone(),
        updated_at: now,
    }))
}

async fn get_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ProjectRow>> {
    Ok(Json(find_project(&state.db.pool, &user.id, &id).await?))
}

async fn update_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectRow>> {
    let project = find_project(&state.db.pool, &user.id, &id).await?;

    let name = match body.name.as_deref() {
        Some(name) => required(name, "name")?,
        None => project.name.clone(),
    };
    let code = match body.code.as_deref() {
        Some(code) => required(code, "code")?,
        None => project.code.clone(),
    };
    let is_active = body.is_active.unwrap_or(project.is_active);
    let now = Utc::now().to_rfc3339();

    // Past report items keep the name and code they were written with
    sqlx::query("UPDATE projects SET name = ?, code = ?, is_active = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&code)
        .bind(is_active)
        .bind(&now)
        .bind(&project.id)
        .execute(&state.db.pool)
        .await?;

    Ok(Json(ProjectRow {
        name,
        code,
        is_active,
        updated_at: now,
        ..project
    }))
}

async fn delete_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<()>> {
    // Work items cascade; report items keep their snapshot and lose the reference
    let result = sqlx::query("DELETE FROM projects WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Project not found".to_string()));
    }

    tracing::info!(user_id = %user.id, project_id = %id, "Deleted project");
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub pivot: Option<String>,
    pub weeks: Option<usize>,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryWeek {
    pub window: WeekWindow,
    pub total_items: usize,
    pub groups: Vec<ProjectGroup>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub project: ProjectRow,
    pub weeks: Vec<HistoryWeek>,
}

/// Dates of the user's reports, keyed by report id.
async fn report_dates(pool: &SqlitePool, kind: ReportKind, user_id: &str) -> Result<HashMap<String, NaiveDate>> {
    let mut dates = HashMap::new();

    match kind {
        ReportKind::Daily => {
            let rows = sqlx::query_as::<_, (String, String)>(
                "SELECT id, report_date FROM daily_reports WHERE user_id = ?",
            )
            .bind(user_id)
            .fetch_all(pool)
            .await?;

            for (id, date) in rows {
                dates.insert(id, parse_date(&date)?);
            }
        }
        ReportKind::Weekly => {
            let rows = sqlx::query_as::<_, (String, i32, u32)>(
                "SELECT id, year, week FROM project_weekly_reports WHERE user_id = ?",
            )
            .bind(user_id)
            .fetch_all(pool)
            .await?;

            // A weekly report is dated by the Monday of its ISO week
            for (id, year, week) in rows {
                let (monday, _) = iso_week_bounds(year, week)?;
                dates.insert(id, monday);
            }
        }
    }

    Ok(dates)
}

async fn project_history(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let pool = &state.db.pool;
    let project = find_project(pool, &user.id, &id).await?;

    let kind = match query.source.as_deref() {
        None | Some("weekly") => ReportKind::Weekly,
        Some("daily") => ReportKind::Daily,
        Some(other) => {
            return Err(AppError::Validation(format!(
                "Unknown history source '{other}', expected daily or weekly"
            )))
        }
    };
    let pivot = match query.pivot.as_deref() {
        Some(pivot) => parse_date(pivot)?,
        None => Utc::now().date_naive(),
    };
    let weeks = query.weeks.unwrap_or(state.config.history_weeks).clamp(1, 104);

    let windows = rolling_windows(pivot, weeks, state.config.week_convention, Direction::Past);
    let dates = report_dates(pool, kind, &user.id).await?;
    let items = reports::project_items(pool, kind, &user.id, &project.id).await?;

    let dated = items
        .into_iter()
        .filter_map(|item| dates.get(&item.report_id).map(|date| (*date, item)));
    let buckets = bucket_by_week(&windows, dated);

    let catalog = Catalog::load(pool, &user.id).await?;
    let weeks = buckets
        .into_iter()
        .map(|bucket| {
            let groups = catalog.group(&bucket.records);
            HistoryWeek {
                window: bucket.window,
                total_items: total_items(&groups),
                groups,
            }
        })
        .collect();

    Ok(Json(HistoryResponse { project, weeks }))
}
