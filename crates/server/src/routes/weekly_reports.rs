use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use worklog_core::{
    calendar::{iso_week_window, WeekWindow},
    ReportItem,
};

use crate::{
    db::models::WeeklyReportRow,
    error::{AppError, Result},
    middleware::user::CurrentUser,
    routes::{ExportQuery, PreviewResponse},
    services::reports::{self, ItemInput, ReportKind, ReportPeriod},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports))
        .route(
            "/:year/:week",
            get(get_report).put(save_report).delete(delete_report),
        )
        .route("/:year/:week/preview", get(preview_report))
        .route("/:year/:week/export", get(export_report))
}

#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct WeeklyReportSummary {
    pub id: String,
    pub year: i64,
    pub week: i64,
    pub is_plan: bool,
    pub item_count: i64,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct WeeklyReportListResponse {
    pub reports: Vec<WeeklyReportSummary>,
}

#[derive(Debug, Serialize)]
pub struct WeeklyReportResponse {
    #[serde(flatten)]
    pub report: WeeklyReportRow,
    pub window: WeekWindow,
    pub items: Vec<ReportItem>,
}

#[derive(Debug, Deserialize)]
pub struct SaveReportRequest {
    #[serde(default)]
    pub is_plan: bool,
    #[serde(default)]
    pub items: Vec<ItemInput>,
}

async fn find_report(
    pool: &SqlitePool,
    user_id: &str,
    year: i32,
    week: u32,
) -> Result<Option<WeeklyReportRow>> {
    let report = sqlx::query_as::<_, WeeklyReportRow>(
        r#"
        SELECT id, year, week, is_plan, created_at, updated_at
        FROM project_weekly_reports
        WHERE user_id = ? AND year = ? AND week = ?
        "#,
    )
    .bind(user_id)
    .bind(year)
    .bind(week)
    .fetch_optional(pool)
    .await?;

    Ok(report)
}

async fn require_report(
    pool: &SqlitePool,
    user_id: &str,
    year: i32,
    week: u32,
) -> Result<(WeeklyReportRow, WeekWindow)> {
    let window = iso_week_window(year, week)?;
    let report = find_report(pool, user_id, year, week)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No weekly report for {year}-W{week:02}")))?;

    Ok((report, window))
}

async fn list_reports(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<WeeklyReportListResponse>> {
    let reports = sqlx::query_as::<_, (String, i64, i64, bool, String, i64)>(
        r#"
        SELECT r.id, r.year, r.week, r.is_plan, r.updated_at, COUNT(i.id)
        FROM project_weekly_reports r
        LEFT JOIN project_weekly_report_items i ON i.report_id = r.id
        WHERE r.user_id = ? AND (? IS NULL OR r.year = ?)
        GROUP BY r.id
        ORDER BY r.year DESC, r.week DESC
        "#,
    )
    .bind(&user.id)
    .bind(query.year)
    .bind(query.year)
    .fetch_all(&state.db.pool)
    .await?;

    let reports = reports
        .into_iter()
        .map(
            |(id, year, week, is_plan, updated_at, item_count)| WeeklyReportSummary {
                id,
                year,
                week,
                is_plan,
                item_count,
                updated_at,
            },
        )
        .collect();

    Ok(Json(WeeklyReportListResponse { reports }))
}

async fn get_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((year, week)): Path<(i32, u32)>,
) -> Result<Json<WeeklyReportResponse>> {
    let (report, window) = require_report(&state.db.pool, &user.id, year, week).await?;
    let items = reports::load_items(&state.db.pool, ReportKind::Weekly, &report.id).await?;

    Ok(Json(WeeklyReportResponse {
        report,
        window,
        items,
    }))
}

async fn save_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((year, week)): Path<(i32, u32)>,
    Json(body): Json<SaveReportRequest>,
) -> Result<Json<WeeklyReportResponse>> {
    iso_week_window(year, week)?;
    let pool = &state.db.pool;

    let period = ReportPeriod::Week { year, week };
    let saved = reports::save_report(pool, &user.id, period, body.is_plan, body.items).await?;
    let (report, window) = require_report(pool, &user.id, year, week).await?;

    Ok(Json(WeeklyReportResponse {
        report,
        window,
        items: saved.items,
    }))
}

async fn delete_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((year, week)): Path<(i32, u32)>,
) -> Result<Json<()>> {
    iso_week_window(year, week)?;

    let period = ReportPeriod::Week { year, week };
    if !reports::delete_report(&state.db.pool, &user.id, period).await? {
        return Err(AppError::NotFound(format!("No weekly report for {period}")));
    }

    Ok(Json(()))
}

async fn preview_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((year, week)): Path<(i32, u32)>,
) -> Result<Json<PreviewResponse>> {
    let (report, _) = require_report(&state.db.pool, &user.id, year, week).await?;
    let groups = reports::grouped_items(&state.db.pool, ReportKind::Weekly, &user.id, &report.id).await?;

    Ok(Json(groups.into()))
}

async fn export_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((year, week)): Path<(i32, u32)>,
    Query(query): Query<ExportQuery>,
) -> Result<String> {
    let (report, _) = require_report(&state.db.pool, &user.id, year, week).await?;
    let groups = reports::grouped_items(&state.db.pool, ReportKind::Weekly, &user.id, &report.id).await?;

    query.render(&groups)
}
