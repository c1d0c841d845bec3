use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use worklog_core::ReportItem;

use crate::{
    db::models::DailyReportRow,
    error::{AppError, Result},
    middleware::user::CurrentUser,
    routes::{parse_date, ExportQuery, PreviewResponse, DATE_FORMAT},
    services::reports::{self, ItemInput, ReportKind, ReportPeriod},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports))
        .route(
            "/:date",
            get(get_report).put(save_report).delete(delete_report),
        )
        .route("/:date/preview", get(preview_report))
        .route("/:date/export", get(export_report))
}

#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub id: String,
    pub report_date: String,
    pub is_plan: bool,
    pub item_count: i64,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ReportListResponse {
    pub reports: Vec<ReportSummary>,
}

#[derive(Debug, Serialize)]
pub struct DailyReportResponse {
    #[serde(flatten)]
    pub report: DailyReportRow,
    pub items: Vec<ReportItem>,
}

#[derive(Debug, Deserialize)]
pub struct SaveReportRequest {
    #[serde(default)]
    pub is_plan: bool,
    #[serde(default)]
    pub items: Vec<ItemInput>,
}

async fn find_report(pool: &SqlitePool, user_id: &str, date: &str) -> Result<Option<DailyReportRow>> {
    let report = sqlx::query_as::<_, DailyReportRow>(
        "SELECT id, report_date, is_plan, created_at, updated_at FROM daily_reports WHERE user_id = ? AND report_date = ?",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(report)
}

async fn require_report(pool: &SqlitePool, user_id: &str, date: &str) -> Result<DailyReportRow> {
    let date = parse_date(date)?.format(DATE_FORMAT).to_string();
    find_report(pool, user_id, &date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No daily report for {date}")))
}

async fn list_reports(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<ReportListResponse>> {
    // Normalise the bounds so string comparison matches date order
    let from = query
        .from
        .as_deref()
        .map(|d| parse_date(d).map(|d| d.format(DATE_FORMAT).to_string()))
        .transpose()?;
    let to = query
        .to
        .as_deref()
        .map(|d| parse_date(d).map(|d| d.format(DATE_FORMAT).to_string()))
        .transpose()?;

    let reports = sqlx::query_as::<_, (String, String, bool, String, i64)>(
        r#"
        SELECT r.id, r.report_date, r.is_plan, r.updated_at, COUNT(i.id)
        FROM daily_reports r
        LEFT JOIN report_items i ON i.report_id = r.id
        WHERE r.user_id = ?
          AND (? IS NULL OR r.report_date >= ?)
          AND (? IS NULL OR r.report_date <= ?)
        GROUP BY r.id
        ORDER BY r.report_date DESC
        "#,
    )
    .bind(&user.id)
    .bind(&from)
    .bind(&from)
    .bind(&to)
    .bind(&to)
    .fetch_all(&state.db.pool)
    .await?;

    let reports = reports
        .into_iter()
        .map(
            |(id, report_date, is_plan, updated_at, item_count)| ReportSummary {
                id,
                report_date,
                is_plan,
                item_count,
                updated_at,
            },
        )
        .collect();

    Ok(Json(ReportListResponse { reports }))
}

async fn get_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(date): Path<String>,
) -> Result<Json<DailyReportResponse>> {
    let report = require_report(&state.db.pool, &user.id, &date).await?;
    let items = reports::load_items(&state.db.pool, ReportKind::Daily, &report.id).await?;

    Ok(Json(DailyReportResponse { report, items }))
}

async fn save_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(date): Path<String>,
    Json(body): Json<SaveReportRequest>,
) -> Result<Json<DailyReportResponse>> {
    let date = parse_date(&date)?;
    let pool = &state.db.pool;

    let saved = reports::save_report(pool, &user.id, ReportPeriod::Day(date), body.is_plan, body.items).await?;
    let report = require_report(pool, &user.id, &date.format(DATE_FORMAT).to_string()).await?;

    Ok(Json(DailyReportResponse {
        report,
        items: saved.items,
    }))
}

async fn delete_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(date): Path<String>,
) -> Result<Json<()>> {
    let date = parse_date(&date)?;

    if !reports::delete_report(&state.db.pool, &user.id, ReportPeriod::Day(date)).await? {
        return Err(AppError::NotFound(format!(
            "No daily report for {}",
            date.format(DATE_FORMAT)
        )));
    }

    Ok(Json(()))
}

async fn preview_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(date): Path<String>,
) -> Result<Json<PreviewResponse>> {
    let report = require_report(&state.db.pool, &user.id, &date).await?;
    let groups = reports::grouped_items(&state.db.pool, ReportKind::Daily, &user.id, &report.id).await?;

    Ok(Json(groups.into()))
}

async fn export_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(date): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<String> {
    let report = require_report(&state.db.pool, &user.id, &date).await?;
    let groups = reports::grouped_items(&state.db.pool, ReportKind::Daily, &user.id, &report.id).await?;

    query.render(&groups)
}
