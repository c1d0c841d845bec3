use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use worklog_core::calendar::{
    bucket_by_week, rolling_windows, Direction, WeekConvention, WeekWindow,
};

use crate::{
    error::Result,
    middleware::user::CurrentUser,
    routes::{parse_date, DATE_FORMAT},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/weeks", get(list_weeks))
}

#[derive(Debug, Deserialize)]
pub struct WeeksQuery {
    pub pivot: Option<String>,
    pub count: Option<usize>,
    pub convention: Option<String>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Serialize)]
pub struct CalendarWeek {
    pub window: WeekWindow,
    pub report_dates: Vec<String>,
    pub plan_dates: Vec<String>,
    pub has_weekly_report: bool,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub convention: WeekConvention,
    pub weeks: Vec<CalendarWeek>,
}

async fn list_weeks(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<WeeksQuery>,
) -> Result<Json<CalendarResponse>> {
    let pivot = match query.pivot.as_deref() {
        Some(pivot) => parse_date(pivot)?,
        None => Utc::now().date_naive(),
    };
    let convention = match query.convention.as_deref() {
        Some(convention) => convention.parse::<WeekConvention>()?,
        None => state.config.week_convention,
    };
    let count = query.count.unwrap_or(state.config.history_weeks).clamp(1, 104);
    let direction = query.direction.unwrap_or_default();

    let windows = rolling_windows(pivot, count, convention, direction);
    // Windows are contiguous, so the range is bounded by the outermost ones
    let first = windows.iter().map(|w| w.start).min().unwrap_or(pivot);
    let last = windows.iter().map(|w| w.end).max().unwrap_or(pivot);

    let daily = sqlx::query_as::<_, (String, bool)>(
        r#"
        SELECT report_date, is_plan FROM daily_reports
        WHERE user_id = ? AND report_date >= ? AND report_date <= ?
        ORDER BY report_date ASC
        "#,
    )
    .bind(&user.id)
    .bind(first.format(DATE_FORMAT).to_string())
    .bind(last.format(DATE_FORMAT).to_string())
    .fetch_all(&state.db.pool)
    .await?;

    let weekly: HashSet<(i32, u32)> = sqlx::query_as::<_, (i32, u32)>(
        "SELECT year, week FROM project_weekly_reports WHERE user_id = ?",
    )
    .bind(&user.id)
    .fetch_all(&state.db.pool)
    .await?
    .into_iter()
    .collect();

    let mut dated = Vec::with_capacity(daily.len());
    for (date, is_plan) in daily {
        dated.push((parse_date(&date)?, (date, is_plan)));
    }

    let weeks = bucket_by_week(&windows, dated)
        .into_iter()
        .map(|bucket| {
            // The ISO week a window mostly overlaps, whatever its first weekday
            let iso = (bucket.window.start + Duration::days(3)).iso_week();
            let (plan, done): (Vec<_>, Vec<_>) =
                bucket.records.into_iter().partition(|(_, is_plan)| *is_plan);

            CalendarWeek {
                has_weekly_report: weekly.contains(&(iso.year(), iso.week())),
                report_dates: done.into_iter().map(|(date, _)| date).collect(),
                plan_dates: plan.into_iter().map(|(date, _)| date).collect(),
                window: bucket.window,
            }
        })
        .collect();

    Ok(Json(CalendarResponse { convention, weeks }))
}
