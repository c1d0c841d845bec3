//! Report item persistence shared by daily and weekly reports.

use std::{collections::HashMap, fmt};

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;
use worklog_core::{
    grouping::{group_items, ProjectGroup},
    hierarchy::{HierarchyIndex, PATH_SEPARATOR},
    Project, ReportItem, WorkBreakdownItem,
};

use crate::{
    db::models::{ProjectRow, ReportItemRow, WorkItemRow},
    error::{AppError, Result},
    routes::DATE_FORMAT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Daily,
    Weekly,
}

impl ReportKind {
    pub fn reports_table(self) -> &'static str {
        match self {
            ReportKind::Daily => "daily_reports",
            ReportKind::Weekly => "project_weekly_reports",
        }
    }

    pub fn items_table(self) -> &'static str {
        match self {
            ReportKind::Daily => "report_items",
            ReportKind::Weekly => "project_weekly_report_items",
        }
    }

    fn period_order(self) -> &'static str {
        match self {
            ReportKind::Daily => "r.report_date",
            ReportKind::Weekly => "r.year, r.week",
        }
    }
}

/// The period a report covers: one day, or one ISO week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Day(NaiveDate),
    Week { year: i32, week: u32 },
}

impl ReportPeriod {
    pub fn kind(self) -> ReportKind {
        match self {
            ReportPeriod::Day(_) => ReportKind::Daily,
            ReportPeriod::Week { .. } => ReportKind::Weekly,
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportPeriod::Day(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            ReportPeriod::Week { year, week } => write!(f, "{year}-W{week:02}"),
        }
    }
}

/// One submitted line of work.
///
/// With a `project_id` the snapshot fields are recaptured from the live rows.
/// Without one (the project was deleted) the snapshot fields the client read
/// back are stored again as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemInput {
    pub project_id: Option<String>,
    pub work_item_id: Option<String>,
    pub content: String,
    pub project_name: Option<String>,
    pub project_code: Option<String>,
    pub work_item_name: Option<String>,
    pub work_item_path: Option<String>,
}

/// The user's projects and work items, for snapshot capture and grouping.
pub struct Catalog {
    pub projects: Vec<Project>,
    pub work_items: Vec<WorkBreakdownItem>,
}

impl Catalog {
    pub async fn load(pool: &SqlitePool, user_id: &str) -> Result<Self> {
        let projects = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, user_id, name, code, is_active, created_at, updated_at FROM projects WHERE user_id = ? ORDER BY name ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let work_items = sqlx::query_as::<_, WorkItemRow>(
            r#"
            SELECT id, project_id, parent_id, name, level, position, created_at, updated_at
            FROM work_breakdown_items
            WHERE user_id = ?
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(Self {
            projects: projects.into_iter().map(Project::from).collect(),
            work_items: work_items.into_iter().map(WorkBreakdownItem::from).collect(),
        })
    }

    /// Turn submitted lines into report items carrying write-time snapshots.
    /// Lines with blank content are dropped.
    pub fn capture(&self, report_id: &str, inputs: Vec<ItemInput>) -> Result<Vec<ReportItem>> {
        let projects: HashMap<&str, &Project> =
            self.projects.iter().map(|p| (p.id.as_str(), p)).collect();
        let hierarchy = HierarchyIndex::new(&self.work_items);

        let mut items = Vec::with_capacity(inputs.len());
        for input in inputs {
            if input.content.trim().is_empty() {
                continue;
            }

            let mut item = ReportItem {
                id: Uuid::new_v4().to_string(),
                report_id: report_id.to_string(),
                content: input.content,
                project_id: input.project_id,
                work_item_id: input.work_item_id,
                project_name: input.project_name,
                project_code: input.project_code,
                work_item_name: input.work_item_name,
                work_item_path: input.work_item_path,
            };

            let Some(project_id) = item.project_id.clone() else {
                if item.work_item_id.is_some() {
                    return Err(AppError::Validation(
                        "A work item needs its project".to_string(),
                    ));
                }
                if item.project_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                    return Err(AppError::Validation("Each item needs a project".to_string()));
                }
                items.push(item);
                continue;
            };

            let project = projects
                .get(project_id.as_str())
                .ok_or_else(|| AppError::Validation(format!("Project {project_id} not found")))?;
            item.project_name = Some(project.name.clone());
            item.project_code = Some(project.code.clone());

            if let Some(work_item_id) = item.work_item_id.as_deref() {
                let work_item = hierarchy
                    .get(work_item_id)
                    .filter(|w| w.project_id == project.id)
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "Work item {work_item_id} does not belong to project {}",
                            project.name
                        ))
                    })?;
                item.work_item_name = Some(work_item.name.clone());
                item.work_item_path = hierarchy.path(&work_item.id, PATH_SEPARATOR);
            }

            items.push(item);
        }

        Ok(items)
    }

    pub fn group(&self, items: &[ReportItem]) -> Vec<ProjectGroup> {
        group_items(items, &self.projects, &self.work_items)
    }
}

pub async fn load_items(pool: &SqlitePool, kind: ReportKind, report_id: &str) -> Result<Vec<ReportItem>> {
    let query = format!(
        r#"
        SELECT id, report_id, content, project_id, work_item_id,
               project_name, project_code, work_item_name, work_item_path
        FROM {}
        WHERE report_id = ?
        ORDER BY position ASC
        "#,
        kind.items_table()
    );

    let rows = sqlx::query_as::<_, ReportItemRow>(&query)
        .bind(report_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(ReportItem::from).collect())
}

/// Delete the report's items, then insert `items` in order.
///
/// The two steps are not atomic: a failure between them leaves the report
/// without items.
pub async fn replace_items(
    pool: &SqlitePool,
    kind: ReportKind,
    report_id: &str,
    items: &[ReportItem],
) -> Result<()> {
    let delete = format!("DELETE FROM {} WHERE report_id = ?", kind.items_table());
    sqlx::query(&delete).bind(report_id).execute(pool).await?;

    let insert = format!(
        r#"
        INSERT INTO {} (id, report_id, project_id, work_item_id, content, position,
                        project_name, project_code, work_item_name, work_item_path, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        kind.items_table()
    );
    let now = Utc::now().to_rfc3339();

    for (position, item) in items.iter().enumerate() {
        sqlx::query(&insert)
            .bind(&item.id)
            .bind(report_id)
            .bind(&item.project_id)
            .bind(&item.work_item_id)
            .bind(&item.content)
            .bind(position as i64)
            .bind(&item.project_name)
            .bind(&item.project_code)
            .bind(&item.work_item_name)
            .bind(&item.work_item_path)
            .bind(&now)
            .execute(pool)
            .await?;
    }

    tracing::debug!(report_id, items = items.len(), table = kind.items_table(), "Replaced report items");
    Ok(())
}

/// Items of `user_id`'s reports that still reference `project_id`.
pub async fn project_items(
    pool: &SqlitePool,
    kind: ReportKind,
    user_id: &str,
    project_id: &str,
) -> Result<Vec<ReportItem>> {
    let query = format!(
        r#"
        SELECT i.id, i.report_id, i.content, i.project_id, i.work_item_id,
               i.project_name, i.project_code, i.work_item_name, i.work_item_path
        FROM {items} i
        JOIN {reports} r ON r.id = i.report_id
        WHERE r.user_id = ? AND i.project_id = ?
        ORDER BY {period}, i.position ASC
        "#,
        items = kind.items_table(),
        reports = kind.reports_table(),
        period = kind.period_order()
    );

    let rows = sqlx::query_as::<_, ReportItemRow>(&query)
        .bind(user_id)
        .bind(project_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(ReportItem::from).collect())
}

async fn find_report_id(pool: &SqlitePool, user_id: &str, period: ReportPeriod) -> Result<Option<String>> {
    let id = match period {
        ReportPeriod::Day(date) => {
            sqlx::query_scalar::<_, String>(
                "SELECT id FROM daily_reports WHERE user_id = ? AND report_date = ?",
            )
            .bind(user_id)
            .bind(date.format(DATE_FORMAT).to_string())
            .fetch_optional(pool)
            .await?
        }
        ReportPeriod::Week { year, week } => {
            sqlx::query_scalar::<_, String>(
                "SELECT id FROM project_weekly_reports WHERE user_id = ? AND year = ? AND week = ?",
            )
            .bind(user_id)
            .bind(year)
            .bind(week)
            .fetch_optional(pool)
            .await?
        }
    };

    Ok(id)
}

pub struct SavedReport {
    pub id: String,
    pub items: Vec<ReportItem>,
}

/// Create or update the report for `period`, then replace its items.
///
/// Every line is validated and snapshotted before the report row is touched,
/// so a rejected save changes nothing.
pub async fn save_report(
    pool: &SqlitePool,
    user_id: &str,
    period: ReportPeriod,
    is_plan: bool,
    inputs: Vec<ItemInput>,
) -> Result<SavedReport> {
    let kind = period.kind();
    let existing = find_report_id(pool, user_id, period).await?;
    let report_id = existing
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let catalog = Catalog::load(pool, user_id).await?;
    let items = catalog.capture(&report_id, inputs)?;
    let now = Utc::now().to_rfc3339();

    if existing.is_some() {
        let update = format!(
            "UPDATE {} SET is_plan = ?, updated_at = ? WHERE id = ?",
            kind.reports_table()
        );
        sqlx::query(&update)
            .bind(is_plan)
            .bind(&now)
            .bind(&report_id)
            .execute(pool)
            .await?;
    } else {
        match period {
            ReportPeriod::Day(date) => {
                sqlx::query(
                    "INSERT INTO daily_reports (id, user_id, report_date, is_plan, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&report_id)
                .bind(user_id)
                .bind(date.format(DATE_FORMAT).to_string())
                .bind(is_plan)
                .bind(&now)
                .bind(&now)
                .execute(pool)
                .await?;
            }
            ReportPeriod::Week { year, week } => {
                sqlx::query(
                    "INSERT INTO project_weekly_reports (id, user_id, year, week, is_plan, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&report_id)
                .bind(user_id)
                .bind(year)
                .bind(week)
                .bind(is_plan)
                .bind(&now)
                .bind(&now)
                .execute(pool)
                .await?;
            }
        }
    }

    replace_items(pool, kind, &report_id, &items).await?;
    tracing::info!(user_id, period = %period, items = items.len(), "Saved report");

    Ok(SavedReport {
        id: report_id,
        items,
    })
}

/// Delete the report for `period`. False when there was none.
pub async fn delete_report(pool: &SqlitePool, user_id: &str, period: ReportPeriod) -> Result<bool> {
    // Items go with the report (ON DELETE CASCADE)
    let result = match period {
        ReportPeriod::Day(date) => {
            sqlx::query("DELETE FROM daily_reports WHERE user_id = ? AND report_date = ?")
                .bind(user_id)
                .bind(date.format(DATE_FORMAT).to_string())
                .execute(pool)
                .await?
        }
        ReportPeriod::Week { year, week } => {
            sqlx::query(
                "DELETE FROM project_weekly_reports WHERE user_id = ? AND year = ? AND week = ?",
            )
            .bind(user_id)
            .bind(year)
            .bind(week)
            .execute(pool)
            .await?
        }
    };

    Ok(result.rows_affected() > 0)
}

/// A stored report's items, grouped for preview and export.
pub async fn grouped_items(
    pool: &SqlitePool,
    kind: ReportKind,
    user_id: &str,
    report_id: &str,
) -> Result<Vec<ProjectGroup>> {
    let items = load_items(pool, kind, report_id).await?;
    let catalog = Catalog::load(pool, user_id).await?;

    Ok(catalog.group(&items))
}
