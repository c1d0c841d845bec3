use serde::Serialize;
use worklog_core::{Project, ReportItem, WorkBreakdownItem};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub name: String,
    pub code: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            code: row.code,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WorkItemRow {
    pub id: String,
    pub project_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub level: i64,
    pub position: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<WorkItemRow> for WorkBreakdownItem {
    fn from(row: WorkItemRow) -> Self {
        WorkBreakdownItem {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            level: row.level,
            parent_id: row.parent_id,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportItemRow {
    pub id: String,
    pub report_id: String,
    pub content: String,
    pub project_id: Option<String>,
    pub work_item_id: Option<String>,
    pub project_name: Option<String>,
    pub project_code: Option<String>,
    pub work_item_name: Option<String>,
    pub work_item_path: Option<String>,
}

impl From<ReportItemRow> for ReportItem {
    fn from(row: ReportItemRow) -> Self {
        ReportItem {
            id: row.id,
            report_id: row.report_id,
            content: row.content,
            project_id: row.project_id,
            work_item_id: row.work_item_id,
            project_name: row.project_name,
            project_code: row.project_code,
            work_item_name: row.work_item_name,
            work_item_path: row.work_item_path,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyReportRow {
    pub id: String,
    pub report_date: String,
    pub is_plan: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WeeklyReportRow {
    pub id: String,
    pub year: i64,
    pub week: i64,
    pub is_plan: bool,
    pub created_at: String,
    pub updated_at: String,
}
