use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub code: String,
    pub is_active: bool,
}

/// A node in a project's work-breakdown tree. `parent_id == None` marks a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkBreakdownItem {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub level: i64,
    pub parent_id: Option<String>,
}

/// One line of recorded work.
///
/// `project_id` and `work_item_id` become `None` once the referenced entity is
/// deleted. The `project_*` and `work_item_*` strings are copies taken when the
/// item was written and keep the item readable after renames and deletions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
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

impl ReportItem {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_project(mut self, project_id: &str) -> Self {
        self.project_id = Some(project_id.to_string());
        self
    }

    pub fn with_work_item(mut self, work_item_id: &str) -> Self {
        self.work_item_id = Some(work_item_id.to_string());
        self
    }

    pub fn with_project_snapshot(mut self, name: &str, code: &str) -> Self {
        self.project_name = Some(name.to_string());
        self.project_code = Some(code.to_string());
        self
    }

    pub fn with_work_item_snapshot(mut self, name: &str, path: &str) -> Self {
        self.work_item_name = Some(name.to_string());
        self.work_item_path = Some(path.to_string());
        self
    }
}
