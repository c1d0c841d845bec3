pub mod calendar;
pub mod daily_reports;
pub mod drafts;
pub mod projects;
pub mod weekly_reports;
pub mod work_items;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use worklog_core::{
    export::{self, ExportFormat, ExportOptions},
    grouping::{total_items, ProjectGroup},
};

use crate::error::{AppError, Result};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| AppError::Validation(format!("Invalid date '{value}', expected YYYY-MM-DD")))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub show_work_items: Option<bool>,
    pub show_hierarchy: Option<bool>,
}

impl ExportQuery {
    pub fn render(&self, groups: &[ProjectGroup]) -> Result<String> {
        let format = match self.format.as_deref() {
            Some(format) => format.parse::<ExportFormat>()?,
            None => ExportFormat::default(),
        };
        let defaults = ExportOptions::default();
        let options = ExportOptions {
            show_work_items: self.show_work_items.unwrap_or(defaults.show_work_items),
            show_hierarchy: self.show_hierarchy.unwrap_or(defaults.show_hierarchy),
        };

        Ok(export::render(groups, format, options))
    }
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub groups: Vec<ProjectGroup>,
    pub total_items: usize,
}

impl From<Vec<ProjectGroup>> for PreviewResponse {
    fn from(groups: Vec<ProjectGroup>) -> Self {
        Self {
            total_items: total_items(&groups),
            groups,
        }
    }
}
