//! In-progress report edits, kept under a per-user storage key so they
//! survive navigation until the report is saved.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftScope {
    Daily { date: NaiveDate },
    Weekly { year: i32, week: u32 },
}

impl DraftScope {
    /// Parses `daily:YYYY-MM-DD` or `weekly:YYYY-Www`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidScope(s.to_string());
        let (kind, rest) = s.split_once(':').ok_or_else(invalid)?;

        match kind {
            "daily" => {
                let date = NaiveDate::parse_from_str(rest, "%Y-%m-%d").map_err(|_| invalid())?;
                Ok(Self::Daily { date })
            }
            "weekly" => {
                let (year, week) = rest.split_once("-W").ok_or_else(invalid)?;
                let year = year.parse().map_err(|_| invalid())?;
                let week = week.parse().map_err(|_| invalid())?;
                crate::calendar::iso_week_bounds(year, week)?;
                Ok(Self::Weekly { year, week })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for DraftScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily { date } => write!(f, "daily:{}", date.format("%Y-%m-%d")),
            Self::Weekly { year, week } => write!(f, "weekly:{year}-W{week:02}"),
        }
    }
}

pub fn storage_key(user_id: &str, scope: &DraftScope) -> String {
    format!("draft:{user_id}:{scope}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
    pub project_id: Option<String>,
    pub work_item_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDraft {
    pub scope: DraftScope,
    #[serde(default)]
    pub is_plan: bool,
    #[serde(default)]
    pub entries: Vec<DraftEntry>,
}

impl ReportDraft {
    pub fn new(scope: DraftScope) -> Self {
        Self {
            scope,
            is_plan: false,
            entries: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.content.trim().is_empty())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
