//! Display identity for the project and work item a report item points at.
//!
//! A report item carries both a live reference (resolved by the caller against
//! the current rows) and the display strings copied at write time. The copy
//! wins whenever it is present, so history reads the same after a rename.

use serde::{Deserialize, Serialize};

use crate::model::{Project, ReportItem, WorkBreakdownItem};

pub const UNKNOWN_PROJECT: &str = "Unknown project";
pub const UNKNOWN_WORK_ITEM: &str = "Unknown work item";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    Live,
    Snapshot,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayIdentity {
    pub name: String,
    /// Project code or work-item path.
    pub detail: Option<String>,
    pub is_deleted: bool,
    pub source: IdentitySource,
}

impl DisplayIdentity {
    fn unresolved(name: &str) -> Self {
        Self {
            name: name.to_string(),
            detail: None,
            is_deleted: true,
            source: IdentitySource::Unresolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.source != IdentitySource::Unresolved
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

pub fn resolve_project(item: &ReportItem, live: Option<&Project>) -> DisplayIdentity {
    if let Some(name) = non_blank(&item.project_name) {
        let detail = non_blank(&item.project_code)
            .map(str::to_string)
            .or_else(|| live.map(|p| p.code.clone()));
        return DisplayIdentity {
            name: name.to_string(),
            detail,
            is_deleted: live.is_none(),
            source: IdentitySource::Snapshot,
        };
    }

    match live {
        Some(project) => DisplayIdentity {
            name: project.name.clone(),
            detail: Some(project.code.clone()),
            is_deleted: false,
            source: IdentitySource::Live,
        },
        None => DisplayIdentity::unresolved(UNKNOWN_PROJECT),
    }
}

/// `live_path` is the hierarchy path of `live`, when the caller could build one.
pub fn resolve_work_item(
    item: &ReportItem,
    live: Option<&WorkBreakdownItem>,
    live_path: Option<String>,
) -> DisplayIdentity {
    if let Some(name) = non_blank(&item.work_item_name) {
        let detail = non_blank(&item.work_item_path)
            .map(str::to_string)
            .or(live_path);
        return DisplayIdentity {
            name: name.to_string(),
            detail,
            is_deleted: live.is_none(),
            source: IdentitySource::Snapshot,
        };
    }

    match live {
        Some(work_item) => DisplayIdentity {
            name: work_item.name.clone(),
            detail: live_path.or_else(|| Some(work_item.name.clone())),
            is_deleted: false,
            source: IdentitySource::Live,
        },
        None => DisplayIdentity::unresolved(UNKNOWN_WORK_ITEM),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            id: "p1".to_string(),
            name: "Billing".to_string(),
            code: "BIL".to_string(),
            is_active: true,
        }
    }

    #[test]
    fn snapshot_without_live_reference_is_deleted_and_verbatim() {
        let item = ReportItem::new("i1", "fixed invoices")
            .with_project_snapshot("  Old Billing ", "OB");

        let identity = resolve_project(&item, None);

        assert_eq!(identity.name, "  Old Billing ");
        assert_eq!(identity.detail.as_deref(), Some("OB"));
        assert!(identity.is_deleted);
        assert_eq!(identity.source, IdentitySource::Snapshot);
    }

    #[test]
    fn live_reference_is_never_deleted() {
        let live = project();
        let with_snapshot = ReportItem::new("i1", "x")
            .with_project("p1")
            .with_project_snapshot("Renamed since", "RS");
        let without_snapshot = ReportItem::new("i2", "y").with_project("p1");

        let a = resolve_project(&with_snapshot, Some(&live));
        let b = resolve_project(&without_snapshot, Some(&live));

        assert!(!a.is_deleted);
        assert_eq!(a.name, "Renamed since");
        assert!(!b.is_deleted);
        assert_eq!(b.name, "Billing");
        assert_eq!(b.source, IdentitySource::Live);
    }

    #[test]
    fn blank_snapshot_falls_back_to_live() {
        let live = project();
        let mut item = ReportItem::new("i1", "x").with_project("p1");
        item.project_name = Some("   ".to_string());

        let identity = resolve_project(&item, Some(&live));
        assert_eq!(identity.name, "Billing");
        assert_eq!(identity.detail.as_deref(), Some("BIL"));
    }

    #[test]
    fn nothing_to_resolve_yields_unknown() {
        let item = ReportItem::new("i1", "orphan");

        let project = resolve_project(&item, None);
        let work_item = resolve_work_item(&item, None, None);

        assert_eq!(project.name, UNKNOWN_PROJECT);
        assert!(project.is_deleted);
        assert!(!project.is_resolved());
        assert_eq!(work_item.name, UNKNOWN_WORK_ITEM);
        assert!(!work_item.is_resolved());
    }

    #[test]
    fn live_work_item_uses_built_path() {
        let live = WorkBreakdownItem {
            id: "w2".to_string(),
            project_id: "p1".to_string(),
            name: "API".to_string(),
            level: 2,
            parent_id: Some("w1".to_string()),
        };
        let item = ReportItem::new("i1", "x").with_work_item("w2");

        let identity = resolve_work_item(&item, Some(&live), Some("Backend > API".to_string()));
        assert_eq!(identity.detail.as_deref(), Some("Backend > API"));
        assert!(!identity.is_deleted);
    }
}
