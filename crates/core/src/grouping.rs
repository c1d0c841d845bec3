//! Partition flat report items into project → work item → items.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    hierarchy::{HierarchyIndex, PATH_SEPARATOR},
    model::{Project, ReportItem, WorkBreakdownItem},
    snapshot::{resolve_project, resolve_work_item, DisplayIdentity},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemGroup {
    pub key: String,
    pub work_item: DisplayIdentity,
    /// Full hierarchy path, or the bare name when no path is known.
    pub label_path: String,
    pub items: Vec<ReportItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectGroup {
    pub key: String,
    pub project: DisplayIdentity,
    pub work_item_groups: Vec<WorkItemGroup>,
    /// Items without a resolvable work item, rendered after the work items.
    pub direct_items: Vec<ReportItem>,
}

impl ProjectGroup {
    fn new(key: String, project: DisplayIdentity) -> Self {
        Self {
            key,
            project,
            work_item_groups: Vec::new(),
            direct_items: Vec::new(),
        }
    }

    fn push_work_item(&mut self, key: String, work_item: DisplayIdentity, item: ReportItem) {
        if let Some(group) = self.work_item_groups.iter_mut().find(|g| g.key == key) {
            group.items.push(item);
            return;
        }

        let label_path = work_item
            .detail
            .clone()
            .unwrap_or_else(|| work_item.name.clone());
        self.work_item_groups.push(WorkItemGroup {
            key,
            work_item,
            label_path,
            items: vec![item],
        });
    }

    pub fn item_count(&self) -> usize {
        self.work_item_groups
            .iter()
            .map(|g| g.items.len())
            .sum::<usize>()
            + self.direct_items.len()
    }
}

pub fn total_items(groups: &[ProjectGroup]) -> usize {
    groups.iter().map(ProjectGroup::item_count).sum()
}

fn identity_key(id: Option<&str>, identity: &DisplayIdentity) -> String {
    match id {
        Some(id) if identity.is_resolved() => format!("id:{id}"),
        _ => format!(
            "name:{}|{}",
            identity.name,
            identity.detail.as_deref().unwrap_or_default()
        ),
    }
}

/// Group `items` by project, then by work item.
///
/// Projects and work items appear in the order their first item appears in
/// the input; items keep their input order. No item is ever dropped: an item
/// whose project cannot be resolved lands in an "Unknown project" bucket and
/// an item without a resolvable work item lands in `direct_items`.
pub fn group_items(
    items: &[ReportItem],
    projects: &[Project],
    work_items: &[WorkBreakdownItem],
) -> Vec<ProjectGroup> {
    let projects_by_id: HashMap<&str, &Project> =
        projects.iter().map(|p| (p.id.as_str(), p)).collect();
    let hierarchy = HierarchyIndex::new(work_items);

    let mut groups: Vec<ProjectGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for item in items {
        let live_project = item
            .project_id
            .as_deref()
            .and_then(|id| projects_by_id.get(id).copied());
        let project = resolve_project(item, live_project);
        let project_key = identity_key(item.project_id.as_deref(), &project);

        let position = *positions.entry(project_key.clone()).or_insert_with(|| {
            groups.push(ProjectGroup::new(project_key, project));
            groups.len() - 1
        });
        let group = &mut groups[position];

        let live_work_item = item
            .work_item_id
            .as_deref()
            .and_then(|id| hierarchy.get(id));
        let live_path = live_work_item.and_then(|w| hierarchy.path(&w.id, PATH_SEPARATOR));
        let work_item = resolve_work_item(item, live_work_item, live_path);

        if !work_item.is_resolved() {
            group.direct_items.push(item.clone());
            continue;
        }

        let work_item_key = identity_key(item.work_item_id.as_deref(), &work_item);
        group.push_work_item(work_item_key, work_item, item.clone());
    }

    tracing::trace!(
        items = items.len(),
        groups = groups.len(),
        "Grouped report items"
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::UNKNOWN_PROJECT;

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            code: name.to_uppercase(),
            is_active: true,
        }
    }

    fn work_item(id: &str, project_id: &str, name: &str) -> WorkBreakdownItem {
        WorkBreakdownItem {
            id: id.to_string(),
            project_id: project_id.to_string(),
            name: name.to_string(),
            level: 1,
            parent_id: None,
        }
    }

    fn contents(items: &[ReportItem]) -> Vec<&str> {
        items.iter().map(|i| i.content.as_str()).collect()
    }

    #[test]
    fn groups_by_project_then_work_item() {
        let projects = vec![project("pa", "ProjectA"), project("pb", "ProjectB")];
        let work_items = vec![work_item("x", "pa", "X"), work_item("y", "pb", "Y")];
        let items = vec![
            ReportItem::new("1", "did A").with_project("pa").with_work_item("x"),
            ReportItem::new("2", "did B").with_project("pa"),
            ReportItem::new("3", "did C").with_project("pb").with_work_item("y"),
        ];

        let groups = group_items(&items, &projects, &work_items);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].project.name, "ProjectA");
        assert_eq!(groups[0].work_item_groups.len(), 1);
        assert_eq!(groups[0].work_item_groups[0].work_item.name, "X");
        assert_eq!(contents(&groups[0].work_item_groups[0].items), vec!["did A"]);
        assert_eq!(contents(&groups[0].direct_items), vec!["did B"]);

        assert_eq!(groups[1].project.name, "ProjectB");
        assert_eq!(contents(&groups[1].work_item_groups[0].items), vec!["did C"]);
        assert!(groups[1].direct_items.is_empty());
    }

    #[test]
    fn projects_keep_first_appearance_order() {
        let projects = vec![project("p1", "P1"), project("p2", "P2")];
        let items = vec![
            ReportItem::new("1", "a").with_project("p2"),
            ReportItem::new("2", "b").with_project("p1"),
            ReportItem::new("3", "c").with_project("p2"),
        ];

        let groups = group_items(&items, &projects, &[]);
        let order: Vec<_> = groups.iter().map(|g| g.project.name.as_str()).collect();

        assert_eq!(order, vec!["P2", "P1"]);
        assert_eq!(contents(&groups[0].direct_items), vec!["a", "c"]);
    }

    #[test]
    fn work_items_keep_first_appearance_order() {
        let projects = vec![project("p1", "P1")];
        let work_items = vec![work_item("w1", "p1", "First"), work_item("w2", "p1", "Second")];
        let items = vec![
            ReportItem::new("1", "a").with_project("p1").with_work_item("w2"),
            ReportItem::new("2", "b").with_project("p1").with_work_item("w1"),
            ReportItem::new("3", "c").with_project("p1").with_work_item("w2"),
        ];

        let groups = group_items(&items, &projects, &work_items);
        let names: Vec<_> = groups[0]
            .work_item_groups
            .iter()
            .map(|g| g.work_item.name.as_str())
            .collect();

        assert_eq!(names, vec!["Second", "First"]);
        assert_eq!(contents(&groups[0].work_item_groups[0].items), vec!["a", "c"]);
    }

    #[test]
    fn deleted_project_groups_by_snapshot() {
        let items = vec![
            ReportItem::new("1", "a").with_project_snapshot("Legacy", "LEG"),
            ReportItem::new("2", "b").with_project_snapshot("Legacy", "LEG"),
        ];

        let groups = group_items(&items, &[], &[]);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].project.is_deleted);
        assert_eq!(groups[0].key, "name:Legacy|LEG");
        assert_eq!(groups[0].item_count(), 2);
    }

    #[test]
    fn deleted_work_item_keeps_snapshot_path() {
        let projects = vec![project("p1", "P1")];
        let items = vec![ReportItem::new("1", "a")
            .with_project("p1")
            .with_work_item_snapshot("Auth", "Backend > API > Auth")];

        let groups = group_items(&items, &projects, &[]);
        let group = &groups[0].work_item_groups[0];

        assert!(group.work_item.is_deleted);
        assert_eq!(group.label_path, "Backend > API > Auth");
    }

    #[test]
    fn unresolvable_items_land_in_unknown_bucket() {
        let items = vec![
            ReportItem::new("1", "lost"),
            ReportItem::new("2", "also lost").with_project("vanished"),
        ];

        let groups = group_items(&items, &[], &[]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].project.name, UNKNOWN_PROJECT);
        assert_eq!(contents(&groups[0].direct_items), vec!["lost", "also lost"]);
    }

    #[test]
    fn never_drops_an_item() {
        let projects = vec![project("p1", "P1")];
        let work_items = vec![work_item("w1", "p1", "W1")];
        let items = vec![
            ReportItem::new("1", "a").with_project("p1").with_work_item("w1"),
            ReportItem::new("2", "b").with_project("p1").with_work_item("gone"),
            ReportItem::new("3", "c"),
            ReportItem::new("4", "d").with_project_snapshot("Old", "O"),
            ReportItem::new("5", "").with_project("p1"),
        ];

        let groups = group_items(&items, &projects, &work_items);
        assert_eq!(total_items(&groups), items.len());
    }
}
