//! Work-breakdown hierarchy: parent-chain walks, display paths, tree order.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::WorkBreakdownItem;

pub const PATH_SEPARATOR: &str = " > ";

/// Id lookup over a flat list of work items.
pub struct HierarchyIndex<'a> {
    items: &'a [WorkBreakdownItem],
    by_id: HashMap<&'a str, &'a WorkBreakdownItem>,
}

impl<'a> HierarchyIndex<'a> {
    pub fn new(items: &'a [WorkBreakdownItem]) -> Self {
        let by_id = items.iter().map(|item| (item.id.as_str(), item)).collect();
        Self { items, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a WorkBreakdownItem> {
        self.by_id.get(id).copied()
    }

    /// Root-to-node chain ending at `id`. Empty when `id` is unknown.
    ///
    /// The walk stops at a root, at a parent missing from the list, or at the
    /// first node seen twice, so malformed input yields a truncated chain.
    pub fn chain(&self, id: &str) -> Vec<&'a WorkBreakdownItem> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.get(id);

        while let Some(node) = current {
            if !visited.insert(node.id.as_str()) {
                tracing::warn!(work_item_id = %id, "Cycle in work item parents, path truncated");
                break;
            }
            chain.push(node);

            current = match node.parent_id.as_deref() {
                Some(parent_id) => {
                    let parent = self.get(parent_id);
                    if parent.is_none() {
                        tracing::debug!(work_item_id = %node.id, parent_id, "Parent not in list");
                    }
                    parent
                }
                None => None,
            };
        }

        chain.reverse();
        chain
    }

    pub fn path_names(&self, id: &str) -> Option<Vec<&'a str>> {
        let chain = self.chain(id);
        if chain.is_empty() {
            return None;
        }
        Some(chain.into_iter().map(|node| node.name.as_str()).collect())
    }

    pub fn path(&self, id: &str, separator: &str) -> Option<String> {
        self.path_names(id).map(|names| names.join(separator))
    }

    /// Level a new child of `parent_id` should get. Roots are level 1.
    pub fn expected_level(&self, parent_id: Option<&str>) -> Option<i64> {
        match parent_id {
            None => Some(1),
            Some(parent_id) => self.get(parent_id).map(|parent| parent.level + 1),
        }
    }

    /// True when `candidate` is `ancestor` itself or sits somewhere below it.
    pub fn is_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        candidate == ancestor || self.chain(candidate).iter().any(|node| node.id == ancestor)
    }

    /// New levels for the subtree rooted at `root_id` when that root moves to `root_level`.
    pub fn subtree_levels(&self, root_id: &str, root_level: i64) -> Vec<(&'a str, i64)> {
        let children = children_by_parent(self.items);
        let mut levels = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = match self.get(root_id) {
            Some(root) => vec![(root, root_level)],
            None => return levels,
        };

        while let Some((node, level)) = stack.pop() {
            if !visited.insert(node.id.as_str()) {
                continue;
            }
            levels.push((node.id.as_str(), level));
            if let Some(kids) = children.get(node.id.as_str()) {
                stack.extend(kids.iter().rev().map(|kid| (*kid, level + 1)));
            }
        }

        levels
    }
}

pub fn build_path(item: &WorkBreakdownItem, items: &[WorkBreakdownItem]) -> String {
    HierarchyIndex::new(items)
        .path(&item.id, PATH_SEPARATOR)
        .unwrap_or_else(|| item.name.clone())
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeRow<'a> {
    pub item: &'a WorkBreakdownItem,
    pub depth: usize,
    pub path: String,
}

fn children_by_parent(items: &[WorkBreakdownItem]) -> HashMap<&str, Vec<&WorkBreakdownItem>> {
    let mut children: HashMap<&str, Vec<&WorkBreakdownItem>> = HashMap::new();
    for item in items {
        if let Some(parent_id) = item.parent_id.as_deref() {
            if parent_id != item.id {
                children.entry(parent_id).or_default().push(item);
            }
        }
    }
    children
}

/// Depth-first pre-order listing of the forest, siblings in input order.
///
/// Items whose parent is missing are listed as roots. Items only reachable
/// through a cycle are listed as roots after everything else, so every item
/// appears exactly once.
pub fn flatten_tree(items: &[WorkBreakdownItem]) -> Vec<TreeRow<'_>> {
    let index = HierarchyIndex::new(items);
    let children = children_by_parent(items);
    let mut rows = Vec::with_capacity(items.len());
    let mut visited: HashSet<&str> = HashSet::new();

    let is_root = |item: &WorkBreakdownItem| match item.parent_id.as_deref() {
        None => true,
        Some(parent_id) => parent_id == item.id || index.get(parent_id).is_none(),
    };

    let roots = items.iter().filter(|&item| is_root(item));
    let leftovers = items.iter().filter(|&item| !is_root(item));

    for start in roots.chain(leftovers) {
        if visited.contains(start.id.as_str()) {
            continue;
        }

        let mut stack = vec![(start, 0usize, start.name.clone())];
        while let Some((node, depth, path)) = stack.pop() {
            if !visited.insert(node.id.as_str()) {
                continue;
            }
            if let Some(kids) = children.get(node.id.as_str()) {
                for &kid in kids.iter().rev() {
                    let kid_path = format!("{path}{PATH_SEPARATOR}{}", kid.name);
                    stack.push((kid, depth + 1, kid_path));
                }
            }
            rows.push(TreeRow {
                item: node,
                depth,
                path,
            });
        }
    }

    rows
}
