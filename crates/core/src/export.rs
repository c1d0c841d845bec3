//! Plain-text renderings of grouped report items for clipboard export.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    error::CoreError,
    grouping::{ProjectGroup, WorkItemGroup},
    model::ReportItem,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub show_work_items: bool,
    pub show_hierarchy: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            show_work_items: true,
            show_hierarchy: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    IndentedList,
    NumberedSections,
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indented" | "indented_list" | "yaml" => Ok(Self::IndentedList),
            "numbered" | "numbered_sections" | "markdown" => Ok(Self::NumberedSections),
            other => Err(CoreError::InvalidFormat(other.to_string())),
        }
    }
}

/// Destination for rendered text, the platform clipboard in a client.
pub trait TextSink {
    fn write_text(&mut self, text: &str);
}

impl TextSink for String {
    fn write_text(&mut self, text: &str) {
        self.clear();
        self.push_str(text);
    }
}

pub fn render(groups: &[ProjectGroup], format: ExportFormat, options: ExportOptions) -> String {
    match format {
        ExportFormat::IndentedList => render_indented(groups, options),
        ExportFormat::NumberedSections => render_numbered(groups, options),
    }
}

pub fn render_into<S: TextSink>(
    sink: &mut S,
    groups: &[ProjectGroup],
    format: ExportFormat,
    options: ExportOptions,
) {
    sink.write_text(&render(groups, format, options));
}

/// Non-blank, trimmed lines of every item's content, in item order.
fn content_lines<'a>(items: impl IntoIterator<Item = &'a ReportItem>) -> Vec<&'a str> {
    items
        .into_iter()
        .flat_map(|item| item.content.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn label(group: &WorkItemGroup, options: ExportOptions) -> &str {
    if options.show_hierarchy {
        &group.label_path
    } else {
        &group.work_item.name
    }
}

fn all_lines(group: &ProjectGroup) -> Vec<&str> {
    content_lines(
        group
            .work_item_groups
            .iter()
            .flat_map(|g| g.items.iter())
            .chain(group.direct_items.iter()),
    )
}

pub fn render_indented(groups: &[ProjectGroup], options: ExportOptions) -> String {
    let mut out = String::new();
    for group in groups {
        if all_lines(group).is_empty() {
            continue;
        }
        out.push_str(&format!("{}:\n", group.project.name));

        if !options.show_work_items {
            push_bullets(&mut out, "  ", &all_lines(group));
            continue;
        }

        for work_item in &group.work_item_groups {
            let lines = content_lines(&work_item.items);
            if lines.is_empty() {
                continue;
            }
            out.push_str(&format!("  {}:\n", label(work_item, options)));
            push_bullets(&mut out, "    ", &lines);
        }
        push_bullets(&mut out, "  ", &content_lines(&group.direct_items));
    }

    out
}

fn push_bullets(out: &mut String, indent: &str, lines: &[&str]) {
    for line in lines {
        out.push_str(&format!("{indent}- {line}\n"));
    }
}

fn push_numbered(out: &mut String, lines: &[&str]) {
    for (n, line) in lines.iter().enumerate() {
        out.push_str(&format!("{}. {line}\n", n + 1));
    }
}

/// Heading of the section holding a project's direct items when the project
/// also has work-item sections.
pub const DIRECT_ITEMS_HEADING: &str = "Other";

/// Markdown sections. Numbering restarts at 1 in every section.
///
/// Direct items follow the work-item sections under their own
/// `### Other` heading, so they never continue the last work item's list.
/// A project with only direct items lists them under the project heading.
pub fn render_numbered(groups: &[ProjectGroup], options: ExportOptions) -> String {
    let mut out = String::new();
    for group in groups {
        if all_lines(group).is_empty() {
            continue;
        }
        out.push_str(&format!("## {}\n", group.project.name));

        if !options.show_work_items {
            push_numbered(&mut out, &all_lines(group));
            continue;
        }

        let mut sections = 0;
        for work_item in &group.work_item_groups {
            let lines = content_lines(&work_item.items);
            if lines.is_empty() {
                continue;
            }
            out.push_str(&format!("### {}\n", label(work_item, options)));
            push_numbered(&mut out, &lines);
            sections += 1;
        }

        let direct = content_lines(&group.direct_items);
        if !direct.is_empty() && sections > 0 {
            out.push_str(&format!("### {DIRECT_ITEMS_HEADING}\n"));
        }
        push_numbered(&mut out, &direct);
    }

    out
}
