//! Dashboard extraction from `.dashboard.lookml` (YAML-flavoured) text
//!
//! A line scanner over the `elements:` sections: each list item at the
//! section's item indent is one element; its top-level keys are read,
//! plus the nested `filters:` mapping and bracketed `fields:` lists that
//! span several lines.

use crate::block::{capture, unquote};
use crate::project::LookmlError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardElement {
    /// `name:`, else `title:`, else `element_{n}`
    pub name: String,

    pub title: Option<String>,

    /// `type:` (e.g. `looker_line`, `single_value`)
    pub element_type: Option<String>,

    pub model: Option<String>,

    pub explore: Option<String>,

    pub fields: Vec<String>,

    pub filters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub name: String,

    pub title: Option<String>,

    pub elements: Vec<DashboardElement>,

    /// Explores referenced anywhere in the file, sorted
    pub explores: Vec<String>,
}

impl Dashboard {
    pub fn from_file(path: &Path) -> Result<Self, LookmlError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LookmlError::IoError(path.display().to_string(), e.to_string()))?;

        Ok(Self::parse(&content, &crate::project::file_stem(path)))
    }

    /// Parse dashboard text. Never fails.
    pub fn parse(content: &str, fallback_name: &str) -> Self {
        let name = capture(regex!(r"\bdashboard:\s*(\w+)"), content)
            .unwrap_or_else(|| fallback_name.to_string());
        let title = capture(regex!(r"(?m)^[ \t]*(?:-[ \t]+)?title:\s*([^\n]+)"), content)
            .map(|t| unquote(&t));

        let elements = parse_elements(content);

        let mut explores: BTreeSet<String> = elements
            .iter()
            .filter_map(|e| e.explore.clone())
            .collect();
        for caps in regex!(r"\bexplore:\s*(\w+)").captures_iter(content) {
            if let Some(m) = caps.get(1) {
                explores.insert(m.as_str().to_string());
            }
        }

        Self {
            name,
            title,
            elements,
            explores: explores.into_iter().collect(),
        }
    }

    /// Distinct element types, sorted
    pub fn element_types(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter_map(|e| e.element_type.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

struct Line<'a> {
    indent: usize,
    text: &'a str,
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// All elements of all `elements:` sections
fn parse_elements(content: &str) -> Vec<DashboardElement> {
    let lines: Vec<&str> = content.lines().collect();
    let mut elements = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let trimmed = lines[i].trim();
        let is_section = trimmed == "elements:"
            || trimmed == "- elements:"
            || trimmed.starts_with("elements: #");
        if !is_section {
            i += 1;
            continue;
        }

        let section_indent = indent_of(lines[i]) + if trimmed.starts_with('-') { 2 } else { 0 };
        i += 1;

        let mut items: Vec<Vec<Line>> = Vec::new();
        let mut item_indent: Option<usize> = None;

        while i < lines.len() {
            let raw = lines[i];
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                i += 1;
                continue;
            }

            let indent = indent_of(raw);
            let is_item = trimmed == "-" || trimmed.starts_with("- ");
            if indent < section_indent || (indent == section_indent && !is_item) {
                break;
            }

            match item_indent {
                None if is_item => item_indent = Some(indent),
                None => {
                    i += 1;
                    continue;
                }
                Some(_) => {}
            }

            if is_item && Some(indent) == item_indent {
                let rest = trimmed.trim_start_matches('-').trim_start();
                let mut item = Vec::new();
                if !rest.is_empty() {
                    item.push(Line { indent: indent + 2, text: rest });
                }
                items.push(item);
            } else if let Some(item) = items.last_mut() {
                item.push(Line { indent, text: trimmed });
            }
            i += 1;
        }

        let key_indent = item_indent.map(|n| n + 2).unwrap_or(0);
        for item in items {
            let index = elements.len() + 1;
            elements.push(parse_element(&item, key_indent, index));
        }
    }

    elements
}

fn parse_element(lines: &[Line], key_indent: usize, index: usize) -> DashboardElement {
    let key_value = regex!(r"^([\w.]+)\s*:\s*(.*)$");
    let mut element = DashboardElement::default();
    let mut name = None;

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        i += 1;
        if line.indent != key_indent {
            continue;
        }
        let Some(caps) = key_value.captures(line.text) else {
            continue;
        };
        let key = &caps[1];
        let value = caps[2].trim();

        match key {
            "name" => name = Some(unquote(value)),
            "title" => element.title = Some(unquote(value)),
            "type" => element.element_type = Some(unquote(value)),
            "model" => element.model = Some(unquote(value)),
            "explore" => element.explore = Some(unquote(value)),
            "fields" => {
                let mut list = value.to_string();
                while list.starts_with('[') && !list.contains(']') && i < lines.len() {
                    list.push(' ');
                    list.push_str(lines[i].text);
                    i += 1;
                }
                element.fields = split_list(&list);
            }
            "filters" if value.is_empty() => {
                while i < lines.len() && lines[i].indent > key_indent {
                    if let Some(caps) = key_value.captures(lines[i].text) {
                        element.filters.insert(caps[1].to_string(), unquote(caps[2].trim()));
                    }
                    i += 1;
                }
            }
            _ => {}
        }
    }

    element.name = name
        .or_else(|| element.title.clone())
        .unwrap_or_else(|| format!("element_{index}"));
    element
}

fn split_list(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(unquote)
        .filter(|f| !f.is_empty())
        .collect()
}
