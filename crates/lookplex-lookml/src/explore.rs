//! Explore extraction from model files

use crate::block::{capture, find_blocks, unquote, without_spans};
use serde::{Deserialize, Serialize};

/// Default join relationship when none is declared
pub const DEFAULT_RELATIONSHIP: &str = "many_to_one";

/// Default join type when none is declared
pub const DEFAULT_JOIN_TYPE: &str = "left_outer";

/// A join inside an explore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinInfo {
    /// Join alias
    pub name: String,

    /// Joined view when `from:` renames it
    pub from: Option<String>,

    pub relationship: String,

    pub sql_on: Option<String>,

    pub join_type: String,
}

impl JoinInfo {
    /// The view this join brings in
    pub fn view_name(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.name)
    }

    /// `name:relationship` descriptor used in the explore graph aspect
    pub fn descriptor(&self) -> String {
        format!("{}:{}", self.name, self.relationship)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreMetadata {
    pub name: String,

    pub base_view: String,

    pub joins: Vec<JoinInfo>,

    /// Entries of the explore's `fields: [...]` list
    pub fields: Vec<String>,

    /// `description:`, else `label:`
    pub description: Option<String>,
}

impl ExploreMetadata {
    /// Base view followed by the joined views, without duplicates
    pub fn views(&self) -> Vec<String> {
        let mut views = vec![self.base_view.clone()];
        for join in &self.joins {
            let view = join.view_name().to_string();
            if !views.contains(&view) {
                views.push(view);
            }
        }
        views
    }
}

/// Extract every explore defined in `content`, in file order
pub fn parse_explores(content: &str) -> Vec<ExploreMetadata> {
    find_blocks(content, regex!(r"(?m)^[ \t]*explore:\s*(?P<name>\w+)\s*\{"))
        .into_iter()
        .map(|block| parse_explore(block.name, block.body))
        .collect()
}

/// Extract one explore from the body of its block
pub fn parse_explore(name: &str, body: &str) -> ExploreMetadata {
    let join_blocks = find_blocks(body, regex!(r"\bjoin:\s*(?P<name>\w+)\s*\{"));

    let joins = join_blocks
        .iter()
        .map(|block| JoinInfo {
            name: block.name.to_string(),
            from: capture(regex!(r"\bfrom:\s*(\w+)"), block.body),
            relationship: capture(regex!(r"\brelationship:\s*(\w+)"), block.body)
                .unwrap_or_else(|| DEFAULT_RELATIONSHIP.to_string()),
            sql_on: capture(regex!(r"\bsql_on:\s*([^;]+);"), block.body),
            join_type: capture(regex!(r"\btype:\s*(\w+)"), block.body)
                .unwrap_or_else(|| DEFAULT_JOIN_TYPE.to_string()),
        })
        .collect();

    let spans: Vec<_> = join_blocks.iter().map(|b| b.span.clone()).collect();
    let own = without_spans(body, &spans);

    let base_view = capture(regex!(r"\bview_name:\s*(\w+)"), &own)
        .or_else(|| capture(regex!(r"\bfrom:\s*(\w+)"), &own))
        .unwrap_or_else(|| name.to_string());

    let fields = capture(regex!(r"\bfields:\s*\[([^\]]*)\]"), &own)
        .map(|list| {
            list.split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let description = capture(regex!(r"\bdescription:\s*([^\n]+)"), &own)
        .or_else(|| capture(regex!(r"\blabel:\s*([^\n]+)"), &own))
        .map(|d| unquote(&d));

    ExploreMetadata {
        name: name.to_string(),
        base_view,
        joins,
        fields,
        description,
    }
}
