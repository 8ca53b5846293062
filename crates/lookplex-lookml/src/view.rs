//! View extraction from `.view.lkml` text

use crate::block::{capture, find_blocks, unquote, without_spans};
use crate::project::LookmlError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of a view field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Dimension,
    DimensionGroup,
    Measure,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Dimension => "dimension",
            FieldKind::DimensionGroup => "dimension_group",
            FieldKind::Measure => "measure",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "dimension" => Some(FieldKind::Dimension),
            "dimension_group" => Some(FieldKind::DimensionGroup),
            "measure" => Some(FieldKind::Measure),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dimension or measure and where its data comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLineage {
    pub field_name: String,

    pub kind: FieldKind,

    /// LookML `type:`; defaults to the kind when absent
    pub field_type: String,

    /// The view's `sql_table_name`
    pub source_table: Option<String>,

    /// Column referenced as `${TABLE}.column`
    pub source_column: Option<String>,

    /// Text of the `sql:` clause
    pub sql_definition: Option<String>,
}

impl FieldLineage {
    /// `name:kind:type` descriptor used in the view schema aspect
    pub fn descriptor(&self) -> String {
        format!("{}:{}:{}", self.field_name, self.kind, self.field_type)
    }
}

/// Everything extracted from one view file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMetadata {
    pub name: String,

    /// Backticks stripped
    pub sql_table_name: Option<String>,

    /// `sql:` of a `derived_table` block
    pub derived_table_sql: Option<String>,

    pub description: Option<String>,

    /// Dimensions and dimension groups, in file order
    pub dimensions: Vec<FieldLineage>,

    pub measures: Vec<FieldLineage>,
}

impl ViewMetadata {
    /// Read and parse a view file; the file stem is the fallback name
    pub fn from_file(path: &Path) -> Result<Self, LookmlError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LookmlError::IoError(path.display().to_string(), e.to_string()))?;

        let fallback = crate::project::file_stem(path);
        Ok(Self::parse(&content, &fallback))
    }

    /// Parse view text. Never fails; unmatched patterns leave fields empty.
    pub fn parse(content: &str, fallback_name: &str) -> Self {
        let name = capture(regex!(r"\bview:\s*(\w+)"), content)
            .unwrap_or_else(|| fallback_name.to_string());

        let sql_table_name = capture(regex!(r"\bsql_table_name:\s*([^;]+);"), content)
            .map(|table| table.replace('`', "").trim().to_string())
            .filter(|table| !table.is_empty());

        let field_blocks = find_blocks(
            content,
            regex!(r"\b(?P<keyword>dimension_group|dimension|measure):\s*(?P<name>\w+)\s*\{"),
        );

        let derived_blocks = find_blocks(content, regex!(r"\b(?P<name>derived_table):\s*\{"));
        let derived_table_sql = derived_blocks
            .first()
            .and_then(|block| capture(regex!(r"(?s)\bsql:\s*(.*?);;"), block.body))
            .map(|sql| sql.split_whitespace().collect::<Vec<_>>().join(" "));

        // View-level properties live outside the field blocks
        let spans: Vec<_> = field_blocks.iter().map(|b| b.span.clone()).collect();
        let view_text = without_spans(content, &spans);
        let description = capture(regex!(r#"\bdescription:\s*"([^"]*)""#), &view_text)
            .or_else(|| capture(regex!(r"\bdescription:\s*([^\n]+)"), &view_text).map(|d| unquote(&d)));

        let mut dimensions = Vec::new();
        let mut measures = Vec::new();
        for block in &field_blocks {
            let Some(kind) = FieldKind::from_keyword(block.keyword) else {
                continue;
            };
            let field = parse_field(block.name, kind, block.body, sql_table_name.as_deref());
            match kind {
                FieldKind::Measure => measures.push(field),
                FieldKind::Dimension | FieldKind::DimensionGroup => dimensions.push(field),
            }
        }

        Self {
            name,
            sql_table_name,
            derived_table_sql,
            description,
            dimensions,
            measures,
        }
    }

    /// Dimensions then measures
    pub fn fields(&self) -> impl Iterator<Item = &FieldLineage> {
        self.dimensions.iter().chain(self.measures.iter())
    }

    pub fn field_count(&self) -> usize {
        self.dimensions.len() + self.measures.len()
    }

    /// Distinct `${TABLE}` columns in field order
    pub fn source_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for column in self.fields().filter_map(|f| f.source_column.as_ref()) {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }
}

/// Extract one field from the body of its block
pub fn parse_field(
    name: &str,
    kind: FieldKind,
    body: &str,
    source_table: Option<&str>,
) -> FieldLineage {
    let field_type = capture(regex!(r"\btype:\s*(\w+)"), body)
        .unwrap_or_else(|| kind.as_str().to_string());

    let sql_definition = capture(regex!(r"\bsql:\s*([^;]+);"), body);

    let source_column = sql_definition.as_deref().and_then(|sql| {
        regex!(r"\$\{TABLE\}\.(\w+)")
            .captures(sql)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    });

    FieldLineage {
        field_name: name.to_string(),
        kind,
        field_type,
        source_table: source_table.map(str::to_string),
        source_column,
        sql_definition,
    }
}
