//! LookML text extraction
//!
//! Best-effort pattern matching over `.view.lkml`, `.model.lkml` and
//! `.dashboard.lookml` files. No syntax tree is built: unmatched or
//! malformed input yields partial or empty records, never an error.

/// Compile a regex literal once
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).expect("invalid regex literal"))
    }};
}

mod block;
pub mod view;
pub mod explore;
pub mod dashboard;
pub mod project;

pub use view::{FieldKind, FieldLineage, ViewMetadata};
pub use explore::{ExploreMetadata, JoinInfo};
pub use dashboard::{Dashboard, DashboardElement};
pub use project::{LookmlError, LookmlProject};
