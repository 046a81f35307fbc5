//! Advisory findings and structural anomalies reported per file.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Non-fatal inconsistency detected while normalizing a project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A pair rule holds on one side but not on the other.
    PairMismatch { rule: String },
    /// A required property is missing from a property group.
    MissingProperty { property: String },
    /// An item carries more than one key attribute; the first by priority won.
    AmbiguousItemKey { item_type: String, line: usize },
}

impl Finding {
    /// Formats the finding as a single report line for `path`.
    pub fn report_line(&self, path: &Path) -> String {
        format!("{self} in {}.", path.display())
    }
}

impl Display for Finding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PairMismatch { rule } => write!(f, "{rule} don't match"),
            Self::MissingProperty { property } => write!(f, "{property} doesn't exist"),
            Self::AmbiguousItemKey { item_type, line } => write!(
                f,
                "{item_type} at line {line} has more than one of Include/Update/Remove"
            ),
        }
    }
}

/// Item shape that makes a group impossible to sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralAnomaly {
    MissingItemKey { item_type: String, line: usize },
}

impl Display for StructuralAnomaly {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingItemKey { item_type, line } => write!(
                f,
                "{item_type} at line {line} has none of Include/Update/Remove"
            ),
        }
    }
}

impl Error for StructuralAnomaly {}
