//! Extracted record types.

use std::collections::BTreeMap;

use serde::Serialize;

/// Diagram text carried by a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagrams {
    /// A single diagram field (e.g. `PlantUMLSource = "..."`).
    Main(String),
    /// A list field (e.g. `PlantUMLSources = new List<string> { ... }`).
    /// Never empty.
    Sequence(Vec<String>),
}

impl Diagrams {
    /// Diagram texts in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let items: &[String] = match self {
            Self::Main(source) => std::slice::from_ref(source),
            Self::Sequence(sources) => sources,
        };
        items.iter().map(String::as_str)
    }

    /// Number of diagram texts.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Main(_) => 1,
            Self::Sequence(sources) => sources.len(),
        }
    }

    /// Always `false`; a record is never built without a diagram.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One extracted record (a puzzle level).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: i64,
    /// Section label, e.g. `"Sektion 1: Basics"`.
    pub section: String,
    pub diagrams: Diagrams,
}

/// Everything extracted from one source document.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedDocument {
    /// Shared string constants by name. Later declarations win.
    pub shared: BTreeMap<String, String>,
    /// Records in document order. Duplicate ids are kept.
    pub records: Vec<Record>,
}
