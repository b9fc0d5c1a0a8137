//! Render targets derived from an extracted document.

use std::collections::BTreeSet;
use std::path::PathBuf;

use plantgen_extract::{Diagrams, ExtractedDocument};

use crate::layout::OutputLayout;

/// One diagram to render: its cache key, unthemed text and output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    pub key: String,
    pub source: String,
    pub path: PathBuf,
}

/// All targets of `doc`: shared constants first (by name), then records in
/// document order.
///
/// Keys: `shared_{name}`, `lvl_{id}_main` for a single diagram, and
/// `lvl_{id}_{n}` (1-based) for list entries.
///
/// Records sharing an id yield targets with the same key and path; they are
/// kept, and each repeated key is logged as a warning.
#[must_use]
pub fn collect_targets(doc: &ExtractedDocument, layout: &OutputLayout) -> Vec<RenderTarget> {
    let mut targets = Vec::new();

    for (name, source) in &doc.shared {
        targets.push(RenderTarget {
            key: format!("shared_{name}"),
            source: source.clone(),
            path: layout.shared(name),
        });
    }

    for record in &doc.records {
        match &record.diagrams {
            Diagrams::Main(source) => targets.push(RenderTarget {
                key: format!("lvl_{}_main", record.id),
                source: source.clone(),
                path: layout.record_main(&record.section, record.id),
            }),
            Diagrams::Sequence(sources) => {
                for (index, source) in sources.iter().enumerate() {
                    let position = index + 1;
                    targets.push(RenderTarget {
                        key: format!("lvl_{}_{position}", record.id),
                        source: source.clone(),
                        path: layout.record_item(&record.section, record.id, position),
                    });
                }
            }
        }
    }

    for key in duplicate_keys(&targets) {
        tracing::warn!(key, "several diagrams share a cache key; the last one wins");
    }

    targets
}

/// Keys used by more than one target, each reported once, in order of first
/// repetition.
#[must_use]
pub fn duplicate_keys(targets: &[RenderTarget]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    for target in targets {
        let key = target.key.as_str();
        if !seen.insert(key) && !duplicates.contains(&key) {
            duplicates.push(key);
        }
    }
    duplicates
}
