//! Record extraction from C#-like level sources.
//!
//! Level definitions are authored as object initializers with diagram text
//! embedded in string literals:
//!
//! ```text
//! public static string ListT = "@startuml\nclass \"List<T>\" {\n}\n@enduml";
//!
//! new Level
//! {
//!     Id = 3,
//!     Section = "Sektion 1: Basics",
//!     PlantUMLSources = new List<string> { "@startuml\nX\n@enduml", @"..." }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`scanner`]: String-aware brace scanner with an explicit lexical state
//! - [`literal`]: Escaped and verbatim literal normalization
//! - [`fields`]: Top-level `Name = value` assignments of a record block
//! - [`extractor`]: Record and shared-constant extraction
//!
//! # Example
//!
//! ```
//! use plantgen_extract::{Extractor, RecordSchema};
//!
//! let text = r#"new Level { Id = 1, Section = "Sektion 1: Zoo", PlantUMLSource = "@startuml\nA -> B\n@enduml" }"#;
//! let doc = Extractor::new(RecordSchema::default()).unwrap().extract(text);
//! assert_eq!(doc.records.len(), 1);
//! assert_eq!(doc.records[0].id, 1);
//! ```

pub mod extractor;
pub mod fields;
pub mod literal;
mod record;
pub mod scanner;

use std::path::{Path, PathBuf};

pub use extractor::{Extractor, RecordSchema};
pub use literal::normalize;
pub use record::{Diagrams, ExtractedDocument, Record};

/// Errors reading a source document.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The input document does not exist.
    #[error("Input document not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The input document could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The record keyword does not form a valid pattern.
    #[error("Invalid record keyword: {0}")]
    Pattern(#[from] regex::Error),
}

/// Read `path` and extract its records and shared constants.
///
/// # Errors
///
/// Returns [`ExtractError::NotFound`] if the document is missing and
/// [`ExtractError::Io`] if it cannot be read.
pub fn extract_file(path: &Path, schema: RecordSchema) -> Result<ExtractedDocument, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let extractor = Extractor::new(schema)?;
    Ok(extractor.extract(&text))
}
