//! Output paths for rendered diagrams.
//!
//! ```text
//! {root}/
//! +-- aux_{name}.{ext}          # shared constant
//! +-- {section}/
//!     +-- lvl{id}.{ext}         # single-diagram record
//!     +-- lvl{id}-{n}.{ext}     # n-th diagram of a list record (1-based)
//! ```

use std::path::{Path, PathBuf};

use crate::format::DiagramFormat;

/// Maps record identity to output files.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    format: DiagramFormat,
    section_prefix: Option<String>,
    section_prefix_replacement: String,
}

impl OutputLayout {
    #[must_use]
    pub fn new(root: PathBuf, format: DiagramFormat) -> Self {
        Self {
            root,
            format,
            section_prefix: None,
            section_prefix_replacement: String::new(),
        }
    }

    /// Replace a leading section word (matched case-insensitively), e.g.
    /// `"Sektion "` with `"sec"` to turn `Sektion 1` into `sec1`.
    #[must_use]
    pub fn with_section_prefix(mut self, prefix: &str, replacement: &str) -> Self {
        self.section_prefix = (!prefix.is_empty()).then(|| prefix.to_lowercase());
        self.section_prefix_replacement = replacement.to_lowercase();
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn format(&self) -> DiagramFormat {
        self.format
    }

    /// Folder name for a section label.
    ///
    /// Lower-cased, truncated at the first `:`, prefix word replaced, trimmed.
    /// Path separators are replaced so a label never escapes the root.
    #[must_use]
    pub fn section_folder(&self, section: &str) -> String {
        let lower = section.to_lowercase();
        let head = lower.split(':').next().unwrap_or_default().trim();
        let folder = match self.section_prefix.as_deref().and_then(|p| head.strip_prefix(p)) {
            Some(rest) => format!("{}{}", self.section_prefix_replacement, rest.trim_start()),
            None => head.to_owned(),
        };
        folder.trim().replace(['/', '\\'], "_")
    }

    /// Output of a record's single diagram.
    #[must_use]
    pub fn record_main(&self, section: &str, id: i64) -> PathBuf {
        self.section_dir(section)
            .join(format!("lvl{id}.{}", self.format.extension()))
    }

    /// Output of the `position`-th (1-based) diagram of a list record.
    #[must_use]
    pub fn record_item(&self, section: &str, id: i64, position: usize) -> PathBuf {
        self.section_dir(section)
            .join(format!("lvl{id}-{position}.{}", self.format.extension()))
    }

    /// Output of a shared constant.
    #[must_use]
    pub fn shared(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("aux_{name}.{}", self.format.extension()))
    }

    fn section_dir(&self, section: &str) -> PathBuf {
        let folder = self.section_folder(section);
        match folder.as_str() {
            "" | "." | ".." => self.root.clone(),
            _ => self.root.join(folder),
        }
    }
}
