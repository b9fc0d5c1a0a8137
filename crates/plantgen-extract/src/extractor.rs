//! Record and shared-constant extraction.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::fields::{BlockFields, Field};
use crate::literal::normalize;
use crate::record::{Diagrams, ExtractedDocument, Record};
use crate::scanner::{find_block, first_block, literal_at, string_literals};

/// Declaration head of a shared string constant, up to its `=`.
static SHARED_CONSTANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bpublic\s+(?:static\s+(?:readonly\s+)?|const\s+)string\s+([A-Za-z_]\w*)\s*=\s*")
        .unwrap()
});

/// Names of the record type and fields to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    /// Type name following `new` (e.g. `Level`).
    pub keyword: String,
    pub id_field: String,
    pub section_field: String,
    /// Field holding a single diagram literal.
    pub diagram_field: Option<String>,
    /// Field holding a collection of diagram literals. Takes precedence over
    /// `diagram_field` when a block assigns it.
    pub diagram_list_field: Option<String>,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self {
            keyword: "Level".to_owned(),
            id_field: "Id".to_owned(),
            section_field: "Section".to_owned(),
            diagram_field: Some("PlantUMLSource".to_owned()),
            diagram_list_field: Some("PlantUMLSources".to_owned()),
        }
    }
}

/// Extracts records and shared constants from a source document.
#[derive(Debug)]
pub struct Extractor {
    schema: RecordSchema,
    record_start: Regex,
}

impl Extractor {
    /// Create an extractor for `schema`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record keyword does not form a valid pattern.
    pub fn new(schema: RecordSchema) -> Result<Self, regex::Error> {
        let pattern = format!(
            r"\bnew\s+{}\s*(?:\(\s*\)\s*)?\{{",
            regex::escape(&schema.keyword)
        );
        Ok(Self {
            record_start: Regex::new(&pattern)?,
            schema,
        })
    }

    /// The schema this extractor looks for.
    #[must_use]
    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Extract all shared constants and well-formed records from `text`.
    ///
    /// Never fails: candidates with missing fields or unbalanced braces are
    /// dropped and logged at debug level.
    #[must_use]
    pub fn extract(&self, text: &str) -> ExtractedDocument {
        let (records, spans) = self.extract_records(text);
        let shared = extract_shared(text, &spans);
        tracing::debug!(
            records = records.len(),
            shared = shared.len(),
            "extraction finished"
        );
        ExtractedDocument { shared, records }
    }

    /// Scan left to right for record blocks.
    ///
    /// Returns the records and the byte spans of every balanced block, so that
    /// shared constants can be restricted to text outside of records.
    fn extract_records(&self, text: &str) -> (Vec<Record>, Vec<Range<usize>>) {
        let mut records = Vec::new();
        let mut spans = Vec::new();
        let mut cursor = 0;

        while let Some(hit) = self.record_start.find_at(text, cursor) {
            let inner_start = hit.end();
            let Some(close) = find_block(text, inner_start) else {
                tracing::debug!(offset = hit.start(), "unbalanced record block skipped");
                cursor = inner_start;
                continue;
            };

            let block = &text[inner_start..close];
            let fields = BlockFields::parse(block);
            if self.swallows_sibling(&fields) {
                // A missing brace let the block close on one of the
                // enclosing collection. Resume inside it.
                tracing::debug!(offset = hit.start(), "record block runs into a sibling record, skipped");
                cursor = inner_start;
                continue;
            }

            spans.push(hit.start()..close + 1);
            match self.build_record(&fields) {
                Some(record) => records.push(record),
                None => tracing::debug!(offset = hit.start(), "incomplete record dropped"),
            }
            cursor = close + 1;
        }

        (records, spans)
    }

    /// Materialize a record from a block, if all required parts are present.
    fn build_record(&self, fields: &BlockFields<'_>) -> Option<Record> {
        let id = fields.get(&self.schema.id_field)?.value.parse::<i64>().ok()?;
        let section = fields
            .get(&self.schema.section_field)
            .and_then(literal_value)?;
        let diagrams = self.diagrams(fields)?;

        Some(Record {
            id,
            section,
            diagrams,
        })
    }

    /// Whether a non-assignment segment of the block starts another record,
    /// which only happens when the block closed on a brace that isn't its own.
    fn swallows_sibling(&self, fields: &BlockFields<'_>) -> bool {
        fields
            .loose()
            .iter()
            .any(|segment| self.record_start.is_match(segment))
    }

    fn diagrams(&self, fields: &BlockFields<'_>) -> Option<Diagrams> {
        let list = self
            .schema
            .diagram_list_field
            .as_deref()
            .and_then(|name| fields.get(name));
        if let Some(list) = list {
            let sources: Vec<String> = first_block(list.value)
                .map(string_literals)
                .unwrap_or_default()
                .into_iter()
                .filter_map(normalize)
                .collect();
            return (!sources.is_empty()).then_some(Diagrams::Sequence(sources));
        }

        self.schema
            .diagram_field
            .as_deref()
            .and_then(|name| fields.get(name))
            .and_then(literal_value)
            .map(Diagrams::Main)
    }
}

/// Normalized text of a field whose value is a single literal.
fn literal_value(field: &Field<'_>) -> Option<String> {
    literal_at(field.value, 0).and_then(normalize)
}

/// Collect `public static string Name = <literal>;` declarations outside of
/// the given record spans.
fn extract_shared(text: &str, record_spans: &[Range<usize>]) -> BTreeMap<String, String> {
    let mut shared = BTreeMap::new();

    for caps in SHARED_CONSTANT.captures_iter(text) {
        let (Some(head), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if record_spans.iter().any(|span| span.contains(&head.start())) {
            continue;
        }
        let Some(raw) = literal_at(text, head.end()) else {
            continue;
        };
        let after = &text[head.end() + raw.len()..];
        if !after.trim_start().starts_with(';') {
            // Concatenations and method calls are not plain constants.
            continue;
        }
        if let Some(source) = normalize(raw) {
            shared.insert(name.as_str().to_owned(), source);
        }
    }

    shared
}
