//! CLI command implementations.

pub(crate) mod extract;
pub(crate) mod generate;

pub(crate) use extract::ExtractArgs;
pub(crate) use generate::GenerateArgs;

use plantgen_cache::FlushPolicy;
use plantgen_config::{Config, FlushMode, InputConfig, ThemeConfig};
use plantgen_diagrams::{DiagramFormat, OutputLayout, Theme};
use plantgen_extract::{ExtractedDocument, RecordSchema, extract_file};

use crate::error::CliError;
use crate::output::Output;

/// Record schema described by the `[input]` section.
fn record_schema(input: &InputConfig) -> RecordSchema {
    RecordSchema {
        keyword: input.record.clone(),
        id_field: input.id_field.clone(),
        section_field: input.section_field.clone(),
        diagram_field: input.diagram_field.clone(),
        diagram_list_field: input.diagram_list_field.clone(),
    }
}

/// Read and extract the configured input document.
fn extract_input(config: &Config, output: &Output) -> Result<ExtractedDocument, CliError> {
    let input = &config.input_resolved;
    let doc = extract_file(&input.path, record_schema(input))?;
    output.info(&format!(
        "Extracted {} records and {} shared diagrams from {}",
        doc.records.len(),
        doc.shared.len(),
        input.path.display()
    ));
    Ok(doc)
}

fn theme(config: &ThemeConfig) -> Theme {
    Theme {
        directives: config.directives.clone(),
        pad_markers: config.pad_markers.clone(),
        underline_markers: config.underline_markers.clone(),
    }
}

fn output_layout(config: &Config, format: DiagramFormat) -> OutputLayout {
    let output = &config.output_resolved;
    OutputLayout::new(output.dir.clone(), format)
        .with_section_prefix(&output.section_prefix, &output.section_prefix_replacement)
}

fn flush_policy(mode: FlushMode) -> FlushPolicy {
    match mode {
        FlushMode::Each => FlushPolicy::EachRender,
        FlushMode::End => FlushPolicy::AtEnd,
    }
}

fn diagram_format(name: &str) -> Result<DiagramFormat, CliError> {
    DiagramFormat::parse(name)
        .ok_or_else(|| CliError::Validation(format!("Unsupported output format: {name}")))
}
