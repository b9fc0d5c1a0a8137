//! `plantgen generate` command implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use plantgen_cache::{CacheStore, JsonFileStore, NullStore, RenderCache};
use plantgen_config::{CliSettings, Config};
use plantgen_diagrams::{HttpRenderer, Pipeline, RunSummary, collect_targets};

use super::{diagram_format, extract_input, flush_policy, output_layout, theme};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the generate command.
#[derive(Args)]
pub(crate) struct GenerateArgs {
    /// Path to configuration file (default: auto-discover plantgen.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source document to extract from (overrides config).
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for rendered images (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// `PlantUML` server URL (overrides config).
    #[arg(long, env = "PLANTGEN_SERVER_URL")]
    server_url: Option<String>,

    /// Output image format (overrides config).
    #[arg(long, value_parser = ["svg", "png"])]
    format: Option<String>,

    /// Render every diagram, ignoring and not updating the cache file.
    #[arg(long)]
    no_cache: bool,

    /// List the diagrams that would be rendered without contacting the server.
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl GenerateArgs {
    /// Execute the generate command.
    ///
    /// Failures of individual diagrams are reported but don't fail the run.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the input document cannot
    /// be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            input: self.input,
            output_dir: self.output_dir,
            server_url: self.server_url,
            format: self.format,
            cache_enabled: self.no_cache.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            output.detail(&format!("Using config {}", path.display()));
        }

        let format = diagram_format(&config.server.format)?;
        let doc = extract_input(&config, &output)?;
        let layout = output_layout(&config, format);
        let targets = collect_targets(&doc, &layout);

        let cache_config = &config.cache_resolved;
        let store: Box<dyn CacheStore> = if cache_config.enabled {
            Box::new(JsonFileStore::new(cache_config.path.clone()))
        } else {
            Box::new(NullStore)
        };
        let mut cache = RenderCache::load(store, flush_policy(cache_config.flush));
        tracing::debug!(entries = cache.len(), enabled = cache_config.enabled, "Cache loaded");

        let renderer = HttpRenderer::new(
            &config.server.url,
            Duration::from_secs(config.server.timeout_secs),
        );
        let theme = theme(&config.theme);

        output.highlight(&format!(
            "Rendering {} diagrams to {} via {}",
            targets.len(),
            layout.root().display(),
            config.server.url
        ));
        output.separator();

        let summary = Pipeline::new(&renderer, &theme, format)
            .dry_run(self.dry_run)
            .run(&targets, &mut cache);

        report(&output, &summary, self.dry_run);
        Ok(())
    }
}

fn report(output: &Output, summary: &RunSummary, dry_run: bool) {
    if dry_run {
        for path in &summary.planned {
            output.info(&format!("would render {}", path.display()));
        }
    } else {
        for path in &summary.rendered {
            output.detail(&format!("rendered {}", path.display()));
        }
    }

    for error in &summary.errors {
        output.warning(&format!("Failed: {error}"));
    }

    output.separator();
    let headline = if dry_run {
        format!(
            "{} to render, {} up to date",
            summary.planned.len(),
            summary.cached
        )
    } else {
        format!(
            "{} rendered, {} up to date, {} failed",
            summary.rendered.len(),
            summary.cached,
            summary.errors.len()
        )
    };
    if summary.has_errors() {
        output.warning(&headline);
    } else {
        output.success(&headline);
    }
}
