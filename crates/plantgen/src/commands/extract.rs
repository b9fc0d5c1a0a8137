//! `plantgen extract` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use plantgen_config::{CliSettings, Config};

use super::extract_input;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the extract command.
#[derive(Args)]
pub(crate) struct ExtractArgs {
    /// Path to configuration file (default: auto-discover plantgen.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source document to extract from (overrides config).
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ExtractArgs {
    /// Execute the extract command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the input document cannot
    /// be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            input: self.input,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let doc = extract_input(&config, &output)?;

        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &doc)?;
        writeln!(stdout)?;
        Ok(())
    }
}
