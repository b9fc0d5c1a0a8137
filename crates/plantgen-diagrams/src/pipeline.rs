//! Sequential render pipeline.
//!
//! For each target: cache lookup, then on a miss decorate, render, write and
//! record. A failing target is logged and counted; the run goes on with the
//! next one and the cache is left untouched for it, so the next run retries.

use std::fs;
use std::path::PathBuf;

use plantgen_cache::{RenderCache, fingerprint};

use crate::client::{DiagramRenderer, RenderError, TargetError};
use crate::format::DiagramFormat;
use crate::svg::underline_labels;
use crate::targets::RenderTarget;
use crate::theme::Theme;

/// Outcome of a pipeline run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Outputs written this run.
    pub rendered: Vec<PathBuf>,
    /// Targets skipped because their output is current.
    pub cached: usize,
    /// Outputs a dry run would have written.
    pub planned: Vec<PathBuf>,
    /// Targets that failed to render.
    pub errors: Vec<TargetError>,
}

impl RunSummary {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Renders targets one after the other.
pub struct Pipeline<'a> {
    renderer: &'a dyn DiagramRenderer,
    theme: &'a Theme,
    format: DiagramFormat,
    dry_run: bool,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(renderer: &'a dyn DiagramRenderer, theme: &'a Theme, format: DiagramFormat) -> Self {
        Self {
            renderer,
            theme,
            format,
            dry_run: false,
        }
    }

    /// Only report what would be rendered; no requests, writes or cache
    /// updates.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process all `targets` in order, then flush `cache`.
    pub fn run(&self, targets: &[RenderTarget], cache: &mut RenderCache) -> RunSummary {
        let mut summary = RunSummary::default();

        for target in targets {
            let fp = fingerprint(&target.source);
            if !cache.should_render(&target.key, &fp, &target.path) {
                tracing::debug!(key = %target.key, "up to date");
                summary.cached += 1;
                continue;
            }

            if self.dry_run {
                summary.planned.push(target.path.clone());
                continue;
            }

            match self.render_one(target) {
                Ok(()) => {
                    tracing::info!(key = %target.key, path = %target.path.display(), "rendered");
                    cache.record(&target.key, &fp, &target.path);
                    summary.rendered.push(target.path.clone());
                }
                Err(kind) => {
                    let error = TargetError {
                        key: target.key.clone(),
                        kind,
                    };
                    tracing::warn!("failed to render {error}");
                    summary.errors.push(error);
                }
            }
        }

        if let Err(e) = cache.flush() {
            tracing::warn!("failed to save render cache: {e}");
        }

        summary
    }

    fn render_one(&self, target: &RenderTarget) -> Result<(), RenderError> {
        let prepared = self.theme.prepare(&target.source, self.format);
        let body = self.renderer.render(&prepared.source, self.format)?;

        let output = if self.format == DiagramFormat::Svg && !prepared.underline_labels.is_empty() {
            let svg = String::from_utf8(body).map_err(|e| RenderError::InvalidSvg(e.to_string()))?;
            underline_labels(&svg, &prepared.underline_labels).into_bytes()
        } else {
            body
        };

        if let Some(parent) = target.path.parent() {
            fs::create_dir_all(parent).map_err(|e| RenderError::Io(e.to_string()))?;
        }
        fs::write(&target.path, output).map_err(|e| RenderError::Io(e.to_string()))
    }
}
