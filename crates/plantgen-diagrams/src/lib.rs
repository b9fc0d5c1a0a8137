//! `PlantUML` rendering for plantgen.
//!
//! Turns extracted documents into image files:
//!
//! ```text
//! ExtractedDocument -> RenderTarget* -> [cache] -> Theme -> encode -> GET -> file
//! ```
//!
//! # Architecture
//!
//! - [`encoder`]: Deflate + 64-symbol text encoding for the server URL
//! - [`theme`]: Directive injection, clipping padding, member underlining
//! - [`svg`]: Underline decoration of rendered SVG text nodes
//! - [`client`]: [`DiagramRenderer`] trait and the HTTP implementation
//! - [`layout`]: Output file naming
//! - [`targets`]: Cache keys and paths for every diagram of a document
//! - [`pipeline`]: Sequential render loop with per-target failure isolation

pub mod client;
pub mod encoder;
mod format;
pub mod layout;
pub mod pipeline;
pub mod svg;
pub mod targets;
pub mod theme;

pub use client::{DiagramRenderer, HttpRenderer, RenderError, TargetError};
pub use encoder::encode;
pub use format::DiagramFormat;
pub use layout::OutputLayout;
pub use pipeline::{Pipeline, RunSummary};
pub use targets::{RenderTarget, collect_targets};
pub use theme::{Prepared, Theme};
