//! Rendering through a `PlantUML` server.
//!
//! The server is addressed with a GET per diagram:
//! `{server_url}/{format}/{token}`, where the token is the encoded text (see
//! [`crate::encoder`]). The response body is the rendered image.

use std::time::Duration;

use ureq::Agent;

use crate::encoder::encode;
use crate::format::DiagramFormat;

/// Kind of render error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("I/O error: {0}")]
    Io(String),
    #[error("invalid SVG data: {0}")]
    InvalidSvg(String),
}

/// Render error for one target, named by its cache key.
#[derive(Debug, thiserror::Error)]
#[error("{key}: {kind}")]
pub struct TargetError {
    pub key: String,
    pub kind: RenderError,
}

/// Turns decorated diagram text into image bytes.
pub trait DiagramRenderer {
    /// Render `source` as `format`.
    fn render(&self, source: &str, format: DiagramFormat) -> Result<Vec<u8>, RenderError>;
}

/// Create HTTP agent with the specified timeout.
///
/// Status codes are inspected by the caller so that error bodies can be
/// reported.
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// [`DiagramRenderer`] backed by a `PlantUML` HTTP server.
pub struct HttpRenderer {
    agent: Agent,
    server_url: String,
}

impl HttpRenderer {
    /// Create a renderer for `server_url` with a per-request timeout.
    #[must_use]
    pub fn new(server_url: &str, timeout: Duration) -> Self {
        Self {
            agent: create_agent(timeout),
            server_url: server_url.trim_end_matches('/').to_owned(),
        }
    }

    /// URL for an encoded token.
    #[must_use]
    pub fn url(&self, token: &str, format: DiagramFormat) -> String {
        format!("{}/{}/{token}", self.server_url, format.as_str())
    }
}

impl DiagramRenderer for HttpRenderer {
    fn render(&self, source: &str, format: DiagramFormat) -> Result<Vec<u8>, RenderError> {
        let token = encode(source).map_err(|e| RenderError::Io(e.to_string()))?;
        let url = self.url(&token, format);
        tracing::debug!(url = %url, "requesting diagram");

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| RenderError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if !(200..300).contains(&status) {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(RenderError::Status {
                status,
                body: error_body,
            });
        }

        body.read_to_vec().map_err(|e| RenderError::Io(e.to_string()))
    }
}
