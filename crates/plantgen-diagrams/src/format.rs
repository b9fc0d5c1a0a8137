//! Output format of rendered diagrams.

/// Image format requested from the render server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagramFormat {
    /// SVG. Underlined labels are decorated after rendering.
    #[default]
    Svg,
    /// PNG. Underlined labels are encoded in the source as combining marks.
    Png,
}

impl DiagramFormat {
    /// Parse a format name (`svg` or `png`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Format name, also used as the server path segment.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    /// File extension for written outputs.
    #[must_use]
    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}
