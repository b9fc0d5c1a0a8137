//! Source decoration applied right before encoding.
//!
//! Three independent text transforms, in this order:
//!
//! 1. Underline markers: a line carrying a marker such as `{static}` has the
//!    marker removed and its member text underlined. For PNG the underline is
//!    written into the source as combining low lines; for SVG the label is
//!    collected and decorated in the rendered output instead (see
//!    [`crate::svg`]).
//! 2. Clipping padding: member lines starting with a visibility marker get
//!    one trailing space so the last glyph does not touch the class border.
//! 3. Directives: theme lines are inserted after the `@start...` line, each
//!    only if the source does not already contain it.

use crate::format::DiagramFormat;

/// Combining low line, drawn under the preceding character.
const COMBINING_UNDERLINE: char = '\u{0332}';

/// Text decoration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Lines inserted after the start marker.
    pub directives: Vec<String>,
    /// Leading markers of member lines that get a trailing space.
    pub pad_markers: Vec<String>,
    /// Inline markers whose line is rendered underlined.
    pub underline_markers: Vec<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            directives: vec![
                "!theme blueprint".to_owned(),
                "skinparam backgroundcolor transparent".to_owned(),
            ],
            pad_markers: vec!["-".to_owned(), "+".to_owned(), "#".to_owned()],
            underline_markers: vec!["{static}".to_owned(), "<<key>>".to_owned()],
        }
    }
}

/// Decorated source, ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub source: String,
    /// Member texts to underline in rendered SVG output. Always empty for
    /// PNG, where the underline is part of `source`.
    pub underline_labels: Vec<String>,
}

impl Theme {
    /// Theme that leaves sources untouched.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            directives: Vec::new(),
            pad_markers: Vec::new(),
            underline_markers: Vec::new(),
        }
    }

    /// Decorate `source` for rendering as `format`.
    #[must_use]
    pub fn prepare(&self, source: &str, format: DiagramFormat) -> Prepared {
        let mut underline_labels = Vec::new();

        let lines: Vec<String> = source
            .split('\n')
            .map(|line| {
                let line = match self.underline(line, format) {
                    Some((rewritten, label)) => {
                        underline_labels.extend(label);
                        rewritten
                    }
                    None => line.to_owned(),
                };
                self.pad(line)
            })
            .collect();

        Prepared {
            source: self.insert_directives(lines).join("\n"),
            underline_labels,
        }
    }

    /// Rewrite a line carrying an underline marker.
    ///
    /// Returns the new line and, for SVG, the label to decorate later.
    fn underline(&self, line: &str, format: DiagramFormat) -> Option<(String, Option<String>)> {
        let marker = self
            .underline_markers
            .iter()
            .find(|m| !m.is_empty() && line.contains(m.as_str()))?;

        let body = line.trim_start();
        let indent = &line[..line.len() - body.len()];
        let (visibility, member) = match self.pad_marker(body) {
            Some(prefix) => (prefix, &body[prefix.len()..]),
            None => ("", body),
        };
        let text = member.replacen(marker.as_str(), "", 1);
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return None;
        }

        let separator = if visibility.is_empty() { "" } else { " " };
        match format {
            DiagramFormat::Png => {
                let underlined = underline_chars(&text);
                Some((format!("{indent}{visibility}{separator}{underlined}"), None))
            }
            DiagramFormat::Svg => Some((format!("{indent}{visibility}{separator}{text}"), Some(text))),
        }
    }

    fn pad_marker<'a>(&self, body: &'a str) -> Option<&'a str> {
        self.pad_markers
            .iter()
            .find(|m| !m.is_empty() && body.starts_with(m.as_str()))
            .map(|m| &body[..m.len()])
    }

    fn pad(&self, mut line: String) -> String {
        if self.pad_marker(line.trim_start()).is_some() && !line.ends_with(' ') {
            line.push(' ');
        }
        line
    }

    /// Insert the directives whose setting the source doesn't make itself.
    fn insert_directives(&self, mut lines: Vec<String>) -> Vec<String> {
        let missing: Vec<String> = self
            .directives
            .iter()
            .filter(|d| {
                let key = directive_key(d);
                !lines.iter().any(|line| directive_key(line) == key)
            })
            .cloned()
            .collect();
        if missing.is_empty() {
            return lines;
        }

        match lines.iter().position(|line| line.trim_start().starts_with("@start")) {
            Some(start) => {
                lines.splice(start + 1..start + 1, missing);
            }
            // Without a start marker the server wraps the text itself.
            None => {
                lines.splice(0..0, missing);
            }
        }
        lines
    }
}

/// What a directive sets, independent of its value: the keyword, plus the
/// parameter name for `skinparam`. Case-insensitive.
fn directive_key(line: &str) -> String {
    let mut words = line.split_whitespace().map(str::to_lowercase);
    let Some(keyword) = words.next() else {
        return String::new();
    };
    match words.next() {
        Some(param) if keyword == "skinparam" => format!("{keyword} {param}"),
        _ => keyword,
    }
}

/// Follow every character with a combining low line.
fn underline_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for c in text.chars() {
        out.push(c);
        out.push(COMBINING_UNDERLINE);
    }
    out
}
