//! Literal normalization.
//!
//! Turns a raw literal token, as captured by the scanner, into the diagram
//! text it denotes.

/// Stand-in for `\n/` while the other escapes are expanded.
///
/// Private-use code points never appear in authored diagram text.
const LITERAL_NEWLINE_PLACEHOLDER: &str = "\u{E000}plantgen:literal-newline\u{E000}";

/// Normalize a raw literal token (markers included) into its text.
///
/// - Verbatim `@"..."`: markers stripped, `""` collapsed to `"`, no backslash
///   processing.
/// - Escaped `"..."`: markers stripped, `\n` becomes a newline, `\r` is
///   dropped, `\"` becomes `"`. The sequence `\n/` is kept verbatim, since
///   `PlantUML` reads it as an explicit line break inside a label.
///
/// Input without a leading quote is treated as the body of an escaped literal.
/// Surrounding whitespace is trimmed. Returns `None` when there is no text.
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let text = if let Some(body) = raw.strip_prefix("@\"") {
        body.strip_suffix('"').unwrap_or(body).replace("\"\"", "\"")
    } else {
        let body = raw.strip_prefix('"').unwrap_or(raw);
        unescape(body.strip_suffix('"').unwrap_or(body))
    };

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

/// Expand the escapes of an escaped literal body.
///
/// `\n/` has to be protected before `\n` is expanded, otherwise it would turn
/// into a real newline followed by `/`.
fn unescape(body: &str) -> String {
    body.replace("\\n/", LITERAL_NEWLINE_PLACEHOLDER)
        .replace("\\n", "\n")
        .replace("\\r", "")
        .replace("\\\"", "\"")
        .replace(LITERAL_NEWLINE_PLACEHOLDER, "\\n/")
}
