//! Post-render decoration of SVG output.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A `<text>` element with plain character content.
static TEXT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<text\b([^>]*)>([^<]*)</text>").unwrap());

/// Add `text-decoration="underline"` to every `<text>` element whose content
/// is exactly one of `labels`.
///
/// Content is compared with surrounding whitespace trimmed, since padded
/// member lines come back with their trailing space. Elements that already
/// carry a `text-decoration` attribute are left alone.
#[must_use]
pub fn underline_labels(svg: &str, labels: &[String]) -> String {
    if labels.is_empty() {
        return svg.to_owned();
    }

    TEXT_ELEMENT
        .replace_all(svg, |caps: &Captures<'_>| {
            let attrs = &caps[1];
            let content = &caps[2];
            let text = unescape_text(content);
            let matches = labels.iter().any(|label| text.trim() == label.as_str());
            if matches && !attrs.contains("text-decoration") {
                format!(r#"<text{attrs} text-decoration="underline">{content}</text>"#)
            } else {
                caps[0].to_owned()
            }
        })
        .into_owned()
}

/// Decode the entities `PlantUML` writes into text content.
fn unescape_text(content: &str) -> String {
    content
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#160;", " ")
        .replace('\u{a0}', " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_underlines_exact_match() {
        let svg = r##"<g><text fill="#000000" x="10" y="20">anzahl : int</text><text x="10" y="40">erhoehen()</text></g>"##;
        let out = underline_labels(svg, &labels(&["anzahl : int"]));
        assert_eq!(
            out,
            r##"<g><text fill="#000000" x="10" y="20" text-decoration="underline">anzahl : int</text><text x="10" y="40">erhoehen()</text></g>"##
        );
    }

    #[test]
    fn test_padded_content_matches() {
        let svg = r#"<text x="1">anzahl : int&#160;</text><text x="2">ISBN </text>"#;
        assert_eq!(
            underline_labels(svg, &labels(&["anzahl : int", "ISBN"])),
            r#"<text x="1" text-decoration="underline">anzahl : int&#160;</text><text x="2" text-decoration="underline">ISBN </text>"#
        );
    }

    #[test]
    fn test_substring_is_not_a_match() {
        let svg = r#"<text x="1">anzahl : int[]</text>"#;
        assert_eq!(underline_labels(svg, &labels(&["anzahl : int"])), svg);
    }

    #[test]
    fn test_matches_escaped_content() {
        let svg = r#"<text x="1">liste : List&lt;T&gt;</text>"#;
        assert_eq!(
            underline_labels(svg, &labels(&["liste : List<T>"])),
            r#"<text x="1" text-decoration="underline">liste : List&lt;T&gt;</text>"#
        );
    }

    #[test]
    fn test_only_text_elements_are_touched() {
        let svg = r#"<title>ISBN</title><text x="1">ISBN</text>"#;
        assert_eq!(
            underline_labels(svg, &labels(&["ISBN"])),
            r#"<title>ISBN</title><text x="1" text-decoration="underline">ISBN</text>"#
        );
    }

    #[test]
    fn test_existing_decoration_kept() {
        let svg = r#"<text text-decoration="underline" x="1">ISBN</text>"#;
        assert_eq!(underline_labels(svg, &labels(&["ISBN"])), svg);
    }

    #[test]
    fn test_no_labels_is_identity() {
        let svg = r#"<text x="1">ISBN</text>"#;
        assert_eq!(underline_labels(svg, &[]), svg);
    }
}
