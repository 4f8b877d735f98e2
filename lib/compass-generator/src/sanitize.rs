//! Escaping for values that come from component metadata before they reach ids, paths or markdown.

use url::Url;

/// Replaces every character outside `[A-Za-z0-9-_]` with `-`.
///
/// Applied to anything derived from component metadata before it is used as a catalog id or path
/// segment.
pub fn sanitize_id(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Escapes HTML metacharacters, then the characters that would break markdown link syntax.
pub fn sanitize_markdown_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '[' | ']' | '(' | ')' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Returns the serialized URL with literal parentheses percent-encoded when it is a valid
/// `http`/`https` URL, or an empty string otherwise. An empty result means the link must be
/// omitted.
///
/// The parsed form is returned rather than the input, so whitespace and markup the parser strips
/// or encodes never reach the rendered markdown.
pub fn sanitize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
            parsed.as_str().replace('(', "%28").replace(')', "%29")
        }
        _ => String::new(),
    }
}

/// Sanitized text that is also safe inside a markdown table cell.
pub fn escape_table_cell(text: &str) -> String {
    sanitize_markdown_text(text).replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use crate::sanitize::{escape_table_cell, sanitize_id, sanitize_markdown_text, sanitize_url};

    #[test_case("orders-api", "orders-api" ; "already safe")]
    #[test_case("../../etc/passwd", "------etc-passwd" ; "path traversal")]
    #[test_case("Orders API v2", "Orders-API-v2" ; "spaces")]
    #[test_case("ari:cloud:compass:abc/123", "ari-cloud-compass-abc-123" ; "ari")]
    #[test_case("", "" ; "empty")]
    #[test_case("café_1", "caf-_1" ; "non ascii")]
    fn ids(raw: &str, expected: &str) {
        assert_eq!(expected, sanitize_id(raw));
    }

    #[test]
    fn markdown_text_escapes_html_then_links() {
        assert_eq!(
            "&lt;b&gt;Tom &amp; Jerry&#39;s &quot;docs&quot;&lt;/b&gt; \\[x\\]\\(y\\)",
            sanitize_markdown_text("<b>Tom & Jerry's \"docs\"</b> [x](y)")
        );
    }

    #[test]
    fn url_parentheses_are_percent_encoded() {
        let sanitized = sanitize_url("https://example.com/a(b)");
        assert_eq!("https://example.com/a%28b%29", sanitized);
        assert!(sanitized.starts_with("https://example.com"));
    }

    #[test_case("javascript:alert(1)" ; "javascript")]
    #[test_case("ftp://example.com/file" ; "ftp")]
    #[test_case("not a url" ; "unparsable")]
    #[test_case("" ; "empty")]
    fn unsafe_urls_are_dropped(url: &str) {
        assert_eq!("", sanitize_url(url));
    }

    #[test]
    fn http_urls_are_kept() {
        assert_eq!("http://example.com/x?y=1", sanitize_url("http://example.com/x?y=1"));
    }

    #[test_case(
        "https://example.com/\n\n<img src=x onerror=alert(1)>",
        "https://example.com/%3Cimg%20src=x%20onerror=alert%281%29%3E" ;
        "embedded newlines"
    )]
    #[test_case(
        "https://example.com/ <img src=x onerror=alert(1)>",
        "https://example.com/%20%3Cimg%20src=x%20onerror=alert%281%29%3E" ;
        "space and angle brackets"
    )]
    #[test_case("https://example.com/a\tb", "https://example.com/ab" ; "tab")]
    fn markup_in_urls_never_survives(url: &str, expected: &str) {
        let sanitized = sanitize_url(url);
        assert_eq!(expected, sanitized);
        assert!(!sanitized.contains(['<', '>', '\n', ' ']));
    }

    #[test]
    fn table_cells_escape_pipes() {
        assert_eq!("a \\| b", escape_table_cell("a | b"));
    }
}
