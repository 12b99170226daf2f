//! Inline markup resolution
//!
//! Scans paragraph, list-item, and title text for `**strong**`,
//! `*emphasis*`, ``` ``literal`` ``` / `` `literal` `` spans, and hyperlink
//! references with embedded URIs (`` `text <url>`_ ``).
//!
//! The scanner walks the text with explicit indices; there is no regex and
//! no backtracking. Markers never span lines. An opening marker with no
//! matching close before end of line is kept as plain text and reported as
//! a warning, using docutils' message texts so diagnostics read the same as
//! the reference toolchain's.

use crate::ast::Inline;
use crate::diagnostics::Diagnostic;

// Marker kinds, used to index the per-line failed-close memo.
const STRONG: usize = 0;
const EMPHASIS: usize = 1;
const LITERAL: usize = 2;
const INTERPRETED: usize = 3;

/// Result of probing for a span at an opening marker
enum Scan {
    /// Closing marker found; value is the byte offset of the close
    Span(usize),
    /// The candidate is not a valid opener (e.g. followed by whitespace)
    NotAMarker,
    /// Valid opener with no close before end of line
    Unterminated,
}

/// Resolve inline markup in `text`, starting at source line `start_line`.
///
/// Nested markers are not interpreted: the inner marker characters render
/// literally. Backslash escapes the following character.
pub fn parse_inline(text: &str, start_line: usize, diagnostics: &mut Vec<Diagnostic>) -> Vec<Inline> {
    let bytes = text.as_bytes();
    let mut runs: Vec<Inline> = Vec::new();
    let mut buf = String::new();
    let mut line = start_line;
    // Once a close scan fails for a marker kind, every later opener of that
    // kind on the same line fails too; remembering that keeps adversarial
    // inputs (N unmatched markers) linear instead of quadratic.
    let mut no_close = [false; 4];
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                line += 1;
                no_close = [false; 4];
                buf.push('\n');
                i += 1;
            }
            b'\\' if i + 1 < bytes.len() => {
                if let Some(ch) = text[i + 1..].chars().next() {
                    if ch == '\n' {
                        line += 1;
                        no_close = [false; 4];
                    }
                    buf.push(ch);
                    i += 1 + ch.len_utf8();
                } else {
                    i += 1;
                }
            }
            b'*' => {
                let double = bytes.get(i + 1) == Some(&b'*');
                let (kind, marker): (usize, &[u8]) =
                    if double { (STRONG, b"**") } else { (EMPHASIS, b"*") };
                match scan_span(bytes, i, marker, kind, &mut no_close) {
                    Scan::Span(close) => {
                        flush(&mut buf, &mut runs);
                        let content = text[i + marker.len()..close].to_string();
                        runs.push(if double {
                            Inline::Strong(content)
                        } else {
                            Inline::Emphasis(content)
                        });
                        i = close + marker.len();
                    }
                    Scan::NotAMarker => {
                        buf.push('*');
                        i += 1;
                    }
                    Scan::Unterminated => {
                        let message = if double {
                            "Inline strong start-string without end-string."
                        } else {
                            "Inline emphasis start-string without end-string."
                        };
                        diagnostics.push(Diagnostic::warning(line, message));
                        for _ in 0..marker.len() {
                            buf.push('*');
                        }
                        i += marker.len();
                    }
                }
            }
            b'`' => {
                if bytes.get(i + 1) == Some(&b'`') {
                    match scan_span(bytes, i, b"``", LITERAL, &mut no_close) {
                        Scan::Span(close) => {
                            flush(&mut buf, &mut runs);
                            runs.push(Inline::Literal(text[i + 2..close].to_string()));
                            i = close + 2;
                        }
                        Scan::NotAMarker => {
                            buf.push('`');
                            i += 1;
                        }
                        Scan::Unterminated => {
                            diagnostics.push(Diagnostic::warning(
                                line,
                                "Inline literal start-string without end-string.",
                            ));
                            buf.push_str("``");
                            i += 2;
                        }
                    }
                } else {
                    match scan_span(bytes, i, b"`", INTERPRETED, &mut no_close) {
                        Scan::Span(close) => {
                            flush(&mut buf, &mut runs);
                            let content = &text[i + 1..close];
                            let mut next = close + 1;
                            if bytes.get(next) == Some(&b'_') {
                                if let Some((label, url)) = split_embedded_uri(content) {
                                    next += 1;
                                    // Anonymous references use a double underscore.
                                    if bytes.get(next) == Some(&b'_') {
                                        next += 1;
                                    }
                                    runs.push(Inline::Link { text: label, url });
                                    i = next;
                                    continue;
                                }
                            }
                            runs.push(Inline::Literal(content.to_string()));
                            i = next;
                        }
                        Scan::NotAMarker => {
                            buf.push('`');
                            i += 1;
                        }
                        Scan::Unterminated => {
                            diagnostics.push(Diagnostic::warning(
                                line,
                                "Inline interpreted text or phrase reference start-string \
                                 without end-string.",
                            ));
                            buf.push('`');
                            i += 1;
                        }
                    }
                }
            }
            _ => {
                if let Some(ch) = text[i..].chars().next() {
                    buf.push(ch);
                    i += ch.len_utf8();
                } else {
                    i += 1;
                }
            }
        }
    }

    flush(&mut buf, &mut runs);
    runs
}

fn flush(buf: &mut String, runs: &mut Vec<Inline>) {
    if !buf.is_empty() {
        runs.push(Inline::Text(std::mem::take(buf)));
    }
}

/// Probe for a closing marker on the same line.
///
/// An opener must be immediately followed by a non-space character; a
/// closer must be immediately preceded by one.
fn scan_span(
    bytes: &[u8],
    open: usize,
    marker: &[u8],
    kind: usize,
    no_close: &mut [bool; 4],
) -> Scan {
    let content_start = open + marker.len();
    match bytes.get(content_start) {
        Some(&c) if !matches!(c, b' ' | b'\t' | b'\n') => {}
        _ => return Scan::NotAMarker,
    }
    if no_close[kind] {
        return Scan::Unterminated;
    }

    let mut j = content_start + 1;
    while j + marker.len() <= bytes.len() {
        match bytes[j] {
            b'\n' => break,
            b'\\' => {
                // The escaped character is content, never a closer.
                j += 2;
                continue;
            }
            _ => {}
        }
        if bytes[j..].starts_with(marker) && !matches!(bytes[j - 1], b' ' | b'\t') {
            return Scan::Span(j);
        }
        j += 1;
    }

    no_close[kind] = true;
    Scan::Unterminated
}

/// Split `text <url>` reference content into label and URI.
fn split_embedded_uri(content: &str) -> Option<(String, String)> {
    let content = content.trim_end();
    if !content.ends_with('>') {
        return None;
    }
    let pos = content.rfind(" <")?;
    let url = &content[pos + 2..content.len() - 1];
    if url.is_empty() || url.contains(char::is_whitespace) {
        return None;
    }
    let label = content[..pos].trim_end();
    let label = if label.is_empty() { url } else { label };
    Some((label.to_string(), url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> Vec<Inline> {
        let mut diagnostics = Vec::new();
        let runs = parse_inline(text, 1, &mut diagnostics);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        runs
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_ok("hello"), vec![Inline::Text("hello".to_string())]);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(parse_ok(""), vec![]);
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(
            parse_ok("Hello *world*."),
            vec![
                Inline::Text("Hello ".to_string()),
                Inline::Emphasis("world".to_string()),
                Inline::Text(".".to_string()),
            ]
        );
    }

    #[test]
    fn test_strong() {
        assert_eq!(
            parse_ok("a **b** c"),
            vec![
                Inline::Text("a ".to_string()),
                Inline::Strong("b".to_string()),
                Inline::Text(" c".to_string()),
            ]
        );
    }

    #[test]
    fn test_double_backtick_literal() {
        assert_eq!(
            parse_ok("use ``x < 1`` here"),
            vec![
                Inline::Text("use ".to_string()),
                Inline::Literal("x < 1".to_string()),
                Inline::Text(" here".to_string()),
            ]
        );
    }

    #[test]
    fn test_single_backtick_literal() {
        assert_eq!(
            parse_ok("`code`"),
            vec![Inline::Literal("code".to_string())]
        );
    }

    #[test]
    fn test_embedded_uri_reference() {
        assert_eq!(
            parse_ok("see `Rust <https://rust-lang.org>`_ now"),
            vec![
                Inline::Text("see ".to_string()),
                Inline::Link {
                    text: "Rust".to_string(),
                    url: "https://rust-lang.org".to_string(),
                },
                Inline::Text(" now".to_string()),
            ]
        );
    }

    #[test]
    fn test_anonymous_reference() {
        assert_eq!(
            parse_ok("`x <https://example.com>`__"),
            vec![Inline::Link {
                text: "x".to_string(),
                url: "https://example.com".to_string(),
            }]
        );
    }

    #[test]
    fn test_reference_without_uri_stays_literal() {
        // Internal cross-references are out of scope; the span is kept as a
        // literal and the trailing underscore as text.
        assert_eq!(
            parse_ok("`topic`_"),
            vec![
                Inline::Literal("topic".to_string()),
                Inline::Text("_".to_string()),
            ]
        );
    }

    #[test]
    fn test_marker_followed_by_space_is_plain() {
        assert_eq!(
            parse_ok("3 * 4 * 5"),
            vec![Inline::Text("3 * 4 * 5".to_string())]
        );
    }

    #[test]
    fn test_unterminated_emphasis() {
        let mut diagnostics = Vec::new();
        let runs = parse_inline("*unterminated", 7, &mut diagnostics);
        assert_eq!(runs, vec![Inline::Text("*unterminated".to_string())]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 7);
        assert_eq!(
            diagnostics[0].message,
            "Inline emphasis start-string without end-string."
        );
    }

    #[test]
    fn test_unterminated_strong() {
        let mut diagnostics = Vec::new();
        let runs = parse_inline("**bold", 1, &mut diagnostics);
        assert_eq!(runs, vec![Inline::Text("**bold".to_string())]);
        assert_eq!(
            diagnostics[0].message,
            "Inline strong start-string without end-string."
        );
    }

    #[test]
    fn test_unterminated_literal() {
        let mut diagnostics = Vec::new();
        let runs = parse_inline("``oops", 1, &mut diagnostics);
        assert_eq!(runs, vec![Inline::Text("``oops".to_string())]);
        assert_eq!(
            diagnostics[0].message,
            "Inline literal start-string without end-string."
        );
    }

    #[test]
    fn test_markers_do_not_span_lines() {
        let mut diagnostics = Vec::new();
        let runs = parse_inline("*a\nb*", 1, &mut diagnostics);
        // The close on the next line does not terminate the span; both
        // asterisks end up literal, and only the first produces a warning
        // (the second is followed by end-of-text).
        assert_eq!(runs, vec![Inline::Text("*a\nb*".to_string())]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 1);
    }

    #[test]
    fn test_line_numbers_advance() {
        let mut diagnostics = Vec::new();
        parse_inline("fine\nfine\n*bad", 3, &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 5);
    }

    #[test]
    fn test_no_nesting() {
        // The inner marker renders literally inside the emphasis span.
        assert_eq!(
            parse_ok("*a ``b`` c*"),
            vec![Inline::Emphasis("a ``b`` c".to_string())]
        );
    }

    #[test]
    fn test_backslash_escape() {
        assert_eq!(
            parse_ok(r"\*not emphasis\*"),
            vec![Inline::Text("*not emphasis*".to_string())]
        );
    }

    #[test]
    fn test_escaped_close_is_content() {
        let mut diagnostics = Vec::new();
        let runs = parse_inline(r"*a\* b", 1, &mut diagnostics);
        assert_eq!(runs, vec![Inline::Text("*a* b".to_string())]);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_adjacent_spans() {
        assert_eq!(
            parse_ok("*a*\u{200b}**b**"),
            vec![
                Inline::Emphasis("a".to_string()),
                Inline::Text("\u{200b}".to_string()),
                Inline::Strong("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_multibyte_content() {
        assert_eq!(
            parse_ok("*日本語* text"),
            vec![
                Inline::Emphasis("日本語".to_string()),
                Inline::Text(" text".to_string()),
            ]
        );
    }

    #[test]
    fn test_unmatched_markers_all_reported() {
        let mut diagnostics = Vec::new();
        let runs = parse_inline("*a *b *c", 1, &mut diagnostics);
        assert_eq!(runs, vec![Inline::Text("*a *b *c".to_string())]);
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_many_unmatched_markers_scale() {
        // One failed close scan per marker kind per line; the rest of the
        // openers resolve in constant time.
        let input = "*x ".repeat(20_000);
        let mut diagnostics = Vec::new();
        let runs = parse_inline(&input, 1, &mut diagnostics);
        assert_eq!(diagnostics.len(), 20_000);
        assert_eq!(runs.len(), 1);
    }
}
