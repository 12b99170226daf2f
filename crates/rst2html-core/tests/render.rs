//! Behavior tests for the render contract
//!
//! Exercises the end-to-end guarantees: total rendering with partial
//! output, structured diagnostics, escaping, and scaling on adversarial
//! inline input.

use rst2html_core::{Severity, render};

#[test]
fn empty_input_gives_empty_result() {
    let result = render("");
    assert_eq!(result.html_fragment, "");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn whitespace_only_input_gives_empty_result() {
    let result = render("   \n\n\t\n");
    assert_eq!(result.html_fragment, "");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn rendering_is_deterministic() {
    let source = "T\n=\n\n- a\n- b\n\n.. widget::\n\n   x\n";
    assert_eq!(render(source), render(source));
}

#[test]
fn heading_and_emphasis() {
    let result = render("Title\n=====\n\nHello *world*.\n");
    assert!(result.html_fragment.contains("<h1>Title</h1>"));
    assert!(result.html_fragment.contains("<em>world</em>"));
    assert!(result.diagnostics.is_empty());
}

#[test]
fn heading_underline_reuse_keeps_level() {
    let source = "A\n=\n\nB\n-\n\nC\n=\n";
    let result = render(source);
    assert!(result.html_fragment.contains("<h1>A</h1>"));
    assert!(result.html_fragment.contains("<h2>B</h2>"));
    assert!(result.html_fragment.contains("<h1>C</h1>"));
}

#[test]
fn section_level_jump_is_accepted() {
    // `=`, `-`, `~` become levels 1-3; the final `~` section sits directly
    // under a level-1 section with no level-2 in between.
    let result = render("A\n=\n\nB\n-\n\nC\n~\n\nD\n=\n\nE\n~\n");
    assert!(result.diagnostics.is_empty());
    assert!(result.html_fragment.contains("<h1>D</h1>"));
    assert!(result.html_fragment.contains("<h3>E</h3>"));
    let d = result.html_fragment.find("<h1>D</h1>").unwrap();
    let e = result.html_fragment.find("<h3>E</h3>").unwrap();
    assert!(d < e, "jumped section must nest inside the level-1 section");
}

#[test]
fn short_underline_warns_but_renders_heading() {
    let result = render("Long Title\n==\n\nbody\n");
    assert!(result.html_fragment.contains("<h1>Long Title</h1>"));
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].severity, Severity::Warning);
    assert_eq!(result.diagnostics[0].line, 2);
    assert_eq!(result.diagnostics[0].message, "Title underline too short.");
}

#[test]
fn unterminated_emphasis_renders_plain() {
    let result = render("an *unterminated thing\n");
    assert!(result.html_fragment.contains("*unterminated thing"));
    assert!(!result.html_fragment.contains("<em>"));
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].message,
        "Inline emphasis start-string without end-string."
    );
}

#[test]
fn html_in_source_is_escaped() {
    let result = render("<script>alert('x')</script>\n");
    assert!(!result.html_fragment.contains("<script>"));
    assert!(
        result
            .html_fragment
            .contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;")
    );
}

#[test]
fn html_in_literal_block_is_escaped() {
    let result = render("::\n\n  <b>&</b>\n");
    assert!(result.html_fragment.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
    assert!(!result.html_fragment.contains("<b>"));
}

#[test]
fn literal_block_preserves_indentation() {
    let result = render("::\n\n    if x:\n        y()\n");
    assert!(
        result
            .html_fragment
            .contains("<pre class=\"literal-block\">if x:\n    y()</pre>")
    );
}

#[test]
fn missing_literal_block_warns() {
    let result = render("Code::\n\nback at margin\n");
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].message,
        "Literal block expected; none found."
    );
    assert!(result.html_fragment.contains("<p>Code:</p>"));
}

#[test]
fn unknown_directive_warns_and_falls_back() {
    let result = render(".. fancy::\n\n   raw body\n");
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].message,
        "Unknown directive type \"fancy\"."
    );
    assert!(
        result
            .html_fragment
            .contains("<pre class=\"literal-block\">raw body</pre>")
    );
}

#[test]
fn code_block_directive_carries_language() {
    let result = render(".. code-block:: rust\n\n   fn main() {}\n");
    assert!(
        result
            .html_fragment
            .contains("<pre><code class=\"language-rust\">fn main() {}</code></pre>")
    );
}

#[test]
fn highlight_directive_sets_default_language() {
    let result = render(".. highlight:: python\n\n.. code-block::\n\n   pass\n");
    assert!(result.html_fragment.contains("class=\"language-python\""));
}

#[test]
fn blockquote_from_indented_text() {
    let result = render("para\n\n   quoted\n");
    assert!(
        result
            .html_fragment
            .contains("<blockquote>\n<p>quoted</p>\n</blockquote>")
    );
}

#[test]
fn transition_renders_hr() {
    let result = render("a\n\n----\n\nb\n");
    assert!(result.html_fragment.contains("<hr />"));
}

#[test]
fn link_with_embedded_uri() {
    let result = render("see `Rust <https://rust-lang.org>`_\n");
    assert!(
        result
            .html_fragment
            .contains("<a href=\"https://rust-lang.org\">Rust</a>")
    );
}

#[test]
fn diagnostics_are_in_source_order() {
    let result = render("*a\n\n*b\n\n*c\n");
    let lines: Vec<usize> = result.diagnostics.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![1, 3, 5]);
}

#[test]
fn nesting_limit_yields_error_and_partial_output() {
    let mut source = String::from("kept paragraph\n\n");
    for depth in 0..200 {
        source.push_str(&" ".repeat(depth + 1));
        source.push_str("- item\n");
    }
    let result = render(&source);
    assert!(result.html_fragment.contains("<p>kept paragraph</p>"));
    assert!(result.has_severity(Severity::Error));
}

#[test]
fn adversarial_unmatched_markers_complete_quickly() {
    // Quadratic close scanning would make this take minutes.
    let source = "*x ".repeat(50_000);
    let start = std::time::Instant::now();
    let result = render(&source);
    assert!(start.elapsed().as_secs() < 5, "inline scan is not linear");
    assert_eq!(result.diagnostics.len(), 50_000);
}

#[test]
fn fragment_has_no_document_shell() {
    let result = render("Title\n=====\n\nbody\n");
    assert!(!result.html_fragment.contains("<html"));
    assert!(!result.html_fragment.contains("<body"));
    assert!(!result.html_fragment.contains("<head"));
}
