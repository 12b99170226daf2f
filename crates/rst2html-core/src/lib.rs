//! Render reStructuredText (RST) to HTML fragments
//!
//! [`render`] is total: it always returns an HTML fragment plus the
//! diagnostics collected while parsing, never an error. Malformed markup
//! degrades to plain or literal text with a warning attached, so the
//! fragment stays useful for live-preview callers.
//!
//! ```
//! use rst2html_core::render;
//!
//! let result = render("Title\n=====\n\nHello *world*.\n");
//! assert!(result.html_fragment.contains("<h1>Title</h1>"));
//! assert!(result.html_fragment.contains("<em>world</em>"));
//! assert!(result.diagnostics.is_empty());
//! ```

pub mod escape;
pub mod writer;

use serde::Serialize;

pub use rst_parser::{Diagnostic, Severity};

/// Output of one [`render`] call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    /// HTML fragment (no document shell, no styling)
    pub html_fragment: String,
    /// Problems found while parsing, in source order
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderResult {
    /// Whether any diagnostic reaches `severity`.
    pub fn has_severity(&self, severity: Severity) -> bool {
        self.diagnostics.iter().any(|d| d.severity >= severity)
    }
}

/// Render RST source to an HTML fragment plus diagnostics.
pub fn render(source: &str) -> RenderResult {
    let outcome = rst_parser::parse(source);
    RenderResult {
        html_fragment: writer::write_fragment(&outcome.document),
        diagnostics: outcome.diagnostics,
    }
}
