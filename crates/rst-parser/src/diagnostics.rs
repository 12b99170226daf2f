//! Structured parse diagnostics
//!
//! Problems found while parsing are collected, never thrown: the parser
//! always completes and returns a best-effort tree alongside the
//! diagnostics it gathered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How severe a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Recoverable: a construct was demoted, skipped, or rendered literally
    Warning,
    /// Fatal to the rest of the parse; partial output was still produced
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A single problem found during parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// 1-based source line the problem was found on
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    /// Create a warning diagnostic
    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            line,
            message: message.into(),
        }
    }

    /// Create an error diagnostic
    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let d = Diagnostic::warning(12, "Title underline too short.");
        assert_eq!(d.to_string(), "line 12: warning: Title underline too short.");

        let d = Diagnostic::error(3, "boom");
        assert_eq!(d.to_string(), "line 3: error: boom");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
    }

    #[test]
    fn test_serialize_diagnostic() {
        let d = Diagnostic::warning(5, "msg");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"severity":"warning","line":5,"message":"msg"}"#);
    }

    #[test]
    fn test_deserialize_diagnostic() {
        let json = r#"{"severity":"error","line":1,"message":"x"}"#;
        let d: Diagnostic = serde_json::from_str(json).unwrap();
        assert_eq!(d, Diagnostic::error(1, "x"));
    }
}
