//! Parser for a reduced subset of reStructuredText (RST)
//!
//! Parsing is total: [`parse`] always returns a best-effort document tree
//! together with the diagnostics collected along the way, never an error.
//!
//! ```
//! use rst_parser::parse;
//!
//! let outcome = parse("Title\n=====\n\nHello *world*.\n");
//! assert!(outcome.diagnostics.is_empty());
//! assert_eq!(outcome.document.blocks.len(), 1);
//! ```

pub mod ast;
pub mod block;
pub mod diagnostics;
pub mod inline;

pub use ast::{Block, Document, Inline, ListItem};
pub use block::{MAX_NESTING, ParseOutcome, parse};
pub use diagnostics::{Diagnostic, Severity};
pub use inline::parse_inline;
