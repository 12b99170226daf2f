//! RST AST types
//!
//! This module defines the document tree produced by the parser. The tree
//! is strictly owned top-down: sections own their children, lists own their
//! items. There are no cross-references or cycles.

use serde::{Deserialize, Serialize};

/// A complete parsed document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Top-level blocks in source order
    pub blocks: Vec<Block>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self { blocks: vec![] }
    }

    /// Whether the document holds no content at all
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A block-level construct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Block {
    /// A titled section; nesting depth follows underline first-seen order
    Section {
        /// 1-based section level
        level: usize,
        title: Vec<Inline>,
        children: Vec<Block>,
    },

    /// A run of inline content
    Paragraph(Vec<Inline>),

    /// Bullet (unordered) list
    BulletList(Vec<ListItem>),

    /// Enumerated (ordered) list
    EnumeratedList(Vec<ListItem>),

    /// Preformatted text introduced by a trailing `::`; no inline parsing
    LiteralBlock(String),

    /// A `.. code-block::` directive body
    CodeBlock {
        language: Option<String>,
        text: String,
    },

    /// Indented body text not claimed by a literal block
    BlockQuote(Vec<Block>),

    /// A lone line of repeated adornment characters
    Transition,
}

/// One item of a bullet or enumerated list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// The item's blocks (paragraphs, nested lists, ...)
    pub content: Vec<Block>,
}

/// An inline run within paragraph, list-item, or title text
///
/// Runs are flat: inline markers do not nest, an inner marker renders as
/// literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Inline {
    /// Plain text
    Text(String),

    /// `*emphasis*`
    Emphasis(String),

    /// `**strong**`
    Strong(String),

    /// ```` ``literal`` ```` or `` `literal` ``
    Literal(String),

    /// External hyperlink reference with embedded URI: `` `text <url>`_ ``
    Link { text: String, url: String },
}

#[cfg(feature = "json")]
impl Document {
    /// Serialize the document to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize the document to a pretty-printed JSON string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_serialize_block() {
        let block = Block::CodeBlock {
            language: Some("rust".to_string()),
            text: "fn main() {}".to_string(),
        };

        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("codeBlock"));
        assert!(json.contains("rust"));
    }

    #[test]
    fn test_serialize_inline_roundtrip() {
        let runs = vec![
            Inline::Text("see ".to_string()),
            Inline::Link {
                text: "docs".to_string(),
                url: "https://example.com".to_string(),
            },
        ];

        let json = serde_json::to_string(&runs).unwrap();
        let restored: Vec<Inline> = serde_json::from_str(&json).unwrap();
        assert_eq!(runs, restored);
    }

    #[test]
    fn test_document_tree_roundtrip() {
        let doc = Document {
            blocks: vec![Block::Section {
                level: 1,
                title: vec![Inline::Text("Intro".to_string())],
                children: vec![
                    Block::Paragraph(vec![Inline::Emphasis("hi".to_string())]),
                    Block::BulletList(vec![ListItem {
                        content: vec![Block::Paragraph(vec![Inline::Text("a".to_string())])],
                    }]),
                ],
            }],
        };

        let json = serde_json::to_string(&doc).unwrap();
        let restored: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, restored);
    }
}
