//! HTML fragment serialization
//!
//! Walks the document tree and emits semantic HTML5 directly. The output
//! is a fragment only; no document shell, scripts, or styling.

use std::collections::HashMap;

use rst_parser::{Block, Document, Inline, ListItem};

use crate::escape::escape_html;

/// Serialize a parsed document to an HTML fragment.
pub fn write_fragment(document: &Document) -> String {
    let mut writer = HtmlWriter::new();
    writer.write_blocks(&document.blocks);
    writer.output
}

struct HtmlWriter {
    output: String,
    /// Section ids handed out so far, for deduplication
    used_ids: HashMap<String, usize>,
}

impl HtmlWriter {
    fn new() -> Self {
        Self {
            output: String::new(),
            used_ids: HashMap::new(),
        }
    }

    fn write_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.write_block(block);
        }
    }

    fn write_block(&mut self, block: &Block) {
        match block {
            Block::Section {
                level,
                title,
                children,
            } => self.write_section(*level, title, children),
            Block::Paragraph(runs) => {
                self.output.push_str("<p>");
                self.write_inlines(runs);
                self.output.push_str("</p>\n");
            }
            Block::BulletList(items) => self.write_list("ul", items),
            Block::EnumeratedList(items) => self.write_list("ol", items),
            Block::LiteralBlock(text) => {
                self.output.push_str("<pre class=\"literal-block\">");
                self.output.push_str(&escape_html(text));
                self.output.push_str("</pre>\n");
            }
            Block::CodeBlock { language, text } => {
                match language {
                    Some(lang) => {
                        self.output.push_str("<pre><code class=\"language-");
                        self.output.push_str(&escape_html(lang));
                        self.output.push_str("\">");
                    }
                    None => self.output.push_str("<pre><code>"),
                }
                self.output.push_str(&escape_html(text));
                self.output.push_str("</code></pre>\n");
            }
            Block::BlockQuote(blocks) => {
                self.output.push_str("<blockquote>\n");
                self.write_blocks(blocks);
                self.output.push_str("</blockquote>\n");
            }
            Block::Transition => self.output.push_str("<hr />\n"),
        }
    }

    fn write_section(&mut self, level: usize, title: &[Inline], children: &[Block]) {
        let id = self.unique_id(slugify(&inline_text(title)));
        // Section levels are unbounded; HTML headings stop at h6.
        let depth = level.min(6);
        self.output.push_str("<section id=\"");
        self.output.push_str(&id);
        self.output.push_str("\">\n");
        self.output.push_str(&format!("<h{depth}>"));
        self.write_inlines(title);
        self.output.push_str(&format!("</h{depth}>\n"));
        self.write_blocks(children);
        self.output.push_str("</section>\n");
    }

    fn write_list(&mut self, tag: &str, items: &[ListItem]) {
        self.output.push_str(&format!("<{tag}>\n"));
        for item in items {
            self.write_list_item(item);
        }
        self.output.push_str(&format!("</{tag}>\n"));
    }

    fn write_list_item(&mut self, item: &ListItem) {
        self.output.push_str("<li>");
        let mut rest = item.content.as_slice();
        // A single leading paragraph is inlined into the <li> tag.
        if let [Block::Paragraph(runs), tail @ ..] = rest {
            self.write_inlines(runs);
            rest = tail;
        }
        if !rest.is_empty() {
            self.output.push('\n');
            self.write_blocks(rest);
        }
        self.output.push_str("</li>\n");
    }

    fn write_inlines(&mut self, runs: &[Inline]) {
        for run in runs {
            match run {
                Inline::Text(text) => self.output.push_str(&escape_html(text)),
                Inline::Emphasis(text) => {
                    self.output.push_str("<em>");
                    self.output.push_str(&escape_html(text));
                    self.output.push_str("</em>");
                }
                Inline::Strong(text) => {
                    self.output.push_str("<strong>");
                    self.output.push_str(&escape_html(text));
                    self.output.push_str("</strong>");
                }
                Inline::Literal(text) => {
                    self.output.push_str("<code>");
                    self.output.push_str(&escape_html(text));
                    self.output.push_str("</code>");
                }
                Inline::Link { text, url } => {
                    self.output.push_str("<a href=\"");
                    self.output.push_str(&escape_html(url));
                    self.output.push_str("\">");
                    self.output.push_str(&escape_html(text));
                    self.output.push_str("</a>");
                }
            }
        }
    }

    /// Deduplicate a slug by appending `-1`, `-2`, ... on repeats.
    fn unique_id(&mut self, base: String) -> String {
        let count = self.used_ids.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{base}-{}", *count - 1)
        }
    }
}

fn inline_text(runs: &[Inline]) -> String {
    let mut text = String::new();
    for run in runs {
        match run {
            Inline::Text(t)
            | Inline::Emphasis(t)
            | Inline::Strong(t)
            | Inline::Literal(t)
            | Inline::Link { text: t, .. } => text.push_str(t),
        }
    }
    text
}

/// Lowercase alphanumeric slug with single dashes between words.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}
