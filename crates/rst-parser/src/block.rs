//! Line-oriented structural parser
//!
//! The parser walks the source line by line and classifies each block by
//! looking at the current line (and, for headings, the next one). Indented
//! regions (list items, block quotes, directive bodies) are sliced out,
//! dedented, and parsed recursively with the same machinery.

use crate::ast::{Block, Document, Inline, ListItem};
use crate::diagnostics::Diagnostic;
use crate::inline::parse_inline;
use thiserror::Error;

/// Hard cap on block nesting depth (lists inside quotes inside lists, ...).
///
/// Hitting the cap aborts the parse with an error diagnostic; everything
/// parsed up to that point is still returned.
pub const MAX_NESTING: usize = 64;

/// Characters accepted in title underlines and transitions.
const ADORNMENT_CHARS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Debug, Error)]
enum ParseAbort {
    #[error("Block nesting exceeds the limit of {limit} levels.")]
    NestingLimit { limit: usize, line: usize },
}

impl ParseAbort {
    fn line(&self) -> usize {
        match self {
            Self::NestingLimit { line, .. } => *line,
        }
    }
}

/// Which flavor of list a marker line starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet(char),
    Enumerated,
}

/// Everything a [`parse`] call produces
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse RST source into a document tree plus diagnostics.
///
/// This never fails: malformed input degrades to plain text or literal
/// blocks with a warning attached, and even the nesting-limit abort leaves
/// a partial tree behind.
pub fn parse(source: &str) -> ParseOutcome {
    let lines: Vec<Line<'_>> = source
        .lines()
        .enumerate()
        .map(|(idx, raw)| Line::new(raw, idx + 1))
        .collect();

    let mut ctx = Ctx::default();
    let mut parser = BlockParser {
        lines,
        pos: 0,
        ctx: &mut ctx,
    };
    let flat = parser.parse_top();

    ParseOutcome {
        document: Document {
            blocks: assemble_sections(flat),
        },
        diagnostics: ctx.diagnostics,
    }
}

/// One source line, sliced relative to the region being parsed
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// Text including indentation, relative to the current region
    raw: &'a str,
    /// Leading whitespace width in columns (tabs count as one)
    indent: usize,
    /// Content with surrounding whitespace trimmed
    text: &'a str,
    /// 1-based line number in the original source
    number: usize,
}

impl<'a> Line<'a> {
    fn new(raw: &'a str, number: usize) -> Self {
        let indent = raw
            .bytes()
            .take_while(|b| matches!(b, b' ' | b'\t'))
            .count();
        Self {
            raw,
            indent,
            text: raw[indent..].trim_end(),
            number,
        }
    }

    fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Shift the line left by `n` columns for a nested region.
    fn rebase(self, n: usize) -> Self {
        if self.is_blank() {
            Line::new("", self.number)
        } else {
            Line::new(&self.raw[n..], self.number)
        }
    }
}

/// Parse state shared across nested regions
#[derive(Default)]
struct Ctx {
    diagnostics: Vec<Diagnostic>,
    /// Underline characters in first-seen order; index + 1 is the level
    adornments: Vec<char>,
    /// Language set by the most recent `highlight` directive
    default_language: Option<String>,
}

/// Top-level output before sections are nested
enum FlatBlock {
    Heading { level: usize, title: Vec<Inline> },
    Block(Block),
}

struct BlockParser<'a, 'c> {
    lines: Vec<Line<'a>>,
    pos: usize,
    ctx: &'c mut Ctx,
}

impl<'a> BlockParser<'a, '_> {
    fn is_at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    fn peek(&self) -> Line<'a> {
        self.lines[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Option<Line<'a>> {
        self.lines.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Line<'a> {
        let line = self.lines[self.pos];
        self.pos += 1;
        line
    }

    fn skip_blank_lines(&mut self) {
        while !self.is_at_end() && self.peek().is_blank() {
            self.pos += 1;
        }
    }

    /// Parse the document body. Headings only exist at the top level.
    fn parse_top(&mut self) -> Vec<FlatBlock> {
        let mut flat = Vec::new();
        loop {
            self.skip_blank_lines();
            if self.is_at_end() {
                break;
            }
            if let Some(heading) = self.try_heading() {
                flat.push(heading);
                continue;
            }
            match self.next_block(0) {
                Ok(blocks) => flat.extend(blocks.into_iter().map(FlatBlock::Block)),
                Err(abort) => {
                    self.ctx
                        .diagnostics
                        .push(Diagnostic::error(abort.line(), abort.to_string()));
                    break;
                }
            }
        }
        flat
    }

    /// A heading is a flush-left title line followed by an adornment line.
    fn try_heading(&mut self) -> Option<FlatBlock> {
        let title = self.peek();
        if title.indent != 0
            || is_adornment_line(title.text)
            || starts_explicit_markup(title.text)
            || bullet_marker_width(title.text).is_some()
            || enumerated_marker_width(title.text).is_some()
        {
            return None;
        }
        let underline = self.peek_at(1)?;
        if underline.indent != 0 || !is_adornment_line(underline.text) {
            return None;
        }

        // A short underline is accepted, with a warning.
        if underline.text.chars().count() < title.text.chars().count() {
            self.ctx.diagnostics.push(Diagnostic::warning(
                underline.number,
                "Title underline too short.",
            ));
        }

        let ch = underline.text.chars().next()?;
        let level = match self.ctx.adornments.iter().position(|&c| c == ch) {
            Some(idx) => idx + 1,
            None => {
                self.ctx.adornments.push(ch);
                self.ctx.adornments.len()
            }
        };
        let runs = parse_inline(title.text, title.number, &mut self.ctx.diagnostics);
        self.pos += 2;
        Some(FlatBlock::Heading { level, title: runs })
    }

    /// Classify and parse the block starting at the current line.
    ///
    /// Returns zero or more blocks: comments and `highlight` produce none,
    /// a paragraph ending in `::` produces two.
    fn next_block(&mut self, depth: usize) -> Result<Vec<Block>, ParseAbort> {
        let line = self.peek();
        if line.indent > 0 {
            return Ok(vec![self.parse_block_quote(depth)?]);
        }

        let text = line.text;
        if starts_explicit_markup(text) {
            return self.parse_explicit_markup();
        }
        if bullet_marker_width(text).is_some() {
            let kind = ListKind::Bullet(first_char(text));
            return Ok(vec![self.parse_list(kind, depth)?]);
        }
        if enumerated_marker_width(text).is_some() {
            return Ok(vec![self.parse_list(ListKind::Enumerated, depth)?]);
        }
        if is_adornment_line(text) && text.chars().count() >= 4 {
            self.pos += 1;
            return Ok(vec![Block::Transition]);
        }
        // Short adornment runs fall through and parse as paragraph text.
        self.parse_text_block()
    }

    /// Consume lines at this indent or deeper, dedented by `min_indent`.
    ///
    /// Blank lines inside the region are kept; leading and trailing blanks
    /// are dropped.
    fn collect_indented(&mut self, min_indent: usize) -> Vec<Line<'a>> {
        let mut region = Vec::new();
        while let Some(next) = self.lines.get(self.pos).copied() {
            if next.is_blank() {
                region.push(Line::new("", next.number));
            } else if next.indent >= min_indent {
                region.push(next.rebase(min_indent));
            } else {
                break;
            }
            self.pos += 1;
        }
        while region.first().is_some_and(|l| l.is_blank()) {
            region.remove(0);
        }
        while region.last().is_some_and(|l| l.is_blank()) {
            region.pop();
        }
        region
    }

    /// Recursively parse a dedented region as its own block sequence.
    fn parse_region(&mut self, lines: Vec<Line<'a>>, depth: usize) -> Result<Vec<Block>, ParseAbort> {
        if depth >= MAX_NESTING {
            let line = lines.first().map(|l| l.number).unwrap_or(0);
            return Err(ParseAbort::NestingLimit {
                limit: MAX_NESTING,
                line,
            });
        }
        let mut child = BlockParser {
            lines,
            pos: 0,
            ctx: &mut *self.ctx,
        };
        child.parse_blocks(depth)
    }

    fn parse_blocks(&mut self, depth: usize) -> Result<Vec<Block>, ParseAbort> {
        let mut blocks = Vec::new();
        loop {
            self.skip_blank_lines();
            if self.is_at_end() {
                break;
            }
            blocks.extend(self.next_block(depth)?);
        }
        Ok(blocks)
    }

    fn parse_block_quote(&mut self, depth: usize) -> Result<Block, ParseAbort> {
        let quote_indent = self.peek().indent;
        let region = self.collect_indented(quote_indent);
        Ok(Block::BlockQuote(self.parse_region(region, depth + 1)?))
    }

    fn parse_list(&mut self, kind: ListKind, depth: usize) -> Result<Block, ParseAbort> {
        let mut items = Vec::new();
        loop {
            let Some(width) = self.marker_at(self.pos, kind) else {
                break;
            };
            items.push(self.parse_list_item(width, depth)?);

            // Items may be separated by blank lines.
            let mut next = self.pos;
            while next < self.lines.len() && self.lines[next].is_blank() {
                next += 1;
            }
            if self.marker_at(next, kind).is_some() {
                self.pos = next;
            } else {
                break;
            }
        }
        Ok(match kind {
            ListKind::Bullet(_) => Block::BulletList(items),
            ListKind::Enumerated => Block::EnumeratedList(items),
        })
    }

    /// Width of a matching list marker at line `idx`, if there is one.
    fn marker_at(&self, idx: usize, kind: ListKind) -> Option<usize> {
        let line = self.lines.get(idx)?;
        if line.is_blank() || line.indent != 0 {
            return None;
        }
        match kind {
            ListKind::Bullet(ch) => {
                let width = bullet_marker_width(line.text)?;
                // A different bullet character starts a new list.
                (first_char(line.text) == ch).then_some(width)
            }
            ListKind::Enumerated => enumerated_marker_width(line.text),
        }
    }

    fn parse_list_item(&mut self, marker_width: usize, depth: usize) -> Result<ListItem, ParseAbort> {
        let line = self.advance();
        let after = &line.raw[line.indent..];

        // Content may sit further right than the marker requires; the extra
        // spaces set the indent the rest of the item must match.
        let mut content_start = marker_width.min(after.len());
        content_start += after[content_start..]
            .bytes()
            .take_while(|&b| b == b' ')
            .count();
        let item_indent = if after.len() > content_start {
            content_start
        } else {
            marker_width
        };

        let mut region = vec![Line::new(&after[content_start.min(after.len())..], line.number)];
        region.extend(self.collect_indented(item_indent));
        while region.last().is_some_and(|l| l.is_blank()) {
            region.pop();
        }

        Ok(ListItem {
            content: self.parse_region(region, depth + 1)?,
        })
    }

    /// Parse a construct that begins with `..`.
    fn parse_explicit_markup(&mut self) -> Result<Vec<Block>, ParseAbort> {
        let line = self.advance();
        let rest = line.text[2..].trim_start();
        if let Some((name, args)) = split_directive(rest) {
            let name = name.to_string();
            let args = args.to_string();
            return Ok(self.parse_directive(line.number, &name, &args));
        }
        // Explicit markup without a directive marker is a comment.
        self.collect_indented(1);
        Ok(vec![])
    }

    fn parse_directive(&mut self, number: usize, name: &str, args: &str) -> Vec<Block> {
        match name {
            "code-block" | "code" | "sourcecode" => {
                let body = strip_field_options(self.collect_indented(1));
                let text = lines_to_text(&body);
                if text.is_empty() {
                    self.ctx.diagnostics.push(Diagnostic::warning(
                        number,
                        format!("Content block expected for the \"{name}\" directive; none found."),
                    ));
                    return vec![];
                }
                let language = if args.is_empty() {
                    self.ctx.default_language.clone()
                } else {
                    Some(args.to_string())
                };
                vec![Block::CodeBlock { language, text }]
            }
            "highlight" => {
                self.ctx.default_language = if args.is_empty() {
                    None
                } else {
                    Some(args.to_string())
                };
                self.collect_indented(1);
                vec![]
            }
            _ => {
                self.ctx.diagnostics.push(Diagnostic::warning(
                    number,
                    format!("Unknown directive type \"{name}\"."),
                ));
                let body = self.collect_indented(1);
                let text = lines_to_text(&body);
                if text.is_empty() {
                    vec![]
                } else {
                    vec![Block::LiteralBlock(text)]
                }
            }
        }
    }

    /// Parse a paragraph, including the `::` literal-block shorthand.
    fn parse_text_block(&mut self) -> Result<Vec<Block>, ParseAbort> {
        let start = self.peek();
        let mut texts: Vec<&str> = Vec::new();
        let mut last_number = start.number;
        while let Some(line) = self.lines.get(self.pos).copied() {
            if line.is_blank() || line.indent != start.indent {
                break;
            }
            if !texts.is_empty() {
                // A marker line ends the paragraph and starts a list.
                if bullet_marker_width(line.text).is_some()
                    || enumerated_marker_width(line.text).is_some()
                {
                    break;
                }
                // An underline attached to paragraph text cannot start a
                // section here; it is kept as text and reported.
                if is_adornment_line(line.text) {
                    self.ctx.diagnostics.push(Diagnostic::warning(
                        line.number,
                        "Unexpected section title.",
                    ));
                }
            }
            texts.push(line.text);
            last_number = line.number;
            self.pos += 1;
        }

        let mut joined = texts.join("\n");
        let mut expect_literal = false;
        if joined == "::" {
            joined.clear();
            expect_literal = true;
        } else if let Some(stripped) = joined.strip_suffix(" ::") {
            joined = stripped.trim_end().to_string();
            expect_literal = true;
        } else if let Some(stripped) = joined.strip_suffix("::") {
            joined = format!("{stripped}:");
            expect_literal = true;
        }

        let mut blocks = Vec::new();
        if !joined.is_empty() {
            let runs = parse_inline(&joined, start.number, &mut self.ctx.diagnostics);
            blocks.push(Block::Paragraph(runs));
        }
        if expect_literal {
            self.skip_blank_lines();
            let body = if !self.is_at_end() && self.peek().indent >= 2 {
                self.collect_indented(2)
            } else {
                Vec::new()
            };
            let text = lines_to_text(&body);
            if text.is_empty() {
                self.ctx.diagnostics.push(Diagnostic::warning(
                    last_number,
                    "Literal block expected; none found.",
                ));
            } else {
                blocks.push(Block::LiteralBlock(text));
            }
        }
        Ok(blocks)
    }
}

/// Nest headings into `Section` blocks by level.
fn assemble_sections(flat: Vec<FlatBlock>) -> Vec<Block> {
    let mut root: Vec<Block> = Vec::new();
    // Open sections, outermost first.
    let mut stack: Vec<(usize, Vec<Inline>, Vec<Block>)> = Vec::new();

    fn close_one(stack: &mut Vec<(usize, Vec<Inline>, Vec<Block>)>, root: &mut Vec<Block>) {
        if let Some((level, title, children)) = stack.pop() {
            let section = Block::Section {
                level,
                title,
                children,
            };
            match stack.last_mut() {
                Some((_, _, parent)) => parent.push(section),
                None => root.push(section),
            }
        }
    }

    for item in flat {
        match item {
            FlatBlock::Heading { level, title } => {
                while stack.last().is_some_and(|(open, _, _)| *open >= level) {
                    close_one(&mut stack, &mut root);
                }
                stack.push((level, title, Vec::new()));
            }
            FlatBlock::Block(block) => match stack.last_mut() {
                Some((_, _, children)) => children.push(block),
                None => root.push(block),
            },
        }
    }
    while !stack.is_empty() {
        close_one(&mut stack, &mut root);
    }
    root
}

fn first_char(text: &str) -> char {
    text.chars().next().unwrap_or('\0')
}

fn is_adornment_line(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    ADORNMENT_CHARS.contains(first) && chars.all(|c| c == first)
}

fn starts_explicit_markup(text: &str) -> bool {
    text == ".." || text.starts_with(".. ")
}

/// Marker width of a bullet item (`- ` or `* `), if the line starts one.
fn bullet_marker_width(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if !matches!(bytes.first(), Some(b'-') | Some(b'*')) {
        return None;
    }
    match bytes.get(1) {
        None | Some(b' ') => Some(2),
        _ => None,
    }
}

/// Marker width of an enumerated item (`1. ` or `#. `).
fn enumerated_marker_width(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.first() == Some(&b'#') {
        if bytes.get(1) != Some(&b'.') {
            return None;
        }
        return match bytes.get(2) {
            None | Some(b' ') => Some(3),
            _ => None,
        };
    }
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || bytes.get(digits) != Some(&b'.') {
        return None;
    }
    match bytes.get(digits + 1) {
        None | Some(b' ') => Some(digits + 2),
        _ => None,
    }
}

/// Directive name and argument text, if `rest` looks like `name:: args`.
fn split_directive(rest: &str) -> Option<(&str, &str)> {
    let idx = rest.find("::")?;
    let name = rest[..idx].trim();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some((name, rest[idx + 2..].trim()))
}

/// Drop leading `:option: value` field lines from a directive body.
fn strip_field_options<'a>(mut body: Vec<Line<'a>>) -> Vec<Line<'a>> {
    let mut idx = 0;
    while idx < body.len() {
        let text = body[idx].text;
        if text.starts_with(':') && text[1..].contains(':') {
            idx += 1;
        } else {
            break;
        }
    }
    body.drain(..idx);
    while body.first().is_some_and(|l| l.is_blank()) {
        body.remove(0);
    }
    body
}

/// Join region lines back into text, removing the common indentation.
///
/// Content to the right of the common indent is preserved byte for byte.
fn lines_to_text(lines: &[Line<'_>]) -> String {
    let common = lines
        .iter()
        .filter(|l| !l.is_blank())
        .map(|l| l.indent)
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| if l.is_blank() { "" } else { &l.raw[common..] })
        .collect::<Vec<_>>()
        .join("\n")
}
