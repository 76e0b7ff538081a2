//! Line-based Markdown block parser
//!
//! A deliberately small dialect: one pass over the lines, with buffers only
//! for code fences, tables and runs of same-type list items. There are no
//! nested lists, no reference links, and every `> ` line is its own
//! blockquote block.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::slug::slugify;

/// Matches an ordered list marker and captures its number
static ORDERED_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s+").unwrap());

const FENCE: &str = "```";

/// Task item prefixes, paired with their completed flag
const TASK_PREFIXES: [(&str, bool); 4] =
    [("- [ ] ", false), ("- [] ", false), ("- [x] ", true), ("- [X] ", true)];

/// One structurally classified unit of Markdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    /// `#` through `######`
    Heading {
        /// Heading level, 1 to 6
        level: u8,
        /// Heading text without the marker
        text: String,
        /// Anchor id derived from the text
        id: String,
    },
    /// A single non-empty line of prose
    Paragraph(String),
    /// Contiguous `-`, `*` or `+` items
    UnorderedList(Vec<ListItem>),
    /// Contiguous `1.` style items
    OrderedList(Vec<ListItem>),
    /// Header row first, separator rows removed
    Table(Vec<Vec<String>>),
    /// Fenced code, internal newlines preserved
    Code {
        /// Tag after the opening fence, if any
        language: Option<String>,
        /// Raw lines joined with `\n`
        code: String,
    },
    /// One `> ` line
    Blockquote(String),
    /// A `- [ ]` or `- [x]` checklist line
    Task {
        /// Item text
        text: String,
        /// Whether the box is ticked
        completed: bool,
    },
    /// `---`, `***` or `___`
    HorizontalRule,
    /// An empty line, kept for vertical rhythm
    Spacer,
}

/// An item within a list block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Item text without the marker
    pub text: String,
    /// Number written in the source for ordered items
    pub label: Option<String>,
}

impl ListItem {
    fn new(text: impl Into<String>, label: Option<String>) -> Self {
        Self { text: text.into(), label }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

/// Parser state carried between lines
#[derive(Default)]
struct BlockParser {
    blocks: Vec<Block>,
    /// Open fence: language and buffered lines
    code: Option<(Option<String>, Vec<String>)>,
    table: Option<Vec<Vec<String>>>,
    list: Option<(ListKind, Vec<ListItem>)>,
}

impl BlockParser {
    fn flush_list(&mut self) {
        if let Some((kind, items)) = self.list.take() {
            self.blocks.push(match kind {
                ListKind::Unordered => Block::UnorderedList(items),
                ListKind::Ordered => Block::OrderedList(items),
            });
        }
    }

    fn flush_table(&mut self) {
        if let Some(rows) = self.table.take() {
            self.blocks.push(Block::Table(rows));
        }
    }

    fn push_list_item(&mut self, kind: ListKind, item: ListItem) {
        match &mut self.list {
            Some((open, items)) if *open == kind => items.push(item),
            _ => {
                self.flush_list();
                self.list = Some((kind, vec![item]));
            }
        }
    }

    fn line(&mut self, line: &str) {
        let trimmed = line.trim();

        if trimmed.starts_with(FENCE) {
            self.fence(trimmed);
            return;
        }

        if let Some((_, buffer)) = &mut self.code {
            buffer.push(line.to_string());
            return;
        }

        if trimmed.starts_with('|') && trimmed.ends_with('|') {
            self.table_row(trimmed);
            return;
        }
        self.flush_table();

        if let Some((text, completed)) = task_item(trimmed) {
            self.flush_list();
            self.blocks.push(Block::Task { text: text.to_string(), completed });
        } else if let Some(text) = unordered_item(trimmed) {
            self.push_list_item(ListKind::Unordered, ListItem::new(text, None));
        } else if let Some(caps) = ORDERED_ITEM_RE.captures(trimmed) {
            let label = caps[1].to_string();
            let text = &trimmed[caps[0].len()..];
            self.push_list_item(ListKind::Ordered, ListItem::new(text, Some(label)));
        } else {
            self.flush_list();
            self.blocks.push(standalone_block(trimmed));
        }
    }

    fn fence(&mut self, trimmed: &str) {
        match self.code.take() {
            Some((language, lines)) => {
                self.blocks.push(Block::Code { language, code: lines.join("\n") });
            }
            None => {
                self.flush_list();
                self.flush_table();
                let tag = trimmed[FENCE.len()..].trim();
                let language = (!tag.is_empty()).then(|| tag.to_string());
                self.code = Some((language, Vec::new()));
            }
        }
    }

    fn table_row(&mut self, trimmed: &str) {
        self.flush_list();

        let pieces: Vec<&str> = trimmed.split('|').collect();
        let row: Vec<String> =
            pieces[1..pieces.len() - 1].iter().map(|c| c.trim().to_string()).collect();

        if row.iter().all(|cell| is_separator_cell(cell)) {
            return;
        }
        self.table.get_or_insert_with(Vec::new).push(row);
    }

    fn finish(mut self) -> Vec<Block> {
        // An unterminated fence is dropped along with its buffered lines
        self.flush_list();
        self.flush_table();
        self.blocks
    }
}

/// Parse Markdown into blocks. Never fails; anything unrecognised becomes a
/// paragraph.
pub fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut parser = BlockParser::default();
    for line in markdown.split('\n') {
        parser.line(line);
    }
    parser.finish()
}

fn is_separator_cell(cell: &str) -> bool {
    !cell.is_empty() && cell.chars().all(|c| matches!(c, ' ' | ':' | '-'))
}

fn task_item(trimmed: &str) -> Option<(&str, bool)> {
    TASK_PREFIXES.iter().find_map(|(prefix, completed)| {
        trimmed.strip_prefix(prefix).map(|rest| (rest, *completed))
    })
}

fn unordered_item(trimmed: &str) -> Option<&str> {
    ["- ", "* ", "+ "]
        .iter()
        .find_map(|marker| trimmed.strip_prefix(marker))
        .map(str::trim_start)
}

/// Classify a line that is not part of any multi-line construct
fn standalone_block(trimmed: &str) -> Block {
    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
        let text = trimmed[hashes..].trim().to_string();
        return Block::Heading { level: hashes as u8, id: slugify(&text), text };
    }

    if matches!(trimmed, "---" | "***" | "___") {
        return Block::HorizontalRule;
    }

    if let Some(quote) = trimmed.strip_prefix("> ") {
        return Block::Blockquote(quote.to_string());
    }

    if trimmed.is_empty() { Block::Spacer } else { Block::Paragraph(trimmed.to_string()) }
}
