//! Application state definitions

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use crate::assistant::Message;
use crate::docs::{Block, HeadingEntry, Registry, Section, extract_headings, parse_blocks};

use super::navigation::{Navigator, Overlays};

/// Which panel receives movement keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    #[default]
    Content,
    Toc,
}

/// Single-line text input with a character-indexed cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the text and put the cursor at the end
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Take the text out, leaving the buffer empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    fn char_to_byte_index(&self, char_idx: usize) -> usize {
        self.text.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(self.text.len())
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = self.char_to_byte_index(self.cursor);
        self.text.insert(byte_idx, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor
    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_idx = self.char_to_byte_index(self.cursor);
            self.text.remove(byte_idx);
        }
    }

    /// Delete the character under the cursor
    pub fn delete_char_forward(&mut self) {
        if self.cursor < self.char_count() {
            let byte_idx = self.char_to_byte_index(self.cursor);
            self.text.remove(byte_idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }
}

/// Command line mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandMode {
    /// Showing the last status message, if any
    #[default]
    Normal,
    /// Accepting a `:` command
    Command,
}

/// State for the command line input
#[derive(Debug, Clone, Default)]
pub struct CommandLineState {
    pub mode: CommandMode,
    pub input: InputBuffer,
    /// Status or error message shown in normal mode
    pub message: Option<String>,
    pub is_error: bool,
    pub history: Vec<String>,
    /// Current history index when navigating
    pub history_index: Option<usize>,
}

impl CommandLineState {
    /// Maximum number of history entries to keep
    const MAX_HISTORY: usize = 1000;

    pub fn enter_command_mode(&mut self) {
        self.mode = CommandMode::Command;
        self.input.clear();
        self.message = None;
        self.history_index = None;
    }

    pub fn exit_input_mode(&mut self) {
        self.mode = CommandMode::Normal;
        self.input.clear();
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = false;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = true;
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// Text shown on the command line, with the `:` prompt in command mode
    pub fn display_text(&self) -> String {
        match self.mode {
            CommandMode::Normal => self.message.clone().unwrap_or_default(),
            CommandMode::Command => format!(":{}", self.input.as_str()),
        }
    }

    pub fn is_input_mode(&self) -> bool {
        self.mode == CommandMode::Command
    }

    pub fn add_to_history(&mut self, cmd: String) {
        if !cmd.is_empty() && self.history.last() != Some(&cmd) {
            if self.history.len() >= Self::MAX_HISTORY {
                self.history.remove(0);
            }
            self.history.push(cmd);
        }
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        match self.history_index {
            None => self.history_index = Some(self.history.len() - 1),
            Some(i) if i > 0 => self.history_index = Some(i - 1),
            _ => {}
        }
        if let Some(i) = self.history_index {
            self.input.set(self.history[i].clone());
        }
    }

    pub fn history_down(&mut self) {
        if let Some(i) = self.history_index {
            if i + 1 < self.history.len() {
                self.history_index = Some(i + 1);
                self.input.set(self.history[i + 1].clone());
            } else {
                self.history_index = None;
                self.input.clear();
            }
        }
    }
}

/// One row of the navigation sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub key: String,
    pub title: String,
    /// 0 for sections, 1 for sub-items
    pub depth: u8,
}

/// Sidebar rows in registry order, sub-items under their section
pub fn nav_entries(registry: &Registry) -> Vec<NavEntry> {
    let mut entries = Vec::new();
    for section in registry.sections() {
        entries.push(NavEntry { key: section.key.clone(), title: section.title.clone(), depth: 0 });
        for item in &section.sub_items {
            entries.push(NavEntry { key: item.key.clone(), title: item.title.clone(), depth: 1 });
        }
    }
    entries
}

/// State for the navigation sidebar
#[derive(Debug, Clone, Default)]
pub struct SidebarState {
    pub selected_index: usize,
    pub scroll_offset: usize,
    /// Visible height in rows (updated on render)
    pub visible_height: usize,
}

impl SidebarState {
    /// Ensure the selected item is visible by adjusting scroll offset
    pub fn ensure_selection_visible(&mut self) {
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        }
        let visible = self.visible_height.saturating_sub(2);
        if visible > 0 && self.selected_index >= self.scroll_offset + visible {
            self.scroll_offset = self.selected_index.saturating_sub(visible) + 1;
        }
    }

    pub fn select_next(&mut self, len: usize) {
        if self.selected_index + 1 < len {
            self.selected_index += 1;
        }
        self.ensure_selection_visible();
    }

    pub fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
        self.ensure_selection_visible();
    }
}

/// Parsed form of the section being shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub key: String,
    pub title: String,
    pub blocks: Vec<Block>,
    pub headings: Vec<HeadingEntry>,
}

impl Document {
    pub fn parse(key: impl Into<String>, title: impl Into<String>, text: &str) -> Self {
        let blocks = parse_blocks(text);
        let headings = extract_headings(&blocks);
        Self { key: key.into(), title: title.into(), blocks, headings }
    }

    /// Code of the `n`th fenced block, counting from 1
    pub fn code_block(&self, n: usize) -> Option<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Code { code, .. } => Some(code.as_str()),
                _ => None,
            })
            .nth(n.checked_sub(1)?)
    }
}

/// State for content rendering
#[derive(Debug, Clone, Default)]
pub struct ContentState {
    pub document: Option<Document>,
    /// Current scroll position (lines from top)
    pub scroll_offset: usize,
    /// Total rendered lines (updated on render)
    pub total_lines: usize,
    /// Visible height in lines (updated on render)
    pub visible_height: usize,
    /// Rendered line of every heading anchor in the last frame
    pub anchors: HashMap<String, usize>,
}

impl ContentState {
    /// Show a new document, dropping everything measured for the old one
    pub fn set_document(&mut self, document: Option<Document>) {
        self.document = document;
        self.anchors.clear();
        self.total_lines = 0;
    }

    pub fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.visible_height / 2)
    }

    pub fn clamp_scroll(&mut self) {
        let max = self.max_scroll();
        if self.scroll_offset > max {
            self.scroll_offset = max;
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Reading progress, 0 to 100
    pub fn progress_percent(&self) -> u16 {
        let scrollable = self.total_lines.saturating_sub(self.visible_height);
        if scrollable == 0 {
            return 100;
        }
        (self.scroll_offset.min(scrollable) * 100 / scrollable) as u16
    }

    /// Index into the document's headings of the one at or above the top line
    pub fn active_heading(&self) -> Option<usize> {
        let document = self.document.as_ref()?;
        crate::docs::outline::active_heading(&document.headings, self.scroll_offset, |entry| {
            self.anchors.get(&entry.id).copied()
        })
    }
}

/// A row in the search panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub key: String,
    pub title: String,
    /// Title of the section a sub-item belongs to
    pub parent: Option<String>,
}

/// Flatten search results into panel rows, each section followed by its
/// surviving sub-items
pub fn search_hits(sections: &[Section]) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for section in sections {
        let title = section.title.clone();
        hits.push(SearchHit { key: section.key.clone(), title, parent: None });
        for item in &section.sub_items {
            hits.push(SearchHit {
                key: item.key.clone(),
                title: item.title.clone(),
                parent: Some(section.title.clone()),
            });
        }
    }
    hits
}

/// State for the search panel
#[derive(Debug, Clone, Default)]
pub struct SearchPanelState {
    pub query: InputBuffer,
    pub selected: usize,
    pub hits: Vec<SearchHit>,
}

impl SearchPanelState {
    pub fn selected_hit(&self) -> Option<&SearchHit> {
        self.hits.get(self.selected)
    }

    pub fn set_hits(&mut self, hits: Vec<SearchHit>) {
        self.hits = hits;
        self.selected = self.selected.min(self.hits.len().saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.hits.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Clear the query and results
    pub fn reset(&mut self) {
        self.query.clear();
        self.selected = 0;
        self.hits.clear();
    }
}

/// State for the table of contents panel
#[derive(Debug, Clone, Copy, Default)]
pub struct TocState {
    pub selected: usize,
}

/// State for the assistant chat panel
#[derive(Debug, Clone, Default)]
pub struct AssistantState {
    pub messages: Vec<Message>,
    pub input: InputBuffer,
    /// An answer is streaming in
    pub streaming: bool,
    /// Text received so far for the answer in progress
    pub stream_buffer: String,
    /// Lines scrolled up from the bottom of the transcript
    pub scroll_offset: usize,
    pub cancel: Option<CancellationToken>,
}

impl AssistantState {
    /// Fresh conversation opening with `greeting`
    pub fn new(greeting: String) -> Self {
        Self { messages: vec![Message::assistant(greeting)], ..Self::default() }
    }

    /// Record the question and mark an answer as pending
    pub fn start_stream(&mut self, question: String, cancel: CancellationToken) {
        self.messages.push(Message::user(question));
        self.streaming = true;
        self.stream_buffer.clear();
        self.scroll_offset = 0;
        self.cancel = Some(cancel);
    }

    pub fn push_delta(&mut self, text: &str) {
        self.stream_buffer.push_str(text);
    }

    /// Move the streamed text into the transcript as one answer
    pub fn finish_stream(&mut self, fallback: &str) {
        let text = std::mem::take(&mut self.stream_buffer);
        let answer = if text.trim().is_empty() { fallback.to_string() } else { text };
        self.messages.push(Message::assistant(answer));
        self.streaming = false;
        self.cancel = None;
    }

    /// Replace whatever streamed so far with `fallback`
    pub fn fail_stream(&mut self, fallback: &str) {
        self.stream_buffer.clear();
        self.finish_stream(fallback);
    }

    /// Cancel any running answer and start over with `greeting`
    pub fn clear(&mut self, greeting: String) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        *self = Self::new(greeting);
    }

    /// Messages to send as history, without the pending question
    pub fn history(&self) -> &[Message] {
        let pending = usize::from(self.streaming);
        &self.messages[..self.messages.len().saturating_sub(pending)]
    }
}

/// Full application state
#[derive(Debug, Default)]
pub struct AppState {
    /// Product name from the manifest
    pub product: String,

    pub focus: Focus,

    pub overlays: Overlays,

    pub navigator: Navigator,

    pub nav_entries: Vec<NavEntry>,

    pub sidebar: SidebarState,

    pub content: ContentState,

    pub search: SearchPanelState,

    pub toc: TocState,

    pub assistant: AssistantState,

    pub command_line: CommandLineState,

    /// Help text replaces the content view
    pub show_help: bool,

    pub should_quit: bool,
}

impl AppState {
    pub fn new(product: impl Into<String>, registry: &Registry) -> Self {
        let product = product.into();
        let assistant = AssistantState::new(crate::assistant::greeting(&product));
        let mut overlays = Overlays::default();
        overlays.sidebar = true;
        Self {
            product,
            nav_entries: nav_entries(registry),
            assistant,
            overlays,
            ..Self::default()
        }
    }

    /// Sidebar index of `key`
    pub fn nav_index(&self, key: &str) -> Option<usize> {
        self.nav_entries.iter().position(|entry| entry.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::docs::SubItem;

    #[test]
    fn input_buffer_edits_by_character() {
        let mut input = InputBuffer::default();
        for c in "héllo".chars() {
            input.insert_char(c);
        }
        input.move_left();
        input.move_left();
        input.delete_char();
        assert_eq!(input.as_str(), "hélo");
        assert_eq!(input.cursor(), 2);

        input.move_start();
        input.delete_char_forward();
        assert_eq!(input.as_str(), "élo");
        input.move_end();
        assert_eq!(input.cursor(), 3);
        assert_eq!(input.take(), "élo");
        assert!(input.is_empty());
    }

    #[test]
    fn history_navigation_places_cursor_at_end() {
        let mut cmd = CommandLineState::default();
        cmd.add_to_history("goto faq".into());
        cmd.add_to_history("goto faq".into());
        cmd.add_to_history("copy-code 1".into());
        assert_eq!(cmd.history.len(), 2);

        cmd.enter_command_mode();
        cmd.history_up();
        assert_eq!(cmd.input.as_str(), "copy-code 1");
        assert_eq!(cmd.input.cursor(), 11);
        cmd.history_up();
        assert_eq!(cmd.input.as_str(), "goto faq");
        cmd.history_down();
        cmd.history_down();
        assert!(cmd.input.is_empty());
        assert_eq!(cmd.display_text(), ":");
    }

    #[test]
    fn sidebar_selection_stays_visible() {
        let mut sidebar = SidebarState { visible_height: 5, ..Default::default() };
        for _ in 0..6 {
            sidebar.select_next(10);
        }
        assert_eq!(sidebar.selected_index, 6);
        assert_eq!(sidebar.scroll_offset, 4);

        for _ in 0..6 {
            sidebar.select_prev();
        }
        assert_eq!(sidebar.scroll_offset, 0);
    }

    #[test]
    fn nav_entries_nest_sub_items() {
        let registry = Registry::new(vec![
            Section::eager("intro", "Intro", "# Intro"),
            Section::group("submission", "Submission")
                .with_sub_items(vec![SubItem::new("play_store", "Play Store").with_content("x")]),
        ])
        .unwrap();
        let entries = nav_entries(&registry);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[2],
            NavEntry { key: "play_store".into(), title: "Play Store".into(), depth: 1 }
        );
    }

    #[test]
    fn progress_percent_bounds() {
        let mut content =
            ContentState { total_lines: 110, visible_height: 10, ..Default::default() };
        assert_eq!(content.progress_percent(), 0);
        content.scroll_offset = 50;
        assert_eq!(content.progress_percent(), 50);
        content.scroll_offset = 105;
        assert_eq!(content.progress_percent(), 100);

        let short = ContentState { total_lines: 3, visible_height: 10, ..Default::default() };
        assert_eq!(short.progress_percent(), 100);
    }

    #[test]
    fn active_heading_follows_scroll() {
        let mut content = ContentState::default();
        content.set_document(Some(Document::parse("k", "K", "# Top\n## One\ntext\n## Two\n")));
        content.anchors = HashMap::from([("one".to_string(), 3), ("two".to_string(), 12)]);

        content.scroll_offset = 0;
        assert_eq!(content.active_heading(), None);
        content.scroll_offset = 5;
        assert_eq!(content.active_heading(), Some(0));
        content.scroll_offset = 12;
        assert_eq!(content.active_heading(), Some(1));
    }

    #[test]
    fn code_blocks_are_numbered_from_one() {
        let doc = Document::parse("k", "K", "```sh\nnpm i\n```\ntext\n```json\n{}\n```");
        assert_eq!(doc.code_block(1), Some("npm i"));
        assert_eq!(doc.code_block(2), Some("{}"));
        assert_eq!(doc.code_block(0), None);
        assert_eq!(doc.code_block(3), None);
    }

    #[test]
    fn search_hits_list_sub_items_under_section() {
        let sections = vec![
            Section::group("submission", "Submission")
                .with_sub_items(vec![SubItem::new("app_store", "App Store").with_content("x")]),
        ];
        let hits = search_hits(&sections);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].parent.as_deref(), Some("Submission"));
    }

    #[test]
    fn assistant_stream_lifecycle() {
        let mut assistant = AssistantState::new("Hi".into());
        assistant.start_stream("How?".into(), CancellationToken::new());
        assert_eq!(assistant.history().len(), 1);

        assistant.push_delta("Like ");
        assistant.push_delta("this.");
        assistant.finish_stream("fallback");
        assert_eq!(assistant.messages.last(), Some(&Message::assistant("Like this.")));
        assert!(!assistant.streaming);

        assistant.start_stream("Again?".into(), CancellationToken::new());
        assistant.push_delta("partial");
        assistant.fail_stream("fallback");
        assert_eq!(assistant.messages.last(), Some(&Message::assistant("fallback")));
    }

    #[test]
    fn clearing_cancels_the_stream() {
        let mut assistant = AssistantState::new("Hi".into());
        let token = CancellationToken::new();
        assistant.start_stream("q".into(), token.clone());
        assistant.clear("Hi".into());
        assert!(token.is_cancelled());
        assert_eq!(assistant.messages, vec![Message::assistant("Hi")]);
    }
}
