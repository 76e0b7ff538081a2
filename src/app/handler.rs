//! Key, command and background event handling
//!
//! Everything the event loop does between two frames, kept apart from the
//! terminal so it can be driven directly.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::assistant::{
    self, ApiKeyManager, AssistantClient, AssistantError, AssistantModel, FALLBACK_MESSAGE,
    StreamEvent,
};
use crate::config::Config;
use crate::docs::{ContentStore, LinkTarget, LoadOutcome};

use super::command::{Command, ParseResult, parse_command};
use super::input::{Action, key_with_modifier_to_action};
use super::navigation::{Overlay, ScrollRequest};
use super::state::{AppState, Document, Focus, search_hits};

/// Buffered answer chunks between the request task and the UI
const STREAM_BUFFER: usize = 64;

/// Work finished off the UI task
#[derive(Debug)]
pub enum AppEvent {
    /// A load started for `key` has ended
    ContentLoaded { key: String, outcome: LoadOutcome },
}

/// Owns the application state and applies input to it
pub struct Handler {
    pub config: Config,
    pub state: AppState,
    store: Arc<ContentStore>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    stream_rx: Option<mpsc::Receiver<StreamEvent>>,
    client: Option<AssistantClient>,
}

impl Handler {
    pub fn new(config: Config, store: Arc<ContentStore>, product: impl Into<String>) -> Self {
        let state = AppState::new(product, store.registry());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self { config, state, store, events_tx, events_rx, stream_rx: None, client: None }
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit
    }

    /// Open the first section in sidebar order
    pub fn open_first(&mut self) {
        if let Some(entry) = self.state.nav_entries.first() {
            let key = entry.key.clone();
            self.open_entry(&key);
        }
    }

    /// Apply finished loads and answer chunks
    pub fn poll_background(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_app_event(event);
        }
        self.poll_stream();
    }

    /// Advance timers: the pending anchor scroll and the search highlight
    pub fn tick(&mut self, now: Instant) {
        let anchors = &self.state.content.anchors;
        let request = self.state.navigator.tick_scroll(now, |anchor| anchors.get(anchor).copied());
        self.apply_scroll(request);
        self.state.navigator.expire_highlight(now);
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ContentLoaded { key, outcome } => {
                match &outcome {
                    LoadOutcome::Failed(reason) => {
                        self.state.command_line.set_error(format!("Couldn't load {key}: {reason}"));
                    }
                    LoadOutcome::Unknown => {
                        self.state.command_line.set_error(format!("No section named {key}"));
                    }
                    _ => tracing::debug!(key = %key, ?outcome, "Section ready"),
                }
                // Loading ends either way so a pending scroll can give up
                self.state.navigator.load_finished(&key);
                if self.state.navigator.active() == Some(key.as_str()) {
                    self.refresh_document();
                }
            }
        }
    }

    fn poll_stream(&mut self) {
        let Some(rx) = self.stream_rx.as_mut() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(StreamEvent::Delta { text }) => self.state.assistant.push_delta(&text),
                Ok(StreamEvent::Started { id }) => tracing::debug!(id = %id, "Answer started"),
                Ok(StreamEvent::StopReason(reason)) => {
                    tracing::debug!(reason = %reason, "Answer stopped");
                }
                Ok(StreamEvent::Finished) => {
                    self.state.assistant.finish_stream(FALLBACK_MESSAGE);
                    self.stream_rx = None;
                    return;
                }
                Ok(StreamEvent::Error { message }) => {
                    tracing::warn!("Assistant error: {}", message);
                    self.state.assistant.fail_stream(FALLBACK_MESSAGE);
                    self.stream_rx = None;
                    return;
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    if self.state.assistant.streaming {
                        self.state.assistant.finish_stream(FALLBACK_MESSAGE);
                    }
                    self.stream_rx = None;
                    return;
                }
            }
        }
    }

    // Sections

    /// Show `key`, loading its section first when needed
    fn open_entry(&mut self, key: &str) {
        let ready = self.store.is_ready(key);
        if self.state.navigator.select(key, ready) {
            self.state.content.scroll_offset = 0;
        }
        self.show_selected(key, ready);
    }

    fn show_selected(&mut self, key: &str, ready: bool) {
        self.state.show_help = false;
        if let Some(index) = self.state.nav_index(key) {
            self.state.sidebar.selected_index = index;
            self.state.sidebar.ensure_selection_visible();
        }

        if ready {
            self.refresh_document();
        } else {
            self.state.content.set_document(None);
            self.spawn_load(key);
        }
    }

    fn spawn_load(&self, key: &str) {
        let load_key = self.store.resolve_sub_item_parent(key).unwrap_or_else(|| key.to_string());
        let store = Arc::clone(&self.store);
        let tx = self.events_tx.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            let outcome = store.wait_loaded(&load_key).await;
            let _ = tx.send(AppEvent::ContentLoaded { key, outcome });
        });
    }

    /// Rebuild the document for the active key from the store
    fn refresh_document(&mut self) {
        let Some(key) = self.state.navigator.active() else {
            self.state.content.set_document(None);
            return;
        };
        let title = self
            .store
            .registry()
            .entry(key)
            .map(|entry| entry.title().to_string())
            .unwrap_or_else(|| key.to_string());
        let text = self.store.active_content(key);
        let document = Document::parse(key, title, &text);
        self.state.content.set_document(Some(document));
    }

    fn step_section(&mut self, forward: bool) {
        let current = self
            .state
            .navigator
            .active()
            .and_then(|key| self.state.nav_index(key))
            .unwrap_or(self.state.sidebar.selected_index);
        let next = if forward { current + 1 } else { current.wrapping_sub(1) };
        if let Some(entry) = self.state.nav_entries.get(next) {
            let key = entry.key.clone();
            self.open_entry(&key);
        }
    }

    fn apply_scroll(&mut self, request: ScrollRequest) {
        match request {
            ScrollRequest::Keep => {}
            ScrollRequest::Top => self.state.content.scroll_offset = 0,
            ScrollRequest::Line(line) => self.state.content.scroll_offset = line,
        }
    }

    // Keys

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.state.command_line.is_input_mode() {
            self.handle_command_input(key);
        } else if self.state.overlays.assistant {
            self.handle_assistant_input(key);
        } else if self.state.overlays.search {
            self.handle_search_input(key);
        } else if let Some(action) =
            key_with_modifier_to_action(key.code, key.modifiers, self.config.vim_mode)
        {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        let page = self.state.content.visible_height.max(1);
        match action {
            Action::Up => match self.state.focus {
                Focus::Sidebar => self.state.sidebar.select_prev(),
                Focus::Toc => self.state.toc.selected = self.state.toc.selected.saturating_sub(1),
                Focus::Content => self.state.content.scroll_up(1),
            },
            Action::Down => match self.state.focus {
                Focus::Sidebar => self.state.sidebar.select_next(self.state.nav_entries.len()),
                Focus::Toc => {
                    let count = self.heading_count();
                    if self.state.toc.selected + 1 < count {
                        self.state.toc.selected += 1;
                    }
                }
                Focus::Content => self.state.content.scroll_down(1),
            },
            Action::Top => match self.state.focus {
                Focus::Sidebar => {
                    self.state.sidebar.selected_index = 0;
                    self.state.sidebar.ensure_selection_visible();
                }
                Focus::Toc => self.state.toc.selected = 0,
                Focus::Content => self.state.content.scroll_offset = 0,
            },
            Action::Bottom => match self.state.focus {
                Focus::Sidebar => {
                    self.state.sidebar.selected_index =
                        self.state.nav_entries.len().saturating_sub(1);
                    self.state.sidebar.ensure_selection_visible();
                }
                Focus::Toc => self.state.toc.selected = self.heading_count().saturating_sub(1),
                Focus::Content => {
                    self.state.content.scroll_offset = self.state.content.max_scroll();
                }
            },
            Action::PageDown => self.state.content.scroll_down(page),
            Action::PageUp => self.state.content.scroll_up(page),
            Action::HalfPageDown => self.state.content.scroll_down(page / 2),
            Action::HalfPageUp => self.state.content.scroll_up(page / 2),
            Action::NextSection => self.step_section(true),
            Action::PrevSection => self.step_section(false),
            Action::Select => match self.state.focus {
                Focus::Sidebar => {
                    let key = self
                        .state
                        .nav_entries
                        .get(self.state.sidebar.selected_index)
                        .map(|entry| entry.key.clone());
                    if let Some(key) = key {
                        self.open_entry(&key);
                    }
                }
                Focus::Toc => self.jump_to_toc_selection(Instant::now()),
                Focus::Content => {}
            },
            Action::Back => self.close_topmost(),
            Action::Search => self.open_search(),
            Action::ToggleSidebar => {
                self.state.overlays.sidebar = !self.state.overlays.sidebar;
                if !self.state.overlays.sidebar && self.state.focus == Focus::Sidebar {
                    self.state.focus = Focus::Content;
                }
            }
            Action::ToggleToc => self.toggle_toc(),
            Action::ToggleAssistant => self.state.overlays.assistant = true,
            Action::SwitchFocus => self.switch_focus(),
            Action::Command => self.state.command_line.enter_command_mode(),
            Action::Help => self.state.show_help = !self.state.show_help,
            Action::Quit => self.state.should_quit = true,
        }
    }

    fn heading_count(&self) -> usize {
        self.state.content.document.as_ref().map_or(0, |d| d.headings.len())
    }

    fn switch_focus(&mut self) {
        let order = [
            (Focus::Sidebar, self.state.overlays.sidebar),
            (Focus::Content, true),
            (Focus::Toc, self.state.overlays.toc),
        ];
        let current = order.iter().position(|(focus, _)| *focus == self.state.focus).unwrap_or(1);
        for step in 1..=order.len() {
            let (focus, open) = order[(current + step) % order.len()];
            if open {
                self.state.focus = focus;
                return;
            }
        }
    }

    fn toggle_toc(&mut self) {
        self.state.overlays.toc = !self.state.overlays.toc;
        if self.state.overlays.toc {
            self.state.toc.selected = self.state.content.active_heading().unwrap_or(0);
            self.state.focus = Focus::Toc;
        } else if self.state.focus == Focus::Toc {
            self.state.focus = Focus::Content;
        }
    }

    /// Esc: close the topmost overlay, then leave help
    fn close_topmost(&mut self) {
        match self.state.overlays.close_topmost() {
            Some(Overlay::Search) => self.state.search.reset(),
            Some(Overlay::Toc) if self.state.focus == Focus::Toc => {
                self.state.focus = Focus::Content;
            }
            Some(Overlay::Sidebar) if self.state.focus == Focus::Sidebar => {
                self.state.focus = Focus::Content;
            }
            Some(_) => {}
            None => self.state.show_help = false,
        }
    }

    fn jump_to_toc_selection(&mut self, now: Instant) {
        let Some(id) = self
            .state
            .content
            .document
            .as_ref()
            .and_then(|d| d.headings.get(self.state.toc.selected))
            .map(|heading| heading.id.clone())
        else {
            return;
        };
        match self.state.content.anchors.get(&id) {
            Some(&line) => {
                self.apply_scroll(ScrollRequest::Line(line.saturating_sub(1)));
            }
            None => self.state.navigator.scroll_to(id, now),
        }
    }

    // Search panel

    fn open_search(&mut self) {
        self.state.overlays.search = true;
        self.refresh_search();
    }

    fn refresh_search(&mut self) {
        let hits = search_hits(&self.store.search(self.state.search.query.as_str()));
        self.state.search.set_hits(hits);
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.close_topmost(),
            KeyCode::Enter => self.open_search_hit(Instant::now()),
            KeyCode::Down => self.state.search.select_next(),
            KeyCode::Up => self.state.search.select_prev(),
            KeyCode::Char('n') if ctrl => self.state.search.select_next(),
            KeyCode::Char('p') if ctrl => self.state.search.select_prev(),
            KeyCode::Char('c') if ctrl => self.close_topmost(),
            KeyCode::Left => self.state.search.query.move_left(),
            KeyCode::Right => self.state.search.query.move_right(),
            KeyCode::Home => self.state.search.query.move_start(),
            KeyCode::End => self.state.search.query.move_end(),
            KeyCode::Backspace => {
                self.state.search.query.delete_char();
                self.refresh_search();
            }
            KeyCode::Delete => {
                self.state.search.query.delete_char_forward();
                self.refresh_search();
            }
            KeyCode::Char(c) if !ctrl => {
                self.state.search.query.insert_char(c);
                self.refresh_search();
            }
            _ => {}
        }
    }

    fn open_search_hit(&mut self, now: Instant) {
        let Some(hit) = self.state.search.selected_hit().cloned() else {
            return;
        };
        let query = self.state.search.query.as_str().trim().to_string();
        let anchor = self.store.find_heading_anchor(&hit.key, &query);
        let ready = self.store.is_ready(&hit.key);

        let changed = self.state.navigator.active() != Some(hit.key.as_str());
        let request = self.state.navigator.search_select(&hit.key, &query, anchor, ready, now);
        if changed {
            self.state.content.scroll_offset = 0;
        }
        self.apply_scroll(request);
        self.show_selected(&hit.key, ready);

        self.state.overlays.search = false;
        self.state.search.reset();
    }

    // Assistant panel

    fn handle_assistant_input(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.close_topmost(),
            KeyCode::Enter => {
                let question = self.state.assistant.input.take();
                self.ask(question);
            }
            KeyCode::Char('c') if ctrl => self.cancel_answer(),
            KeyCode::Up => self.state.assistant.scroll_offset += 1,
            KeyCode::Down => {
                self.state.assistant.scroll_offset =
                    self.state.assistant.scroll_offset.saturating_sub(1);
            }
            KeyCode::PageUp => self.state.assistant.scroll_offset += 10,
            KeyCode::PageDown => {
                self.state.assistant.scroll_offset =
                    self.state.assistant.scroll_offset.saturating_sub(10);
            }
            KeyCode::Left => self.state.assistant.input.move_left(),
            KeyCode::Right => self.state.assistant.input.move_right(),
            KeyCode::Home => self.state.assistant.input.move_start(),
            KeyCode::End => self.state.assistant.input.move_end(),
            KeyCode::Backspace => self.state.assistant.input.delete_char(),
            KeyCode::Delete => self.state.assistant.input.delete_char_forward(),
            KeyCode::Char(c) if !ctrl => self.state.assistant.input.insert_char(c),
            _ => {}
        }
    }

    fn assistant_client(&mut self) -> Result<AssistantClient, AssistantError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let (key, source) = ApiKeyManager::resolve()?;
        tracing::info!(?source, "Using assistant API key");
        let client = AssistantClient::new(key)?;
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Send `question` and stream the answer into the transcript
    fn ask(&mut self, question: String) {
        let question = question.trim().to_string();
        if question.is_empty() {
            return;
        }
        self.state.overlays.assistant = true;
        if self.state.assistant.streaming {
            self.state.command_line.set_error("Still answering the previous question");
            return;
        }

        let request = assistant::build_request(
            self.config.model,
            &self.state.product,
            &self.store.assistant_context(),
            self.state.assistant.history(),
            &question,
        );
        let token = CancellationToken::new();
        self.state.assistant.start_stream(question, token.clone());
        self.state.assistant.scroll_offset = 0;

        let client = match self.assistant_client() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Assistant unavailable: {}", e);
                self.state.assistant.fail_stream(FALLBACK_MESSAGE);
                self.state.command_line.set_error(e.to_string());
                return;
            }
        };

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        self.stream_rx = Some(rx);
        tokio::spawn(async move {
            if let Err(e) = client.send_streaming(request, tx.clone(), token).await {
                let _ = tx.send(StreamEvent::Error { message: e.to_string() }).await;
            }
        });
    }

    fn cancel_answer(&mut self) {
        if let Some(token) = self.state.assistant.cancel.take() {
            token.cancel();
        }
        if self.state.assistant.streaming {
            self.state.assistant.finish_stream(FALLBACK_MESSAGE);
        }
        self.stream_rx = None;
    }

    // Command line

    fn handle_command_input(&mut self, key: KeyEvent) {
        let command_line = &mut self.state.command_line;
        match key.code {
            KeyCode::Esc => command_line.exit_input_mode(),
            KeyCode::Enter => {
                let text = command_line.input.take();
                command_line.add_to_history(text.clone());
                command_line.exit_input_mode();
                self.run_command_text(&text);
            }
            KeyCode::Backspace if command_line.input.is_empty() => command_line.exit_input_mode(),
            KeyCode::Backspace => command_line.input.delete_char(),
            KeyCode::Delete => command_line.input.delete_char_forward(),
            KeyCode::Left => command_line.input.move_left(),
            KeyCode::Right => command_line.input.move_right(),
            KeyCode::Home => command_line.input.move_start(),
            KeyCode::End => command_line.input.move_end(),
            KeyCode::Up => command_line.history_up(),
            KeyCode::Down => command_line.history_down(),
            KeyCode::Char(c) => command_line.input.insert_char(c),
            _ => {}
        }
    }

    fn run_command_text(&mut self, text: &str) {
        match parse_command(text) {
            ParseResult::Ok(command) => self.execute(command),
            ParseResult::UnknownCommand(name) => {
                self.state.command_line.set_error(format!("Unknown command: {name}"));
            }
            ParseResult::MissingArgument(name) => {
                self.state.command_line.set_error(format!("{name} needs an argument"));
            }
            ParseResult::InvalidArgument { command, argument } => {
                self.state
                    .command_line
                    .set_error(format!("Invalid argument for {command}: {argument}"));
            }
        }
    }

    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Quit => self.state.should_quit = true,
            Command::Help => self.state.show_help = !self.state.show_help,
            Command::Goto(target) => self.goto(&target, Instant::now()),
            Command::CopyLink => self.copy_link(),
            Command::CopyCode(n) => self.copy_code(n),
            Command::AssistantKey(key) => match ApiKeyManager::set_api_key(&key) {
                Ok(()) => {
                    self.client = None;
                    let masked = ApiKeyManager::mask_key(&key);
                    self.state.command_line.set_message(format!("API key saved ({masked})"));
                }
                Err(e) => self.state.command_line.set_error(e.to_string()),
            },
            Command::AssistantModel(name) => self.set_model(&name),
            Command::AssistantClear => {
                let greeting = assistant::greeting(&self.state.product);
                self.state.assistant.clear(greeting);
                self.stream_rx = None;
                self.state.command_line.set_message("Started a new conversation");
            }
            Command::Ask(question) => self.ask(question),
            Command::Toc => self.toggle_toc(),
            Command::Nop => self.state.command_line.clear_message(),
        }
    }

    /// Follow a link typed on the command line
    fn goto(&mut self, target: &str, now: Instant) {
        let registry = self.store.registry();
        match LinkTarget::parse(target, |key| registry.contains(key)) {
            LinkTarget::Section { key, anchor } => {
                self.open_entry(&key);
                if let Some(anchor) = anchor {
                    self.state.navigator.scroll_to(anchor, now);
                }
            }
            LinkTarget::Anchor(anchor) => {
                if self.state.navigator.active().is_some() {
                    self.state.navigator.scroll_to(anchor, now);
                } else {
                    self.state.command_line.set_error("No section is open");
                }
            }
            LinkTarget::External(href) => {
                self.state.command_line.set_error(format!("Not a section: {href}"));
            }
        }
    }

    /// `key#anchor` for the heading at the top of the view
    fn current_link(&self) -> Option<String> {
        let key = self.state.navigator.active()?;
        let heading = self
            .state
            .content
            .active_heading()
            .and_then(|i| self.state.content.document.as_ref()?.headings.get(i));
        Some(match heading {
            Some(heading) => format!("{key}#{}", heading.id),
            None => key.to_string(),
        })
    }

    fn copy_link(&mut self) {
        match self.current_link() {
            Some(link) => self.copy(&link, format!("Copied {link}")),
            None => self.state.command_line.set_error("No section is open"),
        }
    }

    fn copy_code(&mut self, n: usize) {
        let code = self.state.content.document.as_ref().and_then(|d| d.code_block(n));
        match code.map(str::to_string) {
            Some(code) => self.copy(&code, format!("Copied code block {n}")),
            None => self.state.command_line.set_error(format!("No code block {n} in this section")),
        }
    }

    fn copy(&mut self, text: &str, done: String) {
        match copy_to_clipboard(text) {
            Ok(()) => self.state.command_line.set_message(done),
            Err(e) => {
                tracing::warn!("Clipboard error: {:#}", e);
                self.state.command_line.set_error(format!("{e:#}"));
            }
        }
    }

    fn set_model(&mut self, name: &str) {
        let Some(model) = AssistantModel::parse(name) else {
            let message = format!("Unknown model {name} (haiku, sonnet, opus)");
            self.state.command_line.set_error(message);
            return;
        };
        self.config.model = model;
        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save config: {:#}", e);
        }
        self.state
            .command_line
            .set_message(format!("Assistant model set to {}", model.display_name()));
    }
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
    clipboard.set_text(text.to_string()).context("Failed to copy to clipboard")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::{DocsError, LoadedSection, Registry, Section, SubItem};
    use crate::theme::Theme;
    use crate::ui::content::render_blocks;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    const WELCOME: &str = "# Welcome\nIntro text.\n## Hello there\nSay hi.\n```sh\necho hi\n```";

    fn handler() -> Handler {
        let registry = Registry::new(vec![
            Section::eager("getting_started", "Getting Started", WELCOME),
            Section::lazy("faq", "FAQ", || async {
                Ok::<_, DocsError>(LoadedSection {
                    content: "# FAQ\n## Login\nUse your email.".to_string(),
                    sub_items: HashMap::from([(
                        "faq_billing".to_string(),
                        "## Billing\nMonthly.".to_string(),
                    )]),
                })
            })
            .with_sub_items(vec![SubItem::new("faq_billing", "Billing")]),
            Section::lazy("broken", "Broken", || async {
                Err::<LoadedSection, _>(DocsError::Load {
                    key: "broken".to_string(),
                    reason: "offline".to_string(),
                })
            }),
        ])
        .unwrap();
        Handler::new(Config::default(), Arc::new(ContentStore::new(registry)), "BookHere")
    }

    fn press(handler: &mut Handler, code: KeyCode) {
        handler.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(handler: &mut Handler, text: &str) {
        for c in text.chars() {
            press(handler, KeyCode::Char(c));
        }
    }

    async fn next_event(handler: &mut Handler) {
        let event = handler.events_rx.recv().await.unwrap();
        handler.handle_app_event(event);
    }

    #[tokio::test]
    async fn search_opens_section_with_highlight_and_anchor() {
        let mut handler = handler();
        handler.handle_action(Action::Search);
        type_text(&mut handler, "hello");
        assert_eq!(handler.state.search.hits.len(), 1);

        press(&mut handler, KeyCode::Enter);

        let state = &handler.state;
        assert_eq!(state.navigator.active(), Some("getting_started"));
        assert_eq!(state.navigator.pending_anchor(), Some("hello-there"));
        assert_eq!(state.navigator.highlight(Instant::now()), Some("hello"));
        assert!(!state.overlays.search);
        assert!(state.search.query.is_empty());
        let document = state.content.document.as_ref().unwrap();
        assert_eq!(document.title, "Getting Started");

        let theme = Theme::default();
        let highlight = state.navigator.highlight(Instant::now());
        let rendered = render_blocks(&document.blocks, &theme, 80, highlight);
        let marked: Vec<&str> = rendered
            .lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .filter(|span| span.style.bg == Some(theme.mark_bg))
            .map(|span| span.content.as_ref())
            .collect();
        assert_eq!(marked, ["Hello"]);
    }

    #[tokio::test]
    async fn pending_anchor_scrolls_once_rendered() {
        let mut handler = handler();
        let start = Instant::now();
        handler.open_entry("getting_started");
        handler.goto("#hello-there", start);

        // Nothing rendered yet
        handler.tick(start + Duration::from_millis(150));
        assert_eq!(handler.state.content.scroll_offset, 0);
        assert_eq!(handler.state.navigator.pending_anchor(), Some("hello-there"));

        handler.state.content.anchors.insert("hello-there".to_string(), 4);
        handler.tick(start + Duration::from_millis(300));
        assert_eq!(handler.state.content.scroll_offset, 3);
        assert_eq!(handler.state.navigator.pending_anchor(), None);
    }

    #[tokio::test]
    async fn lazy_section_loads_in_background() {
        let mut handler = handler();
        handler.open_entry("faq");
        assert!(handler.state.navigator.is_loading());
        assert!(handler.state.content.document.is_none());

        next_event(&mut handler).await;

        assert!(!handler.state.navigator.is_loading());
        let document = handler.state.content.document.as_ref().unwrap();
        assert_eq!(document.key, "faq");
        assert_eq!(document.headings.len(), 1);
    }

    #[tokio::test]
    async fn sub_item_loads_through_its_parent() {
        let mut handler = handler();
        handler.open_entry("faq_billing");
        next_event(&mut handler).await;

        let document = handler.state.content.document.as_ref().unwrap();
        assert_eq!(document.title, "Billing");
        assert_eq!(document.headings[0].text, "Billing");
    }

    #[tokio::test]
    async fn failed_load_reports_and_stops_loading() {
        let mut handler = handler();
        handler.open_entry("broken");
        next_event(&mut handler).await;

        assert!(!handler.state.navigator.is_loading());
        assert!(handler.state.command_line.is_error);
        let message = handler.state.command_line.message.as_deref().unwrap();
        assert!(message.contains("offline"), "{message}");
    }

    #[tokio::test]
    async fn escape_closes_overlays_topmost_first() {
        let mut handler = handler();
        handler.state.overlays.toc = true;
        handler.handle_action(Action::Search);
        type_text(&mut handler, "faq");
        handler.state.overlays.assistant = true;

        press(&mut handler, KeyCode::Esc);
        assert!(!handler.state.overlays.assistant);
        assert!(handler.state.overlays.search);

        press(&mut handler, KeyCode::Esc);
        assert!(!handler.state.overlays.search);
        assert!(handler.state.search.query.is_empty());

        press(&mut handler, KeyCode::Esc);
        assert!(!handler.state.overlays.toc);
        assert!(handler.state.overlays.sidebar);

        press(&mut handler, KeyCode::Esc);
        assert!(!handler.state.overlays.sidebar);
    }

    #[tokio::test]
    async fn command_line_runs_goto() {
        let mut handler = handler();
        press(&mut handler, KeyCode::Char(':'));
        type_text(&mut handler, "goto getting_started#hello-there");
        press(&mut handler, KeyCode::Enter);

        assert!(!handler.state.command_line.is_input_mode());
        assert_eq!(handler.state.navigator.active(), Some("getting_started"));
        assert_eq!(handler.state.navigator.pending_anchor(), Some("hello-there"));
    }

    #[tokio::test]
    async fn goto_external_is_an_error() {
        let mut handler = handler();
        handler.execute(Command::Goto("https://example.com".to_string()));
        assert!(handler.state.command_line.is_error);
        assert_eq!(handler.state.navigator.active(), None);
    }

    #[tokio::test]
    async fn copy_code_out_of_range_is_an_error() {
        let mut handler = handler();
        handler.open_entry("getting_started");
        handler.execute(Command::CopyCode(2));
        assert_eq!(
            handler.state.command_line.message.as_deref(),
            Some("No code block 2 in this section")
        );
    }

    #[tokio::test]
    async fn link_names_heading_at_top_of_view() {
        let mut handler = handler();
        handler.open_entry("getting_started");
        handler.state.content.anchors.insert("welcome".to_string(), 0);
        handler.state.content.anchors.insert("hello-there".to_string(), 3);
        handler.state.content.scroll_offset = 4;

        assert_eq!(handler.current_link().as_deref(), Some("getting_started#hello-there"));
    }

    #[tokio::test]
    async fn sections_step_in_sidebar_order() {
        let mut handler = handler();
        handler.open_first();
        assert_eq!(handler.state.navigator.active(), Some("getting_started"));

        handler.handle_action(Action::NextSection);
        assert_eq!(handler.state.navigator.active(), Some("faq"));
        assert_eq!(handler.state.sidebar.selected_index, 1);

        handler.handle_action(Action::PrevSection);
        handler.handle_action(Action::PrevSection);
        assert_eq!(handler.state.navigator.active(), Some("getting_started"));
    }

    #[tokio::test]
    async fn streamed_answer_lands_in_transcript() {
        let mut handler = handler();
        let (tx, rx) = mpsc::channel(8);
        handler.state.assistant.start_stream("Hi?".to_string(), CancellationToken::new());
        handler.stream_rx = Some(rx);

        tx.send(StreamEvent::Delta { text: "Hello ".to_string() }).await.unwrap();
        tx.send(StreamEvent::Delta { text: "there".to_string() }).await.unwrap();
        tx.send(StreamEvent::Finished).await.unwrap();
        handler.poll_background();

        let last = handler.state.assistant.messages.last().unwrap();
        assert_eq!(last.content, "Hello there");
        assert!(!handler.state.assistant.streaming);
        assert!(handler.stream_rx.is_none());
    }

    #[tokio::test]
    async fn stream_error_becomes_fallback() {
        let mut handler = handler();
        let (tx, rx) = mpsc::channel(8);
        handler.state.assistant.start_stream("Hi?".to_string(), CancellationToken::new());
        handler.stream_rx = Some(rx);

        tx.send(StreamEvent::Delta { text: "Partial".to_string() }).await.unwrap();
        tx.send(StreamEvent::Error { message: "overloaded".to_string() }).await.unwrap();
        handler.poll_background();

        let last = handler.state.assistant.messages.last().unwrap();
        assert_eq!(last.content, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn toc_enter_scrolls_to_rendered_heading() {
        let mut handler = handler();
        handler.open_entry("getting_started");
        handler.state.content.anchors.insert("welcome".to_string(), 0);
        handler.state.content.anchors.insert("hello-there".to_string(), 4);

        handler.handle_action(Action::ToggleToc);
        assert_eq!(handler.state.focus, Focus::Toc);
        handler.handle_action(Action::Down);
        handler.handle_action(Action::Select);

        assert_eq!(handler.state.content.scroll_offset, 3);
    }
}
