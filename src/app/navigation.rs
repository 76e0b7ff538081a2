//! Section navigation state
//!
//! Tracks which section is shown, whether its content is still loading, a
//! heading the view should scroll to once it has been rendered, and the
//! search term highlighted in the text.

use std::time::{Duration, Instant};

use crate::docs::inline::MIN_HIGHLIGHT_LEN;

/// Time between checks for a pending scroll anchor
pub const SCROLL_POLL_INTERVAL: Duration = Duration::from_millis(150);

/// Checks before a pending scroll is abandoned
pub const SCROLL_POLL_ATTEMPTS: u32 = 20;

/// How long a search term stays highlighted
pub const HIGHLIGHT_TTL: Duration = Duration::from_secs(8);

/// Lines kept visible above a scroll target
pub const STICKY_HEADER_OFFSET: usize = 1;

/// Outcome of one poll tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// Not due yet, or due and the check came back empty
    Waiting,
    Found(T),
    /// Every attempt has been used
    Exhausted,
}

/// Retries a check at a fixed interval, up to a fixed number of attempts
#[derive(Debug, Clone)]
pub struct RetryPoll {
    interval: Duration,
    max_attempts: u32,
    attempts: u32,
    next_due: Instant,
}

impl RetryPoll {
    /// First attempt is due one `interval` after `now`
    pub fn new(interval: Duration, max_attempts: u32, now: Instant) -> Self {
        Self { interval, max_attempts, attempts: 0, next_due: now + interval }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run the check if an attempt is due
    pub fn tick<T>(&mut self, now: Instant, check: impl FnOnce() -> Option<T>) -> PollStatus<T> {
        if self.attempts >= self.max_attempts {
            return PollStatus::Exhausted;
        }
        if now < self.next_due {
            return PollStatus::Waiting;
        }

        self.attempts += 1;
        self.next_due = now + self.interval;
        match check() {
            Some(found) => PollStatus::Found(found),
            None if self.attempts >= self.max_attempts => PollStatus::Exhausted,
            None => PollStatus::Waiting,
        }
    }
}

/// A heading to scroll to once it appears in the rendered text
#[derive(Debug, Clone)]
pub struct PendingScroll {
    pub anchor: String,
    poll: RetryPoll,
}

/// Navigation phase, derived from [`Navigator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase<'a> {
    Idle,
    Active(&'a str),
    Loading(&'a str),
    PendingScroll { anchor: &'a str, attempts: u32 },
}

/// Where the content view should move after a navigation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRequest {
    /// Leave the current position alone
    Keep,
    Top,
    Line(usize),
}

/// Search highlight with its expiry
#[derive(Debug, Clone)]
struct Highlight {
    term: String,
    expires_at: Instant,
}

/// Which section is shown and what the view is waiting for
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    active: Option<String>,
    loading: bool,
    pending: Option<PendingScroll>,
    highlight: Option<Highlight>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase<'_> {
        match (&self.active, &self.pending) {
            (None, _) => Phase::Idle,
            (Some(key), _) if self.loading => Phase::Loading(key),
            (Some(_), Some(pending)) => {
                Phase::PendingScroll { anchor: &pending.anchor, attempts: pending.poll.attempts() }
            }
            (Some(key), None) => Phase::Active(key),
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pending_anchor(&self) -> Option<&str> {
        self.pending.as_ref().map(|pending| pending.anchor.as_str())
    }

    /// Switch to `key`. `ready` says whether its content can be shown now.
    ///
    /// Returns whether the active section changed.
    pub fn select(&mut self, key: &str, ready: bool) -> bool {
        let changed = self.active.as_deref() != Some(key);
        if changed {
            self.active = Some(key.to_string());
            self.loading = !ready;
            self.pending = None;
        }
        changed
    }

    /// Content for `key` is now available
    pub fn load_finished(&mut self, key: &str) {
        if self.active.as_deref() == Some(key) {
            self.loading = false;
        }
    }

    /// Open a search result.
    ///
    /// Queries of two or more characters become the highlight term. With an
    /// anchor the view scrolls there once it has been rendered; without one
    /// it goes to the top.
    pub fn search_select(
        &mut self,
        key: &str,
        query: &str,
        anchor: Option<String>,
        ready: bool,
        now: Instant,
    ) -> ScrollRequest {
        if query.chars().count() >= MIN_HIGHLIGHT_LEN {
            let expires_at = now + HIGHLIGHT_TTL;
            self.highlight = Some(Highlight { term: query.to_string(), expires_at });
        }

        self.select(key, ready);
        match anchor {
            Some(anchor) => {
                self.scroll_to(anchor, now);
                ScrollRequest::Keep
            }
            None => {
                self.pending = None;
                ScrollRequest::Top
            }
        }
    }

    /// Scroll to `anchor` in the active section once it has been rendered
    pub fn scroll_to(&mut self, anchor: String, now: Instant) {
        let poll = RetryPoll::new(SCROLL_POLL_INTERVAL, SCROLL_POLL_ATTEMPTS, now);
        self.pending = Some(PendingScroll { anchor, poll });
    }

    /// Advance the pending scroll. `locate` maps an anchor to its rendered
    /// line in the latest frame.
    pub fn tick_scroll(
        &mut self,
        now: Instant,
        locate: impl FnOnce(&str) -> Option<usize>,
    ) -> ScrollRequest {
        if self.loading {
            return ScrollRequest::Keep;
        }
        let Some(pending) = self.pending.as_mut() else {
            return ScrollRequest::Keep;
        };

        let anchor = pending.anchor.clone();
        match pending.poll.tick(now, || locate(&anchor)) {
            PollStatus::Waiting => ScrollRequest::Keep,
            PollStatus::Found(line) => {
                self.pending = None;
                ScrollRequest::Line(line.saturating_sub(STICKY_HEADER_OFFSET))
            }
            PollStatus::Exhausted => {
                tracing::debug!(anchor = %anchor, "Scroll target never appeared");
                self.pending = None;
                ScrollRequest::Keep
            }
        }
    }

    /// Current highlight term, if it has not expired at `now`
    pub fn highlight(&self, now: Instant) -> Option<&str> {
        self.highlight.as_ref().filter(|h| now < h.expires_at).map(|h| h.term.as_str())
    }

    /// Drop an expired highlight. Returns whether one was removed.
    pub fn expire_highlight(&mut self, now: Instant) -> bool {
        let expired = self.highlight.as_ref().is_some_and(|h| now >= h.expires_at);
        if expired {
            self.highlight = None;
        }
        expired
    }
}

/// Open overlays, closed topmost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlays {
    pub assistant: bool,
    pub search: bool,
    pub toc: bool,
    pub sidebar: bool,
}

/// Overlay closed by [`Overlays::close_topmost`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Assistant,
    Search,
    Toc,
    Sidebar,
}

impl Overlays {
    /// Close the first open overlay in the order assistant, search, TOC, sidebar
    pub fn close_topmost(&mut self) -> Option<Overlay> {
        let slots = [
            (&mut self.assistant, Overlay::Assistant),
            (&mut self.search, Overlay::Search),
            (&mut self.toc, Overlay::Toc),
            (&mut self.sidebar, Overlay::Sidebar),
        ];
        for (open, overlay) in slots {
            if *open {
                *open = false;
                return Some(overlay);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::docs::{self, ContentStore, Registry, Section};

    #[test]
    fn poll_finds_target_on_a_later_attempt() {
        let start = Instant::now();
        let mut poll = RetryPoll::new(SCROLL_POLL_INTERVAL, 3, start);

        assert_eq!(poll.tick(start, || Some(1)), PollStatus::Waiting);
        assert_eq!(poll.tick(start + SCROLL_POLL_INTERVAL, || None::<u8>), PollStatus::Waiting);
        assert_eq!(poll.tick(start + SCROLL_POLL_INTERVAL * 2, || Some(7)), PollStatus::Found(7));
    }

    #[test]
    fn poll_gives_up_after_max_attempts() {
        let start = Instant::now();
        let mut poll = RetryPoll::new(SCROLL_POLL_INTERVAL, SCROLL_POLL_ATTEMPTS, start);
        let mut calls = 0;
        let mut status = PollStatus::Waiting;
        for i in 1..=SCROLL_POLL_ATTEMPTS {
            status = poll.tick(start + SCROLL_POLL_INTERVAL * i, || {
                calls += 1;
                None::<usize>
            });
        }
        assert_eq!(status, PollStatus::Exhausted);
        assert_eq!(calls, SCROLL_POLL_ATTEMPTS);
        assert_eq!(poll.tick(start + Duration::from_secs(60), || Some(1)), PollStatus::Exhausted);
    }

    #[test]
    fn select_tracks_loading() {
        let mut nav = Navigator::new();
        assert_eq!(nav.phase(), Phase::Idle);

        assert!(nav.select("faq", false));
        assert_eq!(nav.phase(), Phase::Loading("faq"));
        nav.load_finished("other");
        assert_eq!(nav.phase(), Phase::Loading("faq"));
        nav.load_finished("faq");
        assert_eq!(nav.phase(), Phase::Active("faq"));

        assert!(!nav.select("faq", true));
        assert!(nav.select("intro", true));
        assert_eq!(nav.phase(), Phase::Active("intro"));
    }

    #[test]
    fn short_queries_do_not_highlight() {
        let now = Instant::now();
        let mut nav = Navigator::new();
        nav.search_select("faq", "a", None, true, now);
        assert_eq!(nav.highlight(now), None);
    }

    #[test]
    fn search_without_anchor_scrolls_to_top() {
        let now = Instant::now();
        let mut nav = Navigator::new();
        assert_eq!(nav.search_select("faq", "login", None, true, now), ScrollRequest::Top);
        assert_eq!(nav.pending_anchor(), None);
    }

    #[test]
    fn pending_scroll_waits_for_loading() {
        let start = Instant::now();
        let mut nav = Navigator::new();
        nav.search_select("faq", "login", Some("login".into()), false, start);
        assert!(matches!(nav.phase(), Phase::Loading("faq")));

        let later = start + SCROLL_POLL_INTERVAL * 5;
        assert_eq!(nav.tick_scroll(later, |_| Some(10)), ScrollRequest::Keep);
        assert_eq!(nav.pending_anchor(), Some("login"));

        nav.load_finished("faq");
        assert!(matches!(nav.phase(), Phase::PendingScroll { anchor: "login", attempts: 0 }));
        assert_eq!(nav.tick_scroll(later, |_| Some(10)), ScrollRequest::Line(9));
        assert_eq!(nav.phase(), Phase::Active("faq"));
    }

    #[test]
    fn pending_scroll_gives_up_silently() {
        let start = Instant::now();
        let mut nav = Navigator::new();
        nav.search_select("faq", "zz", Some("missing".into()), true, start);
        for i in 1..=SCROLL_POLL_ATTEMPTS {
            nav.tick_scroll(start + SCROLL_POLL_INTERVAL * i, |_| None);
        }
        assert_eq!(nav.pending_anchor(), None);
        assert_eq!(nav.phase(), Phase::Active("faq"));
    }

    #[test]
    fn highlight_expires_after_eight_seconds() {
        let start = Instant::now();
        let mut nav = Navigator::new();
        nav.search_select("faq", "login", None, true, start);

        assert_eq!(nav.highlight(start + Duration::from_secs(7)), Some("login"));
        assert!(!nav.expire_highlight(start + Duration::from_secs(7)));
        assert_eq!(nav.highlight(start + HIGHLIGHT_TTL), None);
        assert!(nav.expire_highlight(start + HIGHLIGHT_TTL));
    }

    #[test]
    fn escape_closes_overlays_in_order() {
        let mut overlays = Overlays { assistant: true, search: true, toc: true, sidebar: true };
        assert_eq!(overlays.close_topmost(), Some(Overlay::Assistant));
        assert_eq!(overlays.close_topmost(), Some(Overlay::Search));
        assert_eq!(overlays.close_topmost(), Some(Overlay::Toc));
        assert_eq!(overlays.close_topmost(), Some(Overlay::Sidebar));
        assert_eq!(overlays.close_topmost(), None);

        let mut overlays = Overlays { toc: true, sidebar: true, ..Default::default() };
        assert_eq!(overlays.close_topmost(), Some(Overlay::Toc));
    }

    #[tokio::test]
    async fn search_result_opens_section_at_heading_with_highlight() {
        let registry = Registry::new(vec![
            Section::eager("getting_started", "Getting Started", "# Welcome\nHello.\n## Next"),
            Section::eager("faq", "FAQ", "# FAQ\nNothing here."),
        ])
        .unwrap();
        let store = Arc::new(ContentStore::new(registry));
        let start = Instant::now();

        let results = store.search("hello");
        assert_eq!(results.len(), 1);
        let key = results[0].key.clone();
        assert_eq!(key, "getting_started");

        let anchor = store.find_heading_anchor(&key, "hello");
        assert_eq!(anchor.as_deref(), Some("welcome"));

        let mut nav = Navigator::new();
        store.ensure_loaded(&key).await;
        nav.search_select(&key, "hello", anchor, store.is_ready(&key), start);

        let text = store.active_content(&key);
        let blocks = docs::parse_blocks(&text);
        let heading_line = blocks
            .iter()
            .position(|b| matches!(b, docs::Block::Heading { id, .. } if id == "welcome"));
        assert_eq!(heading_line, Some(0));

        let request = nav.tick_scroll(start + SCROLL_POLL_INTERVAL, |anchor| {
            (anchor == "welcome").then_some(0)
        });
        assert_eq!(request, ScrollRequest::Line(0));

        let term = nav.highlight(start + SCROLL_POLL_INTERVAL);
        assert_eq!(docs::format_with_highlight("Hello.", term), "<mark>Hello</mark>.");
    }
}
