//! Resolved content cache and lazy loading
//!
//! The store owns the registry plus two pieces of mutable state behind one
//! mutex: the text resolved so far and the keys whose loaders are running.
//! The lock is only ever held for short synchronous sections, never across
//! a loader's `.await`. A load that is dropped or panics gives up its
//! in-flight mark, so the key can be loaded again.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::navigate;
use super::registry::{Entry, Registry, Section, SectionSource};
use super::search;

/// Default wait before the background preload starts
pub const DEFAULT_PRELOAD_DELAY: Duration = Duration::from_millis(1000);

/// Sleep between checks while another caller's load is running
const IN_FLIGHT_POLL: Duration = Duration::from_millis(25);

/// Result of asking the store to make a key's content available
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Already resolved, nothing to do
    Cached,
    /// Another caller is loading it
    InFlight,
    /// Content is inline, or the key is a sub-item or group
    NotLazy,
    /// No section has this key
    Unknown,
    /// This call ran the loader and stored the result
    Loaded,
    /// The loader failed; the key may be loaded again
    Failed(String),
}

impl LoadOutcome {
    /// Whether content for the key can be read right now
    pub fn is_available(&self) -> bool {
        matches!(self, LoadOutcome::Cached | LoadOutcome::NotLazy | LoadOutcome::Loaded)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    resolved: HashMap<String, String>,
    loading: HashSet<String>,
}

/// Holds a key's in-flight mark for the duration of one loader call
struct LoadingGuard<'a> {
    store: &'a ContentStore,
    key: &'a str,
    armed: bool,
}

impl LoadingGuard<'_> {
    /// Clear the mark under a lock the caller already holds
    fn release(mut self, state: &mut StoreState) {
        state.loading.remove(self.key);
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(section = %self.key, "Section load abandoned");
            self.store.state().loading.remove(self.key);
        }
    }
}

/// Shared owner of the registry and everything resolved from it
#[derive(Debug)]
pub struct ContentStore {
    registry: Registry,
    state: Mutex<StoreState>,
}

impl ContentStore {
    pub fn new(registry: Registry) -> Self {
        Self { registry, state: Mutex::new(StoreState::default()) }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        // A panic while holding the lock cannot leave the maps half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Text to display for a section or sub-item key.
    ///
    /// Checks the resolved cache first, then inline section content, then the
    /// sub-item's own content. Unknown or not-yet-loaded keys give `""`.
    pub fn active_content(&self, key: &str) -> String {
        if let Some(text) = self.state().resolved.get(key) {
            return text.clone();
        }
        match self.registry.entry(key) {
            Some(Entry::Section(section)) => {
                section.eager_content().map(str::to_string).unwrap_or_default()
            }
            Some(Entry::SubItem { item, .. }) => item.content.clone(),
            None => String::new(),
        }
    }

    /// Parent section key of a sub-item
    pub fn resolve_sub_item_parent(&self, sub_key: &str) -> Option<String> {
        self.registry.parent_of(sub_key).map(|section| section.key.clone())
    }

    pub fn is_resolved(&self, key: &str) -> bool {
        self.state().resolved.contains_key(key)
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.state().loading.contains(key)
    }

    /// Number of keys in the resolved cache
    pub fn resolved_count(&self) -> usize {
        self.state().resolved.len()
    }

    /// Whether selecting `key` can render without waiting on a loader
    pub fn is_ready(&self, key: &str) -> bool {
        match self.registry.entry(key) {
            Some(Entry::Section(section)) => !section.is_lazy() || self.is_resolved(key),
            Some(Entry::SubItem { parent, .. }) => {
                !parent.is_lazy() || self.is_resolved(&parent.key)
            }
            None => true,
        }
    }

    /// Run the loader for `key` unless it is cached, already loading, or has
    /// no loader.
    pub async fn ensure_loaded(&self, key: &str) -> LoadOutcome {
        let loader = {
            let mut state = self.state();
            if state.resolved.contains_key(key) {
                return LoadOutcome::Cached;
            }
            if state.loading.contains(key) {
                return LoadOutcome::InFlight;
            }
            let Some(section) = self.registry.section(key) else {
                return if self.registry.contains(key) {
                    LoadOutcome::NotLazy
                } else {
                    LoadOutcome::Unknown
                };
            };
            let SectionSource::Lazy(loader) = &section.source else {
                return LoadOutcome::NotLazy;
            };
            state.loading.insert(key.to_string());
            Arc::clone(loader)
        };
        // Clears the in-flight mark even if this future is dropped mid-load
        let in_flight = LoadingGuard { store: self, key, armed: true };

        tracing::debug!(section = %key, "Loading section");
        let result = loader.load().await;

        let mut state = self.state();
        in_flight.release(&mut state);
        match result {
            Ok(loaded) => {
                let sub_count = loaded.sub_items.len();
                state.resolved.entry(key.to_string()).or_insert(loaded.content);
                for (sub_key, text) in loaded.sub_items {
                    state.resolved.entry(sub_key).or_insert(text);
                }
                tracing::debug!(section = %key, sub_items = sub_count, "Section loaded");
                LoadOutcome::Loaded
            }
            Err(e) => {
                tracing::warn!(
                    section = %key,
                    retryable = e.is_retryable(),
                    "Failed to load section: {}",
                    e
                );
                LoadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Like [`ensure_loaded`](Self::ensure_loaded), but waits out a load that
    /// another caller already started.
    pub async fn wait_loaded(&self, key: &str) -> LoadOutcome {
        loop {
            match self.ensure_loaded(key).await {
                LoadOutcome::InFlight => tokio::time::sleep(IN_FLIGHT_POLL).await,
                outcome => return outcome,
            }
        }
    }

    /// Load every lazy section in registry order, one after another
    pub async fn preload_all(&self) -> usize {
        let keys: Vec<String> =
            self.registry.lazy_sections().map(|(key, _)| key.to_string()).collect();
        let mut loaded = 0;
        for key in keys {
            if self.ensure_loaded(&key).await == LoadOutcome::Loaded {
                loaded += 1;
            }
        }
        loaded
    }

    /// Start the background preload after `delay`
    pub fn spawn_preload(self: &Arc<Self>, delay: Duration) -> JoinHandle<usize> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let loaded = store.preload_all().await;
            tracing::info!(loaded, resolved = store.resolved_count(), "Preload finished");
            loaded
        })
    }

    /// Filter the registry against the live cache
    pub fn search(&self, query: &str) -> Cow<'_, [Section]> {
        let state = self.state();
        search::search(&self.registry, &state.resolved, query)
    }

    /// Best heading anchor for `query` within a section or sub-item
    pub fn find_heading_anchor(&self, key: &str, query: &str) -> Option<String> {
        navigate::find_heading_anchor(&self.active_content(key), query)
    }

    /// All documentation resolved so far, formatted as assistant context
    pub fn assistant_context(&self) -> String {
        let mut parts = Vec::with_capacity(self.registry.len());
        for section in self.registry.sections() {
            let mut part = format!(
                "Section: {}\nContent: {}",
                section.title,
                self.active_content(&section.key)
            );
            for item in &section.sub_items {
                part.push_str(&format!(
                    "\n\nSub-section: {}\nContent: {}",
                    item.title,
                    self.active_content(&item.key)
                ));
            }
            parts.push(part);
        }
        parts.join("\n\n---\n\n")
    }
}
