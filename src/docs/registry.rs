//! Section registry
//!
//! The fixed, validated list of guides. A section's body comes from one of
//! three places, recorded once in [`SectionSource`]: inline text, an async
//! loader, or nothing at all for sections that only group sub-items.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::error::DocsError;

/// Content produced by a lazy loader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedSection {
    /// Body of the section itself
    pub content: String,
    /// Bodies of the section's sub-items, keyed by sub-item key
    pub sub_items: HashMap<String, String>,
}

/// Asynchronously fetches a section's body
pub trait SectionLoader: Send + Sync {
    fn load(&self) -> BoxFuture<'static, Result<LoadedSection, DocsError>>;
}

impl<F, Fut> SectionLoader for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<LoadedSection, DocsError>> + Send + 'static,
{
    fn load(&self) -> BoxFuture<'static, Result<LoadedSection, DocsError>> {
        Box::pin(self())
    }
}

/// Where a section's body comes from
#[derive(Clone)]
pub enum SectionSource {
    /// Known up front
    Eager(String),
    /// Fetched on first use
    Lazy(Arc<dyn SectionLoader>),
    /// No body of its own
    Group,
}

impl fmt::Debug for SectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager(content) => f.debug_tuple("Eager").field(&content.len()).finish(),
            Self::Lazy(_) => f.write_str("Lazy"),
            Self::Group => f.write_str("Group"),
        }
    }
}

/// A child page of a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubItem {
    pub key: String,
    pub title: String,
    pub tags: Vec<String>,
    /// Empty until the parent's loader has run, for lazy parents
    pub content: String,
}

impl SubItem {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self { key: key.into(), title: title.into(), tags: Vec::new(), content: String::new() }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// A top-level guide
#[derive(Debug, Clone)]
pub struct Section {
    pub key: String,
    pub title: String,
    pub tags: Vec<String>,
    pub source: SectionSource,
    pub sub_items: Vec<SubItem>,
}

impl Section {
    /// Section with inline content
    pub fn eager(
        key: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::with_source(key, title, SectionSource::Eager(content.into()))
    }

    /// Section whose content is produced by `loader`
    pub fn lazy(
        key: impl Into<String>,
        title: impl Into<String>,
        loader: impl SectionLoader + 'static,
    ) -> Self {
        Self::with_source(key, title, SectionSource::Lazy(Arc::new(loader)))
    }

    /// Section that only groups its sub-items
    pub fn group(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self::with_source(key, title, SectionSource::Group)
    }

    fn with_source(
        key: impl Into<String>,
        title: impl Into<String>,
        source: SectionSource,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            tags: Vec::new(),
            source,
            sub_items: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sub_items(mut self, sub_items: Vec<SubItem>) -> Self {
        self.sub_items = sub_items;
        self
    }

    /// Inline body, if the section has one
    pub fn eager_content(&self) -> Option<&str> {
        match &self.source {
            SectionSource::Eager(content) => Some(content),
            _ => None,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.source, SectionSource::Lazy(_))
    }

    pub fn sub_item(&self, key: &str) -> Option<&SubItem> {
        self.sub_items.iter().find(|item| item.key == key)
    }
}

/// What a key refers to
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    Section(&'a Section),
    SubItem { parent: &'a Section, item: &'a SubItem },
}

impl<'a> Entry<'a> {
    pub fn title(&self) -> &'a str {
        match self {
            Entry::Section(section) => &section.title,
            Entry::SubItem { item, .. } => &item.title,
        }
    }

    /// Key of the top-level section this entry belongs to
    pub fn section_key(&self) -> &'a str {
        match self {
            Entry::Section(section) => &section.key,
            Entry::SubItem { parent, .. } => &parent.key,
        }
    }
}

/// Validated, immutable list of sections
#[derive(Debug, Clone, Default)]
pub struct Registry {
    sections: Vec<Section>,
    /// Sub-item key to index of its parent in `sections`
    parents: HashMap<String, usize>,
}

impl Registry {
    /// Build a registry, rejecting duplicate keys and sections with no body
    pub fn new(sections: Vec<Section>) -> Result<Self, DocsError> {
        let mut seen = HashSet::new();
        let mut parents = HashMap::new();

        for (index, section) in sections.iter().enumerate() {
            if !seen.insert(section.key.as_str()) {
                return Err(DocsError::DuplicateKey(section.key.clone()));
            }

            let has_body = match &section.source {
                SectionSource::Eager(content) => !content.is_empty(),
                SectionSource::Lazy(_) => true,
                SectionSource::Group => !section.sub_items.is_empty(),
            };
            if !has_body {
                return Err(DocsError::EmptySection(section.key.clone()));
            }

            for item in &section.sub_items {
                if !seen.insert(item.key.as_str()) {
                    return Err(DocsError::DuplicateKey(item.key.clone()));
                }
                parents.insert(item.key.clone(), index);
            }
        }

        Ok(Self { sections, parents })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.key == key)
    }

    /// Parent of a sub-item key
    pub fn parent_of(&self, sub_key: &str) -> Option<&Section> {
        self.parents.get(sub_key).map(|&index| &self.sections[index])
    }

    /// Look up a section or sub-item by key
    pub fn entry(&self, key: &str) -> Option<Entry<'_>> {
        if let Some(section) = self.section(key) {
            return Some(Entry::Section(section));
        }
        let parent = self.parent_of(key)?;
        let item = parent.sub_item(key)?;
        Some(Entry::SubItem { parent, item })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// Every key in display order: each section followed by its sub-items
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().flat_map(|section| {
            std::iter::once(section.key.as_str())
                .chain(section.sub_items.iter().map(|item| item.key.as_str()))
        })
    }

    /// Sections with a loader, in registry order
    pub fn lazy_sections(&self) -> impl Iterator<Item = (&str, &Arc<dyn SectionLoader>)> {
        self.sections.iter().filter_map(|section| match &section.source {
            SectionSource::Lazy(loader) => Some((section.key.as_str(), loader)),
            _ => None,
        })
    }
}
