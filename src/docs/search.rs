//! Substring search over the registry
//!
//! No ranking and no index: a section matches when its title, a tag, or its
//! text contains the query, ignoring case. Searching never triggers a load,
//! so lazy sections only match on their text once they have been resolved.

use std::borrow::Cow;
use std::collections::HashMap;

use super::registry::{Registry, Section, SubItem};

/// Sections matching `query`, with non-matching sub-items pruned from
/// sections that are only kept for their children.
///
/// An empty query returns the registry's own slice.
pub fn search<'a>(
    registry: &'a Registry,
    resolved: &HashMap<String, String>,
    query: &str,
) -> Cow<'a, [Section]> {
    if query.is_empty() {
        return Cow::Borrowed(registry.sections());
    }

    let needle = query.to_lowercase();
    let mut results = Vec::new();

    for section in registry.sections() {
        let text = resolved.get(&section.key).map(String::as_str);
        if matches(&needle, &section.title, &section.tags, [text, section.eager_content()]) {
            results.push(section.clone());
            continue;
        }

        let sub_items: Vec<SubItem> = section
            .sub_items
            .iter()
            .filter(|item| {
                let text = resolved.get(&item.key).map(String::as_str);
                matches(&needle, &item.title, &item.tags, [text, Some(item.content.as_str())])
            })
            .cloned()
            .collect();

        if !sub_items.is_empty() {
            results.push(Section { sub_items, ..section.clone() });
        }
    }

    Cow::Owned(results)
}

fn matches(needle: &str, title: &str, tags: &[String], bodies: [Option<&str>; 2]) -> bool {
    contains(title, needle)
        || tags.iter().any(|tag| contains(tag, needle))
        || bodies.into_iter().flatten().any(|body| contains(body, needle))
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
