//! Heading lookup and link resolution

use once_cell::sync::Lazy;
use regex::Regex;

use super::slug::slugify;

/// A Markdown heading line, capturing its text
static HEADING_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+(.+)$").unwrap());

/// Find the anchor that best answers `query` inside `body`.
///
/// A heading whose text contains the query wins. Otherwise the anchor is the
/// heading that precedes the first occurrence of the query in the body.
/// Matching is case-insensitive.
pub fn find_heading_anchor(body: &str, query: &str) -> Option<String> {
    if body.is_empty() || query.is_empty() {
        return None;
    }

    let haystack = body.to_lowercase();
    let needle = query.to_lowercase();

    let headings: Vec<(usize, &str)> = HEADING_LINE_RE
        .captures_iter(&haystack)
        .filter_map(|caps| {
            let line = caps.get(0)?;
            let text = caps.get(1)?;
            Some((line.start(), text.as_str()))
        })
        .collect();

    if let Some((_, text)) = headings.iter().find(|(_, text)| text.contains(&needle)) {
        return Some(slugify(text));
    }

    let position = haystack.find(&needle)?;
    headings
        .iter()
        .take_while(|(start, _)| *start <= position)
        .last()
        .map(|(_, text)| slugify(text))
}

/// Where a link inside a guide points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Another section, optionally at an anchor
    Section { key: String, anchor: Option<String> },
    /// An anchor within the current section
    Anchor(String),
    /// Anything that leaves the portal
    External(String),
}

impl LinkTarget {
    /// Classify `href`. `is_key` reports whether a candidate section key exists.
    ///
    /// Accepts `#anchor`, `key`, `key#anchor`, `file.md` and `./dir/file.md`.
    /// For file links the key is the file stem, also tried with `-` mapped
    /// to `_`.
    pub fn parse(href: &str, is_key: impl Fn(&str) -> bool) -> Self {
        let href = href.trim();

        if let Some(anchor) = href.strip_prefix('#') {
            return LinkTarget::Anchor(anchor.to_string());
        }
        if href.contains("://") || href.starts_with("mailto:") {
            return LinkTarget::External(href.to_string());
        }

        let (path, anchor) = match href.split_once('#') {
            Some((path, anchor)) if !anchor.is_empty() => (path, Some(anchor.to_string())),
            Some((path, _)) => (path, None),
            None => (href, None),
        };

        let stem = path.rsplit('/').next().unwrap_or(path);
        let stem = stem.strip_suffix(".md").unwrap_or(stem);

        let candidates = [stem.to_string(), stem.replace('-', "_")];
        match candidates.into_iter().find(|key| !key.is_empty() && is_key(key)) {
            Some(key) => LinkTarget::Section { key, anchor },
            None => LinkTarget::External(href.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUIDE: &str =
        "# Welcome\nHello there.\n## Install\nRun setup.\n## Configure\nEdit the file.";

    #[test]
    fn direct_heading_match() {
        assert_eq!(find_heading_anchor(GUIDE, "install"), Some("install".into()));
        assert_eq!(find_heading_anchor(GUIDE, "CONFIG"), Some("configure".into()));
    }

    #[test]
    fn body_match_uses_preceding_heading() {
        assert_eq!(find_heading_anchor(GUIDE, "hello"), Some("welcome".into()));
        assert_eq!(find_heading_anchor(GUIDE, "setup"), Some("install".into()));
        assert_eq!(find_heading_anchor(GUIDE, "the file"), Some("configure".into()));
    }

    #[test]
    fn match_before_first_heading_has_no_anchor() {
        assert_eq!(find_heading_anchor("Intro text\n## Later", "intro"), None);
    }

    #[test]
    fn empty_inputs_and_misses() {
        assert_eq!(find_heading_anchor("", "x"), None);
        assert_eq!(find_heading_anchor(GUIDE, ""), None);
        assert_eq!(find_heading_anchor(GUIDE, "nowhere"), None);
    }

    #[test]
    fn heading_markers_need_whitespace() {
        assert_eq!(find_heading_anchor("#tag mention\n## Real\nbody", "tag"), None);
        assert_eq!(find_heading_anchor("##\tTabbed Title", "tabbed"), Some("tabbed-title".into()));
    }

    fn keys(key: &str) -> bool {
        matches!(key, "installation" | "getting_started" | "faq")
    }

    #[test]
    fn markdown_file_links() {
        assert_eq!(
            LinkTarget::parse("installation.md", keys),
            LinkTarget::Section { key: "installation".into(), anchor: None }
        );
        assert_eq!(
            LinkTarget::parse("./guides/getting-started.md#step-1", keys),
            LinkTarget::Section { key: "getting_started".into(), anchor: Some("step-1".into()) }
        );
    }

    #[test]
    fn anchors_and_keys() {
        assert_eq!(LinkTarget::parse("#android", keys), LinkTarget::Anchor("android".into()));
        assert_eq!(
            LinkTarget::parse("faq#billing", keys),
            LinkTarget::Section { key: "faq".into(), anchor: Some("billing".into()) }
        );
    }

    #[test]
    fn everything_else_is_external() {
        assert_eq!(
            LinkTarget::parse("https://example.com/faq.md", keys),
            LinkTarget::External("https://example.com/faq.md".into())
        );
        assert!(matches!(
            LinkTarget::parse("mailto:help@example.com", keys),
            LinkTarget::External(_)
        ));
        assert!(matches!(LinkTarget::parse("unknown.md", keys), LinkTarget::External(_)));
    }
}
