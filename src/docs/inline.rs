//! Inline formatting for block text
//!
//! Produces a small HTML-like markup vocabulary (`<strong>`, `<em>`, `<a>`,
//! `<code>`, `<mark>`, ...) that `ui::markup` turns into styled spans. The
//! rewrites run in a fixed order, and each one sees the output of the
//! previous ones.

use std::borrow::Cow;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Ordered `(pattern, replacement)` rewrites applied before autolinking
static EMPHASIS_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r#""([^"]+)""#, r#"<span class="pill">${1}</span>"#),
        (r"\*\*(.*?)\*\*", "<strong>${1}</strong>"),
        (r"__(.*?)__", "<strong>${1}</strong>"),
        (r"\*(.*?)\*", "<em>${1}</em>"),
        (r"_(.*?)_", "<em>${1}</em>"),
        (r"~~(.*?)~~", "<del>${1}</del>"),
        (r"\[(.*?)\]\((.*?)\)", r#"<a href="${2}">${1}</a>"#),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s<]+").unwrap());

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.*?)`").unwrap());

/// A tag of the markup vocabulary, open or closing
static ELEMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([a-z]+)(?:\s[^<>]*)?>").unwrap());

/// Splits markup into tags and the text between them
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Shortest highlight term that is applied
pub const MIN_HIGHLIGHT_LEN: usize = 2;

/// Upper bound on the compiled highlight pattern
const HIGHLIGHT_SIZE_LIMIT: usize = 1 << 20;

/// Convert the text of one block into display markup
pub fn format_inline(text: &str) -> String {
    let mut out = text.to_string();

    for (re, replacement) in EMPHASIS_RULES.iter() {
        if let Cow::Owned(replaced) = re.replace_all(&out, *replacement) {
            out = replaced;
        }
    }

    out = autolink(&out, &URL_RE, |url| {
        format!(r#"<a href="{url}" class="external">{url}<i class="icon-external"></i></a>"#)
    });
    out = autolink(&out, &EMAIL_RE, |addr| {
        format!(r#"<a href="mailto:{addr}" class="mail">{addr}<i class="icon-mail"></i></a>"#)
    });

    let out = CODE_RE.replace_all(&out, "<code>${1}</code>");
    out.replace('→', r#"<span class="muted">→</span>"#)
}

/// Wrap every occurrence of `term` outside of tags in `<mark>`.
///
/// Terms shorter than two characters are ignored. Matching is case-insensitive
/// and the term is taken literally. If the pattern cannot be compiled the
/// input comes back unchanged.
pub fn apply_highlight(markup: &str, term: &str) -> String {
    if markup.is_empty() || term.chars().count() < MIN_HIGHLIGHT_LEN {
        return markup.to_string();
    }

    let pattern = format!("({})", regex::escape(term));
    let re = match RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .size_limit(HIGHLIGHT_SIZE_LIMIT)
        .build()
    {
        Ok(re) => re,
        Err(e) => {
            tracing::debug!("Skipping highlight for {:?}: {}", term, e);
            return markup.to_string();
        }
    };

    let mut out = String::with_capacity(markup.len());
    let mut last = 0;
    for tag in TAG_RE.find_iter(markup) {
        out.push_str(&re.replace_all(&markup[last..tag.start()], "<mark>${1}</mark>"));
        out.push_str(tag.as_str());
        last = tag.end();
    }
    out.push_str(&re.replace_all(&markup[last..], "<mark>${1}</mark>"));
    out
}

/// Format block text and apply the optional highlight term
pub fn format_with_highlight(text: &str, term: Option<&str>) -> String {
    let formatted = format_inline(text);
    match term {
        Some(term) => apply_highlight(&formatted, term),
        None => formatted,
    }
}

/// Replace matches of `re` that are not already part of a tag or a link
fn autolink(text: &str, re: &Regex, render: impl Fn(&str) -> String) -> String {
    let protected = markup_spans(text);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in re.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        if protected.iter().any(|span| span.contains(&m.start())) {
            out.push_str(m.as_str());
        } else {
            out.push_str(&render(m.as_str()));
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Byte ranges covered by emitted tags and by the body of `<a>` elements.
///
/// A bare `<` in prose (`Android < 10`, `<= 2`) is not a tag and protects
/// nothing.
fn markup_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut link_start: Option<usize> = None;

    for tag in ELEMENT_RE.captures_iter(text) {
        let Some(whole) = tag.get(0) else { continue };
        spans.push(whole.range());
        let closing = tag.get(1).is_some_and(|slash| !slash.as_str().is_empty());
        match (&tag[2], closing) {
            ("a", false) => link_start = link_start.or(Some(whole.end())),
            ("a", true) => {
                if let Some(start) = link_start.take() {
                    spans.push(start..whole.start());
                }
            }
            _ => {}
        }
    }
    // An anchor that never closes swallows the rest of the text
    if let Some(start) = link_start {
        spans.push(start..text.len());
    }
    spans
}
