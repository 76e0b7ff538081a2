//! Styled spans from inline markup
//!
//! Understands the tags the inline formatter emits. Anything else that looks
//! like a tag is shown as literal text.

use once_cell::sync::Lazy;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use regex::Regex;

use crate::theme::Theme;

/// Opening or closing tag with its name and attribute text
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<(/?)([a-z]+)((?:\s+[a-z-]+="[^"]*")*)\s*>"#).unwrap());

static CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"class="([^"]*)""#).unwrap());

const EXTERNAL_ICON: &str = " ↗";
const MAIL_ICON: &str = " ✉";

/// Convert markup to spans, starting from `base`
pub fn markup_to_spans(markup: &str, base: Style, theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    // Open elements with the style in effect inside them
    let mut stack: Vec<(&str, Style)> = Vec::new();
    let mut last = 0;

    for caps in TAG_RE.captures_iter(markup) {
        let Some(whole) = caps.get(0) else { continue };
        let current = stack.last().map_or(base, |(_, style)| *style);
        push_text(&mut spans, &markup[last..whole.start()], current);
        last = whole.end();

        let closing = !caps[1].is_empty();
        let name = caps.get(2).map_or("", |m| m.as_str());
        let class = caps.get(3).and_then(|attrs| CLASS_RE.captures(attrs.as_str()));
        let class = class.as_ref().and_then(|c| c.get(1)).map_or("", |m| m.as_str());

        if closing {
            match stack.iter().rposition(|(open, _)| *open == name) {
                Some(pos) => stack.truncate(pos),
                None => push_text(&mut spans, whole.as_str(), current),
            }
            continue;
        }

        let style = match name {
            "strong" => current.add_modifier(Modifier::BOLD),
            "em" => current.add_modifier(Modifier::ITALIC),
            "del" => current.add_modifier(Modifier::CROSSED_OUT),
            "code" => current.patch(theme.inline_code()),
            "mark" => current.patch(theme.mark()),
            "a" => current.patch(theme.link_style()),
            "span" => match class {
                "pill" => current.patch(theme.pill()),
                "muted" => current.patch(theme.muted()),
                _ => current,
            },
            "i" => {
                match class {
                    "icon-external" => push_text(&mut spans, EXTERNAL_ICON, current),
                    "icon-mail" => push_text(&mut spans, MAIL_ICON, current),
                    _ => {}
                }
                current
            }
            _ => {
                push_text(&mut spans, whole.as_str(), current);
                continue;
            }
        };
        stack.push((name, style));
    }

    let current = stack.last().map_or(base, |(_, style)| *style);
    push_text(&mut spans, &markup[last..], current);
    spans
}

/// Text content of markup with every recognised tag removed
pub fn plain_text(markup: &str) -> String {
    markup_to_spans(markup, Style::default(), &Theme::default())
        .iter()
        .map(|span| span.content.as_ref())
        .collect()
}

fn push_text(spans: &mut Vec<Span<'static>>, text: &str, style: Style) {
    if text.is_empty() {
        return;
    }
    // Merge with the previous span when the style is unchanged
    match spans.last_mut() {
        Some(prev) if prev.style == style => prev.content.to_mut().push_str(text),
        _ => spans.push(Span::styled(text.to_string(), style)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::{format_inline, format_with_highlight};
    use pretty_assertions::assert_eq;

    fn text_of(spans: &[Span<'_>]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn plain_text_is_one_span() {
        let theme = Theme::default();
        let spans = markup_to_spans("just words", Style::default(), &theme);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "just words");
    }

    #[test]
    fn emphasis_nests() {
        let theme = Theme::default();
        let spans =
            markup_to_spans(&format_inline("a **bold *both* text**"), Style::default(), &theme);
        assert_eq!(text_of(&spans), "a bold both text");
        let both = spans.iter().find(|s| s.content == "both").unwrap();
        assert!(both.style.add_modifier.contains(Modifier::BOLD | Modifier::ITALIC));
    }

    #[test]
    fn highlight_inside_strong_keeps_both() {
        let theme = Theme::default();
        let markup = format_with_highlight("**bold**", Some("bold"));
        let spans = markup_to_spans(&markup, Style::default(), &theme);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].style.bg, Some(theme.mark_bg));
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn external_links_get_an_icon() {
        let theme = Theme::default();
        let spans =
            markup_to_spans(&format_inline("See https://example.com"), Style::default(), &theme);
        assert_eq!(text_of(&spans), "See https://example.com ↗");
        assert_eq!(spans[1].style.fg, Some(theme.link));
    }

    #[test]
    fn pill_and_muted_arrow() {
        let theme = Theme::default();
        let spans = markup_to_spans(
            &format_inline(r#"Open "Settings" → "Account""#),
            Style::default(),
            &theme,
        );
        assert_eq!(text_of(&spans), "Open Settings → Account");
        assert_eq!(spans[1].style.bg, Some(theme.pill_bg));
        let arrow = spans.iter().find(|s| s.content.contains('→')).unwrap();
        assert_eq!(arrow.style.fg, Some(theme.fg_muted));
    }

    #[test]
    fn unknown_tags_stay_literal() {
        let theme = Theme::default();
        let spans = markup_to_spans("<div>x</div> and a < b", Style::default(), &theme);
        assert_eq!(text_of(&spans), "<div>x</div> and a < b");
    }

    #[test]
    fn plain_text_strips_tags() {
        assert_eq!(plain_text(&format_inline("`npm i` then **run**")), "npm i then run");
    }
}
