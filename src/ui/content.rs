//! Content block renderer

use std::collections::HashMap;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use regex::{Regex, RegexBuilder};

use super::markup::{markup_to_spans, plain_text};
use crate::app::state::{AppState, Focus};
use crate::docs::inline::MIN_HIGHLIGHT_LEN;
use crate::docs::{self, ListItem};
use crate::syntax;
use crate::theme::Theme;

/// Narrowest a table column is squeezed to
const MIN_COLUMN_WIDTH: usize = 6;

/// Spaces between table columns
const COLUMN_GAP: usize = 2;

/// Lines of a rendered document plus the line each heading anchor landed on
#[derive(Debug, Default)]
pub struct RenderedContent {
    pub lines: Vec<Line<'static>>,
    pub anchors: HashMap<String, usize>,
}

/// Draw the content panel with the active section
pub fn draw(
    frame: &mut Frame,
    area: Rect,
    state: &mut AppState,
    theme: &Theme,
    highlight: Option<&str>,
) {
    let focused = state.focus == Focus::Content;
    let border_color = if focused { theme.border_focused } else { theme.border };

    let title = match (&state.content.document, state.show_help) {
        (_, true) => " Help ".to_string(),
        (Some(document), false) => format!(" {} ", document.title),
        (None, false) => " Content ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme.bg_primary));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.show_help {
        let help = Paragraph::new(help_lines(theme)).wrap(Wrap { trim: false });
        frame.render_widget(help, inner);
        return;
    }

    if state.navigator.is_loading() {
        let msg = Paragraph::new("Loading…").style(Style::default().fg(theme.fg_muted));
        frame.render_widget(msg, inner);
        return;
    }

    let Some(document) = &state.content.document else {
        draw_welcome(frame, inner, &state.product, theme);
        return;
    };

    // Reserve 1 column for scrollbar
    let content_width = inner.width.saturating_sub(2) as usize;
    let content_area =
        Rect { x: inner.x, y: inner.y, width: inner.width.saturating_sub(1), height: inner.height };
    let scrollbar_x = inner.x + inner.width.saturating_sub(1);

    let rendered = render_blocks(&document.blocks, theme, content_width, highlight);
    let total_lines = rendered.lines.len();
    let visible_height = inner.height as usize;

    // The scroll poll reads anchors from the last frame
    state.content.anchors = rendered.anchors;
    state.content.total_lines = total_lines;
    state.content.visible_height = visible_height;
    state.content.clamp_scroll();

    let scroll_offset = state.content.scroll_offset;
    let visible_lines: Vec<Line> =
        rendered.lines.into_iter().skip(scroll_offset).take(visible_height).collect();

    frame.render_widget(Paragraph::new(visible_lines), content_area);

    draw_scrollbar(frame, scrollbar_x, inner.y, inner.height, scroll_offset, total_lines, theme);
}

/// Draw a scrollbar indicator
fn draw_scrollbar(
    frame: &mut Frame,
    x: u16,
    y: u16,
    height: u16,
    scroll_offset: usize,
    total_lines: usize,
    theme: &Theme,
) {
    if total_lines == 0 || height == 0 {
        return;
    }

    let height = height as usize;

    let visible_ratio = (height as f64 / total_lines as f64).min(1.0);
    let thumb_height = ((height as f64 * visible_ratio).ceil() as usize).max(1);

    let max_scroll = total_lines.saturating_sub(height / 2);
    let scroll_ratio = if total_lines <= height || max_scroll == 0 {
        0.0
    } else {
        scroll_offset as f64 / max_scroll as f64
    };
    let thumb_top = ((height - thumb_height) as f64 * scroll_ratio).round() as usize;

    for i in 0..height {
        let on_thumb = i >= thumb_top && i < thumb_top + thumb_height;
        let (ch, style) = if on_thumb {
            ("█", Style::default().fg(theme.accent_secondary))
        } else {
            ("░", Style::default().fg(theme.bg_tertiary))
        };

        frame.render_widget(
            Paragraph::new(ch).style(style),
            Rect { x, y: y.saturating_add(i as u16), width: 1, height: 1 },
        );
    }
}

/// Shown until a section is selected
fn draw_welcome(frame: &mut Frame, area: Rect, product: &str, theme: &Theme) {
    let muted = Style::default().fg(theme.fg_muted);
    let welcome = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{product} documentation"),
            Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Pick a section from the sidebar to start reading.",
            Style::default().fg(theme.fg_secondary),
        )),
        Line::from(""),
        Line::from(Span::styled("  Enter     Open the selected section", muted)),
        Line::from(Span::styled("  / Ctrl+K  Search", muted)),
        Line::from(Span::styled("  a         Ask the assistant", muted)),
        Line::from(Span::styled("  ?         Help", muted)),
    ];

    frame.render_widget(Paragraph::new(welcome).wrap(Wrap { trim: true }), area);
}

/// Keys and commands
fn help_lines(theme: &Theme) -> Vec<Line<'static>> {
    let heading = Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD);
    let key = Style::default().fg(theme.accent_secondary);
    let text = Style::default().fg(theme.fg_secondary);

    let keys = [
        ("↑ / ↓", "Move or scroll"),
        ("Home / End", "Top / bottom"),
        ("PgUp / PgDn", "Page up / down"),
        ("Ctrl+D/U", "Half page down / up"),
        ("]", "Next section"),
        ("Tab", "Switch between sidebar and content"),
        ("Enter", "Open selection"),
        ("/ Ctrl+K", "Search"),
        ("t", "Table of contents"),
        ("[", "Toggle sidebar"),
        ("a", "Assistant"),
        ("Esc", "Close the topmost panel"),
        (":", "Command line"),
    ];
    let vim_keys = [
        ("j / k", "Move or scroll"),
        ("g / G", "Top / bottom"),
        ("d / u", "Page down / up"),
        ("n / N", "Next / previous section"),
    ];
    let commands = [
        (":goto <target>", "Open a section, `key#anchor` or `#anchor`"),
        (":copy-link", "Copy a link to the current heading"),
        (":copy-code [n]", "Copy the nth code block"),
        (":ask <question>", "Ask the assistant"),
        (":assistant-key <key>", "Store the API key"),
        (":assistant-model <m>", "haiku, sonnet or opus"),
        (":assistant-clear", "Start a new conversation"),
        (":toc", "Toggle the table of contents"),
        (":q", "Quit"),
    ];

    let mut lines = vec![Line::from(Span::styled("Keys", heading)), Line::from("")];
    for (k, desc) in keys {
        lines.push(Line::from(vec![
            Span::styled(format!("  {k:<22}"), key),
            Span::styled(desc, text),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Vim mode", heading)));
    lines.push(Line::from(""));
    for (k, desc) in vim_keys {
        lines.push(Line::from(vec![
            Span::styled(format!("  {k:<22}"), key),
            Span::styled(desc, text),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Commands", heading)));
    lines.push(Line::from(""));
    for (k, desc) in commands {
        lines.push(Line::from(vec![
            Span::styled(format!("  {k:<22}"), key),
            Span::styled(desc, text),
        ]));
    }
    lines
}

/// Render blocks to styled lines, recording where each heading lands.
///
/// `highlight` is marked in prose, tables and code.
pub fn render_blocks(
    blocks: &[docs::Block],
    theme: &Theme,
    width: usize,
    highlight: Option<&str>,
) -> RenderedContent {
    let mut out = RenderedContent::default();
    let term_re = highlight.and_then(highlight_regex);
    let term_re = term_re.as_ref();

    for block in blocks {
        match block {
            docs::Block::Heading { level, text, id } => {
                render_heading(&mut out, *level, text, id, theme, highlight);
            }
            docs::Block::Paragraph(text) => {
                let base = Style::default().fg(theme.fg_primary);
                let spans = inline_spans(text, base, theme, highlight);
                out.lines.extend(wrap_spans(spans, width.saturating_sub(2)));
            }
            docs::Block::Code { language, code } => {
                render_code_block(&mut out.lines, language.as_deref(), code, theme, term_re);
            }
            docs::Block::UnorderedList(items) => {
                render_list(&mut out.lines, items, false, theme, width, highlight);
            }
            docs::Block::OrderedList(items) => {
                render_list(&mut out.lines, items, true, theme, width, highlight);
            }
            docs::Block::Blockquote(text) => {
                render_blockquote(&mut out.lines, text, theme, width, highlight);
            }
            docs::Block::Task { text, completed } => {
                render_task(&mut out.lines, text, *completed, theme, width, highlight);
            }
            docs::Block::Table(rows) => {
                render_table(&mut out.lines, rows, theme, width, term_re);
            }
            docs::Block::HorizontalRule => {
                render_horizontal_rule(&mut out.lines, theme, width);
            }
            docs::Block::Spacer => {
                if out.lines.last().is_some_and(|line| line.width() > 0) {
                    out.lines.push(Line::from(""));
                }
            }
        }
    }

    out
}

fn inline_spans(
    text: &str,
    base: Style,
    theme: &Theme,
    highlight: Option<&str>,
) -> Vec<Span<'static>> {
    markup_to_spans(&docs::format_with_highlight(text, highlight), base, theme)
}

fn render_heading(
    out: &mut RenderedContent,
    level: u8,
    text: &str,
    id: &str,
    theme: &Theme,
    highlight: Option<&str>,
) {
    let mut base = theme.heading(level);
    if level == 1 {
        base = base.add_modifier(Modifier::UNDERLINED);
    }
    let prefix = match level {
        1 | 2 => "",
        3 => "  ",
        4 => "    ",
        _ => "      ",
    };

    let mut spans = Vec::new();
    if !prefix.is_empty() {
        spans.push(Span::styled(prefix, base));
    }
    spans.extend(inline_spans(text, base, theme, highlight));

    if !out.lines.is_empty() {
        out.lines.push(Line::from(""));
    }
    out.anchors.entry(id.to_string()).or_insert(out.lines.len());
    out.lines.push(Line::from(spans));
    if level <= 2 {
        out.lines.push(Line::from(""));
    }
}

/// Wrap styled spans into lines while preserving formatting
fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![Line::from(spans)];
    }

    let mut lines = Vec::new();
    let mut current_line: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;

    for span in spans {
        let style = span.style;

        for word in span.content.split_inclusive(char::is_whitespace) {
            let word_len = word.chars().count();

            if current_width + word_len > width && current_width > 0 {
                lines.push(Line::from(std::mem::take(&mut current_line)));
                current_width = 0;
            }

            current_line.push(Span::styled(word.to_string(), style));
            current_width += word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(Line::from(current_line));
    }

    if lines.is_empty() {
        lines.push(Line::from(""));
    }

    lines
}

fn render_code_block(
    lines: &mut Vec<Line<'static>>,
    language: Option<&str>,
    code: &str,
    theme: &Theme,
    term_re: Option<&Regex>,
) {
    let border = Style::default().fg(theme.border);
    let lang_label = language.unwrap_or("code");
    lines.push(Line::from(vec![
        Span::styled("┌─ ", border),
        Span::styled(lang_label.to_string(), Style::default().fg(theme.info)),
        Span::styled(" ─", border),
    ]));

    let highlighted = syntax::highlight_code(code, language, theme);
    let number_width = highlighted.len().to_string().len();
    for (i, spans) in highlighted.into_iter().enumerate() {
        let mut line_spans = vec![
            Span::styled("│ ", border),
            Span::styled(format!("{:>number_width$} ", i + 1), theme.muted()),
        ];
        line_spans.extend(mark_matches(spans, term_re, theme.mark()));
        lines.push(Line::from(line_spans));
    }

    lines.push(Line::from(Span::styled("└──────", border)));
    lines.push(Line::from(""));
}

/// Split spans around matches of `term_re` and give the matches `mark`
fn mark_matches(
    spans: Vec<Span<'static>>,
    term_re: Option<&Regex>,
    mark: Style,
) -> Vec<Span<'static>> {
    let Some(re) = term_re else {
        return spans;
    };

    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        let text = span.content.as_ref();
        let mut last = 0;
        for m in re.find_iter(text) {
            if m.start() > last {
                out.push(Span::styled(text[last..m.start()].to_string(), span.style));
            }
            out.push(Span::styled(m.as_str().to_string(), span.style.patch(mark)));
            last = m.end();
        }
        if last == 0 {
            out.push(span);
        } else if last < text.len() {
            out.push(Span::styled(text[last..].to_string(), span.style));
        }
    }
    out
}

/// Case-insensitive literal matcher for a highlight term
fn highlight_regex(term: &str) -> Option<Regex> {
    if term.chars().count() < MIN_HIGHLIGHT_LEN {
        return None;
    }
    RegexBuilder::new(&regex::escape(term)).case_insensitive(true).build().ok()
}

fn render_list(
    lines: &mut Vec<Line<'static>>,
    items: &[ListItem],
    ordered: bool,
    theme: &Theme,
    width: usize,
    highlight: Option<&str>,
) {
    let marker_style = Style::default().fg(theme.accent_secondary);
    let text_style = Style::default().fg(theme.fg_primary);

    for (i, item) in items.iter().enumerate() {
        let prefix = if ordered {
            let label = item.label.clone().unwrap_or_else(|| (i + 1).to_string());
            format!("  {label}. ")
        } else {
            "  • ".to_string()
        };
        // Continuation lines line up with the item text
        let indent = " ".repeat(prefix.chars().count());
        let spans = inline_spans(&item.text, text_style, theme, highlight);
        let wrapped = wrap_spans(spans, width.saturating_sub(prefix.chars().count()));

        for (j, line) in wrapped.into_iter().enumerate() {
            let lead = if j == 0 {
                Span::styled(prefix.clone(), marker_style)
            } else {
                Span::raw(indent.clone())
            };
            let mut line_spans = vec![lead];
            line_spans.extend(line.spans);
            lines.push(Line::from(line_spans));
        }
    }
    lines.push(Line::from(""));
}

fn render_blockquote(
    lines: &mut Vec<Line<'static>>,
    text: &str,
    theme: &Theme,
    width: usize,
    highlight: Option<&str>,
) {
    let prefix = "  │ ";
    let spans = inline_spans(text, Style::default().fg(theme.fg_muted), theme, highlight);
    let wrapped = wrap_spans(spans, width.saturating_sub(4));

    for line in wrapped {
        let mut line_spans = vec![Span::styled(prefix, Style::default().fg(theme.accent_primary))];
        line_spans.extend(line.spans);
        lines.push(Line::from(line_spans));
    }
}

fn render_task(
    lines: &mut Vec<Line<'static>>,
    text: &str,
    completed: bool,
    theme: &Theme,
    width: usize,
    highlight: Option<&str>,
) {
    let (marker, marker_style, text_style) = if completed {
        let done = theme.muted().add_modifier(Modifier::CROSSED_OUT);
        ("  ☑ ", Style::default().fg(theme.success), done)
    } else {
        ("  ☐ ", Style::default().fg(theme.fg_secondary), Style::default().fg(theme.fg_primary))
    };
    let spans = inline_spans(text, text_style, theme, highlight);

    for (i, line) in wrap_spans(spans, width.saturating_sub(4)).into_iter().enumerate() {
        let lead = if i == 0 { Span::styled(marker, marker_style) } else { Span::raw("    ") };
        let mut line_spans = vec![lead];
        line_spans.extend(line.spans);
        lines.push(Line::from(line_spans));
    }
}

fn render_horizontal_rule(lines: &mut Vec<Line<'static>>, theme: &Theme, width: usize) {
    let rule_width = width.saturating_sub(4).min(32);
    let rule = Span::styled("─".repeat(rule_width), Style::default().fg(theme.border));
    lines.push(Line::from(rule));
}

/// Column widths that fit `width`, squeezing wide columns proportionally
fn column_widths(rows: &[Vec<String>], num_cols: usize, width: usize) -> Vec<usize> {
    let mut natural = vec![1; num_cols];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            natural[i] = natural[i].max(cell.chars().count());
        }
    }

    let available = width.saturating_sub(COLUMN_GAP * num_cols).max(num_cols * MIN_COLUMN_WIDTH);
    let total: usize = natural.iter().sum();
    if total <= available {
        return natural;
    }
    natural.iter().map(|w| (w * available / total).max(MIN_COLUMN_WIDTH)).collect()
}

fn render_table(
    lines: &mut Vec<Line<'static>>,
    rows: &[Vec<String>],
    theme: &Theme,
    width: usize,
    term_re: Option<&Regex>,
) {
    let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if num_cols == 0 {
        return;
    }

    // Cells are shown without inline styling
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| plain_text(&docs::format_inline(cell))).collect())
        .collect();
    let col_widths = column_widths(&cells, num_cols, width);
    let mark = theme.mark();

    lines.push(Line::from(""));

    for (row_idx, row) in cells.iter().enumerate() {
        let is_header = row_idx == 0;
        let row_bg = if is_header {
            theme.accent_secondary
        } else if row_idx % 2 == 1 {
            theme.bg_secondary
        } else {
            theme.bg_primary
        };

        let wrapped_cells: Vec<Vec<String>> = (0..num_cols)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                wrap_cell_text(cell, col_widths[i])
            })
            .collect();
        let max_lines = wrapped_cells.iter().map(Vec::len).max().unwrap_or(1);

        for line_idx in 0..max_lines {
            let mut row_spans: Vec<Span<'static>> = Vec::new();

            for (col_idx, wrapped) in wrapped_cells.iter().enumerate() {
                let cell_line = wrapped.get(line_idx).map(String::as_str).unwrap_or("");
                let padded = pad_or_truncate(cell_line, col_widths[col_idx]);

                if col_idx > 0 {
                    let gap = Span::styled(" ".repeat(COLUMN_GAP), Style::default().bg(row_bg));
                    row_spans.push(gap);
                }

                let style = if is_header {
                    Style::default().fg(theme.bg_primary).bg(row_bg).add_modifier(Modifier::BOLD)
                } else if col_idx == 0 {
                    Style::default().fg(theme.accent_primary).bg(row_bg)
                } else {
                    Style::default().fg(theme.fg_primary).bg(row_bg)
                };

                row_spans.extend(mark_matches(vec![Span::styled(padded, style)], term_re, mark));
            }

            row_spans.push(Span::styled(" ".repeat(COLUMN_GAP), Style::default().bg(row_bg)));
            lines.push(Line::from(row_spans));
        }
    }

    lines.push(Line::from(""));
}

/// Pad string to width or truncate with ellipsis
fn pad_or_truncate(s: &str, width: usize) -> String {
    let char_count = s.chars().count();
    if char_count > width {
        let truncated: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    } else {
        format!("{:width$}", s, width = width)
    }
}

/// Wrap text to fit within a given width
fn wrap_cell_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    let wrapped: Vec<String> =
        textwrap::wrap(text, width).into_iter().map(|line| line.into_owned()).collect();
    if wrapped.is_empty() { vec![String::new()] } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::parse_blocks;
    use pretty_assertions::assert_eq;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn render(markdown: &str, highlight: Option<&str>) -> RenderedContent {
        render_blocks(&parse_blocks(markdown), &Theme::default(), 80, highlight)
    }

    #[test]
    fn help_keeps_vim_keys_in_their_own_group() {
        let text: Vec<String> = help_lines(&Theme::default()).iter().map(line_text).collect();
        let vim_heading = text.iter().position(|l| l == "Vim mode").unwrap();
        let row = |label: &str| text.iter().position(|l| l.trim_start().starts_with(label));

        assert!(row("Home / End").unwrap() < vim_heading);
        assert!(row("]").unwrap() < vim_heading);
        assert!(row("g / G").unwrap() > vim_heading);
        assert!(row("n / N").unwrap() > vim_heading);
    }

    #[test]
    fn pad_or_truncate_short() {
        assert_eq!(pad_or_truncate("hi", 5), "hi   ");
    }

    #[test]
    fn pad_or_truncate_exact() {
        assert_eq!(pad_or_truncate("hello", 5), "hello");
    }

    #[test]
    fn pad_or_truncate_long() {
        assert_eq!(pad_or_truncate("hello world", 5), "hell…");
    }

    #[test]
    fn wrap_cell_text_short() {
        assert_eq!(wrap_cell_text("short", 10), vec!["short"]);
    }

    #[test]
    fn wrap_cell_text_long() {
        let result = wrap_cell_text("this is a very long text", 10);
        assert!(result.len() > 1);
        assert!(result.iter().all(|line| line.chars().count() <= 10));
    }

    #[test]
    fn wrap_cell_text_empty() {
        assert_eq!(wrap_cell_text("", 10), vec![""]);
    }

    #[test]
    fn wrap_spans_keeps_styles_across_lines() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let spans = vec![Span::raw("one two "), Span::styled("three four", bold)];
        let lines = wrap_spans(spans, 10);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "one two ");
        assert_eq!(line_text(&lines[1]), "three four");
        assert_eq!(lines[1].spans[0].style, bold);
    }

    #[test]
    fn empty_document_renders_nothing() {
        let rendered = render("", None);
        assert!(rendered.lines.is_empty());
        assert!(rendered.anchors.is_empty());
    }

    #[test]
    fn anchors_point_at_heading_lines() {
        let rendered =
            render("# Guide\nIntro text\n\n## Setup Steps\nDo this\n### Details\n", None);
        let expected =
            [("guide", "Guide"), ("setup-steps", "Setup Steps"), ("details", "  Details")];
        for (id, text) in expected {
            let line = rendered.anchors[id];
            assert_eq!(line_text(&rendered.lines[line]), text);
        }
    }

    #[test]
    fn duplicate_heading_ids_keep_the_first_line() {
        let rendered = render("## FAQ\ntext\n## FAQ\n", None);
        assert_eq!(rendered.anchors["faq"], 0);
    }

    #[test]
    fn paragraph_highlight_is_marked() {
        let theme = Theme::default();
        let rendered = render("Say hello to the app", Some("HELLO"));
        let marked: Vec<_> = rendered.lines[0]
            .spans
            .iter()
            .filter(|s| s.style.bg == Some(theme.mark_bg))
            .map(|s| s.content.to_string())
            .collect();
        assert_eq!(marked, vec!["hello"]);
    }

    #[test]
    fn code_block_has_label_and_line_numbers() {
        let rendered = render("```json\n{\n  \"a\": 1\n}\n```", None);
        assert_eq!(line_text(&rendered.lines[0]), "┌─ json ─");
        assert_eq!(line_text(&rendered.lines[1]), "│ 1 {");
        assert_eq!(line_text(&rendered.lines[2]), "│ 2   \"a\": 1");
        assert!(line_text(&rendered.lines[4]).starts_with('└'));
    }

    #[test]
    fn code_highlight_marks_term() {
        let theme = Theme::default();
        let rendered = render("```\nnpm install bookhere\n```", Some("install"));
        let marked = rendered.lines[1].spans.iter().find(|s| s.style.bg == Some(theme.mark_bg));
        assert_eq!(marked.map(|s| s.content.as_ref()), Some("install"));
    }

    #[test]
    fn ordered_list_uses_source_labels() {
        let rendered = render("3. Third\n4. Fourth", None);
        assert_eq!(line_text(&rendered.lines[0]), "  3. Third");
        assert_eq!(line_text(&rendered.lines[1]), "  4. Fourth");
    }

    #[test]
    fn tasks_show_their_state() {
        let rendered = render("- [x] Done\n- [ ] Todo", None);
        assert_eq!(line_text(&rendered.lines[0]), "  ☑ Done");
        assert_eq!(line_text(&rendered.lines[1]), "  ☐ Todo");
    }

    #[test]
    fn table_rows_render_with_header() {
        let rendered = render("| Plan | Price |\n|---|---|\n| Basic | `$5` |", None);
        let header = line_text(&rendered.lines[1]);
        let row = line_text(&rendered.lines[2]);
        assert!(header.starts_with("Plan"));
        assert!(row.contains("Basic"));
        assert!(row.contains("$5"));
        assert!(!row.contains('`'));
    }

    #[test]
    fn spacers_do_not_stack() {
        let rendered = render("one\n\n\n\ntwo", None);
        let texts: Vec<String> = rendered.lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["one", "", "two"]);
    }

    #[test]
    fn column_widths_fit_available_space() {
        let rows = vec![vec!["a".repeat(60), "b".repeat(60)]];
        let widths = column_widths(&rows, 2, 50);
        assert!(widths.iter().sum::<usize>() <= 50);
        assert!(widths.iter().all(|w| *w >= MIN_COLUMN_WIDTH));
    }
}
