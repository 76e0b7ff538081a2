//! UI rendering components

pub mod assistant_panel;
pub mod command_line;
pub mod content;
pub mod layout;
pub mod markup;
pub mod search_panel;
pub mod sidebar;
pub mod toc;

use std::time::Instant;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::state::AppState;
use crate::assistant::AssistantModel;
use crate::theme::Theme;

/// Main draw function
pub fn draw(
    frame: &mut Frame,
    state: &mut AppState,
    theme: &Theme,
    model: AssistantModel,
    now: Instant,
) {
    let area = frame.area();
    frame.render_widget(Paragraph::new("").style(Style::default().bg(theme.bg_primary)), area);

    let areas = layout::screen_areas(area, &state.overlays);

    draw_header(frame, areas.header, state, theme);

    if let Some(sidebar_area) = areas.sidebar {
        sidebar::draw(frame, sidebar_area, state, theme);
    }

    // Highlight is only passed while it is live
    let highlight = state.navigator.highlight(now).map(str::to_string);
    content::draw(frame, areas.content, state, theme, highlight.as_deref());

    if let Some(toc_area) = areas.toc {
        toc::draw(frame, toc_area, state, theme);
    }

    draw_footer(frame, areas.footer, state, theme);
    command_line::draw(frame, areas.command_line, &state.command_line, theme);

    // Overlays, topmost last
    if state.overlays.search {
        search_panel::draw(frame, area, &state.search, theme);
    }
    if state.overlays.assistant {
        assistant_panel::draw(frame, area, &mut state.assistant, model, theme);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let mut spans = vec![Span::styled(
        format!(" {} Docs ", state.product),
        Style::default().fg(theme.bg_primary).bg(theme.accent_primary).add_modifier(Modifier::BOLD),
    )];
    if let Some(document) = &state.content.document {
        spans.push(Span::styled(format!("  {}", document.title), theme.heading(2)));
    }
    spans.push(Span::styled("   Ctrl+K search · a assistant · ? help", theme.muted()));
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg_secondary)),
        area,
    );
}

/// Reading progress and the heading at the top of the view
fn draw_footer(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let mut spans = Vec::new();

    if state.navigator.is_loading() {
        spans.push(Span::styled(" loading… ", Style::default().fg(theme.warning)));
    } else if state.content.document.is_some() {
        let percent = state.content.progress_percent();
        spans.push(Span::styled(format!(" {percent:>3}% "), Style::default().fg(theme.info)));
        spans.push(progress_bar(percent, 20, theme));

        let heading = state
            .content
            .active_heading()
            .and_then(|i| state.content.document.as_ref()?.headings.get(i));
        if let Some(heading) = heading {
            spans.push(Span::styled(format!("  § {}", heading.text), theme.muted()));
        }
    }

    if let Some(anchor) = state.navigator.pending_anchor() {
        spans.push(Span::styled(format!("  → #{anchor}"), theme.muted()));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg_secondary)),
        area,
    );
}

fn progress_bar(percent: u16, width: usize, theme: &Theme) -> Span<'static> {
    let filled = (percent as usize * width / 100).min(width);
    Span::styled(
        format!("{}{}", "━".repeat(filled), "─".repeat(width - filled)),
        Style::default().fg(theme.accent_secondary),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        let theme = Theme::default();
        assert_eq!(progress_bar(0, 10, &theme).content, "──────────");
        assert_eq!(progress_bar(50, 10, &theme).content, "━━━━━─────");
        assert_eq!(progress_bar(100, 10, &theme).content, "━━━━━━━━━━");
    }
}
