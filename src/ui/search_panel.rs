//! Search overlay

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::command_line::build_line_with_cursor;
use super::layout::centered_rect;
use crate::app::state::SearchPanelState;
use crate::theme::Theme;

/// Draw the query box and result list as a centered overlay
pub fn draw(frame: &mut Frame, area: Rect, search: &SearchPanelState, theme: &Theme) {
    let overlay_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, overlay_area);

    let title = match search.hits.len() {
        0 if search.query.is_empty() => " Search ".to_string(),
        n => format!(" Search ({n} results) "),
    };
    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(" [↑/↓] select  [Enter] open  [Esc] close ").centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().bg(theme.bg_secondary));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let [query_area, _, results_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1), Constraint::Min(1)])
            .areas(inner);

    let prompt = format!("› {}", search.query.as_str());
    let query_line = build_line_with_cursor(
        &prompt,
        search.query.cursor() + 2,
        Style::default().fg(theme.fg_primary),
        theme,
    );
    frame.render_widget(Paragraph::new(query_line), query_area);

    if search.hits.is_empty() {
        let msg = if search.query.is_empty() { "Type to search" } else { "No matches" };
        frame.render_widget(Paragraph::new(msg).style(theme.muted()), results_area);
        return;
    }

    let visible = results_area.height as usize;
    let start = search.selected.saturating_sub(visible.saturating_sub(1));
    let lines: Vec<Line> = search
        .hits
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(i, hit)| {
            let selected = i == search.selected;
            let title_style = if selected {
                Style::default()
                    .fg(theme.bg_primary)
                    .bg(theme.accent_primary)
                    .add_modifier(Modifier::BOLD)
            } else if hit.parent.is_some() {
                Style::default().fg(theme.fg_secondary)
            } else {
                Style::default().fg(theme.fg_primary).add_modifier(Modifier::BOLD)
            };
            match &hit.parent {
                Some(parent) => Line::from(vec![
                    Span::styled(format!("    {}", hit.title), title_style),
                    Span::styled(format!("  {parent}"), theme.muted()),
                ]),
                None => Line::from(Span::styled(format!("  {}", hit.title), title_style)),
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), results_area);
}
