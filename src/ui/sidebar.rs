//! Section navigation sidebar

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::state::{AppState, Focus};
use crate::theme::Theme;

/// Draw the section list
pub fn draw(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let focused = state.focus == Focus::Sidebar;
    let border_color = if focused { theme.border_focused } else { theme.border };

    let block = Block::default()
        .title(" Sections ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme.bg_primary));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Update visible height for scroll calculations
    state.sidebar.visible_height = inner.height as usize;

    let active = state.navigator.active();
    let lines: Vec<Line> = state
        .nav_entries
        .iter()
        .enumerate()
        .skip(state.sidebar.scroll_offset)
        .take(inner.height as usize)
        .map(|(i, entry)| {
            let is_selected = i == state.sidebar.selected_index;
            let is_active = active == Some(entry.key.as_str());
            let marker = if is_active { "▸ " } else { "  " };
            let indent = "  ".repeat(entry.depth as usize);

            let style = if is_selected && focused {
                Style::default()
                    .fg(theme.bg_primary)
                    .bg(theme.accent_primary)
                    .add_modifier(Modifier::BOLD)
            } else if is_active {
                Style::default().fg(theme.accent_secondary).add_modifier(Modifier::BOLD)
            } else if entry.depth == 0 {
                Style::default().fg(theme.fg_primary)
            } else {
                Style::default().fg(theme.fg_secondary)
            };

            Line::from(Span::styled(format!("{indent}{marker}{}", entry.title), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
