//! Table of contents for the active section

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::state::{AppState, Focus};
use crate::theme::Theme;

/// Draw the heading list, marking the one at the top of the view
pub fn draw(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let border = if state.focus == Focus::Toc { theme.border_focused } else { theme.border };
    let block = Block::default()
        .title(" On this page ")
        .title_bottom(Line::from(" [Enter] jump  [t] close ").centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme.bg_primary));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let headings = state.content.document.as_ref().map(|d| d.headings.as_slice()).unwrap_or(&[]);
    if headings.is_empty() {
        let msg = Paragraph::new("No headings").style(Style::default().fg(theme.fg_muted));
        frame.render_widget(msg, inner);
        return;
    }

    let active = state.content.active_heading();
    let visible = inner.height as usize;
    let start = state.toc.selected.saturating_sub(visible.saturating_sub(1));

    let lines: Vec<Line> = headings
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(i, heading)| {
            let indent = if heading.level == 3 { "  " } else { "" };
            let marker = if active == Some(i) { "● " } else { "  " };
            let style = if i == state.toc.selected {
                Style::default()
                    .fg(theme.bg_primary)
                    .bg(theme.accent_primary)
                    .add_modifier(Modifier::BOLD)
            } else if active == Some(i) {
                Style::default().fg(theme.accent_secondary)
            } else {
                Style::default().fg(theme.fg_secondary)
            };
            Line::from(Span::styled(format!("{marker}{indent}{}", heading.text), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
