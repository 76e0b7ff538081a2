//! Command line UI component

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::state::{CommandLineState, CommandMode};
use crate::theme::Theme;

/// Draw the command line at the bottom of the screen
pub fn draw(frame: &mut Frame, area: Rect, state: &CommandLineState, theme: &Theme) {
    let (text, style) = match state.mode {
        CommandMode::Normal => {
            if let Some(ref msg) = state.message {
                let style = if state.is_error {
                    Style::default().fg(theme.error)
                } else {
                    Style::default().fg(theme.fg_muted)
                };
                (msg.clone(), style)
            } else {
                (
                    String::from("Press : for commands, / or Ctrl+K to search, ? for help"),
                    Style::default().fg(theme.fg_muted),
                )
            }
        }
        CommandMode::Command => (state.display_text(), Style::default().fg(theme.accent_primary)),
    };

    let line = if state.is_input_mode() {
        build_line_with_cursor(&text, state.input.cursor() + 1, style, theme) // +1 for prefix
    } else {
        Line::from(Span::styled(text, style))
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Build a line with a visible cursor at character `cursor_pos`
pub fn build_line_with_cursor(
    text: &str,
    cursor_pos: usize,
    base_style: Style,
    theme: &Theme,
) -> Line<'static> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();

    if cursor_pos > 0 {
        let before: String = chars.iter().take(cursor_pos).collect();
        spans.push(Span::styled(before, base_style));
    }

    // Cursor character (or space if at end)
    let cursor_char = chars.get(cursor_pos).copied().unwrap_or(' ');
    let cursor_style =
        Style::default().fg(theme.bg_primary).bg(theme.fg_primary).add_modifier(Modifier::BOLD);
    spans.push(Span::styled(cursor_char.to_string(), cursor_style));

    if cursor_pos + 1 < chars.len() {
        let after: String = chars.iter().skip(cursor_pos + 1).collect();
        spans.push(Span::styled(after, base_style));
    }

    Line::from(spans)
}
