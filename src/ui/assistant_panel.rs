//! Assistant chat overlay

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::command_line::build_line_with_cursor;
use super::content::render_blocks;
use super::layout::centered_rect;
use crate::app::state::AssistantState;
use crate::assistant::{AssistantModel, Message, Role};
use crate::docs::parse_blocks;
use crate::theme::Theme;

/// Draw the transcript and question box as a centered overlay
pub fn draw(
    frame: &mut Frame,
    area: Rect,
    assistant: &mut AssistantState,
    model: AssistantModel,
    theme: &Theme,
) {
    let overlay_area = centered_rect(80, 80, area);
    frame.render_widget(Clear, overlay_area);

    let title = if assistant.streaming {
        format!(" Assistant · {} (answering...) ", model.display_name())
    } else {
        format!(" Assistant · {} ", model.display_name())
    };
    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(" [Enter] ask  [↑/↓] scroll  [Esc] close ").centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().bg(theme.bg_secondary));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let [transcript_area, separator_area, input_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
            .areas(inner);

    let width = transcript_area.width.saturating_sub(1) as usize;
    let lines = transcript_lines(assistant, width, theme);

    // Offset counts lines up from the newest message
    let visible = transcript_area.height as usize;
    let max_offset = lines.len().saturating_sub(visible);
    assistant.scroll_offset = assistant.scroll_offset.min(max_offset);
    let top = max_offset - assistant.scroll_offset;

    let visible_lines: Vec<Line> = lines.into_iter().skip(top).take(visible).collect();
    frame.render_widget(Paragraph::new(visible_lines), transcript_area);

    if max_offset > 0 {
        draw_scroll_indicator(frame, transcript_area, top, max_offset, theme);
    }

    let separator = "─".repeat(separator_area.width as usize);
    frame.render_widget(
        Paragraph::new(separator).style(Style::default().fg(theme.border)),
        separator_area,
    );

    let prompt = format!("› {}", assistant.input.as_str());
    let input_line = build_line_with_cursor(
        &prompt,
        assistant.input.cursor() + 2,
        Style::default().fg(theme.fg_primary),
        theme,
    );
    frame.render_widget(Paragraph::new(input_line), input_area);
}

/// Every message as display lines, with the answer in progress last
fn transcript_lines(assistant: &AssistantState, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in &assistant.messages {
        push_message(&mut lines, message, width, theme);
    }
    if assistant.streaming {
        let partial = if assistant.stream_buffer.is_empty() {
            "…".to_string()
        } else {
            assistant.stream_buffer.clone()
        };
        push_message(&mut lines, &Message::assistant(partial), width, theme);
    }
    lines
}

fn push_message(lines: &mut Vec<Line<'static>>, message: &Message, width: usize, theme: &Theme) {
    let (label, label_style) = match message.role {
        Role::User => ("You", Style::default().fg(theme.accent_secondary)),
        Role::Assistant => ("Assistant", Style::default().fg(theme.accent_primary)),
    };
    lines.push(Line::from(Span::styled(label, label_style.add_modifier(Modifier::BOLD))));

    match message.role {
        Role::User => {
            let style = Style::default().fg(theme.fg_primary);
            for line in textwrap::wrap(&message.content, width.max(1)) {
                lines.push(Line::from(Span::styled(line.into_owned(), style)));
            }
        }
        // Answers are Markdown
        Role::Assistant => {
            let rendered = render_blocks(&parse_blocks(&message.content), theme, width, None);
            lines.extend(rendered.lines);
        }
    }
    lines.push(Line::from(""));
}

/// Draw scroll indicator on the right side
fn draw_scroll_indicator(frame: &mut Frame, area: Rect, top: usize, max_top: usize, theme: &Theme) {
    if area.height < 3 || max_top == 0 {
        return;
    }

    let track_height = area.height.saturating_sub(2) as usize;
    let thumb_pos = (top * track_height) / max_top;

    let thumb_y = area.y + 1 + thumb_pos as u16;
    let thumb_x = area.x + area.width - 1;

    if thumb_y < area.y + area.height - 1 {
        let thumb = Paragraph::new("█").style(Style::default().fg(theme.fg_muted));
        frame.render_widget(thumb, Rect::new(thumb_x, thumb_y, 1, 1));
    }
}
