//! Screen layout

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::app::navigation::Overlays;

/// Minimum width for the sidebar
const SIDEBAR_MIN_WIDTH: u16 = 22;

/// Minimum width for the table of contents
const TOC_MIN_WIDTH: u16 = 24;

/// Areas of the main screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenAreas {
    pub header: Rect,
    pub sidebar: Option<Rect>,
    pub content: Rect,
    pub toc: Option<Rect>,
    pub footer: Rect,
    pub command_line: Rect,
}

/// Split the screen into header, panels, footer and command line
pub fn screen_areas(area: Rect, overlays: &Overlays) -> ScreenAreas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let mut constraints = Vec::new();
    if overlays.sidebar {
        constraints.push(Constraint::Length((area.width / 5).max(SIDEBAR_MIN_WIDTH)));
    }
    constraints.push(Constraint::Min(30));
    if overlays.toc {
        constraints.push(Constraint::Length((area.width / 5).max(TOC_MIN_WIDTH)));
    }
    let columns =
        Layout::default().direction(Direction::Horizontal).constraints(constraints).split(rows[1]);

    let content_index = usize::from(overlays.sidebar);
    let sidebar = overlays.sidebar.then(|| columns[0]);
    let content = columns[content_index];
    let toc = overlays.toc.then(|| columns[content_index + 1]);

    ScreenAreas { header: rows[0], sidebar, content, toc, footer: rows[2], command_line: rows[3] }
}

/// Create a centered rectangle with the given percentage of width and height
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_with_all_panels() {
        let area = Rect::new(0, 0, 120, 40);
        let overlays = Overlays { sidebar: true, toc: true, ..Default::default() };
        let areas = screen_areas(area, &overlays);
        assert!(areas.sidebar.is_some());
        assert!(areas.toc.is_some());
        assert_eq!(areas.header.height, 1);
        assert_eq!(areas.command_line.y, 39);
        assert_eq!(areas.content.height, 37);
    }

    #[test]
    fn layout_with_content_only() {
        let area = Rect::new(0, 0, 80, 40);
        let areas = screen_areas(area, &Overlays::default());
        assert_eq!(areas.sidebar, None);
        assert_eq!(areas.toc, None);
        assert_eq!(areas.content.width, 80);
    }

    #[test]
    fn toc_sits_right_of_content() {
        let area = Rect::new(0, 0, 100, 30);
        let overlays = Overlays { toc: true, ..Default::default() };
        let areas = screen_areas(area, &overlays);
        let toc = areas.toc.unwrap();
        assert_eq!(areas.content.x, 0);
        assert!(toc.x >= areas.content.x + areas.content.width);
    }

    #[test]
    fn centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 50, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.x, 20);
        assert!(inner.y + inner.height <= outer.height);
    }
}
