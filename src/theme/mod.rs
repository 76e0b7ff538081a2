//! Color themes and the styles derived from them

mod tokyo_night;

pub use tokyo_night::TOKYO_NIGHT;

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// A color theme for the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,

    // Background colors
    pub bg_primary: Color,
    pub bg_secondary: Color,
    pub bg_tertiary: Color,

    // Foreground colors
    pub fg_primary: Color,
    pub fg_secondary: Color,
    pub fg_muted: Color,

    // Accent colors
    pub accent_primary: Color,
    pub accent_secondary: Color,

    // Semantic colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // Document markup
    pub link: Color,
    pub pill_bg: Color,
    pub mark_bg: Color,
    pub mark_fg: Color,
    pub code_inline: Color,

    // UI elements
    pub border: Color,
    pub border_focused: Color,
    pub selection: Color,
    pub cursor: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::tokyo_night()
    }
}

impl Theme {
    /// Look up a built-in theme by its display name
    pub fn by_name(name: &str) -> Option<Theme> {
        match name.to_lowercase().as_str() {
            "tokyo night" | "tokyo-night" | "tokyonight" => Some(Theme::tokyo_night()),
            _ => None,
        }
    }

    /// Heading style, strongest for level 1
    pub fn heading(&self, level: u8) -> Style {
        let color = match level {
            1 => self.accent_primary,
            2 => self.accent_secondary,
            3 => self.info,
            _ => self.fg_secondary,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Search term highlight
    pub fn mark(&self) -> Style {
        Style::default().fg(self.mark_fg).bg(self.mark_bg).add_modifier(Modifier::BOLD)
    }

    pub fn link_style(&self) -> Style {
        Style::default().fg(self.link).add_modifier(Modifier::UNDERLINED)
    }

    /// Breadcrumb pill such as a menu path
    pub fn pill(&self) -> Style {
        Style::default().fg(self.fg_secondary).bg(self.pill_bg)
    }

    pub fn inline_code(&self) -> Style {
        Style::default().fg(self.code_inline).bg(self.bg_secondary)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.fg_muted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_is_tokyo_night() {
        assert_eq!(Theme::default().name, "Tokyo Night");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(Theme::by_name("TOKYO NIGHT").is_some());
        assert!(Theme::by_name("Dracula").is_none());
    }

    #[test]
    fn headings_are_bold() {
        let theme = Theme::default();
        for level in 1..=6 {
            assert!(theme.heading(level).add_modifier.contains(Modifier::BOLD));
        }
        assert_ne!(theme.heading(1).fg, theme.heading(2).fg);
    }
}
