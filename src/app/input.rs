//! Key to action mapping

use crossterm::event::{KeyCode, KeyModifiers};

/// Keys that work with vim mode on or off
pub fn base_key_to_action(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::Down => Some(Action::Down),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Home => Some(Action::Top),
        KeyCode::End => Some(Action::Bottom),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Esc => Some(Action::Back),
        KeyCode::Tab => Some(Action::SwitchFocus),
        KeyCode::Char('/') => Some(Action::Search),
        KeyCode::Char(':') => Some(Action::Command),
        KeyCode::Char('?') => Some(Action::Help),
        // Panel toggles
        KeyCode::Char('[') => Some(Action::ToggleSidebar),
        KeyCode::Char('t') => Some(Action::ToggleToc),
        KeyCode::Char('a') => Some(Action::ToggleAssistant),
        // Section stepping
        KeyCode::Char(']') => Some(Action::NextSection),
        _ => None,
    }
}

/// Vim-style key mapping (basic, without modifiers)
pub fn vim_key_to_action(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::Char('j') => Some(Action::Down),
        KeyCode::Char('k') => Some(Action::Up),
        KeyCode::Char('g') => Some(Action::Top),
        KeyCode::Char('G') => Some(Action::Bottom),
        KeyCode::Char('d') => Some(Action::PageDown),
        KeyCode::Char('u') => Some(Action::PageUp),
        KeyCode::Char('n') => Some(Action::NextSection),
        KeyCode::Char('N') => Some(Action::PrevSection),
        _ => base_key_to_action(key),
    }
}

/// Key mapping with modifiers (for Ctrl combinations)
pub fn key_with_modifier_to_action(
    key: KeyCode,
    modifiers: KeyModifiers,
    vim_mode: bool,
) -> Option<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match key {
            KeyCode::Char('k') => Some(Action::Search),
            KeyCode::Char('d') => Some(Action::HalfPageDown),
            KeyCode::Char('u') => Some(Action::HalfPageUp),
            KeyCode::Char('f') => Some(Action::PageDown),
            KeyCode::Char('b') => Some(Action::PageUp),
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        }
    } else if vim_mode {
        vim_key_to_action(key)
    } else {
        base_key_to_action(key)
    }
}

/// Actions that can be taken in the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Navigation
    Up,
    Down,
    Top,
    Bottom,
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    NextSection,
    PrevSection,

    // Selection
    Select,
    Back,

    // Panels
    Search,
    ToggleSidebar,
    ToggleToc,
    ToggleAssistant,
    SwitchFocus,

    // Modes
    Command,
    Help,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vim_j_maps_to_down() {
        assert_eq!(vim_key_to_action(KeyCode::Char('j')), Some(Action::Down));
    }

    #[test]
    fn vim_k_maps_to_up() {
        assert_eq!(vim_key_to_action(KeyCode::Char('k')), Some(Action::Up));
    }

    #[test]
    fn unknown_key_returns_none() {
        assert_eq!(vim_key_to_action(KeyCode::Char('x')), None);
    }

    #[test]
    fn g_jumps_to_top() {
        assert_eq!(vim_key_to_action(KeyCode::Char('g')), Some(Action::Top));
        assert_eq!(vim_key_to_action(KeyCode::Home), Some(Action::Top));
    }

    #[test]
    fn slash_and_ctrl_k_open_search() {
        assert_eq!(vim_key_to_action(KeyCode::Char('/')), Some(Action::Search));
        assert_eq!(
            key_with_modifier_to_action(KeyCode::Char('k'), KeyModifiers::CONTROL, true),
            Some(Action::Search)
        );
    }

    #[test]
    fn panel_toggles() {
        assert_eq!(vim_key_to_action(KeyCode::Char('[')), Some(Action::ToggleSidebar));
        assert_eq!(vim_key_to_action(KeyCode::Char('t')), Some(Action::ToggleToc));
        assert_eq!(vim_key_to_action(KeyCode::Char('a')), Some(Action::ToggleAssistant));
        assert_eq!(vim_key_to_action(KeyCode::Esc), Some(Action::Back));
    }

    #[test]
    fn ctrl_d_half_page_down() {
        assert_eq!(
            key_with_modifier_to_action(KeyCode::Char('d'), KeyModifiers::CONTROL, true),
            Some(Action::HalfPageDown)
        );
    }

    #[test]
    fn letters_need_vim_mode() {
        assert_eq!(
            key_with_modifier_to_action(KeyCode::Char('j'), KeyModifiers::NONE, true),
            Some(Action::Down)
        );
        assert_eq!(
            key_with_modifier_to_action(KeyCode::Char('j'), KeyModifiers::NONE, false),
            None
        );
        assert_eq!(
            key_with_modifier_to_action(KeyCode::Down, KeyModifiers::NONE, false),
            Some(Action::Down)
        );
    }
}
