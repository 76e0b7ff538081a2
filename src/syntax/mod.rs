//! Syntax highlighting for fenced code blocks using syntect

use once_cell::sync::Lazy;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

use crate::theme::Theme;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// syntect theme whose token colors sit well on Tokyo Night
const SYNTECT_THEME: &str = "base16-ocean.dark";

/// Map fence tags used in the guides to syntect syntax names
fn normalize_language(lang: &str) -> &str {
    let base = lang.split(',').next().unwrap_or(lang).trim();

    match base.to_lowercase().as_str() {
        "js" | "javascript" | "jsx" => "JavaScript",
        "ts" | "typescript" | "tsx" => "JavaScript",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "xml" | "plist" => "XML",
        "html" | "htm" => "HTML",
        "css" => "CSS",
        "php" => "PHP",
        "java" => "Java",
        "kotlin" | "kt" | "gradle" | "groovy" => "Groovy",
        "swift" | "objc" | "objective-c" => "Objective-C",
        "rs" | "rust" => "Rust",
        "py" | "python" => "Python",
        "sh" | "bash" | "shell" | "zsh" | "console" => "Bourne Again Shell (bash)",
        "env" | "ini" | "properties" => "INI",
        "sql" => "SQL",
        "md" | "markdown" => "Markdown",
        "diff" | "patch" => "Diff",
        _ => base,
    }
}

fn find_syntax(language: Option<&str>) -> Option<&'static SyntaxReference> {
    let lang = language.filter(|lang| !lang.trim().is_empty())?;
    let name = normalize_language(lang);

    SYNTAX_SET
        .find_syntax_by_name(name)
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(&name.to_lowercase()))
        .or_else(|| SYNTAX_SET.find_syntax_by_token(lang))
}

pub fn is_language_supported(language: &str) -> bool {
    find_syntax(Some(language)).is_some()
}

/// Highlight a whole code block, one span list per line.
///
/// Unknown languages come back as plain text in the theme's code colors.
pub fn highlight_code(
    code: &str,
    language: Option<&str>,
    theme: &Theme,
) -> Vec<Vec<Span<'static>>> {
    let plain = Style::default().fg(theme.fg_primary).bg(theme.bg_secondary);

    let syntect_theme = THEME_SET.themes.get(SYNTECT_THEME);
    let (Some(syntax), Some(syntect_theme)) = (find_syntax(language), syntect_theme) else {
        return code.split('\n').map(|line| vec![Span::styled(line.to_string(), plain)]).collect();
    };

    let mut highlighter = HighlightLines::new(syntax, syntect_theme);
    code.split('\n')
        .map(|line| {
            // syntect's newline syntaxes expect the terminator to be present
            let with_newline = format!("{line}\n");
            match highlighter.highlight_line(&with_newline, &SYNTAX_SET) {
                Ok(ranges) => ranges
                    .into_iter()
                    .filter_map(|(style, text)| {
                        let text = text.trim_end_matches('\n');
                        (!text.is_empty())
                            .then(|| Span::styled(text.to_string(), to_style(style, theme)))
                    })
                    .collect(),
                Err(e) => {
                    tracing::debug!("Highlighting failed for {:?}: {}", language, e);
                    vec![Span::styled(line.to_string(), plain)]
                }
            }
        })
        .collect()
}

fn to_style(style: syntect::highlighting::Style, theme: &Theme) -> Style {
    let fg = style.foreground;
    let mut out = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)).bg(theme.bg_secondary);
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}
