//! Heading text to anchor id conversion

/// Convert heading text into a lowercase, hyphenated anchor id.
///
/// Keeps ASCII letters and digits, whitespace and hyphens; everything else is
/// dropped, underscores and accented letters included (`snake_case` gives
/// `snakecase`, `Café` gives `caf`). Surrounding whitespace is trimmed and each inner whitespace run
/// becomes a single hyphen. Distinct headings can map to the same id and
/// collide; no suffixing is done.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Foo Bar"), "foo-bar");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(slugify("What's new in v2.1?"), "whats-new-in-v21");
    }

    #[test]
    fn collapses_whitespace_left_by_stripped_symbols() {
        assert_eq!(slugify("Installation & Setup"), "installation-setup");
    }

    #[test]
    fn keeps_existing_hyphens() {
        assert_eq!(slugify("Step-by-step guide"), "step-by-step-guide");
    }

    #[test]
    fn trims_before_hyphenating() {
        assert_eq!(slugify("   Padded Title \t"), "padded-title");
    }

    #[test]
    fn drops_underscores_and_non_ascii() {
        assert_eq!(slugify("snake_case Café"), "snakecase-caf");
    }

    #[test]
    fn empty_and_symbol_only_input() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("🚀 !!"), "");
    }

    #[test]
    fn identical_headings_collide() {
        assert_eq!(slugify("FAQ"), slugify("faq?"));
    }

    proptest! {
        #[test]
        fn slugify_is_idempotent(text in "\\PC*") {
            let once = slugify(&text);
            prop_assert_eq!(slugify(&once), once);
        }

        #[test]
        fn slug_alphabet_is_restricted(text in "\\PC*") {
            let slug = slugify(&text);
            prop_assert!(
                slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            );
        }
    }
}
