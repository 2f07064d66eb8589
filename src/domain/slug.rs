//! Permalink slugs derived from story titles.
//!
//! The rules are intentionally narrow: lowercase the title, keep ASCII word
//! characters, whitespace and hyphens, then fold whitespace runs and repeated
//! hyphens into a single `-`. Non-ASCII letters are dropped rather than
//! transliterated. Slugs are derived once, when a story is created, and are
//! not checked for uniqueness here.

use thiserror::Error;

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a URL-safe slug from the provided title.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    let lowered = input.to_lowercase();
    let trimmed = lowered.trim();
    if trimmed.is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let mut slug = String::with_capacity(trimmed.len());
    let mut in_whitespace = false;

    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if !is_slug_char(ch) {
            continue;
        }
        if in_whitespace {
            push_hyphen(&mut slug);
            in_whitespace = false;
        }
        if ch == '-' {
            push_hyphen(&mut slug);
        } else {
            slug.push(ch);
        }
    }
    if in_whitespace {
        push_hyphen(&mut slug);
    }

    if slug.is_empty() || slug == "-" {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(slug)
}

fn is_slug_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

fn push_hyphen(slug: &mut String) {
    if !slug.ends_with('-') {
        slug.push('-');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        assert_eq!(derive_slug("Alpha Trip").unwrap(), "alpha-trip");
        assert_eq!(derive_slug("  Beta   Market  ").unwrap(), "beta-market");
    }

    #[test]
    fn derive_slug_strips_punctuation() {
        assert_eq!(
            derive_slug("Coffee, Cards & Conversation!").unwrap(),
            "coffee-cards-conversation"
        );
        assert_eq!(derive_slug("It's 5 o'clock").unwrap(), "its-5-oclock");
    }

    #[test]
    fn derive_slug_collapses_repeated_hyphens() {
        assert_eq!(derive_slug("Before -- After").unwrap(), "before-after");
        assert_eq!(derive_slug("snake_case---title").unwrap(), "snake_case-title");
    }

    #[test]
    fn derive_slug_drops_non_ascii_letters() {
        assert_eq!(derive_slug("Café Olé").unwrap(), "caf-ol");
    }

    #[test]
    fn whitespace_left_behind_by_stripped_characters_becomes_a_hyphen() {
        // Trimming happens before punctuation is removed.
        assert_eq!(derive_slug("Market day !").unwrap(), "market-day-");
    }

    #[test]
    fn derive_slug_rejects_empty_and_symbol_only_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
        assert_eq!(
            derive_slug("!!!"),
            Err(SlugError::Unrepresentable {
                input: "!!!".to_string()
            })
        );
    }
}
