/// Token used when a heading's text leaves nothing after cleaning.
pub const FALLBACK_SLUG: &str = "section";

/// Map arbitrary text to a URL-fragment-safe anchor.
///
/// The text is trimmed and lowercased, every whitespace run becomes a single
/// hyphen, and anything outside CJK unified ideographs, ASCII `a-z0-9` and `-`
/// is dropped. Never returns an empty string.
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut in_space = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        if is_slug_char(ch) {
            out.push(ch);
        }
    }

    if out.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        out
    }
}

/// Characters allowed in a slug.
pub fn is_slug_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ('\u{4e00}'..='\u{9fa5}').contains(&ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Intro"), "intro");
        assert_eq!(slugify("  Getting Started  "), "getting-started");
        assert_eq!(slugify("Tabs\tand\n\nnewlines"), "tabs-and-newlines");
    }

    #[test]
    fn test_slugify_strips_punctuation() {
        assert_eq!(slugify("What's new? (v2.0)"), "whats-new-v20");
        assert_eq!(slugify("C++ & Rust!"), "c--rust");
    }

    #[test]
    fn test_slugify_keeps_cjk() {
        assert_eq!(slugify("第一章 概述"), "第一章-概述");
        assert_eq!(slugify("安装 Guide"), "安装-guide");
    }

    #[test]
    fn test_slugify_drops_non_ascii_letters() {
        assert_eq!(slugify("Café"), "caf");
        assert_eq!(slugify("こんにちは"), FALLBACK_SLUG);
    }

    #[test]
    fn test_slugify_preserves_existing_hyphens() {
        assert_eq!(slugify("a - b"), "a---b");
        assert_eq!(slugify("pre-existing"), "pre-existing");
    }

    #[test]
    fn test_slugify_fallback() {
        assert_eq!(slugify(""), FALLBACK_SLUG);
        assert_eq!(slugify("   "), FALLBACK_SLUG);
        assert_eq!(slugify("!!!"), FALLBACK_SLUG);
    }

    proptest! {
        #[test]
        fn slug_is_never_empty(text in any::<String>()) {
            prop_assert!(!slugify(&text).is_empty());
        }

        #[test]
        fn slug_uses_only_permitted_chars(text in any::<String>()) {
            prop_assert!(slugify(&text).chars().all(is_slug_char));
        }

        #[test]
        fn slug_is_idempotent(text in any::<String>()) {
            let once = slugify(&text);
            prop_assert_eq!(slugify(&once), once);
        }
    }
}
