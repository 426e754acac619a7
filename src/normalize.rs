//! Deterministic text cleaning applied to scraped and API-provided text.
//!
//! [`normalize`] is the full transform used for the main-content candidate,
//! [`normalize_raw`] stops after the ASCII filter and is used for the full
//! scraped body. [`clean_api_text`] is the stricter cleanup applied to the
//! title/description/content fields coming back from the search API.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_ASCII_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9a-zA-Z\s.?!]+").unwrap());
static NON_WORD_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.?!]").unwrap());
static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9a-zA-Z\s]+").unwrap());

/// Collapse every whitespace run into a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Whitespace collapse followed by the ASCII filter.
///
/// Keeps ASCII letters, digits, whitespace and `.?!`.
pub fn normalize_raw(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    NON_ASCII_TEXT.replace_all(&collapsed, "").into_owned()
}

/// Full normalization: [`normalize_raw`] followed by the word-character filter.
///
/// The word filter is a no-op once the ASCII filter ran; it is kept so the
/// result is stable whichever filter a caller applied first. Removing
/// characters can leave two spaces side by side (`"a @ b"`), so whitespace is
/// collapsed once more at the end, which makes the transform idempotent.
pub fn normalize(text: &str) -> String {
    let filtered = normalize_raw(text);
    let filtered = NON_WORD_TEXT.replace_all(&filtered, "");
    collapse_whitespace(&filtered)
}

/// Cleanup for fields returned by the search API.
///
/// Newlines become spaces, whitespace is collapsed and everything that is not
/// an ASCII letter, digit or whitespace is dropped (punctuation included).
pub fn clean_api_text(text: &str) -> String {
    let collapsed = collapse_whitespace(&text.replace('\n', " "));
    NON_ALNUM.replace_all(&collapsed, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize_raw(""), "");
        assert_eq!(clean_api_text(""), "");
    }

    #[test]
    fn test_only_disallowed_characters() {
        assert_eq!(normalize("@#$%^&*()"), "");
        assert_eq!(normalize("“—”"), "");
    }

    #[test]
    fn test_collapses_whitespace_and_newlines() {
        assert_eq!(
            normalize("  Breaking\n\nnews:\tmarkets   rally!  "),
            "Breaking news markets rally!"
        );
    }

    #[test]
    fn test_keeps_sentence_punctuation() {
        assert_eq!(normalize("Is it over? Yes. Finally!"), "Is it over? Yes. Finally!");
    }

    #[test]
    fn test_drops_non_ascii_letters() {
        assert_eq!(normalize("Café déjà vu."), "Caf dj vu.");
    }

    #[test]
    fn test_raw_keeps_gaps_left_by_removed_characters() {
        assert_eq!(normalize_raw("a @ b"), "a  b");
        assert_eq!(normalize("a @ b"), "a b");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "plain text",
            "a @ b",
            "@ leading symbol",
            "trailing symbol @",
            "Mixed\u{00a0}spaces\u{2003}and\ttabs",
            "It's 10:30 — the \"quote\" (aside) [link] ends here...",
            "Ünïcödé wörds ünder_scores",
            "??!!..",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_clean_api_text_drops_punctuation() {
        assert_eq!(
            clean_api_text("Stocks fell 3%\non Monday, analysts said."),
            "Stocks fell 3 on Monday analysts said"
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Text heavy in the characters the filters care about.
        fn newsy_text() -> impl Strategy<Value = String> {
            "[a-zA-Z0-9 .?!,;:'\"@#%&()\u{00a0}\u{2014}\u{201c}\u{201d}\u{00e9}\u{4e2d}\t\n_-]{0,80}"
        }

        fn allowed(c: char) -> bool {
            c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '?' | '!')
        }

        proptest! {
            #[test]
            fn normalize_is_idempotent(text in any::<String>()) {
                let once = normalize(&text);
                prop_assert_eq!(normalize(&once), once);
            }

            #[test]
            fn normalize_is_idempotent_on_punctuated_text(text in newsy_text()) {
                let once = normalize(&text);
                prop_assert_eq!(normalize(&once), once);
            }

            #[test]
            fn normalize_keeps_only_allowed_characters(text in newsy_text()) {
                let out = normalize(&text);
                prop_assert!(out.chars().all(allowed), "unexpected character in {:?}", out);
                prop_assert!(!out.contains("  "));
                prop_assert_eq!(out.trim(), out.as_str());
            }

            #[test]
            fn normalize_raw_output_is_ascii(text in any::<String>()) {
                let out = normalize_raw(&text);
                prop_assert!(out.chars().all(allowed));
                prop_assert_eq!(normalize(&out), normalize(&text));
            }
        }
    }
}
