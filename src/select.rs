//! Picks the single text used for summarization out of the per-article
//! candidates.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Trailing "... 3241 chars" marker some APIs append to truncated content.
static CHARS_ARTIFACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4} chars$").unwrap());

/// Where a candidate text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Scraped,
    Description,
    ApiContent,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CandidateSource::Scraped => "scraped",
            CandidateSource::Description => "description",
            CandidateSource::ApiContent => "api_content",
        })
    }
}

/// The three labelled candidates for one article, in precedence order.
#[derive(Debug, Clone, Copy)]
pub struct Candidates<'a> {
    entries: [(CandidateSource, &'a str); 3],
}

impl<'a> Candidates<'a> {
    pub fn new(normalized_text: &'a str, description: &'a str, api_content: &'a str) -> Self {
        Self {
            entries: [
                (CandidateSource::Scraped, normalized_text),
                (CandidateSource::Description, description),
                (CandidateSource::ApiContent, api_content),
            ],
        }
    }

    /// The longest candidate by character count.
    ///
    /// A later candidate only wins when strictly longer, so ties go to the
    /// earlier entry.
    pub fn longest(&self) -> (CandidateSource, &'a str) {
        let mut best = self.entries[0];
        let mut best_len = best.1.chars().count();
        for entry in &self.entries[1..] {
            let len = entry.1.chars().count();
            if len > best_len {
                best = *entry;
                best_len = len;
            }
        }
        best
    }
}

/// Remove a trailing `<4 digits> chars` artifact if present.
pub fn strip_chars_artifact(text: &str) -> String {
    CHARS_ARTIFACT.replace(text, "").into_owned()
}

/// Choose the final text for an article.
pub fn select(normalized_text: &str, description: &str, api_content: &str) -> String {
    let (source, text) = Candidates::new(normalized_text, description, api_content).longest();
    tracing::debug!(%source, chars = text.chars().count(), "Selected candidate");
    strip_chars_artifact(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_longest() {
        assert_eq!(select("a", "bbb", "cc"), "bbb");
        assert_eq!(select("aaaa", "bbb", "cc"), "aaaa");
        assert_eq!(select("", "", "ccc"), "ccc");
    }

    #[test]
    fn test_tie_prefers_earlier_candidate() {
        assert_eq!(select("aaa", "bbb", "ccc"), "aaa");
        assert_eq!(select("a", "bbb", "ccc"), "bbb");
        assert_eq!(select("aaa", "b", "ccc"), "aaa");
    }

    #[test]
    fn test_all_empty() {
        assert_eq!(select("", "", ""), "");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // Four chars but eight bytes.
        assert_eq!(select("abc", "éééé", "abcde"), "abcde");
        assert_eq!(select("abcd", "ééé", ""), "abcd");
    }

    #[test]
    fn test_failed_scrape_falls_back_to_description() {
        assert_eq!(select("", "short desc", "12 chars"), "short desc");
    }

    #[test]
    fn test_strips_truncation_artifact() {
        assert_eq!(
            select("", "", "Officials said the talks would resume 3241 chars"),
            "Officials said the talks would resume "
        );
    }

    #[test]
    fn test_artifact_needs_four_digits_at_end() {
        assert_eq!(strip_chars_artifact("12 chars"), "12 chars");
        assert_eq!(strip_chars_artifact("1234 chars left"), "1234 chars left");
        assert_eq!(strip_chars_artifact("body 12345 chars"), "body 1");
    }

    #[test]
    fn test_longest_reports_source() {
        let (source, text) = Candidates::new("", "desc", "content!").longest();
        assert_eq!(source, CandidateSource::ApiContent);
        assert_eq!(text, "content!");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::cmp::Reverse;

        const SOURCES: [CandidateSource; 3] = [
            CandidateSource::Scraped,
            CandidateSource::Description,
            CandidateSource::ApiContent,
        ];

        /// Longest by character count; among equals, the lowest index.
        fn expected(texts: [&str; 3]) -> (CandidateSource, &str) {
            let best = (0..3)
                .max_by_key(|&i| (texts[i].chars().count(), Reverse(i)))
                .unwrap_or(0);
            (SOURCES[best], texts[best])
        }

        /// Short strings over a small alphabet so equal lengths come up often.
        fn candidate() -> impl Strategy<Value = String> {
            "[ab\u{00e9} ]{0,6}"
        }

        proptest! {
            #[test]
            fn longest_matches_max_by_char_count(
                a in candidate(),
                b in candidate(),
                c in candidate(),
            ) {
                let got = Candidates::new(&a, &b, &c).longest();
                prop_assert_eq!(got, expected([&a, &b, &c]));
            }

            #[test]
            fn longest_on_arbitrary_text(
                a in any::<String>(),
                b in any::<String>(),
                c in any::<String>(),
            ) {
                let got = Candidates::new(&a, &b, &c).longest();
                prop_assert_eq!(got, expected([&a, &b, &c]));
            }

            #[test]
            fn select_strips_artifact_from_the_longest(
                a in candidate(),
                b in candidate(),
                digits in 1000u32..10000,
            ) {
                let c = format!("{b}{b}{b} {digits} chars");
                let (_, longest) = expected([&a, &b, &c]);
                prop_assert_eq!(select(&a, &b, &c), strip_chars_artifact(longest));
            }
        }
    }
}
