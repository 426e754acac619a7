//! Sentence segmentation and lede extraction.

use itertools::Itertools;
use unicode_segmentation::UnicodeSegmentation;

/// Number of leading sentences kept as the main-content candidate.
pub const MAIN_CONTENT_SENTENCES: usize = 4;

/// Splits text into an ordered sequence of sentences.
pub trait SentenceSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// UAX #29 sentence boundaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeSentences;

impl SentenceSegmenter for UnicodeSentences {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.unicode_sentences()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// First `max_sentences` sentences of `text`, joined by single spaces.
///
/// Scraped pages tend to carry navigation and related-story boilerplate after
/// the lede, so only the opening sentences are kept.
pub fn main_content<S: SentenceSegmenter + ?Sized>(
    segmenter: &S,
    text: &str,
    max_sentences: usize,
) -> String {
    segmenter
        .segment(text)
        .into_iter()
        .take(max_sentences)
        .join(" ")
}
