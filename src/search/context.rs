//! Case-insensitive occurrence finding and context windows.
//!
//! Offsets are measured in characters, never bytes, so that windows never
//! split a UTF-8 sequence. Lowercasing can change the length of a string
//! (`'İ'` lowercases to two characters), so matches are found in a lowered
//! copy of the page and mapped back to character positions in the original.
//!
//! Keywords, pages and index rows are all folded with [`fold_case`], which
//! lowers each character independently and treats final sigma `'ς'` as `'σ'`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Default number of context characters on each side of a match.
pub const CONTEXT_CHARS: usize = 150;

/// Fold one character for case-insensitive comparison.
fn fold_char(ch: char) -> impl Iterator<Item = char> {
    ch.to_lowercase().map(|lc| if lc == 'ς' { 'σ' } else { lc })
}

/// Fold `text` for case-insensitive comparison.
///
/// Unlike [`str::to_lowercase`] the result does not depend on a character's
/// position in a word, so `"ΔΡΟΜΟΣ"`, `"δρομος"` and `"δρομοσ"` all fold alike.
#[must_use]
pub fn fold_case(text: &str) -> String {
    if text.is_ascii() {
        return text.to_ascii_lowercase();
    }
    text.chars().flat_map(fold_char).collect()
}

/// A page lowered for matching, with a map back to original characters.
struct LoweredPage {
    lower: String,
    /// For every byte of `lower`, the index of the original character it came from.
    origin: Option<Vec<usize>>,
}

impl LoweredPage {
    fn new(page: &str) -> Self {
        if page.is_ascii() {
            return Self {
                lower: page.to_ascii_lowercase(),
                origin: None,
            };
        }

        let mut lower = String::with_capacity(page.len());
        let mut origin = Vec::with_capacity(page.len());
        for (idx, ch) in page.chars().enumerate() {
            for lc in fold_char(ch) {
                lower.push(lc);
                origin.extend(std::iter::repeat(idx).take(lc.len_utf8()));
            }
        }
        Self {
            lower,
            origin: Some(origin),
        }
    }

    fn char_at(&self, byte: usize) -> usize {
        match self.origin {
            Some(ref origin) => origin[byte],
            None => byte,
        }
    }
}

/// Every non-overlapping, case-insensitive occurrence of `needle` in `page`,
/// left to right, as character ranges of `page`.
///
/// `needle` must already be folded with [`fold_case`]. An empty needle matches nothing.
#[must_use]
pub fn find_matches(page: &str, needle: &str) -> Vec<Range<usize>> {
    if needle.is_empty() || page.is_empty() {
        return Vec::new();
    }

    let lowered = LoweredPage::new(page);
    lowered
        .lower
        .match_indices(needle)
        .map(|(byte, m)| {
            let start = lowered.char_at(byte);
            let end = lowered.char_at(byte + m.len() - 1) + 1;
            start..end
        })
        .collect()
}

/// A context window cut from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    /// The window text, trimmed
    pub text: String,
    /// Byte range of the match inside `text`
    pub highlight: Range<usize>,
}

/// Sizing rules for context windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Characters kept before the match start and after the match end
    pub chars: usize,
    /// Widen the window outwards to the nearest whitespace
    pub word_boundary: bool,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            chars: CONTEXT_CHARS,
            word_boundary: false,
        }
    }
}

impl ContextWindow {
    /// Create a window of `chars` characters per side.
    #[must_use]
    pub fn new(chars: usize, word_boundary: bool) -> Self {
        Self {
            chars,
            word_boundary,
        }
    }

    /// Cut the window around the character range `hit` of `page`.
    ///
    /// The window is truncated at the page boundaries, never padded. Out of
    /// range input is clamped rather than rejected.
    #[must_use]
    pub fn snippet(&self, page: &str, hit: Range<usize>) -> Snippet {
        let offsets: Vec<usize> = page
            .char_indices()
            .map(|(b, _)| b)
            .chain(std::iter::once(page.len()))
            .collect();
        let len = offsets.len() - 1;

        let hit_end = hit.end.min(len);
        let hit_start = hit.start.min(hit_end);

        let mut start = hit_start.saturating_sub(self.chars);
        let mut end = hit_end.saturating_add(self.chars).min(len);

        if self.word_boundary {
            let is_space = |i: usize| page[offsets[i]..].starts_with(char::is_whitespace);
            while start > 0 && !is_space(start - 1) {
                start -= 1;
            }
            while end < len && !is_space(end) {
                end += 1;
            }
        }

        let window = &page[offsets[start]..offsets[end]];
        let trimmed_front = window.len() - window.trim_start().len();
        let text = window.trim();

        let base = offsets[start] + trimmed_front;
        let hl_start = offsets[hit_start].saturating_sub(base).min(text.len());
        let hl_end = offsets[hit_end].saturating_sub(base).clamp(hl_start, text.len());

        Snippet {
            text: text.to_string(),
            highlight: hl_start..hl_end,
        }
    }
}
