//! Character-ratio token estimation shared by every chunking call site.

/// Assumed characters per model token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Approximate token count: `ceil(chars / 4)`.
///
/// Counts Unicode scalar values, not bytes, so the estimate does not inflate
/// for non-ASCII text. Not a tokenizer; only consistency matters.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    estimate_tokens_for_chars(text.chars().count())
}

#[must_use]
pub fn estimate_tokens_for_chars(chars: usize) -> usize {
    chars.div_ceil(CHARS_PER_TOKEN)
}
