use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tokens::{estimate_tokens, estimate_tokens_for_chars};
use crate::types::TextChunk;

static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// A trimmed sentence and its byte span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl Sentence<'_> {
    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn word_len(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// How much trailing context to repeat at the start of the next chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapBudget {
    None,
    Words(usize),
    Chars(usize),
}

impl OverlapBudget {
    fn target(self) -> usize {
        match self {
            Self::None => 0,
            Self::Words(n) | Self::Chars(n) => n,
        }
    }

    fn measure(self, sentence: &Sentence<'_>) -> usize {
        match self {
            Self::None => 0,
            Self::Words(_) => sentence.word_len(),
            Self::Chars(_) => sentence.char_len(),
        }
    }
}

/// Split text after `.`, `!` or `?` followed by whitespace.
///
/// Punctuation stays with its sentence, surrounding whitespace is trimmed and
/// empty pieces are dropped. Abbreviations and decimals followed by a space
/// split too; only chunk placement depends on this.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut last = 0;

    for m in SENTENCE_END_RE.find_iter(text) {
        // the terminator is a single ASCII byte
        push_trimmed(&mut sentences, text, last..m.start() + 1);
        last = m.end();
    }
    push_trimmed(&mut sentences, text, last..text.len());

    sentences
}

fn push_trimmed<'a>(out: &mut Vec<Sentence<'a>>, text: &'a str, span: Range<usize>) {
    let raw = &text[span.clone()];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let start = span.start + (raw.len() - raw.trim_start().len());
    out.push(Sentence {
        text: trimmed,
        start,
        end: start + trimmed.len(),
    });
}

/// Pick trailing sentences until the budget is met or exceeded.
///
/// Returns a suffix of `preceding` in original order; all of it when there is
/// less content than the target.
#[must_use]
pub fn select_overlap<'s, 'a>(
    preceding: &'s [Sentence<'a>],
    budget: OverlapBudget,
) -> &'s [Sentence<'a>] {
    let target = budget.target();
    let mut start = preceding.len();
    let mut accumulated = 0;

    while start > 0 && accumulated < target {
        start -= 1;
        accumulated += budget.measure(&preceding[start]);
    }

    &preceding[start..]
}

/// Length of the sentences once joined with single spaces.
fn joined_chars(sentences: &[Sentence<'_>]) -> usize {
    let chars: usize = sentences.iter().map(Sentence::char_len).sum();
    chars + sentences.len().saturating_sub(1)
}

/// Greedy sentence packing. Each range indexes into `sentences`; consecutive
/// ranges may overlap by the selected context tail.
fn plan_chunks(
    sentences: &[Sentence<'_>],
    max_chunk_tokens: usize,
    overlap: OverlapBudget,
) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut buf_start = 0;
    let mut buf_chars = 0;

    for (i, sentence) in sentences.iter().enumerate() {
        let len = sentence.char_len();

        if i > buf_start && estimate_tokens_for_chars(buf_chars + 1 + len) > max_chunk_tokens {
            ranges.push(buf_start..i);

            let tail = select_overlap(&sentences[buf_start..i], overlap);
            let mut seed = i - tail.len();
            // overlap must not push the seeded chunk over budget on its own
            while seed < i
                && estimate_tokens_for_chars(joined_chars(&sentences[seed..i]) + 1 + len)
                    > max_chunk_tokens
            {
                seed += 1;
            }

            buf_start = seed;
            buf_chars = joined_chars(&sentences[seed..=i]);
            continue;
        }

        buf_chars = if i == buf_start {
            len
        } else {
            buf_chars + 1 + len
        };
    }

    if buf_start < sentences.len() {
        ranges.push(buf_start..sentences.len());
    }

    ranges
}

/// Split `text` into sentence-aligned chunks of at most `max_chunk_tokens`.
///
/// Text under the budget comes back as a single chunk spanning all of it. A
/// lone sentence larger than the budget gets a chunk of its own and is never
/// cut.
#[must_use]
pub fn chunk_text(text: &str, max_chunk_tokens: usize, overlap: OverlapBudget) -> Vec<TextChunk> {
    let total = estimate_tokens(text);
    if total <= max_chunk_tokens {
        return vec![TextChunk {
            index: 0,
            text: text.to_owned(),
            start_char: 0,
            end_char: text.len(),
            estimated_tokens: total,
        }];
    }

    let sentences = split_sentences(text);
    plan_chunks(&sentences, max_chunk_tokens, overlap)
        .into_iter()
        .enumerate()
        .map(|(index, range)| {
            let group = &sentences[range];
            let text = group.iter().map(|s| s.text).collect::<Vec<_>>().join(" ");
            TextChunk {
                index,
                estimated_tokens: estimate_tokens(&text),
                start_char: group.first().map_or(0, |s| s.start),
                end_char: group.last().map_or(0, |s| s.end),
                text,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(sentences: &[Sentence<'a>]) -> Vec<&'a str> {
        sentences.iter().map(|s| s.text).collect()
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let s = split_sentences("Is this a question? Yes it is! Done. ");
        assert_eq!(texts(&s), vec!["Is this a question?", "Yes it is!", "Done."]);
    }

    #[test]
    fn keeps_trailing_fragment() {
        let s = split_sentences("First one. trailing words");
        assert_eq!(texts(&s), vec!["First one.", "trailing words"]);
    }

    #[test]
    fn no_whitespace_after_period_does_not_split() {
        let s = split_sentences("Version 2.5 is out.Next");
        assert_eq!(texts(&s), vec!["Version 2.5 is out.Next"]);
    }

    #[test]
    fn newlines_count_as_whitespace() {
        let s = split_sentences("Line one.\n\nLine two.\tLine three.");
        assert_eq!(texts(&s), vec!["Line one.", "Line two.", "Line three."]);
    }

    #[test]
    fn abbreviation_is_split_heuristically() {
        let s = split_sentences("Ask Dr. Smith.");
        assert_eq!(texts(&s), vec!["Ask Dr.", "Smith."]);
    }

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\t ").is_empty());
        assert_eq!(split_sentences(". ").len(), 1);
    }

    #[test]
    fn sentence_spans_point_into_source() {
        let text = "  Alpha beta.   Gamma!  ";
        for s in split_sentences(text) {
            assert_eq!(&text[s.start..s.end], s.text);
        }
    }

    #[test]
    fn multibyte_text_spans_are_char_boundaries() {
        let text = "Привет мир. Как дела? Хорошо";
        let s = split_sentences(text);
        assert_eq!(s.len(), 3);
        for sentence in s {
            assert_eq!(&text[sentence.start..sentence.end], sentence.text);
        }
    }

    #[test]
    fn overlap_words_walks_backwards() {
        let text = "One two three. Four five. Six seven eight nine.";
        let s = split_sentences(text);
        let tail = select_overlap(&s, OverlapBudget::Words(5));
        assert_eq!(texts(tail), vec!["Four five.", "Six seven eight nine."]);
    }

    #[test]
    fn overlap_stops_once_target_met() {
        let s = split_sentences("Aaaa. Bbbb. Cccc.");
        let tail = select_overlap(&s, OverlapBudget::Chars(5));
        assert_eq!(texts(tail), vec!["Cccc."]);
    }

    #[test]
    fn overlap_returns_everything_when_short() {
        let s = split_sentences("A. B.");
        let tail = select_overlap(&s, OverlapBudget::Words(100));
        assert_eq!(tail.len(), 2);
    }

    #[test]
    fn overlap_none_or_zero_is_empty() {
        let s = split_sentences("A. B.");
        assert!(select_overlap(&s, OverlapBudget::None).is_empty());
        assert!(select_overlap(&s, OverlapBudget::Words(0)).is_empty());
        assert!(select_overlap(&[], OverlapBudget::Chars(10)).is_empty());
    }

    #[test]
    fn text_under_budget_is_single_chunk() {
        let text = "Short text. Still short.";
        let chunks = chunk_text(text, 1000, OverlapBudget::Words(10));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks[0].end_char, text.len());
        assert_eq!(chunks[0].end_char - chunks[0].start_char, chunks[0].text.len());
    }

    #[test]
    fn empty_text_is_single_empty_chunk() {
        let chunks = chunk_text("", 10, OverlapBudget::None);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.is_empty());
        assert_eq!(chunks[0].estimated_tokens, 0);
    }

    #[test]
    fn long_text_splits_at_sentence_boundaries() {
        let text = "Sentence number. Another one two. Third sentence. Fourth sentenc.";
        let chunks = chunk_text(text, 9, OverlapBudget::None);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Sentence number. Another one two.");
        assert_eq!(chunks[1].text, "Third sentence. Fourth sentenc.");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn overlap_repeats_previous_tail() {
        let text = "Alpha one. Bravo two. Charlie three. Delta four. Echo five.";
        let chunks = chunk_text(text, 10, OverlapBudget::Words(2));
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let prev_last = split_sentences(&pair[0].text).last().unwrap().text;
            assert!(
                pair[1].text.starts_with(prev_last),
                "{:?} should start with {prev_last:?}",
                pair[1].text
            );
        }
    }

    #[test]
    fn overlap_spans_start_inside_previous_chunk() {
        let text = "Alpha one. Bravo two. Charlie three. Delta four. Echo five.";
        let chunks = chunk_text(text, 10, OverlapBudget::Words(2));
        for pair in chunks.windows(2) {
            assert!(pair[1].start_char < pair[0].end_char);
            assert!(pair[1].end_char > pair[0].end_char);
        }
    }

    #[test]
    fn oversized_sentence_gets_own_chunk() {
        let giant = "word ".repeat(100).trim_end().to_owned() + ".";
        let text = format!("Tiny. {giant} Small tail.");
        let chunks = chunk_text(&text, 10, OverlapBudget::Words(3));
        assert!(chunks.iter().any(|c| c.text == giant));
        assert!(chunks.iter().any(|c| c.estimated_tokens > 10));
    }

    #[test]
    fn chunks_respect_budget_unless_single_sentence() {
        let text = "The mitochondria is the powerhouse of the cell. ".repeat(60);
        let chunks = chunk_text(&text, 50, OverlapBudget::Chars(60));
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.estimated_tokens <= 50, "chunk over budget: {chunk:?}");
        }
    }

    #[test]
    fn whitespace_only_over_budget_yields_no_chunks() {
        let text = " ".repeat(100);
        assert!(chunk_text(&text, 5, OverlapBudget::None).is_empty());
    }

    mod proptest_chunker {
        use super::*;
        use proptest::prelude::*;

        fn sentence_strategy() -> impl Strategy<Value = String> {
            ("[a-z]{1,12}( [a-z]{1,12}){0,8}", "[.!?]").prop_map(|(body, end)| body + &end)
        }

        fn text_strategy() -> impl Strategy<Value = String> {
            prop::collection::vec(sentence_strategy(), 1..60).prop_map(|s| s.join(" "))
        }

        fn overlap_strategy() -> impl Strategy<Value = OverlapBudget> {
            prop_oneof![
                Just(OverlapBudget::None),
                (0usize..30).prop_map(OverlapBudget::Words),
                (0usize..120).prop_map(OverlapBudget::Chars),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            #[test]
            fn split_never_panics(content in "\\PC{0,2000}") {
                let _ = split_sentences(&content);
            }

            #[test]
            fn chunk_never_panics(
                content in "\\PC{0,2000}",
                max in 0usize..200,
                overlap in overlap_strategy(),
            ) {
                let _ = chunk_text(&content, max, overlap);
            }

            #[test]
            fn ranges_cover_every_sentence(
                text in text_strategy(),
                max in 1usize..80,
                overlap in overlap_strategy(),
            ) {
                let sentences = split_sentences(&text);
                let ranges = plan_chunks(&sentences, max, overlap);

                prop_assert_eq!(ranges.first().map(|r| r.start), Some(0));
                prop_assert_eq!(ranges.last().map(|r| r.end), Some(sentences.len()));
                for pair in ranges.windows(2) {
                    // no gap between chunks
                    prop_assert!(pair[1].start <= pair[0].end);
                    // overlap never reaches before the previous chunk
                    prop_assert!(pair[1].start >= pair[0].start);
                    // every chunk brings new content
                    prop_assert!(pair[1].end > pair[0].end);
                }
            }

            #[test]
            fn indices_are_contiguous(
                text in text_strategy(),
                max in 1usize..80,
                overlap in overlap_strategy(),
            ) {
                let chunks = chunk_text(&text, max, overlap);
                for (i, chunk) in chunks.iter().enumerate() {
                    prop_assert_eq!(chunk.index, i);
                }
            }

            #[test]
            fn chunks_end_on_sentence_boundaries(
                text in text_strategy(),
                max in 1usize..80,
                overlap in overlap_strategy(),
            ) {
                let sentences = split_sentences(&text);
                let chunks = chunk_text(&text, max, overlap);
                for chunk in &chunks {
                    prop_assert!(sentences.iter().any(|s| s.end == chunk.end_char));
                    prop_assert!(sentences.iter().any(|s| s.start == chunk.start_char));
                    prop_assert!(chunk.text.ends_with(['.', '!', '?']));
                }
            }

            #[test]
            fn budget_holds_for_multi_sentence_chunks(
                text in text_strategy(),
                max in 1usize..80,
                overlap in overlap_strategy(),
            ) {
                for chunk in chunk_text(&text, max, overlap) {
                    if split_sentences(&chunk.text).len() > 1 {
                        prop_assert!(chunk.estimated_tokens <= max);
                    }
                }
            }

            #[test]
            fn no_sentence_is_dropped(
                text in text_strategy(),
                max in 1usize..80,
            ) {
                let chunks = chunk_text(&text, max, OverlapBudget::None);
                let rebuilt = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
                let original = split_sentences(&text).iter().map(|s| s.text).collect::<Vec<_>>().join(" ");
                prop_assert_eq!(rebuilt, original);
            }
        }
    }
}
