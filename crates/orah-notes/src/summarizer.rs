use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use orah_llm::{ChatOptions, LlmError, LlmProvider, Message};
use tokio::sync::Semaphore;

use crate::types::{ChunkSummary, DocumentChunk, SummaryKind};

/// Appended to the local fallback when a chunk could not be summarized.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated due to length]";

const SYSTEM_PROMPT: &str = "You condense course material for a student preparing for exams. \
Keep every definition, formula, date, name, example and worked step that could appear on an \
exam. Drop filler, repetition and digressions. Write plain prose or short bullet points, keep \
the original terminology, and aim for roughly 20-30% of the original length. Do not add \
information that is not in the text.";

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Maximum outbound calls in flight.
    pub concurrency: usize,
    pub call_timeout: Duration,
    pub temperature: f32,
    /// Characters of the original chunk kept when a call fails.
    pub fallback_chars: usize,
    pub max_response_tokens: u32,
    pub min_response_tokens: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            call_timeout: Duration::from_secs(60),
            temperature: 0.3,
            fallback_chars: 5000,
            max_response_tokens: 4000,
            min_response_tokens: 0,
        }
    }
}

/// Summarizes chunks through an [`LlmProvider`] with bounded concurrency.
///
/// Calls run as futures on the caller's task; a semaphore caps how many are
/// waiting on the provider at once. Any call that does not yield a summary
/// degrades that chunk alone to a truncated copy of its text.
pub struct ChunkSummarizer<P> {
    provider: P,
    config: SummarizerConfig,
}

impl<P: LlmProvider> ChunkSummarizer<P> {
    #[must_use]
    pub fn new(provider: P, config: SummarizerConfig) -> Self {
        Self { provider, config }
    }

    /// Summarize every chunk; output is ordered by position in `chunks`.
    pub async fn summarize(&self, chunks: &[DocumentChunk], topic: &str) -> Vec<ChunkSummary> {
        let total = chunks.len();
        let semaphore = Semaphore::new(self.config.concurrency.max(1));

        let mut pending: FuturesUnordered<_> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| {
                let semaphore = &semaphore;
                async move {
                    // never closed, so acquire cannot fail
                    let _permit = semaphore.acquire().await.ok();
                    self.summarize_one(index, total, chunk, topic).await
                }
            })
            .collect();

        let mut slots: Vec<Option<ChunkSummary>> = vec![None; total];
        while let Some(summary) = pending.next().await {
            let index = summary.chunk_index;
            slots[index] = Some(summary);
        }

        slots.into_iter().flatten().collect()
    }

    async fn summarize_one(
        &self,
        index: usize,
        total: usize,
        chunk: &DocumentChunk,
        topic: &str,
    ) -> ChunkSummary {
        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(build_prompt(chunk, topic, index, total)),
        ];
        let options = ChatOptions::default()
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.response_budget(chunk.chunk.estimated_tokens));

        let result = tokio::time::timeout(
            self.config.call_timeout,
            self.provider.chat(&messages, &options),
        )
        .await
        .unwrap_or_else(|_| Err(LlmError::Timeout(self.config.call_timeout.as_secs())));

        let (summary_text, kind) = match result {
            Ok(text) => {
                tracing::debug!(
                    chunk_index = index,
                    document = %chunk.document_name,
                    input_tokens = chunk.chunk.estimated_tokens,
                    output_chars = text.len(),
                    "chunk summarized"
                );
                (text.trim().to_owned(), SummaryKind::Summarized)
            }
            Err(e) => {
                tracing::warn!(
                    chunk_index = index,
                    document = %chunk.document_name,
                    provider = self.provider.name(),
                    "chunk summarization failed, using truncated text: {e}"
                );
                (
                    truncate_with_marker(&chunk.chunk.text, self.config.fallback_chars),
                    SummaryKind::Truncated,
                )
            }
        };

        ChunkSummary {
            chunk_index: index,
            document_name: chunk.document_name.clone(),
            part: chunk.part,
            parts: chunk.parts,
            summary_text,
            kind,
        }
    }

    /// About 30% of the input, capped at `max_response_tokens`.
    fn response_budget(&self, input_tokens: usize) -> u32 {
        let target = u32::try_from((input_tokens * 3).div_ceil(10)).unwrap_or(u32::MAX);
        target
            .max(self.config.min_response_tokens)
            .min(self.config.max_response_tokens)
    }
}

fn build_prompt(chunk: &DocumentChunk, topic: &str, index: usize, total: usize) -> String {
    format!(
        "Topic: {topic}\n\
         Source: {name} (part {part} of {parts}; section {section} of {total} overall)\n\n\
         Condense the following material, keeping everything relevant to the topic:\n\n{text}",
        name = chunk.document_name,
        part = chunk.part + 1,
        parts = chunk.parts,
        section = index + 1,
        text = chunk.chunk.text,
    )
}

/// First `max_chars` characters of `text` followed by [`TRUNCATION_MARKER`].
#[must_use]
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use orah_llm::mock::MockProvider;

    use super::*;
    use crate::types::TextChunk;

    fn doc_chunk(name: &str, part: usize, parts: usize, text: &str) -> DocumentChunk {
        DocumentChunk {
            document_name: name.into(),
            part,
            parts,
            chunk: TextChunk {
                index: part,
                text: text.into(),
                start_char: 0,
                end_char: text.len(),
                estimated_tokens: crate::tokens::estimate_tokens(text),
            },
        }
    }

    fn six_chunks() -> Vec<DocumentChunk> {
        (0..6)
            .map(|i| doc_chunk("Lecture", i, 6, &format!("CHUNK-{i} body text.")))
            .collect()
    }

    /// Echo the chunk marker found in the prompt so results can be traced back.
    fn echo_marker(messages: &[Message]) -> String {
        let prompt = &messages.last().unwrap().content;
        let start = prompt.find("CHUNK-").unwrap();
        format!("summary of {}", &prompt[start..start + 7])
    }

    #[test]
    fn truncate_keeps_prefix_and_marker() {
        let out = truncate_with_marker("abcdef", 3);
        assert_eq!(out, format!("abc{TRUNCATION_MARKER}"));
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let out = truncate_with_marker("ééééé", 2);
        assert!(out.starts_with("éé"));
        assert!(!out.starts_with("ééé"));
    }

    #[test]
    fn truncate_short_text_kept_whole() {
        let out = truncate_with_marker("short", 5000);
        assert_eq!(out, format!("short{TRUNCATION_MARKER}"));
    }

    #[test]
    fn response_budget_is_clamped() {
        let s = ChunkSummarizer::new(MockProvider::default(), SummarizerConfig::default());
        assert_eq!(s.response_budget(0), 0);
        assert_eq!(s.response_budget(3), 1);
        assert_eq!(s.response_budget(100), 30);
        assert_eq!(s.response_budget(10_000), 3000);
        assert_eq!(s.response_budget(20_000), 4000);
        assert_eq!(s.response_budget(usize::MAX / 4), 4000);
    }

    #[test]
    fn prompt_carries_position_metadata() {
        let chunk = doc_chunk("Syllabus", 1, 3, "Body.");
        let prompt = build_prompt(&chunk, "Cell biology", 4, 9);
        assert!(prompt.contains("Topic: Cell biology"));
        assert!(prompt.contains("Syllabus (part 2 of 3; section 5 of 9 overall)"));
        assert!(prompt.ends_with("Body."));
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let mock = MockProvider::default();
        let s = ChunkSummarizer::new(mock.clone(), SummarizerConfig::default());
        assert!(s.summarize(&[], "topic").await.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn configured_floor_applies_to_small_chunks() {
        let s = ChunkSummarizer::new(
            MockProvider::default(),
            SummarizerConfig {
                min_response_tokens: 64,
                ..SummarizerConfig::default()
            },
        );
        assert_eq!(s.response_budget(3), 64);
        assert_eq!(s.response_budget(1000), 300);
    }

    #[tokio::test]
    async fn small_chunk_requests_proportional_budget() {
        let mock = MockProvider::default();
        let s = ChunkSummarizer::new(mock.clone(), SummarizerConfig::default());
        // 12 chars, 3 tokens
        s.summarize(&[doc_chunk("A", 0, 1, "Tiny remark.")], "t").await;
        assert_eq!(mock.requests()[0].1.max_tokens, Some(1));
    }

    #[tokio::test]
    async fn request_uses_fixed_temperature_and_budget() {
        let mock = MockProvider::default();
        let s = ChunkSummarizer::new(mock.clone(), SummarizerConfig::default());
        s.summarize(&[doc_chunk("A", 0, 1, &"x".repeat(40_000))], "t")
            .await;

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        let (messages, options) = &requests[0];
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.max_tokens, Some(3000));
    }

    #[tokio::test]
    async fn order_preserved_when_later_calls_finish_first() {
        // the first three chunks are slow, the last three fast
        let mock = MockProvider::default()
            .with_responder(echo_marker)
            .delay_when_contains("CHUNK-0", 60)
            .delay_when_contains("CHUNK-1", 50)
            .delay_when_contains("CHUNK-2", 40)
            .with_delay(1);
        let s = ChunkSummarizer::new(
            mock,
            SummarizerConfig {
                concurrency: 6,
                ..SummarizerConfig::default()
            },
        );

        let out = s.summarize(&six_chunks(), "topic").await;

        let indices: Vec<usize> = out.iter().map(|s| s.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        for (i, summary) in out.iter().enumerate() {
            assert_eq!(summary.summary_text, format!("summary of CHUNK-{i}"));
            assert_eq!(summary.kind, SummaryKind::Summarized);
        }
    }

    #[tokio::test]
    async fn order_preserved_when_later_window_finishes_first_at_default_limit() {
        // chunk 0 holds a permit while chunks 3..6 run and complete behind it
        let mock = MockProvider::default()
            .with_responder(echo_marker)
            .delay_when_contains("CHUNK-0", 80)
            .with_delay(1);
        let s = ChunkSummarizer::new(mock.clone(), SummarizerConfig::default());

        let out = s.summarize(&six_chunks(), "topic").await;

        assert_eq!(mock.call_count(), 6);
        assert!(mock.max_in_flight() <= 3, "saw {}", mock.max_in_flight());
        let texts: Vec<&str> = out.iter().map(|s| s.summary_text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "summary of CHUNK-0",
                "summary of CHUNK-1",
                "summary of CHUNK-2",
                "summary of CHUNK-3",
                "summary of CHUNK-4",
                "summary of CHUNK-5",
            ]
        );
        for (i, summary) in out.iter().enumerate() {
            assert_eq!(summary.chunk_index, i);
        }
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_chunk() {
        let mock = MockProvider::default()
            .with_responder(echo_marker)
            .fail_when_contains("CHUNK-2");
        let s = ChunkSummarizer::new(mock, SummarizerConfig::default());

        let chunks: Vec<_> = six_chunks().into_iter().take(5).collect();
        let out = s.summarize(&chunks, "topic").await;

        assert_eq!(out.len(), 5);
        for (i, summary) in out.iter().enumerate() {
            if i == 2 {
                assert_eq!(summary.kind, SummaryKind::Truncated);
                assert!(summary.summary_text.starts_with("CHUNK-2 body text."));
                assert!(summary.summary_text.ends_with(TRUNCATION_MARKER));
            } else {
                assert_eq!(summary.kind, SummaryKind::Summarized);
                assert_eq!(summary.summary_text, format!("summary of CHUNK-{i}"));
            }
        }
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_limit() {
        let mock = MockProvider::default().with_delay(10);
        let s = ChunkSummarizer::new(mock.clone(), SummarizerConfig::default());

        let chunks: Vec<_> = (0..8)
            .map(|i| doc_chunk("Doc", i, 8, &format!("CHUNK-{i}.")))
            .collect();
        let out = s.summarize(&chunks, "topic").await;

        assert_eq!(out.len(), 8);
        assert_eq!(mock.call_count(), 8);
        assert!(mock.max_in_flight() <= 3, "saw {}", mock.max_in_flight());
        assert_eq!(mock.max_in_flight(), 3);
    }

    #[tokio::test]
    async fn zero_concurrency_still_makes_progress() {
        let mock = MockProvider::default();
        let s = ChunkSummarizer::new(
            mock.clone(),
            SummarizerConfig {
                concurrency: 0,
                ..SummarizerConfig::default()
            },
        );
        let out = s.summarize(&six_chunks(), "topic").await;
        assert_eq!(out.len(), 6);
        assert_eq!(mock.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_times_out_to_truncation() {
        let mock = MockProvider::default()
            .with_responder(echo_marker)
            .delay_when_contains("CHUNK-1", 600_000);
        let s = ChunkSummarizer::new(mock, SummarizerConfig::default());

        let chunks: Vec<_> = six_chunks().into_iter().take(3).collect();
        let out = s.summarize(&chunks, "topic").await;

        assert_eq!(out[0].kind, SummaryKind::Summarized);
        assert_eq!(out[1].kind, SummaryKind::Truncated);
        assert_eq!(out[2].kind, SummaryKind::Summarized);
    }

    #[tokio::test]
    async fn all_calls_failing_still_returns_every_chunk() {
        let s = ChunkSummarizer::new(MockProvider::failing(), SummarizerConfig::default());
        let out = s.summarize(&six_chunks(), "topic").await;
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|s| s.kind == SummaryKind::Truncated));
    }
}
