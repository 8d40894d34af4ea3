use orah_llm::LlmProvider;
use serde::{Deserialize, Serialize};

use crate::combiner::{combine, label_documents};
use crate::error::NotesError;
use crate::splitter::{OverlapBudget, chunk_text};
use crate::summarizer::ChunkSummarizer;
use crate::tokens::estimate_tokens;
use crate::types::{DocumentChunk, PreparedNotes, SourceDocument, SummaryKind};

/// Chunk budget plus the context repeated across chunk boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkProfile {
    pub max_chunk_tokens: usize,
    pub overlap: OverlapBudget,
}

impl ChunkProfile {
    /// Large uploaded documents condensed before plan generation.
    pub const DOCUMENT: Self = Self {
        max_chunk_tokens: 20_000,
        overlap: OverlapBudget::Words(150),
    };

    /// Lecture transcripts, sized for a long-context downstream model.
    pub const TRANSCRIPT: Self = Self {
        max_chunk_tokens: 80_000,
        overlap: OverlapBudget::Words(200),
    };
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Inputs at or under this many estimated tokens pass through verbatim.
    pub summarize_threshold: usize,
    pub document: ChunkProfile,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            summarize_threshold: 50_000,
            document: ChunkProfile::DOCUMENT,
        }
    }
}

/// Chunk every document independently, numbering parts per document.
///
/// Documents with no text besides whitespace are skipped with a warning.
#[must_use]
pub fn chunk_documents(documents: &[SourceDocument], profile: ChunkProfile) -> Vec<DocumentChunk> {
    documents
        .iter()
        .filter(|doc| {
            let blank = doc.text.trim().is_empty();
            if blank {
                tracing::warn!(document = %doc.name, "document has no text, skipping");
            }
            !blank
        })
        .flat_map(|doc| {
            let chunks = chunk_text(&doc.text, profile.max_chunk_tokens, profile.overlap);
            let parts = chunks.len();
            chunks.into_iter().map(move |chunk| DocumentChunk {
                document_name: doc.name.clone(),
                part: chunk.index,
                parts,
                chunk,
            })
        })
        .collect()
}

pub struct NotesPipeline<P> {
    summarizer: ChunkSummarizer<P>,
    config: PipelineConfig,
}

impl<P: LlmProvider> NotesPipeline<P> {
    #[must_use]
    pub fn new(summarizer: ChunkSummarizer<P>, config: PipelineConfig) -> Self {
        Self { summarizer, config }
    }

    /// Turn uploaded material into notes that fit downstream context budgets.
    ///
    /// Small inputs come back verbatim with source labels. Larger ones are
    /// chunked per document and summarized, then recombined in order. Chunks
    /// whose model call failed carry truncated text instead.
    ///
    /// # Errors
    ///
    /// Returns `NotesError::NoDocuments` if `documents` is empty.
    pub async fn prepare_notes(
        &self,
        documents: &[SourceDocument],
        topic: &str,
    ) -> Result<PreparedNotes, NotesError> {
        if documents.is_empty() {
            return Err(NotesError::NoDocuments);
        }

        let original_tokens: usize = documents.iter().map(|d| estimate_tokens(&d.text)).sum();

        if original_tokens <= self.config.summarize_threshold {
            tracing::info!(
                documents = documents.len(),
                original_tokens,
                "input under summarization threshold, passing through"
            );
            return Ok(PreparedNotes {
                text: label_documents(documents),
                was_summarized: false,
                original_tokens,
                final_tokens: original_tokens,
                chunk_count: documents.len(),
                truncated_chunks: 0,
            });
        }

        let chunks = chunk_documents(documents, self.config.document);
        tracing::info!(
            documents = documents.len(),
            original_tokens,
            chunks = chunks.len(),
            "summarizing chunked input"
        );

        let summaries = self.summarizer.summarize(&chunks, topic).await;
        let final_tokens = summaries
            .iter()
            .map(|s| estimate_tokens(&s.summary_text))
            .sum();
        let truncated_chunks = summaries
            .iter()
            .filter(|s| s.kind == SummaryKind::Truncated)
            .count();

        if truncated_chunks > 0 {
            tracing::warn!(
                truncated_chunks,
                total = summaries.len(),
                "some chunks fell back to truncated text"
            );
        }
        tracing::info!(original_tokens, final_tokens, "notes prepared");

        Ok(PreparedNotes {
            text: combine(&summaries),
            was_summarized: true,
            original_tokens,
            final_tokens,
            chunk_count: summaries.len(),
            truncated_chunks,
        })
    }
}
