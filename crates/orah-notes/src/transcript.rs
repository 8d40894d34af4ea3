//! Long lecture transcripts split into parts for a long-context model.

use crate::pipeline::ChunkProfile;
use crate::splitter::chunk_text;
use crate::tokens::estimate_tokens;
use crate::types::TextChunk;

#[derive(Debug, Clone, Copy)]
pub struct TranscriptChunker {
    profile: ChunkProfile,
}

impl Default for TranscriptChunker {
    fn default() -> Self {
        Self::new(ChunkProfile::TRANSCRIPT)
    }
}

impl TranscriptChunker {
    #[must_use]
    pub fn new(profile: ChunkProfile) -> Self {
        Self { profile }
    }

    #[must_use]
    pub fn profile(&self) -> ChunkProfile {
        self.profile
    }

    #[must_use]
    pub fn needs_chunking(&self, transcript: &str) -> bool {
        estimate_tokens(transcript) > self.profile.max_chunk_tokens
    }

    #[must_use]
    pub fn chunk(&self, transcript: &str) -> Vec<TextChunk> {
        let chunks = chunk_text(
            transcript,
            self.profile.max_chunk_tokens,
            self.profile.overlap,
        );
        if chunks.len() > 1 {
            tracing::debug!(
                parts = chunks.len(),
                tokens = estimate_tokens(transcript),
                "transcript split into parts"
            );
        }
        chunks
    }
}

/// Header placed before each transcript part in downstream prompts.
#[must_use]
pub fn part_label(index: usize, total: usize) -> String {
    format!("Transcript part {} of {total}", index + 1)
}
