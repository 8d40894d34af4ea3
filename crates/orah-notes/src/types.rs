use serde::{Deserialize, Serialize};

/// Raw extracted text of one uploaded item (syllabus, transcript, slide deck).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A sentence-aligned slice of a larger text.
///
/// `start_char`/`end_char` are byte offsets into the source text covering the
/// first through last sentence of the chunk, overlap included. They are
/// informational: `text` joins sentences with single spaces, so its length
/// only equals the span when the source already used single spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
    pub estimated_tokens: usize,
}

/// A chunk tagged with the document it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChunk {
    pub document_name: String,
    /// 0-based position within the document.
    pub part: usize,
    /// Number of chunks the document produced.
    pub parts: usize,
    pub chunk: TextChunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    /// Model-generated condensation.
    Summarized,
    /// Local fallback after the model call failed.
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    /// Global position across all documents of the run.
    pub chunk_index: usize,
    pub document_name: String,
    pub part: usize,
    pub parts: usize,
    pub summary_text: String,
    pub kind: SummaryKind,
}

/// Final artifact handed to plan and notes generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedNotes {
    pub text: String,
    pub was_summarized: bool,
    pub original_tokens: usize,
    pub final_tokens: usize,
    pub chunk_count: usize,
    pub truncated_chunks: usize,
}
