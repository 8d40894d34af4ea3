//! Chunking and summarization of course material into bounded study notes.
//!
//! Text is estimated at four characters per token. Inputs over the
//! summarization threshold are split at sentence boundaries with contextual
//! overlap, condensed by a language model under a fixed concurrency limit,
//! and recombined in source order with `[From ...]` labels.

pub mod combiner;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod splitter;
pub mod summarizer;
pub mod tokens;
pub mod transcript;
pub mod types;

pub use error::NotesError;
pub use pipeline::{ChunkProfile, NotesPipeline, PipelineConfig};
pub use splitter::{OverlapBudget, chunk_text, select_overlap, split_sentences};
pub use summarizer::{ChunkSummarizer, SummarizerConfig};
pub use tokens::estimate_tokens;
pub use transcript::TranscriptChunker;
pub use types::{ChunkSummary, DocumentChunk, PreparedNotes, SourceDocument, SummaryKind, TextChunk};
