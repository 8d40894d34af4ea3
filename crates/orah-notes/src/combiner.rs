use crate::types::{ChunkSummary, SourceDocument};

/// Placed between labeled entries of the combined text.
pub const ENTRY_SEPARATOR: &str = "\n\n---\n\n";

/// `[From <name>]`, or `[From <name> - Part <n>]` when the document was split.
#[must_use]
pub fn source_label(document_name: &str, part: usize, parts: usize) -> String {
    if parts > 1 {
        format!("[From {document_name} - Part {}]", part + 1)
    } else {
        format!("[From {document_name}]")
    }
}

/// Join chunk outputs in ascending `chunk_index` order, whatever order they
/// arrive in.
#[must_use]
pub fn combine(summaries: &[ChunkSummary]) -> String {
    let mut ordered: Vec<&ChunkSummary> = summaries.iter().collect();
    ordered.sort_by_key(|s| s.chunk_index);

    ordered
        .into_iter()
        .map(|s| {
            format!(
                "{}\n{}",
                source_label(&s.document_name, s.part, s.parts),
                s.summary_text
            )
        })
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

/// Verbatim labeled concatenation used when no summarization is needed.
#[must_use]
pub fn label_documents(documents: &[SourceDocument]) -> String {
    documents
        .iter()
        .map(|d| format!("{}\n{}", source_label(&d.name, 0, 1), d.text))
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}
