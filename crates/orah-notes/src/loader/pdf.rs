use std::path::Path;

use super::{DEFAULT_MAX_FILE_SIZE, DocumentLoader, LoadFuture, check_size, document_name};
use crate::error::NotesError;
use crate::types::SourceDocument;

pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> LoadFuture<'_> {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = tokio::fs::canonicalize(&path).await?;
            check_size(&path, max_size).await?;

            let name = document_name(&path);
            let text = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text(&path).map_err(|e| NotesError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| NotesError::Io(std::io::Error::other(e)))??;

            Ok(vec![SourceDocument { name, text }])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}
