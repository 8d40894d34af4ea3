//! File loaders producing [`SourceDocument`]s for the pipeline.

mod text;
#[cfg(feature = "pdf")]
mod pdf;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub use text::TextLoader;
#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;

use crate::error::NotesError;
use crate::types::SourceDocument;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub type LoadFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<SourceDocument>, NotesError>> + Send + 'a>>;

pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> LoadFuture<'_>;

    fn supported_extensions(&self) -> &[&str];
}

/// Display name for a loaded file: its stem, or the whole path as a fallback.
pub(crate) fn document_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map_or_else(|| path.display().to_string(), str::to_owned)
}

pub(crate) async fn check_size(path: &Path, max_size: u64) -> Result<(), NotesError> {
    let meta = tokio::fs::metadata(path).await?;
    if meta.len() > max_size {
        return Err(NotesError::FileTooLarge(meta.len()));
    }
    Ok(())
}

fn loader_for(path: &Path, loaders: &[Box<dyn DocumentLoader>]) -> Option<usize> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)?;
    loaders
        .iter()
        .position(|l| l.supported_extensions().contains(&ext.as_str()))
}

fn default_loaders() -> Vec<Box<dyn DocumentLoader>> {
    #[cfg_attr(not(feature = "pdf"), allow(unused_mut))]
    let mut loaders: Vec<Box<dyn DocumentLoader>> = vec![Box::new(TextLoader::default())];
    #[cfg(feature = "pdf")]
    loaders.push(Box::new(PdfLoader::default()));
    loaders
}

/// Load every path with the loader registered for its extension, in order.
///
/// # Errors
///
/// Returns `NotesError::UnsupportedFormat` for unknown extensions, or the
/// first loader error encountered.
pub async fn load_documents(paths: &[impl AsRef<Path>]) -> Result<Vec<SourceDocument>, NotesError> {
    let loaders = default_loaders();
    let mut documents = Vec::with_capacity(paths.len());

    for path in paths {
        let path = path.as_ref();
        let idx = loader_for(path, &loaders)
            .ok_or_else(|| NotesError::UnsupportedFormat(path.display().to_string()))?;
        let loaded = loaders[idx].load(path).await?;
        tracing::debug!(path = %path.display(), documents = loaded.len(), "loaded");
        documents.extend(loaded);
    }

    Ok(documents)
}
