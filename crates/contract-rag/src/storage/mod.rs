//! Local filesystem persistence for uploads and extracted documents

mod document_store;

pub use document_store::{LocalDocumentStore, UploadInfo};

use std::path::Path;

use crate::error::Result;

/// Write a file via a temporary sibling and rename, so readers never observe
/// a partially written file
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
