//! Document store: raw uploads, extracted text and page offsets

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::ingestion::PdfTextExtractor;
use crate::types::Document;

use super::write_atomic;

/// Sidecar record written next to every raw upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadInfo {
    pub id: Uuid,
    pub filename: String,
    pub size: u64,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

/// Filesystem-backed document store.
///
/// Each document id owns its own files, so concurrent ingestion of different
/// documents never touches shared state on disk. Re-extracting the same id
/// concurrently is last-write-wins.
pub struct LocalDocumentStore {
    upload_dir: PathBuf,
    data_dir: PathBuf,
    extractor: PdfTextExtractor,
    cache: DashMap<Uuid, Arc<Document>>,
}

impl LocalDocumentStore {
    /// Create the store, creating its directories if needed
    pub fn new(config: &StorageConfig) -> Result<Self> {
        Self::with_extractor(config, PdfTextExtractor::default())
    }

    /// Create the store with a specific PDF extractor
    pub fn with_extractor(config: &StorageConfig, extractor: PdfTextExtractor) -> Result<Self> {
        std::fs::create_dir_all(&config.upload_dir)?;
        std::fs::create_dir_all(&config.data_dir)?;

        Ok(Self {
            upload_dir: config.upload_dir.clone(),
            data_dir: config.data_dir.clone(),
            extractor,
            cache: DashMap::new(),
        })
    }

    fn upload_path(&self, id: &Uuid) -> PathBuf {
        self.upload_dir.join(format!("{}.pdf", id))
    }

    fn upload_info_path(&self, id: &Uuid) -> PathBuf {
        self.upload_dir.join(format!("{}.meta.json", id))
    }

    fn metadata_path(&self, id: &Uuid) -> PathBuf {
        self.data_dir.join(format!("{}_metadata.json", id))
    }

    /// Persist raw upload bytes under a fresh document id
    pub async fn ingest(&self, data: &[u8], filename: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();

        tokio::fs::write(self.upload_path(&id), data).await?;

        let info = UploadInfo {
            id,
            filename: filename.to_string(),
            size: data.len() as u64,
            uploaded_at: chrono::Utc::now(),
        };
        write_atomic(&self.upload_info_path(&id), &serde_json::to_vec_pretty(&info)?).await?;

        tracing::info!("Stored upload '{}' as {} ({} bytes)", filename, id, data.len());
        Ok(id)
    }

    /// Parse the stored PDF page by page and persist the resulting document
    pub async fn extract_text(&self, id: Uuid) -> Result<Arc<Document>> {
        let data = match tokio::fs::read(self.upload_path(&id)).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::not_found(format!("Document {} not found", id)));
            }
            Err(e) => return Err(e.into()),
        };

        let filename = match tokio::fs::read(self.upload_info_path(&id)).await {
            Ok(raw) => serde_json::from_slice::<UploadInfo>(&raw)
                .map(|info| info.filename)
                .unwrap_or_else(|_| format!("{}.pdf", id)),
            Err(_) => format!("{}.pdf", id),
        };

        let extractor = self.extractor.clone();
        let name = filename.clone();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&name, &data))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))??;

        let document = Document::from_pages(id, filename, extracted.pages);

        write_atomic(&self.metadata_path(&id), &serde_json::to_vec(&document)?).await?;

        tracing::info!(
            "Extracted {} pages ({} chars) from '{}' using {:?}",
            document.pages.len(),
            document.total_chars,
            document.filename,
            extracted.strategy
        );

        let document = Arc::new(document);
        self.cache.insert(id, Arc::clone(&document));
        Ok(document)
    }

    /// Persist an already laid-out document (used when text comes from elsewhere)
    pub async fn put(&self, document: Document) -> Result<Arc<Document>> {
        write_atomic(&self.metadata_path(&document.id), &serde_json::to_vec(&document)?).await?;
        let document = Arc::new(document);
        self.cache.insert(document.id, Arc::clone(&document));
        Ok(document)
    }

    /// Load a persisted document
    pub async fn get(&self, id: Uuid) -> Result<Arc<Document>> {
        if let Some(doc) = self.cache.get(&id) {
            return Ok(Arc::clone(doc.value()));
        }

        let raw = match tokio::fs::read(self.metadata_path(&id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::not_found(format!("Document {} not found", id)));
            }
            Err(e) => return Err(e.into()),
        };

        let document: Arc<Document> = Arc::new(serde_json::from_slice(&raw)?);
        self.cache.insert(id, Arc::clone(&document));
        Ok(document)
    }

    /// Resolve a character position to a page using the stored offset table
    pub async fn page_for_offset(&self, id: Uuid, char_pos: i64) -> Result<u32> {
        Ok(self.get(id).await?.page_for_offset(char_pos))
    }

    /// Remove the upload and derived metadata. Returns false if nothing existed.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        self.cache.remove(&id);
        let mut removed = false;
        for path in [
            self.upload_path(&id),
            self.upload_info_path(&id),
            self.metadata_path(&id),
        ] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed = true,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}
