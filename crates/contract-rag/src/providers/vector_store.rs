//! Vector index trait for storing and searching chunk embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::types::Chunk;

/// Provenance stored alongside every vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_id: Uuid,
    pub page: u32,
    pub char_start: usize,
    pub char_end: usize,
}

/// One row of the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Chunk id; upserting an existing id replaces the row
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl IndexEntry {
    /// Build an entry for an embedded chunk
    pub fn from_chunk(chunk: &Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: chunk.id.clone(),
            vector,
            text: chunk.text.clone(),
            metadata: ChunkMetadata {
                document_id: chunk.document_id,
                page: chunk.page_number,
                char_start: chunk.char_start,
                char_end: chunk.char_end,
            },
        }
    }
}

/// Query hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexMatch {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Cosine distance, lower is more relevant
    pub distance: f32,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `LocalVectorIndex`: in-process cosine index persisted as JSON
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace entries by id
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Replace every entry of one document with `entries`
    ///
    /// Implementations must apply this all-or-nothing.
    async fn replace_document(&self, document_id: &Uuid, entries: Vec<IndexEntry>) -> Result<()>;

    /// Up to `k` nearest entries, ascending by distance, ties in insertion
    /// order. `document_filter` restricts results to those documents.
    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        document_filter: Option<&[Uuid]>,
    ) -> Result<Vec<IndexMatch>>;

    /// Delete all entries for a document, returning how many were removed
    async fn delete_by_document(&self, document_id: &Uuid) -> Result<usize>;

    /// Total number of entries
    async fn len(&self) -> Result<usize>;

    /// Check if the index is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Provider name for logging
    fn name(&self) -> &str;
}
