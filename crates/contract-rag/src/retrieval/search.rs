//! Semantic search over indexed chunks

use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::providers::{EmbeddingProvider, IndexMatch, VectorIndex};

/// Embeds questions and queries the vector index
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    /// Create a retriever
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Up to `top_k` chunks ranked by ascending cosine distance.
    ///
    /// An empty index, an empty document filter or `top_k == 0` yield no
    /// matches rather than an error.
    pub async fn search(
        &self,
        query: &str,
        document_ids: Option<&[Uuid]>,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>> {
        if top_k == 0 || document_ids.is_some_and(|ids| ids.is_empty()) {
            return Ok(Vec::new());
        }
        if self.index.is_empty().await? {
            tracing::debug!("Vector index is empty, skipping query embedding");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let matches = self
            .index
            .query(&query_embedding, top_k, document_ids)
            .await?;

        tracing::debug!(
            "Retrieved {} chunks for query ({} chars)",
            matches.len(),
            query.chars().count()
        );

        Ok(matches)
    }
}
