//! Embeds chunks and writes them to the vector index

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, IndexEntry, VectorIndex};
use crate::types::Chunk;

/// Chunk indexer
///
/// All vectors for a document are staged before anything is written, then
/// the document's entries are replaced in one call. A failure at any point
/// leaves the previous entries in place.
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
}

impl Indexer {
    /// Create an indexer
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            batch_size: batch_size.max(1),
        }
    }

    /// Index all chunks of one document, returning the number written
    pub async fn index<I>(&self, document_id: &Uuid, chunks: I) -> Result<usize>
    where
        I: IntoIterator<Item = Chunk>,
    {
        let chunks: Vec<Chunk> = chunks.into_iter().collect();
        let mut entries = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self
                .embedder
                .embed_batch(&texts)
                .await
                .map_err(|e| Error::indexing(format!("Embedding failed: {}", e)))?;

            if vectors.len() != batch.len() {
                return Err(Error::indexing(format!(
                    "{} returned {} embeddings for {} chunks",
                    self.embedder.name(),
                    vectors.len(),
                    batch.len()
                )));
            }

            entries.extend(
                batch
                    .iter()
                    .zip(vectors)
                    .map(|(chunk, vector)| IndexEntry::from_chunk(chunk, vector)),
            );
        }

        let count = entries.len();
        self.index
            .replace_document(document_id, entries)
            .await
            .map_err(|e| match e {
                Error::Indexing(_) => e,
                other => Error::indexing(other.to_string()),
            })?;

        tracing::info!(
            "Indexed {} chunks for document {} into {}",
            count,
            document_id,
            self.index.name()
        );

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::TextChunker;
    use crate::providers::LocalVectorIndex;
    use crate::retrieval::testing::KeywordEmbedder;
    use crate::types::Document;

    fn contract() -> Document {
        Document::from_pages(
            Uuid::new_v4(),
            "contract.pdf",
            vec![
                "Alice agrees to pay Bob $100.".to_string(),
                "This agreement auto-renews every year with 10 days notice.".to_string(),
            ],
        )
    }

    #[tokio::test]
    async fn test_reindexing_is_idempotent() {
        let doc = contract();
        let chunker = TextChunker::new(1000, 200).unwrap();
        let index = Arc::new(LocalVectorIndex::in_memory());
        let indexer = Indexer::new(Arc::new(KeywordEmbedder { fail: false }), index.clone(), 1);

        assert_eq!(indexer.index(&doc.id, chunker.chunk(&doc)).await.unwrap(), 2);
        assert_eq!(indexer.index(&doc.id, chunker.chunk(&doc)).await.unwrap(), 2);
        assert_eq!(index.len().await.unwrap(), 2);

        let mut ids: Vec<String> = index
            .query(&[1.0, 1.0, 0.0, 0.0], 10, None)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        ids.sort();
        let mut expected: Vec<String> = chunker.chunk(&doc).map(|c| c.id).collect();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_embedding_failure_keeps_previous_entries() {
        let doc = contract();
        let chunker = TextChunker::new(1000, 200).unwrap();
        let index = Arc::new(LocalVectorIndex::in_memory());

        Indexer::new(Arc::new(KeywordEmbedder { fail: false }), index.clone(), 8)
            .index(&doc.id, chunker.chunk(&doc))
            .await
            .unwrap();

        let result = Indexer::new(Arc::new(KeywordEmbedder { fail: true }), index.clone(), 8)
            .index(&doc.id, chunker.chunk(&doc))
            .await;

        assert!(matches!(result, Err(Error::Indexing(_))));
        assert_eq!(index.len().await.unwrap(), 2);
    }
}
