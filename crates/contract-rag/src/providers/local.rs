//! Local vector index: cosine distance over an in-process table, persisted
//! as JSON in the data directory

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::write_atomic;

use super::vector_store::{IndexEntry, IndexMatch, VectorIndex};

/// File name of the persisted index inside the data directory
pub const INDEX_FILE: &str = "vector_index.json";

/// Entries in insertion order plus an id lookup
#[derive(Debug, Clone, Default)]
struct IndexTable {
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl IndexTable {
    fn from_entries(entries: Vec<IndexEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            table.upsert(entry);
        }
        table
    }

    /// Replace in place to keep the original insertion position
    fn upsert(&mut self, entry: IndexEntry) {
        match self.positions.get(&entry.id) {
            Some(&position) => self.entries[position] = entry,
            None => {
                self.positions.insert(entry.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn remove_document(&mut self, document_id: &Uuid) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.metadata.document_id != *document_id);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.positions = self
                .entries
                .iter()
                .enumerate()
                .map(|(position, entry)| (entry.id.clone(), position))
                .collect();
        }
        removed
    }

    fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|entry| entry.vector.len())
    }
}

/// In-process cosine index.
///
/// Mutations build the next table, persist it, then swap it in, so a failed
/// write leaves both memory and disk at the previous state.
pub struct LocalVectorIndex {
    table: RwLock<IndexTable>,
    /// Serializes mutations so snapshots reach disk in order
    write_lock: Mutex<()>,
    path: Option<PathBuf>,
}

impl LocalVectorIndex {
    /// Index that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            table: RwLock::new(IndexTable::default()),
            write_lock: Mutex::new(()),
            path: None,
        }
    }

    /// Open (or create) the index persisted under `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let path = data_dir.as_ref().join(INDEX_FILE);

        let table = match std::fs::read(&path) {
            Ok(bytes) => {
                let entries: Vec<IndexEntry> = serde_json::from_slice(&bytes)?;
                tracing::info!("Loaded {} vectors from {:?}", entries.len(), path);
                IndexTable::from_entries(entries)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexTable::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            table: RwLock::new(table),
            write_lock: Mutex::new(()),
            path: Some(path),
        })
    }

    fn check_dimensions(table: &IndexTable, entries: &[IndexEntry]) -> Result<()> {
        let expected = table
            .dimensions()
            .or_else(|| entries.first().map(|entry| entry.vector.len()));

        if let Some(expected) = expected {
            if let Some(bad) = entries.iter().find(|entry| entry.vector.len() != expected) {
                return Err(Error::indexing(format!(
                    "Vector for {} has {} dimensions, index uses {}",
                    bad.id,
                    bad.vector.len(),
                    expected
                )));
            }
        }
        Ok(())
    }

    /// Apply `mutate` to a copy of the table, persist it, then publish it
    async fn commit<F, T>(&self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut IndexTable) -> Result<T>,
    {
        let _guard = self.write_lock.lock().await;

        let mut next = self.table.read().clone();
        let outcome = mutate(&mut next)?;

        if let Some(path) = &self.path {
            let bytes = serde_json::to_vec(&next.entries)?;
            write_atomic(path, &bytes)
                .await
                .map_err(|e| Error::indexing(format!("Failed to persist vector index: {}", e)))?;
        }

        *self.table.write() = next;
        Ok(outcome)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.commit(|table| {
            Self::check_dimensions(table, &entries)?;
            for entry in entries {
                table.upsert(entry);
            }
            Ok(())
        })
        .await
    }

    async fn replace_document(&self, document_id: &Uuid, entries: Vec<IndexEntry>) -> Result<()> {
        if let Some(stray) = entries
            .iter()
            .find(|entry| entry.metadata.document_id != *document_id)
        {
            return Err(Error::indexing(format!(
                "Entry {} does not belong to document {}",
                stray.id, document_id
            )));
        }

        self.commit(|table| {
            Self::check_dimensions(table, &entries)?;
            let removed = table.remove_document(document_id);
            tracing::debug!(
                "Replacing {} vectors with {} for document {}",
                removed,
                entries.len(),
                document_id
            );
            for entry in entries {
                table.upsert(entry);
            }
            Ok(())
        })
        .await
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        document_filter: Option<&[Uuid]>,
    ) -> Result<Vec<IndexMatch>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let table = self.table.read();
        let mut matches: Vec<IndexMatch> = table
            .entries
            .iter()
            .filter(|entry| entry.vector.len() == vector.len())
            .filter(|entry| {
                document_filter
                    .map(|ids| ids.contains(&entry.metadata.document_id))
                    .unwrap_or(true)
            })
            .map(|entry| IndexMatch {
                id: entry.id.clone(),
                text: entry.text.clone(),
                metadata: entry.metadata.clone(),
                distance: 1.0 - cosine_similarity(vector, &entry.vector),
            })
            .collect();

        // sort_by is stable, equal distances keep insertion order
        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);

        Ok(matches)
    }

    async fn delete_by_document(&self, document_id: &Uuid) -> Result<usize> {
        self.commit(|table| Ok(table.remove_document(document_id)))
            .await
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.table.read().entries.len())
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::vector_store::ChunkMetadata;

    fn entry(id: &str, document_id: Uuid, vector: Vec<f32>) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            vector,
            text: format!("text of {}", id),
            metadata: ChunkMetadata {
                document_id,
                page: 1,
                char_start: 0,
                char_end: 10,
            },
        }
    }

    #[tokio::test]
    async fn test_query_orders_by_distance_with_stable_ties() {
        let index = LocalVectorIndex::in_memory();
        let doc = Uuid::new_v4();

        index
            .upsert(vec![
                entry("far", doc, vec![0.0, 1.0]),
                entry("tie_a", doc, vec![1.0, 1.0]),
                entry("near", doc, vec![1.0, 0.0]),
                entry("tie_b", doc, vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let ids: Vec<String> = index
            .query(&[1.0, 0.0], 10, None)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["near", "tie_a", "tie_b", "far"]);

        let top = index.query(&[1.0, 0.0], 1, None).await.unwrap();
        assert_eq!(top.len(), 1);
        assert!(top[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_document_filter() {
        let index = LocalVectorIndex::in_memory();
        let doc_a = Uuid::new_v4();
        let doc_b = Uuid::new_v4();

        index
            .upsert(vec![
                entry("a1", doc_a, vec![1.0, 0.0]),
                entry("b1", doc_b, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let matches = index.query(&[1.0, 0.0], 5, Some(&[doc_b])).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].metadata.document_id, doc_b);

        let none = index
            .query(&[1.0, 0.0], 5, Some(&[Uuid::new_v4()]))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_same_id_overwrites() {
        let index = LocalVectorIndex::in_memory();
        let doc = Uuid::new_v4();

        index.upsert(vec![entry("c", doc, vec![1.0, 0.0])]).await.unwrap();
        index.upsert(vec![entry("c", doc, vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(index.len().await.unwrap(), 1);
        let matches = index.query(&[0.0, 1.0], 1, None).await.unwrap();
        assert!(matches[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_replace_document_drops_stale_chunks() {
        let index = LocalVectorIndex::in_memory();
        let doc = Uuid::new_v4();
        let other = Uuid::new_v4();

        index
            .upsert(vec![
                entry("old_1", doc, vec![1.0, 0.0]),
                entry("old_2", doc, vec![1.0, 0.0]),
                entry("keep", other, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        index
            .replace_document(&doc, vec![entry("new_1", doc, vec![1.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(index.len().await.unwrap(), 2);
        let ids: Vec<String> = index
            .query(&[1.0, 0.0], 10, None)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["new_1", "keep"]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_leaves_index_untouched() {
        let index = LocalVectorIndex::in_memory();
        let doc = Uuid::new_v4();

        index.upsert(vec![entry("a", doc, vec![1.0, 0.0])]).await.unwrap();
        let result = index
            .replace_document(&doc, vec![entry("b", doc, vec![1.0, 0.0, 0.0])])
            .await;

        assert!(matches!(result, Err(Error::Indexing(_))));
        assert_eq!(index.len().await.unwrap(), 1);
        assert_eq!(index.query(&[1.0, 0.0], 1, None).await.unwrap()[0].id, "a");
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Uuid::new_v4();

        {
            let index = LocalVectorIndex::open(dir.path()).unwrap();
            index
                .upsert(vec![
                    entry("first", doc, vec![1.0, 1.0]),
                    entry("second", doc, vec![1.0, 1.0]),
                ])
                .await
                .unwrap();
        }

        let reopened = LocalVectorIndex::open(dir.path()).unwrap();
        assert_eq!(reopened.len().await.unwrap(), 2);
        let ids: Vec<String> = reopened
            .query(&[1.0, 1.0], 2, None)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["first", "second"]);

        assert_eq!(reopened.delete_by_document(&doc).await.unwrap(), 2);
        assert!(reopened.is_empty().await.unwrap());
    }
}
