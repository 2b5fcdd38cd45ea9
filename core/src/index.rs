use anyhow::Result;
use std::cmp::Ordering;

use crate::embedding::Embedder;
use crate::models::{Chunk, IndexedChunk};

/// One nearest-neighbor result: the entry's position in the index and its
/// squared Euclidean distance from the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub ordinal: usize,
    pub distance: f32,
}

/// Flat in-memory vector index over a single document's chunks. Rebuilt
/// wholesale on every upload; no incremental updates, no deletion.
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Embeds every chunk and stores chunk text, page number, and vector as
    /// one record, in chunk order.
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = embedder.embed(&chunk.text).await?;
            entries.push(IndexedChunk {
                page_number: chunk.page_number,
                text: chunk.text,
                embedding,
            });
        }
        log::info!(
            "Built index with {} chunks ({})",
            entries.len(),
            embedder.model_name()
        );
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&IndexedChunk> {
        self.entries.get(ordinal)
    }

    /// Returns up to `k` entries ranked by increasing squared L2 distance,
    /// ties broken by ordinal position. An empty index yields no results.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if self.entries.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .enumerate()
            .map(|(ordinal, entry)| SearchHit {
                ordinal,
                distance: squared_l2(query, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.ordinal.cmp(&b.ordinal))
        });
        hits.truncate(k);
        hits
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    // A dimension mismatch means the query and index came from different
    // embedding models; distances over a truncated overlap would be garbage.
    assert_eq!(
        a.len(),
        b.len(),
        "embedding dimension mismatch: {} vs {}",
        a.len(),
        b.len()
    );
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(vectors: Vec<(u32, Vec<f32>)>) -> VectorIndex {
        VectorIndex {
            entries: vectors
                .into_iter()
                .enumerate()
                .map(|(i, (page_number, embedding))| IndexedChunk {
                    page_number,
                    text: format!("chunk {i}"),
                    embedding,
                })
                .collect(),
        }
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = VectorIndex::empty();
        assert!(index.search(&[1.0, 0.0], 3).is_empty());
    }

    #[test]
    fn top_k_orders_by_distance() {
        let index = index_of(vec![
            (1, vec![3.0, 0.0]),
            (2, vec![1.0, 0.0]),
            (3, vec![2.0, 0.0]),
            (4, vec![10.0, 0.0]),
        ]);
        let hits = index.search(&[0.0, 0.0], 3);
        assert_eq!(hits.len(), 3);
        let ordinals: Vec<usize> = hits.iter().map(|h| h.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 0]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn fewer_entries_than_k_returns_all() {
        let index = index_of(vec![(1, vec![1.0]), (2, vec![2.0])]);
        assert_eq!(index.search(&[0.0], 3).len(), 2);
    }

    #[test]
    #[should_panic(expected = "embedding dimension mismatch")]
    fn mismatched_query_dimension_panics() {
        let index = index_of(vec![(1, vec![1.0, 0.0])]);
        index.search(&[1.0, 0.0, 0.0], 1);
    }

    #[test]
    fn ties_break_by_ordinal() {
        let index = index_of(vec![
            (1, vec![1.0, 0.0]),
            (2, vec![0.0, 1.0]),
            (3, vec![-1.0, 0.0]),
        ]);
        // All three are at equal distance from the origin.
        let hits = index.search(&[0.0, 0.0], 3);
        let ordinals: Vec<usize> = hits.iter().map(|h| h.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
    }
}
