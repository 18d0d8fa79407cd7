// crates/drape-core/src/embedding.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Product id -> embedding vector, as produced by the upstream embedding
/// model. Read-only for the duration of a ranking call.
///
/// Dimensionality is never declared up front; it is whatever the vectors
/// carry. `dimensions` reports the length of an arbitrary stored vector and
/// `inconsistent_ids` finds entries that disagree with a given length.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EmbeddingTable {
    vectors: HashMap<String, Vec<f32>>,
}

impl EmbeddingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, vector: Vec<f32>) {
        self.vectors.insert(id.into(), vector);
    }

    /// Look up a product's vector. Absence is not an error; callers treat it
    /// as "no signal".
    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.vectors.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vectors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Length of the vector stored under the lexicographically smallest id,
    /// or `None` for an empty table.
    pub fn dimensions(&self) -> Option<usize> {
        self.vectors
            .iter()
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(_, v)| v.len())
    }

    /// Ids whose vector length differs from `expected`, sorted.
    pub fn inconsistent_ids(&self, expected: usize) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .vectors
            .iter()
            .filter(|(_, v)| v.len() != expected)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl FromIterator<(String, Vec<f32>)> for EmbeddingTable {
    fn from_iter<I: IntoIterator<Item = (String, Vec<f32>)>>(iter: I) -> Self {
        Self {
            vectors: iter.into_iter().collect(),
        }
    }
}

/// Deterministic pseudo-embedding: hash text + dimension index to produce a
/// reproducible float vector, then L2-normalize. Identical text always yields
/// an identical vector (cosine similarity ~1.0). No model required; used by
/// offline runs and tests in place of a hosted embedding model.
pub fn hash_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    use sha2::{Digest, Sha256};

    let mut raw = Vec::with_capacity(dimensions);
    for i in 0..dimensions {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(i.to_le_bytes());
        let hash = hasher.finalize();
        // First 4 bytes as u32, mapped to [-1, 1]
        let bits = u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]]);
        let val = (bits as f64 / u32::MAX as f64) * 2.0 - 1.0;
        raw.push(val as f32);
    }

    let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in raw.iter_mut() {
            *v /= norm;
        }
    }

    raw
}
