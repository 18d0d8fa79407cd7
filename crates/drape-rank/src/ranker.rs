// crates/drape-rank/src/ranker.rs
//
// Exhaustive similarity scoring of eligible products against a preference
// vector.

use std::cmp::Ordering;

use drape_core::vector::{cosine_similarity, weighted_cosine_similarity};
use drape_core::{EmbeddingTable, Product, ScoredProduct};

/// Scores products by cosine similarity, optionally weighting dimensions by
/// a variance mask.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityRanker {
    mask: Option<Vec<f64>>,
}

impl SimilarityRanker {
    /// Plain cosine similarity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask-weighted cosine similarity.
    pub fn with_mask(weights: Vec<f64>) -> Self {
        Self {
            mask: Some(weights),
        }
    }

    /// Similarity of one vector to the preference, clamped to [-1, 1].
    /// Non-finite results score 0.
    pub fn score(&self, preference: &[f32], vector: &[f32]) -> f64 {
        let raw = match &self.mask {
            Some(weights) => weighted_cosine_similarity(preference, vector, weights),
            None => cosine_similarity(preference, vector),
        };
        if raw.is_finite() {
            raw.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// Score every product and sort by score descending. Ties keep input
    /// order. With no preference every product scores 0 in input order.
    ///
    /// The full list is returned; truncation is up to the caller.
    pub fn rank(
        &self,
        products: Vec<Product>,
        preference: Option<&[f32]>,
        embeddings: &EmbeddingTable,
    ) -> Vec<ScoredProduct> {
        let Some(preference) = preference else {
            return products
                .into_iter()
                .map(|p| ScoredProduct::new(p, 0.0))
                .collect();
        };

        let ranker = match &self.mask {
            Some(weights) if weights.len() != preference.len() => {
                tracing::warn!(
                    mask_dimensions = weights.len(),
                    embedding_dimensions = preference.len(),
                    "Ignoring variance mask with mismatched length"
                );
                SimilarityRanker::new()
            }
            _ => self.clone(),
        };

        let mut scored: Vec<ScoredProduct> = products
            .into_iter()
            .map(|p| {
                let score = embeddings
                    .get(&p.id)
                    .map(|v| ranker.score(preference, v))
                    .unwrap_or(0.0);
                ScoredProduct::new(p, score)
            })
            .collect();

        // `sort_by` is stable, so equal scores keep filter order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drape_core::Category;

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            category: Category::Apparel,
            recommendation_only: false,
            image_path: format!("img/{}.jpg", id),
        }
    }

    fn table() -> EmbeddingTable {
        [
            ("a1", vec![1.0f32, 0.0]),
            ("a2", vec![0.0, 1.0]),
            ("a3", vec![1.0, 1.0]),
            ("a4", vec![-1.0, 0.0]),
            ("zero", vec![0.0, 0.0]),
        ]
        .into_iter()
        .map(|(id, v)| (id.to_string(), v))
        .collect()
    }

    fn ids(scored: &[ScoredProduct]) -> Vec<&str> {
        scored.iter().map(|s| s.id()).collect()
    }

    #[test]
    fn no_preference_scores_zero_in_input_order() {
        let products = vec![product("a3"), product("a1"), product("a2")];
        let scored = SimilarityRanker::new().rank(products, None, &table());
        assert_eq!(ids(&scored), vec!["a3", "a1", "a2"]);
        assert!(scored.iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn ranks_descending_with_missing_and_zero_vectors_at_zero() {
        let products = vec![
            product("a4"),
            product("missing"),
            product("a2"),
            product("zero"),
            product("a1"),
            product("a3"),
        ];
        let pref = [1.0f32, 0.0];
        let scored = SimilarityRanker::new().rank(products, Some(&pref[..]), &table());

        assert_eq!(ids(&scored), vec!["a1", "a3", "missing", "a2", "zero", "a4"]);
        assert!((scored[0].score - 1.0).abs() < 1e-9);
        assert_eq!(scored[2].score, 0.0);
        assert!((scored[5].score + 1.0).abs() < 1e-9);
        for pair in scored.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn mask_weights_change_the_order() {
        let mut table = table();
        table.insert("b1", vec![1.0, 0.2]);
        table.insert("b2", vec![0.8, 1.0]);
        let pref = [1.0f32, 1.0];

        let plain = SimilarityRanker::new().rank(vec![product("b1"), product("b2")], Some(&pref[..]), &table);
        assert_eq!(ids(&plain), vec!["b2", "b1"]);

        // Suppress dimension 1: only dimension 0 counts, both score 1.0 and
        // keep input order.
        let masked = SimilarityRanker::with_mask(vec![1.0, 0.0]).rank(
            vec![product("b1"), product("b2")],
            Some(&pref[..]),
            &table,
        );
        assert_eq!(ids(&masked), vec!["b1", "b2"]);
        assert!((masked[1].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_mask_falls_back_to_plain_cosine() {
        let pref = [1.0f32, 0.0];
        let masked = SimilarityRanker::with_mask(vec![1.0, 1.0, 1.0]).rank(
            vec![product("a1")],
            Some(&pref[..]),
            &table(),
        );
        assert!((masked[0].score - 1.0).abs() < 1e-9);
    }
}
