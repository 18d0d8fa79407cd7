// crates/drape-core/src/vector.rs
//
// Pure vector primitives shared by ranking and mask discovery.
//
// Storage is f32 (as produced by embedding models); every accumulation runs
// in f64. Similarity functions are total: degenerate input yields 0.0 rather
// than an error. Averaging functions are structural and return errors on
// empty or ragged input.

use crate::error::DrapeError;

/// Dot product. Extra elements of the longer slice are ignored.
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| *x as f64 * *y as f64)
        .sum()
}

/// Euclidean (L2) norm.
pub fn magnitude(v: &[f32]) -> f64 {
    v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt()
}

/// Cosine similarity between two vectors.
///
/// Returns a value in [-1.0, 1.0]. Returns 0.0 if the lengths differ, either
/// vector is empty, or either has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    dot / denom
}

/// Cosine similarity after scaling both vectors elementwise by `weights`.
///
/// Equivalent to `cosine_similarity(w * a, w * b)`. Returns 0.0 when any of
/// the three lengths disagree.
pub fn weighted_cosine_similarity(a: &[f32], b: &[f32], weights: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() != weights.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for ((x, y), w) in a.iter().zip(b.iter()).zip(weights.iter()) {
        let x = *x as f64 * w;
        let y = *y as f64 * w;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    dot / denom
}

/// Check that every vector has the length of the first, returning it.
fn common_dimension<V: AsRef<[f32]>>(vectors: &[V]) -> Result<usize, DrapeError> {
    let first = vectors
        .first()
        .ok_or_else(|| DrapeError::EmptyInput("cannot average an empty vector list".to_string()))?;
    let dim = first.as_ref().len();

    for (index, v) in vectors.iter().enumerate().skip(1) {
        let found = v.as_ref().len();
        if found != dim {
            return Err(DrapeError::DimensionMismatch {
                index,
                expected: dim,
                found,
            });
        }
    }

    Ok(dim)
}

/// Unweighted arithmetic mean of equal-length vectors.
pub fn average<V: AsRef<[f32]>>(vectors: &[V]) -> Result<Vec<f32>, DrapeError> {
    let dim = common_dimension(vectors)?;
    let mut acc = vec![0.0_f64; dim];

    for v in vectors {
        for (slot, x) in acc.iter_mut().zip(v.as_ref()) {
            *slot += *x as f64;
        }
    }

    let n = vectors.len() as f64;
    Ok(acc.into_iter().map(|s| (s / n) as f32).collect())
}

/// Weighted mean: each dimension is `sum(v[i][d] * w[i]) / sum(w[i])`.
///
/// When the number of weights differs from the number of vectors this falls
/// back to the unweighted [`average`]. A non-positive weight sum is rejected.
pub fn weighted_average<V: AsRef<[f32]>>(
    vectors: &[V],
    weights: &[f64],
) -> Result<Vec<f32>, DrapeError> {
    if vectors.len() != weights.len() {
        return average(vectors);
    }

    let dim = common_dimension(vectors)?;
    let weight_sum: f64 = weights.iter().sum();
    if !(weight_sum > 0.0) {
        return Err(DrapeError::InvalidParameter(format!(
            "weight sum must be positive, got {}",
            weight_sum
        )));
    }

    let mut acc = vec![0.0_f64; dim];
    for (v, w) in vectors.iter().zip(weights) {
        for (slot, x) in acc.iter_mut().zip(v.as_ref()) {
            *slot += *x as f64 * w;
        }
    }

    Ok(acc.into_iter().map(|s| (s / weight_sum) as f32).collect())
}
