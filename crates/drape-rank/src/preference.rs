// crates/drape-rank/src/preference.rs
//
// Recency-weighted preference vector.

use drape_core::vector::weighted_average;
use drape_core::DrapeError;

/// Combine an oldest-first window of vectors into one preference vector.
///
/// The i-th vector (0-based, oldest first) gets weight `i + 1`, so the newest
/// like counts most.
pub fn preference_vector<V: AsRef<[f32]>>(window: &[V]) -> Result<Vec<f32>, DrapeError> {
    let weights: Vec<f64> = (1..=window.len()).map(|w| w as f64).collect();
    weighted_average(window, &weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_vector_is_returned_unchanged() {
        let v = vec![0.3f32, -0.4, 0.5];
        assert_eq!(preference_vector(&[v.clone()]).unwrap(), v);
    }

    #[test]
    fn three_vectors_weighted_one_two_three() {
        let window = vec![vec![6.0f32, 0.0], vec![0.0, 6.0], vec![6.0, 6.0]];
        // (1*6 + 3*6) / 6 = 4, (2*6 + 3*6) / 6 = 5
        assert_eq!(preference_vector(&window).unwrap(), vec![4.0, 5.0]);
    }

    #[test]
    fn empty_window_is_an_error() {
        let window: Vec<Vec<f32>> = Vec::new();
        assert!(matches!(
            preference_vector(&window),
            Err(DrapeError::EmptyInput(_))
        ));
    }
}
