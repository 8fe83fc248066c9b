use serde::{Deserialize, Serialize};

use crate::matching::MatchError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub profile: f64,
    pub culture: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            profile: 0.7,
            culture: 0.3,
        }
    }
}

/// Cosine similarity of two equal-length vectors.
/// Returns 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, MatchError> {
    if a.len() != b.len() {
        return Err(MatchError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0_f64, 0.0_f64, 0.0_f64), |acc, (x, y)| {
        let (x, y) = (f64::from(*x), f64::from(*y));
        (acc.0 + x * y, acc.1 + x * x, acc.2 + y * y)
    });

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / denom)
}

/// Culture similarity, or 0.0 when either side has no culture embedding.
pub fn culture_similarity(
    job: Option<&[f32]>,
    candidate: Option<&[f32]>,
) -> Result<f64, MatchError> {
    match (job, candidate) {
        (Some(j), Some(c)) => cosine_similarity(j, c),
        _ => Ok(0.0),
    }
}

/// Weighted ranking score: `profile * 0.7 + culture * 0.3` by default.
pub fn compute_combined_score(profile: f64, culture: f64, weights: &ScoreWeights) -> f64 {
    profile * weights.profile + culture * weights.culture
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_score_one() {
        for v in [vec![1.0_f32, 0.0, 0.0], vec![0.3, -0.7, 2.5, 9.0], vec![-4.0]] {
            let sim = cosine_similarity(&v, &v).unwrap();
            assert!((sim - 1.0).abs() < 1e-9, "similarity was {sim}");
        }
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let zero = vec![0.0_f32; 3];
        let v = vec![1.0_f32, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&v, &zero).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let err = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]).unwrap_err();
        assert_eq!(err, MatchError::DimensionMismatch { left: 3, right: 2 });
    }

    #[test]
    fn test_opposite_and_orthogonal_vectors() {
        let sim = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-9);
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 5.0]).unwrap();
        assert!(sim.abs() < 1e-12);
    }

    #[test]
    fn test_combined_score_formula() {
        let score = compute_combined_score(0.8, 0.5, &ScoreWeights::default());
        assert!((score - 0.71).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_missing_culture_side_scores_zero() {
        let v = [1.0_f32, 1.0];
        assert_eq!(culture_similarity(None, Some(&v)).unwrap(), 0.0);
        assert_eq!(culture_similarity(Some(&v), None).unwrap(), 0.0);
        let sim = culture_similarity(Some(&v), Some(&v)).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_culture_dimension_mismatch_propagates() {
        let a = [1.0_f32, 1.0];
        let b = [1.0_f32];
        assert!(culture_similarity(Some(&a), Some(&b)).is_err());
    }
}
