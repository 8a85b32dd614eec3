use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{AppError, AppResult};

/// A candidate position and its similarity to the query position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub position: usize,
    pub score: f64,
}

/// Square matrix of precomputed pairwise similarity scores
///
/// Stored row-major. Only row `i` is read when querying position `i`, so the
/// matrix does not have to be symmetric. All scores are finite, which makes
/// the ranking order total.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    dim: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// Builds a matrix from its rows, rejecting ragged or non-finite input
    pub fn from_rows(rows: Vec<Vec<f64>>) -> AppResult<Self> {
        let dim = rows.len();
        let mut scores = Vec::with_capacity(dim * dim);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(AppError::DataCorrupt(format!(
                    "similarity matrix is not square: row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
            if let Some(j) = row.iter().position(|s| !s.is_finite()) {
                return Err(AppError::DataCorrupt(format!(
                    "similarity matrix has a non-finite score at ({}, {})",
                    i, j
                )));
            }
            // -0.0 and 0.0 must tie so the position tie-break applies.
            scores.extend(row.into_iter().map(|s| if s == 0.0 { 0.0 } else { s }));
        }

        Ok(Self { dim, scores })
    }

    /// Deserializes a JSON array of rows
    pub fn from_json(bytes: &[u8]) -> AppResult<Self> {
        let rows: Vec<Vec<f64>> = serde_json::from_slice(bytes)
            .map_err(|e| AppError::DataCorrupt(format!("similarity matrix: {}", e)))?;
        Self::from_rows(rows)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, position: usize) -> AppResult<&[f64]> {
        if position >= self.dim {
            return Err(AppError::OutOfRange {
                position,
                len: self.dim,
            });
        }
        let start = position * self.dim;
        Ok(&self.scores[start..start + self.dim])
    }

    /// The `k` positions most similar to `position`, best first
    ///
    /// Scores sort descending and ties go to the lower position. The query
    /// position is excluded by identity even when its self-score is not the
    /// row maximum. Returns `min(k, dim - 1)` neighbors.
    pub fn top_k_similar(&self, position: usize, k: usize) -> AppResult<Vec<Neighbor>> {
        let row = self.row(position)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<Neighbor> = row
            .iter()
            .enumerate()
            .filter(|(candidate, _)| *candidate != position)
            .map(|(candidate, &score)| Neighbor {
                position: candidate,
                score,
            })
            .collect();

        if k < candidates.len() {
            candidates.select_nth_unstable_by(k - 1, rank_order);
            candidates.truncate(k);
        }
        candidates.sort_unstable_by(rank_order);

        Ok(candidates)
    }
}

/// Descending score, then ascending position
fn rank_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.position.cmp(&b.position))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_matrix() -> SimilarityMatrix {
        SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.9, 0.1],
            vec![0.9, 1.0, 0.3, 0.2],
            vec![0.9, 0.3, 1.0, 0.5],
            vec![0.1, 0.2, 0.5, 1.0],
        ])
        .unwrap()
    }

    fn positions(neighbors: &[Neighbor]) -> Vec<usize> {
        neighbors.iter().map(|n| n.position).collect()
    }

    #[test]
    fn test_top_k_breaks_ties_by_position() {
        let matrix = scenario_matrix();
        let top = matrix.top_k_similar(0, 2).unwrap();
        assert_eq!(positions(&top), vec![1, 2]);
        assert_eq!(top[0].score, 0.9);
    }

    #[test]
    fn test_oversized_k_returns_all_others() {
        let matrix = scenario_matrix();
        let top = matrix.top_k_similar(0, 10).unwrap();
        assert_eq!(positions(&top), vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_k_is_empty() {
        let matrix = scenario_matrix();
        assert!(matrix.top_k_similar(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_position() {
        let matrix = scenario_matrix();
        assert!(matches!(
            matrix.top_k_similar(4, 2),
            Err(AppError::OutOfRange { position: 4, len: 4 })
        ));
    }

    #[test]
    fn test_out_of_range_checked_before_zero_k() {
        let matrix = scenario_matrix();
        assert!(matrix.top_k_similar(9, 0).is_err());
    }

    #[test]
    fn test_excludes_query_even_when_self_score_is_not_max() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![0.0, 0.4, 0.8],
            vec![0.4, 1.0, 0.2],
            vec![0.8, 0.2, 1.0],
        ])
        .unwrap();
        let top = matrix.top_k_similar(0, 5).unwrap();
        assert_eq!(positions(&top), vec![2, 1]);
    }

    #[test]
    fn test_does_not_drop_other_perfect_matches() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 1.0, 0.5],
            vec![1.0, 1.0, 0.5],
            vec![0.5, 0.5, 1.0],
        ])
        .unwrap();
        let top = matrix.top_k_similar(1, 1).unwrap();
        assert_eq!(positions(&top), vec![0]);
    }

    #[test]
    fn test_asymmetric_rows_are_read_independently() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.1, 0.9],
            vec![0.9, 1.0, 0.1],
            vec![0.1, 0.9, 1.0],
        ])
        .unwrap();
        assert_eq!(positions(&matrix.top_k_similar(0, 1).unwrap()), vec![2]);
        assert_eq!(positions(&matrix.top_k_similar(1, 1).unwrap()), vec![0]);
    }

    #[test]
    fn test_properties_hold_for_every_position_and_k() {
        // Deterministic pseudo-random scores with plenty of ties.
        let n = 12;
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| ((i * 7 + j * 13) % 5) as f64 / 4.0).collect())
            .collect();
        let matrix = SimilarityMatrix::from_rows(rows).unwrap();

        for p in 0..n {
            for k in 0..=n + 2 {
                let top = matrix.top_k_similar(p, k).unwrap();
                assert_eq!(top.len(), k.min(n - 1));
                assert!(top.iter().all(|nb| nb.position != p));
                for pair in top.windows(2) {
                    assert!(pair[0].score >= pair[1].score);
                    if pair[0].score == pair[1].score {
                        assert!(pair[0].position < pair[1].position);
                    }
                }
                // Partial selection agrees with the prefix of the full ranking.
                let full = matrix.top_k_similar(p, n).unwrap();
                assert_eq!(top[..], full[..top.len()]);
                assert_eq!(matrix.top_k_similar(p, k).unwrap(), top);
            }
        }
    }

    #[test]
    fn test_signed_zero_scores_tie_by_position() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, -0.0, 0.0],
            vec![-0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let top = matrix.top_k_similar(0, 2).unwrap();
        assert_eq!(top[0].score, top[1].score);
        assert_eq!(positions(&top), vec![1, 2]);
    }

    #[test]
    fn test_single_movie_has_no_neighbors() {
        let matrix = SimilarityMatrix::from_rows(vec![vec![1.0]]).unwrap();
        assert!(matrix.top_k_similar(0, 5).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_square() {
        let result = SimilarityMatrix::from_rows(vec![vec![1.0, 0.5], vec![0.5]]);
        assert!(matches!(result, Err(AppError::DataCorrupt(_))));
    }

    #[test]
    fn test_rejects_non_finite_scores() {
        let result = SimilarityMatrix::from_rows(vec![vec![1.0, f64::NAN], vec![0.5, 1.0]]);
        assert!(matches!(result, Err(AppError::DataCorrupt(_))));
    }

    #[test]
    fn test_from_json() {
        let matrix = SimilarityMatrix::from_json(b"[[1.0, 0.25], [0.25, 1]]").unwrap();
        assert_eq!(matrix.dim(), 2);
        assert_eq!(matrix.row(1).unwrap(), &[0.25, 1.0]);
        assert!(matches!(
            SimilarityMatrix::from_json(b"{\"rows\": []}"),
            Err(AppError::DataCorrupt(_))
        ));
    }
}
