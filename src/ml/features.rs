use serde::{Deserialize, Serialize};
use crate::embedding::EmbeddingMatrix;
use crate::error::{EvalError, Result};
use crate::ml::FeatureMatrix;

/// How two endpoint embeddings combine into one edge feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeFeatureMode {
    /// `a * b`, elementwise. Symmetric in the endpoints.
    #[default]
    Hadamard,
    /// `|a - b|`, elementwise (weighted-L1).
    AbsDifference,
    /// `[a, b]`, order sensitive.
    Concat,
    /// `(a + b) / 2`
    Average,
    /// `(a - b)^2`, elementwise (weighted-L2).
    SquaredDifference,
}

impl EdgeFeatureMode {
    pub fn output_dim(&self, dim: usize) -> usize {
        match self {
            EdgeFeatureMode::Concat => 2 * dim,
            _ => dim,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EdgeFeatureMode::Hadamard => "hadamard",
            EdgeFeatureMode::AbsDifference => "abs_difference",
            EdgeFeatureMode::Concat => "concat",
            EdgeFeatureMode::Average => "average",
            EdgeFeatureMode::SquaredDifference => "squared_difference",
        }
    }

    fn combine(&self, a: &[f64], b: &[f64], out: &mut [f64]) {
        let op: fn(f64, f64) -> f64 = match self {
            EdgeFeatureMode::Concat => {
                let (left, right) = out.split_at_mut(a.len());
                left.copy_from_slice(a);
                right.copy_from_slice(b);
                return;
            }
            EdgeFeatureMode::Hadamard => |x: f64, y: f64| x * y,
            EdgeFeatureMode::AbsDifference => |x: f64, y: f64| (x - y).abs(),
            EdgeFeatureMode::Average => |x: f64, y: f64| (x + y) / 2.0,
            EdgeFeatureMode::SquaredDifference => |x: f64, y: f64| (x - y) * (x - y),
        };

        for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
            *o = op(*x, *y);
        }
    }
}

/// One feature row per pair, built from the embedding rows of its endpoints.
pub fn edge_features(
    embedding: &EmbeddingMatrix,
    pairs: &[(usize, usize)],
    mode: EdgeFeatureMode,
) -> Result<FeatureMatrix> {
    let n = embedding.nrows();
    let mut features = FeatureMatrix::zeros(pairs.len(), mode.output_dim(embedding.dim()));

    for (i, &(u, v)) in pairs.iter().enumerate() {
        if u >= n || v >= n {
            return Err(EvalError::shape_mismatch(
                format!("edge ({}, {}) endpoint vs embedding rows", u, v),
                n,
                u.max(v) + 1,
            ));
        }
        mode.combine(embedding.row(u), embedding.row(v), features.row_mut(i));
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding() -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows(vec![
            vec![1.0, 2.0],
            vec![3.0, -1.0],
            vec![0.5, 0.5],
        ]).unwrap()
    }

    #[test]
    fn test_hadamard_features() {
        let features = edge_features(&embedding(), &[(0, 1), (1, 2)], EdgeFeatureMode::Hadamard).unwrap();

        assert_eq!(features.samples(), 2);
        assert_eq!(features.features(), 2);
        assert_eq!(features.row(0), &[3.0, -2.0]);
        assert_eq!(features.row(1), &[1.5, -0.5]);
    }

    #[test]
    fn test_symmetric_modes_ignore_orientation() {
        let e = embedding();
        for mode in [
            EdgeFeatureMode::Hadamard,
            EdgeFeatureMode::AbsDifference,
            EdgeFeatureMode::Average,
            EdgeFeatureMode::SquaredDifference,
        ] {
            let forward = edge_features(&e, &[(0, 1)], mode).unwrap();
            let backward = edge_features(&e, &[(1, 0)], mode).unwrap();
            assert_eq!(forward, backward, "mode {}", mode.name());
        }
    }

    #[test]
    fn test_difference_modes() {
        let e = embedding();
        let l1 = edge_features(&e, &[(0, 1)], EdgeFeatureMode::AbsDifference).unwrap();
        let l2 = edge_features(&e, &[(0, 1)], EdgeFeatureMode::SquaredDifference).unwrap();

        assert_eq!(l1.row(0), &[2.0, 3.0]);
        assert_eq!(l2.row(0), &[4.0, 9.0]);
    }

    #[test]
    fn test_concat_doubles_width() {
        let features = edge_features(&embedding(), &[(2, 0)], EdgeFeatureMode::Concat).unwrap();

        assert_eq!(features.features(), 4);
        assert_eq!(features.row(0), &[0.5, 0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_out_of_range_endpoint() {
        let err = edge_features(&embedding(), &[(0, 3)], EdgeFeatureMode::Hadamard).unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_mode_from_json() {
        let mode: EdgeFeatureMode = serde_json::from_str("\"abs_difference\"").unwrap();
        assert_eq!(mode, EdgeFeatureMode::AbsDifference);
    }
}
