use crate::embedding::EmbeddingMatrix;
use crate::error::{EvalError, Result};

/// Row-major `samples × features` design matrix fed to the classifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    samples: usize,
    features: usize,
}

impl FeatureMatrix {
    pub fn zeros(samples: usize, features: usize) -> Self {
        Self {
            data: vec![0.0; samples * features],
            samples,
            features,
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let features = rows.first().map_or(0, |r| r.len());
        let samples = rows.len();
        let mut data = Vec::with_capacity(samples * features);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != features {
                return Err(EvalError::shape_mismatch(
                    format!("feature row {} width", i),
                    features,
                    row.len(),
                ));
            }
            data.extend(row);
        }
        Ok(Self { data, samples, features })
    }

    /// Node embedding rows used directly as features.
    pub fn from_embedding(embedding: &EmbeddingMatrix) -> Self {
        Self {
            data: embedding.as_slice().to_vec(),
            samples: embedding.nrows(),
            features: embedding.dim(),
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn features(&self) -> usize {
        self.features
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.features..(i + 1) * self.features]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.features..(i + 1) * self.features]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.features + j]
    }

    /// New matrix holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.features);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            data,
            samples: indices.len(),
            features: self.features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_matrix_creation() {
        let matrix = FeatureMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();

        assert_eq!(matrix.samples(), 2);
        assert_eq!(matrix.features(), 2);
        assert_eq!(matrix.get(1, 0), 3.0);
    }

    #[test]
    fn test_select_rows() {
        let matrix = FeatureMatrix::from_rows(vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let picked = matrix.select_rows(&[2, 0]);

        assert_eq!(picked.samples(), 2);
        assert_eq!(picked.row(0), &[3.0]);
        assert_eq!(picked.row(1), &[1.0]);
    }
}
