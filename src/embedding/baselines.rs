//! Reference embedding providers. Neither is a serious embedding method: one
//! carries no structure at all, the other just smooths random features over
//! neighbourhoods. Together they bracket what an evaluation should detect.

use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_pcg::Pcg64;
use crate::embedding::{EmbedConfig, EmbeddingMatrix, EmbeddingProvider};
use crate::error::{EvalError, Result};
use crate::graph::EvalGraph;

fn gaussian_matrix(rows: usize, dim: usize, seed: u64) -> EmbeddingMatrix {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut matrix = EmbeddingMatrix::zeros(rows, dim);
    for i in 0..rows {
        for value in matrix.row_mut(i) {
            *value = rng.sample(StandardNormal);
        }
    }
    matrix
}

/// i.i.d. standard normal rows, ignoring the graph entirely.
#[derive(Debug, Clone, Default)]
pub struct GaussianNoiseEmbedder;

impl EmbeddingProvider for GaussianNoiseEmbedder {
    fn name(&self) -> &str {
        "gaussian_noise"
    }

    fn fit_transform(&self, graph: &EvalGraph, config: &EmbedConfig) -> Result<EmbeddingMatrix> {
        Ok(gaussian_matrix(graph.node_count(), config.n_components, config.random_seed))
    }
}

/// Random Gaussian features propagated through the row-normalised `A + I`
/// for `steps` hops; the hop results are summed and every row is scaled to
/// unit length.
///
/// `EmbedConfig::params["steps"]` overrides the constructor value.
#[derive(Debug, Clone)]
pub struct AdjacencyProjectionEmbedder {
    steps: usize,
}

impl Default for AdjacencyProjectionEmbedder {
    fn default() -> Self {
        Self { steps: 2 }
    }
}

impl AdjacencyProjectionEmbedder {
    pub fn new(steps: usize) -> Self {
        Self { steps }
    }

    fn propagate(graph: &EvalGraph, input: &EmbeddingMatrix) -> EmbeddingMatrix {
        let n = graph.node_count();
        let dim = input.dim();
        let mut output = EmbeddingMatrix::zeros(n, dim);

        for node in 0..n {
            let mut total_weight = 1.0;
            let out = output.row_mut(node);
            out.copy_from_slice(input.row(node));

            if let Some(neighbors) = graph.neighbors(node) {
                for &neighbor in neighbors {
                    let weight = graph.edge_weight(node, neighbor).unwrap_or(1.0);
                    total_weight += weight;
                    for (o, x) in out.iter_mut().zip(input.row(neighbor)) {
                        *o += weight * x;
                    }
                }
            }

            for o in out.iter_mut() {
                *o /= total_weight;
            }
        }

        output
    }
}

impl EmbeddingProvider for AdjacencyProjectionEmbedder {
    fn name(&self) -> &str {
        "adjacency_projection"
    }

    fn fit_transform(&self, graph: &EvalGraph, config: &EmbedConfig) -> Result<EmbeddingMatrix> {
        let steps = config.get::<usize>("steps").unwrap_or(self.steps);
        if steps == 0 {
            return Err(EvalError::invalid_parameter("adjacency projection needs at least one step"));
        }

        let n = graph.node_count();
        let dim = config.n_components;
        let mut current = gaussian_matrix(n, dim, config.random_seed);
        let mut summed = EmbeddingMatrix::zeros(n, dim);

        for _ in 0..steps {
            current = Self::propagate(graph, &current);
            for node in 0..n {
                for (s, c) in summed.row_mut(node).iter_mut().zip(current.row(node)) {
                    *s += c;
                }
            }
        }

        for node in 0..n {
            let row = summed.row_mut(node);
            let norm = row.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > 0.0 {
                for x in row.iter_mut() {
                    *x /= norm;
                }
            }
        }

        Ok(summed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::barbell;

    #[test]
    fn test_gaussian_noise_shape_and_seed() {
        let graph = barbell(5).unwrap();
        let config = EmbedConfig::new(8, 1);

        let a = GaussianNoiseEmbedder.fit_transform(&graph, &config).unwrap();
        let b = GaussianNoiseEmbedder.fit_transform(&graph, &config).unwrap();
        let c = GaussianNoiseEmbedder.fit_transform(&graph, &EmbedConfig::new(8, 2)).unwrap();

        assert_eq!(a.nrows(), 10);
        assert_eq!(a.dim(), 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_gaussian_noise_is_standard_normal() {
        let graph = EvalGraph::from_indexed_edges(2000, &[], false).unwrap();
        let embedding = GaussianNoiseEmbedder.fit_transform(&graph, &EmbedConfig::new(8, 11)).unwrap();

        let values = embedding.as_slice();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        assert!(mean.abs() < 0.05, "mean {}", mean);
        assert!((variance - 1.0).abs() < 0.05, "variance {}", variance);
        assert!(values.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_projection_rows_are_unit_length() {
        let graph = barbell(6).unwrap();
        let embedding = AdjacencyProjectionEmbedder::default()
            .fit_transform(&graph, &EmbedConfig::new(16, 3))
            .unwrap();

        for i in 0..embedding.nrows() {
            let norm = embedding.dot(i, i).sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_projection_places_clique_members_together() {
        let graph = barbell(8).unwrap();
        let embedding = AdjacencyProjectionEmbedder::default()
            .fit_transform(&graph, &EmbedConfig::new(32, 5))
            .unwrap();

        // Nodes 1 and 2 share a clique, node 12 sits in the other one
        assert!(embedding.dot(1, 2) > embedding.dot(1, 12));
    }

    #[test]
    fn test_zero_steps_rejected() {
        let graph = barbell(3).unwrap();
        let config = EmbedConfig::new(4, 0).with_param("steps", 0usize);

        assert!(AdjacencyProjectionEmbedder::default().fit_transform(&graph, &config).is_err());
    }
}
