pub mod baselines;

use serde::{Deserialize, Serialize};
use crate::error::{EvalError, Result};
use crate::graph::EvalGraph;

pub use baselines::{AdjacencyProjectionEmbedder, GaussianNoiseEmbedder};

/// Dense `N × d` node embedding; row `i` belongs to the node with dense index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Vec<f64>,
    rows: usize,
    dim: usize,
}

impl EmbeddingMatrix {
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self {
            data: vec![0.0; rows * dim],
            rows,
            dim,
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let dim = rows.first().map_or(0, |r| r.len());
        let n = rows.len();
        let mut data = Vec::with_capacity(n * dim);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(EvalError::shape_mismatch(
                    format!("embedding row {} width", i),
                    dim,
                    row.len(),
                ));
            }
            data.extend(row);
        }
        Ok(Self { data, rows: n, dim })
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn dot(&self, a: usize, b: usize) -> f64 {
        self.row(a).iter().zip(self.row(b)).map(|(x, y)| x * y).sum()
    }

    /// Fail with `ShapeMismatch` unless there is exactly one row per graph node.
    pub fn check_rows(&self, graph: &EvalGraph) -> Result<()> {
        if self.rows != graph.node_count() {
            return Err(EvalError::shape_mismatch(
                "embedding rows vs graph nodes",
                graph.node_count(),
                self.rows,
            ));
        }
        Ok(())
    }
}

/// Options handed to an embedding provider. Unknown, provider-specific options
/// travel in `params`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    pub n_components: usize,
    pub random_seed: u64,
    pub max_epoch: Option<usize>,
    pub tol: Option<f64>,
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            n_components: 32,
            random_seed: 42,
            max_epoch: None,
            tol: None,
            params: serde_json::Map::new(),
        }
    }
}

impl EmbedConfig {
    pub fn new(n_components: usize, random_seed: u64) -> Self {
        Self {
            n_components,
            random_seed,
            ..Self::default()
        }
    }

    pub fn with_param<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.params.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
        self
    }

    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.params.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Any embedding algorithm: a black box from a graph to an `N × n_components` matrix.
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    fn fit_transform(&self, graph: &EvalGraph, config: &EmbedConfig) -> Result<EmbeddingMatrix>;
}

/// Run `provider` and check the output shape. The numeric content is not inspected.
pub fn embed_checked(
    provider: &dyn EmbeddingProvider,
    graph: &EvalGraph,
    config: &EmbedConfig,
) -> Result<EmbeddingMatrix> {
    let embedding = provider.fit_transform(graph, config)?;
    embedding.check_rows(graph)?;
    if embedding.dim() != config.n_components {
        return Err(EvalError::shape_mismatch(
            format!("{} embedding columns vs n_components", provider.name()),
            config.n_components,
            embedding.dim(),
        ));
    }
    Ok(embedding)
}

/// Adapts a closure into an [`EmbeddingProvider`].
pub struct FnProvider<F> {
    name: String,
    f: F,
}

impl<F> FnProvider<F>
where
    F: Fn(&EvalGraph, &EmbedConfig) -> Result<EmbeddingMatrix> + Send + Sync,
{
    pub fn new<S: Into<String>>(name: S, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> EmbeddingProvider for FnProvider<F>
where
    F: Fn(&EvalGraph, &EmbedConfig) -> Result<EmbeddingMatrix> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fit_transform(&self, graph: &EvalGraph, config: &EmbedConfig) -> Result<EmbeddingMatrix> {
        (self.f)(graph, config)
    }
}
