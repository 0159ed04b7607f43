use serde::{Deserialize, Serialize};
use crate::algorithms::{AgglomerativeClustering, Linkage};
use crate::embedding::EmbeddingMatrix;
use crate::error::{EvalError, Result};
use crate::labels::LabelSet;
use crate::metrics::Contingency;
use crate::report::MetricReport;

pub const CLUSTERING_TASK: &str = "clustering";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub linkage: Linkage,
    /// Overrides the number of distinct ground-truth labels.
    pub n_clusters: Option<usize>,
}

/// Cluster the embedding and compare the flat clusters to the ground-truth
/// communities. Only single-label ground truth has a partition to compare to.
pub fn evaluate_clusters(
    embedding: &EmbeddingMatrix,
    labels: &LabelSet,
    n_clusters: Option<usize>,
    linkage: Linkage,
) -> Result<MetricReport> {
    let (classes, assignments) = match labels {
        LabelSet::NoLabels => {
            return Err(EvalError::empty_evaluation_set("clustering needs ground-truth labels"));
        }
        LabelSet::MultiLabel { .. } => {
            return Err(EvalError::unsupported_label_shape(
                "clustering compares against a partition; multi-label ground truth is not one"
            ));
        }
        LabelSet::SingleLabel { classes, assignments } => (classes, assignments),
    };

    if embedding.nrows() != assignments.len() {
        return Err(EvalError::shape_mismatch(
            "embedding rows vs labelled nodes",
            assignments.len(),
            embedding.nrows(),
        ));
    }

    let k = n_clusters.unwrap_or(classes.len());
    let predicted = AgglomerativeClustering::new(linkage).fit_predict(embedding, k)?;
    let table = Contingency::new(assignments, &predicted)?;

    log::debug!("clustering: {} nodes, {} clusters, {} linkage", table.n(), k, linkage.name());

    Ok(MetricReport::new(CLUSTERING_TASK, format!("agglomerative_{}", linkage.name()))
        .with_metric("adjusted_mutual_info", table.adjusted_mutual_info())
        .with_metric("normalized_mutual_info", table.normalized_mutual_info())
        .with_metric("mutual_info", table.mutual_info())
        .with_metric("adjusted_rand_index", table.adjusted_rand_index())
        .with_metric("rand_index", table.rand_index())
        .with_metric("fowlkes_mallows", table.fowlkes_mallows()))
}
