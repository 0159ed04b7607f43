pub mod clustering;
pub mod harness;
pub mod labels;
pub mod link_prediction;

pub use clustering::{evaluate_clusters, ClusteringConfig, CLUSTERING_TASK};
pub use harness::EvaluationHarness;
pub use labels::{evaluate_labels, LABEL_PREDICTION_TASK};
pub use link_prediction::{LinkPredictionEvaluator, LINK_PREDICTION_TASK};
