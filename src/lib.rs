pub mod algorithms;
pub mod config;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod graph;
pub mod labels;
pub mod metrics;
pub mod ml;
pub mod report;
pub mod sampling;

pub use algorithms::{AgglomerativeClustering, Linkage, UnionFind, WeaklyConnectedComponents};
pub use config::HarnessConfig;
pub use embedding::{
    embed_checked, AdjacencyProjectionEmbedder, EmbedConfig, EmbeddingMatrix, EmbeddingProvider,
    FnProvider, GaussianNoiseEmbedder,
};
pub use error::{EvalError, Result};
pub use evaluation::{
    evaluate_clusters, evaluate_labels, ClusteringConfig, EvaluationHarness, LinkPredictionEvaluator,
};
pub use graph::{barbell, planted_partition, ring_of_cliques, EvalGraph, GraphIndexes, PlantedPartition};
pub use labels::LabelSet;
pub use metrics::Contingency;
pub use ml::{
    edge_features, BinaryClassifier, BoostingConfig, ClassifierBank, ClassifierKind, EdgeFeatureMode,
    FeatureMatrix, GradientBoosting, LogisticConfig, LogisticRegression, Target,
};
pub use report::{reports_to_record_batch, MetricReport, RunReport};
pub use sampling::{sample_negative, split, EdgeSplit, EdgeSplitter, NegativeSampler, SplitOptions};

pub mod prelude {
    pub use crate::config::HarnessConfig;
    pub use crate::embedding::{
        AdjacencyProjectionEmbedder, EmbedConfig, EmbeddingMatrix, EmbeddingProvider, FnProvider,
        GaussianNoiseEmbedder,
    };
    pub use crate::error::{EvalError, Result};
    pub use crate::evaluation::EvaluationHarness;
    pub use crate::graph::{planted_partition, EvalGraph};
    pub use crate::labels::LabelSet;
    pub use crate::report::{MetricReport, RunReport};
}
