use rayon::prelude::*;
use crate::config::HarnessConfig;
use crate::embedding::{embed_checked, EmbeddingProvider};
use crate::error::{EvalError, Result};
use crate::evaluation::{evaluate_clusters, evaluate_labels, LinkPredictionEvaluator};
use crate::graph::EvalGraph;
use crate::labels::LabelSet;
use crate::report::RunReport;
use crate::sampling::EdgeSplitter;

/// Runs every applicable downstream task for one embedding provider.
///
/// The provider is called once on the train graph (link prediction) and,
/// when ground truth exists, once on the full graph (clustering and label
/// prediction).
#[derive(Debug, Clone)]
pub struct EvaluationHarness {
    config: HarnessConfig,
}

impl EvaluationHarness {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        graph: &EvalGraph,
        labels: &LabelSet,
        provider: &dyn EmbeddingProvider,
    ) -> Result<RunReport> {
        let config = &self.config;
        if labels.has_labels() && labels.len() != graph.node_count() {
            return Err(EvalError::shape_mismatch(
                "labelled nodes vs graph nodes",
                graph.node_count(),
                labels.len(),
            ));
        }

        log::info!(
            "Evaluating {} on {} nodes / {} edges (seed {})",
            provider.name(), graph.node_count(), graph.edge_count(), config.seed
        );

        let split = EdgeSplitter::new(config.split).split(graph, config.testing_ratio, config.seed)?;
        let train_embedding = embed_checked(provider, &split.train_graph, &config.embed)?;

        let mut report = RunReport::new(provider.name());
        report.link_prediction = LinkPredictionEvaluator::new(config.bank())
            .with_feature_mode(config.feature_mode)
            .with_negative_ratio(config.negative_ratio)
            .with_test_size(config.test_size)
            .evaluate(&train_embedding, graph, &split, config.seed)?;

        if labels.has_labels() {
            let embedding = embed_checked(provider, graph, &config.embed)?;

            if labels.is_multi_label() {
                log::info!("{}: multi-label ground truth, clustering skipped", provider.name());
            } else {
                report.clustering = Some(evaluate_clusters(
                    &embedding,
                    labels,
                    config.clustering.n_clusters,
                    config.clustering.linkage,
                )?);
            }

            report.label_prediction = Some(evaluate_labels(
                &embedding,
                labels,
                config.test_size,
                config.seed.wrapping_add(2),
                &config.bank(),
            )?);
        } else {
            log::info!("{}: no ground-truth labels, clustering and label prediction skipped", provider.name());
        }

        for metric_report in report.reports() {
            log::info!("{}: {}", provider.name(), metric_report);
        }

        Ok(report)
    }

    /// Evaluate independent providers in parallel, one per task, on a pool
    /// of `workers` threads. Reports come back in provider order.
    pub fn evaluate_many(
        &self,
        graph: &EvalGraph,
        labels: &LabelSet,
        providers: &[&dyn EmbeddingProvider],
    ) -> Result<Vec<RunReport>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| EvalError::invalid_parameter(format!("cannot build worker pool: {}", e)))?;

        pool.install(|| {
            providers.par_iter()
                .map(|provider| self.evaluate(graph, labels, *provider))
                .collect()
        })
    }
}
