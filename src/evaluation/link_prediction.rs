use crate::embedding::EmbeddingMatrix;
use crate::error::{EvalError, Result};
use crate::graph::EvalGraph;
use crate::metrics::{average_precision, roc_auc};
use crate::ml::{edge_features, ClassifierBank, ClassifierKind, EdgeFeatureMode, Target};
use crate::report::MetricReport;
use crate::sampling::{EdgeSplit, NegativeSampler};

pub const LINK_PREDICTION_TASK: &str = "link_prediction";

/// Scores a train-graph embedding on held-out edges against sampled non-edges.
#[derive(Debug, Clone)]
pub struct LinkPredictionEvaluator {
    bank: ClassifierBank,
    feature_mode: EdgeFeatureMode,
    negative_ratio: f64,
    test_size: f64,
}

impl Default for LinkPredictionEvaluator {
    fn default() -> Self {
        Self::new(ClassifierBank::default())
    }
}

impl LinkPredictionEvaluator {
    pub fn new(bank: ClassifierBank) -> Self {
        Self {
            bank,
            feature_mode: EdgeFeatureMode::default(),
            negative_ratio: 1.0,
            test_size: 0.5,
        }
    }

    pub fn with_feature_mode(mut self, mode: EdgeFeatureMode) -> Self {
        self.feature_mode = mode;
        self
    }

    pub fn with_negative_ratio(mut self, ratio: f64) -> Self {
        self.negative_ratio = ratio;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Held-out positives followed by sampled negatives, with their labels.
    /// Negatives are non-edges of the original `graph`, drawn with `seed + 1`,
    /// so no removed edge can come back as a negative.
    pub fn labelled_pairs(
        &self,
        graph: &EvalGraph,
        split: &EdgeSplit,
        seed: u64,
    ) -> Result<(Vec<(usize, usize)>, Vec<bool>)> {
        if split.held_out.is_empty() {
            return Err(EvalError::empty_evaluation_set("no held-out edges to score"));
        }
        if !(self.negative_ratio > 0.0 && self.negative_ratio.is_finite()) {
            return Err(EvalError::invalid_parameter(format!(
                "negative_ratio must be positive, got {}", self.negative_ratio
            )));
        }

        let negative_count = ((self.negative_ratio * split.held_out.len() as f64).round() as usize).max(1);
        let negatives = NegativeSampler::new().sample(graph, negative_count, seed.wrapping_add(1))?;

        let mut pairs = split.held_out.clone();
        pairs.extend_from_slice(&negatives);
        let labels: Vec<bool> = (0..pairs.len()).map(|i| i < split.held_out.len()).collect();
        Ok((pairs, labels))
    }

    /// Scores `embedding` on [`labelled_pairs`](Self::labelled_pairs). The
    /// classifiers split the labelled pairs with `seed + 2`.
    ///
    /// Returns one report per classifier followed by the raw dot-product score.
    pub fn evaluate(
        &self,
        embedding: &EmbeddingMatrix,
        graph: &EvalGraph,
        split: &EdgeSplit,
        seed: u64,
    ) -> Result<Vec<MetricReport>> {
        embedding.check_rows(graph)?;
        let (pairs, labels) = self.labelled_pairs(graph, split, seed)?;

        log::debug!(
            "link prediction: {} positives, {} negatives, {} features",
            split.held_out.len(), pairs.len() - split.held_out.len(), self.feature_mode.name()
        );

        let features = edge_features(embedding, &pairs, self.feature_mode)?;
        let target = Target::Binary(labels.clone());

        let mut reports = Vec::with_capacity(ClassifierKind::ALL.len() + 1);
        for kind in ClassifierKind::ALL {
            reports.push(self.bank.train_and_score(
                kind,
                &features,
                &target,
                self.test_size,
                seed.wrapping_add(2),
                LINK_PREDICTION_TASK,
            )?);
        }

        let scores: Vec<f64> = pairs.iter().map(|&(u, v)| embedding.dot(u, v)).collect();
        reports.push(
            MetricReport::new(LINK_PREDICTION_TASK, "dot_product")
                .with_metric("auc_roc", roc_auc(&scores, &labels)?)
                .with_metric("auc_pr", average_precision(&scores, &labels)?),
        );

        Ok(reports)
    }
}
