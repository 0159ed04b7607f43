use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use crate::error::{EvalError, Result};
use crate::ml::logistic::sigmoid;
use crate::ml::{BinaryClassifier, FeatureMatrix};

/// Gradient boosting settings. No row or column subsampling, so a fit is a
/// pure function of its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Regression tree fitted to the negative gradient; leaves hold one Newton
/// step for the logistic loss.
#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    fn fit(
        x: &FeatureMatrix,
        residuals: &[f64],
        hessians: &[f64],
        config: &BoostingConfig,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let indices: Vec<usize> = (0..x.samples()).collect();
        tree.grow(x, residuals, hessians, indices, 0, config);
        tree
    }

    fn grow(
        &mut self,
        x: &FeatureMatrix,
        residuals: &[f64],
        hessians: &[f64],
        indices: Vec<usize>,
        depth: usize,
        config: &BoostingConfig,
    ) -> usize {
        let slot = self.nodes.len();
        self.nodes.push(TreeNode::Leaf(0.0));

        let split = if depth < config.max_depth && indices.len() >= 2 * config.min_samples_leaf {
            Self::best_split(x, residuals, &indices, config.min_samples_leaf)
        } else {
            None
        };

        match split {
            Some(candidate) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices.iter()
                    .partition(|&&i| x.get(i, candidate.feature) <= candidate.threshold);
                let left = self.grow(x, residuals, hessians, left_idx, depth + 1, config);
                let right = self.grow(x, residuals, hessians, right_idx, depth + 1, config);
                self.nodes[slot] = TreeNode::Split {
                    feature: candidate.feature,
                    threshold: candidate.threshold,
                    left,
                    right,
                };
            }
            None => {
                let numerator: f64 = indices.iter().map(|&i| residuals[i]).sum();
                let denominator: f64 = indices.iter().map(|&i| hessians[i]).sum();
                let value = if denominator.abs() < 1e-150 { 0.0 } else { numerator / denominator };
                self.nodes[slot] = TreeNode::Leaf(value);
            }
        }
        slot
    }

    /// Exact greedy search for the split with the largest squared-error reduction.
    fn best_split(
        x: &FeatureMatrix,
        residuals: &[f64],
        indices: &[usize],
        min_samples_leaf: usize,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let total: f64 = indices.iter().map(|&i| residuals[i]).sum();
        let parent_score = total * total / n as f64;
        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();

        for feature in 0..x.features() {
            order.sort_by(|&a, &b| {
                x.get(a, feature).partial_cmp(&x.get(b, feature)).unwrap_or(Ordering::Equal)
            });

            let mut left_sum = 0.0;
            for k in 0..(n - 1) {
                left_sum += residuals[order[k]];
                let left_count = k + 1;
                let right_count = n - left_count;
                if left_count < min_samples_leaf || right_count < min_samples_leaf {
                    continue;
                }

                let here = x.get(order[k], feature);
                let next = x.get(order[k + 1], feature);
                if here >= next {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / left_count as f64
                    + right_sum * right_sum / right_count as f64
                    - parent_score;

                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mut threshold = here + (next - here) / 2.0;
                    // Midpoint can round up to `next` for adjacent floats
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(SplitCandidate { feature, threshold, gain });
                }
            }
        }

        best
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf(value) => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], index: usize) -> usize {
            match &nodes[index] {
                TreeNode::Leaf(_) => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Gradient-boosted regression trees under the binary logistic loss.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    config: BoostingConfig,
    init: f64,
    trees: Vec<RegressionTree>,
    features: usize,
}

impl GradientBoosting {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            init: 0.0,
            trees: Vec::new(),
            features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn max_tree_depth(&self) -> usize {
        self.trees.iter().map(RegressionTree::depth).max().unwrap_or(0)
    }

    fn raw_score(&self, row: &[f64]) -> f64 {
        self.init
            + self.config.learning_rate * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }

    fn validate(&self) -> Result<()> {
        let c = &self.config;
        if c.n_estimators == 0 {
            return Err(EvalError::invalid_parameter("gradient boosting needs at least one stage"));
        }
        if !(c.learning_rate > 0.0) {
            return Err(EvalError::invalid_parameter("gradient boosting learning rate must be positive"));
        }
        if c.min_samples_leaf == 0 {
            return Err(EvalError::invalid_parameter("min_samples_leaf must be at least 1"));
        }
        Ok(())
    }
}

impl Default for GradientBoosting {
    fn default() -> Self {
        Self::new(BoostingConfig::default())
    }
}

impl BinaryClassifier for GradientBoosting {
    fn name(&self) -> &'static str {
        "gradient_boosting"
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[bool]) -> Result<()> {
        self.validate()?;
        if x.samples() != y.len() {
            return Err(EvalError::shape_mismatch("boosting targets vs samples", x.samples(), y.len()));
        }
        if x.samples() == 0 {
            return Err(EvalError::empty_evaluation_set("gradient boosting over zero samples"));
        }

        let n = x.samples();
        let targets: Vec<f64> = y.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
        let positives = targets.iter().sum::<f64>();
        let prior = (positives / n as f64).clamp(1e-12, 1.0 - 1e-12);

        self.init = (prior / (1.0 - prior)).ln();
        self.features = x.features();
        self.trees = Vec::with_capacity(self.config.n_estimators);

        let mut raw = vec![self.init; n];
        let mut residuals = vec![0.0; n];
        let mut hessians = vec![0.0; n];

        for stage in 0..self.config.n_estimators {
            for i in 0..n {
                let p = sigmoid(raw[i]);
                residuals[i] = targets[i] - p;
                hessians[i] = p * (1.0 - p);
            }

            let tree = RegressionTree::fit(x, &residuals, &hessians, &self.config);
            for (i, r) in raw.iter_mut().enumerate() {
                *r += self.config.learning_rate * tree.predict_row(x.row(i));
            }
            self.trees.push(tree);

            if stage + 1 == self.config.n_estimators {
                log::debug!("gradient boosting fitted {} stages on {} samples", stage + 1, n);
            }
        }

        Ok(())
    }

    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        if x.features() != self.features {
            return Err(EvalError::shape_mismatch(
                "gradient boosting feature count",
                self.features,
                x.features(),
            ));
        }
        Ok((0..x.samples()).map(|i| sigmoid(self.raw_score(x.row(i)))).collect())
    }
}
