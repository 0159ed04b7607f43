use crate::embedding::EmbeddingMatrix;
use crate::error::{EvalError, Result};
use crate::labels::LabelSet;
use crate::ml::{ClassifierBank, ClassifierKind, FeatureMatrix, Target};
use crate::report::MetricReport;

pub const LABEL_PREDICTION_TASK: &str = "label_prediction";

/// Predict node labels from their embedding rows, one report per classifier.
///
/// Single-label sets are scored as multiclass problems; multi-label sets as
/// one binary problem per class with a 0.5 threshold, without AUC.
pub fn evaluate_labels(
    embedding: &EmbeddingMatrix,
    labels: &LabelSet,
    test_size: f64,
    seed: u64,
    bank: &ClassifierBank,
) -> Result<Vec<MetricReport>> {
    let target = match labels {
        LabelSet::NoLabels => {
            return Err(EvalError::empty_evaluation_set("label prediction needs ground-truth labels"));
        }
        LabelSet::SingleLabel { classes, assignments } => Target::Multiclass {
            labels: assignments.clone(),
            n_classes: classes.len(),
        },
        LabelSet::MultiLabel { classes, assignments } => Target::Multilabel(
            assignments.iter()
                .map(|set| {
                    let mut row = vec![false; classes.len()];
                    for &c in set {
                        row[c] = true;
                    }
                    row
                })
                .collect(),
        ),
    };

    if embedding.nrows() != target.len() {
        return Err(EvalError::shape_mismatch(
            "embedding rows vs labelled nodes",
            target.len(),
            embedding.nrows(),
        ));
    }

    let features = FeatureMatrix::from_embedding(embedding);
    ClassifierKind::ALL.iter()
        .map(|&kind| bank.train_and_score(kind, &features, &target, test_size, seed, LABEL_PREDICTION_TASK))
        .collect()
}
