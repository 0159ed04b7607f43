//! Ranking and classification scores. Every score lies in `[0, 1]`.

use crate::error::{EvalError, Result};

/// True/false positive and false negative counts for one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confusion {
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl Confusion {
    pub fn add(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.tp += 1,
            (true, false) => self.fp += 1,
            (false, true) => self.fn_ += 1,
            (false, false) => {}
        }
    }

    /// F1 with zero division mapped to 0.
    pub fn f1(&self) -> f64 {
        let denominator = 2 * self.tp + self.fp + self.fn_;
        if denominator == 0 {
            0.0
        } else {
            2.0 * self.tp as f64 / denominator as f64
        }
    }

    fn merge(&mut self, other: &Confusion) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.fn_ += other.fn_;
    }
}

fn check_lengths(what: &str, a: usize, b: usize) -> Result<()> {
    if a != b {
        return Err(EvalError::shape_mismatch(what, a, b));
    }
    Ok(())
}

fn check_finite(what: &str, scores: &[f64]) -> Result<()> {
    if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
        return Err(EvalError::numerical(format!(
            "{}: score {} is {}", what, i, scores[i]
        )));
    }
    Ok(())
}

/// Area under the ROC curve via the Mann-Whitney U statistic, ties getting
/// their average rank.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Result<f64> {
    check_lengths("roc_auc labels vs scores", scores.len(), labels.len())?;
    check_finite("roc_auc", scores)?;

    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(EvalError::empty_evaluation_set(
            "ROC AUC needs at least one positive and one negative sample"
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j < order.len() && scores[order[j]] == scores[order[i]] {
            j += 1;
        }
        // 1-based average rank of the tie group
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            if labels[idx] {
                rank_sum_pos += avg_rank;
            }
        }
        i = j;
    }

    let p = positives as f64;
    let n = negatives as f64;
    let u = rank_sum_pos - p * (p + 1.0) / 2.0;
    Ok((u / (p * n)).clamp(0.0, 1.0))
}

/// Area under the precision-recall curve as average precision:
/// `sum_k (R_k - R_{k-1}) * P_k` over descending distinct score thresholds.
pub fn average_precision(scores: &[f64], labels: &[bool]) -> Result<f64> {
    check_lengths("average_precision labels vs scores", scores.len(), labels.len())?;
    check_finite("average_precision", scores)?;

    let positives = labels.iter().filter(|&&l| l).count();
    if positives == 0 {
        return Err(EvalError::empty_evaluation_set(
            "average precision needs at least one positive sample"
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut tp = 0usize;
    let mut seen = 0usize;
    let mut previous_recall = 0.0;
    let mut ap = 0.0;
    let mut i = 0;

    while i < order.len() {
        let mut j = i;
        while j < order.len() && scores[order[j]] == scores[order[i]] {
            if labels[order[j]] {
                tp += 1;
            }
            j += 1;
        }
        seen += j - i;

        let recall = tp as f64 / positives as f64;
        let precision = tp as f64 / seen as f64;
        ap += (recall - previous_recall) * precision;
        previous_recall = recall;
        i = j;
    }

    Ok(ap.clamp(0.0, 1.0))
}

/// Fraction of exact matches.
pub fn accuracy<T: PartialEq>(predicted: &[T], actual: &[T]) -> Result<f64> {
    check_lengths("accuracy predictions vs truth", actual.len(), predicted.len())?;
    if actual.is_empty() {
        return Err(EvalError::empty_evaluation_set("accuracy over zero samples"));
    }
    let hits = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    Ok(hits as f64 / actual.len() as f64)
}

/// F1 of the positive class.
pub fn f1_binary(predicted: &[bool], actual: &[bool]) -> Result<f64> {
    check_lengths("f1 predictions vs truth", actual.len(), predicted.len())?;
    let mut confusion = Confusion::default();
    for (&p, &a) in predicted.iter().zip(actual) {
        confusion.add(p, a);
    }
    Ok(confusion.f1())
}

/// Micro and macro F1 for single-label multiclass predictions. The macro
/// average runs over classes seen in either the truth or the predictions.
pub fn f1_multiclass(predicted: &[usize], actual: &[usize], n_classes: usize) -> Result<(f64, f64)> {
    check_lengths("f1 predictions vs truth", actual.len(), predicted.len())?;

    let mut per_class = vec![Confusion::default(); n_classes];
    let mut present = vec![false; n_classes];
    for (&p, &a) in predicted.iter().zip(actual) {
        if p >= n_classes || a >= n_classes {
            return Err(EvalError::shape_mismatch("class index vs class count", n_classes, p.max(a) + 1));
        }
        present[p] = true;
        present[a] = true;
        if p == a {
            per_class[a].tp += 1;
        } else {
            per_class[p].fp += 1;
            per_class[a].fn_ += 1;
        }
    }

    Ok(micro_macro(&per_class, Some(&present)))
}

/// Micro and macro F1 over indicator rows (one column per label); every
/// column counts towards the macro average.
pub fn f1_multilabel(predicted: &[Vec<bool>], actual: &[Vec<bool>]) -> Result<(f64, f64)> {
    check_lengths("f1 predictions vs truth", actual.len(), predicted.len())?;
    let n_labels = actual.first().map_or(0, |r| r.len());

    let mut per_label = vec![Confusion::default(); n_labels];
    for (p_row, a_row) in predicted.iter().zip(actual) {
        check_lengths("indicator row width", n_labels, p_row.len())?;
        check_lengths("indicator row width", n_labels, a_row.len())?;
        for (k, (&p, &a)) in p_row.iter().zip(a_row).enumerate() {
            per_label[k].add(p, a);
        }
    }

    Ok(micro_macro(&per_label, None))
}

fn micro_macro(per_class: &[Confusion], present: Option<&[bool]>) -> (f64, f64) {
    let mut total = Confusion::default();
    let mut macro_sum = 0.0;
    let mut counted = 0usize;

    for (k, confusion) in per_class.iter().enumerate() {
        total.merge(confusion);
        if present.map_or(true, |p| p[k]) {
            macro_sum += confusion.f1();
            counted += 1;
        }
    }

    let macro_f1 = if counted == 0 { 0.0 } else { macro_sum / counted as f64 };
    (total.f1(), macro_f1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn test_roc_auc_perfect_and_inverse() {
        let labels = [true, true, false, false];
        assert!(approx(roc_auc(&[0.9, 0.8, 0.2, 0.1], &labels).unwrap(), 1.0));
        assert!(approx(roc_auc(&[0.1, 0.2, 0.8, 0.9], &labels).unwrap(), 0.0));
    }

    #[test]
    fn test_roc_auc_ties_and_known_value() {
        assert!(approx(roc_auc(&[0.5, 0.5, 0.5, 0.5], &[true, false, true, false]).unwrap(), 0.5));

        // pos = [3, 5], neg = [1, 2, 4] -> U = 5, AUC = 5/6
        let auc = roc_auc(&[3.0, 5.0, 1.0, 2.0, 4.0], &[true, true, false, false, false]).unwrap();
        assert!(approx(auc, 5.0 / 6.0));
    }

    #[test]
    fn test_roc_auc_single_class_is_error() {
        assert!(matches!(
            roc_auc(&[0.1, 0.2], &[true, true]),
            Err(EvalError::EmptyEvaluationSet(_))
        ));
    }

    #[test]
    fn test_non_finite_scores_are_rejected() {
        assert!(matches!(
            roc_auc(&[f64::NAN, 0.2, 0.9], &[true, false, true]),
            Err(EvalError::Numerical(_))
        ));
        assert!(matches!(
            average_precision(&[0.3, f64::NAN], &[true, false]),
            Err(EvalError::Numerical(_))
        ));
        assert!(matches!(
            roc_auc(&[f64::INFINITY, 0.2], &[true, false]),
            Err(EvalError::Numerical(_))
        ));
    }

    #[test]
    fn test_average_precision_known_value() {
        // Ranked: P(0.9) N(0.8) P(0.7) N(0.1) -> AP = 0.5 * 1 + 0.5 * 2/3
        let ap = average_precision(&[0.9, 0.8, 0.7, 0.1], &[true, false, true, false]).unwrap();
        assert!(approx(ap, 0.5 + 1.0 / 3.0));

        let perfect = average_precision(&[0.9, 0.8, 0.1], &[true, true, false]).unwrap();
        assert!(approx(perfect, 1.0));
    }

    #[test]
    fn test_average_precision_constant_scores() {
        // One threshold: recall 1, precision = positive rate
        let ap = average_precision(&[0.3; 4], &[true, false, false, false]).unwrap();
        assert!(approx(ap, 0.25));
    }

    #[test]
    fn test_accuracy_and_binary_f1() {
        let predicted = [true, false, true, true];
        let actual = [true, false, false, true];

        assert!(approx(accuracy(&predicted, &actual).unwrap(), 0.75));
        // tp = 2, fp = 1, fn = 0
        assert!(approx(f1_binary(&predicted, &actual).unwrap(), 0.8));
        assert!(approx(f1_binary(&[false, false], &[false, false]).unwrap(), 0.0));
    }

    #[test]
    fn test_multiclass_f1() {
        let actual = [0, 0, 1, 1, 2, 2];
        let predicted = [0, 0, 1, 2, 2, 2];

        let (micro, macro_f1) = f1_multiclass(&predicted, &actual, 3).unwrap();
        // micro F1 equals accuracy for single-label predictions
        assert!(approx(micro, 5.0 / 6.0));
        // class 0: 1.0, class 1: 2/3, class 2: 0.8
        assert!(approx(macro_f1, (1.0 + 2.0 / 3.0 + 0.8) / 3.0));
    }

    #[test]
    fn test_multiclass_f1_skips_absent_classes() {
        let (_, macro_f1) = f1_multiclass(&[0, 1], &[0, 1], 4).unwrap();
        assert!(approx(macro_f1, 1.0));
    }

    #[test]
    fn test_multilabel_f1() {
        let actual = vec![vec![true, false], vec![true, true], vec![false, true]];
        let predicted = vec![vec![true, false], vec![false, true], vec![false, true]];

        let (micro, macro_f1) = f1_multilabel(&predicted, &actual).unwrap();
        // label 0: tp 1, fn 1 -> 2/3; label 1: tp 2 -> 1.0; total tp 3, fn 1 -> 6/7
        assert!(approx(micro, 6.0 / 7.0));
        assert!(approx(macro_f1, (2.0 / 3.0 + 1.0) / 2.0));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            accuracy(&[1, 2], &[1]),
            Err(EvalError::ShapeMismatch { .. })
        ));
    }
}
