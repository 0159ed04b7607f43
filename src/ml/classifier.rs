use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use crate::error::{EvalError, Result};
use crate::metrics::{accuracy, average_precision, f1_binary, f1_multiclass, f1_multilabel, roc_auc};
use crate::ml::{BoostingConfig, FeatureMatrix, GradientBoosting, LogisticConfig, LogisticRegression};
use crate::report::MetricReport;

/// A probabilistic binary classifier. `fit` may be called again to refit from scratch.
pub trait BinaryClassifier: Send {
    fn name(&self) -> &'static str;

    fn fit(&mut self, x: &FeatureMatrix, y: &[bool]) -> Result<()>;

    /// Probability of the positive class for every row.
    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Logistic,
    GradientBoosting,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 2] = [ClassifierKind::Logistic, ClassifierKind::GradientBoosting];

    /// Model name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::Logistic => "logistic_regression",
            ClassifierKind::GradientBoosting => "gradient_boosting",
        }
    }
}

/// Supervision for [`ClassifierBank::train_and_score`], one entry per feature row.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Binary(Vec<bool>),
    Multiclass { labels: Vec<usize>, n_classes: usize },
    /// Indicator rows, one column per class.
    Multilabel(Vec<Vec<bool>>),
}

impl Target {
    pub fn len(&self) -> usize {
        match self {
            Target::Binary(y) => y.len(),
            Target::Multiclass { labels, .. } => labels.len(),
            Target::Multilabel(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stratum of each sample; `None` for multi-label targets, which are
    /// split without stratification.
    fn strata(&self) -> Option<(Vec<usize>, usize)> {
        match self {
            Target::Binary(y) => Some((y.iter().map(|&b| b as usize).collect(), 2)),
            Target::Multiclass { labels, n_classes } => Some((labels.clone(), *n_classes)),
            Target::Multilabel(_) => None,
        }
    }
}

fn test_count(len: usize, test_size: f64) -> usize {
    ((test_size * len as f64).round() as usize).min(len.saturating_sub(1))
}

/// Seeded train/test split, returned as sorted `(train, test)` row indices.
/// Binary and multiclass targets are stratified per class; a class with a
/// single sample goes to the training side.
pub fn stratified_split(target: &Target, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(EvalError::invalid_parameter(format!(
            "test_size must be in (0, 1), got {}", test_size
        )));
    }

    let mut rng = Pcg64::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    match target.strata() {
        Some((strata, n_strata)) => {
            let mut groups = vec![Vec::new(); n_strata];
            for (i, &s) in strata.iter().enumerate() {
                if s >= n_strata {
                    return Err(EvalError::shape_mismatch("class index vs class count", n_strata, s + 1));
                }
                groups[s].push(i);
            }
            for mut group in groups {
                group.shuffle(&mut rng);
                let k = test_count(group.len(), test_size);
                test.extend_from_slice(&group[..k]);
                train.extend_from_slice(&group[k..]);
            }
        }
        None => {
            let mut all: Vec<usize> = (0..target.len()).collect();
            all.shuffle(&mut rng);
            let k = test_count(all.len(), test_size).max(1).min(all.len());
            test.extend_from_slice(&all[..k]);
            train.extend_from_slice(&all[k..]);
        }
    }

    if train.is_empty() || test.is_empty() {
        return Err(EvalError::empty_evaluation_set(format!(
            "train/test split of {} samples left train={} test={}",
            target.len(), train.len(), test.len()
        )));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

enum FittedColumn {
    /// The column had one value in training; predict its frequency.
    Constant(f64),
    Model(Box<dyn BinaryClassifier>),
}

/// One binary model per indicator column.
pub struct OneVsRest {
    columns: Vec<FittedColumn>,
}

impl OneVsRest {
    pub fn fit<F>(factory: F, x: &FeatureMatrix, indicators: &[Vec<bool>]) -> Result<Self>
    where
        F: Fn() -> Box<dyn BinaryClassifier>,
    {
        if indicators.len() != x.samples() {
            return Err(EvalError::shape_mismatch("indicator rows vs samples", x.samples(), indicators.len()));
        }
        let width = indicators.first().map_or(0, |r| r.len());

        let mut columns = Vec::with_capacity(width);
        for k in 0..width {
            let y: Vec<bool> = indicators.iter().map(|row| row[k]).collect();
            columns.push(fit_column(&factory, x, &y)?);
        }
        Ok(Self { columns })
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// `samples × columns` probabilities.
    pub fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        let mut out = vec![Vec::with_capacity(self.columns.len()); x.samples()];
        for column in &self.columns {
            let probs = match column {
                FittedColumn::Constant(p) => vec![*p; x.samples()],
                FittedColumn::Model(model) => model.predict_proba(x)?,
            };
            for (row, p) in out.iter_mut().zip(probs) {
                row.push(p);
            }
        }
        Ok(out)
    }
}

fn fit_column<F>(factory: &F, x: &FeatureMatrix, y: &[bool]) -> Result<FittedColumn>
where
    F: Fn() -> Box<dyn BinaryClassifier>,
{
    let positives = y.iter().filter(|&&b| b).count();
    if positives == 0 || positives == y.len() {
        log::warn!("training column has a single class ({} of {} positive), predicting a constant", positives, y.len());
        let p = if positives == 0 { 0.0 } else { 1.0 };
        return Ok(FittedColumn::Constant(p));
    }
    let mut model = factory();
    model.fit(x, y)?;
    Ok(FittedColumn::Model(model))
}

fn pick<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i].clone()).collect()
}

fn argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (k, &p) in row.iter().enumerate() {
        if p > row[best] {
            best = k;
        }
    }
    best
}

/// The two downstream classifiers, with their settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierBank {
    pub logistic: LogisticConfig,
    pub boosting: BoostingConfig,
}

impl ClassifierBank {
    pub fn new(logistic: LogisticConfig, boosting: BoostingConfig) -> Self {
        Self { logistic, boosting }
    }

    pub fn build(&self, kind: ClassifierKind) -> Box<dyn BinaryClassifier> {
        match kind {
            ClassifierKind::Logistic => Box::new(LogisticRegression::new(self.logistic.clone())),
            ClassifierKind::GradientBoosting => Box::new(GradientBoosting::new(self.boosting.clone())),
        }
    }

    /// Split, fit on the training rows and score on the test rows.
    pub fn train_and_score(
        &self,
        kind: ClassifierKind,
        x: &FeatureMatrix,
        target: &Target,
        test_size: f64,
        seed: u64,
        task: &str,
    ) -> Result<MetricReport> {
        if x.samples() != target.len() {
            return Err(EvalError::shape_mismatch("targets vs feature rows", x.samples(), target.len()));
        }
        if target.is_empty() {
            return Err(EvalError::empty_evaluation_set(format!("{} has no samples", task)));
        }

        let (train_idx, test_idx) = stratified_split(target, test_size, seed)?;
        let x_train = x.select_rows(&train_idx);
        let x_test = x.select_rows(&test_idx);

        log::debug!(
            "{}: fitting {} on {} rows, scoring {} rows",
            task, kind.name(), train_idx.len(), test_idx.len()
        );

        let mut report = MetricReport::new(task, kind.name());
        match target {
            Target::Binary(y) => {
                let y_train = pick(y, &train_idx);
                let y_test = &pick(y, &test_idx);
                let column = fit_column(&|| self.build(kind), &x_train, &y_train)?;
                let scores = match &column {
                    FittedColumn::Constant(p) => vec![*p; x_test.samples()],
                    FittedColumn::Model(model) => model.predict_proba(&x_test)?,
                };
                let predicted: Vec<bool> = scores.iter().map(|&p| p >= 0.5).collect();

                report.insert("auc_roc", roc_auc(&scores, y_test)?);
                report.insert("auc_pr", average_precision(&scores, y_test)?);
                report.insert("accuracy", accuracy(&predicted, y_test)?);
                report.insert("f1", f1_binary(&predicted, y_test)?);
            }
            Target::Multiclass { labels, n_classes } => {
                let y_train = pick(labels, &train_idx);
                let y_test = &pick(labels, &test_idx);
                let indicators: Vec<Vec<bool>> = y_train.iter()
                    .map(|&c| (0..*n_classes).map(|k| k == c).collect())
                    .collect();
                let model = OneVsRest::fit(|| self.build(kind), &x_train, &indicators)?;
                let proba = model.predict_proba(&x_test)?;
                let predicted: Vec<usize> = proba.iter().map(|row| argmax(row)).collect();
                let (micro, macro_f1) = f1_multiclass(&predicted, y_test, *n_classes)?;

                report.insert("accuracy", accuracy(&predicted, y_test)?);
                report.insert("f1", macro_f1);
                report.insert("f1_micro", micro);
                report.insert("f1_macro", macro_f1);

                let mut auc_roc_sum = 0.0;
                let mut auc_pr_sum = 0.0;
                let mut scored = 0usize;
                for k in 0..*n_classes {
                    let truth: Vec<bool> = y_test.iter().map(|&c| c == k).collect();
                    let positives = truth.iter().filter(|&&b| b).count();
                    if positives == 0 || positives == truth.len() {
                        continue;
                    }
                    let scores: Vec<f64> = proba.iter().map(|row| row[k]).collect();
                    auc_roc_sum += roc_auc(&scores, &truth)?;
                    auc_pr_sum += average_precision(&scores, &truth)?;
                    scored += 1;
                }
                if scored > 0 {
                    report.insert("auc_roc", auc_roc_sum / scored as f64);
                    report.insert("auc_pr", auc_pr_sum / scored as f64);
                } else {
                    log::warn!("{}: test split holds a single class, AUC not reported", task);
                }
            }
            Target::Multilabel(rows) => {
                let y_train = pick(rows, &train_idx);
                let y_test = &pick(rows, &test_idx);
                let model = OneVsRest::fit(|| self.build(kind), &x_train, &y_train)?;
                let predicted: Vec<Vec<bool>> = model.predict_proba(&x_test)?
                    .into_iter()
                    .map(|row| row.into_iter().map(|p| p >= 0.5).collect())
                    .collect();
                let (micro, macro_f1) = f1_multilabel(&predicted, y_test)?;

                report.insert("accuracy", accuracy(&predicted, y_test)?);
                report.insert("f1", macro_f1);
                report.insert("f1_micro", micro);
                report.insert("f1_macro", macro_f1);
            }
        }

        Ok(report)
    }
}
