use std::fmt;
use std::sync::Arc;
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use crate::error::{EvalError, Result};

/// Scores of one model on one task, in insertion order. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    task: String,
    model: String,
    metrics: IndexMap<String, f64>,
}

impl MetricReport {
    pub fn new<T: Into<String>, M: Into<String>>(task: T, model: M) -> Self {
        Self {
            task: task.into(),
            model: model.into(),
            metrics: IndexMap::new(),
        }
    }

    pub(crate) fn with_metric<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub(crate) fn insert<S: Into<String>>(&mut self, name: S, value: f64) {
        self.metrics.insert(name.into(), value);
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn metrics(&self) -> &IndexMap<String, f64> {
        &self.metrics
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl fmt::Display for MetricReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}:", self.task, self.model)?;
        for (name, value) in &self.metrics {
            write!(f, " {}: {:.4}", name, value)?;
        }
        Ok(())
    }
}

fn long_table<'a, I>(rows: I, provider: Option<&str>) -> Result<RecordBatch>
where
    I: IntoIterator<Item = &'a MetricReport>,
{
    let mut tasks = Vec::new();
    let mut models = Vec::new();
    let mut metrics = Vec::new();
    let mut values = Vec::new();

    for report in rows {
        for (name, value) in &report.metrics {
            tasks.push(report.task.clone());
            models.push(report.model.clone());
            metrics.push(name.clone());
            values.push(*value);
        }
    }

    let mut fields = Vec::with_capacity(5);
    let mut columns: Vec<Arc<dyn arrow::array::Array>> = Vec::with_capacity(5);
    if let Some(provider) = provider {
        fields.push(Field::new("provider", DataType::Utf8, false));
        columns.push(Arc::new(StringArray::from(vec![provider; values.len()])));
    }
    fields.push(Field::new("task", DataType::Utf8, false));
    fields.push(Field::new("model", DataType::Utf8, false));
    fields.push(Field::new("metric", DataType::Utf8, false));
    fields.push(Field::new("value", DataType::Float64, false));
    columns.push(Arc::new(StringArray::from(tasks)));
    columns.push(Arc::new(StringArray::from(models)));
    columns.push(Arc::new(StringArray::from(metrics)));
    columns.push(Arc::new(Float64Array::from(values)));

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(EvalError::from)
}

/// Long-format table `task, model, metric, value`, one row per metric.
pub fn reports_to_record_batch(reports: &[MetricReport]) -> Result<RecordBatch> {
    long_table(reports, None)
}

/// Everything one provider scored in one harness run. Tasks without ground
/// truth are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub provider: String,
    pub link_prediction: Vec<MetricReport>,
    pub clustering: Option<MetricReport>,
    pub label_prediction: Option<Vec<MetricReport>>,
}

impl RunReport {
    pub fn new<S: Into<String>>(provider: S) -> Self {
        Self {
            provider: provider.into(),
            link_prediction: Vec::new(),
            clustering: None,
            label_prediction: None,
        }
    }

    /// All reports in task order: link prediction, clustering, label prediction.
    pub fn reports(&self) -> impl Iterator<Item = &MetricReport> {
        self.link_prediction.iter()
            .chain(self.clustering.iter())
            .chain(self.label_prediction.iter().flatten())
    }

    /// Look up one score by task, model and metric name.
    pub fn metric(&self, task: &str, model: &str, metric: &str) -> Option<f64> {
        self.reports()
            .find(|r| r.task() == task && r.model() == model)
            .and_then(|r| r.get(metric))
    }

    /// Long-format table `provider, task, model, metric, value`.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        long_table(self.reports(), Some(&self.provider))
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "provider: {}", self.provider)?;
        for report in self.reports() {
            writeln!(f, "  {}", report)?;
        }
        if self.clustering.is_none() && self.label_prediction.is_none() {
            writeln!(f, "  (no labels: clustering and label prediction skipped)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn sample() -> MetricReport {
        MetricReport::new("link_prediction", "logistic_regression")
            .with_metric("auc_roc", 0.91234)
            .with_metric("accuracy", 0.8)
    }

    #[test]
    fn test_display_four_decimals_in_order() {
        assert_eq!(
            sample().to_string(),
            "[link_prediction] logistic_regression: auc_roc: 0.9123 accuracy: 0.8000"
        );
    }

    #[test]
    fn test_serialize_keeps_metric_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"task":"link_prediction","model":"logistic_regression","metrics":{"auc_roc":0.91234,"accuracy":0.8}}"#
        );
    }

    #[test]
    fn test_read_only_accessors() {
        let report = sample();

        assert_eq!(report.task(), "link_prediction");
        assert_eq!(report.model(), "logistic_regression");
        let names: Vec<&str> = report.metrics().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["auc_roc", "accuracy"]);
        assert_eq!(report.get("accuracy"), Some(0.8));
        assert_eq!(report.get("f1"), None);

        let parsed: MetricReport = serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_long_table() {
        let other = MetricReport::new("clustering", "ward").with_metric("rand_index", 1.0);
        let batch = reports_to_record_batch(&[sample(), other]).unwrap();

        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 4);
        let metrics = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(metrics.value(2), "rand_index");
        let values = batch.column(3).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(values.value(1), 0.8);
        assert_eq!(values.null_count(), 0);
    }

    #[test]
    fn test_run_report_lookup_and_table() {
        let mut run = RunReport::new("noise");
        run.link_prediction.push(sample());
        run.clustering = Some(MetricReport::new("clustering", "ward").with_metric("rand_index", 0.5));

        assert_eq!(run.metric("clustering", "ward", "rand_index"), Some(0.5));
        assert_eq!(run.metric("label_prediction", "ward", "accuracy"), None);

        let batch = run.to_record_batch().unwrap();
        assert_eq!(batch.num_columns(), 5);
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.schema().field(0).name(), "provider");
    }
}
