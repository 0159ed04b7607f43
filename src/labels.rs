use arrow::array::{Array, ListArray, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use indexmap::IndexSet;
use crate::error::{EvalError, Result};
use crate::graph::EvalGraph;

/// Ground truth for the node-level tasks, aligned with the graph's dense node
/// index. The shape is fixed once, when the set is built.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelSet {
    NoLabels,
    /// One class per node; `assignments[i]` indexes into `classes`.
    SingleLabel {
        classes: Vec<String>,
        assignments: Vec<usize>,
    },
    /// A (possibly empty) set of classes per node, sorted and deduplicated.
    MultiLabel {
        classes: Vec<String>,
        assignments: Vec<Vec<usize>>,
    },
}

impl LabelSet {
    /// Single label per node, `labels[i]` belonging to dense node `i`.
    pub fn single<S: AsRef<str>>(graph: &EvalGraph, labels: Vec<S>) -> Result<Self> {
        if labels.len() != graph.node_count() {
            return Err(EvalError::shape_mismatch(
                "single-label rows vs graph nodes",
                graph.node_count(),
                labels.len(),
            ));
        }

        let mut classes: IndexSet<String> = IndexSet::new();
        let assignments = labels.iter()
            .map(|label| classes.insert_full(label.as_ref().to_string()).0)
            .collect();

        Ok(LabelSet::SingleLabel {
            classes: classes.into_iter().collect(),
            assignments,
        })
    }

    /// Set of labels per node, `labels[i]` belonging to dense node `i`.
    pub fn multi<S: AsRef<str>>(graph: &EvalGraph, labels: Vec<Vec<S>>) -> Result<Self> {
        if labels.len() != graph.node_count() {
            return Err(EvalError::shape_mismatch(
                "multi-label rows vs graph nodes",
                graph.node_count(),
                labels.len(),
            ));
        }

        let mut classes: IndexSet<String> = IndexSet::new();
        let assignments = labels.iter()
            .map(|set| {
                let mut row: Vec<usize> = set.iter()
                    .map(|label| classes.insert_full(label.as_ref().to_string()).0)
                    .collect();
                row.sort_unstable();
                row.dedup();
                row
            })
            .collect();

        Ok(LabelSet::MultiLabel {
            classes: classes.into_iter().collect(),
            assignments,
        })
    }

    /// Build from `(node_id, label)` pairs. A node listed once per label keeps
    /// the single-label shape; any node with two or more distinct labels
    /// switches the whole set to multi-label.
    pub fn from_pairs<S, I>(graph: &EvalGraph, pairs: I) -> Result<Self>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, S)>,
    {
        let mut per_node: Vec<Vec<String>> = vec![Vec::new(); graph.node_count()];
        let mut any_pair = false;

        for (node_id, label) in pairs {
            let node_id = node_id.as_ref();
            let index = graph.node_index(node_id)
                .ok_or_else(|| EvalError::node_not_found(node_id))?;
            let label = label.as_ref().to_string();
            if !per_node[index].contains(&label) {
                per_node[index].push(label);
            }
            any_pair = true;
        }

        Self::from_per_node(graph, per_node, any_pair)
    }

    /// Build from an Arrow batch: `id (Utf8)` plus `label` as `Utf8` (one row
    /// per node-label pair) or `List<Utf8>` (one row per node).
    pub fn from_record_batch(graph: &EvalGraph, batch: &RecordBatch) -> Result<Self> {
        if batch.num_rows() == 0 {
            return Ok(LabelSet::NoLabels);
        }
        if batch.num_columns() < 2 {
            return Err(EvalError::unsupported_label_shape(
                "label table needs an id column and a label column"
            ));
        }

        let ids = batch.column(0).as_any().downcast_ref::<StringArray>()
            .ok_or_else(|| EvalError::unsupported_label_shape(
                "first column of label table must be String (node ID)"
            ))?;

        match batch.column(1).data_type() {
            DataType::Utf8 => {
                let labels = batch.column(1).as_any().downcast_ref::<StringArray>()
                    .ok_or_else(|| EvalError::unsupported_label_shape("label column is not Utf8"))?;
                let pairs = (0..batch.num_rows())
                    .filter(|&i| !ids.is_null(i) && !labels.is_null(i))
                    .map(|i| (ids.value(i), labels.value(i)));
                Self::from_pairs(graph, pairs)
            }
            DataType::List(field) if field.data_type() == &DataType::Utf8 => {
                let lists = batch.column(1).as_any().downcast_ref::<ListArray>()
                    .ok_or_else(|| EvalError::unsupported_label_shape("label column is not a list"))?;
                let mut per_node: Vec<Vec<String>> = vec![Vec::new(); graph.node_count()];

                for i in 0..batch.num_rows() {
                    if ids.is_null(i) || lists.is_null(i) {
                        continue;
                    }
                    let index = graph.node_index(ids.value(i))
                        .ok_or_else(|| EvalError::node_not_found(ids.value(i)))?;
                    let values = lists.value(i);
                    let values = values.as_any().downcast_ref::<StringArray>()
                        .ok_or_else(|| EvalError::unsupported_label_shape("list items must be Utf8"))?;
                    for label in values.iter().flatten() {
                        if !per_node[index].iter().any(|l| l == label) {
                            per_node[index].push(label.to_string());
                        }
                    }
                }

                Self::multi(graph, per_node)
            }
            other => Err(EvalError::unsupported_label_shape(format!(
                "label column type {} is neither Utf8 nor List<Utf8>", other
            ))),
        }
    }

    fn from_per_node(graph: &EvalGraph, per_node: Vec<Vec<String>>, any_pair: bool) -> Result<Self> {
        if !any_pair {
            return Ok(LabelSet::NoLabels);
        }

        if per_node.iter().any(|labels| labels.len() > 1) {
            return Self::multi(graph, per_node);
        }

        let labelled = per_node.iter().filter(|labels| labels.len() == 1).count();
        if labelled != per_node.len() {
            return Err(EvalError::shape_mismatch(
                "labelled nodes vs graph nodes",
                per_node.len(),
                labelled,
            ));
        }

        let flat: Vec<String> = per_node.into_iter()
            .filter_map(|mut labels| labels.pop())
            .collect();
        Self::single(graph, flat)
    }

    /// Capability check used by the harness instead of error-driven fallthrough.
    pub fn has_labels(&self) -> bool {
        !matches!(self, LabelSet::NoLabels)
    }

    pub fn is_multi_label(&self) -> bool {
        matches!(self, LabelSet::MultiLabel { .. })
    }

    pub fn classes(&self) -> &[String] {
        match self {
            LabelSet::NoLabels => &[],
            LabelSet::SingleLabel { classes, .. } | LabelSet::MultiLabel { classes, .. } => classes,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.classes().len()
    }

    /// Number of labelled rows (zero for `NoLabels`).
    pub fn len(&self) -> usize {
        match self {
            LabelSet::NoLabels => 0,
            LabelSet::SingleLabel { assignments, .. } => assignments.len(),
            LabelSet::MultiLabel { assignments, .. } => assignments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::ListBuilder;
    use arrow::array::StringBuilder;
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn graph() -> EvalGraph {
        EvalGraph::from_edge_list(vec![("a", "b"), ("b", "c"), ("c", "d")], false).unwrap()
    }

    #[test]
    fn test_single_labels_from_pairs() {
        let g = graph();
        let labels = LabelSet::from_pairs(&g, vec![("d", "y"), ("a", "x"), ("b", "x"), ("c", "y")]).unwrap();

        match &labels {
            LabelSet::SingleLabel { classes, assignments } => {
                assert_eq!(classes, &vec!["x".to_string(), "y".to_string()]);
                assert_eq!(assignments, &vec![0, 0, 1, 1]);
            }
            other => panic!("expected single label, got {:?}", other),
        }
        assert!(labels.has_labels());
    }

    #[test]
    fn test_repeated_node_switches_to_multi_label() {
        let g = graph();
        let labels = LabelSet::from_pairs(
            &g,
            vec![("a", "x"), ("a", "y"), ("b", "x"), ("c", "y"), ("d", "z")],
        ).unwrap();

        assert!(labels.is_multi_label());
        assert_eq!(labels.num_classes(), 3);
        if let LabelSet::MultiLabel { assignments, .. } = labels {
            assert_eq!(assignments[0], vec![0, 1]);
        }
    }

    #[test]
    fn test_missing_single_label_is_shape_mismatch() {
        let g = graph();
        let err = LabelSet::from_pairs(&g, vec![("a", "x"), ("b", "x")]).unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_no_pairs_means_no_labels() {
        let g = graph();
        let labels = LabelSet::from_pairs(&g, Vec::<(&str, &str)>::new()).unwrap();
        assert!(!labels.has_labels());
        assert!(labels.is_empty());
    }

    #[test]
    fn test_unknown_node_rejected() {
        let g = graph();
        let err = LabelSet::from_pairs(&g, vec![("zz", "x")]).unwrap_err();
        assert!(matches!(err, EvalError::NodeNotFound(_)));
    }

    #[test]
    fn test_list_column_is_multi_label() {
        let g = graph();
        let mut builder = ListBuilder::new(StringBuilder::new());
        for row in [vec!["x"], vec!["x", "y"], vec![], vec!["y"]] {
            for label in row {
                builder.values().append_value(label);
            }
            builder.append(true);
        }
        let lists = builder.finish();
        let list_type = lists.data_type().clone();

        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("label", list_type, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["a", "b", "c", "d"])),
                Arc::new(lists),
            ],
        ).unwrap();

        let labels = LabelSet::from_record_batch(&g, &batch).unwrap();
        assert!(labels.is_multi_label());
        if let LabelSet::MultiLabel { assignments, .. } = labels {
            assert_eq!(assignments, vec![vec![0], vec![0, 1], vec![], vec![1]]);
        }
    }

    #[test]
    fn test_numeric_label_column_unsupported() {
        let g = graph();
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("label", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["a"])),
                Arc::new(arrow::array::Int64Array::from(vec![1])),
            ],
        ).unwrap();

        let err = LabelSet::from_record_batch(&g, &batch).unwrap_err();
        assert!(matches!(err, EvalError::UnsupportedLabelShape(_)));
    }
}
