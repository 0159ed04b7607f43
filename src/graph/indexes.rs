use arrow::array::{Array, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use indexmap::{IndexMap, IndexSet};
use crate::error::{EvalError, Result};

/// Canonical key of an edge: `(min, max)` for undirected graphs, `(source, target)` otherwise.
pub fn edge_key(u: usize, v: usize, directed: bool) -> (usize, usize) {
    if directed || u <= v {
        (u, v)
    } else {
        (v, u)
    }
}

/// Dense indexes over a graph. Node ids are interned in first-seen order, so
/// index `i` is stable for as long as the graph lives.
#[derive(Debug, Clone)]
pub struct GraphIndexes {
    pub node_ids: IndexSet<String>,
    pub edges: IndexMap<(usize, usize), f64>,
    pub adjacency_list: Vec<Vec<usize>>,
    pub reverse_adjacency_list: Vec<Vec<usize>>,
    pub directed: bool,
}

impl GraphIndexes {
    /// Build indexes from Arrow batches.
    ///
    /// Nodes: `id (Utf8)`, further columns ignored. Edges: `source (Utf8)`,
    /// `target (Utf8)`, optional `weight (Float64)`.
    pub fn build(nodes: &RecordBatch, edges: &RecordBatch, directed: bool) -> Result<Self> {
        let mut node_ids: IndexSet<String> = IndexSet::new();

        if nodes.num_columns() > 0 {
            let id_array = nodes.column(0).as_any().downcast_ref::<StringArray>()
                .ok_or_else(|| EvalError::graph_construction(
                    "First column of nodes table must be String (node ID)"
                ))?;
            for node_id in id_array.iter().flatten() {
                node_ids.insert(node_id.to_string());
            }
        }

        let mut edge_list = Vec::with_capacity(edges.num_rows());
        if edges.num_rows() > 0 {
            if edges.num_columns() < 2 {
                return Err(EvalError::graph_construction(
                    "Edges table needs at least source and target columns"
                ));
            }

            let source_array = edges.column(0).as_any().downcast_ref::<StringArray>()
                .ok_or_else(|| EvalError::graph_construction(
                    "First column of edges table must be String (source)"
                ))?;
            let target_array = edges.column(1).as_any().downcast_ref::<StringArray>()
                .ok_or_else(|| EvalError::graph_construction(
                    "Second column of edges table must be String (target)"
                ))?;

            let weight_array = if edges.num_columns() >= 3 {
                edges.column(2).as_any().downcast_ref::<Float64Array>()
            } else {
                None
            };

            for i in 0..edges.num_rows() {
                if source_array.is_null(i) || target_array.is_null(i) {
                    return Err(EvalError::graph_construction(format!(
                        "Edge row {} has a null endpoint", i
                    )));
                }
                let weight = match weight_array {
                    Some(weights) if !weights.is_null(i) => weights.value(i),
                    _ => 1.0,
                };
                edge_list.push((
                    source_array.value(i).to_string(),
                    target_array.value(i).to_string(),
                    weight,
                ));
            }
        }

        Self::from_edge_list(node_ids, edge_list, directed)
    }

    /// Build indexes from already-interned node ids plus `(source, target, weight)` triples.
    /// Endpoints not yet in `node_ids` are appended in first-seen order.
    pub fn from_edge_list<I>(mut node_ids: IndexSet<String>, edge_list: I, directed: bool) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String, f64)>,
    {
        let mut edges: IndexMap<(usize, usize), f64> = IndexMap::new();
        let mut self_loops = 0usize;
        let mut duplicates = 0usize;

        for (source, target, weight) in edge_list {
            if !weight.is_finite() {
                return Err(EvalError::graph_construction(format!(
                    "Edge {} -> {} has a non-finite weight", source, target
                )));
            }
            let (u, _) = node_ids.insert_full(source);
            let (v, _) = node_ids.insert_full(target);
            if u == v {
                self_loops += 1;
                continue;
            }
            let key = edge_key(u, v, directed);
            if edges.contains_key(&key) {
                duplicates += 1;
                continue;
            }
            edges.insert(key, weight);
        }

        if self_loops > 0 || duplicates > 0 {
            log::debug!(
                "Dropped {} self-loops and {} duplicate edges while indexing graph",
                self_loops, duplicates
            );
        }

        Ok(Self::from_parts(node_ids, edges, directed))
    }

    /// Assemble indexes from a node set and canonical edge map.
    pub fn from_parts(node_ids: IndexSet<String>, edges: IndexMap<(usize, usize), f64>, directed: bool) -> Self {
        let n = node_ids.len();
        let mut adjacency_list = vec![Vec::new(); n];
        let mut reverse_adjacency_list = vec![Vec::new(); n];

        for &(u, v) in edges.keys() {
            adjacency_list[u].push(v);
            reverse_adjacency_list[v].push(u);
            if !directed {
                adjacency_list[v].push(u);
                reverse_adjacency_list[u].push(v);
            }
        }

        GraphIndexes {
            node_ids,
            edges,
            adjacency_list,
            reverse_adjacency_list,
            directed,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn neighbors(&self, node: usize) -> Option<&Vec<usize>> {
        self.adjacency_list.get(node)
    }

    pub fn predecessors(&self, node: usize) -> Option<&Vec<usize>> {
        self.reverse_adjacency_list.get(node)
    }

    pub fn node_index(&self, node_id: &str) -> Option<usize> {
        self.node_ids.get_index_of(node_id)
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.edges.contains_key(&edge_key(u, v, self.directed))
    }

    pub fn edge_weight(&self, u: usize, v: usize) -> Option<f64> {
        self.edges.get(&edge_key(u, v, self.directed)).copied()
    }
}
