use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;
use crate::algorithms::components::WeaklyConnectedComponents;
use crate::error::{EvalError, Result};
use crate::graph::indexes::edge_key;
use crate::graph::GraphIndexes;

/// Graph under evaluation. Nodes carry string ids and a dense index `0..N-1`;
/// rows of an embedding matrix line up with the dense index.
#[derive(Debug, Clone)]
pub struct EvalGraph {
    pub indexes: GraphIndexes,
}

impl EvalGraph {
    /// Create an undirected graph from nodes and edges RecordBatches
    pub fn new(nodes: RecordBatch, edges: RecordBatch) -> Result<Self> {
        Self::from_tables(nodes, edges, false)
    }

    /// Create a directed graph from nodes and edges RecordBatches
    pub fn new_directed(nodes: RecordBatch, edges: RecordBatch) -> Result<Self> {
        Self::from_tables(nodes, edges, true)
    }

    /// Create an undirected graph from just edges (nodes will be inferred)
    pub fn from_edges(edges: RecordBatch) -> Result<Self> {
        let nodes_schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
        ]));

        let empty_nodes = RecordBatch::new_empty(nodes_schema);
        Self::new(empty_nodes, edges)
    }

    pub fn from_tables(nodes: RecordBatch, edges: RecordBatch, directed: bool) -> Result<Self> {
        let indexes = GraphIndexes::build(&nodes, &edges, directed)?;
        Ok(EvalGraph { indexes })
    }

    /// Unweighted graph from `(source, target)` id pairs.
    pub fn from_edge_list<S, I>(edges: I, directed: bool) -> Result<Self>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, S)>,
    {
        Self::from_weighted_edge_list(
            edges.into_iter().map(|(s, t)| (s, t, 1.0)),
            directed,
        )
    }

    pub fn from_weighted_edge_list<S, I>(edges: I, directed: bool) -> Result<Self>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, S, f64)>,
    {
        let edge_list = edges.into_iter()
            .map(|(s, t, w)| (s.as_ref().to_string(), t.as_ref().to_string(), w));
        let indexes = GraphIndexes::from_edge_list(IndexSet::new(), edge_list, directed)?;
        Ok(EvalGraph { indexes })
    }

    /// Graph over `n` nodes named `"0".."n-1"`, edges given by dense index.
    pub fn from_indexed_edges(n: usize, edges: &[(usize, usize)], directed: bool) -> Result<Self> {
        let node_ids: IndexSet<String> = (0..n).map(|i| i.to_string()).collect();
        let mut edge_map = IndexMap::with_capacity(edges.len());
        for &(u, v) in edges {
            if u >= n || v >= n {
                return Err(EvalError::node_not_found(format!("{}", u.max(v))));
            }
            if u != v {
                edge_map.entry(edge_key(u, v, directed)).or_insert(1.0);
            }
        }
        Ok(EvalGraph {
            indexes: GraphIndexes::from_parts(node_ids, edge_map, directed),
        })
    }

    /// Copy of this graph with `removed` edges dropped. Node set and indices are unchanged.
    pub fn without_edges(&self, removed: &[(usize, usize)]) -> Result<Self> {
        let directed = self.is_directed();
        let mut edges = self.indexes.edges.clone();
        for &(u, v) in removed {
            if edges.shift_remove(&edge_key(u, v, directed)).is_none() {
                return Err(EvalError::invalid_parameter(format!(
                    "Edge ({}, {}) is not in the graph", u, v
                )));
            }
        }
        Ok(EvalGraph {
            indexes: GraphIndexes::from_parts(self.indexes.node_ids.clone(), edges, directed),
        })
    }

    pub fn is_directed(&self) -> bool {
        self.indexes.directed
    }

    /// Get number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.indexes.node_count()
    }

    /// Get number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.indexes.edge_count()
    }

    /// Calculate graph density (edges / max_possible_edges)
    pub fn density(&self) -> f64 {
        let n = self.node_count() as f64;
        let m = self.edge_count() as f64;

        if n <= 1.0 {
            0.0
        } else if self.is_directed() {
            m / (n * (n - 1.0))
        } else {
            2.0 * m / (n * (n - 1.0))
        }
    }

    /// Number of node pairs not joined by an edge (ordered pairs for directed graphs).
    pub fn non_edge_count(&self) -> usize {
        let n = self.node_count();
        let pairs = if self.is_directed() {
            n * n.saturating_sub(1)
        } else {
            n * n.saturating_sub(1) / 2
        };
        pairs - self.edge_count()
    }

    /// Out-neighbours (all neighbours for undirected graphs)
    pub fn neighbors(&self, node: usize) -> Option<&Vec<usize>> {
        self.indexes.neighbors(node)
    }

    /// In-neighbours (all neighbours for undirected graphs)
    pub fn predecessors(&self, node: usize) -> Option<&Vec<usize>> {
        self.indexes.predecessors(node)
    }

    pub fn has_node(&self, node_id: &str) -> bool {
        self.indexes.node_index(node_id).is_some()
    }

    pub fn node_index(&self, node_id: &str) -> Option<usize> {
        self.indexes.node_index(node_id)
    }

    pub fn node_id(&self, index: usize) -> Option<&str> {
        self.indexes.node_ids.get_index(index).map(|s| s.as_str())
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.indexes.has_edge(u, v)
    }

    pub fn edge_weight(&self, u: usize, v: usize) -> Option<f64> {
        self.indexes.edge_weight(u, v)
    }

    /// Edges as `(u, v, weight)` in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.indexes.edges.iter().map(|(&(u, v), &w)| (u, v, w))
    }

    /// Get all node IDs in dense index order
    pub fn node_ids(&self) -> impl Iterator<Item = &String> {
        self.indexes.node_ids.iter()
    }

    /// Number of weakly connected components.
    pub fn component_count(&self) -> usize {
        WeaklyConnectedComponents::count(self)
    }

    /// True when the graph forms a single (weakly) connected component.
    pub fn is_connected(&self) -> bool {
        self.node_count() > 0 && self.component_count() == 1
    }
}
