use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use crate::error::{EvalError, Result};
use crate::graph::EvalGraph;

/// How the splitter reacts to the connectivity constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Refuse any removal that would split a (weakly) connected component.
    /// Turning this off is the explicit override.
    pub enforce_connectivity: bool,
    /// Return fewer held-out edges instead of failing when the quota cannot be met.
    pub allow_partial: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            enforce_connectivity: true,
            allow_partial: false,
        }
    }
}

/// Result of a train/test edge split.
#[derive(Debug, Clone)]
pub struct EdgeSplit {
    pub train_graph: EvalGraph,
    /// Removed edges in removal order, as canonical `(u, v)` dense pairs.
    pub held_out: Vec<(usize, usize)>,
    /// `round(testing_ratio * |E|)`
    pub requested: usize,
}

impl EdgeSplit {
    pub fn is_partial(&self) -> bool {
        self.held_out.len() < self.requested
    }
}

/// Removes a fraction of edges while keeping every component in one piece.
#[derive(Debug, Clone, Default)]
pub struct EdgeSplitter {
    options: SplitOptions,
}

impl EdgeSplitter {
    pub fn new(options: SplitOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SplitOptions {
        self.options
    }

    /// Hold out `round(testing_ratio * |E|)` edges.
    ///
    /// Candidates are visited in a seeded permutation of the edge order. With
    /// connectivity enforced, a candidate is tentatively removed and kept out
    /// only if its endpoints stay reachable from one another; for directed
    /// graphs reachability ignores direction.
    pub fn split(&self, graph: &EvalGraph, testing_ratio: f64, seed: u64) -> Result<EdgeSplit> {
        if !(testing_ratio > 0.0 && testing_ratio < 1.0) {
            return Err(EvalError::invalid_parameter(format!(
                "testing_ratio must lie in (0, 1), got {}", testing_ratio
            )));
        }

        let edges: Vec<(usize, usize)> = graph.edges().map(|(u, v, _)| (u, v)).collect();
        let requested = (testing_ratio * edges.len() as f64).round() as usize;

        let mut rng = Pcg64::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..edges.len()).collect();
        order.shuffle(&mut rng);

        let mut working: StableUnGraph<(), ()> =
            StableUnGraph::with_capacity(graph.node_count(), edges.len());
        for _ in 0..graph.node_count() {
            working.add_node(());
        }
        let edge_handles: Vec<_> = edges.iter()
            .map(|&(u, v)| working.add_edge(NodeIndex::new(u), NodeIndex::new(v), ()))
            .collect();

        let mut held_out = Vec::with_capacity(requested);
        let mut rejected = 0usize;

        for idx in order {
            if held_out.len() == requested {
                break;
            }

            let (u, v) = edges[idx];
            working.remove_edge(edge_handles[idx]);

            let keeps_connectivity = !self.options.enforce_connectivity
                || has_path_connecting(&working, NodeIndex::new(u), NodeIndex::new(v), None);

            if keeps_connectivity {
                held_out.push((u, v));
            } else {
                working.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
                rejected += 1;
            }
        }

        log::debug!(
            "Edge split: requested {}, removed {}, rejected {} bridge candidates",
            requested, held_out.len(), rejected
        );

        if held_out.len() < requested {
            if !self.options.allow_partial {
                return Err(EvalError::InsufficientRemovableEdges {
                    requested,
                    removed: held_out.len(),
                });
            }
            log::warn!(
                "Only {} of {} requested edges could be held out without disconnecting the graph",
                held_out.len(), requested
            );
        }

        let train_graph = graph.without_edges(&held_out)?;

        Ok(EdgeSplit {
            train_graph,
            held_out,
            requested,
        })
    }
}

/// Split with the default options (connectivity enforced, no partial results).
pub fn split(graph: &EvalGraph, testing_ratio: f64, seed: u64) -> Result<EdgeSplit> {
    EdgeSplitter::default().split(graph, testing_ratio, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{barbell, planted_partition};
    use hashbrown::HashSet;

    fn path_graph(n: usize) -> EvalGraph {
        let edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        EvalGraph::from_indexed_edges(n, &edges, false).unwrap()
    }

    #[test]
    fn test_split_preserves_nodes_and_connectivity() {
        let planted = planted_partition(3, 20, 0.4, 0.05, 3).unwrap();
        let graph = planted.graph;
        let split = split(&graph, 0.3, 42).unwrap();

        assert_eq!(split.train_graph.node_count(), graph.node_count());
        assert!(split.train_graph.is_connected());
        assert_eq!(split.held_out.len(), split.requested);
        assert_eq!(
            split.train_graph.edge_count() + split.held_out.len(),
            graph.edge_count()
        );
    }

    #[test]
    fn test_held_out_edges_are_original_and_disjoint_from_train() {
        let graph = planted_partition(2, 25, 0.5, 0.05, 9).unwrap().graph;
        let split = split(&graph, 0.2, 5).unwrap();

        let unique: HashSet<_> = split.held_out.iter().collect();
        assert_eq!(unique.len(), split.held_out.len());
        for &(u, v) in &split.held_out {
            assert!(graph.has_edge(u, v));
            assert!(!split.train_graph.has_edge(u, v));
        }
    }

    #[test]
    fn test_split_is_deterministic_for_seed() {
        let graph = planted_partition(2, 20, 0.5, 0.1, 1).unwrap().graph;

        let a = split(&graph, 0.25, 77).unwrap();
        let b = split(&graph, 0.25, 77).unwrap();
        let c = split(&graph, 0.25, 78).unwrap();

        assert_eq!(a.held_out, b.held_out);
        let train_a: Vec<_> = a.train_graph.edges().collect();
        let train_b: Vec<_> = b.train_graph.edges().collect();
        assert_eq!(train_a, train_b);
        assert_ne!(a.held_out, c.held_out);
    }

    #[test]
    fn test_bridge_is_never_removed() {
        // Two 50-cliques joined by the bridge (49, 50)
        let graph = barbell(50).unwrap();

        for seed in 0..20 {
            let split = split(&graph, 0.5, seed).unwrap();
            assert!(!split.held_out.contains(&(49, 50)));
            assert!(split.train_graph.has_edge(49, 50));
            assert!(split.train_graph.is_connected());
        }
    }

    #[test]
    fn test_tree_cannot_lose_edges() {
        let graph = path_graph(10);
        let err = split(&graph, 0.3, 0).unwrap_err();

        match err {
            EvalError::InsufficientRemovableEdges { requested, removed } => {
                assert_eq!(requested, 3);
                assert_eq!(removed, 0);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_partial_split_when_allowed() {
        // A triangle plus a tail: only one triangle edge is removable
        let graph = EvalGraph::from_indexed_edges(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)], false).unwrap();
        let splitter = EdgeSplitter::new(SplitOptions { enforce_connectivity: true, allow_partial: true });

        let split = splitter.split(&graph, 0.6, 4).unwrap();
        assert!(split.is_partial());
        assert_eq!(split.held_out.len(), 1);
        assert!(split.train_graph.is_connected());
    }

    #[test]
    fn test_override_ignores_connectivity() {
        let graph = path_graph(10);
        let splitter = EdgeSplitter::new(SplitOptions { enforce_connectivity: false, allow_partial: false });

        let split = splitter.split(&graph, 0.3, 0).unwrap();
        assert_eq!(split.held_out.len(), 3);
        assert!(!split.train_graph.is_connected());
    }

    #[test]
    fn test_disconnected_graph_keeps_component_count() {
        let graph = EvalGraph::from_indexed_edges(
            6,
            &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)],
            false,
        ).unwrap();
        let split = split(&graph, 0.34, 8).unwrap();

        assert_eq!(split.held_out.len(), 2);
        assert_eq!(split.train_graph.component_count(), 2);
    }

    #[test]
    fn test_directed_graph_stays_weakly_connected() {
        let graph = EvalGraph::from_indexed_edges(
            4,
            &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2), (2, 0)],
            true,
        ).unwrap();
        let split = split(&graph, 0.5, 13).unwrap();

        assert_eq!(split.held_out.len(), 3);
        assert!(split.train_graph.is_connected());
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let graph = path_graph(4);
        assert!(matches!(split(&graph, 0.0, 0), Err(EvalError::InvalidParameter(_))));
        assert!(matches!(split(&graph, 1.0, 0), Err(EvalError::InvalidParameter(_))));
    }
}
