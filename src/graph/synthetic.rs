//! Seeded synthetic graphs with known community structure, used as fixtures
//! for the evaluators, the benchmarks and the CLI.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use crate::error::{EvalError, Result};
use crate::graph::EvalGraph;
use crate::labels::LabelSet;

/// A graph together with its ground-truth communities.
#[derive(Debug, Clone)]
pub struct PlantedPartition {
    pub graph: EvalGraph,
    pub labels: LabelSet,
}

/// Stochastic block model with `num_communities` blocks of `community_size`
/// nodes. Each block also gets a spanning ring and consecutive blocks share
/// one edge, so the result is always connected.
pub fn planted_partition(
    num_communities: usize,
    community_size: usize,
    p_in: f64,
    p_out: f64,
    seed: u64,
) -> Result<PlantedPartition> {
    if num_communities == 0 || community_size < 2 {
        return Err(EvalError::invalid_parameter(
            "planted partition needs at least one community of two or more nodes"
        ));
    }
    if !(0.0..=1.0).contains(&p_in) || !(0.0..=1.0).contains(&p_out) {
        return Err(EvalError::invalid_parameter(
            "p_in and p_out must lie in [0, 1]"
        ));
    }

    let n = num_communities * community_size;
    let community = |i: usize| i / community_size;
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut edges = Vec::new();

    for c in 0..num_communities {
        let start = c * community_size;
        for offset in 0..community_size {
            let u = start + offset;
            let v = start + (offset + 1) % community_size;
            edges.push((u, v));
        }
        if c + 1 < num_communities {
            edges.push((start, start + community_size));
        }
    }

    for u in 0..n {
        for v in (u + 1)..n {
            let p = if community(u) == community(v) { p_in } else { p_out };
            if rng.gen::<f64>() < p {
                edges.push((u, v));
            }
        }
    }

    let graph = EvalGraph::from_indexed_edges(n, &edges, false)?;
    let classes: Vec<String> = (0..n).map(|i| format!("c{}", community(i))).collect();
    let labels = LabelSet::single(&graph, classes)?;

    Ok(PlantedPartition { graph, labels })
}

/// `num_cliques` complete subgraphs of `clique_size` nodes joined in a ring
/// by one edge between consecutive cliques.
pub fn ring_of_cliques(num_cliques: usize, clique_size: usize) -> Result<PlantedPartition> {
    if num_cliques < 2 || clique_size < 2 {
        return Err(EvalError::invalid_parameter(
            "ring of cliques needs at least two cliques of two or more nodes"
        ));
    }

    let n = num_cliques * clique_size;
    let mut edges = Vec::new();
    for c in 0..num_cliques {
        let start = c * clique_size;
        for u in start..start + clique_size {
            for v in (u + 1)..start + clique_size {
                edges.push((u, v));
            }
        }
        let next = ((c + 1) % num_cliques) * clique_size;
        edges.push((start + clique_size - 1, next));
    }

    let graph = EvalGraph::from_indexed_edges(n, &edges, false)?;
    let classes: Vec<String> = (0..n).map(|i| format!("clique{}", i / clique_size)).collect();
    let labels = LabelSet::single(&graph, classes)?;

    Ok(PlantedPartition { graph, labels })
}

/// Two cliques of `clique_size` nodes joined by the single bridge
/// `(clique_size - 1, clique_size)`.
pub fn barbell(clique_size: usize) -> Result<EvalGraph> {
    if clique_size < 2 {
        return Err(EvalError::invalid_parameter("barbell cliques need two or more nodes"));
    }

    let mut edges = Vec::new();
    for start in [0, clique_size] {
        for u in start..start + clique_size {
            for v in (u + 1)..start + clique_size {
                edges.push((u, v));
            }
        }
    }
    edges.push((clique_size - 1, clique_size));

    EvalGraph::from_indexed_edges(2 * clique_size, &edges, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planted_partition_is_connected_and_labelled() {
        let planted = planted_partition(3, 10, 0.5, 0.02, 7).unwrap();

        assert_eq!(planted.graph.node_count(), 30);
        assert!(planted.graph.is_connected());
        assert!(planted.labels.has_labels());
        assert_eq!(planted.labels.num_classes(), 3);
    }

    #[test]
    fn test_planted_partition_is_seeded() {
        let a = planted_partition(2, 15, 0.4, 0.05, 11).unwrap();
        let b = planted_partition(2, 15, 0.4, 0.05, 11).unwrap();

        let edges_a: Vec<_> = a.graph.edges().collect();
        let edges_b: Vec<_> = b.graph.edges().collect();
        assert_eq!(edges_a, edges_b);
    }

    #[test]
    fn test_barbell_shape() {
        let graph = barbell(50).unwrap();

        assert_eq!(graph.node_count(), 100);
        assert_eq!(graph.edge_count(), 2 * (50 * 49 / 2) + 1);
        assert!(graph.has_edge(49, 50));
        assert!(graph.is_connected());
    }

    #[test]
    fn test_ring_of_cliques() {
        let ring = ring_of_cliques(4, 5).unwrap();

        assert_eq!(ring.graph.node_count(), 20);
        assert_eq!(ring.graph.edge_count(), 4 * 10 + 4);
        assert!(ring.graph.is_connected());
    }
}
