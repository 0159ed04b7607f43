use crate::graph::EvalGraph;

/// Union-Find (Disjoint Set) over dense indices `0..n`
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
    component_sizes: Vec<usize>,
    components: usize,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
            component_sizes: vec![1; n],
            components: n,
        }
    }

    pub fn find(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression
        let mut current = node;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }

        root
    }

    /// Merge the sets of `a` and `b`; returns false when they already share a root.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);

        if root_a == root_b {
            return false;
        }

        // Union by rank
        let (new_root, old_root) = if self.rank[root_a] > self.rank[root_b] {
            (root_a, root_b)
        } else if self.rank[root_a] < self.rank[root_b] {
            (root_b, root_a)
        } else {
            self.rank[root_a] += 1;
            (root_a, root_b)
        };

        self.parent[old_root] = new_root;
        self.component_sizes[new_root] += self.component_sizes[old_root];
        self.components -= 1;

        true
    }

    pub fn component_count(&self) -> usize {
        self.components
    }

    pub fn component_size(&mut self, node: usize) -> usize {
        let root = self.find(node);
        self.component_sizes[root]
    }

    /// Component label per element, numbered `0..k` in order of first appearance.
    pub fn labels(&mut self) -> Vec<usize> {
        let n = self.parent.len();
        let mut root_to_label = vec![usize::MAX; n];
        let mut labels = Vec::with_capacity(n);
        let mut next = 0;

        for node in 0..n {
            let root = self.find(node);
            if root_to_label[root] == usize::MAX {
                root_to_label[root] = next;
                next += 1;
            }
            labels.push(root_to_label[root]);
        }

        labels
    }
}

pub struct WeaklyConnectedComponents;

impl WeaklyConnectedComponents {
    /// Edge direction is ignored.
    pub fn compute(graph: &EvalGraph) -> UnionFind {
        let mut uf = UnionFind::new(graph.node_count());
        for (u, v, _) in graph.edges() {
            uf.union(u, v);
        }
        uf
    }

    /// Component label for every node, in dense index order.
    pub fn labels(graph: &EvalGraph) -> Vec<usize> {
        Self::compute(graph).labels()
    }

    pub fn count(graph: &EvalGraph) -> usize {
        Self::compute(graph).component_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find_merges() {
        let mut uf = UnionFind::new(5);
        assert_eq!(uf.component_count(), 5);

        assert!(uf.union(0, 1));
        assert!(uf.union(3, 4));
        assert!(!uf.union(1, 0));
        assert_eq!(uf.component_count(), 3);
        assert_eq!(uf.component_size(0), 2);
        assert_eq!(uf.find(3), uf.find(4));
        assert_ne!(uf.find(0), uf.find(2));
    }

    #[test]
    fn test_labels_in_first_seen_order() {
        let mut uf = UnionFind::new(5);
        uf.union(1, 3);
        uf.union(2, 4);

        assert_eq!(uf.labels(), vec![0, 1, 2, 1, 2]);
    }

    #[test]
    fn test_weakly_connected_components_on_graph() {
        let graph = EvalGraph::from_edge_list(
            vec![("A", "B"), ("C", "D"), ("D", "E")],
            true,
        ).unwrap();

        assert_eq!(WeaklyConnectedComponents::count(&graph), 2);
        let labels = WeaklyConnectedComponents::labels(&graph);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[4]);
        assert_ne!(labels[0], labels[2]);
    }
}
