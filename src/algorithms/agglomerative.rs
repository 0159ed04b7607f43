use serde::{Deserialize, Serialize};
use crate::algorithms::components::UnionFind;
use crate::embedding::EmbeddingMatrix;
use crate::error::{EvalError, Result};

/// Inter-cluster distance used when merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    /// Minimum increase of within-cluster variance.
    #[default]
    Ward,
    Complete,
    Average,
    Single,
}

impl Linkage {
    pub fn name(&self) -> &'static str {
        match self {
            Linkage::Ward => "ward",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Single => "single",
        }
    }

    /// Lance-Williams update: distance from `k` to the union of `i` and `j`.
    /// Ward works on squared Euclidean distances.
    fn update(&self, d_ki: f64, d_kj: f64, d_ij: f64, n_i: f64, n_j: f64, n_k: f64) -> f64 {
        match self {
            Linkage::Single => d_ki.min(d_kj),
            Linkage::Complete => d_ki.max(d_kj),
            Linkage::Average => (n_i * d_ki + n_j * d_kj) / (n_i + n_j),
            Linkage::Ward => {
                ((n_i + n_k) * d_ki + (n_j + n_k) * d_kj - n_k * d_ij) / (n_i + n_j + n_k)
            }
        }
    }
}

/// One step of the dendrogram: the clusters represented by points `a` and
/// `b` merged at `height`, giving a cluster of `size` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub a: usize,
    pub b: usize,
    pub height: f64,
    pub size: usize,
}

/// Condensed upper-triangular distance storage.
struct Condensed {
    n: usize,
    values: Vec<f64>,
}

impl Condensed {
    fn index(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.n * i - i * (i + 1) / 2 + j - i - 1
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.values[self.index(i, j)]
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.index(i, j);
        self.values[idx] = value;
    }
}

/// Deterministic hierarchical clustering with the nearest-neighbour chain
/// algorithm. Ties resolve towards the chain predecessor, then the lowest index.
#[derive(Debug, Clone, Default)]
pub struct AgglomerativeClustering {
    linkage: Linkage,
}

impl AgglomerativeClustering {
    pub fn new(linkage: Linkage) -> Self {
        Self { linkage }
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    fn distances(&self, embedding: &EmbeddingMatrix) -> Result<Condensed> {
        let n = embedding.nrows();
        if embedding.as_slice().iter().any(|v| !v.is_finite()) {
            return Err(EvalError::numerical("embedding contains non-finite values"));
        }

        let mut values = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            let a = embedding.row(i);
            for j in (i + 1)..n {
                let squared: f64 = a.iter().zip(embedding.row(j)).map(|(x, y)| (x - y) * (x - y)).sum();
                values.push(match self.linkage {
                    Linkage::Ward => squared,
                    _ => squared.sqrt(),
                });
            }
        }
        Ok(Condensed { n, values })
    }

    /// Full dendrogram as `n - 1` merges sorted by height.
    pub fn linkage_tree(&self, embedding: &EmbeddingMatrix) -> Result<Vec<Merge>> {
        let n = embedding.nrows();
        if n == 0 {
            return Err(EvalError::empty_evaluation_set("clustering an empty embedding"));
        }

        let mut distances = self.distances(embedding)?;
        let mut active = vec![true; n];
        let mut size = vec![1usize; n];
        let mut chain: Vec<usize> = Vec::with_capacity(n);
        let mut merges = Vec::with_capacity(n - 1);

        while merges.len() < n - 1 {
            if chain.is_empty() {
                if let Some(first) = active.iter().position(|&a| a) {
                    chain.push(first);
                }
            }

            let (x, y, d_xy) = loop {
                let x = chain[chain.len() - 1];
                let previous = if chain.len() >= 2 { Some(chain[chain.len() - 2]) } else { None };

                let mut nearest = previous;
                let mut best = previous.map_or(f64::INFINITY, |p| distances.get(x, p));
                for k in 0..n {
                    if !active[k] || k == x {
                        continue;
                    }
                    let d = distances.get(x, k);
                    if d < best {
                        best = d;
                        nearest = Some(k);
                    }
                }

                let Some(y) = nearest else {
                    return Err(EvalError::numerical("nearest-neighbour chain lost its partner"));
                };
                if Some(y) == previous {
                    break (x, y, best);
                }
                chain.push(y);
            };

            chain.truncate(chain.len() - 2);

            // The merged cluster keeps the lower index as representative
            let (keep, drop) = if x < y { (x, y) } else { (y, x) };
            let n_keep = size[keep] as f64;
            let n_drop = size[drop] as f64;
            for k in 0..n {
                if !active[k] || k == keep || k == drop {
                    continue;
                }
                let updated = self.linkage.update(
                    distances.get(k, keep),
                    distances.get(k, drop),
                    d_xy,
                    n_keep,
                    n_drop,
                    size[k] as f64,
                );
                distances.set(k, keep, updated);
            }

            active[drop] = false;
            size[keep] += size[drop];
            let height = match self.linkage {
                Linkage::Ward => d_xy.max(0.0).sqrt(),
                _ => d_xy,
            };
            merges.push(Merge { a: keep, b: drop, height, size: size[keep] });
        }

        merges.sort_by(|l, r| l.height.total_cmp(&r.height));
        Ok(merges)
    }

    /// Cut the dendrogram into exactly `n_clusters` flat clusters. Labels are
    /// dense and numbered in first-seen row order.
    pub fn fit_predict(&self, embedding: &EmbeddingMatrix, n_clusters: usize) -> Result<Vec<usize>> {
        let n = embedding.nrows();
        if n_clusters == 0 || n_clusters > n {
            return Err(EvalError::invalid_parameter(format!(
                "n_clusters must be in 1..={}, got {}", n, n_clusters
            )));
        }

        let merges = self.linkage_tree(embedding)?;
        let mut union_find = UnionFind::new(n);
        for merge in merges.iter().take(n - n_clusters) {
            union_find.union(merge.a, merge.b);
        }

        log::debug!(
            "{} linkage: {} points cut into {} clusters",
            self.linkage.name(), n, union_find.component_count()
        );
        Ok(union_find.labels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_blobs() -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows(vec![
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            vec![0.1, 0.2],
            vec![-10.0, 5.0],
            vec![10.2, 9.9],
            vec![0.2, -0.1],
            vec![-9.8, 5.1],
            vec![9.9, 10.1],
        ]).unwrap()
    }

    #[test]
    fn test_recovers_blobs_for_every_linkage() {
        let embedding = three_blobs();
        for linkage in [Linkage::Ward, Linkage::Complete, Linkage::Average, Linkage::Single] {
            let labels = AgglomerativeClustering::new(linkage).fit_predict(&embedding, 3).unwrap();
            assert_eq!(labels, vec![0, 1, 0, 2, 1, 0, 2, 1], "linkage {}", linkage.name());
        }
    }

    #[test]
    fn test_dendrogram_shape() {
        let merges = AgglomerativeClustering::default().linkage_tree(&three_blobs()).unwrap();

        assert_eq!(merges.len(), 7);
        assert!(merges.windows(2).all(|w| w[0].height <= w[1].height));
        assert_eq!(merges.last().map(|m| m.size), Some(8));
    }

    #[test]
    fn test_single_linkage_heights() {
        let embedding = EmbeddingMatrix::from_rows(vec![vec![0.0], vec![1.0], vec![3.0], vec![7.0]]).unwrap();
        let merges = AgglomerativeClustering::new(Linkage::Single).linkage_tree(&embedding).unwrap();
        let heights: Vec<f64> = merges.iter().map(|m| m.height).collect();

        assert_eq!(heights, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_ward_height_of_pair() {
        // Two points at distance 2: Ward height equals their Euclidean distance
        let embedding = EmbeddingMatrix::from_rows(vec![vec![0.0, 0.0], vec![2.0, 0.0]]).unwrap();
        let merges = AgglomerativeClustering::new(Linkage::Ward).linkage_tree(&embedding).unwrap();
        assert!((merges[0].height - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cut_extremes_and_determinism() {
        let embedding = three_blobs();
        let clustering = AgglomerativeClustering::default();

        assert_eq!(clustering.fit_predict(&embedding, 1).unwrap(), vec![0; 8]);
        assert_eq!(clustering.fit_predict(&embedding, 8).unwrap(), (0..8).collect::<Vec<_>>());
        assert_eq!(
            clustering.fit_predict(&embedding, 4).unwrap(),
            clustering.fit_predict(&embedding, 4).unwrap()
        );
    }

    #[test]
    fn test_duplicate_points() {
        let embedding = EmbeddingMatrix::from_rows(vec![vec![1.0]; 5]).unwrap();
        let labels = AgglomerativeClustering::default().fit_predict(&embedding, 2).unwrap();

        assert_eq!(labels.len(), 5);
        assert_eq!(labels[0], 0);
        assert_eq!(*labels.iter().max().unwrap(), 1);
    }

    #[test]
    fn test_invalid_cluster_count() {
        let embedding = three_blobs();
        let clustering = AgglomerativeClustering::default();

        assert!(matches!(clustering.fit_predict(&embedding, 0), Err(EvalError::InvalidParameter(_))));
        assert!(matches!(clustering.fit_predict(&embedding, 9), Err(EvalError::InvalidParameter(_))));
    }
}
