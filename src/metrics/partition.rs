//! External validation scores comparing two partitions of the same items.
//! All of them are invariant to permutations of the cluster ids.

use crate::error::{EvalError, Result};

/// Contingency table between a reference partition (rows) and a predicted one (columns).
#[derive(Debug, Clone)]
pub struct Contingency {
    table: Vec<Vec<usize>>,
    row_sums: Vec<usize>,
    col_sums: Vec<usize>,
    n: usize,
}

/// Pair counts: pairs together in both partitions, only in the reference,
/// only in the prediction, and apart in both.
#[derive(Debug, Clone, Copy)]
struct PairCounts {
    together: f64,
    only_reference: f64,
    only_predicted: f64,
    apart: f64,
}

fn dense_ids(labels: &[usize]) -> (Vec<usize>, usize) {
    let max = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut remap = vec![usize::MAX; max];
    let mut next = 0;
    let ids = labels.iter()
        .map(|&l| {
            if remap[l] == usize::MAX {
                remap[l] = next;
                next += 1;
            }
            remap[l]
        })
        .collect();
    (ids, next)
}

fn choose2(k: usize) -> f64 {
    let k = k as f64;
    k * (k - 1.0) / 2.0
}

fn entropy(sums: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    -sums.iter()
        .filter(|&&s| s > 0)
        .map(|&s| {
            let p = s as f64 / n;
            p * p.ln()
        })
        .sum::<f64>()
}

impl Contingency {
    pub fn new(reference: &[usize], predicted: &[usize]) -> Result<Self> {
        if reference.len() != predicted.len() {
            return Err(EvalError::shape_mismatch(
                "predicted partition vs reference partition",
                reference.len(),
                predicted.len(),
            ));
        }

        let (rows, n_rows) = dense_ids(reference);
        let (cols, n_cols) = dense_ids(predicted);
        let mut table = vec![vec![0usize; n_cols]; n_rows];
        let mut row_sums = vec![0usize; n_rows];
        let mut col_sums = vec![0usize; n_cols];

        for (&r, &c) in rows.iter().zip(&cols) {
            table[r][c] += 1;
            row_sums[r] += 1;
            col_sums[c] += 1;
        }

        Ok(Self {
            table,
            row_sums,
            col_sums,
            n: reference.len(),
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Both partitions trivial in the same way (one cluster each, or empty):
    /// every normalised score is 1 by convention.
    fn trivially_equal(&self) -> bool {
        self.row_sums.len() == self.col_sums.len() && self.row_sums.len() <= 1
    }

    fn cells(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.table.iter().enumerate().flat_map(|(i, row)| {
            row.iter().enumerate().filter(|(_, &v)| v > 0).map(move |(j, &v)| (i, j, v))
        })
    }

    fn pair_counts(&self) -> PairCounts {
        let together: f64 = self.cells().map(|(_, _, v)| choose2(v)).sum();
        let same_reference: f64 = self.row_sums.iter().map(|&a| choose2(a)).sum();
        let same_predicted: f64 = self.col_sums.iter().map(|&b| choose2(b)).sum();
        let total = choose2(self.n);

        PairCounts {
            together,
            only_reference: same_reference - together,
            only_predicted: same_predicted - together,
            apart: total - same_reference - same_predicted + together,
        }
    }

    /// Mutual information in nats.
    pub fn mutual_info(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let n = self.n as f64;
        let mi: f64 = self.cells()
            .map(|(i, j, v)| {
                let v = v as f64;
                let a = self.row_sums[i] as f64;
                let b = self.col_sums[j] as f64;
                (v / n) * ((n * v).ln() - (a * b).ln())
            })
            .sum();
        mi.max(0.0)
    }

    /// Expected mutual information under the hypergeometric model of
    /// random partitions with the same cluster sizes.
    pub fn expected_mutual_info(&self) -> f64 {
        let n = self.n;
        if n == 0 {
            return 0.0;
        }

        let mut log_factorial = vec![0.0f64; n + 1];
        for k in 1..=n {
            log_factorial[k] = log_factorial[k - 1] + (k as f64).ln();
        }
        let nf = n as f64;

        let mut emi = 0.0;
        for &a in &self.row_sums {
            for &b in &self.col_sums {
                let start = (a + b).saturating_sub(n).max(1);
                let end = a.min(b);
                for nij in start..=end {
                    let term_value = (nij as f64 / nf)
                        * ((nf * nij as f64).ln() - ((a * b) as f64).ln());
                    let log_prob = log_factorial[a] + log_factorial[b]
                        + log_factorial[n - a] + log_factorial[n - b]
                        - log_factorial[n] - log_factorial[nij]
                        - log_factorial[a - nij] - log_factorial[b - nij]
                        - log_factorial[n + nij - a - b];
                    emi += term_value * log_prob.exp();
                }
            }
        }
        emi
    }

    /// Adjusted mutual information, arithmetic-mean normalisation.
    pub fn adjusted_mutual_info(&self) -> f64 {
        if self.trivially_equal() {
            return 1.0;
        }
        let mi = self.mutual_info();
        let emi = self.expected_mutual_info();
        let normalizer = (entropy(&self.row_sums, self.n) + entropy(&self.col_sums, self.n)) / 2.0;

        let mut denominator = normalizer - emi;
        denominator = if denominator < 0.0 {
            denominator.min(-f64::EPSILON)
        } else {
            denominator.max(f64::EPSILON)
        };
        (mi - emi) / denominator
    }

    /// Mutual information over the arithmetic mean of the two entropies.
    pub fn normalized_mutual_info(&self) -> f64 {
        if self.trivially_equal() {
            return 1.0;
        }
        let normalizer = (entropy(&self.row_sums, self.n) + entropy(&self.col_sums, self.n)) / 2.0;
        if normalizer <= 0.0 {
            return 0.0;
        }
        (self.mutual_info() / normalizer).clamp(0.0, 1.0)
    }

    /// Fraction of item pairs on which both partitions agree.
    pub fn rand_index(&self) -> f64 {
        let total = choose2(self.n);
        if total == 0.0 {
            return 1.0;
        }
        let pairs = self.pair_counts();
        (pairs.together + pairs.apart) / total
    }

    /// Rand index corrected for chance; 1 on identical partitions, around 0 for random ones.
    pub fn adjusted_rand_index(&self) -> f64 {
        let p = self.pair_counts();
        if p.only_reference == 0.0 && p.only_predicted == 0.0 {
            return 1.0;
        }
        let numerator = 2.0 * (p.together * p.apart - p.only_reference * p.only_predicted);
        let denominator = (p.together + p.only_reference) * (p.only_reference + p.apart)
            + (p.together + p.only_predicted) * (p.only_predicted + p.apart);
        if denominator == 0.0 {
            return 1.0;
        }
        numerator / denominator
    }

    /// Geometric mean of pairwise precision and recall.
    pub fn fowlkes_mallows(&self) -> f64 {
        let p = self.pair_counts();
        if p.together == 0.0 {
            return 0.0;
        }
        let precision = p.together / (p.together + p.only_predicted);
        let recall = p.together / (p.together + p.only_reference);
        (precision * recall).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_identical_partitions_score_maximum() {
        let truth = [0, 0, 0, 1, 1, 1, 2, 2];
        // Same partition under different ids
        let predicted = [5, 5, 5, 3, 3, 3, 9, 9];
        let c = Contingency::new(&truth, &predicted).unwrap();

        assert!(approx(c.adjusted_mutual_info(), 1.0, 1e-10));
        assert!(approx(c.normalized_mutual_info(), 1.0, 1e-10));
        assert!(approx(c.adjusted_rand_index(), 1.0, 1e-12));
        assert!(approx(c.rand_index(), 1.0, 1e-12));
        assert!(approx(c.fowlkes_mallows(), 1.0, 1e-12));
    }

    #[test]
    fn test_known_values() {
        // Values cross-checked against the usual reference implementations
        let truth = [0, 0, 1, 1];
        let predicted = [0, 0, 1, 2];
        let c = Contingency::new(&truth, &predicted).unwrap();

        assert!(approx(c.adjusted_rand_index(), 0.5714285714285715, 1e-12));
        assert!(approx(c.rand_index(), 5.0 / 6.0, 1e-12));
        assert!(approx(c.fowlkes_mallows(), 1.0 / 2f64.sqrt(), 1e-12));
        assert!(approx(c.mutual_info(), 2f64.ln(), 1e-12));
        assert!(approx(c.adjusted_mutual_info(), 0.6666666666666666, 1e-9));
    }

    #[test]
    fn test_independent_partitions() {
        let truth = [0, 0, 1, 1];
        let predicted = [0, 1, 0, 1];
        let c = Contingency::new(&truth, &predicted).unwrap();

        assert!(approx(c.mutual_info(), 0.0, 1e-12));
        assert!(c.adjusted_rand_index() < 0.0);
        assert!(c.adjusted_mutual_info() <= 0.0);
        assert_eq!(c.fowlkes_mallows(), 0.0);
    }

    #[test]
    fn test_trivial_partitions() {
        let c = Contingency::new(&[0, 0, 0], &[1, 1, 1]).unwrap();
        assert_eq!(c.adjusted_mutual_info(), 1.0);
        assert_eq!(c.adjusted_rand_index(), 1.0);
        assert_eq!(c.normalized_mutual_info(), 1.0);
    }

    #[test]
    fn test_bounds_on_mixed_partition() {
        let truth = [0, 0, 0, 1, 1, 1, 2, 2, 2, 2];
        let predicted = [0, 1, 0, 1, 1, 2, 2, 2, 0, 2];
        let c = Contingency::new(&truth, &predicted).unwrap();

        for value in [c.rand_index(), c.fowlkes_mallows(), c.normalized_mutual_info()] {
            assert!((0.0..=1.0).contains(&value));
        }
        assert!(c.adjusted_rand_index() <= 1.0);
        assert!(c.adjusted_mutual_info() <= 1.0);
        assert!(c.expected_mutual_info() >= 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(Contingency::new(&[0, 1], &[0]).is_err());
    }
}
