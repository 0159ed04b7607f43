use hashbrown::HashSet;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use crate::error::{EvalError, Result};
use crate::graph::indexes::edge_key;
use crate::graph::EvalGraph;

/// Below this acceptance rate the sampler draws from the enumerated non-edge
/// pool instead of rejection sampling.
const MIN_ACCEPTANCE_RATE: f64 = 0.1;

/// Uniform sampler over node pairs with no edge in a graph.
#[derive(Debug, Clone, Default)]
pub struct NegativeSampler {
    max_attempts: Option<usize>,
}

impl NegativeSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap on rejection-sampling draws; defaults to `100 * count + 1000`.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Draw `count` distinct non-adjacent pairs `(u, v)`, `u != v`.
    ///
    /// Pairs are unordered (`u < v`) for undirected graphs and ordered for
    /// directed ones. The draw sequence depends only on `graph`, `count` and `seed`.
    pub fn sample(&self, graph: &EvalGraph, count: usize, seed: u64) -> Result<Vec<(usize, usize)>> {
        let available = graph.non_edge_count();
        if count > available {
            return Err(EvalError::NegativeSampleExhaustion {
                requested: count,
                available,
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let n = graph.node_count();
        let mut rng = Pcg64::seed_from_u64(seed);
        let acceptance = available as f64 / (n * n) as f64;

        if acceptance < MIN_ACCEPTANCE_RATE {
            log::debug!(
                "Non-edge acceptance rate {:.4} too low, sampling from enumerated pool of {}",
                acceptance, available
            );
            return Ok(self.sample_from_pool(graph, count, &mut rng));
        }

        let max_attempts = self.max_attempts.unwrap_or(100 * count + 1000);
        let directed = graph.is_directed();
        let mut chosen: HashSet<(usize, usize)> = HashSet::with_capacity(count);
        let mut negatives = Vec::with_capacity(count);
        let mut attempts = 0usize;

        while negatives.len() < count {
            if attempts == max_attempts {
                log::warn!(
                    "Negative sampling gave up after {} draws with {} of {} pairs",
                    attempts, negatives.len(), count
                );
                return Err(EvalError::NegativeSampleExhaustion {
                    requested: count,
                    available: negatives.len(),
                });
            }
            attempts += 1;

            let u = rng.gen_range(0..n);
            let v = rng.gen_range(0..n);
            if u == v || graph.has_edge(u, v) {
                continue;
            }
            let key = edge_key(u, v, directed);
            if chosen.insert(key) {
                negatives.push(key);
            }
        }

        log::debug!("Sampled {} negative pairs in {} draws", negatives.len(), attempts);
        Ok(negatives)
    }

    fn sample_from_pool(&self, graph: &EvalGraph, count: usize, rng: &mut Pcg64) -> Vec<(usize, usize)> {
        let n = graph.node_count();
        let directed = graph.is_directed();
        let mut pool = Vec::with_capacity(graph.non_edge_count());

        for u in 0..n {
            let start = if directed { 0 } else { u + 1 };
            for v in start..n {
                if u != v && !graph.has_edge(u, v) {
                    pool.push((u, v));
                }
            }
        }

        index::sample(rng, pool.len(), count)
            .into_iter()
            .map(|i| pool[i])
            .collect()
    }
}

/// Sample with the default retry budget.
pub fn sample_negative(graph: &EvalGraph, count: usize, seed: u64) -> Result<Vec<(usize, usize)>> {
    NegativeSampler::new().sample(graph, count, seed)
}
