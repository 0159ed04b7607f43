use serde::{Deserialize, Serialize};
use crate::error::{EvalError, Result};
use crate::ml::{BinaryClassifier, FeatureMatrix};

/// L2-regularised logistic regression settings. `c` is the inverse
/// regularisation strength; the intercept is never penalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-6,
        }
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow.
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

/// In-place Cholesky factorisation of a dense symmetric `n × n` matrix into
/// its lower triangle. Returns `false` when the matrix is not positive definite.
fn cholesky(a: &mut [f64], n: usize) -> bool {
    for j in 0..n {
        let mut diag = a[j * n + j];
        for k in 0..j {
            diag -= a[j * n + k] * a[j * n + k];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return false;
        }
        let diag = diag.sqrt();
        a[j * n + j] = diag;

        for i in (j + 1)..n {
            let mut value = a[i * n + j];
            for k in 0..j {
                value -= a[i * n + k] * a[j * n + k];
            }
            a[i * n + j] = value / diag;
        }
    }
    true
}

/// Solve `L L^T x = b` given the factor from [`cholesky`].
fn cholesky_solve(l: &[f64], n: usize, b: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut value = b[i];
        for k in 0..i {
            value -= l[i * n + k] * y[k];
        }
        y[i] = value / l[i * n + i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut value = y[i];
        for k in (i + 1)..n {
            value -= l[k * n + i] * x[k];
        }
        x[i] = value / l[i * n + i];
    }
    x
}

/// Binary logistic regression fitted with damped Newton steps.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    config: LogisticConfig,
    weights: Vec<f64>,
    intercept: f64,
    iterations: usize,
}

impl LogisticRegression {
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            intercept: 0.0,
            iterations: 0,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Newton iterations used by the last fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn decision(x: &[f64], beta: &[f64]) -> f64 {
        let d = x.len();
        x.iter().zip(&beta[..d]).map(|(a, b)| a * b).sum::<f64>() + beta[d]
    }

    fn objective(&self, x: &FeatureMatrix, y: &[f64], beta: &[f64]) -> f64 {
        let d = x.features();
        let penalty = beta[..d].iter().map(|w| w * w).sum::<f64>() / (2.0 * self.config.c);
        let loss: f64 = (0..x.samples())
            .map(|i| {
                let z = Self::decision(x.row(i), beta);
                softplus(z) - y[i] * z
            })
            .sum();
        loss + penalty
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticConfig::default())
    }
}

impl BinaryClassifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "logistic_regression"
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[bool]) -> Result<()> {
        if x.samples() != y.len() {
            return Err(EvalError::shape_mismatch("logistic targets vs samples", x.samples(), y.len()));
        }
        if self.config.c <= 0.0 {
            return Err(EvalError::invalid_parameter("logistic regression C must be positive"));
        }

        let n = x.samples();
        let d = x.features();
        let p = d + 1;
        let targets: Vec<f64> = y.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
        let inv_c = 1.0 / self.config.c;

        let mut beta = vec![0.0; p];
        let mut current = self.objective(x, &targets, &beta);
        self.iterations = 0;

        for iteration in 0..self.config.max_iter {
            self.iterations = iteration + 1;

            let mut gradient = vec![0.0; p];
            let mut hessian = vec![0.0; p * p];
            for i in 0..n {
                let row = x.row(i);
                let prob = sigmoid(Self::decision(row, &beta));
                let residual = prob - targets[i];
                let w = prob * (1.0 - prob);

                for a in 0..p {
                    let xa = if a < d { row[a] } else { 1.0 };
                    gradient[a] += residual * xa;
                    for b in 0..=a {
                        let xb = if b < d { row[b] } else { 1.0 };
                        hessian[a * p + b] += w * xa * xb;
                    }
                }
            }
            for a in 0..d {
                gradient[a] += inv_c * beta[a];
                hessian[a * p + a] += inv_c;
            }
            for a in 0..p {
                for b in 0..a {
                    hessian[b * p + a] = hessian[a * p + b];
                }
            }

            let gradient_norm = gradient.iter().fold(0.0f64, |m, g| m.max(g.abs()));
            if gradient_norm < self.config.tol {
                log::debug!("logistic regression converged after {} iterations", iteration);
                break;
            }

            // Separable data can leave the unpenalised intercept direction flat
            let mut factor = hessian.clone();
            let mut jitter = 1e-10;
            while !cholesky(&mut factor, p) {
                if jitter > 1.0 {
                    return Err(EvalError::numerical("logistic regression Hessian is not positive definite"));
                }
                factor.copy_from_slice(&hessian);
                for a in 0..p {
                    factor[a * p + a] += jitter;
                }
                jitter *= 100.0;
            }
            let direction = cholesky_solve(&factor, p, &gradient);
            let decrement: f64 = gradient.iter().zip(&direction).map(|(g, s)| g * s).sum();

            let mut step = 1.0;
            let mut candidate: Vec<f64>;
            let mut candidate_value;
            loop {
                candidate = beta.iter().zip(&direction).map(|(b, s)| b - step * s).collect();
                candidate_value = self.objective(x, &targets, &candidate);
                if candidate_value <= current - 1e-4 * step * decrement || step < 1e-10 {
                    break;
                }
                step *= 0.5;
            }

            let improvement = current - candidate_value;
            beta = candidate;
            current = candidate_value;

            if improvement.abs() <= self.config.tol * current.abs().max(1.0) {
                log::debug!("logistic regression converged after {} iterations", iteration + 1);
                break;
            }
        }

        if !current.is_finite() {
            return Err(EvalError::numerical("logistic regression objective diverged"));
        }

        self.intercept = beta[d];
        beta.truncate(d);
        self.weights = beta;
        Ok(())
    }

    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        if x.features() != self.weights.len() {
            return Err(EvalError::shape_mismatch(
                "logistic regression feature count",
                self.weights.len(),
                x.features(),
            ));
        }
        Ok((0..x.samples())
            .map(|i| {
                let z: f64 = x.row(i).iter().zip(&self.weights).map(|(a, b)| a * b).sum();
                sigmoid(z + self.intercept)
            })
            .collect())
    }
}
