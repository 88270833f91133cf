//! L2-regularized logistic regression over sparse TF-IDF features.
//!
//! Two classes are handled by a single binary model. With more classes one
//! binary model is trained per class (one-vs-rest) and the per-class
//! probabilities are renormalized to sum to one.
//!
//! The objective for each binary model is the mean log-loss plus
//! `||w||² / (2·C·n)`, which has the same minimizer as the usual
//! `C·Σ loss + ||w||² / 2` formulation. The intercept is not penalized.

use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SolaceError};
use crate::ml::sparse::{SparseMatrix, SparseVector};

/// Optimization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Solver {
    /// Full-batch gradient descent. Deterministic.
    #[default]
    #[serde(rename = "gd")]
    GradientDescent,
    /// Mini-batch stochastic gradient descent, shuffled with the configured seed.
    #[serde(rename = "sgd")]
    Sgd,
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Solver::GradientDescent => write!(f, "gd"),
            Solver::Sgd => write!(f, "sgd"),
        }
    }
}

impl FromStr for Solver {
    type Err = SolaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gd" | "gradient_descent" => Ok(Solver::GradientDescent),
            "sgd" => Ok(Solver::Sgd),
            other => Err(SolaceError::invalid_config(format!(
                "unknown solver {other:?}, expected \"gd\" or \"sgd\""
            ))),
        }
    }
}

/// Hyperparameters for [`LogisticRegression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    /// Inverse regularization strength.
    pub c: f64,
    /// Maximum number of passes over the training data.
    pub max_iter: usize,
    /// Convergence tolerance.
    pub tol: f64,
    /// Step size.
    pub learning_rate: f64,
    /// Mini-batch size (SGD only).
    pub batch_size: usize,
    /// Shuffle seed (SGD only).
    pub seed: u64,
    pub solver: Solver,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        LogisticConfig {
            c: 1.0,
            max_iter: 200,
            tol: 1e-4,
            learning_rate: 1.0,
            batch_size: 64,
            seed: 42,
            solver: Solver::GradientDescent,
        }
    }
}

impl LogisticConfig {
    /// Reject values the optimizer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.c <= 0.0 || !self.c.is_finite() {
            return Err(SolaceError::invalid_config(format!(
                "c must be a positive finite number, got {}",
                self.c
            )));
        }
        if self.max_iter == 0 {
            return Err(SolaceError::invalid_config("max_iter must be at least 1"));
        }
        if self.tol < 0.0 || self.tol.is_nan() {
            return Err(SolaceError::invalid_config("tol must be non-negative"));
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err(SolaceError::invalid_config(
                "learning_rate must be a positive finite number",
            ));
        }
        if self.batch_size == 0 {
            return Err(SolaceError::invalid_config("batch_size must be at least 1"));
        }
        Ok(())
    }
}

/// One binary linear model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BinaryModel {
    weights: Vec<f64>,
    intercept: f64,
    n_iter: usize,
    /// Whether the stopping criterion was met within `max_iter`.
    converged: bool,
}

impl BinaryModel {
    fn zeros(n_features: usize) -> Self {
        BinaryModel {
            weights: vec![0.0; n_features],
            intercept: 0.0,
            n_iter: 0,
            converged: false,
        }
    }

    fn decision(&self, x: &SparseVector) -> f64 {
        x.dot_dense(&self.weights) + self.intercept
    }

    fn row_decision(&self, x: &SparseMatrix, i: usize) -> f64 {
        x.row_dot(i, &self.weights) + self.intercept
    }

    /// Regularized mean log-loss over the rows.
    fn loss(&self, x: &SparseMatrix, y: &[f64], alpha: f64) -> f64 {
        let n = x.n_rows() as f64;
        let data: f64 = (0..x.n_rows())
            .map(|i| log_loss(self.row_decision(x, i), y[i]))
            .sum();
        let penalty: f64 = self.weights.iter().map(|w| w * w).sum();
        data / n + 0.5 * alpha * penalty
    }
}

/// A trained, immutable logistic regression classifier.
///
/// The model remembers the feature dimension it was trained on and,
/// optionally, the fingerprint of the vocabulary that produced its
/// features, so it can refuse inputs from a different vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    config: LogisticConfig,
    n_features: usize,
    n_classes: usize,
    feature_fingerprint: Option<u32>,
    models: Vec<BinaryModel>,
}

impl LogisticRegression {
    /// Train on `x` with class ids `y` in `0..n_classes`.
    pub fn fit(config: LogisticConfig, x: &SparseMatrix, y: &[usize], n_classes: usize) -> Result<Self> {
        config.validate()?;

        if n_classes < 2 {
            return Err(SolaceError::invalid_argument(format!(
                "logistic regression needs at least 2 classes, got {n_classes}"
            )));
        }
        if x.n_rows() == 0 {
            return Err(SolaceError::invalid_argument("cannot train on zero rows"));
        }
        if x.n_rows() != y.len() {
            return Err(SolaceError::invalid_argument(format!(
                "feature matrix has {} rows but {} labels were given",
                x.n_rows(),
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&class| class >= n_classes) {
            return Err(SolaceError::invalid_argument(format!(
                "class id {bad} out of range for {n_classes} classes"
            )));
        }

        // Binary problems train a single model for the positive class (id 1)
        let positives: Vec<usize> = if n_classes == 2 {
            vec![1]
        } else {
            (0..n_classes).collect()
        };

        let mut models = Vec::with_capacity(positives.len());
        for positive in positives {
            let targets: Vec<f64> = y
                .iter()
                .map(|&class| if class == positive { 1.0 } else { 0.0 })
                .collect();

            let model = match config.solver {
                Solver::GradientDescent => train_gradient_descent(&config, x, &targets),
                Solver::Sgd => train_sgd(&config, x, &targets, positive as u64),
            };

            if !model.converged {
                log::warn!(
                    "solver {} did not converge for class {positive} within {} iterations",
                    config.solver,
                    config.max_iter
                );
            } else {
                log::debug!("class {positive} converged after {} iterations", model.n_iter);
            }
            models.push(model);
        }

        Ok(LogisticRegression {
            config,
            n_features: x.n_cols(),
            n_classes,
            feature_fingerprint: None,
            models,
        })
    }

    /// Record the fingerprint of the vocabulary the features came from.
    pub fn with_feature_fingerprint(mut self, fingerprint: u32) -> Self {
        self.feature_fingerprint = Some(fingerprint);
        self
    }

    /// Verify that features of dimension `n_features` with vocabulary
    /// `fingerprint` are what this model was trained on.
    pub fn check_features(&self, n_features: usize, fingerprint: u32) -> Result<()> {
        if n_features != self.n_features {
            return Err(SolaceError::schema_mismatch(format!(
                "classifier expects {} features, vectorizer produces {n_features}",
                self.n_features
            )));
        }
        if let Some(expected) = self.feature_fingerprint
            && expected != fingerprint
        {
            return Err(SolaceError::schema_mismatch(format!(
                "classifier was trained on vocabulary {expected:08x}, vectorizer has {fingerprint:08x}"
            )));
        }
        Ok(())
    }

    fn check_dim(&self, dim: usize) -> Result<()> {
        if dim != self.n_features {
            return Err(SolaceError::schema_mismatch(format!(
                "classifier expects {} features, got {dim}",
                self.n_features
            )));
        }
        Ok(())
    }

    /// Raw decision value per binary model.
    pub fn decision_function(&self, x: &SparseVector) -> Result<Vec<f64>> {
        self.check_dim(x.dim())?;
        Ok(self.models.iter().map(|m| m.decision(x)).collect())
    }

    /// Class probabilities, one entry per class id.
    pub fn predict_proba(&self, x: &SparseVector) -> Result<Vec<f64>> {
        let scores = self.decision_function(x)?;

        if self.n_classes == 2 {
            let p = sigmoid(scores[0]);
            return Ok(vec![1.0 - p, p]);
        }

        let mut probs: Vec<f64> = scores.into_iter().map(sigmoid).collect();
        let total: f64 = probs.iter().sum();
        if total > 0.0 {
            for p in &mut probs {
                *p /= total;
            }
        }
        Ok(probs)
    }

    /// Most probable class id. Ties resolve to the lowest id.
    pub fn predict(&self, x: &SparseVector) -> Result<usize> {
        let probs = self.predict_proba(x)?;
        Ok(argmax(&probs))
    }

    /// Predict every row of a matrix.
    pub fn predict_batch(&self, x: &SparseMatrix) -> Result<Vec<usize>> {
        self.check_dim(x.n_cols())?;
        (0..x.n_rows())
            .map(|i| self.predict(&x.row_vector(i)))
            .collect()
    }

    /// Mean accuracy on `x` against class ids `y`.
    pub fn score(&self, x: &SparseMatrix, y: &[usize]) -> Result<f64> {
        if x.n_rows() != y.len() {
            return Err(SolaceError::invalid_argument(format!(
                "feature matrix has {} rows but {} labels were given",
                x.n_rows(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Ok(0.0);
        }
        let predicted = self.predict_batch(x)?;
        let correct = predicted.iter().zip(y).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len() as f64)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn feature_fingerprint(&self) -> Option<u32> {
        self.feature_fingerprint
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    /// Iterations used by each binary model.
    pub fn n_iter(&self) -> Vec<usize> {
        self.models.iter().map(|m| m.n_iter).collect()
    }

    /// Whether each binary model met the tolerance before `max_iter` ran out.
    pub fn converged(&self) -> Vec<bool> {
        self.models.iter().map(|m| m.converged).collect()
    }
}

fn train_gradient_descent(config: &LogisticConfig, x: &SparseMatrix, y: &[f64]) -> BinaryModel {
    let n = x.n_rows() as f64;
    let alpha = 1.0 / (config.c * n);
    let mut model = BinaryModel::zeros(x.n_cols());
    let mut grad = vec![0.0; x.n_cols()];

    for iter in 1..=config.max_iter {
        grad.iter_mut().for_each(|g| *g = 0.0);
        let mut grad_intercept = 0.0;

        for i in 0..x.n_rows() {
            let residual = sigmoid(model.row_decision(x, i)) - y[i];
            for (idx, value) in x.row(i) {
                grad[idx] += residual * value;
            }
            grad_intercept += residual;
        }

        let mut max_grad = (grad_intercept / n).abs();
        for (g, w) in grad.iter_mut().zip(&model.weights) {
            *g = *g / n + alpha * w;
            max_grad = max_grad.max(g.abs());
        }

        model.n_iter = iter;
        if max_grad < config.tol {
            model.converged = true;
            break;
        }

        for (w, g) in model.weights.iter_mut().zip(&grad) {
            *w -= config.learning_rate * g;
        }
        model.intercept -= config.learning_rate * grad_intercept / n;
    }

    model
}

fn train_sgd(config: &LogisticConfig, x: &SparseMatrix, y: &[f64], stream: u64) -> BinaryModel {
    let n = x.n_rows() as f64;
    let alpha = 1.0 / (config.c * n);
    let mut model = BinaryModel::zeros(x.n_cols());
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(stream));
    let mut order: Vec<usize> = (0..x.n_rows()).collect();
    let mut grad = vec![0.0; x.n_cols()];
    let mut previous_loss = model.loss(x, y, alpha);

    for epoch in 1..=config.max_iter {
        order.shuffle(&mut rng);

        for batch in order.chunks(config.batch_size) {
            let size = batch.len() as f64;
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_intercept = 0.0;

            for &i in batch {
                let residual = sigmoid(model.row_decision(x, i)) - y[i];
                for (idx, value) in x.row(i) {
                    grad[idx] += residual * value;
                }
                grad_intercept += residual;
            }

            for (w, g) in model.weights.iter_mut().zip(&grad) {
                *w -= config.learning_rate * (g / size + alpha * *w);
            }
            model.intercept -= config.learning_rate * grad_intercept / size;
        }

        model.n_iter = epoch;
        let loss = model.loss(x, y, alpha);
        if (previous_loss - loss).abs() < config.tol {
            model.converged = true;
            break;
        }
        previous_loss = loss;
    }

    model
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Log-loss of decision value `z` against a 0/1 target, without overflow.
fn log_loss(z: f64, y: f64) -> f64 {
    // ln(1 + e^z) - y·z
    let softplus = if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    };
    softplus - y * z
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
