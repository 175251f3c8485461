//! Elastic-net regularized logistic classifier.
//!
//! Fit by proximal gradient descent: the smooth part (mean log-loss plus
//! the L2 share of the penalty) takes a gradient step, then the L1 share
//! is applied by soft-thresholding. The intercept is unpenalized. A fixed
//! iteration cap bounds the solver; running out of iterations degrades
//! quality but is not an error.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;

/// Solver hyperparameters for [`LogisticModel::fit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Blend between L1 (1.0) and L2 (0.0) penalties.
    pub l1_ratio: f64,
    /// Overall penalty strength.
    pub penalty: f64,
    /// Gradient step size.
    pub learning_rate: f64,
    /// Iteration cap for the solver.
    pub max_iter: usize,
    /// Convergence threshold on the largest coefficient update.
    pub tol: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            l1_ratio: 0.5,
            penalty: 1.0,
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-6,
        }
    }
}

/// Fitted binary logistic classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    weights: Vec<f64>,
    intercept: f64,
    /// Whether the solver met `tol` within the iteration cap.
    converged: bool,
    /// Iterations actually run.
    iterations: usize,
}

impl LogisticModel {
    /// Fit the classifier on a feature matrix and binary labels.
    ///
    /// If the solver does not converge within `max_iter` iterations the
    /// final iterate is kept and a warning is logged; prediction quality
    /// may be degraded but the model is still usable.
    ///
    /// # Errors
    /// Returns an error on an empty matrix or a row/label count mismatch.
    pub fn fit(
        x: &Array2<f64>,
        y: &[u8],
        options: &SolverOptions,
    ) -> Result<Self, PipelineError> {
        let rows = x.nrows();
        let cols = x.ncols();
        if rows == 0 || cols == 0 {
            return Err(PipelineError::EmptyTrainingSet);
        }
        if rows != y.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: rows,
                got: y.len(),
            });
        }

        let n = rows as f64;
        // Per-sample effective penalty, matching a summed-loss formulation.
        let lambda = options.penalty / n;
        let l2_share = lambda * (1.0 - options.l1_ratio);
        let l1_share = lambda * options.l1_ratio;

        let mut weights = vec![0.0; cols];
        let mut intercept = 0.0;
        let mut converged = false;
        let mut iterations = 0;

        for _ in 0..options.max_iter {
            iterations += 1;

            // Residuals p - y under the current iterate.
            let mut residuals = Vec::with_capacity(rows);
            for row in 0..rows {
                let mut z = intercept;
                for col in 0..cols {
                    z += weights[col] * x[[row, col]];
                }
                residuals.push(sigmoid(z) - f64::from(y[row]));
            }

            let mut max_delta: f64 = 0.0;
            for col in 0..cols {
                let mut grad = 0.0;
                for row in 0..rows {
                    grad += x[[row, col]] * residuals[row];
                }
                grad = grad / n + l2_share * weights[col];

                let stepped = weights[col] - options.learning_rate * grad;
                let updated = soft_threshold(stepped, options.learning_rate * l1_share);
                max_delta = max_delta.max((updated - weights[col]).abs());
                weights[col] = updated;
            }

            let grad_intercept = residuals.iter().sum::<f64>() / n;
            let updated = intercept - options.learning_rate * grad_intercept;
            max_delta = max_delta.max((updated - intercept).abs());
            intercept = updated;

            if max_delta < options.tol {
                converged = true;
                break;
            }
        }

        if converged {
            tracing::debug!(iterations, "Solver converged");
        } else {
            tracing::warn!(
                max_iter = options.max_iter,
                "Solver did not converge within the iteration cap; keeping final iterate"
            );
        }

        Ok(Self {
            weights,
            intercept,
            converged,
            iterations,
        })
    }

    /// Width of the feature space this model was fitted on.
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.weights.len()
    }

    /// Whether the fit met the tolerance within the iteration cap.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Iterations the solver actually ran.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Probability of the positive (disease-present) class.
    ///
    /// # Errors
    /// Returns an error if the feature count does not match the fit width.
    pub fn predict_probability(&self, features: &[f64]) -> Result<f64, PipelineError> {
        if features.len() != self.weights.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.weights.len(),
                got: features.len(),
            });
        }
        let z = self.intercept
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, v)| w * v)
                .sum::<f64>();
        Ok(sigmoid(z))
    }

    /// Binary prediction, thresholding the probability at 0.5.
    ///
    /// # Errors
    /// Returns an error if the feature count does not match the fit width.
    pub fn predict(&self, features: &[f64]) -> Result<u8, PipelineError> {
        Ok(u8::from(self.predict_probability(features)? >= 0.5))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn separable() -> (Array2<f64>, Vec<u8>) {
        // One feature cleanly separates the classes at 0.5.
        let values = vec![0.0, 0.1, 0.2, 0.3, 0.7, 0.8, 0.9, 1.0];
        let labels = vec![0, 0, 0, 0, 1, 1, 1, 1];
        (
            Array2::from_shape_vec((8, 1), values).expect("shape"),
            labels,
        )
    }

    #[test]
    fn test_fit_separates_classes() {
        let (x, y) = separable();
        let model = LogisticModel::fit(&x, &y, &SolverOptions::default()).expect("fit");

        assert_eq!(model.predict(&[0.05]).expect("predict"), 0);
        assert_eq!(model.predict(&[0.95]).expect("predict"), 1);
    }

    #[test]
    fn test_probability_bounded() {
        let (x, y) = separable();
        let model = LogisticModel::fit(&x, &y, &SolverOptions::default()).expect("fit");

        for value in [-100.0, -1.0, 0.0, 0.5, 1.0, 100.0] {
            let p = model.predict_probability(&[value]).expect("probability");
            assert!((0.0..=1.0).contains(&p), "p={p} for value={value}");
        }
    }

    #[test]
    fn test_prediction_matches_threshold() {
        let (x, y) = separable();
        let model = LogisticModel::fit(&x, &y, &SolverOptions::default()).expect("fit");

        for value in [0.0, 0.2, 0.4, 0.5, 0.6, 0.8, 1.0] {
            let p = model.predict_probability(&[value]).expect("probability");
            let pred = model.predict(&[value]).expect("predict");
            assert_eq!(pred, u8::from(p >= 0.5));
        }
    }

    #[test]
    fn test_iteration_cap_is_not_fatal() {
        let (x, y) = separable();
        let options = SolverOptions {
            max_iter: 3,
            tol: 1e-12,
            ..SolverOptions::default()
        };
        let model = LogisticModel::fit(&x, &y, &options).expect("fit");
        assert!(!model.converged());
        assert_eq!(model.iterations(), 3);
    }

    #[test]
    fn test_l1_share_shrinks_noise_weights() {
        // Feature 0 is informative, feature 1 is pure noise; a heavy L1
        // blend should zero the noise weight.
        let values = vec![
            0.0, 0.3, 0.1, 0.7, 0.2, 0.4, 0.3, 0.6, 0.7, 0.5, 0.8, 0.3, 0.9, 0.6, 1.0, 0.4,
        ];
        let labels = vec![0, 0, 0, 0, 1, 1, 1, 1];
        let x = Array2::from_shape_vec((8, 2), values).expect("shape");
        let options = SolverOptions {
            l1_ratio: 1.0,
            penalty: 8.0,
            ..SolverOptions::default()
        };
        let model = LogisticModel::fit(&x, &labels, &options).expect("fit");
        assert!(model.weights[1].abs() <= model.weights[0].abs());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let (x, y) = separable();
        let model = LogisticModel::fit(&x, &y, &SolverOptions::default()).expect("fit");
        assert!(model.predict_probability(&[0.1, 0.2]).is_err());
    }
}
