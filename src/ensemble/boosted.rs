//! Gradient-boosted decision stumps under logistic loss.

use anyhow::{Result, ensure};
use ndarray::{Array2, ArrayView1};

use super::Classifier;

const DEFAULT_ROUNDS: usize = 100;
const DEFAULT_LEARNING_RATE: f64 = 0.1;
const THRESHOLD_CANDIDATES: usize = 16;
const HESSIAN_EPSILON: f64 = 1e-9;

/// One depth-1 regression tree: a feature, a threshold, and a leaf value
/// per side.
#[derive(Debug, Clone)]
struct Stump {
    feature: usize,
    threshold: f64,
    left_value: f64,
    right_value: f64,
}

impl Stump {
    fn value(&self, row: &ArrayView1<'_, f64>) -> f64 {
        if row[self.feature] <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Additive stump ensemble trained by gradient boosting on the logistic
/// loss. Newton-style leaf values (gradient sum over hessian sum), fixed
/// round count, no shrinkage schedule beyond the constant learning rate.
#[derive(Debug, Clone)]
pub struct GradientBoost {
    rounds: usize,
    learning_rate: f64,
    base_score: f64,
    stumps: Vec<Stump>,
}

impl GradientBoost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            learning_rate: DEFAULT_LEARNING_RATE,
            base_score: 0.0,
            stumps: Vec::new(),
        }
    }

    fn raw_score(&self, row: &ArrayView1<'_, f64>) -> f64 {
        self.base_score
            + self.learning_rate
                * self
                    .stumps
                    .iter()
                    .map(|stump| stump.value(row))
                    .sum::<f64>()
    }

    /// Probability of the positive class for one row.
    #[must_use]
    pub fn predict_proba(&self, row: &ArrayView1<'_, f64>) -> f64 {
        sigmoid(self.raw_score(row))
    }

    /// Finds the stump maximizing the split gain for the current
    /// gradients, scanning quantile thresholds per feature.
    fn best_stump(x: &Array2<f64>, gradients: &[f64], hessians: &[f64]) -> Option<Stump> {
        let total_grad: f64 = gradients.iter().sum();
        let total_hess: f64 = hessians.iter().sum();
        let mut best: Option<(f64, Stump)> = None;

        for feature in 0..x.ncols() {
            let mut values: Vec<f64> = x.column(feature).to_vec();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();
            if values.len() < 2 {
                continue;
            }

            let step = (values.len() / THRESHOLD_CANDIDATES).max(1);
            for window in values.windows(2).step_by(step) {
                let threshold = f64::midpoint(window[0], window[1]);

                let mut left_grad = 0.0;
                let mut left_hess = 0.0;
                for (i, value) in x.column(feature).iter().enumerate() {
                    if *value <= threshold {
                        left_grad += gradients[i];
                        left_hess += hessians[i];
                    }
                }
                let right_grad = total_grad - left_grad;
                let right_hess = total_hess - left_hess;

                let gain = left_grad * left_grad / (left_hess + HESSIAN_EPSILON)
                    + right_grad * right_grad / (right_hess + HESSIAN_EPSILON);
                let candidate = Stump {
                    feature,
                    threshold,
                    left_value: left_grad / (left_hess + HESSIAN_EPSILON),
                    right_value: right_grad / (right_hess + HESSIAN_EPSILON),
                };
                match &best {
                    Some((best_gain, _)) if *best_gain >= gain => {}
                    _ => best = Some((gain, candidate)),
                }
            }
        }

        best.map(|(_, stump)| stump)
    }
}

impl Default for GradientBoost {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for GradientBoost {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        ensure!(x.nrows() == y.len(), "feature rows must match label count");
        let positives = y.iter().filter(|&&l| l == 1).count();
        let negatives = y.len() - positives;
        ensure!(
            positives > 0 && negatives > 0,
            "training split contains a single class"
        );

        self.base_score = (positives as f64 / negatives as f64).ln();
        self.stumps.clear();

        let mut scores = vec![self.base_score; y.len()];
        for _ in 0..self.rounds {
            let mut gradients = Vec::with_capacity(y.len());
            let mut hessians = Vec::with_capacity(y.len());
            for (&score, &label) in scores.iter().zip(y) {
                let p = sigmoid(score);
                gradients.push(f64::from(label) - p);
                hessians.push(p * (1.0 - p));
            }

            let Some(stump) = Self::best_stump(x, &gradients, &hessians) else {
                break; // all columns constant; nothing left to split on
            };
            for (i, row) in x.rows().into_iter().enumerate() {
                scores[i] += self.learning_rate * stump.value(&row);
            }
            self.stumps.push(stump);
        }
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Vec<u8> {
        x.rows()
            .into_iter()
            .map(|row| u8::from(self.raw_score(&row) > 0.0))
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;
    use crate::ensemble::Classifier;

    fn threshold_dataset(n: usize) -> (Array2<f64>, Vec<u8>) {
        // Label is a noisy function of column 1 crossing 0.5; column 0 is
        // pure noise the booster should learn to ignore.
        let mut rng = StdRng::seed_from_u64(29);
        let mut x = Array2::zeros((n, 2));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let signal: f64 = rng.gen_range(0.0..1.0);
            x[[i, 0]] = rng.gen_range(-1.0..1.0);
            x[[i, 1]] = signal;
            y.push(u8::from(signal > 0.5));
        }
        (x, y)
    }

    #[test]
    fn learns_a_threshold_rule() {
        let (x, y) = threshold_dataset(200);
        let mut model = GradientBoost::new();
        model.fit(&x, &y).expect("fit succeeds");
        let predictions = model.predict(&x);
        let correct = predictions.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(
            correct as f64 / y.len() as f64 > 0.95,
            "only {correct}/{} correct",
            y.len()
        );
    }

    #[test]
    fn single_class_split_is_an_error() {
        let x = Array2::zeros((5, 2));
        let mut model = GradientBoost::new();
        let result = model.fit(&x, &[1, 1, 1, 1, 1]);
        assert!(result.is_err());
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        let (x, y) = threshold_dataset(100);
        let mut model = GradientBoost::new();
        model.fit(&x, &y).expect("fit succeeds");
        for row in x.rows() {
            let p = model.predict_proba(&row);
            assert!((0.0..=1.0).contains(&p));
        }
    }
}
