//! RBFカーネルのマージン分類器。
//! Pegasos方式の確率的劣勾配法で学習し、Platt法で確率を較正する。

use anyhow::{Result, ensure};
use ndarray::{Array1, Array2};
use rand::Rng;

use super::Classifier;

const DEFAULT_LAMBDA: f64 = 0.01;
const DEFAULT_EPOCHS: usize = 20;
const PLATT_ITERATIONS: usize = 300;
const PLATT_LEARNING_RATE: f64 = 0.1;

/// Kernelized margin classifier with probability calibration.
///
/// Training keeps the support rows and a dual coefficient per row; the
/// decision value for a query is the coefficient-weighted kernel sum.
/// Platt scaling maps decision values onto [0, 1] so prediction can
/// threshold a calibrated probability.
#[derive(Debug, Clone)]
pub struct KernelSvm {
    lambda: f64,
    epochs: usize,
    gamma: f64,
    support: Array2<f64>,
    coefficients: Vec<f64>,
    platt_a: f64,
    platt_b: f64,
}

impl KernelSvm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lambda: DEFAULT_LAMBDA,
            epochs: DEFAULT_EPOCHS,
            gamma: 0.0,
            support: Array2::zeros((0, 0)),
            coefficients: Vec::new(),
            platt_a: -1.0,
            platt_b: 0.0,
        }
    }

    fn kernel(&self, a: &Array1<f64>, b: &Array1<f64>) -> f64 {
        let diff = a - b;
        (-self.gamma * diff.dot(&diff)).exp()
    }

    /// Decision value before calibration.
    fn decision(&self, x: &Array1<f64>) -> f64 {
        self.support
            .rows()
            .into_iter()
            .zip(&self.coefficients)
            .filter(|&(_, &c)| c != 0.0)
            .map(|(row, &c)| c * self.kernel(&row.to_owned(), x))
            .sum()
    }

    /// Calibrated probability of the positive ("fake") class.
    #[must_use]
    pub fn predict_proba(&self, x: &Array1<f64>) -> f64 {
        let f = self.decision(x);
        1.0 / (1.0 + (self.platt_a * f + self.platt_b).exp())
    }

    /// Fits the Platt sigmoid on training decision values by gradient
    /// descent on the negative log-likelihood.
    fn calibrate(&mut self, margins: &[f64], y: &[u8]) {
        let n = margins.len() as f64;
        let mut a = -1.0f64;
        let mut b = 0.0f64;
        for _ in 0..PLATT_ITERATIONS {
            let mut grad_a = 0.0;
            let mut grad_b = 0.0;
            for (&f, &label) in margins.iter().zip(y) {
                let p = 1.0 / (1.0 + (a * f + b).exp());
                let err = p - f64::from(label);
                grad_a += -err * f;
                grad_b += -err;
            }
            a -= PLATT_LEARNING_RATE * grad_a / n;
            b -= PLATT_LEARNING_RATE * grad_b / n;
        }
        self.platt_a = a;
        self.platt_b = b;
    }
}

impl Default for KernelSvm {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for KernelSvm {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        ensure!(x.nrows() == y.len(), "feature rows must match label count");
        ensure!(!y.is_empty(), "cannot fit on an empty training set");

        let n = x.nrows();
        let d = x.ncols().max(1);
        self.gamma = 1.0 / d as f64;
        self.support = x.clone();

        let signed: Vec<f64> = y.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect();

        // Precomputed Gram matrix; the training set is small by design.
        let mut gram = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let k = self.kernel(&x.row(i).to_owned(), &x.row(j).to_owned());
                gram[[i, j]] = k;
                gram[[j, i]] = k;
            }
        }

        // Pegasos in the dual: alpha[i] counts margin violations of row i.
        let mut alpha = vec![0.0f64; n];
        let steps = self.epochs * n;
        let mut rng = rand::thread_rng();
        for t in 1..=steps {
            let i = rng.gen_range(0..n);
            let scale = 1.0 / (self.lambda * t as f64);
            let decision: f64 = (0..n)
                .filter(|&j| alpha[j] != 0.0)
                .map(|j| alpha[j] * signed[j] * gram[[j, i]])
                .sum::<f64>()
                * scale;
            if signed[i] * decision < 1.0 {
                alpha[i] += 1.0;
            }
        }

        let scale = 1.0 / (self.lambda * steps as f64);
        self.coefficients = alpha
            .iter()
            .zip(&signed)
            .map(|(&a, &s)| a * s * scale)
            .collect();

        let margins: Vec<f64> = (0..n).map(|i| self.decision(&x.row(i).to_owned())).collect();
        self.calibrate(&margins, y);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Vec<u8> {
        x.rows()
            .into_iter()
            .map(|row| u8::from(self.predict_proba(&row.to_owned()) > 0.5))
            .collect()
    }
}
