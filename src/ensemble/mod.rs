//! 3モデルのアンサンブル学習と多数決。

pub(crate) mod boosted;
pub(crate) mod mlp;
pub(crate) mod scale;
pub(crate) mod svm;

use anyhow::Result;
use ndarray::Array2;

pub use boosted::GradientBoost;
pub use mlp::Mlp;
pub use scale::StandardScaler;
pub use svm::KernelSvm;

/// Common fit/predict seam for the three ensemble members.
pub trait Classifier {
    /// Fits the model on a training matrix and binary label vector.
    ///
    /// # Errors
    /// Shape mismatches and degenerate training data (for example a
    /// single-class split) surface as errors to the caller.
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()>;

    /// Binary prediction per row.
    fn predict(&self, x: &Array2<f64>) -> Vec<u8>;
}

/// The trained ensemble: scaler plus the three member models. Built fresh
/// per request and discarded with it; nothing is persisted or shared.
pub struct EnsembleModels {
    scaler: StandardScaler,
    svm: KernelSvm,
    boost: GradientBoost,
    mlp: Mlp,
}

/// Per-model test-set votes, in ensemble member order.
pub struct ModelVotes {
    pub svm: Vec<u8>,
    pub boost: Vec<u8>,
    pub mlp: Vec<u8>,
}

impl EnsembleModels {
    /// Standardizes the training matrix and fits all three members on the
    /// identical scaled view.
    ///
    /// # Errors
    /// Any member's fit failure propagates unchanged.
    pub fn train(x_train: &Array2<f64>, y_train: &[u8]) -> Result<Self> {
        let scaler = StandardScaler::fit(x_train);
        let scaled = scaler.transform(x_train);

        let mut svm = KernelSvm::new();
        let mut boost = GradientBoost::new();
        let mut mlp = Mlp::new();
        svm.fit(&scaled, y_train)?;
        boost.fit(&scaled, y_train)?;
        mlp.fit(&scaled, y_train)?;

        Ok(Self {
            scaler,
            svm,
            boost,
            mlp,
        })
    }

    /// Each member's binary predictions for the given rows.
    #[must_use]
    pub fn predict_votes(&self, x: &Array2<f64>) -> ModelVotes {
        let scaled = self.scaler.transform(x);
        ModelVotes {
            svm: self.svm.predict(&scaled),
            boost: self.boost.predict(&scaled),
            mlp: self.mlp.predict(&scaled),
        }
    }
}

/// Majority vote over the three members. Binary labels with three voters
/// cannot tie, so one label always holds at least two votes.
#[must_use]
pub fn majority_vote(votes: &ModelVotes) -> Vec<u8> {
    votes
        .svm
        .iter()
        .zip(&votes.boost)
        .zip(&votes.mlp)
        .map(|((&a, &b), &c)| {
            let positives = u32::from(a) + u32::from(b) + u32::from(c);
            u8::from(positives >= 2)
        })
        .collect()
}

/// Fraction of predictions matching the true labels.
#[must_use]
pub fn accuracy(predictions: &[u8], truth: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predictions.iter().zip(truth).filter(|(p, t)| p == t).count();
    correct as f64 / truth.len() as f64
}
