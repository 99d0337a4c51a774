//! Feed-forward network: dense 64 → 32 → 1, ReLU hidden layers, sigmoid
//! output, Adam against binary cross-entropy. Ten passes over the data in
//! minibatches of 32, no validation split, no early stopping.

use anyhow::{Result, ensure};
use ndarray::{Array1, Array2, Axis, Dimension};
use rand::{Rng, seq::SliceRandom, thread_rng};

use super::Classifier;

const HIDDEN_1: usize = 64;
const HIDDEN_2: usize = 32;
const EPOCHS: usize = 10;
const BATCH_SIZE: usize = 32;
const LEARNING_RATE: f64 = 1e-3;
const BETA_1: f64 = 0.9;
const BETA_2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;

/// First/second moment accumulators for one parameter tensor.
#[derive(Debug, Clone)]
struct AdamState<D: Dimension> {
    m: ndarray::Array<f64, D>,
    v: ndarray::Array<f64, D>,
}

impl<D: Dimension> AdamState<D> {
    fn zeros_like(param: &ndarray::Array<f64, D>) -> Self {
        Self {
            m: ndarray::Array::zeros(param.raw_dim()),
            v: ndarray::Array::zeros(param.raw_dim()),
        }
    }

    fn update(
        &mut self,
        param: &mut ndarray::Array<f64, D>,
        grad: &ndarray::Array<f64, D>,
        step: usize,
    ) {
        self.m = &self.m * BETA_1 + grad * (1.0 - BETA_1);
        self.v = &self.v * BETA_2 + &grad.mapv(|g| g * g) * (1.0 - BETA_2);
        let m_hat = &self.m / (1.0 - BETA_1.powi(step as i32));
        let v_hat = &self.v / (1.0 - BETA_2.powi(step as i32));
        *param -= &(m_hat / (v_hat.mapv(f64::sqrt) + ADAM_EPSILON) * LEARNING_RATE);
    }
}

/// One dense layer with its optimizer state.
#[derive(Debug, Clone)]
struct Dense {
    weights: Array2<f64>,
    bias: Array1<f64>,
    weights_adam: AdamState<ndarray::Ix2>,
    bias_adam: AdamState<ndarray::Ix1>,
}

impl Dense {
    fn glorot<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = Array2::from_shape_fn((inputs, outputs), |_| rng.gen_range(-limit..limit));
        let bias = Array1::zeros(outputs);
        let weights_adam = AdamState::zeros_like(&weights);
        let bias_adam = AdamState::zeros_like(&bias);
        Self {
            weights,
            bias,
            weights_adam,
            bias_adam,
        }
    }

    fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        input.dot(&self.weights) + &self.bias
    }

    /// Applies gradients and returns the gradient w.r.t. the layer input.
    fn backward(
        &mut self,
        input: &Array2<f64>,
        grad_output: &Array2<f64>,
        step: usize,
    ) -> Array2<f64> {
        let grad_weights = input.t().dot(grad_output);
        let grad_bias = grad_output.sum_axis(Axis(0));
        let grad_input = grad_output.dot(&self.weights.t());
        self.weights_adam
            .update(&mut self.weights, &grad_weights, step);
        self.bias_adam.update(&mut self.bias, &grad_bias, step);
        grad_input
    }
}

#[derive(Debug, Clone)]
pub struct Mlp {
    layer_1: Option<Dense>,
    layer_2: Option<Dense>,
    output: Option<Dense>,
}

impl Mlp {
    #[must_use]
    pub fn new() -> Self {
        Self {
            layer_1: None,
            layer_2: None,
            output: None,
        }
    }

    /// Sigmoid activations for each row, in [0, 1].
    #[must_use]
    pub fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        let (Some(layer_1), Some(layer_2), Some(output)) =
            (&self.layer_1, &self.layer_2, &self.output)
        else {
            return vec![0.0; x.nrows()];
        };
        let a1 = relu(&layer_1.forward(x));
        let a2 = relu(&layer_2.forward(&a1));
        let z3 = output.forward(&a2);
        z3.column(0).iter().map(|&z| sigmoid(z)).collect()
    }
}

impl Default for Mlp {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for Mlp {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        ensure!(x.nrows() == y.len(), "feature rows must match label count");
        ensure!(!y.is_empty(), "cannot fit on an empty training set");

        let mut rng = thread_rng();
        let inputs = x.ncols();
        let mut layer_1 = Dense::glorot(inputs, HIDDEN_1, &mut rng);
        let mut layer_2 = Dense::glorot(HIDDEN_1, HIDDEN_2, &mut rng);
        let mut output = Dense::glorot(HIDDEN_2, 1, &mut rng);

        let n = x.nrows();
        let mut order: Vec<usize> = (0..n).collect();
        let mut step = 0usize;

        for _ in 0..EPOCHS {
            order.shuffle(&mut rng);
            for batch_indices in order.chunks(BATCH_SIZE) {
                step += 1;
                let batch = x.select(Axis(0), batch_indices);
                let targets: Vec<f64> = batch_indices.iter().map(|&i| f64::from(y[i])).collect();
                let batch_len = batch_indices.len() as f64;

                // forward
                let z1 = layer_1.forward(&batch);
                let a1 = relu(&z1);
                let z2 = layer_2.forward(&a1);
                let a2 = relu(&z2);
                let z3 = output.forward(&a2);
                let probs: Array1<f64> = z3.column(0).mapv(sigmoid);

                // backward: d(BCE)/dz3 = (p - y) / batch
                let grad_z3 = Array2::from_shape_fn((batch_indices.len(), 1), |(i, _)| {
                    (probs[i] - targets[i]) / batch_len
                });
                let grad_a2 = output.backward(&a2, &grad_z3, step);
                let grad_z2 = &grad_a2 * &relu_gradient(&z2);
                let grad_a1 = layer_2.backward(&a1, &grad_z2, step);
                let grad_z1 = &grad_a1 * &relu_gradient(&z1);
                let _ = layer_1.backward(&batch, &grad_z1, step);
            }
        }

        self.layer_1 = Some(layer_1);
        self.layer_2 = Some(layer_2);
        self.output = Some(output);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Vec<u8> {
        self.predict_proba(x)
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect()
    }
}

fn relu(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| v.max(0.0))
}

fn relu_gradient(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
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

    fn linearly_separable(n: usize) -> (Array2<f64>, Vec<u8>) {
        let mut rng = StdRng::seed_from_u64(37);
        let mut x = Array2::zeros((n, 3));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let label = u8::from(i % 2 == 0);
            let shift = if label == 1 { 1.5 } else { -1.5 };
            for j in 0..3 {
                x[[i, j]] = shift + rng.gen_range(-0.6..0.6);
            }
            y.push(label);
        }
        (x, y)
    }

    #[test]
    fn learns_a_separable_problem() {
        let (x, y) = linearly_separable(256);
        let mut mlp = Mlp::new();
        mlp.fit(&x, &y).expect("fit succeeds");
        let predictions = mlp.predict(&x);
        let correct = predictions.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(
            correct as f64 / y.len() as f64 > 0.9,
            "only {correct}/{} correct",
            y.len()
        );
    }

    #[test]
    fn probabilities_are_sigmoid_bounded() {
        let (x, y) = linearly_separable(64);
        let mut mlp = Mlp::new();
        mlp.fit(&x, &y).expect("fit succeeds");
        for p in mlp.predict_proba(&x) {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn untrained_network_predicts_nothing_positive() {
        let mlp = Mlp::new();
        let x = Array2::zeros((3, 2));
        assert_eq!(mlp.predict(&x), vec![0, 0, 0]);
    }
}
