//! Feature table assembly and the seeded train/test split.
//!
//! Row order is node-index order everywhere; the split carries the
//! original indices so predictions can be mapped back onto graph nodes.

use anyhow::{Result, ensure};
use ndarray::{Array1, Array2, Axis};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{graph::StructuralFeatures, synth::BehavioralProfile};

/// Number of columns in the assembled table: four behavioral plus three
/// structural.
pub const FEATURE_COLUMNS: usize = 7;

/// Combined feature matrix, one row per user, label excluded.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    matrix: Array2<f64>,
    labels: Vec<u8>,
}

impl FeatureTable {
    /// Concatenates behavioral columns (posts, requests, age, followers)
    /// with structural columns (degree, clustering, betweenness),
    /// preserving row order.
    ///
    /// # Errors
    /// Both inputs must describe the same node ordering; a length mismatch
    /// is rejected rather than silently misaligning rows.
    pub fn assemble(
        structural: &StructuralFeatures,
        behavioral: &[BehavioralProfile],
    ) -> Result<Self> {
        ensure!(
            structural.len() == behavioral.len(),
            "structural rows ({}) do not match behavioral rows ({})",
            structural.len(),
            behavioral.len()
        );

        let n = behavioral.len();
        let mut matrix = Array2::zeros((n, FEATURE_COLUMNS));
        let mut labels = Vec::with_capacity(n);
        for (i, profile) in behavioral.iter().enumerate() {
            matrix[[i, 0]] = f64::from(profile.number_of_posts);
            matrix[[i, 1]] = f64::from(profile.number_of_requests);
            matrix[[i, 2]] = f64::from(profile.account_age_days);
            matrix[[i, 3]] = f64::from(profile.number_of_followers);
            matrix[[i, 4]] = structural.degree[i] as f64;
            matrix[[i, 5]] = structural.clustering[i];
            matrix[[i, 6]] = structural.betweenness[i];
            labels.push(profile.label);
        }

        Ok(Self { matrix, labels })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    #[must_use]
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Rows for the given user indices, in the given order.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Array2<f64> {
        self.matrix.select(Axis(0), indices)
    }

    /// Labels for the given user indices, in the given order.
    #[must_use]
    pub fn select_labels(&self, indices: &[usize]) -> Vec<u8> {
        indices.iter().map(|&i| self.labels[i]).collect()
    }

    /// One feature row as a vector.
    #[must_use]
    pub fn row(&self, index: usize) -> Array1<f64> {
        self.matrix.row(index).to_owned()
    }
}

/// Index split: `train` and `test` hold original node indices.
#[derive(Debug, Clone)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles 0..n with a seeded RNG and cuts off the trailing
/// `test_fraction` as the test set.
#[must_use]
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> SplitIndices {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((n as f64) * test_fraction).round() as usize;
    let train_len = n - test_len;
    let test = indices.split_off(train_len);
    SplitIndices {
        train: indices,
        test,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::{graph::SocialGraph, synth};

    fn table_for(n: usize) -> FeatureTable {
        let mut rng = StdRng::seed_from_u64(21);
        let graph = SocialGraph::erdos_renyi(n, 0.1, &mut rng);
        let structural = StructuralFeatures::extract(&graph);
        let behavioral = synth::generate_profiles(&structural.degree, synth::FAKE_DEGREE_THRESHOLD);
        FeatureTable::assemble(&structural, &behavioral).expect("aligned inputs")
    }

    #[test]
    fn assembled_rows_match_label_count() {
        let table = table_for(40);
        assert_eq!(table.len(), 40);
        assert_eq!(table.matrix().nrows(), table.labels().len());
        assert_eq!(table.matrix().ncols(), FEATURE_COLUMNS);
    }

    #[test]
    fn rows_stay_aligned_to_node_order() {
        let table = table_for(30);
        for i in 0..table.len() {
            let row = table.row(i);
            // followers column equals the degree column by construction
            assert!((row[3] - row[4]).abs() < 1e-12);
        }
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let graph = SocialGraph::erdos_renyi(10, 0.2, &mut rng);
        let structural = StructuralFeatures::extract(&graph);
        let behavioral = synth::generate_profiles(&[1, 2, 3], synth::FAKE_DEGREE_THRESHOLD);
        assert!(FeatureTable::assemble(&structural, &behavioral).is_err());
    }

    #[test]
    fn split_partitions_all_indices() {
        let split = train_test_split(100, 0.2, 42);
        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(), 20);
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_deterministic_per_seed() {
        let a = train_test_split(50, 0.2, 42);
        let b = train_test_split(50, 0.2, 42);
        assert_eq!(a.test, b.test);
        let c = train_test_split(50, 0.2, 7);
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn selected_rows_follow_requested_order() {
        let table = table_for(20);
        let picked = table.select_rows(&[5, 1, 9]);
        assert_eq!(picked.nrows(), 3);
        assert_eq!(picked.row(0), table.matrix().row(5));
        assert_eq!(picked.row(2), table.matrix().row(9));
        let labels = table.select_labels(&[5, 1, 9]);
        assert_eq!(labels[0], table.labels()[5]);
    }
}
