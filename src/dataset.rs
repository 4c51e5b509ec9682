//! Shared read-only training data for parallel forest fitting.

use rand::Rng;

/// The training data shared by every worker during one forest fit.
///
/// Created once at the start of `fit`, handed to each worker by reference,
/// and dropped after all workers join. Workers only read from it; the sole
/// writer is the constructing call. This replaces the ambient shared-state
/// buffer a multiprocess design would need with an explicit handle.
#[derive(Debug)]
pub(crate) struct SharedDataset {
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
    n_features: usize,
}

impl SharedDataset {
    pub(crate) fn new(features: Vec<Vec<f64>>, labels: Vec<usize>) -> Self {
        let n_features = features.first().map_or(0, Vec::len);
        Self {
            features,
            labels,
            n_features,
        }
    }

    pub(crate) fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub(crate) fn n_features(&self) -> usize {
        self.n_features
    }

    /// Draw a bootstrap sample of `sample_size` rows with replacement.
    ///
    /// Returns the materialized feature rows and labels for the drawn
    /// indices; the shared data itself is left untouched.
    pub(crate) fn bootstrap(
        &self,
        sample_size: usize,
        rng: &mut impl Rng,
    ) -> (Vec<Vec<f64>>, Vec<usize>) {
        let n = self.n_samples();
        let mut features = Vec::with_capacity(sample_size);
        let mut labels = Vec::with_capacity(sample_size);
        for _ in 0..sample_size {
            let idx = rng.gen_range(0..n);
            features.push(self.features[idx].clone());
            labels.push(self.labels[idx]);
        }
        (features, labels)
    }
}
