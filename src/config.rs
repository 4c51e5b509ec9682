//! Configuration options and the forest configuration builder.

use crate::error::XofnError;

/// Strategy for determining the number of attributes considered per node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// All attributes (no subsampling).
    All,
    /// A fixed count.
    Count(usize),
    /// A fraction of total attributes, truncated.
    Fraction(f64),
    /// `floor(sqrt(n_features))`.
    Sqrt,
    /// `floor(log2(n_features))`.
    Log2,
}

impl MaxFeatures {
    /// Resolve to a concrete attribute count.
    pub(crate) fn resolve(self, n_features: usize) -> Result<usize, XofnError> {
        let resolved = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Count(count) => count,
            MaxFeatures::Fraction(fraction) => (fraction * n_features as f64) as usize,
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
        };
        if resolved == 0 || resolved > n_features {
            return Err(XofnError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// Minimum number of rows each leaf must keep after a split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MinSamplesLeaf {
    /// An absolute row count.
    Count(usize),
    /// A fraction of the training-set size, truncated.
    Fraction(f64),
}

impl MinSamplesLeaf {
    /// Resolve to an absolute row count against the training-set size.
    pub(crate) fn resolve(self, n_samples: usize) -> Result<usize, XofnError> {
        let resolved = match self {
            MinSamplesLeaf::Count(count) => count,
            MinSamplesLeaf::Fraction(fraction) => (fraction * n_samples as f64) as usize,
        };
        if resolved == 0 {
            return Err(XofnError::InvalidMinSamplesLeaf {
                min_samples_leaf: resolved,
            });
        }
        Ok(resolved)
    }
}

/// Number of rows drawn (with replacement) for each tree's bootstrap sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleSize {
    /// The training-set size.
    TrainingSize,
    /// An absolute row count.
    Count(usize),
    /// A fraction of the training-set size, truncated.
    Fraction(f64),
}

impl SampleSize {
    /// Resolve to an absolute row count against the training-set size.
    pub(crate) fn resolve(self, n_samples: usize) -> Result<usize, XofnError> {
        let resolved = match self {
            SampleSize::TrainingSize => n_samples,
            SampleSize::Count(count) => count,
            SampleSize::Fraction(fraction) => (fraction * n_samples as f64) as usize,
        };
        if resolved == 0 {
            return Err(XofnError::InvalidSampleSize {
                sample_size: resolved,
            });
        }
        Ok(resolved)
    }
}

/// Number of workers fitting trees in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NJobs {
    /// One worker per available core.
    All,
    /// A fixed worker count.
    Fixed(usize),
}

impl NJobs {
    /// Resolve to a concrete worker count.
    pub(crate) fn resolve(self) -> Result<usize, XofnError> {
        match self {
            NJobs::All => Ok(num_cpus::get()),
            NJobs::Fixed(0) => Err(XofnError::InvalidWorkerCount { n_jobs: 0 }),
            NJobs::Fixed(n_jobs) => Ok(n_jobs),
        }
    }
}

/// Configuration for Random X-of-N Forest training.
///
/// Construct via [`XOfNForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default          |
/// |--------------------|------------------|
/// | `min_samples_leaf` | `Count(1)`       |
/// | `max_features`     | `Sqrt`           |
/// | `sample_size`      | `TrainingSize`   |
/// | `max_depth`        | `None` (unbounded) |
/// | `n_jobs`           | `Fixed(1)`       |
/// | `random_state`     | `None` (unseeded) |
#[derive(Debug, Clone)]
pub struct XOfNForestConfig {
    pub(crate) n_estimators: usize,
    pub(crate) min_samples_leaf: MinSamplesLeaf,
    pub(crate) max_features: MaxFeatures,
    pub(crate) sample_size: SampleSize,
    pub(crate) max_depth: Option<usize>,
    pub(crate) n_jobs: NJobs,
    pub(crate) random_state: Option<u64>,
}

impl XOfNForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`XofnError::InvalidTreeCount`] if `n_estimators` is zero.
    pub fn new(n_estimators: usize) -> Result<Self, XofnError> {
        if n_estimators == 0 {
            return Err(XofnError::InvalidTreeCount { n_estimators });
        }
        Ok(Self {
            n_estimators,
            min_samples_leaf: MinSamplesLeaf::Count(1),
            max_features: MaxFeatures::Sqrt,
            sample_size: SampleSize::TrainingSize,
            max_depth: None,
            n_jobs: NJobs::Fixed(1),
            random_state: None,
        })
    }

    // --- Setters ---

    /// Set the minimum rows per leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: MinSamplesLeaf) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the per-node attribute subsampling strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the bootstrap sample size per tree.
    #[must_use]
    pub fn with_sample_size(mut self, sample_size: SampleSize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Set the maximum tree depth. `None` means effectively unbounded.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the worker count for parallel training.
    #[must_use]
    pub fn with_n_jobs(mut self, n_jobs: NJobs) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Set the random seed; `None` seeds from entropy.
    #[must_use]
    pub fn with_random_state(mut self, random_state: Option<u64>) -> Self {
        self.random_state = random_state;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Return the minimum-rows-per-leaf setting.
    #[must_use]
    pub fn min_samples_leaf(&self) -> MinSamplesLeaf {
        self.min_samples_leaf
    }

    /// Return the attribute subsampling strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the bootstrap sample size setting.
    #[must_use]
    pub fn sample_size(&self) -> SampleSize {
        self.sample_size
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the worker count setting.
    #[must_use]
    pub fn n_jobs(&self) -> NJobs {
        self.n_jobs
    }

    /// Return the random seed, if set.
    #[must_use]
    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

#[cfg(test)]
mod tests {
    use super::{MaxFeatures, MinSamplesLeaf, NJobs, SampleSize, XOfNForestConfig};
    use crate::error::XofnError;

    #[test]
    fn max_features_all() {
        assert_eq!(MaxFeatures::All.resolve(12).unwrap(), 12);
    }

    #[test]
    fn max_features_sqrt_floors() {
        assert_eq!(MaxFeatures::Sqrt.resolve(10).unwrap(), 3);
        assert_eq!(MaxFeatures::Sqrt.resolve(16).unwrap(), 4);
    }

    #[test]
    fn max_features_log2_floors() {
        assert_eq!(MaxFeatures::Log2.resolve(10).unwrap(), 3);
        assert_eq!(MaxFeatures::Log2.resolve(32).unwrap(), 5);
    }

    #[test]
    fn max_features_fraction_truncates() {
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(9).unwrap(), 4);
    }

    #[test]
    fn max_features_zero_rejected() {
        let err = MaxFeatures::Count(0).resolve(5).unwrap_err();
        assert!(matches!(err, XofnError::InvalidMaxFeatures { .. }));
    }

    #[test]
    fn max_features_too_large_rejected() {
        let err = MaxFeatures::Count(6).resolve(5).unwrap_err();
        assert!(matches!(
            err,
            XofnError::InvalidMaxFeatures {
                max_features: 6,
                n_features: 5
            }
        ));
    }

    #[test]
    fn min_samples_leaf_fraction() {
        assert_eq!(MinSamplesLeaf::Fraction(0.1).resolve(55).unwrap(), 5);
    }

    #[test]
    fn min_samples_leaf_zero_rejected() {
        let err = MinSamplesLeaf::Fraction(0.001).resolve(100).unwrap_err();
        assert!(matches!(err, XofnError::InvalidMinSamplesLeaf { .. }));
    }

    #[test]
    fn sample_size_defaults_to_training_size() {
        assert_eq!(SampleSize::TrainingSize.resolve(123).unwrap(), 123);
    }

    #[test]
    fn sample_size_fraction() {
        assert_eq!(SampleSize::Fraction(0.5).resolve(100).unwrap(), 50);
    }

    #[test]
    fn sample_size_zero_rejected() {
        let err = SampleSize::Count(0).resolve(10).unwrap_err();
        assert!(matches!(err, XofnError::InvalidSampleSize { .. }));
    }

    #[test]
    fn n_jobs_fixed() {
        assert_eq!(NJobs::Fixed(4).resolve().unwrap(), 4);
    }

    #[test]
    fn n_jobs_all_uses_available_cores() {
        assert!(NJobs::All.resolve().unwrap() >= 1);
    }

    #[test]
    fn n_jobs_zero_rejected() {
        let err = NJobs::Fixed(0).resolve().unwrap_err();
        assert!(matches!(err, XofnError::InvalidWorkerCount { n_jobs: 0 }));
    }

    #[test]
    fn zero_estimators_rejected() {
        assert!(matches!(
            XOfNForestConfig::new(0),
            Err(XofnError::InvalidTreeCount { n_estimators: 0 })
        ));
    }
}
