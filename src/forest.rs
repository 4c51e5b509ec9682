use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::config::XOfNForestConfig;
use crate::dataset::SharedDataset;
use crate::error::XofnError;
use crate::tree::{XOfNTree, XOfNTreeConfig};

/// The immutable training artifacts of a fitted forest.
///
/// Swapped into [`RandomXOfNForest`] atomically at the end of a successful
/// `fit`, so a failed refit never leaves the model half-trained.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct FittedForest {
    pub(crate) trees: Vec<XOfNTree>,
    pub(crate) classes: Vec<i64>,
    pub(crate) n_features: usize,
}

/// A random forest of X-of-N decision trees.
///
/// Each tree trains on an independent bootstrap sample with per-node
/// attribute subsampling; trees are distributed over a dedicated worker
/// pool. Predictions average the per-tree class distributions.
///
/// # Example
///
/// ```
/// use xofn_rf::{RandomXOfNForest, XOfNForestConfig};
///
/// let features = vec![
///     vec![1.0], vec![2.0], vec![3.0],
///     vec![7.0], vec![8.0], vec![9.0],
/// ];
/// let labels = vec![-1, -1, -1, 1, 1, 1];
///
/// let config = XOfNForestConfig::new(15)?.with_random_state(Some(42));
/// let mut forest = RandomXOfNForest::new(config);
/// forest.fit(&features, &labels)?;
///
/// assert_eq!(forest.predict(&[vec![1.5]])?, vec![-1]);
/// # Ok::<(), xofn_rf::XofnError>(())
/// ```
#[derive(Debug)]
pub struct RandomXOfNForest {
    config: XOfNForestConfig,
    fitted: Option<FittedForest>,
}

impl RandomXOfNForest {
    /// Create an unfitted forest from a configuration.
    #[must_use]
    pub fn new(config: XOfNForestConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Return the configuration this forest was created with.
    #[must_use]
    pub fn config(&self) -> &XOfNForestConfig {
        &self.config
    }

    /// Return `true` once a `fit` call has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Return the sorted distinct class labels seen at fit time.
    #[must_use]
    pub fn classes(&self) -> Option<&[i64]> {
        self.fitted.as_ref().map(|f| f.classes.as_slice())
    }

    /// Return the number of fitted trees (zero before `fit`).
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.fitted.as_ref().map_or(0, |f| f.trees.len())
    }

    /// Train the forest on a row-major dataset with arbitrary `i64` labels.
    ///
    /// Labels are encoded against their sorted distinct values; the
    /// encoding is retained so `predict` can answer in the caller's label
    /// space. On error the previously fitted model (if any) is kept.
    ///
    /// # Errors
    ///
    /// Propagates dataset validation errors (see [`XOfNTreeConfig::fit`]),
    /// configuration resolution errors, and [`XofnError::ThreadPool`] when
    /// the worker pool cannot be built.
    #[instrument(skip(self, features, labels), fields(n_samples = features.len()))]
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[i64]) -> Result<(), XofnError> {
        if features.is_empty() {
            return Err(XofnError::EmptyDataset);
        }

        let n_samples = features.len();
        let n_features = features[0].len();

        if n_features == 0 {
            return Err(XofnError::ZeroFeatures);
        }

        if labels.len() != n_samples {
            return Err(XofnError::LabelCountMismatch {
                n_samples,
                n_labels: labels.len(),
            });
        }

        for (sample_index, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(XofnError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            for (feature_index, &val) in row.iter().enumerate() {
                if !val.is_finite() {
                    return Err(XofnError::NonFiniteValue {
                        sample_index,
                        feature_index,
                    });
                }
            }
        }

        let mut classes: Vec<i64> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let n_classes = classes.len();

        // sort + dedup above guarantees every label is found
        let encoded: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();

        let sample_size = self.config.sample_size.resolve(n_samples)?;
        let n_jobs = self.config.n_jobs.resolve()?;

        info!(
            n_samples,
            n_features,
            n_classes,
            n_estimators = self.config.n_estimators,
            n_jobs,
            "fitting random X-of-N forest"
        );

        let dataset = SharedDataset::new(features.to_vec(), encoded);

        let mut master_rng = match self.config.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        // One seed per worker, drawn sequentially so a fixed random_state
        // reproduces the same forest regardless of worker scheduling.
        let assignments: Vec<(usize, u64)> =
            partition_trees(self.config.n_estimators, n_jobs)
                .into_iter()
                .map(|count| (count, master_rng.r#gen()))
                .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_jobs)
            .build()
            .map_err(|source| XofnError::ThreadPool { source })?;

        let per_worker: Vec<Vec<XOfNTree>> = pool.install(|| {
            assignments
                .par_iter()
                .map(|&(count, seed)| {
                    fit_worker(&dataset, &self.config, n_classes, sample_size, count, seed)
                })
                .collect::<Result<_, XofnError>>()
        })?;

        let trees: Vec<XOfNTree> = per_worker.into_iter().flatten().collect();
        debug!(n_trees = trees.len(), "forest fit complete");

        self.fitted = Some(FittedForest {
            trees,
            classes,
            n_features,
        });
        Ok(())
    }

    /// Predict the class label for each row.
    ///
    /// Takes the argmax of the averaged distribution and maps it back to
    /// the original label value.
    ///
    /// # Errors
    ///
    /// Returns [`XofnError::NotFitted`] before a successful `fit`, and
    /// [`XofnError::PredictionFeatureMismatch`] on row-width mismatch.
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<i64>, XofnError> {
        let fitted = self.fitted.as_ref().ok_or(XofnError::NotFitted)?;
        let proba = self.predict_proba(features)?;
        Ok(proba
            .iter()
            .map(|row| fitted.classes[argmax(row)])
            .collect())
    }

    /// Return the averaged class probability distribution for each row.
    ///
    /// Each output row has one entry per class in [`Self::classes`] order
    /// and is the unweighted mean of the per-tree leaf distributions.
    ///
    /// # Errors
    ///
    /// Returns [`XofnError::NotFitted`] before a successful `fit`, and
    /// [`XofnError::PredictionFeatureMismatch`] on row-width mismatch.
    pub fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, XofnError> {
        let fitted = self.fitted.as_ref().ok_or(XofnError::NotFitted)?;
        let n_trees = fitted.trees.len() as f64;
        let n_classes = fitted.classes.len();

        features
            .par_iter()
            .map(|sample| {
                let mut acc = vec![0.0; n_classes];
                for tree in &fitted.trees {
                    let dist = tree.predict_proba(sample)?;
                    for (a, d) in acc.iter_mut().zip(&dist) {
                        *a += d;
                    }
                }
                for a in &mut acc {
                    *a /= n_trees;
                }
                Ok(acc)
            })
            .collect()
    }
}

/// Split `n_estimators` trees over `n_jobs` workers as evenly as possible.
///
/// Worker `i` gets `floor((i+1)E/J) - floor(iE/J)` trees, so counts differ
/// by at most one and always sum to `n_estimators`.
pub(crate) fn partition_trees(n_estimators: usize, n_jobs: usize) -> Vec<usize> {
    (0..n_jobs)
        .map(|i| (i + 1) * n_estimators / n_jobs - i * n_estimators / n_jobs)
        .collect()
}

/// Fit `count` trees sequentially from one worker's seed.
fn fit_worker(
    dataset: &SharedDataset,
    config: &XOfNForestConfig,
    n_classes: usize,
    sample_size: usize,
    count: usize,
    seed: u64,
) -> Result<Vec<XOfNTree>, XofnError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let tree_config = XOfNTreeConfig::new()
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(config.max_features)
        .with_max_depth(config.max_depth);

    let mut trees = Vec::with_capacity(count);
    for _ in 0..count {
        let (boot_features, boot_labels) = dataset.bootstrap(sample_size, &mut rng);
        let tree = tree_config
            .clone()
            .with_seed(rng.r#gen())
            .fit(&boot_features, &boot_labels, n_classes)?;
        trees.push(tree);
    }
    Ok(trees)
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}
