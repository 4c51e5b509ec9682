/// Errors from X-of-N tree and forest operations.
#[derive(Debug, thiserror::Error)]
pub enum XofnError {
    /// Returned when n_estimators is zero.
    #[error("n_estimators must be at least 1, got {n_estimators}")]
    InvalidTreeCount {
        /// The invalid n_estimators value provided.
        n_estimators: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when min_samples_leaf resolves to zero.
    #[error("min_samples_leaf resolved to {min_samples_leaf}, but must be at least 1")]
    InvalidMinSamplesLeaf {
        /// The resolved min_samples_leaf value.
        min_samples_leaf: usize,
    },

    /// Returned when sample_size resolves to zero.
    #[error("sample_size resolved to {sample_size}, but must be at least 1")]
    InvalidSampleSize {
        /// The resolved sample_size value.
        sample_size: usize,
    },

    /// Returned when a fixed worker count of zero is requested.
    #[error("n_jobs must be at least 1, got {n_jobs}")]
    InvalidWorkerCount {
        /// The invalid worker count provided.
        n_jobs: usize,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when the label vector length differs from the sample count.
    #[error("got {n_labels} labels for {n_samples} samples")]
    LabelCountMismatch {
        /// The number of training samples.
        n_samples: usize,
        /// The number of labels provided.
        n_labels: usize,
    },

    /// Returned when an encoded class label is outside the declared class range.
    #[error("class label {label} out of range for {n_classes} classes")]
    ClassLabelOutOfRange {
        /// The offending encoded class label.
        label: usize,
        /// The declared number of classes.
        n_classes: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when predict or predict_proba is called before fit.
    #[error("model is not fitted; call fit() first")]
    NotFitted,

    /// Returned when the worker thread pool cannot be constructed.
    #[error("failed to build worker thread pool")]
    ThreadPool {
        /// The underlying rayon error.
        source: rayon::ThreadPoolBuildError,
    },
}
