//! End-to-end scenarios for X-of-N trees and forests.
//!
//! These tests pin down observable behavior on deterministic synthetic
//! datasets: tree shape on perfectly separable data, composite splits on
//! counting concepts, and forest accuracy under parallel training.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use xofn_rf::{
    MaxFeatures, NJobs, RandomXOfNForest, XOfNForestConfig, XOfNTreeConfig, XofnError,
};

// ---------------------------------------------------------------------------
// Helpers: deterministic synthetic datasets
// ---------------------------------------------------------------------------

/// Generate a 150-sample, 8-feature, 3-class classification dataset.
///
/// Features 0-2 are informative (class * 3.0 + noise in [0, 0.5]).
/// Features 3-7 are pure noise in [0, 0.5].
/// Samples are assigned round-robin across classes.
fn make_classification() -> (Vec<Vec<f64>>, Vec<i64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let n_samples = 150;
    let n_features = 8;
    let n_classes = 3;

    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class as i64);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                base + rng.r#gen::<f64>() * 0.5
            })
            .collect();
        features.push(row);
    }
    (features, labels)
}

// ---------------------------------------------------------------------------
// Single tree
// ---------------------------------------------------------------------------

/// Perfectly separable single-feature data yields one split with two leaves.
#[test]
fn tree_perfect_split_shape() {
    let features: Vec<Vec<f64>> = (0..20).map(|i| vec![f64::from(i) * 0.5]).collect();
    let labels: Vec<usize> = features.iter().map(|r| usize::from(r[0] >= 5.0)).collect();

    let tree = XOfNTreeConfig::new().fit(&features, &labels, 2).unwrap();

    assert_eq!(tree.n_nodes(), 3);
    assert_eq!(tree.n_leaves(), 2);
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.predict_proba(&[2.0]).unwrap(), vec![1.0, 0.0]);
    assert_eq!(tree.predict_proba(&[8.0]).unwrap(), vec![0.0, 1.0]);
}

/// An at-least-2-of-3 counting concept fits in a single composite split,
/// where an axis-parallel tree would need several levels.
#[test]
fn tree_captures_counting_concept_in_one_split() {
    let features = vec![
        vec![0.0, 1.0, 1.0],
        vec![1.0, 0.0, 1.0],
        vec![1.0, 1.0, 0.0],
        vec![0.0, 0.0, 0.0],
        vec![0.0, 0.0, 1.0],
        vec![0.0, 1.0, 0.0],
        vec![1.0, 0.0, 0.0],
        vec![1.0, 1.0, 1.0],
    ];
    let labels = vec![0, 0, 0, 1, 1, 1, 1, 0];

    let tree = XOfNTreeConfig::new().fit(&features, &labels, 2).unwrap();

    assert_eq!(tree.n_nodes(), 3);
    for (row, &label) in features.iter().zip(&labels) {
        assert_eq!(tree.predict(row).unwrap(), label);
    }
}

/// Constant feature columns offer no admissible split, so the tree is a
/// single leaf carrying the empirical class distribution.
#[test]
fn tree_constant_features_single_leaf() {
    let features = vec![vec![2.0, 2.0]; 8];
    let labels = vec![0, 1, 0, 1, 0, 1, 0, 1];

    let tree = XOfNTreeConfig::new().fit(&features, &labels, 2).unwrap();

    assert_eq!(tree.n_nodes(), 1);
    assert_eq!(tree.predict_proba(&[2.0, 2.0]).unwrap(), vec![0.5, 0.5]);
}

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

/// Training accuracy on a cleanly separable 3-class dataset must be near
/// perfect with fully grown trees, across 3 parallel workers.
#[test]
fn forest_accuracy_with_three_workers() {
    let (features, labels) = make_classification();
    let config = XOfNForestConfig::new(20)
        .unwrap()
        .with_n_jobs(NJobs::Fixed(3))
        .with_random_state(Some(42));

    let mut forest = RandomXOfNForest::new(config);
    forest.fit(&features, &labels).unwrap();
    assert_eq!(forest.n_trees(), 20);

    let predictions = forest.predict(&features).unwrap();
    let correct = predictions
        .iter()
        .zip(&labels)
        .filter(|(p, l)| p == l)
        .count();
    let accuracy = correct as f64 / labels.len() as f64;
    assert!(accuracy > 0.95, "training accuracy {accuracy} <= 0.95");
}

/// `NJobs::All` sizes the pool from the machine; the fit must still
/// produce the requested tree count.
#[test]
fn forest_trains_with_all_cores() {
    let (features, labels) = make_classification();
    let config = XOfNForestConfig::new(10)
        .unwrap()
        .with_n_jobs(NJobs::All)
        .with_random_state(Some(7));

    let mut forest = RandomXOfNForest::new(config);
    forest.fit(&features, &labels).unwrap();
    assert_eq!(forest.n_trees(), 10);
}

/// Averaged distributions are valid probabilities in `classes()` order.
#[test]
fn forest_probabilities_are_well_formed() {
    let (features, labels) = make_classification();
    let config = XOfNForestConfig::new(10)
        .unwrap()
        .with_max_features(MaxFeatures::Sqrt)
        .with_random_state(Some(11));

    let mut forest = RandomXOfNForest::new(config);
    forest.fit(&features, &labels).unwrap();
    assert_eq!(forest.classes(), Some(&[0, 1, 2][..]));

    for row in forest.predict_proba(&features).unwrap() {
        assert_eq!(row.len(), 3);
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum = {sum}");
        assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}

/// Prediction with the wrong row width is rejected, not silently truncated.
#[test]
fn forest_rejects_wrong_prediction_width() {
    let (features, labels) = make_classification();
    let config = XOfNForestConfig::new(3).unwrap().with_random_state(Some(5));
    let mut forest = RandomXOfNForest::new(config);
    forest.fit(&features, &labels).unwrap();

    let err = forest.predict(&[vec![1.0, 2.0]]).unwrap_err();
    assert!(matches!(
        err,
        XofnError::PredictionFeatureMismatch { expected: 8, got: 2 }
    ));
}
