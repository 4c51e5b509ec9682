use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::attribute::apply_pairs;
use crate::config::{MaxFeatures, MinSamplesLeaf};
use crate::error::XofnError;
use crate::gini::gini;
use crate::node::{FeatureIndex, Node, NodeIndex};
use crate::search::construct_xofn;

/// Configuration for a single X-of-N decision tree.
///
/// Construct via [`XOfNTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default               |
/// |--------------------|-----------------------|
/// | `min_samples_leaf` | `Count(1)`            |
/// | `max_features`     | `All`                 |
/// | `max_depth`        | `None` (unbounded)    |
/// | `seed`             | 42                    |
#[derive(Debug, Clone)]
pub struct XOfNTreeConfig {
    pub(crate) min_samples_leaf: MinSamplesLeaf,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) seed: u64,
}

impl XOfNTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_samples_leaf: MinSamplesLeaf::Count(1),
            max_features: MaxFeatures::All,
            max_depth: None,
            seed: 42,
        }
    }

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

    /// Set the maximum tree depth.
    ///
    /// `None` grows the tree until nodes are pure or a stopping rule
    /// fires; `Some(d)` turns any node at depth `d` into a leaf.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the random seed for attribute subsampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train an X-of-N tree on the provided row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]` — row-major layout.
    /// `labels[sample_idx]` — class indices, already encoded into
    /// `0..n_classes`; `n_classes` fixes the length of every leaf's
    /// probability vector so an ensemble can interpret them uniformly.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                            |
    /// |--------------------------------------|-------------------------------------------------|
    /// | [`XofnError::EmptyDataset`]          | `features` is empty                             |
    /// | [`XofnError::ZeroFeatures`]          | rows have zero feature columns                  |
    /// | [`XofnError::FeatureCountMismatch`]  | rows have inconsistent lengths                  |
    /// | [`XofnError::LabelCountMismatch`]    | `labels.len() != features.len()`                |
    /// | [`XofnError::ClassLabelOutOfRange`]  | a label is `>= n_classes`                       |
    /// | [`XofnError::NonFiniteValue`]        | any value is NaN or infinite                    |
    /// | [`XofnError::InvalidMaxFeatures`]    | `max_features` resolves outside [1, n_features] |
    /// | [`XofnError::InvalidMinSamplesLeaf`] | `min_samples_leaf` resolves to 0                |
    #[instrument(skip(self, features, labels), fields(n_samples = features.len()))]
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<XOfNTree, XofnError> {
        // --- Validate inputs ---
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

        for &label in labels {
            if label >= n_classes {
                return Err(XofnError::ClassLabelOutOfRange { label, n_classes });
            }
        }

        // --- Resolve config against this training set ---
        let max_feats = self.max_features.resolve(n_features)?;
        let min_samples = self.min_samples_leaf.resolve(n_samples)?;

        debug!(
            n_samples,
            n_features,
            n_classes,
            max_feats,
            min_samples,
            "fitting X-of-N tree"
        );

        let rows: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut arena: Vec<Node> = Vec::new();

        let root = build_tree(
            features,
            labels,
            &rows,
            n_classes,
            max_feats,
            min_samples,
            self.max_depth,
            0,
            &mut rng,
            &mut arena,
        );

        debug!(
            root_index = root.index(),
            n_nodes = arena.len(),
            "X-of-N tree built"
        );

        Ok(XOfNTree {
            nodes: arena,
            n_features,
            n_classes,
        })
    }
}

impl Default for XOfNTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively partition `rows`, appending nodes to the arena.
///
/// Returns the [`NodeIndex`] of the node just created.
#[allow(clippy::too_many_arguments)]
fn build_tree(
    features: &[Vec<f64>],
    labels: &[usize],
    rows: &[usize],
    n_classes: usize,
    max_feats: usize,
    min_samples: usize,
    max_depth: Option<usize>,
    depth: usize,
    rng: &mut ChaCha8Rng,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let n_samples = rows.len();
    let n_features = features[0].len();

    let mut class_counts = vec![0usize; n_classes];
    for &r in rows {
        class_counts[labels[r]] += 1;
    }

    let make_leaf = |arena: &mut Vec<Node>| -> NodeIndex {
        let total = n_samples as f64;
        let distribution: Vec<f64> = class_counts.iter().map(|&c| c as f64 / total).collect();
        let prediction = class_counts
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let idx = arena.len();
        arena.push(Node::Leaf {
            prediction,
            distribution,
        });
        NodeIndex::new(idx)
    };

    let depth_exceeded = max_depth.is_some_and(|max_d| depth >= max_d);
    let pure = class_counts.iter().filter(|&&c| c > 0).count() <= 1;
    if depth_exceeded || pure {
        return make_leaf(arena);
    }

    let parent_gini = gini(&class_counts, n_samples);

    // Sample the attribute subset considered at this node.
    let selected: Vec<FeatureIndex> = if max_feats < n_features {
        let mut order: Vec<usize> = (0..n_features).collect();
        // Partial Fisher-Yates: shuffle only the first `max_feats` positions.
        for i in 0..max_feats {
            let j = rng.gen_range(i..n_features);
            order.swap(i, j);
        }
        order[..max_feats].iter().map(|&i| FeatureIndex::new(i)).collect()
    } else {
        (0..n_features).map(FeatureIndex::new).collect()
    };

    let (attribute, achieved_gini) = construct_xofn(features, rows, labels, n_classes, &selected);

    // A longer composite at equal gini still reduces representational
    // complexity, so only a length-1 composite must strictly improve.
    let len = attribute.len();
    if (len == 1 && achieved_gini >= parent_gini) || (len > 1 && achieved_gini > parent_gini) {
        return make_leaf(arena);
    }

    let values = apply_pairs(features, rows, attribute.pairs());
    let mut left_rows = Vec::with_capacity(n_samples / 2);
    let mut right_rows = Vec::with_capacity(n_samples / 2);
    for (&r, &v) in rows.iter().zip(&values) {
        if (v as usize) < attribute.split_val() {
            left_rows.push(r);
        } else {
            right_rows.push(r);
        }
    }

    // A further split would leave a child with too few rows to learn on.
    if left_rows.len() < min_samples || right_rows.len() < min_samples {
        return make_leaf(arena);
    }

    // Arena pattern: reserve the index, recurse, then overwrite.
    let node_idx = arena.len();
    arena.push(Node::Leaf {
        prediction: 0,
        distribution: vec![0.0; n_classes],
    });

    let left = build_tree(
        features, labels, &left_rows, n_classes, max_feats, min_samples, max_depth, depth + 1,
        rng, arena,
    );
    let right = build_tree(
        features, labels, &right_rows, n_classes, max_feats, min_samples, max_depth, depth + 1,
        rng, arena,
    );

    arena[node_idx] = Node::Split {
        attribute,
        left,
        right,
    };

    NodeIndex::new(node_idx)
}

/// A fitted X-of-N decision tree.
///
/// Stored as an arena-based `Vec<Node>` with index references; the root
/// is at index 0 and the tree is immutable once fit completes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct XOfNTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl XOfNTree {
    /// Predict the class index for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`XofnError::PredictionFeatureMismatch`] when
    /// `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, XofnError> {
        self.predict_proba(sample).map(|proba| argmax(&proba))
    }

    /// Return the class probability distribution for a single sample.
    ///
    /// Walks from the root; at each split the composite's value for the
    /// sample is compared against `split_val`. The returned `Vec` has
    /// length `n_classes` and sums to 1.
    ///
    /// # Errors
    ///
    /// Returns [`XofnError::PredictionFeatureMismatch`] when
    /// `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, XofnError> {
        if sample.len() != self.n_features {
            return Err(XofnError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }

        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution, .. } => return Ok(distribution.clone()),
                Node::Split {
                    attribute,
                    left,
                    right,
                } => {
                    idx = if attribute.value_of(sample) < attribute.split_val() {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Return the total number of nodes (splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        // BFS over (node_index, depth).
        let mut max_depth = 0usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((0usize, 0usize));

        while let Some((idx, d)) = queue.pop_front() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }

        max_depth
    }
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}
