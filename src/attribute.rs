use std::fmt;

use crate::node::FeatureIndex;

/// An X-of-N composite attribute.
///
/// A composite is an ordered sequence of `(attribute, threshold)` pairs;
/// the same attribute may recur with different thresholds. Its value for a
/// row is the count of satisfied `feature < threshold` conditions, so it
/// always lies in `[0, len()]`. `split_val` is the minimum count routing a
/// row to the right branch, and `cost` is the MDL complexity assigned by
/// the cost model. Composites are built fresh by each accepted search step
/// and are immutable once attached to a tree node.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct XOfNAttribute {
    pub(crate) pairs: Vec<(FeatureIndex, f64)>,
    pub(crate) split_val: usize,
    pub(crate) cost: f64,
}

impl XOfNAttribute {
    pub(crate) fn new(pairs: Vec<(FeatureIndex, f64)>, split_val: usize, cost: f64) -> Self {
        Self {
            pairs,
            split_val,
            cost,
        }
    }

    /// Return the `(attribute, threshold)` pairs.
    #[must_use]
    pub fn pairs(&self) -> &[(FeatureIndex, f64)] {
        &self.pairs
    }

    /// Return the number of `(attribute, threshold)` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Return `true` if the composite holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Return the minimum satisfied-condition count that routes a row right.
    #[must_use]
    pub fn split_val(&self) -> usize {
        self.split_val
    }

    /// Return the MDL complexity of the composite.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Compute the composite's value for a single sample.
    #[must_use]
    pub fn value_of(&self, sample: &[f64]) -> usize {
        self.pairs
            .iter()
            .filter(|&&(attr, threshold)| sample[attr.index()] < threshold)
            .count()
    }
}

impl fmt::Display for XOfNAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XoN(")?;
        for (i, (attr, threshold)) in self.pairs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "({attr}, {threshold})")?;
        }
        write!(f, ", split_val={})", self.split_val)
    }
}

/// Apply a candidate pair list to the given rows of a row-major feature
/// matrix. Element `i` is the number of conditions row `rows[i]` satisfies,
/// as a float so the result feeds directly into the threshold search.
pub(crate) fn apply_pairs(
    features: &[Vec<f64>],
    rows: &[usize],
    pairs: &[(FeatureIndex, f64)],
) -> Vec<f64> {
    rows.iter()
        .map(|&r| {
            pairs
                .iter()
                .filter(|&&(attr, threshold)| features[r][attr.index()] < threshold)
                .count() as f64
        })
        .collect()
}
