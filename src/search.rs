//! Greedy local search that constructs X-of-N composite attributes.
//!
//! The search keeps a frontier of best composites indexed by length and
//! alternates between deleting a pair from the current composite and
//! inserting a new one, accepting a candidate when it strictly lowers the
//! gini index or lowers the MDL cost.

use tracing::trace;

use crate::attribute::{XOfNAttribute, apply_pairs};
use crate::cost::attribute_cost;
use crate::gini::{class_boundary_thresholds, distinct_sorted, optimal_threshold};
use crate::node::FeatureIndex;

/// Consecutive accepted deletions (with no intervening accepted insertion)
/// after which the search stops.
const MAX_CONSECUTIVE_DELETES: usize = 5;

/// Which modification a single search step attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchOp {
    Insert,
    Delete,
}

/// Attempt a single insertion or deletion of an `(attribute, threshold)`
/// pair on `last`.
///
/// `available` lists the attribute indices open for selection and
/// `admissible[i]` the thresholds that may be inserted for `available[i]`.
/// Returns the accepted composite (or `None`) together with the best gini
/// seen; the gini is meaningless when nothing was accepted.
fn search_step(
    features: &[Vec<f64>],
    rows: &[usize],
    node_labels: &[usize],
    n_classes: usize,
    available: &[FeatureIndex],
    admissible: &[Vec<f64>],
    last: &XOfNAttribute,
    op: SearchOp,
) -> (Option<XOfNAttribute>, f64) {
    let last_values = apply_pairs(features, rows, last.pairs());
    let splits = distinct_sorted(&last_values);
    let (prior_gini, _) = optimal_threshold(&last_values, node_labels, n_classes, &splits);

    let mut best_gini = prior_gini;
    let mut best_cost = last.cost;
    let mut split_val = 0usize;

    match op {
        SearchOp::Delete => {
            let mut best_position = 0usize;

            for position in 0..last.len() {
                let mut candidate = last.pairs.clone();
                candidate.remove(position);

                let values = apply_pairs(features, rows, &candidate);
                let thresholds = distinct_sorted(&values);
                let (candidate_gini, idx_thresh) =
                    optimal_threshold(&values, node_labels, n_classes, &thresholds);

                if candidate_gini < best_gini {
                    best_cost = attribute_cost(features, rows, &candidate, available.len());
                    best_gini = candidate_gini;
                    split_val = thresholds[idx_thresh] as usize;
                    best_position = position;
                }
            }

            if best_gini < prior_gini || best_cost < last.cost {
                let mut pairs = last.pairs.clone();
                pairs.remove(best_position);
                let attr = XOfNAttribute::new(pairs, split_val, best_cost);
                trace!(%attr, gini = best_gini, "accepted deletion");
                return (Some(attr), best_gini);
            }
            (None, best_gini)
        }

        SearchOp::Insert => {
            let mut best_pair: Option<(FeatureIndex, f64)> = None;

            for (slot, &attr_idx) in available.iter().enumerate() {
                for &threshold in &admissible[slot] {
                    let mut candidate = last.pairs.clone();
                    candidate.push((attr_idx, threshold));

                    let values = apply_pairs(features, rows, &candidate);
                    let thresholds = distinct_sorted(&values);
                    let (candidate_gini, idx_thresh) =
                        optimal_threshold(&values, node_labels, n_classes, &thresholds);

                    if candidate_gini < best_gini {
                        best_cost = attribute_cost(features, rows, &candidate, available.len());
                        best_gini = candidate_gini;
                        split_val = thresholds[idx_thresh] as usize;
                        best_pair = Some((attr_idx, threshold));
                    }
                }
            }

            if best_gini < prior_gini || best_cost < last.cost {
                if let Some(pair) = best_pair {
                    let mut pairs = last.pairs.clone();
                    pairs.push(pair);
                    let attr = XOfNAttribute::new(pairs, split_val, best_cost);
                    trace!(%attr, gini = best_gini, "accepted insertion");
                    return (Some(attr), best_gini);
                }
            }
            (None, best_gini)
        }
    }
}

/// Construct an X-of-N composite attribute out of `available` greedily.
///
/// Seeds a length-1 composite from the single best `(attribute,
/// threshold)` candidate, then repeatedly tries deletion (once per
/// frontier length) and insertion until neither produces a better
/// composite. The per-attribute admissible threshold found during seeding
/// is the only one considered by later insertions.
///
/// Returns the frontier composite at the final length and the gini it
/// achieves. Callers must ensure `rows` spans at least two classes and
/// `available` is non-empty.
pub(crate) fn construct_xofn(
    features: &[Vec<f64>],
    rows: &[usize],
    labels: &[usize],
    n_classes: usize,
    available: &[FeatureIndex],
) -> (XOfNAttribute, f64) {
    let node_labels: Vec<usize> = rows.iter().map(|&r| labels[r]).collect();

    // --- Seed: best single (attribute, threshold) candidate ---
    let mut best_gini = 1.0 + 0.01;
    let mut best_cost = f64::INFINITY;
    let mut best_attr = available[0];
    let mut best_thresh = f64::NAN;
    // admissible[i] holds the thresholds later insertions may use for
    // available[i]: exactly the best one found here.
    let mut admissible: Vec<Vec<f64>> = Vec::with_capacity(available.len());

    for &attr in available {
        let column: Vec<f64> = rows.iter().map(|&r| features[r][attr.index()]).collect();
        let thresholds = class_boundary_thresholds(&column, &node_labels);
        let (candidate_gini, idx_thresh) =
            optimal_threshold(&column, &node_labels, n_classes, &thresholds);
        let chosen = thresholds[idx_thresh];
        admissible.push(vec![chosen]);

        // Strictly-lowest gini wins; first encountered on ties.
        if candidate_gini < best_gini {
            best_cost = attribute_cost(features, rows, &[(attr, chosen)], available.len());
            best_gini = candidate_gini;
            best_thresh = chosen;
            best_attr = attr;
        }
    }

    let seed = XOfNAttribute::new(vec![(best_attr, best_thresh)], 1, best_cost);

    // frontier[len] is the best composite of that length seen so far;
    // del_applied[len] records whether deletion was already tried there.
    let mut frontier: Vec<Option<XOfNAttribute>> = vec![None, Some(seed)];
    let mut del_applied = vec![true, true];

    let mut current_len = 1usize;
    let mut achieved_gini = best_gini;
    let mut iters_no_add = 0usize;

    while current_len > 0 {
        if iters_no_add == MAX_CONSECUTIVE_DELETES {
            break;
        }

        let do_del = !del_applied[current_len];
        let op = if do_del { SearchOp::Delete } else { SearchOp::Insert };
        let last = frontier[current_len]
            .as_ref()
            .expect("frontier slot at the current length is always filled");

        let (candidate, candidate_gini) = search_step(
            features,
            rows,
            &node_labels,
            n_classes,
            available,
            &admissible,
            last,
            op,
        );

        if do_del {
            del_applied[current_len] = true;

            if let Some(attr) = candidate {
                achieved_gini = candidate_gini;
                current_len -= 1;
                frontier[current_len] = Some(attr);
                if current_len > 1 {
                    del_applied[current_len] = false;
                }
                iters_no_add += 1;
            }
        } else {
            match candidate {
                // Both deletion and insertion exhausted at this length.
                None => break,
                Some(attr) => {
                    iters_no_add = 0;
                    achieved_gini = candidate_gini;
                    current_len += 1;
                    if current_len >= frontier.len() {
                        frontier.push(Some(attr));
                        del_applied.push(false);
                    } else {
                        frontier[current_len] = Some(attr);
                    }
                }
            }
        }
    }

    let best = frontier[current_len]
        .take()
        .expect("search always terminates on a filled frontier slot");
    (best, achieved_gini)
}

#[cfg(test)]
mod tests {
    use super::{SearchOp, construct_xofn, search_step};
    use crate::attribute::{XOfNAttribute, apply_pairs};
    use crate::cost::attribute_cost;
    use crate::gini::CLEAN_SPLIT_GINI;
    use crate::node::FeatureIndex;

    fn feature_indices(n: usize) -> Vec<FeatureIndex> {
        (0..n).map(FeatureIndex::new).collect()
    }

    /// The 2-of-3 concept: label 1 iff at least two of the three binary
    /// features are 0. Row order is chosen so that sorting by any single
    /// feature puts a label change at the 0-to-1 value transition, which
    /// keeps threshold 1.0 among the class-boundary candidates.
    fn two_of_three() -> (Vec<Vec<f64>>, Vec<usize>) {
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
        (features, labels)
    }

    #[test]
    fn constructs_two_of_three_composite() {
        let (features, labels) = two_of_three();
        let rows: Vec<usize> = (0..8).collect();
        let (attr, gini) = construct_xofn(&features, &rows, &labels, 2, &feature_indices(3));

        assert_eq!(attr.len(), 3);
        assert_eq!(attr.split_val(), 2);
        assert!(gini < CLEAN_SPLIT_GINI, "gini = {gini}");

        // The composite classifies the concept perfectly.
        for (row, &label) in features.iter().zip(&labels) {
            let goes_right = attr.value_of(row) >= attr.split_val();
            assert_eq!(goes_right, label == 1);
        }
    }

    #[test]
    fn seed_wins_on_first_strictly_better_candidate() {
        // Two identical informative columns: ties are not broken, so the
        // first attribute in iteration order is kept.
        let features = vec![
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![8.0, 8.0],
            vec![9.0, 9.0],
        ];
        let labels = vec![0, 0, 1, 1];
        let rows = vec![0, 1, 2, 3];
        let (attr, _) = construct_xofn(&features, &rows, &labels, 2, &feature_indices(2));
        assert_eq!(attr.pairs()[0].0.index(), 0);
    }

    #[test]
    fn constant_features_return_seed_unchanged() {
        let features = vec![vec![3.0, 3.0]; 6];
        let labels = vec![0, 1, 0, 1, 0, 1];
        let rows: Vec<usize> = (0..6).collect();
        let (attr, gini) = construct_xofn(&features, &rows, &labels, 2, &feature_indices(2));
        assert_eq!(attr.len(), 1);
        // No threshold partitions anything, so the achieved gini stays at
        // the scan's initial value and the tree builder will reject it.
        assert_eq!(gini, 1.0);
    }

    #[test]
    fn accepted_insert_grows_length_by_one() {
        let (features, labels) = two_of_three();
        let rows: Vec<usize> = (0..8).collect();
        let available = feature_indices(3);
        let admissible = vec![vec![1.0], vec![1.0], vec![1.0]];

        let seed = XOfNAttribute::new(
            vec![(FeatureIndex::new(0), 1.0)],
            1,
            attribute_cost(&features, &rows, &[(FeatureIndex::new(0), 1.0)], 3),
        );
        let (accepted, _) = search_step(
            &features,
            &rows,
            &labels,
            2,
            &available,
            &admissible,
            &seed,
            SearchOp::Insert,
        );
        let accepted = accepted.expect("insertion should be accepted");
        assert_eq!(accepted.len(), seed.len() + 1);
    }

    #[test]
    fn accepted_delete_shrinks_length_by_one() {
        // Feature 0 separates the classes at 4.0; feature 1 is noise that
        // actively scrambles the composite value. Deleting the noise pair
        // strictly improves the gini.
        let features: Vec<Vec<f64>> = (0..8)
            .map(|i| vec![i as f64, (i % 2) as f64])
            .collect();
        let labels = vec![0, 0, 0, 0, 1, 1, 1, 1];
        let rows: Vec<usize> = (0..8).collect();
        let available = feature_indices(2);
        let admissible = vec![vec![4.0], vec![1.0]];

        let pairs = vec![(FeatureIndex::new(0), 4.0), (FeatureIndex::new(1), 1.0)];
        let noisy = XOfNAttribute::new(
            pairs.clone(),
            1,
            attribute_cost(&features, &rows, &pairs, 2),
        );
        let (accepted, gini) = search_step(
            &features,
            &rows,
            &labels,
            2,
            &available,
            &admissible,
            &noisy,
            SearchOp::Delete,
        );
        let accepted = accepted.expect("deletion should be accepted");
        assert_eq!(accepted.len(), noisy.len() - 1);
        assert_eq!(accepted.pairs()[0].0.index(), 0);
        assert!(gini < CLEAN_SPLIT_GINI);
    }

    #[test]
    fn rejects_when_nothing_improves() {
        // Perfectly separated single feature: the seed is already clean,
        // so a further insertion cannot be accepted.
        let features: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let labels = vec![0, 0, 0, 0, 1, 1, 1, 1];
        let rows: Vec<usize> = (0..8).collect();
        let available = feature_indices(1);
        let admissible = vec![vec![4.0]];

        let pairs = vec![(FeatureIndex::new(0), 4.0)];
        let clean = XOfNAttribute::new(
            pairs.clone(),
            1,
            attribute_cost(&features, &rows, &pairs, 1),
        );
        let (accepted, _) = search_step(
            &features,
            &rows,
            &labels,
            2,
            &available,
            &admissible,
            &clean,
            SearchOp::Insert,
        );
        assert!(accepted.is_none());
    }

    #[test]
    fn composite_values_stay_in_bounds() {
        let (features, labels) = two_of_three();
        let rows: Vec<usize> = (0..8).collect();
        let (attr, _) = construct_xofn(&features, &rows, &labels, 2, &feature_indices(3));
        let values = apply_pairs(&features, &rows, attr.pairs());
        for v in values {
            assert!(v >= 0.0 && v <= attr.len() as f64);
        }
    }
}
