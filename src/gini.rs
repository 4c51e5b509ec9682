//! Gini impurity scoring and optimal-threshold search over a numeric feature.

/// A weighted gini below this value is treated as a clean split and ends
/// the threshold scan early.
pub(crate) const CLEAN_SPLIT_GINI: f64 = 1e-6;

/// Compute the gini index `1 - Σ(p_i²)` from class counts.
///
/// Returns 0.0 when `n_samples` is zero. The value lies in `[0, 1 - 1/k]`
/// for `k` classes and is 0 exactly when one class holds all the mass.
pub(crate) fn gini(class_counts: &[usize], n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    let sum_sq: f64 = class_counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

/// Narrow the threshold search space for one feature column.
///
/// Keeps the smallest value plus every value at which, after sorting by
/// value, the label changes between consecutive examples. Only these
/// thresholds can change the partition's class composition.
pub(crate) fn class_boundary_thresholds(values: &[f64], labels: &[usize]) -> Vec<f64> {
    if values.len() < 2 {
        return values.to_vec();
    }

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut valid = vec![values[order[0]]];
    let mut last = values[order[0]];
    for pair in order.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if labels[curr] != labels[prev] && values[curr] != last {
            valid.push(values[curr]);
            last = values[curr];
        }
    }
    valid
}

/// Collect the distinct values of a derived feature, sorted ascending.
pub(crate) fn distinct_sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_unstable_by(f64::total_cmp);
    v.dedup();
    v
}

/// Find the threshold with the lowest weighted gini.
///
/// `values` and `labels` are parallel slices for the examples under
/// consideration; `sorted_thresholds` must be ascending. Scans thresholds
/// in increasing order while maintaining running left/right class-count
/// vectors, and exits early as soon as a split scores below
/// [`CLEAN_SPLIT_GINI`].
///
/// Returns `(best_gini, index_of_best_threshold)`. A single-class label
/// set returns `(0.0, 0)` without scanning; when no threshold partitions
/// the examples the returned gini stays at its initial 1.0.
pub(crate) fn optimal_threshold(
    values: &[f64],
    labels: &[usize],
    n_classes: usize,
    sorted_thresholds: &[f64],
) -> (f64, usize) {
    let n_samples = values.len();

    let mut class_dist = vec![0usize; n_classes];
    for &label in labels {
        class_dist[label] += 1;
    }
    if class_dist.iter().filter(|&&c| c > 0).count() <= 1 {
        // pure subset
        return (0.0, 0);
    }

    let mut order: Vec<usize> = (0..n_samples).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    // Distribution of examples below / at-or-above the current threshold.
    let mut left = vec![0usize; n_classes];
    let mut left_count = 0usize;
    let mut right = class_dist;
    let mut right_count = n_samples;

    let mut best_gini = 1.0f64;
    let mut idx_best_thresh = 0usize;

    let mut idx_example = 0usize;
    let mut idx_thresh = 1usize;

    while idx_thresh < sorted_thresholds.len() {
        if idx_example < n_samples && values[order[idx_example]] < sorted_thresholds[idx_thresh] {
            let class = labels[order[idx_example]];
            left[class] += 1;
            right[class] -= 1;
            left_count += 1;
            right_count -= 1;
            idx_example += 1;
        } else {
            let left_prob = left_count as f64 / n_samples as f64;
            let weighted =
                left_prob * gini(&left, left_count) + (1.0 - left_prob) * gini(&right, right_count);

            if weighted < CLEAN_SPLIT_GINI {
                // clean subset
                best_gini = weighted;
                idx_best_thresh = idx_thresh;
                break;
            }
            if weighted < best_gini {
                best_gini = weighted;
                idx_best_thresh = idx_thresh;
            }
            idx_thresh += 1;
        }
    }

    (best_gini, idx_best_thresh)
}
