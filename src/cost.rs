//! MDL-style complexity cost for composite attributes.
//!
//! Implements the attribute-cost formula from Zheng (2000), "Constructing
//! X-of-N attributes for decision tree learning", equations 1 and 2. The
//! combinatorial-count term is Fibonacci's number `F(n)`, not a factorial;
//! substituting one changes which composites the search accepts.

use crate::gini::distinct_sorted;
use crate::node::FeatureIndex;

/// Fibonacci's number `F(n)` via Binet's closed form.
///
/// Accurate only for moderate `n` (roughly <= 70) due to floating-point
/// representation limits, which covers any realistic composite length.
pub(crate) fn fibonacci(n: usize) -> f64 {
    let sqrt5 = 5.0_f64.sqrt();
    let phi = (1.0 + sqrt5) / 2.0;
    (phi.powi(n as i32) - (-phi).powi(-(n as i32))) / sqrt5
}

/// MDL complexity of the composite described by `pairs`.
///
/// For `N` distinct primitive attributes out of `n_available` candidates,
/// where attribute `j` has `Nvj` distinct values among the node's `rows`
/// and `nj` distinct thresholds in the composite:
///
/// `cost = Σ_j [log2(Na) + nj·log2(Nvj) - log2(F(nj))] - log2(F(N))`
///
/// The cost is always computed on the exact pair set after a candidate
/// modification, never on the previous composite.
pub(crate) fn attribute_cost(
    features: &[Vec<f64>],
    rows: &[usize],
    pairs: &[(FeatureIndex, f64)],
    n_available: usize,
) -> f64 {
    let mut unique_attrs: Vec<FeatureIndex> = pairs.iter().map(|&(attr, _)| attr).collect();
    unique_attrs.sort_unstable();
    unique_attrs.dedup();

    let n_all = n_available as f64;
    let mut cost = 0.0;

    for &attr in &unique_attrs {
        let column: Vec<f64> = rows.iter().map(|&r| features[r][attr.index()]).collect();
        let n_values = distinct_sorted(&column).len();

        let used: Vec<f64> = pairs
            .iter()
            .filter(|&&(a, _)| a == attr)
            .map(|&(_, t)| t)
            .collect();
        let n_used = distinct_sorted(&used).len();

        cost += n_all.log2() + (n_used as f64) * (n_values as f64).log2()
            - fibonacci(n_used).log2();
    }

    cost - fibonacci(unique_attrs.len()).log2()
}
