//! Nearest-seed lookups used by the approximate assignment paths.

pub mod binned;
pub mod brute;

/// Squared Euclidean distance between `a` and `b`.
///
/// Every locator goes through this function so they all see bit-identical
/// distances and therefore agree on ties.
#[inline]
pub fn distance_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Whether a candidate at `d2` with `label` beats the current best.
///
/// Equal distances resolve to the lowest label, which keeps results
/// independent of the visiting order.
#[inline]
pub(crate) fn is_closer(d2: f64, label: usize, best_d2: f64, best_label: usize) -> bool {
    d2 < best_d2 || (d2 == best_d2 && label < best_label)
}

/// Trait defining a nearest-seed lookup over a fixed candidate set.
///
/// Candidates are seed positions (or periodic images of them), each carrying
/// the label of the seed it represents. This allows swapping between a
/// brute-force scan and a binned search without changing results.
pub trait SeedLocator: Send + Sync {
    /// Label of the candidate nearest to `point`, lowest label on ties.
    fn nearest(&self, point: &[f64]) -> usize;
}
