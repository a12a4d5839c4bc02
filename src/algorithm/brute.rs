use crate::algorithm::{SeedLocator, distance_sq, is_closer};

/// Scans every candidate for every query.
///
/// This is the reference assignment: O(candidates) per voxel, no setup cost.
pub struct BruteForce {
    dimension: usize,
    points: Vec<f64>,
    labels: Vec<usize>,
}

impl BruteForce {
    /// Creates a locator over flat candidate `points`, where candidate `i`
    /// represents seed `labels[i]`.
    pub fn new(dimension: usize, points: &[f64], labels: &[usize]) -> Self {
        debug_assert_eq!(points.len(), labels.len() * dimension);
        Self {
            dimension,
            points: points.to_vec(),
            labels: labels.to_vec(),
        }
    }
}

impl SeedLocator for BruteForce {
    fn nearest(&self, point: &[f64]) -> usize {
        let mut best_d2 = f64::INFINITY;
        let mut best_label = usize::MAX;
        for (candidate, &label) in self.points.chunks_exact(self.dimension).zip(&self.labels) {
            let d2 = distance_sq(point, candidate);
            if is_closer(d2, label, best_d2, best_label) {
                best_d2 = d2;
                best_label = label;
            }
        }
        best_label
    }
}
