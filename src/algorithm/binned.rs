use crate::algorithm::{SeedLocator, distance_sq, is_closer};
use crate::grid::row_major_strides;

/// Relative slack on bin lower bounds, so rounding never prunes an exact tie.
const BOUND_SLACK: f64 = 1e-9;

/// A nearest-seed lookup based on a uniform grid of bins.
///
/// Candidates are binned once; a query starts in the bin holding the query
/// point and visits the other bins in order of their minimum possible
/// distance, stopping as soon as no unvisited bin can hold a candidate at
/// least as close as the best one found. Results are identical to
/// [`BruteForce`](crate::algorithm::brute::BruteForce), ties included.
pub struct BinnedSeeds {
    dimension: usize,
    points: Vec<f64>,
    labels: Vec<usize>,
    /// Number of bins along each axis.
    bin_res: Vec<usize>,
    /// Row-major strides of the bin array.
    bin_strides: Vec<usize>,
    /// Minimum corner of the binned region.
    min: Vec<f64>,
    /// Edge length of a bin along each axis.
    cell_size: Vec<f64>,
    /// The bins, each containing a list of candidate indices.
    bins: Vec<Vec<usize>>,
    /// Precomputed search order: bin offset and its minimum squared distance.
    search_order: Vec<(Vec<isize>, f64)>,
}

impl BinnedSeeds {
    /// Creates a binned locator over flat candidate `points`, where candidate
    /// `i` represents seed `labels[i]`.
    ///
    /// The number of bins per axis follows the `count^(1/D)` heuristic, so a
    /// bin holds about one candidate on average.
    pub fn new(dimension: usize, points: &[f64], labels: &[usize]) -> Self {
        let count = labels.len();
        let per_axis = ((count as f64).powf(1.0 / dimension as f64).ceil() as usize).max(1);

        let mut min = vec![f64::INFINITY; dimension];
        let mut max = vec![f64::NEG_INFINITY; dimension];
        for p in points.chunks_exact(dimension) {
            for d in 0..dimension {
                min[d] = min[d].min(p[d]);
                max[d] = max[d].max(p[d]);
            }
        }

        let mut bin_res = Vec::with_capacity(dimension);
        let mut cell_size = Vec::with_capacity(dimension);
        for d in 0..dimension {
            let extent = max[d] - min[d];
            if count == 0 || !(extent > 0.0) {
                // Degenerate axis: a single bin of arbitrary width.
                if count == 0 {
                    min[d] = 0.0;
                }
                bin_res.push(1);
                cell_size.push(1.0);
            } else {
                bin_res.push(per_axis);
                cell_size.push(extent / per_axis as f64);
            }
        }
        let bin_strides = row_major_strides(&bin_res);

        let mut locator = Self {
            dimension,
            points: points.to_vec(),
            labels: labels.to_vec(),
            bins: vec![Vec::new(); bin_res.iter().product()],
            search_order: build_search_order(&bin_res, &cell_size),
            bin_res,
            bin_strides,
            min,
            cell_size,
        };

        for i in 0..count {
            let mut coords = vec![0; dimension];
            locator.bin_coords(&points[i * dimension..(i + 1) * dimension], &mut coords);
            let index = locator.bin_index(&coords);
            locator.bins[index].push(i);
        }
        locator
    }

    /// Bin coordinates of `point`, clamped into the bin array.
    fn bin_coords(&self, point: &[f64], out: &mut [usize]) {
        for d in 0..self.dimension {
            let limit = (self.bin_res[d] - 1) as f64;
            out[d] = ((point[d] - self.min[d]) / self.cell_size[d]).floor().clamp(0.0, limit) as usize;
        }
    }

    fn bin_index(&self, coords: &[usize]) -> usize {
        coords.iter().zip(&self.bin_strides).map(|(c, s)| c * s).sum()
    }

    /// Squared distance from `point` to the box of the bin at `coords`.
    fn bin_dist_sq(&self, point: &[f64], coords: &[usize]) -> f64 {
        let mut d2 = 0.0;
        for d in 0..self.dimension {
            let lo = self.min[d] + coords[d] as f64 * self.cell_size[d];
            let hi = lo + self.cell_size[d];
            let gap = (lo - point[d]).max(point[d] - hi).max(0.0);
            d2 += gap * gap;
        }
        d2
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }
}

impl SeedLocator for BinnedSeeds {
    fn nearest(&self, point: &[f64]) -> usize {
        let dim = self.dimension;
        let mut home = vec![0; dim];
        self.bin_coords(point, &mut home);

        let mut coords = vec![0; dim];
        let mut best_d2 = f64::INFINITY;
        let mut best_label = usize::MAX;

        'offsets: for (offset, min_d2) in &self.search_order {
            // Every remaining bin is at least this far from any point of the home
            // bin; the clamped home bin bounds points outside the binned region too.
            if *min_d2 > best_d2 * (1.0 + BOUND_SLACK) {
                break;
            }

            for d in 0..dim {
                let c = home[d] as isize + offset[d];
                if c < 0 || c >= self.bin_res[d] as isize {
                    continue 'offsets;
                }
                coords[d] = c as usize;
            }

            if self.bin_dist_sq(point, &coords) > best_d2 * (1.0 + BOUND_SLACK) {
                continue;
            }

            for &j in &self.bins[self.bin_index(&coords)] {
                let candidate = &self.points[j * dim..(j + 1) * dim];
                let d2 = distance_sq(point, candidate);
                let label = self.labels[j];
                if is_closer(d2, label, best_d2, best_label) {
                    best_d2 = d2;
                    best_label = label;
                }
            }
        }
        best_label
    }
}

/// All bin offsets reachable from any home bin, sorted by the minimum
/// squared distance between a point in the home bin and the offset bin.
fn build_search_order(bin_res: &[usize], cell_size: &[f64]) -> Vec<(Vec<isize>, f64)> {
    let dimension = bin_res.len();
    let mut order = Vec::new();
    let mut offset: Vec<isize> = bin_res.iter().map(|&n| -(n as isize - 1)).collect();

    loop {
        let min_d2: f64 = (0..dimension)
            .map(|d| {
                let gap = (offset[d].unsigned_abs().saturating_sub(1)) as f64 * cell_size[d];
                gap * gap
            })
            .sum();
        order.push((offset.clone(), min_d2));

        // Odometer increment over [-(n-1), n-1] per axis
        let mut d = dimension;
        loop {
            if d == 0 {
                order.sort_by(|a, b| a.1.total_cmp(&b.1));
                return order;
            }
            d -= 1;
            if offset[d] < bin_res[d] as isize - 1 {
                offset[d] += 1;
                break;
            }
            offset[d] = -(bin_res[d] as isize - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::brute::BruteForce;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    #[test]
    fn test_search_order_starts_at_home() {
        let order = build_search_order(&[3, 3], &[1.0, 1.0]);
        assert_eq!(order.len(), 25);
        assert_eq!(order[0].1, 0.0);
        // The home bin and its 8 neighbours all have a zero lower bound.
        assert_eq!(order.iter().filter(|(_, d2)| *d2 == 0.0).count(), 9);
        assert!(order.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_grid_indexing_2d() {
        let points = [0.5, 0.5, 1.5, 0.5, 0.5, 1.5, 1.5, 1.5];
        let locator = BinnedSeeds::new(2, &points, &[0, 1, 2, 3]);
        assert_eq!(locator.bin_count(), 4);

        let mut coords = [0; 2];
        locator.bin_coords(&[1.4, 0.6], &mut coords);
        assert_eq!(coords, [1, 0]);
        // Points outside the binned region clamp to the border bins.
        locator.bin_coords(&[-3.0, 9.0], &mut coords);
        assert_eq!(coords, [0, 1]);
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        for dimension in [2, 3] {
            let count = 40;
            let points: Vec<f64> = (0..count * dimension).map(|_| rng.r#gen::<f64>()).collect();
            let labels: Vec<usize> = (0..count).collect();
            let brute = BruteForce::new(dimension, &points, &labels);
            let binned = BinnedSeeds::new(dimension, &points, &labels);

            for _ in 0..500 {
                // Queries reach outside the candidate hull as well.
                let query: Vec<f64> = (0..dimension).map(|_| rng.r#gen::<f64>() * 1.4 - 0.2).collect();
                assert_eq!(binned.nearest(&query), brute.nearest(&query));
            }
        }
    }

    #[test]
    fn test_degenerate_axis() {
        // All candidates on one horizontal line.
        let points = [0.1, 0.5, 0.4, 0.5, 0.9, 0.5];
        let locator = BinnedSeeds::new(2, &points, &[0, 1, 2]);
        assert_eq!(locator.nearest(&[0.3, 0.0]), 1);
        assert_eq!(locator.nearest(&[0.8, 1.0]), 2);
    }
}
