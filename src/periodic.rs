//! Periodic image expansion of a seed set.

/// Translation factors of the 2D image table, in replica order.
const IMAGE_FACTORS_2D: [[f64; 2]; 9] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
    [-1.0, -1.0],
    [1.0, -1.0],
];

/// Third-axis factors; the 2D table is repeated once for each.
const IMAGE_FACTORS_DEPTH: [f64; 3] = [-1.0, 0.0, 1.0];

/// A seed set replicated into its `3^D` neighbouring periodic images.
///
/// Replica `r` is image `r / N` of seed `r % N`, so the mapping back to base
/// seeds is simply the seed index tiled `3^D` times.
#[derive(Clone, Debug)]
pub struct PeriodicImages {
    dimension: usize,
    points: Vec<f64>,
    mapping: Vec<usize>,
}

impl PeriodicImages {
    /// Translation offsets (in units of domain size) in replica order.
    pub fn offsets(dimension: usize) -> Vec<Vec<f64>> {
        if dimension == 2 {
            IMAGE_FACTORS_2D.iter().map(|f| f.to_vec()).collect()
        } else {
            IMAGE_FACTORS_DEPTH
                .iter()
                .flat_map(|&depth| IMAGE_FACTORS_2D.iter().map(move |f| vec![f[0], f[1], depth]))
                .collect()
        }
    }

    /// Expands flat `seeds` into all periodic images of a domain of `size`.
    pub fn new(seeds: &[f64], size: &[f64]) -> Self {
        let dimension = size.len();
        let count = seeds.len() / dimension;
        let offsets = Self::offsets(dimension);

        let mut points = Vec::with_capacity(seeds.len() * offsets.len());
        let mut mapping = Vec::with_capacity(count * offsets.len());
        for offset in &offsets {
            for (seed, position) in seeds.chunks_exact(dimension).enumerate() {
                for d in 0..dimension {
                    points.push(offset[d] * size[d] + position[d]);
                }
                mapping.push(seed);
            }
        }

        Self { dimension, points, mapping }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Flat positions of every replica.
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Base seed index of every replica.
    pub fn mapping(&self) -> &[usize] {
        &self.mapping
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// Wraps flat seed coordinates into `[0, size_d)` along every axis.
pub(crate) fn wrap_into_domain(seeds: &mut [f64], size: &[f64]) {
    let dimension = size.len();
    for position in seeds.chunks_exact_mut(dimension) {
        for d in 0..dimension {
            position[d] = position[d].rem_euclid(size[d]);
        }
    }
}
