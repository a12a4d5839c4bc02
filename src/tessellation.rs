use crate::algorithm::SeedLocator;
use crate::algorithm::binned::BinnedSeeds;
use crate::algorithm::brute::BruteForce;
use crate::cell::d2::Cell2D;
use crate::cell::d3::Cell3D;
use crate::config::{AssignmentMethod, TessellationConfig, TessellationConfigBuilder};
use crate::error::{Result, VoxelError};
use crate::exact;
use crate::grid::{VoxelField, VoxelGrid};
use crate::periodic::{PeriodicImages, wrap_into_domain};
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// A discrete Voronoi tessellation: every voxel of a uniform grid labeled with
/// the index of its nearest seed.
///
/// The label field is computed once in [`DiscreteVoronoi::new`]; everything
/// else is derived from it and the grid on demand.
///
/// # Example
///
/// ```rust
/// use vorovox::*;
///
/// let config = TessellationConfigBuilder::new().resolution(&[4, 4]).build().unwrap();
/// let voronoi = DiscreteVoronoi::new(&[[0.25, 0.5], [0.75, 0.5]], &config).unwrap();
///
/// assert_eq!(voronoi.labels().get(&[0, 1]), Some(&0));
/// assert_eq!(voronoi.labels().get(&[3, 2]), Some(&1));
/// assert_eq!(voronoi.num_regions(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct DiscreteVoronoi {
    grid: VoxelGrid,
    periodic: bool,
    method: AssignmentMethod,
    /// Flat seed positions, wrapped into the domain when periodic.
    seeds: Vec<f64>,
    labels: VoxelField<usize>,
}

impl DiscreteVoronoi {
    /// Labels every voxel of the configured grid with its nearest seed.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] if the seed set is empty, if a seed
    /// does not have one coordinate per grid axis, if a coordinate is not
    /// finite, or if the grid itself is invalid.
    pub fn new<S: AsRef<[f64]>>(seeds: &[S], config: &TessellationConfig) -> Result<Self> {
        let grid = config.grid()?;
        let dimension = grid.dimension();

        if seeds.is_empty() {
            return Err(VoxelError::InvalidInput("at least one seed is required".into()));
        }
        let mut flat = Vec::with_capacity(seeds.len() * dimension);
        for (i, seed) in seeds.iter().enumerate() {
            let seed = seed.as_ref();
            if seed.len() != dimension {
                return Err(VoxelError::InvalidInput(format!(
                    "seed {} has {} coordinates but the grid is {}D",
                    i,
                    seed.len(),
                    dimension
                )));
            }
            if seed.iter().any(|c| !c.is_finite()) {
                return Err(VoxelError::InvalidInput(format!("seed {} has a non-finite coordinate", i)));
            }
            flat.extend_from_slice(seed);
        }

        if config.periodic {
            wrap_into_domain(&mut flat, grid.size());
        }

        info!(
            seeds = seeds.len(),
            voxels = grid.voxel_count(),
            dimension,
            periodic = config.periodic,
            method = ?config.method,
            "Building discrete Voronoi tessellation"
        );

        let labels = assign_labels(&grid, &flat, config.periodic, config.method);
        let labels = VoxelField::from_parts(grid.shape(), labels);

        let voronoi = Self {
            grid,
            periodic: config.periodic,
            method: config.method,
            seeds: flat,
            labels,
        };

        let counts = voronoi.voxel_counts();
        let empty: Vec<usize> = counts.iter().enumerate().filter(|(_, c)| **c == 0).map(|(i, _)| i).collect();
        if !empty.is_empty() {
            warn!(seeds = ?empty, "Seeds received no voxels");
        }
        info!(regions = counts.len() - empty.len(), "Finished discrete Voronoi tessellation");

        Ok(voronoi)
    }

    pub fn num_seeds(&self) -> usize {
        self.seeds.len() / self.dimension()
    }

    pub fn dimension(&self) -> usize {
        self.grid.dimension()
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    pub fn method(&self) -> AssignmentMethod {
        self.method
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    /// Flat seed positions. Under periodicity these are wrapped into the domain.
    pub fn seeds(&self) -> &[f64] {
        &self.seeds
    }

    /// Position of seed `index`, `None` if there is no such seed.
    pub fn seed(&self, index: usize) -> Option<&[f64]> {
        self.seeds.chunks_exact(self.dimension()).nth(index)
    }

    /// All periodic images of the seeds, `3^D` per seed, with their base seed.
    pub fn periodic_seeds(&self) -> PeriodicImages {
        PeriodicImages::new(&self.seeds, self.grid.size())
    }

    pub fn element_size(&self) -> Vec<f64> {
        self.grid.element_size()
    }

    /// Voxel centres, flat with `D` coordinates per voxel, in label order.
    pub fn coords(&self) -> Vec<f64> {
        self.grid.coords()
    }

    pub fn labels(&self) -> &VoxelField<usize> {
        &self.labels
    }

    pub fn into_labels(self) -> VoxelField<usize> {
        self.labels
    }

    /// Number of voxels assigned to each seed.
    pub fn voxel_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_seeds()];
        for &label in self.labels.iter() {
            counts[label] += 1;
        }
        counts
    }

    /// Number of distinct labels present, which is less than the seed count
    /// when some seeds receive no voxels.
    pub fn num_regions(&self) -> usize {
        self.voxel_counts().iter().filter(|&&c| c > 0).count()
    }

    /// Centres of the voxels whose label differs from the next voxel along
    /// coordinate `axis`, flat with `D` coordinates per point.
    ///
    /// This point cloud traces the region boundaries; the last layer along the
    /// axis is never compared, so the domain edge does not count.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] if `axis` is not a grid axis.
    pub fn region_boundaries(&self, axis: usize) -> Result<Vec<f64>> {
        let dim = self.dimension();
        if axis >= dim {
            return Err(VoxelError::InvalidInput(format!("axis {} out of range for a {}D grid", axis, dim)));
        }
        let n = self.grid.resolution()[axis];
        let stride = self.grid.axis_strides()[axis];
        let labels = self.labels.as_slice();

        let mut points = Vec::new();
        let mut center = vec![0.0; dim];
        for flat in 0..labels.len() {
            let i = (flat / stride) % n;
            if i + 1 < n && labels[flat] != labels[flat + stride] {
                self.grid.voxel_center_into(flat, &mut center);
                points.extend_from_slice(&center);
            }
        }
        Ok(points)
    }
}

/// Assigns every voxel a base seed label with the chosen method.
fn assign_labels(grid: &VoxelGrid, seeds: &[f64], periodic: bool, method: AssignmentMethod) -> Vec<usize> {
    let dimension = grid.dimension();
    let count = seeds.len() / dimension;

    let (points, mapping) = if periodic {
        let images = PeriodicImages::new(seeds, grid.size());
        debug!(candidates = images.len(), "Expanded periodic images");
        (images.points().to_vec(), images.mapping().to_vec())
    } else {
        (seeds.to_vec(), (0..count).collect())
    };

    match method {
        AssignmentMethod::BruteForce => nearest_labels(grid, &BruteForce::new(dimension, &points, &mapping)),
        AssignmentMethod::Binned => {
            let locator = BinnedSeeds::new(dimension, &points, &mapping);
            debug!(bins = locator.bin_count(), "Binned seed candidates");
            nearest_labels(grid, &locator)
        }
        AssignmentMethod::Exact => {
            let fallback = BruteForce::new(dimension, &points, &mapping);
            if dimension == 2 {
                exact::assign::<2, Cell2D>(grid, &points, &mapping, &fallback)
            } else {
                exact::assign::<3, Cell3D>(grid, &points, &mapping, &fallback)
            }
        }
    }
}

/// Nearest-seed label of every voxel, computed in parallel.
fn nearest_labels(grid: &VoxelGrid, locator: &dyn SeedLocator) -> Vec<usize> {
    let dimension = grid.dimension();
    (0..grid.voxel_count())
        .into_par_iter()
        .map_init(
            || vec![0.0; dimension],
            |center, index| {
                grid.voxel_center_into(index, center);
                locator.nearest(center)
            },
        )
        .collect()
}

/// The plain arrays produced by [`tessellate`].
#[derive(Clone, Debug, PartialEq)]
pub struct Tessellated {
    /// Physical extent of a voxel along each axis.
    pub element_size: Vec<f64>,
    /// Voxel centres, flat with `D` coordinates per voxel.
    pub coords: Vec<f64>,
    /// Seed index of every voxel.
    pub labels: VoxelField<usize>,
}

/// Discretizes the Voronoi diagram of `seeds` on a grid of `resolution` voxels.
///
/// A missing `size` means the unit square or cube. `exact` selects membership
/// in exact Voronoi cells over nearest-seed assignment.
///
/// # Errors
///
/// Returns [`VoxelError::InvalidInput`] for an invalid grid or seed set.
pub fn tessellate<S: AsRef<[f64]>>(
    seeds: &[S],
    resolution: &[usize],
    size: Option<&[f64]>,
    periodic: bool,
    exact: bool,
) -> Result<Tessellated> {
    let mut builder = TessellationConfigBuilder::new().resolution(resolution).periodic(periodic).exact(exact);
    if let Some(size) = size {
        builder = builder.size(size);
    }
    let config = builder.build()?;
    let voronoi = DiscreteVoronoi::new(seeds, &config)?;

    Ok(Tessellated {
        element_size: voronoi.element_size(),
        coords: voronoi.coords(),
        labels: voronoi.into_labels(),
    })
}

/// Draws `count` seeds uniformly from the domain `[0, size_d)`.
///
/// The same `rng_seed` always yields the same seeds.
pub fn random_seeds(count: usize, size: &[f64], rng_seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    (0..count)
        .map(|_| size.iter().map(|&s| rng.r#gen::<f64>() * s).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(resolution: &[usize], periodic: bool, method: AssignmentMethod) -> TessellationConfig {
        TessellationConfigBuilder::new()
            .resolution(resolution)
            .periodic(periodic)
            .method(method)
            .build()
            .unwrap()
    }

    #[test]
    fn test_vertical_halves() {
        let voronoi = DiscreteVoronoi::new(
            &[[0.25, 0.5], [0.75, 0.5]],
            &config(&[4, 4], false, AssignmentMethod::BruteForce),
        )
        .unwrap();
        assert_eq!(voronoi.labels().shape(), &[4, 4]);
        assert_eq!(voronoi.labels().as_slice(), [0, 0, 1, 1].repeat(4).as_slice());
        assert_eq!(voronoi.voxel_counts(), vec![8, 8]);
    }

    #[test]
    fn test_collinear_columns() {
        let voronoi = DiscreteVoronoi::new(
            &[[0.1, 0.5], [0.5, 0.5], [0.9, 0.5]],
            &config(&[3, 1], false, AssignmentMethod::BruteForce),
        )
        .unwrap();
        assert_eq!(voronoi.labels().shape(), &[1, 3]);
        assert_eq!(voronoi.labels().as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_tie_resolves_to_lowest_seed() {
        // Both seeds coincide: every voxel ties.
        let voronoi = DiscreteVoronoi::new(
            &[[0.5, 0.5], [0.5, 0.5]],
            &config(&[3, 3], false, AssignmentMethod::BruteForce),
        )
        .unwrap();
        assert!(voronoi.labels().iter().all(|&l| l == 0));
        assert_eq!(voronoi.num_regions(), 1);
        assert_eq!(voronoi.voxel_counts(), vec![9, 0]);
    }

    #[test]
    fn test_rejects_invalid_seeds() {
        let cfg = config(&[4, 4], false, AssignmentMethod::BruteForce);
        let empty: [[f64; 2]; 0] = [];
        assert!(matches!(DiscreteVoronoi::new(&empty, &cfg), Err(VoxelError::InvalidInput(_))));
        assert!(matches!(
            DiscreteVoronoi::new(&[vec![0.5, 0.5, 0.5]], &cfg),
            Err(VoxelError::InvalidInput(_))
        ));
        assert!(matches!(
            DiscreteVoronoi::new(&[[f64::NAN, 0.5]], &cfg),
            Err(VoxelError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_periodic_wraps_across_faces() {
        // A seed near the left face owns the voxels near the right face.
        let voronoi = DiscreteVoronoi::new(
            &[[0.05, 0.5], [0.5, 0.5]],
            &config(&[10, 1], true, AssignmentMethod::BruteForce),
        )
        .unwrap();
        assert_eq!(voronoi.labels().as_slice(), &[0, 0, 0, 1, 1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_periodic_seeds_are_wrapped() {
        let voronoi = DiscreteVoronoi::new(
            &[[1.25, -0.5]],
            &config(&[2, 2], true, AssignmentMethod::BruteForce),
        )
        .unwrap();
        assert_eq!(voronoi.seed(0), Some(&[0.25, 0.5][..]));
        assert_eq!(voronoi.seed(1), None);
        assert_eq!(voronoi.periodic_seeds().len(), 9);
    }

    #[test]
    fn test_region_boundaries() {
        let voronoi = DiscreteVoronoi::new(
            &[[0.25, 0.5], [0.75, 0.5]],
            &config(&[4, 4], false, AssignmentMethod::BruteForce),
        )
        .unwrap();

        let points = voronoi.region_boundaries(0).unwrap();
        // Column 1 of every row borders column 2.
        assert_eq!(points.len(), 4 * 2);
        assert!(points.chunks(2).all(|p| p[0] == 0.375));

        assert!(voronoi.region_boundaries(1).unwrap().is_empty());
        assert!(voronoi.region_boundaries(2).is_err());
    }

    #[test]
    fn test_methods_agree_on_halves() {
        for method in [AssignmentMethod::Binned, AssignmentMethod::Exact] {
            let voronoi =
                DiscreteVoronoi::new(&[[0.25, 0.5], [0.75, 0.5]], &config(&[4, 4], false, method)).unwrap();
            assert_eq!(voronoi.labels().as_slice(), [0, 0, 1, 1].repeat(4).as_slice(), "{:?}", method);
        }
    }

    #[test]
    fn test_tessellate() {
        let result = tessellate(&[[0.25, 0.5], [0.75, 0.5]], &[4, 2], Some(&[2.0, 1.0]), false, false).unwrap();
        assert_eq!(result.element_size, vec![0.5, 0.5]);
        assert_eq!(result.coords.len(), 16);
        assert_eq!(&result.coords[..4], &[0.25, 0.25, 0.75, 0.25]);
        assert_eq!(result.labels.shape(), &[2, 4]);
        assert_eq!(result.labels.as_slice(), &[0, 1, 1, 1, 0, 1, 1, 1]);

        assert!(tessellate(&[[0.5, 0.5]], &[4], None, false, false).is_err());
    }

    #[test]
    fn test_random_seeds_deterministic() {
        let a = random_seeds(10, &[2.0, 1.0, 0.5], 42);
        let b = random_seeds(10, &[2.0, 1.0, 0.5], 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        for seed in &a {
            assert!(seed[0] >= 0.0 && seed[0] < 2.0);
            assert!(seed[1] >= 0.0 && seed[1] < 1.0);
            assert!(seed[2] >= 0.0 && seed[2] < 0.5);
        }
        assert_ne!(a, random_seeds(10, &[2.0, 1.0, 0.5], 43));
    }
}
