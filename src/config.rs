//! Configuration for tessellations and voxel graphs.
//!
//! Configurations are plain data: the same configuration and seeds always
//! produce the same label field.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, VoxelError};
use crate::grid::VoxelGrid;

/// How voxels are assigned to seeds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignmentMethod {
    /// Nearest seed by scanning every (periodic) seed for every voxel.
    #[default]
    BruteForce,
    /// Nearest seed through a binned search grid. Same labels as `BruteForce`.
    Binned,
    /// Membership in exact convex Voronoi cells. Markedly more expensive.
    Exact,
}

/// Configuration of a discrete Voronoi tessellation.
///
/// # Example
///
/// ```rust
/// use vorovox::*;
///
/// let config = TessellationConfigBuilder::new()
///     .resolution(&[64, 64])
///     .size(&[2.0, 1.0])
///     .periodic(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.dimension(), 2);
/// assert_eq!(config.method, AssignmentMethod::BruteForce);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TessellationConfig {
    /// Number of voxels along each axis.
    pub resolution: Vec<usize>,

    /// Physical extent of the domain along each axis.
    pub size: Vec<f64>,

    /// Whether seeds and box are periodic (torus topology).
    pub periodic: bool,

    /// Assignment strategy.
    pub method: AssignmentMethod,
}

impl TessellationConfig {
    pub fn dimension(&self) -> usize {
        self.resolution.len()
    }

    /// The voxel grid described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] for an invalid resolution or size.
    pub fn grid(&self) -> Result<VoxelGrid> {
        VoxelGrid::new(&self.resolution, Some(&self.size))
    }
}

/// Builder for creating a [`TessellationConfig`] with validation.
///
/// Defaults:
/// - size: unit square / unit cube
/// - periodic: false
/// - method: [`AssignmentMethod::BruteForce`]
///
/// The resolution has no default and must be set.
#[derive(Debug, Clone, Default)]
pub struct TessellationConfigBuilder {
    resolution: Option<Vec<usize>>,
    size: Option<Vec<f64>>,
    periodic: bool,
    method: AssignmentMethod,
}

impl TessellationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of voxels along each axis (2 or 3 entries).
    pub fn resolution(mut self, resolution: &[usize]) -> Self {
        self.resolution = Some(resolution.to_vec());
        self
    }

    /// Set the physical extent of the domain along each axis.
    pub fn size(mut self, size: &[f64]) -> Self {
        self.size = Some(size.to_vec());
        self
    }

    pub fn periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn method(mut self, method: AssignmentMethod) -> Self {
        self.method = method;
        self
    }

    /// Shorthand for choosing between the exact and the default method.
    pub fn exact(self, exact: bool) -> Self {
        self.method(if exact { AssignmentMethod::Exact } else { AssignmentMethod::BruteForce })
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] if no resolution was set, or if the
    /// resolution or size fail the grid checks.
    pub fn build(self) -> Result<TessellationConfig> {
        let resolution = self
            .resolution
            .ok_or_else(|| VoxelError::InvalidInput("resolution must be set".into()))?;
        let grid = VoxelGrid::new(&resolution, self.size.as_deref())?;

        Ok(TessellationConfig {
            resolution,
            size: grid.size().to_vec(),
            periodic: self.periodic,
            method: self.method,
        })
    }
}

/// What a neighbour shift sees past the edge of a non-periodic domain.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeMode {
    /// Circular wraparound at every edge, whatever the periodicity.
    #[default]
    Wrap,
    /// On non-periodic domains, voxels past the edge count as the voxel itself,
    /// so domain edges never produce interfaces. Periodic domains still wrap.
    Clamp,
}

/// Configuration of a [`VoxelGraph`](crate::VoxelGraph).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGraphConfig {
    /// Physical extent of the domain along each axis of the label field.
    pub size: Vec<f64>,
    /// Whether the label field is periodic.
    pub periodic: bool,
    /// Edge handling for non-periodic fields.
    pub edge_mode: EdgeMode,
}

impl VoxelGraphConfig {
    pub fn new(size: &[f64], periodic: bool) -> Self {
        Self {
            size: size.to_vec(),
            periodic,
            edge_mode: EdgeMode::default(),
        }
    }

    pub fn with_edge_mode(mut self, edge_mode: EdgeMode) -> Self {
        self.edge_mode = edge_mode;
        self
    }

    /// Whether neighbour shifts wrap around the domain edges.
    pub fn wraps(&self) -> bool {
        self.periodic || self.edge_mode == EdgeMode::Wrap
    }
}
