//! Neighbour and interface analysis of a labeled voxel field.
//!
//! Every voxel is compared with its axis-aligned neighbours in `2·D`
//! directions. Voxels with at least one differently labeled neighbour are
//! interface voxels, all others are bulk. The neighbour fields are computed once
//! on construction and cached.

use crate::config::{EdgeMode, VoxelGraphConfig};
use crate::error::{Result, VoxelError};
use crate::grid::{VoxelField, row_major_strides};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::BuildHasher;
use tracing::{debug, info};

/// Sentinel interface id of bulk voxels.
pub const BULK_SENTINEL: i64 = -1;

/// An axis-aligned neighbour direction.
///
/// On a field of shape `[.., rows, columns]`, `Above`/`Below` step along the
/// row axis and `Left`/`Right` along the column axis. `In`/`Out` step along the
/// depth axis (array axis 0) and only exist for 3D fields.
///
/// A direction with shift `+1` sees, at index `i`, the label at index `i - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Above,
    Below,
    Left,
    Right,
    In,
    Out,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Above,
        Direction::Below,
        Direction::Left,
        Direction::Right,
        Direction::In,
        Direction::Out,
    ];

    /// The `2·D` directions of a field of the given dimensionality.
    pub fn for_dimension(dimension: usize) -> &'static [Direction] {
        if dimension == 3 { &Self::ALL } else { &Self::ALL[..4] }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    /// Array axis this direction steps along in a field of `dimension` axes.
    pub fn axis(self, dimension: usize) -> usize {
        match self {
            Direction::Above | Direction::Below => dimension - 2,
            Direction::Left | Direction::Right => dimension - 1,
            Direction::In | Direction::Out => 0,
        }
    }

    /// Index shift applied to the field: `+1` or `-1`.
    pub fn shift(self) -> isize {
        match self {
            Direction::Above | Direction::Left | Direction::In => 1,
            Direction::Below | Direction::Right | Direction::Out => -1,
        }
    }

    fn requires_3d(self) -> bool {
        matches!(self, Direction::In | Direction::Out)
    }
}

/// A table mapping an ordered pair of region labels to an interface id.
pub trait InterfaceLookup: Sync {
    /// Interface id between regions `a` and `b`, `None` if the table has none.
    fn interface_id(&self, a: usize, b: usize) -> Option<i64>;
}

/// Symmetric lookup: `(a, b)` first, then `(b, a)`.
impl<S: BuildHasher + Sync> InterfaceLookup for HashMap<(usize, usize), i64, S> {
    fn interface_id(&self, a: usize, b: usize) -> Option<i64> {
        self.get(&(a, b)).or_else(|| self.get(&(b, a))).copied()
    }
}

/// Symmetric lookup: `(a, b)` first, then `(b, a)`.
impl InterfaceLookup for BTreeMap<(usize, usize), i64> {
    fn interface_id(&self, a: usize, b: usize) -> Option<i64> {
        self.get(&(a, b)).or_else(|| self.get(&(b, a))).copied()
    }
}

/// A dense square table of interface ids indexed by `[a, b]`.
///
/// Negative entries mark pairs without an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceMatrix {
    regions: usize,
    ids: Vec<i64>,
}

impl InterfaceMatrix {
    /// Wraps a row-major `regions x regions` table.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] if `ids` does not hold
    /// `regions * regions` entries.
    pub fn new(regions: usize, ids: Vec<i64>) -> Result<Self> {
        if ids.len() != regions * regions {
            return Err(VoxelError::InvalidInput(format!(
                "interface matrix for {} regions needs {} entries, got {}",
                regions,
                regions * regions,
                ids.len()
            )));
        }
        Ok(Self { regions, ids })
    }

    /// Numbers the given region pairs `0, 1, 2, ...` in iteration order, filling
    /// both `[a, b]` and `[b, a]`. All other entries are negative.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] if a pair names a region outside
    /// `0..regions`.
    pub fn from_pairs<'p>(regions: usize, pairs: impl IntoIterator<Item = &'p (usize, usize)>) -> Result<Self> {
        let mut ids = vec![-1; regions * regions];
        for (id, &(a, b)) in pairs.into_iter().enumerate() {
            if a >= regions || b >= regions {
                return Err(VoxelError::InvalidInput(format!(
                    "pair ({}, {}) is outside the {} regions of the matrix",
                    a, b, regions
                )));
            }
            ids[a * regions + b] = id as i64;
            ids[b * regions + a] = id as i64;
        }
        Ok(Self { regions, ids })
    }

    pub fn regions(&self) -> usize {
        self.regions
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.ids
    }
}

impl InterfaceLookup for InterfaceMatrix {
    fn interface_id(&self, a: usize, b: usize) -> Option<i64> {
        if a >= self.regions || b >= self.regions {
            return None;
        }
        let id = self.ids[a * self.regions + b];
        (id >= 0).then_some(id)
    }
}

/// The neighbour graph of a labeled voxel field.
///
/// # Edge handling
///
/// With [`EdgeMode::Wrap`] (the default) neighbour shifts are circular
/// whatever the periodicity flag, so a non-periodic field also reports
/// adjacency across opposite domain faces; callers that do not want this
/// should ignore edge voxels or build the graph with [`EdgeMode::Clamp`].
///
/// # Example
///
/// ```rust
/// use vorovox::*;
///
/// let labels = VoxelField::new(vec![2, 4], vec![0, 0, 1, 1, 0, 0, 1, 1]).unwrap();
/// let graph = VoxelGraph::new(&labels, &[1.0, 1.0], true).unwrap();
///
/// assert_eq!(graph.num_regions(), 2);
/// assert!(graph.adjacency_pairs().contains(&(0, 1)));
/// ```
#[derive(Debug, Clone)]
pub struct VoxelGraph<'a> {
    labels: &'a VoxelField<usize>,
    size: Vec<f64>,
    periodic: bool,
    edge_mode: EdgeMode,
    /// Neighbour label field per direction, in [`Direction::for_dimension`] order.
    neighbors: Vec<VoxelField<usize>>,
    /// `label != neighbour` per direction.
    differences: Vec<VoxelField<bool>>,
    bulk: VoxelField<bool>,
    adjacency: BTreeSet<(usize, usize)>,
    num_regions: usize,
}

impl<'a> VoxelGraph<'a> {
    /// Builds the graph with the default edge mode.
    ///
    /// # Errors
    ///
    /// See [`VoxelGraph::with_config`].
    pub fn new(labels: &'a VoxelField<usize>, size: &[f64], periodic: bool) -> Result<Self> {
        Self::with_config(labels, &VoxelGraphConfig::new(size, periodic))
    }

    /// Builds the graph, computing every neighbour field up front.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] if the field is not 2D or 3D or is
    /// empty, and [`VoxelError::DimensionMismatch`] if the size does not have
    /// one entry per field axis.
    pub fn with_config(labels: &'a VoxelField<usize>, config: &VoxelGraphConfig) -> Result<Self> {
        let dimension = labels.dimension();
        if dimension != 2 && dimension != 3 {
            return Err(VoxelError::InvalidInput(format!(
                "label field must be 2D or 3D (got {}D)",
                dimension
            )));
        }
        if labels.is_empty() {
            return Err(VoxelError::InvalidInput("label field is empty".into()));
        }
        if config.size.len() != dimension {
            return Err(VoxelError::DimensionMismatch {
                expected: dimension,
                found: config.size.len(),
            });
        }

        info!(
            voxels = labels.len(),
            dimension,
            periodic = config.periodic,
            edge_mode = ?config.edge_mode,
            "Building voxel graph"
        );

        let wrap = config.wraps();
        let strides = row_major_strides(labels.shape());
        let neighbors: Vec<VoxelField<usize>> = Direction::for_dimension(dimension)
            .iter()
            .map(|&direction| shift_field(labels, &strides, direction, wrap))
            .collect();

        let own = labels.as_slice();
        let differences: Vec<VoxelField<bool>> = neighbors
            .iter()
            .map(|neighbor| {
                let diff: Vec<bool> = own.par_iter().zip(neighbor.as_slice()).map(|(a, b)| a != b).collect();
                VoxelField::from_parts(labels.shape().to_vec(), diff)
            })
            .collect();

        let bulk: Vec<bool> = (0..own.len())
            .into_par_iter()
            .map(|i| differences.iter().all(|diff| !diff.as_slice()[i]))
            .collect();
        let bulk = VoxelField::from_parts(labels.shape().to_vec(), bulk);

        let mut adjacency = BTreeSet::new();
        for (neighbor, diff) in neighbors.iter().zip(&differences) {
            let pairs: BTreeSet<(usize, usize)> = own
                .par_iter()
                .zip(neighbor.as_slice())
                .zip(diff.as_slice())
                .filter(|(_, different)| **different)
                .map(|((&a, &b), _)| (a.min(b), a.max(b)))
                .collect();
            adjacency.extend(pairs);
        }

        let num_regions = own.iter().collect::<BTreeSet<_>>().len();
        debug!(pairs = adjacency.len(), regions = num_regions, "Extracted adjacency");

        Ok(Self {
            labels,
            size: config.size.clone(),
            periodic: config.periodic,
            edge_mode: config.edge_mode,
            neighbors,
            differences,
            bulk,
            adjacency,
            num_regions,
        })
    }

    pub fn labels(&self) -> &VoxelField<usize> {
        self.labels
    }

    pub fn dimension(&self) -> usize {
        self.labels.dimension()
    }

    pub fn shape(&self) -> &[usize] {
        self.labels.shape()
    }

    pub fn size(&self) -> &[f64] {
        &self.size
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    pub fn edge_mode(&self) -> EdgeMode {
        self.edge_mode
    }

    pub fn directions(&self) -> &'static [Direction] {
        Direction::for_dimension(self.dimension())
    }

    fn direction_slot(&self, direction: Direction) -> Result<usize> {
        if direction.requires_3d() && self.dimension() != 3 {
            return Err(VoxelError::UnsupportedDimension {
                operation: direction.name(),
                dimension: self.dimension(),
            });
        }
        // Slot order matches Direction::ALL.
        Ok(direction as usize)
    }

    /// Label of each voxel's neighbour in `direction`.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::UnsupportedDimension`] for `In`/`Out` on a 2D field.
    pub fn neighbor_labels(&self, direction: Direction) -> Result<&VoxelField<usize>> {
        Ok(&self.neighbors[self.direction_slot(direction)?])
    }

    /// Whether each voxel's neighbour in `direction` has a different label.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::UnsupportedDimension`] for `In`/`Out` on a 2D field.
    pub fn difference_mask(&self, direction: Direction) -> Result<&VoxelField<bool>> {
        Ok(&self.differences[self.direction_slot(direction)?])
    }

    /// Whether either neighbour along array `axis` has a different label.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] if `axis` is not an axis of the field.
    pub fn axis_difference(&self, axis: usize) -> Result<VoxelField<bool>> {
        let dimension = self.dimension();
        if axis >= dimension {
            return Err(VoxelError::InvalidInput(format!(
                "axis {} out of range for a {}D field",
                axis, dimension
            )));
        }
        let masks: Vec<&VoxelField<bool>> = self
            .directions()
            .iter()
            .zip(&self.differences)
            .filter(|(direction, _)| direction.axis(dimension) == axis)
            .map(|(_, diff)| diff)
            .collect();
        let data = (0..self.labels.len())
            .into_par_iter()
            .map(|i| masks.iter().any(|m| m.as_slice()[i]))
            .collect();
        Ok(VoxelField::from_parts(self.shape().to_vec(), data))
    }

    /// True where every neighbour shares the voxel's label.
    pub fn bulk_mask(&self) -> &VoxelField<bool> {
        &self.bulk
    }

    /// True on interface voxels: the complement of [`bulk_mask`](Self::bulk_mask).
    pub fn boundary_mask(&self) -> VoxelField<bool> {
        self.bulk.map(|&bulk| !bulk)
    }

    /// Every pair of adjacent regions, as `(smaller, larger)`.
    pub fn adjacency_pairs(&self) -> &BTreeSet<(usize, usize)> {
        &self.adjacency
    }

    /// Number of distinct labels in the field.
    pub fn num_regions(&self) -> usize {
        self.num_regions
    }

    /// The label field with bulk voxels replaced by `-1`.
    pub fn interface_voxels(&self) -> VoxelField<i64> {
        let data = self
            .labels
            .as_slice()
            .par_iter()
            .zip(self.bulk.as_slice())
            .map(|(&label, &bulk)| if bulk { BULK_SENTINEL } else { label as i64 })
            .collect();
        VoxelField::from_parts(self.shape().to_vec(), data)
    }

    /// The largest differing neighbour label of every voxel, `None` on bulk voxels.
    ///
    /// This is the region an interface voxel is paired with by
    /// [`interface_index`](Self::interface_index).
    pub fn interface_partners(&self) -> VoxelField<Option<usize>> {
        let data = (0..self.labels.len()).into_par_iter().map(|i| self.partner(i)).collect();
        VoxelField::from_parts(self.shape().to_vec(), data)
    }

    fn partner(&self, i: usize) -> Option<usize> {
        if self.bulk.as_slice()[i] {
            return None;
        }
        self.neighbors
            .iter()
            .zip(&self.differences)
            .filter(|(_, diff)| diff.as_slice()[i])
            .map(|(neighbor, _)| neighbor.as_slice()[i])
            .max()
    }

    /// Interface id of every voxel, `-1` on bulk voxels.
    ///
    /// An interface voxel is paired with the numerically largest label among
    /// its differing neighbours, so a voxel where three or more regions meet
    /// records only one of its interfaces.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] naming the first (in voxel order)
    /// region pair that occurs in the field but has no id in `table`.
    pub fn interface_index<T: InterfaceLookup + ?Sized>(&self, table: &T) -> Result<VoxelField<i64>> {
        let own = self.labels.as_slice();
        let ids: Vec<std::result::Result<i64, (usize, usize)>> = (0..own.len())
            .into_par_iter()
            .map(|i| match self.partner(i) {
                None => Ok(BULK_SENTINEL),
                Some(largest) => table.interface_id(own[i], largest).ok_or((own[i], largest)),
            })
            .collect();

        let ids = ids.into_iter().collect::<std::result::Result<Vec<i64>, _>>().map_err(|(a, b)| {
            VoxelError::InvalidInput(format!("no interface id for regions ({}, {})", a, b))
        })?;
        Ok(VoxelField::from_parts(self.shape().to_vec(), ids))
    }
}

/// The field as seen by each voxel's neighbour in `direction`.
///
/// Without wrapping, a voxel on the leading edge is its own neighbour.
fn shift_field(labels: &VoxelField<usize>, strides: &[usize], direction: Direction, wrap: bool) -> VoxelField<usize> {
    let axis = direction.axis(labels.dimension());
    let n = labels.shape()[axis];
    let stride = strides[axis];
    let span = (n - 1) * stride;
    let data = labels.as_slice();

    let shifted = (0..data.len())
        .into_par_iter()
        .map(|flat| {
            let i = (flat / stride) % n;
            let source = if direction.shift() > 0 {
                match (i, wrap) {
                    (0, true) => flat + span,
                    (0, false) => flat,
                    _ => flat - stride,
                }
            } else if i == n - 1 {
                if wrap { flat - span } else { flat }
            } else {
                flat + stride
            };
            data[source]
        })
        .collect();
    VoxelField::from_parts(labels.shape().to_vec(), shifted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(shape: &[usize], data: &[usize]) -> VoxelField<usize> {
        VoxelField::new(shape.to_vec(), data.to_vec()).unwrap()
    }

    #[test]
    fn test_direction_axes() {
        assert_eq!(Direction::Above.axis(2), 0);
        assert_eq!(Direction::Left.axis(2), 1);
        assert_eq!(Direction::Above.axis(3), 1);
        assert_eq!(Direction::Right.axis(3), 2);
        assert_eq!(Direction::Out.axis(3), 0);
        assert_eq!(Direction::for_dimension(2).len(), 4);
        assert_eq!(Direction::for_dimension(3).len(), 6);
        for (slot, direction) in Direction::ALL.iter().enumerate() {
            assert_eq!(*direction as usize, slot);
        }
    }

    #[test]
    fn test_shift_matches_roll() {
        let labels = field(&[2, 3], &[0, 1, 2, 3, 4, 5]);
        let strides = row_major_strides(labels.shape());

        // Left rolls columns by +1: each voxel sees the one before it.
        let left = shift_field(&labels, &strides, Direction::Left, true);
        assert_eq!(left.as_slice(), &[2, 0, 1, 5, 3, 4]);
        let right = shift_field(&labels, &strides, Direction::Right, true);
        assert_eq!(right.as_slice(), &[1, 2, 0, 4, 5, 3]);
        let above = shift_field(&labels, &strides, Direction::Above, true);
        assert_eq!(above.as_slice(), &[3, 4, 5, 0, 1, 2]);

        let clamped = shift_field(&labels, &strides, Direction::Left, false);
        assert_eq!(clamped.as_slice(), &[0, 0, 1, 3, 3, 4]);
        let clamped = shift_field(&labels, &strides, Direction::Below, false);
        assert_eq!(clamped.as_slice(), &[3, 4, 5, 3, 4, 5]);
    }

    #[test]
    fn test_halves_wrap() {
        let labels = field(&[4, 4], &[0, 0, 1, 1].repeat(4));
        let graph = VoxelGraph::new(&labels, &[1.0, 1.0], false).unwrap();

        // Every voxel touches the other half: directly or across the wrapped edge.
        assert!(graph.bulk_mask().iter().all(|&b| !b));
        assert_eq!(graph.adjacency_pairs().iter().copied().collect::<Vec<_>>(), vec![(0, 1)]);
        assert_eq!(graph.num_regions(), 2);
        assert!(graph.difference_mask(Direction::Above).unwrap().iter().all(|&d| !d));
    }

    #[test]
    fn test_clamp_suppresses_edge_adjacency() {
        let labels = field(&[1, 6], &[0, 0, 0, 1, 1, 1]);
        let config = VoxelGraphConfig::new(&[1.0, 1.0], false).with_edge_mode(EdgeMode::Clamp);
        let graph = VoxelGraph::with_config(&labels, &config).unwrap();

        let bulk: Vec<bool> = graph.bulk_mask().iter().copied().collect();
        assert_eq!(bulk, vec![true, true, false, false, true, true]);

        let wrapped = VoxelGraph::new(&labels, &[1.0, 1.0], false).unwrap();
        let bulk: Vec<bool> = wrapped.bulk_mask().iter().copied().collect();
        assert_eq!(bulk, vec![false, true, false, false, true, false]);
    }

    #[test]
    fn test_interface_voxels_and_masks() {
        let labels = field(&[1, 6], &[0, 0, 0, 1, 1, 1]);
        let graph = VoxelGraph::new(&labels, &[1.0, 1.0], true).unwrap();

        assert_eq!(graph.interface_voxels().as_slice(), &[0, -1, 0, 1, -1, 1]);
        let boundary: Vec<bool> = graph.boundary_mask().iter().copied().collect();
        assert_eq!(boundary, vec![true, false, true, true, false, true]);
        assert!(graph.axis_difference(0).unwrap().iter().all(|&d| !d));
        assert_eq!(graph.axis_difference(1).unwrap().as_slice(), boundary.as_slice());
        assert!(graph.axis_difference(2).is_err());
    }

    #[test]
    fn test_interface_index_largest_neighbor() {
        // Voxel 1 (label 1) touches 0 on the left and 2 on the right.
        let labels = field(&[1, 3], &[0, 1, 2]);
        let graph = VoxelGraph::new(&labels, &[1.0, 1.0], true).unwrap();

        let mut table: HashMap<(usize, usize), i64> = HashMap::new();
        table.insert((0, 1), 10);
        table.insert((1, 2), 12);
        table.insert((0, 2), 20);
        let index = graph.interface_index(&table).unwrap();
        // 0 sees 1 and 2 (wrapped) -> (0, 2); 1 -> (1, 2); 2 sees 1 and 0 -> (2, 1)
        assert_eq!(index.as_slice(), &[20, 12, 12]);
    }

    #[test]
    fn test_interface_partners() {
        let labels = field(&[1, 3], &[0, 1, 2]);
        let graph = VoxelGraph::new(&labels, &[1.0, 1.0], true).unwrap();
        assert_eq!(graph.interface_partners().as_slice(), &[Some(2), Some(2), Some(1)]);

        let uniform = field(&[2, 2], &[4, 4, 4, 4]);
        let graph = VoxelGraph::new(&uniform, &[1.0, 1.0], true).unwrap();
        assert!(graph.interface_partners().iter().all(|p| p.is_none()));
    }

    #[test]
    fn test_interface_index_missing_entry() {
        let labels = field(&[1, 2], &[3, 5]);
        let graph = VoxelGraph::new(&labels, &[1.0, 1.0], true).unwrap();
        let table: BTreeMap<(usize, usize), i64> = BTreeMap::new();
        let err = graph.interface_index(&table).unwrap_err();
        assert_eq!(err, VoxelError::InvalidInput("no interface id for regions (3, 5)".into()));
    }

    #[test]
    fn test_interface_matrix() {
        let pairs: BTreeSet<(usize, usize)> = [(0, 1), (1, 2)].into_iter().collect();
        let matrix = InterfaceMatrix::from_pairs(3, &pairs).unwrap();
        assert_eq!(matrix.interface_id(0, 1), Some(0));
        assert_eq!(matrix.interface_id(2, 1), Some(1));
        assert_eq!(matrix.interface_id(0, 2), None);
        assert_eq!(matrix.interface_id(5, 0), None);

        assert!(InterfaceMatrix::new(2, vec![0; 3]).is_err());
        assert!(InterfaceMatrix::from_pairs(2, &[(0, 2)]).is_err());
    }

    #[test]
    fn test_errors() {
        let labels = field(&[2, 2], &[0, 1, 1, 0]);
        assert_eq!(
            VoxelGraph::new(&labels, &[1.0, 1.0, 1.0], false).unwrap_err(),
            VoxelError::DimensionMismatch { expected: 2, found: 3 }
        );

        let graph = VoxelGraph::new(&labels, &[1.0, 1.0], false).unwrap();
        assert!(matches!(
            graph.neighbor_labels(Direction::In),
            Err(VoxelError::UnsupportedDimension { operation: "in", dimension: 2 })
        ));
        assert!(graph.difference_mask(Direction::Out).is_err());

        let line = field(&[4], &[0, 1, 2, 3]);
        assert!(matches!(VoxelGraph::new(&line, &[1.0], false), Err(VoxelError::InvalidInput(_))));
    }

    #[test]
    fn test_3d_depth_neighbors() {
        // Two layers along depth.
        let labels = field(&[2, 2, 2], &[0, 0, 0, 0, 1, 1, 1, 1]);
        let graph = VoxelGraph::new(&labels, &[1.0, 1.0, 1.0], true).unwrap();

        assert_eq!(graph.neighbor_labels(Direction::In).unwrap().as_slice(), &[1, 1, 1, 1, 0, 0, 0, 0]);
        assert!(graph.difference_mask(Direction::Left).unwrap().iter().all(|&d| !d));
        assert!(graph.axis_difference(0).unwrap().iter().all(|&d| d));
        assert_eq!(graph.adjacency_pairs().len(), 1);
    }
}
