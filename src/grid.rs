use crate::error::{Result, VoxelError};
use rayon::prelude::*;

/// A uniform voxel grid over the box `[0, size_d]` along every axis.
///
/// Only the domain size and the resolution are stored; voxel shape, element
/// size and voxel centres are always derived from them.
///
/// Per-voxel fields are laid out with the first coordinate on the last array
/// axis: a 2D field has shape `[ny, nx]` (rows along y, columns along x) and a
/// 3D field `[nz, ny, nx]`. Flat voxel indices therefore run x-fastest.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    size: Vec<f64>,
    resolution: Vec<usize>,
}

impl VoxelGrid {
    /// Creates a grid with the given resolution and domain size.
    ///
    /// A missing size means the unit square (2D) or unit cube (3D).
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] if the resolution is not 2D or 3D,
    /// contains a zero, or if the size has a different dimensionality or a
    /// non-positive entry.
    pub fn new(resolution: &[usize], size: Option<&[f64]>) -> Result<Self> {
        let dimension = resolution.len();
        if dimension != 2 && dimension != 3 {
            return Err(VoxelError::InvalidInput(format!(
                "resolution must have 2 or 3 entries (got {})",
                dimension
            )));
        }
        if let Some(axis) = resolution.iter().position(|&n| n == 0) {
            return Err(VoxelError::InvalidInput(format!(
                "resolution must be positive along every axis (axis {} is 0)",
                axis
            )));
        }

        let size = match size {
            Some(size) => size.to_vec(),
            None => vec![1.0; dimension],
        };
        if size.len() != dimension {
            return Err(VoxelError::InvalidInput(format!(
                "size has {} entries but resolution has {}",
                size.len(),
                dimension
            )));
        }
        if let Some(&bad) = size.iter().find(|&&s| !(s.is_finite() && s > 0.0)) {
            return Err(VoxelError::InvalidInput(format!(
                "size must be positive and finite along every axis (got {})",
                bad
            )));
        }

        Ok(Self {
            size,
            resolution: resolution.to_vec(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.resolution.len()
    }

    pub fn size(&self) -> &[f64] {
        &self.size
    }

    pub fn resolution(&self) -> &[usize] {
        &self.resolution
    }

    /// Shape of every per-voxel field on this grid: the resolution reversed.
    pub fn shape(&self) -> Vec<usize> {
        self.resolution.iter().rev().copied().collect()
    }

    /// Flat-index stride of a unit step along each coordinate axis.
    pub fn axis_strides(&self) -> Vec<usize> {
        let mut strides = Vec::with_capacity(self.dimension());
        let mut stride = 1;
        for &n in &self.resolution {
            strides.push(stride);
            stride *= n;
        }
        strides
    }

    pub fn voxel_count(&self) -> usize {
        self.resolution.iter().product()
    }

    /// Physical extent of a single voxel along each axis.
    pub fn element_size(&self) -> Vec<f64> {
        self.size
            .iter()
            .zip(&self.resolution)
            .map(|(&s, &n)| s / n as f64)
            .collect()
    }

    /// Writes the centre of the voxel with flat index `index` into `out`.
    pub fn voxel_center_into(&self, index: usize, out: &mut [f64]) {
        let mut rest = index;
        for d in 0..self.dimension() {
            let n = self.resolution[d];
            let i = rest % n;
            rest /= n;
            let element = self.size[d] / n as f64;
            out[d] = i as f64 * self.size[d] / n as f64 + element / 2.0;
        }
    }

    pub fn voxel_center(&self, index: usize) -> Vec<f64> {
        let mut center = vec![0.0; self.dimension()];
        self.voxel_center_into(index, &mut center);
        center
    }

    /// Centres of all voxels as a flat `[x, y, (z), x, y, (z), ...]` buffer.
    pub fn coords(&self) -> Vec<f64> {
        let dim = self.dimension();
        let mut coords = vec![0.0; self.voxel_count() * dim];
        coords
            .par_chunks_mut(dim)
            .enumerate()
            .for_each(|(index, center)| self.voxel_center_into(index, center));
        coords
    }
}

/// Strides of a row-major array with the given shape.
pub(crate) fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// A grid-shaped array holding one value per voxel, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelField<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> VoxelField<T> {
    /// Wraps `data` as a field of the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidInput`] if the number of values does not
    /// match the product of the shape.
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(VoxelError::InvalidInput(format!(
                "shape {:?} holds {} voxels but {} values were given",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub(crate) fn from_parts(shape: Vec<usize>, data: Vec<T>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { shape, data }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dimension(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Value at a multi-dimensional index, `None` if out of range.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0;
        for (d, &i) in index.iter().enumerate() {
            if i >= self.shape[d] {
                return None;
            }
            flat = flat * self.shape[d] + i;
        }
        self.data.get(flat)
    }

    /// Applies `f` to every value, keeping the shape.
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> VoxelField<U> {
        VoxelField {
            shape: self.shape.clone(),
            data: self.data.iter().map(f).collect(),
        }
    }
}
