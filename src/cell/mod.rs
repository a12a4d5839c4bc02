use crate::bounds::BoundingBox;

pub mod d2;
pub mod d3;

/// Trait defining the behavior of a convex Voronoi cell.
///
/// A cell starts as the domain box and is cut down by bisector half-spaces.
/// `Cell2D` is a polygon, `Cell3D` a face-based polyhedron.
pub trait Cell<const D: usize>: Send + Sync + Sized + Clone {
    /// Scratch buffer used to avoid allocations during clipping.
    type Scratch: Default + Clone + Send;

    /// Initialize a new cell covering `bounds`.
    fn new(bounds: BoundingBox<D>) -> Self;

    /// Clip the cell by a plane defined by `point` and `normal`, keeping the side
    /// the normal points away from.
    /// Returns `(true, new_max_radius_sq)` if the cell was modified, or `(false, 0.0)` if not.
    fn clip(
        &mut self,
        point: &[f64; D],
        normal: &[f64; D],
        scratch: &mut Self::Scratch,
        generator: Option<&[f64; D]>,
    ) -> (bool, f64);

    /// Calculate the squared distance from the center to the furthest vertex.
    fn max_radius_sq(&self, center: &[f64; D]) -> f64;

    /// Check if the cell is empty (collapsed).
    fn is_empty(&self) -> bool;

    /// Axis-aligned box around the cell vertices, `None` for an empty cell.
    fn bounding_box(&self) -> Option<BoundingBox<D>>;

    /// Whether `point` lies inside the convex hull of the cell, allowing points
    /// up to `tolerance` outside any boundary.
    fn contains(&self, point: &[f64; D], tolerance: f64) -> bool;
}

/// Axis-aligned box around a flat vertex buffer with `D` coordinates per vertex.
pub(crate) fn vertex_bounds<const D: usize>(vertices: &[f64]) -> Option<BoundingBox<D>> {
    let mut chunks = vertices.chunks_exact(D);
    let first = chunks.next()?;
    let mut min = [0.0; D];
    let mut max = [0.0; D];
    min.copy_from_slice(first);
    max.copy_from_slice(first);
    for v in chunks {
        for d in 0..D {
            min[d] = min[d].min(v[d]);
            max[d] = max[d].max(v[d]);
        }
    }
    Some(BoundingBox::new(min, max))
}

/// Arithmetic mean of a flat vertex buffer; strictly inside any non-degenerate convex cell.
pub(crate) fn vertex_mean<const D: usize>(vertices: &[f64]) -> [f64; D] {
    let mut mean = [0.0; D];
    let count = vertices.len() / D;
    if count == 0 {
        return mean;
    }
    for v in vertices.chunks_exact(D) {
        for d in 0..D {
            mean[d] += v[d];
        }
    }
    for m in mean.iter_mut() {
        *m /= count as f64;
    }
    mean
}
