/// Axis-aligned box in D-dimensional space.
///
/// Tessellation domains always start at the origin; boxes around clipped
/// cells generally do not.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<const D: usize> {
    pub min: [f64; D],
    pub max: [f64; D],
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// The box `[0, size_d]` along every axis.
    pub fn from_size(size: [f64; D]) -> Self {
        Self { min: [0.0; D], max: size }
    }
}
