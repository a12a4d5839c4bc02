//! Error types for tessellation and voxel-map analysis.

use thiserror::Error;

/// Errors that can occur while building a tessellation or analyzing a label field.
///
/// All checks run before any computation starts, so an error never comes with
/// a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VoxelError {
    /// Malformed or mismatched input shapes, dimensionalities or resolutions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The domain size does not have the dimensionality of the label field.
    #[error("dimension mismatch: expected {expected} size entries, found {found}")]
    DimensionMismatch {
        /// Dimensionality of the label field.
        expected: usize,
        /// Dimensionality of the supplied size.
        found: usize,
    },

    /// A 3D-only operation was requested on 2D data.
    #[error("`{operation}` is not available for {dimension}D fields")]
    UnsupportedDimension {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Dimensionality of the field it was requested on.
        dimension: usize,
    },
}

/// Result type alias for tessellation and voxel-map operations.
pub type Result<T> = std::result::Result<T, VoxelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VoxelError::InvalidInput("resolution must be positive".into());
        assert_eq!(format!("{err}"), "invalid input: resolution must be positive");

        let err = VoxelError::DimensionMismatch { expected: 3, found: 2 };
        assert!(format!("{err}").contains("expected 3"));

        let err = VoxelError::UnsupportedDimension { operation: "in", dimension: 2 };
        assert_eq!(format!("{err}"), "`in` is not available for 2D fields");
    }
}
