//! Error types for geometry operations.

use thiserror::Error;

/// Errors raised by coordinate conversions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// A matrix that must be inverted has a (near) zero determinant
    #[error("Matrix is not invertible (determinant {determinant:e})")]
    SingularMatrix {
        /// Determinant of the rejected matrix
        determinant: f64,
    },

    /// Plane normal or slice axes are degenerate
    #[error("Degenerate geometry: {message}")]
    Degenerate {
        /// What was degenerate
        message: String,
    },

    /// The transform chain contains a non-linear transform
    #[error("Non-linear transform in chain: {description}")]
    NonLinearTransform {
        /// Description of the offending transform
        description: String,
    },

    /// Pane index outside the lightbox grid
    #[error("Pane {index} out of range for a {rows}x{columns} layout")]
    PaneOutOfRange {
        /// Requested pane
        index: usize,
        /// Grid rows
        rows: u32,
        /// Grid columns
        columns: u32,
    },
}

impl GeomError {
    /// Create a degenerate geometry error with a message.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::Degenerate {
            message: message.into(),
        }
    }
}
