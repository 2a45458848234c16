#![warn(missing_docs)]

//! Math types for the refrakt beam visualizer.
//!
//! Dynamically-sized column vectors and column-major matrices, rotation
//! construction (Rodrigues' formula), and Euler-angle conversion. Everything
//! the tracer and renderer need is built from these two types; dimension
//! mismatches surface as [`MathError`] values rather than panics.

use thiserror::Error;

mod euler;
mod matrix;
mod vector;

pub use euler::EulerTriple;
pub use matrix::Matrix;
pub use vector::Vector;

/// Errors raised by vector/matrix operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Two operands have incompatible dimensions.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(&'static str),

    /// Element access beyond a vector's or matrix's bounds.
    #[error("index {index} out of range for {len} elements")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The number of addressable elements.
        len: usize,
    },

    /// A matrix with determinant zero has no inverse.
    #[error("singular matrix has no inverse")]
    SingularMatrix,

    /// Euler conversion requires a proper rotation matrix.
    #[error("matrix is not a rotation (determinant {0})")]
    NotRotation(f64),
}

/// Result type for math operations.
pub type Result<T> = std::result::Result<T, MathError>;

/// Modulus leeway within which a vector counts as already normalized.
pub const UNIT_EPSILON: f64 = 1e-8;
