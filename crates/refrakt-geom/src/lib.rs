#![warn(missing_docs)]

//! Geometry for the refrakt beam visualizer.
//!
//! Triangle meshes with per-face plane data, generators for the seven
//! primitive shapes, axis-aligned bounding boxes, and rigid poses (origin
//! plus orientation) with the compound rotations the scene layer needs.

use thiserror::Error;

mod mesh;
mod pose;

pub use mesh::{Aabb, Face, Mesh, Primitive};
pub use pose::Pose;

use refrakt_math::MathError;

/// Errors raised when building or transforming geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// A face refers to a vertex index the mesh does not have.
    #[error("face {face} refers to vertex {vertex} but the mesh has {vertex_count} vertices")]
    FaceOutOfRange {
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        vertex: usize,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A mesh needs at least one face and three vertices.
    #[error("mesh needs at least one face and three vertices")]
    EmptyMesh,

    /// An underlying vector or matrix operation failed.
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeomError>;
