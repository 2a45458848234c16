#![warn(missing_docs)]

//! Beam tracing for the refrakt visualizer.
//!
//! A beam starts at an emitter and walks a sequence of straight rays through
//! a single target mesh, refracting by Snell's law on every entry and exit
//! and reflecting totally when it leaves the denser medium at or beyond the
//! critical angle. Alongside the path the tracer records every angle to the
//! surface normal together with a world-space anchor the UI can label, and
//! the path can be extruded into a square-section tube mesh for rendering.

use thiserror::Error;

mod edge;
mod ray;
mod trace;
mod tube;

pub use ray::Ray;
pub use trace::{trace, AngleMarker, TracedPath};
pub use tube::tube_mesh;

pub(crate) use edge::Edge2d;

use refrakt_geom::GeomError;
use refrakt_math::MathError;

/// Most points a traced path can hold, including the open-ended tail point.
pub const MAX_PATH_POINTS: usize = 100;

/// Most angle markers a traced path can hold: two per interior point.
pub const MAX_ANGLE_MARKERS: usize = 196;

/// Rays shorter than this are treated as re-hitting the same face and
/// rejected, so floating-point error cannot pin a beam to a surface.
pub const MIN_RAY_ADVANCE: f64 = 1e-4;

/// Errors raised while tracing a beam or building its tube mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraceError {
    /// A vector or matrix operation failed.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Building the tube mesh failed.
    #[error(transparent)]
    Geom(#[from] GeomError),
}

/// Result type for tracing operations.
pub type Result<T> = std::result::Result<T, TraceError>;
