#![warn(missing_docs)]

//! Scene facade for the refrakt beam visualizer.
//!
//! Ties the math, geometry, tracing and rendering crates together into one
//! interactive scene: a camera orbiting the world origin, a refracting
//! target, up to [`MAX_RAY_BOXES`] ray boxes each paired with a traced
//! light beam, and a table of named materials. Every mutation that changes
//! what a beam would do retraces the affected beams before returning, so a
//! render always reflects the current scene.

use thiserror::Error;

mod materials;
mod scene;

pub use materials::{Material, MaterialTable};
pub use scene::{EntityId, Scene, ViewPreset};

use refrakt_geom::GeomError;
use refrakt_math::MathError;
use refrakt_render::RenderError;
use refrakt_trace::TraceError;

/// The most ray boxes a scene can hold at once.
pub const MAX_RAY_BOXES: usize = 49;

/// Errors raised by scene operations.
#[derive(Error, Debug)]
pub enum SceneError {
    /// A material index pointed past the end of the material table.
    #[error("no material with index {0}")]
    UnknownMaterial(usize),
    /// An entity id did not name anything in the scene.
    #[error("no such entity in the scene")]
    UnknownEntity,
    /// The operation needs a ray box but the entity is something else.
    #[error("the entity is not a ray box")]
    NotARayBox,
    /// The scene already holds [`MAX_RAY_BOXES`] ray boxes.
    #[error("the scene cannot hold more than {MAX_RAY_BOXES} ray boxes")]
    CapacityExceeded,
    /// A vector or matrix operation failed.
    #[error(transparent)]
    Math(#[from] MathError),
    /// A mesh or pose operation failed.
    #[error(transparent)]
    Geom(#[from] GeomError),
    /// Tracing a beam failed.
    #[error(transparent)]
    Trace(#[from] TraceError),
    /// Rendering the scene failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
