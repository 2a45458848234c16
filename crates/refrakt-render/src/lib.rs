#![warn(missing_docs)]

//! Software rendering for the refrakt beam visualizer.
//!
//! Projects posed meshes through a camera into a pixel frame: perspective or
//! orthographic projection, an 8-corner frustum accept, screen-space
//! back-face culling, brightness shading, scanline rasterization with
//! per-pixel depth recovery, straight-alpha blending, an entity-id plane for
//! picking, and a selection outline pass.

use thiserror::Error;

mod color;
mod frame;
mod project;
mod render;

pub use color::Rgba;
pub use frame::Frame;
pub use project::{Projection, ProjectionMode};
pub use render::{outline_selected, render, DrawItem};

use refrakt_math::MathError;

/// Nearest renderable camera-space depth.
pub const NEAR_CLIP: f64 = 0.01;

/// Farthest renderable camera-space depth.
pub const FAR_CLIP: f64 = 10000.0;

/// Vertical field of view in radians; the horizontal field follows from the
/// frame's aspect ratio.
pub const VERTICAL_FOV: f64 = 20.0 * std::f64::consts::PI / 180.0;

/// The fixed color of the selection outline.
pub const OUTLINE_COLOR: Rgba = Rgba::opaque(255, 170, 64);

/// Errors raised during rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A vector or matrix operation failed.
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
