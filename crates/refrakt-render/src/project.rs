//! Camera-space to normalized clip-space projection.

use refrakt_math::{MathError, Matrix, Vector};

use crate::{Result, FAR_CLIP, NEAR_CLIP, VERTICAL_FOV};

/// Guard against a perspective divide by zero.
const MIN_W: f64 = 0.0001;

/// Divisor mapping camera distance to orthographic zoom.
const ORTHO_ZOOM_SCALE: f64 = 3000.0;

/// How the camera flattens 3-D onto the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Parallel lines converge to a vanishing point, as in real life.
    Perspective,
    /// Size is independent of distance; the view widens as the camera
    /// backs away so zooming out still shows more.
    Orthographic,
}

/// A projection sized to a frame.
///
/// Perspective uses a fixed vertical field of view with the horizontal field
/// derived from the aspect ratio, flattened through a 4-by-4 clip matrix and
/// a perspective divide. Orthographic scales camera-space coordinates by the
/// frame dimensions and a distance-derived zoom.
#[derive(Debug, Clone)]
pub struct Projection {
    width: f64,
    height: f64,
    mode: ProjectionMode,
    clip: Matrix,
}

impl Projection {
    /// A projection for a frame of the given pixel dimensions.
    pub fn new(width: usize, height: usize, mode: ProjectionMode) -> Projection {
        let vertical_fov = VERTICAL_FOV;
        let horizontal_fov =
            2.0 * ((vertical_fov / 2.0).tan() * width as f64 / height as f64).atan();
        let zoom_x = 1.0 / horizontal_fov.tan();
        let zoom_y = 1.0 / vertical_fov.tan();
        let mut clip = Matrix::zeros(4, 4);
        let depth_scale = FAR_CLIP / (FAR_CLIP - NEAR_CLIP);
        // set_element cannot fail on a 4-by-4 with these indices.
        let _ = clip.set_element(0, 0, zoom_x);
        let _ = clip.set_element(1, 1, zoom_y);
        let _ = clip.set_element(2, 2, depth_scale);
        let _ = clip.set_element(3, 2, -NEAR_CLIP * depth_scale);
        let _ = clip.set_element(2, 3, 1.0);
        Projection {
            width: width as f64,
            height: height as f64,
            mode,
            clip,
        }
    }

    /// Which projection this is.
    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    /// Map a camera-space point to normalized clip space.
    ///
    /// `camera_distance` is the camera's distance from the orbit center; it
    /// only matters to the orthographic zoom.
    pub fn to_normalized(&self, camera_coord: &Vector, camera_distance: f64) -> Result<Vector> {
        if camera_coord.len() != 3 {
            return Err(
                MathError::DimensionMismatch("a point in camera space must be a 3-D vector")
                    .into(),
            );
        }
        match self.mode {
            ProjectionMode::Orthographic => {
                let zoom = camera_distance / ORTHO_ZOOM_SCALE;
                Ok(Vector::xyz(
                    camera_coord[0] / (self.width * zoom),
                    camera_coord[1] / (self.height * zoom),
                    camera_coord[2] / FAR_CLIP,
                ))
            }
            ProjectionMode::Perspective => {
                let homogeneous = Vector::from_slice(&[
                    camera_coord[0],
                    camera_coord[1],
                    camera_coord[2],
                    1.0,
                ]);
                let clip = self.clip.mul_vector(&homogeneous)?;
                let mut w = clip[3];
                if w == 0.0 {
                    w = MIN_W;
                }
                Ok(Vector::xyz(clip[0] / w, clip[1] / w, clip[2] / w))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_projects_to_center() {
        let projection = Projection::new(200, 100, ProjectionMode::Perspective);
        let on_axis = Vector::xyz(0.0, 0.0, 6.0);
        let n = projection.to_normalized(&on_axis, 6.0).unwrap();
        assert!(n[0].abs() < 1e-12);
        assert!(n[1].abs() < 1e-12);
        assert!(n[2] > 0.0 && n[2] < 1.0);
    }

    #[test]
    fn test_depth_ordering_preserved() {
        let projection = Projection::new(100, 100, ProjectionMode::Perspective);
        let near = projection
            .to_normalized(&Vector::xyz(0.0, 0.0, 2.0), 6.0)
            .unwrap();
        let far = projection
            .to_normalized(&Vector::xyz(0.0, 0.0, 50.0), 6.0)
            .unwrap();
        assert!(near[2] < far[2]);
        assert!(far[2] < 1.0);
    }

    #[test]
    fn test_perspective_shrinks_with_distance() {
        let projection = Projection::new(100, 100, ProjectionMode::Perspective);
        let close = projection
            .to_normalized(&Vector::xyz(1.0, 0.0, 3.0), 6.0)
            .unwrap();
        let distant = projection
            .to_normalized(&Vector::xyz(1.0, 0.0, 30.0), 6.0)
            .unwrap();
        assert!(distant[0] < close[0]);
    }

    #[test]
    fn test_orthographic_ignores_depth_but_not_zoom() {
        let projection = Projection::new(100, 100, ProjectionMode::Orthographic);
        let p = Vector::xyz(10.0, 0.0, 4.0);
        let near_cam = projection.to_normalized(&p, 6.0).unwrap();
        let far_cam = projection.to_normalized(&p, 60.0).unwrap();
        // Same point, wider view: the coordinate shrinks toward center.
        assert!(far_cam[0].abs() < near_cam[0].abs());
        // Depth does not affect lateral position.
        let deeper = projection
            .to_normalized(&Vector::xyz(10.0, 0.0, 400.0), 6.0)
            .unwrap();
        assert!((deeper[0] - near_cam[0]).abs() < 1e-12);
    }

    #[test]
    fn test_zero_w_is_clamped() {
        let projection = Projection::new(100, 100, ProjectionMode::Perspective);
        let behind = Vector::xyz(1.0, 1.0, 0.0);
        let n = projection.to_normalized(&behind, 6.0).unwrap();
        assert!(n[0].is_finite() && n[1].is_finite() && n[2].is_finite());
    }
}
