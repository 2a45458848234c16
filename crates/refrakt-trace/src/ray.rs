//! Rays as a starting point and a direction.

use refrakt_math::Vector;

/// One straight segment of a beam's path.
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    /// Starting point in world space.
    pub point: Vector,
    /// Direction of travel; unit length once the tracer has normalized it.
    pub direction: Vector,
}

impl Ray {
    /// A ray from `point` heading along `direction`.
    pub fn new(point: Vector, direction: Vector) -> Ray {
        Ray { point, direction }
    }
}
