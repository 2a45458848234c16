//! Rigid poses: an origin plus an object-to-upright orientation.

use refrakt_math::{MathError, Matrix, Vector};

use crate::Result;

/// Position and orientation of an entity in world space.
///
/// The orientation matrix carries object-space directions to upright (world)
/// space; its columns are the entity's basis vectors expressed in world
/// coordinates. Rotations premultiply, so the newest rotation is applied
/// last in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    origin: Vector,
    orientation: Matrix,
}

impl Default for Pose {
    fn default() -> Self {
        Self::new()
    }
}

impl Pose {
    /// The identity pose at the world origin.
    pub fn new() -> Pose {
        Pose {
            origin: Vector::zeros(3),
            orientation: Matrix::identity(3),
        }
    }

    /// An identity-oriented pose at `origin`.
    pub fn at(origin: Vector) -> Result<Pose> {
        let mut pose = Pose::new();
        pose.set_origin(origin)?;
        Ok(pose)
    }

    /// The world-space position of the entity's origin.
    pub fn origin(&self) -> &Vector {
        &self.origin
    }

    /// Move the origin to a new 3-D position.
    pub fn set_origin(&mut self, origin: Vector) -> Result<()> {
        if origin.len() != 3 {
            return Err(MathError::DimensionMismatch("a pose origin must be a 3-D vector").into());
        }
        self.origin = origin;
        Ok(())
    }

    /// The object-to-upright orientation matrix.
    pub fn orientation(&self) -> &Matrix {
        &self.orientation
    }

    /// Replace the orientation; must be 3 by 3.
    pub fn set_orientation(&mut self, orientation: Matrix) -> Result<()> {
        if orientation.num_cols() != 3 || orientation.num_rows() != 3 {
            return Err(
                MathError::DimensionMismatch("an orientation must be a 3 by 3 matrix").into(),
            );
        }
        self.orientation = orientation;
        Ok(())
    }

    /// One of the entity's basis vectors (a column of the orientation) in
    /// world space.
    pub fn basis(&self, axis: usize) -> Result<Vector> {
        Ok(self.orientation.column(axis)?)
    }

    /// Shift the origin by a displacement of up to three components; missing
    /// trailing components are treated as zero.
    pub fn displace(&mut self, displacement: &Vector) -> Result<()> {
        if displacement.len() > 3 {
            return Err(MathError::DimensionMismatch(
                "displacements must be in three dimensions or fewer",
            )
            .into());
        }
        for i in 0..displacement.len() {
            self.origin[i] += displacement[i];
        }
        Ok(())
    }

    /// Rotate about the entity's own origin by premultiplying the
    /// orientation. The matrix should be a rotation; squareness is checked,
    /// orthonormality is the caller's business.
    pub fn rotate(&mut self, rotation: &Matrix) -> Result<()> {
        if rotation.num_cols() != 3 || rotation.num_rows() != 3 {
            return Err(
                MathError::DimensionMismatch("a 3 by 3 matrix is needed to rotate a pose").into(),
            );
        }
        self.orientation = rotation.mul(&self.orientation)?;
        Ok(())
    }

    /// Compound local rotation: pitch about the entity's own x-axis, then
    /// heading about the world's vertical axis. The origin stays put.
    pub fn rotate_by(&mut self, heading: f64, pitch: f64) -> Result<()> {
        let vertical = Matrix::rotation(&self.orientation.column(0)?, pitch)?;
        let horizontal = Matrix::rotation(&Vector::xyz(0.0, 1.0, 0.0), heading)?;
        self.rotate(&vertical)?;
        self.rotate(&horizontal)?;
        Ok(())
    }

    /// Revolve the pose about the point `p`, turning the orientation with it.
    ///
    /// Pitch rotates about the entity's own x-axis; assumes the entity is
    /// facing `p`, the way a camera orbits its look-at point.
    pub fn orbit(&mut self, p: &Vector, heading: f64, pitch: f64) -> Result<()> {
        let vertical = Matrix::rotation(&self.orientation.column(0)?, pitch)?;
        self.orbit_with(p, heading, &vertical)
    }

    /// Revolve about `p` without assuming the entity faces it.
    ///
    /// The pitch axis is the horizontal perpendicular to the horizontal
    /// component of the `p`-to-origin vector, so pitching always moves the
    /// entity straight up or down its meridian.
    pub fn orbit_upright(&mut self, p: &Vector, heading: f64, pitch: f64) -> Result<()> {
        let rel = self.origin.sub(p)?;
        // The horizontal p-to-origin vector turned a quarter turn about
        // the vertical axis.
        let pitch_axis = Vector::xyz(-rel[2], 0.0, rel[0]);
        let vertical = Matrix::rotation(&pitch_axis, pitch)?;
        self.orbit_with(p, heading, &vertical)
    }

    fn orbit_with(&mut self, p: &Vector, heading: f64, vertical: &Matrix) -> Result<()> {
        let horizontal = Matrix::rotation(&Vector::xyz(0.0, 1.0, 0.0), heading)?;
        let rel = self.origin.sub(p)?;
        let revolved = horizontal.mul_vector(&vertical.mul_vector(&rel)?)?;
        self.origin = p.add(&revolved)?;
        self.rotate(vertical)?;
        self.rotate(&horizontal)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_displace_accepts_short_vectors() {
        let mut pose = Pose::new();
        pose.displace(&Vector::from_slice(&[1.0, 2.0])).unwrap();
        assert_eq!(pose.origin().elements(), &[1.0, 2.0, 0.0]);
        pose.displace(&Vector::xyz(0.0, 0.0, -3.0)).unwrap();
        assert_eq!(pose.origin().elements(), &[1.0, 2.0, -3.0]);
        assert!(pose
            .displace(&Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]))
            .is_err());
    }

    #[test]
    fn test_rotate_premultiplies() {
        let mut pose = Pose::new();
        let first = Matrix::rotation(&Vector::xyz(1.0, 0.0, 0.0), 0.4).unwrap();
        let second = Matrix::rotation(&Vector::xyz(0.0, 1.0, 0.0), 0.9).unwrap();
        pose.rotate(&first).unwrap();
        pose.rotate(&second).unwrap();
        let expected = second.mul(&first).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert!((pose.orientation().at(i, j) - expected.at(i, j)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_orbit_preserves_distance() {
        let mut pose = Pose::at(Vector::xyz(0.0, 0.0, -6.0)).unwrap();
        let p = Vector::zeros(3);
        let before = pose.origin().sub(&p).unwrap().modulus();
        pose.orbit(&p, 0.7, -0.3).unwrap();
        let after = pose.origin().sub(&p).unwrap().modulus();
        assert!((before - after).abs() < 1e-10);
    }

    #[test]
    fn test_orbit_heading_revolves_about_vertical() {
        let mut pose = Pose::at(Vector::xyz(0.0, 0.0, -5.0)).unwrap();
        pose.orbit(&Vector::zeros(3), PI, 0.0).unwrap();
        assert!(pose.origin()[0].abs() < 1e-10);
        assert!((pose.origin()[2] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_orbit_upright_pitch_lifts_along_meridian() {
        // A quarter-turn pitch from the horizontal plane should carry the
        // pose to the top of its orbit sphere.
        let mut pose = Pose::at(Vector::xyz(0.0, 0.0, -5.0)).unwrap();
        pose.orbit_upright(&Vector::zeros(3), 0.0, PI / 2.0).unwrap();
        assert!(pose.origin()[0].abs() < 1e-10);
        assert!((pose.origin()[1].abs() - 5.0).abs() < 1e-10);
        assert!(pose.origin()[2].abs() < 1e-10);
    }

    #[test]
    fn test_orbit_about_offset_point() {
        let mut pose = Pose::at(Vector::xyz(3.0, 0.0, 0.0)).unwrap();
        let p = Vector::xyz(1.0, 0.0, 0.0);
        pose.orbit_upright(&p, PI, 0.0).unwrap();
        assert!((pose.origin()[0] - -1.0).abs() < 1e-10);
        assert!(pose.origin()[2].abs() < 1e-10);
    }

    #[test]
    fn test_rotate_by_keeps_origin() {
        let mut pose = Pose::at(Vector::xyz(1.0, 2.0, 3.0)).unwrap();
        pose.rotate_by(0.5, -0.2).unwrap();
        assert_eq!(pose.origin().elements(), &[1.0, 2.0, 3.0]);
        assert!((pose.orientation().det().unwrap() - 1.0).abs() < 1e-10);
    }
}
