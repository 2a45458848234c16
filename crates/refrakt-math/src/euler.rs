//! Euler angle triples.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::Matrix;

/// Pitch magnitude (as a fraction of a right angle) at or beyond which a
/// triple is treated as gimbal locked.
const GIMBAL_LOCK_FRACTION: f64 = 0.99999;

/// An orientation as heading, pitch and bank angles, in radians.
///
/// Heading rotates about the vertical (y) axis, pitch about the object-space
/// x axis after heading, and bank about the object-space z axis after both.
/// Construction always canonicalizes, so two triples describing the same
/// orientation compare equal element-wise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerTriple {
    heading: f64,
    pitch: f64,
    bank: f64,
}

impl EulerTriple {
    /// Build a triple, folding the angles into canonical form:
    /// `-pi <= heading <= pi`, `-pi/2 <= pitch <= pi/2`, `-pi <= bank <= pi`.
    ///
    /// At gimbal lock (pitch within a sliver of straight up or down) heading
    /// and bank rotate about the same axis, so the heading is folded into
    /// the bank and zeroed.
    pub fn new(heading: f64, pitch: f64, bank: f64) -> Self {
        let two_pi = PI * 2.0;
        let mut heading = heading;
        let mut pitch = pitch;
        let mut bank = bank;

        if pitch.abs() > FRAC_PI_2 {
            pitch += FRAC_PI_2;
            pitch %= two_pi;
            if pitch > PI {
                // Pitched past vertical: the object is upside down, which
                // reads as a half-turn of heading plus the reflected pitch.
                heading += PI;
                pitch = (3.0 * PI / 2.0) - pitch;
            } else {
                pitch -= FRAC_PI_2;
            }
        }
        if pitch.abs() >= GIMBAL_LOCK_FRACTION * FRAC_PI_2 {
            bank += heading;
            heading = 0.0;
        } else if heading.abs() > PI {
            heading += PI;
            heading %= two_pi;
            heading -= PI;
        }
        if bank.abs() > PI {
            bank += PI;
            bank %= two_pi;
            bank -= PI;
        }

        Self {
            heading,
            pitch,
            bank,
        }
    }

    /// The rotation about the vertical axis.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// The angle of declination.
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// The rotation about the body z axis.
    pub fn bank(&self) -> f64 {
        self.bank
    }

    /// The matrix carrying points from object space to upright space, where
    /// this triple is the angular displacement of object space from upright.
    pub fn to_matrix(&self) -> Matrix {
        let (sh, ch) = self.heading.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        let (sb, cb) = self.bank.sin_cos();
        let chcb = ch * cb;
        let shsb = sh * sb;
        let shcb = sh * cb;
        let chsb = ch * sb;
        let mut m = Matrix::zeros(3, 3);
        let layout = [
            chcb + shsb * sp,
            sb * cp,
            chsb * sp - shcb,
            shcb * sp - chsb,
            cb * cp,
            shsb + chcb * sp,
            sh * cp,
            -sp,
            ch * cp,
        ];
        // set_elements cannot fail here: the slice is exactly 9 long.
        let _ = m.set_elements(&layout);
        m
    }

    /// The sum of two angular displacements, canonicalized.
    pub fn add(&self, other: &EulerTriple) -> EulerTriple {
        EulerTriple::new(
            self.heading + other.heading,
            self.pitch + other.pitch,
            self.bank + other.bank,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_passthrough() {
        let e = EulerTriple::new(1.0, 0.5, -2.0);
        assert_eq!(e.heading(), 1.0);
        assert_eq!(e.pitch(), 0.5);
        assert_eq!(e.bank(), -2.0);
    }

    #[test]
    fn test_heading_wraps() {
        let e = EulerTriple::new(PI + 0.25, 0.0, 0.0);
        assert!((e.heading() - (0.25 - PI)).abs() < 1e-12);
    }

    #[test]
    fn test_over_vertical_pitch_folds() {
        // Pitching 3/4 pi up is the same as facing the other way with a
        // 1/4 pi declination.
        let e = EulerTriple::new(0.0, 3.0 * PI / 4.0, 0.0);
        assert!((e.pitch() - PI / 4.0).abs() < 1e-12);
        assert!((e.heading().abs() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_gimbal_lock_moves_heading_to_bank() {
        let e = EulerTriple::new(0.3, FRAC_PI_2, 0.1);
        assert_eq!(e.heading(), 0.0);
        assert!((e.bank() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_roundtrip() {
        let e = EulerTriple::new(0.7, -0.4, 1.2);
        let back = e.to_matrix().to_euler().unwrap();
        assert!((back.heading() - e.heading()).abs() < 1e-10);
        assert!((back.pitch() - e.pitch()).abs() < 1e-10);
        assert!((back.bank() - e.bank()).abs() < 1e-10);
    }

    #[test]
    fn test_matrix_is_rotation() {
        let e = EulerTriple::new(2.0, 1.0, -1.5);
        let m = e.to_matrix();
        assert!((m.det().unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_add_canonicalizes() {
        let a = EulerTriple::new(3.0, 0.0, 0.0);
        let b = EulerTriple::new(3.0, 0.0, 0.0);
        let sum = a.add(&b);
        assert!(sum.heading().abs() <= PI);
        assert!((sum.heading() - (6.0 - 2.0 * PI)).abs() < 1e-12);
    }
}
