//! Dynamically-sized column vectors.

use std::ops::{Index, IndexMut};

use crate::{MathError, Result, UNIT_EPSILON};

/// A column vector of at least two elements.
///
/// All vectors in refrakt are column vectors because matrices are
/// column-major. The modulus is recomputed on demand; at the sizes used here
/// (3 or 4 elements) caching buys nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    elems: Vec<f64>,
}

impl Vector {
    /// A zero vector with `n` elements.
    ///
    /// # Panics
    /// Panics if `n < 2` — anything shorter is a scalar, not a vector.
    pub fn zeros(n: usize) -> Self {
        assert!(n >= 2, "a vector needs at least two elements");
        Self {
            elems: vec![0.0; n],
        }
    }

    /// A vector holding a copy of `elems`.
    ///
    /// # Panics
    /// Panics if `elems` has fewer than two entries.
    pub fn from_slice(elems: &[f64]) -> Self {
        assert!(elems.len() >= 2, "a vector needs at least two elements");
        Self {
            elems: elems.to_vec(),
        }
    }

    /// Shorthand for a 3-element vector.
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            elems: vec![x, y, z],
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Always false; vectors have at least two elements.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Checked element read.
    pub fn element(&self, i: usize) -> Result<f64> {
        self.elems
            .get(i)
            .copied()
            .ok_or(MathError::IndexOutOfRange {
                index: i,
                len: self.elems.len(),
            })
    }

    /// Checked element write.
    pub fn set_element(&mut self, i: usize, value: f64) -> Result<()> {
        let len = self.elems.len();
        match self.elems.get_mut(i) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(MathError::IndexOutOfRange { index: i, len }),
        }
    }

    /// Overwrite all elements from a slice of the same length.
    pub fn set_elements(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.elems.len() {
            return Err(MathError::DimensionMismatch(
                "element slice of different length to vector",
            ));
        }
        self.elems.copy_from_slice(values);
        Ok(())
    }

    /// The elements as a slice.
    pub fn elements(&self) -> &[f64] {
        &self.elems
    }

    /// Component-wise sum.
    pub fn add(&self, other: &Vector) -> Result<Vector> {
        if self.len() != other.len() {
            return Err(MathError::DimensionMismatch("vector addition"));
        }
        Ok(Self {
            elems: self
                .elems
                .iter()
                .zip(&other.elems)
                .map(|(a, b)| a + b)
                .collect(),
        })
    }

    /// Component-wise difference `self - other`.
    pub fn sub(&self, other: &Vector) -> Result<Vector> {
        if self.len() != other.len() {
            return Err(MathError::DimensionMismatch("vector subtraction"));
        }
        Ok(Self {
            elems: self
                .elems
                .iter()
                .zip(&other.elems)
                .map(|(a, b)| a - b)
                .collect(),
        })
    }

    /// Dot product, `|a||b|cos(theta)` for the angle between the operands.
    pub fn dot(&self, other: &Vector) -> Result<f64> {
        if self.len() != other.len() {
            return Err(MathError::DimensionMismatch("dot product"));
        }
        Ok(self
            .elems
            .iter()
            .zip(&other.elems)
            .map(|(a, b)| a * b)
            .sum())
    }

    /// Cross product; both operands must have exactly 3 elements.
    pub fn cross(&self, other: &Vector) -> Result<Vector> {
        if self.len() != 3 || other.len() != 3 {
            return Err(MathError::DimensionMismatch(
                "cross product needs two 3-element vectors",
            ));
        }
        Ok(Vector::xyz(
            self[1] * other[2] - self[2] * other[1],
            self[2] * other[0] - self[0] * other[2],
            self[0] * other[1] - self[1] * other[0],
        ))
    }

    /// The vector multiplied by a scalar.
    pub fn scale(&self, factor: f64) -> Vector {
        Self {
            elems: self.elems.iter().map(|a| a * factor).collect(),
        }
    }

    /// Euclidean norm.
    pub fn modulus(&self) -> f64 {
        self.elems.iter().map(|a| a * a).sum::<f64>().sqrt()
    }

    /// Whether the modulus is within [`UNIT_EPSILON`] of 1.
    pub fn is_normalized(&self) -> bool {
        (self.modulus() - 1.0).abs() < UNIT_EPSILON
    }

    /// A unit-length copy of the vector.
    ///
    /// Already-normalized vectors are returned unchanged, and so are
    /// zero-length vectors — the degenerate case is clamped rather than
    /// raised so a frame keeps rendering.
    pub fn normalized(&self) -> Vector {
        let modulus = self.modulus();
        if (modulus - 1.0).abs() < UNIT_EPSILON || modulus < UNIT_EPSILON {
            self.clone()
        } else {
            self.scale(1.0 / modulus)
        }
    }

    /// The point halfway along the segment between `self` and `other`.
    pub fn midpoint(&self, other: &Vector) -> Result<Vector> {
        if self.len() != other.len() {
            return Err(MathError::DimensionMismatch(
                "midpoint of points in different dimensions",
            ));
        }
        Ok(Self {
            elems: self
                .elems
                .iter()
                .zip(&other.elems)
                .map(|(a, b)| (a + b) / 2.0)
                .collect(),
        })
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.elems[i]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.elems[i]
    }
}
