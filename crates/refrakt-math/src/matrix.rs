//! Column-major matrices.

use crate::{EulerTriple, MathError, Result, Vector};

/// A column-major matrix with at least two columns and two rows.
///
/// Elements are addressed as `(column, row)`, and each column can be pulled
/// out as a [`Vector`]. The determinant is recomputed on demand rather than
/// cached behind an invalidation flag; the matrices involved are small enough
/// that the bookkeeping would cost more than the arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    cols: Vec<Vector>,
}

impl Matrix {
    /// A zero matrix with `m` columns and `n` rows.
    ///
    /// # Panics
    /// Panics if either dimension is below 2.
    pub fn zeros(m: usize, n: usize) -> Self {
        assert!(m >= 2 && n >= 2, "a matrix needs at least two columns and rows");
        Self {
            cols: (0..m).map(|_| Vector::zeros(n)).collect(),
        }
    }

    /// The `n`-by-`n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut result = Self::zeros(n, n);
        for i in 0..n {
            result.cols[i][i] = 1.0;
        }
        result
    }

    /// Build a matrix from its columns; every column must have the same length.
    pub fn from_columns(cols: Vec<Vector>) -> Result<Self> {
        if cols.len() < 2 {
            return Err(MathError::DimensionMismatch(
                "a matrix needs at least two columns",
            ));
        }
        let rows = cols[0].len();
        if cols.iter().any(|c| c.len() != rows) {
            return Err(MathError::DimensionMismatch(
                "matrix columns of unequal length",
            ));
        }
        Ok(Self { cols })
    }

    /// Number of columns.
    pub fn num_cols(&self) -> usize {
        self.cols.len()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.cols[0].len()
    }

    fn is_square(&self) -> bool {
        self.num_cols() == self.num_rows()
    }

    /// Checked element read at `(column, row)`.
    pub fn element(&self, col: usize, row: usize) -> Result<f64> {
        self.col_ref(col)?.element(row)
    }

    /// Checked element write at `(column, row)`.
    pub fn set_element(&mut self, col: usize, row: usize, value: f64) -> Result<()> {
        let m = self.num_cols();
        self.cols
            .get_mut(col)
            .ok_or(MathError::IndexOutOfRange { index: col, len: m })?
            .set_element(row, value)
    }

    /// Overwrite every element from a column-major flattened slice.
    pub fn set_elements(&mut self, values: &[f64]) -> Result<()> {
        let (m, n) = (self.num_cols(), self.num_rows());
        if values.len() != m * n {
            return Err(MathError::DimensionMismatch(
                "element slice of different length to matrix",
            ));
        }
        for i in 0..m {
            self.cols[i].set_elements(&values[i * n..(i + 1) * n])?;
        }
        Ok(())
    }

    fn col_ref(&self, i: usize) -> Result<&Vector> {
        self.cols.get(i).ok_or(MathError::IndexOutOfRange {
            index: i,
            len: self.cols.len(),
        })
    }

    /// A copy of column `i` as a vector.
    pub fn column(&self, i: usize) -> Result<Vector> {
        self.col_ref(i).cloned()
    }

    /// Unchecked element read for hot paths; panics on bad indices.
    #[inline]
    pub fn at(&self, col: usize, row: usize) -> f64 {
        self.cols[col][row]
    }

    /// Component-wise sum.
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        if self.num_cols() != other.num_cols() || self.num_rows() != other.num_rows() {
            return Err(MathError::DimensionMismatch("matrix addition"));
        }
        let cols = self
            .cols
            .iter()
            .zip(&other.cols)
            .map(|(a, b)| a.add(b))
            .collect::<Result<_>>()?;
        Ok(Self { cols })
    }

    /// Component-wise difference `self - other`.
    pub fn sub(&self, other: &Matrix) -> Result<Matrix> {
        if self.num_cols() != other.num_cols() || self.num_rows() != other.num_rows() {
            return Err(MathError::DimensionMismatch("matrix subtraction"));
        }
        let cols = self
            .cols
            .iter()
            .zip(&other.cols)
            .map(|(a, b)| a.sub(b))
            .collect::<Result<_>>()?;
        Ok(Self { cols })
    }

    /// Matrix product `self * other`.
    pub fn mul(&self, other: &Matrix) -> Result<Matrix> {
        if self.num_cols() != other.num_rows() {
            return Err(MathError::DimensionMismatch("matrix multiplication"));
        }
        let mut result = Matrix::zeros(other.num_cols(), self.num_rows());
        for row in 0..self.num_rows() {
            for col in 0..other.num_cols() {
                let mut sum = 0.0;
                for k in 0..self.num_cols() {
                    sum += self.at(k, row) * other.at(col, k);
                }
                result.cols[col][row] = sum;
            }
        }
        Ok(result)
    }

    /// Matrix-vector product `self * v`.
    pub fn mul_vector(&self, v: &Vector) -> Result<Vector> {
        if self.num_cols() != v.len() {
            return Err(MathError::DimensionMismatch(
                "matrix/vector multiplication",
            ));
        }
        let mut result = Vector::zeros(self.num_rows());
        for row in 0..self.num_rows() {
            let mut sum = 0.0;
            for k in 0..self.num_cols() {
                sum += self.at(k, row) * v[k];
            }
            result[row] = sum;
        }
        Ok(result)
    }

    /// The matrix multiplied by a scalar.
    pub fn scale(&self, factor: f64) -> Matrix {
        Self {
            cols: self.cols.iter().map(|c| c.scale(factor)).collect(),
        }
    }

    /// The transpose: columns become rows and rows become columns.
    pub fn transpose(&self) -> Matrix {
        let mut result = Matrix::zeros(self.num_rows(), self.num_cols());
        for i in 0..self.num_cols() {
            for j in 0..self.num_rows() {
                result.cols[j][i] = self.at(i, j);
            }
        }
        result
    }

    /// The determinant of a square matrix.
    ///
    /// 2-by-2 and 3-by-3 use the closed forms; anything larger goes through
    /// cofactor expansion after a zero-maximizing pivot pass.
    pub fn det(&self) -> Result<f64> {
        if !self.is_square() {
            return Err(MathError::DimensionMismatch(
                "rectangular matrices have no determinant",
            ));
        }
        Ok(self.expand())
    }

    /// The inverse of a square matrix.
    pub fn inverse(&self) -> Result<Matrix> {
        if !self.is_square() {
            return Err(MathError::DimensionMismatch(
                "non-square matrices have no inverse",
            ));
        }
        if self.num_cols() == 2 {
            let det = self.det2();
            if det == 0.0 {
                return Err(MathError::SingularMatrix);
            }
            let mut inverse = Matrix::zeros(2, 2);
            inverse.cols[0][0] = self.at(1, 1);
            inverse.cols[1][1] = self.at(0, 0);
            inverse.cols[0][1] = -self.at(0, 1);
            inverse.cols[1][0] = -self.at(1, 0);
            return Ok(inverse.scale(1.0 / det));
        }
        let cofactors = self.cofactors();
        // Expanding down the first row against the cofactors reuses the
        // minors that the adjugate needs anyway.
        let mut det = 0.0;
        for i in 0..self.num_cols() {
            det += self.at(i, 0) * cofactors.at(i, 0);
        }
        if det == 0.0 {
            return Err(MathError::SingularMatrix);
        }
        Ok(cofactors.transpose().scale(1.0 / det))
    }

    /// The 3-by-3 rotation of `angle` radians about `axis`.
    ///
    /// Uses Rodrigues' rotation formula; the axis is normalized first.
    pub fn rotation(axis: &Vector, angle: f64) -> Result<Matrix> {
        if axis.len() != 3 {
            return Err(MathError::DimensionMismatch(
                "a rotation axis must be a 3-element vector",
            ));
        }
        let axis = axis.normalized();
        let (x, y, z) = (axis[0], axis[1], axis[2]);
        let (sin, cos) = angle.sin_cos();
        let t = 1.0 - cos;
        let (xs, ys, zs) = (x * sin, y * sin, z * sin);
        let (xy, xz, yz) = (x * y * t, x * z * t, y * z * t);
        let mut m = Matrix::zeros(3, 3);
        m.cols[0][0] = x * x * t + cos;
        m.cols[0][1] = xy + zs;
        m.cols[0][2] = xz - ys;
        m.cols[1][0] = xy - zs;
        m.cols[1][1] = y * y * t + cos;
        m.cols[1][2] = yz + xs;
        m.cols[2][0] = xz + ys;
        m.cols[2][1] = yz - xs;
        m.cols[2][2] = z * z * t + cos;
        Ok(m)
    }

    /// Read the matrix as an object-to-upright rotation and return its Euler
    /// angles.
    ///
    /// The determinant must be 1 within a small leeway (matrix creep from
    /// repeated composition is tolerated); anything else is rejected with
    /// [`MathError::NotRotation`]. Near gimbal lock all rotation is folded
    /// into pitch and heading with zero bank.
    pub fn to_euler(&self) -> Result<EulerTriple> {
        if self.num_cols() != 3 || self.num_rows() != 3 {
            return Err(MathError::DimensionMismatch(
                "only 3-by-3 matrices convert to Euler angles",
            ));
        }
        let det = self.expand();
        if !(0.9999..=1.0001).contains(&det) {
            return Err(MathError::NotRotation(det));
        }
        let sin_pitch = -self.at(2, 1);
        let pitch = if sin_pitch <= -1.0 {
            -std::f64::consts::FRAC_PI_2
        } else if sin_pitch >= 1.0 {
            std::f64::consts::FRAC_PI_2
        } else {
            sin_pitch.asin()
        };
        let (heading, bank);
        if sin_pitch.abs() > 0.9999 {
            // Gimbal lock: heading and bank rotate about the same axis, so
            // report all of it as heading.
            bank = 0.0;
            heading = f64::atan2(-self.at(0, 2), self.at(0, 0));
        } else {
            heading = f64::atan2(self.at(2, 0), self.at(2, 2));
            bank = f64::atan2(self.at(0, 1), self.at(1, 1));
        }
        Ok(EulerTriple::new(heading, pitch, bank))
    }

    fn det2(&self) -> f64 {
        self.at(0, 0) * self.at(1, 1) - self.at(1, 0) * self.at(0, 1)
    }

    fn det3(&self) -> f64 {
        self.at(0, 0) * self.at(1, 1) * self.at(2, 2)
            + self.at(1, 0) * self.at(2, 1) * self.at(0, 2)
            + self.at(2, 0) * self.at(0, 1) * self.at(1, 2)
            - self.at(0, 2) * self.at(1, 1) * self.at(2, 0)
            - self.at(1, 2) * self.at(2, 1) * self.at(0, 0)
            - self.at(2, 2) * self.at(0, 1) * self.at(1, 0)
    }

    /// Recursive cofactor expansion; callers guarantee squareness.
    fn expand(&self) -> f64 {
        match self.num_cols() {
            2 => self.det2(),
            3 => self.det3(),
            _ => {
                let reduced = self.eliminated();
                let mut det = 0.0;
                for i in 0..reduced.num_cols() {
                    let pivot = reduced.at(i, 0);
                    if pivot == 0.0 {
                        continue;
                    }
                    let minor = reduced.minor(i, 0).expand();
                    if i % 2 == 0 {
                        det += pivot * minor;
                    } else {
                        det -= pivot * minor;
                    }
                }
                det
            }
        }
    }

    /// Row-swap and column-eliminate so that expansion along the top row
    /// meets as many zeros as possible, without changing the determinant.
    fn eliminated(&self) -> Matrix {
        let mut result = self.clone();
        let (m, n) = (result.num_cols(), result.num_rows());
        let mut max_zeros = 0;
        let mut best_row = 0;
        for row in 0..n {
            let zeros = (0..m).filter(|&col| result.at(col, row) == 0.0).count();
            if zeros > max_zeros {
                max_zeros = zeros;
                best_row = row;
            }
        }
        if best_row != 0 {
            // Cycle three rows; an even number of swaps keeps the sign of
            // the determinant.
            let swap_row = if best_row == 1 { 2 } else { 1 };
            for col in 0..m {
                let temp = result.at(col, 0);
                result.cols[col][0] = result.at(col, best_row);
                result.cols[col][best_row] = result.at(col, swap_row);
                result.cols[col][swap_row] = temp;
            }
        }
        if max_zeros < m - 1 {
            // Column elimination: zero out the top row against the last
            // nonzero pivot column seen so far.
            let mut preserve_col: Option<usize> = None;
            for col in 0..m {
                if let Some(p) = preserve_col {
                    if result.at(col, 0) != 0.0 {
                        let factor = result.at(col, 0) / result.at(p, 0);
                        result.cols[col][0] = 0.0;
                        for row in 1..n {
                            result.cols[col][row] -= result.at(p, row) * factor;
                        }
                    }
                }
                if result.at(col, 0) != 0.0 {
                    preserve_col = Some(col);
                }
            }
        }
        result
    }

    /// The minor formed by removing one column and one row.
    fn minor(&self, col: usize, row: usize) -> Matrix {
        let mut result = Matrix::zeros(self.num_cols() - 1, self.num_rows() - 1);
        for i in 0..self.num_cols() {
            if i == col {
                continue;
            }
            let ti = if i < col { i } else { i - 1 };
            for j in 0..self.num_rows() {
                if j == row {
                    continue;
                }
                let tj = if j < row { j } else { j - 1 };
                result.cols[ti][tj] = self.at(i, j);
            }
        }
        result
    }

    fn cofactors(&self) -> Matrix {
        let mut result = Matrix::zeros(self.num_cols(), self.num_rows());
        for i in 0..self.num_cols() {
            for j in 0..self.num_rows() {
                let minor_det = self.minor(i, j).expand();
                result.cols[i][j] = if (i + j) % 2 == 0 {
                    minor_det
                } else {
                    -minor_det
                };
            }
        }
        result
    }
}
