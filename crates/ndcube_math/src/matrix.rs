//! Square matrices acting on column vectors.

use std::ops::Mul;

use crate::{Float, Vector, VectorRef};

/// Square matrix, stored column by column.
///
/// Entries outside the stored size read as the identity, so matrices of
/// different sizes compose as if the smaller one were padded. `a * b`
/// applies `b` first.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    ndim: u8,
    /// Column-major entries.
    entries: Vec<Float>,
}

impl Matrix {
    /// Returns the identity matrix.
    pub fn ident(ndim: u8) -> Self {
        Self::from_fn(ndim, |col, row| if col == row { 1.0 } else { 0.0 })
    }
    /// Builds a matrix from `f(col, row)`.
    pub fn from_fn(ndim: u8, mut f: impl FnMut(u8, u8) -> Float) -> Self {
        let mut entries = Vec::with_capacity(ndim as usize * ndim as usize);
        for col in 0..ndim {
            for row in 0..ndim {
                entries.push(f(col, row));
            }
        }
        Self { ndim, entries }
    }
    /// Builds a matrix with the given columns. The number of columns is the
    /// size of the matrix.
    pub fn from_cols<V: VectorRef>(cols: impl IntoIterator<Item = V>) -> Self {
        let cols = cols.into_iter().collect::<Vec<V>>();
        Self::from_fn(cols.len() as u8, |col, row| cols[col as usize].get(row))
    }
    /// Builds a matrix with the given rows. The number of rows is the size of
    /// the matrix.
    pub fn from_rows<V: VectorRef>(rows: impl IntoIterator<Item = V>) -> Self {
        let rows = rows.into_iter().collect::<Vec<V>>();
        Self::from_fn(rows.len() as u8, |col, row| rows[row as usize].get(col))
    }

    /// Returns the reflection through the hyperplane perpendicular to the
    /// unit vector `normal`.
    pub fn from_reflection(normal: impl VectorRef) -> Self {
        Self::from_fn(normal.ndim(), |col, row| {
            let ident = if col == row { 1.0 } else { 0.0 };
            ident - 2.0 * normal.get(col) * normal.get(row)
        })
    }
    /// Returns the rotation by `angle` radians that turns axis `from` toward
    /// axis `to`.
    pub fn from_rotation_in_plane(ndim: u8, from: u8, to: u8, angle: Float) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::from_fn(ndim, |col, row| {
            let in_plane = |i| i == from || i == to;
            if in_plane(col) && in_plane(row) {
                if col == row {
                    cos
                } else if col == from {
                    sin
                } else {
                    -sin
                }
            } else if col == row {
                1.0
            } else {
                0.0
            }
        })
    }
    /// Returns the linear map sending each point of `from` to the matching
    /// point of `to`, or `None` if the lists differ in length or `from` is
    /// linearly dependent.
    pub fn from_tie_points<V: VectorRef>(from: &[V], to: &[V]) -> Option<Self> {
        if from.len() != to.len() {
            return None;
        }
        Some(Self::from_cols(to) * Self::from_cols(from).inverse()?)
    }

    /// Returns the size of the matrix.
    pub fn ndim(&self) -> u8 {
        self.ndim
    }
    /// Returns the entry in column `col` and row `row`, reading the identity
    /// outside the stored size.
    pub fn get(&self, col: u8, row: u8) -> Float {
        if col < self.ndim && row < self.ndim {
            self.entries[col as usize * self.ndim as usize + row as usize]
        } else if col == row {
            1.0
        } else {
            0.0
        }
    }
    /// Returns a mutable reference to a stored entry.
    ///
    /// # Panics
    ///
    /// Panics if `col` or `row` is outside the stored size.
    pub fn get_mut(&mut self, col: u8, row: u8) -> &mut Float {
        assert!(
            col < self.ndim && row < self.ndim,
            "entry ({col}, {row}) is outside a {0}x{0} matrix",
            self.ndim,
        );
        &mut self.entries[col as usize * self.ndim as usize + row as usize]
    }

    /// Returns the transpose.
    #[must_use]
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.ndim, |col, row| self.get(row, col))
    }

    /// Returns the determinant, computed by elimination with partial pivoting.
    pub fn determinant(&self) -> Float {
        let mut rows = self.row_lists();
        let mut det = 1.0;
        for k in 0..rows.len() {
            let Some(p) = pivot_row(&rows, k) else {
                return 0.0;
            };
            if p != k {
                rows.swap(p, k);
                det = -det;
            }
            let pivot = rows[k][k];
            det *= pivot;
            for r in k + 1..rows.len() {
                let factor = rows[r][k] / pivot;
                for c in k..rows.len() {
                    let delta = factor * rows[k][c];
                    rows[r][c] -= delta;
                }
            }
        }
        det
    }

    /// Returns the inverse, computed by Gauss-Jordan elimination, or `None`
    /// if the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let n = self.ndim as usize;
        let mut rows = self.row_lists();
        let mut inv = Self::ident(self.ndim).row_lists();
        for k in 0..n {
            let p = pivot_row(&rows, k)?;
            rows.swap(p, k);
            inv.swap(p, k);
            let pivot = rows[k][k];
            for c in 0..n {
                rows[k][c] /= pivot;
                inv[k][c] /= pivot;
            }
            for r in (0..n).filter(|&r| r != k) {
                let factor = rows[r][k];
                for c in 0..n {
                    let (a, b) = (rows[k][c], inv[k][c]);
                    rows[r][c] -= factor * a;
                    inv[r][c] -= factor * b;
                }
            }
        }
        let ret = Self::from_fn(self.ndim, |col, row| inv[row as usize][col as usize]);
        ret.entries.iter().all(|x| x.is_finite()).then_some(ret)
    }

    /// Copies the entries into a list of rows.
    fn row_lists(&self) -> Vec<Vec<Float>> {
        (0..self.ndim)
            .map(|row| (0..self.ndim).map(|col| self.get(col, row)).collect())
            .collect()
    }
}

/// Returns the row at or below `k` with the largest entry in column `k`, or
/// `None` if that column is zero from `k` down.
fn pivot_row(rows: &[Vec<Float>], k: usize) -> Option<usize> {
    (k..rows.len())
        .max_by(|&a, &b| rows[a][k].abs().total_cmp(&rows[b][k].abs()))
        .filter(|&p| rows[p][k] != 0.0)
}

impl Mul<&Matrix> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        let ndim = self.ndim.max(rhs.ndim);
        Matrix::from_fn(ndim, |col, row| {
            (0..ndim).map(|k| self.get(k, row) * rhs.get(col, k)).sum()
        })
    }
}
impl Mul<Matrix> for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        &self * &rhs
    }
}
impl Mul<&Matrix> for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        &self * rhs
    }
}
impl Mul<Matrix> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        self * &rhs
    }
}

impl<V: VectorRef> Mul<V> for &Matrix {
    type Output = Vector;

    fn mul(self, rhs: V) -> Vector {
        let ndim = self.ndim.max(rhs.ndim());
        (0..ndim)
            .map(|row| (0..ndim).map(|col| self.get(col, row) * rhs.get(col)).sum())
            .collect()
    }
}
impl<V: VectorRef> Mul<V> for Matrix {
    type Output = Vector;

    fn mul(self, rhs: V) -> Vector {
        &self * rhs
    }
}

impl approx::AbsDiffEq for Matrix {
    type Epsilon = Float;

    fn default_epsilon() -> Float {
        crate::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Float) -> bool {
        let ndim = self.ndim.max(other.ndim);
        (0..ndim).all(|col| {
            (0..ndim).all(|row| (self.get(col, row) - other.get(col, row)).abs() <= epsilon)
        })
    }
}
