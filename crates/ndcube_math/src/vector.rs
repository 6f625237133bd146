//! Points and directions with up to a handful of coordinates.
//!
//! Vectors of different lengths mix freely: any coordinate past the end of a
//! vector reads as zero, so a 3D vector and a 4D vector can be added, dotted,
//! or compared directly.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign};

use itertools::Itertools;
use smallvec::SmallVec;

use crate::Float;
use crate::approx_cmp::is_approx_nonzero;

/// Builds a [`Vector`] from its coordinates, with the same syntax as `vec![]`.
#[macro_export]
macro_rules! vector {
    [$($tok:tt)*] => {
        $crate::Vector($crate::smallvec::smallvec![$($tok)*])
    };
}

/// Owned list of coordinates.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Vector(pub SmallVec<[Float; 4]>);

/// Anything that reads as a list of coordinates followed by infinitely many
/// zeros.
pub trait VectorRef: Sized + fmt::Debug {
    /// Returns the number of stored coordinates.
    fn ndim(&self) -> u8;
    /// Returns the coordinate along `axis`, which is zero past the end.
    fn get(&self, axis: u8) -> Float;

    /// Iterates over the stored coordinates.
    fn iter(&self) -> impl Iterator<Item = Float> + '_ {
        (0..self.ndim()).map(move |axis| self.get(axis))
    }
    /// Copies the coordinates into a new [`Vector`].
    fn to_vector(&self) -> Vector {
        self.iter().collect()
    }
    /// Copies the coordinates, appending zeros until there are `ndim`.
    #[must_use]
    fn pad(&self, ndim: u8) -> Vector {
        self.iter().pad_using(ndim as usize, |_| 0.0).collect()
    }

    /// Returns the inner product.
    fn dot(&self, other: impl VectorRef) -> Float {
        self.iter().zip(other.iter()).map(|(a, b)| a * b).sum()
    }
    /// Returns the 3D cross product, ignoring any coordinates past Z.
    fn cross_product_3d(&self, other: impl VectorRef) -> Vector {
        let [x1, y1, z1] = [0, 1, 2].map(|i| self.get(i));
        let [x2, y2, z2] = [0, 1, 2].map(|i| other.get(i));
        vector![y1 * z2 - z1 * y2, z1 * x2 - x1 * z2, x1 * y2 - y1 * x2]
    }

    /// Returns the squared length.
    fn mag2(&self) -> Float {
        self.iter().map(|x| x * x).sum()
    }
    /// Returns the length.
    fn mag(&self) -> Float {
        self.mag2().sqrt()
    }
    /// Returns the squared distance to another point.
    fn distance2(&self, other: impl VectorRef) -> Float {
        padded_pairs(self, &other).map(|(a, b)| (a - b) * (a - b)).sum()
    }

    /// Returns a unit vector in the same direction, or `None` for the zero
    /// vector.
    #[must_use]
    fn normalize(&self) -> Option<Vector> {
        let recip = self.mag().recip();
        recip
            .is_finite()
            .then(|| self.iter().map(|x| x * recip).collect())
    }
    /// Returns the part of this vector perpendicular to `other`, or `None` if
    /// `other` is zero.
    fn rejected_from(&self, other: impl VectorRef) -> Option<Vector> {
        let t = self.dot(&other) / other.mag2();
        t.is_finite()
            .then(|| padded_pairs(self, &other).map(|(a, b)| a - b * t).collect())
    }

    /// Returns whether every coordinate differs by at most `epsilon`.
    fn approx_eq(&self, other: impl VectorRef, epsilon: Float) -> bool {
        padded_pairs(self, &other).all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Returns exactly `N` coordinates at single precision.
    fn to_f32_array<const N: usize>(&self) -> [f32; N] {
        std::array::from_fn(|i| self.get(i as u8) as f32)
    }
}

/// Iterates over matching coordinates of two vectors, up to the longer one.
fn padded_pairs<'a>(
    a: &'a impl VectorRef,
    b: &'a impl VectorRef,
) -> impl Iterator<Item = (Float, Float)> + 'a {
    (0..a.ndim().max(b.ndim())).map(move |axis| (a.get(axis), b.get(axis)))
}

impl VectorRef for Vector {
    fn ndim(&self) -> u8 {
        self.0.len() as u8
    }

    fn get(&self, axis: u8) -> Float {
        self.0.get(axis as usize).copied().unwrap_or(0.0)
    }
}
impl VectorRef for &[Float] {
    fn ndim(&self) -> u8 {
        self.len().min(u8::MAX as usize) as u8
    }

    fn get(&self, axis: u8) -> Float {
        <[Float]>::get(self, axis as usize).copied().unwrap_or(0.0)
    }
}
impl<const N: usize> VectorRef for [Float; N] {
    fn ndim(&self) -> u8 {
        N.min(u8::MAX as usize) as u8
    }

    fn get(&self, axis: u8) -> Float {
        self.as_slice().get(axis as usize).copied().unwrap_or(0.0)
    }
}
impl<V: VectorRef> VectorRef for &V {
    fn ndim(&self) -> u8 {
        V::ndim(self)
    }

    fn get(&self, axis: u8) -> Float {
        V::get(self, axis)
    }
}

impl Vector {
    /// Vector with no stored coordinates.
    pub const EMPTY: Self = Self(SmallVec::new_const());

    /// Returns `ndim` zeros.
    pub fn zero(ndim: u8) -> Self {
        Self(smallvec::smallvec![0.0; ndim as usize])
    }
    /// Returns the unit vector along `axis`.
    pub fn unit(axis: u8) -> Self {
        let mut ret = Self::zero(axis + 1);
        ret[axis] = 1.0;
        ret
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

impl Index<u8> for Vector {
    type Output = Float;

    fn index(&self, axis: u8) -> &Float {
        &self.0[axis as usize]
    }
}
impl IndexMut<u8> for Vector {
    fn index_mut(&mut self, axis: u8) -> &mut Float {
        &mut self.0[axis as usize]
    }
}

impl<V: VectorRef> AddAssign<V> for Vector {
    fn add_assign(&mut self, rhs: V) {
        if self.ndim() < rhs.ndim() {
            self.0.resize(rhs.ndim() as usize, 0.0);
        }
        for (x, r) in self.0.iter_mut().zip(rhs.iter()) {
            *x += r;
        }
    }
}
impl<V: VectorRef> SubAssign<V> for Vector {
    fn sub_assign(&mut self, rhs: V) {
        if self.ndim() < rhs.ndim() {
            self.0.resize(rhs.ndim() as usize, 0.0);
        }
        for (x, r) in self.0.iter_mut().zip(rhs.iter()) {
            *x -= r;
        }
    }
}

impl<V: VectorRef> Add<V> for Vector {
    type Output = Vector;

    fn add(mut self, rhs: V) -> Vector {
        self += rhs;
        self
    }
}
impl<V: VectorRef> Add<V> for &Vector {
    type Output = Vector;

    fn add(self, rhs: V) -> Vector {
        self.clone() + rhs
    }
}
impl<V: VectorRef> Sub<V> for Vector {
    type Output = Vector;

    fn sub(mut self, rhs: V) -> Vector {
        self -= rhs;
        self
    }
}
impl<V: VectorRef> Sub<V> for &Vector {
    type Output = Vector;

    fn sub(self, rhs: V) -> Vector {
        self.clone() - rhs
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(mut self) -> Vector {
        self.0.iter_mut().for_each(|x| *x = -*x);
        self
    }
}
impl Neg for &Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        -self.clone()
    }
}

impl Mul<Float> for Vector {
    type Output = Vector;

    fn mul(mut self, rhs: Float) -> Vector {
        self.0.iter_mut().for_each(|x| *x *= rhs);
        self
    }
}
impl Mul<Float> for &Vector {
    type Output = Vector;

    fn mul(self, rhs: Float) -> Vector {
        self.clone() * rhs
    }
}
impl Div<Float> for Vector {
    type Output = Vector;

    fn div(mut self, rhs: Float) -> Vector {
        self.0.iter_mut().for_each(|x| *x /= rhs);
        self
    }
}
impl Div<Float> for &Vector {
    type Output = Vector;

    fn div(self, rhs: Float) -> Vector {
        self.clone() / rhs
    }
}

impl approx::AbsDiffEq for Vector {
    type Epsilon = Float;

    fn default_epsilon() -> Float {
        crate::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Float) -> bool {
        self.approx_eq(other, epsilon)
    }
}

impl FromIterator<Float> for Vector {
    fn from_iter<T: IntoIterator<Item = Float>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<V: VectorRef> Sum<V> for Vector {
    fn sum<I: Iterator<Item = V>>(iter: I) -> Self {
        iter.fold(Vector::EMPTY, |acc, v| acc + v)
    }
}

/// Removes from `v` its component along each vector in `basis`.
fn orthogonal_residue(v: Vector, basis: &[Vector]) -> Vector {
    basis
        .iter()
        .fold(v, |v, b| v.rejected_from(b).unwrap_or(v))
}

/// Orthonormalizes vectors in order. A vector that is approximately a linear
/// combination of the ones before it contributes nothing.
pub fn gram_schmidt<V: VectorRef>(vectors: impl IntoIterator<Item = V>) -> Vec<Vector> {
    let mut basis: Vec<Vector> = vec![];
    for v in vectors {
        let residue = orthogonal_residue(v.to_vector(), &basis);
        if is_approx_nonzero(&residue.mag())
            && let Some(unit) = residue.normalize()
        {
            basis.push(unit);
        }
    }
    basis
}

/// Extends an orthonormal list to a basis of `ndim`-dimensional space by
/// trying each coordinate axis in turn.
pub fn complete_orthonormal_basis(mut basis: Vec<Vector>, ndim: u8) -> Vec<Vector> {
    for axis in 0..ndim {
        if basis.len() >= ndim as usize {
            break;
        }
        let residue = orthogonal_residue(Vector::unit(axis).pad(ndim), &basis);
        if residue.mag() > 0.1
            && let Some(unit) = residue.normalize()
        {
            basis.push(unit);
        }
    }
    basis
}
