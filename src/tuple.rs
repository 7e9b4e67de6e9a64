use std::ops::{ Add, Sub, Neg, Mul, Div };

use crate::feq;

/// One of the three spatial axes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A homogeneous coordinate.
///
/// Points carry `w = 1.0` and vectors carry `w = 0.0`, so that translations
/// move points and leave directions untouched. Equality compares every
/// component within `EPSILON`.
#[derive(Debug, Default, Copy, Clone)]
pub struct Tuple4D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64
}

impl PartialEq for Tuple4D {
    fn eq(&self, other: &Tuple4D) -> bool {
        feq(self.x, other.x)
            && feq(self.y, other.y)
            && feq(self.z, other.z)
            && feq(self.w, other.w)
    }
}

impl Tuple4D {
    pub fn tuple(x: f64, y: f64, z: f64, w: f64) -> Tuple4D {
        Tuple4D { x, y, z, w }
    }

    pub fn point(x: f64, y: f64, z: f64) -> Tuple4D {
        Tuple4D { x, y, z, w: 1.0 }
    }

    pub fn vector(x: f64, y: f64, z: f64) -> Tuple4D {
        Tuple4D { x, y, z, w: 0.0 }
    }

    pub fn origin() -> Tuple4D {
        Tuple4D::point(0.0, 0.0, 0.0)
    }

    pub fn is_point(&self) -> bool {
        feq(self.w, 1.0)
    }

    pub fn is_vector(&self) -> bool {
        feq(self.w, 0.0)
    }

    /// Selects the `x`, `y` or `z` component.
    pub fn component(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Returns a copy with one spatial component replaced.
    pub fn with_component(mut self, axis: Axis, value: f64) -> Tuple4D {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }

        self
    }

    /// Component-wise minimum of the spatial parts. Keeps `self.w`.
    pub fn min(&self, other: &Tuple4D) -> Tuple4D {
        Tuple4D {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
            w: self.w,
        }
    }

    /// Component-wise maximum of the spatial parts. Keeps `self.w`.
    pub fn max(&self, other: &Tuple4D) -> Tuple4D {
        Tuple4D {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
            w: self.w,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalize(&self) -> Tuple4D {
        *self / self.magnitude()
    }

    pub fn dot(&self, other: &Tuple4D) -> f64 {
        self.x * other.x
            + self.y * other.y
            + self.z * other.z
            + self.w * other.w
    }

    /// Cross product of the spatial parts. Always yields a vector.
    pub fn cross(&self, other: &Tuple4D) -> Tuple4D {
        Tuple4D::vector(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Reflects a vector across a normal.
    pub fn reflect(&self, normal: &Tuple4D) -> Tuple4D {
        *self - *normal * (2.0 * self.dot(normal))
    }
}

impl From<[f64; 3]> for Tuple4D {
    /// Bare triples are read as points.
    fn from(xyz: [f64; 3]) -> Tuple4D {
        Tuple4D::point(xyz[0], xyz[1], xyz[2])
    }
}

impl Add for Tuple4D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Tuple4D::tuple(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.w + other.w,
        )
    }
}

impl Sub for Tuple4D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Tuple4D::tuple(
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
            self.w - other.w,
        )
    }
}

impl Neg for Tuple4D {
    type Output = Self;

    fn neg(self) -> Self {
        Tuple4D::tuple(-self.x, -self.y, -self.z, -self.w)
    }
}

impl Mul<f64> for Tuple4D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Tuple4D::tuple(
            self.x * scalar,
            self.y * scalar,
            self.z * scalar,
            self.w * scalar,
        )
    }
}

impl Mul<Tuple4D> for f64 {
    type Output = Tuple4D;

    fn mul(self, tuple: Tuple4D) -> Tuple4D {
        tuple * self
    }
}

impl Div<f64> for Tuple4D {
    type Output = Self;

    fn div(self, scalar: f64) -> Self {
        self * (1.0 / scalar)
    }
}

#[test]
fn points_and_vectors_differ_in_w() {
    let p = Tuple4D::point(4.3, -4.2, 3.1);
    let v = Tuple4D::vector(4.3, -4.2, 3.1);

    assert!(p.is_point() && !p.is_vector());
    assert!(v.is_vector() && !v.is_point());
    assert_ne!(p, v);
}

#[test]
fn point_arithmetic_keeps_homogeneous_meaning() {
    let p1 = Tuple4D::point(3.0, 2.0, 1.0);
    let p2 = Tuple4D::point(5.0, 6.0, 7.0);
    let v = Tuple4D::vector(5.0, 6.0, 7.0);

    assert_eq!(p1 - p2, Tuple4D::vector(-2.0, -4.0, -6.0));
    assert_eq!(p1 - v, Tuple4D::point(-2.0, -4.0, -6.0));
    assert_eq!(p1 + v, Tuple4D::point(8.0, 8.0, 8.0));
    assert_eq!(v - v, Tuple4D::vector(0.0, 0.0, 0.0));
}

#[test]
fn scaling_and_negating_tuples() {
    let a = Tuple4D::tuple(1.0, -2.0, 3.0, -4.0);

    assert_eq!(-a, Tuple4D::tuple(-1.0, 2.0, -3.0, 4.0));
    assert_eq!(a * 3.5, Tuple4D::tuple(3.5, -7.0, 10.5, -14.0));
    assert_eq!(0.5 * a, Tuple4D::tuple(0.5, -1.0, 1.5, -2.0));
    assert_eq!(a / 2.0, Tuple4D::tuple(0.5, -1.0, 1.5, -2.0));
}

#[test]
fn equality_is_tolerant() {
    let a = Tuple4D::point(1.0, 2.0, 3.0);
    let b = Tuple4D::point(1.000001, 2.0, 2.999999);
    let c = Tuple4D::point(1.0001, 2.0, 3.0);

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn magnitude_and_normalize() {
    let v = Tuple4D::vector(1.0, 2.0, 3.0);

    assert!(feq(v.magnitude(), 14.0f64.sqrt()));
    assert!(feq(v.normalize().magnitude(), 1.0));
    assert_eq!(
        v.normalize(),
        Tuple4D::vector(0.26726, 0.53452, 0.80178)
    );
}

#[test]
fn dot_and_cross() {
    let a = Tuple4D::vector(1.0, 2.0, 3.0);
    let b = Tuple4D::vector(2.0, 3.0, 4.0);

    assert!(feq(a.dot(&b), 20.0));
    assert_eq!(a.cross(&b), Tuple4D::vector(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Tuple4D::vector(1.0, -2.0, 1.0));
}

#[test]
fn reflecting_off_flat_and_slanted_surfaces() {
    let v = Tuple4D::vector(1.0, -1.0, 0.0);
    let n = Tuple4D::vector(0.0, 1.0, 0.0);
    assert_eq!(v.reflect(&n), Tuple4D::vector(1.0, 1.0, 0.0));

    let v = Tuple4D::vector(0.0, -1.0, 0.0);
    let half = 2.0f64.sqrt() / 2.0;
    let n = Tuple4D::vector(half, half, 0.0);
    assert_eq!(v.reflect(&n), Tuple4D::vector(1.0, 0.0, 0.0));
}

#[test]
fn components_by_axis() {
    let p = Tuple4D::point(1.0, -2.0, 3.0);

    assert_eq!(p.component(Axis::Y), -2.0);
    assert_eq!(p.with_component(Axis::Z, 7.0), Tuple4D::point(1.0, -2.0, 7.0));
    assert_eq!(
        p.min(&Tuple4D::point(0.0, 0.0, 4.0)),
        Tuple4D::point(0.0, -2.0, 3.0)
    );
    assert_eq!(
        p.max(&Tuple4D::point(0.0, 0.0, 4.0)),
        Tuple4D::point(1.0, 0.0, 4.0)
    );
}
