use std::fmt;
use std::ops::{ Index, IndexMut, Mul };

use crate::feq;
use crate::tuple::Tuple4D;

/// Pivots smaller than this make a matrix singular for inversion purposes.
const SINGULAR_PIVOT: f64 = 1e-12;

/// A 4x4 row-major matrix.
///
/// Products compose right to left: `a * b` applies `b` first, then `a`.
#[derive(Copy, Clone, Debug)]
pub struct Matrix4D {
    data: [f64; 16],
}

impl Default for Matrix4D {
    fn default() -> Matrix4D {
        Matrix4D::identity()
    }
}

impl PartialEq for Matrix4D {
    fn eq(&self, other: &Self) -> bool {
        self.data.iter().zip(other.data.iter()).all(|(l, r)| feq(*l, *r))
    }
}

impl From<[f64; 16]> for Matrix4D {
    fn from(data: [f64; 16]) -> Matrix4D {
        Matrix4D { data }
    }
}

impl From<[[f64; 4]; 4]> for Matrix4D {
    fn from(rows: [[f64; 4]; 4]) -> Matrix4D {
        let mut m = Matrix4D::zero();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                m[(r, c)] = *value;
            }
        }

        m
    }
}

impl Index<(usize, usize)> for Matrix4D {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[row * 4 + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix4D {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.data[row * 4 + col]
    }
}

impl Matrix4D {
    pub fn zero() -> Matrix4D {
        Matrix4D { data: [0.0; 16] }
    }

    pub fn identity() -> Matrix4D {
        let mut m = Matrix4D::zero();
        for i in 0..4 {
            m[(i, i)] = 1.0;
        }

        m
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Matrix4D {
        let mut m = Matrix4D::identity();
        m[(0, 3)] = x;
        m[(1, 3)] = y;
        m[(2, 3)] = z;
        m
    }

    pub fn scaling(x: f64, y: f64, z: f64) -> Matrix4D {
        let mut m = Matrix4D::identity();
        m[(0, 0)] = x;
        m[(1, 1)] = y;
        m[(2, 2)] = z;
        m
    }

    /// Rotation about the X axis by `r` radians (left-handed).
    pub fn rotation_x(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        Matrix4D::from([
            [1.0, 0.0,  0.0, 0.0],
            [0.0, cos, -sin, 0.0],
            [0.0, sin,  cos, 0.0],
            [0.0, 0.0,  0.0, 1.0],
        ])
    }

    /// Rotation about the Y axis by `r` radians (left-handed).
    pub fn rotation_y(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        Matrix4D::from([
            [ cos, 0.0, sin, 0.0],
            [ 0.0, 1.0, 0.0, 0.0],
            [-sin, 0.0, cos, 0.0],
            [ 0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the Z axis by `r` radians (left-handed).
    pub fn rotation_z(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        Matrix4D::from([
            [cos, -sin, 0.0, 0.0],
            [sin,  cos, 0.0, 0.0],
            [0.0,  0.0, 1.0, 0.0],
            [0.0,  0.0, 0.0, 1.0],
        ])
    }

    /// Shearing moves each component in proportion to the other two.
    ///
    /// `xy` is "x in proportion to y", and so on.
    pub fn shearing(xy: f64, xz: f64, yx: f64, yz: f64, zx: f64, zy: f64)
        -> Matrix4D {
        Matrix4D::from([
            [1.0,  xy,  xz, 0.0],
            [ yx, 1.0,  yz, 0.0],
            [ zx,  zy, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Orients the world relative to an eye at `from` looking at `to`.
    ///
    /// The result moves the world, not the eye; `up` only needs to point
    /// roughly upwards.
    pub fn view_transform(from: Tuple4D, to: Tuple4D, up: Tuple4D) -> Matrix4D {
        let forward = (to - from).normalize();
        let left = forward.cross(&up.normalize());
        let true_up = left.cross(&forward);

        let orientation = Matrix4D::from([
            [    left.x,     left.y,     left.z, 0.0],
            [ true_up.x,  true_up.y,  true_up.z, 0.0],
            [-forward.x, -forward.y, -forward.z, 0.0],
            [       0.0,        0.0,        0.0, 1.0],
        ]);

        orientation * Matrix4D::translation(-from.x, -from.y, -from.z)
    }

    pub fn transposition(&self) -> Matrix4D {
        let mut t = Matrix4D::zero();
        for r in 0..4 {
            for c in 0..4 {
                t[(c, r)] = self[(r, c)];
            }
        }

        t
    }

    /// Determinant by row reduction to upper-triangular form.
    pub fn determinant(&self) -> f64 {
        let mut m = *self;
        let mut det = 1.0;

        for col in 0..4 {
            let pivot = match Self::pivot_row(&m, col) {
                Some(p) => p,
                None => return 0.0,
            };

            if pivot != col {
                m.swap_rows(pivot, col);
                det = -det;
            }

            det *= m[(col, col)];
            for r in (col + 1)..4 {
                let factor = m[(r, col)] / m[(col, col)];
                for c in col..4 {
                    m[(r, c)] -= factor * m[(col, c)];
                }
            }
        }

        det
    }

    pub fn is_invertible(&self) -> bool {
        self.inverse().is_some()
    }

    /// Gauss-Jordan inversion with partial pivoting.
    ///
    /// Returns `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Matrix4D> {
        let mut m = *self;
        let mut inv = Matrix4D::identity();

        for col in 0..4 {
            let pivot = Self::pivot_row(&m, col)?;
            m.swap_rows(pivot, col);
            inv.swap_rows(pivot, col);

            let scale = 1.0 / m[(col, col)];
            for c in 0..4 {
                m[(col, c)] *= scale;
                inv[(col, c)] *= scale;
            }

            for r in 0..4 {
                if r == col {
                    continue;
                }

                let factor = m[(r, col)];
                if factor == 0.0 {
                    continue;
                }

                for c in 0..4 {
                    m[(r, c)] -= factor * m[(col, c)];
                    inv[(r, c)] -= factor * inv[(col, c)];
                }
            }
        }

        Some(inv)
    }

    /// Finds the row at or below `col` with the largest magnitude in `col`.
    fn pivot_row(m: &Matrix4D, col: usize) -> Option<usize> {
        let (row, value) = (col..4)
            .map(|r| (r, m[(r, col)].abs()))
            .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if value < SINGULAR_PIVOT || !value.is_finite() {
            None
        } else {
            Some(row)
        }
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }

        for c in 0..4 {
            self.data.swap(a * 4 + c, b * 4 + c);
        }
    }
}

impl Mul<Matrix4D> for Matrix4D {
    type Output = Matrix4D;

    fn mul(self, other: Matrix4D) -> Matrix4D {
        let mut res = Matrix4D::zero();

        for r in 0..4 {
            for c in 0..4 {
                res[(r, c)] = (0..4).map(|k| self[(r, k)] * other[(k, c)]).sum();
            }
        }

        res
    }
}

impl Mul<Tuple4D> for Matrix4D {
    type Output = Tuple4D;

    fn mul(self, t: Tuple4D) -> Tuple4D {
        let row = |r: usize| {
            self[(r, 0)] * t.x
                + self[(r, 1)] * t.y
                + self[(r, 2)] * t.z
                + self[(r, 3)] * t.w
        };

        Tuple4D::tuple(row(0), row(1), row(2), row(3))
    }
}

impl fmt::Display for Matrix4D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..4 {
            write!(f, "|")?;
            for c in 0..4 {
                write!(f, " {:.5} |", self[(r, c)])?;
            }

            if r != 3 {
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

#[test]
fn multiplying_matrices() {
    let a = Matrix4D::from([
        [1.0, 2.0, 3.0, 4.0],
        [5.0, 6.0, 7.0, 8.0],
        [9.0, 8.0, 7.0, 6.0],
        [5.0, 4.0, 3.0, 2.0],
    ]);
    let b = Matrix4D::from([
        [-2.0, 1.0, 2.0,  3.0],
        [ 3.0, 2.0, 1.0, -1.0],
        [ 4.0, 3.0, 6.0,  5.0],
        [ 1.0, 2.0, 7.0,  8.0],
    ]);

    assert_eq!(a * b, Matrix4D::from([
        [20.0, 22.0,  50.0,  48.0],
        [44.0, 54.0, 114.0, 108.0],
        [40.0, 58.0, 110.0, 102.0],
        [16.0, 26.0,  46.0,  42.0],
    ]));
    assert_eq!(a * Matrix4D::identity(), a);
}

#[test]
fn multiplying_matrix_by_tuple() {
    let a = Matrix4D::from([
        [1.0, 2.0, 3.0, 4.0],
        [2.0, 4.0, 4.0, 2.0],
        [8.0, 6.0, 4.0, 1.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    assert_eq!(
        a * Tuple4D::point(1.0, 2.0, 3.0),
        Tuple4D::point(18.0, 24.0, 33.0)
    );
}

#[test]
fn transposing() {
    let a = Matrix4D::from([
        [0.0, 9.0, 3.0, 0.0],
        [9.0, 8.0, 0.0, 8.0],
        [1.0, 8.0, 5.0, 3.0],
        [0.0, 0.0, 5.0, 8.0],
    ]);

    assert_eq!(a.transposition(), Matrix4D::from([
        [0.0, 9.0, 1.0, 0.0],
        [9.0, 8.0, 8.0, 0.0],
        [3.0, 0.0, 5.0, 5.0],
        [0.0, 8.0, 3.0, 8.0],
    ]));
    assert_eq!(Matrix4D::identity().transposition(), Matrix4D::identity());
}

#[test]
fn determinant_and_singularity() {
    let a = Matrix4D::from([
        [-2.0, -8.0,  3.0,  5.0],
        [-3.0,  1.0,  7.0,  3.0],
        [ 1.0,  2.0, -9.0,  6.0],
        [-6.0,  7.0,  7.0, -9.0],
    ]);
    assert!(feq(a.determinant(), -4071.0));

    let singular = Matrix4D::from([
        [-4.0,  2.0, -2.0, -3.0],
        [ 9.0,  6.0,  2.0,  6.0],
        [ 0.0, -5.0,  1.0, -5.0],
        [ 0.0,  0.0,  0.0,  0.0],
    ]);
    assert!(feq(singular.determinant(), 0.0));
    assert!(singular.inverse().is_none());
    assert!(Matrix4D::scaling(1.0, 0.0, 1.0).inverse().is_none());
}

#[test]
fn inverting_a_matrix() {
    let a = Matrix4D::from([
        [-5.0,  2.0,  6.0, -8.0],
        [ 1.0, -5.0,  1.0,  8.0],
        [ 7.0,  7.0, -6.0, -7.0],
        [ 1.0, -3.0,  7.0,  4.0],
    ]);

    let inv = a.inverse().unwrap();
    assert_eq!(inv, Matrix4D::from([
        [ 0.21805,  0.45113,  0.24060, -0.04511],
        [-0.80827, -1.45677, -0.44361,  0.52068],
        [-0.07895, -0.22368, -0.05263,  0.19737],
        [-0.52256, -0.81391, -0.30075,  0.30639],
    ]));
}

#[test]
fn product_times_inverse_recovers_factor() {
    let a = Matrix4D::from([
        [ 3.0, -9.0,  7.0,  3.0],
        [ 3.0, -8.0,  2.0, -9.0],
        [-4.0,  4.0,  4.0,  1.0],
        [-6.0,  5.0, -1.0,  1.0],
    ]);
    let b = Matrix4D::from([
        [8.0,  2.0, 2.0, 2.0],
        [3.0, -1.0, 7.0, 0.0],
        [7.0,  0.0, 5.0, 4.0],
        [6.0, -2.0, 0.0, 5.0],
    ]);

    let c = a * b;
    assert_eq!(c * b.inverse().unwrap(), a);
}

#[test]
fn transforming_points_and_vectors() {
    use std::f64::consts::PI;

    let p = Tuple4D::point(-3.0, 4.0, 5.0);
    let v = Tuple4D::vector(-3.0, 4.0, 5.0);
    let t = Matrix4D::translation(5.0, -3.0, 2.0);

    assert_eq!(t * p, Tuple4D::point(2.0, 1.0, 7.0));
    assert_eq!(t * v, v);
    assert_eq!(Matrix4D::scaling(2.0, 3.0, 4.0) * p, Tuple4D::point(-6.0, 12.0, 20.0));

    let half = 2.0f64.sqrt() / 2.0;
    let up = Tuple4D::point(0.0, 1.0, 0.0);
    assert_eq!(Matrix4D::rotation_x(PI / 4.0) * up, Tuple4D::point(0.0, half, half));
    assert_eq!(Matrix4D::rotation_z(PI / 2.0) * up, Tuple4D::point(-1.0, 0.0, 0.0));
    assert_eq!(
        Matrix4D::rotation_y(PI / 2.0) * Tuple4D::point(0.0, 0.0, 1.0),
        Tuple4D::point(1.0, 0.0, 0.0)
    );
    assert_eq!(
        Matrix4D::shearing(0.0, 0.0, 0.0, 0.0, 0.0, 1.0) * Tuple4D::point(2.0, 3.0, 4.0),
        Tuple4D::point(2.0, 3.0, 7.0)
    );
}

#[test]
fn chained_transforms_apply_in_reverse_order() {
    use std::f64::consts::PI;

    let p = Tuple4D::point(1.0, 0.0, 1.0);
    let t = Matrix4D::translation(10.0, 5.0, 7.0)
        * Matrix4D::scaling(5.0, 5.0, 5.0)
        * Matrix4D::rotation_x(PI / 2.0);

    assert_eq!(t * p, Tuple4D::point(15.0, 0.0, 7.0));
}

#[test]
fn arbitrary_view_transform() {
    let from = Tuple4D::point(1.0, 3.0, 2.0);
    let to = Tuple4D::point(4.0, -2.0, 8.0);
    let up = Tuple4D::vector(1.0, 1.0, 0.0);

    assert_eq!(Matrix4D::view_transform(from, to, up), Matrix4D::from([
        [-0.50709, 0.50709,  0.67612, -2.36643],
        [ 0.76772, 0.60609,  0.12122, -2.82843],
        [-0.35857, 0.59761, -0.71714,  0.00000],
        [ 0.00000, 0.00000,  0.00000,  1.00000],
    ]));

    let default = Matrix4D::view_transform(
        Tuple4D::origin(),
        Tuple4D::point(0.0, 0.0, -1.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    );
    assert_eq!(default, Matrix4D::identity());
}
