use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;

/// A half-line starting at `origin` and travelling along `direction`.
///
/// The direction is not required to be normalized; `t` values are measured
/// in multiples of its length.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray4D {
    pub origin: Tuple4D,
    pub direction: Tuple4D,
}

impl Ray4D {
    pub fn new(origin: Tuple4D, direction: Tuple4D) -> Ray4D {
        Ray4D {
            origin: Tuple4D { w: 1.0, ..origin },
            direction: Tuple4D { w: 0.0, ..direction },
        }
    }

    pub fn position(&self, t: f64) -> Tuple4D {
        self.origin + self.direction * t
    }

    /// Maps both the origin and direction through `m`.
    pub fn transform(&self, m: &Matrix4D) -> Ray4D {
        Ray4D {
            origin: *m * self.origin,
            direction: *m * self.direction,
        }
    }
}

#[test]
fn computing_points_along_a_ray() {
    let r = Ray4D::new(
        Tuple4D::point(2.0, 3.0, 4.0),
        Tuple4D::vector(1.0, 0.0, 0.0)
    );

    assert_eq!(r.position(0.0), Tuple4D::point(2.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Tuple4D::point(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Tuple4D::point(4.5, 3.0, 4.0));
}

#[test]
fn translating_moves_only_the_origin() {
    let r = Ray4D::new(
        Tuple4D::point(1.0, 2.0, 3.0),
        Tuple4D::vector(0.0, 1.0, 0.0)
    );
    let moved = r.transform(&Matrix4D::translation(3.0, 4.0, 5.0));

    assert_eq!(moved.origin, Tuple4D::point(4.0, 6.0, 8.0));
    assert_eq!(moved.direction, Tuple4D::vector(0.0, 1.0, 0.0));
}

#[test]
fn scaling_stretches_the_direction() {
    let r = Ray4D::new(
        Tuple4D::point(1.0, 2.0, 3.0),
        Tuple4D::vector(0.0, 1.0, 0.0)
    );
    let scaled = r.transform(&Matrix4D::scaling(2.0, 3.0, 4.0));

    assert_eq!(scaled.origin, Tuple4D::point(2.0, 6.0, 12.0));
    assert_eq!(scaled.direction, Tuple4D::vector(0.0, 3.0, 0.0));
}
