use std::f64::INFINITY;

use crate::consts::EPSILON;
use crate::tuple::{ Axis, Tuple4D };
use crate::matrix::Matrix4D;
use crate::ray::Ray4D;

/// An axis-aligned box described by its two extreme corners.
///
/// The default box is "inverted" (`minimum` at +inf, `maximum` at -inf) and
/// contains nothing, which makes it the identity for `add_point` and `merge`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub minimum: Tuple4D,
    pub maximum: Tuple4D,
}

impl Default for BoundingBox {
    fn default() -> BoundingBox {
        BoundingBox::empty()
    }
}

impl BoundingBox {
    pub fn new(minimum: Tuple4D, maximum: Tuple4D) -> BoundingBox {
        BoundingBox { minimum, maximum }
    }

    pub fn empty() -> BoundingBox {
        BoundingBox {
            minimum: Tuple4D::point(INFINITY, INFINITY, INFINITY),
            maximum: Tuple4D::point(-INFINITY, -INFINITY, -INFINITY),
        }
    }

    pub fn infinite() -> BoundingBox {
        BoundingBox {
            minimum: Tuple4D::point(-INFINITY, -INFINITY, -INFINITY),
            maximum: Tuple4D::point(INFINITY, INFINITY, INFINITY),
        }
    }

    /// The box spanned by a set of points.
    pub fn from_points<I: IntoIterator<Item = Tuple4D>>(points: I) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for p in points {
            bounds.add_point(p);
        }

        bounds
    }

    pub fn is_empty(&self) -> bool {
        self.minimum.x > self.maximum.x
            || self.minimum.y > self.maximum.y
            || self.minimum.z > self.maximum.z
    }

    /// True when every corner coordinate is finite.
    pub fn is_finite(&self) -> bool {
        [self.minimum, self.maximum].iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
    }

    pub fn add_point(&mut self, p: Tuple4D) {
        self.minimum = self.minimum.min(&p);
        self.maximum = self.maximum.max(&p);
    }

    /// Grows this box to also cover `other`.
    pub fn merge(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }

        self.add_point(other.minimum);
        self.add_point(other.maximum);
    }

    pub fn contains_point(&self, p: &Tuple4D) -> bool {
        self.minimum.x <= p.x && p.x <= self.maximum.x
            && self.minimum.y <= p.y && p.y <= self.maximum.y
            && self.minimum.z <= p.z && p.z <= self.maximum.z
    }

    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        if other.is_empty() {
            return true;
        }

        self.contains_point(&other.minimum) && self.contains_point(&other.maximum)
    }

    /// Re-boxes the eight transformed corners of this box.
    ///
    /// Empty boxes stay empty. Boxes with an infinite extent become the
    /// infinite box, since their corners cannot be transformed meaningfully.
    pub fn transform(&self, m: &Matrix4D) -> BoundingBox {
        if self.is_empty() {
            return BoundingBox::empty();
        }

        if !self.is_finite() {
            return BoundingBox::infinite();
        }

        let (lo, hi) = (self.minimum, self.maximum);
        let corners = [
            Tuple4D::point(lo.x, lo.y, lo.z),
            Tuple4D::point(lo.x, lo.y, hi.z),
            Tuple4D::point(lo.x, hi.y, lo.z),
            Tuple4D::point(lo.x, hi.y, hi.z),
            Tuple4D::point(hi.x, lo.y, lo.z),
            Tuple4D::point(hi.x, lo.y, hi.z),
            Tuple4D::point(hi.x, hi.y, lo.z),
            Tuple4D::point(hi.x, hi.y, hi.z),
        ];

        BoundingBox::from_points(corners.iter().map(|c| *m * *c))
    }

    /// Slab test. Touching an edge or face counts as a hit.
    pub fn intersects(&self, ray: &Ray4D) -> bool {
        if self.is_empty() {
            return false;
        }

        let (tmin, tmax) = [Axis::X, Axis::Y, Axis::Z].iter().fold(
            (-INFINITY, INFINITY),
            |(tmin, tmax), axis| {
                let (lo, hi) = Self::check_axis(
                    self.minimum.component(*axis),
                    self.maximum.component(*axis),
                    ray.origin.component(*axis),
                    ray.direction.component(*axis),
                );

                (tmin.max(lo), tmax.min(hi))
            }
        );

        tmin <= tmax
    }

    /// Entry and exit offsets of a ray against one pair of parallel planes.
    ///
    /// Near-zero directions push the offsets to +/-inf instead of dividing,
    /// so a ray parallel to the slab only "hits" when it starts inside it.
    pub fn check_axis(minimum: f64, maximum: f64, origin: f64, direction: f64)
        -> (f64, f64) {
        let tmin_numerator = minimum - origin;
        let tmax_numerator = maximum - origin;

        let (tmin, tmax) = if direction.abs() >= EPSILON {
            (tmin_numerator / direction, tmax_numerator / direction)
        } else {
            (tmin_numerator * INFINITY, tmax_numerator * INFINITY)
        };

        if tmin > tmax {
            (tmax, tmin)
        } else {
            (tmin, tmax)
        }
    }

    /// The longest axis. Ties prefer x, then y, then z.
    pub fn longest_axis(&self) -> Axis {
        let dx = self.maximum.x - self.minimum.x;
        let dy = self.maximum.y - self.minimum.y;
        let dz = self.maximum.z - self.minimum.z;

        if dx >= dy && dx >= dz {
            Axis::X
        } else if dy >= dz {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Cuts the box in two at the midpoint of its longest axis.
    pub fn split(&self) -> (BoundingBox, BoundingBox) {
        let axis = self.longest_axis();
        let mid = (self.minimum.component(axis) + self.maximum.component(axis))
            / 2.0;

        let left = BoundingBox::new(
            self.minimum,
            self.maximum.with_component(axis, mid),
        );
        let right = BoundingBox::new(
            self.minimum.with_component(axis, mid),
            self.maximum,
        );

        (left, right)
    }
}

#[test]
fn empty_box_is_identity_for_growth() {
    let mut b = BoundingBox::empty();
    assert!(b.is_empty());

    b.add_point(Tuple4D::point(-5.0, 2.0, 0.0));
    b.add_point(Tuple4D::point(7.0, 0.0, -3.0));

    assert!(!b.is_empty());
    assert_eq!(b.minimum, Tuple4D::point(-5.0, 0.0, -3.0));
    assert_eq!(b.maximum, Tuple4D::point(7.0, 2.0, 0.0));

    let mut merged = BoundingBox::empty();
    merged.merge(&b);
    merged.merge(&BoundingBox::empty());
    assert_eq!(merged, b);
}

#[test]
fn merging_two_boxes() {
    let mut a = BoundingBox::new(
        Tuple4D::point(-5.0, -2.0, 0.0),
        Tuple4D::point(7.0, 4.0, 4.0),
    );
    let b = BoundingBox::new(
        Tuple4D::point(8.0, -7.0, -2.0),
        Tuple4D::point(14.0, 2.0, 8.0),
    );

    a.merge(&b);
    assert_eq!(a.minimum, Tuple4D::point(-5.0, -7.0, -2.0));
    assert_eq!(a.maximum, Tuple4D::point(14.0, 4.0, 8.0));
}

#[test]
fn containment_of_points_and_boxes() {
    let b = BoundingBox::new(
        Tuple4D::point(5.0, -2.0, 0.0),
        Tuple4D::point(11.0, 4.0, 7.0),
    );

    assert!(b.contains_point(&Tuple4D::point(5.0, -2.0, 0.0)));
    assert!(b.contains_point(&Tuple4D::point(8.0, 1.0, 3.0)));
    assert!(!b.contains_point(&Tuple4D::point(3.0, 0.0, 3.0)));
    assert!(!b.contains_point(&Tuple4D::point(8.0, 1.0, 8.0)));

    let inner = BoundingBox::new(
        Tuple4D::point(6.0, -1.0, 1.0),
        Tuple4D::point(10.0, 3.0, 6.0),
    );
    let straddling = BoundingBox::new(
        Tuple4D::point(4.0, -3.0, -1.0),
        Tuple4D::point(10.0, 3.0, 6.0),
    );
    assert!(b.contains_box(&inner));
    assert!(!b.contains_box(&straddling));
    assert!(b.contains_box(&BoundingBox::empty()));
}

#[test]
fn transforming_a_box_reboxes_its_corners() {
    use std::f64::consts::PI;

    let b = BoundingBox::new(
        Tuple4D::point(-1.0, -1.0, -1.0),
        Tuple4D::point(1.0, 1.0, 1.0),
    );
    let m = Matrix4D::rotation_x(PI / 4.0) * Matrix4D::rotation_y(PI / 4.0);
    let t = b.transform(&m);

    assert_eq!(t.minimum, Tuple4D::point(-1.41421, -1.70711, -1.70711));
    assert_eq!(t.maximum, Tuple4D::point(1.41421, 1.70711, 1.70711));
}

#[test]
fn transforming_empty_and_unbounded_boxes() {
    let m = Matrix4D::translation(1.0, 2.0, 3.0);

    assert!(BoundingBox::empty().transform(&m).is_empty());

    let plane = BoundingBox::new(
        Tuple4D::point(-INFINITY, 0.0, -INFINITY),
        Tuple4D::point(INFINITY, 0.0, INFINITY),
    );
    assert_eq!(plane.transform(&m), BoundingBox::infinite());
}

#[test]
fn slab_test_against_a_box() {
    let b = BoundingBox::new(
        Tuple4D::point(5.0, -2.0, 0.0),
        Tuple4D::point(11.0, 4.0, 7.0),
    );

    let hits = [
        (Tuple4D::point(15.0, 1.0, 2.0), Tuple4D::vector(-1.0, 0.0, 0.0)),
        (Tuple4D::point(8.0, 1.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0)),
        (Tuple4D::point(8.0, 0.5, 2.0), Tuple4D::vector(1.0, 0.0, 0.0)),
    ];
    for (origin, direction) in hits.iter() {
        let r = Ray4D::new(*origin, direction.normalize());
        assert!(b.intersects(&r));
    }

    let misses = [
        (Tuple4D::point(9.0, -1.0, -8.0), Tuple4D::vector(2.0, 4.0, 6.0)),
        (Tuple4D::point(8.0, 3.0, -4.0), Tuple4D::vector(6.0, 2.0, 4.0)),
        (Tuple4D::point(18.0, 3.0, -3.0), Tuple4D::vector(-1.0, 0.0, 0.0)),
    ];
    for (origin, direction) in misses.iter() {
        let r = Ray4D::new(*origin, direction.normalize());
        assert!(!b.intersects(&r));
    }

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0));
    assert!(!BoundingBox::empty().intersects(&r));
    assert!(BoundingBox::infinite().intersects(&r));
}

#[test]
fn splitting_along_the_longest_axis() {
    let b = BoundingBox::new(
        Tuple4D::point(-1.0, -2.0, -3.0),
        Tuple4D::point(9.0, 5.5, 3.0),
    );
    let (left, right) = b.split();

    assert_eq!(left.minimum, Tuple4D::point(-1.0, -2.0, -3.0));
    assert_eq!(left.maximum, Tuple4D::point(4.0, 5.5, 3.0));
    assert_eq!(right.minimum, Tuple4D::point(4.0, -2.0, -3.0));
    assert_eq!(right.maximum, Tuple4D::point(9.0, 5.5, 3.0));

    let cube = BoundingBox::new(
        Tuple4D::point(-1.0, -1.0, -1.0),
        Tuple4D::point(1.0, 1.0, 1.0),
    );
    assert_eq!(cube.longest_axis(), Axis::X);

    let tall = BoundingBox::new(
        Tuple4D::point(-1.0, -4.0, -4.0),
        Tuple4D::point(1.0, 4.0, 4.0),
    );
    assert_eq!(tall.longest_axis(), Axis::Y);
}
