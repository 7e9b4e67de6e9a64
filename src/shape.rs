use std::f64::INFINITY;

use crate::consts::EPSILON;
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::matrix::Matrix4D;
use crate::material::Material;
use crate::bounds::BoundingBox;
use crate::arena::ShapeId;
use crate::csg::CsgOperation;
use crate::intersect::{ Intersection, Intersections };

/// Precomputed edges and face normal of a triangle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleInfo {
    pub p1: Tuple4D,
    pub p2: Tuple4D,
    pub p3: Tuple4D,

    pub e1: Tuple4D,
    pub e2: Tuple4D,
    pub normal: Tuple4D,
}

impl TriangleInfo {
    pub fn new(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D) -> TriangleInfo {
        let e1 = p2 - p1;
        let e2 = p3 - p1;
        let normal = e2.cross(&e1).normalize();

        TriangleInfo { p1, p2, p3, e1, e2, normal }
    }

    /// Moller-Trumbore. Returns `(t, u, v)` on a hit.
    ///
    /// Triangles are one-sided with respect to hits: a ray parallel to the
    /// plane of the triangle never hits it.
    fn intersect(&self, ray: &Ray4D) -> Option<(f64, f64, f64)> {
        let dir_cross_e2 = ray.direction.cross(&self.e2);
        let determinant = self.e1.dot(&dir_cross_e2);
        if determinant.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / determinant;
        let p1_to_origin = ray.origin - self.p1;
        let u = f * p1_to_origin.dot(&dir_cross_e2);
        if u < 0.0 || u > 1.0 {
            return None;
        }

        let origin_cross_e1 = p1_to_origin.cross(&self.e1);
        let v = f * ray.direction.dot(&origin_cross_e1);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        Some((f * self.e2.dot(&origin_cross_e1), u, v))
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(vec![self.p1, self.p2, self.p3])
    }
}

/// A triangle with a normal at each vertex, interpolated across the face.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SmoothTriangleInfo {
    pub triangle: TriangleInfo,

    pub n1: Tuple4D,
    pub n2: Tuple4D,
    pub n3: Tuple4D,
}

impl SmoothTriangleInfo {
    pub fn new(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D,
        n1: Tuple4D, n2: Tuple4D, n3: Tuple4D) -> SmoothTriangleInfo {
        SmoothTriangleInfo {
            triangle: TriangleInfo::new(p1, p2, p3),
            n1,
            n2,
            n3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeType {
    /// A unit sphere with its center at the object-space origin.
    Sphere,

    /// The xz plane, with its normal pointing up along Y.
    Plane,

    /// An axis-aligned cube spanning -1 to 1 on every axis.
    Cube,

    /// A unit-radius cylinder around Y. Minimum Y, maximum Y, closed.
    Cylinder(f64, f64, bool),

    /// A double-napped cone around Y. Minimum Y, maximum Y, closed.
    Cone(f64, f64, bool),

    /// A flat triangle. See `TriangleInfo`.
    Triangle(TriangleInfo),

    /// A triangle with interpolated vertex normals.
    SmoothTriangle(SmoothTriangleInfo),

    /// A group of shapes, held by handle. Can include other groups.
    Group(Vec<ShapeId>),

    /// A boolean combination of two shapes: operation, left, right.
    Csg(CsgOperation, ShapeId, ShapeId),
}

/// A shape description: geometry, surface and object-to-parent transform.
///
/// Shapes are inserted into a `ShapeArena`, which caches the inverse
/// transform and tracks the scene-graph structure.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub ty: ShapeType,
    pub material: Material,
    pub transform: Matrix4D,
    pub casts_shadow: bool,
}

impl Default for Shape {
    fn default() -> Shape {
        Shape {
            ty: ShapeType::Group(Vec::new()),
            material: Default::default(),
            transform: Matrix4D::identity(),
            casts_shadow: true,
        }
    }
}

impl Shape {
    pub fn new(ty: ShapeType) -> Shape {
        Shape { ty, ..Default::default() }
    }

    pub fn sphere() -> Shape {
        Shape::new(ShapeType::Sphere)
    }

    pub fn plane() -> Shape {
        Shape::new(ShapeType::Plane)
    }

    pub fn cube() -> Shape {
        Shape::new(ShapeType::Cube)
    }

    /// An infinitely long cylinder.
    pub fn cylinder() -> Shape {
        Shape::new(ShapeType::Cylinder(-INFINITY, INFINITY, false))
    }

    /// A truncated cylinder, open at both ends.
    pub fn bounded_cylinder(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeType::Cylinder(minimum, maximum, false))
    }

    /// A truncated cylinder with end caps.
    pub fn capped_cylinder(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeType::Cylinder(minimum, maximum, true))
    }

    /// An infinite double-napped cone.
    pub fn cone() -> Shape {
        Shape::new(ShapeType::Cone(-INFINITY, INFINITY, false))
    }

    pub fn bounded_cone(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeType::Cone(minimum, maximum, false))
    }

    pub fn capped_cone(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeType::Cone(minimum, maximum, true))
    }

    pub fn triangle(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D) -> Shape {
        Shape::new(ShapeType::Triangle(TriangleInfo::new(p1, p2, p3)))
    }

    pub fn smooth_triangle(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D,
        n1: Tuple4D, n2: Tuple4D, n3: Tuple4D) -> Shape {
        Shape::new(ShapeType::SmoothTriangle(
            SmoothTriangleInfo::new(p1, p2, p3, n1, n2, n3)
        ))
    }

    /// An empty group. Children are attached through the arena.
    pub fn group() -> Shape {
        Shape::new(ShapeType::Group(Vec::new()))
    }

    /// A CSG node over two shapes already in the arena.
    pub fn csg(operation: CsgOperation, left: ShapeId, right: ShapeId) -> Shape {
        Shape::new(ShapeType::Csg(operation, left, right))
    }

    pub fn with_transform(mut self, transform: Matrix4D) -> Shape {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: Material) -> Shape {
        self.material = material;
        self
    }

    /// Whether this shape holds other shapes (groups and CSG nodes).
    pub fn is_composite(&self) -> bool {
        matches!(self.ty, ShapeType::Group(_) | ShapeType::Csg(..))
    }

    /// Handles of the shapes directly below this one.
    pub fn children(&self) -> Vec<ShapeId> {
        match self.ty {
            ShapeType::Group(ref children) => children.clone(),
            ShapeType::Csg(_, left, right) => vec![left, right],
            _ => Vec::new(),
        }
    }

    /// Local-space bounds of a primitive. Composite bounds live in the arena.
    pub(crate) fn primitive_bounds(&self) -> BoundingBox {
        match self.ty {
            ShapeType::Sphere | ShapeType::Cube => BoundingBox::new(
                Tuple4D::point(-1.0, -1.0, -1.0),
                Tuple4D::point(1.0, 1.0, 1.0),
            ),

            ShapeType::Plane => BoundingBox::new(
                Tuple4D::point(-INFINITY, 0.0, -INFINITY),
                Tuple4D::point(INFINITY, 0.0, INFINITY),
            ),

            ShapeType::Cylinder(min, max, _) => BoundingBox::new(
                Tuple4D::point(-1.0, min, -1.0),
                Tuple4D::point(1.0, max, 1.0),
            ),

            ShapeType::Cone(min, max, _) => {
                let limit = min.abs().max(max.abs());
                BoundingBox::new(
                    Tuple4D::point(-limit, min, -limit),
                    Tuple4D::point(limit, max, limit),
                )
            },

            ShapeType::Triangle(ref info) => info.bounds(),
            ShapeType::SmoothTriangle(ref info) => info.triangle.bounds(),

            ShapeType::Group(_) | ShapeType::Csg(..) => unreachable!(
                "composite bounds are computed by the arena"
            ),
        }
    }

    /// Intersects a local-space ray with a primitive, tagging hits with `id`.
    pub(crate) fn intersect_primitive(&self, id: ShapeId, ray: &Ray4D) -> Intersections {
        match self.ty {
            ShapeType::Sphere => self.intersect_sphere(id, ray),
            ShapeType::Plane => self.intersect_plane(id, ray),
            ShapeType::Cube => self.intersect_cube(id, ray),
            ShapeType::Cylinder(..) => self.intersect_cylinder(id, ray),
            ShapeType::Cone(..) => self.intersect_cone(id, ray),
            ShapeType::Triangle(ref info) => match info.intersect(ray) {
                Some((t, _, _)) => Intersections::from(vec![
                    Intersection::new(t, id)
                ]),
                None => Intersections::new(),
            },
            ShapeType::SmoothTriangle(ref info) => match info.triangle.intersect(ray) {
                Some((t, u, v)) => Intersections::from(vec![
                    Intersection::with_uv(t, id, u, v)
                ]),
                None => Intersections::new(),
            },
            ShapeType::Group(_) | ShapeType::Csg(..) => unreachable!(
                "composite shapes are intersected by the arena"
            ),
        }
    }

    /// The object-space normal of a primitive at an object-space point.
    pub(crate) fn local_normal_at(&self, at: &Tuple4D, hit: &Intersection) -> Tuple4D {
        match self.ty {
            ShapeType::Sphere => Tuple4D { w: 0.0, ..*at },
            ShapeType::Plane => Tuple4D::vector(0.0, 1.0, 0.0),
            ShapeType::Cube => self.normal_at_cube(at),
            ShapeType::Cylinder(..) => self.normal_at_cylinder(at),
            ShapeType::Cone(..) => self.normal_at_cone(at),
            ShapeType::Triangle(ref info) => info.normal,
            ShapeType::SmoothTriangle(ref info) => match hit.uv {
                Some((u, v)) => info.n2 * u + info.n3 * v + info.n1 * (1.0 - u - v),
                None => info.triangle.normal,
            },
            ShapeType::Group(_) | ShapeType::Csg(..) => unreachable!(
                "normals are only defined on primitives"
            ),
        }
    }

    fn intersect_sphere(&self, id: ShapeId, ray: &Ray4D) -> Intersections {
        // The sphere is centered at the object-space origin.
        let sphere_to_ray = ray.origin - Tuple4D::origin();

        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * ray.direction.dot(&sphere_to_ray);
        let c = sphere_to_ray.dot(&sphere_to_ray) - 1.0;

        let discriminant = b.powi(2) - 4.0 * a * c;
        if discriminant < 0.0 {
            return Intersections::new();
        }

        let t1 = (-b - discriminant.sqrt()) / (2.0 * a);
        let t2 = (-b + discriminant.sqrt()) / (2.0 * a);

        Intersections::from(vec![
            Intersection::new(t1, id),
            Intersection::new(t2, id),
        ])
    }

    fn intersect_plane(&self, id: ShapeId, ray: &Ray4D) -> Intersections {
        // Parallel (or coplanar) rays never hit.
        if ray.direction.y.abs() < EPSILON {
            return Intersections::new();
        }

        let t = -ray.origin.y / ray.direction.y;
        Intersections::from(vec![Intersection::new(t, id)])
    }

    fn intersect_cube(&self, id: ShapeId, ray: &Ray4D) -> Intersections {
        let (xtmin, xtmax) = BoundingBox::check_axis(
            -1.0, 1.0, ray.origin.x, ray.direction.x
        );
        let (ytmin, ytmax) = BoundingBox::check_axis(
            -1.0, 1.0, ray.origin.y, ray.direction.y
        );
        let (ztmin, ztmax) = BoundingBox::check_axis(
            -1.0, 1.0, ray.origin.z, ray.direction.z
        );

        let tmin = xtmin.max(ytmin).max(ztmin);
        let tmax = xtmax.min(ytmax).min(ztmax);

        if tmin > tmax {
            return Intersections::new();
        }

        Intersections::from(vec![
            Intersection::new(tmin, id),
            Intersection::new(tmax, id),
        ])
    }

    fn normal_at_cube(&self, p: &Tuple4D) -> Tuple4D {
        let xa = p.x.abs();
        let ya = p.y.abs();
        let za = p.z.abs();

        let max_component = xa.max(ya).max(za);
        if max_component == xa {
            Tuple4D::vector(p.x, 0.0, 0.0)
        } else if max_component == ya {
            Tuple4D::vector(0.0, p.y, 0.0)
        } else {
            Tuple4D::vector(0.0, 0.0, p.z)
        }
    }

    fn intersect_cylinder(&self, id: ShapeId, ray: &Ray4D) -> Intersections {
        let (minimum, maximum) = match self.ty {
            ShapeType::Cylinder(min, max, _) => (min, max),
            _ => unreachable!(),
        };

        let mut is = Intersections::new();

        // Rays parallel to Y can only hit the caps.
        let a = ray.direction.x.powi(2) + ray.direction.z.powi(2);
        if a.abs() >= EPSILON {
            let b = 2.0 * ray.origin.x * ray.direction.x
                + 2.0 * ray.origin.z * ray.direction.z;
            let c = ray.origin.x.powi(2) + ray.origin.z.powi(2) - 1.0;

            let disc = b.powi(2) - 4.0 * a * c;
            if disc < 0.0 {
                return is;
            }

            let t0 = (-b - disc.sqrt()) / (2.0 * a);
            let t1 = (-b + disc.sqrt()) / (2.0 * a);
            Self::push_within_height(&mut is, id, ray, t0.min(t1), minimum, maximum);
            Self::push_within_height(&mut is, id, ray, t0.max(t1), minimum, maximum);
        }

        self.intersect_caps(id, ray, &mut is);
        is
    }

    fn normal_at_cylinder(&self, at: &Tuple4D) -> Tuple4D {
        let (minimum, maximum) = match self.ty {
            ShapeType::Cylinder(min, max, _) => (min, max),
            _ => unreachable!(),
        };

        // Square of the distance from the Y axis.
        let dist = at.x.powi(2) + at.z.powi(2);

        if dist < 1.0 && at.y >= maximum - EPSILON {
            Tuple4D::vector(0.0, 1.0, 0.0)
        } else if dist < 1.0 && at.y <= minimum + EPSILON {
            Tuple4D::vector(0.0, -1.0, 0.0)
        } else {
            Tuple4D::vector(at.x, 0.0, at.z)
        }
    }

    fn intersect_cone(&self, id: ShapeId, ray: &Ray4D) -> Intersections {
        let (minimum, maximum) = match self.ty {
            ShapeType::Cone(min, max, _) => (min, max),
            _ => unreachable!(),
        };

        let a = ray.direction.x.powi(2)
            - ray.direction.y.powi(2)
            + ray.direction.z.powi(2);

        let b = 2.0 * ray.origin.x * ray.direction.x
            - 2.0 * ray.origin.y * ray.direction.y
            + 2.0 * ray.origin.z * ray.direction.z;

        let c = ray.origin.x.powi(2)
            - ray.origin.y.powi(2)
            + ray.origin.z.powi(2);

        let mut is = Intersections::new();

        if a.abs() < EPSILON {
            // Parallel to one half of the cone: at most one wall hit.
            if b.abs() >= EPSILON {
                let t = -c / (2.0 * b);
                Self::push_within_height(&mut is, id, ray, t, minimum, maximum);
            }
        } else {
            let disc = b.powi(2) - 4.0 * a * c;
            if disc < 0.0 {
                return is;
            }

            let t0 = (-b - disc.sqrt()) / (2.0 * a);
            let t1 = (-b + disc.sqrt()) / (2.0 * a);
            Self::push_within_height(&mut is, id, ray, t0.min(t1), minimum, maximum);
            Self::push_within_height(&mut is, id, ray, t0.max(t1), minimum, maximum);
        }

        self.intersect_caps(id, ray, &mut is);
        is
    }

    fn normal_at_cone(&self, at: &Tuple4D) -> Tuple4D {
        let (minimum, maximum) = match self.ty {
            ShapeType::Cone(min, max, _) => (min, max),
            _ => unreachable!(),
        };

        let dist = at.x.powi(2) + at.z.powi(2);

        // Cap radii equal the absolute height of the cap.
        if dist < maximum.powi(2) && at.y >= maximum - EPSILON {
            Tuple4D::vector(0.0, 1.0, 0.0)
        } else if dist < minimum.powi(2) && at.y <= minimum + EPSILON {
            Tuple4D::vector(0.0, -1.0, 0.0)
        } else {
            let mut y = dist.sqrt();
            if at.y > 0.0 {
                y = -y;
            }

            Tuple4D::vector(at.x, y, at.z)
        }
    }

    /// Keeps a wall hit only if it lies strictly between the end heights.
    fn push_within_height(is: &mut Intersections, id: ShapeId, ray: &Ray4D,
        t: f64, minimum: f64, maximum: f64) {
        let y = ray.origin.y + t * ray.direction.y;
        if minimum < y && y < maximum {
            is.push(Intersection::new(t, id));
        }
    }

    /// End caps of closed cylinders (radius 1) and cones (radius |y|).
    fn intersect_caps(&self, id: ShapeId, ray: &Ray4D, is: &mut Intersections) {
        let (minimum, maximum, closed, is_cone) = match self.ty {
            ShapeType::Cylinder(min, max, c) => (min, max, c, false),
            ShapeType::Cone(min, max, c) => (min, max, c, true),
            _ => unreachable!(),
        };

        if !closed || ray.direction.y.abs() < EPSILON {
            return;
        }

        for cap in [minimum, maximum].iter() {
            // An unbounded end has no disk to cross
            if !cap.is_finite() {
                continue;
            }

            let t = (cap - ray.origin.y) / ray.direction.y;
            let x = ray.origin.x + t * ray.direction.x;
            let z = ray.origin.z + t * ray.direction.z;
            let radius = if is_cone { cap.abs() } else { 1.0 };

            if x.powi(2) + z.powi(2) <= radius.powi(2) {
                is.push(Intersection::new(t, id));
            }
        }
    }
}

#[cfg(test)]
fn local_ts(shape: &Shape, origin: Tuple4D, direction: Tuple4D) -> Vec<f64> {
    let r = Ray4D::new(origin, direction);
    shape.intersect_primitive(ShapeId(0), &r)
        .iter()
        .map(|i| i.t)
        .collect()
}

#[cfg(test)]
fn assert_ts(actual: Vec<f64>, expected: &[f64]) {
    use crate::feq;

    assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(feq(*a, *e), "{:?} vs {:?}", actual, expected);
    }
}

#[test]
fn ray_crosses_sphere_at_two_points() {
    let s = Shape::sphere();

    assert_ts(
        local_ts(&s, Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0)),
        &[4.0, 6.0],
    );
    assert_ts(
        local_ts(&s, Tuple4D::point(0.0, 1.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0)),
        &[5.0, 5.0],
    );
    assert_ts(
        local_ts(&s, Tuple4D::point(0.0, 2.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0)),
        &[],
    );
    assert_ts(
        local_ts(&s, Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0)),
        &[-1.0, 1.0],
    );
    assert_ts(
        local_ts(&s, Tuple4D::point(0.0, 0.0, 5.0), Tuple4D::vector(0.0, 0.0, 1.0)),
        &[-6.0, -4.0],
    );
}

#[test]
fn sphere_hits_are_symmetric_about_the_center() {
    let s = Shape::sphere();
    let ts = local_ts(
        &s,
        Tuple4D::point(0.3, -0.2, -4.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    assert_eq!(ts.len(), 2);
    assert!(crate::feq((ts[0] + ts[1]) / 2.0, 4.0));
}

#[test]
fn sphere_normal_points_away_from_center() {
    let s = Shape::sphere();
    let hit = Intersection::new(0.0, ShapeId(0));
    let third = 3.0f64.sqrt() / 3.0;

    assert_eq!(
        s.local_normal_at(&Tuple4D::point(1.0, 0.0, 0.0), &hit),
        Tuple4D::vector(1.0, 0.0, 0.0)
    );
    assert_eq!(
        s.local_normal_at(&Tuple4D::point(third, third, third), &hit),
        Tuple4D::vector(third, third, third)
    );
}

#[test]
fn plane_hits_from_above_and_below_but_not_parallel() {
    let p = Shape::plane();

    assert_ts(
        local_ts(&p, Tuple4D::point(0.0, 1.0, 0.0), Tuple4D::vector(0.0, -1.0, 0.0)),
        &[1.0],
    );
    assert_ts(
        local_ts(&p, Tuple4D::point(0.0, -1.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0)),
        &[1.0],
    );
    assert_ts(
        local_ts(&p, Tuple4D::point(0.0, 10.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0)),
        &[],
    );
    assert_ts(
        local_ts(&p, Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0)),
        &[],
    );

    let hit = Intersection::new(0.0, ShapeId(0));
    assert_eq!(
        p.local_normal_at(&Tuple4D::point(10.0, 0.0, -10.0), &hit),
        Tuple4D::vector(0.0, 1.0, 0.0)
    );
}

#[test]
fn ray_intersects_each_face_of_a_cube() {
    let c = Shape::cube();
    let cases = [
        (Tuple4D::point(5.0, 0.5, 0.0), Tuple4D::vector(-1.0, 0.0, 0.0), 4.0, 6.0),
        (Tuple4D::point(-5.0, 0.5, 0.0), Tuple4D::vector(1.0, 0.0, 0.0), 4.0, 6.0),
        (Tuple4D::point(0.5, 5.0, 0.0), Tuple4D::vector(0.0, -1.0, 0.0), 4.0, 6.0),
        (Tuple4D::point(0.5, -5.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0), 4.0, 6.0),
        (Tuple4D::point(0.5, 0.0, 5.0), Tuple4D::vector(0.0, 0.0, -1.0), 4.0, 6.0),
        (Tuple4D::point(0.5, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 4.0, 6.0),
        (Tuple4D::point(0.0, 0.5, 0.0), Tuple4D::vector(0.0, 0.0, 1.0), -1.0, 1.0),
    ];

    for (origin, direction, t1, t2) in cases.iter() {
        assert_ts(local_ts(&c, *origin, *direction), &[*t1, *t2]);
    }
}

#[test]
fn ray_misses_a_cube() {
    let c = Shape::cube();
    let cases = [
        (Tuple4D::point(-2.0, 0.0, 0.0), Tuple4D::vector(0.2673, 0.5345, 0.8018)),
        (Tuple4D::point(0.0, -2.0, 0.0), Tuple4D::vector(0.8018, 0.2673, 0.5345)),
        (Tuple4D::point(0.0, 0.0, -2.0), Tuple4D::vector(0.5345, 0.8018, 0.2673)),
        (Tuple4D::point(2.0, 0.0, 2.0), Tuple4D::vector(0.0, 0.0, -1.0)),
        (Tuple4D::point(0.0, 2.0, 2.0), Tuple4D::vector(0.0, -1.0, 0.0)),
        (Tuple4D::point(2.0, 2.0, 0.0), Tuple4D::vector(-1.0, 0.0, 0.0)),
    ];

    for (origin, direction) in cases.iter() {
        assert_ts(local_ts(&c, *origin, *direction), &[]);
    }
}

#[test]
fn cube_normal_follows_the_largest_component() {
    let c = Shape::cube();
    let hit = Intersection::new(0.0, ShapeId(0));
    let cases = [
        (Tuple4D::point(1.0, 0.5, -0.8), Tuple4D::vector(1.0, 0.0, 0.0)),
        (Tuple4D::point(-0.4, 1.0, -0.1), Tuple4D::vector(0.0, 1.0, 0.0)),
        (Tuple4D::point(0.3, -1.0, -0.7), Tuple4D::vector(0.0, -1.0, 0.0)),
        (Tuple4D::point(-0.6, 0.3, 1.0), Tuple4D::vector(0.0, 0.0, 1.0)),
        (Tuple4D::point(1.0, 1.0, 1.0), Tuple4D::vector(1.0, 0.0, 0.0)),
        (Tuple4D::point(-1.0, -1.0, -1.0), Tuple4D::vector(-1.0, 0.0, 0.0)),
    ];

    for (point, normal) in cases.iter() {
        assert_eq!(c.local_normal_at(point, &hit), *normal);
    }
}

#[test]
fn ray_strikes_and_misses_a_cylinder() {
    let cyl = Shape::cylinder();

    let misses = [
        (Tuple4D::point(1.0, 0.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0)),
        (Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0)),
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(1.0, 1.0, 1.0)),
    ];
    for (origin, direction) in misses.iter() {
        assert_ts(local_ts(&cyl, *origin, direction.normalize()), &[]);
    }

    let hits = [
        (Tuple4D::point(1.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 5.0, 5.0),
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 4.0, 6.0),
        (Tuple4D::point(0.5, 0.0, -5.0), Tuple4D::vector(0.1, 1.0, 1.0), 6.80798, 7.08872),
    ];
    for (origin, direction, t0, t1) in hits.iter() {
        assert_ts(local_ts(&cyl, *origin, direction.normalize()), &[*t0, *t1]);
    }
}

#[test]
fn truncated_cylinder_excludes_its_ends() {
    let cyl = Shape::bounded_cylinder(1.0, 2.0);
    let cases = [
        (Tuple4D::point(0.0, 1.5, 0.0), Tuple4D::vector(0.1, 1.0, 0.0), 0),
        (Tuple4D::point(0.0, 3.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 0),
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 0),
        (Tuple4D::point(0.0, 2.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 0),
        (Tuple4D::point(0.0, 1.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 0),
        (Tuple4D::point(0.0, 1.5, -2.0), Tuple4D::vector(0.0, 0.0, 1.0), 2),
    ];

    for (origin, direction, count) in cases.iter() {
        assert_eq!(local_ts(&cyl, *origin, direction.normalize()).len(), *count);
    }
}

#[test]
fn capped_cylinder_is_hit_through_its_caps() {
    let cyl = Shape::capped_cylinder(1.0, 2.0);
    let cases = [
        (Tuple4D::point(0.0, 3.0, 0.0), Tuple4D::vector(0.0, -1.0, 0.0)),
        (Tuple4D::point(0.0, 3.0, -2.0), Tuple4D::vector(0.0, -1.0, 2.0)),
        (Tuple4D::point(0.0, 4.0, -2.0), Tuple4D::vector(0.0, -1.0, 1.0)),
        (Tuple4D::point(0.0, 0.0, -2.0), Tuple4D::vector(0.0, 1.0, 2.0)),
        (Tuple4D::point(0.0, -1.0, -2.0), Tuple4D::vector(0.0, 1.0, 1.0)),
    ];

    for (origin, direction) in cases.iter() {
        assert_eq!(local_ts(&cyl, *origin, direction.normalize()).len(), 2);
    }
}

#[test]
fn cylinder_normals_on_walls_and_caps() {
    let cyl = Shape::capped_cylinder(1.0, 2.0);
    let hit = Intersection::new(0.0, ShapeId(0));
    let cases = [
        (Tuple4D::point(1.0, 1.5, 0.0), Tuple4D::vector(1.0, 0.0, 0.0)),
        (Tuple4D::point(0.0, 1.2, -1.0), Tuple4D::vector(0.0, 0.0, -1.0)),
        (Tuple4D::point(0.0, 1.0, 0.0), Tuple4D::vector(0.0, -1.0, 0.0)),
        (Tuple4D::point(0.5, 1.0, 0.0), Tuple4D::vector(0.0, -1.0, 0.0)),
        (Tuple4D::point(0.0, 2.0, 0.5), Tuple4D::vector(0.0, 1.0, 0.0)),
    ];

    for (point, normal) in cases.iter() {
        assert_eq!(cyl.local_normal_at(point, &hit), *normal);
    }
}

#[test]
fn ray_strikes_a_cone() {
    let cone = Shape::cone();
    let cases = [
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0), 5.0, 5.0),
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(1.0, 1.0, 1.0), 8.66025, 8.66025),
        (Tuple4D::point(1.0, 1.0, -5.0), Tuple4D::vector(-0.5, -1.0, 1.0), 4.55006, 49.44994),
    ];

    for (origin, direction, t0, t1) in cases.iter() {
        assert_ts(local_ts(&cone, *origin, direction.normalize()), &[*t0, *t1]);
    }
}

#[test]
fn ray_parallel_to_one_cone_half_hits_once() {
    let cone = Shape::cone();

    assert_ts(
        local_ts(
            &cone,
            Tuple4D::point(0.0, 0.0, -1.0),
            Tuple4D::vector(0.0, 1.0, 1.0).normalize(),
        ),
        &[0.35355],
    );
}

#[test]
fn capped_cone_is_hit_through_its_caps() {
    let cone = Shape::capped_cone(-0.5, 0.5);
    let cases = [
        (Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 1.0, 0.0), 0),
        (Tuple4D::point(0.0, 0.0, -0.25), Tuple4D::vector(0.0, 1.0, 1.0), 2),
        (Tuple4D::point(0.0, 0.0, -0.25), Tuple4D::vector(0.0, 1.0, 0.0), 4),
    ];

    for (origin, direction, count) in cases.iter() {
        assert_eq!(local_ts(&cone, *origin, direction.normalize()).len(), *count);
    }

    // Open cones ignore the caps.
    let open = Shape::bounded_cone(-0.5, 0.5);
    assert_eq!(
        local_ts(&open, Tuple4D::point(0.0, 0.0, -0.25), Tuple4D::vector(0.0, 1.0, 0.0)).len(),
        2
    );
}

#[test]
fn closed_unbounded_cone_has_no_caps() {
    let origin = Tuple4D::point(1.0, 1.0, -5.0);
    let direction = Tuple4D::vector(-0.5, -1.0, 1.0).normalize();

    let closed = local_ts(&Shape::capped_cone(-INFINITY, INFINITY), origin, direction);
    assert_eq!(closed.len(), 2);
    assert!(closed.iter().all(|t| t.is_finite()));
    assert!(crate::feq(closed[0], 4.55006));
    assert!(crate::feq(closed[1], 49.44994));

    let open = local_ts(&Shape::cone(), origin, direction);
    assert_eq!(closed, open);

    // Same for a cylinder closed at infinity
    let cylinder = Shape::capped_cylinder(-INFINITY, INFINITY);
    let ts = local_ts(&cylinder, Tuple4D::point(0.5, 0.0, -5.0),
        Tuple4D::vector(0.1, 1.0, 1.0).normalize());
    assert!(ts.iter().all(|t| t.is_finite()));
}

#[test]
fn cone_normals() {
    let cone = Shape::cone();
    let hit = Intersection::new(0.0, ShapeId(0));
    let cases = [
        (Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 0.0)),
        (Tuple4D::point(1.0, 1.0, 1.0), Tuple4D::vector(1.0, -(2.0f64.sqrt()), 1.0)),
        (Tuple4D::point(-1.0, -1.0, 0.0), Tuple4D::vector(-1.0, 1.0, 0.0)),
    ];

    for (point, normal) in cases.iter() {
        assert_eq!(cone.local_normal_at(point, &hit), *normal);
    }
}

#[test]
fn constructing_a_triangle() {
    let p1 = Tuple4D::point(0.0, 1.0, 0.0);
    let p2 = Tuple4D::point(-1.0, 0.0, 0.0);
    let p3 = Tuple4D::point(1.0, 0.0, 0.0);
    let info = TriangleInfo::new(p1, p2, p3);

    assert_eq!(info.e1, Tuple4D::vector(-1.0, -1.0, 0.0));
    assert_eq!(info.e2, Tuple4D::vector(1.0, -1.0, 0.0));
    assert_eq!(info.normal, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn ray_against_triangle_edges() {
    let t = Shape::triangle(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
    );
    let forward = Tuple4D::vector(0.0, 0.0, 1.0);

    assert_ts(local_ts(&t, Tuple4D::point(0.0, -1.0, -2.0), Tuple4D::vector(0.0, 1.0, 0.0)), &[]);
    assert_ts(local_ts(&t, Tuple4D::point(1.0, 1.0, -2.0), forward), &[]);
    assert_ts(local_ts(&t, Tuple4D::point(-1.0, 1.0, -2.0), forward), &[]);
    assert_ts(local_ts(&t, Tuple4D::point(0.0, -1.0, -2.0), forward), &[]);
    assert_ts(local_ts(&t, Tuple4D::point(0.0, 0.5, -2.0), forward), &[2.0]);
}

#[test]
fn smooth_triangle_records_and_uses_uv() {
    let t = Shape::smooth_triangle(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
        Tuple4D::vector(-1.0, 0.0, 0.0),
        Tuple4D::vector(1.0, 0.0, 0.0),
    );
    let r = Ray4D::new(
        Tuple4D::point(-0.2, 0.3, -2.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    let xs = t.intersect_primitive(ShapeId(0), &r);
    assert_eq!(xs.len(), 1);

    let (u, v) = xs[0].uv.unwrap();
    assert!(crate::feq(u, 0.45));
    assert!(crate::feq(v, 0.25));

    let n = t.local_normal_at(&Tuple4D::origin(), &xs[0]);
    assert_eq!(n.normalize(), Tuple4D::vector(-0.5547, 0.83205, 0.0));
}

#[test]
fn primitive_bounds() {
    assert_eq!(
        Shape::bounded_cone(-5.0, 3.0).primitive_bounds(),
        BoundingBox::new(Tuple4D::point(-5.0, -5.0, -5.0), Tuple4D::point(5.0, 3.0, 5.0))
    );
    assert_eq!(
        Shape::bounded_cylinder(-5.0, 3.0).primitive_bounds(),
        BoundingBox::new(Tuple4D::point(-1.0, -5.0, -1.0), Tuple4D::point(1.0, 3.0, 1.0))
    );

    let t = Shape::triangle(
        Tuple4D::point(-3.0, 7.0, 2.0),
        Tuple4D::point(6.0, 2.0, -4.0),
        Tuple4D::point(2.0, -1.0, -1.0),
    );
    assert_eq!(
        t.primitive_bounds(),
        BoundingBox::new(Tuple4D::point(-3.0, -1.0, -4.0), Tuple4D::point(6.0, 7.0, 2.0))
    );

    let plane = Shape::plane().primitive_bounds();
    assert!(!plane.is_finite());
    assert_eq!(plane.minimum.y, 0.0);
}
