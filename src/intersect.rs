use std::cmp::Ordering;
use std::ops::Index;

use crate::consts::{ EPSILON, VACUUM_RI };
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::arena::{ ShapeArena, ShapeId };

/// A ray/surface crossing at offset `t` along the ray.
///
/// `uv` carries barycentric coordinates for triangle hits, which smooth
/// triangles use to interpolate their normal.
#[derive(Copy, Clone, Debug)]
pub struct Intersection {
    pub t: f64,
    pub object: ShapeId,
    pub uv: Option<(f64, f64)>,
}

/// Two intersections are equal when they share `t` and the object hit.
impl PartialEq for Intersection {
    fn eq(&self, other: &Intersection) -> bool {
        self.t == other.t && self.object == other.object
    }
}

impl Intersection {
    pub fn new(t: f64, object: ShapeId) -> Intersection {
        Intersection { t, object, uv: None }
    }

    pub fn with_uv(t: f64, object: ShapeId, u: f64, v: f64) -> Intersection {
        Intersection { t, object, uv: Some((u, v)) }
    }
}

/// A list of intersections, usually kept sorted by `t`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Intersections {
    pub intersections: Vec<Intersection>,
}

impl From<Vec<Intersection>> for Intersections {
    fn from(intersections: Vec<Intersection>) -> Intersections {
        Intersections { intersections }
    }
}

impl Index<usize> for Intersections {
    type Output = Intersection;

    fn index(&self, i: usize) -> &Intersection {
        &self.intersections[i]
    }
}

impl Intersections {
    pub fn new() -> Intersections {
        Intersections { intersections: Vec::new() }
    }

    /// Concatenates several lists and sorts the result by `t`.
    pub fn aggregate(lists: Vec<Intersections>) -> Intersections {
        let mut all = Intersections {
            intersections: lists.into_iter()
                .flat_map(|l| l.intersections)
                .collect(),
        };

        all.sort();
        all
    }

    pub fn push(&mut self, i: Intersection) {
        self.intersections.push(i);
    }

    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Intersection> {
        self.intersections.iter()
    }

    /// Stable sort by `t`. Equal offsets keep their relative order.
    pub fn sort(&mut self) {
        self.intersections.sort_by(|a, b|
            a.t.partial_cmp(&b.t).unwrap_or(Ordering::Equal)
        );
    }

    /// The visible intersection: the smallest non-negative `t`.
    pub fn hit(&self) -> Option<Intersection> {
        self.intersections.iter()
            .filter(|i| i.t >= 0.0 && i.t.is_finite())
            .min_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(Ordering::Equal))
            .copied()
    }
}

/// Everything shading needs to know about a hit.
#[derive(Copy, Clone, Debug)]
pub struct IntersectionComputation {
    pub t: f64,
    pub object: ShapeId,

    /// Where the hit occurs.
    pub point: Tuple4D,

    /// Nudged out along the normal; the origin for shadow and reflection rays
    /// so a surface does not occlude itself.
    pub over_point: Tuple4D,

    /// Nudged in along the normal; the origin for refracted rays.
    pub under_point: Tuple4D,

    pub eyev: Tuple4D,

    /// Always faces the eye. See `inside`.
    pub normalv: Tuple4D,
    pub reflectv: Tuple4D,

    /// Whether the normal was flipped because the hit is on an inner surface.
    pub inside: bool,

    /// Refractive index of the medium being exited.
    pub n1: f64,

    /// Refractive index of the medium being entered.
    pub n2: f64,
}

impl IntersectionComputation {
    /// Prepares the shading state for `hit`.
    ///
    /// `xs` is the sorted list `hit` came from. It is replayed to find which
    /// objects the ray is inside when it reaches the hit.
    pub fn new(ray: &Ray4D, hit: &Intersection, xs: &Intersections,
        shapes: &ShapeArena) -> IntersectionComputation {
        let point = ray.position(hit.t);
        let eyev = -ray.direction;
        let mut normalv = shapes.normal_at(hit.object, point, hit);

        let inside = normalv.dot(&eyev) < 0.0;
        if inside {
            normalv = -normalv;
        }

        let (n1, n2) = Self::refraction_indices(hit, xs, shapes);

        IntersectionComputation {
            t: hit.t,
            object: hit.object,
            point,
            over_point: point + normalv * EPSILON,
            under_point: point - normalv * EPSILON,
            eyev,
            normalv,
            reflectv: ray.direction.reflect(&normalv),
            inside,
            n1,
            n2,
        }
    }

    /// Walks the intersections up to `hit`, tracking which objects contain
    /// the ray. The innermost container before and after the hit gives the
    /// indices on either side of the surface.
    fn refraction_indices(hit: &Intersection, xs: &Intersections,
        shapes: &ShapeArena) -> (f64, f64) {
        let index_of = |containers: &Vec<ShapeId>| match containers.last() {
            Some(id) => shapes.get(*id).material.refractive_index,
            None => VACUUM_RI,
        };

        let mut containers: Vec<ShapeId> = Vec::new();
        let mut n1 = VACUUM_RI;

        for i in xs.iter() {
            if i == hit {
                n1 = index_of(&containers);
            }

            match containers.iter().position(|id| *id == i.object) {
                Some(j) => { containers.remove(j); },
                None => containers.push(i.object),
            }

            if i == hit {
                return (n1, index_of(&containers));
            }
        }

        // The hit was not in the list; treat both sides as vacuum.
        (VACUUM_RI, VACUUM_RI)
    }

    /// Schlick's approximation of the Fresnel reflectance, in `[0, 1]`.
    ///
    /// Total internal reflection yields 1.
    pub fn schlick(&self) -> f64 {
        let mut cos = self.eyev.dot(&self.normalv);

        if self.n1 > self.n2 {
            let n = self.n1 / self.n2;
            let sin2_t = n.powi(2) * (1.0 - cos.powi(2));
            if sin2_t > 1.0 {
                return 1.0;
            }

            cos = (1.0 - sin2_t).sqrt();
        }

        let r0 = ((self.n1 - self.n2) / (self.n1 + self.n2)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cos).powi(5)
    }
}

#[test]
fn hit_is_lowest_nonnegative_t() {
    let s = ShapeId(0);

    let xs = Intersections::from(vec![
        Intersection::new(2.0, s), Intersection::new(1.0, s)
    ]);
    assert_eq!(xs.hit(), Some(Intersection::new(1.0, s)));

    let xs = Intersections::from(vec![
        Intersection::new(-1.0, s), Intersection::new(1.0, s)
    ]);
    assert_eq!(xs.hit(), Some(Intersection::new(1.0, s)));

    let xs = Intersections::from(vec![
        Intersection::new(-2.0, s), Intersection::new(-1.0, s)
    ]);
    assert_eq!(xs.hit(), None);

    let xs = Intersections::from(vec![
        Intersection::new(5.0, s),
        Intersection::new(7.0, s),
        Intersection::new(-3.0, s),
        Intersection::new(2.0, s),
    ]);
    assert_eq!(xs.hit(), Some(Intersection::new(2.0, s)));
}

#[test]
fn aggregate_sorts_and_keeps_ties_stable() {
    let a = ShapeId(0);
    let b = ShapeId(1);

    let xs = Intersections::aggregate(vec![
        Intersections::from(vec![Intersection::new(3.0, a), Intersection::new(1.0, a)]),
        Intersections::from(vec![Intersection::new(1.0, b), Intersection::new(2.0, b)]),
    ]);

    let order: Vec<(f64, ShapeId)> = xs.iter().map(|i| (i.t, i.object)).collect();
    assert_eq!(order, vec![(1.0, a), (1.0, b), (2.0, b), (3.0, a)]);
}

#[test]
fn intersection_equality_ignores_uv() {
    let s = ShapeId(3);

    assert_eq!(Intersection::new(1.0, s), Intersection::with_uv(1.0, s, 0.2, 0.4));
    assert_ne!(Intersection::new(1.0, s), Intersection::new(1.0, ShapeId(4)));
}

#[test]
fn precomputing_hits_outside_and_inside() {
    use crate::shape::Shape;

    let mut shapes = ShapeArena::new();
    let s = shapes.insert(Shape::sphere()).unwrap();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(4.0, s);
    let comps = IntersectionComputation::new(&r, &i, &Intersections::from(vec![i]), &shapes);

    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, -1.0));
    assert_eq!(comps.eyev, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
    assert!(!comps.inside);

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(1.0, s);
    let comps = IntersectionComputation::new(&r, &i, &Intersections::from(vec![i]), &shapes);

    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, 1.0));
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
    assert!(comps.inside);
}

#[test]
fn over_and_under_points_straddle_the_surface() {
    use crate::shape::Shape;
    use crate::matrix::Matrix4D;
    use crate::material::Material;

    let mut shapes = ShapeArena::new();
    let s = shapes.insert(
        Shape::sphere()
            .with_transform(Matrix4D::translation(0.0, 0.0, 1.0))
            .with_material(Material::glass())
    ).unwrap();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(5.0, s);
    let comps = IntersectionComputation::new(&r, &i, &Intersections::from(vec![i]), &shapes);

    assert!(comps.over_point.z < -EPSILON / 2.0);
    assert!(comps.point.z > comps.over_point.z);
    assert!(comps.under_point.z > EPSILON / 2.0);
    assert!(comps.point.z < comps.under_point.z);
}

#[test]
fn precomputing_the_reflection_vector() {
    use crate::shape::Shape;

    let mut shapes = ShapeArena::new();
    let p = shapes.insert(Shape::plane()).unwrap();
    let half = 2.0f64.sqrt() / 2.0;

    let r = Ray4D::new(Tuple4D::point(0.0, 1.0, -1.0), Tuple4D::vector(0.0, -half, half));
    let i = Intersection::new(2.0f64.sqrt(), p);
    let comps = IntersectionComputation::new(&r, &i, &Intersections::from(vec![i]), &shapes);

    assert_eq!(comps.reflectv, Tuple4D::vector(0.0, half, half));
}

#[test]
fn refractive_indices_at_nested_surfaces() {
    use crate::shape::Shape;
    use crate::matrix::Matrix4D;
    use crate::material::Material;

    let mut shapes = ShapeArena::new();
    let glass = |ri: f64| Material { refractive_index: ri, ..Material::glass() };

    let a = shapes.insert(Shape::sphere()
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0))
        .with_material(glass(1.5))).unwrap();
    let b = shapes.insert(Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, -0.25))
        .with_material(glass(2.0))).unwrap();
    let c = shapes.insert(Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 0.25))
        .with_material(glass(2.5))).unwrap();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -4.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = Intersections::from(vec![
        Intersection::new(2.0, a),
        Intersection::new(2.75, b),
        Intersection::new(3.25, c),
        Intersection::new(4.75, b),
        Intersection::new(5.25, c),
        Intersection::new(6.0, a),
    ]);
    let expected = [
        (1.0, 1.5), (1.5, 2.0), (2.0, 2.5), (2.5, 2.5), (2.5, 1.5), (1.5, 1.0),
    ];

    for (i, (n1, n2)) in expected.iter().enumerate() {
        let comps = IntersectionComputation::new(&r, &xs[i], &xs, &shapes);
        assert_eq!((comps.n1, comps.n2), (*n1, *n2), "at index {}", i);
    }
}

#[test]
fn schlick_reflectance() {
    use crate::shape::Shape;
    use crate::material::Material;
    use crate::feq;

    let mut shapes = ShapeArena::new();
    let s = shapes.insert(Shape::sphere().with_material(Material::glass())).unwrap();
    let half = 2.0f64.sqrt() / 2.0;

    // Total internal reflection.
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, half), Tuple4D::vector(0.0, 1.0, 0.0));
    let xs = Intersections::from(vec![
        Intersection::new(-half, s), Intersection::new(half, s)
    ]);
    let comps = IntersectionComputation::new(&r, &xs[1], &xs, &shapes);
    assert!(feq(comps.schlick(), 1.0));

    // Perpendicular viewing angle.
    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 1.0, 0.0));
    let xs = Intersections::from(vec![
        Intersection::new(-1.0, s), Intersection::new(1.0, s)
    ]);
    let comps = IntersectionComputation::new(&r, &xs[1], &xs, &shapes);
    assert!(feq(comps.schlick(), 0.04));

    // Small angle with n2 > n1.
    let r = Ray4D::new(Tuple4D::point(0.0, 0.99, -2.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = Intersections::from(vec![Intersection::new(1.8589, s)]);
    let comps = IntersectionComputation::new(&r, &xs[0], &xs, &shapes);
    assert!(feq(comps.schlick(), 0.48873));
}
