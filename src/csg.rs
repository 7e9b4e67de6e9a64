use serde::Deserialize;

use crate::ray::Ray4D;
use crate::shape::ShapeType;
use crate::arena::{ ShapeArena, ShapeId };
use crate::intersect::Intersections;

/// A boolean operation combining two shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsgOperation {
    Union,
    Intersect,
    Difference,
}

impl CsgOperation {
    /// Decides whether an intersection survives the operation.
    ///
    /// `hit_left` says which operand was hit; `in_left` and `in_right` say
    /// whether the ray is currently inside each operand.
    pub fn allows(&self, hit_left: bool, in_left: bool, in_right: bool) -> bool {
        match self {
            CsgOperation::Union
                => (hit_left && !in_right) || (!hit_left && !in_left),
            CsgOperation::Intersect
                => (hit_left && in_right) || (!hit_left && in_left),
            CsgOperation::Difference
                => (hit_left && !in_right) || (!hit_left && in_left),
        }
    }
}

impl ShapeArena {
    /// Keeps the intersections that lie on the surface of a CSG node.
    ///
    /// `xs` must be sorted by `t` and contain hits on the node's operands.
    /// Shapes that are not CSG nodes pass `xs` through unchanged.
    pub fn filter_intersections(&self, csg: ShapeId, xs: &Intersections) -> Intersections {
        match self.get(csg).ty {
            ShapeType::Csg(operation, left, _) => self.filter_csg(operation, left, xs),
            _ => xs.clone(),
        }
    }

    fn filter_csg(&self, operation: CsgOperation, left: ShapeId,
        xs: &Intersections) -> Intersections {
        let mut in_left = false;
        let mut in_right = false;
        let mut kept = Intersections::new();

        for i in xs.iter() {
            let hit_left = self.includes(left, i.object);

            if operation.allows(hit_left, in_left, in_right) {
                kept.push(*i);
            }

            if hit_left {
                in_left = !in_left;
            } else {
                in_right = !in_right;
            }
        }

        kept
    }

    pub(crate) fn intersect_csg(&self, id: ShapeId, operation: CsgOperation,
        left: ShapeId, right: ShapeId, ray: &Ray4D) -> Intersections {
        if !self.bounds(id).intersects(ray) {
            return Intersections::new();
        }

        let xs = Intersections::aggregate(vec![
            self.intersect(left, ray),
            self.intersect(right, ray),
        ]);

        self.filter_csg(operation, left, &xs)
    }
}

#[test]
fn allowance_table() {
    use CsgOperation::*;

    // (hit_left, in_left, in_right, union, intersect, difference)
    let table = [
        (true,  true,  true,  false, true,  false),
        (true,  true,  false, true,  false, true),
        (true,  false, true,  false, true,  false),
        (true,  false, false, true,  false, true),
        (false, true,  true,  false, true,  true),
        (false, true,  false, false, true,  true),
        (false, false, true,  true,  false, false),
        (false, false, false, true,  false, false),
    ];

    for (lhit, inl, inr, union, intersect, difference) in table.iter() {
        assert_eq!(Union.allows(*lhit, *inl, *inr), *union);
        assert_eq!(Intersect.allows(*lhit, *inl, *inr), *intersect);
        assert_eq!(Difference.allows(*lhit, *inl, *inr), *difference);
    }
}

#[test]
fn filtering_a_list_of_intersections() {
    use crate::shape::Shape;
    use crate::intersect::Intersection;

    let expectations = [
        (CsgOperation::Union, [0, 3]),
        (CsgOperation::Intersect, [1, 2]),
        (CsgOperation::Difference, [0, 1]),
    ];

    for (operation, kept) in expectations.iter() {
        let mut shapes = ShapeArena::new();
        let s1 = shapes.insert(Shape::sphere()).unwrap();
        let s2 = shapes.insert(Shape::cube()).unwrap();
        let c = shapes.insert(Shape::csg(*operation, s1, s2)).unwrap();

        let xs = Intersections::from(vec![
            Intersection::new(1.0, s1),
            Intersection::new(2.0, s2),
            Intersection::new(3.0, s1),
            Intersection::new(4.0, s2),
        ]);

        let result = shapes.filter_intersections(c, &xs);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], xs[kept[0]]);
        assert_eq!(result[1], xs[kept[1]]);
    }
}

#[test]
fn ray_misses_and_hits_a_csg_object() {
    use crate::shape::Shape;
    use crate::tuple::Tuple4D;
    use crate::matrix::Matrix4D;

    let mut shapes = ShapeArena::new();
    let s1 = shapes.insert(Shape::sphere()).unwrap();
    let s2 = shapes.insert(
        Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 0.5))
    ).unwrap();
    let c = shapes.insert(Shape::csg(CsgOperation::Union, s1, s2)).unwrap();

    let miss = Ray4D::new(Tuple4D::point(0.0, 2.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    assert!(shapes.intersect(c, &miss).is_empty());

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = shapes.intersect(c, &r);

    assert_eq!(xs.len(), 2);
    assert_eq!((xs[0].t, xs[0].object), (4.0, s1));
    assert_eq!((xs[1].t, xs[1].object), (6.5, s2));
}

#[test]
fn difference_with_a_grouped_operand() {
    use crate::shape::Shape;
    use crate::tuple::Tuple4D;
    use crate::matrix::Matrix4D;

    // A cube with a sphere-shaped bite taken out of its front face. The bite
    // lives in a group, so operand membership must look through it.
    let mut shapes = ShapeArena::new();
    let cube = shapes.insert(Shape::cube()).unwrap();
    let bite = shapes.insert(Shape::group()).unwrap();
    let ball = shapes.insert_child(
        bite,
        Shape::sphere().with_transform(
            Matrix4D::translation(0.0, 0.0, -1.0) * Matrix4D::scaling(0.5, 0.5, 0.5)
        ),
    ).unwrap();
    let c = shapes.insert(Shape::csg(CsgOperation::Difference, cube, bite)).unwrap();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = shapes.intersect(c, &r);

    // Enters through the back of the bite, leaves through the back of the cube.
    assert_eq!(xs.len(), 2);
    assert_eq!((xs[0].t, xs[0].object), (4.5, ball));
    assert_eq!((xs[1].t, xs[1].object), (6.0, cube));
}

#[test]
fn closed_unbounded_cone_carves_like_an_open_one() {
    use std::f64::INFINITY;
    use crate::shape::Shape;
    use crate::tuple::Tuple4D;
    use crate::matrix::Matrix4D;

    let r = Ray4D::new(
        Tuple4D::point(1.0, 1.0, -5.0),
        Tuple4D::vector(-0.5, -1.0, 1.0).normalize(),
    );

    for cone in [Shape::capped_cone(-INFINITY, INFINITY), Shape::cone()].iter() {
        let mut shapes = ShapeArena::new();
        let block = shapes.insert(
            Shape::cube().with_transform(Matrix4D::scaling(3.0, 3.0, 3.0))
        ).unwrap();
        let hole = shapes.insert(cone.clone()).unwrap();
        let c = shapes.insert(Shape::csg(CsgOperation::Difference, block, hole)).unwrap();

        let xs = shapes.intersect(c, &r);
        assert_eq!(xs.len(), 2);
        assert!(crate::feq(xs[0].t, 3.0));
        assert_eq!(xs[0].object, block);
        assert!(crate::feq(xs[1].t, 4.55006));
        assert_eq!(xs[1].object, hole);
    }
}
