use std::fmt;
use std::sync::OnceLock;

use log::trace;

use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::matrix::Matrix4D;
use crate::material::Material;
use crate::bounds::BoundingBox;
use crate::shape::{ Shape, ShapeType };
use crate::intersect::{ Intersection, Intersections };
use crate::error::{ ShapeError, ShapeResult };

/// A handle to a shape stored in a `ShapeArena`.
///
/// Handles are only meaningful for the arena that issued them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub(crate) usize);

impl ShapeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct ShapeNode {
    shape: Shape,
    inverse: Matrix4D,
    parent: Option<ShapeId>,

    /// Local-space bounds, filled on first use and cleared whenever the
    /// subtree below this node changes.
    bounds: OnceLock<BoundingBox>,
}

/// Owns every shape in a scene and the tree structure between them.
///
/// Children refer to their parent by handle, so a shape can walk up to the
/// root when converting points and normals between spaces. Shapes attached
/// with `add_root` are the top level of the scene; every other shape is
/// reachable through exactly one group or CSG node.
#[derive(Debug, Default)]
pub struct ShapeArena {
    nodes: Vec<ShapeNode>,
    roots: Vec<ShapeId>,
}

impl ShapeArena {
    pub fn new() -> ShapeArena {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Stores a shape and returns its handle.
    ///
    /// Groups and CSG nodes may already name their children; those children
    /// must exist and be unattached, and become parented to the new shape.
    pub fn insert(&mut self, shape: Shape) -> ShapeResult<ShapeId> {
        let inverse = shape.transform.inverse()
            .ok_or(ShapeError::NonInvertibleTransform)?;

        let id = ShapeId(self.nodes.len());
        let children = shape.children();
        for (n, child) in children.iter().enumerate() {
            self.check_detached(*child)?;
            if children[..n].contains(child) {
                return Err(ShapeError::DuplicateChild { group: id, child: *child });
            }
        }

        self.nodes.push(ShapeNode {
            shape,
            inverse,
            parent: None,
            bounds: OnceLock::new(),
        });

        for child in children {
            self.nodes[child.0].parent = Some(id);
        }

        Ok(id)
    }

    /// Makes a detached shape part of the top level of the scene.
    pub fn add_root(&mut self, id: ShapeId) -> ShapeResult<()> {
        self.check_detached(id)?;
        self.roots.push(id);
        Ok(())
    }

    /// Inserts a shape and attaches it to the top level in one step.
    pub fn insert_root(&mut self, shape: Shape) -> ShapeResult<ShapeId> {
        let id = self.insert(shape)?;
        self.add_root(id)?;
        Ok(id)
    }

    pub fn roots(&self) -> &[ShapeId] {
        &self.roots
    }

    /// Attaches `child` to the end of `group`'s child list.
    pub fn add_child(&mut self, group: ShapeId, child: ShapeId) -> ShapeResult<()> {
        self.check_exists(group)?;
        self.check_exists(child)?;

        if !matches!(self.get(group).ty, ShapeType::Group(_)) {
            return Err(ShapeError::NotAGroup(group));
        }

        if self.parent(child) == Some(group) {
            return Err(ShapeError::DuplicateChild { group, child });
        }

        self.check_detached(child)?;

        // A detached shape is the top of its own tree. Attaching it below one
        // of its descendants would close a loop.
        if group == child || self.ancestors(group).any(|a| a == child) {
            return Err(ShapeError::Cycle { parent: group, child });
        }

        if let ShapeType::Group(ref mut children) = self.nodes[group.0].shape.ty {
            children.push(child);
        }

        self.nodes[child.0].parent = Some(group);
        self.invalidate_bounds(group);
        Ok(())
    }

    /// Inserts a shape and attaches it to `group` in one step.
    pub fn insert_child(&mut self, group: ShapeId, shape: Shape) -> ShapeResult<ShapeId> {
        let id = self.insert(shape)?;
        self.add_child(group, id)?;
        Ok(id)
    }

    /// Removes every child from a group, leaving them detached.
    pub(crate) fn take_children(&mut self, group: ShapeId) -> Vec<ShapeId> {
        let children = match self.nodes[group.0].shape.ty {
            ShapeType::Group(ref mut children) => std::mem::take(children),
            _ => return Vec::new(),
        };

        for child in children.iter() {
            self.nodes[child.0].parent = None;
        }

        self.invalidate_bounds(group);
        children
    }

    pub fn get(&self, id: ShapeId) -> &Shape {
        &self.nodes[id.0].shape
    }

    pub fn parent(&self, id: ShapeId) -> Option<ShapeId> {
        self.nodes[id.0].parent
    }

    /// The chain of parents above `id`, nearest first. Excludes `id`.
    pub fn ancestors(&self, id: ShapeId) -> impl Iterator<Item = ShapeId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    /// Direct children of a group, or an empty slice for anything else.
    pub fn children(&self, id: ShapeId) -> &[ShapeId] {
        match self.get(id).ty {
            ShapeType::Group(ref children) => children,
            _ => &[],
        }
    }

    pub fn transform(&self, id: ShapeId) -> &Matrix4D {
        &self.get(id).transform
    }

    pub fn inverse(&self, id: ShapeId) -> &Matrix4D {
        &self.nodes[id.0].inverse
    }

    pub fn set_transform(&mut self, id: ShapeId, transform: Matrix4D) -> ShapeResult<()> {
        self.check_exists(id)?;
        let inverse = transform.inverse()
            .ok_or(ShapeError::NonInvertibleTransform)?;

        let node = &mut self.nodes[id.0];
        node.shape.transform = transform;
        node.inverse = inverse;

        // Own local bounds are unchanged, but every ancestor's box moves.
        if let Some(parent) = node.parent {
            self.invalidate_bounds(parent);
        }

        Ok(())
    }

    pub fn material_mut(&mut self, id: ShapeId) -> &mut Material {
        &mut self.nodes[id.0].shape.material
    }

    pub fn set_casts_shadow(&mut self, id: ShapeId, casts_shadow: bool) {
        self.nodes[id.0].shape.casts_shadow = casts_shadow;
    }

    /// A shape occludes light only if it and all of its ancestors do.
    pub fn casts_shadow(&self, id: ShapeId) -> bool {
        self.get(id).casts_shadow
            && self.ancestors(id).all(|a| self.get(a).casts_shadow)
    }

    /// Whether `other` is `id` itself or lies anywhere below it.
    pub fn includes(&self, id: ShapeId, other: ShapeId) -> bool {
        id == other || self.ancestors(other).any(|a| a == id)
    }

    /// All primitives in the subtree rooted at `id`.
    pub fn primitives(&self, id: ShapeId) -> Vec<ShapeId> {
        let mut found = Vec::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            let shape = self.get(current);
            if shape.is_composite() {
                stack.extend(shape.children().into_iter().rev());
            } else {
                found.push(current);
            }
        }

        found
    }

    /// Intersects a world-space (or parent-space) ray with a shape.
    pub fn intersect(&self, id: ShapeId, ray: &Ray4D) -> Intersections {
        let local_ray = ray.transform(self.inverse(id));
        self.local_intersect(id, &local_ray)
    }

    /// Intersects a ray already in `id`'s object space.
    pub fn local_intersect(&self, id: ShapeId, ray: &Ray4D) -> Intersections {
        let shape = self.get(id);
        match shape.ty {
            ShapeType::Group(ref children) => {
                if children.is_empty() || !self.bounds(id).intersects(ray) {
                    return Intersections::new();
                }

                Intersections::aggregate(
                    children.iter().map(|c| self.intersect(*c, ray)).collect()
                )
            },

            ShapeType::Csg(operation, left, right)
                => self.intersect_csg(id, operation, left, right, ray),

            _ => shape.intersect_primitive(id, ray),
        }
    }

    /// Brings a world-space point into `id`'s object space, applying each
    /// ancestor's inverse transform from the outermost inwards.
    pub fn world_to_object(&self, id: ShapeId, point: Tuple4D) -> Tuple4D {
        let point = match self.parent(id) {
            Some(parent) => self.world_to_object(parent, point),
            None => point,
        };

        *self.inverse(id) * point
    }

    /// Takes an object-space normal out to world space, through the inverse
    /// transpose of each transform from `id` outwards.
    pub fn normal_to_world(&self, id: ShapeId, normal: Tuple4D) -> Tuple4D {
        let mut normal = self.inverse(id).transposition() * normal;
        normal.w = 0.0;
        let normal = normal.normalize();

        match self.parent(id) {
            Some(parent) => self.normal_to_world(parent, normal),
            None => normal,
        }
    }

    /// World-space surface normal of a primitive at a world-space point.
    pub fn normal_at(&self, id: ShapeId, world_point: Tuple4D,
        hit: &Intersection) -> Tuple4D {
        let local_point = self.world_to_object(id, world_point);
        let local_normal = self.get(id).local_normal_at(&local_point, hit);
        self.normal_to_world(id, local_normal)
    }

    /// Object-space bounds, cached after the first call.
    pub fn bounds(&self, id: ShapeId) -> BoundingBox {
        *self.nodes[id.0].bounds.get_or_init(|| {
            let shape = self.get(id);
            if !shape.is_composite() {
                return shape.primitive_bounds();
            }

            let mut bounds = BoundingBox::empty();
            for child in shape.children() {
                bounds.merge(&self.parent_space_bounds(child));
            }

            trace!("computed bounds for {}: {:?}", id, bounds);
            bounds
        })
    }

    /// Bounds of `id` in its parent's space.
    pub fn parent_space_bounds(&self, id: ShapeId) -> BoundingBox {
        self.bounds(id).transform(self.transform(id))
    }

    fn invalidate_bounds(&mut self, id: ShapeId) {
        let mut current = Some(id);
        while let Some(c) = current {
            self.nodes[c.0].bounds = OnceLock::new();
            current = self.nodes[c.0].parent;
        }
    }

    fn check_exists(&self, id: ShapeId) -> ShapeResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(ShapeError::UnknownShape(id))
        }
    }

    fn check_detached(&self, id: ShapeId) -> ShapeResult<()> {
        self.check_exists(id)?;
        if self.parent(id).is_some() || self.roots.contains(&id) {
            Err(ShapeError::AlreadyParented(id))
        } else {
            Ok(())
        }
    }
}

#[test]
fn intersecting_transformed_shapes() {
    let mut shapes = ShapeArena::new();
    let scaled = shapes.insert(
        Shape::sphere().with_transform(Matrix4D::scaling(2.0, 2.0, 2.0))
    ).unwrap();
    let moved = shapes.insert(
        Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0))
    ).unwrap();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let xs = shapes.intersect(scaled, &r);
    assert_eq!(xs.len(), 2);
    assert_eq!(xs[0].t, 3.0);
    assert_eq!(xs[1].t, 7.0);

    assert!(shapes.intersect(moved, &r).is_empty());
}

#[test]
fn normals_on_transformed_spheres() {
    use std::f64::consts::PI;

    let mut shapes = ShapeArena::new();
    let moved = shapes.insert(
        Shape::sphere().with_transform(Matrix4D::translation(0.0, 1.0, 0.0))
    ).unwrap();
    let squashed = shapes.insert(
        Shape::sphere().with_transform(
            Matrix4D::scaling(1.0, 0.5, 1.0) * Matrix4D::rotation_z(PI / 5.0)
        )
    ).unwrap();

    let n = shapes.normal_at(
        moved,
        Tuple4D::point(0.0, 1.70711, -0.70711),
        &Intersection::new(0.0, moved),
    );
    assert_eq!(n, Tuple4D::vector(0.0, 0.70711, -0.70711));

    let half = 2.0f64.sqrt() / 2.0;
    let n = shapes.normal_at(
        squashed,
        Tuple4D::point(0.0, half, -half),
        &Intersection::new(0.0, squashed),
    );
    assert_eq!(n, Tuple4D::vector(0.0, 0.97014, -0.24254));
    assert!(crate::feq(n.magnitude(), 1.0));
}

#[test]
fn intersecting_groups() {
    let mut shapes = ShapeArena::new();
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let empty = shapes.insert(Shape::group()).unwrap();
    assert!(shapes.intersect(empty, &r).is_empty());

    let g = shapes.insert(Shape::group()).unwrap();
    let s1 = shapes.insert_child(g, Shape::sphere()).unwrap();
    let s2 = shapes.insert_child(
        g,
        Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, -3.0)),
    ).unwrap();
    shapes.insert_child(
        g,
        Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0)),
    ).unwrap();

    let xs = shapes.intersect(g, &r);
    let hit_objects: Vec<ShapeId> = xs.iter().map(|i| i.object).collect();
    assert_eq!(hit_objects, vec![s2, s2, s1, s1]);
}

#[test]
fn intersecting_a_transformed_group() {
    let mut shapes = ShapeArena::new();
    let g = shapes.insert(
        Shape::group().with_transform(Matrix4D::scaling(2.0, 2.0, 2.0))
    ).unwrap();
    shapes.insert_child(
        g,
        Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0)),
    ).unwrap();

    let r = Ray4D::new(Tuple4D::point(10.0, 0.0, -10.0), Tuple4D::vector(0.0, 0.0, 1.0));
    assert_eq!(shapes.intersect(g, &r).len(), 2);
}

#[test]
fn converting_through_nested_groups() {
    use std::f64::consts::PI;

    let mut shapes = ShapeArena::new();
    let g1 = shapes.insert(
        Shape::group().with_transform(Matrix4D::rotation_y(PI / 2.0))
    ).unwrap();
    let g2 = shapes.insert_child(
        g1,
        Shape::group().with_transform(Matrix4D::scaling(2.0, 2.0, 2.0)),
    ).unwrap();
    let s = shapes.insert_child(
        g2,
        Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0)),
    ).unwrap();

    assert_eq!(
        shapes.world_to_object(s, Tuple4D::point(-2.0, 0.0, -10.0)),
        Tuple4D::point(0.0, 0.0, -1.0)
    );
}

#[test]
fn normals_through_nested_groups() {
    use std::f64::consts::PI;

    let mut shapes = ShapeArena::new();
    let g1 = shapes.insert(
        Shape::group().with_transform(Matrix4D::rotation_y(PI / 2.0))
    ).unwrap();
    let g2 = shapes.insert_child(
        g1,
        Shape::group().with_transform(Matrix4D::scaling(1.0, 2.0, 3.0)),
    ).unwrap();
    let s = shapes.insert_child(
        g2,
        Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0)),
    ).unwrap();

    let third = 3.0f64.sqrt() / 3.0;
    assert_eq!(
        shapes.normal_to_world(s, Tuple4D::vector(third, third, third)),
        Tuple4D::vector(0.28571, 0.42857, -0.85714)
    );

    assert_eq!(
        shapes.normal_at(
            s,
            Tuple4D::point(1.7321, 1.1547, -5.5774),
            &Intersection::new(0.0, s),
        ),
        Tuple4D::vector(0.28570, 0.42854, -0.85716)
    );
}

#[test]
fn group_bounds_cover_transformed_children() {
    let mut shapes = ShapeArena::new();
    let g = shapes.insert(Shape::group()).unwrap();
    shapes.insert_child(
        g,
        Shape::sphere().with_transform(
            Matrix4D::translation(2.0, 5.0, -3.0) * Matrix4D::scaling(2.0, 2.0, 2.0)
        ),
    ).unwrap();
    let cyl = shapes.insert_child(
        g,
        Shape::bounded_cylinder(-2.0, 2.0).with_transform(
            Matrix4D::translation(-4.0, -1.0, 4.0) * Matrix4D::scaling(0.5, 1.0, 0.5)
        ),
    ).unwrap();

    let b = shapes.bounds(g);
    assert_eq!(b.minimum, Tuple4D::point(-4.5, -3.0, -5.0));
    assert_eq!(b.maximum, Tuple4D::point(4.0, 7.0, 4.5));

    // Moving a child refreshes the cached group box.
    shapes.set_transform(cyl, Matrix4D::translation(-10.0, 0.0, 0.0)).unwrap();
    assert_eq!(shapes.bounds(g).minimum, Tuple4D::point(-11.0, -2.0, -5.0));
}

#[test]
fn csg_bounds_cover_both_operands() {
    use crate::csg::CsgOperation;

    let mut shapes = ShapeArena::new();
    let left = shapes.insert(Shape::sphere()).unwrap();
    let right = shapes.insert(
        Shape::sphere().with_transform(Matrix4D::translation(2.0, 3.0, 4.0))
    ).unwrap();
    let c = shapes.insert(Shape::csg(CsgOperation::Difference, left, right)).unwrap();

    let b = shapes.bounds(c);
    assert_eq!(b.minimum, Tuple4D::point(-1.0, -1.0, -1.0));
    assert_eq!(b.maximum, Tuple4D::point(3.0, 4.0, 5.0));
    assert_eq!(shapes.parent(left), Some(c));
    assert_eq!(shapes.parent(right), Some(c));
}

#[test]
fn structural_violations_are_rejected() {
    let mut shapes = ShapeArena::new();
    let g1 = shapes.insert(Shape::group()).unwrap();
    let g2 = shapes.insert(Shape::group()).unwrap();
    let s = shapes.insert(Shape::sphere()).unwrap();

    shapes.add_child(g1, s).unwrap();
    assert_eq!(
        shapes.add_child(g1, s),
        Err(ShapeError::DuplicateChild { group: g1, child: s })
    );
    assert_eq!(shapes.add_child(g2, s), Err(ShapeError::AlreadyParented(s)));

    let lone = shapes.insert(Shape::cube()).unwrap();
    assert_eq!(shapes.add_child(s, lone), Err(ShapeError::NotAGroup(s)));

    // g1 is detached, so attaching it below its own subtree is a cycle.
    let inner = shapes.insert_child(g1, Shape::group()).unwrap();
    assert_eq!(
        shapes.add_child(inner, g1),
        Err(ShapeError::Cycle { parent: inner, child: g1 })
    );
    assert_eq!(
        shapes.add_child(g1, g1),
        Err(ShapeError::Cycle { parent: g1, child: g1 })
    );

    shapes.add_root(g2).unwrap();
    assert_eq!(shapes.add_root(g2), Err(ShapeError::AlreadyParented(g2)));
    assert_eq!(shapes.add_child(g1, g2), Err(ShapeError::AlreadyParented(g2)));

    assert_eq!(
        shapes.add_child(g1, ShapeId(99)),
        Err(ShapeError::UnknownShape(ShapeId(99)))
    );
    assert_eq!(
        shapes.insert(Shape::sphere().with_transform(Matrix4D::scaling(0.0, 1.0, 1.0))),
        Err(ShapeError::NonInvertibleTransform)
    );
    assert_eq!(
        shapes.set_transform(lone, Matrix4D::scaling(1.0, 0.0, 1.0)),
        Err(ShapeError::NonInvertibleTransform)
    );
}

#[test]
fn csg_operands_must_be_distinct_and_detached() {
    use crate::csg::CsgOperation;

    let mut shapes = ShapeArena::new();
    let a = shapes.insert(Shape::sphere()).unwrap();
    let b = shapes.insert(Shape::cube()).unwrap();

    assert!(matches!(
        shapes.insert(Shape::csg(CsgOperation::Union, a, a)),
        Err(ShapeError::DuplicateChild { child, .. }) if child == a
    ));

    shapes.insert(Shape::csg(CsgOperation::Union, a, b)).unwrap();
    let c = shapes.insert(Shape::cube()).unwrap();
    assert_eq!(
        shapes.insert(Shape::csg(CsgOperation::Intersect, b, c)),
        Err(ShapeError::AlreadyParented(b))
    );
}

#[test]
fn includes_and_shadow_inheritance() {
    let mut shapes = ShapeArena::new();
    let outer = shapes.insert(Shape::group()).unwrap();
    let inner = shapes.insert_child(outer, Shape::group()).unwrap();
    let s = shapes.insert_child(inner, Shape::sphere()).unwrap();
    let other = shapes.insert(Shape::sphere()).unwrap();

    assert!(shapes.includes(outer, s));
    assert!(shapes.includes(s, s));
    assert!(!shapes.includes(s, outer));
    assert!(!shapes.includes(outer, other));

    assert!(shapes.casts_shadow(s));
    shapes.set_casts_shadow(outer, false);
    assert!(!shapes.casts_shadow(s));
    assert!(!shapes.casts_shadow(inner));
    assert!(shapes.casts_shadow(other));

    assert_eq!(shapes.primitives(outer), vec![s]);
    assert_eq!(shapes.ancestors(s).collect::<Vec<_>>(), vec![inner, outer]);
}
