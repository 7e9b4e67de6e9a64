use log::debug;

use crate::bounds::BoundingBox;
use crate::shape::{ Shape, ShapeType };
use crate::arena::{ ShapeArena, ShapeId };
use crate::error::ShapeResult;

/// How a group's children fall relative to the two halves of its box.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partition {
    pub left: Vec<ShapeId>,
    pub right: Vec<ShapeId>,

    /// Children that straddle the split, or whose bounds are unbounded.
    pub rest: Vec<ShapeId>,
}

impl ShapeArena {
    /// Sorts a group's children by which half of the group's box they fit in.
    ///
    /// Unbounded children (planes, say) never fit a half. When the group box
    /// itself is unbounded, the split is taken over the finite children only.
    pub fn partition_children(&self, group: ShapeId) -> Partition {
        let children = self.children(group);
        let mut partition = Partition::default();

        let mut bounds = self.bounds(group);
        if !bounds.is_finite() {
            bounds = BoundingBox::empty();
            for child in children {
                let b = self.parent_space_bounds(*child);
                if b.is_finite() {
                    bounds.merge(&b);
                }
            }
        }

        if bounds.is_empty() {
            partition.rest = children.to_vec();
            return partition;
        }

        let (left, right) = bounds.split();
        for child in children {
            let b = self.parent_space_bounds(*child);
            if !b.is_finite() {
                partition.rest.push(*child);
            } else if left.contains_box(&b) {
                partition.left.push(*child);
            } else if right.contains_box(&b) {
                partition.right.push(*child);
            } else {
                partition.rest.push(*child);
            }
        }

        partition
    }

    /// Wraps `children` (which must be detached) in a new group under `group`.
    pub fn make_subgroup(&mut self, group: ShapeId, children: Vec<ShapeId>)
        -> ShapeResult<ShapeId> {
        let subgroup = self.insert(Shape::new(ShapeType::Group(children)))?;
        self.add_child(group, subgroup)?;
        Ok(subgroup)
    }

    /// Rebuilds the tree under `id` into a bounding volume hierarchy.
    ///
    /// Groups with more than `threshold` children are split in two along the
    /// longest axis of their box, recursively. Nested groups and CSG operands
    /// are visited too. Every primitive stays reachable exactly once.
    pub fn construct_bvh(&mut self, id: ShapeId, threshold: usize) -> ShapeResult<()> {
        let created = self.subdivide(id, threshold)?;
        debug!("bvh under {}: {} subgroups created", id, created);
        Ok(())
    }

    fn subdivide(&mut self, id: ShapeId, threshold: usize) -> ShapeResult<usize> {
        let mut created = 0;

        match self.get(id).ty {
            ShapeType::Group(_) => {
                let count = self.children(id).len();
                if count > threshold {
                    let Partition { left, right, rest } = self.partition_children(id);

                    // A split that moves everything to one side makes no
                    // progress, e.g. when all children share one degenerate box.
                    if left.len() < count && right.len() < count {
                        self.take_children(id);
                        for child in rest {
                            self.add_child(id, child)?;
                        }

                        for half in [left, right] {
                            if !half.is_empty() {
                                self.make_subgroup(id, half)?;
                                created += 1;
                            }
                        }
                    }
                }

                for child in self.children(id).to_vec() {
                    created += self.subdivide(child, threshold)?;
                }
            },

            ShapeType::Csg(_, left, right) => {
                created += self.subdivide(left, threshold)?;
                created += self.subdivide(right, threshold)?;
            },

            _ => (),
        }

        Ok(created)
    }
}

#[test]
fn partitioning_a_groups_children() {
    use crate::matrix::Matrix4D;

    let mut shapes = ShapeArena::new();
    let g = shapes.insert(Shape::group()).unwrap();
    let s1 = shapes.insert_child(g, Shape::sphere()
        .with_transform(Matrix4D::translation(-2.0, 0.0, 0.0))).unwrap();
    let s2 = shapes.insert_child(g, Shape::sphere()
        .with_transform(Matrix4D::translation(2.0, 0.0, 0.0))).unwrap();
    let s3 = shapes.insert_child(g, Shape::sphere()).unwrap();

    assert_eq!(shapes.partition_children(g), Partition {
        left: vec![s1],
        right: vec![s2],
        rest: vec![s3],
    });
}

#[test]
fn subdividing_a_group() {
    use crate::matrix::Matrix4D;

    let mut shapes = ShapeArena::new();
    let g = shapes.insert(Shape::group()).unwrap();
    let s1 = shapes.insert_child(g, Shape::sphere()
        .with_transform(Matrix4D::translation(-2.0, -2.0, 0.0))).unwrap();
    let s2 = shapes.insert_child(g, Shape::sphere()
        .with_transform(Matrix4D::translation(-2.0, 2.0, 0.0))).unwrap();
    let s3 = shapes.insert_child(g, Shape::sphere()
        .with_transform(Matrix4D::scaling(4.0, 4.0, 4.0))).unwrap();

    shapes.construct_bvh(g, 1).unwrap();

    let top = shapes.children(g).to_vec();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0], s3);

    let sub = shapes.children(top[1]).to_vec();
    assert_eq!(sub.len(), 2);
    assert_eq!(shapes.children(sub[0]), &[s1]);
    assert_eq!(shapes.children(sub[1]), &[s2]);
}

#[test]
fn groups_at_or_below_threshold_are_left_alone() {
    use crate::matrix::Matrix4D;

    let mut shapes = ShapeArena::new();
    let sub = shapes.insert(Shape::group()).unwrap();
    let s1 = shapes.insert_child(sub, Shape::sphere()
        .with_transform(Matrix4D::translation(-2.0, 0.0, 0.0))).unwrap();
    let s2 = shapes.insert_child(sub, Shape::sphere()
        .with_transform(Matrix4D::translation(2.0, 1.0, 0.0))).unwrap();
    let s3 = shapes.insert_child(sub, Shape::sphere()
        .with_transform(Matrix4D::translation(2.0, -1.0, 0.0))).unwrap();

    let g = shapes.insert(Shape::group()).unwrap();
    shapes.add_child(g, sub).unwrap();
    let s4 = shapes.insert_child(g, Shape::sphere()).unwrap();

    shapes.construct_bvh(g, 2).unwrap();

    assert_eq!(shapes.children(g), &[sub, s4]);

    let halves = shapes.children(sub).to_vec();
    assert_eq!(halves.len(), 2);
    assert_eq!(shapes.children(halves[0]), &[s1]);
    assert_eq!(shapes.children(halves[1]), &[s2, s3]);
}

#[test]
fn degenerate_boxes_do_not_recurse_forever() {
    use crate::tuple::Tuple4D;

    let mut shapes = ShapeArena::new();
    let g = shapes.insert(Shape::group()).unwrap();
    let p = Tuple4D::point(1.0, 1.0, 1.0);
    for _ in 0..3 {
        shapes.insert_child(g, Shape::triangle(p, p, p)).unwrap();
    }

    let before = shapes.children(g).to_vec();
    shapes.construct_bvh(g, 1).unwrap();

    assert_eq!(shapes.children(g), before.as_slice());
}

#[test]
fn unbounded_children_stay_at_their_level() {
    use crate::matrix::Matrix4D;

    let mut shapes = ShapeArena::new();
    let g = shapes.insert(Shape::group()).unwrap();
    let floor = shapes.insert_child(g, Shape::plane()).unwrap();
    let s1 = shapes.insert_child(g, Shape::sphere()
        .with_transform(Matrix4D::translation(-2.0, 0.0, 0.0))).unwrap();
    let s2 = shapes.insert_child(g, Shape::sphere()
        .with_transform(Matrix4D::translation(2.0, 0.0, 0.0))).unwrap();

    shapes.construct_bvh(g, 1).unwrap();

    let top = shapes.children(g).to_vec();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0], floor);
    assert_eq!(shapes.children(top[1]), &[s1]);
    assert_eq!(shapes.children(top[2]), &[s2]);
}

#[test]
fn bvh_preserves_children_bounds_and_hits() {
    use crate::tuple::Tuple4D;
    use crate::matrix::Matrix4D;
    use crate::ray::Ray4D;

    let mut shapes = ShapeArena::new();
    let g = shapes.insert(Shape::group()).unwrap();
    let mut originals = Vec::new();
    for i in 0..6 {
        for j in 0..5 {
            let x = i as f64 * 3.0 - 7.5;
            let y = j as f64 * 2.5 - 5.0;
            let z = ((i * 7 + j * 3) % 5) as f64 - 2.0;
            let s = shapes.insert_child(g, Shape::sphere().with_transform(
                Matrix4D::translation(x, y, z) * Matrix4D::scaling(0.5, 0.5, 0.5)
            )).unwrap();
            originals.push(s);
        }
    }

    let rays: Vec<Ray4D> = (0..20).map(|k| {
        let k = k as f64;
        Ray4D::new(
            Tuple4D::point(-9.0 + k * 0.9, -6.0 + k * 0.6, -20.0),
            Tuple4D::vector(0.05 * k - 0.4, 0.02 * k, 1.0).normalize(),
        )
    }).collect();
    let before: Vec<Vec<(f64, ShapeId)>> = rays.iter()
        .map(|r| shapes.intersect(g, r).iter().map(|i| (i.t, i.object)).collect())
        .collect();

    shapes.construct_bvh(g, 1).unwrap();

    // No loss, no duplication.
    let mut leaves = shapes.primitives(g);
    leaves.sort();
    originals.sort();
    assert_eq!(leaves, originals);

    // Every group's box contains each child's box.
    let mut stack = vec![g];
    while let Some(node) = stack.pop() {
        let outer = shapes.bounds(node);
        for child in shapes.children(node) {
            assert!(outer.contains_box(&shapes.parent_space_bounds(*child)));
            assert_eq!(shapes.parent(*child), Some(node));
            stack.push(*child);
        }
    }

    // Same hits as the flat group, up to the order of equal offsets.
    for (r, expected) in rays.iter().zip(before.iter()) {
        let mut hits: Vec<(f64, ShapeId)> = shapes.intersect(g, r)
            .iter().map(|i| (i.t, i.object)).collect();
        let mut expected = expected.clone();
        hits.sort_by(|a, b| a.partial_cmp(b).unwrap());
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(hits, expected);
    }
}
