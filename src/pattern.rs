use serde::Deserialize;

use crate::feq;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::arena::{ ShapeArena, ShapeId };
use crate::error::{ ShapeError, ShapeResult };

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Alternates `a` and `b` on `floor(x)`.
    Stripe,

    /// Blends linearly from `a` to `b` across each unit of `x`.
    Gradient,

    /// Concentric rings in the xz plane.
    Ring,

    /// A 3D checkerboard of unit cubes.
    Checker,
}

/// A procedural two-color pattern with its own transform.
///
/// Patterns are evaluated in pattern space: a world point is first brought
/// into the object's space, then through the inverse of the pattern
/// transform.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pattern {
    pub ty: PatternType,
    pub a: Color,
    pub b: Color,

    transform: Matrix4D,
    inverse: Matrix4D,
}

impl Pattern {
    pub fn new(ty: PatternType, a: Color, b: Color) -> Pattern {
        Pattern {
            ty,
            a,
            b,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
        }
    }

    pub fn stripe(a: Color, b: Color) -> Pattern {
        Pattern::new(PatternType::Stripe, a, b)
    }

    pub fn gradient(a: Color, b: Color) -> Pattern {
        Pattern::new(PatternType::Gradient, a, b)
    }

    pub fn ring(a: Color, b: Color) -> Pattern {
        Pattern::new(PatternType::Ring, a, b)
    }

    pub fn checker(a: Color, b: Color) -> Pattern {
        Pattern::new(PatternType::Checker, a, b)
    }

    /// Replaces the pattern transform. Singular matrices are rejected.
    pub fn with_transform(mut self, transform: Matrix4D) -> ShapeResult<Pattern> {
        self.inverse = transform.inverse()
            .ok_or(ShapeError::NonInvertibleTransform)?;
        self.transform = transform;
        Ok(self)
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Color at a point already in pattern space.
    pub fn pattern_at(&self, p: Tuple4D) -> Color {
        match self.ty {
            PatternType::Stripe => {
                if is_even(p.x.floor()) { self.a } else { self.b }
            },

            PatternType::Gradient => {
                let fraction = p.x - p.x.floor();
                self.a + (self.b - self.a) * fraction
            },

            PatternType::Ring => {
                let distance = (p.x.powi(2) + p.z.powi(2)).sqrt();
                if is_even(distance.floor()) { self.a } else { self.b }
            },

            PatternType::Checker => {
                let sum = p.x.floor() + p.y.floor() + p.z.floor();
                if is_even(sum) { self.a } else { self.b }
            },
        }
    }

    /// Color at a world-space point on `object`.
    pub fn pattern_at_shape(&self, shapes: &ShapeArena, object: ShapeId,
        world_point: Tuple4D) -> Color {
        let object_point = shapes.world_to_object(object, world_point);
        self.pattern_at(self.inverse * object_point)
    }
}

fn is_even(n: f64) -> bool {
    feq(n.rem_euclid(2.0), 0.0)
}

#[test]
fn stripes_alternate_along_x_only() {
    let pattern = Pattern::stripe(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at(Tuple4D::point(0.0, 1.0, 2.0)), Color::white());
    assert_eq!(pattern.pattern_at(Tuple4D::point(0.9, 0.0, 0.0)), Color::white());
    assert_eq!(pattern.pattern_at(Tuple4D::point(1.0, 0.0, 0.0)), Color::black());
    assert_eq!(pattern.pattern_at(Tuple4D::point(-0.1, 0.0, 0.0)), Color::black());
    assert_eq!(pattern.pattern_at(Tuple4D::point(-1.1, 0.0, 0.0)), Color::white());
}

#[test]
fn gradient_interpolates_between_colors() {
    let pattern = Pattern::gradient(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at(Tuple4D::origin()), Color::white());
    assert_eq!(
        pattern.pattern_at(Tuple4D::point(0.25, 0.0, 0.0)),
        Color::rgb(0.75, 0.75, 0.75)
    );
    assert_eq!(
        pattern.pattern_at(Tuple4D::point(0.75, 0.0, 0.0)),
        Color::rgb(0.25, 0.25, 0.25)
    );
}

#[test]
fn rings_extend_in_x_and_z() {
    let pattern = Pattern::ring(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at(Tuple4D::origin()), Color::white());
    assert_eq!(pattern.pattern_at(Tuple4D::point(1.0, 0.0, 0.0)), Color::black());
    assert_eq!(pattern.pattern_at(Tuple4D::point(0.0, 0.0, 1.0)), Color::black());
    assert_eq!(pattern.pattern_at(Tuple4D::point(0.708, 0.0, 0.708)), Color::black());
}

#[test]
fn checkers_repeat_in_every_dimension() {
    let pattern = Pattern::checker(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at(Tuple4D::point(0.99, 0.0, 0.0)), Color::white());
    assert_eq!(pattern.pattern_at(Tuple4D::point(1.01, 0.0, 0.0)), Color::black());
    assert_eq!(pattern.pattern_at(Tuple4D::point(0.0, 1.01, 0.0)), Color::black());
    assert_eq!(pattern.pattern_at(Tuple4D::point(0.0, 0.0, 1.01)), Color::black());
}

#[test]
fn pattern_follows_object_and_pattern_transforms() {
    use crate::shape::Shape;

    let mut shapes = ShapeArena::new();
    let mut sphere = Shape::sphere();
    sphere.transform = Matrix4D::scaling(2.0, 2.0, 2.0);
    let id = shapes.insert(sphere).unwrap();

    let plain = Pattern::stripe(Color::white(), Color::black());
    assert_eq!(
        plain.pattern_at_shape(&shapes, id, Tuple4D::point(1.5, 0.0, 0.0)),
        Color::white()
    );

    let shifted = plain
        .with_transform(Matrix4D::translation(0.5, 0.0, 0.0))
        .unwrap();
    assert_eq!(
        shifted.pattern_at_shape(&shapes, id, Tuple4D::point(2.5, 0.0, 0.0)),
        Color::white()
    );
}

#[test]
fn singular_pattern_transform_is_rejected() {
    let pattern = Pattern::stripe(Color::white(), Color::black());
    let result = pattern.with_transform(Matrix4D::scaling(0.0, 1.0, 1.0));

    assert_eq!(result, Err(ShapeError::NonInvertibleTransform));
}
