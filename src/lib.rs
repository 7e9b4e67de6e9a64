pub mod consts;
pub mod error;

pub mod tuple;
pub mod matrix;
pub mod ray;
pub mod color;
pub mod bounds;

pub mod shape;
pub mod arena;
pub mod csg;
pub mod bvh;
pub mod intersect;

pub mod material;
pub mod pattern;
pub mod light;

pub mod config;
pub mod world;
pub mod camera;
pub mod parallel;
pub mod canvas;

pub mod obj;
pub mod scene;

use consts::EPSILON;

/// Compares two floats within `EPSILON`. Equal infinities compare equal.
pub fn feq(left: f64, right: f64) -> bool {
    left == right || (left - right).abs() < EPSILON
}
