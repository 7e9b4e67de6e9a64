use std::time::Instant;

use log::{ info, warn };
use rand::RngCore;

use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::world::World;
use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::parallel;
use crate::error::{ ShapeError, ShapeResult };

/// A camera record for generating a canvas.
///
/// This record gives a "frame" of the world. Based on camera parameters,
/// different perspectives can be produced. The canvas sits one unit in front
/// of the eye.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// The horizontal size of the resultant canvas.
    pub hsize: usize,

    /// The vertical size of the resultant canvas.
    pub vsize: usize,

    pub half_width: f64,
    pub half_height: f64,
    pub pixel_size: f64,

    /// The angle describing "how much" the camera can see.
    pub field_of_view: f64,

    /// How the world is oriented relative to the camera (typically a view
    /// transformation).
    transform: Matrix4D,
    inverse: Matrix4D,
}

impl Camera {
    /// Creates a camera at the origin looking down negative z.
    ///
    /// # Panics
    ///
    /// Panics if either image dimension is zero.
    pub fn new(hsize: usize, vsize: usize, field_of_view: f64) -> Camera {
        assert!(hsize > 0 && vsize > 0, "camera image {}x{} is empty", hsize, vsize);

        let half_view = (field_of_view / 2.0).tan();
        let aspect = (hsize as f64) / (vsize as f64);

        let (half_width, half_height) = if aspect >= 1.0 {
            (half_view, half_view / aspect)
        } else {
            (half_view * aspect, half_view)
        };

        Camera {
            hsize,
            vsize,
            half_width,
            half_height,
            pixel_size: half_width * 2.0 / (hsize as f64),
            field_of_view,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
        }
    }

    /// Replaces the view transform. It must be invertible.
    pub fn with_transform(mut self, transform: Matrix4D) -> ShapeResult<Camera> {
        self.inverse = transform.inverse()
            .ok_or(ShapeError::NonInvertibleTransform)?;
        self.transform = transform;
        Ok(self)
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// The ray from the eye through the center of pixel `(px, py)`.
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Ray4D {
        // Offsets from the edge of the canvas to the pixel's center
        let xoffset = (px as f64 + 0.5) * self.pixel_size;
        let yoffset = (py as f64 + 0.5) * self.pixel_size;

        // The untransformed coordinates of the pixel in world space
        let world_x = self.half_width - xoffset;
        let world_y = self.half_height - yoffset;

        let pixel = self.inverse * Tuple4D::point(world_x, world_y, -1.0);
        let origin = self.inverse * Tuple4D::origin();
        let direction = (pixel - origin).normalize();

        Ray4D::new(origin, direction)
    }

    /// Renders column `x`, top to bottom.
    pub fn render_column(&self, world: &World, x: usize, config: &RenderConfig,
        rng: &mut dyn RngCore) -> Vec<Color> {
        (0..self.vsize)
            .map(|y| world.color_at(&self.ray_for_pixel(x, y), 0, config, rng))
            .collect()
    }

    /// Renders the whole image, on the rayon pool if `config.parallel` is set.
    ///
    /// Each column draws from its own generator, seeded from `config.seed`
    /// and the column index, so a seeded render is identical either way.
    pub fn render(&self, world: &World, config: &RenderConfig) -> Canvas {
        if world.light.is_none() {
            warn!("the world has no light; every pixel will be black");
        }

        info!("rendering {}x{} ({})", self.hsize, self.vsize,
            if config.parallel { "parallel" } else { "sequential" });
        let start = Instant::now();

        let columns = if config.parallel {
            parallel::render_columns(self, world, config)
        } else {
            (0..self.hsize)
                .map(|x| {
                    let mut rng = parallel::column_rng(config.seed, x);
                    self.render_column(world, x, config, &mut rng)
                })
                .collect()
        };

        info!("rendered in {:.2?}", start.elapsed());
        Canvas::from_columns(self.vsize, columns)
    }
}

#[test]
fn pixel_size_for_horizontal_and_vertical_canvases() {
    use std::f64::consts::PI;

    assert!(crate::feq(Camera::new(200, 125, PI / 2.0).pixel_size, 0.01));
    assert!(crate::feq(Camera::new(125, 200, PI / 2.0).pixel_size, 0.01));
}

#[test]
#[should_panic(expected = "is empty")]
fn zero_width_camera_is_rejected() {
    Camera::new(0, 10, std::f64::consts::PI / 2.0);
}

#[test]
fn ray_through_center() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn ray_through_corner() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(0, 0);

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.66519, 0.33259, -0.66851));
}

#[test]
fn ray_when_camera_transformed() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0)
        .with_transform(Matrix4D::rotation_y(std::f64::consts::PI / 4.0)
            * Matrix4D::translation(0.0, -2.0, 5.0))
        .unwrap();
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Tuple4D::point(0.0, 2.0, -5.0));
    assert_eq!(r.direction,
        Tuple4D::vector(2.0f64.sqrt() / 2.0, 0.0, -(2.0f64.sqrt() / 2.0)));
}

#[test]
fn singular_camera_transform_is_rejected() {
    let c = Camera::new(10, 10, 1.0).with_transform(Matrix4D::scaling(1.0, 0.0, 1.0));
    assert_eq!(c, Err(ShapeError::NonInvertibleTransform));
}

#[test]
fn render_world_with_camera() {
    let w = World::new();
    let from = Tuple4D::point(0.0, 0.0, -5.0);
    let to = Tuple4D::point(0.0, 0.0, 0.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    let c = Camera::new(11, 11, std::f64::consts::PI / 2.0)
        .with_transform(Matrix4D::view_transform(from, to, up))
        .unwrap();

    for parallel in [false, true].iter() {
        let config = RenderConfig { parallel: *parallel, ..Default::default() };
        let image = c.render(&w, &config);

        assert_eq!(image.width, 11);
        assert_eq!(image.height, 11);
        assert_eq!(image.read_pixel(5, 5).unwrap(),
            Color::rgb(0.38066, 0.47583, 0.2855));
    }
}
