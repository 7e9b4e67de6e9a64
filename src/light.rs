use rand::{ Rng, RngCore };

use crate::color::Color;
use crate::tuple::Tuple4D;
use crate::arena::{ ShapeArena, ShapeId };

/// A point light.
///
/// A very simple light source. Provides a color and a position where light is
/// produced from.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PointLight {
    pub intensity: Color,
    pub position: Tuple4D,
}

impl PointLight {
    /// Creates a point light.
    ///
    /// If `position` isn't a point, it is converted to a point automatically.
    pub fn new(intensity: Color, mut position: Tuple4D) -> PointLight {
        if !position.is_point() {
            position.w = 1.0;
        }

        PointLight { intensity, position }
    }
}

/// A rectangular light made of `usteps` by `vsteps` cells.
///
/// Shading averages over the cell centers. Shadow tests pick a random point
/// inside each cell, which is what softens the shadow edges.
#[derive(Clone, Debug, PartialEq)]
pub struct AreaLight {
    pub corner: Tuple4D,

    /// One cell's edge along the first side.
    pub uvec: Tuple4D,
    pub usteps: usize,

    /// One cell's edge along the second side.
    pub vvec: Tuple4D,
    pub vsteps: usize,

    pub intensity: Color,

    /// The middle of the rectangle.
    pub position: Tuple4D,

    samples: Vec<Tuple4D>,
}

impl AreaLight {
    /// Creates an area light spanning `full_uvec` by `full_vvec` from `corner`.
    ///
    /// Step counts below one are treated as one.
    pub fn new(corner: Tuple4D, full_uvec: Tuple4D, usteps: usize,
        full_vvec: Tuple4D, vsteps: usize, intensity: Color) -> AreaLight {
        let usteps = usteps.max(1);
        let vsteps = vsteps.max(1);

        let mut light = AreaLight {
            corner: Tuple4D::point(corner.x, corner.y, corner.z),
            uvec: full_uvec / usteps as f64,
            usteps,
            vvec: full_vvec / vsteps as f64,
            vsteps,
            intensity,
            position: Tuple4D::point(corner.x, corner.y, corner.z)
                + full_uvec * 0.5 + full_vvec * 0.5,
            samples: Vec::with_capacity(usteps * vsteps),
        };

        for v in 0..vsteps {
            for u in 0..usteps {
                let center = light.point_on_light(u, v, 0.5, 0.5);
                light.samples.push(center);
            }
        }

        light
    }

    /// A point in cell `(u, v)`, offset by `ju` and `jv` (each in `[0, 1)`)
    /// from the cell's corner.
    pub fn point_on_light(&self, u: usize, v: usize, ju: f64, jv: f64) -> Tuple4D {
        self.corner
            + self.uvec * (u as f64 + ju)
            + self.vvec * (v as f64 + jv)
    }

    /// A random point in each cell, in row order.
    pub fn jittered_samples(&self, rng: &mut dyn RngCore) -> Vec<Tuple4D> {
        let mut points = Vec::with_capacity(self.usteps * self.vsteps);
        for v in 0..self.vsteps {
            for u in 0..self.usteps {
                let ju: f64 = rng.gen();
                let jv: f64 = rng.gen();
                points.push(self.point_on_light(u, v, ju, jv));
            }
        }

        points
    }

    /// The cell centers.
    pub fn samples(&self) -> &[Tuple4D] {
        &self.samples
    }
}

/// Any light a world can hold.
#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Point(PointLight),
    Area(AreaLight),
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Light {
        Light::Point(light)
    }
}

impl From<AreaLight> for Light {
    fn from(light: AreaLight) -> Light {
        Light::Area(light)
    }
}

impl Light {
    pub fn intensity(&self) -> Color {
        match self {
            Light::Point(p) => p.intensity,
            Light::Area(a) => a.intensity,
        }
    }

    /// The light's position, or its middle for an area light.
    pub fn position(&self) -> Tuple4D {
        match self {
            Light::Point(p) => p.position,
            Light::Area(a) => a.position,
        }
    }

    /// Points that diffuse and specular terms are averaged over.
    pub fn samples(&self) -> &[Tuple4D] {
        match self {
            Light::Point(p) => std::slice::from_ref(&p.position),
            Light::Area(a) => a.samples(),
        }
    }

    /// Points to cast shadow rays towards. Only area lights draw from `rng`.
    pub fn shadow_samples(&self, rng: &mut dyn RngCore) -> Vec<Tuple4D> {
        match self {
            Light::Point(p) => vec![p.position],
            Light::Area(a) => a.jittered_samples(rng),
        }
    }
}

/// Phong shading of `object` at `point`, lit by `light`.
///
/// `shadow` is the fraction of the light that is blocked, from 0 (fully lit)
/// to 1 (fully shadowed). Ambient light is never blocked. Diffuse and
/// specular terms are averaged over every light sample.
pub fn lighting(shapes: &ShapeArena, object: ShapeId, light: &Light,
    point: Tuple4D, eyev: Tuple4D, normalv: Tuple4D, shadow: f64) -> Color {
    let m = shapes.get(object).material;

    // If the material has some pattern, use that for color
    let color = match m.pattern {
        Some(pattern) => pattern.pattern_at_shape(shapes, object, point),
        None => m.color,
    };

    let intensity = light.intensity();
    let effective_color = color * intensity;
    let ambient = effective_color * m.ambient;

    let samples = light.samples();
    let mut sum = Color::black();

    for sample in samples {
        let lightv = (*sample - point).normalize();

        // The far side of the surface gets only ambient light
        let light_dot_normal = lightv.dot(&normalv);
        if light_dot_normal < 0.0 {
            continue;
        }

        sum += effective_color * m.diffuse * light_dot_normal;

        let reflectv = (-lightv).reflect(&normalv);
        let reflect_dot_eye = reflectv.dot(&eyev);
        if reflect_dot_eye > 0.0 {
            let factor = reflect_dot_eye.powf(m.shininess);
            sum += intensity * m.specular * factor;
        }
    }

    ambient + sum / samples.len() as f64 * (1.0 - shadow)
}

#[cfg(test)]
fn lit_sphere(material: crate::material::Material) -> (ShapeArena, ShapeId) {
    use crate::shape::Shape;

    let mut shapes = ShapeArena::new();
    let s = shapes.insert(Shape::sphere().with_material(material)).unwrap();
    (shapes, s)
}

#[test]
fn eye_between_light_and_surface() {
    let (shapes, s) = lit_sphere(Default::default());
    let light = Light::from(PointLight::new(
        Color::rgb(1.0, 1.0, 1.0),
        Tuple4D::point(0.0, 0.0, -10.0),
    ));

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = lighting(&shapes, s, &light, Tuple4D::origin(), eyev, normalv, 0.0);
    assert_eq!(res, Color::rgb(1.9, 1.9, 1.9));
}

#[test]
fn eye_between_light_and_surface_offset_45() {
    let (shapes, s) = lit_sphere(Default::default());
    let light = Light::from(PointLight::new(
        Color::rgb(1.0, 1.0, 1.0),
        Tuple4D::point(0.0, 0.0, -10.0),
    ));

    let half = 2.0f64.sqrt() / 2.0;
    let eyev = Tuple4D::vector(0.0, half, half);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = lighting(&shapes, s, &light, Tuple4D::origin(), eyev, normalv, 0.0);
    assert_eq!(res, Color::rgb(1.0, 1.0, 1.0));
}

#[test]
fn eye_opposite_from_surface_offset_45() {
    let (shapes, s) = lit_sphere(Default::default());
    let light = Light::from(PointLight::new(
        Color::rgb(1.0, 1.0, 1.0),
        Tuple4D::point(0.0, 10.0, -10.0),
    ));

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = lighting(&shapes, s, &light, Tuple4D::origin(), eyev, normalv, 0.0);
    assert_eq!(res, Color::rgb(0.7364, 0.7364, 0.7364));
}

#[test]
fn eye_opposite_from_surface_in_reflection() {
    let (shapes, s) = lit_sphere(Default::default());
    let light = Light::from(PointLight::new(
        Color::rgb(1.0, 1.0, 1.0),
        Tuple4D::point(0.0, 10.0, -10.0),
    ));

    let half = 2.0f64.sqrt() / 2.0;
    let eyev = Tuple4D::vector(0.0, -half, -half);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = lighting(&shapes, s, &light, Tuple4D::origin(), eyev, normalv, 0.0);
    assert_eq!(res, Color::rgb(1.6364, 1.6364, 1.6364));
}

#[test]
fn eye_across_surface_from_light() {
    let (shapes, s) = lit_sphere(Default::default());
    let light = Light::from(PointLight::new(
        Color::rgb(1.0, 1.0, 1.0),
        Tuple4D::point(0.0, 0.0, 10.0),
    ));

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = lighting(&shapes, s, &light, Tuple4D::origin(), eyev, normalv, 0.0);
    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn shadow_fraction_attenuates_diffuse_and_specular() {
    use crate::material::Material;

    let (shapes, s) = lit_sphere(Material {
        ambient: 0.1,
        diffuse: 0.9,
        specular: 0.0,
        ..Default::default()
    });
    let light = Light::from(PointLight::new(
        Color::white(), Tuple4D::point(0.0, 0.0, -10.0)
    ));

    let point = Tuple4D::point(0.0, 0.0, -1.0);
    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let expected = [(0.0, 1.0), (0.5, 0.55), (1.0, 0.1)];
    for (shadow, value) in expected.iter() {
        assert_eq!(
            lighting(&shapes, s, &light, point, eyev, normalv, *shadow),
            Color::rgb(*value, *value, *value)
        );
    }
}

#[test]
fn lighting_with_stripe_pattern() {
    use crate::material::Material;
    use crate::pattern::Pattern;

    // Only ambient light contributes, so the pattern color comes through as-is
    let (shapes, s) = lit_sphere(Material {
        color: Color::rgb(0.5, 0.5, 0.5),
        pattern: Some(Pattern::stripe(Color::white(), Color::black())),
        ambient: 1.0,
        diffuse: 0.0,
        specular: 0.0,
        ..Default::default()
    });
    let light = Light::from(PointLight::new(
        Color::white(), Tuple4D::point(0.0, 0.0, -10.0)
    ));

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    assert_eq!(
        lighting(&shapes, s, &light, Tuple4D::point(0.9, 0.0, 0.0), eyev, normalv, 0.0),
        Color::white()
    );
    assert_eq!(
        lighting(&shapes, s, &light, Tuple4D::point(1.1, 0.0, 0.0), eyev, normalv, 0.0),
        Color::black()
    );
}

#[test]
fn area_light_cells_and_center() {
    let light = AreaLight::new(
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::vector(2.0, 0.0, 0.0), 4,
        Tuple4D::vector(0.0, 0.0, 1.0), 2,
        Color::white(),
    );

    assert_eq!(light.uvec, Tuple4D::vector(0.5, 0.0, 0.0));
    assert_eq!(light.vvec, Tuple4D::vector(0.0, 0.0, 0.5));
    assert_eq!(light.position, Tuple4D::point(1.0, 0.0, 0.5));
    assert_eq!(light.samples().len(), 8);

    let cases = [
        (0, 0, Tuple4D::point(0.25, 0.0, 0.25)),
        (1, 0, Tuple4D::point(0.75, 0.0, 0.25)),
        (0, 1, Tuple4D::point(0.25, 0.0, 0.75)),
        (2, 0, Tuple4D::point(1.25, 0.0, 0.25)),
        (3, 1, Tuple4D::point(1.75, 0.0, 0.75)),
    ];
    for (u, v, expected) in cases.iter() {
        assert_eq!(light.point_on_light(*u, *v, 0.5, 0.5), *expected);
    }
}

#[test]
fn jittered_samples_stay_inside_their_cells() {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    let light = AreaLight::new(
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::vector(2.0, 0.0, 0.0), 4,
        Tuple4D::vector(0.0, 0.0, 1.0), 2,
        Color::white(),
    );

    // A constant 1/2 from the generator lands exactly on the centers
    let mut half = StepRng::new(1 << 63, 0);
    assert_eq!(light.jittered_samples(&mut half), light.samples().to_vec());

    let mut rng = StdRng::seed_from_u64(7);
    let points = light.jittered_samples(&mut rng);
    for (n, p) in points.iter().enumerate() {
        let (u, v) = ((n % 4) as f64, (n / 4) as f64);
        assert!(p.x >= u * 0.5 && p.x < (u + 1.0) * 0.5);
        assert!(p.z >= v * 0.5 && p.z < (v + 1.0) * 0.5);
        assert_eq!(p.y, 0.0);
    }
}

#[test]
fn lighting_samples_the_area_light() {
    use crate::material::Material;

    let (shapes, s) = lit_sphere(Material {
        ambient: 0.1,
        diffuse: 0.9,
        specular: 0.0,
        color: Color::white(),
        ..Default::default()
    });
    let light = Light::from(AreaLight::new(
        Tuple4D::point(-0.5, -0.5, -5.0),
        Tuple4D::vector(1.0, 0.0, 0.0), 2,
        Tuple4D::vector(0.0, 1.0, 0.0), 2,
        Color::white(),
    ));
    let eye = Tuple4D::point(0.0, 0.0, -5.0);

    let cases = [
        (Tuple4D::point(0.0, 0.0, -1.0), Color::rgb(0.9965, 0.9965, 0.9965)),
        (Tuple4D::point(0.0, 0.7071, -0.7071), Color::rgb(0.62318, 0.62318, 0.62318)),
    ];

    for (point, expected) in cases.iter() {
        let eyev = (eye - *point).normalize();
        let normalv = Tuple4D::vector(point.x, point.y, point.z);
        let res = lighting(&shapes, s, &light, *point, eyev, normalv, 0.0);
        assert_eq!(res, *expected);
    }
}
