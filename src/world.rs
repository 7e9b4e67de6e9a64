use log::debug;
use rand::RngCore;

use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::shape::Shape;
use crate::arena::ShapeArena;
use crate::material::Material;
use crate::config::RenderConfig;
use crate::error::ShapeResult;
use crate::light::{ Light, PointLight, lighting };
use crate::intersect::{ Intersections, IntersectionComputation };

/// A world with objects and light.
///
/// Worlds collect all shapes as well as the light for rendering. Most shading
/// logic is performed within worlds for the ray tracer. Rendering only needs
/// `&World`, so one world can be shared by every render thread.
#[derive(Debug)]
pub struct World {
    pub shapes: ShapeArena,
    pub light: Option<Light>,
}

impl Default for World {
    /// Two concentric spheres lit from the upper left.
    fn default() -> World {
        let mut shapes = ShapeArena::new();

        let outer = Shape::sphere().with_material(Material {
            color: Color::rgb(0.8, 1.0, 0.6),
            diffuse: 0.7,
            specular: 0.2,
            ..Default::default()
        });
        let inner = Shape::sphere()
            .with_transform(Matrix4D::scaling(0.5, 0.5, 0.5));

        // Neither shape can fail: both transforms are invertible and neither
        // shape has children.
        for shape in vec![outer, inner] {
            if let Err(e) = shapes.insert_root(shape) {
                unreachable!("default world shape rejected: {}", e);
            }
        }

        World {
            shapes,
            light: Some(Light::Point(PointLight::new(
                Color::rgb(1.0, 1.0, 1.0),
                Tuple4D::point(-10.0, 10.0, -10.0),
            ))),
        }
    }
}

impl World {
    /// Creates a default world with two spheres.
    pub fn new() -> World {
        Default::default()
    }

    /// Creates a world with no shapes and no light.
    pub fn empty() -> World {
        World { shapes: ShapeArena::new(), light: None }
    }

    /// Subdivides every top-level group into a bounding volume hierarchy.
    pub fn construct_bvh(&mut self, threshold: usize) -> ShapeResult<()> {
        let roots = self.shapes.roots().to_vec();
        for root in roots.iter() {
            self.shapes.construct_bvh(*root, threshold)?;
        }

        debug!("bvh built over {} top-level shapes", roots.len());
        Ok(())
    }

    /// Intersects a ray against all top-level shapes, sorted by `t`.
    pub fn intersect(&self, r: &Ray4D) -> Intersections {
        Intersections::aggregate(
            self.shapes.roots().iter()
                .map(|root| self.shapes.intersect(*root, r))
                .collect()
        )
    }

    /// Whether anything that casts shadows lies between `point` and
    /// `light_point`.
    pub fn is_shadowed(&self, light_point: Tuple4D, point: Tuple4D) -> bool {
        let v = light_point - point;
        let distance = v.magnitude();
        let r = Ray4D::new(point, v.normalize());

        self.intersect(&r).iter().any(|i| {
            i.t >= 0.0 && i.t < distance && self.shapes.casts_shadow(i.object)
        })
    }

    /// The fraction of `light` that is blocked at `point`.
    ///
    /// Point lights give exactly 0 or 1. Area lights cast one shadow ray per
    /// cell, towards a point jittered with `rng`.
    pub fn shadow_intensity(&self, light: &Light, point: Tuple4D,
        rng: &mut dyn RngCore) -> f64 {
        let samples = light.shadow_samples(rng);
        let blocked = samples.iter()
            .filter(|s| self.is_shadowed(**s, point))
            .count();

        blocked as f64 / samples.len() as f64
    }

    /// Calculates the color for a hit, based on shadows, light, reflection and
    /// refraction.
    pub fn shade_hit(&self, comps: &IntersectionComputation, depth: usize,
        config: &RenderConfig, rng: &mut dyn RngCore) -> Color {
        let light = match self.light {
            Some(ref light) => light,
            None => return Color::black(),
        };

        let shadow = self.shadow_intensity(light, comps.over_point, rng);
        let surface = lighting(&self.shapes, comps.object, light,
            comps.over_point, comps.eyev, comps.normalv, shadow);

        if depth >= config.max_depth {
            return surface;
        }

        let reflected = self.reflected_color(comps, depth, config, rng);
        let refracted = self.refracted_color(comps, depth, config, rng);

        let material = &self.shapes.get(comps.object).material;
        if material.is_reflective() && material.is_transparent() {
            let reflectance = comps.schlick();
            surface + reflected * reflectance + refracted * (1.0 - reflectance)
        } else {
            surface + reflected + refracted
        }
    }

    /// Determines the color seen along a ray.
    ///
    /// `depth` counts the reflections and refractions already taken to get
    /// here; the camera starts at 0.
    pub fn color_at(&self, r: &Ray4D, depth: usize, config: &RenderConfig,
        rng: &mut dyn RngCore) -> Color {
        if self.light.is_none() {
            return Color::black();
        }

        let xs = self.intersect(r);
        match xs.hit() {
            None => config.background,
            Some(hit) => {
                let comps = IntersectionComputation::new(r, &hit, &xs, &self.shapes);
                self.shade_hit(&comps, depth, config, rng)
            },
        }
    }

    /// Color arriving along the mirror direction, scaled by reflectivity.
    pub fn reflected_color(&self, comps: &IntersectionComputation, depth: usize,
        config: &RenderConfig, rng: &mut dyn RngCore) -> Color {
        let reflective = self.shapes.get(comps.object).material.reflective;
        if reflective <= 0.0 || depth >= config.max_depth {
            return Color::black();
        }

        let r = Ray4D::new(comps.over_point, comps.reflectv);
        self.color_at(&r, depth + 1, config, rng) * reflective
    }

    /// Color arriving through the surface, bent by Snell's law and scaled by
    /// transparency. Total internal reflection lets nothing through.
    pub fn refracted_color(&self, comps: &IntersectionComputation, depth: usize,
        config: &RenderConfig, rng: &mut dyn RngCore) -> Color {
        let transparency = self.shapes.get(comps.object).material.transparency;
        if transparency <= 0.0 || depth >= config.max_depth {
            return Color::black();
        }

        let n_ratio = comps.n1 / comps.n2;
        let cos_i = comps.eyev.dot(&comps.normalv);
        let sin2_t = n_ratio.powi(2) * (1.0 - cos_i.powi(2));
        if sin2_t > 1.0 {
            return Color::black();
        }

        let cos_t = (1.0 - sin2_t).sqrt();
        let direction = comps.normalv * (n_ratio * cos_i - cos_t) - comps.eyev * n_ratio;

        let r = Ray4D::new(comps.under_point, direction);
        self.color_at(&r, depth + 1, config, rng) * transparency
    }
}

#[cfg(test)]
fn half_rng() -> rand::rngs::mock::StepRng {
    // Every f64 drawn is exactly 1/2, so area light samples sit on cell centers
    rand::rngs::mock::StepRng::new(1 << 63, 0)
}

#[cfg(test)]
fn floor_scene(floor: Material, with_ball: bool) -> (World, Ray4D, IntersectionComputation) {
    let mut w = World::new();
    let floor = w.shapes.insert_root(Shape::plane()
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0))
        .with_material(floor)).unwrap();

    if with_ball {
        w.shapes.insert_root(Shape::sphere()
            .with_transform(Matrix4D::translation(0.0, -3.5, -0.5))
            .with_material(Material {
                color: Color::rgb(1.0, 0.0, 0.0),
                ambient: 0.5,
                ..Default::default()
            })).unwrap();
    }

    let half = 2.0f64.sqrt() / 2.0;
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -3.0), Tuple4D::vector(0.0, -half, half));
    let xs = w.intersect(&r);
    let hit = *xs.iter().find(|i| i.object == floor).unwrap();
    let comps = IntersectionComputation::new(&r, &hit, &xs, &w.shapes);

    (w, r, comps)
}

#[test]
fn intersect_default_world_with_ray() {
    let w = World::new();
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let xs = w.intersect(&r);
    let ts: Vec<f64> = xs.iter().map(|i| i.t).collect();
    assert_eq!(ts, vec![4.0, 4.5, 5.5, 6.0]);
}

#[test]
fn shade_intersection_from_outside() {
    use crate::intersect::Intersection;

    let w = World::new();
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let outer = w.shapes.roots()[0];

    let i = Intersection::new(4.0, outer);
    let xs = Intersections::from(vec![i]);
    let comps = IntersectionComputation::new(&r, &i, &xs, &w.shapes);

    let c = w.shade_hit(&comps, 0, &RenderConfig::default(), &mut half_rng());
    assert_eq!(c, Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn shade_intersection_from_inside() {
    use crate::intersect::Intersection;

    let mut w = World::new();
    w.light = Some(Light::from(PointLight::new(
        Color::rgb(1.0, 1.0, 1.0),
        Tuple4D::point(0.0, 0.25, 0.0),
    )));

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0));
    let inner = w.shapes.roots()[1];

    let i = Intersection::new(0.5, inner);
    let xs = Intersections::from(vec![i]);
    let comps = IntersectionComputation::new(&r, &i, &xs, &w.shapes);

    let c = w.shade_hit(&comps, 0, &RenderConfig::default(), &mut half_rng());
    assert_eq!(c, Color::rgb(0.90498, 0.90498, 0.90498));
}

#[test]
fn shade_intersection_in_shadow() {
    use crate::intersect::Intersection;

    let mut w = World::empty();
    w.light = Some(Light::from(PointLight::new(
        Color::rgb(1.0, 1.0, 1.0),
        Tuple4D::point(0.0, 0.0, -10.0),
    )));

    w.shapes.insert_root(Shape::sphere()).unwrap();
    let s2 = w.shapes.insert_root(
        Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 10.0))
    ).unwrap();

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, 5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(4.0, s2);
    let xs = Intersections::from(vec![i]);
    let comps = IntersectionComputation::new(&r, &i, &xs, &w.shapes);

    let c = w.shade_hit(&comps, 0, &RenderConfig::default(), &mut half_rng());
    assert_eq!(c, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn color_ray_miss_and_hit() {
    let w = World::new();
    let config = RenderConfig::default();

    let miss = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 1.0, 0.0));
    assert_eq!(w.color_at(&miss, 0, &config, &mut half_rng()), Color::black());

    let sky = RenderConfig { background: Color::rgb(0.2, 0.4, 0.8), ..config };
    assert_eq!(w.color_at(&miss, 0, &sky, &mut half_rng()), Color::rgb(0.2, 0.4, 0.8));

    let hit = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    assert_eq!(
        w.color_at(&hit, 0, &config, &mut half_rng()),
        Color::rgb(0.38066, 0.47583, 0.2855)
    );
}

#[test]
fn no_light_means_black() {
    let mut w = World::new();
    w.light = None;

    let sky = RenderConfig { background: Color::white(), ..Default::default() };
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    assert_eq!(w.color_at(&r, 0, &sky, &mut half_rng()), Color::black());
}

#[test]
fn color_behind_ray() {
    let mut w = World::new();
    let outer = w.shapes.roots()[0];
    let inner = w.shapes.roots()[1];
    w.shapes.material_mut(outer).ambient = 1.0;
    w.shapes.material_mut(inner).ambient = 1.0;

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, 0.75), Tuple4D::vector(0.0, 0.0, -1.0));

    let inner_color = w.shapes.get(inner).material.color;
    assert_eq!(w.color_at(&r, 0, &RenderConfig::default(), &mut half_rng()), inner_color);
}

#[test]
fn point_light_shadows() {
    let w = World::new();
    let light = w.light.clone().unwrap();
    let position = light.position();

    let cases = [
        (Tuple4D::point(0.0, 10.0, 0.0), false),
        (Tuple4D::point(10.0, -10.0, 10.0), true),
        (Tuple4D::point(-20.0, 20.0, -20.0), false),
        (Tuple4D::point(-2.0, 2.0, -2.0), false),
    ];

    for (point, shadowed) in cases.iter() {
        assert_eq!(w.is_shadowed(position, *point), *shadowed);
        let expected = if *shadowed { 1.0 } else { 0.0 };
        assert_eq!(w.shadow_intensity(&light, *point, &mut half_rng()), expected);
    }

    // With the occluders gone the same point is lit
    let open = World { shapes: ShapeArena::new(), light: Some(light.clone()) };
    assert_eq!(
        open.shadow_intensity(&light, Tuple4D::point(10.0, -10.0, 10.0), &mut half_rng()),
        0.0
    );
}

#[test]
fn area_light_shadows_are_fractional() {
    use crate::light::AreaLight;

    let w = World::new();
    let light = Light::from(AreaLight::new(
        Tuple4D::point(-0.5, -0.5, -5.0),
        Tuple4D::vector(1.0, 0.0, 0.0), 2,
        Tuple4D::vector(0.0, 1.0, 0.0), 2,
        Color::white(),
    ));

    let cases = [
        (Tuple4D::point(0.0, 0.0, 2.0), 1.0),
        (Tuple4D::point(1.0, -1.0, 2.0), 0.75),
        (Tuple4D::point(1.5, 0.0, 2.0), 0.5),
        (Tuple4D::point(1.25, 1.25, 3.0), 0.25),
        (Tuple4D::point(0.0, 0.0, -2.0), 0.0),
    ];

    for (point, expected) in cases.iter() {
        assert_eq!(w.shadow_intensity(&light, *point, &mut half_rng()), *expected);
    }
}

#[test]
fn area_light_shadow_round_trip_with_seeded_rng() {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use crate::light::AreaLight;

    let light = Light::from(AreaLight::new(
        Tuple4D::point(-0.5, -0.5, -5.0),
        Tuple4D::vector(1.0, 0.0, 0.0), 4,
        Tuple4D::vector(0.0, 1.0, 0.0), 4,
        Color::white(),
    ));
    let point = Tuple4D::point(0.5, 0.0, 2.0);

    let occluded = World::new();
    let shadow = occluded.shadow_intensity(&light, point, &mut StdRng::seed_from_u64(3));
    assert!(shadow > 0.0 && shadow <= 1.0);

    // Same seed, same answer
    let again = occluded.shadow_intensity(&light, point, &mut StdRng::seed_from_u64(3));
    assert_eq!(shadow, again);

    let open = World::empty();
    let lit = open.shadow_intensity(&light, point, &mut StdRng::seed_from_u64(3));
    assert!(shadow > lit);
    assert_eq!(lit, 0.0);
}

#[test]
fn shapes_that_cast_no_shadow_are_ignored() {
    let mut w = World::new();
    let position = w.light.as_ref().unwrap().position();
    let point = Tuple4D::point(10.0, -10.0, 10.0);

    let outer = w.shapes.roots()[0];
    let inner = w.shapes.roots()[1];
    w.shapes.set_casts_shadow(outer, false);
    assert!(w.is_shadowed(position, point));

    w.shapes.set_casts_shadow(inner, false);
    assert!(!w.is_shadowed(position, point));
}

#[test]
fn reflected_color_for_nonreflective_material() {
    use crate::intersect::Intersection;

    let mut w = World::new();
    let inner = w.shapes.roots()[1];
    w.shapes.material_mut(inner).ambient = 1.0;

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(1.0, inner);
    let xs = Intersections::from(vec![i]);
    let comps = IntersectionComputation::new(&r, &i, &xs, &w.shapes);

    let c = w.reflected_color(&comps, 0, &RenderConfig::default(), &mut half_rng());
    assert_eq!(c, Color::black());
}

#[test]
fn reflected_color_for_reflective_material() {
    let (w, _, comps) = floor_scene(Material { reflective: 0.5, ..Default::default() }, false);
    let config = RenderConfig::default();

    assert_eq!(
        w.reflected_color(&comps, 0, &config, &mut half_rng()),
        Color::rgb(0.19033, 0.23792, 0.14275)
    );
    assert_eq!(
        w.shade_hit(&comps, 0, &config, &mut half_rng()),
        Color::rgb(0.87676, 0.92434, 0.82917)
    );

    // At the recursion limit nothing is reflected
    assert_eq!(
        w.reflected_color(&comps, config.max_depth, &config, &mut half_rng()),
        Color::black()
    );
}

#[test]
fn recursion_stops_at_max_depth() {
    let (w, r, _) = floor_scene(Material { reflective: 0.5, ..Default::default() }, false);
    let config = RenderConfig::default();

    // Only the floor's own lighting is left once the limit is reached
    let surface = Color::rgb(0.68643, 0.68643, 0.68643);
    assert_eq!(w.color_at(&r, config.max_depth, &config, &mut half_rng()), surface);

    let none = RenderConfig { max_depth: 0, ..config };
    assert_eq!(w.color_at(&r, 0, &none, &mut half_rng()), surface);

    let one = RenderConfig { max_depth: 1, ..config };
    assert_eq!(
        w.color_at(&r, 0, &one, &mut half_rng()),
        Color::rgb(0.87676, 0.92434, 0.82917)
    );
}

#[test]
fn mutually_reflective_surfaces_terminate() {
    let mut w = World::empty();
    w.light = Some(Light::from(PointLight::new(Color::white(), Tuple4D::origin())));

    let mirror = Material { reflective: 1.0, ..Default::default() };
    w.shapes.insert_root(Shape::plane()
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0))
        .with_material(mirror)).unwrap();
    w.shapes.insert_root(Shape::plane()
        .with_transform(Matrix4D::translation(0.0, 1.0, 0.0))
        .with_material(mirror)).unwrap();

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 1.0, 0.0));
    let c = w.color_at(&r, 0, &RenderConfig::default(), &mut half_rng());
    assert!(c.r.is_finite() && c.g.is_finite() && c.b.is_finite());
}

#[test]
fn refracted_color_edge_cases() {
    use crate::intersect::Intersection;

    let config = RenderConfig::default();

    // Opaque surfaces let nothing through
    let w = World::new();
    let outer = w.shapes.roots()[0];
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = Intersections::from(vec![
        Intersection::new(4.0, outer), Intersection::new(6.0, outer)
    ]);
    let comps = IntersectionComputation::new(&r, &xs[0], &xs, &w.shapes);
    assert_eq!(w.refracted_color(&comps, 0, &config, &mut half_rng()), Color::black());

    let mut w = World::new();
    let outer = w.shapes.roots()[0];
    *w.shapes.material_mut(outer) = Material {
        color: Color::rgb(0.8, 1.0, 0.6),
        diffuse: 0.7,
        specular: 0.2,
        ..Material::glass()
    };

    // At the recursion limit
    let comps = IntersectionComputation::new(&r, &xs[0], &xs, &w.shapes);
    assert_eq!(
        w.refracted_color(&comps, config.max_depth, &config, &mut half_rng()),
        Color::black()
    );

    // Total internal reflection
    let half = 2.0f64.sqrt() / 2.0;
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, half), Tuple4D::vector(0.0, 1.0, 0.0));
    let xs = Intersections::from(vec![
        Intersection::new(-half, outer), Intersection::new(half, outer)
    ]);
    let comps = IntersectionComputation::new(&r, &xs[1], &xs, &w.shapes);
    assert_eq!(w.refracted_color(&comps, 0, &config, &mut half_rng()), Color::black());
}

#[test]
fn shade_hit_with_transparent_floor() {
    let (w, _, comps) = floor_scene(Material {
        transparency: 0.5,
        refractive_index: 1.5,
        ..Default::default()
    }, true);

    assert_eq!(
        w.shade_hit(&comps, 0, &RenderConfig::default(), &mut half_rng()),
        Color::rgb(0.93643, 0.68643, 0.68643)
    );
}

#[test]
fn shade_hit_blends_with_schlick_when_reflective_and_transparent() {
    let (w, _, comps) = floor_scene(Material {
        reflective: 0.5,
        transparency: 0.5,
        refractive_index: 1.5,
        ..Default::default()
    }, true);

    assert_eq!(
        w.shade_hit(&comps, 0, &RenderConfig::default(), &mut half_rng()),
        Color::rgb(0.93391, 0.69643, 0.69243)
    );
}
