use std::path::PathBuf;

use whitted::tuple::Tuple4D;
use whitted::color::Color;
use whitted::ray::Ray4D;
use whitted::shape::Shape;
use whitted::arena::ShapeArena;
use whitted::csg::CsgOperation;
use whitted::intersect::{ Intersection, Intersections };
use whitted::camera::Camera;
use whitted::scene::Scene;

fn scene_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenes").join(name)
}

#[test]
fn minimal_scene_shades_the_default_world() {
    let mut scene = Scene::load(scene_path("minimal.json")).unwrap();
    assert_eq!(scene.config.bvh_threshold, None);

    let image = scene.camera.render(&scene.world, &scene.config);
    assert_eq!(image.read_pixel(5, 5).unwrap(), Color::rgb(0.38066, 0.47583, 0.2855));

    // Building the hierarchy does not change the picture
    scene.config.bvh_threshold = Some(1);
    scene.prepare().unwrap();
    let again = scene.camera.render(&scene.world, &scene.config);
    assert_eq!(image, again);
}

#[test]
fn showcase_scene_renders_deterministically() {
    let mut scene = Scene::load(scene_path("showcase.json")).unwrap();
    assert_eq!(scene.world.shapes.roots().len(), 6);
    assert_eq!(scene.config.seed, Some(7));
    scene.prepare().unwrap();

    // A thumbnail through the same eye keeps the test quick
    let camera = Camera::new(24, 14, scene.camera.field_of_view)
        .with_transform(*scene.camera.transform())
        .unwrap();

    let first = camera.render(&scene.world, &scene.config);
    let second = camera.render(&scene.world, &scene.config);
    assert_eq!(first, second);

    let mut ppm = Vec::new();
    first.write_ppm(&mut ppm).unwrap();
    let text = String::from_utf8(ppm).unwrap();
    assert!(text.starts_with("P3\n24 14\n255\n"));
    assert!(text.lines().all(|line| line.len() <= 70));
}

#[test]
fn rays_along_each_axis_hit_a_cube_at_four_and_six() {
    let mut shapes = ShapeArena::new();
    let cube = shapes.insert_root(Shape::cube()).unwrap();

    let axes = [
        Tuple4D::vector(1.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    ];

    for axis in axes.iter() {
        for sign in [1.0, -1.0].iter() {
            let direction = *axis * *sign;
            let origin = Tuple4D::origin() - direction * 5.0;
            let xs = shapes.intersect(cube, &Ray4D::new(origin, direction));

            assert_eq!(xs.len(), 2);
            assert_eq!(xs[0].t, 4.0);
            assert_eq!(xs[1].t, 6.0);
        }
    }
}

#[test]
fn csg_operations_keep_the_right_crossings() {
    let mut shapes = ShapeArena::new();
    let cases = [
        (CsgOperation::Union, [0, 3]),
        (CsgOperation::Intersect, [1, 2]),
        (CsgOperation::Difference, [0, 1]),
    ];

    for (operation, kept) in cases.iter() {
        let s1 = shapes.insert(Shape::sphere()).unwrap();
        let s2 = shapes.insert(Shape::cube()).unwrap();
        let csg = shapes.insert_root(Shape::csg(*operation, s1, s2)).unwrap();

        let xs = Intersections::from(vec![
            Intersection::new(1.0, s1),
            Intersection::new(2.0, s2),
            Intersection::new(3.0, s1),
            Intersection::new(4.0, s2),
        ]);

        let result = shapes.filter_intersections(csg, &xs);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], xs[kept[0]]);
        assert_eq!(result[1], xs[kept[1]]);
    }
}
