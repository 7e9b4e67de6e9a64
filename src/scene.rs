use std::fs;
use std::f64::INFINITY;
use std::path::{ Path, PathBuf };

use log::info;
use serde::Deserialize;

use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::shape::Shape;
use crate::csg::CsgOperation;
use crate::arena::{ ShapeArena, ShapeId };
use crate::material::Material;
use crate::pattern::{ Pattern, PatternType };
use crate::light::{ Light, PointLight, AreaLight };
use crate::config::RenderConfig;
use crate::world::World;
use crate::camera::Camera;
use crate::obj::ObjModel;
use crate::error::{ ShapeResult, SceneError, SceneResult };

/// Everything needed to render one image.
#[derive(Debug)]
pub struct Scene {
    pub world: World,
    pub camera: Camera,
    pub config: RenderConfig,
}

impl Scene {
    /// Reads a JSON scene description. Mesh paths inside it are resolved
    /// against the directory the scene file lives in.
    pub fn load<P: AsRef<Path>>(path: P) -> SceneResult<Scene> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| SceneError::Io { path: path.into(), source })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let scene = Scene::from_json(&text, base_dir)?;

        info!("loaded scene {}: {} shapes, {}x{} pixels",
            path.display(), scene.world.shapes.len(),
            scene.camera.hsize, scene.camera.vsize);

        Ok(scene)
    }

    /// Builds a scene from JSON text.
    pub fn from_json(text: &str, base_dir: &Path) -> SceneResult<Scene> {
        let json: SceneJson = serde_json::from_str(text)?;
        json.build(base_dir)
    }

    /// Builds the BVH if the render settings ask for one.
    pub fn prepare(&mut self) -> ShapeResult<()> {
        match self.config.bvh_threshold {
            Some(threshold) => self.world.construct_bvh(threshold),
            None => Ok(()),
        }
    }
}

/// The top level of a scene file.
#[derive(Clone, Debug, Deserialize)]
struct SceneJson {
    camera: CameraJson,

    #[serde(default)]
    light: Option<LightJson>,

    #[serde(default)]
    render: RenderConfig,

    #[serde(default)]
    shapes: Vec<ShapeJson>,
}

impl SceneJson {
    fn build(self, base_dir: &Path) -> SceneResult<Scene> {
        let camera = self.camera.build()?;
        let light = self.light.map(LightJson::build).transpose()?;

        let mut shapes = ShapeArena::new();
        for shape in self.shapes {
            let id = insert_shape(&mut shapes, shape, None, base_dir)?;
            shapes.add_root(id)?;
        }

        Ok(Scene {
            world: World { shapes, light },
            camera,
            config: self.render,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
struct CameraJson {
    width: usize,
    height: usize,

    /// In radians.
    field_of_view: f64,

    from: [f64; 3],
    to: [f64; 3],
    up: [f64; 3],
}

impl CameraJson {
    fn build(&self) -> SceneResult<Camera> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::InvalidCamera(
                format!("image size {}x{} is empty", self.width, self.height)
            ));
        }

        if !(self.field_of_view > 0.0 && self.field_of_view < std::f64::consts::PI) {
            return Err(SceneError::InvalidCamera(
                format!("field of view {} is outside (0, pi)", self.field_of_view)
            ));
        }

        let view = Matrix4D::view_transform(
            Tuple4D::from(self.from),
            Tuple4D::from(self.to),
            vector(self.up),
        );

        Camera::new(self.width, self.height, self.field_of_view)
            .with_transform(view)
            .map_err(|_| SceneError::InvalidCamera(
                "from, to and up do not define a view".into()
            ))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LightJson {
    Point {
        position: [f64; 3],
        #[serde(default = "white")]
        intensity: Color,
    },

    Area {
        corner: [f64; 3],
        uvec: [f64; 3],
        usteps: usize,
        vvec: [f64; 3],
        vsteps: usize,
        #[serde(default = "white")]
        intensity: Color,
    },
}

impl LightJson {
    fn build(self) -> SceneResult<Light> {
        match self {
            LightJson::Point { position, intensity }
                => Ok(PointLight::new(intensity, Tuple4D::from(position)).into()),

            LightJson::Area { corner, uvec, usteps, vvec, vsteps, intensity } => {
                if usteps == 0 || vsteps == 0 {
                    return Err(SceneError::InvalidLight(
                        format!("area light needs at least one cell, got {}x{}", usteps, vsteps)
                    ));
                }

                Ok(AreaLight::new(
                    Tuple4D::from(corner),
                    vector(uvec), usteps,
                    vector(vvec), vsteps,
                    intensity,
                ).into())
            },
        }
    }
}

/// One step of a transform list. Steps apply in the order they are listed.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TransformJson {
    Translate([f64; 3]),
    Scale([f64; 3]),
    RotateX(f64),
    RotateY(f64),
    RotateZ(f64),

    /// xy, xz, yx, yz, zx, zy.
    Shear([f64; 6]),
}

impl TransformJson {
    fn matrix(&self) -> Matrix4D {
        match *self {
            TransformJson::Translate([x, y, z]) => Matrix4D::translation(x, y, z),
            TransformJson::Scale([x, y, z]) => Matrix4D::scaling(x, y, z),
            TransformJson::RotateX(r) => Matrix4D::rotation_x(r),
            TransformJson::RotateY(r) => Matrix4D::rotation_y(r),
            TransformJson::RotateZ(r) => Matrix4D::rotation_z(r),
            TransformJson::Shear([xy, xz, yx, yz, zx, zy])
                => Matrix4D::shearing(xy, xz, yx, yz, zx, zy),
        }
    }
}

fn compose(steps: &[TransformJson]) -> Matrix4D {
    steps.iter().fold(Matrix4D::identity(), |m, step| step.matrix() * m)
}

#[derive(Clone, Debug, Deserialize)]
struct PatternJson {
    #[serde(rename = "type")]
    ty: PatternType,
    a: Color,
    b: Color,

    #[serde(default)]
    transform: Vec<TransformJson>,
}

/// Any field left out keeps the default material's value.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
struct MaterialJson {
    color: Color,
    pattern: Option<PatternJson>,
    ambient: f64,
    diffuse: f64,
    specular: f64,
    shininess: f64,
    reflective: f64,
    transparency: f64,
    refractive_index: f64,
}

impl Default for MaterialJson {
    fn default() -> MaterialJson {
        let m = Material::default();
        MaterialJson {
            color: m.color,
            pattern: None,
            ambient: m.ambient,
            diffuse: m.diffuse,
            specular: m.specular,
            shininess: m.shininess,
            reflective: m.reflective,
            transparency: m.transparency,
            refractive_index: m.refractive_index,
        }
    }
}

impl MaterialJson {
    fn build(&self) -> ShapeResult<Material> {
        let pattern = match self.pattern {
            Some(ref p) => Some(
                Pattern::new(p.ty, p.a, p.b).with_transform(compose(&p.transform))?
            ),
            None => None,
        };

        Ok(Material {
            color: self.color,
            pattern,
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            shininess: self.shininess,
            reflective: self.reflective,
            transparency: self.transparency,
            refractive_index: self.refractive_index,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
struct ShapeJson {
    #[serde(flatten)]
    kind: ShapeKindJson,

    #[serde(default)]
    transform: Vec<TransformJson>,

    /// Inherited by children that give no material of their own.
    #[serde(default)]
    material: Option<MaterialJson>,

    #[serde(default = "yes")]
    shadow: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ShapeKindJson {
    Sphere,
    Plane,
    Cube,

    Cylinder {
        #[serde(default = "negative_infinity")]
        minimum: f64,
        #[serde(default = "infinity")]
        maximum: f64,
        #[serde(default)]
        closed: bool,
    },

    Cone {
        #[serde(default = "negative_infinity")]
        minimum: f64,
        #[serde(default = "infinity")]
        maximum: f64,
        #[serde(default)]
        closed: bool,
    },

    Triangle {
        p1: [f64; 3],
        p2: [f64; 3],
        p3: [f64; 3],
    },

    SmoothTriangle {
        p1: [f64; 3],
        p2: [f64; 3],
        p3: [f64; 3],
        n1: [f64; 3],
        n2: [f64; 3],
        n3: [f64; 3],
    },

    Group {
        #[serde(default)]
        children: Vec<ShapeJson>,
    },

    Csg {
        operation: CsgOperation,
        left: Box<ShapeJson>,
        right: Box<ShapeJson>,
    },

    /// A Wavefront OBJ mesh, relative to the scene file.
    Obj {
        file: PathBuf,
    },
}

/// Inserts a shape description and everything below it, returning the
/// handle of the detached top shape.
fn insert_shape(shapes: &mut ShapeArena, json: ShapeJson,
    inherited: Option<&MaterialJson>, base_dir: &Path) -> SceneResult<ShapeId> {
    let material_json = json.material.as_ref().or(inherited);
    let material = match material_json {
        Some(m) => m.build()?,
        None => Material::default(),
    };
    let transform = compose(&json.transform);

    let primitive = |shape: Shape| shape.with_transform(transform).with_material(material);

    let id = match json.kind {
        ShapeKindJson::Sphere => shapes.insert(primitive(Shape::sphere()))?,
        ShapeKindJson::Plane => shapes.insert(primitive(Shape::plane()))?,
        ShapeKindJson::Cube => shapes.insert(primitive(Shape::cube()))?,

        ShapeKindJson::Cylinder { minimum, maximum, closed } => {
            let shape = if closed {
                Shape::capped_cylinder(minimum, maximum)
            } else {
                Shape::bounded_cylinder(minimum, maximum)
            };
            shapes.insert(primitive(shape))?
        },

        ShapeKindJson::Cone { minimum, maximum, closed } => {
            let shape = if closed {
                Shape::capped_cone(minimum, maximum)
            } else {
                Shape::bounded_cone(minimum, maximum)
            };
            shapes.insert(primitive(shape))?
        },

        ShapeKindJson::Triangle { p1, p2, p3 } => shapes.insert(primitive(
            Shape::triangle(p1.into(), p2.into(), p3.into())
        ))?,

        ShapeKindJson::SmoothTriangle { p1, p2, p3, n1, n2, n3 } => shapes.insert(primitive(
            Shape::smooth_triangle(p1.into(), p2.into(), p3.into(),
                vector(n1), vector(n2), vector(n3))
        ))?,

        ShapeKindJson::Group { children } => {
            let group = shapes.insert(primitive(Shape::group()))?;
            for child in children {
                let child = insert_shape(shapes, child, material_json, base_dir)?;
                shapes.add_child(group, child)?;
            }
            group
        },

        ShapeKindJson::Csg { operation, left, right } => {
            let left = insert_shape(shapes, *left, material_json, base_dir)?;
            let right = insert_shape(shapes, *right, material_json, base_dir)?;
            shapes.insert(primitive(Shape::csg(operation, left, right)))?
        },

        ShapeKindJson::Obj { file } => {
            let path = base_dir.join(file);
            let mut model = ObjModel::load(&path)
                .map_err(|source| SceneError::Obj { path: path.clone(), source })?;
            model.set_material(material);

            let group = model.into_group(shapes)
                .map_err(|source| SceneError::Obj { path, source })?;
            shapes.set_transform(group, transform)?;
            group
        },
    };

    if !json.shadow {
        shapes.set_casts_shadow(id, false);
    }

    Ok(id)
}

fn vector(v: [f64; 3]) -> Tuple4D {
    Tuple4D::vector(v[0], v[1], v[2])
}

fn white() -> Color {
    Color::white()
}

fn yes() -> bool {
    true
}

fn infinity() -> f64 {
    INFINITY
}

fn negative_infinity() -> f64 {
    -INFINITY
}

#[cfg(test)]
const CAMERA: &str = r#""camera": {
    "width": 40, "height": 20, "field_of_view": 1.0471975512,
    "from": [0, 1.5, -5], "to": [0, 1, 0], "up": [0, 1, 0]
}"#;

#[cfg(test)]
fn scene_from(body: &str) -> SceneResult<Scene> {
    let text = format!("{{ {}, {} }}", CAMERA, body);
    Scene::from_json(&text, Path::new("."))
}

#[test]
fn loading_a_scene() {
    use crate::shape::ShapeType;

    let scene = scene_from(r#"
        "light": { "type": "point", "position": [-10, 10, -10] },
        "render": { "max_depth": 3, "seed": 5 },
        "shapes": [
            { "type": "plane", "material": { "color": [0.5, 0.5, 0.5], "reflective": 0.3 } },
            { "type": "group",
              "transform": [ { "translate": [0, 1, 0] } ],
              "material": { "color": [1, 0, 0] },
              "children": [
                { "type": "sphere" },
                { "type": "cylinder", "minimum": 0, "maximum": 2, "closed": true,
                  "shadow": false }
              ] },
            { "type": "csg", "operation": "difference",
              "left": { "type": "cube" },
              "right": { "type": "sphere", "transform": [ { "scale": [1.3, 1.3, 1.3] } ] } }
        ]
    "#).unwrap();

    assert_eq!(scene.camera.hsize, 40);
    assert_eq!(scene.camera.vsize, 20);
    assert_eq!(scene.config.max_depth, 3);
    assert_eq!(scene.config.seed, Some(5));
    assert!(scene.config.parallel);

    let light = scene.world.light.as_ref().unwrap();
    assert_eq!(light.position(), Tuple4D::point(-10.0, 10.0, -10.0));
    assert_eq!(light.intensity(), Color::white());

    let shapes = &scene.world.shapes;
    let roots = shapes.roots();
    assert_eq!(roots.len(), 3);
    assert_eq!(shapes.get(roots[0]).material.reflective, 0.3);

    let children = shapes.children(roots[1]).to_vec();
    assert_eq!(children.len(), 2);
    assert_eq!(shapes.get(children[0]).material.color, Color::rgb(1.0, 0.0, 0.0));
    assert!(shapes.casts_shadow(children[0]));
    assert!(!shapes.casts_shadow(children[1]));
    assert_eq!(shapes.get(children[1]).ty, ShapeType::Cylinder(0.0, 2.0, true));

    assert!(matches!(shapes.get(roots[2]).ty,
        ShapeType::Csg(CsgOperation::Difference, _, _)));
}

#[test]
fn transform_steps_apply_in_order() {
    let scene = scene_from(r#"
        "shapes": [
            { "type": "sphere", "transform": [
                { "scale": [2, 2, 2] },
                { "translate": [1, 0, 0] }
            ] }
        ]
    "#).unwrap();

    let s = scene.world.shapes.roots()[0];
    let m = *scene.world.shapes.transform(s);
    assert_eq!(m * Tuple4D::point(1.0, 0.0, 0.0), Tuple4D::point(3.0, 0.0, 0.0));
    assert!(scene.world.light.is_none());
}

#[test]
fn area_lights_and_patterns() {
    use crate::pattern::PatternType;

    let scene = scene_from(r#"
        "light": { "type": "area", "corner": [-1, 2, 4], "uvec": [2, 0, 0], "usteps": 4,
                   "vvec": [0, 2, 0], "vsteps": 2, "intensity": [1.5, 1.5, 1.5] },
        "shapes": [
            { "type": "plane", "material": {
                "pattern": { "type": "checker", "a": [1, 1, 1], "b": [0, 0, 0],
                             "transform": [ { "scale": [0.5, 0.5, 0.5] } ] } } }
        ]
    "#).unwrap();

    match scene.world.light {
        Some(Light::Area(ref a)) => {
            assert_eq!(a.usteps, 4);
            assert_eq!(a.vsteps, 2);
            assert_eq!(a.position, Tuple4D::point(0.0, 3.0, 4.0));
            assert_eq!(a.intensity, Color::rgb(1.5, 1.5, 1.5));
        },
        ref other => panic!("expected an area light, got {:?}", other),
    }

    let floor = scene.world.shapes.roots()[0];
    let pattern = scene.world.shapes.get(floor).material.pattern.unwrap();
    assert_eq!(pattern.ty, PatternType::Checker);
    assert_eq!(*pattern.transform(), Matrix4D::scaling(0.5, 0.5, 0.5));
    assert_eq!(pattern.pattern_at(Tuple4D::point(1.2, 0.0, 0.0)), Color::black());
}

#[test]
fn invalid_scenes_are_rejected() {
    use crate::error::ShapeError;

    let text = r#"{ "camera": { "width": 0, "height": 20, "field_of_view": 1.0,
        "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0] } }"#;
    assert!(matches!(Scene::from_json(text, Path::new(".")),
        Err(SceneError::InvalidCamera(_))));

    let text = r#"{ "camera": { "width": 10, "height": 20, "field_of_view": 1.0,
        "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 0, 1] } }"#;
    assert!(matches!(Scene::from_json(text, Path::new(".")),
        Err(SceneError::InvalidCamera(_))));

    let err = scene_from(r#""shapes": [
        { "type": "sphere", "transform": [ { "scale": [0, 1, 1] } ] }
    ]"#).unwrap_err();
    assert!(matches!(err, SceneError::Shape(ShapeError::NonInvertibleTransform)));

    let err = scene_from(r#""light": { "type": "area", "corner": [0, 0, 0],
        "uvec": [1, 0, 0], "usteps": 0, "vvec": [0, 1, 0], "vsteps": 1 }"#).unwrap_err();
    assert!(matches!(err, SceneError::InvalidLight(_)));

    let err = scene_from(r#""shapes": [ { "type": "teapot" } ]"#).unwrap_err();
    assert!(matches!(err, SceneError::Json(_)));

    let err = scene_from(r#""shapes": [ { "type": "obj", "file": "no/such/mesh.obj" } ]"#)
        .unwrap_err();
    assert!(matches!(err, SceneError::Obj { .. }));
}

#[test]
fn preparing_builds_the_bvh() {
    let mut spheres = Vec::new();
    for i in 0..8 {
        spheres.push(format!(
            r#"{{ "type": "sphere", "transform": [ {{ "translate": [{}, 0, 0] }} ] }}"#,
            i * 3
        ));
    }
    let body = format!(
        r#""render": {{ "bvh_threshold": 2 }},
           "shapes": [ {{ "type": "group", "children": [ {} ] }} ]"#,
        spheres.join(", ")
    );

    let mut scene = scene_from(&body).unwrap();
    let group = scene.world.shapes.roots()[0];
    assert_eq!(scene.world.shapes.children(group).len(), 8);

    scene.prepare().unwrap();
    assert!(scene.world.shapes.children(group).len() <= 2);
    assert_eq!(scene.world.shapes.primitives(group).len(), 8);
}
