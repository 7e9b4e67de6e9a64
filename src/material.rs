use crate::color::Color;
use crate::pattern::Pattern;
use crate::consts::{ GLASS_RI, VACUUM_RI };

/// Surface properties for the Phong model plus reflection and refraction.
///
/// `reflective` and `transparency` are fractions in `[0, 1]`;
/// `refractive_index` is at least 1.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub pattern: Option<Pattern>,

    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,

    pub reflective: f64,
    pub transparency: f64,
    pub refractive_index: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            color: Color::white(),
            pattern: None,

            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.9,
            shininess: 200.0,

            reflective: 0.0,
            transparency: 0.0,
            refractive_index: VACUUM_RI,
        }
    }
}

impl Material {
    /// Fully transparent glass.
    pub fn glass() -> Material {
        Material {
            transparency: 1.0,
            refractive_index: GLASS_RI,
            ..Default::default()
        }
    }

    pub fn is_reflective(&self) -> bool {
        self.reflective > 0.0
    }

    pub fn is_transparent(&self) -> bool {
        self.transparency > 0.0
    }
}

#[test]
fn default_material() {
    let m = Material::default();

    assert_eq!(m.color, Color::white());
    assert_eq!(m.ambient, 0.1);
    assert_eq!(m.diffuse, 0.9);
    assert_eq!(m.specular, 0.9);
    assert_eq!(m.shininess, 200.0);
    assert_eq!(m.reflective, 0.0);
    assert_eq!(m.transparency, 0.0);
    assert_eq!(m.refractive_index, 1.0);
    assert!(m.pattern.is_none());
}

#[test]
fn glass_material() {
    let m = Material::glass();

    assert!(m.is_transparent());
    assert!(!m.is_reflective());
    assert_eq!(m.refractive_index, 1.5);
}
