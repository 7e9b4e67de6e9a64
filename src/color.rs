use std::iter::Sum;
use std::ops::{ Add, AddAssign, Sub, Mul, Div };

use serde::Deserialize;

use crate::feq;

/// An RGB color.
///
/// Components are nominally in `[0, 1]` but are never clamped during shading;
/// clamping happens once, when a canvas is encoded.
///
/// ```
/// # use whitted::color::Color;
/// let lit = Color::rgb(0.9, 0.6, 0.75) * Color::rgb(0.7, 0.1, 0.25);
/// assert_eq!(lit, Color::rgb(0.63, 0.06, 0.1875));
/// ```
#[derive(Copy, Clone, Debug, Default, Deserialize)]
#[serde(from = "[f64; 3]")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r)
            && feq(self.g, other.g)
            && feq(self.b, other.b)
    }
}

impl From<[f64; 3]> for Color {
    fn from(rgb: [f64; 3]) -> Color {
        Color::rgb(rgb[0], rgb[1], rgb[2])
    }
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    pub fn black() -> Color {
        Color::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Color {
        Color::rgb(1.0, 1.0, 1.0)
    }

    pub fn red() -> Color {
        Color::rgb(1.0, 0.0, 0.0)
    }

    pub fn green() -> Color {
        Color::rgb(0.0, 1.0, 0.0)
    }

    pub fn blue() -> Color {
        Color::rgb(0.0, 0.0, 1.0)
    }

    /// Maps each channel from `[0, 1]` onto `[0, max]`, clamping and rounding.
    pub fn to_bytes(&self, max: u16) -> [u16; 3] {
        let scale = |c: f64| (c.clamp(0.0, 1.0) * max as f64).round() as u16;
        [scale(self.r), scale(self.g), scale(self.b)]
    }
}

impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color::rgb(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl AddAssign<Color> for Color {
    fn add_assign(&mut self, other: Color) {
        *self = *self + other;
    }
}

impl Sub<Color> for Color {
    type Output = Color;

    fn sub(self, other: Color) -> Color {
        Color::rgb(self.r - other.r, self.g - other.g, self.b - other.b)
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, s: f64) -> Color {
        Color::rgb(self.r * s, self.g * s, self.b * s)
    }
}

impl Mul<Color> for f64 {
    type Output = Color;

    fn mul(self, c: Color) -> Color {
        c * self
    }
}

/// Blends two colors channel by channel (the Hadamard product).
impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Color {
        Color::rgb(self.r * other.r, self.g * other.g, self.b * other.b)
    }
}

impl Div<f64> for Color {
    type Output = Color;

    fn div(self, s: f64) -> Color {
        self * (1.0 / s)
    }
}

impl Sum for Color {
    fn sum<I: Iterator<Item = Color>>(iter: I) -> Color {
        iter.fold(Color::black(), |acc, c| acc + c)
    }
}

#[test]
fn adding_and_subtracting_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 + c2, Color::rgb(1.6, 0.7, 1.0));
    assert_eq!(c1 - c2, Color::rgb(0.2, 0.5, 0.5));
}

#[test]
fn scaling_colors() {
    let c = Color::rgb(0.2, 0.3, 0.4);

    assert_eq!(c * 2.0, Color::rgb(0.4, 0.6, 0.8));
    assert_eq!(2.0 * c, Color::rgb(0.4, 0.6, 0.8));
    assert_eq!(c / 2.0, Color::rgb(0.1, 0.15, 0.2));
}

#[test]
fn summing_colors() {
    let total: Color = vec![Color::red(), Color::green(), Color::blue()]
        .into_iter()
        .sum();

    assert_eq!(total, Color::white());
}

#[test]
fn encoding_clamps_and_rounds() {
    assert_eq!(Color::rgb(1.5, 0.0, 0.0).to_bytes(255), [255, 0, 0]);
    assert_eq!(Color::rgb(0.0, 0.5, 0.0).to_bytes(255), [0, 128, 0]);
    assert_eq!(Color::rgb(-0.5, 0.0, 1.0).to_bytes(255), [0, 0, 255]);
}

#[test]
fn colors_deserialize_from_triples() {
    let c: Color = serde_json::from_str("[0.1, 0.2, 0.3]").unwrap();
    assert_eq!(c, Color::rgb(0.1, 0.2, 0.3));
}
