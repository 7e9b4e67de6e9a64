use std::io;
use std::io::{ BufWriter, Write };
use std::fs::File;
use std::path::Path;

use crate::color::Color;

/// PPM readers are only required to handle lines up to this long.
const PPM_LINE_WIDTH: usize = 70;

/// A canvas for drawing pixels.
///
/// This structure mostly stores the results of the ray tracer. Pixels are
/// kept column by column, addressed `[x][y]`, which is the order the camera
/// renders them in. Colors are stored unclamped.
///
/// Once rendering finishes, the `Canvas` can be encoded as a PPM image.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    columns: Vec<Vec<Color>>,
}

impl Canvas {
    /// Creates a black canvas with specified width and height.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            columns: vec![vec![Color::black(); height]; width],
        }
    }

    /// Assembles a canvas from finished columns, left to right.
    ///
    /// Short columns are padded with black and long ones cut to `height`.
    pub fn from_columns(height: usize, mut columns: Vec<Vec<Color>>) -> Canvas {
        for column in columns.iter_mut() {
            column.resize(height, Color::black());
        }

        Canvas { width: columns.len(), height, columns }
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. `x` is the column and `y` the row,
    /// both zero-indexed from the top left.
    ///
    /// # Examples
    ///
    /// Writing a pixel to the fourth column, second row on an 8-by-8 canvas:
    ///
    /// ```
    /// # use whitted::color::Color;
    /// # use whitted::canvas::Canvas;
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2).unwrap(), purple);
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.columns[x][y] = *pixel;
    }

    /// Reads a color from a location on the `Canvas`, or `None` when the
    /// location is out-of-bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        self.columns.get(x).and_then(|column| column.get(y)).copied()
    }

    pub fn column(&self, x: usize) -> Option<&[Color]> {
        self.columns.get(x).map(|column| column.as_slice())
    }

    /// Encodes the canvas as a plain (`P3`) PPM image.
    ///
    /// Every row starts on a new line, and no line exceeds 70 characters.
    /// Colors are clamped to `[0, 1]` and scaled to `[0, 255]` here.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?;

        let mut line = String::with_capacity(PPM_LINE_WIDTH);
        for y in 0..self.height {
            for column in self.columns.iter() {
                for value in column[y].to_bytes(255).iter() {
                    let token = value.to_string();

                    if !line.is_empty() && line.len() + 1 + token.len() > PPM_LINE_WIDTH {
                        writeln!(out, "{}", line)?;
                        line.clear();
                    }

                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(&token);
                }
            }

            writeln!(out, "{}", line)?;
            line.clear();
        }

        out.flush()
    }

    /// Saves the canvas to a PPM file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        self.write_ppm(BufWriter::new(file))
    }
}

#[cfg(test)]
fn ppm_lines(canvas: &Canvas) -> Vec<String> {
    let mut out = Vec::new();
    canvas.write_ppm(&mut out).unwrap();
    String::from_utf8(out).unwrap().lines().map(String::from).collect()
}

#[test]
fn new_canvas_is_black() {
    let canvas = Canvas::new(10, 20);

    assert_eq!(canvas.width, 10);
    assert_eq!(canvas.height, 20);
    for x in 0..10 {
        for y in 0..20 {
            assert_eq!(canvas.read_pixel(x, y), Some(Color::black()));
        }
    }

    assert_eq!(canvas.read_pixel(10, 0), None);
    assert_eq!(canvas.read_pixel(0, 20), None);
}

#[test]
fn canvas_from_columns() {
    let red = Color::red();
    let canvas = Canvas::from_columns(2, vec![
        vec![red, Color::white()],
        vec![Color::blue()],
    ]);

    assert_eq!(canvas.width, 2);
    assert_eq!(canvas.read_pixel(0, 1), Some(Color::white()));
    assert_eq!(canvas.read_pixel(1, 0), Some(Color::blue()));
    assert_eq!(canvas.read_pixel(1, 1), Some(Color::black()));
    assert_eq!(canvas.column(0), Some(&[red, Color::white()][..]));
}

#[test]
fn ppm_header_and_pixel_data() {
    let mut canvas = Canvas::new(5, 3);
    canvas.write_pixel(0, 0, &Color::rgb(1.5, 0.0, 0.0));
    canvas.write_pixel(2, 1, &Color::rgb(0.0, 0.5, 0.0));
    canvas.write_pixel(4, 2, &Color::rgb(-0.5, 0.0, 1.0));

    let lines = ppm_lines(&canvas);
    assert_eq!(lines, vec![
        "P3",
        "5 3",
        "255",
        "255 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
        "0 0 0 0 0 0 0 128 0 0 0 0 0 0 0",
        "0 0 0 0 0 0 0 0 0 0 0 0 0 0 255",
    ]);
}

#[test]
fn ppm_splits_long_lines() {
    let mut canvas = Canvas::new(10, 2);
    for x in 0..10 {
        for y in 0..2 {
            canvas.write_pixel(x, y, &Color::rgb(1.0, 0.8, 0.6));
        }
    }

    let lines = ppm_lines(&canvas);
    assert_eq!(&lines[3..], &[
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204",
        "153 255 204 153 255 204 153 255 204 153 255 204 153",
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204",
        "153 255 204 153 255 204 153 255 204 153 255 204 153",
    ]);
    assert!(lines.iter().all(|l| l.len() <= PPM_LINE_WIDTH));
}

#[test]
fn ppm_ends_with_newline() {
    let canvas = Canvas::new(5, 3);
    let mut out = Vec::new();
    canvas.write_ppm(&mut out).unwrap();

    assert_eq!(out.last(), Some(&b'\n'));
}
