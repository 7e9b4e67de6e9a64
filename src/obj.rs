use std::fs::File;
use std::io::{ BufRead, BufReader };
use std::path::Path;
use std::str::FromStr;

use log::debug;

use crate::tuple::Tuple4D;
use crate::shape::Shape;
use crate::material::Material;
use crate::arena::{ ShapeArena, ShapeId };
use crate::error::{ ObjError, ObjResult };

/// One corner of a face: a vertex index and an optional normal index, both
/// zero-based and already checked against the records read so far.
type FaceVertex = (usize, Option<usize>);

/// Triangles collected under one `g` name. The unnamed group comes first.
#[derive(Clone, Debug, Default)]
pub struct ObjGroup {
    pub name: String,
    pub triangles: Vec<Shape>,
}

/// The triangles and records read from a Wavefront OBJ file.
///
/// Only `v`, `vn`, `f` and `g` records are understood. Anything else (texture
/// coordinates, materials, smoothing groups, comments) is counted in
/// `ignored_lines` and skipped.
#[derive(Clone, Debug)]
pub struct ObjModel {
    pub ignored_lines: usize,

    pub vertices: Vec<Tuple4D>,
    pub normals: Vec<Tuple4D>,
    pub groups: Vec<ObjGroup>,
}

impl Default for ObjModel {
    fn default() -> ObjModel {
        ObjModel {
            ignored_lines: 0,
            vertices: Vec::new(),
            normals: Vec::new(),
            groups: vec![ObjGroup::default()],
        }
    }
}

impl ObjModel {
    /// Reads and parses the OBJ file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> ObjResult<ObjModel> {
        let file = File::open(path)?;
        ObjModel::parse(BufReader::new(file))
    }

    /// Parses OBJ records line by line.
    ///
    /// A sample OBJ file may look like the following:
    ///
    /// ```obj
    /// v -1 1 0
    /// v -1 0 0
    /// v 1 0 0
    /// v 1 1 0
    ///
    /// g FirstGroup
    /// f 1 2 3
    /// g SecondGroup
    /// f 1 3 4
    /// ```
    ///
    /// `v` is a vertex and `vn` a vertex normal. `f` is a face over earlier
    /// vertices, given as `v`, `v/vt/vn` or `v//vn` (one-based, or negative
    /// to count back from the latest record). `g` switches the group that
    /// later faces land in; groups do not nest.
    pub fn parse<R: BufRead>(reader: R) -> ObjResult<ObjModel> {
        let mut model = ObjModel::default();
        let mut current = 0;

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let number = n + 1;

            let mut params = line.split_whitespace();
            let command = match params.next() {
                Some(command) => command,
                None => continue,
            };
            let args: Vec<&str> = params.collect();

            match command {
                "v" => {
                    let [x, y, z] = parse_triple(&args, number)?;
                    model.vertices.push(Tuple4D::point(x, y, z));
                },

                "vn" => {
                    let [x, y, z] = parse_triple(&args, number)?;
                    model.normals.push(Tuple4D::vector(x, y, z));
                },

                "f" => {
                    let face = args.iter()
                        .map(|corner| model.parse_corner(corner, number))
                        .collect::<ObjResult<Vec<FaceVertex>>>()?;

                    if face.len() < 3 {
                        return Err(parse_error(number, "a face needs at least three vertices"));
                    }

                    let triangles = model.fan_triangulation(&face);
                    model.groups[current].triangles.extend(triangles);
                },

                "g" => {
                    let name = args.join(" ");
                    current = match model.groups.iter().position(|g| g.name == name) {
                        Some(index) => index,
                        None => {
                            model.groups.push(ObjGroup { name, triangles: Vec::new() });
                            model.groups.len() - 1
                        },
                    };
                },

                _ => model.ignored_lines += 1,
            }
        }

        debug!("parsed OBJ: {} vertices, {} normals, {} triangles, {} lines ignored",
            model.vertices.len(), model.normals.len(), model.triangle_count(),
            model.ignored_lines);

        Ok(model)
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.triangles.len()).sum()
    }

    /// The group holding faces read under `g name`, if any.
    pub fn group(&self, name: &str) -> Option<&ObjGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Gives every triangle the same material.
    pub fn set_material(&mut self, material: Material) {
        for group in self.groups.iter_mut() {
            for triangle in group.triangles.iter_mut() {
                triangle.material = material;
            }
        }
    }

    /// Moves the triangles into `shapes` under a new, detached group.
    ///
    /// Triangles read before any `g` record are direct children; each named
    /// group becomes a subgroup.
    pub fn into_group(self, shapes: &mut ShapeArena) -> ObjResult<ShapeId> {
        let top = shapes.insert(Shape::group())?;

        for group in self.groups {
            if group.triangles.is_empty() {
                continue;
            }

            let parent = if group.name.is_empty() {
                top
            } else {
                shapes.insert_child(top, Shape::group())?
            };

            for triangle in group.triangles {
                shapes.insert_child(parent, triangle)?;
            }
        }

        Ok(top)
    }

    fn parse_corner(&self, corner: &str, line: usize) -> ObjResult<FaceVertex> {
        let attributes: Vec<&str> = corner.split('/').collect();
        if attributes.len() > 3 {
            return Err(parse_error(line, format!("malformed face vertex '{}'", corner)));
        }

        let v = parse_number::<i64>(attributes[0], line)?;
        let vertex = resolve_index(v, self.vertices.len())
            .ok_or(ObjError::VertexOutOfRange { line, index: v })?;

        // Texture coordinates are not used, so the middle attribute is skipped
        let normal = match attributes.get(2) {
            Some(vn) if !vn.is_empty() => {
                let vn = parse_number::<i64>(vn, line)?;
                let index = resolve_index(vn, self.normals.len())
                    .ok_or(ObjError::NormalOutOfRange { line, index: vn })?;
                Some(index)
            },
            _ => None,
        };

        Ok((vertex, normal))
    }

    /// Partitions a polygon into triangles.
    ///
    /// Faces may list more than three vertices, e.g. `f 1 2 3 4 5`. Since
    /// triangles are the only mesh primitive, the polygon is split into a
    /// fan around its first vertex:
    ///
    /// ```text
    ///         B *
    ///          / \
    ///         /   \
    ///        /     \
    ///     A *       * C
    ///       |       |
    ///       |       |
    ///       |       |
    ///     E * ----- * D
    /// ```
    ///
    /// giving `A-B-C`, `A-C-D` and `A-D-E`. A triangle is smooth when all
    /// three of its corners carry a normal.
    fn fan_triangulation(&self, face: &[FaceVertex]) -> Vec<Shape> {
        let mut triangles = Vec::with_capacity(face.len() - 2);
        let (a, an) = face[0];

        for i in 1..(face.len() - 1) {
            let (b, bn) = face[i];
            let (c, cn) = face[i + 1];

            let triangle = match (an, bn, cn) {
                (Some(n1), Some(n2), Some(n3)) => Shape::smooth_triangle(
                    self.vertices[a], self.vertices[b], self.vertices[c],
                    self.normals[n1], self.normals[n2], self.normals[n3],
                ),
                _ => Shape::triangle(self.vertices[a], self.vertices[b], self.vertices[c]),
            };

            triangles.push(triangle);
        }

        triangles
    }
}

fn parse_error<M: Into<String>>(line: usize, message: M) -> ObjError {
    ObjError::Parse { line, message: message.into() }
}

fn parse_number<T: FromStr>(token: &str, line: usize) -> ObjResult<T> {
    token.parse()
        .map_err(|_| parse_error(line, format!("'{}' is not a number", token)))
}

/// Reads the first three coordinates of a `v` or `vn` record. A trailing `w`
/// is allowed and dropped.
fn parse_triple(args: &[&str], line: usize) -> ObjResult<[f64; 3]> {
    if args.len() < 3 {
        return Err(parse_error(line, "expected three coordinates"));
    }

    Ok([
        parse_number(args[0], line)?,
        parse_number(args[1], line)?,
        parse_number(args[2], line)?,
    ])
}

/// Maps a one-based (or negative, counting back) OBJ index onto `0..len`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index > 0 {
        index - 1
    } else if index < 0 {
        len as i64 + index
    } else {
        return None;
    };

    if resolved >= 0 && (resolved as usize) < len {
        Some(resolved as usize)
    } else {
        None
    }
}

#[cfg(test)]
fn parse_str(source: &str) -> ObjModel {
    ObjModel::parse(source.as_bytes()).unwrap()
}

#[cfg(test)]
fn triangle_points(shape: &Shape) -> [Tuple4D; 3] {
    use crate::shape::ShapeType;

    match shape.ty {
        ShapeType::Triangle(ref t) => [t.p1, t.p2, t.p3],
        ShapeType::SmoothTriangle(ref s) => [s.triangle.p1, s.triangle.p2, s.triangle.p3],
        _ => panic!("not a triangle: {:?}", shape.ty),
    }
}

#[test]
fn ignoring_unrecognized_lines() {
    let model = parse_str("\
There was a young lady named Bright
who traveled much faster than light.
She set out one day
in a relative way,
and came back the previous night.
");

    assert_eq!(model.ignored_lines, 5);
    assert_eq!(model.triangle_count(), 0);
}

#[test]
fn vertex_records() {
    let model = parse_str("\
v -1 1 0
v -1.0000 0.5000 0.0000
v 1 0 0
v 1 1 0 1.0
");

    assert_eq!(model.vertices, vec![
        Tuple4D::point(-1.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.5, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 1.0, 0.0),
    ]);
}

#[test]
fn parsing_triangle_faces() {
    let model = parse_str("\
v -1 1 0
v -1 0 0
v 1 0 0
v 1 1 0

f 1 2 3
f 1 3 4
");

    let triangles = &model.groups[0].triangles;
    let v = &model.vertices;
    assert_eq!(triangles.len(), 2);
    assert_eq!(triangle_points(&triangles[0]), [v[0], v[1], v[2]]);
    assert_eq!(triangle_points(&triangles[1]), [v[0], v[2], v[3]]);
}

#[test]
fn triangulating_polygons() {
    let model = parse_str("\
v -1 1 0
v -1 0 0
v 1 0 0
v 1 1 0
v 0 2 0

f 1 2 3 4 5
");

    let triangles = &model.groups[0].triangles;
    let v = &model.vertices;
    assert_eq!(triangles.len(), 3);
    assert_eq!(triangle_points(&triangles[0]), [v[0], v[1], v[2]]);
    assert_eq!(triangle_points(&triangles[1]), [v[0], v[2], v[3]]);
    assert_eq!(triangle_points(&triangles[2]), [v[0], v[3], v[4]]);
}

#[test]
fn triangles_in_groups() {
    let model = parse_str("\
v -1 1 0
v -1 0 0
v 1 0 0
v 1 1 0

g FirstGroup
f 1 2 3
g SecondGroup
f 1 3 4
");

    let v = &model.vertices;
    let first = model.group("FirstGroup").unwrap();
    let second = model.group("SecondGroup").unwrap();
    assert_eq!(triangle_points(&first.triangles[0]), [v[0], v[1], v[2]]);
    assert_eq!(triangle_points(&second.triangles[0]), [v[0], v[2], v[3]]);
}

#[test]
fn converting_a_model_to_a_group() {
    let model = parse_str("\
v -1 1 0
v -1 0 0
v 1 0 0
v 1 1 0

f 1 2 4
g FirstGroup
f 1 2 3
g SecondGroup
f 1 3 4
g FirstGroup
f 2 3 4
");

    let mut shapes = ShapeArena::new();
    let g = model.into_group(&mut shapes).unwrap();

    let children = shapes.children(g).to_vec();
    assert_eq!(children.len(), 3);
    assert!(!shapes.get(children[0]).is_composite());
    assert_eq!(shapes.children(children[1]).len(), 2);
    assert_eq!(shapes.children(children[2]).len(), 1);
    assert_eq!(shapes.primitives(g).len(), 4);
    assert_eq!(shapes.parent(g), None);
}

#[test]
fn vertex_normal_records() {
    let model = parse_str("\
vn 0 0 1
vn 0.707 0 -0.707
vn 1 2 3
");

    assert_eq!(model.normals, vec![
        Tuple4D::vector(0.0, 0.0, 1.0),
        Tuple4D::vector(0.707, 0.0, -0.707),
        Tuple4D::vector(1.0, 2.0, 3.0),
    ]);
}

#[test]
fn faces_with_normals() {
    use crate::shape::ShapeType;

    let model = parse_str("\
v 0 1 0
v -1 0 0
v 1 0 0

vn -1 0 0
vn 1 0 0
vn 0 1 0

f 1//3 2//1 3//2
f 1/0/3 2/102/1 3/14/2
");

    let triangles = &model.groups[0].triangles;
    let t1 = match triangles[0].ty {
        ShapeType::SmoothTriangle(ref s) => *s,
        _ => panic!("expected a smooth triangle"),
    };

    assert_eq!(t1.triangle.p1, model.vertices[0]);
    assert_eq!(t1.triangle.p2, model.vertices[1]);
    assert_eq!(t1.triangle.p3, model.vertices[2]);
    assert_eq!(t1.n1, model.normals[2]);
    assert_eq!(t1.n2, model.normals[0]);
    assert_eq!(t1.n3, model.normals[1]);
    assert_eq!(triangles[0], triangles[1]);
}

#[test]
fn negative_indices_count_back() {
    let model = parse_str("\
v 0 0 0
v 1 0 0
v 0 1 0
f -3 -2 -1
");

    let v = &model.vertices;
    assert_eq!(triangle_points(&model.groups[0].triangles[0]), [v[0], v[1], v[2]]);
}

#[test]
fn malformed_records_are_errors() {
    let err = ObjModel::parse("v 1 0 0\nv 1 x 0\n".as_bytes()).unwrap_err();
    assert!(matches!(err, ObjError::Parse { line: 2, .. }));

    let err = ObjModel::parse("v 1 0\n".as_bytes()).unwrap_err();
    assert!(matches!(err, ObjError::Parse { line: 1, .. }));

    let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n";
    let err = ObjModel::parse(source.as_bytes()).unwrap_err();
    assert!(matches!(err, ObjError::VertexOutOfRange { line: 4, index: 9 }));

    let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//2\n";
    let err = ObjModel::parse(source.as_bytes()).unwrap_err();
    assert!(matches!(err, ObjError::NormalOutOfRange { line: 5, index: 2 }));

    let source = "v 0 0 0\nv 1 0 0\nf 1 2\n";
    let err = ObjModel::parse(source.as_bytes()).unwrap_err();
    assert!(matches!(err, ObjError::Parse { line: 3, .. }));

    let err = ObjModel::parse("f 0 1 2\n".as_bytes()).unwrap_err();
    assert!(matches!(err, ObjError::VertexOutOfRange { line: 1, index: 0 }));
}
