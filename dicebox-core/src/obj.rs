/// Wavefront OBJ and MTL parsers
use nalgebra::{Point3, Vector2, Vector3, Vector4};
use nom::{
    bytes::complete::take_till1,
    character::complete::{char, i64 as integer, space0, space1},
    combinator::{all_consuming, opt, verify},
    multi::many1,
    number::complete::float,
    sequence::{preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

use crate::geometry::Material;

/// A statement in an OBJ or MTL file could not be understood
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct ObjParseError {
    pub line: usize,
    pub message: String,
}

impl ObjParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// One face corner with zero-based attribute indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjCorner {
    pub position: usize,
    pub tex_coord: Option<usize>,
    pub normal: Option<usize>,
}

/// A polygon as written in the file, before triangulation
#[derive(Debug, Clone, PartialEq)]
pub struct ObjFace {
    pub corners: Vec<ObjCorner>,
    /// Index into [`ObjDocument::material_names`]
    pub material: Option<usize>,
}

impl ObjFace {
    /// Fan-triangulate the polygon: `(0, k, k + 1)` for every k
    pub fn triangles(&self) -> impl Iterator<Item = [ObjCorner; 3]> + '_ {
        let (first, rest) = match self.corners.split_first() {
            Some((first, rest)) => (Some(*first), rest),
            None => (None, &[][..]),
        };
        rest.windows(2)
            .filter_map(move |pair| first.map(|first| [first, pair[0], pair[1]]))
    }
}

/// Everything an OBJ file declares, with all shapes concatenated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjDocument {
    pub positions: Vec<Point3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub tex_coords: Vec<Vector2<f32>>,
    pub faces: Vec<ObjFace>,
    pub material_libs: Vec<String>,
    /// Material names in order of first `usemtl`
    pub material_names: Vec<String>,
}

/// A material declared by `newmtl`
#[derive(Debug, Clone, PartialEq)]
pub struct MtlEntry {
    pub name: String,
    pub material: Material,
    pub diffuse_map: Option<String>,
}

/// Parse the text of an OBJ file
pub fn parse_obj(input: &str) -> Result<ObjDocument, ObjParseError> {
    let mut doc = ObjDocument::default();
    let mut current_material = None;

    for (number, statement) in statements(input) {
        let (args, keyword) = split_keyword(statement, number)?;
        let malformed = || ObjParseError::new(number, format!("malformed `{keyword}` statement"));

        match keyword {
            "v" => {
                let values = floats(args).map_err(|_| malformed())?;
                if values.len() < 3 {
                    return Err(malformed());
                }
                doc.positions.push(Point3::new(values[0], values[1], values[2]));
            }
            "vn" => {
                let values = floats(args).map_err(|_| malformed())?;
                if values.len() < 3 {
                    return Err(malformed());
                }
                doc.normals.push(Vector3::new(values[0], values[1], values[2]));
            }
            "vt" => {
                let values = floats(args).map_err(|_| malformed())?;
                let v = values.get(1).copied().unwrap_or(0.0);
                doc.tex_coords.push(Vector2::new(values[0], v));
            }
            "f" => {
                let (_, raw) = face_corners(args).map_err(|_| malformed())?;
                if raw.len() < 3 {
                    return Err(ObjParseError::new(number, "face needs at least 3 vertices"));
                }
                let corners = raw
                    .into_iter()
                    .map(|(position, tex_coord, normal)| -> Result<ObjCorner, ObjParseError> {
                        Ok(ObjCorner {
                            position: resolve(position, doc.positions.len(), number)?,
                            tex_coord: tex_coord
                                .map(|i| resolve(i, doc.tex_coords.len(), number))
                                .transpose()?,
                            normal: normal
                                .map(|i| resolve(i, doc.normals.len(), number))
                                .transpose()?,
                        })
                    })
                    .collect::<Result<Vec<_>, ObjParseError>>()?;
                doc.faces.push(ObjFace {
                    corners,
                    material: current_material,
                });
            }
            "usemtl" => {
                let name = args.trim();
                let index = match doc.material_names.iter().position(|known| known == name) {
                    Some(index) => index,
                    None => {
                        doc.material_names.push(name.to_string());
                        doc.material_names.len() - 1
                    }
                };
                current_material = Some(index);
            }
            "mtllib" => {
                doc.material_libs
                    .extend(args.split_whitespace().map(str::to_string));
            }
            // Shapes, groups and smoothing groups are concatenated away.
            "o" | "g" | "s" => {}
            other => {
                log::warn!("Skipping unsupported OBJ statement `{}` on line {}", other, number);
            }
        }
    }

    Ok(doc)
}

/// Parse the text of an MTL file
pub fn parse_mtl(input: &str) -> Result<Vec<MtlEntry>, ObjParseError> {
    let mut entries: Vec<MtlEntry> = Vec::new();

    for (number, statement) in statements(input) {
        let (args, keyword) = split_keyword(statement, number)?;
        if keyword == "newmtl" {
            entries.push(MtlEntry {
                name: args.trim().to_string(),
                material: Material::default(),
                diffuse_map: None,
            });
            continue;
        }

        let Some(entry) = entries.last_mut() else {
            // Statements before the first `newmtl` have nothing to attach to.
            continue;
        };
        let malformed = || ObjParseError::new(number, format!("malformed `{keyword}` statement"));
        let color = |values: Vec<f32>| -> Result<Vector4<f32>, ObjParseError> {
            match values.as_slice() {
                [r, g, b, ..] => Ok(Vector4::new(*r, *g, *b, 1.0)),
                [gray, ..] => Ok(Vector4::new(*gray, *gray, *gray, 1.0)),
                [] => Err(malformed()),
            }
        };

        match keyword {
            "Ka" => entry.material.ambient = color(floats(args).map_err(|_| malformed())?)?,
            "Kd" => {
                let alpha = entry.material.diffuse.w;
                entry.material.diffuse = color(floats(args).map_err(|_| malformed())?)?;
                entry.material.diffuse.w = alpha;
            }
            "Ks" => entry.material.specular = color(floats(args).map_err(|_| malformed())?)?,
            "Ns" => entry.material.shininess = first_float(args).ok_or_else(malformed)?,
            "d" => entry.material.diffuse.w = first_float(args).ok_or_else(malformed)?,
            "Tr" => entry.material.diffuse.w = 1.0 - first_float(args).ok_or_else(malformed)?,
            // Options such as `-bm 1.0` come first; the file name is last.
            "map_Kd" => entry.diffuse_map = args.split_whitespace().last().map(str::to_string),
            _ => {}
        }
    }

    Ok(entries)
}

/// Non-empty statements with comments stripped, numbered from 1
fn statements(input: &str) -> impl Iterator<Item = (usize, &str)> {
    input.lines().enumerate().filter_map(|(index, line)| {
        let line = match line.find('#') {
            Some(comment) => &line[..comment],
            None => line,
        };
        let line = line.trim();
        (!line.is_empty()).then_some((index + 1, line))
    })
}

fn split_keyword(statement: &str, line: usize) -> Result<(&str, &str), ObjParseError> {
    let parsed: IResult<&str, &str> = take_till1(|c: char| c.is_whitespace())(statement);
    parsed.map_err(|_| ObjParseError::new(line, "missing keyword"))
}

/// Whitespace separated finite floats running to the end of the statement
fn floats(input: &str) -> Result<Vec<f32>, nom::Err<nom::error::Error<&str>>> {
    let finite = verify(float, |value: &f32| value.is_finite());
    all_consuming(terminated(many1(preceded(space1, finite)), space0))(input)
        .map(|(_, values)| values)
}

fn first_float(input: &str) -> Option<f32> {
    floats(input).ok().and_then(|values| values.first().copied())
}

type RawCorner = (i64, Option<i64>, Option<i64>);

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`
fn face_corner(input: &str) -> IResult<&str, RawCorner> {
    let (input, (position, tex_coord, normal)) = tuple((
        integer,
        opt(preceded(char('/'), opt(integer))),
        opt(preceded(char('/'), integer)),
    ))(input)?;
    Ok((input, (position, tex_coord.flatten(), normal)))
}

fn face_corners(input: &str) -> IResult<&str, Vec<RawCorner>> {
    all_consuming(terminated(many1(preceded(space1, face_corner)), space0))(input)
}

/// Turn a one-based (or negative, relative) OBJ index into a zero-based one
fn resolve(index: i64, declared: usize, line: usize) -> Result<usize, ObjParseError> {
    let resolved = match index {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => (declared as i64 + i).try_into().ok(),
    };
    resolved.ok_or_else(|| ObjParseError::new(line, format!("invalid vertex index {index}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "\
# a unit square
mtllib square.mtl
o square
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vn 0 0 1
usemtl red
f 1/1/1 2/2/1 3/3/1 4/1/1
";

    #[test]
    fn test_parse_square() {
        let doc = parse_obj(SQUARE).unwrap();
        assert_eq!(doc.positions.len(), 4);
        assert_eq!(doc.tex_coords.len(), 3);
        assert_eq!(doc.normals.len(), 1);
        assert_eq!(doc.material_libs, vec!["square.mtl".to_string()]);
        assert_eq!(doc.material_names, vec!["red".to_string()]);

        let face = &doc.faces[0];
        assert_eq!(face.material, Some(0));
        assert_eq!(
            face.corners[1],
            ObjCorner {
                position: 1,
                tex_coord: Some(1),
                normal: Some(0)
            }
        );
    }

    #[test]
    fn test_fan_triangulation() {
        let doc = parse_obj(SQUARE).unwrap();
        let triangles: Vec<[usize; 3]> = doc.faces[0]
            .triangles()
            .map(|tri| [tri[0].position, tri[1].position, tri[2].position])
            .collect();
        assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_negative_and_normal_only_indices() {
        let doc = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf -3//-1 -2//-1 -1//-1\n").unwrap();
        let corners = &doc.faces[0].corners;
        assert_eq!(corners[0].position, 0);
        assert_eq!(corners[2].position, 2);
        assert_eq!(corners[0].tex_coord, None);
        assert_eq!(corners[0].normal, Some(0));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 one 0\n").unwrap_err();
        assert_eq!(err.line, 3);

        let err = parse_obj("v 0 0 0\nf 1 0 1\n").unwrap_err();
        assert_eq!(err.line, 2);

        let err = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\n").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nv nan 0 0\nf 1 2 3\nf 4 2 3\n").unwrap_err();
        assert_eq!(err.line, 4);

        let err = parse_obj("v 0 0 0\nvn 0 inf 1\n").unwrap_err();
        assert_eq!(err.line, 2);
        let err = parse_obj("vt 0.5 -infinity\n").unwrap_err();
        assert_eq!(err.line, 1);
        let err = parse_obj("v 1e39 0 0\n").unwrap_err();
        assert_eq!(err.line, 1);

        let err = parse_mtl("newmtl red\nKd 1 NaN 0\n").unwrap_err();
        assert_eq!(err.line, 2);
        let err = parse_mtl("newmtl red\nNs inf\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unknown_statements_are_skipped() {
        let doc = parse_obj("v 0 0 0\nl 1 1\ncurv 0 1 1\n").unwrap();
        assert_eq!(doc.positions.len(), 1);
        assert!(doc.faces.is_empty());
    }

    #[test]
    fn test_parse_mtl() {
        let entries = parse_mtl(
            "newmtl red\nKa 0.2 0 0\nKd 1 0 0\nKs 0.5 0.5 0.5\nNs 64\nd 0.5\nmap_Kd -bm 1 wood.jpg\n\nnewmtl plain\n",
        )
        .unwrap();
        assert_eq!(entries.len(), 2);

        let red = &entries[0];
        assert_eq!(red.name, "red");
        assert_eq!(red.material.ambient, Vector4::new(0.2, 0.0, 0.0, 1.0));
        assert_eq!(red.material.diffuse, Vector4::new(1.0, 0.0, 0.0, 0.5));
        assert_eq!(red.material.shininess, 64.0);
        assert_eq!(red.diffuse_map.as_deref(), Some("wood.jpg"));

        assert_eq!(entries[1].material, Material::default());
    }
}
