/// STL file parser for binary and ASCII formats
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::preceded,
    IResult,
};
use thiserror::Error;

/// Errors produced while reading STL data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StlError {
    #[error("File too small to be a valid STL")]
    TooSmall,

    #[error("Unexpected end of file: header declares {declared} triangles")]
    Truncated { declared: usize },

    #[error("Failed to parse ASCII STL: {0}")]
    Ascii(String),

    #[error("Facet {facet} has a NaN or infinite coordinate")]
    NonFinite { facet: usize },
}

/// One STL facet: a declared normal and three corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    pub normal: Vector3<f32>,
    pub vertices: [Point3<f32>; 3],
}

impl Facet {
    /// Exporters often write a zero normal and leave shading to the reader
    pub fn has_normal(&self) -> bool {
        self.normal.norm_squared() > 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.normal.iter().all(|value| value.is_finite())
            && self
                .vertices
                .iter()
                .all(|vertex| vertex.iter().all(|value| value.is_finite()))
    }
}

/// Fail on the first facet carrying a NaN or infinity
fn finite(facets: Vec<Facet>) -> Result<Vec<Facet>, StlError> {
    match facets.iter().position(|facet| !facet.is_finite()) {
        Some(facet) => Err(StlError::NonFinite { facet }),
        None => Ok(facets),
    }
}

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Vec<Facet>, StlError> {
    let (body, declared) = binary_header(data).map_err(|_| StlError::TooSmall)?;
    let declared = declared as usize;
    if body.len() / FACET_LEN < declared {
        return Err(StlError::Truncated { declared });
    }

    let (_, facets) =
        count(binary_facet, declared)(body).map_err(|_| StlError::Truncated { declared })?;
    finite(facets)
}

/// Skip the 80-byte header and read the triangle count
fn binary_header(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(take(HEADER_LEN), le_u32)(input)
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], Vector3<f32>> {
    let (input, x) = le_f32(input)?;
    let (input, y) = le_f32(input)?;
    let (input, z) = le_f32(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Facet> {
    let (input, normal) = binary_vector(input)?;
    let (input, v1) = binary_vector(input)?;
    let (input, v2) = binary_vector(input)?;
    let (input, v3) = binary_vector(input)?;
    // Attribute byte count, unused
    let (input, _) = le_u16(input)?;

    Ok((
        input,
        Facet {
            normal,
            vertices: [Point3::from(v1), Point3::from(v2), Point3::from(v3)],
        },
    ))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Vec<Facet>, StlError> {
    match parse_ascii_stl_impl(input) {
        Ok((_, facets)) => finite(facets),
        Err(e) => Err(StlError::Ascii(format!("{:?}", e))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?; // Optional name
    let (input, facets) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;

    Ok((input, facets))
}

fn parse_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((
        input,
        Facet {
            normal,
            vertices: [v1, v2, v3],
        },
    ))
}

fn parse_vertex(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, position) = parse_vector3(input)?;
    Ok((input, Point3::from(position)))
}

fn parse_vector3(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Vec<Facet>, StlError> {
    // Binary files may also start with "solid", so ASCII is only a first guess.
    if data.len() > 5 && &data[0..5] == b"solid" {
        if let Ok(text) = std::str::from_utf8(data) {
            match parse_ascii_stl(text) {
                Ok(facets) => return Ok(facets),
                Err(err @ StlError::NonFinite { .. }) => return Err(err),
                Err(_) => {}
            }
        }
    }

    parse_binary_stl(data)
}
