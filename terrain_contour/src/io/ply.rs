//! Reader for the vertex positions of PLY files (ASCII and binary).
//!
//! Only the `x`, `y` and `z` properties of the `vertex` element are kept;
//! every other property and element is parsed and discarded.

use crate::error::{ContourError, Result};
use crate::geometry::Point3;
use crate::point_set::PointSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "char" | "int8" => Ok(Self::I8),
            "uchar" | "uint8" => Ok(Self::U8),
            "short" | "int16" => Ok(Self::I16),
            "ushort" | "uint16" => Ok(Self::U16),
            "int" | "int32" => Ok(Self::I32),
            "uint" | "uint32" => Ok(Self::U32),
            "float" | "float32" => Ok(Self::F32),
            "double" | "float64" => Ok(Self::F64),
            other => Err(ContourError::Parse(format!("unknown PLY scalar type '{}'", other))),
        }
    }

    fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

#[derive(Debug, Clone)]
enum Property {
    Scalar { name: String, ty: ScalarType },
    List { count_ty: ScalarType, item_ty: ScalarType },
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug, Clone)]
struct Header {
    format: PlyFormat,
    elements: Vec<Element>,
}

/// Upper bound on the up-front reservation; the header count is untrusted.
const MAX_RESERVED_VERTICES: usize = 1 << 20;

fn parse_err(msg: impl Into<String>) -> ContourError {
    ContourError::Parse(msg.into())
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<Header> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if line.trim() != "ply" {
        return Err(parse_err("missing 'ply' magic line"));
    }
    let mut format = None;
    let mut elements: Vec<Element> = Vec::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(parse_err("unexpected end of file inside PLY header"));
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["end_header"] => break,
            ["format", kind, _version] => {
                format = Some(match *kind {
                    "ascii" => PlyFormat::Ascii,
                    "binary_little_endian" => PlyFormat::BinaryLittleEndian,
                    "binary_big_endian" => PlyFormat::BinaryBigEndian,
                    other => return Err(parse_err(format!("unknown PLY format '{}'", other))),
                });
            }
            ["element", name, count] => {
                let count = count
                    .parse()
                    .map_err(|e| parse_err(format!("element {}: {}", name, e)))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            ["property", "list", count_ty, item_ty, _name] => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| parse_err("property declared before any element"))?;
                element.properties.push(Property::List {
                    count_ty: ScalarType::parse(count_ty)?,
                    item_ty: ScalarType::parse(item_ty)?,
                });
            }
            ["property", ty, name] => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| parse_err("property declared before any element"))?;
                element.properties.push(Property::Scalar {
                    name: name.to_string(),
                    ty: ScalarType::parse(ty)?,
                });
            }
            ["comment", ..] | ["obj_info", ..] | [] => {}
            _ => return Err(parse_err(format!("unrecognised PLY header line '{}'", line.trim()))),
        }
    }
    let format = format.ok_or_else(|| parse_err("PLY header has no format line"))?;
    Ok(Header { format, elements })
}

/// Positions of the x, y, z scalar properties within a vertex record.
fn xyz_indices(element: &Element) -> Result<[usize; 3]> {
    let find = |axis: &str| {
        element
            .properties
            .iter()
            .position(|p| matches!(p, Property::Scalar { name, .. } if name == axis))
            .ok_or_else(|| parse_err(format!("vertex element has no '{}' property", axis)))
    };
    Ok([find("x")?, find("y")?, find("z")?])
}

fn read_scalar<R: Read>(reader: &mut R, ty: ScalarType, big_endian: bool) -> Result<f64> {
    let mut buf = [0u8; 8];
    let n = ty.size();
    reader.read_exact(&mut buf[..n]).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => parse_err("unexpected end of file in PLY body"),
        _ => ContourError::Io(e),
    })?;
    let bytes: &[u8] = &buf[..n];
    macro_rules! decode {
        ($t:ty) => {{
            let arr = bytes.try_into().map_err(|_| parse_err("short PLY scalar"))?;
            if big_endian {
                <$t>::from_be_bytes(arr) as f64
            } else {
                <$t>::from_le_bytes(arr) as f64
            }
        }};
    }
    Ok(match ty {
        ScalarType::I8 => bytes[0] as i8 as f64,
        ScalarType::U8 => bytes[0] as f64,
        ScalarType::I16 => decode!(i16),
        ScalarType::U16 => decode!(u16),
        ScalarType::I32 => decode!(i32),
        ScalarType::U32 => decode!(u32),
        ScalarType::F32 => decode!(f32),
        ScalarType::F64 => decode!(f64),
    })
}

/// Reads one binary record, returning the values of its scalar properties
/// (list properties are skipped and contribute `NaN`).
fn read_binary_record<R: Read>(reader: &mut R, element: &Element, big_endian: bool) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(element.properties.len());
    for prop in &element.properties {
        match prop {
            Property::Scalar { ty, .. } => values.push(read_scalar(reader, *ty, big_endian)?),
            Property::List { count_ty, item_ty } => {
                let count = read_scalar(reader, *count_ty, big_endian)? as usize;
                for _ in 0..count {
                    read_scalar(reader, *item_ty, big_endian)?;
                }
                values.push(f64::NAN);
            }
        }
    }
    Ok(values)
}

fn read_ascii_record<R: BufRead>(reader: &mut R, element: &Element, line: &mut String) -> Result<Vec<f64>> {
    line.clear();
    if reader.read_line(line)? == 0 {
        return Err(parse_err(format!("unexpected end of file in element '{}'", element.name)));
    }
    let mut tokens = line.split_whitespace();
    let mut next = || -> Result<f64> {
        let tok = tokens
            .next()
            .ok_or_else(|| parse_err(format!("short record in element '{}'", element.name)))?;
        tok.parse::<f64>()
            .map_err(|e| parse_err(format!("element {}: '{}': {}", element.name, tok, e)))
    };
    let mut values = Vec::with_capacity(element.properties.len());
    for prop in &element.properties {
        match prop {
            Property::Scalar { .. } => values.push(next()?),
            Property::List { .. } => {
                let count = next()? as usize;
                for _ in 0..count {
                    next()?;
                }
                values.push(f64::NAN);
            }
        }
    }
    Ok(values)
}

/// Reads the vertex positions of a PLY file.
pub fn read_points_ply(path: &Path) -> Result<PointSet> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = read_header(&mut reader)?;
    let mut line = String::new();
    for element in &header.elements {
        let is_vertex = element.name == "vertex";
        let indices = if is_vertex { Some(xyz_indices(element)?) } else { None };
        let reserve = if is_vertex {
            element.count.min(MAX_RESERVED_VERTICES)
        } else {
            0
        };
        let mut pts = Vec::with_capacity(reserve);
        for _ in 0..element.count {
            let values = match header.format {
                PlyFormat::Ascii => read_ascii_record(&mut reader, element, &mut line)?,
                PlyFormat::BinaryLittleEndian => read_binary_record(&mut reader, element, false)?,
                PlyFormat::BinaryBigEndian => read_binary_record(&mut reader, element, true)?,
            };
            if let Some([ix, iy, iz]) = indices {
                pts.push(Point3::new(values[ix], values[iy], values[iz]));
            }
        }
        if is_vertex {
            log::info!("Ply file read: {} vertices", pts.len());
            return Ok(PointSet::new(pts));
        }
    }
    Err(parse_err("PLY file has no vertex element"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn ascii_vertices_with_extra_properties() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        let mut f = File::create(&path).unwrap();
        write!(
            f,
            "ply\nformat ascii 1.0\ncomment test\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nelement face 0\nproperty list uchar int vertex_indices\nend_header\n1 2 3 255\n4.5 5.5 6.5 0\n"
        )
        .unwrap();
        drop(f);
        let pts = read_points_ply(&path).unwrap();
        assert_eq!(pts.points(), &[Point3::new(1.0, 2.0, 3.0), Point3::new(4.5, 5.5, 6.5)]);
    }

    #[test]
    fn binary_little_endian_vertices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        let mut f = File::create(&path).unwrap();
        f.write_all(
            b"ply\nformat binary_little_endian 1.0\nelement vertex 2\nproperty double x\nproperty double y\nproperty double z\nproperty uchar red\nend_header\n",
        )
        .unwrap();
        for (p, red) in [([1.0f64, -2.0, 3.0], 7u8), ([0.25, 0.5, 0.75], 9u8)] {
            for v in p {
                f.write_all(&v.to_le_bytes()).unwrap();
            }
            f.write_all(&[red]).unwrap();
        }
        drop(f);
        let pts = read_points_ply(&path).unwrap();
        assert_eq!(pts.points(), &[Point3::new(1.0, -2.0, 3.0), Point3::new(0.25, 0.5, 0.75)]);
    }

    #[test]
    fn missing_magic_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        std::fs::write(&path, "not a ply\n").unwrap();
        assert!(matches!(read_points_ply(&path), Err(ContourError::Parse(_))));
    }

    #[test]
    fn oversized_vertex_count_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 1000000000000000\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n",
        )
        .unwrap();
        assert!(matches!(read_points_ply(&path), Err(ContourError::Parse(_))));
    }

    #[test]
    fn truncated_binary_body_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        let mut f = File::create(&path).unwrap();
        f.write_all(
            b"ply\nformat binary_little_endian 1.0\nelement vertex 3\nproperty double x\nproperty double y\nproperty double z\nend_header\n",
        )
        .unwrap();
        for v in [1.0f64, 2.0, 3.0, 4.0] {
            f.write_all(&v.to_le_bytes()).unwrap();
        }
        drop(f);
        assert!(matches!(read_points_ply(&path), Err(ContourError::Parse(_))));
    }

    #[test]
    fn binary_big_endian_skips_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        let mut f = File::create(&path).unwrap();
        f.write_all(
            b"ply\nformat binary_big_endian 1.0\nelement vertex 2\nproperty float x\nproperty list uchar int ids\nproperty float y\nproperty short z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n",
        )
        .unwrap();
        let rows = vec![
            (1.5f32, vec![7i32, 8], -2.0f32, 3i16),
            (0.25f32, Vec::new(), 4.75f32, -6i16),
        ];
        for (x, ids, y, z) in rows {
            f.write_all(&x.to_be_bytes()).unwrap();
            f.write_all(&[ids.len() as u8]).unwrap();
            for id in &ids {
                f.write_all(&id.to_be_bytes()).unwrap();
            }
            f.write_all(&y.to_be_bytes()).unwrap();
            f.write_all(&z.to_be_bytes()).unwrap();
        }
        f.write_all(&[2u8]).unwrap();
        f.write_all(&0i32.to_be_bytes()).unwrap();
        f.write_all(&1i32.to_be_bytes()).unwrap();
        drop(f);
        let pts = read_points_ply(&path).unwrap();
        assert_eq!(pts.points(), &[Point3::new(1.5, -2.0, 3.0), Point3::new(0.25, 4.75, -6.0)]);
    }
}
