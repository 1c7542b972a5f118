use crate::error::{ContourError, Result};
use crate::geometry::Point3;
use crate::point_set::PointSet;
use las::{point::Point as LasPoint, Reader};
use std::path::Path;

/// Reads a LAS/LAZ file. LAS is z-up, so the elevation is moved onto the
/// `y` axis and northing onto `z`.
pub fn read_points_las(path: &Path) -> Result<PointSet> {
    let mut reader = Reader::from_path(path).map_err(|e| ContourError::Parse(e.to_string()))?;
    let mut pts = Vec::new();
    for wrapped in reader.points() {
        let p: LasPoint = wrapped.map_err(|e| ContourError::Parse(e.to_string()))?;
        pts.push(Point3::new(p.x, p.z, p.y));
    }
    Ok(PointSet::new(pts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use las::{point::Format, Builder, Version, Writer};

    #[test]
    fn elevation_moves_onto_y() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.las");
        let mut builder = Builder::default();
        builder.point_format = Format::new(0).unwrap();
        builder.version = Version::new(1, 2);
        let mut writer = Writer::from_path(&path, builder.into_header().unwrap()).unwrap();
        for (x, y, z) in [(1.0, 2.0, 3.0), (4.5, -1.25, 0.5)] {
            writer
                .write_point(LasPoint { x, y, z, ..Default::default() })
                .unwrap();
        }
        writer.close().unwrap();

        let pts = read_points_las(&path).unwrap();
        let expected = [Point3::new(1.0, 3.0, 2.0), Point3::new(4.5, 0.5, -1.25)];
        assert_eq!(pts.len(), expected.len());
        for (p, e) in pts.iter().zip(&expected) {
            assert!((p.x - e.x).abs() < 1e-6);
            assert!((p.y - e.y).abs() < 1e-6);
            assert!((p.z - e.z).abs() < 1e-6);
        }
    }
}
