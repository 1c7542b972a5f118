//! File input and output helpers.

pub mod geojson;
#[cfg(feature = "las")]
pub mod las;
pub mod mask;
pub mod ply;

use crate::area::AreaReport;
use crate::error::{ContourError, Result};
use crate::geometry::Point3;
use crate::point_set::PointSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Reads a file to string.
pub fn read_to_string(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Writes a string to a file, replacing any existing contents.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

/// Reads all lines of a text file.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(reader.lines().collect::<std::io::Result<Vec<_>>>()?)
}

/// Reads `x,y,z` triples, one per line, separated by commas or whitespace.
/// Blank lines and `#` comments are skipped, as is a non-numeric header on
/// the first line.
pub fn read_points_xyz(path: &Path) -> Result<PointSet> {
    let lines = read_lines(path)?;
    let mut pts = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = if trimmed.contains(',') {
            trimmed.split(',').map(str::trim).collect()
        } else {
            trimmed.split_whitespace().collect()
        };
        if parts.len() < 3 {
            return Err(ContourError::Parse(format!(
                "line {}: expected x,y,z",
                idx + 1
            )));
        }
        let parsed: std::result::Result<Vec<f64>, _> =
            parts[..3].iter().map(|s| s.parse::<f64>()).collect();
        match parsed {
            Ok(v) => pts.push(Point3::new(v[0], v[1], v[2])),
            Err(_) if idx == 0 => continue,
            Err(e) => return Err(ContourError::Parse(format!("line {}: {}", idx + 1, e))),
        }
    }
    Ok(PointSet::new(pts))
}

/// Writes points as `x,y,z` lines.
pub fn write_points_xyz(path: &Path, points: &PointSet) -> Result<()> {
    let mut file = std::io::BufWriter::new(File::create(path)?);
    for p in points {
        writeln!(file, "{},{},{}", p.x, p.y, p.z)?;
    }
    file.flush()?;
    Ok(())
}

/// Writes an area report as CSV with a header row.
pub fn write_area_report_csv(path: &Path, report: &AreaReport) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "level_index,level,cell_count,area")?;
    for e in &report.entries {
        writeln!(file, "{},{},{},{}", e.index, e.level, e.cell_count, e.area)?;
    }
    Ok(())
}

/// Reads a point cloud, choosing the reader from the file extension.
pub fn read_point_cloud(path: &Path) -> Result<PointSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "ply" => ply::read_points_ply(path),
        #[cfg(feature = "las")]
        "las" | "laz" => las::read_points_las(path),
        "csv" | "txt" | "xyz" => read_points_xyz(path),
        other => Err(ContourError::Parse(format!(
            "unsupported point cloud format '{}' for {}",
            other,
            path.display()
        ))),
    }
}
