//! Regular height grid built from scattered samples.

use crate::error::{ContourError, Result};
use crate::point_set::PointSet;
use crate::tin::Tin;

/// Number of samples along each horizontal axis of the height grid.
pub const GRID_RESOLUTION: usize = 100;

/// `n` evenly spaced values from `start` to `end` inclusive. The last value is
/// exactly `end`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = end;
            values
        }
    }
}

/// 2D grid of interpolated heights indexed by `(x index, z index)`.
///
/// Cells outside the convex hull of the source samples hold `None` and never
/// take part in level or area statistics.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HeightField {
    x_axis: Vec<f64>,
    z_axis: Vec<f64>,
    cells: Vec<Option<f64>>,
    cell_area: f64,
}

impl HeightField {
    /// Creates a height field from row-major (by z) `cells`.
    pub fn new(
        x_axis: Vec<f64>,
        z_axis: Vec<f64>,
        cells: Vec<Option<f64>>,
        cell_area: f64,
    ) -> Result<Self> {
        if x_axis.is_empty() || z_axis.is_empty() {
            return Err(ContourError::InvalidParameter(
                "height field axes must not be empty".into(),
            ));
        }
        if cells.len() != x_axis.len() * z_axis.len() {
            return Err(ContourError::InvalidParameter(format!(
                "expected {} cells for a {}x{} grid, got {}",
                x_axis.len() * z_axis.len(),
                x_axis.len(),
                z_axis.len(),
                cells.len()
            )));
        }
        if !(cell_area.is_finite() && cell_area > 0.0) {
            return Err(ContourError::InvalidParameter(format!(
                "cell area must be positive, got {}",
                cell_area
            )));
        }
        Ok(Self {
            x_axis,
            z_axis,
            cells,
            cell_area,
        })
    }

    /// Number of samples along x (image width).
    pub fn width(&self) -> usize {
        self.x_axis.len()
    }

    /// Number of samples along z (image height).
    pub fn height(&self) -> usize {
        self.z_axis.len()
    }

    pub fn x_axis(&self) -> &[f64] {
        &self.x_axis
    }

    pub fn z_axis(&self) -> &[f64] {
        &self.z_axis
    }

    /// Real-world planimetric area represented by one cell.
    pub fn cell_area(&self) -> f64 {
        self.cell_area
    }

    pub fn cells(&self) -> &[Option<f64>] {
        &self.cells
    }

    /// Height at `(ix, iz)`; `None` for no-data cells and out-of-range indices.
    pub fn get(&self, ix: usize, iz: usize) -> Option<f64> {
        if ix >= self.width() || iz >= self.height() {
            return None;
        }
        self.cells[iz * self.width() + ix]
    }

    pub fn valid_heights(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().flatten().copied()
    }

    /// Number of cells carrying a height.
    pub fn valid_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Minimum and maximum over valid cells.
    pub fn height_range(&self) -> Option<(f64, f64)> {
        self.valid_heights().fold(None, |acc, h| match acc {
            None => Some((h, h)),
            Some((lo, hi)) => Some((lo.min(h), hi.max(h))),
        })
    }

    /// Number of valid cells whose height is at or above `level`.
    pub fn count_at_or_above(&self, level: f64) -> usize {
        self.valid_heights().filter(|&h| h >= level).count()
    }

    /// Copy with every valid cell clamped into `[min, max]`.
    pub fn clipped(&self, min: f64, max: f64) -> Self {
        Self {
            x_axis: self.x_axis.clone(),
            z_axis: self.z_axis.clone(),
            cells: self
                .cells
                .iter()
                .map(|c| c.map(|h| h.clamp(min, max)))
                .collect(),
            cell_area: self.cell_area,
        }
    }
}

/// Rasterizes `points` onto a [`GRID_RESOLUTION`]² grid.
pub fn rasterize(points: &PointSet) -> Result<HeightField> {
    rasterize_with_resolution(points, GRID_RESOLUTION)
}

/// Rasterizes `points` onto a `resolution`² grid spanning their horizontal
/// bounds, interpolating `y` linearly over a Delaunay triangulation of the
/// XZ projection.
///
/// `cell_area` is `(x_range / resolution) * (z_range / resolution)`.
pub fn rasterize_with_resolution(points: &PointSet, resolution: usize) -> Result<HeightField> {
    if resolution < 2 {
        return Err(ContourError::InvalidParameter(format!(
            "grid resolution must be at least 2, got {}",
            resolution
        )));
    }
    if points.len() < 3 {
        return Err(ContourError::InsufficientData {
            required: 3,
            found: points.len(),
        });
    }
    let bounds = points.bounds().ok_or(ContourError::InsufficientData {
        required: 3,
        found: 0,
    })?;
    let x_range = bounds.extent_x();
    let z_range = bounds.extent_z();
    if x_range == 0.0 {
        return Err(ContourError::DegenerateRange {
            axis: "x",
            min: bounds.min.x,
            max: bounds.max.x,
        });
    }
    if z_range == 0.0 {
        return Err(ContourError::DegenerateRange {
            axis: "z",
            min: bounds.min.z,
            max: bounds.max.z,
        });
    }

    let cell_area = (x_range / resolution as f64) * (z_range / resolution as f64);
    let x_axis = linspace(bounds.min.x, bounds.max.x, resolution);
    let z_axis = linspace(bounds.min.z, bounds.max.z, resolution);

    let tin = Tin::from_points(points);
    let cells = tin.sample_grid(&x_axis, &z_axis);
    let field = HeightField::new(x_axis, z_axis, cells, cell_area)?;
    log::info!(
        "rasterized {} points from {} triangles onto {}x{} grid, {} valid cells, cell area {:.6}",
        points.len(),
        tin.triangles.len(),
        resolution,
        resolution,
        field.valid_count(),
        cell_area
    );
    Ok(field)
}
