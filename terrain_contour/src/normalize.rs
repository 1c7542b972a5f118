//! Vertical rescaling to real-world units and height-window filtering.
//!
//! The window policy for one-sided requests is intentionally asymmetric: a
//! lone `low` keeps everything *above* it, a lone `high` keeps everything
//! *below* it, and each is rejected when it sits at or beyond the matching
//! edge of the scaled range.

use crate::error::{ContourError, Result, WindowBound};
use crate::point_set::PointSet;

/// Minimum number of points that must survive window filtering.
pub const MIN_POINTS_TO_PROCESS: usize = 100;

/// Default real-world vertical span of the reconstructed terrain.
pub const DEFAULT_REAL_WORLD_HEIGHT: f64 = 15.0;

/// Optional bounds requested by the caller, in scaled (real-world) units.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WindowRequest {
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
}

impl WindowRequest {
    pub fn new(low: Option<f64>, high: Option<f64>) -> Self {
        Self { low, high }
    }

    /// `true` when at least one bound was supplied.
    pub fn is_specified(&self) -> bool {
        self.low.is_some() || self.high.is_some()
    }
}

/// Inclusive height range applied to the scaled points.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HeightWindow {
    pub low: f64,
    pub high: f64,
}

impl HeightWindow {
    pub fn contains(&self, y: f64) -> bool {
        y >= self.low && y <= self.high
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Window-filtered points with all three axes multiplied by `scale`.
    pub points: PointSet,
    pub scale: f64,
    pub window: HeightWindow,
}

/// Factor mapping the observed vertical extent onto `real_world_height`.
pub fn vertical_scale(points: &PointSet, real_world_height: f64) -> Result<f64> {
    if !(real_world_height.is_finite() && real_world_height > 0.0) {
        return Err(ContourError::InvalidParameter(format!(
            "real world height must be a positive number, got {}",
            real_world_height
        )));
    }
    let bounds = points.bounds().ok_or(ContourError::InsufficientData {
        required: 1,
        found: 0,
    })?;
    let span = bounds.extent_y();
    if span == 0.0 {
        return Err(ContourError::DegenerateRange {
            axis: "y",
            min: bounds.min.y,
            max: bounds.max.y,
        });
    }
    Ok(real_world_height / span)
}

/// Resolves the requested bounds against the scaled height range.
pub fn resolve_window(request: WindowRequest, scaled_min: f64, scaled_max: f64) -> Result<HeightWindow> {
    match (request.low, request.high) {
        (Some(low), Some(high)) => Ok(HeightWindow { low, high }),
        (Some(low), None) => {
            if low <= scaled_min {
                return Err(ContourError::InvalidWindow {
                    bound: WindowBound::Low,
                    value: low,
                    limit: scaled_min,
                });
            }
            Ok(HeightWindow {
                low,
                high: scaled_max,
            })
        }
        (None, Some(high)) => {
            if high >= scaled_max {
                return Err(ContourError::InvalidWindow {
                    bound: WindowBound::High,
                    value: high,
                    limit: scaled_max,
                });
            }
            Ok(HeightWindow {
                low: scaled_min,
                high,
            })
        }
        (None, None) => Ok(HeightWindow {
            low: scaled_min,
            high: scaled_max,
        }),
    }
}

/// Rescales `points` so their vertical extent equals `real_world_height`,
/// restricts them to the resolved window and applies the same factor to the
/// horizontal axes.
///
/// Fails with [`ContourError::InsufficientData`] when fewer than
/// [`MIN_POINTS_TO_PROCESS`] points remain inside the window.
pub fn normalize(points: &PointSet, real_world_height: f64, request: WindowRequest) -> Result<Normalized> {
    let scale = vertical_scale(points, real_world_height)?;
    log::debug!("vertical scaling factor {}", scale);

    let scaled_y: Vec<f64> = points.iter().map(|p| p.y * scale).collect();
    let scaled_min = scaled_y.iter().copied().fold(f64::INFINITY, f64::min);
    let scaled_max = scaled_y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let window = resolve_window(request, scaled_min, scaled_max)?;
    log::debug!("height window [{}, {}]", window.low, window.high);

    let filtered: PointSet = points
        .iter()
        .zip(&scaled_y)
        .filter(|(_, &y)| window.contains(y))
        .map(|(p, _)| p.scaled(scale))
        .collect();

    if filtered.len() < MIN_POINTS_TO_PROCESS {
        return Err(ContourError::InsufficientData {
            required: MIN_POINTS_TO_PROCESS,
            found: filtered.len(),
        });
    }
    log::info!(
        "{} of {} points inside height window [{:.3}, {:.3}]",
        filtered.len(),
        points.len(),
        window.low,
        window.high
    );
    Ok(Normalized {
        points: filtered,
        scale,
        window,
    })
}
