//! Contour level derivation.

use crate::contour::{trace_contours, ContourGeometry};
use crate::error::{ContourError, Result};
use crate::raster::{linspace, HeightField};

/// Level count used when the pipeline is driven as a library.
pub const LIBRARY_LEVEL_COUNT: usize = 10;
/// Level count used by the command line front end.
pub const CLI_LEVEL_COUNT: usize = 20;

/// Ascending sequence of height thresholds.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LevelSet {
    levels: Vec<f64>,
}

impl LevelSet {
    /// `count` evenly spaced levels from `min` to `max` inclusive.
    pub fn linspace(min: f64, max: f64, count: usize) -> Result<Self> {
        if count < 2 {
            return Err(ContourError::InvalidParameter(format!(
                "level count must be at least 2, got {}",
                count
            )));
        }
        Ok(Self {
            levels: linspace(min, max, count),
        })
    }

    /// Wraps explicit thresholds. They must be at least two and ascending.
    pub fn from_levels(levels: Vec<f64>) -> Result<Self> {
        if levels.len() < 2 {
            return Err(ContourError::InvalidParameter(format!(
                "a level set needs at least 2 levels, got {}",
                levels.len()
            )));
        }
        if levels.windows(2).any(|w| !(w[0] <= w[1])) {
            return Err(ContourError::InvalidParameter(
                "levels must be in ascending order".into(),
            ));
        }
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.levels.iter()
    }

    /// Index of the band `[levels[i], levels[i + 1])` containing `h`. Heights
    /// equal to the last level fall in the top band; heights outside the
    /// level range have no band.
    pub fn band_of(&self, h: f64) -> Option<usize> {
        let first = *self.levels.first()?;
        let last = *self.levels.last()?;
        if h < first || h > last {
            return None;
        }
        let above = self.levels.partition_point(|&l| l <= h);
        Some(above.saturating_sub(1).min(self.levels.len() - 2))
    }
}

/// Result of [`extract_levels`].
#[derive(Debug, Clone)]
pub struct LevelExtraction {
    /// Input field with valid cells clamped into the level range.
    pub field: HeightField,
    pub levels: LevelSet,
    pub contours: ContourGeometry,
}

/// Derives `level_count` evenly spaced levels spanning the valid heights of
/// `field`, clips the field into that range and traces contour geometry.
pub fn extract_levels(field: &HeightField, level_count: usize) -> Result<LevelExtraction> {
    if level_count < 2 {
        return Err(ContourError::InvalidParameter(format!(
            "level count must be at least 2, got {}",
            level_count
        )));
    }
    let (min, max) = field
        .height_range()
        .ok_or(ContourError::InsufficientData {
            required: 1,
            found: 0,
        })?;
    let levels = LevelSet::linspace(min, max, level_count)?;
    let field = field.clipped(min, max);
    let contours = trace_contours(&field, &levels);
    log::info!(
        "{} levels from {:.3} to {:.3}, {} contour paths",
        level_count,
        min,
        max,
        contours.path_count()
    );
    Ok(LevelExtraction {
        field,
        levels,
        contours,
    })
}
