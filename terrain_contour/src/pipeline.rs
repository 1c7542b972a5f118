//! End-to-end driver: denoise, normalize, rasterize, extract levels and
//! estimate areas.

use crate::area::{estimate_areas, AreaReport};
use crate::denoise::{remove_statistical_outliers, DenoiseParams};
use crate::error::ContourError;
use crate::levels::{extract_levels, LevelExtraction, LIBRARY_LEVEL_COUNT, CLI_LEVEL_COUNT};
use crate::normalize::{normalize, HeightWindow, WindowRequest, DEFAULT_REAL_WORLD_HEIGHT};
use crate::point_set::PointSet;
use crate::raster::rasterize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Processing stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    Denoise,
    Normalize,
    Rasterize,
    Levels,
    Masks,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::Denoise => "denoise",
            Stage::Normalize => "normalize",
            Stage::Rasterize => "rasterize",
            Stage::Levels => "levels",
            Stage::Masks => "masks",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: ContourError,
}

fn at(stage: Stage) -> impl FnOnce(ContourError) -> PipelineError {
    move |source| PipelineError { stage, source }
}

/// Options for a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub denoise: DenoiseParams,
    pub real_world_height: f64,
    pub level_count: usize,
    #[serde(default)]
    pub window: WindowRequest,
    /// Directory for per-level mask images; masks are skipped when `None`.
    #[serde(default)]
    pub mask_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Settings used when the pipeline is embedded as a library.
    pub fn library_preset() -> Self {
        Self {
            denoise: DenoiseParams::default(),
            real_world_height: DEFAULT_REAL_WORLD_HEIGHT,
            level_count: LIBRARY_LEVEL_COUNT,
            window: WindowRequest::default(),
            mask_dir: None,
        }
    }

    /// Settings used by the command line tool.
    pub fn cli_preset() -> Self {
        Self {
            level_count: CLI_LEVEL_COUNT,
            ..Self::library_preset()
        }
    }

    pub fn from_json_str(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> crate::error::Result<Self> {
        Self::from_json_str(&crate::io::read_to_string(path)?)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.denoise.validate()?;
        if !(self.real_world_height.is_finite() && self.real_world_height > 0.0) {
            return Err(ContourError::InvalidParameter(format!(
                "real world height must be a positive number, got {}",
                self.real_world_height
            )));
        }
        if self.level_count < 2 {
            return Err(ContourError::InvalidParameter(format!(
                "level count must be at least 2, got {}",
                self.level_count
            )));
        }
        for (name, bound) in [("low", self.window.low), ("high", self.window.high)] {
            if let Some(v) = bound {
                if !v.is_finite() {
                    return Err(ContourError::InvalidParameter(format!(
                        "{} bound must be finite, got {}",
                        name, v
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Result reported to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Areas(AreaReport),
    /// Neither window bound was given, so areas were not computed.
    NoAreasRequested,
    /// Fewer points than required survived the height window.
    NotEnoughData { found: usize },
}

impl fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineOutcome::Areas(report) => {
                write!(f, "Calculated areas for the specified height range: {}", report)
            }
            PipelineOutcome::NoAreasRequested => write!(f, "No areas calculated"),
            PipelineOutcome::NotEnoughData { .. } => write!(f, "Not enough to process."),
        }
    }
}

/// Intermediate products of a run that got past normalization.
#[derive(Debug, Clone)]
pub struct ProcessedField {
    pub scale: f64,
    pub window: HeightWindow,
    /// Points left after window filtering.
    pub point_count: usize,
    pub extraction: LevelExtraction,
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub denoised_count: usize,
    /// `None` when the run stopped with [`PipelineOutcome::NotEnoughData`].
    pub processed: Option<ProcessedField>,
    pub outcome: PipelineOutcome,
    pub mask_paths: Vec<PathBuf>,
}

/// Runs every stage on `points` in order.
pub fn run(points: &PointSet, config: &PipelineConfig) -> Result<PipelineRun, PipelineError> {
    config.validate().map_err(at(Stage::Configuration))?;

    let denoised = remove_statistical_outliers(points, &config.denoise).map_err(at(Stage::Denoise))?;
    let denoised_count = denoised.len();

    let normalized = match normalize(&denoised, config.real_world_height, config.window) {
        Ok(n) => n,
        Err(ContourError::InsufficientData { found, .. }) => {
            log::warn!("only {} points inside the height window", found);
            return Ok(PipelineRun {
                denoised_count,
                processed: None,
                outcome: PipelineOutcome::NotEnoughData { found },
                mask_paths: Vec::new(),
            });
        }
        Err(e) => return Err(at(Stage::Normalize)(e)),
    };

    let field = rasterize(&normalized.points).map_err(at(Stage::Rasterize))?;
    let extraction = extract_levels(&field, config.level_count).map_err(at(Stage::Levels))?;

    let mut mask_paths = Vec::new();
    let outcome = if config.window.is_specified() {
        let report = estimate_areas(&extraction.field, &extraction.levels);
        log::info!("areas computed for {} levels", report.len());
        if let Some(dir) = &config.mask_dir {
            mask_paths = crate::io::mask::write_level_masks(dir, &extraction.field, &report)
                .map_err(at(Stage::Masks))?;
        }
        PipelineOutcome::Areas(report)
    } else {
        log::info!("no height window given, skipping area estimation");
        PipelineOutcome::NoAreasRequested
    };

    Ok(PipelineRun {
        denoised_count,
        processed: Some(ProcessedField {
            scale: normalized.scale,
            window: normalized.window,
            point_count: normalized.points.len(),
            extraction,
        }),
        outcome,
        mask_paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_only_in_level_count() {
        let lib = PipelineConfig::library_preset();
        let cli = PipelineConfig::cli_preset();
        assert_eq!(lib.level_count, 10);
        assert_eq!(cli.level_count, 20);
        assert_eq!(lib.denoise, cli.denoise);
        assert_eq!(lib.real_world_height, 15.0);
        assert!(lib.validate().is_ok());
    }

    #[test]
    fn config_json_defaults_window_and_masks() {
        let cfg = PipelineConfig::from_json_str(
            r#"{"denoise":{"neighbor_count":8,"std_ratio":1.5},"real_world_height":10.0,"level_count":5}"#,
        )
        .unwrap();
        assert_eq!(cfg.denoise.neighbor_count, 8);
        assert!(!cfg.window.is_specified());
        assert!(cfg.mask_dir.is_none());
    }

    #[test]
    fn invalid_config_reports_configuration_stage() {
        let mut cfg = PipelineConfig::library_preset();
        cfg.level_count = 1;
        let err = run(&PointSet::default(), &cfg).unwrap_err();
        assert_eq!(err.stage, Stage::Configuration);
        assert!(err.to_string().starts_with("configuration stage failed"));
    }

    #[test]
    fn too_few_points_for_denoise() {
        let err = run(&PointSet::default(), &PipelineConfig::library_preset()).unwrap_err();
        assert_eq!(err.stage, Stage::Denoise);
        assert!(matches!(err.source, ContourError::InsufficientData { required: 21, found: 0 }));
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(PipelineOutcome::NoAreasRequested.to_string(), "No areas calculated");
        assert_eq!(
            PipelineOutcome::NotEnoughData { found: 3 }.to_string(),
            "Not enough to process."
        );
    }
}
