//! Contour extraction from noisy terrain point clouds.
//!
//! A point cloud is denoised, rescaled to real-world units, interpolated
//! onto a regular height grid and sliced into evenly spaced levels. For each
//! level the planimetric area at or above it is reported.

pub mod area;
pub mod colormap;
pub mod contour;
pub mod denoise;
pub mod error;
pub mod geometry;
pub mod io;
pub mod levels;
pub mod normalize;
pub mod pipeline;
pub mod point_set;
pub mod raster;
pub mod tin;

pub use area::{estimate_areas, AreaReport, LevelArea};
pub use denoise::{remove_statistical_outliers, DenoiseParams};
pub use error::{ContourError, Result};
pub use geometry::{Bounds3, Point3};
pub use levels::{extract_levels, LevelExtraction, LevelSet};
pub use normalize::{normalize, HeightWindow, WindowRequest};
pub use pipeline::{run, PipelineConfig, PipelineError, PipelineOutcome, PipelineRun, Stage};
pub use point_set::PointSet;
pub use raster::{rasterize, HeightField};
