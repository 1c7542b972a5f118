//! Error type shared by every processing stage.

use std::fmt;

/// Which edge of a height window a caller supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowBound {
    Low,
    High,
}

impl fmt::Display for WindowBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowBound::Low => write!(f, "low"),
            WindowBound::High => write!(f, "high"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ContourError {
    #[error("insufficient data: {found} points available, at least {required} required")]
    InsufficientData { required: usize, found: usize },

    #[error("degenerate {axis} range: min and max are both {min} (max {max})")]
    DegenerateRange {
        axis: &'static str,
        min: f64,
        max: f64,
    },

    #[error("invalid height window: {bound} bound {value} is outside the scaled height range (limit {limit})")]
    InvalidWindow {
        bound: WindowBound,
        value: f64,
        limit: f64,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ContourError>;
