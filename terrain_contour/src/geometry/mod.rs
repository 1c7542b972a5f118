//! Basic geometry primitives for point cloud processing.

mod point3;

pub use point3::Point3;

/// Axis-aligned bounding box of a set of 3D points.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds3 {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds3 {
    /// Computes the bounds of `points`. Returns `None` for an empty slice.
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let first = *points.first()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in &points[1..] {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.min.z = bounds.min.z.min(p.z);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
            bounds.max.z = bounds.max.z.max(p.z);
        }
        Some(bounds)
    }

    pub fn extent_x(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn extent_y(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn extent_z(&self) -> f64 {
        self.max.z - self.min.z
    }
}
