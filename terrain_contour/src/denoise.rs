use crate::error::{ContourError, Result};
use crate::point_set::PointSet;
use kd_tree::KdTree;
use rayon::prelude::*;

/// Number of nearest neighbours inspected per point.
pub const DEFAULT_NEIGHBOR_COUNT: usize = 20;
/// Standard deviation multiplier applied to the global distance spread.
pub const DEFAULT_STD_RATIO: f64 = 2.0;

/// Parameters of the statistical outlier filter.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DenoiseParams {
    pub neighbor_count: usize,
    pub std_ratio: f64,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            neighbor_count: DEFAULT_NEIGHBOR_COUNT,
            std_ratio: DEFAULT_STD_RATIO,
        }
    }
}

impl DenoiseParams {
    pub fn new(neighbor_count: usize, std_ratio: f64) -> Self {
        Self {
            neighbor_count,
            std_ratio,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.neighbor_count == 0 {
            return Err(ContourError::InvalidParameter(
                "neighbor count must be at least 1".into(),
            ));
        }
        if !(self.std_ratio.is_finite() && self.std_ratio > 0.0) {
            return Err(ContourError::InvalidParameter(format!(
                "std ratio must be a positive number, got {}",
                self.std_ratio
            )));
        }
        Ok(())
    }
}

/// Returns, for every point, the mean Euclidean distance to its `k` nearest
/// neighbours (the point itself excluded). The result is in input order.
///
/// Fails with [`ContourError::InsufficientData`] when fewer than `k + 1`
/// points are supplied.
pub fn mean_neighbor_distances(points: &PointSet, k: usize) -> Result<Vec<f64>> {
    if k == 0 {
        return Err(ContourError::InvalidParameter(
            "neighbor count must be at least 1".into(),
        ));
    }
    let required = k + 1;
    if points.len() < required {
        return Err(ContourError::InsufficientData {
            required,
            found: points.len(),
        });
    }
    let coords: Vec<[f64; 3]> = points.iter().map(|p| p.to_array()).collect();
    let tree = KdTree::build_by_ordered_float(coords.clone());

    let distances = coords
        .par_iter()
        .map(|query| {
            let mut dists: Vec<f64> = tree
                .nearests(query, required)
                .iter()
                .map(|n| n.squared_distance.sqrt())
                .collect();
            // The closest hit is the query point itself (or an exact duplicate).
            dists.sort_by(f64::total_cmp);
            dists[1..].iter().sum::<f64>() / k as f64
        })
        .collect();
    Ok(distances)
}

/// Statistical outlier removal.
///
/// A point is kept when its mean neighbour distance does not exceed
/// `mean + std_ratio * std`, where `mean` and `std` (sample standard
/// deviation) are taken over the mean distances of all points. Kept points
/// retain their input order.
pub fn remove_statistical_outliers(points: &PointSet, params: &DenoiseParams) -> Result<PointSet> {
    params.validate()?;
    let distances = mean_neighbor_distances(points, params.neighbor_count)?;

    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    let variance = if distances.len() > 1 {
        distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };
    let threshold = mean + params.std_ratio * variance.sqrt();
    log::debug!(
        "neighbour distance mean {:.6}, std {:.6}, threshold {:.6}",
        mean,
        variance.sqrt(),
        threshold
    );

    let kept: PointSet = points
        .iter()
        .zip(&distances)
        .filter(|(_, &d)| d <= threshold)
        .map(|(p, _)| *p)
        .collect();
    log::info!(
        "Noise removed with nb_neighbors = {}, std_ratio = {}: kept {} of {} points",
        params.neighbor_count,
        params.std_ratio,
        kept.len(),
        points.len()
    );
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3;

    fn grid_with_outlier() -> PointSet {
        let mut pts = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                pts.push(Point3::new(i as f64, 0.0, j as f64));
            }
        }
        pts.push(Point3::new(100.0, 50.0, 100.0));
        PointSet::new(pts)
    }

    #[test]
    fn far_outlier_is_removed() {
        let cloud = grid_with_outlier();
        let filtered = remove_statistical_outliers(&cloud, &DenoiseParams::new(8, 2.0)).unwrap();
        assert_eq!(filtered.len(), 100);
        assert!(filtered.iter().all(|p| p.x < 50.0));
    }

    #[test]
    fn kept_points_preserve_order() {
        let cloud = grid_with_outlier();
        let filtered = remove_statistical_outliers(&cloud, &DenoiseParams::new(8, 2.0)).unwrap();
        assert_eq!(filtered.points(), &cloud.points()[..100]);
    }

    #[test]
    fn too_few_points_for_neighbourhood() {
        let cloud = PointSet::new(vec![Point3::new(0.0, 0.0, 0.0); 20]);
        match remove_statistical_outliers(&cloud, &DenoiseParams::default()) {
            Err(ContourError::InsufficientData { required, found }) => {
                assert_eq!(required, 21);
                assert_eq!(found, 20);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn invalid_parameters_rejected() {
        let cloud = grid_with_outlier();
        assert!(matches!(
            remove_statistical_outliers(&cloud, &DenoiseParams::new(0, 2.0)),
            Err(ContourError::InvalidParameter(_))
        ));
        assert!(matches!(
            remove_statistical_outliers(&cloud, &DenoiseParams::new(5, 0.0)),
            Err(ContourError::InvalidParameter(_))
        ));
    }

    #[test]
    fn mean_distance_excludes_self() {
        let cloud = PointSet::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ]);
        let d = mean_neighbor_distances(&cloud, 1).unwrap();
        assert!((d[0] - 1.0).abs() < 1e-12);
        assert!((d[1] - 1.0).abs() < 1e-12);
        assert!((d[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let cloud = grid_with_outlier();
        let a = mean_neighbor_distances(&cloud, 6).unwrap();
        let b = mean_neighbor_distances(&cloud, 6).unwrap();
        assert_eq!(a, b);
    }
}
