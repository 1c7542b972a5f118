use crate::geometry::Point3;
use crate::point_set::PointSet;
use rayon::prelude::*;

/// Barycentric slack that still counts a sample as inside a triangle, so grid
/// samples lying exactly on a shared edge or on the hull are not lost to
/// rounding.
const BARYCENTRIC_TOLERANCE: f64 = 1e-9;

/// Barycentric coordinates of `(px, pz)` in triangle `abc`, projected onto the
/// horizontal XZ plane.
fn barycentric(px: f64, pz: f64, a: Point3, b: Point3, c: Point3) -> Option<(f64, f64, f64)> {
    let det = (b.z - c.z) * (a.x - c.x) + (c.x - b.x) * (a.z - c.z);
    // Threshold is relative to |b - c| * |a - c|.
    let bc = (b.x - c.x).hypot(b.z - c.z);
    let ac = (a.x - c.x).hypot(a.z - c.z);
    if det == 0.0 || det.abs() < f64::EPSILON * bc * ac {
        return None;
    }
    let u = ((b.z - c.z) * (px - c.x) + (c.x - b.x) * (pz - c.z)) / det;
    let v = ((c.z - a.z) * (px - c.x) + (a.x - c.x) * (pz - c.z)) / det;
    let w = 1.0 - u - v;
    Some((u, v, w))
}

/// Linear interpolation of the height at `(px, pz)` when the location lies
/// inside the triangle.
fn interpolate(px: f64, pz: f64, a: Point3, b: Point3, c: Point3) -> Option<f64> {
    let (u, v, w) = barycentric(px, pz, a, b, c)?;
    if u >= -BARYCENTRIC_TOLERANCE && v >= -BARYCENTRIC_TOLERANCE && w >= -BARYCENTRIC_TOLERANCE {
        Some(u * a.y + v * b.y + w * c.y)
    } else {
        None
    }
}

/// Index range `[lo, hi)` of the samples of an ascending `axis` falling inside
/// `[min - tol, max + tol]`.
fn axis_span(axis: &[f64], min: f64, max: f64, tol: f64) -> (usize, usize) {
    let lo = axis.partition_point(|&v| v < min - tol);
    let hi = axis.partition_point(|&v| v <= max + tol);
    (lo, hi.max(lo))
}

fn axis_tolerance(axis: &[f64]) -> f64 {
    match (axis.first(), axis.last()) {
        (Some(first), Some(last)) => (last - first).abs() * BARYCENTRIC_TOLERANCE,
        _ => 0.0,
    }
}

/// Triangulated Irregular Network over the horizontal (XZ) projection of a
/// point set. Heights are carried in the `y` coordinate of each vertex.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Tin {
    /// Vertices of the TIN.
    pub vertices: Vec<Point3>,
    /// Indices into `vertices` forming triangles.
    pub triangles: Vec<[usize; 3]>,
}

impl Tin {
    /// Builds a TIN from the provided points using Delaunay triangulation on
    /// the XZ plane. Collinear input yields a TIN without triangles.
    pub fn from_points(points: &PointSet) -> Self {
        let coords: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.z })
            .collect();
        let triangulation = delaunator::triangulate(&coords);
        let triangles: Vec<[usize; 3]> = triangulation
            .triangles
            .chunks(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        if triangles.is_empty() {
            log::warn!("triangulation of {} points produced no triangles", points.len());
        }
        Self {
            vertices: points.points().to_vec(),
            triangles,
        }
    }

    fn corners(&self, tri: &[usize; 3]) -> (Point3, Point3, Point3) {
        (
            self.vertices[tri[0]],
            self.vertices[tri[1]],
            self.vertices[tri[2]],
        )
    }

    /// Returns the linearly interpolated height at `(x, z)` if the location
    /// lies within the TIN.
    pub fn elevation_at(&self, x: f64, z: f64) -> Option<f64> {
        self.triangles.iter().find_map(|tri| {
            let (a, b, c) = self.corners(tri);
            interpolate(x, z, a, b, c)
        })
    }

    /// Samples the TIN on the regular grid spanned by `x_axis` × `z_axis`
    /// (both ascending). The result is row-major by z: entry
    /// `iz * x_axis.len() + ix` holds the height at `(x_axis[ix], z_axis[iz])`,
    /// or `None` when the sample lies outside every triangle.
    ///
    /// Rows are filled in parallel; within a row triangles are visited in
    /// index order and the first hit wins, so the output does not depend on
    /// scheduling.
    pub fn sample_grid(&self, x_axis: &[f64], z_axis: &[f64]) -> Vec<Option<f64>> {
        let x_tol = axis_tolerance(x_axis);
        let z_tol = axis_tolerance(z_axis);

        let mut rows: Vec<Vec<usize>> = vec![Vec::new(); z_axis.len()];
        for (t, tri) in self.triangles.iter().enumerate() {
            let (a, b, c) = self.corners(tri);
            let zmin = a.z.min(b.z).min(c.z);
            let zmax = a.z.max(b.z).max(c.z);
            let (lo, hi) = axis_span(z_axis, zmin, zmax, z_tol);
            for row in &mut rows[lo..hi] {
                row.push(t);
            }
        }

        rows.par_iter()
            .enumerate()
            .map(|(iz, tris)| {
                let z = z_axis[iz];
                let mut row = vec![None; x_axis.len()];
                for &t in tris {
                    let (a, b, c) = self.corners(&self.triangles[t]);
                    let xmin = a.x.min(b.x).min(c.x);
                    let xmax = a.x.max(b.x).max(c.x);
                    let (lo, hi) = axis_span(x_axis, xmin, xmax, x_tol);
                    for ix in lo..hi {
                        if row[ix].is_none() {
                            row[ix] = interpolate(x_axis[ix], z, a, b, c);
                        }
                    }
                }
                row
            })
            .collect::<Vec<_>>()
            .concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(y: [f64; 4]) -> PointSet {
        PointSet::new(vec![
            Point3::new(0.0, y[0], 0.0),
            Point3::new(1.0, y[1], 0.0),
            Point3::new(1.0, y[2], 1.0),
            Point3::new(0.0, y[3], 1.0),
        ])
    }

    #[test]
    fn square_has_two_triangles() {
        let tin = Tin::from_points(&unit_square([0.0; 4]));
        assert_eq!(tin.triangles.len(), 2);
    }

    #[test]
    fn elevation_on_inclined_plane() {
        // y = 2x + 3z
        let tin = Tin::from_points(&unit_square([0.0, 2.0, 5.0, 3.0]));
        let y = tin.elevation_at(0.25, 0.5).unwrap();
        assert!((y - 2.0).abs() < 1e-12);
        assert!(tin.elevation_at(1.5, 0.5).is_none());
    }

    #[test]
    fn collinear_points_have_no_triangles() {
        let pts = PointSet::new(vec![
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 1.0),
            Point3::new(2.0, 3.0, 2.0),
        ]);
        let tin = Tin::from_points(&pts);
        assert!(tin.triangles.is_empty());
        assert!(tin.sample_grid(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]).iter().all(Option::is_none));
    }

    #[test]
    fn grid_sampling_matches_point_queries() {
        let tin = Tin::from_points(&unit_square([1.0, 2.0, 4.0, 0.5]));
        let axis = [0.0, 0.25, 0.5, 0.75, 1.0];
        let grid = tin.sample_grid(&axis, &axis);
        for (iz, &z) in axis.iter().enumerate() {
            for (ix, &x) in axis.iter().enumerate() {
                let expected = tin.elevation_at(x, z).unwrap();
                let got = grid[iz * axis.len() + ix].unwrap();
                assert!((expected - got).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn axis_span_with_tolerance() {
        let axis = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(axis_span(&axis, 0.5, 2.0, 0.0), (1, 3));
        assert_eq!(axis_span(&axis, 1.0 + 1e-12, 1.5, 1e-9), (1, 2));
        assert_eq!(axis_span(&axis, 3.5, 4.0, 0.0), (4, 4));
    }

    #[test]
    fn tiny_triangles_still_interpolate() {
        let s = 1e-9;
        let pts = PointSet::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(s, 2.0, 0.0),
            Point3::new(s, 5.0, s),
            Point3::new(0.0, 3.0, s),
        ]);
        let tin = Tin::from_points(&pts);
        let y = tin.elevation_at(0.25 * s, 0.5 * s).unwrap();
        assert!((y - 2.0).abs() < 1e-9);
    }
}
