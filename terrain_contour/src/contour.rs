//! Contour line and filled-band geometry for external rendering.
//!
//! Every grid square whose four corners carry data is split into two
//! triangles; a level crosses a triangle edge when exactly one endpoint is at
//! or above it, which yields zero or two crossings per triangle.

use crate::levels::LevelSet;
use crate::raster::HeightField;
use geo_types::{Coord, LineString};

/// Polylines traced at a single level, in grid (x, z) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourLine {
    pub level: f64,
    pub paths: Vec<LineString<f64>>,
}

/// Line and fill geometry for a height field and its level set.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourGeometry {
    /// One entry per level, in level order.
    pub lines: Vec<ContourLine>,
    /// Band index per grid cell (row-major by z), `None` for no-data cells.
    /// Band `i` covers `[levels[i], levels[i + 1])`; the top band is closed.
    pub bands: Vec<Option<usize>>,
}

impl ContourGeometry {
    /// Total number of polylines across all levels.
    pub fn path_count(&self) -> usize {
        self.lines.iter().map(|l| l.paths.len()).sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct GridVertex {
    ix: usize,
    iz: usize,
    x: f64,
    z: f64,
    h: f64,
}

impl GridVertex {
    fn key(&self) -> (usize, usize) {
        (self.iz, self.ix)
    }
}

/// Crossing of `level` along edge `ab`. The endpoints are put in grid order
/// first so both triangles sharing an edge produce the identical point.
fn intersect_edge(a: GridVertex, b: GridVertex, level: f64) -> Option<Coord<f64>> {
    if (a.h >= level) == (b.h >= level) {
        return None;
    }
    let (p, q) = if a.key() <= b.key() { (a, b) } else { (b, a) };
    let t = (level - p.h) / (q.h - p.h);
    Some(Coord {
        x: p.x + t * (q.x - p.x),
        y: p.z + t * (q.z - p.z),
    })
}

fn triangle_segment(tri: [GridVertex; 3], level: f64) -> Option<(Coord<f64>, Coord<f64>)> {
    let crossings: Vec<Coord<f64>> = [(0, 1), (1, 2), (2, 0)]
        .iter()
        .filter_map(|&(i, j)| intersect_edge(tri[i], tri[j], level))
        .collect();
    if crossings.len() == 2 {
        Some((crossings[0], crossings[1]))
    } else {
        None
    }
}

fn cell_triangles(field: &HeightField) -> Vec<[GridVertex; 3]> {
    let vertex = |ix: usize, iz: usize| {
        field.get(ix, iz).map(|h| GridVertex {
            ix,
            iz,
            x: field.x_axis()[ix],
            z: field.z_axis()[iz],
            h,
        })
    };
    let mut tris = Vec::new();
    for iz in 0..field.height().saturating_sub(1) {
        for ix in 0..field.width().saturating_sub(1) {
            if let (Some(p00), Some(p10), Some(p11), Some(p01)) = (
                vertex(ix, iz),
                vertex(ix + 1, iz),
                vertex(ix + 1, iz + 1),
                vertex(ix, iz + 1),
            ) {
                tris.push([p00, p10, p11]);
                tris.push([p00, p11, p01]);
            }
        }
    }
    tris
}

fn points_close(a: Coord<f64>, b: Coord<f64>, tol: f64) -> bool {
    (a.x - b.x).abs() <= tol && (a.y - b.y).abs() <= tol
}

/// Chains loose segments into polylines, growing each line at both ends.
fn segments_to_polylines(segs: &[(Coord<f64>, Coord<f64>)], tol: f64) -> Vec<LineString<f64>> {
    let mut remaining: Vec<(Coord<f64>, Coord<f64>)> = segs.to_vec();
    let mut out = Vec::new();
    while let Some((a, b)) = remaining.pop() {
        let mut line = std::collections::VecDeque::from(vec![a, b]);
        let mut extended = true;
        while extended {
            extended = false;
            let first = line[0];
            let last = line[line.len() - 1];
            for i in 0..remaining.len() {
                let seg = remaining[i];
                if points_close(seg.0, last, tol) {
                    line.push_back(seg.1);
                } else if points_close(seg.1, last, tol) {
                    line.push_back(seg.0);
                } else if points_close(seg.1, first, tol) {
                    line.push_front(seg.0);
                } else if points_close(seg.0, first, tol) {
                    line.push_front(seg.1);
                } else {
                    continue;
                }
                remaining.swap_remove(i);
                extended = true;
                break;
            }
        }
        out.push(LineString::from(Vec::from(line)));
    }
    out
}

/// Traces contour polylines for every level and assigns each cell its band.
pub fn trace_contours(field: &HeightField, levels: &LevelSet) -> ContourGeometry {
    let tris = cell_triangles(field);
    let lines = levels
        .iter()
        .map(|&level| {
            let segs: Vec<(Coord<f64>, Coord<f64>)> = tris
                .iter()
                .filter_map(|&tri| triangle_segment(tri, level))
                .collect();
            ContourLine {
                level,
                paths: segments_to_polylines(&segs, 1e-9),
            }
        })
        .collect();
    let bands = field
        .cells()
        .iter()
        .map(|c| c.and_then(|h| levels.band_of(h)))
        .collect();
    ContourGeometry { lines, bands }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_field() -> HeightField {
        // Height equals the x coordinate on a 3x3 grid.
        let axis = vec![0.0, 1.0, 2.0];
        let cells = (0..3)
            .flat_map(|_| (0..3).map(|ix| Some(ix as f64)))
            .collect();
        HeightField::new(axis.clone(), axis, cells, 1.0).unwrap()
    }

    #[test]
    fn ramp_contour_is_single_straight_line() {
        let field = ramp_field();
        let levels = LevelSet::from_levels(vec![0.5, 1.5]).unwrap();
        let geom = trace_contours(&field, &levels);
        assert_eq!(geom.lines.len(), 2);
        for line in &geom.lines {
            assert_eq!(line.paths.len(), 1);
            let path = &line.paths[0];
            assert!(path.coords().all(|c| (c.x - line.level).abs() < 1e-12));
            let zs: Vec<f64> = path.coords().map(|c| c.y).collect();
            let zmin = zs.iter().cloned().fold(f64::INFINITY, f64::min);
            let zmax = zs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert!((zmin - 0.0).abs() < 1e-12);
            assert!((zmax - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn no_crossings_outside_range() {
        let field = ramp_field();
        let levels = LevelSet::from_levels(vec![5.0, 6.0]).unwrap();
        let geom = trace_contours(&field, &levels);
        assert_eq!(geom.path_count(), 0);
    }

    #[test]
    fn bands_follow_levels() {
        let field = ramp_field();
        let levels = LevelSet::linspace(0.0, 2.0, 3).unwrap();
        let geom = trace_contours(&field, &levels);
        assert_eq!(&geom.bands[..3], &[Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn no_data_cells_break_contours() {
        let axis = vec![0.0, 1.0, 2.0];
        let mut cells: Vec<Option<f64>> = (0..3)
            .flat_map(|_| (0..3).map(|ix| Some(ix as f64)))
            .collect();
        cells[4] = None;
        let field = HeightField::new(axis.clone(), axis, cells, 1.0).unwrap();
        let levels = LevelSet::from_levels(vec![0.5, 1.5]).unwrap();
        let geom = trace_contours(&field, &levels);
        assert_eq!(geom.path_count(), 0);
        assert_eq!(geom.bands[4], None);
    }
}
