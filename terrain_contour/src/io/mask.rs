//! PNG output: per-level binary masks and the filled contour map.

use crate::area::{AreaReport, LevelArea};
use crate::colormap::viridis;
use crate::error::Result;
use crate::levels::LevelExtraction;
use crate::raster::HeightField;
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// File name embedding the level index and its computed area. The area keeps
/// a decimal point even when whole (`12.0`, not `12`).
pub fn mask_file_name(entry: &LevelArea) -> String {
    format!("mask_level_{}_with_area_{:?}.png", entry.index, entry.area)
}

/// Single-channel mask of `field`: 255 where the cell is at or above `level`,
/// 0 elsewhere (including no-data). Pixel `(ix, iz)` is grid cell `(ix, iz)`.
pub fn level_mask(field: &HeightField, level: f64) -> GrayImage {
    GrayImage::from_fn(field.width() as u32, field.height() as u32, |x, y| {
        match field.get(x as usize, y as usize) {
            Some(h) if h >= level => Luma([255]),
            _ => Luma([0]),
        }
    })
}

/// Writes one mask per report entry into `dir` (created if missing) and
/// returns the written paths in report order.
pub fn write_level_masks(dir: &Path, field: &HeightField, report: &AreaReport) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(report.len());
    for entry in &report.entries {
        let path = dir.join(mask_file_name(entry));
        level_mask(field, entry.level).save(&path)?;
        log::info!("Saved mask image for level {} at {}", entry.level, path.display());
        paths.push(path);
    }
    Ok(paths)
}

const NO_DATA_COLOUR: Rgb<u8> = Rgb([255, 255, 255]);
const LINE_COLOUR: Rgb<u8> = Rgb([0, 0, 0]);

/// Renders the filled bands and contour lines of `extraction`. Each grid cell
/// becomes a `scale`×`scale` block; z grows upwards in the image.
pub fn render_contour_map(extraction: &LevelExtraction, scale: u32) -> RgbImage {
    let field = &extraction.field;
    let scale = scale.max(1);
    let (w, h) = (field.width() as u32, field.height() as u32);
    let band_count = extraction.levels.len().saturating_sub(1).max(1);
    let mut img = RgbImage::from_pixel(w * scale, h * scale, NO_DATA_COLOUR);

    for iz in 0..h {
        for ix in 0..w {
            let cell = (iz * w + ix) as usize;
            let colour = match extraction.contours.bands[cell] {
                Some(band) if band_count > 1 => Rgb(viridis(band as f64 / (band_count - 1) as f64)),
                Some(_) => Rgb(viridis(0.0)),
                None => continue,
            };
            let py = (h - 1 - iz) * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(ix * scale + dx, py + dy, colour);
                }
            }
        }
    }

    let x_axis = field.x_axis();
    let z_axis = field.z_axis();
    let step = |axis: &[f64]| {
        if axis.len() > 1 {
            (axis[axis.len() - 1] - axis[0]) / (axis.len() - 1) as f64
        } else {
            1.0
        }
    };
    let (dx, dz) = (step(x_axis), step(z_axis));
    let to_pixel = |x: f64, z: f64| {
        let px = ((x - x_axis[0]) / dx + 0.5) * scale as f64;
        let pz = ((z - z_axis[0]) / dz + 0.5) * scale as f64;
        (px, (h * scale) as f64 - pz)
    };
    for line in &extraction.contours.lines {
        for path in &line.paths {
            for seg in path.lines() {
                let a = to_pixel(seg.start.x, seg.start.y);
                let b = to_pixel(seg.end.x, seg.end.y);
                draw_line(&mut img, a, b, LINE_COLOUR);
            }
        }
    }
    img
}

fn draw_line(img: &mut RgbImage, a: (f64, f64), b: (f64, f64), colour: Rgb<u8>) {
    let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = a.0 + (b.0 - a.0) * t;
        let y = a.1 + (b.1 - a.1) * t;
        if x >= 0.0 && y >= 0.0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, colour);
        }
    }
}

/// Writes [`render_contour_map`] to `path`.
pub fn write_contour_map(path: &Path, extraction: &LevelExtraction, scale: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    render_contour_map(extraction, scale).save(path)?;
    log::info!("contour map saved to {}", path.display());
    Ok(())
}
