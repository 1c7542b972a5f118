//! Planimetric area above each contour level.

use crate::levels::LevelSet;
use crate::raster::HeightField;
use std::fmt;

/// Area covered at or above a single level.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LevelArea {
    /// Position of the level in its level set.
    pub index: usize,
    pub level: f64,
    pub cell_count: usize,
    pub area: f64,
}

/// One [`LevelArea`] per level, in level order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AreaReport {
    pub entries: Vec<LevelArea>,
}

impl AreaReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn levels(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.level).collect()
    }

    pub fn areas(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.area).collect()
    }

    /// `true` when no area exceeds the area of the level below it.
    pub fn is_non_increasing(&self) -> bool {
        self.entries.windows(2).all(|w| w[1].area <= w[0].area)
    }
}

impl fmt::Display for AreaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, e) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", e.area)?;
        }
        write!(f, "]")
    }
}

/// Counts, for each level, the valid cells whose height is at or above it and
/// converts the count to real-world area.
pub fn estimate_areas(field: &HeightField, levels: &LevelSet) -> AreaReport {
    let entries = levels
        .iter()
        .enumerate()
        .map(|(index, &level)| {
            let cell_count = field.count_at_or_above(level);
            let area = cell_count as f64 * field.cell_area();
            log::debug!("level {} ({:.3}): {} cells, area {:.3}", index, level, cell_count, area);
            LevelArea {
                index,
                level,
                cell_count,
                area,
            }
        })
        .collect();
    AreaReport { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_follows_level_order() {
        let field = HeightField::new(
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![Some(1.0), Some(2.0), Some(3.0), None],
            2.0,
        )
        .unwrap();
        let levels = LevelSet::from_levels(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let report = estimate_areas(&field, &levels);
        assert_eq!(report.len(), 4);
        assert_eq!(report.levels(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(report.areas(), vec![6.0, 4.0, 2.0, 0.0]);
        assert!(report.is_non_increasing());
        assert_eq!(report.to_string(), "[6, 4, 2, 0]");
    }
}
