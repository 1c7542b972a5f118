//! GeoJSON export of traced contour lines.

use crate::contour::ContourGeometry;
use crate::error::Result;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use std::path::Path;

/// One LineString feature per contour path, tagged with its level.
pub fn contours_to_geojson(geometry: &ContourGeometry) -> FeatureCollection {
    let mut features = Vec::new();
    for (index, line) in geometry.lines.iter().enumerate() {
        for path in &line.paths {
            let coords = path.coords().map(|c| vec![c.x, c.y]).collect();
            let mut properties = JsonObject::new();
            properties.insert("level_index".to_string(), index.into());
            properties.insert("level".to_string(), line.level.into());
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(coords))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_contours_geojson(path: &Path, geometry: &ContourGeometry) -> Result<()> {
    let json = serde_json::to_string_pretty(&contours_to_geojson(geometry))?;
    super::write_string(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::ContourLine;
    use geo_types::LineString;

    #[test]
    fn one_feature_per_path() {
        let geometry = ContourGeometry {
            lines: vec![
                ContourLine {
                    level: 1.5,
                    paths: vec![
                        LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]),
                        LineString::from(vec![(2.0, 2.0), (3.0, 2.0)]),
                    ],
                },
                ContourLine {
                    level: 2.5,
                    paths: Vec::new(),
                },
            ],
            bands: Vec::new(),
        };
        let fc = contours_to_geojson(&geometry);
        assert_eq!(fc.features.len(), 2);
        let props = fc.features[1].properties.as_ref().unwrap();
        assert_eq!(props["level"], serde_json::json!(1.5));
        assert_eq!(props["level_index"], serde_json::json!(0));
    }
}
