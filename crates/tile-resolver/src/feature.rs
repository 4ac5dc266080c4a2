//! GeoJSON export of tiles.

use serde_json::{json, Map, Value};

use tms_common::{Tile, TmsResult};

use crate::resolver::Resolver;

/// Options for [`Resolver::feature`].
#[derive(Debug, Clone, Default)]
pub struct FeatureOptions {
    /// Emit native CRS coordinates instead of longitude/latitude.
    pub projected: bool,
    /// Grow the tile bounds by this amount on every side, in output units.
    pub buffer: Option<f64>,
    /// Round coordinates to this many decimals.
    pub precision: Option<u32>,
    /// Feature id; defaults to the tile's display form.
    pub id: Option<String>,
    /// Extra properties merged over the defaults.
    pub properties: Map<String, Value>,
}

impl Resolver<'_> {
    /// GeoJSON Feature whose geometry is the tile polygon.
    pub fn feature(&self, tile: &Tile, options: &FeatureOptions) -> TmsResult<Value> {
        let mut bounds = if options.projected {
            self.tile_to_bounds(tile)?
        } else {
            self.bounds(tile)?
        };
        if let Some(buffer) = options.buffer {
            bounds = bounds.buffered(buffer);
        }
        if let Some(precision) = options.precision {
            bounds = bounds.rounded(precision);
        }

        let [west, south, east, north] = bounds.to_array();
        let crs = self.crs();
        let xyz = tile.to_string();

        let mut properties = Map::new();
        properties.insert("title".to_string(), json!(format!("XYZ tile {}", xyz)));
        properties.insert("grid_name".to_string(), json!(self.tms().identifier()));
        properties.insert("grid_crs".to_string(), json!(crs.to_uri()));
        for (key, value) in &options.properties {
            properties.insert(key.clone(), value.clone());
        }

        let mut feature = json!({
            "type": "Feature",
            "bbox": [west, south, east, north],
            "id": options.id.clone().unwrap_or(xyz),
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [west, south],
                    [west, north],
                    [east, north],
                    [east, south],
                    [west, south]
                ]]
            },
            "properties": properties,
        });

        if options.projected {
            let crs_member = match crs.epsg() {
                Some(code) => json!({"type": "EPSG", "properties": {"code": code}}),
                None => json!({"type": "name", "properties": {"name": crs.to_uri()}}),
            };
            if let Value::Object(members) = &mut feature {
                members.insert("crs".to_string(), crs_member);
            }
        }

        Ok(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_common::TileMatrixSets;

    #[test]
    fn test_geographic_feature() {
        let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
        let resolver = Resolver::new(&tms);
        let feature = resolver
            .feature(&Tile::new(0, 0, 1), &FeatureOptions::default())
            .unwrap();

        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["id"], "Tile(x=0, y=0, z=1)");
        assert_eq!(feature["properties"]["title"], "XYZ tile Tile(x=0, y=0, z=1)");
        assert_eq!(feature["properties"]["grid_name"], "WebMercatorQuad");
        assert!(feature.get("crs").is_none());

        let ring = feature["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
        let west = ring[0][0].as_f64().unwrap();
        let north = ring[1][1].as_f64().unwrap();
        assert!((west + 180.0).abs() < 1e-9);
        assert!((north - 85.0511287798066).abs() < 1e-9);
    }

    #[test]
    fn test_projected_feature_with_options() {
        let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
        let resolver = Resolver::new(&tms);
        let mut properties = Map::new();
        properties.insert("source".to_string(), json!("test"));
        let options = FeatureOptions {
            projected: true,
            buffer: Some(10.0),
            precision: Some(0),
            id: Some("a".to_string()),
            properties,
        };
        let feature = resolver.feature(&Tile::new(1, 1, 1), &options).unwrap();

        assert_eq!(feature["id"], "a");
        assert_eq!(feature["crs"]["properties"]["code"], 3857);
        assert_eq!(feature["properties"]["source"], "test");
        let bbox = feature["bbox"].as_array().unwrap();
        assert_eq!(bbox[0].as_f64().unwrap(), -10.0);
        assert_eq!(bbox[3].as_f64().unwrap(), 10.0);
    }
}
