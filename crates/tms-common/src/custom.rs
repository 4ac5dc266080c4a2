//! Generation of regular power-of-two tile matrix sets from an extent.

use crate::matrix_set::STANDARD_PIXEL_SIZE;
use crate::tile::{CornerOfOrigin, TileMatrix};
use crate::{BoundingBox, CrsCode, TileMatrixSet, TmsError, TmsResult};

/// Options for [`TileMatrixSet::custom`].
#[derive(Debug, Clone)]
pub struct CustomOptions {
    pub identifier: String,
    pub title: Option<String>,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Number of root tiles along x and y, e.g. `[2, 1]` for a global
    /// geographic set.
    pub matrix_scale: [u32; 2],
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub corner_of_origin: CornerOfOrigin,
    pub ordered_axes: Option<Vec<String>>,
}

impl Default for CustomOptions {
    fn default() -> Self {
        Self {
            identifier: "Custom".to_string(),
            title: None,
            tile_width: 256,
            tile_height: 256,
            matrix_scale: [1, 1],
            min_zoom: 0,
            max_zoom: 24,
            corner_of_origin: CornerOfOrigin::TopLeft,
            ordered_axes: None,
        }
    }
}

impl TileMatrixSet {
    /// Build a regular set covering `extent` (native CRS units).
    ///
    /// At each zoom the cell size is the larger of the x and y sizes needed
    /// to fit the extent into `matrix_scale * 2^zoom` tiles, so cells stay
    /// square and the extent is always fully covered.
    pub fn custom(
        extent: BoundingBox,
        crs: CrsCode,
        options: &CustomOptions,
    ) -> TmsResult<TileMatrixSet> {
        if extent.has_nan() || extent.width() <= 0.0 || extent.height() <= 0.0 {
            return Err(TmsError::InvalidBbox(format!(
                "custom extent must have a positive area, got {}",
                extent
            )));
        }
        if options.min_zoom > options.max_zoom {
            return Err(TmsError::InvalidParameter {
                param: "zoom".to_string(),
                message: format!(
                    "min zoom {} is above max zoom {}",
                    options.min_zoom, options.max_zoom
                ),
            });
        }
        if options.matrix_scale.contains(&0) {
            return Err(TmsError::InvalidParameter {
                param: "matrix_scale".to_string(),
                message: "matrix scale must be at least 1 in each direction".to_string(),
            });
        }

        let mpu = crs.meters_per_unit();
        let origin = match options.corner_of_origin {
            CornerOfOrigin::TopLeft => (extent.min_x, extent.max_y),
            CornerOfOrigin::BottomLeft => (extent.min_x, extent.min_y),
        };

        let mut matrices = Vec::new();
        for zoom in options.min_zoom..=options.max_zoom {
            let factor = 1u32.checked_shl(zoom).ok_or_else(|| zoom_overflow(zoom))?;
            let matrix_width = options.matrix_scale[0]
                .checked_mul(factor)
                .ok_or_else(|| zoom_overflow(zoom))?;
            let matrix_height = options.matrix_scale[1]
                .checked_mul(factor)
                .ok_or_else(|| zoom_overflow(zoom))?;

            let res_x = extent.width() / (options.tile_width as f64 * matrix_width as f64);
            let res_y = extent.height() / (options.tile_height as f64 * matrix_height as f64);
            let cell_size = res_x.max(res_y);

            matrices.push(TileMatrix {
                zoom,
                scale_denominator: cell_size * mpu / STANDARD_PIXEL_SIZE,
                cell_size,
                point_of_origin: origin,
                tile_width: options.tile_width,
                tile_height: options.tile_height,
                matrix_width,
                matrix_height,
            });
        }

        let mut builder = TileMatrixSet::builder(options.identifier.clone(), crs)
            .corner_of_origin(options.corner_of_origin)
            .bounding_box(extent)
            .matrices(matrices);
        if let Some(title) = &options.title {
            builder = builder.title(title.clone());
        }
        if let Some(axes) = &options.ordered_axes {
            builder = builder.ordered_axes(axes.clone());
        }
        builder.build()
    }
}

fn zoom_overflow(zoom: u32) -> TmsError {
    TmsError::InvalidParameter {
        param: "zoom".to_string(),
        message: format!("matrix dimensions overflow at zoom {}", zoom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_web_mercator_like() {
        let e = 20037508.342789244;
        let tms = TileMatrixSet::custom(
            BoundingBox::new(-e, -e, e, e),
            CrsCode::Epsg3857,
            &CustomOptions {
                max_zoom: 5,
                ..Default::default()
            },
        )
        .unwrap();

        assert!(tms.is_quadtree());
        let m0 = tms.matrix_at(0).unwrap();
        assert!((m0.cell_size - 156543.03392804097).abs() < 1e-6);
        assert!((m0.scale_denominator - 559082264.0287178).abs() < 1e-3);
        assert_eq!(tms.matrix_at(5).unwrap().matrix_width, 32);
    }

    #[test]
    fn test_custom_geographic_two_root_tiles() {
        let tms = TileMatrixSet::custom(
            BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            CrsCode::Crs84,
            &CustomOptions {
                matrix_scale: [2, 1],
                max_zoom: 2,
                ..Default::default()
            },
        )
        .unwrap();

        assert!(!tms.is_quadtree());
        let m1 = tms.matrix_at(1).unwrap();
        assert_eq!((m1.matrix_width, m1.matrix_height), (4, 2));
        assert!((m1.cell_size - 0.3515625).abs() < 1e-12);
    }

    #[test]
    fn test_custom_rejects_empty_extent() {
        let result = TileMatrixSet::custom(
            BoundingBox::new(0.0, 0.0, 0.0, 10.0),
            CrsCode::Epsg3857,
            &CustomOptions::default(),
        );
        assert!(matches!(result, Err(TmsError::InvalidBbox(_))));
    }
}
