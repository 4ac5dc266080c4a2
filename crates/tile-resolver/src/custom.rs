//! Custom tile matrix sets from an extent in any supported CRS.

use tracing::debug;

use projection::{transform_bounds, ProjectionAdapter, DEFAULT_DENSIFY_POINTS};
use tms_common::{BoundingBox, CrsCode, CustomOptions, TileMatrixSet, TmsResult};

/// Build a regular set in `crs` covering `extent`, which is given in
/// `extent_crs`.
///
/// An extent in another CRS is projected through its densified boundary
/// first, so the set covers the whole area and not just the corners.
pub fn custom_from_extent(
    extent: &BoundingBox,
    extent_crs: CrsCode,
    crs: CrsCode,
    options: &CustomOptions,
    projection: &dyn ProjectionAdapter,
) -> TmsResult<TileMatrixSet> {
    let native = if extent_crs.same_space(&crs) {
        extent.with_crs(crs)
    } else {
        let projected = transform_bounds(
            projection,
            extent,
            extent_crs,
            crs,
            DEFAULT_DENSIFY_POINTS,
        )?;
        debug!(
            from = %extent_crs,
            to = %crs,
            extent = %projected,
            "Projected custom tile matrix set extent"
        );
        projected
    };

    TileMatrixSet::custom(native, crs, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::BuiltinProjections;
    use tms_common::TmsError;

    const MAX_EXTENT: f64 = 20037508.342789244;

    #[test]
    fn test_geographic_extent_to_web_mercator() {
        let extent = BoundingBox::new(-180.0, -85.0511287798066, 180.0, 85.0511287798066);
        let tms = custom_from_extent(
            &extent,
            CrsCode::Crs84,
            CrsCode::Epsg3857,
            &CustomOptions {
                max_zoom: 4,
                ..CustomOptions::default()
            },
            &BuiltinProjections,
        )
        .unwrap();

        let z0 = tms.matrix_at(0).unwrap();
        assert!((z0.cell_size - 156543.03392804097).abs() < 1e-3);
        assert!((z0.point_of_origin.0 + MAX_EXTENT).abs() < 1e-3);
        assert!((z0.point_of_origin.1 - MAX_EXTENT).abs() < 1e-3);
        assert!(tms.is_quadtree());
        assert_eq!(tms.max_zoom(), 4);
    }

    #[test]
    fn test_native_extent_passes_through() {
        let extent = BoundingBox::new(0.0, 0.0, 1000.0, 500.0);
        let tms = custom_from_extent(
            &extent,
            CrsCode::Epsg3857,
            CrsCode::Epsg3857,
            &CustomOptions {
                matrix_scale: [2, 1],
                max_zoom: 2,
                ..CustomOptions::default()
            },
            &BuiltinProjections,
        )
        .unwrap();
        let z0 = tms.matrix_at(0).unwrap();
        assert_eq!((z0.matrix_width, z0.matrix_height), (2, 1));
        assert!((z0.cell_size - 500.0 / 256.0).abs() < 1e-12);
    }

    #[test]
    fn test_unsupported_crs() {
        let extent = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let result = custom_from_extent(
            &extent,
            CrsCode::Crs84,
            CrsCode::Epsg(5070),
            &CustomOptions::default(),
            &BuiltinProjections,
        );
        assert!(matches!(result, Err(TmsError::Projection(_))));
    }
}
