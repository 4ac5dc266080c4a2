//! Common test fixtures: small matrix sets, well-known sets, bounding boxes
//! and a stub projection adapter.

use std::sync::Arc;

use projection::ProjectionAdapter;
use tms_common::{
    AxisOrder, CornerOfOrigin, CrsCode, ProjectionError, TileMatrix, TileMatrixSet,
    TileMatrixSets,
};

/// EPSG's "user-defined" code, used for the local metric test grids.
pub const LOCAL_CRS: CrsCode = CrsCode::Epsg(32767);

/// Side of the local test grids, in CRS units.
pub const GRID_EXTENT: f64 = 1024.0;

/// Web Mercator half-width in meters.
pub const MERCATOR_MAX_EXTENT: f64 = 20037508.342789244;

/// Common bounding boxes, (left, bottom, right, top).
pub mod bbox {
    /// Global geographic extent
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Continental United States
    pub const CONUS: (f64, f64, f64, f64) = (-130.0, 20.0, -60.0, 55.0);

    /// Europe
    pub const EUROPE: (f64, f64, f64, f64) = (-15.0, 35.0, 45.0, 72.0);

    /// Crosses the antimeridian (left > right)
    pub const PACIFIC: (f64, f64, f64, f64) = (160.0, -50.0, -140.0, 50.0);

    /// Inverted on both axes
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);

    /// Entirely outside every world-wide set
    pub const OFF_WORLD: (f64, f64, f64, f64) = (200.0, 100.0, 210.0, 110.0);
}

/// Build a `BoundingBox` from one of the tuples in [`bbox`].
pub fn to_bbox(b: (f64, f64, f64, f64)) -> tms_common::BoundingBox {
    tms_common::BoundingBox::new(b.0, b.1, b.2, b.3)
}

fn grid_level(zoom: u32, corner: CornerOfOrigin) -> TileMatrix {
    let n = 1u32 << zoom;
    let origin = match corner {
        CornerOfOrigin::TopLeft => (0.0, GRID_EXTENT),
        CornerOfOrigin::BottomLeft => (0.0, 0.0),
    };
    TileMatrix {
        zoom,
        scale_denominator: 0.0,
        cell_size: GRID_EXTENT / 256.0 / n as f64,
        point_of_origin: origin,
        tile_width: 256,
        tile_height: 256,
        matrix_width: n,
        matrix_height: n,
    }
}

/// Quadtree over `[0, 0, 1024, 1024]` with tile (0, 0) at the top-left.
pub fn grid_top_left(max_zoom: u32) -> TileMatrixSet {
    TileMatrixSet::builder("GridTopLeft", LOCAL_CRS)
        .matrices((0..=max_zoom).map(|z| grid_level(z, CornerOfOrigin::TopLeft)))
        .build()
        .expect("top-left test grid")
}

/// Quadtree over `[0, 0, 1024, 1024]` with tile (0, 0) at the bottom-left.
pub fn grid_bottom_left(max_zoom: u32) -> TileMatrixSet {
    TileMatrixSet::builder("GridBottomLeft", LOCAL_CRS)
        .corner_of_origin(CornerOfOrigin::BottomLeft)
        .matrices((0..=max_zoom).map(|z| grid_level(z, CornerOfOrigin::BottomLeft)))
        .build()
        .expect("bottom-left test grid")
}

/// A set that is not a quadtree everywhere.
///
/// - zoom 0: 3 x 2 tiles of 100 units (no single root, so no quadkeys)
/// - zoom 1: 6 x 4 tiles of 50 units (a clean 2x step from zoom 0)
/// - zoom 2: 9 x 6 tiles of 33.3 units (a 3x step, so no parent/children)
pub fn irregular_grid() -> TileMatrixSet {
    let level = |zoom: u32, cell_size: f64, width: u32, height: u32| TileMatrix {
        zoom,
        scale_denominator: 0.0,
        cell_size,
        point_of_origin: (0.0, 200.0),
        tile_width: 1,
        tile_height: 1,
        matrix_width: width,
        matrix_height: height,
    };
    TileMatrixSet::builder("Irregular", LOCAL_CRS)
        .matrix(level(0, 100.0, 3, 2))
        .matrix(level(1, 50.0, 6, 4))
        .matrix(level(2, 100.0 / 3.0, 9, 6))
        .build()
        .expect("irregular test grid")
}

pub fn web_mercator() -> Arc<TileMatrixSet> {
    TileMatrixSets::builtin()
        .get("WebMercatorQuad")
        .expect("WebMercatorQuad")
}

pub fn world_crs84() -> Arc<TileMatrixSet> {
    TileMatrixSets::builtin()
        .get("WorldCRS84Quad")
        .expect("WorldCRS84Quad")
}

pub fn wgs1984() -> Arc<TileMatrixSet> {
    TileMatrixSets::builtin()
        .get("WGS1984Quad")
        .expect("WGS1984Quad")
}

/// Projection adapter that returns every coordinate unchanged, for any CRS.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjection;

impl ProjectionAdapter for IdentityProjection {
    fn forward(&self, _crs: CrsCode, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        Ok((lon, lat))
    }

    fn inverse(&self, _crs: CrsCode, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        Ok((x, y))
    }

    fn supports(&self, _crs: CrsCode) -> bool {
        true
    }

    fn axis_order(&self, _crs: CrsCode) -> AxisOrder {
        AxisOrder::XY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grids_are_quadtrees() {
        assert!(grid_top_left(3).is_quadtree());
        assert!(grid_bottom_left(3).is_quadtree());
        assert!(!irregular_grid().is_quadtree());
    }

    #[test]
    fn test_grid_extent() {
        let tms = grid_bottom_left(2);
        assert_eq!(
            tms.bounding_box().to_array(),
            [0.0, 0.0, GRID_EXTENT, GRID_EXTENT]
        );
        assert_eq!(tms.matrix_at(2).unwrap().tile_span_x(), 256.0);
    }

    #[test]
    fn test_irregular_steps() {
        let tms = irregular_grid();
        assert!(tms.is_quadtree_step(1));
        assert!(!tms.is_quadtree_step(2));
    }
}
