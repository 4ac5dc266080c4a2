//! Point, tile and bounding-box transforms for one tile matrix set.

use tracing::{debug, warn};

use projection::{transform_bounds, BuiltinProjections, ProjectionAdapter, DEFAULT_DENSIFY_POINTS};
use tms_common::tile::{ceil_index, floor_index};
use tms_common::{BoundingBox, CrsCode, Tile, TileMatrix, TileMatrixSet, TmsError, TmsResult};

use crate::range::{TileCover, TileRange};

/// What to do when a point falls outside the tile matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// Clamp to the nearest edge tile.
    #[default]
    Lenient,
    /// Fail with `TileOutOfBounds`.
    Strict,
}

/// Coordinate resolver over a borrowed, immutable tile matrix set.
///
/// Holds no state of its own: every method is a pure function of the set,
/// the projection adapter and its arguments, so a resolver can be shared
/// freely between threads.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    tms: &'a TileMatrixSet,
    projection: &'a dyn ProjectionAdapter,
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("tms", &self.tms.identifier())
            .finish()
    }
}

impl<'a> Resolver<'a> {
    /// Resolver using the built-in projections.
    pub fn new(tms: &'a TileMatrixSet) -> Self {
        Self {
            tms,
            projection: &BuiltinProjections,
        }
    }

    /// Resolver using a caller-supplied projection adapter.
    pub fn with_projection(tms: &'a TileMatrixSet, projection: &'a dyn ProjectionAdapter) -> Self {
        Self { tms, projection }
    }

    pub fn tms(&self) -> &'a TileMatrixSet {
        self.tms
    }

    pub fn projection(&self) -> &'a dyn ProjectionAdapter {
        self.projection
    }

    /// Native CRS of the set.
    pub fn crs(&self) -> CrsCode {
        self.tms.crs()
    }

    // === Point -> Tile ===

    /// Tile containing the point (`x`, `y`) given in `crs`.
    ///
    /// Points on a shared interior edge belong to the tile with the larger
    /// index; points on the far outer edge belong to the last tile. Outside
    /// the matrix, `Lenient` clamps to the nearest edge tile and `Strict`
    /// fails with `TileOutOfBounds`.
    ///
    /// An infinite coordinate in the native CRS lies outside the matrix in
    /// that direction. NaN, or infinity that would need projecting, is
    /// `InvalidCoordinate`.
    pub fn point_to_tile(
        &self,
        x: f64,
        y: f64,
        zoom: u32,
        crs: CrsCode,
        mode: LookupMode,
    ) -> TmsResult<Tile> {
        let native = crs.same_space(&self.crs());
        if x.is_nan() || y.is_nan() || (!native && !(x.is_finite() && y.is_finite())) {
            return Err(TmsError::InvalidCoordinate(format!("({}, {})", x, y)));
        }
        let matrix = self.tms.matrix_at(zoom)?;
        let (nx, ny) = self.to_native(x, y, crs)?;
        if nx.is_nan() || ny.is_nan() {
            return Err(TmsError::InvalidCoordinate(format!("({}, {})", x, y)));
        }
        self.index_in_matrix(matrix, nx, ny, mode)
    }

    /// Tile containing a WGS84 longitude/latitude.
    ///
    /// With `truncate`, the point is first clamped to the geographic bounds of
    /// the set, which keeps polar latitudes usable in Mercator sets.
    pub fn tile(&self, lng: f64, lat: f64, zoom: u32, truncate: bool) -> TmsResult<Tile> {
        if !(lng.is_finite() && lat.is_finite()) {
            return Err(TmsError::InvalidCoordinate(format!("({}, {})", lng, lat)));
        }
        let matrix = self.tms.matrix_at(zoom)?;
        let (x, y) = self.xy(lng, lat, truncate)?;
        self.index_in_matrix(matrix, x, y, LookupMode::Lenient)
    }

    fn index_in_matrix(
        &self,
        matrix: &TileMatrix,
        x: f64,
        y: f64,
        mode: LookupMode,
    ) -> TmsResult<Tile> {
        let (col, row) = matrix.coord_to_index(x, y, self.tms.corner_of_origin());
        let max_col = matrix.matrix_width as i64 - 1;
        let max_row = matrix.matrix_height as i64 - 1;

        if (0..=max_col).contains(&col) && (0..=max_row).contains(&row) {
            return Ok(Tile::new(col as u32, row as u32, matrix.zoom));
        }

        match mode {
            LookupMode::Strict => Err(TmsError::TileOutOfBounds {
                x: col,
                y: row,
                z: matrix.zoom,
                matrix_width: matrix.matrix_width,
                matrix_height: matrix.matrix_height,
            }),
            LookupMode::Lenient => {
                let clamped = Tile::new(
                    col.clamp(0, max_col) as u32,
                    row.clamp(0, max_row) as u32,
                    matrix.zoom,
                );
                debug!(
                    col = col,
                    row = row,
                    zoom = matrix.zoom,
                    tile = %clamped,
                    "Clamped point outside tile matrix"
                );
                Ok(clamped)
            }
        }
    }

    // === Geographic <-> native ===

    /// WGS84 longitude/latitude to native coordinates.
    pub fn xy(&self, lng: f64, lat: f64, truncate: bool) -> TmsResult<(f64, f64)> {
        let (lng, lat) = if truncate {
            self.truncate_lnglat(lng, lat)
        } else {
            (lng, lat)
        };

        if let Ok(bounds) = self.geographic_bounds() {
            if !bounds.contains_point(lng, lat) {
                warn!(
                    lng = lng,
                    lat = lat,
                    tms = %self.tms.identifier(),
                    "Point is outside the tile matrix set bounds"
                );
            }
        }

        Ok(self.projection.forward(self.crs(), lng, lat)?)
    }

    /// Native coordinates to WGS84 longitude/latitude.
    pub fn lnglat(&self, x: f64, y: f64, truncate: bool) -> TmsResult<(f64, f64)> {
        let bbox = self.tms.bounding_box();
        let (x, y) = if truncate {
            bbox.clamp_point(x, y)
        } else {
            (x, y)
        };

        if !bbox.contains_point(x, y) {
            warn!(
                x = x,
                y = y,
                tms = %self.tms.identifier(),
                "Point is outside the tile matrix set bounds"
            );
        }

        Ok(self.projection.inverse(self.crs(), x, y)?)
    }

    /// Clamp a longitude/latitude into the geographic bounds of the set.
    pub fn truncate_lnglat(&self, lng: f64, lat: f64) -> (f64, f64) {
        let bounds = self
            .geographic_bounds()
            .unwrap_or_else(|_| BoundingBox::new(-180.0, -90.0, 180.0, 90.0));
        bounds.clamp_point(lng, lat)
    }

    /// Bounds of the whole set in WGS84 longitude/latitude.
    pub fn geographic_bounds(&self) -> TmsResult<BoundingBox> {
        Ok(transform_bounds(
            self.projection,
            &self.tms.bounding_box(),
            self.crs(),
            CrsCode::Crs84,
            DEFAULT_DENSIFY_POINTS,
        )?)
    }

    fn to_native(&self, x: f64, y: f64, crs: CrsCode) -> TmsResult<(f64, f64)> {
        if crs.same_space(&self.crs()) {
            Ok((x, y))
        } else {
            Ok(self.projection.transform(crs, self.crs(), x, y)?)
        }
    }

    /// Check whether `bbox`, in native units, overlaps the extent of the
    /// set. Boxes that only share an edge with it do not.
    pub fn intersects_tms(&self, bbox: &BoundingBox) -> bool {
        bbox.intersects(&self.tms.xy_bbox())
    }

    // === Tile -> bounds ===

    /// Bounds of a tile in native CRS units.
    ///
    /// Indices beyond the matrix are extrapolated; only the zoom must exist.
    pub fn tile_to_bounds(&self, tile: &Tile) -> TmsResult<BoundingBox> {
        let matrix = self.tms.matrix_at(tile.z)?;
        Ok(matrix
            .tile_bbox(tile.x, tile.y, self.tms.corner_of_origin())
            .with_crs(self.crs()))
    }

    /// Bounds of a tile in `target`, the envelope of its densified boundary.
    pub fn tile_to_geographic_bounds(&self, tile: &Tile, target: CrsCode) -> TmsResult<BoundingBox> {
        let bounds = self.tile_to_bounds(tile)?;
        Ok(transform_bounds(
            self.projection,
            &bounds,
            self.crs(),
            target,
            DEFAULT_DENSIFY_POINTS,
        )?)
    }

    /// Bounds of a tile in WGS84 longitude/latitude.
    pub fn bounds(&self, tile: &Tile) -> TmsResult<BoundingBox> {
        self.tile_to_geographic_bounds(tile, CrsCode::Crs84)
    }

    /// Upper-left corner of a tile in native units.
    pub fn xy_ul(&self, tile: &Tile) -> TmsResult<(f64, f64)> {
        let bounds = self.tile_to_bounds(tile)?;
        Ok((bounds.min_x, bounds.max_y))
    }

    /// Upper-left corner of a tile as WGS84 longitude/latitude.
    pub fn ul(&self, tile: &Tile) -> TmsResult<(f64, f64)> {
        let (x, y) = self.xy_ul(tile)?;
        Ok(self.projection.inverse(self.crs(), x, y)?)
    }

    // === BBox -> tiles ===

    /// Tiles intersecting `bbox` (given in `crs`) at `zoom`.
    ///
    /// - In a geographic CRS, `left > right` crosses the antimeridian and is
    ///   split in two ranges, west part first.
    /// - The box is clamped to the set bounds first; a box entirely outside
    ///   yields an empty cover.
    /// - A box ending exactly on a tile edge does not include the next tile;
    ///   a degenerate box still yields the tile containing it.
    pub fn tiles_for_bounding_box(
        &self,
        bbox: &BoundingBox,
        zoom: u32,
        crs: CrsCode,
    ) -> TmsResult<TileCover> {
        if bbox.has_nan() {
            return Err(TmsError::InvalidCoordinate(format!("bbox {}", bbox)));
        }
        let matrix = self.tms.matrix_at(zoom)?;

        let parts = if bbox.min_y > bbox.max_y {
            return Err(TmsError::InvalidBbox(format!(
                "bottom {} is above top {}",
                bbox.min_y, bbox.max_y
            )));
        } else if bbox.min_x > bbox.max_x {
            if !crs.is_geographic() {
                return Err(TmsError::InvalidBbox(format!(
                    "left {} is east of right {}",
                    bbox.min_x, bbox.max_x
                )));
            }
            vec![
                BoundingBox::new(bbox.min_x, bbox.min_y, 180.0, bbox.max_y),
                BoundingBox::new(-180.0, bbox.min_y, bbox.max_x, bbox.max_y),
            ]
        } else {
            vec![*bbox]
        };

        let mut ranges = Vec::with_capacity(parts.len());
        for part in parts {
            if let Some(range) = self.range_for(&part, crs, matrix)? {
                ranges.push(range);
            }
        }

        let cover = TileCover::new(ranges);
        debug!(
            zoom = zoom,
            ranges = cover.ranges().len(),
            tiles = cover.len(),
            "Resolved bbox to tiles"
        );
        Ok(cover)
    }

    fn range_for(
        &self,
        bbox: &BoundingBox,
        crs: CrsCode,
        matrix: &TileMatrix,
    ) -> TmsResult<Option<TileRange>> {
        let native_bounds = self.tms.bounding_box();

        let native = if crs.same_space(&self.crs()) {
            *bbox
        } else {
            // clamp in the query CRS first so the projection stays in its domain
            let clamped = match transform_bounds(
                self.projection,
                &native_bounds,
                self.crs(),
                crs,
                DEFAULT_DENSIFY_POINTS,
            ) {
                Ok(extent) => match bbox.intersection(&extent) {
                    Some(clamped) => clamped,
                    None => return Ok(None),
                },
                Err(_) => *bbox,
            };
            transform_bounds(
                self.projection,
                &clamped,
                crs,
                self.crs(),
                DEFAULT_DENSIFY_POINTS,
            )?
        };

        match native.intersection(&native_bounds) {
            Some(clamped) => Ok(Some(self.covering_range(matrix, &clamped))),
            None => Ok(None),
        }
    }

    /// Inclusive index range of the tiles touching `bbox` (native units),
    /// clamped to the matrix.
    pub(crate) fn covering_range(&self, matrix: &TileMatrix, bbox: &BoundingBox) -> TileRange {
        let corner = self.tms.corner_of_origin();
        let (c0, r0) = matrix.fractional_index(bbox.min_x, bbox.max_y, corner);
        let (c1, r1) = matrix.fractional_index(bbox.max_x, bbox.min_y, corner);

        let (min_x, max_x) = span(c0.min(c1), c0.max(c1), matrix.matrix_width);
        let (min_y, max_y) = span(r0.min(r1), r0.max(r1), matrix.matrix_height);

        TileRange {
            zoom: matrix.zoom,
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }
}

/// Tile index span for a fractional interval, clamped to `[0, size)`.
fn span(lo: f64, hi: f64, size: u32) -> (u32, u32) {
    let last = size as i64 - 1;
    let first = floor_index(lo, size);
    let end = ceil_index(hi).max(first);
    (first.clamp(0, last) as u32, end.clamp(0, last) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_common::TileMatrixSets;

    fn web_mercator() -> std::sync::Arc<TileMatrixSet> {
        TileMatrixSets::builtin().get("WebMercatorQuad").unwrap()
    }

    #[test]
    fn test_span_edges() {
        // interval ending on a tile edge stops before it
        assert_eq!(span(0.0, 2.0, 4), (0, 1));
        // degenerate interval on an edge is the tile after it
        assert_eq!(span(2.0, 2.0, 4), (2, 2));
        // far edge belongs to the last tile
        assert_eq!(span(4.0, 4.0, 4), (3, 3));
        // outside is clamped
        assert_eq!(span(-3.5, 9.2, 4), (0, 3));
    }

    #[test]
    fn test_world_center() {
        let tms = web_mercator();
        let resolver = Resolver::new(&tms);
        let tile = resolver
            .point_to_tile(0.0, 0.0, 0, CrsCode::Epsg3857, LookupMode::Strict)
            .unwrap();
        assert_eq!(tile, Tile::new(0, 0, 0));

        // the shared center edge goes to the larger indices
        let tile = resolver
            .point_to_tile(0.0, 0.0, 1, CrsCode::Epsg3857, LookupMode::Strict)
            .unwrap();
        assert_eq!(tile, Tile::new(1, 1, 1));
    }

    #[test]
    fn test_nan_rejected() {
        let tms = web_mercator();
        let resolver = Resolver::new(&tms);
        assert!(matches!(
            resolver.point_to_tile(f64::NAN, 0.0, 1, CrsCode::Epsg3857, LookupMode::Lenient),
            Err(TmsError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn test_infinite_native_coordinates() {
        let tms = web_mercator();
        let resolver = Resolver::new(&tms);
        let lenient = |x, y| {
            resolver
                .point_to_tile(x, y, 2, CrsCode::Epsg3857, LookupMode::Lenient)
                .unwrap()
        };
        assert_eq!(lenient(f64::INFINITY, 0.0), Tile::new(3, 2, 2));
        assert_eq!(lenient(f64::NEG_INFINITY, f64::INFINITY), Tile::new(0, 0, 2));
        assert_eq!(lenient(0.0, f64::NEG_INFINITY), Tile::new(2, 3, 2));

        assert!(matches!(
            resolver.point_to_tile(f64::INFINITY, 0.0, 2, CrsCode::Epsg3857, LookupMode::Strict),
            Err(TmsError::TileOutOfBounds { .. })
        ));
        // infinity cannot be projected
        assert!(matches!(
            resolver.point_to_tile(f64::INFINITY, 0.0, 2, CrsCode::Crs84, LookupMode::Lenient),
            Err(TmsError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn test_intersects_tms() {
        let tms = web_mercator();
        let resolver = Resolver::new(&tms);
        let east = tms.xy_bbox().max_x;

        assert!(resolver.intersects_tms(&BoundingBox::new(-1000.0, -1000.0, 1000.0, 1000.0)));
        assert!(resolver.intersects_tms(&BoundingBox::new(-3.0e7, -3.0e7, 3.0e7, 3.0e7)));
        // touching the east edge only
        assert!(!resolver.intersects_tms(&BoundingBox::new(east, 0.0, 3.0e7, 1000.0)));
        assert!(!resolver.intersects_tms(&BoundingBox::new(2.1e7, 2.1e7, 2.2e7, 2.2e7)));
    }

    #[test]
    fn test_tile_lnglat() {
        let tms = web_mercator();
        let resolver = Resolver::new(&tms);
        // San Francisco
        let tile = resolver.tile(-122.4194, 37.7749, 10, false).unwrap();
        assert_eq!(tile, Tile::new(163, 395, 10));
    }

    #[test]
    fn test_tile_truncates_poles() {
        let tms = web_mercator();
        let resolver = Resolver::new(&tms);
        assert!(resolver.tile(0.0, 90.0, 3, false).is_err());
        assert_eq!(resolver.tile(0.0, 90.0, 3, true).unwrap(), Tile::new(4, 0, 3));
    }
}
