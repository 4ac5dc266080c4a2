//! Validated, immutable Tile Matrix Set.
//!
//! A `TileMatrixSet` can only be obtained through [`TileMatrixSetBuilder`],
//! which checks every invariant once. After that the set is read-only and can
//! be shared freely between threads.

use tracing::debug;

use crate::tile::{CornerOfOrigin, TileMatrix};
use crate::{BoundingBox, CrsCode, Tile, TmsError, TmsResult};

/// OGC standardized rendering pixel size in meters.
pub const STANDARD_PIXEL_SIZE: f64 = 0.00028;

/// Relative tolerance when comparing cell sizes between zoom levels.
const CELL_SIZE_TOLERANCE: f64 = 1e-6;

/// How zoom levels map to positions in the matrix list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoomIndex {
    /// Zoom levels are contiguous from `min`: index = zoom - min.
    Dense { min: u32 },
    /// Gaps between zoom levels: binary search.
    Sparse,
}

/// A complete tile matrix set definition.
#[derive(Debug, Clone)]
pub struct TileMatrixSet {
    identifier: String,
    title: Option<String>,
    uri: Option<String>,
    crs: CrsCode,
    ordered_axes: Option<Vec<String>>,
    well_known_scale_set: Option<String>,
    bounding_box: BoundingBox,
    corner_of_origin: CornerOfOrigin,
    tile_matrices: Vec<TileMatrix>,
    zoom_index: ZoomIndex,
    is_quadtree: bool,
}

impl TileMatrixSet {
    /// Start building a set with the given identifier and CRS.
    pub fn builder(identifier: impl Into<String>, crs: CrsCode) -> TileMatrixSetBuilder {
        TileMatrixSetBuilder::new(identifier, crs)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Native coordinate reference system.
    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn ordered_axes(&self) -> Option<&[String]> {
        self.ordered_axes.as_deref()
    }

    pub fn well_known_scale_set(&self) -> Option<&str> {
        self.well_known_scale_set.as_deref()
    }

    /// Bounding box in native CRS units.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn corner_of_origin(&self) -> CornerOfOrigin {
        self.corner_of_origin
    }

    /// Tile matrices, sorted by ascending zoom.
    pub fn tile_matrices(&self) -> &[TileMatrix] {
        &self.tile_matrices
    }

    /// Iterate over matrices in zoom order.
    pub fn iter(&self) -> std::slice::Iter<'_, TileMatrix> {
        self.tile_matrices.iter()
    }

    /// Whether the set forms a power-of-two quadtree rooted at a single zoom-0 tile.
    pub fn is_quadtree(&self) -> bool {
        self.is_quadtree
    }

    /// Get the tile matrix for a zoom level, if defined.
    pub fn get_matrix(&self, zoom: u32) -> Option<&TileMatrix> {
        match self.zoom_index {
            ZoomIndex::Dense { min } => zoom
                .checked_sub(min)
                .and_then(|i| self.tile_matrices.get(i as usize)),
            ZoomIndex::Sparse => self
                .tile_matrices
                .binary_search_by_key(&zoom, |m| m.zoom)
                .ok()
                .map(|i| &self.tile_matrices[i]),
        }
    }

    /// Get the tile matrix for a zoom level.
    pub fn matrix_at(&self, zoom: u32) -> TmsResult<&TileMatrix> {
        self.get_matrix(zoom).ok_or_else(|| TmsError::UnsupportedZoom {
            identifier: self.identifier.clone(),
            zoom,
        })
    }

    /// (minimum zoom, maximum zoom).
    pub fn zoom_range(&self) -> TmsResult<(u32, u32)> {
        match (self.tile_matrices.first(), self.tile_matrices.last()) {
            (Some(first), Some(last)) => Ok((first.zoom, last.zoom)),
            _ => Err(TmsError::EmptyMatrixSet(self.identifier.clone())),
        }
    }

    /// Minimum zoom level.
    pub fn min_zoom(&self) -> u32 {
        self.tile_matrices.first().map(|m| m.zoom).unwrap_or(0)
    }

    /// Maximum zoom level.
    pub fn max_zoom(&self) -> u32 {
        self.tile_matrices.last().map(|m| m.zoom).unwrap_or(0)
    }

    /// Tile index extrema at a zoom: ((min_x, max_x), (min_y, max_y)).
    pub fn minmax(&self, zoom: u32) -> TmsResult<((u32, u32), (u32, u32))> {
        let m = self.matrix_at(zoom)?;
        Ok(((0, m.matrix_width - 1), (0, m.matrix_height - 1)))
    }

    /// Extent of the minimum-zoom matrix in native CRS units.
    pub fn xy_bbox(&self) -> BoundingBox {
        match self.tile_matrices.first() {
            Some(m) => m.extent(self.corner_of_origin).with_crs(self.crs),
            None => self.bounding_box,
        }
    }

    /// Check that a tile's zoom exists and its indices are inside the matrix.
    pub fn is_valid(&self, tile: &Tile) -> bool {
        self.get_matrix(tile.z)
            .map(|m| m.contains_index(tile.x, tile.y))
            .unwrap_or(false)
    }

    /// Whether the level at `zoom` is an exact 2x subdivision of the level above.
    pub fn is_quadtree_step(&self, zoom: u32) -> bool {
        match (
            zoom.checked_sub(1).and_then(|z| self.get_matrix(z)),
            self.get_matrix(zoom),
        ) {
            (Some(parent), Some(child)) => quadtree_step(parent, child),
            _ => false,
        }
    }
}

impl<'a> IntoIterator for &'a TileMatrixSet {
    type Item = &'a TileMatrix;
    type IntoIter = std::slice::Iter<'a, TileMatrix>;

    fn into_iter(self) -> Self::IntoIter {
        self.tile_matrices.iter()
    }
}

/// True when `child` halves `parent`'s cell size on the same origin and its
/// dimensions halve (rounding up) to the parent's.
fn quadtree_step(parent: &TileMatrix, child: &TileMatrix) -> bool {
    child.zoom == parent.zoom + 1
        && parent.tile_width == child.tile_width
        && parent.tile_height == child.tile_height
        && child.matrix_width.div_ceil(2) == parent.matrix_width
        && child.matrix_height.div_ceil(2) == parent.matrix_height
        && relative_eq(parent.cell_size, child.cell_size * 2.0)
        && relative_eq_abs(parent.point_of_origin.0, child.point_of_origin.0, child.cell_size)
        && relative_eq_abs(parent.point_of_origin.1, child.point_of_origin.1, child.cell_size)
}

fn relative_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= CELL_SIZE_TOLERANCE * a.abs().max(b.abs())
}

fn relative_eq_abs(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= CELL_SIZE_TOLERANCE * scale.max(1.0)
}

/// Builder performing all invariant checks for a [`TileMatrixSet`].
#[derive(Debug, Clone)]
pub struct TileMatrixSetBuilder {
    identifier: String,
    title: Option<String>,
    uri: Option<String>,
    crs: CrsCode,
    ordered_axes: Option<Vec<String>>,
    well_known_scale_set: Option<String>,
    bounding_box: Option<BoundingBox>,
    corner_of_origin: CornerOfOrigin,
    tile_matrices: Vec<TileMatrix>,
    require_quadtree: bool,
}

impl TileMatrixSetBuilder {
    pub fn new(identifier: impl Into<String>, crs: CrsCode) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            uri: None,
            crs,
            ordered_axes: None,
            well_known_scale_set: None,
            bounding_box: None,
            corner_of_origin: CornerOfOrigin::TopLeft,
            tile_matrices: Vec::new(),
            require_quadtree: false,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn ordered_axes(mut self, axes: Vec<String>) -> Self {
        self.ordered_axes = Some(axes);
        self
    }

    pub fn well_known_scale_set(mut self, wkss: impl Into<String>) -> Self {
        self.well_known_scale_set = Some(wkss.into());
        self
    }

    /// Bounding box in native CRS units, (x, y) order.
    ///
    /// When omitted the extent of the minimum-zoom matrix is used.
    pub fn bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    pub fn corner_of_origin(mut self, corner: CornerOfOrigin) -> Self {
        self.corner_of_origin = corner;
        self
    }

    /// Add one tile matrix. Order does not matter.
    pub fn matrix(mut self, matrix: TileMatrix) -> Self {
        self.tile_matrices.push(matrix);
        self
    }

    pub fn matrices<I: IntoIterator<Item = TileMatrix>>(mut self, matrices: I) -> Self {
        self.tile_matrices.extend(matrices);
        self
    }

    /// Fail construction unless the set supports quadkeys.
    pub fn require_quadtree(mut self, required: bool) -> Self {
        self.require_quadtree = required;
        self
    }

    /// Validate and build the set.
    pub fn build(self) -> TmsResult<TileMatrixSet> {
        let mut matrices = self.tile_matrices;
        if matrices.is_empty() {
            return Err(TmsError::EmptyMatrixSet(self.identifier));
        }

        let mpu = self.crs.meters_per_unit();
        for m in &mut matrices {
            fill_cell_size(m, mpu);
            validate_matrix(m)?;
        }

        matrices.sort_by_key(|m| m.zoom);
        if let Some(pair) = matrices.windows(2).find(|w| w[0].zoom == w[1].zoom) {
            return Err(TmsError::InvalidDefinition(format!(
                "duplicate zoom level {}",
                pair[0].zoom
            )));
        }

        for pair in matrices.windows(2) {
            if pair[1].cell_size >= pair[0].cell_size {
                return Err(TmsError::InvalidDefinition(format!(
                    "resolution must increase with zoom: level {} is not finer than level {}",
                    pair[1].zoom, pair[0].zoom
                )));
            }
        }

        let corner = self.corner_of_origin;
        let bounding_box = match self.bounding_box {
            Some(bbox) => {
                if bbox.has_nan() || bbox.min_x > bbox.max_x || bbox.min_y > bbox.max_y {
                    return Err(TmsError::InvalidDefinition(format!(
                        "invalid bounding box {}",
                        bbox
                    )));
                }
                bbox.with_crs(self.crs)
            }
            None => matrices[0].extent(corner).with_crs(self.crs),
        };

        for m in &matrices {
            let extent = m.extent(corner);
            let tolerance = m.cell_size;
            if extent.min_x > bounding_box.min_x + tolerance
                || extent.min_y > bounding_box.min_y + tolerance
                || extent.max_x < bounding_box.max_x - tolerance
                || extent.max_y < bounding_box.max_y - tolerance
            {
                return Err(TmsError::InvalidDefinition(format!(
                    "matrix at zoom {} covers {} which does not span the set bounding box {}",
                    m.zoom, extent, bounding_box
                )));
            }
        }

        let min = matrices[0].zoom;
        let dense = matrices
            .iter()
            .enumerate()
            .all(|(i, m)| m.zoom == min + i as u32);
        let zoom_index = if dense {
            ZoomIndex::Dense { min }
        } else {
            ZoomIndex::Sparse
        };

        let is_quadtree = check_quadtree(&matrices);
        if self.require_quadtree && !is_quadtree {
            return Err(TmsError::QuadkeyUnsupported(self.identifier));
        }

        debug!(
            identifier = %self.identifier,
            crs = %self.crs,
            min_zoom = min,
            max_zoom = matrices[matrices.len() - 1].zoom,
            quadtree = is_quadtree,
            "Built tile matrix set"
        );

        Ok(TileMatrixSet {
            identifier: self.identifier,
            title: self.title,
            uri: self.uri,
            crs: self.crs,
            ordered_axes: self.ordered_axes,
            well_known_scale_set: self.well_known_scale_set,
            bounding_box,
            corner_of_origin: corner,
            tile_matrices: matrices,
            zoom_index,
            is_quadtree,
        })
    }
}

/// Derive whichever of cell size / scale denominator is missing (marked by 0).
fn fill_cell_size(m: &mut TileMatrix, meters_per_unit: f64) {
    if m.cell_size == 0.0 && m.scale_denominator > 0.0 {
        m.cell_size = m.scale_denominator * STANDARD_PIXEL_SIZE / meters_per_unit;
    } else if m.scale_denominator == 0.0 && m.cell_size > 0.0 {
        m.scale_denominator = m.cell_size * meters_per_unit / STANDARD_PIXEL_SIZE;
    }
}

fn validate_matrix(m: &TileMatrix) -> TmsResult<()> {
    if !(m.cell_size.is_finite() && m.cell_size > 0.0) {
        return Err(TmsError::InvalidDefinition(format!(
            "zoom {}: cell size must be positive, got {}",
            m.zoom, m.cell_size
        )));
    }
    if m.tile_width == 0 || m.tile_height == 0 {
        return Err(TmsError::InvalidDefinition(format!(
            "zoom {}: invalid tile size {}x{}",
            m.zoom, m.tile_width, m.tile_height
        )));
    }
    if m.matrix_width == 0 || m.matrix_height == 0 {
        return Err(TmsError::InvalidDefinition(format!(
            "zoom {}: invalid matrix size {}x{}",
            m.zoom, m.matrix_width, m.matrix_height
        )));
    }
    if !(m.point_of_origin.0.is_finite() && m.point_of_origin.1.is_finite()) {
        return Err(TmsError::InvalidDefinition(format!(
            "zoom {}: point of origin must be finite",
            m.zoom
        )));
    }
    Ok(())
}

/// Quadkeys need a single root tile at zoom 0 and a clean 2x subdivision at every level.
fn check_quadtree(matrices: &[TileMatrix]) -> bool {
    let root = &matrices[0];
    root.zoom == 0
        && root.matrix_width == 1
        && root.matrix_height == 1
        && matrices.windows(2).all(|w| {
            quadtree_step(&w[0], &w[1])
                && w[0].matrix_width.checked_mul(2) == Some(w[1].matrix_width)
                && w[0].matrix_height.checked_mul(2) == Some(w[1].matrix_height)
        })
}
