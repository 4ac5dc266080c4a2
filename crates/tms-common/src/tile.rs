//! Tile indices and per-zoom tile matrix definitions.
//!
//! Implements the OGC Tile Matrix Set "tile matrix" concept: the geometry of
//! a single zoom level and the arithmetic between CRS coordinates and
//! fractional tile indices.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::BoundingBox;

/// Fractional indices within this distance of an integer are snapped to it,
/// absorbing floating error from projections and span arithmetic.
pub const INDEX_EPSILON: f64 = 1e-9;

/// A tile index (x/y/z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
    /// Zoom level (TileMatrix identifier)
    pub z: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Path-style key, `z/x/y`.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }

    /// Indices as `[x, y, z]`.
    pub fn to_array(&self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[u32; 3]> for Tile {
    fn from(xyz: [u32; 3]) -> Self {
        Tile::new(xyz[0], xyz[1], xyz[2])
    }
}

impl From<(u32, u32, u32)> for Tile {
    fn from((x, y, z): (u32, u32, u32)) -> Self {
        Tile::new(x, y, z)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile(x={}, y={}, z={})", self.x, self.y, self.z)
    }
}

/// Which corner of the tiling extent holds tile (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CornerOfOrigin {
    /// Rows grow downward from the top edge (XYZ / WMTS).
    #[default]
    TopLeft,
    /// Rows grow upward from the bottom edge (TMS).
    BottomLeft,
}

/// A single tile matrix (zoom level) definition.
///
/// `point_of_origin` is always stored in (x, y) order, whatever the axis
/// order of the CRS authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrix {
    /// Zoom level (TileMatrix identifier)
    pub zoom: u32,

    /// Scale denominator
    pub scale_denominator: f64,

    /// Cell size in CRS units per pixel
    pub cell_size: f64,

    /// Corner-of-origin coordinates (x, y)
    pub point_of_origin: (f64, f64),

    /// Tile width in pixels
    pub tile_width: u32,

    /// Tile height in pixels
    pub tile_height: u32,

    /// Number of tile columns
    pub matrix_width: u32,

    /// Number of tile rows
    pub matrix_height: u32,
}

impl TileMatrix {
    /// Calculate the resolution (units per pixel) for this matrix.
    pub fn resolution(&self) -> f64 {
        self.cell_size
    }

    /// Width of one tile in CRS units.
    pub fn tile_span_x(&self) -> f64 {
        self.cell_size * self.tile_width as f64
    }

    /// Height of one tile in CRS units.
    pub fn tile_span_y(&self) -> f64 {
        self.cell_size * self.tile_height as f64
    }

    /// Total number of tiles in the matrix.
    pub fn tile_count(&self) -> u64 {
        self.matrix_width as u64 * self.matrix_height as u64
    }

    /// Check if a tile index lies inside the matrix.
    pub fn contains_index(&self, col: u32, row: u32) -> bool {
        col < self.matrix_width && row < self.matrix_height
    }

    /// Coordinate of the origin-corner of tile (`col`, `row`).
    ///
    /// Indices may exceed the matrix dimensions; the result extrapolates.
    pub fn corner_of(&self, col: u64, row: u64, corner: CornerOfOrigin) -> (f64, f64) {
        let x = self.point_of_origin.0 + col as f64 * self.tile_span_x();
        let y = match corner {
            CornerOfOrigin::TopLeft => self.point_of_origin.1 - row as f64 * self.tile_span_y(),
            CornerOfOrigin::BottomLeft => self.point_of_origin.1 + row as f64 * self.tile_span_y(),
        };
        (x, y)
    }

    /// Get the bounding box for a specific tile.
    ///
    /// Both edges are computed from the origin so neighbouring tiles share
    /// bit-identical edges.
    pub fn tile_bbox(&self, col: u32, row: u32, corner: CornerOfOrigin) -> BoundingBox {
        let (x0, y0) = self.corner_of(col as u64, row as u64, corner);
        let (x1, y1) = self.corner_of(col as u64 + 1, row as u64 + 1, corner);

        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Extent covered by the whole matrix.
    pub fn extent(&self, corner: CornerOfOrigin) -> BoundingBox {
        let (x0, y0) = self.corner_of(0, 0, corner);
        let (x1, y1) = self.corner_of(
            self.matrix_width as u64,
            self.matrix_height as u64,
            corner,
        );

        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Fractional (column, row) of a coordinate, before flooring.
    pub fn fractional_index(&self, x: f64, y: f64, corner: CornerOfOrigin) -> (f64, f64) {
        let col = (x - self.point_of_origin.0) / self.tile_span_x();
        let row = match corner {
            CornerOfOrigin::TopLeft => (self.point_of_origin.1 - y) / self.tile_span_y(),
            CornerOfOrigin::BottomLeft => (y - self.point_of_origin.1) / self.tile_span_y(),
        };
        (col, row)
    }

    /// Integer tile index containing a coordinate, not clamped.
    ///
    /// Tiles are half-open: a point on a shared interior edge belongs to the
    /// tile with the larger index. The far outer edge of the matrix belongs to
    /// the last tile.
    pub fn coord_to_index(&self, x: f64, y: f64, corner: CornerOfOrigin) -> (i64, i64) {
        let (col, row) = self.fractional_index(x, y, corner);
        (
            floor_index(col, self.matrix_width),
            floor_index(row, self.matrix_height),
        )
    }

    /// Find which tile contains a given coordinate, or `None` outside the matrix.
    pub fn coord_to_tile(&self, x: f64, y: f64, corner: CornerOfOrigin) -> Option<(u32, u32)> {
        let (col, row) = self.coord_to_index(x, y, corner);

        if col < 0 || row < 0 || col >= self.matrix_width as i64 || row >= self.matrix_height as i64
        {
            return None;
        }

        Some((col as u32, row as u32))
    }
}

/// Floor a fractional index, snapping near-integers and assigning the far
/// matrix edge to the last tile.
pub fn floor_index(fractional: f64, size: u32) -> i64 {
    let nearest = fractional.round();
    let snapped = if (fractional - nearest).abs() < INDEX_EPSILON {
        nearest
    } else {
        fractional
    };

    let index = snapped.floor() as i64;
    if index == size as i64 && snapped == nearest {
        index - 1
    } else {
        index
    }
}

/// Exclusive upper index for a range ending at `fractional`, as an inclusive index.
///
/// A range ending exactly on a tile edge does not include the next tile.
pub fn ceil_index(fractional: f64) -> i64 {
    let nearest = fractional.round();
    let snapped = if (fractional - nearest).abs() < INDEX_EPSILON {
        nearest
    } else {
        fractional
    };
    snapped.ceil() as i64 - 1
}
