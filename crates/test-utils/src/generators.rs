//! Generators for tiles and points used across the test suite.
//!
//! Everything here is deterministic so failures are reproducible.

use tms_common::{BoundingBox, Tile, TileMatrixSet};

/// Every tile of a zoom level, row-major (y outer, x inner).
///
/// Returns an empty vector if the zoom is not defined.
pub fn all_tiles(tms: &TileMatrixSet, zoom: u32) -> Vec<Tile> {
    let Some(m) = tms.get_matrix(zoom) else {
        return Vec::new();
    };
    let mut tiles = Vec::with_capacity(m.tile_count() as usize);
    for y in 0..m.matrix_height {
        for x in 0..m.matrix_width {
            tiles.push(Tile::new(x, y, zoom));
        }
    }
    tiles
}

/// Tiles on the matrix border plus a diagonal sweep through the interior.
///
/// Cheap coverage of the edge cases at zoom levels where `all_tiles` would be
/// too large.
pub fn edge_and_diagonal_tiles(tms: &TileMatrixSet, zoom: u32) -> Vec<Tile> {
    let Some(m) = tms.get_matrix(zoom) else {
        return Vec::new();
    };
    let (w, h) = (m.matrix_width, m.matrix_height);
    let mut tiles = vec![
        Tile::new(0, 0, zoom),
        Tile::new(w - 1, 0, zoom),
        Tile::new(0, h - 1, zoom),
        Tile::new(w - 1, h - 1, zoom),
    ];

    let steps = 16u32.min(w.max(h));
    for i in 0..steps {
        let x = (i as u64 * (w as u64 - 1) / steps.max(1) as u64) as u32;
        let y = (i as u64 * (h as u64 - 1) / steps.max(1) as u64) as u32;
        tiles.push(Tile::new(x, y, zoom));
    }

    tiles.sort();
    tiles.dedup();
    tiles
}

/// Deterministic pseudo-random points inside `bbox`.
pub fn random_points(bbox: &BoundingBox, count: usize, seed: u32) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| {
            let fx = simple_hash(i as u32, 0, seed) as f64 / u32::MAX as f64;
            let fy = simple_hash(i as u32, 1, seed) as f64 / u32::MAX as f64;
            (
                bbox.min_x + fx * bbox.width(),
                bbox.min_y + fy * bbox.height(),
            )
        })
        .collect()
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}
