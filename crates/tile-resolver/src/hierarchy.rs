//! Tile hierarchy: parents, children and neighbours.
//!
//! `parent` and `children` follow the quadtree convention and only work
//! between levels that are an exact 2x subdivision of each other.
//! `parents_at` and `children_at` are geometric and work for any set.

use tms_common::{Tile, TileMatrix, TmsError, TmsResult};

use crate::range::TileRange;
use crate::resolver::Resolver;

/// Fraction of the finer cell size trimmed from tile bounds before a
/// geometric lookup, so tiles that only share an edge are not reported.
const EDGE_INSET_CELLS: f64 = 0.1;

impl Resolver<'_> {
    /// Quadtree parent at `z - 1`.
    pub fn parent(&self, tile: &Tile) -> TmsResult<Tile> {
        self.check_tile(tile)?;
        if tile.z == self.tms().min_zoom() || !self.tms().is_quadtree_step(tile.z) {
            return Err(TmsError::NoParent(*tile));
        }
        Ok(Tile::new(tile.x / 2, tile.y / 2, tile.z - 1))
    }

    /// Quadtree children at `z + 1`, row-major, clipped to the child matrix.
    pub fn children(&self, tile: &Tile) -> TmsResult<Vec<Tile>> {
        self.check_tile(tile)?;
        let child_zoom = tile.z + 1;
        let Some(matrix) = self.tms().get_matrix(child_zoom) else {
            return Err(TmsError::NoChildren(*tile));
        };
        if !self.tms().is_quadtree_step(child_zoom) {
            return Err(TmsError::NoChildren(*tile));
        }

        let mut children = Vec::with_capacity(4);
        for y in [tile.y * 2, tile.y * 2 + 1] {
            for x in [tile.x * 2, tile.x * 2 + 1] {
                if matrix.contains_index(x, y) {
                    children.push(Tile::new(x, y, child_zoom));
                }
            }
        }
        Ok(children)
    }

    /// Tiles at a coarser `zoom` overlapping `tile`.
    ///
    /// In a quadtree this is the single ancestor; in other sets it may be
    /// several tiles.
    pub fn parents_at(&self, tile: &Tile, zoom: u32) -> TmsResult<TileRange> {
        if zoom >= tile.z {
            return Err(TmsError::InvalidParameter {
                param: "zoom".to_string(),
                message: format!(
                    "parent zoom {} must be below the tile zoom {}",
                    zoom, tile.z
                ),
            });
        }
        self.overlapping_at(tile, zoom)
    }

    /// Tiles at a finer `zoom` overlapping `tile`.
    pub fn children_at(&self, tile: &Tile, zoom: u32) -> TmsResult<TileRange> {
        if zoom <= tile.z {
            return Err(TmsError::InvalidParameter {
                param: "zoom".to_string(),
                message: format!(
                    "child zoom {} must be above the tile zoom {}",
                    zoom, tile.z
                ),
            });
        }
        self.overlapping_at(tile, zoom)
    }

    fn overlapping_at(&self, tile: &Tile, zoom: u32) -> TmsResult<TileRange> {
        let source = self.check_tile(tile)?;
        let target = self.tms().matrix_at(zoom)?;

        let inset = finer_cell(source, target) * EDGE_INSET_CELLS;
        let bounds = self.tile_to_bounds(tile)?.buffered(-inset);
        Ok(self.covering_range(target, &bounds))
    }

    /// The up to 8 valid tiles around `tile` at the same zoom, row-major.
    pub fn neighbors(&self, tile: &Tile) -> TmsResult<Vec<Tile>> {
        let matrix = self.check_tile(tile)?;

        let mut neighbors = Vec::with_capacity(8);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let x = tile.x as i64 + dx;
                let y = tile.y as i64 + dy;
                if x < 0 || y < 0 {
                    continue;
                }
                if matrix.contains_index(x as u32, y as u32) {
                    neighbors.push(Tile::new(x as u32, y as u32, tile.z));
                }
            }
        }
        Ok(neighbors)
    }
}

fn finer_cell(a: &TileMatrix, b: &TileMatrix) -> f64 {
    a.cell_size.min(b.cell_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_common::TileMatrixSets;

    #[test]
    fn test_parent_and_children() {
        let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
        let resolver = Resolver::new(&tms);

        let tile = Tile::new(486, 332, 10);
        let parent = resolver.parent(&tile).unwrap();
        assert_eq!(parent, Tile::new(243, 166, 9));
        assert!(resolver.children(&parent).unwrap().contains(&tile));

        assert!(matches!(
            resolver.parent(&Tile::new(0, 0, 0)),
            Err(TmsError::NoParent(_))
        ));
        assert!(matches!(
            resolver.children(&Tile::new(0, 0, 24)),
            Err(TmsError::NoChildren(_))
        ));
    }

    #[test]
    fn test_children_order() {
        let tms = TileMatrixSets::builtin().get("WorldCRS84Quad").unwrap();
        let resolver = Resolver::new(&tms);
        let children = resolver.children(&Tile::new(1, 0, 0)).unwrap();
        assert_eq!(
            children,
            vec![
                Tile::new(2, 0, 1),
                Tile::new(3, 0, 1),
                Tile::new(2, 1, 1),
                Tile::new(3, 1, 1)
            ]
        );
    }

    #[test]
    fn test_neighbors_at_corner() {
        let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
        let resolver = Resolver::new(&tms);
        let neighbors = resolver.neighbors(&Tile::new(0, 0, 2)).unwrap();
        assert_eq!(
            neighbors,
            vec![Tile::new(1, 0, 2), Tile::new(0, 1, 2), Tile::new(1, 1, 2)]
        );
        assert_eq!(resolver.neighbors(&Tile::new(1, 1, 2)).unwrap().len(), 8);
        assert!(resolver.neighbors(&Tile::new(0, 0, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_geometric_parents_and_children() {
        let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
        let resolver = Resolver::new(&tms);

        let range = resolver.parents_at(&Tile::new(486, 332, 10), 7).unwrap();
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![Tile::new(60, 41, 7)]);

        let range = resolver.children_at(&Tile::new(1, 1, 1), 3).unwrap();
        assert_eq!((range.min_x, range.max_x), (4, 7));
        assert_eq!((range.min_y, range.max_y), (4, 7));
        assert_eq!(range.len(), 16);

        assert!(matches!(
            resolver.children_at(&Tile::new(1, 1, 1), 1),
            Err(TmsError::InvalidParameter { .. })
        ));
    }
}
