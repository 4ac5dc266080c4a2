//! Tile and zoom validity checks.

use tms_common::{Tile, TileMatrix, TmsError, TmsResult};

use crate::resolver::Resolver;

impl<'a> Resolver<'a> {
    /// Cheap pre-check: zoom exists and the indices are inside its matrix.
    pub fn is_valid(&self, tile: &Tile) -> bool {
        self.tms().is_valid(tile)
    }

    /// The matrix of a valid tile.
    ///
    /// Fails with `UnsupportedZoom` when the zoom is not defined and with
    /// `TileOutOfBounds` when the indices fall outside the matrix.
    pub fn check_tile(&self, tile: &Tile) -> TmsResult<&'a TileMatrix> {
        let matrix = self.tms().matrix_at(tile.z)?;
        if !matrix.contains_index(tile.x, tile.y) {
            return Err(TmsError::TileOutOfBounds {
                x: tile.x as i64,
                y: tile.y as i64,
                z: tile.z,
                matrix_width: matrix.matrix_width,
                matrix_height: matrix.matrix_height,
            });
        }
        Ok(matrix)
    }

    /// Tile index extrema at a zoom: ((min_x, max_x), (min_y, max_y)).
    pub fn minmax(&self, zoom: u32) -> TmsResult<((u32, u32), (u32, u32))> {
        self.tms().minmax(zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_common::TileMatrixSets;

    #[test]
    fn test_check_tile() {
        let tms = TileMatrixSets::builtin().get("WorldCRS84Quad").unwrap();
        let resolver = Resolver::new(&tms);

        assert!(resolver.check_tile(&Tile::new(3, 1, 1)).is_ok());
        assert!(matches!(
            resolver.check_tile(&Tile::new(4, 1, 1)),
            Err(TmsError::TileOutOfBounds { x: 4, y: 1, z: 1, .. })
        ));
        assert!(matches!(
            resolver.check_tile(&Tile::new(0, 0, 30)),
            Err(TmsError::UnsupportedZoom { zoom: 30, .. })
        ));
        assert!(!resolver.is_valid(&Tile::new(0, 2, 1)));
        assert_eq!(resolver.minmax(1).unwrap(), ((0, 3), (0, 1)));
    }
}
