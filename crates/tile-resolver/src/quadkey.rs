//! Quadkey encoding.
//!
//! A quadkey has one digit per zoom level from 1 to z. Digit `d` at level `i`
//! carries bit `z - i` of the column (`d & 1`) and of the row (`d & 2`), so
//! the empty string is the single root tile.

use tms_common::{Tile, TmsError, TmsResult};

use crate::resolver::Resolver;

impl Resolver<'_> {
    /// Encode a valid tile as a quadkey.
    pub fn quadkey(&self, tile: &Tile) -> TmsResult<String> {
        self.require_quadtree()?;
        self.check_tile(tile)?;
        Ok(encode(tile))
    }

    /// Decode a quadkey into a tile of this set.
    pub fn quadkey_to_tile(&self, quadkey: &str) -> TmsResult<Tile> {
        self.require_quadtree()?;

        let zoom = u32::try_from(quadkey.len()).map_err(|_| TmsError::InvalidQuadkey {
            quadkey: quadkey.to_string(),
            message: "too long".to_string(),
        })?;
        // the set is a quadtree, so a defined zoom keeps the shifts below 32
        self.tms().matrix_at(zoom)?;

        decode(quadkey)
    }

    fn require_quadtree(&self) -> TmsResult<()> {
        if self.tms().is_quadtree() {
            Ok(())
        } else {
            Err(TmsError::QuadkeyUnsupported(
                self.tms().identifier().to_string(),
            ))
        }
    }
}

fn encode(tile: &Tile) -> String {
    let mut quadkey = String::with_capacity(tile.z as usize);
    for level in (1..=tile.z).rev() {
        let mask = 1u32 << (level - 1);
        let mut digit = b'0';
        if tile.x & mask != 0 {
            digit += 1;
        }
        if tile.y & mask != 0 {
            digit += 2;
        }
        quadkey.push(digit as char);
    }
    quadkey
}

fn decode(quadkey: &str) -> TmsResult<Tile> {
    let zoom = quadkey.len() as u32;
    let (mut x, mut y) = (0u32, 0u32);

    for (i, digit) in quadkey.chars().enumerate() {
        let mask = 1u32 << (zoom - i as u32 - 1);
        match digit {
            '0' => {}
            '1' => x |= mask,
            '2' => y |= mask,
            '3' => {
                x |= mask;
                y |= mask;
            }
            other => {
                return Err(TmsError::InvalidQuadkey {
                    quadkey: quadkey.to_string(),
                    message: format!("unexpected digit '{}'", other),
                })
            }
        }
    }

    Ok(Tile::new(x, y, zoom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_common::TileMatrixSets;

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(&Tile::new(0, 0, 0)), "");
        assert_eq!(encode(&Tile::new(3, 5, 3)), "213");
        assert_eq!(encode(&Tile::new(486, 332, 10)), "0313102310");
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode("").unwrap(), Tile::new(0, 0, 0));
        assert_eq!(decode("213").unwrap(), Tile::new(3, 5, 3));
        assert_eq!(decode("0313102310").unwrap(), Tile::new(486, 332, 10));
    }

    #[test]
    fn test_invalid_digit() {
        assert!(matches!(
            decode("0124"),
            Err(TmsError::InvalidQuadkey { .. })
        ));
    }

    #[test]
    fn test_non_quadtree_set() {
        let tms = TileMatrixSets::builtin().get("WorldCRS84Quad").unwrap();
        let resolver = Resolver::new(&tms);
        assert!(matches!(
            resolver.quadkey(&Tile::new(0, 0, 1)),
            Err(TmsError::QuadkeyUnsupported(_))
        ));
        assert!(matches!(
            resolver.quadkey_to_tile("0"),
            Err(TmsError::QuadkeyUnsupported(_))
        ));
    }

    #[test]
    fn test_quadkey_beyond_max_zoom() {
        let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
        let resolver = Resolver::new(&tms);
        let too_deep = "0".repeat(25);
        assert!(matches!(
            resolver.quadkey_to_tile(&too_deep),
            Err(TmsError::UnsupportedZoom { zoom: 25, .. })
        ));
    }
}
