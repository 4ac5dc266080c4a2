//! Rectangular tile ranges and their row-major enumeration.

use serde::Serialize;

use tms_common::{Tile, TileMatrix};

/// An inclusive rectangle of tile indices at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileRange {
    pub zoom: u32,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl TileRange {
    /// Every tile of a matrix.
    pub fn full(matrix: &TileMatrix) -> Self {
        Self {
            zoom: matrix.zoom,
            min_x: 0,
            max_x: matrix.matrix_width - 1,
            min_y: 0,
            max_y: matrix.matrix_height - 1,
        }
    }

    pub fn width(&self) -> u64 {
        (self.max_x - self.min_x) as u64 + 1
    }

    pub fn height(&self) -> u64 {
        (self.max_y - self.min_y) as u64 + 1
    }

    /// Number of tiles in the range.
    pub fn len(&self) -> u64 {
        self.width() * self.height()
    }

    /// A range always holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, tile: &Tile) -> bool {
        tile.z == self.zoom
            && (self.min_x..=self.max_x).contains(&tile.x)
            && (self.min_y..=self.max_y).contains(&tile.y)
    }

    /// Iterate tiles row by row: y ascending outer, x ascending inner.
    pub fn iter(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            x: self.min_x,
            y: self.min_y,
            done: false,
        }
    }
}

impl IntoIterator for TileRange {
    type Item = Tile;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`TileRange`].
#[derive(Debug, Clone)]
pub struct TileRangeIter {
    range: TileRange,
    x: u32,
    y: u32,
    done: bool,
}

impl TileRangeIter {
    fn remaining(&self) -> u64 {
        if self.done {
            return 0;
        }
        let rows_after = (self.range.max_y - self.y) as u64;
        let in_row = (self.range.max_x - self.x) as u64 + 1;
        rows_after * self.range.width() + in_row
    }
}

impl Iterator for TileRangeIter {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.done {
            return None;
        }
        let tile = Tile::new(self.x, self.y, self.range.zoom);

        if self.x < self.range.max_x {
            self.x += 1;
        } else if self.y < self.range.max_y {
            self.x = self.range.min_x;
            self.y += 1;
        } else {
            self.done = true;
        }
        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        match usize::try_from(remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

/// Tiles covering a bounding box: zero, one, or (across the antimeridian) two
/// ranges, enumerated in order.
///
/// The cover is a plain value; every call to [`iter`](Self::iter) starts a
/// fresh enumeration with the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TileCover {
    ranges: Vec<TileRange>,
}

impl TileCover {
    pub fn new(ranges: Vec<TileRange>) -> Self {
        Self { ranges }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[TileRange] {
        &self.ranges
    }

    /// Total number of tiles; lets callers bound work before iterating.
    pub fn len(&self) -> u64 {
        self.ranges.iter().map(TileRange::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        self.ranges.iter().flat_map(|r| r.iter())
    }
}

impl<'a> IntoIterator for &'a TileCover {
    type Item = Tile;
    type IntoIter = std::iter::FlatMap<
        std::slice::Iter<'a, TileRange>,
        TileRangeIter,
        fn(&'a TileRange) -> TileRangeIter,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges
            .iter()
            .flat_map(TileRange::iter as fn(&'a TileRange) -> TileRangeIter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> TileRange {
        TileRange {
            zoom: 3,
            min_x: 2,
            max_x: 4,
            min_y: 5,
            max_y: 6,
        }
    }

    #[test]
    fn test_row_major_order() {
        let tiles: Vec<Tile> = range().iter().collect();
        let expected: Vec<Tile> = [(2, 5), (3, 5), (4, 5), (2, 6), (3, 6), (4, 6)]
            .into_iter()
            .map(|(x, y)| Tile::new(x, y, 3))
            .collect();
        assert_eq!(tiles, expected);
    }

    #[test]
    fn test_len_matches_iteration() {
        let r = range();
        assert_eq!(r.len(), 6);
        let mut iter = r.iter();
        assert_eq!(iter.size_hint(), (6, Some(6)));
        iter.next();
        iter.next();
        iter.next();
        assert_eq!(iter.size_hint(), (3, Some(3)));
        assert_eq!(iter.count(), 3);
    }

    #[test]
    fn test_single_tile_range() {
        let r = TileRange {
            zoom: 0,
            min_x: 0,
            max_x: 0,
            min_y: 0,
            max_y: 0,
        };
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![Tile::new(0, 0, 0)]);
    }

    #[test]
    fn test_cover_is_restartable() {
        let cover = TileCover::new(vec![range(), range()]);
        let first: Vec<Tile> = cover.iter().collect();
        let second: Vec<Tile> = (&cover).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(cover.len(), 12);
        assert!(TileCover::empty().is_empty());
    }
}
