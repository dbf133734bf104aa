//! Tile decomposition of a candidate window.
//!
//! Tiles partition the candidate cell window along storage indices, so
//! every cell belongs to exactly one tile and per-cell results never
//! straddle a tile boundary.

use std::ops::Range;

use crate::options::TileSize;

/// Default tile edge length, in cells, for [`TileSize::Auto`].
pub const AUTO_TILE_SIDE: usize = 32;

/// A rectangular block of storage indices within the candidate window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl Tile {
    pub fn ncells(&self) -> usize {
        self.rows.len() * self.cols.len()
    }
}

/// Splits the candidate window into tiles of at most `size` cells per
/// side, in row-major order. An empty window yields no tiles.
pub fn split(rows: Range<usize>, cols: Range<usize>, size: TileSize) -> Vec<Tile> {
    if rows.is_empty() || cols.is_empty() {
        return Vec::new();
    }
    let side = match size {
        TileSize::Auto => AUTO_TILE_SIDE,
        TileSize::Cells(n) => n,
    };
    let mut tiles = Vec::new();
    let mut r = rows.start;
    while r < rows.end {
        let r_end = (r + side).min(rows.end);
        let mut c = cols.start;
        while c < cols.end {
            let c_end = (c + side).min(cols.end);
            tiles.push(Tile {
                rows: r..r_end,
                cols: c..c_end,
            });
            c = c_end;
        }
        r = r_end;
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_smaller_than_tile_yields_one_tile() {
        let tiles = split(0..4, 0..4, TileSize::Auto);
        assert_eq!(tiles, vec![Tile { rows: 0..4, cols: 0..4 }]);
    }

    #[test]
    fn tiles_partition_the_window() {
        let tiles = split(0..10, 3..10, TileSize::Cells(4));
        assert_eq!(tiles.len(), 6);
        let total: usize = tiles.iter().map(Tile::ncells).sum();
        assert_eq!(total, 70);
        // Row-major, no overlap at the seams.
        assert_eq!(tiles[0], Tile { rows: 0..4, cols: 3..7 });
        assert_eq!(tiles[1], Tile { rows: 0..4, cols: 7..10 });
        assert_eq!(tiles[5], Tile { rows: 8..10, cols: 7..10 });
    }

    #[test]
    fn empty_window_yields_no_tiles() {
        assert!(split(2..2, 0..10, TileSize::Cells(4)).is_empty());
        assert!(split(0..10, 5..5, TileSize::Auto).is_empty());
    }
}
