//! Query options controlling clipping, dissolve, level selection and
//! tiled execution.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubsetError};

/// Tile sizing policy for subdivided execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileSize {
    /// Let the engine choose a tile edge length.
    Auto,
    /// Explicit tile edge length, in grid cells per side.
    Cells(usize),
}

impl Default for TileSize {
    fn default() -> Self {
        TileSize::Auto
    }
}

/// Options for a subset query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetOptions {
    /// Clip cell geometries to the query polygon instead of returning
    /// whole cells.
    pub clip: bool,
    /// Collapse each time/level slice to a single area-weighted value.
    pub dissolve: bool,
    /// Zero-based positions along the level axis. Required when the
    /// variable carries a level axis, forbidden when it does not.
    pub levels: Option<Vec<usize>>,
    /// Split the selection into tiles processed in parallel.
    pub subdivide: bool,
    /// Tile sizing policy, only consulted when `subdivide` is set.
    pub tile_size: TileSize,
}

impl Default for SubsetOptions {
    fn default() -> Self {
        SubsetOptions {
            clip: false,
            dissolve: false,
            levels: None,
            subdivide: false,
            tile_size: TileSize::Auto,
        }
    }
}

impl SubsetOptions {
    pub fn validate(&self) -> Result<()> {
        if let TileSize::Cells(n) = self.tile_size {
            if n == 0 {
                return Err(SubsetError::InvalidTileSize);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_validate() {
        assert!(SubsetOptions::default().validate().is_ok());
    }

    #[test]
    fn zero_tile_size_rejected() {
        let opts = SubsetOptions {
            subdivide: true,
            tile_size: TileSize::Cells(0),
            ..Default::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(SubsetError::InvalidTileSize)
        ));
    }

    #[test]
    fn explicit_tile_size_accepted() {
        let opts = SubsetOptions {
            subdivide: true,
            tile_size: TileSize::Cells(16),
            ..Default::default()
        };
        assert!(opts.validate().is_ok());
    }
}
