//! Error types for the subset engine.

use dataset_access::DatasetError;
use subset_common::TimeCodecError;
use thiserror::Error;

/// Errors that can occur while resolving or executing a subset query.
///
/// Geometric edge cases (empty, degenerate or self-intersecting query
/// polygons) are deliberately not errors: they degrade to empty
/// selections.
#[derive(Error, Debug)]
pub enum SubsetError {
    /// Coordinate spacing is not uniform and the dataset supplies no
    /// explicit bounds to describe the cells.
    #[error("non-uniform spacing on axis {axis}: explicit bounds required")]
    NonUniformSpacing { axis: String },

    /// The axis is too short to infer a resolution from.
    #[error("axis {axis} has {len} points: cannot infer cell bounds")]
    UnresolvableBounds { axis: String, len: usize },

    /// A requested level position does not exist on the level axis.
    #[error("level position {position} out of range (axis has {len} levels)")]
    LevelOutOfRange { position: usize, len: usize },

    /// Levels were requested but the variable has no level axis.
    #[error("variable {variable} has no level axis")]
    NoLevelAxis { variable: String },

    /// The variable has a level axis but no levels were requested.
    #[error("variable {variable} has a level axis: levels must be requested explicitly")]
    LevelAxisPresent { variable: String },

    /// The variable is not indexed (time[, level], row, col).
    #[error("variable {variable} has unsupported rank {rank}")]
    UnsupportedRank { variable: String, rank: usize },

    /// Invalid tile size option.
    #[error("tile size must be at least one cell")]
    InvalidTileSize,

    /// Time encoding or calendar failure.
    #[error(transparent)]
    TimeCodec(#[from] TimeCodecError),

    /// Dataset access failure.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Result type for subset engine operations.
pub type Result<T> = std::result::Result<T, SubsetError>;
