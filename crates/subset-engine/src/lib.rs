//! Spatial-temporal subsetting and aggregation of gridded datasets.
//!
//! Given an opened dataset, a variable, query polygons, a time range
//! and options, the engine answers "what is the value of variable V,
//! for time range T and levels L, inside region R" as a flat list of
//! output records.
//!
//! # Architecture
//!
//! ```text
//! subset(source, schema, variable, polygons, time, options)
//!      │
//!      ├─► resolve QueryContext once (GridIndex + AxisSelection)
//!      │
//!      └─► per polygon: TileScheduler
//!               │
//!               ├─► split candidate cells into index-range tiles
//!               │
//!               ├─► per tile (worker): SpatialSelector
//!               │        bbox prefilter ─► exact intersection
//!               │        ─► value extraction (one hyperslab per slice)
//!               │        ─► optional partial dissolve sums
//!               │
//!               └─► merge: re-sort to (row, col), combine partial
//!                   dissolve sums, build Elements
//! ```
//!
//! Subdividing a query across tiles never changes the output: results
//! are re-sorted into canonical order and dissolve contributions are
//! summed across tiles before the final division.
//!
//! # Example
//!
//! ```ignore
//! use subset_engine::{subset, SubsetOptions};
//! use subset_common::{CfDate, TimeSelection};
//!
//! let elements = subset(
//!     source,
//!     schema,
//!     "Prcp",
//!     &[polygon],
//!     &TimeSelection::range(CfDate::new(2000, 1, 1), CfDate::new(2000, 1, 10)),
//!     SubsetOptions::default(),
//! )?;
//! ```

pub mod axes;
pub mod dissolve;
pub mod element;
pub mod error;
pub mod grid;
pub mod options;
pub mod query;
pub mod selector;
pub mod tiler;

pub use axes::{AxisSelection, Slice};
pub use dissolve::DissolveAccumulator;
pub use element::{Element, Feature};
pub use error::{Result, SubsetError};
pub use grid::GridIndex;
pub use options::{SubsetOptions, TileSize};
pub use query::{subset, QueryContext};
pub use selector::{select, SelectionRecord};
pub use tiler::Tile;
