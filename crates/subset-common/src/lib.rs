//! Shared types for the grid-subset workspace.
//!
//! This crate provides the pieces every other crate needs:
//!
//! - [`BoundingBox`]: axis-aligned planar envelopes used as the grid
//!   prefilter for polygon queries
//! - [`CfDate`], [`Calendar`], [`TimeUnits`], [`TimeCodec`]: the CF
//!   "units since epoch" time encoding used by self-describing array
//!   formats, with exact whole-day round-trips per calendar
//! - [`TimeRange`], [`TimeSelection`]: caller-facing temporal queries

pub mod bbox;
pub mod calendar;
pub mod time;

pub use bbox::BoundingBox;
pub use calendar::{Calendar, CfDate, TimeCodec, TimeCodecError, TimeUnits};
pub use time::{TimeRange, TimeSelection};
