//! Shared test fixtures for the grid-subset workspace.
//!
//! The central piece is [`FixtureSpec`]: a declarative description of a
//! small regular grid with a daily time axis and an optional level
//! axis, realized either as an in-memory dataset or written to a
//! netCDF file (cargo feature `netcdf`).
//!
//! ```ignore
//! use test_utils::FixtureSpec;
//!
//! let dataset = FixtureSpec::default().build_memory()?;
//! ```

pub mod fixtures;

pub use fixtures::{FixtureError, FixtureSpec};
