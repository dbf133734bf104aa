//! Read-only access to self-describing gridded datasets.
//!
//! A dataset exposes named dimensions (time, optional level, row,
//! column), 1-D coordinate variables, optional `(n, 2)` bound
//! variables, string attributes (calendar, time units, physical
//! units), and data variables indexed `(time[, level], row, col)`.
//!
//! Two backends implement the [`GridReader`] trait:
//!
//! - [`MemoryDataset`]: fully in-memory, used by fixtures and tests
//! - `NetcdfReader`: netCDF files or remote endpoints via the
//!   `netcdf` crate (cargo feature `netcdf`, enabled by default)
//!
//! [`DatasetSource`] is the cheap, cloneable handle workers share:
//! each worker calls [`DatasetSource::open`] to get its own reader, so
//! concurrent read-only access never touches a shared file handle.

pub mod error;
pub mod memory;
#[cfg(feature = "netcdf")]
pub mod netcdf;
pub mod schema;

pub use error::{DatasetError, Result};
pub use memory::{MemoryDataset, MemoryDatasetBuilder};
pub use schema::DatasetSchema;

use std::ops::Range;
use std::sync::Arc;

/// Read-only access to one opened dataset.
///
/// Data variables are indexed `(time, row, col)` for rank-3 variables
/// and `(time, level, row, col)` for rank-4 variables; `read_region`
/// returns row-major values for one (time[, level]) slice.
pub trait GridReader: Send {
    /// Length of a named dimension.
    fn dim_len(&self, name: &str) -> Result<usize>;

    /// Whether a variable with this name exists.
    fn has_variable(&self, name: &str) -> bool;

    /// Number of dimensions of a variable.
    fn variable_rank(&self, name: &str) -> Result<usize>;

    /// Values of a 1-D coordinate variable.
    fn coord_values(&self, name: &str) -> Result<Vec<f64>>;

    /// Values of an `(n, 2)` bounds variable as `[lower, upper]` pairs.
    fn bound_values(&self, name: &str) -> Result<Vec<[f64; 2]>>;

    /// A string attribute of a variable, `None` when absent.
    fn attr_string(&self, var: &str, attr: &str) -> Result<Option<String>>;

    /// Read one row-major `(rows, cols)` hyperslab of a data variable
    /// at a fixed time (and, for rank-4 variables, level) position.
    fn read_region(
        &self,
        var: &str,
        time: usize,
        level: Option<usize>,
        rows: Range<usize>,
        cols: Range<usize>,
    ) -> Result<Vec<f64>>;
}

/// A cloneable handle describing where a dataset lives.
///
/// Opening is cheap enough to do once per worker; every reader is
/// independent and read-only.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// A netCDF file path or remote endpoint URL.
    #[cfg(feature = "netcdf")]
    Netcdf { location: String },
    /// A fully in-memory dataset (fixtures, tests).
    Memory(Arc<MemoryDataset>),
}

impl DatasetSource {
    /// Source backed by a netCDF file path or endpoint URL.
    #[cfg(feature = "netcdf")]
    pub fn netcdf(location: impl Into<String>) -> Self {
        Self::Netcdf {
            location: location.into(),
        }
    }

    /// Source backed by an in-memory dataset.
    pub fn memory(dataset: MemoryDataset) -> Self {
        Self::Memory(Arc::new(dataset))
    }

    /// Open a fresh read-only reader for this source.
    pub fn open(&self) -> Result<Box<dyn GridReader>> {
        match self {
            #[cfg(feature = "netcdf")]
            Self::Netcdf { location } => {
                Ok(Box::new(netcdf::NetcdfReader::open(location)?))
            }
            Self::Memory(dataset) => Ok(Box::new(memory::MemoryReader::new(dataset.clone()))),
        }
    }
}
