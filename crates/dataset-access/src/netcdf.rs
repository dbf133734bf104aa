//! netCDF dataset backend.
//!
//! Opens a local netCDF file or, when the underlying library is built
//! with remote support, a network endpoint URL. Every reader owns its
//! file handle, so concurrent read-only access needs no locking.

use crate::error::{DatasetError, Result};
use crate::GridReader;
use std::ops::Range;
use tracing::debug;

/// Reader over one opened netCDF file or endpoint.
pub struct NetcdfReader {
    file: netcdf::File,
    location: String,
}

impl NetcdfReader {
    /// Open a dataset by path or URL.
    pub fn open(location: &str) -> Result<Self> {
        debug!(location, "opening netCDF dataset");
        let file = netcdf::open(location)
            .map_err(|e| DatasetError::open_failed(format!("{}: {}", location, e)))?;
        Ok(Self {
            file,
            location: location.to_string(),
        })
    }

    fn variable(&self, name: &str) -> Result<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| DatasetError::MissingVariable(name.to_string()))
    }

    fn read_err(&self, var: &str, e: netcdf::Error) -> DatasetError {
        DatasetError::read_failed(format!("{} in {}: {}", var, self.location, e))
    }
}

impl GridReader for NetcdfReader {
    fn dim_len(&self, name: &str) -> Result<usize> {
        self.file
            .dimension(name)
            .map(|d| d.len())
            .ok_or_else(|| DatasetError::MissingDimension(name.to_string()))
    }

    fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    fn variable_rank(&self, name: &str) -> Result<usize> {
        Ok(self.variable(name)?.dimensions().len())
    }

    fn coord_values(&self, name: &str) -> Result<Vec<f64>> {
        let var = self.variable(name)?;
        if var.dimensions().len() != 1 {
            return Err(DatasetError::invalid_layout(format!(
                "coordinate variable {} has rank {}",
                name,
                var.dimensions().len()
            )));
        }
        var.get_values::<f64, _>(..)
            .map_err(|e| self.read_err(name, e))
    }

    fn bound_values(&self, name: &str) -> Result<Vec<[f64; 2]>> {
        let var = self.variable(name)?;
        let dims = var.dimensions();
        if dims.len() != 2 || dims[1].len() != 2 {
            return Err(DatasetError::invalid_layout(format!(
                "bounds variable {} is not (n, 2)",
                name
            )));
        }
        let flat = var
            .get_values::<f64, _>(..)
            .map_err(|e| self.read_err(name, e))?;
        Ok(flat.chunks_exact(2).map(|c| [c[0], c[1]]).collect())
    }

    fn attr_string(&self, var: &str, attr: &str) -> Result<Option<String>> {
        let variable = self.variable(var)?;
        // Probe the attribute list first; asking the C library for a
        // missing attribute spams stderr.
        if !variable.attributes().any(|a| a.name() == attr) {
            return Ok(None);
        }
        match variable.attribute_value(attr) {
            Some(Ok(netcdf::AttributeValue::Str(s))) => Ok(Some(s)),
            Some(Ok(_)) => Ok(None),
            Some(Err(e)) => Err(self.read_err(var, e)),
            None => Ok(None),
        }
    }

    fn read_region(
        &self,
        var: &str,
        time: usize,
        level: Option<usize>,
        rows: Range<usize>,
        cols: Range<usize>,
    ) -> Result<Vec<f64>> {
        let variable = self.variable(var)?;
        let rank = variable.dimensions().len();
        match (rank, level) {
            (3, None) => variable
                .get_values::<f64, _>((time, rows, cols))
                .map_err(|e| self.read_err(var, e)),
            (4, Some(lvl)) => variable
                .get_values::<f64, _>((time, lvl, rows, cols))
                .map_err(|e| self.read_err(var, e)),
            _ => Err(DatasetError::invalid_layout(format!(
                "variable {} has rank {} but level argument was {:?}",
                var, rank, level
            ))),
        }
    }
}
