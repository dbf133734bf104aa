//! In-memory dataset backend.
//!
//! Mirrors the layout of an on-disk self-describing array file closely
//! enough that the engine cannot tell the difference: named dimensions,
//! coordinate variables, bound variables, attributes, and data
//! variables with explicit dimension lists.

use crate::error::{DatasetError, Result};
use crate::GridReader;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

/// One data or coordinate variable.
#[derive(Debug, Clone)]
struct MemoryVariable {
    dims: Vec<String>,
    data: Vec<f64>,
}

/// A fully in-memory dataset.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    dims: HashMap<String, usize>,
    variables: HashMap<String, MemoryVariable>,
    bounds: HashMap<String, Vec<[f64; 2]>>,
    attrs: HashMap<(String, String), String>,
}

impl MemoryDataset {
    /// Start building a dataset.
    pub fn builder() -> MemoryDatasetBuilder {
        MemoryDatasetBuilder {
            dataset: MemoryDataset::default(),
        }
    }

    fn variable(&self, name: &str) -> Result<&MemoryVariable> {
        self.variables
            .get(name)
            .ok_or_else(|| DatasetError::MissingVariable(name.to_string()))
    }

    fn shape(&self, var: &MemoryVariable) -> Result<Vec<usize>> {
        var.dims
            .iter()
            .map(|d| {
                self.dims
                    .get(d)
                    .copied()
                    .ok_or_else(|| DatasetError::MissingDimension(d.clone()))
            })
            .collect()
    }
}

/// Builder for [`MemoryDataset`].
#[derive(Debug)]
pub struct MemoryDatasetBuilder {
    dataset: MemoryDataset,
}

impl MemoryDatasetBuilder {
    /// Declare a dimension.
    pub fn dimension(mut self, name: impl Into<String>, len: usize) -> Self {
        self.dataset.dims.insert(name.into(), len);
        self
    }

    /// Add a variable over the given dimensions. The data length must
    /// equal the product of the dimension lengths (checked in `build`).
    pub fn variable(
        mut self,
        name: impl Into<String>,
        dims: &[&str],
        data: Vec<f64>,
    ) -> Self {
        self.dataset.variables.insert(
            name.into(),
            MemoryVariable {
                dims: dims.iter().map(|d| d.to_string()).collect(),
                data,
            },
        );
        self
    }

    /// Add an `(n, 2)` bounds variable.
    pub fn bounds(mut self, name: impl Into<String>, values: Vec<[f64; 2]>) -> Self {
        self.dataset.bounds.insert(name.into(), values);
        self
    }

    /// Set a string attribute on a variable.
    pub fn attr(
        mut self,
        var: impl Into<String>,
        attr: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.dataset
            .attrs
            .insert((var.into(), attr.into()), value.into());
        self
    }

    /// Validate shapes and finish.
    pub fn build(self) -> Result<MemoryDataset> {
        for (name, var) in &self.dataset.variables {
            let shape = self.dataset.shape(var)?;
            let expected: usize = shape.iter().product();
            if var.data.len() != expected {
                return Err(DatasetError::invalid_layout(format!(
                    "variable {} has {} values, dimensions imply {}",
                    name,
                    var.data.len(),
                    expected
                )));
            }
        }
        Ok(self.dataset)
    }
}

/// Reader over a shared in-memory dataset.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    dataset: Arc<MemoryDataset>,
}

impl MemoryReader {
    pub fn new(dataset: Arc<MemoryDataset>) -> Self {
        Self { dataset }
    }
}

impl GridReader for MemoryReader {
    fn dim_len(&self, name: &str) -> Result<usize> {
        self.dataset
            .dims
            .get(name)
            .copied()
            .ok_or_else(|| DatasetError::MissingDimension(name.to_string()))
    }

    fn has_variable(&self, name: &str) -> bool {
        self.dataset.variables.contains_key(name) || self.dataset.bounds.contains_key(name)
    }

    fn variable_rank(&self, name: &str) -> Result<usize> {
        Ok(self.dataset.variable(name)?.dims.len())
    }

    fn coord_values(&self, name: &str) -> Result<Vec<f64>> {
        let var = self.dataset.variable(name)?;
        if var.dims.len() != 1 {
            return Err(DatasetError::invalid_layout(format!(
                "coordinate variable {} has rank {}",
                name,
                var.dims.len()
            )));
        }
        Ok(var.data.clone())
    }

    fn bound_values(&self, name: &str) -> Result<Vec<[f64; 2]>> {
        self.dataset
            .bounds
            .get(name)
            .cloned()
            .ok_or_else(|| DatasetError::MissingVariable(name.to_string()))
    }

    fn attr_string(&self, var: &str, attr: &str) -> Result<Option<String>> {
        Ok(self
            .dataset
            .attrs
            .get(&(var.to_string(), attr.to_string()))
            .cloned())
    }

    fn read_region(
        &self,
        var: &str,
        time: usize,
        level: Option<usize>,
        rows: Range<usize>,
        cols: Range<usize>,
    ) -> Result<Vec<f64>> {
        let variable = self.dataset.variable(var)?;
        let shape = self.dataset.shape(variable)?;

        let (nrows, ncols, slice_offset) = match (shape.as_slice(), level) {
            ([nt, nr, nc], None) => {
                check_index(time, *nt, var)?;
                (*nr, *nc, time * nr * nc)
            }
            ([nt, nl, nr, nc], Some(lvl)) => {
                check_index(time, *nt, var)?;
                check_index(lvl, *nl, var)?;
                (*nr, *nc, (time * nl + lvl) * nr * nc)
            }
            _ => {
                return Err(DatasetError::invalid_layout(format!(
                    "variable {} has rank {} but level argument was {:?}",
                    var,
                    shape.len(),
                    level
                )))
            }
        };

        if rows.end > nrows || cols.end > ncols {
            return Err(DatasetError::read_failed(format!(
                "region {:?}x{:?} outside variable {} shape {}x{}",
                rows, cols, var, nrows, ncols
            )));
        }

        let mut out = Vec::with_capacity(rows.len() * cols.len());
        for r in rows {
            let base = slice_offset + r * ncols;
            out.extend_from_slice(&variable.data[base + cols.start..base + cols.end]);
        }
        Ok(out)
    }
}

fn check_index(idx: usize, len: usize, var: &str) -> Result<()> {
    if idx >= len {
        return Err(DatasetError::read_failed(format!(
            "index {} out of range for variable {} (len {})",
            idx, var, len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryDataset {
        // 2 times, 2 rows, 3 cols; value = t*100 + r*10 + c.
        let mut data = Vec::new();
        for t in 0..2 {
            for r in 0..2 {
                for c in 0..3 {
                    data.push((t * 100 + r * 10 + c) as f64);
                }
            }
        }
        MemoryDataset::builder()
            .dimension("time", 2)
            .dimension("lat", 2)
            .dimension("lon", 3)
            .variable("time", &["time"], vec![0.0, 1.0])
            .variable("latitude", &["lat"], vec![5.0, 15.0])
            .variable("longitude", &["lon"], vec![5.0, 15.0, 25.0])
            .variable("Prcp", &["time", "lat", "lon"], data)
            .attr("time", "units", "days since 2000-01-01")
            .attr("time", "calendar", "gregorian")
            .build()
            .unwrap()
    }

    #[test]
    fn test_shape_validation() {
        let result = MemoryDataset::builder()
            .dimension("lat", 2)
            .variable("latitude", &["lat"], vec![1.0, 2.0, 3.0])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_read_region_full_slice() {
        let reader = MemoryReader::new(Arc::new(sample()));
        let values = reader.read_region("Prcp", 1, None, 0..2, 0..3).unwrap();
        assert_eq!(values, vec![100.0, 101.0, 102.0, 110.0, 111.0, 112.0]);
    }

    #[test]
    fn test_read_region_subwindow() {
        let reader = MemoryReader::new(Arc::new(sample()));
        let values = reader.read_region("Prcp", 0, None, 1..2, 1..3).unwrap();
        assert_eq!(values, vec![11.0, 12.0]);
    }

    #[test]
    fn test_read_region_out_of_range() {
        let reader = MemoryReader::new(Arc::new(sample()));
        assert!(reader.read_region("Prcp", 2, None, 0..2, 0..3).is_err());
        assert!(reader.read_region("Prcp", 0, None, 0..3, 0..3).is_err());
    }

    #[test]
    fn test_attrs_and_rank() {
        let reader = MemoryReader::new(Arc::new(sample()));
        assert_eq!(
            reader.attr_string("time", "calendar").unwrap().as_deref(),
            Some("gregorian")
        );
        assert_eq!(reader.attr_string("time", "missing").unwrap(), None);
        assert_eq!(reader.variable_rank("Prcp").unwrap(), 3);
        assert_eq!(reader.coord_values("latitude").unwrap(), vec![5.0, 15.0]);
    }

    #[test]
    fn test_level_rank_mismatch() {
        let reader = MemoryReader::new(Arc::new(sample()));
        assert!(reader.read_region("Prcp", 0, Some(0), 0..2, 0..3).is_err());
    }
}
