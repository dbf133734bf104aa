//! Fixture datasets with known values.
//!
//! A fixture is a regular grid over a rectangular extent with cell
//! centers at `min + (i + 0.5) * resolution`, a daily time axis encoded
//! with a CF time codec, and optionally a level axis with identifiers
//! `1..=nlevels`. Values are either a constant or a deterministic
//! position pattern, so tests can verify exactly what was read.

use dataset_access::{DatasetError, MemoryDataset};
use subset_common::{BoundingBox, Calendar, CfDate, TimeCodec, TimeCodecError, TimeUnits};
use thiserror::Error;

/// Errors from fixture construction.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The resolution does not evenly divide the extent.
    #[error("resolution {resolution} must yield an equal number of partitions over {lower}..{upper}")]
    UnevenPartition {
        lower: f64,
        upper: f64,
        resolution: f64,
    },

    #[error(transparent)]
    TimeCodec(#[from] TimeCodecError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// netCDF write failure.
    #[cfg(feature = "netcdf")]
    #[error("failed to write fixture: {0}")]
    Write(String),
}

/// Declarative description of a fixture dataset.
#[derive(Debug, Clone)]
pub struct FixtureSpec {
    /// Spatial extent of the grid.
    pub extent: BoundingBox,
    /// Cell size, identical in both axes. Must evenly divide the
    /// extent in both axes.
    pub resolution: f64,
    /// Whether to materialize explicit row/column bounds variables.
    pub add_bounds: bool,
    /// First day of the daily time axis.
    pub start: CfDate,
    /// Number of daily time steps.
    pub days: usize,
    /// Number of levels; `1` means no level axis at all.
    pub nlevels: usize,
    /// Data variable name.
    pub variable: String,
    /// Physical units attribute for the data variable.
    pub units: String,
    /// Constant cell value; `None` uses the position pattern
    /// `t * 1000 + level * 100 + row * 10 + col`.
    pub constant: Option<f64>,
    /// CF time-units attribute.
    pub time_units: String,
    /// CF calendar attribute.
    pub calendar: String,
}

impl Default for FixtureSpec {
    fn default() -> Self {
        Self {
            extent: BoundingBox::new(0.0, 0.0, 40.0, 40.0),
            resolution: 10.0,
            add_bounds: true,
            start: CfDate::new(2000, 1, 1),
            days: 1,
            nlevels: 1,
            variable: "Prcp".to_string(),
            units: "mm".to_string(),
            constant: Some(5.0),
            time_units: "days since 1800-01-01 00:00:00 0:00".to_string(),
            calendar: "gregorian".to_string(),
        }
    }
}

impl FixtureSpec {
    /// Number of rows and columns implied by extent and resolution.
    pub fn shape(&self) -> Result<(usize, usize), FixtureError> {
        let nrows = partition_count(self.extent.min_y, self.extent.max_y, self.resolution)?;
        let ncols = partition_count(self.extent.min_x, self.extent.max_x, self.resolution)?;
        Ok((nrows, ncols))
    }

    fn axes(&self) -> Result<FixtureAxes, FixtureError> {
        let (nrows, ncols) = self.shape()?;
        let rows = centers(self.extent.min_y, nrows, self.resolution);
        let cols = centers(self.extent.min_x, ncols, self.resolution);

        let codec = TimeCodec::new(
            TimeUnits::parse(&self.time_units)?,
            Calendar::parse(&self.calendar)?,
        )?;
        let base = codec.encode(self.start)?;
        let times: Vec<f64> = (0..self.days).map(|d| base + d as f64).collect();

        Ok(FixtureAxes {
            rows,
            cols,
            times,
        })
    }

    /// The value at a given (time, level, row, col) position.
    pub fn value_at(&self, t: usize, level: usize, row: usize, col: usize) -> f64 {
        self.constant
            .unwrap_or_else(|| (t * 1000 + level * 100 + row * 10 + col) as f64)
    }

    fn data_values(&self, nrows: usize, ncols: usize) -> Vec<f64> {
        let mut data = Vec::with_capacity(self.days * self.nlevels * nrows * ncols);
        for t in 0..self.days {
            for l in 0..self.nlevels {
                for r in 0..nrows {
                    for c in 0..ncols {
                        data.push(self.value_at(t, l, r, c));
                    }
                }
            }
        }
        data
    }

    /// Build the fixture as an in-memory dataset.
    pub fn build_memory(&self) -> Result<MemoryDataset, FixtureError> {
        let FixtureAxes { rows, cols, times } = self.axes()?;
        let (nrows, ncols) = (rows.len(), cols.len());

        let mut builder = MemoryDataset::builder()
            .dimension("time", times.len())
            .dimension("lat", nrows)
            .dimension("lon", ncols)
            .variable("time", &["time"], times)
            .variable("latitude", &["lat"], rows.clone())
            .variable("longitude", &["lon"], cols.clone())
            .attr("time", "units", &self.time_units)
            .attr("time", "calendar", &self.calendar)
            .attr(&self.variable, "units", &self.units);

        if self.add_bounds {
            builder = builder
                .bounds("bounds_latitude", bounds_of(&rows, self.resolution))
                .bounds("bounds_longitude", bounds_of(&cols, self.resolution));
        }

        let data = self.data_values(nrows, ncols);
        if self.nlevels > 1 {
            builder = builder
                .dimension("lvl", self.nlevels)
                .variable(
                    "level",
                    &["lvl"],
                    (1..=self.nlevels).map(|l| l as f64).collect(),
                )
                .variable(&self.variable, &["time", "lvl", "lat", "lon"], data);
        } else {
            builder = builder.variable(&self.variable, &["time", "lat", "lon"], data);
        }

        Ok(builder.build()?)
    }

    /// Write the fixture to a netCDF file.
    #[cfg(feature = "netcdf")]
    pub fn write_netcdf(&self, path: &std::path::Path) -> Result<(), FixtureError> {
        let FixtureAxes { rows, cols, times } = self.axes()?;
        let (nrows, ncols) = (rows.len(), cols.len());
        let wr = |e: netcdf::Error| FixtureError::Write(e.to_string());

        let mut file = netcdf::create(path).map_err(wr)?;
        file.add_dimension("time", times.len()).map_err(wr)?;
        file.add_dimension("lat", nrows).map_err(wr)?;
        file.add_dimension("lon", ncols).map_err(wr)?;

        let mut time_var = file.add_variable::<f64>("time", &["time"]).map_err(wr)?;
        time_var.put_values(&times, ..).map_err(wr)?;
        time_var
            .put_attribute("units", self.time_units.as_str())
            .map_err(wr)?;
        time_var
            .put_attribute("calendar", self.calendar.as_str())
            .map_err(wr)?;

        let mut lat_var = file.add_variable::<f64>("latitude", &["lat"]).map_err(wr)?;
        lat_var.put_values(&rows, ..).map_err(wr)?;
        let mut lon_var = file.add_variable::<f64>("longitude", &["lon"]).map_err(wr)?;
        lon_var.put_values(&cols, ..).map_err(wr)?;

        let mut var_dims: Vec<&str> = vec!["time", "lat", "lon"];
        if self.nlevels > 1 {
            file.add_dimension("lvl", self.nlevels).map_err(wr)?;
            let mut lvl_var = file.add_variable::<f64>("level", &["lvl"]).map_err(wr)?;
            let levels: Vec<f64> = (1..=self.nlevels).map(|l| l as f64).collect();
            lvl_var.put_values(&levels, ..).map_err(wr)?;
            var_dims.insert(1, "lvl");
        }

        let mut data_var = file
            .add_variable::<f64>(&self.variable, &var_dims)
            .map_err(wr)?;
        data_var
            .put_values(&self.data_values(nrows, ncols), ..)
            .map_err(wr)?;
        data_var
            .put_attribute("units", self.units.as_str())
            .map_err(wr)?;

        if self.add_bounds {
            file.add_dimension("bound", 2).map_err(wr)?;
            let mut blat = file
                .add_variable::<f64>("bounds_latitude", &["lat", "bound"])
                .map_err(wr)?;
            blat.put_values(&flatten(bounds_of(&rows, self.resolution)), ..)
                .map_err(wr)?;
            let mut blon = file
                .add_variable::<f64>("bounds_longitude", &["lon", "bound"])
                .map_err(wr)?;
            blon.put_values(&flatten(bounds_of(&cols, self.resolution)), ..)
                .map_err(wr)?;
        }

        Ok(())
    }
}

struct FixtureAxes {
    rows: Vec<f64>,
    cols: Vec<f64>,
    times: Vec<f64>,
}

fn partition_count(lower: f64, upper: f64, resolution: f64) -> Result<usize, FixtureError> {
    let span = upper - lower;
    let count = (span / resolution).round();
    if count < 1.0 || (count * resolution - span).abs() > 1e-9 {
        return Err(FixtureError::UnevenPartition {
            lower,
            upper,
            resolution,
        });
    }
    Ok(count as usize)
}

fn centers(lower: f64, count: usize, resolution: f64) -> Vec<f64> {
    (0..count)
        .map(|i| lower + (i as f64 + 0.5) * resolution)
        .collect()
}

fn bounds_of(centers: &[f64], resolution: f64) -> Vec<[f64; 2]> {
    centers
        .iter()
        .map(|&c| [c - 0.5 * resolution, c + 0.5 * resolution])
        .collect()
}

#[cfg(feature = "netcdf")]
fn flatten(bounds: Vec<[f64; 2]>) -> Vec<f64> {
    bounds.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset_access::GridReader;
    use std::sync::Arc;

    #[test]
    fn test_partition_check() {
        assert_eq!(partition_count(0.0, 10.0, 5.0).unwrap(), 2);
        assert!(partition_count(0.0, 3.0, 15.0).is_err());
        assert!(partition_count(0.0, 7.0, 2.0).is_err());
    }

    #[test]
    fn test_default_fixture_layout() {
        let spec = FixtureSpec::default();
        assert_eq!(spec.shape().unwrap(), (4, 4));

        let ds = Arc::new(spec.build_memory().unwrap());
        let reader = dataset_access::memory::MemoryReader::new(ds);
        assert_eq!(
            reader.coord_values("latitude").unwrap(),
            vec![5.0, 15.0, 25.0, 35.0]
        );
        assert_eq!(
            reader.bound_values("bounds_latitude").unwrap()[0],
            [0.0, 10.0]
        );
        assert_eq!(reader.variable_rank("Prcp").unwrap(), 3);
        let values = reader.read_region("Prcp", 0, None, 0..4, 0..4).unwrap();
        assert!(values.iter().all(|&v| v == 5.0));
    }

    #[test]
    fn test_multilevel_fixture() {
        let spec = FixtureSpec {
            nlevels: 4,
            constant: None,
            ..Default::default()
        };
        let ds = Arc::new(spec.build_memory().unwrap());
        let reader = dataset_access::memory::MemoryReader::new(ds);
        assert_eq!(reader.variable_rank("Prcp").unwrap(), 4);
        assert_eq!(
            reader.coord_values("level").unwrap(),
            vec![1.0, 2.0, 3.0, 4.0]
        );
        let values = reader.read_region("Prcp", 0, Some(2), 1..2, 3..4).unwrap();
        assert_eq!(values, vec![(2 * 100 + 1 * 10 + 3) as f64]);
    }

    #[test]
    fn test_time_axis_encoding() {
        let spec = FixtureSpec {
            start: CfDate::new(2007, 10, 1),
            days: 3,
            ..Default::default()
        };
        let ds = Arc::new(spec.build_memory().unwrap());
        let reader = dataset_access::memory::MemoryReader::new(ds);
        // Known date2num offsets for "days since 1800-01-01".
        assert_eq!(
            reader.coord_values("time").unwrap(),
            vec![75_878.0, 75_879.0, 75_880.0]
        );
    }
}
