//! Dataset schema configuration.
//!
//! Different datasets name their coordinate and bound variables
//! differently, so the names are caller-supplied configuration rather
//! than hard-coded. The defaults match the common
//! latitude/longitude/time layout.

use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};

/// Named, typed field-name configuration for a dataset, validated once
/// at query start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    /// Name of the time coordinate variable (and dimension).
    pub time_name: String,
    /// Name of the level coordinate variable, read for level
    /// identifiers when the variable has a level axis.
    pub level_name: String,
    /// Name of the row (latitude / y) coordinate variable.
    pub row_name: String,
    /// Name of the column (longitude / x) coordinate variable.
    pub col_name: String,
    /// Name of the `(nrows, 2)` row-bounds variable, if present.
    pub rowbnds_name: String,
    /// Name of the `(ncols, 2)` column-bounds variable, if present.
    pub colbnds_name: String,
    /// Calendar override. When `None` the dataset's `calendar`
    /// attribute on the time variable is used, defaulting to
    /// `standard` when absent.
    pub calendar: Option<String>,
    /// Time-units override (e.g. `"days since 1800-01-01 00:00:00"`).
    /// When `None` the time variable's `units` attribute is used.
    pub time_units: Option<String>,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            time_name: "time".to_string(),
            level_name: "level".to_string(),
            row_name: "latitude".to_string(),
            col_name: "longitude".to_string(),
            rowbnds_name: "bounds_latitude".to_string(),
            colbnds_name: "bounds_longitude".to_string(),
            calendar: None,
            time_units: None,
        }
    }
}

impl DatasetSchema {
    /// Validate the schema. Field names must be non-empty and coordinate
    /// names pairwise distinct.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("time_name", &self.time_name),
            ("level_name", &self.level_name),
            ("row_name", &self.row_name),
            ("col_name", &self.col_name),
            ("rowbnds_name", &self.rowbnds_name),
            ("colbnds_name", &self.colbnds_name),
        ];
        for (field, value) in &names {
            if value.is_empty() {
                return Err(DatasetError::InvalidSchema(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                if names[i].1 == names[j].1 {
                    return Err(DatasetError::InvalidSchema(format!(
                        "{} and {} are both '{}'",
                        names[i].0, names[j].0, names[i].1
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_is_valid() {
        assert!(DatasetSchema::default().validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let schema = DatasetSchema {
            time_name: String::new(),
            ..Default::default()
        };
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let schema = DatasetSchema {
            row_name: "coord".to_string(),
            col_name: "coord".to_string(),
            ..Default::default()
        };
        assert!(schema.validate().is_err());
    }
}
