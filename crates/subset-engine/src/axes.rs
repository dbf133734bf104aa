//! Time and level axis resolution.
//!
//! Before any grid work starts, the query's temporal selection and
//! level positions are turned into concrete axis indices. The product
//! is a flat list of [`Slice`]s, one per (time, level) combination,
//! ordered timestamp-major with levels in the caller's requested
//! order.

use tracing::debug;

use dataset_access::{DatasetError, DatasetSchema, GridReader};
use subset_common::{CfDate, TimeCodec, TimeSelection};

use crate::error::{Result, SubsetError};

/// A resolved (time, level) read target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    /// Index along the time axis.
    pub time: usize,
    /// Decoded timestamp for that index.
    pub date: CfDate,
    /// Level axis index and level identifier, when the variable
    /// carries a level axis.
    pub level: Option<(usize, i64)>,
}

/// Resolved time and level selections for one query.
#[derive(Debug, Clone)]
pub struct AxisSelection {
    /// Selected time indices with their decoded timestamps, in axis
    /// order.
    pub times: Vec<(usize, CfDate)>,
    /// Selected level indices with their identifiers, in request
    /// order. `None` for variables without a level axis.
    pub levels: Option<Vec<(usize, i64)>>,
}

impl AxisSelection {
    /// Resolves the selection against the dataset.
    ///
    /// Calendar and time units come from the schema overrides when
    /// set, otherwise from the time variable's attributes. A missing
    /// calendar attribute falls back to the standard calendar.
    pub fn resolve(
        reader: &dyn GridReader,
        schema: &DatasetSchema,
        variable: &str,
        time: &TimeSelection,
        levels: Option<&[usize]>,
    ) -> Result<AxisSelection> {
        let times = resolve_time(reader, schema, time)?;
        let levels = resolve_levels(reader, schema, variable, levels)?;
        debug!(
            times = times.len(),
            levels = levels.as_ref().map_or(0, Vec::len),
            "axes resolved"
        );
        Ok(AxisSelection { times, levels })
    }

    /// Expands the selection into read targets, timestamp-major.
    pub fn slices(&self) -> Vec<Slice> {
        let mut out = Vec::new();
        for &(time, date) in &self.times {
            match &self.levels {
                Some(levels) => {
                    for &(idx, id) in levels {
                        out.push(Slice {
                            time,
                            date,
                            level: Some((idx, id)),
                        });
                    }
                }
                None => out.push(Slice {
                    time,
                    date,
                    level: None,
                }),
            }
        }
        out
    }
}

fn resolve_time(
    reader: &dyn GridReader,
    schema: &DatasetSchema,
    selection: &TimeSelection,
) -> Result<Vec<(usize, CfDate)>> {
    let time_name = schema.time_name.as_str();
    let units = match &schema.time_units {
        Some(u) => u.clone(),
        None => reader.attr_string(time_name, "units")?.ok_or_else(|| {
            DatasetError::MissingAttribute {
                var: time_name.to_string(),
                attr: "units".to_string(),
            }
        })?,
    };
    let calendar = match &schema.calendar {
        Some(c) => c.clone(),
        None => reader
            .attr_string(time_name, "calendar")?
            .unwrap_or_else(|| "standard".to_string()),
    };
    let codec = TimeCodec::from_attrs(&units, &calendar)?;

    let values = reader.coord_values(time_name)?;
    let mut selected = Vec::new();
    for (idx, &value) in values.iter().enumerate() {
        let date = codec.decode(value);
        if selection.matches(date) {
            selected.push((idx, date));
        }
    }
    Ok(selected)
}

fn resolve_levels(
    reader: &dyn GridReader,
    schema: &DatasetSchema,
    variable: &str,
    requested: Option<&[usize]>,
) -> Result<Option<Vec<(usize, i64)>>> {
    let rank = reader.variable_rank(variable)?;
    match (rank, requested) {
        (3, None) => Ok(None),
        (3, Some(_)) => Err(SubsetError::NoLevelAxis {
            variable: variable.to_string(),
        }),
        (4, None) => Err(SubsetError::LevelAxisPresent {
            variable: variable.to_string(),
        }),
        (4, Some(positions)) => {
            let values = reader.coord_values(&schema.level_name)?;
            let mut out = Vec::with_capacity(positions.len());
            for &pos in positions {
                let value = values.get(pos).ok_or(SubsetError::LevelOutOfRange {
                    position: pos,
                    len: values.len(),
                })?;
                out.push((pos, value.round() as i64));
            }
            Ok(Some(out))
        }
        (rank, _) => Err(SubsetError::UnsupportedRank {
            variable: variable.to_string(),
            rank,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use dataset_access::DatasetSource;
    use subset_common::TimeRange;
    use test_utils::FixtureSpec;

    fn open(spec: FixtureSpec) -> Box<dyn GridReader> {
        let data = spec.build_memory().unwrap();
        DatasetSource::memory(data).open().unwrap()
    }

    fn date(y: i32, m: u8, d: u8) -> CfDate {
        CfDate::new(y, m, d)
    }

    #[test]
    fn range_selects_inclusive_span() {
        let reader = open(FixtureSpec {
            days: 10,
            ..Default::default()
        });
        let schema = DatasetSchema::default();
        let selection =
            TimeSelection::Range(TimeRange::new(date(2000, 1, 3), date(2000, 1, 6)));
        let axes =
            AxisSelection::resolve(reader.as_ref(), &schema, "Prcp", &selection, None).unwrap();
        let indices: Vec<usize> = axes.times.iter().map(|t| t.0).collect();
        assert_eq!(indices, vec![2, 3, 4, 5]);
        assert_eq!(axes.times[0].1, date(2000, 1, 3));
        assert!(axes.levels.is_none());
    }

    #[test]
    fn list_selects_exact_timestamps_in_axis_order() {
        let reader = open(FixtureSpec {
            days: 10,
            ..Default::default()
        });
        let schema = DatasetSchema::default();
        let selection =
            TimeSelection::List(vec![date(2000, 1, 8), date(2000, 1, 2), date(2000, 1, 8)]);
        let axes =
            AxisSelection::resolve(reader.as_ref(), &schema, "Prcp", &selection, None).unwrap();
        let indices: Vec<usize> = axes.times.iter().map(|t| t.0).collect();
        // Axis order, duplicates collapsed by the single pass.
        assert_eq!(indices, vec![1, 7]);
    }

    #[test]
    fn level_positions_map_to_coordinate_values() {
        let reader = open(FixtureSpec {
            nlevels: 4,
            ..Default::default()
        });
        let schema = DatasetSchema::default();
        let selection =
            TimeSelection::Range(TimeRange::new(date(2000, 1, 1), date(2000, 1, 1)));
        let axes = AxisSelection::resolve(
            reader.as_ref(),
            &schema,
            "Prcp",
            &selection,
            Some(&[1, 3]),
        )
        .unwrap();
        assert_eq!(axes.levels, Some(vec![(1, 2), (3, 4)]));
        let slices = axes.slices();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].level, Some((1, 2)));
        assert_eq!(slices[1].level, Some((3, 4)));
    }

    #[test]
    fn levels_on_flat_variable_rejected() {
        let reader = open(FixtureSpec::default());
        let schema = DatasetSchema::default();
        let selection =
            TimeSelection::Range(TimeRange::new(date(2000, 1, 1), date(2000, 1, 1)));
        let err = AxisSelection::resolve(
            reader.as_ref(),
            &schema,
            "Prcp",
            &selection,
            Some(&[0]),
        )
        .unwrap_err();
        assert!(matches!(err, SubsetError::NoLevelAxis { .. }));
    }

    #[test]
    fn missing_levels_on_layered_variable_rejected() {
        let reader = open(FixtureSpec {
            nlevels: 3,
            ..Default::default()
        });
        let schema = DatasetSchema::default();
        let selection =
            TimeSelection::Range(TimeRange::new(date(2000, 1, 1), date(2000, 1, 1)));
        let err =
            AxisSelection::resolve(reader.as_ref(), &schema, "Prcp", &selection, None).unwrap_err();
        assert!(matches!(err, SubsetError::LevelAxisPresent { .. }));
    }

    #[test]
    fn level_position_out_of_range() {
        let reader = open(FixtureSpec {
            nlevels: 2,
            ..Default::default()
        });
        let schema = DatasetSchema::default();
        let selection =
            TimeSelection::Range(TimeRange::new(date(2000, 1, 1), date(2000, 1, 1)));
        let err = AxisSelection::resolve(
            reader.as_ref(),
            &schema,
            "Prcp",
            &selection,
            Some(&[0, 5]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SubsetError::LevelOutOfRange { position: 5, len: 2 }
        ));
    }

    #[test]
    fn slices_are_timestamp_major() {
        let reader = open(FixtureSpec {
            days: 2,
            nlevels: 2,
            ..Default::default()
        });
        let schema = DatasetSchema::default();
        let selection =
            TimeSelection::Range(TimeRange::new(date(2000, 1, 1), date(2000, 1, 2)));
        let axes = AxisSelection::resolve(
            reader.as_ref(),
            &schema,
            "Prcp",
            &selection,
            Some(&[0, 1]),
        )
        .unwrap();
        let order: Vec<(usize, usize)> = axes
            .slices()
            .iter()
            .map(|s| (s.time, s.level.unwrap().0))
            .collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }
}
