//! Query orchestration.
//!
//! [`subset`] resolves the axes and grid index once, then runs each
//! query polygon through the tile pipeline. With `subdivide` on, tiles
//! fan out over the rayon thread pool; each worker opens its own
//! reader from the shared [`DatasetSource`]. Tile outputs are merged
//! back in a fixed order, so a subdivided run emits exactly the same
//! elements as an undivided one.

use geo::algorithm::bounding_rect::BoundingRect;
use geo::Polygon;
use rayon::prelude::*;
use tracing::{debug, info};

use dataset_access::{DatasetError, DatasetSchema, DatasetSource};
use subset_common::{BoundingBox, TimeSelection};

use crate::axes::{AxisSelection, Slice};
use crate::dissolve::DissolveAccumulator;
use crate::element::Element;
use crate::error::Result;
use crate::grid::GridIndex;
use crate::options::{SubsetOptions, TileSize};
use crate::selector::{select, SelectionRecord};
use crate::tiler::{split, Tile};

/// Immutable per-query state shared by every tile worker.
pub struct QueryContext {
    source: DatasetSource,
    variable: String,
    options: SubsetOptions,
    index: GridIndex,
    axes: AxisSelection,
}

impl QueryContext {
    /// Validates the query and resolves everything that is resolved
    /// once per query: the schema, the grid index and the axis
    /// selection.
    pub fn new(
        source: DatasetSource,
        schema: DatasetSchema,
        variable: impl Into<String>,
        time: &TimeSelection,
        options: SubsetOptions,
    ) -> Result<QueryContext> {
        let variable = variable.into();
        schema.validate()?;
        options.validate()?;

        let reader = source.open()?;
        if !reader.has_variable(&variable) {
            return Err(DatasetError::MissingVariable(variable).into());
        }
        let index = GridIndex::from_reader(reader.as_ref(), &schema)?;
        let axes = AxisSelection::resolve(
            reader.as_ref(),
            &schema,
            &variable,
            time,
            options.levels.as_deref(),
        )?;
        drop(reader);

        Ok(QueryContext {
            source,
            variable,
            options,
            index,
            axes,
        })
    }

    /// Runs the query for each polygon, in the caller's order.
    pub fn run(&self, polygons: &[Polygon<f64>]) -> Result<Vec<Element>> {
        let slices = self.axes.slices();
        info!(
            variable = %self.variable,
            polygons = polygons.len(),
            slices = slices.len(),
            dissolve = self.options.dissolve,
            "running subset query"
        );
        let mut elements = Vec::new();
        for polygon in polygons {
            elements.extend(self.run_polygon(polygon, &slices)?);
        }
        Ok(elements)
    }

    fn run_polygon(&self, polygon: &Polygon<f64>, slices: &[Slice]) -> Result<Vec<Element>> {
        let Some(rect) = polygon.bounding_rect() else {
            return Ok(Vec::new());
        };
        let probe = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
        let (rows, cols) = self.index.candidate_ranges(&probe);

        let tile_size = if self.options.subdivide {
            self.options.tile_size
        } else {
            // One tile covering the whole candidate window.
            TileSize::Cells(rows.len().max(cols.len()).max(1))
        };
        let tiles = split(rows, cols, tile_size);
        debug!(tiles = tiles.len(), "candidate window tiled");

        let outputs: Vec<TileOutput> = if self.options.subdivide {
            tiles
                .par_iter()
                .map(|tile| self.process_tile(polygon, slices, tile))
                .collect::<Result<_>>()?
        } else {
            tiles
                .iter()
                .map(|tile| self.process_tile(polygon, slices, tile))
                .collect::<Result<_>>()?
        };

        if self.options.dissolve {
            Ok(merge_dissolved(outputs, slices))
        } else {
            Ok(merge_cells(outputs, slices))
        }
    }

    /// Selects and reads one tile. Opens a fresh reader so tile
    /// workers never share a handle.
    fn process_tile(&self, polygon: &Polygon<f64>, slices: &[Slice], tile: &Tile) -> Result<TileOutput> {
        let records = select(
            &self.index,
            polygon,
            tile.rows.clone(),
            tile.cols.clone(),
            self.options.clip,
        );
        if records.is_empty() {
            return Ok(TileOutput::empty(self.options.dissolve, slices.len()));
        }

        let reader = self.source.open()?;
        let width = tile.cols.len();
        let mut accumulators = vec![DissolveAccumulator::new(); slices.len()];
        let mut cells: Vec<(SelectionRecord, Vec<f64>)> = records
            .into_iter()
            .map(|rec| (rec, Vec::with_capacity(slices.len())))
            .collect();

        for (slice_idx, slice) in slices.iter().enumerate() {
            let values = reader.read_region(
                &self.variable,
                slice.time,
                slice.level.map(|(idx, _)| idx),
                tile.rows.clone(),
                tile.cols.clone(),
            )?;
            for (rec, rec_values) in &mut cells {
                let offset = (rec.row - tile.rows.start) * width + (rec.col - tile.cols.start);
                let value = values[offset];
                if self.options.dissolve {
                    accumulators[slice_idx].add(&rec.geometry, value, rec.weight);
                } else {
                    rec_values.push(value);
                }
            }
        }

        if self.options.dissolve {
            Ok(TileOutput::Dissolved(accumulators))
        } else {
            Ok(TileOutput::Cells(cells))
        }
    }
}

/// What one tile contributes to a polygon's result.
enum TileOutput {
    /// One entry per selected cell with its per-slice values.
    Cells(Vec<(SelectionRecord, Vec<f64>)>),
    /// One partial accumulator per slice.
    Dissolved(Vec<DissolveAccumulator>),
}

impl TileOutput {
    fn empty(dissolve: bool, nslices: usize) -> TileOutput {
        if dissolve {
            TileOutput::Dissolved(vec![DissolveAccumulator::new(); nslices])
        } else {
            TileOutput::Cells(Vec::new())
        }
    }
}

/// Concatenates per-cell tile outputs and emits elements slice-major,
/// cells ordered by storage position within each slice.
fn merge_cells(outputs: Vec<TileOutput>, slices: &[Slice]) -> Vec<Element> {
    let mut cells: Vec<(SelectionRecord, Vec<f64>)> = Vec::new();
    for output in outputs {
        if let TileOutput::Cells(mut tile_cells) = output {
            cells.append(&mut tile_cells);
        }
    }
    cells.sort_by_key(|(rec, _)| (rec.row, rec.col));

    let mut elements = Vec::with_capacity(cells.len() * slices.len());
    for (slice_idx, slice) in slices.iter().enumerate() {
        for (rec, values) in &cells {
            elements.push(Element {
                geometry: rec.geometry.clone(),
                value: values[slice_idx],
                timestamp: slice.date,
                level: slice.level.map(|(_, id)| id),
            });
        }
    }
    elements
}

/// Folds partial accumulators across tiles and emits one element per
/// non-empty slice.
fn merge_dissolved(outputs: Vec<TileOutput>, slices: &[Slice]) -> Vec<Element> {
    let mut merged = vec![DissolveAccumulator::new(); slices.len()];
    for output in outputs {
        if let TileOutput::Dissolved(partials) = output {
            for (acc, partial) in merged.iter_mut().zip(partials) {
                acc.merge(partial);
            }
        }
    }

    let mut elements = Vec::new();
    for (slice, acc) in slices.iter().zip(merged) {
        if let Some((geometry, value)) = acc.finish() {
            elements.push(Element {
                geometry,
                value,
                timestamp: slice.date,
                level: slice.level.map(|(_, id)| id),
            });
        }
    }
    elements
}

/// Subsets a variable by one or more query polygons.
///
/// Elements come back grouped by polygon in the caller's order; within
/// a polygon they are ordered by timestamp, then requested level, then
/// cell storage position.
pub fn subset(
    source: DatasetSource,
    schema: DatasetSchema,
    variable: impl Into<String>,
    polygons: &[Polygon<f64>],
    time: &TimeSelection,
    options: SubsetOptions,
) -> Result<Vec<Element>> {
    let context = QueryContext::new(source, schema, variable, time, options)?;
    context.run(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    use subset_common::CfDate;
    use test_utils::FixtureSpec;

    fn source(spec: FixtureSpec) -> DatasetSource {
        DatasetSource::memory(spec.build_memory().unwrap())
    }

    fn full_day() -> TimeSelection {
        TimeSelection::range(CfDate::new(2000, 1, 1), CfDate::new(2000, 1, 1))
    }

    fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
        polygon![
            (x: min_x, y: min_y),
            (x: max_x, y: min_y),
            (x: max_x, y: max_y),
            (x: min_x, y: max_y),
        ]
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let result = subset(
            source(FixtureSpec::default()),
            DatasetSchema::default(),
            "NoSuchVar",
            &[square(0.0, 0.0, 10.0, 10.0)],
            &full_day(),
            SubsetOptions::default(),
        );
        assert!(matches!(
            result,
            Err(crate::error::SubsetError::Dataset(
                DatasetError::MissingVariable(_)
            ))
        ));
    }

    #[test]
    fn polygons_keep_caller_order() {
        let elements = subset(
            source(FixtureSpec::default()),
            DatasetSchema::default(),
            "Prcp",
            &[
                square(30.0, 30.0, 40.0, 40.0),
                square(0.0, 0.0, 10.0, 10.0),
            ],
            &full_day(),
            SubsetOptions::default(),
        )
        .unwrap();
        assert_eq!(elements.len(), 2);
        let c0 = elements[0].centroid().unwrap();
        let c1 = elements[1].centroid().unwrap();
        assert!((c0.x() - 35.0).abs() < 1e-9);
        assert!((c1.x() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_polygon_yields_no_elements() {
        let elements = subset(
            source(FixtureSpec::default()),
            DatasetSchema::default(),
            "Prcp",
            &[square(100.0, 100.0, 120.0, 120.0)],
            &full_day(),
            SubsetOptions::default(),
        )
        .unwrap();
        assert!(elements.is_empty());
    }

    #[test]
    fn zero_tile_size_rejected_before_any_read() {
        let result = subset(
            source(FixtureSpec::default()),
            DatasetSchema::default(),
            "Prcp",
            &[square(0.0, 0.0, 10.0, 10.0)],
            &full_day(),
            SubsetOptions {
                subdivide: true,
                tile_size: TileSize::Cells(0),
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(crate::error::SubsetError::InvalidTileSize)
        ));
    }
}
