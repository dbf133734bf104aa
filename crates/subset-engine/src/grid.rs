//! In-memory index over the dataset's horizontal grid.
//!
//! The index holds per-axis cell intervals, normalized to `[lo, hi]`
//! regardless of the axis direction on disk. Candidate lookups are
//! binary searches over those intervals, so a bounding-box probe never
//! scans the full grid.

use geo::{polygon, Polygon};
use tracing::debug;

use dataset_access::{DatasetSchema, GridReader};
use subset_common::BoundingBox;

use crate::error::{Result, SubsetError};

/// Relative tolerance for the uniform-spacing check when cell bounds
/// must be inferred from coordinate centers.
const SPACING_REL_TOL: f64 = 1e-6;

/// One horizontal axis: cell intervals in storage order plus the
/// direction the coordinate values run in.
#[derive(Debug, Clone)]
struct Axis {
    /// Per-cell `[lo, hi]` intervals, indexed by storage position.
    intervals: Vec<[f64; 2]>,
    /// Whether coordinate values increase with storage position.
    ascending: bool,
}

impl Axis {
    fn from_bounds(name: &str, mut bounds: Vec<[f64; 2]>) -> Result<Axis> {
        if bounds.is_empty() {
            return Err(SubsetError::UnresolvableBounds {
                axis: name.to_string(),
                len: 0,
            });
        }
        let ascending = match bounds.len() {
            1 => true,
            _ => bounds[1][0] + bounds[1][1] > bounds[0][0] + bounds[0][1],
        };
        for pair in &mut bounds {
            if pair[0] > pair[1] {
                pair.swap(0, 1);
            }
        }
        Ok(Axis {
            intervals: bounds,
            ascending,
        })
    }

    fn from_centers(name: &str, centers: &[f64]) -> Result<Axis> {
        if centers.len() < 2 {
            return Err(SubsetError::UnresolvableBounds {
                axis: name.to_string(),
                len: centers.len(),
            });
        }
        let step = centers[1] - centers[0];
        let scale = step.abs().max(1.0);
        for w in centers.windows(2) {
            if ((w[1] - w[0]) - step).abs() > SPACING_REL_TOL * scale {
                return Err(SubsetError::NonUniformSpacing {
                    axis: name.to_string(),
                });
            }
        }
        let half = step.abs() / 2.0;
        let bounds = centers.iter().map(|&c| [c - half, c + half]).collect();
        Ok(Axis {
            intervals: bounds,
            ascending: step > 0.0,
        })
    }

    fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Storage positions whose interval overlaps `[min, max]`.
    ///
    /// Intervals are sorted along the axis in storage order (ascending)
    /// or reversed (descending), so both ends resolve with a partition
    /// search.
    fn candidates(&self, min: f64, max: f64) -> std::ops::Range<usize> {
        let n = self.len();
        if self.ascending {
            let start = self.intervals.partition_point(|iv| iv[1] < min);
            let end = self.intervals.partition_point(|iv| iv[0] <= max);
            start..end.max(start)
        } else {
            // Descending storage order: high intervals first.
            let start = self.intervals.partition_point(|iv| iv[0] > max);
            let end = self.intervals.partition_point(|iv| iv[1] >= min);
            start.min(n)..end.max(start)
        }
    }
}

/// Spatial index over the dataset grid.
#[derive(Debug, Clone)]
pub struct GridIndex {
    rows: Axis,
    cols: Axis,
}

impl GridIndex {
    /// Builds the index from the dataset's coordinate variables.
    ///
    /// Explicit bounds variables take precedence; without them, cell
    /// intervals are inferred from the centers, which requires uniform
    /// spacing and at least two points per axis.
    pub fn from_reader(reader: &dyn GridReader, schema: &DatasetSchema) -> Result<GridIndex> {
        let rows = Self::build_axis(reader, &schema.row_name, &schema.rowbnds_name)?;
        let cols = Self::build_axis(reader, &schema.col_name, &schema.colbnds_name)?;
        debug!(rows = rows.len(), cols = cols.len(), "grid index built");
        Ok(GridIndex { rows, cols })
    }

    fn build_axis(reader: &dyn GridReader, coord: &str, bounds: &str) -> Result<Axis> {
        if reader.has_variable(bounds) {
            let pairs = reader.bound_values(bounds)?;
            Axis::from_bounds(coord, pairs)
        } else {
            let centers = reader.coord_values(coord)?;
            Axis::from_centers(coord, &centers)
        }
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.cols.len()
    }

    /// Storage-index ranges of cells whose extents overlap `bbox`.
    pub fn candidate_ranges(
        &self,
        bbox: &BoundingBox,
    ) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        (
            self.rows.candidates(bbox.min_y, bbox.max_y),
            self.cols.candidates(bbox.min_x, bbox.max_x),
        )
    }

    /// Extent of a single cell.
    pub fn cell_bbox(&self, row: usize, col: usize) -> BoundingBox {
        let r = self.rows.intervals[row];
        let c = self.cols.intervals[col];
        BoundingBox::new(c[0], r[0], c[1], r[1])
    }

    /// Rectangular polygon covering a single cell, wound
    /// counter-clockwise.
    pub fn cell_polygon(&self, row: usize, col: usize) -> Polygon<f64> {
        let b = self.cell_bbox(row, col);
        polygon![
            (x: b.min_x, y: b.min_y),
            (x: b.max_x, y: b.min_y),
            (x: b.max_x, y: b.max_y),
            (x: b.min_x, y: b.max_y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use dataset_access::DatasetSource;
    use test_utils::FixtureSpec;

    fn default_index() -> GridIndex {
        let data = FixtureSpec::default().build_memory().unwrap();
        let reader = DatasetSource::memory(data).open().unwrap();
        GridIndex::from_reader(reader.as_ref(), &DatasetSchema::default()).unwrap()
    }

    #[test]
    fn index_covers_fixture_grid() {
        let index = default_index();
        assert_eq!(index.nrows(), 4);
        assert_eq!(index.ncols(), 4);
        let b = index.cell_bbox(0, 0);
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0.0, 0.0, 10.0, 10.0));
        let b = index.cell_bbox(3, 3);
        assert_eq!(
            (b.min_x, b.min_y, b.max_x, b.max_y),
            (30.0, 30.0, 40.0, 40.0)
        );
    }

    #[test]
    fn candidates_clip_to_probe_box() {
        let index = default_index();
        let probe = BoundingBox::new(12.0, 12.0, 18.0, 28.0);
        let (rows, cols) = index.candidate_ranges(&probe);
        assert_eq!(rows, 1..3);
        assert_eq!(cols, 1..2);
    }

    #[test]
    fn touching_edge_is_a_candidate() {
        let index = default_index();
        let probe = BoundingBox::new(10.0, 10.0, 10.0, 10.0);
        let (rows, cols) = index.candidate_ranges(&probe);
        // Edge contact keeps both neighboring cells; zero-area overlaps
        // are discarded later by the selector.
        assert_eq!(rows, 0..2);
        assert_eq!(cols, 0..2);
    }

    #[test]
    fn disjoint_probe_yields_empty_ranges() {
        let index = default_index();
        let probe = BoundingBox::new(100.0, 100.0, 110.0, 110.0);
        let (rows, cols) = index.candidate_ranges(&probe);
        assert!(rows.is_empty());
        assert!(cols.is_empty());
    }

    #[test]
    fn descending_axis_candidates() {
        // Latitude stored north-to-south.
        let axis = Axis::from_centers("latitude", &[35.0, 25.0, 15.0, 5.0]).unwrap();
        assert!(!axis.ascending);
        assert_eq!(axis.candidates(12.0, 28.0), 1..3);
        assert_eq!(axis.candidates(-10.0, -1.0), 4..4);
        assert_eq!(axis.candidates(38.0, 50.0), 0..1);
    }

    #[test]
    fn non_uniform_centers_without_bounds_rejected() {
        let err = Axis::from_centers("latitude", &[0.0, 10.0, 25.0]).unwrap_err();
        assert!(matches!(err, SubsetError::NonUniformSpacing { .. }));
    }

    #[test]
    fn single_center_without_bounds_rejected() {
        let err = Axis::from_centers("latitude", &[5.0]).unwrap_err();
        assert!(matches!(err, SubsetError::UnresolvableBounds { len: 1, .. }));
    }

    #[test]
    fn bounds_normalized_when_stored_high_low() {
        let axis =
            Axis::from_bounds("latitude", vec![[40.0, 30.0], [30.0, 20.0], [20.0, 10.0]]).unwrap();
        assert!(!axis.ascending);
        assert_eq!(axis.intervals[0], [30.0, 40.0]);
        assert_eq!(axis.candidates(12.0, 22.0), 1..3);
    }
}
