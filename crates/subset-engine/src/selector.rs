//! Polygon-to-grid selection.
//!
//! Candidate cells come from the grid index; each candidate is
//! intersected with the query polygon and kept only when the overlap
//! has positive area. The kept geometry is either the whole cell or
//! the clipped overlap, per the query options.

use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::validation::Validation;
use geo::{Area, BooleanOps, MultiPolygon, Polygon};
use tracing::debug;

use crate::grid::GridIndex;
use subset_common::BoundingBox;

/// One selected cell: its storage position, the geometry to report,
/// and the planar area weight used by dissolve.
#[derive(Debug, Clone)]
pub struct SelectionRecord {
    pub row: usize,
    pub col: usize,
    /// Whole-cell rectangle, or the clipped overlap when clipping is
    /// on.
    pub geometry: MultiPolygon<f64>,
    /// Area of the carried geometry: the overlap area when clipping,
    /// the full cell area otherwise.
    pub weight: f64,
}

/// Selects the grid cells overlapping `polygon` within the given
/// storage-index window.
///
/// Degenerate inputs (invalid rings, self-intersections, empty
/// polygons) select nothing rather than failing. Cells that merely
/// touch the polygon boundary carry zero overlap area and are
/// discarded.
pub fn select(
    index: &GridIndex,
    polygon: &Polygon<f64>,
    rows: std::ops::Range<usize>,
    cols: std::ops::Range<usize>,
    clip: bool,
) -> Vec<SelectionRecord> {
    if !polygon.is_valid() {
        debug!("query polygon invalid, selecting nothing");
        return Vec::new();
    }
    let Some(rect) = polygon.bounding_rect() else {
        return Vec::new();
    };
    let probe = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
    let query = MultiPolygon::new(vec![polygon.clone()]);

    let mut records = Vec::new();
    for row in rows {
        for col in cols.clone() {
            if !index.cell_bbox(row, col).intersects(&probe) {
                continue;
            }
            let cell = index.cell_polygon(row, col);
            let overlap = query.intersection(&MultiPolygon::new(vec![cell.clone()]));
            if overlap.unsigned_area() <= 0.0 {
                continue;
            }
            // Inclusion is decided by the overlap; the weight follows
            // the geometry actually carried.
            let (geometry, weight) = if clip {
                let area = overlap.unsigned_area();
                (overlap, area)
            } else {
                (MultiPolygon::new(vec![cell]), index.cell_bbox(row, col).area())
            };
            records.push(SelectionRecord {
                row,
                col,
                geometry,
                weight,
            });
        }
    }
    records
}
