//! Area-weighted dissolve.
//!
//! A dissolve collapses one time/level slice to a single value: the
//! sum of cell values weighted by each record's geometry area, divided
//! by the total. The accumulator keeps the two running sums and the
//! union geometry separately so partial results from different tiles
//! merge without losing precision in the final division.

use geo::{BooleanOps, MultiPolygon};

/// Partial dissolve state for one time/level slice.
#[derive(Debug, Clone, Default)]
pub struct DissolveAccumulator {
    weighted_sum: f64,
    weight_sum: f64,
    geometry: Option<MultiPolygon<f64>>,
}

impl DissolveAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one selected cell into the accumulator.
    pub fn add(&mut self, geometry: &MultiPolygon<f64>, value: f64, weight: f64) {
        self.weighted_sum += value * weight;
        self.weight_sum += weight;
        self.geometry = Some(match self.geometry.take() {
            Some(acc) => acc.union(geometry),
            None => geometry.clone(),
        });
    }

    /// Merges a partial accumulator from another tile.
    pub fn merge(&mut self, other: DissolveAccumulator) {
        self.weighted_sum += other.weighted_sum;
        self.weight_sum += other.weight_sum;
        self.geometry = match (self.geometry.take(), other.geometry) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, b) => a.or(b),
        };
    }

    pub fn is_empty(&self) -> bool {
        self.weight_sum <= 0.0
    }

    /// The dissolved geometry and value, or `None` when nothing was
    /// accumulated.
    pub fn finish(self) -> Option<(MultiPolygon<f64>, f64)> {
        if self.weight_sum <= 0.0 {
            return None;
        }
        let value = self.weighted_sum / self.weight_sum;
        self.geometry.map(|g| (g, value))
    }
}
