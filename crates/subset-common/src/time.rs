//! Caller-facing temporal query types.

use crate::calendar::CfDate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A closed date range `[start, end]` at whole-day precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: CfDate,
    pub end: CfDate,
}

impl TimeRange {
    pub fn new(start: CfDate, end: CfDate) -> Self {
        Self { start, end }
    }

    /// Build from chrono datetimes, truncating to whole days.
    pub fn from_datetimes(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Inclusive containment check.
    pub fn contains(&self, date: CfDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Temporal selection for a subset query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSelection {
    /// Closed date range; axis positions within it are selected in
    /// axis order.
    Range(TimeRange),
    /// Explicit list of dates; an axis position is selected when its
    /// decoded date appears in the list.
    List(Vec<CfDate>),
}

impl TimeSelection {
    /// Convenience constructor for a closed range.
    pub fn range(start: CfDate, end: CfDate) -> Self {
        Self::Range(TimeRange::new(start, end))
    }

    /// Whether the given decoded axis date is selected.
    pub fn matches(&self, date: CfDate) -> bool {
        match self {
            Self::Range(r) => r.contains(date),
            Self::List(dates) => dates.contains(&date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_range_inclusive() {
        let r = TimeRange::new(CfDate::new(2000, 1, 1), CfDate::new(2000, 1, 10));
        assert!(r.contains(CfDate::new(2000, 1, 1)));
        assert!(r.contains(CfDate::new(2000, 1, 10)));
        assert!(!r.contains(CfDate::new(2000, 1, 11)));
        assert!(!r.contains(CfDate::new(1999, 12, 31)));
    }

    #[test]
    fn test_range_from_datetimes_truncates() {
        let r = TimeRange::from_datetimes(
            Utc.with_ymd_and_hms(2000, 1, 1, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2000, 1, 3, 0, 0, 1).unwrap(),
        );
        assert_eq!(r.start, CfDate::new(2000, 1, 1));
        assert_eq!(r.end, CfDate::new(2000, 1, 3));
    }

    #[test]
    fn test_list_selection() {
        let sel = TimeSelection::List(vec![
            CfDate::new(2007, 10, 15),
            CfDate::new(2007, 11, 15),
        ]);
        assert!(sel.matches(CfDate::new(2007, 10, 15)));
        assert!(!sel.matches(CfDate::new(2007, 10, 16)));
    }
}
