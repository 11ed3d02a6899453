//! Field Statistics
//!
//! Min/max/average over one sensor field of a reading window.
//!
//! Only values that are present and numeric take part. A field with no such
//! values yields the `{0, 0, 0}` sentinel, so callers must pair
//! [`compute_stats`] with [`has_field`] before displaying anything.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::reading::{Reading, SensorField};

/// Aggregate values of one field
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Arithmetic mean
    pub avg: f64,
}

impl FieldStats {
    /// Aggregate an arbitrary sequence of values
    ///
    /// Non-finite values are skipped. Returns the zero sentinel when nothing
    /// remains.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values.into_iter().filter(|v| v.is_finite()) {
            count += 1;
            sum += v;
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }

        if count == 0 {
            return Self::default();
        }

        // Float rounding can push the mean a hair outside [min, max]
        let avg = (sum / count as f64).clamp(min, max);
        Self { min, max, avg }
    }
}

/// Compute statistics for `field` over `readings`
pub fn compute_stats(readings: &[Reading], field: SensorField) -> FieldStats {
    FieldStats::from_values(readings.iter().filter_map(|r| r.get(field)))
}

/// Whether any reading reports `field`
pub fn has_field(readings: &[Reading], field: SensorField) -> bool {
    readings.iter().any(|r| r.has(field))
}

/// Set of fields reported anywhere in a window
///
/// Built once per refresh so chart and card rendering do not rescan the
/// window for every point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPresence {
    present: BTreeSet<SensorField>,
}

impl FieldPresence {
    /// Scan a window in a single pass
    pub fn scan(readings: &[Reading]) -> Self {
        let mut present = BTreeSet::new();
        for reading in readings {
            present.extend(reading.fields().map(|(field, _)| field));
            if present.len() == SensorField::ALL.len() {
                break;
            }
        }
        Self { present }
    }

    /// Check a single field
    pub fn contains(&self, field: SensorField) -> bool {
        self.present.contains(&field)
    }

    /// Check whether any of the fields is present
    pub fn any(&self, fields: &[SensorField]) -> bool {
        fields.iter().any(|f| self.contains(*f))
    }

    /// True when the window reported nothing at all
    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// Iterate over present fields
    pub fn iter(&self) -> impl Iterator<Item = SensorField> + '_ {
        self.present.iter().copied()
    }
}
