//! Live metric indicators
//!
//! Derived from the single most recent reading of the latest fetch and
//! rebuilt from scratch on every fetch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::reading::{ReadingWindow, SensorField};

/// Whether one sensor is currently reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveMetric {
    /// Value in the newest reading
    pub last_value: Option<f64>,
    /// Whether the newest reading carries the field
    pub is_live: bool,
}

/// Live state of every known field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveMetrics {
    metrics: BTreeMap<SensorField, LiveMetric>,
}

impl LiveMetrics {
    /// Derive from the window's most recent reading
    pub fn from_window(window: &ReadingWindow) -> Self {
        let latest = window.latest();
        let metrics = SensorField::ALL
            .iter()
            .map(|&field| {
                let last_value = latest.and_then(|r| r.get(field));
                (
                    field,
                    LiveMetric {
                        last_value,
                        is_live: last_value.is_some(),
                    },
                )
            })
            .collect();
        Self { metrics }
    }

    /// Live state of one field
    pub fn get(&self, field: SensorField) -> LiveMetric {
        self.metrics.get(&field).copied().unwrap_or_default()
    }

    /// Fields reporting in the latest reading
    pub fn live_fields(&self) -> impl Iterator<Item = SensorField> + '_ {
        self.metrics
            .iter()
            .filter(|(_, m)| m.is_live)
            .map(|(f, _)| *f)
    }
}
