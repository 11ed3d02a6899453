//! Render model
//!
//! Everything the presentation layer needs for one frame, computed from the
//! current window. Presence is scanned once and shared by cards and charts.

use serde::Serialize;

use super::live::{LiveMetric, LiveMetrics};
use super::ViewState;
use crate::chart::{build_charts, ChartPanel};
use crate::reading::{ReadingWindow, SensorField};
use crate::stats::{compute_stats, FieldPresence, FieldStats};

/// Fields shown as headline cards
pub const CARD_FIELDS: [SensorField; 3] = [
    SensorField::Speed,
    SensorField::Rpm,
    SensorField::CoolantTemp,
];

/// Headline metric card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    /// Field summarized by the card
    pub field: SensorField,
    /// Card heading
    pub title: &'static str,
    /// Display unit
    pub unit: &'static str,
    /// `None` renders the "no data" placeholder
    pub stats: Option<FieldStats>,
    /// Live indicator from the newest reading
    pub live: LiveMetric,
}

impl MetricCard {
    /// Whether the card shows the "no data" placeholder
    pub fn is_empty(&self) -> bool {
        self.stats.is_none()
    }
}

/// One dashboard frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Lifecycle state when the frame was built
    pub state: ViewState,
    /// Whether the refresh timer is running
    pub auto_refresh: bool,
    /// Readings in the displayed window
    pub record_count: usize,
    /// Headline cards, in [`CARD_FIELDS`] order
    pub cards: Vec<MetricCard>,
    /// Every chart, placeholders included
    pub charts: Vec<ChartPanel>,
}

impl DashboardView {
    /// Build a frame from a window and its live metrics
    pub fn build(
        window: &ReadingWindow,
        live: &LiveMetrics,
        state: ViewState,
        auto_refresh: bool,
    ) -> Self {
        let readings = window.readings();
        let presence = FieldPresence::scan(readings);

        let cards = CARD_FIELDS
            .iter()
            .map(|&field| MetricCard {
                field,
                title: card_title(field),
                unit: field.unit(),
                stats: presence
                    .contains(field)
                    .then(|| compute_stats(readings, field)),
                live: live.get(field),
            })
            .collect();

        Self {
            state,
            auto_refresh,
            record_count: window.len(),
            cards,
            charts: build_charts(readings, &presence),
        }
    }

    /// Card for a field, if it is a headline field
    pub fn card(&self, field: SensorField) -> Option<&MetricCard> {
        self.cards.iter().find(|c| c.field == field)
    }

    /// Panels that plot at least one line
    pub fn plotted_charts(&self) -> impl Iterator<Item = &ChartPanel> {
        self.charts.iter().filter(|c| c.has_data())
    }
}

fn card_title(field: SensorField) -> &'static str {
    match field {
        SensorField::Rpm => "Engine RPM",
        SensorField::CoolantTemp => "Coolant Temp",
        other => other.label(),
    }
}

/// What the presentation layer should show
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// Session missing or torn down
    Login,
    /// First fetch still pending
    Loading,
    /// Cards and charts for the current window
    Dashboard(DashboardView),
}
