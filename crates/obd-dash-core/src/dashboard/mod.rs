//! Dashboard
//!
//! Polling view model plus the render model built from each reading window.

mod live;
mod view;
mod view_model;

pub use live::{LiveMetric, LiveMetrics};
pub use view::{DashboardView, MetricCard, Screen, CARD_FIELDS};
pub use view_model::{DashboardViewModel, RefreshOutcome};

use serde::{Deserialize, Serialize};

/// Dashboard state machine
///
/// `Loading -> Ready <-> Refreshing`. Loading ends after the first fetch
/// completes, successfully or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Waiting for the first fetch
    Loading,
    /// Idle, showing the last window
    Ready,
    /// A fetch is in flight over a displayed window
    Refreshing,
}
