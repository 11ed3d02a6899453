//! Chart Data Formatting
//!
//! Reshapes a reading window into the series each dashboard chart plots.
//! Every series has exactly one point per reading, in window order. Missing
//! sensor values become `None` gaps; nothing is interpolated or dropped, so
//! the x-axis stays aligned across charts.

use serde::{Deserialize, Serialize};

use crate::reading::{Reading, SensorField};
use crate::stats::FieldPresence;

/// RPM is divided by this before plotting so it shares the speed axis
pub const RPM_DISPLAY_SCALE: f64 = 10.0;

/// Point of the combined speed/RPM chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedRpmPoint {
    /// Local time-of-day label
    pub time: String,
    /// Vehicle speed
    pub speed: Option<f64>,
    /// RPM divided by [`RPM_DISPLAY_SCALE`]
    pub rpm: Option<f64>,
}

/// Point of a single-field chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    /// Local time-of-day label
    pub time: String,
    /// Field value, `None` leaves a gap
    pub value: Option<f64>,
}

/// Point of a two-line chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualPoint {
    /// Local time-of-day label
    pub time: String,
    /// First line's value
    pub first: Option<f64>,
    /// Second line's value
    pub second: Option<f64>,
}

/// Time-of-day labels for every reading, in order
pub fn time_labels(readings: &[Reading]) -> Vec<String> {
    readings.iter().map(Reading::time_label).collect()
}

/// Speed and scaled RPM series
pub fn format_speed_rpm(readings: &[Reading]) -> Vec<SpeedRpmPoint> {
    speed_rpm_with_labels(readings, time_labels(readings))
}

/// `{time, value}` series for one field
pub fn format_single(readings: &[Reading], field: SensorField) -> Vec<ValuePoint> {
    single_with_labels(readings, time_labels(readings), field)
}

/// `{time, first, second}` series for two fields
pub fn format_dual(
    readings: &[Reading],
    first: SensorField,
    second: SensorField,
) -> Vec<DualPoint> {
    dual_with_labels(readings, time_labels(readings), first, second)
}

fn speed_rpm_with_labels(readings: &[Reading], labels: Vec<String>) -> Vec<SpeedRpmPoint> {
    readings
        .iter()
        .zip(labels)
        .map(|(r, time)| SpeedRpmPoint {
            time,
            speed: r.get(SensorField::Speed),
            rpm: r.get(SensorField::Rpm).map(|v| v / RPM_DISPLAY_SCALE),
        })
        .collect()
}

fn single_with_labels(
    readings: &[Reading],
    labels: Vec<String>,
    field: SensorField,
) -> Vec<ValuePoint> {
    readings
        .iter()
        .zip(labels)
        .map(|(r, time)| ValuePoint {
            time,
            value: r.get(field),
        })
        .collect()
}

fn dual_with_labels(
    readings: &[Reading],
    labels: Vec<String>,
    first: SensorField,
    second: SensorField,
) -> Vec<DualPoint> {
    readings
        .iter()
        .zip(labels)
        .map(|(r, time)| DualPoint {
            time,
            first: r.get(first),
            second: r.get(second),
        })
        .collect()
}

/// Charts shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Speed with scaled RPM
    SpeedRpm,
    /// Coolant and intake air temperature
    Temperature,
    /// Manifold and barometric pressure
    Pressure,
    /// Throttle position
    Throttle,
    /// Mass air flow
    MafAirFlow,
    /// Control module voltage
    Voltage,
    /// Calculated engine load
    EngineLoad,
    /// Fuel level
    FuelLevel,
    /// Fuel pressure
    FuelPressure,
    /// Ambient air temperature
    AmbientTemp,
}

impl ChartKind {
    /// Dashboard order
    pub const ALL: [ChartKind; 10] = [
        ChartKind::SpeedRpm,
        ChartKind::Temperature,
        ChartKind::Pressure,
        ChartKind::Throttle,
        ChartKind::MafAirFlow,
        ChartKind::Voltage,
        ChartKind::EngineLoad,
        ChartKind::FuelLevel,
        ChartKind::FuelPressure,
        ChartKind::AmbientTemp,
    ];

    /// Chart title
    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::SpeedRpm => "Speed & RPM Over Time",
            ChartKind::Temperature => "Temperature Monitoring",
            ChartKind::Pressure => "Pressure Monitoring",
            ChartKind::Throttle => "Throttle Position",
            ChartKind::MafAirFlow => "MAF Air Flow Rate",
            ChartKind::Voltage => "Control Module Voltage",
            ChartKind::EngineLoad => "Engine Load",
            ChartKind::FuelLevel => "Fuel Level",
            ChartKind::FuelPressure => "Fuel Pressure",
            ChartKind::AmbientTemp => "Ambient Air Temperature",
        }
    }

    /// Fields plotted by this chart, one line each
    pub fn fields(&self) -> &'static [SensorField] {
        match self {
            ChartKind::SpeedRpm => &[SensorField::Speed, SensorField::Rpm],
            ChartKind::Temperature => &[SensorField::CoolantTemp, SensorField::IntakeAirTemp],
            ChartKind::Pressure => &[
                SensorField::IntakeManifoldPressure,
                SensorField::BarometricPressure,
            ],
            ChartKind::Throttle => &[SensorField::ThrottlePosition],
            ChartKind::MafAirFlow => &[SensorField::MafAirFlowRate],
            ChartKind::Voltage => &[SensorField::ControlModuleVoltage],
            ChartKind::EngineLoad => &[SensorField::EngineLoad],
            ChartKind::FuelLevel => &[SensorField::FuelLevel],
            ChartKind::FuelPressure => &[SensorField::FuelPressure],
            ChartKind::AmbientTemp => &[SensorField::AmbientAirTemp],
        }
    }
}

/// Plotted data of one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "points", rename_all = "snake_case")]
pub enum ChartSeries {
    /// Combined speed/RPM points
    SpeedRpm(Vec<SpeedRpmPoint>),
    /// One line
    Single(Vec<ValuePoint>),
    /// Two lines sharing an axis
    Dual(Vec<DualPoint>),
}

impl ChartSeries {
    /// Number of points
    pub fn len(&self) -> usize {
        match self {
            ChartSeries::SpeedRpm(points) => points.len(),
            ChartSeries::Single(points) => points.len(),
            ChartSeries::Dual(points) => points.len(),
        }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One line of a chart and whether the window has data for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesLine {
    /// Plotted field
    pub field: SensorField,
    /// Whether any reading carries the field
    pub present: bool,
}

/// A rendered chart, or the placeholder when none of its fields has data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartPanel {
    /// At least one line has data
    Plot {
        /// Which chart
        kind: ChartKind,
        /// Lines in legend order
        lines: Vec<SeriesLine>,
        /// One point per reading, in window order
        series: ChartSeries,
    },
    /// "No data available" placeholder
    NoData {
        /// Which chart
        kind: ChartKind,
    },
}

impl ChartPanel {
    /// Which chart this panel is
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartPanel::Plot { kind, .. } | ChartPanel::NoData { kind } => *kind,
        }
    }

    /// Whether the panel plots anything
    pub fn has_data(&self) -> bool {
        matches!(self, ChartPanel::Plot { .. })
    }

    /// Whether the line for `field` has data in this panel
    pub fn line_present(&self, field: SensorField) -> bool {
        match self {
            ChartPanel::Plot { lines, .. } => lines.iter().any(|l| l.field == field && l.present),
            ChartPanel::NoData { .. } => false,
        }
    }
}

/// Build every dashboard chart for a window
///
/// `presence` must come from the same window; it decides which charts get
/// the "no data" placeholder.
pub fn build_charts(readings: &[Reading], presence: &FieldPresence) -> Vec<ChartPanel> {
    let labels = time_labels(readings);

    ChartKind::ALL
        .iter()
        .map(|&kind| {
            let fields = kind.fields();
            if !presence.any(fields) {
                return ChartPanel::NoData { kind };
            }

            let lines = fields
                .iter()
                .map(|&field| SeriesLine {
                    field,
                    present: presence.contains(field),
                })
                .collect();

            let series = match (kind, fields) {
                (ChartKind::SpeedRpm, _) => {
                    ChartSeries::SpeedRpm(speed_rpm_with_labels(readings, labels.clone()))
                }
                (_, [first, second, ..]) => {
                    ChartSeries::Dual(dual_with_labels(readings, labels.clone(), *first, *second))
                }
                (_, [field, ..]) => {
                    ChartSeries::Single(single_with_labels(readings, labels.clone(), *field))
                }
                (_, []) => return ChartPanel::NoData { kind },
            };

            ChartPanel::Plot {
                kind,
                lines,
                series,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpm_scaled() {
        let readings = vec![Reading::new("2025-10-21T10:00:00")
            .with(SensorField::Rpm, 2345.0)
            .with(SensorField::Speed, 50.0)];
        let points = format_speed_rpm(&readings);
        assert_eq!(points[0].rpm, Some(234.5));
        assert_eq!(points[0].speed, Some(50.0));
        assert_eq!(points[0].time, "10:00:00");
    }

    #[test]
    fn test_gaps_are_kept() {
        let readings = vec![
            Reading::new("2025-10-21T10:00:00").with(SensorField::ThrottlePosition, 12.0),
            Reading::new("bogus"),
        ];
        let points = format_single(&readings, SensorField::ThrottlePosition);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], ValuePoint { time: String::new(), value: None });
    }

    #[test]
    fn test_dual_independent_gaps() {
        let readings = vec![
            Reading::new("2025-10-21T10:00:00").with(SensorField::IntakeManifoldPressure, 35.0),
            Reading::new("2025-10-21T10:00:01").with(SensorField::BarometricPressure, 101.0),
        ];
        let points = format_dual(
            &readings,
            SensorField::IntakeManifoldPressure,
            SensorField::BarometricPressure,
        );
        assert_eq!((points[0].first, points[0].second), (Some(35.0), None));
        assert_eq!((points[1].first, points[1].second), (None, Some(101.0)));
    }

    #[test]
    fn test_charts_without_data_are_placeholders() {
        let readings = vec![Reading::new("2025-10-21T10:00:00").with(SensorField::FuelLevel, 55.0)];
        let charts = build_charts(&readings, &FieldPresence::scan(&readings));

        assert_eq!(charts.len(), ChartKind::ALL.len());
        for chart in &charts {
            assert_eq!(chart.has_data(), chart.kind() == ChartKind::FuelLevel);
        }
    }
}
