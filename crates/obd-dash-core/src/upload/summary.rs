//! Upload summary
//!
//! Quick feedback shown after a file is parsed and submitted.

use serde::{Deserialize, Serialize};

use super::mapping::header_field;
use super::parser::{CsvRow, CsvTable};
use crate::reading::{parse_number, Reading, SensorField};
use crate::stats::{compute_stats, FieldStats};

/// Aggregates of one uploaded file
///
/// Unparsable or missing values are excluded from the averages and maxima,
/// the same rule the dashboard statistics use. A field with no usable values
/// reports `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    /// Name of the summarized file
    pub file_name: String,
    /// Data rows, excluding the header
    pub record_count: usize,
    /// Mean vehicle speed
    pub avg_speed: f64,
    /// Highest vehicle speed
    pub max_speed: f64,
    /// Mean engine RPM
    pub avg_rpm: f64,
    /// Highest engine RPM
    pub max_rpm: f64,
    /// Mean coolant temperature
    pub avg_temp: f64,
}

impl UploadSummary {
    /// Summarize a parsed table
    pub fn from_table(file_name: impl Into<String>, table: &CsvTable) -> Self {
        let speed = column_stats(table, SensorField::Speed);
        let rpm = column_stats(table, SensorField::Rpm);
        let temp = column_stats(table, SensorField::CoolantTemp);

        Self {
            file_name: file_name.into(),
            record_count: table.len(),
            avg_speed: speed.avg,
            max_speed: speed.max,
            avg_rpm: rpm.avg,
            max_rpm: rpm.max,
            avg_temp: temp.avg,
        }
    }

    /// Summarize readings already mapped from a device log
    pub fn from_readings(file_name: impl Into<String>, readings: &[Reading]) -> Self {
        let speed = compute_stats(readings, SensorField::Speed);
        let rpm = compute_stats(readings, SensorField::Rpm);
        let temp = compute_stats(readings, SensorField::CoolantTemp);

        Self {
            file_name: file_name.into(),
            record_count: readings.len(),
            avg_speed: speed.avg,
            max_speed: speed.max,
            avg_rpm: rpm.avg,
            max_rpm: rpm.max,
            avg_temp: temp.avg,
        }
    }
}

fn cell(row: &CsvRow, field: SensorField) -> Option<f64> {
    row.iter()
        .filter(|(header, _)| header_field(header) == Some(field))
        .find_map(|(_, value)| value.and_then(parse_number))
}

fn column_stats(table: &CsvTable, field: SensorField) -> FieldStats {
    FieldStats::from_values(table.rows.iter().filter_map(|row| cell(row, field)))
}
