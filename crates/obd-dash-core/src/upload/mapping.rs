//! Mapping uploaded logs onto readings
//!
//! Lets a local file be charted before it is sent to the backend. Two layouts
//! are understood:
//!
//! - tabular CSV exports with a header row (`timestamp,Vehicle Speed,RPM,...`)
//! - device agent logs, one sample per line
//!   (`2025-10-21T10:00:00+10:00,Vehicle Speed=42,RPM=2100`)

use serde_json::Value;

use super::parser::{CsvRow, CsvTable};
use crate::reading::{parse_number, Reading, SensorField};

/// Header names accepted for the timestamp column
const TIMESTAMP_HEADERS: [&str; 4] = ["timestamp", "Timestamp", "Time", "time"];

/// Resolve a CSV header or device key to a sensor field
pub fn header_field(header: &str) -> Option<SensorField> {
    SensorField::from_label(header).or_else(|| SensorField::from_wire_name(header))
}

/// Layout of an uploaded text log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLayout {
    /// Header row followed by positional rows
    Tabular,
    /// Timestamp followed by `name=value` pairs on every line
    KeyValue,
}

impl LogLayout {
    /// Guess the layout from the first non-blank line
    pub fn detect(text: &str) -> Self {
        let first = text.lines().find(|line| !line.trim().is_empty());
        match first {
            Some(line) if line.split(',').skip(1).any(|part| part.contains('=')) => {
                LogLayout::KeyValue
            }
            _ => LogLayout::Tabular,
        }
    }
}

/// Parse an uploaded log of either layout into readings
pub fn readings_from_text(text: &str) -> Vec<Reading> {
    match LogLayout::detect(text) {
        LogLayout::Tabular => CsvTable::parse(text).to_readings(),
        LogLayout::KeyValue => text.lines().filter_map(parse_key_value_line).collect(),
    }
}

fn parse_key_value_line(line: &str) -> Option<Reading> {
    let mut parts = line.split(',');
    let timestamp = parts.next()?.trim();
    if timestamp.is_empty() {
        return None;
    }

    let mut reading = Reading::new(timestamp);
    for part in parts {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match header_field(key) {
            Some(field) => reading.set(field, parse_number(value)),
            None => {
                reading
                    .extra
                    .insert(key.to_string(), Value::String(value.to_string()));
            }
        }
    }
    Some(reading)
}

fn row_to_reading(row: &CsvRow) -> Reading {
    let timestamp = TIMESTAMP_HEADERS
        .iter()
        .find_map(|h| row.get(h))
        .unwrap_or_default();

    let mut reading = Reading::new(timestamp);
    for (header, value) in row.iter() {
        if TIMESTAMP_HEADERS.contains(&header) {
            continue;
        }
        match header_field(header) {
            Some(field) => {
                // Aliases (RPM / Engine RPM) must not clear an earlier value
                if let Some(v) = value.and_then(parse_number) {
                    reading.set(field, Some(v));
                }
            }
            None => {
                if let Some(v) = value {
                    reading
                        .extra
                        .insert(header.to_string(), Value::String(v.to_string()));
                }
            }
        }
    }
    reading
}

impl CsvTable {
    /// Convert every data row into a reading, in file order
    pub fn to_readings(&self) -> Vec<Reading> {
        self.rows.iter().map(row_to_reading).collect()
    }
}
