//! Telemetry Readings
//!
//! A reading is one timestamped sample reported by a device or parsed from an
//! uploaded log. Every sensor field is optional: absence means the source did
//! not report the field, which is different from a reported zero.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sensor fields known to the dashboard
///
/// The serialized name of each variant is the column name used by the
/// telemetry backend (`speed`, `cool_temp`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorField {
    /// Vehicle speed
    #[serde(rename = "speed")]
    Speed,
    /// Engine speed
    #[serde(rename = "rpm")]
    Rpm,
    /// Engine coolant temperature
    #[serde(rename = "cool_temp")]
    CoolantTemp,
    /// Throttle opening
    #[serde(rename = "throttle_pos")]
    ThrottlePosition,
    /// Intake manifold absolute pressure
    #[serde(rename = "intake_mani_pres")]
    IntakeManifoldPressure,
    /// Intake air temperature
    #[serde(rename = "intake_air_temp")]
    IntakeAirTemp,
    /// Mass air flow
    #[serde(rename = "maf_air_flow_rate")]
    MafAirFlowRate,
    /// Barometric pressure
    #[serde(rename = "baro_pressure")]
    BarometricPressure,
    /// ECU supply voltage
    #[serde(rename = "control_module_voltage")]
    ControlModuleVoltage,
    /// Calculated engine load
    #[serde(rename = "engine_load")]
    EngineLoad,
    /// Fuel tank level
    #[serde(rename = "fuel_level")]
    FuelLevel,
    /// Fuel rail pressure
    #[serde(rename = "fuel_pressure")]
    FuelPressure,
    /// Outside air temperature
    #[serde(rename = "ambient_air_temp")]
    AmbientAirTemp,
    /// Ignition timing advance
    #[serde(rename = "timing_advance")]
    TimingAdvance,
    /// Seconds since engine start
    #[serde(rename = "run_time")]
    RunTime,
    /// Catalyst temperature, bank 1 sensor 1
    #[serde(rename = "catalyst_temp")]
    CatalystTemp,
}

impl SensorField {
    /// Every known field, in display order
    pub const ALL: [SensorField; 16] = [
        SensorField::Speed,
        SensorField::Rpm,
        SensorField::CoolantTemp,
        SensorField::ThrottlePosition,
        SensorField::IntakeManifoldPressure,
        SensorField::IntakeAirTemp,
        SensorField::MafAirFlowRate,
        SensorField::BarometricPressure,
        SensorField::ControlModuleVoltage,
        SensorField::EngineLoad,
        SensorField::FuelLevel,
        SensorField::FuelPressure,
        SensorField::AmbientAirTemp,
        SensorField::TimingAdvance,
        SensorField::RunTime,
        SensorField::CatalystTemp,
    ];

    /// Column name used by the backend API
    pub fn wire_name(&self) -> &'static str {
        match self {
            SensorField::Speed => "speed",
            SensorField::Rpm => "rpm",
            SensorField::CoolantTemp => "cool_temp",
            SensorField::ThrottlePosition => "throttle_pos",
            SensorField::IntakeManifoldPressure => "intake_mani_pres",
            SensorField::IntakeAirTemp => "intake_air_temp",
            SensorField::MafAirFlowRate => "maf_air_flow_rate",
            SensorField::BarometricPressure => "baro_pressure",
            SensorField::ControlModuleVoltage => "control_module_voltage",
            SensorField::EngineLoad => "engine_load",
            SensorField::FuelLevel => "fuel_level",
            SensorField::FuelPressure => "fuel_pressure",
            SensorField::AmbientAirTemp => "ambient_air_temp",
            SensorField::TimingAdvance => "timing_advance",
            SensorField::RunTime => "run_time",
            SensorField::CatalystTemp => "catalyst_temp",
        }
    }

    /// Human readable label, as it appears in OBD app CSV exports
    pub fn label(&self) -> &'static str {
        match self {
            SensorField::Speed => "Vehicle Speed",
            SensorField::Rpm => "RPM",
            SensorField::CoolantTemp => "Engine Coolant Temperature",
            SensorField::ThrottlePosition => "Throttle Position",
            SensorField::IntakeManifoldPressure => "Intake Manifold Pressure",
            SensorField::IntakeAirTemp => "Intake Air Temperature",
            SensorField::MafAirFlowRate => "MAF Air Flow Rate",
            SensorField::BarometricPressure => "Barometric Pressure",
            SensorField::ControlModuleVoltage => "Control Module Voltage",
            SensorField::EngineLoad => "Calculated Engine Load",
            SensorField::FuelLevel => "Fuel Level",
            SensorField::FuelPressure => "Fuel Pressure",
            SensorField::AmbientAirTemp => "Ambient Air Temperature",
            SensorField::TimingAdvance => "Timing Advance",
            SensorField::RunTime => "Run Time Since Engine Start",
            SensorField::CatalystTemp => "Catalyst Temperature Bank1 Sensor1",
        }
    }

    /// Display unit
    pub fn unit(&self) -> &'static str {
        match self {
            SensorField::Speed => "km/h",
            SensorField::Rpm => "rpm",
            SensorField::CoolantTemp
            | SensorField::IntakeAirTemp
            | SensorField::AmbientAirTemp
            | SensorField::CatalystTemp => "°C",
            SensorField::ThrottlePosition | SensorField::EngineLoad | SensorField::FuelLevel => "%",
            SensorField::IntakeManifoldPressure
            | SensorField::BarometricPressure
            | SensorField::FuelPressure => "kPa",
            SensorField::MafAirFlowRate => "g/s",
            SensorField::ControlModuleVoltage => "V",
            SensorField::TimingAdvance => "°",
            SensorField::RunTime => "s",
        }
    }

    /// Look up a field by its backend column name
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.wire_name() == name)
    }

    /// Look up a field by CSV header label
    ///
    /// Engine speed is exported under several names depending on the app.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "RPM" | "Engine RPM" | "Engine Speed" => Some(SensorField::Rpm),
            _ => Self::ALL.iter().copied().find(|f| f.label() == label),
        }
    }
}

impl fmt::Display for SensorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single telemetry sample
///
/// Decoding is lenient: JSON numbers and numeric strings become values,
/// anything else (null, text, non-finite numbers) leaves the field absent.
/// Keys that are not known sensor fields are kept in [`Reading::extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Reading {
    /// ISO-8601 timestamp as reported by the source
    pub timestamp: String,
    values: BTreeMap<SensorField, f64>,
    /// Fields this version does not understand
    pub extra: BTreeMap<String, Value>,
}

impl Reading {
    /// Create an empty reading at the given timestamp
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter
    pub fn with(mut self, field: SensorField, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    /// Get a field value, `None` if not reported
    pub fn get(&self, field: SensorField) -> Option<f64> {
        self.values.get(&field).copied()
    }

    /// Set or clear a field. Non-finite values are treated as absent.
    pub fn set(&mut self, field: SensorField, value: Option<f64>) {
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                self.values.insert(field, v);
            }
            None => {
                self.values.remove(&field);
            }
        }
    }

    /// Whether the field was reported with a numeric value
    pub fn has(&self, field: SensorField) -> bool {
        self.values.contains_key(&field)
    }

    /// Iterate over the reported fields
    pub fn fields(&self) -> impl Iterator<Item = (SensorField, f64)> + '_ {
        self.values.iter().map(|(f, v)| (*f, *v))
    }

    /// Parse the timestamp into local time
    ///
    /// Offset-qualified timestamps are converted; naive ones are taken as
    /// local wall-clock time.
    pub fn instant(&self) -> Option<DateTime<Local>> {
        let raw = self.timestamp.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Local));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
    }

    /// `HH:MM:SS` label for charts, empty if the timestamp is unparsable
    pub fn time_label(&self) -> String {
        self.instant()
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

/// Parse a numeric cell, rejecting text and non-finite values
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Decode a sensor value the way the backend and devices may send it
fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

impl From<Map<String, Value>> for Reading {
    fn from(map: Map<String, Value>) -> Self {
        let mut reading = Reading::default();
        for (key, value) in map {
            if key == "timestamp" {
                reading.timestamp = match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
            } else if let Some(field) = SensorField::from_wire_name(&key) {
                reading.set(field, lenient_number(&value));
            } else {
                reading.extra.insert(key, value);
            }
        }
        reading
    }
}

impl From<Reading> for Map<String, Value> {
    fn from(reading: Reading) -> Self {
        let mut map: Map<String, Value> = reading.extra.into_iter().collect();
        map.insert("timestamp".to_string(), Value::String(reading.timestamp));
        for (field, value) in reading.values {
            map.insert(field.wire_name().to_string(), Value::from(value));
        }
        map
    }
}

/// Ordered readings returned by one fetch
///
/// Order is whatever the backend returned; by contract index 0 is the most
/// recent sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingWindow {
    readings: Vec<Reading>,
}

impl ReadingWindow {
    /// Create a window from readings in backend order
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    /// Number of readings
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// The most recent reading
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.first()
    }

    /// Borrow the readings
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Iterate over the readings
    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.readings.iter()
    }
}

impl From<Vec<Reading>> for ReadingWindow {
    fn from(readings: Vec<Reading>) -> Self {
        Self::new(readings)
    }
}

impl<'a> IntoIterator for &'a ReadingWindow {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}
