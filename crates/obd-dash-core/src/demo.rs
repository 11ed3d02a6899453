//! Demo Mode - Simulated telemetry for running the dashboard without a backend
//!
//! Generates realistic drive data: speed and RPM follow slow sine patterns
//! with noise, temperatures and pressures hover around typical values.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, SecondsFormat};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::client::{ClientError, FetchOptions, TelemetrySource};
use crate::reading::{Reading, ReadingWindow, SensorField};

/// Samples per generated window
pub const DEMO_SAMPLES: usize = 50;

/// Spacing between generated samples
pub const DEMO_SPACING_SECS: i64 = 2;

/// Demo telemetry generator
pub struct DemoSimulator {
    /// Random number generator
    rng: StdRng,
}

impl Default for DemoSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoSimulator {
    /// Create a simulator seeded from entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a reproducible simulator
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate one sample
    ///
    /// # Arguments
    /// * `index` - Sample number within the drive
    /// * `timestamp` - Wall-clock time of the sample
    pub fn sample(&mut self, index: usize, timestamp: DateTime<Local>) -> Reading {
        let i = index as f64;
        let run_time = i * DEMO_SPACING_SECS as f64;

        let speed = (40.0 + (i / 5.0).sin() * 30.0 + self.rng.gen_range(0.0..5.0)).max(0.0);
        let rpm = (1500.0 + (i / 4.0).sin() * 800.0 + self.rng.gen_range(0.0..100.0)).max(800.0);
        let throttle = 30.0 + (i / 6.0).sin() * 20.0 + self.rng.gen_range(0.0..5.0);
        let maf = 15.0 + (i / 5.0).sin() * 8.0 + self.rng.gen_range(0.0..2.0);

        // Load roughly tracks throttle opening
        let load = (throttle * 1.2 + self.rng.gen_range(0.0..4.0)).clamp(0.0, 100.0);

        // Ignition advance increases with RPM
        let advance = (10.0 + rpm / 200.0 + 3.0 * (i * 0.7).sin()).clamp(-10.0, 45.0);

        Reading::new(timestamp.to_rfc3339_opts(SecondsFormat::Secs, false))
            .with(SensorField::Speed, speed)
            .with(SensorField::Rpm, rpm)
            .with(SensorField::CoolantTemp, 85.0 + self.rng.gen_range(0.0..5.0))
            .with(SensorField::ThrottlePosition, throttle.clamp(0.0, 100.0))
            .with(SensorField::IntakeManifoldPressure, 35.0 + self.rng.gen_range(0.0..10.0))
            .with(SensorField::IntakeAirTemp, 25.0 + self.rng.gen_range(0.0..3.0))
            .with(SensorField::MafAirFlowRate, maf)
            .with(SensorField::BarometricPressure, 101.0 + self.rng.gen_range(0.0..2.0))
            .with(SensorField::ControlModuleVoltage, 13.8 + 0.2 * (i * 0.5).sin())
            .with(SensorField::EngineLoad, load)
            .with(SensorField::FuelLevel, 62.0 - i * 0.02)
            .with(SensorField::TimingAdvance, advance)
            .with(SensorField::RunTime, run_time)
    }

    /// Generate a full window ending at `now`, most recent sample first
    pub fn window(&mut self, now: DateTime<Local>) -> ReadingWindow {
        let mut readings: Vec<Reading> = (0..DEMO_SAMPLES)
            .map(|index| {
                let offset = (DEMO_SAMPLES - 1 - index) as i64 * DEMO_SPACING_SECS;
                self.sample(index, now - Duration::seconds(offset))
            })
            .collect();
        readings.reverse();
        ReadingWindow::new(readings)
    }
}

/// Telemetry source backed by the simulator
pub struct DemoSource {
    simulator: Mutex<DemoSimulator>,
}

impl DemoSource {
    /// Create a source with a fresh simulator
    pub fn new(simulator: DemoSimulator) -> Self {
        Self {
            simulator: Mutex::new(simulator),
        }
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new(DemoSimulator::new())
    }
}

#[async_trait]
impl TelemetrySource for DemoSource {
    async fn fetch_readings(&self, options: &FetchOptions) -> Result<ReadingWindow, ClientError> {
        let window = self
            .simulator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .window(Local::now());

        let limit = options.limit.map_or(usize::MAX, |l| l as usize);
        let readings = window
            .iter()
            .take(limit)
            .map(|reading| {
                if options.fields.is_empty() {
                    return reading.clone();
                }
                let mut filtered = Reading::new(reading.timestamp.clone());
                for field in &options.fields {
                    filtered.set(*field, reading.get(*field));
                }
                filtered
            })
            .collect();

        Ok(ReadingWindow::new(readings))
    }
}
