use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use obd_dash_core::client::{FetchOptions, Session};
use obd_dash_core::demo::{DemoSimulator, DemoSource};

use super::watch::{watch_source, WatchConfig};

pub async fn run(seed: Option<u64>, refresh_secs: u64) -> Result<()> {
    let simulator = match seed {
        Some(seed) => DemoSimulator::with_seed(seed),
        None => DemoSimulator::new(),
    };
    tracing::info!("Demo mode: showing simulated data");

    watch_source(
        Arc::new(DemoSource::new(simulator)),
        Session::authenticated("demo"),
        FetchOptions::default(),
        Duration::from_secs(refresh_secs.max(1)),
        WatchConfig {
            auto_refresh: true,
            ..WatchConfig::default()
        },
    )
    .await
}
