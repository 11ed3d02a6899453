use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use obd_dash_core::client::{FetchOptions, Session, TelemetryClient, TelemetrySource};
use obd_dash_core::config::Config;
use obd_dash_core::dashboard::{DashboardViewModel, Screen};
use obd_dash_core::reading::SensorField;
use tracing::info;

use super::authed_client;
use crate::render;

#[derive(Debug, Default)]
pub struct WatchConfig {
    pub auto_refresh: bool,
    pub date: Option<NaiveDate>,
    pub fields: Vec<SensorField>,
    pub json: bool,
}

pub async fn run(config: &Config, token: Option<String>, watch: WatchConfig) -> Result<()> {
    let client: TelemetryClient = authed_client(config, token)?;
    let session = client.session().clone();
    let options = FetchOptions {
        date: watch.date,
        limit: Some(config.fetch_limit),
        fields: watch.fields.clone(),
    };
    info!(api_url = %config.api_url, "Watching telemetry");

    watch_source(
        Arc::new(client),
        session,
        options,
        config.refresh_interval,
        watch,
    )
    .await
}

/// Drive a dashboard until Ctrl-C, printing a frame after every refresh.
pub async fn watch_source(
    source: Arc<dyn TelemetrySource>,
    session: Session,
    options: FetchOptions,
    interval: Duration,
    watch: WatchConfig,
) -> Result<()> {
    let vm = DashboardViewModel::new(source, session.clone(), options, interval);
    let mut revisions = vm.subscribe();
    let mut session_changes = session.subscribe();

    vm.start(watch.auto_refresh).await;
    let _ = revisions.borrow_and_update();
    let _ = session_changes.borrow_and_update();

    loop {
        let screen = vm.render();
        print_frame(&vm, &screen, watch.json)?;

        if screen == Screen::Login {
            vm.shutdown();
            bail!("Session expired. Log in again and update OBD_DASH_TOKEN.");
        }
        if !watch.auto_refresh {
            break;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                break;
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = session_changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    vm.shutdown();
    Ok(())
}

fn print_frame(vm: &DashboardViewModel, screen: &Screen, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(screen)?);
        return Ok(());
    }

    print!("{}", render::frame(screen));
    if let Some(error) = vm.last_error() {
        println!("  last refresh failed: {}", error);
    }
    Ok(())
}
