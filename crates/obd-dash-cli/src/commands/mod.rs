pub mod auth;
pub mod demo;
pub mod upload;
pub mod watch;

use anyhow::{bail, Result};
use obd_dash_core::client::{Session, TelemetryClient};
use obd_dash_core::config::Config;

/// Build a client for commands that need a logged-in session.
pub fn authed_client(config: &Config, token: Option<String>) -> Result<TelemetryClient> {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        bail!("Not logged in. Run `obd-dash login <email>` and set OBD_DASH_TOKEN.");
    };
    Ok(TelemetryClient::new(config, Session::authenticated(token))?)
}
