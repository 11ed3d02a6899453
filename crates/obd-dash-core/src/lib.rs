//! # OBD Dash Core Library
//!
//! Client-side logic for the OBD Dash telemetry viewer.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Telemetry readings with optional, leniently decoded sensor fields
//! - Field statistics and chart series formatting
//! - CSV upload parsing and summaries
//! - An HTTP client for the telemetry backend with explicit session handling
//! - A polling dashboard view model
//! - A demo data source
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use obd_dash_core::prelude::*;
//!
//! let config = Config::from_env()?;
//! let session = Session::authenticated(token);
//! let client = TelemetryClient::new(&config, session.clone())?;
//!
//! let dashboard = DashboardViewModel::from_config(Arc::new(client), session, &config);
//! dashboard.start(true).await;
//!
//! if let Screen::Dashboard(view) = dashboard.render() {
//!     println!("{} readings", view.record_count);
//! }
//! ```

pub mod chart;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod demo;
pub mod reading;
pub mod stats;
pub mod upload;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::chart::{build_charts, ChartKind, ChartPanel, ChartSeries};
    pub use crate::client::{
        ClientError, FetchOptions, Session, SessionState, TelemetryClient, TelemetrySource,
    };
    pub use crate::config::Config;
    pub use crate::dashboard::{DashboardView, DashboardViewModel, Screen, ViewState};
    pub use crate::demo::{DemoSimulator, DemoSource};
    pub use crate::reading::{Reading, ReadingWindow, SensorField};
    pub use crate::stats::{compute_stats, has_field, FieldPresence, FieldStats};
    pub use crate::upload::{CsvTable, UploadFile, UploadSummary};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
