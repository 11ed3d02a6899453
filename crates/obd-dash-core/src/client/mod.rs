//! Telemetry Backend Client
//!
//! HTTP access to the telemetry backend: readings, uploads, deletion and
//! device tokens. Authentication state lives in an explicit [`Session`].
//!
//! ## Usage
//!
//! ```ignore
//! let session = Session::anonymous();
//! let client = TelemetryClient::new(&Config::from_env()?, session.clone())?;
//! client.login("driver@example.com", "hunter22").await?;
//! let window = client.fetch_readings(&FetchOptions::default()).await?;
//! ```

mod error;
mod http;
mod session;

pub use error::ClientError;
pub use http::TelemetryClient;
pub use session::{Session, SessionState, TearDownReason};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_FETCH_LIMIT;
use crate::reading::{ReadingWindow, SensorField};

/// Format used by the backend for calendar-day parameters
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Render a date as `DD-MM-YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `DD-MM-YYYY` date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Filters for a reading fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Restrict to one calendar day
    pub date: Option<NaiveDate>,
    /// Row cap, enforced by the backend
    pub limit: Option<u32>,
    /// Restrict the returned sensor columns; empty means all
    pub fields: Vec<SensorField>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            date: None,
            limit: Some(DEFAULT_FETCH_LIMIT),
            fields: Vec::new(),
        }
    }
}

impl FetchOptions {
    /// Query string pairs; `data_types` repeats once per field
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(date) = self.date {
            pairs.push(("date", format_date(date)));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        for field in &self.fields {
            pairs.push(("data_types", field.wire_name().to_string()));
        }
        pairs
    }
}

/// Source of reading windows for the dashboard
///
/// Implemented by the HTTP client and by the demo simulator.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch one window of readings
    async fn fetch_readings(&self, options: &FetchOptions) -> Result<ReadingWindow, ClientError>;
}

/// One file accepted by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// File name as uploaded
    pub file: String,
    /// Rows stored from this file
    pub rows_processed: u64,
    /// Day the readings were filed under, as `DD-MM-YYYY`
    #[serde(default)]
    pub date: Option<String>,
    /// Columns the backend does not store
    #[serde(default)]
    pub unsupported_fields: Vec<String>,
}

/// One file rejected by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedFile {
    /// File name as uploaded
    pub file: String,
    /// Reasons the file was refused
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Totals across every file of one upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTotals {
    /// Files in the request
    #[serde(default)]
    pub total_files_processed: u64,
    /// Rows stored across all accepted files
    #[serde(default)]
    pub total_rows_processed: u64,
    /// Files accepted
    #[serde(default)]
    pub successful_files: u64,
    /// Files rejected
    #[serde(default)]
    pub failed_files: u64,
}

/// Backend acknowledgment of an upload
///
/// Returned for full success, partial success and for uploads where every
/// file was rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    /// Status line from the backend
    #[serde(default)]
    pub message: String,
    /// Aggregate counts
    #[serde(default)]
    pub summary: UploadTotals,
    /// Accepted files
    #[serde(default)]
    pub success: Vec<UploadedFile>,
    /// Rejected files with their reasons
    #[serde(default)]
    pub errors: Vec<RejectedFile>,
}

impl UploadReport {
    /// True when every file was accepted
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when no file was accepted
    pub fn is_rejected(&self) -> bool {
        self.success.is_empty() && !self.errors.is_empty()
    }
}
