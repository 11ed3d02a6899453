//! CSV Uploads
//!
//! Local parsing of telemetry exports: a summary for immediate feedback and
//! a reading preview, both computed without touching the network.

mod mapping;
mod parser;
mod summary;

pub use mapping::{header_field, readings_from_text, LogLayout};
pub use parser::{CsvRow, CsvTable};
pub use summary::UploadSummary;

use std::path::Path;

use thiserror::Error;

/// Extensions the backend accepts for upload
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["csv", "zip"];

/// Errors raised while reading a local log
#[derive(Error, Debug)]
pub enum CsvError {
    /// No header row; carries the file name
    #[error("File is empty: {0}")]
    Empty(String),

    /// Extension other than `.csv` or `.zip`; carries the file name
    #[error("Unsupported file type: {0} (expected .csv or .zip)")]
    UnsupportedType(String),

    /// Reading the file failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A file queued for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent in the multipart part
    pub name: String,
    /// Raw contents
    pub contents: Vec<u8>,
}

impl UploadFile {
    /// Create an upload from in-memory contents
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Read a file from disk, rejecting types the backend will not take
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CsvError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        if !is_allowed(&name) {
            return Err(CsvError::UnsupportedType(name));
        }

        let contents = std::fs::read(path)?;
        Ok(Self { name, contents })
    }

    /// Whether this is a CSV (as opposed to a ZIP archive)
    pub fn is_csv(&self) -> bool {
        extension(&self.name).as_deref() == Some("csv")
    }

    /// Summarize the file for the upload confirmation
    ///
    /// Tabular exports are summarized from their columns and device logs
    /// from their `name=value` samples. Archives cannot be summarized
    /// locally, so the result is `None` for them.
    pub fn summarize(&self) -> Result<Option<UploadSummary>, CsvError> {
        if !self.is_csv() {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&self.contents);
        match LogLayout::detect(&text) {
            LogLayout::KeyValue => {
                let readings = readings_from_text(&text);
                Ok(Some(UploadSummary::from_readings(&self.name, &readings)))
            }
            LogLayout::Tabular => {
                let table = CsvTable::parse(&text);
                if !table.has_header() {
                    return Err(CsvError::Empty(self.name.clone()));
                }
                Ok(Some(UploadSummary::from_table(&self.name, &table)))
            }
        }
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check a file name against [`ALLOWED_EXTENSIONS`]
pub fn is_allowed(name: &str) -> bool {
    extension(name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}
