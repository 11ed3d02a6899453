use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use obd_dash_core::client::format_date;
use obd_dash_core::config::Config;
use obd_dash_core::upload::{UploadFile, UploadSummary};

use super::authed_client;

pub async fn run(
    config: &Config,
    token: Option<String>,
    paths: &[PathBuf],
    dry_run: bool,
) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = UploadFile::from_path(path)
            .with_context(|| format!("Cannot upload {}", path.display()))?;

        match file.summarize() {
            Ok(Some(summary)) => print_summary(&summary),
            Ok(None) => println!("{}: archive, summarized by the backend", file.name),
            Err(e) => println!("{}: {}", file.name, e),
        }
        files.push(file);
    }

    if dry_run {
        return Ok(());
    }

    let client = authed_client(config, token)?;
    let report = client.upload_readings(files).await?;

    println!();
    for accepted in &report.success {
        let date = accepted.date.as_deref().unwrap_or("unknown date");
        println!(
            "  ok      {} ({} rows, {})",
            accepted.file, accepted.rows_processed, date
        );
        if !accepted.unsupported_fields.is_empty() {
            println!(
                "          ignored columns: {}",
                accepted.unsupported_fields.join(", ")
            );
        }
    }
    for rejected in &report.errors {
        println!("  failed  {}: {}", rejected.file, rejected.errors.join("; "));
    }
    let totals = &report.summary;
    println!(
        "{} rows from {} files ({} accepted, {} rejected)",
        totals.total_rows_processed,
        totals.total_files_processed,
        totals.successful_files,
        totals.failed_files
    );

    if report.is_rejected() {
        bail!("The backend rejected every file");
    }
    if !report.is_complete() {
        bail!("{} file(s) were rejected", report.errors.len());
    }
    Ok(())
}

fn print_summary(summary: &UploadSummary) {
    println!("{}", summary.file_name);
    println!("  records     {}", summary.record_count);
    println!(
        "  speed       avg {:.1} / max {:.1} km/h",
        summary.avg_speed, summary.max_speed
    );
    println!(
        "  rpm         avg {:.0} / max {:.0}",
        summary.avg_rpm, summary.max_rpm
    );
    println!("  coolant     avg {:.1} °C", summary.avg_temp);
}

pub async fn delete(
    config: &Config,
    token: Option<String>,
    date: NaiveDate,
    yes: bool,
) -> Result<()> {
    let day = format_date(date);
    if !yes {
        bail!(
            "This deletes every reading from {}. Re-run with --yes to confirm.",
            day
        );
    }

    let client = authed_client(config, token)?;
    let deleted = client.delete_readings_for_date(date).await?;
    println!("Deleted {} readings from {}", deleted, day);
    Ok(())
}
