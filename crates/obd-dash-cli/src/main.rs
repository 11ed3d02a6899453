//! CLI for OBD Dash: log in, watch the live dashboard, upload drive logs.

mod commands;
mod render;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use obd_dash_core::client::ClientError;
use obd_dash_core::config::{self, Config, MAX_FETCH_LIMIT};
use obd_dash_core::reading::SensorField;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "obd-dash")]
#[command(about = "obd-dash: live OBD-II telemetry in your terminal")]
#[command(version = obd_dash_core::VERSION)]
struct Cli {
    /// Telemetry backend base URL
    #[arg(long, global = true, env = config::ENV_API_URL)]
    api_url: Option<String>,

    /// Session token from a previous `login`
    #[arg(long, global = true, env = "OBD_DASH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the session token
    Login {
        email: String,

        #[arg(long, env = "OBD_DASH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account
    Register {
        email: String,

        #[arg(long, env = "OBD_DASH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Invalidate the current session token
    Logout,

    /// Show the dashboard, refreshing until Ctrl-C
    Watch(WatchArgs),

    /// Upload CSV or ZIP drive logs
    Upload {
        /// Files to upload (.csv or .zip)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Only print the local summary of each CSV
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete every reading recorded on a day
    Delete {
        /// Day to delete, as DD-MM-YYYY
        #[arg(value_parser = parse_day)]
        date: chrono::NaiveDate,

        /// Skip the confirmation notice
        #[arg(long)]
        yes: bool,
    },

    /// Issue a token for an in-car device
    Token,

    /// List the sensor fields the backend accepts
    Fields,

    /// Run the dashboard on simulated data, no backend needed
    Demo {
        /// Seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,

        /// Refresh period in seconds
        #[arg(long, default_value = "2")]
        refresh_secs: u64,
    },
}

#[derive(Args)]
struct WatchArgs {
    /// Render once and exit instead of auto-refreshing
    #[arg(long)]
    no_auto_refresh: bool,

    /// Rows per fetch
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_FETCH_LIMIT as i64))]
    limit: Option<u32>,

    /// Only show one day, as DD-MM-YYYY
    #[arg(long, value_parser = parse_day)]
    date: Option<chrono::NaiveDate>,

    /// Restrict to these sensor fields (repeatable), e.g. --field speed --field rpm
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<SensorField>,

    /// Refresh period in seconds
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Print frames as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_day(raw: &str) -> Result<chrono::NaiveDate, String> {
    obd_dash_core::client::parse_date(raw).ok_or_else(|| format!("'{}' is not DD-MM-YYYY", raw))
}

fn parse_field(raw: &str) -> Result<SensorField, String> {
    SensorField::from_wire_name(raw)
        .or_else(|| SensorField::from_label(raw))
        .ok_or_else(|| {
            let known: Vec<&str> = SensorField::ALL.iter().map(|f| f.wire_name()).collect();
            format!("unknown field '{}' (expected one of: {})", raw, known.join(", "))
        })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_api_url(url)?;
    }
    let token = cli.token;

    let result = match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&config, &email, &password).await
        }
        Commands::Register { email, password } => {
            commands::auth::register(&config, &email, &password).await
        }
        Commands::Logout => commands::auth::logout(&config, token).await,
        Commands::Watch(args) => {
            if let Some(limit) = args.limit {
                config.fetch_limit = limit;
            }
            if let Some(secs) = args.refresh_secs.filter(|s| *s > 0) {
                config.refresh_interval = std::time::Duration::from_secs(secs);
            }
            commands::watch::run(
                &config,
                token,
                commands::watch::WatchConfig {
                    auto_refresh: !args.no_auto_refresh,
                    date: args.date,
                    fields: args.fields,
                    json: args.json,
                },
            )
            .await
        }
        Commands::Upload { files, dry_run } => {
            commands::upload::run(&config, token, &files, dry_run).await
        }
        Commands::Delete { date, yes } => commands::upload::delete(&config, token, date, yes).await,
        Commands::Token => commands::auth::device_token(&config, token).await,
        Commands::Fields => commands::auth::supported_fields(&config, token).await,
        Commands::Demo { seed, refresh_secs } => commands::demo::run(seed, refresh_secs).await,
    };

    if let Err(e) = &result {
        if e.downcast_ref::<ClientError>()
            .is_some_and(ClientError::is_unauthorized)
        {
            eprintln!("The backend rejected the session token. Run `obd-dash login` again.");
        }
    }
    result
}
