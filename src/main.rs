use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod classify;
mod config;
mod error;
mod models;
mod patterns;
mod report;
mod scanner;
mod source;

use config::Thresholds;
use models::{DeviceVitals, RiskTag};
use scanner::Scanner;
use source::Snapshot;

#[derive(Parser)]
#[command(name = "device-health-scanner")]
#[command(about = "Heuristic spam and app-risk scanner for device health reports", long_about = None)]
struct Cli {
    /// JSON file overriding the default scoring thresholds
    #[arg(long, global = true, env = "DEVICE_HEALTH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single SMS-like message
    ClassifyMessage {
        #[arg(long)]
        sender: String,
        #[arg(long)]
        body: String,
    },
    /// Score a single email
    ClassifyEmail {
        #[arg(long)]
        sender: String,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        preview: String,
    },
    /// Show the permission profile for an app risk tag
    AppRisk {
        #[arg(long)]
        label: String,
        #[arg(long)]
        risk: RiskTag,
    },
    /// Build a health report from record files (.csv or .json)
    Report {
        #[arg(long)]
        messages: Option<PathBuf>,
        #[arg(long)]
        emails: Option<PathBuf>,
        #[arg(long)]
        apps: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        connections: u32,
        #[arg(long)]
        battery: Option<u8>,
        #[arg(long)]
        free_storage: Option<u64>,
        #[arg(long)]
        offline: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run the full scan pipeline over a device snapshot
    Scan {
        /// Snapshot JSON; the built-in demo device is used when omitted
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn emit(contents: &str, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
        None => println!("{contents}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "device_health_scanner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let thresholds = Thresholds::load(cli.config.as_deref())?;

    match cli.command {
        Commands::ClassifyMessage { sender, body } => {
            let verdict = classify::classify_message(&sender, &body);
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Commands::ClassifyEmail {
            sender,
            subject,
            preview,
        } => {
            let verdict = classify::classify_email(&sender, &subject, &preview);
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Commands::AppRisk { label, risk } => {
            let profile = classify::classify_app_risk(&label, risk);
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Commands::Report {
            messages,
            emails,
            apps,
            connections,
            battery,
            free_storage,
            offline,
            out,
        } => {
            let messages = match messages {
                Some(path) => source::load_messages(&path)
                    .with_context(|| format!("failed to load messages from {}", path.display()))?,
                None => Vec::new(),
            };
            let emails = match emails {
                Some(path) => source::load_emails(&path)
                    .with_context(|| format!("failed to load emails from {}", path.display()))?,
                None => Vec::new(),
            };
            let apps = match apps {
                Some(path) => source::load_apps(&path)
                    .with_context(|| format!("failed to load apps from {}", path.display()))?,
                None => Vec::new(),
            };
            let vitals = DeviceVitals {
                battery_percent: battery,
                free_storage_bytes: free_storage,
                is_connected: !offline,
            };

            let report =
                report::build_report(&messages, &emails, &apps, connections, vitals, &thresholds);
            emit(&serde_json::to_string_pretty(&report)?, out.as_deref())?;
        }
        Commands::Scan {
            snapshot,
            format,
            out,
        } => {
            let snapshot = match snapshot {
                Some(path) => Snapshot::load(&path)
                    .with_context(|| format!("failed to load snapshot {}", path.display()))?,
                None => Snapshot::sample(),
            };

            let scanner = Scanner::new(snapshot.clone(), snapshot, thresholds);
            let record = scanner
                .scan()
                .await
                .context("Failed to scan device health. Please try again.")?;

            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&record)?,
                OutputFormat::Markdown => report::render_markdown(&record),
            };
            emit(&rendered, out.as_deref())?;
        }
    }

    Ok(())
}
