//! Delivery Estimate CLI - estimates, zones, live rates and location tools.
//!
//! # Usage
//!
//! ```bash
//! # Static estimate for a ZIP
//! delivery-cli estimate --zip 90210 --method express
//!
//! # Estimate with live cart rates (needs SHOPIFY_STORE_URL)
//! delivery-cli estimate --zip 90210 --live
//!
//! # Estimate as of a fixed instant
//! delivery-cli estimate --region TX --at 2024-10-18T16:00:00-04:00
//!
//! # Zone and transit table for a region
//! delivery-cli zone CA
//!
//! # Raw live quotes for a ZIP
//! delivery-cli rates 90210
//!
//! # Resolve, set or clear the stored customer location
//! delivery-cli locate
//! delivery-cli locate --zip 07105
//! delivery-cli locate --clear
//!
//! # Same-day dispatch countdown
//! delivery-cli cutoff
//! ```
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use delivery_estimate::DeliveryConfig;
use delivery_estimate_core::{RegionCode, ShippingMethod};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "delivery-cli")]
#[command(author, version, about = "Delivery estimate tools")]
struct Cli {
    /// File used to persist the customer ZIP and cached location
    #[arg(long, global = true, default_value = ".delivery-location.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a delivery window
    Estimate {
        /// Destination ZIP
        #[arg(short, long, required_unless_present = "region")]
        zip: Option<String>,

        /// Destination region (two-letter code), used when no ZIP is given
        #[arg(short, long, conflicts_with = "zip")]
        region: Option<RegionCode>,

        /// Shipping method (ground, express, overnight, 2day)
        #[arg(short, long, default_value = "ground")]
        method: ShippingMethod,

        /// Instant to estimate from (RFC 3339); defaults to now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,

        /// Use live cart rates when available
        #[arg(long, requires = "zip")]
        live: bool,

        /// Cart total, for free-shipping progress
        #[arg(long)]
        cart_total: Option<Decimal>,
    },
    /// Show the shipping zone for a region
    Zone {
        /// Two-letter region code
        region: RegionCode,
    },
    /// Fetch live carrier quotes for a ZIP
    Rates {
        /// Destination ZIP
        zip: String,
    },
    /// Resolve the customer location
    Locate {
        /// Remember this ZIP as the customer's
        #[arg(short, long, conflicts_with = "clear")]
        zip: Option<String>,

        /// Forget the stored ZIP and cached location
        #[arg(long)]
        clear: bool,
    },
    /// Show the same-day dispatch countdown
    Cutoff {
        /// Instant to check (RFC 3339); defaults to now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
    },
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &DeliveryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "delivery_estimate=info,delivery_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match DeliveryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &DeliveryConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Estimate {
            zip,
            region,
            method,
            at,
            live,
            cart_total,
        } => {
            let request = commands::estimate::EstimateArgs {
                zip,
                region,
                method,
                now: at.unwrap_or_else(Utc::now),
                live,
                cart_total,
            };
            commands::estimate::run(config, request).await?;
        }
        Commands::Zone { region } => commands::estimate::zone(config, region)?,
        Commands::Rates { zip } => commands::rates::run(config, &zip, Utc::now()).await?,
        Commands::Locate { zip, clear } => {
            commands::locate::run(config, &cli.store, zip.as_deref(), clear, Utc::now()).await?;
        }
        Commands::Cutoff { at } => commands::estimate::cutoff(config, at.unwrap_or_else(Utc::now))?,
    }
    Ok(())
}
