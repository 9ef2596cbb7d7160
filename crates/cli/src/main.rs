//! Delivery ETA CLI
//!
//! A command-line tool for predicting delivery times, listing the form
//! options and inspecting the trained model artifact.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{catalog, inspect, predict};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Delivery ETA CLI
#[derive(Parser)]
#[command(name = "eta")]
#[command(author, version, about = "CLI for Delivery ETA predictions", long_about = None)]
pub struct Cli {
    /// Path to the model artifact (can also be set via ETA_MODEL_PATH env var)
    #[arg(long, global = true, env = "ETA_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the delivery time for one order
    Predict(PredictArgs),

    /// List the options for every categorical field
    Options,

    /// List the form fields with defaults and constraints
    Fields,

    /// Show the structure of the model artifact
    Inspect,
}

/// One flag per form field; unset flags keep the form defaults
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Delivery distance in kilometers
    #[arg(long)]
    pub distance_km: Option<String>,

    /// Weather at delivery time (label or value, e.g. "rainy")
    #[arg(long)]
    pub weather: Option<String>,

    /// Traffic level (Low, Medium, High)
    #[arg(long)]
    pub traffic_level: Option<String>,

    /// Time of day (Morning, Afternoon, Evening, Night)
    #[arg(long)]
    pub time_of_day: Option<String>,

    /// Courier vehicle (label or value, e.g. "car")
    #[arg(long)]
    pub vehicle_type: Option<String>,

    /// Order preparation time in minutes
    #[arg(long, allow_negative_numbers = true)]
    pub preparation_time_min: Option<String>,

    /// Courier experience in years
    #[arg(long, allow_negative_numbers = true)]
    pub courier_experience_yrs: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Predict(args) => {
            let model = config::model_path(cli.model, &config::Config::load()?);
            predict::run(&model, &args, cli.format)?;
        }
        Commands::Options => {
            catalog::show_options(cli.format)?;
        }
        Commands::Fields => {
            catalog::show_fields(cli.format)?;
        }
        Commands::Inspect => {
            let model = config::model_path(cli.model, &config::Config::load()?);
            inspect::inspect_model(&model, cli.format)?;
        }
    }

    Ok(())
}
