//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Evaluar: label alignment and generation metrics for sequence models
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "evaluar")]
#[command(version)]
#[command(about = "Inspect generation metrics configurations for sequence-model training")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Validate a metrics configuration and list the metric keys it publishes
    Validate(ValidateArgs),

    /// Show on which epochs generation metrics would be computed
    Schedule(ScheduleArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML or JSON configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show per-metric input kinds and declared keys
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the schedule command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ScheduleArgs {
    /// Path to YAML or JSON configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Number of training epochs
    #[arg(short, long)]
    pub epochs: usize,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for report commands
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {s}. Valid formats: text, json")),
        }
    }
}

/// Parse arguments, returning clap's error instead of exiting
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
