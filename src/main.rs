//! Evaluar CLI
//!
//! Inspect generation metrics configurations before training.
//!
//! # Usage
//!
//! ```bash
//! # Validate config and list the metric keys it publishes
//! evaluar validate metrics.yaml --detailed
//!
//! # Show which epochs compute generation metrics
//! evaluar schedule metrics.yaml --epochs 10 --format json
//! ```

use clap::Parser;
use evaluar::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
