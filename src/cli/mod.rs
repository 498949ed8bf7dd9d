//! CLI module for evaluar
//!
//! This module contains the argument types and command handlers.

mod args;
mod commands;
mod logging;

pub use args::{parse_args, Cli, Command, OutputFormat, ScheduleArgs, ValidateArgs};
pub use commands::run_command;
pub use logging::{init_tracing, LogLevel};
