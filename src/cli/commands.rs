//! CLI command implementations

use serde_json::json;

use super::args::{Cli, Command, OutputFormat, ScheduleArgs, ValidateArgs};
use super::logging::{init_tracing, log, LogLevel};
use crate::config::{load_config, MetricsConfig};
use crate::eval::generative::builtin;
use crate::eval::GenerationScheduler;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);
    init_tracing(log_level);

    match cli.command {
        Command::Validate(args) => run_validate(args, log_level),
        Command::Schedule(args) => run_schedule(args, log_level),
    }
}

/// Format cadence and generation settings as a string
pub fn format_pipeline_info(config: &MetricsConfig) -> String {
    let mut lines = vec![
        format!("  Cadence: {:?}", config.calc_every),
        format!("  Ignore token id: {}", config.ignore_token_id),
        format!("  Missing keys: {:?}", config.missing_keys),
    ];
    if !config.text_gen_kwargs.is_empty() {
        let params: Vec<String> = config
            .text_gen_kwargs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        lines.push(format!("  Generation: {}", params.join(", ")));
    }
    lines.join("\n")
}

/// Format the published metric keys, one line per metric
pub fn format_metric_keys(config: &MetricsConfig, detailed: bool) -> String {
    let mut lines = vec!["  Metrics:".to_string()];
    for (name, entry) in &config.metrics {
        let published: Vec<String> = entry
            .published_names(name)
            .into_iter()
            .map(|(_, published)| published)
            .collect();
        let source = if builtin::lookup(name).is_some() {
            "built-in"
        } else {
            "custom, compute function required"
        };
        lines.push(format!("    {name} ({source}): {}", published.join(", ")));
        if detailed {
            lines.push(format!("      Input: {:?}", entry.resolved_input(name)));
            lines.push(format!("      Declared keys: {}", entry.returns.keys().join(", ")));
            if !entry.compute_kwargs.is_empty() {
                let kwargs = serde_json::to_string(&entry.compute_kwargs).unwrap_or_default();
                lines.push(format!("      Compute kwargs: {kwargs}"));
            }
        }
    }
    lines.join("\n")
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating config: {}", args.config.display()),
    );

    let config = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");
    log(level, LogLevel::Normal, &format_pipeline_info(&config));
    log(
        level,
        LogLevel::Normal,
        &format_metric_keys(&config, args.detailed),
    );
    Ok(())
}

/// Format the per-epoch plan as a string
pub fn format_schedule(plan: &[bool], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => plan
            .iter()
            .enumerate()
            .map(|(i, &compute)| {
                format!(
                    "  Epoch {}: {}",
                    i + 1,
                    if compute { "compute" } else { "skip" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => {
            let epochs: Vec<_> = plan
                .iter()
                .enumerate()
                .map(|(i, &compute)| json!({ "epoch": i + 1, "compute": compute }))
                .collect();
            json!({ "epochs": epochs }).to_string()
        }
    }
}

pub fn run_schedule(args: ScheduleArgs, level: LogLevel) -> Result<(), String> {
    if args.epochs == 0 {
        return Err("--epochs must be at least 1".to_string());
    }
    let config = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    let plan = GenerationScheduler::new(config.calc_every).plan(args.epochs);

    match args.format {
        OutputFormat::Json => println!("{}", format_schedule(&plan, OutputFormat::Json)),
        OutputFormat::Text => {
            log(
                level,
                LogLevel::Normal,
                &format!("Cadence {:?} over {} epochs:", config.calc_every, args.epochs),
            );
            log(level, LogLevel::Normal, &format_schedule(&plan, OutputFormat::Text));
        }
    }
    Ok(())
}
