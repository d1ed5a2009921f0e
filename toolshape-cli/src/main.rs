// toolshape-cli/src/main.rs
mod config;
mod models;
mod rendering;
mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use toolshape_core::{
    parse_any, severity_for, OutputFormat, ParseOptions, RawOutput, ToolKind, ToolshapeConfig,
};
use tracing::{debug, error, info, Level};
use tracing_subscriber::{
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::models::cli::{Cli, Commands, FormatArg};
use crate::runner::RunLimits;

const LOG_FILE_NAME: &str = "toolshape.log";

/// What a command printed and whether the tool it looked at succeeded.
struct Outcome {
    text: String,
    success: bool,
}

fn read_capture(path: Option<&Path>, fallback_stdin: bool) -> Result<String> {
    match path {
        Some(p) => fs::read_to_string(p).with_context(|| format!("Failed to read {:?}", p)),
        None if fallback_stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
        None => Ok(String::new()),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_parse(
    tool: ToolKind,
    stdout: Option<PathBuf>,
    stderr: Option<PathBuf>,
    exit_code: i32,
    elapsed: f64,
    config: &ToolshapeConfig,
    options: &ParseOptions,
    format: OutputFormat,
) -> Result<Outcome> {
    let out = read_capture(stdout.as_deref(), true)?;
    let err = read_capture(stderr.as_deref(), false)?;
    let raw = RawOutput::new(out, err, exit_code)
        .with_elapsed(elapsed)
        .with_limit(config.limits.max_output_bytes);
    let rendered = parse_any(tool, &raw, options)
        .with_context(|| format!("Failed to parse {:?} output", tool))?;
    Ok(Outcome {
        text: rendering::format_rendered(&rendered, format)?,
        success: rendered.success,
    })
}

async fn handle_run(
    tool: ToolKind,
    timeout: Option<u64>,
    args: Vec<String>,
    config: &ToolshapeConfig,
    options: &ParseOptions,
    format: OutputFormat,
) -> Result<Outcome> {
    let working_dir = env::current_dir().context("Failed to get current directory")?;
    let limits = RunLimits {
        timeout: Duration::from_secs(timeout.unwrap_or(config.limits.timeout_secs)),
        max_output_bytes: config.limits.max_output_bytes,
    };
    let raw = runner::run_tool(tool, options, &args, &working_dir, limits).await?;
    let rendered = parse_any(tool, &raw, options)
        .with_context(|| format!("Failed to parse {:?} output", tool))?;
    Ok(Outcome {
        text: rendering::format_rendered(&rendered, format)?,
        success: rendered.success,
    })
}

fn handle_score(descriptor: &str, format: OutputFormat) -> Result<Outcome> {
    let scored = severity_for(descriptor);
    debug!(descriptor, severity = %scored.severity, "Scored descriptor");
    Ok(Outcome {
        text: rendering::format_score(&scored, format)?,
        success: true,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // --- Logging Setup ---
    let default_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let log_dir = dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("toolshape");
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Error:".red(),
            log_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let time_format = time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    );
    let local_timer = LocalTime::new(time_format);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_timer(local_timer.clone());
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(local_timer)
        .with_target(false)
        .with_level(true);

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("{} Failed to initialize logging: {}", "Error:".red(), e);
        return ExitCode::FAILURE;
    }
    info!(
        "Logging initialized (default level {}). Logging to stderr and {}",
        default_level,
        log_dir.join(LOG_FILE_NAME).display()
    );

    // --- Config ---
    let start = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{} Failed to get current directory: {}", "Error:".red(), e);
            return ExitCode::FAILURE;
        }
    };
    let config = match config::load_config(&start) {
        Ok((config, _path)) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            eprintln!("{} {:#}", "Error:".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let format = match cli.format {
        Some(FormatArg::Json) => OutputFormat::Json,
        Some(FormatArg::Human) => OutputFormat::Human,
        None => config.output.format,
    };
    let mut options = config.parse_options();
    options.prefer_full |= cli.full;

    let result = match cli.command {
        Commands::Parse {
            tool,
            stdout,
            stderr,
            exit_code,
            elapsed,
        } => handle_parse(
            tool, stdout, stderr, exit_code, elapsed, &config, &options, format,
        ),
        Commands::Run {
            tool,
            timeout,
            args,
        } => handle_run(tool, timeout, args, &config, &options, format).await,
        Commands::Score { descriptor } => handle_score(&descriptor, format),
    };

    match result {
        Ok(outcome) => {
            println!("{}", outcome.text);
            if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!("Operation failed: {:#}", e);
            eprintln!("{} {:#}", "Error:".red(), e);
            ExitCode::from(2)
        }
    }
}
