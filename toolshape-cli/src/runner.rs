// toolshape-cli/src/runner.rs

//! Runs a tool as a subprocess and captures what it printed.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use toolshape_core::{guard_all, ParseOptions, RawOutput, ToolKind};
use tracing::{debug, warn};

/// Exit code reported for a run that was killed on timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Limits applied to one run.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

/// Runs `kind` with its fixed argument prefix followed by `extra_args`.
///
/// Every caller-supplied argument is guarded before the argument list is
/// built, so nothing the caller passes can become a flag.
pub async fn run_tool(
    kind: ToolKind,
    options: &ParseOptions,
    extra_args: &[String],
    working_dir: &Path,
    limits: RunLimits,
) -> Result<RawOutput> {
    guard_all(extra_args, "args").context("Refusing to build the argument list")?;
    let (program, mut argv) = kind.command_prefix(options);
    argv.extend(extra_args.iter().cloned());
    capture(program, argv, working_dir, limits).await
}

/// Runs `program` on a blocking task under a timeout and collects its
/// stdout, stderr and exit status. On timeout the process is killed and
/// the result carries `timed_out` with empty streams.
pub async fn capture(
    program: &str,
    argv: Vec<String>,
    working_dir: &Path,
    limits: RunLimits,
) -> Result<RawOutput> {
    debug!(program, args = ?argv, dir = ?working_dir, "Executing tool");
    let expression = duct::cmd(program, &argv)
        .dir(working_dir)
        .stdout_capture()
        .stderr_capture()
        .unchecked(); // Non-zero exit is data, not an error

    let started = Instant::now();
    let handle = Arc::new(
        expression
            .start()
            .with_context(|| format!("Failed to spawn process: {}", program))?,
    );
    let waiter = Arc::clone(&handle);
    let waited = tokio::time::timeout(
        limits.timeout,
        tokio::task::spawn_blocking(move || waiter.wait().map(|output| output.clone())),
    )
    .await;
    let elapsed = started.elapsed().as_secs_f64();

    let output = match waited {
        Ok(joined) => joined
            .context("Process wait task panicked")?
            .with_context(|| format!("Failed waiting for process: {}", program))?,
        Err(_) => {
            warn!(program, timeout = ?limits.timeout, "Tool timed out; killing it");
            if let Err(e) = handle.kill() {
                warn!(error = %e, "Failed to kill timed-out process");
            }
            return Ok(RawOutput::new("", "", TIMEOUT_EXIT_CODE)
                .with_elapsed(elapsed)
                .with_timed_out(true));
        }
    };

    let exit_code = output
        .status
        .code()
        .unwrap_or_else(|| if output.status.success() { 0 } else { 1 });
    let raw = RawOutput::new(
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code,
    )
    .with_elapsed(elapsed)
    .with_limit(limits.max_output_bytes);
    debug!(
        exit_code,
        stdout_bytes = raw.stdout.len(),
        stderr_bytes = raw.stderr.len(),
        truncated = raw.truncated,
        "Tool finished"
    );
    Ok(raw)
}
