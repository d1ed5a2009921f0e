use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use toolshape_core::ToolKind;

/// toolshape: structured records from developer tool output.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase message verbosity.
    ///
    /// Specify multiple times for more verbose output:
    ///  -v:  INFO level
    ///  -vv: DEBUG level
    ///  -vvv: TRACE level (most verbose)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format. Overrides `[output] format` from Toolshape.toml.
    #[arg(long, value_enum, global = true)]
    pub format: Option<FormatArg>,

    /// Always print the full record, never the compact projection.
    #[arg(long, global = true)]
    pub full: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse output that was already captured.
    Parse {
        #[arg(value_enum)]
        tool: ToolKind,
        /// File holding the tool's stdout. Reads stdin when omitted.
        #[arg(long)]
        stdout: Option<PathBuf>,
        /// File holding the tool's stderr.
        #[arg(long)]
        stderr: Option<PathBuf>,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        exit_code: i32,
        /// Wall-clock seconds the run took.
        #[arg(long, default_value_t = 0.0)]
        elapsed: f64,
    },
    /// Run a tool and parse its output.
    Run {
        #[arg(value_enum)]
        tool: ToolKind,
        /// Overrides `[limits] timeout_secs`.
        #[arg(long)]
        timeout: Option<u64>,
        /// Extra arguments for the tool. None may start with `-`.
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Score a CVSS vector or plain number.
    Score { descriptor: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Json,
    Human,
}
