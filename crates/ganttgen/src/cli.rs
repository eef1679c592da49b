use crate::tracing::{LogLevel, TracingFormat};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ganttgen_core::SchedulerConfig;
use ganttgen_render::RenderError;
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Unexpected failure exit code (I/O, rendering, internal errors)
pub const EXIT_OTHER: i32 = 1;
/// Invalid plan or invalid arguments exit code
pub const EXIT_PLAN: i32 = 2;

/// Default location of the rendered chart.
pub const DEFAULT_OUTPUT: &str = "output/gantt_chart.svg";

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// The plan failed validation or scheduling (exit code 2)
    #[error("Invalid plan: {message}")]
    #[diagnostic(code(ganttgen::cli::plan))]
    Plan {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Arguments are inconsistent (exit code 2)
    #[error("Invalid arguments: {message}")]
    #[diagnostic(code(ganttgen::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 1)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(ganttgen::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new plan error
    #[must_use]
    pub fn plan(message: impl Into<String>) -> Self {
        Self::Plan {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }
}

/// Convert `ganttgen_core::Error` to the matching `CliError` variant.
///
/// Validation, scheduling and manifest errors are the user's to fix and map
/// to `Plan`; read failures and broken internal invariants map to `Other`.
impl From<ganttgen_core::Error> for CliError {
    fn from(err: ganttgen_core::Error) -> Self {
        let help = err.help().map(|h| h.to_string());
        let message = err.to_string();
        if err.is_user_error() {
            Self::Plan { message, help }
        } else {
            Self::Other { message, help }
        }
    }
}

impl From<RenderError> for CliError {
    fn from(err: RenderError) -> Self {
        let help = err.help().map(|h| h.to_string());
        let message = err.to_string();
        match err {
            RenderError::InvalidWindow { .. } => Self::Config { message, help },
            RenderError::NoRows | RenderError::NoDates | RenderError::Io { .. } => {
                Self::Other { message, help }
            }
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Plan { .. } | CliError::Config { .. } => EXIT_PLAN,
        CliError::Other { .. } => EXIT_OTHER,
    }
}

/// Render error appropriately based on JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": match err {
                CliError::Plan { .. } => "plan",
                CliError::Config { .. } => "config",
                CliError::Other { .. } => "other",
            },
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Main CLI entry point for ganttgen.
///
/// Schedules project plans and renders them as Gantt charts.
#[derive(Parser, Debug)]
#[command(name = "ganttgen")]
#[command(about = "Schedule project plans and render them as Gantt charts")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log line format.
    #[arg(long, global = true, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,

    /// Emit JSON envelopes and JSON logs.
    #[arg(long, global = true, help = "Emit JSON envelope instead of text")]
    pub json: bool,
}

impl Cli {
    /// Log format to install; `--json` always logs JSON.
    #[must_use]
    pub const fn tracing_format(&self) -> TracingFormat {
        if self.json {
            TracingFormat::Json
        } else {
            self.log_format
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Schedule a plan and write it as an SVG chart
    Render(RenderArgs),
    /// Validate and schedule a plan, then print a summary
    Check {
        /// Plan manifest (YAML)
        plan: PathBuf,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    /// Print the scheduled rows as JSON
    Rows {
        /// Plan manifest (YAML)
        plan: PathBuf,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
}

impl Commands {
    /// Subcommand name, for spans.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Render(_) => "render",
            Self::Check { .. } => "check",
            Self::Rows { .. } => "rows",
        }
    }
}

/// Scheduling flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleArgs {
    /// Anchor date for items with no date and no dependencies
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start_date: Option<NaiveDate>,

    /// Allow depends_on to name milestones
    #[arg(long)]
    pub allow_milestone_deps: bool,
}

impl ScheduleArgs {
    /// Scheduler overrides for these flags.
    #[must_use]
    pub const fn to_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            default_start: self.start_date,
            allow_milestone_dependencies: self.allow_milestone_deps,
        }
    }
}

/// Arguments of `ganttgen render`.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Plan manifest (YAML)
    pub plan: PathBuf,

    /// Where to write the SVG
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub out: PathBuf,

    /// First date shown on the chart
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub min_date: Option<NaiveDate>,

    /// Last date shown on the chart
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub max_date: Option<NaiveDate>,

    /// Copyright year in the footer
    #[arg(long)]
    pub year: Option<i32>,

    #[command(flatten)]
    pub schedule: ScheduleArgs,

    /// Open the chart once written (default)
    #[arg(long, overrides_with = "no_view")]
    pub view: bool,

    /// Do not open the chart
    #[arg(long, env = "GANTTGEN_NO_VIEW", overrides_with = "view")]
    pub no_view: bool,
}

impl RenderArgs {
    /// Whether to open the chart after writing it.
    #[must_use]
    pub const fn should_view(&self) -> bool {
        !self.no_view
    }
}

/// Parse command line arguments into a CLI structure.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
