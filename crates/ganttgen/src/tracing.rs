//! Diagnostics for the ganttgen CLI
//!
//! Logs go to stderr so that stdout carries only command output.

use std::io;
use std::sync::OnceLock;
pub use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Crates whose events `--level` controls.
const TARGETS: [&str; 4] = [
    "ganttgen",
    "ganttgen_core",
    "ganttgen_render",
    "ganttgen_dep_graph",
];

/// How log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TracingFormat {
    /// Multi-line output with targets and source locations
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// One JSON object per event, with the active spans
    Json,
}

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above
    Info,
    /// Show warnings and above (default)
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    /// Output format.
    pub format: TracingFormat,
    /// Minimum level for ganttgen's own crates; `RUST_LOG` takes precedence.
    pub level: Level,
}

impl TracingConfig {
    fn env_filter(self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        EnvFilter::try_from_default_env().or_else(|_| {
            let level = self.level.as_str().to_lowercase();
            let directives: Vec<String> = TARGETS
                .iter()
                .map(|target| format!("{target}={level}"))
                .collect();
            EnvFilter::try_new(directives.join(","))
        })
    }
}

/// Identifier shared by every span of this process
pub fn correlation_id() -> Uuid {
    static ID: OnceLock<Uuid> = OnceLock::new();
    *ID.get_or_init(Uuid::new_v4)
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails when `RUST_LOG` cannot be parsed or a subscriber is already set.
pub fn init_tracing(config: TracingConfig) -> miette::Result<()> {
    let filter = config
        .env_filter()
        .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"))?;
    let registry = tracing_subscriber::registry().with(filter);
    let fmt = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    let installed = match config.format {
        TracingFormat::Pretty => registry.with(fmt.pretty()).try_init(),
        TracingFormat::Compact => registry.with(fmt.compact().with_target(false)).try_init(),
        TracingFormat::Json => registry
            .with(fmt.json().with_current_span(true).with_span_list(true))
            .try_init(),
    };
    installed.map_err(|e| miette::miette!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(
        correlation_id = %correlation_id(),
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "Tracing initialized"
    );
    Ok(())
}

/// Create a span for command execution with structured fields
#[macro_export]
macro_rules! command_span {
    ($command:expr) => {
        tracing::info_span!(
            "command",
            command = %$command,
            correlation_id = %$crate::tracing::correlation_id(),
            start_time = %chrono::Utc::now().to_rfc3339(),
        )
    };
}
