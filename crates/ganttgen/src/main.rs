//! ganttgen CLI application
//!
//! Schedules a YAML project plan and renders it as an SVG Gantt chart.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use ganttgen::cli::{self, EXIT_OK, exit_code_for, render_error};
use ganttgen::commands;
use ganttgen::tracing::{TracingConfig, init_tracing};

fn main() {
    // Tracing may be unusable during a panic; write straight to stderr.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let tracing_config = TracingConfig {
        format: cli.tracing_format(),
        level: cli.level.into(),
    };
    // Ignore error if tracing already initialized (e.g., in tests)
    let _ = init_tracing(tracing_config);

    let json_mode = cli.json;
    let span = ganttgen::command_span!(cli.command.name());
    let exit_code = span.in_scope(|| match commands::execute(cli.command, json_mode) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            EXIT_OK
        }
        Err(err) => {
            render_error(&err, json_mode);
            exit_code_for(&err)
        }
    });

    std::process::exit(exit_code);
}
