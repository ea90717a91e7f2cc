//! CLI module for chunkplan
//!
//! Provides command-line interface for:
//! - plan: Plan the chunks of one table against a catalog snapshot

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, PlanArgs};
pub use commands::{build_report, plan, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_json_file, write_error, write_response};
