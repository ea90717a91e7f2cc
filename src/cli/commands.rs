//! CLI command implementations

use std::path::Path;

use serde_json::Value;

use crate::config::PlannerConfig;
use crate::database::{CatalogSnapshot, MemoryDatabase, TableRef};
use crate::observability::{log_event, Event, Logger, Severity};
use crate::planner::{PairedSide, PlanReport, PlanRequest, TablePlanner};

use super::args::{Command, PlanArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_json_file, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Plan(args) => plan(&args),
    }
}

/// Plan one table and print the report
///
/// Failures are reported both as an error envelope on stdout and as the
/// returned error, so the process exits non-zero.
pub fn plan(args: &PlanArgs) -> CliResult<()> {
    if args.verbose {
        Logger::set_min_severity(Severity::Trace);
    }

    match build_report(args) {
        Ok(report) => write_response(serde_json::to_value(&report)?),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Load inputs and run the planner
pub fn build_report(args: &PlanArgs) -> CliResult<PlanReport> {
    let config = load_config(args.config.as_deref())?;

    let snapshot = CatalogSnapshot::load(&args.catalog)?;
    let db = MemoryDatabase::new(snapshot);

    let mut request = PlanRequest::new(TableRef::new(&args.schema, &args.table));
    if let Some(path) = &args.paired {
        request = request.with_paired(load_paired(path)?);
    }

    let planner = TablePlanner::new(&args.dialect, &db, config)?;
    Ok(planner.plan(&request)?)
}

fn load_config(path: Option<&Path>) -> CliResult<PlannerConfig> {
    let Some(path) = path else {
        return Ok(PlannerConfig::default());
    };

    let config = PlannerConfig::load(path)
        .map_err(|e| CliError::config_error(e.message().to_string()))?;

    let shown = path.display().to_string();
    let fetch_size = config.fetch_size.to_string();
    log_event(
        Event::ConfigLoaded,
        &[("path", shown.as_str()), ("fetch_size", fetch_size.as_str())],
    );

    Ok(config)
}

/// Reads the other side's plan, bare or inside a response envelope
fn load_paired(path: &Path) -> CliResult<PairedSide> {
    let value: Value = read_json_file(path)?;
    let report = match value.get("data") {
        Some(data) if value.get("status").is_some() => data.clone(),
        _ => value,
    };

    match serde_json::from_value::<PlanReport>(report)? {
        PlanReport::Detail(plan) => Ok(plan.paired_side()),
        PlanReport::Basic { .. } => Err(CliError::config_error(
            "Paired plan is a Basic report and carries no key",
        )),
    }
}
