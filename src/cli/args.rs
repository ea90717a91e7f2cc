//! CLI argument definitions using clap
//!
//! Commands:
//! - chunkplan plan --catalog <path> --dialect <name> --schema <s> --table <t>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// chunkplan - deterministic chunk planning for cross-engine table comparison
#[derive(Parser, Debug)]
#[command(name = "chunkplan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plan the chunks of one table and print the plan as JSON
    Plan(PlanArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Path to planner configuration file; defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to the catalog snapshot describing the database
    #[arg(long)]
    pub catalog: PathBuf,

    /// ORACLE, POSTGRESQL or SQLSERVER
    #[arg(long)]
    pub dialect: String,

    #[arg(long)]
    pub schema: String,

    #[arg(long)]
    pub table: String,

    /// Plan previously produced for the other side of the comparison
    #[arg(long)]
    pub paired: Option<PathBuf>,

    /// Log at TRACE instead of INFO
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_command() {
        let cli = Cli::try_parse_from([
            "chunkplan",
            "plan",
            "--catalog",
            "snapshot.json",
            "--dialect",
            "ORACLE",
            "--schema",
            "HR",
            "--table",
            "EMP",
            "--verbose",
        ])
        .unwrap();

        let Command::Plan(args) = cli.command;
        assert_eq!(args.catalog, PathBuf::from("snapshot.json"));
        assert_eq!(args.dialect, "ORACLE");
        assert!(args.config.is_none());
        assert!(args.paired.is_none());
        assert!(args.verbose);
    }

    #[test]
    fn test_table_is_required() {
        let result = Cli::try_parse_from([
            "chunkplan",
            "plan",
            "--catalog",
            "snapshot.json",
            "--dialect",
            "ORACLE",
            "--schema",
            "HR",
        ]);
        assert!(result.is_err());
    }
}
