use crate::aggregate::DEFAULT_EXCLUDE_MARKER;
use crate::holidays::DEFAULT_DIVISION;
use chrono::{Datelike, Local};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "workforce-report")]
#[command(about = "Monthly FTE, leave and revenue report per contract", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and validate the input files, printing diagnostics
    Check(InputArgs),
    /// Compute the yearly report and write CSV/JSON outputs
    Report {
        #[command(flatten)]
        input: InputArgs,
        /// Directory for the generated files
        #[arg(short, long, env = "WFR_OUT_DIR", default_value = ".")]
        out_dir: PathBuf,
        /// Rows shown per console preview
        #[arg(long, env = "WFR_PREVIEW_ROWS", default_value_t = 5)]
        preview_rows: usize,
    },
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Associate assignment CSV
    #[arg(short, long, env = "WFR_INPUT")]
    pub input: PathBuf,
    /// Optional leave CSV (associate id, leave date per row)
    #[arg(short, long, env = "WFR_LEAVE")]
    pub leave: Option<PathBuf>,
    /// Holiday JSON file; the built-in England & Wales table is used when absent
    #[arg(long, env = "WFR_HOLIDAYS")]
    pub holidays: Option<PathBuf>,
    /// Division to read from a bank-holidays JSON document
    #[arg(long, env = "WFR_DIVISION", default_value = DEFAULT_DIVISION)]
    pub division: String,
    /// Analysis year (defaults to the current year)
    #[arg(short, long, env = "WFR_YEAR")]
    pub year: Option<i32>,
    /// Token marking rows to exclude; empty disables the filter
    #[arg(long, env = "WFR_EXCLUDE_MARKER", default_value = DEFAULT_EXCLUDE_MARKER)]
    pub exclude_marker: String,
}

impl InputArgs {
    pub fn year(&self) -> i32 {
        self.year.unwrap_or_else(|| Local::now().year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_command_parses_with_defaults() {
        let cli = Cli::try_parse_from(["workforce-report", "report", "--input", "associates.csv", "--year", "2025"]).unwrap();
        let Command::Report { input, out_dir, preview_rows } = cli.command else {
            panic!("expected report");
        };
        assert_eq!(input.input, PathBuf::from("associates.csv"));
        assert_eq!(input.year(), 2025);
        assert_eq!(input.division, DEFAULT_DIVISION);
        assert_eq!(input.exclude_marker, DEFAULT_EXCLUDE_MARKER);
        assert!(input.leave.is_none());
        assert_eq!(out_dir, PathBuf::from("."));
        assert_eq!(preview_rows, 5);
    }

    #[test]
    fn check_requires_input() {
        assert!(Cli::try_parse_from(["workforce-report", "check"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
