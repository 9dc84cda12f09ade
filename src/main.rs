// Entry point and high-level CLI flow.
//
// - `check` loads and cleans the input files, printing diagnostics.
// - `report` runs the yearly calculation and writes the breakdown, the
//   contract summary and a JSON roll-up, previewing each on the console.
mod aggregate;
mod calendar;
mod config;
mod error;
mod holidays;
mod loader;
mod metrics;
mod output;
mod types;
mod util;
mod window;

use anyhow::Context;
use calendar::HolidaySet;
use clap::Parser;
use config::{Cli, Command, InputArgs};
use holidays::{FileHolidays, HolidayCache, HolidaySource, StaticHolidays};
use loader::LoadReport;
use tracing::info;
use types::AssociateRecord;

/// Either the user's holiday file or the built-in table.
enum Holidays {
    File(FileHolidays),
    Static(StaticHolidays),
}

impl HolidaySource for Holidays {
    fn fetch(&self, year: i32) -> error::Result<HolidaySet> {
        match self {
            Holidays::File(f) => f.fetch(year),
            Holidays::Static(s) => s.fetch(year),
        }
    }
}

fn holiday_cache(args: &InputArgs) -> HolidayCache<Holidays> {
    let source = match &args.holidays {
        Some(path) => Holidays::File(FileHolidays::new(path, args.division.clone())),
        None => Holidays::Static(StaticHolidays),
    };
    HolidayCache::new(source)
}

/// Load associates and merge the optional leave file.
fn load(args: &InputArgs) -> anyhow::Result<(Vec<AssociateRecord>, LoadReport)> {
    let (mut records, mut report) = loader::load_associates(&args.input)
        .with_context(|| format!("loading associates from {}", args.input.display()))?;
    if let Some(path) = &args.leave {
        let book = loader::load_leave(path, &mut report)
            .with_context(|| format!("loading leave from {}", path.display()))?;
        loader::merge_leave(&mut records, &book, &mut report);
    }
    Ok((records, report))
}

fn print_load_report(records: &[AssociateRecord], report: &LoadReport) {
    println!(
        "Processing dataset... ({} rows read, {} associates loaded)",
        util::format_int(report.total_rows),
        util::format_int(records.len())
    );
    if report.malformed_rows > 0 {
        println!(
            "Note: {} rows skipped as malformed.",
            util::format_int(report.malformed_rows)
        );
    }
    if report.unparseable_dates > 0 {
        println!(
            "Note: {} unparseable dates treated as open-ended.",
            util::format_int(report.unparseable_dates)
        );
    }
    if report.synthesized_ids > 0 {
        println!(
            "Info: {} rows had no associate id and were numbered.",
            util::format_int(report.synthesized_ids)
        );
    }
    if report.leave_entries > 0 {
        println!(
            "Info: {} leave entries merged ({} ids without an associate).",
            util::format_int(report.leave_entries),
            util::format_int(report.unmatched_leave)
        );
    }
    println!();
}

fn handle_check(args: &InputArgs) -> anyhow::Result<()> {
    let (records, report) = load(args)?;
    print_load_report(&records, &report);

    let year = args.year();
    let mut cache = holiday_cache(args);
    let holidays = cache.holidays_for(year);
    if holidays.is_empty() {
        println!("Holidays for {}: none, counting weekends only", year);
    } else {
        println!("Holidays for {}: {}", year, holidays.len());
    }

    let filter = aggregate::ExclusionFilter::new(args.exclude_marker.as_str());
    let excluded = records.iter().filter(|r| filter.is_excluded(r)).count();
    println!(
        "Rows matching exclusion marker '{}': {}\n",
        args.exclude_marker,
        util::format_int(excluded)
    );
    Ok(())
}

fn handle_report(args: &InputArgs, out_dir: &std::path::Path, preview_rows: usize) -> anyhow::Result<()> {
    let (records, report) = load(args)?;
    print_load_report(&records, &report);

    let year = args.year();
    let mut cache = holiday_cache(args);
    let holidays = cache.holidays_for(year);
    info!(year, holidays = holidays.len(), "holidays resolved");

    let filter = aggregate::ExclusionFilter::new(args.exclude_marker.as_str());
    let batch = aggregate::run_batch(records, year, holidays, &filter);

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    println!("Generating reports...\n");

    let breakdown = output::breakdown_rows(&batch.breakdown);
    let file1 = out_dir.join("fte_breakdown.csv");
    output::write_csv(&file1, &breakdown).with_context(|| format!("writing {}", file1.display()))?;
    println!("Report 1: Associate Monthly FTE Breakdown");
    println!("({} associates, {})\n", util::format_int(batch.records.len()), year);
    println!("{}\n", output::preview_markdown(&breakdown, preview_rows));
    println!("(Full table exported to {})\n", file1.display());

    let contracts = output::contract_rows(&batch.summaries);
    let file2 = out_dir.join("contract_summary.csv");
    output::write_csv(&file2, &contracts).with_context(|| format!("writing {}", file2.display()))?;
    println!("Report 2: Contract Monthly Summary");
    println!("(Grouped by Contract and Month)\n");
    println!("{}\n", output::preview_markdown(&contracts, preview_rows));
    println!("(Full table exported to {})\n", file2.display());

    let summary = output::run_summary(&batch, holidays.len());
    let file3 = out_dir.join("summary.json");
    output::write_json(&file3, &summary).with_context(|| format!("writing {}", file3.display()))?;
    println!("Summary Stats ({}):", file3.display());
    println!(
        "{{\"total_cost\": \"{}\", \"total_revenue\": \"{}\", \"excluded\": {}}}\n",
        output::format_money(summary.total_cost, summary.cost_currency),
        output::format_money(summary.total_revenue, summary.revenue_currency),
        summary.excluded
    );
    info!(
        contracts = summary.contracts,
        associates = summary.associates,
        out_dir = %out_dir.display(),
        "reports written"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check(args) => handle_check(&args),
        Command::Report {
            input,
            out_dir,
            preview_rows,
        } => handle_report(&input, &out_dir, preview_rows),
    }
}
