// Presentation boundary: the only place amounts meet currency symbols.
use crate::aggregate::BatchOutput;
use crate::error::Result;
use crate::types::{
    BreakdownEntry, BreakdownRow, ContractMonthRow, ContractSummary, Currency, RunSummary,
    COST_CURRENCY, REVENUE_CURRENCY,
};
use crate::util::{format_int, format_number, round2};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

pub fn format_money(amount: f64, currency: Currency) -> String {
    format!("{}{}", currency.symbol(), format_number(amount, 2))
}

pub fn display_cost(amount: &f64) -> String {
    format_money(*amount, COST_CURRENCY)
}

pub fn display_revenue(amount: &f64) -> String {
    format_money(*amount, REVENUE_CURRENCY)
}

fn fte(n: f64) -> String {
    format!("{:.2}", n)
}

pub fn breakdown_rows(entries: &[BreakdownEntry]) -> Vec<BreakdownRow> {
    entries
        .iter()
        .map(|e| BreakdownRow {
            associate_id: e.associate_id.clone(),
            name: e.name.clone(),
            contract: e.contract.clone(),
            month: e.month.clone(),
            working_days: e.metric.total_working_days,
            leave_days: e.metric.leave_days,
            actual_days: e.metric.actual_working_days,
            billed_days: e.metric.billed_days,
            actual_billed_days: e.metric.actual_billed_days,
            non_billable_days: e.metric.non_billable_leave_days,
            total_fte: fte(e.metric.total_fte),
            leave_fte: fte(e.metric.leave_fte),
            billed_fte: fte(e.metric.billed_fte),
            non_billable_fte: fte(e.metric.non_billable_fte),
            cost: e.metric.cost_revenue,
            cost_currency: COST_CURRENCY,
            revenue: e.metric.total_revenue,
            revenue_currency: REVENUE_CURRENCY,
        })
        .collect()
}

pub fn contract_rows(summaries: &[ContractSummary]) -> Vec<ContractMonthRow> {
    summaries
        .iter()
        .flat_map(|s| {
            s.months.iter().map(move |m| ContractMonthRow {
                contract: s.contract.clone(),
                month: m.month.clone(),
                headcount: m.total_fte,
                billed_fte: fte(m.billed_fte),
                leave_fte: fte(m.leave_fte),
                non_billable_leave_count: m.non_billable_leave_count,
                revenue: round2(m.usd),
                revenue_currency: REVENUE_CURRENCY,
            })
        })
        .collect()
}

pub fn run_summary(batch: &BatchOutput, holidays: usize) -> RunSummary {
    let total_cost: f64 = batch.breakdown.iter().map(|b| b.metric.cost_revenue).sum();
    let total_revenue: f64 = batch.breakdown.iter().map(|b| b.metric.total_revenue).sum();
    RunSummary {
        year: batch.year,
        associates: batch.records.len(),
        excluded: batch.excluded,
        contracts: batch.summaries.len(),
        holidays,
        total_cost: round2(total_cost),
        cost_currency: COST_CURRENCY,
        total_revenue: round2(total_revenue),
        revenue_currency: REVENUE_CURRENCY,
        by_contract: batch.summaries.clone(),
    }
}

/// Serialise `rows` under a header derived from `T`. Returns the number
/// of data rows written.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
    rows.iter().try_for_each(|r| wtr.serialize(r))?;
    wtr.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "csv written");
    Ok(rows.len())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.flush()?;
    debug!(path = %path.display(), "json written");
    Ok(())
}

/// Markdown table of the first `max_rows` rows, with a note when the
/// preview is truncated.
pub fn preview_markdown<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled,
{
    if rows.is_empty() || max_rows == 0 {
        return "(no rows)".to_string();
    }
    let shown = &rows[..rows.len().min(max_rows)];
    let mut table = Table::new(shown).with(Style::markdown()).to_string();
    if shown.len() < rows.len() {
        table.push_str(&format!(
            "\n(showing {} of {} rows)",
            format_int(shown.len()),
            format_int(rows.len())
        ));
    }
    table
}
