use crate::calendar::HolidaySet;
use crate::metrics::compute_all_months;
use crate::types::{AssociateRecord, BreakdownEntry, ContractSummary, MonthAggregate, MonthMetric};
use crate::window::{month_label, months_of_year};
use std::collections::HashMap;
use tracing::{debug, info};

pub const DEFAULT_EXCLUDE_MARKER: &str = "RCP";

/// Drops rows whose identity fields carry a marker token, e.g. remote
/// contractors who are reported elsewhere. Matching is per token and
/// case-insensitive, so `RCP` matches `Acme-RCP` but not `RCPT`. A marker
/// with punctuation (`X-RCP`) is split the same way and must appear as a
/// consecutive run of tokens.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    marker: Vec<String>,
}

fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
}

impl ExclusionFilter {
    pub fn new(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        Self {
            marker: tokens(&marker).map(str::to_ascii_lowercase).collect(),
        }
    }

    pub fn is_excluded(&self, record: &AssociateRecord) -> bool {
        if self.marker.is_empty() {
            return false;
        }
        [
            record.associate_id.as_str(),
            record.name.as_str(),
            record.contract.as_str(),
            record.category.as_str(),
        ]
        .iter()
        .any(|field| {
            let field: Vec<&str> = tokens(field).collect();
            field.windows(self.marker.len()).any(|run| {
                run.iter()
                    .zip(&self.marker)
                    .all(|(t, m)| t.eq_ignore_ascii_case(m))
            })
        })
    }

    /// Split into (kept, excluded-count).
    pub fn apply(&self, records: Vec<AssociateRecord>) -> (Vec<AssociateRecord>, usize) {
        let before = records.len();
        let kept: Vec<AssociateRecord> = records.into_iter().filter(|r| !self.is_excluded(r)).collect();
        let excluded = before - kept.len();
        (kept, excluded)
    }
}

/// Group per-associate metrics by contract. `metrics[i]` belongs to
/// `records[i]` and `metrics[i][m]` to `months[m]`. Contracts are returned
/// in name order.
pub fn aggregate_by_contract(
    records: &[AssociateRecord],
    metrics: &[Vec<MonthMetric>],
    months: &[String],
) -> Vec<ContractSummary> {
    let mut map: HashMap<&str, ContractSummary> = HashMap::new();
    for (rec, per_month) in records.iter().zip(metrics) {
        let e = map.entry(rec.contract.as_str()).or_insert_with(|| ContractSummary {
            contract: rec.contract.clone(),
            sum_rate_card: 0.0,
            months: months
                .iter()
                .map(|m| MonthAggregate {
                    month: m.clone(),
                    ..Default::default()
                })
                .collect(),
        });
        e.sum_rate_card += rec.rate_card;
        for (agg, m) in e.months.iter_mut().zip(per_month) {
            agg.total_fte += 1;
            agg.billed_fte += m.billed_fte;
            agg.leave_fte += m.leave_fte;
            agg.usd += m.total_revenue;
            if m.non_billable_leave_days > 0 {
                agg.non_billable_leave_count += 1;
            }
        }
    }
    let mut out: Vec<ContractSummary> = map.into_values().collect();
    out.sort_by(|a, b| a.contract.cmp(&b.contract));
    out
}

/// Flat associate-month list in input order.
pub fn breakdown(
    records: &[AssociateRecord],
    metrics: &[Vec<MonthMetric>],
    months: &[String],
) -> Vec<BreakdownEntry> {
    records
        .iter()
        .zip(metrics)
        .flat_map(|(rec, per_month)| {
            per_month.iter().zip(months).map(move |(m, label)| BreakdownEntry {
                associate_id: rec.associate_id.clone(),
                name: rec.name.clone(),
                contract: rec.contract.clone(),
                month: label.clone(),
                rate_card: rec.rate_card,
                metric: *m,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    pub year: i32,
    pub months: Vec<String>,
    pub excluded: usize,
    pub records: Vec<AssociateRecord>,
    pub summaries: Vec<ContractSummary>,
    pub breakdown: Vec<BreakdownEntry>,
}

/// Filter, compute every month of `year` for each kept record, then
/// aggregate. Excluded rows never reach the calculator.
pub fn run_batch(
    records: Vec<AssociateRecord>,
    year: i32,
    holidays: &HolidaySet,
    filter: &ExclusionFilter,
) -> BatchOutput {
    let (records, excluded) = filter.apply(records);
    if excluded > 0 {
        info!(excluded, "excluded rows by marker");
    }

    let months: Vec<String> = months_of_year().map(|m| month_label(m).to_string()).collect();
    let metrics: Vec<Vec<MonthMetric>> = records
        .iter()
        .map(|r| compute_all_months(r, year, holidays).to_vec())
        .collect();

    let summaries = aggregate_by_contract(&records, &metrics, &months);
    let rows = breakdown(&records, &metrics, &months);
    debug!(
        year,
        associates = records.len(),
        contracts = summaries.len(),
        rows = rows.len(),
        "computed batch"
    );

    BatchOutput {
        year,
        months,
        excluded,
        records,
        summaries,
        breakdown: rows,
    }
}
