use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tabled::Tabled;

/// Associate row after header synonyms have been resolved onto canonical
/// names. Every field is kept as raw text; coercion happens in the loader.
#[derive(Debug, Default, Deserialize)]
pub struct RawRow {
    #[serde(rename = "AssociateId")]
    pub associate_id: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Contract")]
    pub contract: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "RateCard")]
    pub rate_card: Option<String>,
    #[serde(rename = "AssignmentStart")]
    pub assignment_start: Option<String>,
    #[serde(rename = "BillingStart")]
    pub billing_start: Option<String>,
    #[serde(rename = "BillingEnd")]
    pub billing_end: Option<String>,
    #[serde(rename = "LeaveDates")]
    pub leave_dates: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLeaveRow {
    #[serde(rename = "AssociateId")]
    pub associate_id: Option<String>,
    #[serde(rename = "LeaveDate")]
    pub leave_date: Option<String>,
}

/// One associate's assignment to a contract.
///
/// Absent dates mean "unbounded": the window extends to the month edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociateRecord {
    pub associate_id: String,
    pub name: String,
    pub contract: String,
    pub category: String,
    /// Amount per working day, in [`COST_CURRENCY`].
    pub rate_card: f64,
    pub assignment_start: Option<NaiveDate>,
    pub billing_start: Option<NaiveDate>,
    pub billing_end: Option<NaiveDate>,
    pub leave_dates: BTreeSet<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Gbp,
    Usd,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Gbp => "£",
            Currency::Usd => "$",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Currency of rate cards and `cost_revenue`.
pub const COST_CURRENCY: Currency = Currency::Gbp;
/// Currency of `total_revenue`.
pub const REVENUE_CURRENCY: Currency = Currency::Usd;

/// Per associate, per month figures. Fractions are unrounded; money is in
/// whole cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthMetric {
    pub total_working_days: u32,
    pub leave_days: u32,
    pub actual_working_days: u32,
    /// Working days in the billing window.
    pub billed_days: u32,
    /// `billed_days` net of leave taken inside the billing window.
    pub actual_billed_days: u32,
    pub non_billable_leave_days: u32,
    pub total_fte: f64,
    pub leave_fte: f64,
    pub billed_fte: f64,
    pub non_billable_fte: f64,
    pub cost_revenue: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthAggregate {
    pub month: String,
    /// Headcount of associates on the contract, not a sum of fractions.
    pub total_fte: u32,
    pub billed_fte: f64,
    pub leave_fte: f64,
    pub non_billable_leave_count: u32,
    pub usd: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContractSummary {
    pub contract: String,
    pub sum_rate_card: f64,
    pub months: Vec<MonthAggregate>,
}

/// Unaggregated associate-month line for row-level consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    pub associate_id: String,
    pub name: String,
    pub contract: String,
    pub month: String,
    pub rate_card: f64,
    #[serde(flatten)]
    pub metric: MonthMetric,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BreakdownRow {
    #[serde(rename = "AssociateId")]
    #[tabled(rename = "AssociateId")]
    pub associate_id: String,
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(rename = "Contract")]
    #[tabled(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "WorkingDays")]
    #[tabled(rename = "WorkingDays")]
    pub working_days: u32,
    #[serde(rename = "LeaveDays")]
    #[tabled(rename = "LeaveDays")]
    pub leave_days: u32,
    #[serde(rename = "ActualDays")]
    #[tabled(rename = "ActualDays")]
    pub actual_days: u32,
    #[serde(rename = "BilledDays")]
    #[tabled(rename = "BilledDays")]
    pub billed_days: u32,
    #[serde(rename = "ActualBilledDays")]
    #[tabled(rename = "ActualBilledDays")]
    pub actual_billed_days: u32,
    #[serde(rename = "NonBillableDays")]
    #[tabled(rename = "NonBillableDays")]
    pub non_billable_days: u32,
    #[serde(rename = "TotalFTE")]
    #[tabled(rename = "TotalFTE")]
    pub total_fte: String,
    #[serde(rename = "LeaveFTE")]
    #[tabled(rename = "LeaveFTE")]
    pub leave_fte: String,
    #[serde(rename = "BilledFTE")]
    #[tabled(rename = "BilledFTE")]
    pub billed_fte: String,
    #[serde(rename = "NonBillableFTE")]
    #[tabled(rename = "NonBillableFTE")]
    pub non_billable_fte: String,
    #[serde(rename = "Cost")]
    #[tabled(rename = "Cost", display_with = "crate::output::display_cost")]
    pub cost: f64,
    #[serde(rename = "CostCurrency")]
    #[tabled(skip)]
    pub cost_currency: Currency,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue", display_with = "crate::output::display_revenue")]
    pub revenue: f64,
    #[serde(rename = "RevenueCurrency")]
    #[tabled(skip)]
    pub revenue_currency: Currency,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ContractMonthRow {
    #[serde(rename = "Contract")]
    #[tabled(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Headcount")]
    #[tabled(rename = "Headcount")]
    pub headcount: u32,
    #[serde(rename = "BilledFTE")]
    #[tabled(rename = "BilledFTE")]
    pub billed_fte: String,
    #[serde(rename = "LeaveFTE")]
    #[tabled(rename = "LeaveFTE")]
    pub leave_fte: String,
    #[serde(rename = "NonBillableLeave")]
    #[tabled(rename = "NonBillableLeave")]
    pub non_billable_leave_count: u32,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue", display_with = "crate::output::display_revenue")]
    pub revenue: f64,
    #[serde(rename = "RevenueCurrency")]
    #[tabled(skip)]
    pub revenue_currency: Currency,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub year: i32,
    pub associates: usize,
    pub excluded: usize,
    pub contracts: usize,
    pub holidays: usize,
    pub total_cost: f64,
    pub cost_currency: Currency,
    pub total_revenue: f64,
    pub revenue_currency: Currency,
    pub by_contract: Vec<ContractSummary>,
}
