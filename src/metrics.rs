// Per associate, per month FTE and revenue figures.
//
// Everything here is a pure function of the record, the month and the
// resolved holiday set.
use crate::calendar::{count_leave_days_in_window, count_working_days, HolidaySet};
use crate::types::{AssociateRecord, MonthMetric};
use crate::util::{ratio, round2};
use crate::window::{months_of_year, DateWindow, MonthWindow};
use chrono::{Month, NaiveDate};
use std::collections::BTreeSet;

/// Fixed GBP to USD conversion applied to cost to obtain revenue.
pub const GBP_TO_USD: f64 = 1.29;

fn working_days(w: DateWindow, holidays: &HolidaySet) -> u32 {
    count_working_days(w.start, w.end, holidays)
}

fn leave_days(leave: &BTreeSet<NaiveDate>, w: DateWindow, holidays: &HolidaySet) -> u32 {
    count_leave_days_in_window(leave, w.start, w.end, holidays)
}

/// Working days in an unbilled window net of leave taken inside it.
fn unbilled_days(leave: &BTreeSet<NaiveDate>, w: DateWindow, holidays: &HolidaySet) -> u32 {
    if !w.is_active() {
        return 0;
    }
    working_days(w, holidays).saturating_sub(leave_days(leave, w, holidays))
}

pub fn compute_month_metrics(
    record: &AssociateRecord,
    year: i32,
    month: Month,
    holidays: &HolidaySet,
) -> MonthMetric {
    let Some(window) = MonthWindow::resolve(
        record.assignment_start,
        record.billing_start,
        record.billing_end,
        year,
        month,
    ) else {
        return MonthMetric::default();
    };
    metrics_for_window(record, &window, holidays)
}

pub fn metrics_for_window(
    record: &AssociateRecord,
    window: &MonthWindow,
    holidays: &HolidaySet,
) -> MonthMetric {
    if !window.is_assigned() {
        return MonthMetric::default();
    }
    let leave = &record.leave_dates;
    let month = DateWindow::new(window.month_start, window.month_end);
    let month_working_days = working_days(month, holidays);

    let non_billable_leave_days = unbilled_days(leave, window.pre_billing, holidays)
        + unbilled_days(leave, window.post_billing, holidays);

    let billed_days = working_days(window.billing, holidays);
    let actual_billed_days = billed_days.saturating_sub(leave_days(leave, window.billing, holidays));

    // Leave is taken against the whole calendar month while the working-day
    // base is the assignment window. Capped so the two fractions stay a
    // partition of the assignment.
    let total_working_days = working_days(window.assignment, holidays);
    let month_leave = leave_days(leave, month, holidays).min(total_working_days);
    let actual_working_days = total_working_days - month_leave;

    let cost_revenue = round2(record.rate_card * actual_working_days as f64);
    MonthMetric {
        total_working_days,
        leave_days: month_leave,
        actual_working_days,
        billed_days,
        actual_billed_days,
        non_billable_leave_days,
        total_fte: ratio(actual_working_days, total_working_days),
        leave_fte: ratio(month_leave, total_working_days),
        billed_fte: ratio(actual_billed_days, month_working_days),
        non_billable_fte: ratio(non_billable_leave_days, month_working_days),
        cost_revenue,
        total_revenue: round2(cost_revenue * GBP_TO_USD),
    }
}

/// One metric per calendar month of `year`, January first.
pub fn compute_all_months(
    record: &AssociateRecord,
    year: i32,
    holidays: &HolidaySet,
) -> [MonthMetric; 12] {
    let mut out = [MonthMetric::default(); 12];
    for (slot, month) in out.iter_mut().zip(months_of_year()) {
        *slot = compute_month_metrics(record, year, month, holidays);
    }
    out
}
