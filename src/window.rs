// Clamps an associate's assignment and billing dates to one calendar month.
use chrono::{Duration, Month, NaiveDate};

/// Inclusive date interval. Empty when `end < start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Zero-length window anchored at `at`. At chrono's first representable
    /// day there is no predecessor, so the window starts a day later instead.
    pub fn empty_at(at: NaiveDate) -> Self {
        match at.pred_opt() {
            Some(end) => Self { start: at, end },
            None => Self {
                start: at.succ_opt().unwrap_or(at),
                end: at,
            },
        }
    }

    pub fn is_active(&self) -> bool {
        self.end >= self.start
    }
}

/// The four windows of one associate-month, all inside
/// `[month_start, month_end]` or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    pub assignment: DateWindow,
    pub billing: DateWindow,
    pub pre_billing: DateWindow,
    pub post_billing: DateWindow,
}

pub fn month_bounds(year: i32, month: Month) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month.number_from_month(), 1)?;
    let next = match month {
        Month::December => NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
        _ => NaiveDate::from_ymd_opt(year, month.succ().number_from_month(), 1)?,
    };
    Some((start, next.pred_opt()?))
}

impl MonthWindow {
    /// Resolve the windows for `month` of `year`. Returns `None` only when
    /// the month itself is outside chrono's representable range.
    ///
    /// The assignment has no end date of its own: it runs until the billing
    /// end, or through the month when billing is open-ended.
    pub fn resolve(
        assignment_start: Option<NaiveDate>,
        billing_start: Option<NaiveDate>,
        billing_end: Option<NaiveDate>,
        year: i32,
        month: Month,
    ) -> Option<Self> {
        let (month_start, month_end) = month_bounds(year, month)?;
        let clamp_start = |d: Option<NaiveDate>| d.unwrap_or(month_start).max(month_start);
        let clamp_end = |d: Option<NaiveDate>| d.unwrap_or(month_end).min(month_end);

        let assignment = DateWindow::new(clamp_start(assignment_start), clamp_end(billing_end));
        let billing = DateWindow::new(clamp_start(billing_start), clamp_end(billing_end));

        // Unassigned-but-present days before billing begins. When billing
        // already started by the assignment start the window collapses at
        // that point instead of spanning the month.
        let pre_billing = if billing.start > assignment.start {
            DateWindow::new(
                assignment.start,
                (billing.start - Duration::days(1)).min(month_end),
            )
        } else {
            DateWindow::empty_at(assignment.start.min(month_end))
        };

        let post_billing = if billing.end < assignment.end {
            DateWindow::new(
                (billing.end + Duration::days(1)).max(month_start),
                assignment.end,
            )
        } else {
            DateWindow::empty_at(assignment.end.max(month_start))
        };

        Some(Self {
            month_start,
            month_end,
            assignment,
            billing,
            pre_billing,
            post_billing,
        })
    }

    pub fn is_assigned(&self) -> bool {
        self.assignment.is_active()
    }
}

/// Months in calendar order, January first.
pub fn months_of_year() -> impl Iterator<Item = Month> {
    (1u8..=12).filter_map(|n| Month::try_from(n).ok())
}

pub fn month_label(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_contained(w: &MonthWindow) {
        for win in [w.assignment, w.billing, w.pre_billing, w.post_billing] {
            if win.is_active() {
                assert!(win.start >= w.month_start && win.end <= w.month_end, "{win:?}");
            }
        }
    }

    #[test]
    fn month_bounds_handle_leap_and_december() {
        assert_eq!(
            month_bounds(2024, Month::February),
            Some((ymd(2024, 2, 1), ymd(2024, 2, 29)))
        );
        assert_eq!(
            month_bounds(2025, Month::December),
            Some((ymd(2025, 12, 1), ymd(2025, 12, 31)))
        );
    }

    #[test]
    fn open_ended_dates_span_the_month() {
        let w = MonthWindow::resolve(None, None, None, 2025, Month::January).unwrap();
        assert_eq!(w.assignment, DateWindow::new(ymd(2025, 1, 1), ymd(2025, 1, 31)));
        assert_eq!(w.billing, w.assignment);
        assert!(!w.pre_billing.is_active());
        assert!(!w.post_billing.is_active());
    }

    #[test]
    fn billing_starting_mid_month_opens_pre_window() {
        let w = MonthWindow::resolve(
            Some(ymd(2025, 1, 6)),
            Some(ymd(2025, 1, 20)),
            None,
            2025,
            Month::January,
        )
        .unwrap();
        assert_eq!(w.pre_billing, DateWindow::new(ymd(2025, 1, 6), ymd(2025, 1, 19)));
        assert_eq!(w.billing, DateWindow::new(ymd(2025, 1, 20), ymd(2025, 1, 31)));
        assert!(!w.post_billing.is_active());
        assert_contained(&w);
    }

    #[test]
    fn billing_before_assignment_leaves_pre_window_empty() {
        let w = MonthWindow::resolve(
            Some(ymd(2025, 1, 15)),
            Some(ymd(2024, 11, 1)),
            None,
            2025,
            Month::January,
        )
        .unwrap();
        assert_eq!(w.assignment.start, ymd(2025, 1, 15));
        assert_eq!(w.billing.start, ymd(2025, 1, 1));
        assert!(!w.pre_billing.is_active());
        assert_eq!(w.pre_billing.start, ymd(2025, 1, 15));
    }

    #[test]
    fn billing_end_is_assignment_end() {
        let w = MonthWindow::resolve(None, None, Some(ymd(2025, 3, 14)), 2025, Month::March).unwrap();
        assert_eq!(w.assignment.end, ymd(2025, 3, 14));
        assert_eq!(w.billing.end, ymd(2025, 3, 14));
        assert!(!w.post_billing.is_active());
    }

    #[test]
    fn assignment_after_month_is_inverted() {
        let w = MonthWindow::resolve(Some(ymd(2025, 4, 1)), None, None, 2025, Month::March).unwrap();
        assert!(!w.is_assigned());
        assert!(!w.pre_billing.is_active());
        assert_contained(&w);
    }

    #[test]
    fn billing_ended_before_month_is_inverted() {
        let w = MonthWindow::resolve(None, None, Some(ymd(2025, 2, 28)), 2025, Month::March).unwrap();
        assert!(!w.is_assigned());
        assert!(!w.billing.is_active());
        assert!(!w.post_billing.is_active());
    }

    #[test]
    fn windows_stay_inside_month_across_edge_inputs() {
        let dates = [
            None,
            Some(ymd(2024, 12, 15)),
            Some(ymd(2025, 6, 1)),
            Some(ymd(2025, 6, 17)),
            Some(ymd(2025, 6, 30)),
            Some(ymd(2025, 7, 3)),
        ];
        for a in dates {
            for bs in dates {
                for be in dates {
                    let w = MonthWindow::resolve(a, bs, be, 2025, Month::June).unwrap();
                    assert_contained(&w);
                }
            }
        }
    }

    #[test]
    fn earliest_representable_month_resolves() {
        let year = NaiveDate::MIN.year();
        let w = MonthWindow::resolve(None, None, None, year, Month::January).unwrap();
        assert_eq!(w.month_start, NaiveDate::MIN);
        assert!(w.is_assigned());
        assert!(!w.pre_billing.is_active());
        assert!(!DateWindow::empty_at(NaiveDate::MIN).is_active());
    }

    #[test]
    fn months_iterate_in_order() {
        let labels: Vec<&str> = months_of_year().map(month_label).collect();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "Jan");
        assert_eq!(labels[11], "Dec");
    }
}
