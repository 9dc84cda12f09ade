// Working-day arithmetic over calendar dates.
//
// All inputs are `NaiveDate`s: calendar days with no time-of-day or zone, so
// two timestamps on the same UTC day always compare equal here.
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{BTreeSet, HashSet};

/// Resolved public holidays for one jurisdiction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: HashSet<NaiveDate>,
}

impl HolidaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ISO `YYYY-MM-DD` strings. Strings that are not valid ISO
    /// dates are skipped.
    pub fn from_iso<I, S>(dates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        dates
            .into_iter()
            .filter_map(|s| NaiveDate::parse_from_str(s.as_ref().trim(), "%Y-%m-%d").ok())
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    /// Dates of this set falling in `year`.
    pub fn iter_year(&self, year: i32) -> impl Iterator<Item = NaiveDate> + '_ {
        self.iter().filter(move |d| d.year() == year)
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_working_day(date: NaiveDate, holidays: &HolidaySet) -> bool {
    !is_weekend(date) && !holidays.contains(date)
}

/// Number of working days in `[start, end]`, or 0 when `end < start`.
pub fn count_working_days(start: NaiveDate, end: NaiveDate, holidays: &HolidaySet) -> u32 {
    if end < start {
        return 0;
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_working_day(*d, holidays))
        .count() as u32
}

/// Distinct leave days inside `[start, end]` that would otherwise have been
/// worked. Leave on weekends or holidays is not counted.
pub fn count_leave_days_in_window(
    leave: &BTreeSet<NaiveDate>,
    start: NaiveDate,
    end: NaiveDate,
    holidays: &HolidaySet,
) -> u32 {
    // BTreeSet::range panics on an inverted range.
    if end < start {
        return 0;
    }
    leave
        .range(start..=end)
        .filter(|d| is_working_day(**d, holidays))
        .count() as u32
}
