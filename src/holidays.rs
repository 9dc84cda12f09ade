// Holiday lists resolved once per year, ahead of the calculation.
use crate::calendar::HolidaySet;
use crate::error::{ReportError, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const DEFAULT_DIVISION: &str = "england-and-wales";

/// Anything that can produce the public holidays of a calendar year.
pub trait HolidaySource {
    fn fetch(&self, year: i32) -> Result<HolidaySet>;
}

// England & Wales bank holidays, used when no holiday file is supplied.
static ENGLAND_AND_WALES: Lazy<HashMap<i32, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        (
            2023,
            vec![
                "2023-01-02", "2023-04-07", "2023-04-10", "2023-05-01", "2023-05-08",
                "2023-05-29", "2023-08-28", "2023-12-25", "2023-12-26",
            ],
        ),
        (
            2024,
            vec![
                "2024-01-01", "2024-03-29", "2024-04-01", "2024-05-06", "2024-05-27",
                "2024-08-26", "2024-12-25", "2024-12-26",
            ],
        ),
        (
            2025,
            vec![
                "2025-01-01", "2025-04-18", "2025-04-21", "2025-05-05", "2025-05-26",
                "2025-08-25", "2025-12-25", "2025-12-26",
            ],
        ),
        (
            2026,
            vec![
                "2026-01-01", "2026-04-03", "2026-04-06", "2026-05-04", "2026-05-25",
                "2026-08-31", "2026-12-25", "2026-12-28",
            ],
        ),
    ])
});

/// Built-in table for England & Wales.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticHolidays;

impl HolidaySource for StaticHolidays {
    fn fetch(&self, year: i32) -> Result<HolidaySet> {
        ENGLAND_AND_WALES
            .get(&year)
            .map(HolidaySet::from_iso)
            .ok_or_else(|| ReportError::NoHolidays {
                division: DEFAULT_DIVISION.to_string(),
                year,
            })
    }
}

#[derive(Debug, Deserialize)]
struct HolidayEvent {
    date: String,
}

#[derive(Debug, Deserialize)]
struct Division {
    events: Vec<HolidayEvent>,
}

/// Either a bare list of ISO dates or the published bank-holidays document,
/// which groups events by division.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HolidayFile {
    Dates(Vec<String>),
    Divisions(HashMap<String, Division>),
}

/// Holidays read from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileHolidays {
    path: PathBuf,
    division: String,
}

impl FileHolidays {
    pub fn new(path: impl Into<PathBuf>, division: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            division: division.into(),
        }
    }

    fn read_dates(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Err(ReportError::NotFound(self.path.clone()));
        }
        let text = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<HolidayFile>(&text)? {
            HolidayFile::Dates(dates) => Ok(dates),
            HolidayFile::Divisions(mut divisions) => divisions
                .remove(&self.division)
                .map(|d| d.events.into_iter().map(|e| e.date).collect())
                .ok_or_else(|| ReportError::UnknownDivision(self.division.clone())),
        }
    }
}

impl HolidaySource for FileHolidays {
    fn fetch(&self, year: i32) -> Result<HolidaySet> {
        let dates = self.read_dates()?;
        Ok(HolidaySet::from_iso(dates).iter_year(year).collect())
    }
}

/// Per-year memo over a [`HolidaySource`]. Owned by the caller and passed to
/// whoever needs holidays; the calculator only ever sees a resolved set.
#[derive(Debug)]
pub struct HolidayCache<S> {
    source: S,
    by_year: HashMap<i32, HolidaySet>,
}

impl<S: HolidaySource> HolidayCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            by_year: HashMap::new(),
        }
    }

    /// Holidays for `year`. A failing source is logged and cached as an
    /// empty set so the run still completes with weekends-only calendars.
    pub fn holidays_for(&mut self, year: i32) -> &HolidaySet {
        self.by_year.entry(year).or_insert_with(|| match self.source.fetch(year) {
            Ok(set) => {
                debug!(year, count = set.len(), "resolved holidays");
                set
            }
            Err(e) => {
                warn!(year, error = %e, "holiday source unavailable, using weekends only");
                HolidaySet::new()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::io::Write;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct CountingSource {
        calls: Cell<u32>,
        fail: bool,
    }

    impl HolidaySource for CountingSource {
        fn fetch(&self, _year: i32) -> Result<HolidaySet> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ReportError::NotFound(PathBuf::from("unreachable")));
            }
            Ok(HolidaySet::from_iso(["2025-12-25"]))
        }
    }

    #[test]
    fn static_table_covers_2025() {
        let set = StaticHolidays.fetch(2025).unwrap();
        assert_eq!(set.len(), 8);
        assert!(set.contains(ymd(2025, 1, 1)));
        assert!(set.contains(ymd(2025, 8, 25)));
        assert!(StaticHolidays.fetch(1999).is_err());
    }

    #[test]
    fn cache_fetches_each_year_once() {
        let mut cache = HolidayCache::new(CountingSource { calls: Cell::new(0), fail: false });
        assert!(!cache.by_year.contains_key(&2025));
        assert_eq!(cache.holidays_for(2025).len(), 1);
        assert_eq!(cache.holidays_for(2025).len(), 1);
        assert!(cache.by_year.contains_key(&2025));
        assert_eq!(cache.source.calls.get(), 1);
    }

    #[test]
    fn failing_source_falls_back_to_empty() {
        let mut cache = HolidayCache::new(CountingSource { calls: Cell::new(0), fail: true });
        assert!(cache.holidays_for(2025).is_empty());
        assert!(cache.holidays_for(2025).is_empty());
        assert_eq!(cache.source.calls.get(), 1);
    }

    #[test]
    fn file_with_plain_date_list() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"["2025-01-01", "2025-12-25", "2024-12-25", "garbage"]"#).unwrap();
        let set = FileHolidays::new(f.path(), DEFAULT_DIVISION).fetch(2025).unwrap();
        assert_eq!(set.len(), 2);
        assert!(!set.contains(ymd(2024, 12, 25)));
    }

    #[test]
    fn file_with_divisions_selects_one() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{
                "england-and-wales": {{"division": "england-and-wales", "events": [
                    {{"title": "New Year's Day", "date": "2025-01-01", "notes": "", "bunting": true}},
                    {{"title": "Good Friday", "date": "2025-04-18", "notes": "", "bunting": false}}
                ]}},
                "scotland": {{"division": "scotland", "events": [
                    {{"title": "2nd January", "date": "2025-01-02", "notes": "", "bunting": true}}
                ]}}
            }}"#
        )
        .unwrap();
        let ew = FileHolidays::new(f.path(), "england-and-wales").fetch(2025).unwrap();
        assert_eq!(ew.len(), 2);
        let scot = FileHolidays::new(f.path(), "scotland").fetch(2025).unwrap();
        assert!(scot.contains(ymd(2025, 1, 2)));
        assert!(FileHolidays::new(f.path(), "northern-ireland").fetch(2025).is_err());
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = FileHolidays::new("/nonexistent/holidays.json", DEFAULT_DIVISION)
            .fetch(2025)
            .unwrap_err();
        assert!(matches!(err, ReportError::NotFound(_)));
    }
}
