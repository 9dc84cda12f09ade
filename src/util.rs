// Utility helpers for parsing and number formatting.
//
// This module centralizes all the "dirty" spreadsheet/number/date handling so
// the calculator can assume clean, typed values.
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace and strips currency symbols and thousands separators.
/// - Rejects values that still contain alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | '£' | '$' | '€' | ' '))
        .collect();
    if cleaned.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rate cards coerce to 0 when missing, non-numeric or negative.
pub fn parse_rate(s: Option<&str>) -> f64 {
    parse_f64_safe(s).map(|v| v.max(0.0)).unwrap_or(0.0)
}

/// Outcome of coercing a spreadsheet cell into a calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDate {
    Date(NaiveDate),
    Blank,
    Unparseable(String),
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y/%m/%d",
    "%d/%m/%y",
    "%d-%m-%y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

// Serials below 10000 (before 1927-05-18) are far more likely to be a bare
// year or a stray count than a date. The upper bound is 9999-12-31.
const MIN_SERIAL: f64 = 10_000.0;
const MAX_SERIAL: f64 = 2_958_465.0;

// chrono's `%Y` takes any number of digits, so "15/01/25" would parse as
// year 25. Four-digit years only; two-digit years go through `%y`.
fn plausible(d: NaiveDate) -> Option<NaiveDate> {
    (1900..=9999).contains(&d.year()).then_some(d)
}

/// Coerce a cell into a date, accepting ISO dates (with or without a time
/// part or trailing `Z`), day-first UK formats, month abbreviations and
/// spreadsheet serial numbers.
pub fn parse_date(s: Option<&str>) -> ParsedDate {
    let Some(raw) = s else {
        return ParsedDate::Blank;
    };
    let s = raw.trim();
    if s.is_empty() {
        return ParsedDate::Blank;
    }

    if let Some(d) = parse_serial(s) {
        return ParsedDate::Date(d);
    }
    for fmt in DATE_FORMATS {
        if let Some(d) = NaiveDate::parse_from_str(s, fmt).ok().and_then(plausible) {
            return ParsedDate::Date(d);
        }
    }
    let no_zone = s.trim_end_matches('Z');
    for fmt in DATETIME_FORMATS {
        if let Some(d) = NaiveDateTime::parse_from_str(no_zone, fmt)
            .ok()
            .and_then(|dt| plausible(dt.date()))
        {
            return ParsedDate::Date(d);
        }
    }
    ParsedDate::Unparseable(s.to_string())
}

/// Spreadsheet serials count days from 1899-12-30 (1900 date system, with the
/// historical leap-year bug folded into the epoch). Fractional parts are
/// times of day and are dropped.
fn parse_serial(s: &str) -> Option<NaiveDate> {
    if !s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let serial: f64 = s.parse().ok()?;
    if !(MIN_SERIAL..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Split a multi-valued leave cell on `;`, `,` or `|`.
pub fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split([';', ',', '|'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
}

/// Quotient that yields 0 instead of NaN/inf for an empty denominator.
pub fn ratio(num: u32, denom: u32) -> f64 {
    if denom == 0 {
        return 0.0;
    }
    num as f64 / denom as f64
}

pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Fixed decimals with `en` thousands separators, e.g. `1,234,567.89`.
/// Values that round to zero never carry a minus sign.
pub fn format_number(n: f64, decimals: usize) -> String {
    let scale = 10i64.pow(decimals as u32);
    let scaled = (n.abs() * scale as f64).round() as i64;
    let sign = if n < 0.0 && scaled != 0 { "-" } else { "" };
    let whole = (scaled / scale).to_formatted_string(&Locale::en);
    if decimals == 0 {
        return format!("{sign}{whole}");
    }
    format!("{sign}{whole}.{:0width$}", scaled % scale, width = decimals)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
