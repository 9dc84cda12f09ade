use crate::error::{ReportError, Result};
use crate::types::{AssociateRecord, RawLeaveRow, RawRow};
use crate::util::{parse_date, parse_rate, split_list, ParsedDate};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io;
use std::path::Path;
use tracing::{debug, info};

pub const UNASSIGNED_CONTRACT: &str = "Unassigned";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub malformed_rows: usize,
    pub unparseable_dates: usize,
    pub synthesized_ids: usize,
    pub leave_entries: usize,
    pub unmatched_leave: usize,
}

// Header variants seen across HR, leave and billing exports, keyed by the
// normalised header text.
static ASSOCIATE_HEADERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let groups: &[(&str, &[&str])] = &[
        (
            "AssociateId",
            &["associateid", "employeeid", "empid", "employeeno", "employeenumber", "staffid", "resourceid", "id"],
        ),
        ("Name", &["name", "associatename", "employeename", "fullname", "resourcename"]),
        ("Contract", &["contract", "contractname", "account", "project", "projectname", "engagement"]),
        ("Category", &["category", "associatecategory", "employmenttype", "resourcetype", "type"]),
        ("RateCard", &["ratecard", "rate", "dayrate", "dailyrate", "billrate", "billingrate"]),
        (
            "AssignmentStart",
            &["assignmentstart", "assignmentstartdate", "startdate", "allocationstartdate", "projectstartdate"],
        ),
        ("BillingStart", &["billingstart", "billingstartdate", "billablestart", "billstartdate"]),
        ("BillingEnd", &["billingend", "billingenddate", "billableend", "billenddate", "enddate"]),
        ("LeaveDates", &["leavedates", "leave", "leaves", "leavedays", "absencedates"]),
    ];
    synonym_table(groups)
});

static LEAVE_HEADERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let groups: &[(&str, &[&str])] = &[
        (
            "AssociateId",
            &["associateid", "employeeid", "empid", "employeeno", "employeenumber", "staffid", "resourceid", "id"],
        ),
        ("LeaveDate", &["leavedate", "date", "absencedate", "dayofleave", "leave"]),
    ];
    synonym_table(groups)
});

fn synonym_table(groups: &[(&'static str, &[&'static str])]) -> HashMap<&'static str, &'static str> {
    groups
        .iter()
        .flat_map(|(canonical, variants)| variants.iter().map(move |v| (*v, *canonical)))
        .collect()
}

/// Lowercase and drop everything but letters and digits, so `Emp. ID`,
/// `emp_id` and `EmpId` all compare equal.
pub fn normalize_header(h: &str) -> String {
    h.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Rewrite headers onto canonical names. The first column claiming a
/// canonical name wins; later ones keep their original text and are ignored
/// by deserialisation.
fn canonical_headers(headers: &StringRecord, table: &HashMap<&'static str, &'static str>) -> StringRecord {
    let mut claimed = HashSet::new();
    headers
        .iter()
        .map(|h| match table.get(normalize_header(h).as_str()) {
            Some(canonical) if claimed.insert(*canonical) => canonical.to_string(),
            _ => h.to_string(),
        })
        .collect()
}

fn reader<R: io::Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new().flexible(true).trim(Trim::All).from_reader(input)
}

fn open(path: &Path) -> Result<std::fs::File> {
    if !path.exists() {
        return Err(ReportError::NotFound(path.to_path_buf()));
    }
    Ok(std::fs::File::open(path)?)
}

fn text(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve an optional date cell, counting cells that held something other
/// than a date.
fn date_field(cell: Option<&str>, column: &str, row: usize, report: &mut LoadReport) -> Option<NaiveDate> {
    match parse_date(cell) {
        ParsedDate::Date(d) => Some(d),
        ParsedDate::Blank => None,
        ParsedDate::Unparseable(raw) => {
            debug!(row, column, value = %raw, "unparseable date treated as absent");
            report.unparseable_dates += 1;
            None
        }
    }
}

pub fn load_associates(path: &Path) -> Result<(Vec<AssociateRecord>, LoadReport)> {
    let (records, report) = read_associates(open(path)?)?;
    info!(
        path = %path.display(),
        rows = report.total_rows,
        loaded = records.len(),
        malformed = report.malformed_rows,
        unparseable_dates = report.unparseable_dates,
        "loaded associates"
    );
    Ok((records, report))
}

pub fn read_associates<R: io::Read>(input: R) -> Result<(Vec<AssociateRecord>, LoadReport)> {
    let mut rdr = reader(input);
    let headers = canonical_headers(rdr.headers()?, &ASSOCIATE_HEADERS);
    rdr.set_headers(headers);

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        report.total_rows += 1;
        let row_no = idx + 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = row_no, error = %e, "skipping malformed row");
                report.malformed_rows += 1;
                continue;
            }
        };

        let associate_id = match text(row.associate_id) {
            Some(id) => id,
            None => {
                report.synthesized_ids += 1;
                format!("ROW-{}", row_no)
            }
        };
        let contract = text(row.contract).unwrap_or_else(|| UNASSIGNED_CONTRACT.to_string());

        let assignment_start = date_field(row.assignment_start.as_deref(), "AssignmentStart", row_no, &mut report);
        let billing_start = date_field(row.billing_start.as_deref(), "BillingStart", row_no, &mut report);
        let billing_end = date_field(row.billing_end.as_deref(), "BillingEnd", row_no, &mut report);

        let mut leave_dates = BTreeSet::new();
        if let Some(cell) = row.leave_dates.as_deref() {
            for part in split_list(cell) {
                if let Some(d) = date_field(Some(part), "LeaveDates", row_no, &mut report) {
                    leave_dates.insert(d);
                }
            }
        }

        records.push(AssociateRecord {
            associate_id,
            name: text(row.name).unwrap_or_default(),
            contract,
            category: text(row.category).unwrap_or_default(),
            rate_card: parse_rate(row.rate_card.as_deref()),
            assignment_start,
            billing_start,
            billing_end,
            leave_dates,
        });
    }

    Ok((records, report))
}

/// Leave dates keyed by associate id.
pub type LeaveBook = HashMap<String, BTreeSet<NaiveDate>>;

pub fn load_leave(path: &Path, report: &mut LoadReport) -> Result<LeaveBook> {
    let book = read_leave(open(path)?, report)?;
    info!(path = %path.display(), associates = book.len(), "loaded leave");
    Ok(book)
}

pub fn read_leave<R: io::Read>(input: R, report: &mut LoadReport) -> Result<LeaveBook> {
    let mut rdr = reader(input);
    let headers = canonical_headers(rdr.headers()?, &LEAVE_HEADERS);
    rdr.set_headers(headers);

    let mut book = LeaveBook::new();
    for (idx, result) in rdr.deserialize::<RawLeaveRow>().enumerate() {
        let row_no = idx + 1;
        let Ok(row) = result else {
            report.malformed_rows += 1;
            continue;
        };
        let Some(id) = text(row.associate_id) else {
            report.malformed_rows += 1;
            continue;
        };
        if let Some(d) = date_field(row.leave_date.as_deref(), "LeaveDate", row_no, report) {
            book.entry(id).or_default().insert(d);
            report.leave_entries += 1;
        }
    }
    Ok(book)
}

/// Fold leave dates into every record of the matching associate. Ids with
/// no record are counted as unmatched.
pub fn merge_leave(records: &mut [AssociateRecord], book: &LeaveBook, report: &mut LoadReport) {
    let mut matched = HashSet::new();
    for rec in records.iter_mut() {
        if let Some(dates) = book.get(&rec.associate_id) {
            rec.leave_dates.extend(dates.iter().copied());
            matched.insert(rec.associate_id.clone());
        }
    }
    report.unmatched_leave = book.keys().filter(|id| !matched.contains(*id)).count();
    if report.unmatched_leave > 0 {
        debug!(count = report.unmatched_leave, "leave rows without a matching associate");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_header(" Emp. ID "), "empid");
        assert_eq!(normalize_header("Billing_Start_Date"), "billingstartdate");
    }

    #[test]
    fn reads_rows_with_synonym_headers() {
        let csv = "\
Emp ID,Employee Name,Account,Day Rate,Start Date,Billable Start,Billing End Date,Leave Dates,Notes
A1,Alice,Acme,\"£10,000\",01/01/2025,2025-01-15,,2025-01-06; 2025-01-06;2025-01-07,hello
A2,Bob,Acme,450,45672,15-Jan-25,31/03/2025,,
";
        let (records, report) = read_associates(csv.as_bytes()).unwrap();
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.unparseable_dates, 0);
        assert_eq!(records.len(), 2);

        let a = &records[0];
        assert_eq!(a.associate_id, "A1");
        assert_eq!(a.name, "Alice");
        assert_eq!(a.contract, "Acme");
        assert_eq!(a.rate_card, 10000.0);
        assert_eq!(a.assignment_start, Some(ymd(2025, 1, 1)));
        assert_eq!(a.billing_start, Some(ymd(2025, 1, 15)));
        assert_eq!(a.billing_end, None);
        assert_eq!(a.leave_dates.len(), 2);

        let b = &records[1];
        assert_eq!(b.assignment_start, Some(ymd(2025, 1, 15)));
        assert_eq!(b.billing_start, Some(ymd(2025, 1, 15)));
        assert_eq!(b.billing_end, Some(ymd(2025, 3, 31)));
        assert!(b.leave_dates.is_empty());
    }

    #[test]
    fn malformed_values_degrade_to_defaults() {
        let csv = "\
AssociateId,Name,Contract,RateCard,AssignmentStart,BillingStart,BillingEnd
,Nobody,,n/a,someday,2025-02-30,
";
        let (records, report) = read_associates(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.associate_id, "ROW-1");
        assert_eq!(r.contract, UNASSIGNED_CONTRACT);
        assert_eq!(r.rate_card, 0.0);
        assert_eq!(r.assignment_start, None);
        assert_eq!(r.billing_start, None);
        assert_eq!(report.unparseable_dates, 2);
        assert_eq!(report.synthesized_ids, 1);
    }

    #[test]
    fn unreadable_dates_widen_to_full_months() {
        use crate::calendar::HolidaySet;
        use crate::metrics::compute_month_metrics;
        use chrono::Month;

        let csv = "\
AssociateId,Contract,RateCard,AssignmentStart,BillingStart,BillingEnd
A1,Acme,100,someday,15/01/25,31/12/25
A2,Acme,100,,,2025
";
        let (records, report) = read_associates(csv.as_bytes()).unwrap();
        assert_eq!(report.unparseable_dates, 2);
        assert_eq!(records[0].assignment_start, None);
        assert_eq!(records[0].billing_start, Some(ymd(2025, 1, 15)));
        assert_eq!(records[0].billing_end, Some(ymd(2025, 12, 31)));
        assert_eq!(records[1].billing_end, None);

        let holidays = HolidaySet::new();
        for rec in &records {
            let june = compute_month_metrics(rec, 2025, Month::June, &holidays);
            assert_eq!(june.total_working_days, 21, "{}", rec.associate_id);
            assert_eq!(june.actual_working_days, 21);
            assert_eq!(june.cost_revenue, 2100.0);
        }

        // Assignment start is absent, so January runs from the 1st and the
        // days before billing begins are non-billable.
        let jan = compute_month_metrics(&records[0], 2025, Month::January, &holidays);
        assert_eq!(jan.total_working_days, 23);
        assert_eq!(jan.non_billable_leave_days, 10);
        assert_eq!(jan.billed_days, 13);
    }

    #[test]
    fn first_synonym_column_wins() {
        let csv = "Contract,Project,AssociateId\nAcme,Other,A1\n";
        let (records, _) = read_associates(csv.as_bytes()).unwrap();
        assert_eq!(records[0].contract, "Acme");
    }

    #[test]
    fn leave_file_merges_by_associate() {
        let leave_csv = "\
Employee ID,Leave Date
A1,2025-01-08
A1,08/01/2025
A1,2025-01-09
ZZ,2025-01-10
,2025-01-11
A1,not a date
";
        let mut report = LoadReport::default();
        let book = read_leave(leave_csv.as_bytes(), &mut report).unwrap();
        assert_eq!(report.leave_entries, 4);
        assert_eq!(report.malformed_rows, 1);
        assert_eq!(report.unparseable_dates, 1);

        let mut records = vec![AssociateRecord {
            associate_id: "A1".to_string(),
            leave_dates: [ymd(2025, 1, 9)].into_iter().collect(),
            ..Default::default()
        }];
        merge_leave(&mut records, &book, &mut report);
        assert_eq!(records[0].leave_dates.len(), 2);
        assert_eq!(report.unmatched_leave, 1);
    }

    #[test]
    fn load_from_disk_and_missing_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "AssociateId,Contract,RateCard").unwrap();
        writeln!(f, "A1,Acme,100").unwrap();
        let (records, _) = load_associates(f.path()).unwrap();
        assert_eq!(records.len(), 1);

        let err = load_associates(Path::new("/nonexistent/associates.csv")).unwrap_err();
        assert!(matches!(err, ReportError::NotFound(_)));
    }
}
