use std::path::PathBuf;
use thiserror::Error;

/// Failures at the file boundary. The calculator itself has no error cases.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("holiday file has no division named {0}")]
    UnknownDivision(String),

    #[error("no holidays for {division} in {year}")]
    NoHolidays { division: String, year: i32 },
}

pub type Result<T> = std::result::Result<T, ReportError>;
