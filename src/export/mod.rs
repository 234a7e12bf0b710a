//! CSV export of session history.
//!
//! One row per session in input order under the header
//! `Date,Duration (min),Actual Time (min),Type,Completed`, with `\n`
//! record terminators and the file named `focus-sessions-<YYYY-MM-DD>.csv`.

use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::types::FocusSession;

/// Column headers, in order.
pub const CSV_HEADERS: [&str; 5] = [
    "Date",
    "Duration (min)",
    "Actual Time (min)",
    "Type",
    "Completed",
];

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// There is nothing to export.
    #[error("no sessions to export")]
    NoData,

    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes `sessions` to CSV text.
///
/// An empty slice yields the header row alone.
pub fn sessions_to_csv(sessions: &[FocusSession]) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADERS)?;
    for session in sessions {
        wtr.write_record(&[
            session.created_at.format("%Y-%m-%d").to_string(),
            session.planned_minutes.to_string(),
            session.actual_minutes.to_string(),
            session.mode.as_str().to_string(),
            if session.completed { "Yes" } else { "No" }.to_string(),
        ])?;
    }

    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Default export file name for `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("focus-sessions-{}.csv", date.format("%Y-%m-%d"))
}

/// Writes `sessions` as CSV to `path`.
///
/// # Errors
///
/// Returns `ExportError::NoData` without touching the filesystem when
/// `sessions` is empty.
pub fn write_csv(path: &Path, sessions: &[FocusSession]) -> Result<(), ExportError> {
    if sessions.is_empty() {
        return Err(ExportError::NoData);
    }
    let csv = sessions_to_csv(sessions)?;
    std::fs::write(path, csv)?;
    debug!(path = %path.display(), rows = sessions.len(), "exported sessions");
    Ok(())
}
