//! URL/Title report writing
//!
//! Outcomes are encoded into the two-column legacy layout here and nowhere
//! else. The primary format is CSV; when no CSV name can be created the rows
//! go to a tab-separated `.txt` file instead.

use crate::output::{OutputError, OutputResult};
use crate::state::{FetchError, FetchOutcome};
use chrono::{DateTime, Local};
use csv::{QuoteStyle, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Column headers of every report
pub const REPORT_HEADERS: [&str; 2] = ["URL", "Title"];

/// One report row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub url: String,
    pub title: String,
}

impl From<&FetchOutcome> for ReportRow {
    fn from(outcome: &FetchOutcome) -> Self {
        Self {
            url: outcome.url.clone(),
            title: encode_title(outcome),
        }
    }
}

/// Renders the `Title` cell for an outcome
///
/// | Outcome | Cell |
/// |---------|------|
/// | title | the title |
/// | `HttpStatus(404)` | `Error: HTTP 404` |
/// | `NetworkError(msg)` | `Error: msg` |
/// | `Timeout` | `Error: Timeout` |
/// | `NoTitleFound` | `No title found` |
pub fn encode_title(outcome: &FetchOutcome) -> String {
    match &outcome.result {
        Ok(title) => title.clone(),
        Err(FetchError::NoTitleFound) => FetchError::NoTitleFound.to_string(),
        Err(error) => format!("Error: {}", error),
    }
}

/// Builds `<stem>_<YYYYMMDD_HHMMSS>` for a report written at `now`
pub fn report_base_name(stem: &str, now: DateTime<Local>) -> String {
    format!("{}_{}", stem, now.format("%Y%m%d_%H%M%S"))
}

/// Writes the report for one input list into `output_dir`
///
/// The file name carries the current local timestamp.
pub fn write_report(
    output_dir: &Path,
    stem: &str,
    outcomes: &[FetchOutcome],
    max_attempts: u32,
) -> OutputResult<PathBuf> {
    let base = report_base_name(stem, Local::now());
    let rows: Vec<ReportRow> = outcomes.iter().map(ReportRow::from).collect();
    write_report_named(output_dir, &base, &rows, max_attempts)
}

/// Writes `rows` as `<base>.csv`, avoiding existing files
///
/// # Name resolution
///
/// 1. `<base>.csv`, then `<base>_1.csv`, `<base>_2.csv`, ... while the name
///    exists or is not writable, for at most `max_attempts` names
/// 2. `<base>.txt` as tab-separated text when every CSV name failed
pub fn write_report_named(
    output_dir: &Path,
    base: &str,
    rows: &[ReportRow],
    max_attempts: u32,
) -> OutputResult<PathBuf> {
    let mut last_error = None;

    for attempt in 0..max_attempts.max(1) {
        let name = if attempt == 0 {
            format!("{}.csv", base)
        } else {
            format!("{}_{}.csv", base, attempt)
        };
        let path = output_dir.join(name);

        match write_csv(&path, rows) {
            Ok(()) => return Ok(path),
            Err(OutputError::Io(e)) if is_name_conflict(&e) => {
                tracing::warn!("Cannot write {}: {}; trying another name", path.display(), e);
                last_error = Some(OutputError::Io(e));
            }
            Err(e) => {
                last_error = Some(e);
                break;
            }
        }
    }

    let fallback = output_dir.join(format!("{}.txt", base));
    if let Some(e) = &last_error {
        tracing::warn!(
            "CSV report failed ({}), falling back to {}",
            e,
            fallback.display()
        );
    }

    write_tsv(&fallback, rows).map_err(|e| OutputError::Fallback {
        path: fallback.clone(),
        message: e.to_string(),
    })?;
    Ok(fallback)
}

/// Writes a comma-separated report to a new file
///
/// A file left incomplete by a failed write is removed.
pub fn write_csv(path: &Path, rows: &[ReportRow]) -> OutputResult<()> {
    write_new(path, |file| {
        let mut writer = WriterBuilder::new().from_writer(file);
        write_rows(&mut writer, rows)
    })
}

/// Writes a tab-separated report, replacing any existing file
pub fn write_tsv(path: &Path, rows: &[ReportRow]) -> OutputResult<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .from_writer(file);

    writer.write_record(REPORT_HEADERS)?;
    for row in rows {
        writer.write_record([flatten(&row.url), flatten(&row.title)])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_rows(writer: &mut csv::Writer<File>, rows: &[ReportRow]) -> OutputResult<()> {
    writer.write_record(REPORT_HEADERS)?;
    for row in rows {
        writer.write_record([row.url.as_str(), row.title.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Creates `path` and fills it with `fill`, deleting it again if `fill` fails
fn write_new<F>(path: &Path, fill: F) -> OutputResult<()>
where
    F: FnOnce(File) -> OutputResult<()>,
{
    let file = create_new(path)?;
    if let Err(e) = fill(file) {
        if let Err(remove_error) = std::fs::remove_file(path) {
            tracing::warn!(
                "Could not remove partial report {}: {}",
                path.display(),
                remove_error
            );
        }
        return Err(e);
    }
    Ok(())
}

fn create_new(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

fn is_name_conflict(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::AlreadyExists | ErrorKind::PermissionDenied
    )
}

/// Unquoted TSV cannot carry tabs or line breaks inside a cell
fn flatten(cell: &str) -> String {
    cell.split(['\t', '\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
