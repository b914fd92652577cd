//! Inventory report of matched remote paths.
//!
//! The report is a plain text file with one remote path per line, named after
//! the target and the local date of the run:
//! `FTP_Files_listing_<target>_<YYYYMMDD>.txt`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::{Date, OffsetDateTime};
use tracing::{debug, info, instrument};

use crate::download::sanitize_filename_component;
use crate::remote::RemotePath;

const REPORT_PREFIX: &str = "FTP_Files_listing";

/// Errors writing the inventory file.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot write inventory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The local date, falling back to UTC when the offset cannot be determined.
#[must_use]
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Inventory file name for `target_label` on `date`.
///
/// ```
/// use ftp_crawler_core::report::listing_file_name;
/// use time::{Date, Month};
///
/// let date = Date::from_calendar_date(2024, Month::March, 7).unwrap();
/// assert_eq!(
///     listing_file_name("10.0.0.5", date),
///     "FTP_Files_listing_10.0.0.5_20240307.txt"
/// );
/// ```
#[must_use]
pub fn listing_file_name(target_label: &str, date: Date) -> String {
    let mut label = sanitize_filename_component(target_label);
    if label.is_empty() {
        label.push_str("target");
    }
    format!(
        "{REPORT_PREFIX}_{label}_{:04}{:02}{:02}.txt",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Writes one path per line to `path`.
///
/// Returns `Ok(false)` without creating the file when `matches` is empty.
///
/// # Errors
///
/// [`ReportError::Io`] when the file cannot be created or written.
#[instrument(skip(matches), fields(path = %path.display(), count = matches.len()))]
pub fn write_listing(matches: &[RemotePath], path: &Path) -> Result<bool, ReportError> {
    if matches.is_empty() {
        debug!("no matches, inventory not written");
        return Ok(false);
    }

    let file = File::create(path).map_err(|e| ReportError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for remote in matches {
        writeln!(writer, "{remote}").map_err(|e| ReportError::io(path, e))?;
    }
    writer.flush().map_err(|e| ReportError::io(path, e))?;

    info!("inventory written");
    Ok(true)
}
