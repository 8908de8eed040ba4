use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::generator::{FILE_DATE_FORMAT, FILE_TIME_FORMAT};
use crate::error::{FleetError, Result};

/// Tokens recovered from a conventional report file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportName {
    pub company: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub time: NaiveTime,
}

impl ReportName {
    /// Parse `<company>--<start>--<end>--<HH-MM-SS>.pdf`. The company part
    /// may itself contain `--`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".pdf")?;
        let mut parts = stem.rsplitn(4, "--");
        let time = parts.next()?;
        let end = parts.next()?;
        let start = parts.next()?;
        let company = parts.next()?;

        Some(Self {
            company: company.to_string(),
            start: NaiveDate::parse_from_str(start, FILE_DATE_FORMAT).ok()?,
            end: NaiveDate::parse_from_str(end, FILE_DATE_FORMAT).ok()?,
            time: NaiveTime::parse_from_str(time, FILE_TIME_FORMAT).ok()?,
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A report file found in the archive directory
#[derive(Debug, Clone)]
pub struct ArchivedReport {
    pub path: PathBuf,
    pub file_name: String,
    pub modified: DateTime<Local>,
    pub size: u64,
    pub name: Option<ReportName>,
}

impl ArchivedReport {
    fn matches(&self, date: NaiveDate) -> bool {
        match &self.name {
            Some(name) => name.covers(date),
            None => self.modified.date_naive() == date,
        }
    }
}

/// Previously generated reports living in one directory
pub struct ReportArchive {
    dir: PathBuf,
}

impl ReportArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All reports, newest first. With a date, only reports whose period
    /// covers it (or, for unconventional names, that were written that day).
    pub fn list(&self, on: Option<NaiveDate>) -> Result<Vec<ArchivedReport>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut reports = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            let file_name = dir_entry.file_name().to_string_lossy().into_owned();

            // Skip in-flight temp files and anything that is not a PDF
            if file_name.starts_with('.') || path.extension().map_or(true, |ext| ext != "pdf") {
                continue;
            }

            let metadata = dir_entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let report = ArchivedReport {
                name: ReportName::parse(&file_name),
                modified: DateTime::<Local>::from(metadata.modified()?),
                size: metadata.len(),
                path,
                file_name,
            };

            if on.map_or(true, |date| report.matches(date)) {
                reports.push(report);
            }
        }

        reports.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(reports)
    }

    /// Resolve a report reference to a report.
    /// Accepts either an index (1-based) from 'reports' or the file name.
    pub fn find(&self, reference: &str) -> Result<ArchivedReport> {
        let reports = self.list(None)?;

        if let Ok(idx) = reference.parse::<usize>() {
            return idx
                .checked_sub(1)
                .and_then(|i| reports.get(i))
                .cloned()
                .ok_or_else(|| FleetError::ReportNotFound(reference.to_string()));
        }

        reports
            .into_iter()
            .find(|r| r.file_name == reference || r.file_name.trim_end_matches(".pdf") == reference)
            .ok_or_else(|| FleetError::ReportNotFound(reference.to_string()))
    }

    pub fn delete(&self, report: &ArchivedReport) -> Result<()> {
        fs::remove_file(&report.path).map_err(|source| FleetError::DeleteFailure {
            path: report.path.clone(),
            source,
        })?;
        info!(path = %report.path.display(), "report deleted");
        Ok(())
    }

    /// Open with the system default viewer
    pub fn open(&self, report: &ArchivedReport) -> Result<()> {
        open_path(&report.path)
    }

    /// Copy the report into `destination` so it can be handed to someone
    /// else. Returns the path of the copy.
    pub fn share(&self, report: &ArchivedReport, destination: &Path) -> Result<PathBuf> {
        let target = destination.join(&report.file_name);
        let write_failure = |source| FleetError::WriteFailure {
            path: target.clone(),
            source,
        };

        fs::create_dir_all(destination).map_err(write_failure)?;
        fs::copy(&report.path, &target).map_err(write_failure)?;
        info!(from = %report.path.display(), to = %target.display(), "report shared");
        Ok(target)
    }
}

pub fn open_path(pdf_path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(pdf_path)
            .spawn()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conventional_names() {
        let name = ReportName::parse("Acme--Roadways--01-10-2026--18-10-2026--14-05-09.pdf").unwrap();
        assert_eq!(name.company, "Acme--Roadways");
        assert_eq!(name.start, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(name.end, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(name.time, NaiveTime::from_hms_opt(14, 5, 9).unwrap());
    }

    #[test]
    fn rejects_other_names() {
        assert!(ReportName::parse("notes.pdf").is_none());
        assert!(ReportName::parse("Acme--01-10-2026--18-10-2026--14-05-09.txt").is_none());
        assert!(ReportName::parse("Acme--2026-10-01--18-10-2026--14-05-09.pdf").is_none());
    }

    #[test]
    fn covers_is_inclusive() {
        let name = ReportName::parse("Acme--01-10-2026--18-10-2026--14-05-09.pdf").unwrap();
        assert!(name.covers(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()));
        assert!(name.covers(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()));
        assert!(!name.covers(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()));
    }
}
