//! Report history: a JSON array of [`StoredReport`]s on disk, newest first.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::StoredReport;

pub trait ReportStore {
    /// All reports, newest first.
    fn list(&self) -> Result<Vec<StoredReport>>;
    fn append(&self, report: StoredReport) -> Result<()>;
    /// Returns whether a report with `id` existed.
    fn delete(&self, id: &str) -> Result<bool>;

    fn get(&self, id: &str) -> Result<Option<StoredReport>> {
        Ok(self.list()?.into_iter().find(|r| r.id == id))
    }
}

#[derive(Debug, Clone)]
pub struct FileReportStore {
    path: PathBuf,
}

impl FileReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<StoredReport>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("failed to read report history: {}", self.path.display()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse report history: {}", self.path.display()))
    }

    fn write(&self, reports: &[StoredReport]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        let mut buf = serde_json::to_vec_pretty(reports)?;
        buf.push(b'\n');

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &buf)
            .with_context(|| format!("failed to write report history: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace report history: {}", self.path.display()))
    }
}

impl ReportStore for FileReportStore {
    fn list(&self) -> Result<Vec<StoredReport>> {
        let mut reports = self.read()?;
        sort_newest_first(&mut reports);
        Ok(reports)
    }

    fn append(&self, report: StoredReport) -> Result<()> {
        let mut reports = self.read()?;
        reports.insert(0, report);
        self.write(&reports)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut reports = self.read()?;
        let before = reports.len();
        reports.retain(|r| r.id != id);
        if reports.len() == before {
            return Ok(false);
        }
        self.write(&reports)?;
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Primary,
    Fallback,
    Lost,
}

/// Saves to `primary`, then to `fallback`. Failures are logged, never returned.
pub fn save_with_fallback(
    primary: &dyn ReportStore,
    fallback: &dyn ReportStore,
    report: StoredReport,
) -> SaveOutcome {
    let err = match primary.append(report.clone()) {
        Ok(()) => return SaveOutcome::Primary,
        Err(err) => err,
    };
    log::warn!("report history unavailable, using fallback store: {err:#}");

    match fallback.append(report) {
        Ok(()) => SaveOutcome::Fallback,
        Err(err) => {
            log::error!("report was not saved: {err:#}");
            SaveOutcome::Lost
        }
    }
}

/// Reports of one company, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyHistory {
    pub company: String,
    pub reports: Vec<StoredReport>,
}

/// Groups by company name; companies ordered by their latest report.
pub fn group_by_company(reports: &[StoredReport]) -> Vec<CompanyHistory> {
    let mut sorted = reports.to_vec();
    sort_newest_first(&mut sorted);

    let mut groups: Vec<CompanyHistory> = Vec::new();
    for report in sorted {
        let company = report.company_info.name.trim().to_string();
        match groups.iter_mut().find(|g| g.company == company) {
            Some(group) => group.reports.push(report),
            None => groups.push(CompanyHistory {
                company,
                reports: vec![report],
            }),
        }
    }
    groups
}

/// Stable; unparsable timestamps sort last.
pub fn sort_newest_first(reports: &mut [StoredReport]) {
    reports.sort_by_key(|r| std::cmp::Reverse(parse_timestamp(&r.timestamp)));
}

fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339).ok()
}
