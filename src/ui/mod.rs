use anyhow::Error;
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

use crate::core::{
    ClassifiedRecord, CompanyInfo, ProcessResponse, Readiness, Recommendation, ReportSummary,
    SecureBootStats, StoredReport,
};
use crate::store::CompanyHistory;

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub color: bool,
    pub stdin_is_tty: bool,
    pub stdout_is_tty: bool,
    pub stderr_is_tty: bool,
    pub max_table_rows: usize,
    pub quiet: bool,
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(stderr, "  - re-run with `--verbose` for more detail");
    let _ = writeln!(
        stderr,
        "  - see `win11ready --help` for available commands and options"
    );
}

pub fn print_report(resp: &ProcessResponse, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    print_overview(
        &mut out,
        &resp.company_info,
        &resp.summary,
        &resp.secure_boot_stats,
        cfg,
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Sites:");
    for s in &resp.charts.site_breakdown {
        let _ = writeln!(
            out,
            "- {}: {} total, {} ready, {} not ready, {} unsupported, {} offline",
            s.site, s.total, s.compatible, s.not_compatible, s.unsupported, s.offline
        );
    }

    let _ = writeln!(out);
    print_records_table(&mut out, &resp.data, cfg);
    print_recommendations(&mut out, &resp.recommendations, cfg);
}

pub fn print_stored_report(report: &StoredReport, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "Report {} ({})", report.id, report.timestamp);
    print_overview(
        &mut out,
        &report.company_info,
        &report.summary,
        &report.secure_boot_stats,
        cfg,
    );
    let _ = writeln!(out);
    print_records_table(&mut out, &report.data, cfg);
}

pub fn print_history(groups: &[CompanyHistory], cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    if groups.is_empty() {
        let _ = writeln!(out, "No saved reports.");
        return;
    }
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "{} ({} reports)", group.company, group.reports.len());
        for r in &group.reports {
            let site = if r.company_info.site.trim().is_empty() {
                String::new()
            } else {
                format!("  site={}", r.company_info.site)
            };
            let _ = writeln!(
                out,
                "- {}  {}  {}/{} ready{site}",
                r.id, r.timestamp, r.summary.compatible, r.summary.total
            );
        }
    }
}

fn print_overview(
    out: &mut impl Write,
    company: &CompanyInfo,
    summary: &ReportSummary,
    secure_boot: &SecureBootStats,
    cfg: &UiConfig,
) {
    let _ = writeln!(out, "Company: {}  tenant={}", company.name, company.tenant);
    if !company.site.trim().is_empty() {
        let _ = writeln!(out, "Site: {}", company.site);
    }
    let _ = writeln!(
        out,
        "Summary: {} workstations  {} {}% / {} {}% / {} {}% / {} {}%",
        summary.total,
        format_readiness(Readiness::Pass, cfg.color),
        summary.compatible_percentage,
        format_readiness(Readiness::Fail, cfg.color),
        summary.not_compatible_percentage,
        format_readiness(Readiness::Unsupported, cfg.color),
        summary.unsupported_percentage,
        format_readiness(Readiness::Offline, cfg.color),
        summary.offline_percentage,
    );
    let _ = writeln!(
        out,
        "Secure Boot: {} enabled, {} capable but disabled, {} not capable, {} offline",
        secure_boot.capable_enabled,
        secure_boot.capable_disabled,
        secure_boot.not_capable,
        secure_boot.offline
    );
}

fn print_records_table(out: &mut impl Write, records: &[ClassifiedRecord], cfg: &UiConfig) {
    let total = records.len();
    let rows = cfg.max_table_rows.min(total);
    if total > rows {
        let _ = writeln!(out, "Workstations (showing {rows} of {total}):");
    } else {
        let _ = writeln!(out, "Workstations ({total}):");
    }
    if rows == 0 {
        return;
    }

    let shown = &records[..rows];
    let name_w = column_width("WORKSTATION", shown.iter().map(|r| r.workstation.as_str()));
    let site_w = column_width("SITE", shown.iter().map(|r| r.site.as_str()));
    let status_w = column_width("STATUS", shown.iter().map(|r| r.win11_ready.as_str()));
    let cpu_w = column_width("CPU", shown.iter().map(|r| r.cpu.as_str()));
    let sb_w = column_width("SECURE BOOT", shown.iter().map(|r| r.secure_boot.as_str()));

    let _ = writeln!(
        out,
        "{}  {}  {}  {}  {}  WARRANTY",
        pad_end_display("WORKSTATION", name_w),
        pad_end_display("SITE", site_w),
        pad_end_display("STATUS", status_w),
        pad_end_display("CPU", cpu_w),
        pad_end_display("SECURE BOOT", sb_w),
    );
    for r in shown {
        let status = pad_end_ansi(&format_readiness(r.win11_ready, cfg.color), status_w);
        let warranty = if r.in_scalepad {
            r.warranty_expires.clone()
        } else {
            "(not in ScalePad)".to_string()
        };
        let _ = writeln!(
            out,
            "{}  {}  {status}  {}  {}  {warranty}",
            pad_end_display(&r.workstation, name_w),
            pad_end_display(&r.site, site_w),
            pad_end_display(r.cpu.as_str(), cpu_w),
            pad_end_display(r.secure_boot.as_str(), sb_w),
        );
    }
    if total > rows {
        let _ = writeln!(out, "... ({} more)", total - rows);
    }
}

fn print_recommendations(out: &mut impl Write, recs: &[Recommendation], cfg: &UiConfig) {
    if recs.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Recommendations:");
    for r in recs {
        let _ = writeln!(
            out,
            "- {} [{}]: {}",
            r.title,
            format_priority(&r.priority, cfg.color),
            r.description
        );
    }
}

pub fn format_readiness(readiness: Readiness, color: bool) -> String {
    let s = readiness.as_str();
    if !color {
        return s.to_string();
    }
    let code = match readiness {
        Readiness::Pass => "32",
        Readiness::Fail => "31",
        Readiness::Unsupported => "33",
        Readiness::Offline | Readiness::Unknown => "90",
    };
    format!("\x1b[{code}m{s}\x1b[0m")
}

fn format_priority(priority: &str, color: bool) -> String {
    if !color {
        return priority.to_string();
    }
    let code = if priority == "high" { "31" } else { "33" };
    format!("\x1b[{code}m{priority}\x1b[0m")
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(visible_width_ansi)
        .chain(std::iter::once(visible_width_ansi(header)))
        .max()
        .unwrap_or(0)
}

fn pad_end_ansi(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}

fn pad_end_display(s: &str, width: usize) -> String {
    pad_end_ansi(s, width)
}

fn visible_width_ansi(s: &str) -> usize {
    let mut width: usize = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            let _ = chars.next();
            for ch2 in chars.by_ref() {
                if ch2 == 'm' {
                    break;
                }
            }
            continue;
        }
        width = width.saturating_add(UnicodeWidthChar::width(ch).unwrap_or(0));
    }
    width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_sequences_have_no_width() {
        let colored = format_readiness(Readiness::Fail, true);
        assert_eq!(visible_width_ansi(&colored), 4);
        assert_eq!(pad_end_ansi(&colored, 6).len(), colored.len() + 2);
    }

    #[test]
    fn wide_characters_count_double() {
        assert_eq!(visible_width_ansi("東京"), 4);
        assert_eq!(pad_end_display("東京", 6), "東京  ");
    }

    #[test]
    fn column_width_includes_header() {
        assert_eq!(column_width("SITE", ["HQ", "Branch"].into_iter()), 6);
        assert_eq!(column_width("STATUS", std::iter::empty()), 6);
    }
}
