//! Shapes classified records and their aggregate into outward-facing
//! artifacts: the processing response, CSV export, and a Markdown summary.

use anyhow::{Context, Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::aggregate::Aggregate;
use crate::core::{
    ChartSlice, Charts, ClassifiedRecord, CompanyInfo, ExportFiles, ProcessResponse,
    Recommendation, ReportSummary, SecureBootStats,
};

/// Column order downstream tooling depends on.
pub const EXPORT_COLUMNS: [&str; 12] = [
    "Workstation",
    "Friendly Name",
    "Site",
    "Serial",
    "Windows 11 Status",
    "RAM",
    "CPU",
    "TPM Version",
    "SecureBoot",
    "OS Version",
    "Warranty Expires",
    "In ScalePad",
];

pub const CSV_DATA_URI_PREFIX: &str = "data:text/csv;base64,";

const GREEN: &str = "#4CAF50";
const RED: &str = "#F44336";
const ORANGE: &str = "#FF9800";
const GREY: &str = "#9E9E9E";

pub fn export_row(r: &ClassifiedRecord) -> Vec<String> {
    vec![
        r.workstation.clone(),
        r.friendly_name.clone(),
        r.site.clone(),
        r.serial.clone(),
        r.win11_ready.to_string(),
        r.ram.to_string(),
        r.cpu.to_string(),
        r.tpm.to_string(),
        r.secure_boot.to_string(),
        r.os.to_string(),
        r.warranty_expires.clone(),
        if r.in_scalepad { "Yes" } else { "No" }.to_string(),
    ]
}

pub fn encode_csv(records: &[ClassifiedRecord]) -> Result<String> {
    let rows: Vec<Vec<String>> = records.iter().map(export_row).collect();
    encode_rows(&rows)
}

/// Plain comma-joined header line, then one fully quoted line per row.
pub fn encode_rows(rows: &[Vec<String>]) -> Result<String> {
    let mut buf = EXPORT_COLUMNS.join(",").into_bytes();
    buf.push(b'\n');

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buf);
    for row in rows {
        writer
            .write_record(row)
            .context("failed to write CSV row")?;
    }
    let buf = writer
        .into_inner()
        .map_err(|e| anyhow!("failed to flush CSV export: {}", e.error()))?;
    String::from_utf8(buf).context("CSV export is not valid UTF-8")
}

pub fn decode_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers != EXPORT_COLUMNS {
        return Err(anyhow!("unexpected CSV export columns: {}", headers.join(",")));
    }
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to read CSV row")?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

pub fn csv_data_uri(csv: &str) -> String {
    format!("{CSV_DATA_URI_PREFIX}{}", STANDARD.encode(csv.as_bytes()))
}

pub fn decode_data_uri(uri: &str) -> Result<String> {
    let payload = uri
        .strip_prefix(CSV_DATA_URI_PREFIX)
        .ok_or_else(|| anyhow!("not a CSV data URI"))?;
    let bytes = STANDARD.decode(payload).context("invalid base64 payload")?;
    String::from_utf8(bytes).context("CSV payload is not valid UTF-8")
}

pub fn charts(agg: &Aggregate) -> Charts {
    let s = &agg.summary;
    let sb = &agg.secure_boot;
    Charts {
        readiness: vec![
            slice("Windows 11 Ready", s.compatible, GREEN),
            slice("Not Windows 11 Ready", s.not_compatible, RED),
            slice("Unsupported", s.unsupported, ORANGE),
            slice("Offline", s.offline, GREY),
        ],
        site_breakdown: agg.sites.clone(),
        secure_boot: vec![
            slice("Enabled", sb.capable_enabled, GREEN),
            slice("Disabled", sb.capable_disabled, RED),
            slice("Not Present", sb.not_capable, ORANGE),
            slice("Offline", sb.offline, GREY),
        ],
        os_versions: agg.os_versions.clone(),
        cpu_generations: agg.cpu_generations.clone(),
        ram_sizes: agg.ram_sizes.clone(),
    }
}

fn slice(name: &str, value: u64, color: &str) -> ChartSlice {
    ChartSlice {
        name: name.to_string(),
        value,
        color: color.to_string(),
    }
}

pub fn recommendations(summary: &ReportSummary, records: &[ClassifiedRecord]) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if summary.not_compatible > 0 {
        out.push(recommendation(
            "warning",
            "Hardware Upgrades Needed",
            format!(
                "{} workstations need hardware upgrades to support Windows 11",
                summary.not_compatible
            ),
            "high",
        ));
    }
    if summary.unsupported > 0 {
        out.push(recommendation(
            "info",
            "SecureBoot Configuration",
            format!(
                "{} workstations are Windows 11 ready but have SecureBoot disabled",
                summary.unsupported
            ),
            "medium",
        ));
    }
    if summary.offline > 0 {
        out.push(recommendation(
            "warning",
            "Offline Systems",
            format!(
                "{} workstations are offline and need to be checked for Windows 11 readiness",
                summary.offline
            ),
            "medium",
        ));
    }

    let expired = records
        .iter()
        .filter(|r| r.warranty_expires == "Expired")
        .count();
    if expired > 0 {
        out.push(recommendation(
            "error",
            "Warranty Expired",
            format!("{expired} workstations have expired warranties"),
            "high",
        ));
    }

    let untracked = records.iter().filter(|r| !r.in_scalepad).count();
    if untracked > 0 {
        out.push(recommendation(
            "warning",
            "Missing from ScalePad",
            format!("{untracked} workstations are not tracked in ScalePad"),
            "medium",
        ));
    }

    out
}

fn recommendation(kind: &str, title: &str, description: String, priority: &str) -> Recommendation {
    Recommendation {
        kind: kind.to_string(),
        title: title.to_string(),
        description,
        priority: priority.to_string(),
    }
}

pub fn assemble(
    records: Vec<ClassifiedRecord>,
    agg: Aggregate,
    company_info: CompanyInfo,
    excel: Option<String>,
) -> ProcessResponse {
    let charts = charts(&agg);
    let recommendations = recommendations(&agg.summary, &records);
    ProcessResponse {
        success: true,
        summary: agg.summary,
        secure_boot_stats: agg.secure_boot,
        charts,
        data: records,
        company_info,
        recommendations,
        files: ExportFiles { excel },
    }
}

pub fn format_markdown(
    company: &CompanyInfo,
    summary: &ReportSummary,
    secure_boot: &SecureBootStats,
    records: &[ClassifiedRecord],
    generated_at: Option<&str>,
) -> String {
    use std::fmt::Write as _;

    let agg = crate::aggregate::aggregate(records);
    let mut out = String::new();

    let _ = writeln!(out, "# Windows 11 Readiness Report: {}", company.name);
    let _ = writeln!(out);
    if !company.site.trim().is_empty() {
        let _ = writeln!(out, "- Site: {}", company.site);
    }
    if !company.tenant.trim().is_empty() {
        let _ = writeln!(out, "- Tenant: `{}`", company.tenant);
    }
    if let Some(ts) = generated_at {
        let _ = writeln!(out, "- Generated: {ts}");
    }
    let _ = writeln!(out, "- Workstations: {}", summary.total);
    let _ = writeln!(
        out,
        "- Windows 11 ready: {} ({}%)",
        summary.compatible, summary.compatible_percentage
    );
    let _ = writeln!(
        out,
        "- Not ready: {} ({}%)",
        summary.not_compatible, summary.not_compatible_percentage
    );
    let _ = writeln!(
        out,
        "- Unsupported: {} ({}%)",
        summary.unsupported, summary.unsupported_percentage
    );
    let _ = writeln!(
        out,
        "- Offline: {} ({}%)",
        summary.offline, summary.offline_percentage
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "## Secure Boot");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Enabled: {}", secure_boot.capable_enabled);
    let _ = writeln!(out, "- Capable but disabled: {}", secure_boot.capable_disabled);
    let _ = writeln!(out, "- Not capable: {}", secure_boot.not_capable);
    let _ = writeln!(out, "- Offline: {}", secure_boot.offline);

    let _ = writeln!(out);
    let _ = writeln!(out, "## Sites ({})", agg.sites.len());
    if agg.sites.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "_No workstations._");
    } else {
        let _ = writeln!(out);
        let _ = writeln!(out, "| Site | Total | Ready | Not ready | Unsupported | Offline |");
        let _ = writeln!(out, "| --- | ---: | ---: | ---: | ---: | ---: |");
        for s in &agg.sites {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                markdown_cell(&s.site),
                s.total,
                s.compatible,
                s.not_compatible,
                s.unsupported,
                s.offline
            );
        }
    }

    let recs = recommendations(summary, records);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Recommendations ({})", recs.len());
    if recs.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "_No recommendations._");
    }
    for r in &recs {
        let _ = writeln!(out);
        let _ = writeln!(out, "### {}", r.title);
        let _ = writeln!(out, "- priority: {}", r.priority);
        let _ = writeln!(out, "- {}", r.description);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Workstations ({})", records.len());
    if !records.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "| {} |", EXPORT_COLUMNS.join(" | "));
        let _ = writeln!(out, "|{}", " --- |".repeat(EXPORT_COLUMNS.len()));
        for r in records {
            let cells: Vec<String> = export_row(r).iter().map(|v| markdown_cell(v)).collect();
            let _ = writeln!(out, "| {} |", cells.join(" | "));
        }
    }

    let _ = writeln!(out);
    out
}

fn markdown_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}
