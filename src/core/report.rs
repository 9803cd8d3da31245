use serde::{Deserialize, Serialize};

use crate::core::ClassifiedRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub tenant: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: u64,
    pub compatible: u64,
    pub not_compatible: u64,
    pub unsupported: u64,
    pub offline: u64,
    pub compatible_percentage: u64,
    pub not_compatible_percentage: u64,
    pub unsupported_percentage: u64,
    pub offline_percentage: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureBootStats {
    pub capable_enabled: u64,
    pub capable_disabled: u64,
    pub not_capable: u64,
    pub offline: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBreakdown {
    pub site: String,
    pub total: u64,
    pub compatible: u64,
    pub not_compatible: u64,
    pub unsupported: u64,
    pub offline: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSlice {
    pub name: String,
    pub value: u64,
    pub color: String,
}

/// One label → count pair of a frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charts {
    pub readiness: Vec<ChartSlice>,
    pub site_breakdown: Vec<SiteBreakdown>,
    pub secure_boot: Vec<ChartSlice>,
    pub os_versions: Vec<BreakdownEntry>,
    pub cpu_generations: Vec<BreakdownEntry>,
    pub ram_sizes: Vec<BreakdownEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub priority: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFiles {
    /// `data:text/csv;base64,...`, or null when the export could not be built.
    pub excel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub summary: ReportSummary,
    pub secure_boot_stats: SecureBootStats,
    pub charts: Charts,
    pub data: Vec<ClassifiedRecord>,
    pub company_info: CompanyInfo,
    pub recommendations: Vec<Recommendation>,
    pub files: ExportFiles,
}

/// Persisted snapshot of one processing run. Never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    pub id: String,
    pub timestamp: String,
    pub company_info: CompanyInfo,
    pub summary: ReportSummary,
    pub secure_boot_stats: SecureBootStats,
    pub data: Vec<ClassifiedRecord>,
}
