mod diagnostics;
mod record;
mod report;
mod status;

pub use diagnostics::{ParsedDiagnostics, Reading};
pub use record::{ClassifiedRecord, InventoryRow, WarrantyRow};
pub use report::{
    BreakdownEntry, ChartSlice, Charts, CompanyInfo, ExportFiles, ProcessResponse, Recommendation,
    ReportSummary, SecureBootStats, SiteBreakdown, StoredReport,
};
pub use status::{Readiness, SecureBoot};
