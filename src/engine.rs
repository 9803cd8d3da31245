use std::time::Duration;

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::{ClassifiedRecord, CompanyInfo, InventoryRow, ProcessResponse, StoredReport};
use crate::ingest::{DatasetKind, ProcessRequest};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub export_csv: bool,
    pub show_progress: bool,
}

#[derive(Debug, Clone)]
pub struct Engine {
    opts: EngineOptions,
}

impl Engine {
    pub fn new(opts: EngineOptions) -> Self {
        Self { opts }
    }

    /// Validates, classifies, joins, aggregates and assembles one report.
    pub fn process(&self, request: &ProcessRequest) -> Result<ProcessResponse> {
        validate(request)?;
        let (Some(rmm), Some(scalepad)) = (
            request.dataset(DatasetKind::Rmm),
            request.dataset(DatasetKind::Scalepad),
        ) else {
            return Err(crate::exit::invalid_args(MISSING_DATASETS));
        };

        use std::io::IsTerminal;
        let pb = if self.opts.show_progress && std::io::stderr().is_terminal() {
            let pb = indicatif::ProgressBar::new_spinner();
            pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            pb.set_message(format!(
                "Classifying {} workstations...",
                rmm.data.len()
            ));
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let inventory = crate::ingest::normalize_inventory(&rmm.data);
        let warranty = crate::ingest::normalize_warranty(&scalepad.data);
        log::info!(
            "processing {} RMM rows against {} ScalePad rows for {}",
            inventory.len(),
            warranty.len(),
            request.company_info.name
        );

        let records = classify_inventory(&inventory);
        let records = crate::join::join(&inventory, records, &warranty);
        let agg = crate::aggregate::aggregate(&records);

        let excel = if self.opts.export_csv {
            match crate::export::encode_csv(&records) {
                Ok(csv) => Some(crate::export::csv_data_uri(&csv)),
                Err(err) => {
                    log::warn!("CSV export unavailable: {err:#}");
                    None
                }
            }
        } else {
            None
        };

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        Ok(crate::export::assemble(
            records,
            agg,
            request.company_info.clone(),
            excel,
        ))
    }
}

const MISSING_DATASETS: &str = "Both RMM and ScalePad files are required";

/// Rejects a request before any processing happens.
pub fn validate(request: &ProcessRequest) -> Result<()> {
    let rmm = request.dataset(DatasetKind::Rmm);
    let scalepad = request.dataset(DatasetKind::Scalepad);
    validate_header(rmm.is_some(), scalepad.is_some(), &request.company_info)?;
    let (Some(rmm), Some(scalepad)) = (rmm, scalepad) else {
        return Err(crate::exit::invalid_args(MISSING_DATASETS));
    };
    for dataset in [rmm, scalepad] {
        crate::ingest::validate_dataset(dataset).map_err(crate::exit::invalid_args_err)?;
    }
    Ok(())
}

/// Checks that need no row data: both dataset kinds present, company name
/// and tenant set.
pub fn validate_header(has_rmm: bool, has_scalepad: bool, company: &CompanyInfo) -> Result<()> {
    if !(has_rmm && has_scalepad) {
        return Err(crate::exit::invalid_args(MISSING_DATASETS));
    }
    if company.name.trim().is_empty() {
        return Err(crate::exit::invalid_args("Company name is required"));
    }
    if company.tenant.trim().is_empty() {
        return Err(crate::exit::invalid_args("Tenant slug is required"));
    }
    Ok(())
}

/// One record per inventory row, in input order, before the warranty join.
pub fn classify_inventory(inventory: &[InventoryRow]) -> Vec<ClassifiedRecord> {
    inventory
        .iter()
        .map(|row| {
            let analysis = crate::diagnostics::analyze(&row.output, row.status.as_deref());
            log::debug!(
                "{}: {} (rule: {})",
                if row.machine_name.is_empty() {
                    "<unnamed>"
                } else {
                    row.machine_name.as_str()
                },
                analysis.diagnostics.win11_ready,
                analysis.rule
            );
            ClassifiedRecord::from_inventory(row, analysis.diagnostics)
        })
        .collect()
}

/// History entry for a finished report, stamped with a fresh id.
pub fn snapshot(response: &ProcessResponse, at: OffsetDateTime) -> Result<StoredReport> {
    let timestamp = at
        .format(&Rfc3339)
        .context("failed to format report timestamp")?;
    Ok(StoredReport {
        id: uuid::Uuid::new_v4().to_string(),
        timestamp,
        company_info: response.company_info.clone(),
        summary: response.summary.clone(),
        secure_boot_stats: response.secure_boot_stats.clone(),
        data: response.data.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompanyInfo, Readiness};
    use crate::ingest::{Dataset, RawRow};

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    fn dataset(kind: DatasetKind, data: Vec<RawRow>) -> Dataset {
        Dataset {
            name: format!("{kind}.csv"),
            kind,
            data,
            size: 0,
        }
    }

    fn request() -> ProcessRequest {
        ProcessRequest {
            files: vec![
                dataset(
                    DatasetKind::Rmm,
                    vec![
                        row(&[
                            ("Machine Name", "WS-01"),
                            ("Site Name", "HQ"),
                            (
                                "Output",
                                "Memory: System_Memory=16GB :: PASS TPM: TPMVersion=2.0,x :: PASS SecureBoot: Capable :: PASS Secure Boot is enabled :: PASS Processor: :: PASS Status : Supported Caption=Intel64 Family 6 Model 165",
                            ),
                        ]),
                        row(&[
                            ("Machine Name", "WS-02"),
                            ("Site Name", "HQ"),
                            ("Output", "Machine was offline"),
                        ]),
                    ],
                ),
                dataset(
                    DatasetKind::Scalepad,
                    vec![row(&[
                        ("Name", " ws-01 "),
                        ("Serial Number", "SN1"),
                        ("Warranty Expires", "2027-01-01"),
                    ])],
                ),
            ],
            company_info: CompanyInfo {
                name: "Acme".to_string(),
                site: "HQ".to_string(),
                tenant: "acme".to_string(),
            },
        }
    }

    fn engine() -> Engine {
        Engine::new(EngineOptions {
            export_csv: true,
            show_progress: false,
        })
    }

    #[test]
    fn validation_messages_follow_field_order() {
        let mut req = request();
        req.company_info.name = "  ".to_string();
        req.company_info.tenant = String::new();
        let err = validate(&req).expect_err("blank name");
        assert_eq!(err.to_string(), "Company name is required");
        assert_eq!(crate::exit::exit_code(&err), 2);

        req.company_info.name = "Acme".to_string();
        let err = validate(&req).expect_err("blank tenant");
        assert_eq!(err.to_string(), "Tenant slug is required");

        req.files.pop();
        let err = engine().process(&req).expect_err("missing scalepad");
        assert_eq!(err.to_string(), "Both RMM and ScalePad files are required");
    }

    #[test]
    fn process_classifies_and_joins() {
        let resp = engine().process(&request()).expect("process");
        assert!(resp.success);
        assert_eq!(resp.summary.total, 2);
        assert_eq!(resp.summary.compatible, 1);
        assert_eq!(resp.summary.offline, 1);

        let ws1 = &resp.data[0];
        assert_eq!(ws1.win11_ready, Readiness::Pass);
        assert_eq!(ws1.serial, "SN1");
        assert_eq!(ws1.warranty_expires, "2027-01-01");
        assert!(ws1.in_scalepad);

        let ws2 = &resp.data[1];
        assert_eq!(ws2.win11_ready, Readiness::Offline);
        assert!(!ws2.in_scalepad);

        let excel = resp.files.excel.as_deref().expect("csv export");
        let csv = crate::export::decode_data_uri(excel).expect("data uri");
        assert_eq!(crate::export::decode_csv(&csv).expect("csv").len(), 2);

        let titles: Vec<&str> = resp.recommendations.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Offline Systems", "Missing from ScalePad"]);
    }

    #[test]
    fn ready_machine_without_warranty_row() {
        let mut req = request();
        req.files[0].data.truncate(1);
        req.files[1].data.clear();

        let resp = engine().process(&req).expect("process");
        assert_eq!(resp.data.len(), 1);
        let r = &resp.data[0];
        assert_eq!(r.workstation, "WS-01");
        assert_eq!(r.win11_ready, Readiness::Pass);
        assert_eq!(r.serial, "");
        assert!(!r.in_scalepad);
        assert_eq!(r.warranty_expires, "Unknown");
        assert_eq!(r.ram.as_str(), "16GB");
        assert_eq!(r.tpm.as_str(), "2.0");
        assert_eq!(r.cpu.as_str(), "Intel 12th Gen (Model 165)");
        assert_eq!(r.secure_boot, crate::core::SecureBoot::Enabled);
        assert_eq!(resp.summary.compatible_percentage, 100);
    }

    #[test]
    fn header_checks_need_no_rows() {
        let company = request().company_info;
        assert!(validate_header(true, true, &company).is_ok());

        let err = validate_header(true, false, &company).expect_err("no scalepad");
        assert_eq!(err.to_string(), "Both RMM and ScalePad files are required");

        let err = validate_header(true, true, &CompanyInfo::default()).expect_err("no company");
        assert_eq!(err.to_string(), "Company name is required");
        assert_eq!(crate::exit::exit_code(&err), 2);
    }

    #[test]
    fn csv_export_can_be_disabled() {
        let engine = Engine::new(EngineOptions {
            export_csv: false,
            show_progress: false,
        });
        let resp = engine.process(&request()).expect("process");
        assert_eq!(resp.files.excel, None);
    }

    #[test]
    fn snapshot_copies_summary_and_records() {
        let resp = engine().process(&request()).expect("process");
        let at = time::macros::datetime!(2026-03-01 10:00 UTC);
        let a = snapshot(&resp, at).expect("snapshot");
        let b = snapshot(&resp, at).expect("snapshot");
        assert_ne!(a.id, b.id);
        assert_eq!(a.timestamp, "2026-03-01T10:00:00Z");
        assert_eq!(a.summary, resp.summary);
        assert_eq!(a.data, resp.data);
    }
}
