use serde::{Deserialize, Serialize};

use crate::core::{ParsedDiagnostics, Readiness, Reading, SecureBoot};

/// One RMM inventory row after header normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryRow {
    /// Empty when the export has no machine name for this row.
    pub machine_name: String,
    pub friendly_name: String,
    pub site: String,
    pub output: String,
    pub status: Option<String>,
}

/// One ScalePad warranty row after header normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarrantyRow {
    pub name: String,
    pub serial: String,
    pub expires: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    #[serde(rename = "Workstation")]
    pub workstation: String,
    #[serde(rename = "Friendly Name")]
    pub friendly_name: String,
    #[serde(rename = "Site")]
    pub site: String,
    #[serde(rename = "Serial")]
    pub serial: String,
    #[serde(rename = "Windows 11 Status")]
    pub win11_ready: Readiness,
    #[serde(rename = "RAM")]
    pub ram: Reading,
    #[serde(rename = "CPU")]
    pub cpu: Reading,
    #[serde(rename = "TPM Version")]
    pub tpm: Reading,
    #[serde(rename = "SecureBoot")]
    pub secure_boot: SecureBoot,
    #[serde(rename = "OS Version")]
    pub os: Reading,
    #[serde(rename = "Warranty Expires")]
    pub warranty_expires: String,
    #[serde(rename = "In ScalePad")]
    pub in_scalepad: bool,
}

impl ClassifiedRecord {
    /// Record before the warranty join: no serial, expiry unknown.
    pub fn from_inventory(row: &InventoryRow, diag: ParsedDiagnostics) -> Self {
        Self {
            workstation: if row.machine_name.is_empty() {
                "Unknown".to_string()
            } else {
                row.machine_name.clone()
            },
            friendly_name: row.friendly_name.clone(),
            site: row.site.clone(),
            serial: String::new(),
            win11_ready: diag.win11_ready,
            ram: diag.ram,
            cpu: diag.cpu,
            tpm: diag.tpm,
            secure_boot: diag.secure_boot,
            os: diag.os,
            warranty_expires: "Unknown".to_string(),
            in_scalepad: false,
        }
    }
}
