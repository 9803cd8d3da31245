//! Input boundary: loads RMM/ScalePad exports and maps their loosely named
//! columns onto [`InventoryRow`] / [`WarrantyRow`] once, up front.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::core::{CompanyInfo, InventoryRow, WarrantyRow};

/// One spreadsheet row keyed by its column header.
pub type RawRow = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Rmm,
    Scalepad,
}

impl DatasetKind {
    pub const fn label(self) -> &'static str {
        match self {
            DatasetKind::Rmm => "RMM",
            DatasetKind::Scalepad => "ScalePad",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DatasetKind,
    #[serde(default)]
    pub data: Vec<RawRow>,
    #[serde(default)]
    pub size: u64,
}

/// Body of a processing request: the uploaded datasets plus company metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    pub files: Vec<Dataset>,
    #[serde(default)]
    pub company_info: CompanyInfo,
}

impl ProcessRequest {
    pub fn dataset(&self, kind: DatasetKind) -> Option<&Dataset> {
        self.files.iter().find(|f| f.kind == kind)
    }
}

const MACHINE_NAME: &[&str] = &[
    "machinename",
    "machine",
    "workstation",
    "computername",
    "computer",
    "hostname",
    "devicename",
];
const FRIENDLY_NAME: &[&str] = &["friendlyname", "displayname", "description"];
const SITE_NAME: &[&str] = &["sitename", "site", "location"];
const OUTPUT: &[&str] = &["output", "scriptoutput", "result"];
const STATUS: &[&str] = &["status", "win11status", "windows11status"];

const WARRANTY_NAME: &[&str] = &[
    "name",
    "devicename",
    "machinename",
    "computername",
    "hostname",
    "assetname",
];
const SERIAL: &[&str] = &["serial", "serialnumber", "serialno"];
const EXPIRES: &[&str] = &[
    "expires",
    "warrantyexpires",
    "warrantyexpiration",
    "warrantyexpiry",
    "expiration",
    "expirationdate",
];

/// Lowercase with everything but ASCII letters and digits removed.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn resolve_column(headers: &BTreeSet<String>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .find(|h| normalize_header(h) == *alias)
            .cloned()
    })
}

fn headers_of(rows: &[RawRow]) -> BTreeSet<String> {
    rows.iter().flat_map(|r| r.keys().cloned()).collect()
}

pub fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell(row: &RawRow, column: Option<&String>) -> String {
    column
        .and_then(|c| row.get(c))
        .map(cell_text)
        .unwrap_or_default()
}

pub fn normalize_inventory(rows: &[RawRow]) -> Vec<InventoryRow> {
    let headers = headers_of(rows);
    let machine = resolve_column(&headers, MACHINE_NAME);
    let friendly = resolve_column(&headers, FRIENDLY_NAME);
    let site = resolve_column(&headers, SITE_NAME);
    let output = resolve_column(&headers, OUTPUT);
    let status = resolve_column(&headers, STATUS);

    rows.iter()
        .map(|row| InventoryRow {
            machine_name: cell(row, machine.as_ref()),
            friendly_name: cell(row, friendly.as_ref()),
            site: cell(row, site.as_ref()),
            output: cell(row, output.as_ref()),
            status: Some(cell(row, status.as_ref())).filter(|s| !s.trim().is_empty()),
        })
        .collect()
}

pub fn normalize_warranty(rows: &[RawRow]) -> Vec<WarrantyRow> {
    let headers = headers_of(rows);
    let name = resolve_column(&headers, WARRANTY_NAME);
    let serial = resolve_column(&headers, SERIAL);
    let expires = resolve_column(&headers, EXPIRES);

    rows.iter()
        .map(|row| WarrantyRow {
            name: cell(row, name.as_ref()),
            serial: cell(row, serial.as_ref()),
            expires: cell(row, expires.as_ref()),
        })
        .collect()
}

/// Checks that the columns the pipeline keys on are present.
pub fn validate_columns(kind: DatasetKind, headers: &[String]) -> Result<()> {
    let headers: BTreeSet<String> = headers.iter().cloned().collect();
    let ok = match kind {
        DatasetKind::Rmm => {
            resolve_column(&headers, MACHINE_NAME).is_some()
                && resolve_column(&headers, OUTPUT).is_some()
        }
        DatasetKind::Scalepad => resolve_column(&headers, WARRANTY_NAME).is_some(),
    };
    if ok {
        Ok(())
    } else {
        Err(anyhow!(
            "Invalid {} file format. Missing required columns.",
            kind.label().to_ascii_uppercase()
        ))
    }
}

/// Column check for a dataset that arrived as row objects. An empty dataset
/// has no headers to check and passes.
pub fn validate_dataset(dataset: &Dataset) -> Result<()> {
    if dataset.data.is_empty() {
        return Ok(());
    }
    let headers: Vec<String> = headers_of(&dataset.data).into_iter().collect();
    validate_columns(dataset.kind, &headers)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Reads a `.json` array of row objects, or any other file as CSV with a header row.
pub fn load_table(path: &Path) -> Result<Table> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read input file: {}", path.display()))?;
        let rows: Vec<RawRow> = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse JSON rows: {}", path.display()))?;
        let headers = headers_of(&rows).into_iter().collect();
        return Ok(Table { headers, rows });
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open CSV file: {}", path.display()))?;
    read_csv(&mut reader).with_context(|| format!("CSV parsing error: {}", path.display()))
}

pub fn read_csv<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Table> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), serde_json::Value::String(v.to_string())))
            .collect();
        rows.push(row);
    }
    Ok(Table { headers, rows })
}

/// Loads one export as a dataset of the given kind.
pub fn load_dataset(path: &Path, kind: DatasetKind) -> Result<Dataset> {
    let table = load_table(path)?;
    validate_columns(kind, &table.headers)
        .with_context(|| format!("{}: {}", kind, path.display()))?;
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    log::info!(
        "loaded {} dataset {} ({} rows)",
        kind,
        path.display(),
        table.rows.len()
    );
    Ok(Dataset {
        name: file_name(path),
        kind,
        data: table.rows,
        size,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Tells RMM and ScalePad exports apart by file name.
#[derive(Debug, Clone)]
pub struct DatasetClassifier {
    rmm: GlobSet,
    scalepad: GlobSet,
}

impl DatasetClassifier {
    pub fn new(rmm_patterns: &[String], scalepad_patterns: &[String]) -> Result<Self> {
        Ok(Self {
            rmm: build_glob_set(rmm_patterns)?,
            scalepad: build_glob_set(scalepad_patterns)?,
        })
    }

    /// RMM patterns are checked first.
    pub fn classify(&self, path: &Path) -> Option<DatasetKind> {
        let name = file_name(path).to_lowercase();
        if self.rmm.is_match(&name) {
            Some(DatasetKind::Rmm)
        } else if self.scalepad.is_match(&name) {
            Some(DatasetKind::Scalepad)
        } else {
            None
        }
    }

    pub fn classify_or_err(&self, path: &Path) -> Result<DatasetKind> {
        self.classify(path).ok_or_else(|| {
            anyhow!(
                "{}: file must be either an RMM report or a ScalePad report (file name should contain \"rmm\" or \"scalepad\")",
                path.display()
            )
        })
    }
}

pub fn validate_patterns(patterns: &[String]) -> Result<()> {
    let _ = build_glob_set(patterns)?;
    Ok(())
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .case_insensitive(true)
            .literal_separator(false)
            .build()
            .with_context(|| format!("invalid file name pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Spreadsheet exports directly inside `dir` that the classifier recognizes,
/// sorted by path.
pub fn discover(dir: &Path, classifier: &DatasetClassifier) -> Result<Vec<(PathBuf, DatasetKind)>> {
    if !dir.is_dir() {
        return Err(anyhow!("input directory does not exist: {}", dir.display()));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv") || e.eq_ignore_ascii_case("json"));
        if !supported {
            continue;
        }
        match classifier.classify(path) {
            Some(kind) => found.push((path.to_path_buf(), kind)),
            None => log::debug!("skipping unrecognized export {}", path.display()),
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    fn temp_dir(tag: &str) -> PathBuf {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "win11ready-ingest-{tag}-{}-{seq}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create dir");
        dir
    }

    fn classifier() -> DatasetClassifier {
        DatasetClassifier::new(
            &["*rmm*".to_string()],
            &["*scalepad*".to_string(), "*scale pad*".to_string()],
        )
        .expect("classifier")
    }

    #[test]
    fn inventory_headers_tolerate_variation() {
        let rows = vec![row(&[
            ("Machine Name", "WS-01"),
            ("friendly_name", "Front desk"),
            ("SITE NAME", "HQ"),
            ("Output", "Machine was offline"),
        ])];
        let inv = normalize_inventory(&rows);
        assert_eq!(inv.len(), 1);
        assert_eq!(inv[0].machine_name, "WS-01");
        assert_eq!(inv[0].friendly_name, "Front desk");
        assert_eq!(inv[0].site, "HQ");
        assert_eq!(inv[0].output, "Machine was offline");
        assert_eq!(inv[0].status, None);
    }

    #[test]
    fn exact_alias_beats_looser_alias() {
        let rows = vec![row(&[("Workstation", "ignored"), ("Machine name", "WS-02")])];
        assert_eq!(normalize_inventory(&rows)[0].machine_name, "WS-02");
    }

    #[test]
    fn warranty_headers_and_non_string_cells() {
        let mut r = row(&[("Name", "WS-01"), ("Expires", "2027-01-01")]);
        r.insert("Serial Number".to_string(), serde_json::json!(12345));
        let w = normalize_warranty(&[r]);
        assert_eq!(w[0].name, "WS-01");
        assert_eq!(w[0].serial, "12345");
        assert_eq!(w[0].expires, "2027-01-01");
    }

    #[test]
    fn validate_columns_reports_kind() {
        let headers = |hs: &[&str]| hs.iter().map(|h| h.to_string()).collect::<Vec<_>>();
        assert!(validate_columns(DatasetKind::Rmm, &headers(&["Machine name", "Output"])).is_ok());
        let err = validate_columns(DatasetKind::Rmm, &headers(&["Serial"])).expect_err("missing");
        assert!(err.to_string().contains("Invalid RMM file format"));
        assert!(validate_columns(DatasetKind::Scalepad, &headers(&["Name"])).is_ok());
    }

    #[test]
    fn classifier_matches_file_names_case_insensitively() {
        let c = classifier();
        assert_eq!(c.classify(Path::new("/tmp/Acme RMM Report.csv")), Some(DatasetKind::Rmm));
        assert_eq!(
            c.classify(Path::new("ScalePad-export.csv")),
            Some(DatasetKind::Scalepad)
        );
        assert_eq!(c.classify(Path::new("Scale Pad.csv")), Some(DatasetKind::Scalepad));
        assert_eq!(c.classify(Path::new("inventory.csv")), None);
        assert!(c.classify_or_err(Path::new("inventory.csv")).is_err());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(validate_patterns(&["[".to_string()]).is_err());
    }

    #[test]
    fn loads_csv_with_quotes_and_skips_blank_lines() {
        let dir = temp_dir("csv");
        let path = dir.join("rmm.csv");
        std::fs::write(
            &path,
            "\u{feff}Machine name,Site name,Output\nWS-01,HQ,\"Memory: System_Memory=8GB :: PASS, \"\"quoted\"\"\"\n\n,,\nWS-02,,\n",
        )
        .expect("write");

        let table = load_table(&path).expect("load");
        assert_eq!(table.headers, vec!["Machine name", "Site name", "Output"]);
        assert_eq!(table.rows.len(), 2);
        let inv = normalize_inventory(&table.rows);
        assert_eq!(inv[0].output, "Memory: System_Memory=8GB :: PASS, \"quoted\"");
        assert_eq!(inv[1].machine_name, "WS-02");
        assert_eq!(inv[1].site, "");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn loads_json_rows() {
        let dir = temp_dir("json");
        let path = dir.join("scalepad.json");
        std::fs::write(&path, r#"[{"Name":"WS-01","Serial":"ABC","Expires":null}]"#)
            .expect("write");
        let ds = load_dataset(&path, DatasetKind::Scalepad).expect("load");
        assert_eq!(ds.name, "scalepad.json");
        let w = normalize_warranty(&ds.data);
        assert_eq!(w[0].serial, "ABC");
        assert_eq!(w[0].expires, "");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn discover_finds_classified_exports_only() {
        let dir = temp_dir("discover");
        std::fs::write(dir.join("b-scalepad.csv"), "Name\n").expect("write");
        std::fs::write(dir.join("a-rmm.csv"), "Machine name,Output\n").expect("write");
        std::fs::write(dir.join("notes.txt"), "rmm").expect("write");
        std::fs::write(dir.join("other.csv"), "x\n").expect("write");

        let found = discover(&dir, &classifier()).expect("discover");
        let kinds: Vec<DatasetKind> = found.iter().map(|(_, k)| *k).collect();
        assert_eq!(kinds, vec![DatasetKind::Rmm, DatasetKind::Scalepad]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn request_body_deserializes_from_upload_shape() {
        let body = r#"{
            "files": [
                {"name": "rmm.csv", "type": "rmm", "data": [{"Machine name": "WS-01", "Output": ""}], "size": 10},
                {"name": "scalepad.csv", "type": "scalepad", "data": []}
            ],
            "companyInfo": {"name": "Acme", "site": "", "tenant": "acme"}
        }"#;
        let req: ProcessRequest = serde_json::from_str(body).expect("parse");
        assert_eq!(req.files.len(), 2);
        assert_eq!(req.dataset(DatasetKind::Scalepad).map(|d| d.size), Some(0));
        assert_eq!(req.company_info.tenant, "acme");
    }

    #[test]
    fn request_datasets_are_checked_by_their_row_keys() {
        let good = Dataset {
            name: "rmm.json".to_string(),
            kind: DatasetKind::Rmm,
            data: vec![row(&[("Machine Name", "WS-01"), ("Output", "")])],
            size: 0,
        };
        assert!(validate_dataset(&good).is_ok());

        let bad = Dataset {
            kind: DatasetKind::Scalepad,
            data: vec![row(&[("Serial", "X")])],
            ..good.clone()
        };
        let err = validate_dataset(&bad).expect_err("missing name column");
        assert_eq!(
            err.to_string(),
            "Invalid SCALEPAD file format. Missing required columns."
        );

        let empty = Dataset {
            data: Vec::new(),
            ..bad
        };
        assert!(validate_dataset(&empty).is_ok());
    }
}
