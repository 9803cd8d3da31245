use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "WIN11READY_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveConfig {
    pub ui: UiConfig,
    pub store: StoreConfig,
    pub ingest: IngestConfig,
    pub export: ExportConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiConfig {
    pub color: bool,
    pub max_table_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub fallback_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestConfig {
    pub rmm_patterns: Vec<String>,
    pub scalepad_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportConfig {
    pub csv: bool,
}

impl EffectiveConfig {
    pub fn defaults(home_dir: &Path) -> Self {
        Self {
            ui: UiConfig {
                color: true,
                max_table_rows: 20,
            },
            store: StoreConfig {
                enabled: true,
                path: default_store_path(home_dir),
                fallback_path: default_fallback_store_path(),
            },
            ingest: IngestConfig {
                rmm_patterns: vec!["*rmm*".to_string()],
                scalepad_patterns: vec![
                    "*scalepad*".to_string(),
                    "*scale pad*".to_string(),
                    "*scale_pad*".to_string(),
                ],
            },
            export: ExportConfig { csv: true },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    ui: Option<RawUiConfig>,
    store: Option<RawStoreConfig>,
    ingest: Option<RawIngestConfig>,
    export: Option<RawExportConfig>,
}

#[derive(Debug, Deserialize)]
struct RawUiConfig {
    color: Option<bool>,
    max_table_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawStoreConfig {
    enabled: Option<bool>,
    path: Option<String>,
    fallback_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIngestConfig {
    rmm_patterns: Option<Vec<String>>,
    scalepad_patterns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawExportConfig {
    csv: Option<bool>,
}

pub fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("HOME is not set"))
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/win11ready/config.toml")
}

pub fn default_store_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/win11ready/reports.json")
}

pub fn default_fallback_store_path() -> PathBuf {
    std::env::temp_dir().join("win11ready/reports.json")
}

pub fn load(config_path: Option<&Path>, home_dir: &Path) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::defaults(home_dir);

    let explicit = config_path.is_some();
    let path = config_path
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_config_path(home_dir));

    if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s)
            .with_context(|| format!("failed to parse config file (TOML): {}", path.display()))?;
        apply_raw_config(&mut cfg, raw, home_dir);
        cfg.config_path = Some(path.display().to_string());
    } else if explicit {
        return Err(anyhow!("config file not found: {}", path.display()));
    }

    apply_env_overrides(&mut cfg, home_dir)?;
    crate::ingest::validate_patterns(&cfg.ingest.rmm_patterns)?;
    crate::ingest::validate_patterns(&cfg.ingest.scalepad_patterns)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig, home_dir: &Path) {
    if let Some(ui) = raw.ui {
        if let Some(color) = ui.color {
            cfg.ui.color = color;
        }
        if let Some(max_table_rows) = ui.max_table_rows {
            cfg.ui.max_table_rows = max_table_rows;
        }
    }

    if let Some(store) = raw.store {
        if let Some(enabled) = store.enabled {
            cfg.store.enabled = enabled;
        }
        if let Some(path) = store.path {
            cfg.store.path = expand_home(&path, home_dir);
        }
        if let Some(fallback_path) = store.fallback_path {
            cfg.store.fallback_path = expand_home(&fallback_path, home_dir);
        }
    }

    if let Some(ingest) = raw.ingest {
        if let Some(rmm_patterns) = ingest.rmm_patterns {
            cfg.ingest.rmm_patterns = rmm_patterns;
        }
        if let Some(scalepad_patterns) = ingest.scalepad_patterns {
            cfg.ingest.scalepad_patterns = scalepad_patterns;
        }
    }

    if let Some(export) = raw.export {
        if let Some(csv) = export.csv {
            cfg.export.csv = csv;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig, home_dir: &Path) -> Result<()> {
    if let Ok(v) = std::env::var("WIN11READY_UI_COLOR") {
        cfg.ui.color = parse_bool(&v).with_context(|| "WIN11READY_UI_COLOR")?;
    }
    if let Ok(v) = std::env::var("WIN11READY_UI_MAX_TABLE_ROWS") {
        cfg.ui.max_table_rows = v
            .trim()
            .parse::<usize>()
            .with_context(|| "WIN11READY_UI_MAX_TABLE_ROWS")?;
    }
    if let Ok(v) = std::env::var("WIN11READY_STORE_ENABLED") {
        cfg.store.enabled = parse_bool(&v).with_context(|| "WIN11READY_STORE_ENABLED")?;
    }
    if let Ok(v) = std::env::var("WIN11READY_STORE_PATH") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.store.path = expand_home(v, home_dir);
        }
    }
    if let Ok(v) = std::env::var("WIN11READY_STORE_FALLBACK_PATH") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.store.fallback_path = expand_home(v, home_dir);
        }
    }
    if let Ok(v) = std::env::var("WIN11READY_INGEST_RMM_PATTERNS") {
        let parts = split_list(&v);
        if !parts.is_empty() {
            cfg.ingest.rmm_patterns = parts;
        }
    }
    if let Ok(v) = std::env::var("WIN11READY_INGEST_SCALEPAD_PATTERNS") {
        let parts = split_list(&v);
        if !parts.is_empty() {
            cfg.ingest.scalepad_patterns = parts;
        }
    }
    if let Ok(v) = std::env::var("WIN11READY_EXPORT_CSV") {
        cfg.export.csv = parse_bool(&v).with_context(|| "WIN11READY_EXPORT_CSV")?;
    }

    Ok(())
}

fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn expand_home(path: &str, home_dir: &Path) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir.join(rest),
        None if path == "~" => home_dir.to_path_buf(),
        None => PathBuf::from(path),
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for v in ["1", "true", " YES ", "on"] {
            assert!(parse_bool(v).expect("bool"));
        }
        for v in ["0", "false", "No", "off"] {
            assert!(!parse_bool(v).expect("bool"));
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn raw_config_overrides_only_present_keys() {
        let home = Path::new("/home/tester");
        let mut cfg = EffectiveConfig::defaults(home);
        let raw: RawConfig = toml::from_str(
            r#"
[ui]
max_table_rows = 5

[store]
path = "~/reports/history.json"

[ingest]
rmm_patterns = ["*devices*"]
"#,
        )
        .expect("toml");
        apply_raw_config(&mut cfg, raw, home);

        assert!(cfg.ui.color);
        assert_eq!(cfg.ui.max_table_rows, 5);
        assert!(cfg.store.enabled);
        assert_eq!(cfg.store.path, home.join("reports/history.json"));
        assert_eq!(cfg.ingest.rmm_patterns, vec!["*devices*".to_string()]);
        assert_eq!(cfg.ingest.scalepad_patterns.len(), 3);
        assert!(cfg.export.csv);
    }

    #[test]
    fn invalid_ingest_pattern_fails_load() {
        let dir = std::env::temp_dir().join(format!(
            "win11ready-config-unit-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("bad-patterns.toml");
        std::fs::write(&path, "[ingest]\nscalepad_patterns = [\"[\"]\n").expect("write config");

        let err = load(Some(&path), &dir).expect_err("bad pattern");
        assert!(format!("{err:#}").contains("invalid file name pattern"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(toml::from_str::<RawConfig>("[scan]\ndeep = true\n").is_err());
    }

    #[test]
    fn expand_home_leaves_other_paths_alone() {
        let home = Path::new("/h");
        assert_eq!(expand_home("~", home), PathBuf::from("/h"));
        assert_eq!(expand_home("~/a.json", home), PathBuf::from("/h/a.json"));
        assert_eq!(expand_home("/tmp/a.json", home), PathBuf::from("/tmp/a.json"));
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(
            split_list(" *rmm* , ,*devices*"),
            vec!["*rmm*".to_string(), "*devices*".to_string()]
        );
    }
}
