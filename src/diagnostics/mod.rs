//! Extraction of hardware facts from the RMM diagnostic `Output` column.
//!
//! Parsing is total: unmatched patterns leave a field `Unknown`, and an
//! unreachable machine collapses every field to `Offline`.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{ParsedDiagnostics, Reading, SecureBoot};
use crate::rules::{self, ExplicitStatus, Signals, Verdict};

pub const OFFLINE_MARKER: &str = "Machine was offline";

const SECURE_BOOT_CAPABLE: &str = "SecureBoot: Capable :: PASS";
const SECURE_BOOT_DISABLED: &str = "Secure Boot is not enabled :: FAIL";
const SECURE_BOOT_ENABLED: &str = "Secure Boot is enabled :: PASS";
const CHECK_PASSED: &str = ":: PASS";

static MEMORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Memory:\s*System_Memory=(\d+)GB\s*::\s*(PASS|FAIL)").expect("memory pattern")
});
static TPM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)TPM:\s*TPMVersion=([^:]+)\s*::\s*(PASS|FAIL)").expect("tpm pattern")
});
static OS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)OsVersion:\s*version=([^:]+)\s*::\s*(PASS|FAIL)").expect("os pattern")
});
static VENDOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Microsoft\s+").expect("vendor pattern"));
static CPU_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Caption=Intel64 Family 6 Model (\d+)").expect("cpu pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub diagnostics: ParsedDiagnostics,
    /// Name of the rule that decided the verdict; `offline` when parsing was skipped.
    pub rule: &'static str,
}

pub fn parse(output: &str) -> ParsedDiagnostics {
    analyze(output, None).diagnostics
}

/// Parses `output`, falling back to a separate `Status` column value when the
/// text itself carries no explicit status marker.
pub fn analyze(output: &str, status_column: Option<&str>) -> Analysis {
    if is_offline(output) {
        return Analysis {
            diagnostics: ParsedDiagnostics::offline(),
            rule: "offline",
        };
    }

    let output = output.trim();
    let mut diag = ParsedDiagnostics::unknown();

    if let Some(ram) = extract_memory(output) {
        diag.ram = Reading::Value(ram);
    }
    if let Some(tpm) = extract_tpm(output) {
        diag.tpm = Reading::Value(tpm);
    }
    if let Some(os) = extract_os(output) {
        diag.os = Reading::Value(os);
    }

    let capable = output.contains(SECURE_BOOT_CAPABLE);
    diag.secure_boot = secure_boot_state(
        capable,
        output.contains(SECURE_BOOT_DISABLED),
        output.contains(SECURE_BOOT_ENABLED),
    );

    if let Some(model) = extract_cpu_model(output) {
        diag.cpu = Reading::Value(crate::cpu::format_cpu_label(model));
    }

    let explicit = ExplicitStatus::find_in(output)
        .or_else(|| status_column.and_then(|s| s.parse::<ExplicitStatus>().ok()));
    let signals = Signals {
        memory_passed: component_passed(output, "Memory:"),
        tpm_passed: component_passed(output, "TPM:"),
        secure_boot_capable: capable,
        processor_passed: component_passed(output, "Processor:"),
        windows11: diag.os.as_str().contains("Windows 11"),
        secure_boot: diag.secure_boot,
        explicit,
    };
    let Verdict { readiness, rule } = rules::classify(&signals);
    diag.win11_ready = readiness;

    Analysis {
        diagnostics: diag,
        rule,
    }
}

pub fn is_offline(output: &str) -> bool {
    output.trim().is_empty() || output.contains(OFFLINE_MARKER)
}

pub fn secure_boot_state(capable: bool, disabled: bool, enabled: bool) -> SecureBoot {
    if !capable {
        return SecureBoot::NotCapable;
    }
    if !enabled && disabled {
        SecureBoot::CapableButDisabled
    } else {
        // Capable with no contrary marker counts as enabled.
        SecureBoot::Enabled
    }
}

// The label and the PASS marker are checked independently, anywhere in the text.
fn component_passed(output: &str, label: &str) -> bool {
    output.contains(label) && output.contains(CHECK_PASSED)
}

fn extract_memory(output: &str) -> Option<String> {
    let caps = MEMORY_RE.captures(output)?;
    Some(format!("{}GB", &caps[1]))
}

fn extract_tpm(output: &str) -> Option<String> {
    let caps = TPM_RE.captures(output)?;
    let version = caps[1].split(',').next().unwrap_or_default();
    Some(version.trim().to_string())
}

fn extract_os(output: &str) -> Option<String> {
    let caps = OS_RE.captures(output)?;
    Some(VENDOR_RE.replace(&caps[1], "").trim().to_string())
}

fn extract_cpu_model(output: &str) -> Option<&str> {
    let caps = CPU_RE.captures(output)?;
    caps.get(1).map(|m| m.as_str())
}
