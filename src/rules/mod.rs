//! Readiness verdict rules.
//!
//! Each rule looks at the [`Signals`] extracted from one diagnostic blob and
//! either decides the verdict or passes. Rules run in [`READINESS_RULES`]
//! order and the first decision wins.

use std::str::FromStr;

use crate::core::{Readiness, SecureBoot};

/// The diagnostic tool's own verdict, when it printed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplicitStatus {
    Supported,
    Unsupported,
    Unknown,
}

impl ExplicitStatus {
    pub const MARKERS: [(&'static str, ExplicitStatus); 3] = [
        ("Status : Supported", ExplicitStatus::Supported),
        ("Status : Unsupported", ExplicitStatus::Unsupported),
        ("Status : Unknown", ExplicitStatus::Unknown),
    ];

    /// First marker found in `text`, in marker priority order.
    pub fn find_in(text: &str) -> Option<Self> {
        Self::MARKERS
            .iter()
            .find(|(marker, _)| text.contains(marker))
            .map(|(_, status)| *status)
    }
}

impl FromStr for ExplicitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supported" => Ok(ExplicitStatus::Supported),
            "unsupported" => Ok(ExplicitStatus::Unsupported),
            "unknown" => Ok(ExplicitStatus::Unknown),
            other => Err(format!("unrecognized status token: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signals {
    pub memory_passed: bool,
    pub tpm_passed: bool,
    pub secure_boot_capable: bool,
    pub processor_passed: bool,
    pub windows11: bool,
    pub secure_boot: SecureBoot,
    pub explicit: Option<ExplicitStatus>,
}

impl Signals {
    pub fn components_passed(&self) -> bool {
        self.memory_passed && self.tpm_passed && self.secure_boot_capable && self.processor_passed
    }

    fn hardware_failed(&self) -> bool {
        !self.memory_passed || !self.tpm_passed || !self.processor_passed
    }
}

pub type Rule = fn(&Signals) -> Option<Readiness>;

pub const READINESS_RULES: &[(&str, Rule)] = &[
    ("explicit-supported", explicit_supported),
    ("explicit-unsupported", explicit_unsupported),
    ("explicit-unknown", explicit_unknown),
    ("already-windows-11", already_windows11),
    ("components-passed", components_passed),
    ("hardware-failed", hardware_failed),
    ("secure-boot-not-capable", secure_boot_not_capable),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub readiness: Readiness,
    pub rule: &'static str,
}

pub fn classify(signals: &Signals) -> Verdict {
    for (name, rule) in READINESS_RULES {
        if let Some(readiness) = rule(signals) {
            return Verdict {
                readiness,
                rule: *name,
            };
        }
    }
    Verdict {
        readiness: Readiness::Fail,
        rule: "residual",
    }
}

fn explicit_supported(s: &Signals) -> Option<Readiness> {
    (s.explicit == Some(ExplicitStatus::Supported)).then_some(Readiness::Pass)
}

fn explicit_unsupported(s: &Signals) -> Option<Readiness> {
    if s.explicit != Some(ExplicitStatus::Unsupported) {
        return None;
    }
    // Capable hardware that the tool still rejects is usually blocked by Secure Boot.
    if s.components_passed() {
        Some(Readiness::Unsupported)
    } else {
        Some(Readiness::Fail)
    }
}

fn explicit_unknown(s: &Signals) -> Option<Readiness> {
    (s.explicit == Some(ExplicitStatus::Unknown)).then_some(Readiness::Offline)
}

fn already_windows11(s: &Signals) -> Option<Readiness> {
    (s.windows11 && s.components_passed()).then_some(Readiness::Pass)
}

fn components_passed(s: &Signals) -> Option<Readiness> {
    if !s.components_passed() {
        return None;
    }
    if s.secure_boot == SecureBoot::Enabled {
        Some(Readiness::Pass)
    } else {
        Some(Readiness::Unsupported)
    }
}

fn hardware_failed(s: &Signals) -> Option<Readiness> {
    s.hardware_failed().then_some(Readiness::Fail)
}

fn secure_boot_not_capable(s: &Signals) -> Option<Readiness> {
    (!s.secure_boot_capable).then_some(Readiness::Unsupported)
}
